//! Wall and region data (spec §3). The mesh itself — vertex placement,
//! triangulation, winding — is built by an external collaborator (spec §1
//! Non-goals); this module owns the shape that collaborator populates and
//! that the rest of the crate reads.

use std::collections::HashMap;

use crate::error::{CountError, Result};
use crate::geometry::{Triangle, Vector3};
use crate::ids::{RegionId, WallId};
use crate::regionset;

/// Bit flags shared by regions and (as a cached union) walls. Plain
/// constants on a newtype rather than a `bitflags!`-style macro — nothing
/// else in the teacher's dependency stack pulls in a flags crate, and the
/// set here is small and fixed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct RegionFlags(u8);

impl RegionFlags {
    pub const NONE: RegionFlags = RegionFlags(0);
    pub const COUNT_HITS: RegionFlags = RegionFlags(1 << 0);
    pub const COUNT_CONTENTS: RegionFlags = RegionFlags(1 << 1);
    pub const COUNT_ENCLOSED: RegionFlags = RegionFlags(1 << 2);
    pub const COUNT_RXNS: RegionFlags = RegionFlags(1 << 3);
    pub const IS_TRIGGER: RegionFlags = RegionFlags(1 << 4);

    /// Any of the flags that require region-enclosure bookkeeping at all
    /// (`COUNT_SOME_MASK` in the original).
    pub const COUNT_SOME: RegionFlags = RegionFlags(
        Self::COUNT_HITS.0 | Self::COUNT_CONTENTS.0 | Self::COUNT_ENCLOSED.0 | Self::COUNT_RXNS.0,
    );

    #[inline]
    pub fn contains(self, other: RegionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn intersects(self, other: RegionFlags) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn union(self, other: RegionFlags) -> RegionFlags {
        RegionFlags(self.0 | other.0)
    }
}

impl std::ops::BitOr for RegionFlags {
    type Output = RegionFlags;
    fn bitor(self, rhs: RegionFlags) -> RegionFlags {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for RegionFlags {
    fn bitor_assign(&mut self, rhs: RegionFlags) {
        *self = self.union(rhs);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ManifoldStatus {
    Unchecked,
    Manifold,
    NotManifold,
}

/// A named equivalence class of walls defining a closed volume when
/// manifold (spec GLOSSARY). Owns no geometry directly — its identity is
/// its `RegionId`.
#[derive(Clone, Debug)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub hashval: u64,
    pub flags: RegionFlags,
    pub manifold: ManifoldStatus,
    /// Nominal surface area, for concentration scaling (spec §3, §4.F).
    pub area: f64,
}

impl Region {
    pub fn new(id: RegionId, name: impl Into<String>, hashval: u64, flags: RegionFlags, area: f64) -> Self {
        Region {
            id,
            name: name.into(),
            hashval,
            flags,
            manifold: ManifoldStatus::Unchecked,
            area,
        }
    }

    pub fn requires_manifold(&self) -> bool {
        self.flags.intersects(RegionFlags::COUNT_ENCLOSED)
    }
}

/// A count request naming a bare object with no explicit region (`MyObj`
/// rather than `MyObj,membrane`) is rewritten to the object's implicit
/// `ALL` region symbol, once at init time rather than at every lookup
/// (original `is_reverse_abbrev` / `,ALL` rewrite in `count_util.c`).
pub fn normalize_count_target(request: &str) -> String {
    if request.contains(',') {
        request.to_string()
    } else {
        format!("{request},ALL")
    }
}

fn vertex_key(v: Vector3) -> (u64, u64, u64) {
    (v.x.to_bits(), v.y.to_bits(), v.z.to_bits())
}

/// `check_counter_geometry`: an init-time pass over every region requiring
/// an ENCLOSING-style counter, verifying it is a closed 2-manifold — every
/// directed edge of every wall in the region has exactly one matching
/// edge of the opposite orientation somewhere else in the region. Walls
/// failing this belong to a region that cannot host a waypoint sweep (spec
/// §3 manifold invariant), so this runs before `waypoint::place_waypoints`.
pub fn check_counter_geometry(walls: &[Wall], regions: &mut [Region]) -> Result<()> {
    for region in regions.iter_mut() {
        if !region.requires_manifold() {
            continue;
        }

        let mut forward: HashMap<((u64, u64, u64), (u64, u64, u64)), u32> = HashMap::new();
        for wall in walls.iter().filter(|w| regionset::contains(&w.regions, region.id)) {
            let v = wall.triangle.vertices;
            for (a, b) in [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])] {
                *forward.entry((vertex_key(a), vertex_key(b))).or_insert(0) += 1;
            }
        }

        let is_manifold = forward.iter().all(|(&(a, b), &count)| count == 1 && forward.get(&(b, a)).copied() == Some(1));

        region.manifold = if is_manifold { ManifoldStatus::Manifold } else { ManifoldStatus::NotManifold };
        if !is_manifold {
            return Err(CountError::NonManifoldRegion { name: region.name.clone() });
        }
    }
    Ok(())
}

/// Immutable-after-init triangle (spec §3 "Wall").
#[derive(Clone, Debug)]
pub struct Wall {
    pub id: WallId,
    pub triangle: Triangle,
    /// Region memberships, sorted by `RegionId` (spec §9: sorted
    /// small-vectors replace address-sorted linked lists).
    pub regions: Vec<RegionId>,
    /// Union of the flags of every region in `regions`, cached so the hot
    /// paths in components D and F can skip walls with no active counters
    /// without re-walking `regions`.
    pub flags: RegionFlags,
    pub area: f64,
}

impl Wall {
    pub fn new(id: WallId, triangle: Triangle, regions: Vec<RegionId>, area: f64, region_flags: impl Fn(RegionId) -> RegionFlags) -> Self {
        let mut regions = regions;
        regions.sort_by_key(|r| r.index());
        regions.dedup();
        let flags = regions.iter().fold(RegionFlags::NONE, |acc, &r| acc | region_flags(r));
        Wall { id, triangle, regions, flags, area }
    }
}

/// The facts the core needs about a molecule for a given call, supplied by
/// the external diffusion/reaction machinery rather than owned here (spec
/// §6 "Molecule" interface). A plain data snapshot rather than a trait
/// object: callers already have these values in hand at the call site, and
/// the core never needs to reach back into molecule storage on its own.
#[derive(Clone, Copy, Debug)]
pub struct MoleculeRef {
    pub species: crate::ids::SpeciesId,
    /// Orientation, surface molecules only.
    pub orient: Option<i8>,
    pub position: crate::geometry::Vector3,
    pub on_grid: bool,
    pub current_wall: Option<WallId>,
}
