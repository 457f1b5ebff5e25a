//! Component C — waypoint placement & enclosure initialization.
//!
//! One waypoint per subvolume, placed off any wall plane, each carrying the
//! full list of regions (and antiregions, for mutual-cancellation bookkeeping
//! during incremental updates) that enclose it. Built once, in lattice
//! order, each waypoint's enclosure is derived from its immediate
//! predecessor's rather than swept from scratch, which is what turns an
//! O(walls) geometry query into an O(1)-ish table lookup for the 10^9 calls
//! a running simulation makes afterward (spec §1, §4.C).

use crate::config::{eps_equals, MAX_WAYPOINT_PERTURB_ATTEMPTS};
use crate::error::{CountError, Result};
use crate::geometry::{SubvolumeLattice, Vector3};
use crate::ids::{RegionId, SubvolumeId};
use crate::mesh::Wall;
use crate::sweep::sweep_regions;

/// pi-multiple offsets (spec §4.C "W_Xa/W_Ya/W_Za"): irrational relative to
/// any axis-aligned wall plane, so a waypoint placed at a cell center plus
/// this offset essentially never lands exactly on a wall by construction.
/// Bounded perturbation (below) still exists for the pathological case of a
/// wall plane that isn't axis-aligned with the lattice.
const W_XA: f64 = std::f64::consts::PI * 1e-10;
const W_YA: f64 = std::f64::consts::PI * 1.3e-10;
const W_ZA: f64 = std::f64::consts::PI * 1.7e-10;

#[derive(Clone, Debug)]
pub struct Waypoint {
    pub subvolume: SubvolumeId,
    pub loc: Vector3,
    /// Regions enclosing this waypoint, sorted by id.
    pub regions: Vec<RegionId>,
    /// Regions an even number of walls away that would otherwise have
    /// cancelled out a real enclosure (spec §9 design notes); kept to let
    /// `merge_enter_leave` cancel correctly on the next incremental step.
    pub antiregions: Vec<RegionId>,
}

/// `place_waypoints(lattice) -> waypoints[subvolume]`: one waypoint per cell
/// center, offset by the pi-multiples above and perturbed further if it
/// still lands within `eps` of an incident wall plane.
pub fn place_waypoints(
    lattice: &SubvolumeLattice,
    eps: f64,
    near_wall: impl Fn(Vector3) -> bool,
) -> Result<Vec<Waypoint>> {
    let (nx, ny, nz) = lattice.dims();
    let mut waypoints = Vec::with_capacity(nx * ny * nz);

    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let id = lattice.index_of(i, j, k);
                let (llf, urb) = lattice.bounds(id);
                let center = Vector3::new((llf.x + urb.x) * 0.5, (llf.y + urb.y) * 0.5, (llf.z + urb.z) * 0.5);
                let loc = place_one(center, eps, &near_wall)?;
                waypoints.push(Waypoint { subvolume: id, loc, regions: Vec::new(), antiregions: Vec::new() });
            }
        }
    }
    Ok(waypoints)
}

fn place_one(center: Vector3, eps: f64, near_wall: &impl Fn(Vector3) -> bool) -> Result<Vector3> {
    let mut candidate = Vector3::new(center.x + W_XA, center.y + W_YA, center.z + W_ZA);
    for attempt in 0..MAX_WAYPOINT_PERTURB_ATTEMPTS {
        if !near_wall(candidate) {
            return Ok(candidate);
        }
        let scale = eps * (attempt as f64 + 2.0) * 16.0;
        candidate = Vector3::new(center.x + W_XA * scale, center.y + W_YA * scale, center.z + W_ZA * scale);
    }
    Err(CountError::WaypointStuckOnWall { subvolume: 0, attempts: MAX_WAYPOINT_PERTURB_ATTEMPTS })
}

/// `init_waypoint_enclosures`: cells are visited in lattice order, fastest
/// axis z (spec §4.C). The first cell of every `(i, j)` column (`k == 0`)
/// has no real z-neighbor to inherit from, so it is resolved fresh from a
/// reference point "outside" the mesh at this column's own `(x, y)` and a z
/// deep in the `-z` exterior — not from whatever column happened to be
/// swept last. Every other cell (`k > 0`) inherits its z-neighbor's
/// enclosure lists (cloned, so later edits don't alias) and sweeps only the
/// short segment between the two waypoints.
pub fn init_waypoint_enclosures(
    lattice: &SubvolumeLattice,
    waypoints: &mut [Waypoint],
    eps: f64,
    max_steps: usize,
    mut walls_of: impl FnMut(SubvolumeId) -> Vec<Wall>,
) -> Result<()> {
    if waypoints.is_empty() {
        return Ok(());
    }

    // Pull every cell's walls up front into an owned cache: `sweep_regions`
    // needs a borrow it can hand out across many marching steps, and a
    // cache entry outlives any single closure call, unlike a fresh `Vec`
    // built per lookup.
    let (nx, ny, nz) = lattice.dims();
    let mut walls_cache: Vec<Vec<Wall>> = Vec::with_capacity(nx * ny * nz);
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                walls_cache.push(walls_of(lattice.index_of(i, j, k)));
            }
        }
    }

    // z deep enough below the lowest coarse boundary that no real geometry
    // can live there; used as the per-column exterior reference below.
    let z_exterior = lattice.z.lower(0) - 1.0;

    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let idx = lattice.index_of(i, j, k).index();
                if k == 0 {
                    let reference = Vector3::new(waypoints[idx].loc.x, waypoints[idx].loc.y, z_exterior);
                    let (regions, antiregions) = sweep_regions(lattice, reference, waypoints[idx].loc, max_steps, eps, |id| {
                        walls_cache[id.index()].as_slice()
                    })?;
                    waypoints[idx].regions = regions;
                    waypoints[idx].antiregions = antiregions;
                } else {
                    let prev_idx = lattice.index_of(i, j, k - 1).index();
                    let prev_loc = waypoints[prev_idx].loc;
                    let mut regions = waypoints[prev_idx].regions.clone();
                    let mut antiregions = waypoints[prev_idx].antiregions.clone();
                    let (enter, leave) = sweep_regions(lattice, prev_loc, waypoints[idx].loc, max_steps, eps, |id| {
                        walls_cache[id.index()].as_slice()
                    })?;
                    crate::regionset::merge_enter_leave(&mut regions, &mut antiregions, enter, leave);
                    waypoints[idx].regions = regions;
                    waypoints[idx].antiregions = antiregions;
                }
            }
        }
    }

    Ok(())
}

/// Whether a candidate location is within `eps` of any vertex of `tri`,
/// used as the default `near_wall` predicate by callers that only have
/// flat wall lists handy rather than a spatial index.
pub fn near_any_wall_plane(point: Vector3, walls: &[Wall], eps: f64) -> bool {
    walls.iter().any(|w| {
        let dist = w.triangle.normal.dot(point) - w.triangle.d;
        eps_equals(eps, dist, 0.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FINE_PARTITION_LEN;
    use crate::geometry::PartitionTable;

    fn unit_partition() -> PartitionTable {
        PartitionTable::new(vec![0.0, 1.0, 2.0], vec![0.0; FINE_PARTITION_LEN])
    }

    fn lattice() -> SubvolumeLattice {
        SubvolumeLattice::new(unit_partition(), unit_partition(), unit_partition())
    }

    #[test]
    fn placement_avoids_wall_planes() {
        let l = lattice();
        let waypoints = place_waypoints(&l, 1e-9, |_| false).unwrap();
        assert_eq!(waypoints.len(), 8);
        for wp in &waypoints {
            assert_ne!(wp.loc, Vector3::ZERO);
        }
    }

    #[test]
    fn placement_fails_when_every_candidate_sits_on_a_wall() {
        let l = lattice();
        let result = place_waypoints(&l, 1e-9, |_| true);
        assert!(matches!(result, Err(CountError::WaypointStuckOnWall { .. })));
    }

    #[test]
    fn enclosures_init_with_no_walls_leaves_every_waypoint_empty() {
        let l = lattice();
        let mut waypoints = place_waypoints(&l, 1e-9, |_| false).unwrap();
        init_waypoint_enclosures(&l, &mut waypoints, 1e-9, 1000, |_| Vec::new()).unwrap();
        for wp in &waypoints {
            assert!(wp.regions.is_empty());
        }
    }

    #[test]
    fn column_boundary_resets_instead_of_inheriting_a_foreign_columns_enclosure() {
        use crate::geometry::Triangle;
        use crate::ids::WallId;
        use crate::mesh::RegionFlags;

        // A 2x1x2 lattice: column (i=0) gets a roof at z=1 spanning only its
        // own x,y footprint; column (i=1) has no geometry at all.
        let x = PartitionTable::new(vec![0.0, 1.0, 2.0], vec![0.0; FINE_PARTITION_LEN]);
        let y = PartitionTable::new(vec![0.0, 1.0], vec![0.0; FINE_PARTITION_LEN]);
        let z = PartitionTable::new(vec![0.0, 1.0, 2.0], vec![0.0; FINE_PARTITION_LEN]);
        let l = SubvolumeLattice::new(x, y, z);

        let region = RegionId(0);
        let tri_a = Triangle::new([Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 1.0, 1.0), Vector3::new(1.0, 0.0, 1.0)]);
        let tri_b = Triangle::new([Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 1.0, 1.0), Vector3::new(1.0, 1.0, 1.0)]);
        let walls = vec![
            Wall::new(WallId(0), tri_a, vec![region], 0.5, |_| RegionFlags::NONE),
            Wall::new(WallId(1), tri_b, vec![region], 0.5, |_| RegionFlags::NONE),
        ];

        let mut waypoints = place_waypoints(&l, 1e-9, |_| false).unwrap();
        init_waypoint_enclosures(&l, &mut waypoints, 1e-9, 1000, |_| walls.clone()).unwrap();

        let col0_lower = &waypoints[l.index_of(0, 0, 0).index()];
        let col0_upper = &waypoints[l.index_of(0, 0, 1).index()];
        let col1_lower = &waypoints[l.index_of(1, 0, 0).index()];
        let col1_upper = &waypoints[l.index_of(1, 0, 1).index()];

        assert!(col0_lower.regions.is_empty());
        assert_eq!(col0_upper.regions, vec![region]);
        assert!(col1_lower.regions.is_empty(), "column 1 must not inherit column 0's leftover enclosure");
        assert!(col1_upper.regions.is_empty());
    }
}
