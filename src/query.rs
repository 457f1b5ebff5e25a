//! Component D — enclosure query.
//!
//! The public surface over component C's precomputed waypoints:
//! "what regions enclose this point or this surface molecule, right now."
//! A 3D-mobile molecule's query walks from the nearest waypoint to the
//! molecule's position and folds the short delta onto the waypoint's
//! already-known enclosure (spec §4.D); a surface-bound molecule skips the
//! geometry entirely and reads its wall's region list directly, since a
//! point sitting exactly on a wall is enclosed by whatever that wall already
//! belongs to. Finding the enclosing regions is only half of spec §4.D: the
//! caller always wants `n` applied to whatever counter sits on each of
//! those regions in the same call, so this also drives the mutation side
//! through `update::apply_content_delta` rather than leaving it to whoever
//! reads the returned list.

use crate::counter::{CounterTable, Target};
use crate::error::Result;
use crate::geometry::{SubvolumeLattice, Vector3};
use crate::ids::RegionId;
use crate::mesh::Wall;
use crate::regionset;
use crate::scheduler::EventRecord;
use crate::sweep::sweep_regions;
use crate::trigger::OutputWriter;
use crate::update;
use crate::waypoint::Waypoint;

/// `count_region_from_scratch` equivalent: full reconstruction of the set of
/// regions enclosing `position`, then apply `n` to whichever of those
/// regions has a matching counter for `target` (spec §4.D steps 2-4). Used
/// at molecule-placement time or after a large jump invalidates incremental
/// tracking.
///
/// `my_wall`, when set, names the wall this point already sits on (a
/// surface molecule); its own region list is used directly instead of
/// walking the geometry, per spec §4.D's exclusion rule — those regions are
/// already known from wall membership rather than from crossing it, and the
/// same exclusion carries through to which regions get mutated below.
#[allow(clippy::too_many_arguments)]
pub fn count_from_scratch<W: OutputWriter>(
    lattice: &SubvolumeLattice,
    waypoints: &[Waypoint],
    position: Vector3,
    my_wall: Option<&Wall>,
    eps: f64,
    max_steps: usize,
    walls_of: impl FnMut(crate::ids::SubvolumeId) -> Vec<Wall>,
    table: &mut CounterTable,
    target: Target,
    target_hash: u64,
    n: i64,
    orient: Option<i8>,
    region_hash: impl Fn(RegionId) -> u64,
    writer: &mut W,
    event: EventRecord,
) -> Result<Vec<RegionId>> {
    let regions = if let Some(wall) = my_wall {
        wall.regions.clone()
    } else {
        let cell = lattice.cell_of(position);
        let waypoint = &waypoints[cell.index()];

        let mut walls_of = walls_of;
        let mut walls_cache: std::collections::HashMap<usize, Vec<Wall>> = std::collections::HashMap::new();
        let (enter, leave) = sweep_regions(lattice, waypoint.loc, position, max_steps, eps, |id| {
            let slice = walls_cache.entry(id.index()).or_insert_with(|| walls_of(id)).as_slice();
            // SAFETY: entries are only ever inserted, never removed or
            // overwritten, and a `Vec`'s heap buffer doesn't move when the
            // surrounding `HashMap` rehashes — so this slice stays valid
            // for as long as `walls_cache` itself does, which outlives the
            // `sweep_regions` call below.
            unsafe { std::slice::from_raw_parts(slice.as_ptr(), slice.len()) }
        })?;

        let mut regions = waypoint.regions.clone();
        let mut antiregions = waypoint.antiregions.clone();
        regionset::merge_enter_leave(&mut regions, &mut antiregions, enter, leave);
        regions
    };

    update::apply_content_delta(table, target, target_hash, &regions, n, orient, region_hash, writer, position, event)?;
    Ok(regions)
}
