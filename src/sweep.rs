//! Shared ray-sweep helper used by both waypoint enclosure initialization
//! (component C) and the from-scratch enclosure query (component D), so the
//! REDO-retry logic is written once instead of duplicated across two
//! near-identical walks (spec §4.C, §4.D both describe the same marching
//! loop against a different starting context).

use crate::config::MAX_WAYPOINT_PERTURB_ATTEMPTS;
use crate::error::{CountError, Result};
use crate::geometry::{classify, Classification, RayWalk, SubvolumeLattice, Vector3};
use crate::ids::RegionId;
use crate::mesh::Wall;
use crate::regionset;

/// One classified crossing along the sweep, with its wall's full region
/// membership so the caller can fold it into an enter/leave set.
struct Crossing<'w> {
    front: bool,
    wall: &'w Wall,
}

/// Walk from `start` to `end` through `lattice`, classifying every wall in
/// every cell crossed via `walls_of`. On a `Redo` classification (a hit
/// grazing an edge or vertex within `eps`), the entire walk restarts from
/// `start` with `end` perturbed by a small multiple of `eps` along an axis
/// not aligned with the original delta, up to
/// [`MAX_WAYPOINT_PERTURB_ATTEMPTS`] times — mirroring the original's
/// retry-the-whole-ray behavior, since a grazing hit can invalidate crossings
/// already counted earlier in the same walk.
///
/// Returns the net set of regions entered and left along the walk, each
/// deduplicated against mutual cancellation (spec §4.C `clean_region_lists`).
pub fn sweep_regions<'w>(
    lattice: &SubvolumeLattice,
    start: Vector3,
    end: Vector3,
    max_steps: usize,
    eps: f64,
    mut walls_of: impl FnMut(crate::ids::SubvolumeId) -> &'w [Wall],
) -> Result<(Vec<RegionId>, Vec<RegionId>)> {
    let mut target = end;
    for attempt in 0..MAX_WAYPOINT_PERTURB_ATTEMPTS {
        match try_sweep(lattice, start, target, max_steps, eps, &mut walls_of) {
            Ok(result) => return Ok(result),
            Err(SweepOutcome::Redo) => {
                let jitter = eps * (attempt as f64 + 1.0) * 8.0;
                target = Vector3::new(target.x + jitter, target.y - jitter, target.z + jitter * 0.5);
            }
            Err(SweepOutcome::Fatal(e)) => return Err(e),
        }
    }
    Err(CountError::WaypointStuckOnWall { subvolume: lattice.cell_of(start).index(), attempts: MAX_WAYPOINT_PERTURB_ATTEMPTS })
}

enum SweepOutcome {
    Redo,
    Fatal(CountError),
}

fn try_sweep<'w>(
    lattice: &SubvolumeLattice,
    start: Vector3,
    end: Vector3,
    max_steps: usize,
    eps: f64,
    walls_of: &mut impl FnMut(crate::ids::SubvolumeId) -> &'w [Wall],
) -> std::result::Result<(Vec<RegionId>, Vec<RegionId>), SweepOutcome> {
    let delta = end - start;
    let denom = delta.dot(delta);
    if denom == 0.0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut regions = Vec::new();
    let mut antiregions = Vec::new();

    for (cell, seg_start, seg_end) in RayWalk::new(lattice, start, end, max_steps) {
        let t_start = (seg_start - start).dot(delta) / denom;
        let t_end = (seg_end - start).dot(delta) / denom;

        let mut enter = Vec::new();
        let mut leave = Vec::new();

        for wall in walls_of(cell) {
            match classify(start, delta, &wall.triangle, eps) {
                Classification::Redo => return Err(SweepOutcome::Redo),
                Classification::Miss => {}
                Classification::Front { t, .. } if t >= t_start && t < t_end => {
                    fold_crossing(&mut enter, &mut leave, Crossing { front: true, wall });
                }
                Classification::Back { t, .. } if t >= t_start && t < t_end => {
                    fold_crossing(&mut enter, &mut leave, Crossing { front: false, wall });
                }
                _ => {}
            }
        }

        regionset::merge_enter_leave(&mut regions, &mut antiregions, enter, leave);
    }

    Ok((regions, antiregions))
}

/// A FRONT hit enters every region on the wall; a BACK hit leaves them
/// (spec §4.C step 3). `merge_enter_leave` is applied once per cell by the
/// caller, so this just appends to the right list.
fn fold_crossing(enter: &mut Vec<RegionId>, leave: &mut Vec<RegionId>, crossing: Crossing<'_>) {
    let target = if crossing.front { &mut *enter } else { &mut *leave };
    for &region in &crossing.wall.regions {
        target.push(region);
    }
}
