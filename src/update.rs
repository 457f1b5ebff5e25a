//! Component F — incremental update paths.
//!
//! The hot path: a molecule crosses a wall, moves between two surface
//! elements, or is created/destroyed. Each case updates only the counters
//! whose regions are actually affected rather than re-deriving the full
//! enclosure (that's component D's job, used only when incremental tracking
//! can't be trusted), and dispatches any TRIG listener watching the same
//! target/region/orientation so component G fires from the same call that
//! updated the MOL/RXN counter, not just from tests driving it directly
//! (spec §4.F step 5, §4.G).

use crate::config::{SimulationConfig, C_UNIT};
use crate::counter::{CounterData, CounterTable, Flavor, OrientationFilter, Target};
use crate::error::Result;
use crate::geometry::Vector3;
use crate::ids::RegionId;
use crate::mesh::{RegionFlags, Wall};
use crate::regionset;
use crate::scheduler::EventRecord;
use crate::trigger::{fire_count_event, FiredEvent, OutputWriter};

/// Direction a molecule crossed a wall, relative to the wall's outward
/// normal (spec §3, §4.F).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CrossDirection {
    Front,
    Back,
}

const ORIENTATION_FILTERS: [OrientationFilter; 4] =
    [OrientationFilter::NotSet, OrientationFilter::Any, OrientationFilter::Positive, OrientationFilter::Negative];

/// Fire every `(event, count)` pair at the TRIG counter matching
/// `target`/`region`/`orientation_filter`, if a listener is registered
/// there; a no-op otherwise, same as calling `fire_count_event` against a
/// region with no TRIG counter at all.
#[allow(clippy::too_many_arguments)]
fn dispatch_trig<W: OutputWriter>(
    table: &mut CounterTable,
    target: Target,
    target_hash: u64,
    region: RegionId,
    region_hash: u64,
    orientation_filter: OrientationFilter,
    writer: &mut W,
    loc: Vector3,
    event: EventRecord,
    orient: Option<i8>,
    events: &[(FiredEvent, Option<i64>)],
) -> Result<()> {
    if let Some(counter) = table.find_mut(target, target_hash, region, region_hash, Flavor::Trig, orientation_filter) {
        if let CounterData::Trig { listeners, loc: stamped, .. } = &mut counter.data {
            *stamped = loc;
            for &(what, count) in events {
                fire_count_event(listeners, writer, what, 1, loc, event.t_iteration, event.event_time, orient, count)?;
            }
        }
    }
    Ok(())
}

/// `count_region_update` equivalent: a molecule of `target` crossed `wall`
/// moving `direction`. For every region on the wall that is tracking this
/// target, bump `n_at`/`n_enclosed` by the crossing's sign, accumulate the
/// concentration-normalized `scaled_hits` term used by hit-rate reporting,
/// and dispatch any matching TRIG listener (spec §4.F).
#[allow(clippy::too_many_arguments)]
pub fn count_region_update<W: OutputWriter>(
    table: &mut CounterTable,
    target: Target,
    target_hash: u64,
    wall: &Wall,
    direction: CrossDirection,
    orient: Option<i8>,
    config: &SimulationConfig,
    region_hash: impl Fn(RegionId) -> u64,
    writer: &mut W,
    loc: Vector3,
    event: EventRecord,
) -> Result<()> {
    if !wall.flags.intersects(RegionFlags::COUNT_SOME) {
        return Ok(());
    }

    let sign: i64 = match direction {
        CrossDirection::Front => 1,
        CrossDirection::Back => -1,
    };
    // time_step * C_unit / (space_step * length_unit^3 * area): the
    // concentration-normalized per-hit increment (spec §4.F;
    // original_source/src/count_util.c's count_region_update).
    let area = wall.area.max(f64::MIN_POSITIVE);
    let scaled_hits_delta = config.time_step * C_UNIT / (config.space_step * config.length_unit.powi(3) * area);
    let (hit_event, cross_event) = match direction {
        CrossDirection::Front => (FiredEvent::FrontHits, FiredEvent::FrontCrossings),
        CrossDirection::Back => (FiredEvent::BackHits, FiredEvent::BackCrossings),
    };

    for &region in &wall.regions {
        let rh = region_hash(region);
        for orientation_filter in ORIENTATION_FILTERS {
            if !orientation_filter.matches(orient) {
                continue;
            }

            let mut new_n_at = None;
            if let Some(counter) = table.find_mut(target, target_hash, region, rh, Flavor::Mol, orientation_filter) {
                if let CounterData::Mol { n_at, n_enclosed, front_hits, back_hits, front_to_back, back_to_front, scaled_hits } = &mut counter.data {
                    *n_at += sign;
                    *n_enclosed += sign;
                    *scaled_hits += scaled_hits_delta;
                    match direction {
                        CrossDirection::Front => {
                            *front_hits += 1.0;
                            *front_to_back += 1.0;
                        }
                        CrossDirection::Back => {
                            *back_hits += 1.0;
                            *back_to_front += 1.0;
                        }
                    }
                    new_n_at = Some(*n_at);
                }
            }

            dispatch_trig(table, target, target_hash, region, rh, orientation_filter, writer, loc, event, orient, &[(hit_event, None), (cross_event, None)])?;
            if let Some(n_at) = new_n_at {
                dispatch_trig(table, target, target_hash, region, rh, orientation_filter, writer, loc, event, orient, &[(FiredEvent::Contents, Some(n_at))])?;
            }
        }
    }
    Ok(())
}

/// `count_moved_grid_mol` equivalent: a surface molecule hops from
/// `old_wall` to `new_wall` without crossing either wall's boundary as a
/// volume molecule would. Only regions present on exactly one of the two
/// walls change: the symmetric difference is the delta (spec §4.F).
#[allow(clippy::too_many_arguments)]
pub fn count_moved_grid_mol<W: OutputWriter>(
    table: &mut CounterTable,
    target: Target,
    target_hash: u64,
    old_wall: &Wall,
    new_wall: &Wall,
    orient: Option<i8>,
    region_hash: impl Fn(RegionId) -> u64 + Copy,
    writer: &mut W,
    loc: Vector3,
    event: EventRecord,
) -> Result<()> {
    let (left, entered) = regionset::symmetric_difference(&old_wall.regions, &new_wall.regions);
    apply_content_delta(table, target, target_hash, &entered, 1, orient, region_hash, writer, loc, event)?;
    apply_content_delta(table, target, target_hash, &left, -1, orient, region_hash, writer, loc, event)?;
    Ok(())
}

/// In-place content count change: a molecule was created or destroyed
/// while already known to sit in `regions` (no geometry walk needed), or a
/// surface molecule moved between two walls. Dispatches a CONTENTS TRIG
/// event for any listener watching the affected region (spec §4.F).
#[allow(clippy::too_many_arguments)]
pub fn apply_content_delta<W: OutputWriter>(
    table: &mut CounterTable,
    target: Target,
    target_hash: u64,
    regions: &[RegionId],
    delta: i64,
    orient: Option<i8>,
    region_hash: impl Fn(RegionId) -> u64,
    writer: &mut W,
    loc: Vector3,
    event: EventRecord,
) -> Result<()> {
    for &region in regions {
        let rh = region_hash(region);
        for orientation_filter in ORIENTATION_FILTERS {
            if !orientation_filter.matches(orient) {
                continue;
            }

            let mut new_n_at = None;
            if let Some(counter) = table.find_mut(target, target_hash, region, rh, Flavor::Mol, orientation_filter) {
                if let CounterData::Mol { n_at, .. } = &mut counter.data {
                    *n_at += delta;
                    new_n_at = Some(*n_at);
                }
            }
            if let Some(n_at) = new_n_at {
                dispatch_trig(table, target, target_hash, region, rh, orientation_filter, writer, loc, event, orient, &[(FiredEvent::Contents, Some(n_at))])?;
            }
        }
    }
    Ok(())
}

/// Reaction-pathway content update: a reaction `target` fired at a point
/// already known to lie in `regions`. Dispatches an RXNS TRIG event for any
/// listener watching the affected region (spec §4.F).
pub fn count_rxn_event<W: OutputWriter>(
    table: &mut CounterTable,
    target: Target,
    target_hash: u64,
    regions: &[RegionId],
    region_hash: impl Fn(RegionId) -> u64,
    writer: &mut W,
    loc: Vector3,
    event: EventRecord,
) -> Result<()> {
    for &region in regions {
        let rh = region_hash(region);
        if let Some(counter) = table.find_mut(target, target_hash, region, rh, Flavor::Rxn, OrientationFilter::NotSet) {
            if let CounterData::Rxn { n_rxn_at, n_rxn_enclosed } = &mut counter.data {
                *n_rxn_at += 1.0;
                *n_rxn_enclosed += 1.0;
            }
        }
        dispatch_trig(table, target, target_hash, region, rh, OrientationFilter::NotSet, writer, loc, event, None, &[(FiredEvent::Rxns, None)])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::Counter;
    use crate::geometry::Triangle;
    use crate::ids::{SpeciesId, WallId};
    use crate::output::MemoryOutputWriter;
    use crate::trigger::{ReportKind, ReportType, TriggerListener};

    fn wall_with_region(region: RegionId, area: f64) -> Wall {
        Wall::new(
            WallId(0),
            Triangle::new([Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)]),
            vec![region],
            area,
            |_| RegionFlags::COUNT_HITS,
        )
    }

    #[test]
    fn front_crossing_increments_n_at_and_back_crossing_decrements() {
        let mut table = CounterTable::new(16);
        let target = Target::Species(SpeciesId(1));
        let region = RegionId(2);
        table.insert(region.0 as u64, Counter { target, region, orientation_filter: OrientationFilter::NotSet, data: CounterData::new_mol() });
        let wall = wall_with_region(region, 1.0);
        let config = SimulationConfig::default();
        let mut writer = MemoryOutputWriter::new();
        let region_hash = |r: RegionId| r.0 as u64;

        count_region_update(&mut table, target, target.hash(), &wall, CrossDirection::Front, None, &config, region_hash, &mut writer, Vector3::ZERO, EventRecord::new(0.0, 0.0)).unwrap();
        count_region_update(&mut table, target, target.hash(), &wall, CrossDirection::Front, None, &config, region_hash, &mut writer, Vector3::ZERO, EventRecord::new(0.0, 0.0)).unwrap();
        count_region_update(&mut table, target, target.hash(), &wall, CrossDirection::Back, None, &config, region_hash, &mut writer, Vector3::ZERO, EventRecord::new(0.0, 0.0)).unwrap();

        let counter = table.find(target, target.hash(), region, region.0 as u64, Flavor::Mol, OrientationFilter::NotSet).unwrap();
        match counter.data {
            CounterData::Mol { n_at, front_hits, back_hits, .. } => {
                assert_eq!(n_at, 1);
                assert_eq!(front_hits, 2.0);
                assert_eq!(back_hits, 1.0);
            }
            _ => panic!("expected Mol data"),
        }
    }

    #[test]
    fn crossings_conservation_matches_net_forward_crossings() {
        // spec §8: front_to_back minus back_to_front must equal the net
        // number of forward crossings, which requires each crossing to
        // actually increment its counter rather than leave it at zero.
        let mut table = CounterTable::new(16);
        let target = Target::Species(SpeciesId(9));
        let region = RegionId(0);
        table.insert(region.0 as u64, Counter { target, region, orientation_filter: OrientationFilter::NotSet, data: CounterData::new_mol() });
        let wall = wall_with_region(region, 1.0);
        let config = SimulationConfig::default();
        let mut writer = MemoryOutputWriter::new();
        let region_hash = |r: RegionId| r.0 as u64;

        for direction in [CrossDirection::Front, CrossDirection::Front, CrossDirection::Back] {
            count_region_update(&mut table, target, target.hash(), &wall, direction, None, &config, region_hash, &mut writer, Vector3::ZERO, EventRecord::new(0.0, 0.0)).unwrap();
        }

        let counter = table.find(target, target.hash(), region, region.0 as u64, Flavor::Mol, OrientationFilter::NotSet).unwrap();
        match counter.data {
            CounterData::Mol { front_to_back, back_to_front, .. } => {
                assert_eq!(front_to_back - back_to_front, 1.0);
            }
            _ => panic!("expected Mol data"),
        }
    }

    #[test]
    fn crossing_dispatches_matching_trig_listeners() {
        let mut table = CounterTable::new(16);
        let target = Target::Species(SpeciesId(3));
        let region = RegionId(0);
        table.insert(region.0 as u64, Counter { target, region, orientation_filter: OrientationFilter::NotSet, data: CounterData::new_mol() });
        table.insert(
            region.0 as u64,
            Counter {
                target,
                region,
                orientation_filter: OrientationFilter::NotSet,
                data: CounterData::Trig {
                    t_event: 0.0,
                    loc: Vector3::ZERO,
                    orient: 0,
                    listeners: vec![
                        TriggerListener::new(ReportType::new(ReportKind::FrontHits), "hits", 0, 100, false),
                        TriggerListener::new(ReportType::new(ReportKind::Contents), "contents", 1, 100, false),
                    ],
                },
            },
        );
        let wall = wall_with_region(region, 1.0);
        let config = SimulationConfig::default();
        let mut writer = MemoryOutputWriter::new();
        let region_hash = |r: RegionId| r.0 as u64;

        count_region_update(&mut table, target, target.hash(), &wall, CrossDirection::Front, None, &config, region_hash, &mut writer, Vector3::ZERO, EventRecord::new(0.0, 0.0)).unwrap();

        let counter = table.find(target, target.hash(), region, region.0 as u64, Flavor::Trig, OrientationFilter::NotSet).unwrap();
        match &counter.data {
            CounterData::Trig { listeners, .. } => {
                assert_eq!(listeners[0].buffer.len(), 1, "FrontHits listener should have fired once");
                assert_eq!(listeners[1].buffer.len(), 1, "Contents listener should have fired once");
                assert_eq!(listeners[1].buffer[0].count, Some(1));
            }
            _ => panic!("expected Trig data"),
        }
    }

    #[test]
    fn grid_move_only_touches_regions_unique_to_one_wall() {
        let mut table = CounterTable::new(16);
        let target = Target::Species(SpeciesId(4));
        let shared = RegionId(0);
        let only_old = RegionId(1);
        let only_new = RegionId(2);
        for r in [shared, only_old, only_new] {
            table.insert(r.0 as u64, Counter { target, region: r, orientation_filter: OrientationFilter::NotSet, data: CounterData::new_mol() });
        }
        let old_wall = Wall::new(
            WallId(0),
            Triangle::new([Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)]),
            vec![shared, only_old],
            1.0,
            |_| RegionFlags::NONE,
        );
        let new_wall = Wall::new(
            WallId(1),
            Triangle::new([Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)]),
            vec![shared, only_new],
            1.0,
            |_| RegionFlags::NONE,
        );
        let mut writer = MemoryOutputWriter::new();

        count_moved_grid_mol(&mut table, target, target.hash(), &old_wall, &new_wall, None, |r: RegionId| r.0 as u64, &mut writer, Vector3::ZERO, EventRecord::new(0.0, 0.0)).unwrap();

        let get = |r: RegionId| match table.find(target, target.hash(), r, r.0 as u64, Flavor::Mol, OrientationFilter::NotSet).unwrap().data {
            CounterData::Mol { n_at, .. } => n_at,
            _ => unreachable!(),
        };
        assert_eq!(get(shared), 0);
        assert_eq!(get(only_old), -1);
        assert_eq!(get(only_new), 1);
    }

    #[test]
    fn rxn_event_dispatches_rxns_trig_listener() {
        let mut table = CounterTable::new(16);
        let target = Target::Pathway(crate::ids::PathwayId(0));
        let region = RegionId(5);
        table.insert(region.0 as u64, Counter { target, region, orientation_filter: OrientationFilter::NotSet, data: CounterData::new_rxn() });
        table.insert(
            region.0 as u64,
            Counter {
                target,
                region,
                orientation_filter: OrientationFilter::NotSet,
                data: CounterData::Trig { t_event: 0.0, loc: Vector3::ZERO, orient: 0, listeners: vec![TriggerListener::new(ReportType::new(ReportKind::Rxns), "rxns", 0, 100, false)] },
            },
        );
        let mut writer = MemoryOutputWriter::new();

        count_rxn_event(&mut table, target, target.hash(), &[region], |r: RegionId| r.0 as u64, &mut writer, Vector3::ZERO, EventRecord::new(0.0, 0.0)).unwrap();

        let counter = table.find(target, target.hash(), region, region.0 as u64, Flavor::Rxn, OrientationFilter::NotSet).unwrap();
        assert!(matches!(counter.data, CounterData::Rxn { n_rxn_at, .. } if n_rxn_at == 1.0));
        let trig = table.find(target, target.hash(), region, region.0 as u64, Flavor::Trig, OrientationFilter::NotSet).unwrap();
        match &trig.data {
            CounterData::Trig { listeners, .. } => assert_eq!(listeners[0].buffer.len(), 1),
            _ => panic!("expected Trig data"),
        }
    }
}
