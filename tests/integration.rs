//! End-to-end scenarios wiring components A through H together through
//! `SimulationContext`, rather than exercising each module in isolation.

use spatial_counter::config::{SimulationConfig, FINE_PARTITION_LEN};
use spatial_counter::context::SimulationContext;
use spatial_counter::counter::{CounterData, Flavor, OrientationFilter, Target};
use spatial_counter::geometry::{PartitionTable, SubvolumeLattice, Triangle, Vector3};
use spatial_counter::ids::{RegionId, SpeciesId, SubvolumeId, WallId};
use spatial_counter::mesh::{Region, RegionFlags, Wall};
use spatial_counter::output::MemoryOutputWriter;
use spatial_counter::scheduler::EventRecord;
use spatial_counter::trigger::{fire_count_event, FiredEvent, ReportKind, ReportType, TriggerListener};
use spatial_counter::update::CrossDirection;
use spatial_counter::waypoint::Waypoint;

fn single_cell_lattice() -> SubvolumeLattice {
    let partition = PartitionTable::new(vec![-2.0, 2.0], vec![0.0; FINE_PARTITION_LEN]);
    SubvolumeLattice::new(partition.clone(), partition.clone(), partition)
}

fn build_context(walls: Vec<Wall>, regions: Vec<Region>) -> SimulationContext<MemoryOutputWriter> {
    let lattice = single_cell_lattice();
    let waypoint = Waypoint { subvolume: SubvolumeId(0), loc: Vector3::new(-1.9, -1.9, -1.9), regions: Vec::new(), antiregions: Vec::new() };
    SimulationContext::new(SimulationConfig::default(), lattice, walls, regions, vec![waypoint], MemoryOutputWriter::new())
}

#[test]
fn wall_crossing_update_then_trigger_records_a_contents_line() {
    let region_id = RegionId(0);
    let region = Region::new(region_id, "inside", 77, RegionFlags::COUNT_CONTENTS | RegionFlags::IS_TRIGGER, 4.0);
    let wall = Wall::new(
        WallId(0),
        Triangle::new([Vector3::new(-1.0, -1.0, 0.0), Vector3::new(1.0, -1.0, 0.0), Vector3::new(0.0, 1.0, 0.0)]),
        vec![region_id],
        2.0,
        |_| RegionFlags::COUNT_CONTENTS | RegionFlags::IS_TRIGGER,
    );
    let mut ctx = build_context(vec![wall], vec![region]);

    let target = Target::Species(SpeciesId(5));
    ctx.register_trigger_listener(
        target,
        region_id,
        OrientationFilter::NotSet,
        TriggerListener::new(ReportType::new(ReportKind::Contents), "c_in", 0, 8, true),
    );

    ctx.count_region_update(target, WallId(0), CrossDirection::Front, None, Vector3::ZERO, EventRecord::new(0.0, 0.0)).unwrap();

    let hash = target.hash();
    let region_hash = ctx.regions[0].hashval;
    let counter = ctx.counters.find_mut(target, hash, region_id, region_hash, Flavor::Trig, OrientationFilter::NotSet).unwrap();
    let (listeners, loc) = match &mut counter.data {
        CounterData::Trig { listeners, loc, .. } => (listeners, *loc),
        _ => unreachable!(),
    };

    fire_count_event(listeners, &mut ctx.writer, FiredEvent::Contents, 1, loc, 0.0, 0.5, Some(1), Some(1)).unwrap();
    fire_count_event(listeners, &mut ctx.writer, FiredEvent::Contents, 1, loc, 1.0, 1.5, Some(1), Some(1)).unwrap();

    assert_eq!(listeners[0].buffer.len(), 2, "buffer holds both records, capacity 8 not yet reached");
    assert_eq!(listeners[0].buffer[0].format_line(), "0 [0.5 ]0 0 0 1 1 c_in");
}

#[test]
fn unit_cube_scratch_query_finds_the_enclosing_region_from_a_waypoint() {
    let region_id = RegionId(9);
    // Two triangles forming the z=0 face of a box the waypoint sits below
    // and the query point sits above.
    // Wound so the outward normal points -z: the waypoint sits below the
    // plane (outside), the query point above it (inside), so the upward
    // ray crosses against the outward normal and registers as FRONT/enter.
    let tri_a = Triangle::new([Vector3::new(-1.0, -1.0, 0.0), Vector3::new(1.0, 1.0, 0.0), Vector3::new(1.0, -1.0, 0.0)]);
    let tri_b = Triangle::new([Vector3::new(-1.0, -1.0, 0.0), Vector3::new(-1.0, 1.0, 0.0), Vector3::new(1.0, 1.0, 0.0)]);
    let wall_a = Wall::new(WallId(0), tri_a, vec![region_id], 2.0, |_| RegionFlags::COUNT_ENCLOSED);
    let wall_b = Wall::new(WallId(1), tri_b, vec![region_id], 2.0, |_| RegionFlags::COUNT_ENCLOSED);
    let region = Region::new(region_id, "box", 11, RegionFlags::COUNT_ENCLOSED, 4.0);
    let mut ctx = build_context(vec![wall_a, wall_b], vec![region]);

    let mol = spatial_counter::mesh::MoleculeRef {
        species: SpeciesId(0),
        orient: None,
        position: Vector3::new(0.3, 0.1, 1.0),
        on_grid: false,
        current_wall: None,
    };
    let target = Target::Species(SpeciesId(0));
    let regions = ctx.count_region_from_scratch(target, mol, 1, EventRecord::new(0.0, 0.0)).unwrap();
    assert_eq!(regions, vec![region_id]);
}

#[test]
fn emergency_flush_drains_every_buffered_listener() {
    let region_id = RegionId(0);
    let region = Region::new(region_id, "r", 1, RegionFlags::IS_TRIGGER, 1.0);
    let mut ctx = build_context(vec![], vec![region]);
    let target = Target::Species(SpeciesId(1));
    ctx.register_trigger_listener(
        target,
        region_id,
        OrientationFilter::NotSet,
        TriggerListener::new(ReportType::new(ReportKind::Contents), "flush_me", 0, 100, false),
    );
    ctx.fire_trigger(target, region_id, FiredEvent::Contents, 1, Vector3::ZERO, EventRecord::new(0.0, 0.0), Some(1), Some(1)).unwrap();

    let errors = ctx.emergency_flush();
    assert_eq!(errors, 0);
    assert_eq!(ctx.writer.lines(0).len(), 1);
}
