//! Top-level entry points (spec §6): owns the long-lived tables every other
//! module indexes into, and exposes the operations external callers
//! (diffusion, reaction selection, MDL parsing, the scheduler) actually call
//! into across a running simulation.

use tracing::{debug, instrument, warn};

use crate::arena::RegionListArena;
use crate::config::SimulationConfig;
use crate::counter::{CounterData, CounterTable, Flavor, OrientationFilter, Target};
use crate::error::Result;
use crate::geometry::{SubvolumeLattice, Vector3};
use crate::ids::{RegionId, WallId};
use crate::mesh::{MoleculeRef, Region, Wall};
use crate::output::MemoryOutputWriter;
use crate::query;
use crate::scheduler::EventRecord;
use crate::trigger::{fire_count_event, FiredEvent, OutputWriter, TriggerListener};
use crate::update::{self, CrossDirection};
use crate::waypoint::Waypoint;

/// Owns every table the counting subsystem needs: the lattice (component
/// A), the mesh (walls/regions), the precomputed waypoints (component C),
/// the counter hash table (component E), and a bounded scratch arena for
/// transient region lists (spec §3, §9).
pub struct SimulationContext<W: OutputWriter = MemoryOutputWriter> {
    pub config: SimulationConfig,
    pub lattice: SubvolumeLattice,
    pub walls: Vec<Wall>,
    pub regions: Vec<Region>,
    pub waypoints: Vec<Waypoint>,
    pub counters: CounterTable,
    pub arena: RegionListArena,
    pub writer: W,
}

impl<W: OutputWriter> SimulationContext<W> {
    pub fn new(config: SimulationConfig, lattice: SubvolumeLattice, walls: Vec<Wall>, regions: Vec<Region>, waypoints: Vec<Waypoint>, writer: W) -> Self {
        let counters = CounterTable::new(config.counter_table_base_size);
        let arena = RegionListArena::new(4096);
        SimulationContext { config, lattice, walls, regions, waypoints, counters, arena, writer }
    }

    fn wall(&self, id: WallId) -> &Wall {
        &self.walls[id.index()]
    }

    /// Init-time manifold check (spec §3 invariant, `check_counter_geometry`
    /// in the original): every region hosting an ENCLOSING-style counter
    /// must be a closed 2-manifold before any waypoint is placed, since a
    /// leaky region makes enclosure sweeps meaningless.
    pub fn check_geometry(&mut self) -> Result<()> {
        crate::mesh::check_counter_geometry(&self.walls, &mut self.regions)
    }

    /// Every region's precomputed hash, keyed by id (spec §4.E: the bucket
    /// hash combines the target's hash with the region's own `hashval`, not
    /// with its raw index).
    fn region_hash(&self, id: RegionId) -> u64 {
        self.regions[id.index()].hashval
    }

    /// `count_region_from_scratch`: full reconstruction of a molecule's
    /// enclosing regions, then apply `n` to whichever of those regions has a
    /// matching `target` counter — the mutation side of spec §4.D steps
    /// 2-4, used at placement time and whenever incremental tracking can't
    /// be trusted.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, mol))]
    pub fn count_region_from_scratch(&mut self, target: Target, mol: MoleculeRef, n: i64, event: EventRecord) -> Result<Vec<RegionId>> {
        let my_wall = mol.current_wall.map(|id| self.wall(id).clone());
        let lattice = &self.lattice;
        let walls = &self.walls;
        let regions = &self.regions;
        let hash = target.hash();
        query::count_from_scratch(
            lattice,
            &self.waypoints,
            mol.position,
            my_wall.as_ref(),
            self.config.eps_c,
            crate::config::MAX_SWEEP_STEPS,
            |cell| lattice.cell(cell).walls.iter().map(|&id| walls[id.index()].clone()).collect(),
            &mut self.counters,
            target,
            hash,
            n,
            mol.orient,
            |r| regions[r.index()].hashval,
            &mut self.writer,
            event,
        )
    }

    /// `count_region_update`: a molecule crossed `wall` moving `direction`
    /// (spec §4.F).
    #[instrument(skip(self))]
    pub fn count_region_update(&mut self, target: Target, wall_id: WallId, direction: CrossDirection, orient: Option<i8>, loc: Vector3, event: EventRecord) -> Result<()> {
        let hash = target.hash();
        let wall = self.wall(wall_id).clone();
        let regions = &self.regions;
        update::count_region_update(&mut self.counters, target, hash, &wall, direction, orient, &self.config, |r| regions[r.index()].hashval, &mut self.writer, loc, event)
    }

    /// `count_moved_grid_mol`: a surface molecule hopped between two walls
    /// without crossing either boundary as a volume molecule would (spec
    /// §4.F).
    pub fn count_moved_grid_mol(&mut self, target: Target, old_wall: WallId, new_wall: WallId, orient: Option<i8>, loc: Vector3, event: EventRecord) -> Result<()> {
        let hash = target.hash();
        let old = self.wall(old_wall).clone();
        let new = self.wall(new_wall).clone();
        let regions = &self.regions;
        update::count_moved_grid_mol(&mut self.counters, target, hash, &old, &new, orient, |r| regions[r.index()].hashval, &mut self.writer, loc, event)
    }

    /// Register a trigger listener on the MOL/RXN/TRIG counter matching
    /// `target`/`region`/`orientation_filter`, creating the counter if it
    /// doesn't already exist (spec §4.E `create_new_counter`, §4.G).
    pub fn register_trigger_listener(
        &mut self,
        target: Target,
        region: RegionId,
        orientation_filter: OrientationFilter,
        listener: TriggerListener,
    ) {
        let hash = target.hash();
        let region_hash = self.region_hash(region);
        let counter = self.counters.get_or_insert_mut(target, hash, region, region_hash, Flavor::Trig, orientation_filter, CounterData::new_trig);
        if let CounterData::Trig { listeners, .. } = &mut counter.data {
            listeners.push(listener);
        }
    }

    /// Dispatch a fired event to every TRIG counter at `target`/`region`
    /// whose listeners are watching for it (spec §4.G).
    pub fn fire_trigger(
        &mut self,
        target: Target,
        region: RegionId,
        what: FiredEvent,
        n: i64,
        loc: Vector3,
        event: EventRecord,
        orient: Option<i8>,
        count: Option<i64>,
    ) -> Result<()> {
        let hash = target.hash();
        let region_hash = self.region_hash(region);
        if let Some(counter) = self.counters.find_mut(target, hash, region, region_hash, Flavor::Trig, OrientationFilter::NotSet) {
            if let CounterData::Trig { listeners, loc: stamped_loc, .. } = &mut counter.data {
                *stamped_loc = loc;
                fire_count_event(listeners, &mut self.writer, what, n, loc, event.t_iteration, event.event_time, orient, count)?;
            }
        }
        Ok(())
    }

    /// Emergency flush hook (SPEC_FULL.md supplement): on a fatal signal or
    /// unrecoverable error elsewhere in the simulation, drain every
    /// listener's buffer through the writer before the process exits,
    /// rather than losing buffered trigger records.
    pub fn emergency_flush(&mut self) -> usize {
        let mut errors = 0;
        for counter in self.counters.iter_mut() {
            if let CounterData::Trig { listeners, .. } = &mut counter.data {
                for listener in listeners.iter_mut() {
                    let lines: Vec<String> = listener.buffer.drain(..).map(|r| r.format_line()).collect();
                    for line in lines {
                        if self.writer.append_trigger(listener.file_id, &line).is_err() {
                            errors += 1;
                        }
                    }
                }
            }
        }
        errors += self.writer.flush_all();
        if errors > 0 {
            warn!(errors, "emergency flush encountered write failures");
        } else {
            debug!("emergency flush completed cleanly");
        }
        errors
    }
}
