//! Component E — counter table & hashed lookup.
//!
//! A separately-chained open hash keyed by `(target_hash + region_hash) &
//! mask` (spec §4.E), sized to a power of two at init. The bucket hash
//! itself borrows the Fibonacci-multiplicative mixing the teacher uses for
//! its 2D spatial hash grid (`swarm/grid.rs`) to spread small sequential
//! IDs evenly, since species/pathway IDs here are dense small integers
//! rather than pre-randomized hash values.

use crate::geometry::Vector3;
use crate::ids::{PathwayId, RegionId, SpeciesId};
use crate::trigger::TriggerListener;

/// Fibonacci multiplicative hash (Knuth), same constant as
/// `swarm/grid.rs::SpatialHashGrid::hash`.
#[inline]
fn fibonacci_mix(key: u64) -> u64 {
    key.wrapping_mul(11400714819323198485)
}

/// Tagged variant over what a counter accumulates for: a molecule species
/// or a reaction pathway (spec §9 design notes: replaces a void-pointer
/// `target` field).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Target {
    Species(SpeciesId),
    Pathway(PathwayId),
}

impl Target {
    /// Hash derived from the variant's payload XOR'd with its discriminant
    /// (spec §9).
    pub fn hash(&self) -> u64 {
        match *self {
            Target::Species(id) => fibonacci_mix(id.index() as u64) ^ 0,
            Target::Pathway(id) => fibonacci_mix(id.index() as u64) ^ 1,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flavor {
    Mol,
    Rxn,
    Trig,
}

/// Orientation filter on a counter (spec §4.E). `NotSet` and `Any` both
/// match unconditionally; they are kept distinct because a counter created
/// without any orientation request (`NotSet`) and one created for an
/// explicit "any orientation" request (`Any`, i.e. zero) are different
/// init-time states even though they behave identically at query time.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum OrientationFilter {
    #[default]
    NotSet,
    Any,
    Positive,
    Negative,
}

impl OrientationFilter {
    pub fn matches(self, orient: Option<i8>) -> bool {
        match self {
            OrientationFilter::NotSet | OrientationFilter::Any => true,
            OrientationFilter::Positive => orient.is_some_and(|o| o > 0),
            OrientationFilter::Negative => orient.is_some_and(|o| o < 0),
        }
    }
}

/// Per-flavor accumulated data (spec §3 "Counter").
#[derive(Clone, Debug)]
pub enum CounterData {
    Mol {
        n_at: i64,
        n_enclosed: i64,
        front_hits: f64,
        back_hits: f64,
        front_to_back: f64,
        back_to_front: f64,
        scaled_hits: f64,
    },
    Rxn {
        n_rxn_at: f64,
        n_rxn_enclosed: f64,
    },
    Trig {
        t_event: f64,
        loc: Vector3,
        orient: i8,
        listeners: Vec<TriggerListener>,
    },
}

impl CounterData {
    pub fn flavor(&self) -> Flavor {
        match self {
            CounterData::Mol { .. } => Flavor::Mol,
            CounterData::Rxn { .. } => Flavor::Rxn,
            CounterData::Trig { .. } => Flavor::Trig,
        }
    }

    pub fn new_mol() -> Self {
        CounterData::Mol {
            n_at: 0,
            n_enclosed: 0,
            front_hits: 0.0,
            back_hits: 0.0,
            front_to_back: 0.0,
            back_to_front: 0.0,
            scaled_hits: 0.0,
        }
    }

    pub fn new_rxn() -> Self {
        CounterData::Rxn { n_rxn_at: 0.0, n_rxn_enclosed: 0.0 }
    }

    pub fn new_trig() -> Self {
        CounterData::Trig { t_event: 0.0, loc: Vector3::ZERO, orient: 0, listeners: Vec::new() }
    }
}

#[derive(Clone, Debug)]
pub struct Counter {
    pub target: Target,
    pub region: RegionId,
    pub orientation_filter: OrientationFilter,
    pub data: CounterData,
}

impl Counter {
    pub fn flavor(&self) -> Flavor {
        self.data.flavor()
    }

    fn matches(&self, target: Target, region: RegionId, flavor: Flavor, orientation_filter: OrientationFilter) -> bool {
        self.target == target && self.region == region && self.flavor() == flavor && self.orientation_filter == orientation_filter
    }
}

/// Separately-chained hash table of counters (spec §4.E).
pub struct CounterTable {
    buckets: Vec<Vec<Counter>>,
    mask: u64,
}

impl CounterTable {
    pub fn new(size: usize) -> Self {
        assert!(size.is_power_of_two(), "counter table size must be a power of two");
        CounterTable { buckets: vec![Vec::new(); size], mask: (size - 1) as u64 }
    }

    #[inline]
    fn bucket_index(&self, target_hash: u64, region_hash: u64) -> usize {
        ((target_hash.wrapping_add(region_hash)) & self.mask) as usize
    }

    pub fn find(
        &self,
        target: Target,
        target_hash: u64,
        region: RegionId,
        region_hash: u64,
        flavor: Flavor,
        orientation_filter: OrientationFilter,
    ) -> Option<&Counter> {
        let idx = self.bucket_index(target_hash, region_hash);
        self.buckets[idx].iter().find(|c| c.matches(target, region, flavor, orientation_filter))
    }

    pub fn find_mut(
        &mut self,
        target: Target,
        target_hash: u64,
        region: RegionId,
        region_hash: u64,
        flavor: Flavor,
        orientation_filter: OrientationFilter,
    ) -> Option<&mut Counter> {
        let idx = self.bucket_index(target_hash, region_hash);
        self.buckets[idx].iter_mut().find(|c| c.matches(target, region, flavor, orientation_filter))
    }

    /// `create_new_counter`: insert a brand-new counter. Callers are
    /// expected to have already checked `find` to avoid duplicates, as in
    /// the original (duplicate prevention is an init-time concern handled
    /// while converting count requests, not a table invariant).
    pub fn insert(&mut self, region_hash: u64, counter: Counter) {
        let idx = self.bucket_index(counter.target.hash(), region_hash);
        self.buckets[idx].push(counter);
    }

    pub fn get_or_insert_mut(
        &mut self,
        target: Target,
        target_hash: u64,
        region: RegionId,
        region_hash: u64,
        flavor: Flavor,
        orientation_filter: OrientationFilter,
        make_data: impl FnOnce() -> CounterData,
    ) -> &mut Counter {
        let idx = self.bucket_index(target_hash, region_hash);
        let existing = self.buckets[idx].iter().position(|c| c.matches(target, region, flavor, orientation_filter));
        let pos = match existing {
            Some(pos) => pos,
            None => {
                self.buckets[idx].push(Counter { target, region, orientation_filter, data: make_data() });
                self.buckets[idx].len() - 1
            }
        };
        &mut self.buckets[idx][pos]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Counter> {
        self.buckets.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Counter> {
        self.buckets.iter_mut().flatten()
    }

    /// Testable property (spec §8): walking the chain at the counter's own
    /// bucket reaches it.
    pub fn chain_contains(&self, counter_target_hash: u64, region_hash: u64, counter: &Counter) -> bool {
        let idx = self.bucket_index(counter_target_hash, region_hash);
        self.buckets[idx].iter().any(|c| std::ptr::eq(c, counter))
    }
}
