//! Component H — macromolecular subunit counter.
//!
//! A complex is a fixed-size array of subunits, each an independently
//! reacting species/orientation pair. A counter here doesn't track "is this
//! complex present" but "how many subunits, across every placed complex of
//! this species, currently match each row of a rule table" — the same
//! match-first-row-wins table shape the original's `complex_rate` uses for
//! cooperative rate lookup (`original_source/src/macromolecule.h`), reused
//! for counting instead of rate selection.

use crate::ids::{ComplexId, RelationId, RegionId, SpeciesId, SubunitIndex};

/// A named bijection between subunit indices (`subunit_relation` in the
/// original): given a subunit, which other subunit index does this relation
/// point to. Stored as forward/inverse arrays rather than a general map
/// since the mapping is fixed at complex-species definition time and every
/// subunit appears in it exactly once.
#[derive(Clone, Debug)]
pub struct SubunitRelation {
    pub id: RelationId,
    pub name: String,
    pub target: Vec<SubunitIndex>,
    pub inverse: Vec<SubunitIndex>,
}

impl SubunitRelation {
    pub fn related_to(&self, subunit: SubunitIndex) -> SubunitIndex {
        self.target[subunit.index()]
    }
}

/// One subunit's current state, snapshotted before and after a reaction so
/// the update pass can compute exactly which rule-table rows changed
/// membership (spec §4.H).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SubunitState {
    pub species: SpeciesId,
    /// `None` for volume complexes; surface complexes carry a per-subunit
    /// orientation relative to the complex's own reference orientation.
    pub orient: Option<i8>,
}

/// One clause of a rule: match (or reject, if `invert`) a subunit's state
/// against `species`/`orient`. `None` fields are wildcards and are never
/// affected by `invert` — only a constraint that was actually specified can
/// be negated. `relation` names which subunit to check: `Some` resolves a
/// related subunit via the table, `None` checks the reference subunit's own
/// orientation directly, the `C = num_relations + 1`th column surface
/// complexes need to constrain a subunit against its own placement rather
/// than a partner's (spec §4.H).
#[derive(Clone, Copy, Debug)]
pub struct RuleClause {
    pub relation: Option<RelationId>,
    pub species: Option<SpeciesId>,
    pub orient: Option<i8>,
    pub invert: bool,
}

impl RuleClause {
    fn species_ok(&self, species: SpeciesId) -> bool {
        match self.species {
            None => true,
            Some(want) => {
                let raw = species == want;
                if self.invert { !raw } else { raw }
            }
        }
    }

    /// Resolve a relative `orient` constraint (`rel * reference`) against a
    /// related subunit's own orientation.
    fn orient_ok_relative(&self, related_orient: Option<i8>, reference_orient: Option<i8>) -> bool {
        match (self.orient, reference_orient) {
            (None, _) => true,
            (Some(rel), Some(reference)) => {
                let raw = related_orient == Some(rel * reference);
                if self.invert { !raw } else { raw }
            }
            (Some(_), None) => {
                // Volume complex, no orientation to resolve against: the
                // constraint can never hold.
                if self.invert { true } else { false }
            }
        }
    }

    /// Check the reference subunit's own orientation directly, with no
    /// relative multiplication (there is no "other" subunit to be relative
    /// to in this column).
    fn orient_ok_absolute(&self, own_orient: Option<i8>) -> bool {
        match self.orient {
            None => true,
            Some(want) => {
                let raw = own_orient == Some(want);
                if self.invert { !raw } else { raw }
            }
        }
    }

    fn matches_related(&self, related: SubunitState, reference_orient: Option<i8>) -> bool {
        self.species_ok(related.species) && self.orient_ok_relative(related.orient, reference_orient)
    }

    fn matches_self(&self, reference: SubunitState) -> bool {
        self.species_ok(reference.species) && self.orient_ok_absolute(reference.orient)
    }
}

/// One row of the M x C match table (spec §4.H): up to `relations.len() +
/// 1` clauses, first-matching-row-wins, same semantics as the original's
/// `complex_rate` rows repurposed for counting rather than rate lookup.
#[derive(Clone, Debug)]
pub struct CountRule {
    pub clauses: Vec<RuleClause>,
}

impl CountRule {
    fn matches(&self, relations: &[SubunitRelation], subunits: &[SubunitState], index: SubunitIndex) -> bool {
        let reference = subunits[index.index()];
        self.clauses.iter().all(|clause| match clause.relation {
            Some(relation_id) => {
                let relation = relations.iter().find(|r| r.id == relation_id).expect("rule references a defined relation");
                let related = subunits[relation.related_to(index).index()];
                clause.matches_related(related, reference.orient)
            }
            None => clause.matches_self(reference),
        })
    }
}

/// A macromolecular species: its fixed subunit count, the relation table
/// relating subunit indices to each other, and the rule table counters
/// match against.
#[derive(Clone, Debug)]
pub struct ComplexSpecies {
    pub num_subunits: usize,
    pub relations: Vec<SubunitRelation>,
    pub rules: Vec<CountRule>,
}

impl ComplexSpecies {
    /// Index of the first rule each subunit currently matches, or `None` if
    /// no rule (not even an implicit DEFAULT) matches — counters should
    /// always include a trailing zero-clause DEFAULT rule to make this
    /// total, mirroring the original's implicit default-rule behavior.
    fn matching_rule(&self, subunits: &[SubunitState], index: SubunitIndex) -> Option<usize> {
        self.rules.iter().position(|rule| rule.matches(&self.relations, subunits, index))
    }
}

/// A placed instance of a complex species: its subunit array plus identity.
#[derive(Clone, Debug)]
pub struct Complex {
    pub id: ComplexId,
    pub species: usize,
    pub subunits: Vec<SubunitState>,
    /// Regions enclosing this complex's reference point, for region-scoped
    /// counters (spec §4.H "in_regions").
    pub regions: Vec<RegionId>,
}

/// Per-rule-row counts, either world-wide or scoped to one region (spec
/// §4.H `complex_counter`/`complex_counters`).
#[derive(Clone, Debug)]
pub struct ComplexCounter {
    pub counts: Vec<i64>,
}

impl ComplexCounter {
    pub fn new(num_rules: usize) -> Self {
        ComplexCounter { counts: vec![0; num_rules] }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ComplexCounters {
    pub in_world: Option<ComplexCounter>,
    pub in_regions: std::collections::HashMap<RegionId, ComplexCounter>,
}

impl ComplexCounters {
    pub fn for_region_mut(&mut self, region: RegionId, num_rules: usize) -> &mut ComplexCounter {
        self.in_regions.entry(region).or_insert_with(|| ComplexCounter::new(num_rules))
    }
}

/// `update_subunit_counts` equivalent: a subunit reaction changed one
/// subunit's state from `before` to `after`, potentially changing which
/// rule row every related subunit matches (not just the reacted one, since
/// relations point both ways). Recompute the matching row for the reacted
/// subunit and every subunit that names it via a relation, and apply the
/// `-1`/`+1` delta to whichever counters are tracking this complex (spec
/// §4.H "update_mask").
pub fn update_subunit_counts(
    species: &ComplexSpecies,
    complex: &Complex,
    reacted: SubunitIndex,
    before: &[SubunitState],
    counters: &mut ComplexCounters,
) {
    let mut affected: Vec<SubunitIndex> = vec![reacted];
    for relation in &species.relations {
        // A subunit is affected if the reacted one sits at the other end of
        // the relation from it.
        for (idx, &target) in relation.target.iter().enumerate() {
            if target == reacted && !affected.contains(&SubunitIndex(idx)) {
                affected.push(SubunitIndex(idx));
            }
        }
    }

    for &index in &affected {
        let before_row = species.matching_rule(before, index);
        let after_row = species.matching_rule(&complex.subunits, index);
        if before_row == after_row {
            continue;
        }
        if let Some(row) = before_row {
            apply_delta(counters, complex, row, -1);
        }
        if let Some(row) = after_row {
            apply_delta(counters, complex, row, 1);
        }
    }
}

fn apply_delta(counters: &mut ComplexCounters, complex: &Complex, row: usize, delta: i64) {
    if let Some(world) = counters.in_world.as_mut() {
        world.counts[row] += delta;
    }
    for &region in &complex.regions {
        if let Some(counter) = counters.in_regions.get_mut(&region) {
            counter.counts[row] += delta;
        }
    }
}

/// `init_complex_counter` equivalent: compute every subunit's initial
/// matching row and seed the counters from scratch, used when a counter is
/// first attached to a complex species that already has placed instances.
pub fn init_counts(species: &ComplexSpecies, complexes: &[Complex], num_rules: usize) -> ComplexCounters {
    let mut counters = ComplexCounters { in_world: Some(ComplexCounter::new(num_rules)), in_regions: std::collections::HashMap::new() };
    for complex in complexes {
        for region in &complex.regions {
            counters.for_region_mut(*region, num_rules);
        }
        for index in 0..complex.subunits.len() {
            if let Some(row) = species.matching_rule(&complex.subunits, SubunitIndex(index)) {
                apply_delta(&mut counters, complex, row, 1);
            }
        }
    }
    counters
}
