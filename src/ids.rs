//! Index-based identifiers.
//!
//! Per the design notes (spec §9), pointer graphs with cycles (waypoints
//! <-> region lists <-> arenas) are replaced with plain indices into
//! long-lived tables owned by [`crate::context::SimulationContext`]. None of
//! these types carry any data of their own; they are just typed `usize`s so
//! a `RegionId` can never be confused with a `WallId` at a call site.

macro_rules! index_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub struct $name(pub usize);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(v: usize) -> Self {
                $name(v)
            }
        }
    };
}

index_id!(RegionId);
index_id!(WallId);
index_id!(SubvolumeId);
index_id!(SpeciesId);
index_id!(PathwayId);
index_id!(ComplexId);
index_id!(SubunitIndex);
index_id!(RelationId);
