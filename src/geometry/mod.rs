//! Geometry primitives: component A (lattice & partition search) and
//! component B (ray/triangle classification).

pub mod intersect;
pub mod partition;
pub mod vector;

pub use intersect::{classify, Classification, Triangle};
pub use partition::{PartitionTable, RayWalk, Subvolume, SubvolumeLattice};
pub use vector::{Axis, Face, Vector3};
