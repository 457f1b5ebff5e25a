//! Error kinds for the spatial counting subsystem.
//!
//! Every fallible entry point in this crate returns [`CountError`]. Callers
//! up to the event loop propagate; the handful of genuinely fatal kinds
//! (`AllocFailure`, `BufferOverflow`) are meant to trigger an emergency
//! trigger-buffer flush (see `context::SimulationContext::emergency_flush`)
//! before the caller aborts.

use thiserror::Error;

use crate::ids::RegionId;

/// Errors raised by the counting and enclosure subsystem.
#[derive(Debug, Error)]
pub enum CountError {
    /// A transient region-list node couldn't be acquired from the arena.
    #[error("out of memory acquiring a transient region-list node")]
    AllocFailure,

    /// A region used by an ENCLOSING counter is not a closed, watertight
    /// manifold.
    #[error("region '{name}' is not a closed manifold and cannot host an enclosing counter")]
    NonManifoldRegion { name: String },

    /// A waypoint enclosure sweep failed to converge on its target.
    #[error("waypoint sweep toward subvolume {subvolume} did not converge (residual {residual:.3e})")]
    UnreachedWaypointTarget { subvolume: usize, residual: f64 },

    /// A waypoint could not be perturbed off an incident wall plane within
    /// the allotted number of attempts.
    #[error("waypoint for subvolume {subvolume} is stuck on a wall plane after {attempts} perturbation attempts")]
    WaypointStuckOnWall { subvolume: usize, attempts: u32 },

    /// A trigger listener's event buffer was full and the flush failed.
    #[error("trigger listener buffer overflow while flushing counter on region {region:?}")]
    BufferOverflow { region: RegionId },

    /// An init-time request was malformed (orientation on a volume molecule,
    /// a count target with no geometry, a broken object reference, ...).
    #[error("invalid count request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, CountError>;
