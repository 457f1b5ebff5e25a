//! External scheduler collaborator (spec §1 Non-goals, §6): "the core
//! never advances time itself." This module documents the boundary the
//! rest of the crate assumes without implementing event ordering,
//! diffusion stepping, or reaction selection.

/// What the scheduler tells the core about the step currently in progress.
/// Every public entry point in [`crate::context::SimulationContext`] takes
/// one of these rather than reading a global clock.
#[derive(Clone, Copy, Debug)]
pub struct EventRecord {
    pub t_iteration: f64,
    pub event_time: f64,
}

impl EventRecord {
    pub fn new(t_iteration: f64, event_time: f64) -> Self {
        EventRecord { t_iteration, event_time }
    }
}
