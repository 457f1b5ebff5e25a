//! Spatial counting and region-enclosure subsystem for a 3D stochastic
//! reaction-diffusion simulator.
//!
//! This crate answers one question very fast, very often: which named
//! regions enclose a given point, and how do molecule counts within those
//! regions change as the simulation runs. Diffusion, reaction selection,
//! model parsing, scheduling, and output-file management all live outside
//! this crate; it consumes their results and feeds counters and trigger
//! events back to them.

pub mod arena;
pub mod config;
pub mod context;
pub mod counter;
pub mod error;
pub mod format;
pub mod geometry;
pub mod ids;
pub mod macromol;
pub mod mesh;
pub mod output;
pub mod query;
pub mod regionset;
pub mod rng;
pub mod scheduler;
pub mod sweep;
pub mod trigger;
pub mod update;
pub mod waypoint;

pub use config::SimulationConfig;
pub use context::SimulationContext;
pub use error::{CountError, Result};

/// Initialize tracing for the library. Callers embedding this crate in a
/// larger simulation binary are expected to set up their own subscriber;
/// this is provided for standalone use (tests, examples, the reference
/// binary under `src/bin/`).
pub fn setup_logging(level: Option<String>) {
    let filter = level.unwrap_or_else(|| "info".to_string());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
