//! Tunables for the counting subsystem.
//!
//! Mirrors the teacher's `SwarmConfig`/`WorldModelConfig` shape: a plain,
//! serializable struct with named constants and a `Default` impl, rather
//! than scattering magic numbers through the algorithm modules.

use serde::{Deserialize, Serialize};

/// Number of fine-partition entries reserved for each exponential tail
/// (spec §3: total fine length is `2*FINE_TAIL_LEN + FINE_INTERIOR_LEN`).
pub const FINE_TAIL_LEN: usize = 4096;
/// Number of fine-partition entries spanning the linear interior.
pub const FINE_INTERIOR_LEN: usize = 16384;
/// Total length of a per-axis fine partition array.
pub const FINE_PARTITION_LEN: usize = 2 * FINE_TAIL_LEN + FINE_INTERIOR_LEN;

/// `1e6 * sqrt(pi) / (1e-15 * N_A)`, the constant factor in the
/// concentration-normalized scaled-hits accumulation of spec §4.F.
pub const C_UNIT: f64 = 2.9432976599069717358e-3;

/// Maximum number of times a waypoint is perturbed off an incident wall
/// plane before initialization gives up (spec §8).
pub const MAX_WAYPOINT_PERTURB_ATTEMPTS: u32 = 16;

/// Maximum number of cell-boundary crossings attempted while sweeping a
/// waypoint enclosure ray before the sweep is declared unreachable. This
/// bounds a loop that in the original implementation runs until geometry
/// converges; we cap it rather than spin forever on pathological meshes.
pub const MAX_SWEEP_STEPS: usize = 100_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Relative tolerance used by all "near" comparisons:
    /// `EPS_C * (max(|x|, |y|) + 1)`.
    pub eps_c: f64,
    /// Base size (power of two) of the counter hash table.
    pub counter_table_base_size: usize,
    /// Conversion factor from simulation length units to meters, applied at
    /// the boundary when reporting positions (spec §6).
    pub length_unit: f64,
    /// Conversion factor from simulation time steps to seconds.
    pub time_step: f64,
    /// Mean free-path scaling used in concentration normalization
    /// (`space_step` in spec §4.F).
    pub space_step: f64,
}

impl SimulationConfig {
    pub fn new(
        eps_c: f64,
        counter_table_base_size: usize,
        length_unit: f64,
        time_step: f64,
        space_step: f64,
    ) -> Self {
        assert!(
            counter_table_base_size.is_power_of_two(),
            "counter_table_base_size must be a power of two"
        );
        SimulationConfig {
            eps_c,
            counter_table_base_size,
            length_unit,
            time_step,
            space_step,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig::new(1e-12, 1024, 1e-6, 1e-6, 1.0)
    }
}

/// Two-sided relative-tolerance float comparison (spec §4.A, original
/// `eps_equals`). Used for waypoint-on-wall detection, REDO detection, and
/// residual-distance checks throughout the sweep code.
#[inline]
pub fn eps_equals(eps_c: f64, x: f64, y: f64) -> bool {
    let mag = x.abs().max(y.abs());
    (x - y).abs() < eps_c * (mag + 1.0)
}
