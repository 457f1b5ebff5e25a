//! External RNG collaborator (spec §1 Non-goals, §6). The core consumes
//! randomness only for waypoint placement jitter (component C); it never
//! seeds or owns the generator itself.

/// Source of uniform randomness supplied by the caller. Kept as a trait
/// (rather than a concrete `rand::Rng` bound) so the core stays agnostic to
/// which generator the surrounding simulation has already seeded.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;
    fn next_int(&mut self) -> i64;
}

/// Reference implementation backed by `rand`, used by tests and available
/// to callers that don't need to thread a particular generator through.
pub struct StdRandomSource<R: rand::Rng> {
    inner: R,
}

impl<R: rand::Rng> StdRandomSource<R> {
    pub fn new(inner: R) -> Self {
        StdRandomSource { inner }
    }
}

impl<R: rand::Rng> RandomSource for StdRandomSource<R> {
    fn next_uniform(&mut self) -> f64 {
        self.inner.gen_range(0.0..1.0)
    }

    fn next_int(&mut self) -> i64 {
        self.inner.gen()
    }
}
