//! Injectable randomness for spawn decisions.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of the uniform draws the scheduler needs.
///
/// Tests supply scripted implementations; production code uses
/// [`SeededRandom`].
pub trait RandomSource {
    /// Uniform integer in `0..bound`. Callers never pass zero.
    fn below(&mut self, bound: u64) -> u64;

    /// Uniform float in `[0, 1)`.
    fn unit(&mut self) -> f64;
}

/// ChaCha8-backed random source reproducible from a 64-bit seed.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Creates a source whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&mut self, bound: u64) -> u64 {
        self.rng.gen_range(0..bound)
    }

    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
