//! Deterministic Randomness
//!
//! Provides deterministic random number generation for simulations,
//! ensuring reproducible execution with the same seed.

//-----------------------------------------------------------------------------
// Imports
//-----------------------------------------------------------------------------

use rand::prelude::{RngCore, SeedableRng, StdRng};
use rand::Error as RandError;
use rand::Rng;

/// A wrapper around a seeded PRNG to ensure deterministic randomness in simulations.
#[derive(Debug, Clone)]
pub struct SeededRng {
    rng: StdRng,
    seed: u64,
}

impl SeededRng {
    /// Creates a new RNG instance seeded with the given 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Creates a new RNG instance from entropy.
    /// The generated seed is kept so the run can be replayed.
    pub fn from_entropy() -> Self {
        let mut entropy_rng = StdRng::from_entropy();
        Self::new(entropy_rng.next_u64())
    }

    /// Seeded from `seed` when given, otherwise from entropy
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::new)
    }

    /// Returns the seed used to initialize this RNG.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Independent stream for one participant, derived from the run seed.
    /// The same seed and stream index always give the same sequence.
    pub fn fork(&self, stream: u64) -> SeededRng {
        let mut mixer = StdRng::seed_from_u64(self.seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        SeededRng::new(mixer.next_u64())
    }

    /// Uniform value in `0..=max`
    pub fn up_to(&mut self, max: u32) -> u32 {
        self.rng.gen_range(0..=max)
    }

    /// Uniform value in the given range
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.rng.gen_range(range)
    }
}

// Implement RngCore so that SeededRng can be used wherever RngCore is expected.
impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        self.rng.try_fill_bytes(dest)
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------
