//! Deterministic linear-congruential sequence generator.
//!
//! `state = (a * state + c) mod m` with the classic 32-bit constants; each
//! draw returns `state / m` in [0, 1). The output depends only on the seed,
//! so a run can be replayed bit-for-bit from its configuration.

use rand::{Error, RngCore, SeedableRng};

pub const LCG_MULTIPLIER: u64 = 1_664_525;
pub const LCG_INCREMENT: u64 = 1_013_904_223;
pub const LCG_MODULUS: u64 = 1 << 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % LCG_MODULUS,
        }
    }

    pub fn state(&self) -> u64 {
        self.state
    }

    fn step(&mut self) -> u64 {
        self.state = (LCG_MULTIPLIER * self.state + LCG_INCREMENT) % LCG_MODULUS;
        self.state
    }

    /// Next value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.step() as f64 / LCG_MODULUS as f64
    }

    /// Next value in [low, high).
    pub fn next_range(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }
}

impl RngCore for LcgRng {
    fn next_u32(&mut self) -> u32 {
        self.step() as u32
    }

    fn next_u64(&mut self) -> u64 {
        let high = self.step();
        let low = self.step();
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for LcgRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}
