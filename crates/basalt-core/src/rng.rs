//! Small splitmix-style PRNG for non-GPU randomness (tree placement, SSAO
//! kernel generation). Tree placement is intentionally unseeded: repeated
//! generation of the same chunk is not required to be reproducible.

use std::time::{SystemTime, UNIX_EPOCH};

pub struct FrameRng {
    state: u64,
}

impl FrameRng {
    /// Seed from the clock. Two instances created in the same nanosecond
    /// share a sequence, which is acceptable for feature placement.
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E3779B97F4A7C15);
        Self::from_seed(nanos)
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E3779B97F4A7C15,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        // splitmix64
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    /// Uniform value in [0, bound).
    pub fn next_below(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0);
        (self.next_u64() % bound as u64) as usize
    }

    /// Uniform float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sequences_match() {
        let mut a = FrameRng::from_seed(7);
        let mut b = FrameRng::from_seed(7);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_next_below_in_range() {
        let mut rng = FrameRng::from_seed(99);
        for _ in 0..1000 {
            assert!(rng.next_below(32) < 32);
        }
    }

    #[test]
    fn test_next_f32_unit_interval() {
        let mut rng = FrameRng::from_seed(3);
        for _ in 0..1000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
