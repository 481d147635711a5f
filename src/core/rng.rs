// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f};

pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Independent stream for work item `index`, stable across thread counts.
    pub fn for_index(seed: u64, index: u64) -> Self {
        let mut state = seed ^ index.wrapping_mul(0x9E3779B97F4A7C15);
        // splitmix64 finalizer
        state = (state ^ (state >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        state = (state ^ (state >> 27)).wrapping_mul(0x94D049BB133111EB);
        Self::new(state ^ (state >> 31))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    /// Uniform sample in [0, 1).
    pub fn next_f32(&mut self) -> Float {
        (self.next_u32() >> 8) as Float * (1.0 / (1u32 << 24) as Float)
    }

    pub fn next_2d(&mut self) -> Vector2f {
        let u = self.next_f32();
        let v = self.next_f32();
        Vector2f::new(u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::LcgRng;

    #[test]
    fn test_rng_range_and_determinism() {
        let mut a = LcgRng::for_index(7, 42);
        let mut b = LcgRng::for_index(7, 42);
        for _ in 0..1000 {
            let x = a.next_f32();
            assert!(x >= 0.0 && x < 1.0);
            assert_eq!(x, b.next_f32());
        }
    }

    #[test]
    fn test_rng_streams_differ() {
        let mut a = LcgRng::for_index(7, 0);
        let mut b = LcgRng::for_index(7, 1);
        assert_ne!(a.next_u32(), b.next_u32());
    }
}
