//! Seeded pseudo-random source owned by each component.

use embassy_time::Instant;
use rand::{
    Rng as _,
    rngs::SmallRng,
};
use rand_core::{
    RngCore,
    SeedableRng,
};

pub struct Rng(SmallRng);

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Seed from the boot-relative clock, the way titles do in `init`.
    pub fn from_instant(now: Instant) -> Self {
        Self::new(now.as_micros() ^ 0x9E37_79B9_7F4A_7C15)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    /// Uniform integer in `[0, max)`; `0` when `max == 0`.
    pub fn below(&mut self, max: u32) -> u32 {
        if max == 0 { 0 } else { self.0.gen_range(0..max) }
    }

    /// Uniform integer in `[lo, hi)`; `lo` when the range is empty.
    pub fn range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo { lo } else { self.0.gen_range(lo..hi) }
    }

    /// Uniform float in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.0.gen_range(0.0..1.0)
    }

    /// Uniform float in `[lo, hi)`.
    pub fn between(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo { lo } else { self.0.gen_range(lo..hi) }
    }

    /// `true` with probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// `true` one time in `n`.
    pub fn one_in(&mut self, n: u32) -> bool {
        self.below(n) == 0
    }

    /// `-1.0` or `1.0`.
    pub fn sign(&mut self) -> f32 {
        if self.one_in(2) { -1.0 } else { 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..32 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn ranges_are_respected() {
        let mut r = Rng::new(1);
        for _ in 0..500 {
            let v = r.range(-3, 3);
            assert!((-3..3).contains(&v));
            let f = r.between(0.5, 1.0);
            assert!((0.5..1.0).contains(&f));
            assert!(r.below(5) < 5);
        }
        assert_eq!(r.range(4, 4), 4);
        assert_eq!(r.below(0), 0);
    }
}
