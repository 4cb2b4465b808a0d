//! Coherent noise sources.
//!
//! [`Perlin`] is 2-D gradient noise over a seeded shuffled permutation,
//! used for terrain and nebulae. [`ValueNoise`] is the cheaper separable table
//! the storm clouds are advected with.

use libm::floorf;

use crate::rng::Rng;

const PERM: usize = 256;

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn mix(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: u8, x: f32, y: f32) -> f32 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = match h {
        0..=3 => y,
        12 | 14 => x,
        _ => 0.0,
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

pub struct Perlin {
    perm: [u8; PERM * 2],
}

impl Perlin {
    /// Fisher-Yates shuffle of `0..=255` drawn from `rng`; the same seed
    /// always gives the same landscape.
    pub fn new(rng: &mut Rng) -> Self {
        let mut base = [0u8; PERM];
        for (i, p) in base.iter_mut().enumerate() {
            *p = i as u8;
        }
        for i in (1..PERM).rev() {
            let j = rng.below(i as u32 + 1) as usize;
            base.swap(i, j);
        }
        let mut perm = [0u8; PERM * 2];
        perm[..PERM].copy_from_slice(&base);
        perm[PERM..].copy_from_slice(&base);
        Self { perm }
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    /// Gradient noise in roughly `[-1, 1]`; zero on every lattice point.
    pub fn noise(&self, x: f32, y: f32) -> f32 {
        let fx = floorf(x);
        let fy = floorf(y);
        let xi = (fx as i32 & 255) as usize;
        let yi = (fy as i32 & 255) as usize;
        let x = x - fx;
        let y = y - fy;
        let u = fade(x);
        let v = fade(y);

        let a = self.p(xi) + yi;
        let aa = self.p(a);
        let ab = self.p(a + 1);
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b);
        let bb = self.p(b + 1);

        mix(
            v,
            mix(u, grad(self.perm[aa], x, y), grad(self.perm[ba], x - 1.0, y)),
            mix(u, grad(self.perm[ab], x, y - 1.0), grad(self.perm[bb], x - 1.0, y - 1.0)),
        )
    }

    /// Sum of `octaves` layers, each at double frequency and half amplitude.
    pub fn fbm(&self, x: f32, y: f32, octaves: u32) -> f32 {
        let mut sum = 0.0;
        let mut amp = 1.0;
        let mut freq = 1.0;
        for _ in 0..octaves {
            sum += self.noise(x * freq, y * freq) * amp;
            amp *= 0.5;
            freq *= 2.0;
        }
        sum
    }
}

/// Random 256-entry table sampled with a separable blend; output in `[0, 1)`.
pub struct ValueNoise {
    table: [f32; PERM],
}

impl ValueNoise {
    pub fn new(rng: &mut Rng) -> Self {
        let mut table = [0.0; PERM];
        for v in table.iter_mut() {
            *v = rng.below(1000) as f32 / 1000.0;
        }
        Self { table }
    }

    pub fn sample(&self, x: f32, y: f32) -> f32 {
        // Truncation toward zero, matching the cloud advection the scene was tuned on.
        let xt = x as i32;
        let yt = y as i32;
        let xi = (xt & 255) as usize;
        let yi = (yt & 255) as usize;
        let fx = x - xt as f32;
        let fy = y - yt as f32;

        let i1 = mix(fx, self.table[xi], self.table[(xi + 1) & 255]);
        let i2 = mix(fx, self.table[yi], self.table[(yi + 1) & 255]);
        mix(fy, i1, i2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perlin_is_zero_on_lattice() {
        let p = Perlin::new(&mut Rng::new(1));
        for i in -4..4 {
            assert_eq!(p.noise(i as f32, (i * 3) as f32), 0.0);
        }
    }

    #[test]
    fn perlin_is_bounded_and_stable() {
        let p = Perlin::new(&mut Rng::new(5));
        let q = Perlin::new(&mut Rng::new(5));
        for i in 0..400 {
            let x = i as f32 * 0.137;
            let y = i as f32 * 0.071 - 9.0;
            let n = p.noise(x, y);
            assert!((-1.5..=1.5).contains(&n), "{n}");
            assert_eq!(n, q.noise(x, y));
        }
    }

    #[test]
    fn permutation_is_a_permutation() {
        let p = Perlin::new(&mut Rng::new(9));
        let mut seen = [false; 256];
        for &v in &p.perm[..256] {
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(p.perm[..256], p.perm[256..]);
    }

    #[test]
    fn seed_picks_the_permutation() {
        let a = Perlin::new(&mut Rng::new(1));
        let b = Perlin::new(&mut Rng::new(2));
        assert_eq!(a.perm, Perlin::new(&mut Rng::new(1)).perm);
        assert_ne!(a.perm[..PERM], b.perm[..PERM]);
        // Not left close to the identity.
        let fixed = a.perm[..PERM].iter().enumerate().filter(|&(i, &v)| i == v as usize).count();
        assert!(fixed < 16, "{fixed}");
    }

    #[test]
    fn value_noise_stays_in_unit_range() {
        let mut rng = Rng::new(3);
        let n = ValueNoise::new(&mut rng);
        for i in 0..300 {
            let v = n.sample(i as f32 * 0.31, i as f32 * 0.17);
            assert!((0.0..1.0).contains(&v));
        }
    }
}
