//! Branching lightning bolts with a thunder flash.
//!
//! A strike grows a tree of straight segments from a start point toward a
//! target: each segment wanders up to ±45° off the direct bearing and covers
//! a decaying share of the remaining distance. Early generations may fork a
//! side branch. Segments live for 0.15–0.2 s and fade while they live.

use core::f32::consts::PI;

use embedded_graphics::pixelcolor::Rgb888;
use libm::{
    atan2f,
    cosf,
    powf,
    sinf,
    sqrtf,
};

use crate::{
    color::scale,
    frame::Frame,
    rng::Rng,
};

// ── Tuning ──────────────────────────────────────────────────────────────────

pub const MAX_BRANCHES: usize = 100;
const DEFAULT_SPAWN_CHANCE: f32 = 0.02;
const ANGLE_JITTER_DEG: i32 = 45;
const LENGTH_DECAY: f32 = 0.7;
const MIN_LENGTH: f32 = 2.0;
const MAX_GENERATION: u8 = 6;
const FLASH_SECS: f32 = 0.2;

#[derive(Clone, Copy, Default)]
struct Branch {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    intensity: f32,
    age: f32,
    life: f32,
    active: bool,
}

pub struct Lightning {
    branches: [Branch; MAX_BRANCHES],
    flash: f32,
    spawn_chance: f32,
    core: Rgb888,
    glow: Rgb888,
    start_x: (f32, f32),
    start_y: (f32, f32),
    target_y: (f32, f32),
}

impl Default for Lightning {
    fn default() -> Self {
        Self::new()
    }
}

impl Lightning {
    pub fn new() -> Self {
        Self {
            branches: [Branch::default(); MAX_BRANCHES],
            flash: 0.0,
            spawn_chance: DEFAULT_SPAWN_CHANCE,
            core: Rgb888::new(255, 255, 255),
            glow: Rgb888::new(200, 220, 255),
            start_x: (8.0, 24.0),
            start_y: (2.0, 10.0),
            target_y: (28.0, 32.0),
        }
    }

    /// Drop every live bolt and end any flash.
    pub fn reset(&mut self) {
        self.branches.iter_mut().for_each(|b| b.active = false);
        self.flash = 0.0;
    }

    pub fn set_spawn_chance(&mut self, chance: f32) {
        self.spawn_chance = chance;
    }

    pub fn set_colors(&mut self, core: Rgb888, glow: Rgb888) {
        self.core = core;
        self.glow = glow;
    }

    pub fn set_start_area(&mut self, x: (f32, f32), y: (f32, f32)) {
        self.start_x = x;
        self.start_y = y;
    }

    pub fn set_target_area(&mut self, y: (f32, f32)) {
        self.target_y = y;
    }

    /// Advance by `dt` seconds. Returns the start point of a strike spawned
    /// during this step, if any.
    pub fn update(&mut self, dt: f32, rng: &mut Rng) -> Option<(f32, f32)> {
        if self.flash > 0.0 {
            self.flash -= dt;
        }

        let spawned = (rng.below(10_000) as f32) < self.spawn_chance * 10_000.0;
        let origin = spawned.then(|| self.trigger_strike(rng, None, None));

        for b in self.branches.iter_mut().filter(|b| b.active) {
            b.age += dt;
            if b.age >= b.life {
                b.active = false;
            } else {
                b.intensity *= 1.0 - (b.age / b.life) * 0.1;
            }
        }
        origin
    }

    /// Strike now. Missing coordinates are drawn from the configured areas.
    pub fn trigger_strike(
        &mut self,
        rng: &mut Rng,
        start: Option<(f32, f32)>,
        target: Option<(f32, f32)>,
    ) -> (f32, f32) {
        let (sx, sy) = start.unwrap_or_else(|| (pick(rng, self.start_x), pick(rng, self.start_y)));
        let (tx, ty) = target.unwrap_or_else(|| (sx + rng.range(-6, 6) as f32, pick(rng, self.target_y)));
        self.grow(rng, sx, sy, tx, ty, 0, 1.0);
        self.flash = FLASH_SECS;
        (sx, sy)
    }

    fn grow(&mut self, rng: &mut Rng, x1: f32, y1: f32, tx: f32, ty: f32, generation: u8, intensity: f32) {
        if generation > MAX_GENERATION {
            return;
        }
        let Some(slot) = self.branches.iter().position(|b| !b.active) else {
            return;
        };

        let dx = tx - x1;
        let dy = ty - y1;
        let distance = sqrtf(dx * dx + dy * dy);
        if distance < MIN_LENGTH {
            return;
        }

        let jitter = rng.range(-ANGLE_JITTER_DEG, ANGLE_JITTER_DEG) as f32;
        let angle = atan2f(dy, dx) + jitter * PI / 180.0;
        let length = (MIN_LENGTH + distance * LENGTH_DECAY * powf(0.8, generation as f32)).min(distance * 0.8);
        let x2 = x1 + cosf(angle) * length;
        let y2 = y1 + sinf(angle) * length;

        self.branches[slot] = Branch {
            x1,
            y1,
            x2,
            y2,
            intensity: intensity * (0.8 + 0.2 * rng.below(100) as f32 / 100.0),
            age: 0.0,
            life: 0.15 + rng.below(50) as f32 / 1000.0,
            active: true,
        };

        if generation < 4 && (rng.below(100) as i32) < 40 - generation as i32 * 8 {
            let fork = angle + rng.range(-45, 45) as f32 * PI / 180.0;
            let half = length * 0.5;
            let (fx, fy) = (x2 + cosf(fork) * half, y2 + sinf(fork) * half);
            self.grow(rng, x2, y2, fx, fy, generation + 1, intensity * 0.6);
        }
        if generation < 3 {
            self.grow(rng, x2, y2, tx, ty, generation + 1, intensity * 0.9);
        }
    }

    /// Glow then core line for every live segment.
    pub fn render(&self, frame: &mut Frame) {
        for b in self.branches.iter().filter(|b| b.active) {
            let glow = scale(self.glow, b.intensity * 0.6);
            for off in -1..=1 {
                let o = off as f32;
                seg(frame, b.x1 + o, b.y1, b.x2 + o, b.y2, glow);
                seg(frame, b.x1, b.y1 + o, b.x2, b.y2 + o, glow);
            }
            seg(frame, b.x1, b.y1, b.x2, b.y2, scale(self.core, b.intensity));
        }
    }

    /// Random blue-white sparkles while the post-strike flash lasts.
    pub fn render_flash(&self, frame: &mut Frame, rng: &mut Rng) {
        let f = self.thunder_intensity();
        if f <= 0.0 {
            return;
        }
        let c = Rgb888::new((255.0 * f * 0.3) as u8, (255.0 * f * 0.4) as u8, (255.0 * f * 0.7) as u8);
        for _ in 0..(f * 20.0) as u32 {
            frame.put(rng.below(32) as i32, rng.below(32) as i32, c);
        }
    }

    pub fn is_flashing(&self) -> bool {
        self.flash > 0.0
    }

    /// Flash strength in `[0, 1]`, zero when no flash is running.
    pub fn thunder_intensity(&self) -> f32 {
        if self.is_flashing() { (self.flash / FLASH_SECS).min(1.0) } else { 0.0 }
    }

    pub fn live_branches(&self) -> usize {
        self.branches.iter().filter(|b| b.active).count()
    }
}

fn pick(rng: &mut Rng, (lo, hi): (f32, f32)) -> f32 {
    lo + rng.below((hi - lo) as u32) as f32
}

fn seg(frame: &mut Frame, x1: f32, y1: f32, x2: f32, y2: f32, c: Rgb888) {
    frame.line(x1 as i32, y1 as i32, x2 as i32, y2 as i32, c);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strike_grows_a_bounded_tree() {
        let mut rng = Rng::new(11);
        let mut l = Lightning::new();
        for _ in 0..50 {
            l.trigger_strike(&mut rng, None, None);
            assert!(l.live_branches() <= MAX_BRANCHES);
        }
        assert!(l.live_branches() > 0);
        assert!(l.is_flashing());
    }

    #[test]
    fn bolts_and_flash_die_out() {
        let mut rng = Rng::new(5);
        let mut l = Lightning::new();
        l.set_spawn_chance(0.0);
        l.trigger_strike(&mut rng, Some((16.0, 2.0)), Some((16.0, 30.0)));
        assert!((l.thunder_intensity() - 1.0).abs() < 1e-6);
        for _ in 0..10 {
            l.update(0.05, &mut rng);
        }
        assert_eq!(l.live_branches(), 0);
        assert!(!l.is_flashing());
        assert_eq!(l.thunder_intensity(), 0.0);
    }

    #[test]
    fn render_lights_the_first_segment() {
        let mut rng = Rng::new(2);
        let mut l = Lightning::new();
        l.trigger_strike(&mut rng, Some((16.0, 4.0)), Some((16.0, 30.0)));
        let mut f = Frame::new();
        l.render(&mut f);
        assert_ne!(f.get(16, 4), Rgb888::new(0, 0, 0));
    }
}
