//! Conventional enemies, particles and power-ups.

use embedded_graphics::pixelcolor::{
    Rgb888,
    RgbColor,
};
use libm::sinf;

use crate::{
    color::hsv_deg,
    config::{
        HEIGHT,
        WIDTH,
    },
    rng::Rng,
};

const ENEMY_PACE: f32 = 20.0;
const PARTICLE_PACE: f32 = 10.0;
const GRAVITY: f32 = 5.0;
/// Power-ups scroll with the terrain at this many pixels per second.
const POWERUP_SCROLL: f32 = 15.0;

// ── Enemies ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnemyKind {
    #[default]
    Basic,
    /// Zig-zags.
    Fast,
    Tank,
    Shooter,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [EnemyKind::Basic, EnemyKind::Fast, EnemyKind::Tank, EnemyKind::Shooter];

    /// Points for a kill.
    pub fn bounty(self) -> u32 {
        (self as u32 + 1) * 10
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub health: i32,
    pub kind: EnemyKind,
    pub active: bool,
    /// Milliseconds since the last shot.
    pub shot_timer: u32,
    pub phase: f32,
}

impl Enemy {
    pub const SHOT_INTERVAL_MS: u32 = 800;
    /// Shooters only fire when roughly level with the player.
    pub const SHOT_BAND: f32 = 8.0;

    /// Enter from the right edge at a random height.
    pub fn spawn(&mut self, kind: EnemyKind, rng: &mut Rng) {
        let phase = rng.between(0.0, core::f32::consts::TAU);
        let (health, vx, vy) = match kind {
            EnemyKind::Basic => (1, -1.0, 0.0),
            EnemyKind::Fast => (1, -2.0, sinf(phase) * 0.5),
            EnemyKind::Tank => (3, -0.5, 0.0),
            EnemyKind::Shooter => (2, -0.8, 0.0),
        };
        *self = Enemy {
            x: WIDTH as f32 + 2.0,
            y: rng.range(3, HEIGHT - 3) as f32,
            vx,
            vy,
            health,
            kind,
            active: true,
            shot_timer: 0,
            phase,
        };
    }

    /// Move one step. Returns `true` when a shooter wants to fire at a
    /// player at height `player_y`.
    pub fn update(&mut self, dt: f32, player_y: f32) -> bool {
        self.shot_timer = self.shot_timer.saturating_add((dt * 1000.0) as u32);
        self.phase += dt * 2.0;

        let mut fire = false;
        match self.kind {
            EnemyKind::Fast => self.vy = sinf(self.phase) * 1.5,
            EnemyKind::Shooter => {
                if self.shot_timer > Self::SHOT_INTERVAL_MS && (self.y - player_y).abs() < Self::SHOT_BAND {
                    self.shot_timer = 0;
                    fire = true;
                }
            }
            _ => {}
        }

        self.x += self.vx * dt * ENEMY_PACE;
        self.y += self.vy * dt * ENEMY_PACE;
        if self.x < -5.0 {
            self.active = false;
        }
        fire
    }
}

// ── Particles ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParticleKind {
    #[default]
    Explosion,
    Exhaust,
}

#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Seconds left.
    pub life: f32,
    pub max_life: f32,
    pub color: Rgb888,
    pub kind: ParticleKind,
    pub active: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            life: 0.0,
            max_life: 0.0,
            color: Rgb888::BLACK,
            kind: ParticleKind::Explosion,
            active: false,
        }
    }
}

impl Particle {
    pub fn update(&mut self, dt: f32) {
        self.x += self.vx * dt * PARTICLE_PACE;
        self.y += self.vy * dt * PARTICLE_PACE;
        self.life -= dt;
        if self.kind == ParticleKind::Explosion {
            self.vy += dt * GRAVITY;
        }
        if self.life <= 0.0 {
            self.active = false;
        }
    }

    /// Remaining life in `[0, 1]`.
    pub fn fade(&self) -> f32 {
        if self.max_life > 0.0 { (self.life / self.max_life).clamp(0.0, 1.0) } else { 0.0 }
    }
}

fn emit(pool: &mut [Particle], p: Particle) -> bool {
    match pool.iter_mut().find(|p| !p.active) {
        Some(slot) => {
            *slot = p;
            true
        }
        None => false,
    }
}

/// `count` sparks in red through yellow around `(x, y)`.
pub fn explode(pool: &mut [Particle], rng: &mut Rng, x: f32, y: f32, count: usize) {
    for _ in 0..count {
        let life = rng.range(200, 500) as f32 / 1000.0;
        let spark = Particle {
            x: x + rng.range(-3, 3) as f32,
            y: y + rng.range(-3, 3) as f32,
            vx: rng.range(-100, 100) as f32 / 50.0,
            vy: rng.range(-100, 100) as f32 / 50.0,
            life,
            max_life: life,
            color: hsv_deg(rng.below(60) as f32, 1.0, 1.0),
            kind: ParticleKind::Explosion,
            active: true,
        };
        if !emit(pool, spark) {
            break;
        }
    }
}

/// One blue puff behind the ship's tail.
pub fn exhaust(pool: &mut [Particle], rng: &mut Rng, x: f32, y: f32) {
    let life = rng.range(100, 250) as f32 / 1000.0;
    emit(pool, Particle {
        x: x - 1.0 - rng.below(2) as f32,
        y: y + rng.range(-1, 2) as f32,
        vx: -(rng.range(50, 150) as f32) / 50.0,
        vy: rng.range(-30, 30) as f32 / 100.0,
        life,
        max_life: life,
        color: Rgb888::new(
            80 + rng.below(70) as u8,
            130 + rng.below(70) as u8,
            220 + rng.below(35) as u8,
        ),
        kind: ParticleKind::Exhaust,
        active: true,
    });
}

// ── Power-ups ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerUpKind {
    /// Advances to the next weapon.
    #[default]
    Weapon,
    Health,
    /// Picked up for show; has no effect.
    Speed,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PowerUp {
    pub x: f32,
    pub y: f32,
    pub kind: PowerUpKind,
    pub active: bool,
    pub phase: f32,
}

impl PowerUp {
    pub fn update(&mut self, dt: f32) {
        self.x -= dt * POWERUP_SCROLL;
        self.phase += dt * 5.0;
        if self.x < -2.0 {
            self.active = false;
        }
    }

    pub fn touches(&self, x: f32, y: f32) -> bool {
        (self.x - x).abs() < 2.0 && (self.y - y).abs() < 2.0
    }
}

pub fn drop_powerup(pool: &mut [PowerUp], rng: &mut Rng, x: f32, y: f32) {
    if let Some(slot) = pool.iter_mut().find(|p| !p.active) {
        let kind = match rng.below(3) {
            0 => PowerUpKind::Weapon,
            1 => PowerUpKind::Health,
            _ => PowerUpKind::Speed,
        };
        *slot = PowerUp {
            x,
            y,
            kind,
            active: true,
            phase: 0.0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_PARTICLES;

    #[test]
    fn shooter_fires_on_its_interval_when_level() {
        let mut rng = Rng::new(3);
        let mut e = Enemy::default();
        e.spawn(EnemyKind::Shooter, &mut rng);
        e.y = 16.0;
        let mut shots = 0;
        for _ in 0..40 {
            if e.update(0.05, 16.0) {
                shots += 1;
            }
        }
        assert_eq!(shots, 2);

        e.shot_timer = 0;
        for _ in 0..40 {
            assert!(!e.update(0.05, 30.0));
        }
    }

    #[test]
    fn tanks_take_three_hits() {
        let mut rng = Rng::new(3);
        let mut e = Enemy::default();
        e.spawn(EnemyKind::Tank, &mut rng);
        assert_eq!(e.health, 3);
        assert!(e.x > WIDTH as f32);
        assert!((3.0..(HEIGHT - 3) as f32).contains(&e.y));
    }

    #[test]
    fn explosions_fill_free_slots_and_burn_out() {
        let mut rng = Rng::new(9);
        let mut pool = [Particle::default(); MAX_PARTICLES];
        explode(&mut pool, &mut rng, 16.0, 16.0, 80);
        assert!(pool.iter().all(|p| p.active));
        for _ in 0..20 {
            pool.iter_mut().filter(|p| p.active).for_each(|p| p.update(0.05));
        }
        assert!(pool.iter().all(|p| !p.active));
    }
}
