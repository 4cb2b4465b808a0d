//! Compile-time tuning for the launcher and the shared pipeline.

use embassy_time::Duration;

// ── Frame pacing ────────────────────────────────────────────────────────────

pub const TICK_HZ: u64 = 20;
pub const TICK_MS: u64 = 1000 / TICK_HZ;
pub const TICK: Duration = Duration::from_millis(TICK_MS);
/// Sleep slice while waiting for the next tick.
pub const LOOP_SLEEP_MS: u64 = 10;

// ── Panel ───────────────────────────────────────────────────────────────────

pub const WIDTH: i32 = 32;
pub const HEIGHT: i32 = 32;
pub const INITIAL_BRIGHTNESS: f32 = 0.5;
pub const BRIGHTNESS_STEP: f32 = 0.1;
pub const BRIGHTNESS_COOLDOWN_MS: u64 = 200;

// ── Menu / exit ─────────────────────────────────────────────────────────────

pub const MENU_DEBOUNCE_MS: u64 = 200;
pub const EXIT_HOLD_MS: u64 = 1000;

// ── Racer ───────────────────────────────────────────────────────────────────

pub const RACER_THEME_DISTANCE: f32 = 1500.0;
pub const SCENERY_POOL: usize = 20;
pub const TRAFFIC_POOL: usize = 5;

// ── Side-scroller ───────────────────────────────────────────────────────────

pub const TRAIL_LEN: usize = 12;
pub const MAX_BULLETS: usize = 20;
pub const MAX_ENEMY_BULLETS: usize = 15;
pub const MAX_ENEMIES: usize = 8;
pub const MAX_SWARM: usize = 16;
pub const MAX_PARTICLES: usize = 50;
pub const MAX_POWERUPS: usize = 3;

/// Boid weights per swarm kind: separation, alignment, cohesion, seek player.
pub const SWARM_WEIGHTS: [[f32; 4]; 3] = [
    [1.5, 1.0, 1.0, 0.3],  // drone
    [1.0, 1.5, 2.0, -0.5], // defensive (flees)
    [1.2, 0.8, 0.8, 0.8],  // aggressive
];
