//! Player weapons, bullets with their fading trails, and enemy shots.

use embassy_time::Duration;
use embedded_graphics::pixelcolor::Rgb888;
use heapless::HistoryBuffer;
use libm::sqrtf;

use crate::config::{
    HEIGHT,
    TRAIL_LEN,
    WIDTH,
};

/// Screen pixels per unit of velocity per second.
const BULLET_PACE: f32 = 5.0;
const ENEMY_BULLET_PACE: f32 = 18.0;
/// Missiles only lock on inside this range.
pub const HOMING_RANGE: f32 = 15.0;
const HOMING_PULL: f32 = 2.0;
/// Shots are dropped this far outside the panel.
const MARGIN: f32 = 5.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Weapon {
    #[default]
    Single,
    Triple,
    Missile,
    /// One shot each way along both axes.
    Quad,
}

/// One projectile of a volley: offset from the ship and launch velocity.
#[derive(Clone, Copy, Debug)]
pub struct Shot {
    pub dx: f32,
    pub dy: f32,
    pub vx: f32,
    pub vy: f32,
}

const fn shot(dx: f32, dy: f32, vx: f32, vy: f32) -> Shot {
    Shot { dx, dy, vx, vy }
}

impl Weapon {
    pub const ALL: [Weapon; 4] = [Weapon::Single, Weapon::Triple, Weapon::Missile, Weapon::Quad];

    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    /// Minimum time between two volleys.
    pub fn cadence(self) -> Duration {
        Duration::from_millis(match self {
            Weapon::Single => 150,
            Weapon::Triple => 200,
            Weapon::Missile => 400,
            Weapon::Quad => 300,
        })
    }

    pub fn volley(self) -> &'static [Shot] {
        match self {
            Weapon::Single => &const { [shot(2.0, 0.0, 4.0, 0.0)] },
            Weapon::Triple => &const { [
                shot(2.0, 0.0, 4.0, 0.0),
                shot(2.0, -1.0, 4.0, -0.5),
                shot(2.0, 1.0, 4.0, 0.5),
            ] },
            Weapon::Missile => &const { [shot(2.0, 0.0, 3.0, 0.0)] },
            Weapon::Quad => &const { [
                shot(2.0, 0.0, 3.5, 0.0),
                shot(0.0, 0.0, -2.5, 0.0),
                shot(0.0, -1.0, 0.0, -3.0),
                shot(0.0, 1.0, 0.0, 3.0),
            ] },
        }
    }

    /// `(head, trail)` colours.
    pub fn colors(self) -> (Rgb888, Rgb888) {
        match self {
            Weapon::Single => (Rgb888::new(150, 255, 255), Rgb888::new(100, 230, 255)),
            Weapon::Triple => (Rgb888::new(150, 255, 150), Rgb888::new(100, 230, 100)),
            Weapon::Missile => (Rgb888::new(255, 180, 80), Rgb888::new(230, 130, 50)),
            Weapon::Quad => (Rgb888::new(255, 150, 255), Rgb888::new(230, 100, 230)),
        }
    }
}

fn off_screen(x: f32, y: f32) -> bool {
    x < -MARGIN || x > WIDTH as f32 + MARGIN || y < -MARGIN || y > HEIGHT as f32 + MARGIN
}

#[derive(Default)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub weapon: Weapon,
    pub active: bool,
    /// Most recent positions, newest written last.
    pub trail: HistoryBuffer<(f32, f32), TRAIL_LEN>,
}

impl Bullet {
    pub fn launch(&mut self, x: f32, y: f32, vx: f32, vy: f32, weapon: Weapon) {
        self.x = x;
        self.y = y;
        self.vx = vx;
        self.vy = vy;
        self.weapon = weapon;
        self.active = true;
        self.trail.clear();
    }

    /// Move, record the new position and drop the bullet once it leaves.
    pub fn advance(&mut self, dt: f32) {
        self.x += self.vx * dt * BULLET_PACE;
        self.y += self.vy * dt * BULLET_PACE;
        self.trail.write((self.x, self.y));
        if off_screen(self.x, self.y) {
            self.active = false;
        }
    }

    /// Bend toward `target` when it is within range. Only missiles home.
    pub fn home(&mut self, target: Option<(f32, f32)>, dt: f32) {
        if self.weapon != Weapon::Missile {
            return;
        }
        let Some((tx, ty)) = target else {
            return;
        };
        let (dx, dy) = (tx - self.x, ty - self.y);
        let len = sqrtf(dx * dx + dy * dy);
        if len > 0.0 && len < HOMING_RANGE {
            self.vx += dx / len * HOMING_PULL * dt;
            self.vy += dy / len * HOMING_PULL * dt;
        }
    }
}

/// Fire `weapon` from the ship at `(x, y)` into free slots of `pool`.
pub fn fire(pool: &mut [Bullet], weapon: Weapon, x: f32, y: f32) {
    let mut free = pool.iter_mut().filter(|b| !b.active);
    for s in weapon.volley() {
        match free.next() {
            Some(b) => b.launch(x + s.dx, y + s.dy, s.vx, s.vy, weapon),
            None => break,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EnemyBullet {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub active: bool,
}

impl EnemyBullet {
    pub fn advance(&mut self, dt: f32) {
        self.x += self.vx * dt * ENEMY_BULLET_PACE;
        self.y += self.vy * dt * ENEMY_BULLET_PACE;
        if off_screen(self.x, self.y) {
            self.active = false;
        }
    }
}

/// Aimed shot from `(x, y)` toward `(tx, ty)` at `speed`. Dropped when the
/// pool is full or the two points coincide.
pub fn fire_at(pool: &mut [EnemyBullet], x: f32, y: f32, tx: f32, ty: f32, speed: f32) {
    let (dx, dy) = (tx - x, ty - y);
    let len = sqrtf(dx * dx + dy * dy);
    if len <= 0.0 {
        return;
    }
    if let Some(b) = pool.iter_mut().find(|b| !b.active) {
        *b = EnemyBullet {
            x,
            y,
            vx: dx / len * speed,
            vy: dy / len * speed,
            active: true,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_BULLETS;

    fn pool() -> [Bullet; MAX_BULLETS] {
        core::array::from_fn(|_| Bullet::default())
    }

    #[test]
    fn volleys_match_weapons() {
        let mut bullets = pool();
        fire(&mut bullets, Weapon::Triple, 4.0, 16.0);
        assert_eq!(bullets.iter().filter(|b| b.active).count(), 3);
        fire(&mut bullets, Weapon::Quad, 4.0, 16.0);
        assert_eq!(bullets.iter().filter(|b| b.active).count(), 7);
        assert!(bullets.iter().any(|b| b.vx < 0.0));
        assert!(bullets.iter().any(|b| b.vy > 0.0 && b.vx == 0.0));
    }

    #[test]
    fn full_pool_drops_extra_shots() {
        let mut bullets = pool();
        for _ in 0..10 {
            fire(&mut bullets, Weapon::Quad, 10.0, 16.0);
        }
        assert!(bullets.iter().all(|b| b.active));
    }

    #[test]
    fn trail_is_capped() {
        let mut b = Bullet::default();
        b.launch(0.0, 16.0, 0.5, 0.0, Weapon::Single);
        for _ in 0..40 {
            b.advance(0.05);
            assert!(b.trail.len() <= TRAIL_LEN);
        }
        assert_eq!(b.trail.len(), TRAIL_LEN);
        assert_eq!(b.trail.recent(), Some(&(b.x, b.y)));
    }

    #[test]
    fn missile_turns_toward_target() {
        let mut b = Bullet::default();
        b.launch(10.0, 16.0, 3.0, 0.0, Weapon::Missile);
        let target = (18.0, 10.0);
        let toward = |b: &Bullet| {
            let (dx, dy) = (target.0 - b.x, target.1 - b.y);
            let (len, speed) = (sqrtf(dx * dx + dy * dy), sqrtf(b.vx * b.vx + b.vy * b.vy));
            (b.vx * dx + b.vy * dy) / (len * speed)
        };
        let before = toward(&b);
        b.home(Some(target), 0.05);
        assert!(toward(&b) > before);
        assert!(b.vy < 0.0);
    }

    #[test]
    fn homing_ignores_far_targets_and_plain_shots() {
        let mut b = Bullet::default();
        b.launch(0.0, 16.0, 3.0, 0.0, Weapon::Missile);
        b.home(Some((30.0, 0.0)), 0.05);
        assert_eq!((b.vx, b.vy), (3.0, 0.0));

        b.launch(10.0, 16.0, 4.0, 0.0, Weapon::Single);
        b.home(Some((12.0, 12.0)), 0.05);
        assert_eq!(b.vy, 0.0);
    }

    #[test]
    fn enemy_shots_fly_at_the_target() {
        let mut shots = [EnemyBullet::default(); 2];
        fire_at(&mut shots, 20.0, 16.0, 4.0, 16.0, 3.0);
        assert!(shots[0].active);
        assert_eq!(shots[0].vx, -3.0);
        shots[0].advance(0.05);
        assert!(shots[0].x < 20.0);
    }

    #[test]
    fn shots_expire_off_screen() {
        let mut b = Bullet::default();
        b.launch(36.5, 16.0, 4.0, 0.0, Weapon::Single);
        b.advance(0.05);
        assert!(!b.active);
    }
}
