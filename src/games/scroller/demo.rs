//! Autopilot for attract mode.

use embassy_time::{
    Duration,
    Instant,
};
use libm::{
    sinf,
    sqrtf,
};

use super::{
    Player,
    weapons::EnemyBullet,
};
use crate::rng::Rng;

const STEP: f32 = 0.05;
const DEADBAND: f32 = 0.2;
const RETARGET: Duration = Duration::from_secs(3);
const DODGE_RANGE: f32 = 8.0;
const DODGE_GAP: Duration = Duration::from_secs(1);
const WEAPON_SWAP: Duration = Duration::from_secs(8);

pub struct Pilot {
    pub target_y: f32,
    retarget_at: Instant,
    last_dodge: Option<Instant>,
    weapon_since: Instant,
}

impl Pilot {
    pub fn new(now: Instant) -> Self {
        Self {
            target_y: 16.0,
            retarget_at: now + RETARGET,
            last_dodge: None,
            weapon_since: now,
        }
    }

    /// Fly the ship one tick. Firing is left to the caller, which shoots
    /// whenever the current weapon is ready.
    pub fn fly(&mut self, player: &mut Player, threats: &[EnemyBullet], rng: &mut Rng, now: Instant) {
        let dy = self.target_y - player.y;
        if dy.abs() > DEADBAND {
            player.y += STEP * dy.signum();
        }
        // Hover around the left third.
        let tx = 6.0 + sinf(now.as_millis() as f32 * 0.001) * 3.0;
        let dx = tx - player.x;
        if dx.abs() > DEADBAND {
            player.x += STEP * 0.5 * dx.signum();
        }

        let may_dodge = self
            .last_dodge
            .is_none_or(|t| now.saturating_duration_since(t) > DODGE_GAP);
        if may_dodge
            && threats.iter().any(|b| {
                let (bx, by) = (b.x - player.x, b.y - player.y);
                b.active && b.x > player.x && sqrtf(bx * bx + by * by) < DODGE_RANGE
            })
        {
            self.target_y = if rng.one_in(2) { 8.0 } else { 24.0 };
            self.last_dodge = Some(now);
            debug!("autopilot dodging to {}", self.target_y);
        }

        if now >= self.retarget_at {
            self.target_y = 8.0 + rng.below(16) as f32;
            self.retarget_at = now + RETARGET;
        }

        if now.saturating_duration_since(self.weapon_since) > WEAPON_SWAP {
            player.weapon = player.weapon.next();
            self.weapon_since = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::scroller::weapons::Weapon;

    fn ms(t: u64) -> Instant {
        Instant::from_millis(t)
    }

    #[test]
    fn climbs_toward_target() {
        let mut rng = Rng::new(1);
        let mut pilot = Pilot::new(ms(0));
        pilot.target_y = 10.0;
        let mut p = Player::new();
        for t in 0..20 {
            pilot.fly(&mut p, &[], &mut rng, ms(t * 50));
        }
        assert!((p.y - (16.0 - 20.0 * STEP)).abs() < 1e-4);
    }

    #[test]
    fn dodges_at_most_once_a_second() {
        let mut rng = Rng::new(5);
        let mut pilot = Pilot::new(ms(0));
        let mut p = Player::new();
        let shot = EnemyBullet {
            x: p.x + 4.0,
            y: p.y,
            vx: -3.0,
            vy: 0.0,
            active: true,
        };
        pilot.fly(&mut p, &[shot], &mut rng, ms(100));
        assert!(pilot.target_y == 8.0 || pilot.target_y == 24.0);

        pilot.target_y = 16.0;
        pilot.fly(&mut p, &[shot], &mut rng, ms(600));
        assert_eq!(pilot.target_y, 16.0);
        pilot.fly(&mut p, &[shot], &mut rng, ms(1200));
        assert_ne!(pilot.target_y, 16.0);
    }

    #[test]
    fn ignores_shots_already_behind() {
        let mut rng = Rng::new(5);
        let mut pilot = Pilot::new(ms(0));
        let mut p = Player::new();
        let behind = EnemyBullet {
            x: p.x - 2.0,
            y: p.y,
            vx: -3.0,
            vy: 0.0,
            active: true,
        };
        pilot.fly(&mut p, &[behind], &mut rng, ms(100));
        assert_eq!(pilot.target_y, 16.0);
    }

    #[test]
    fn swaps_weapon_every_eight_seconds() {
        let mut rng = Rng::new(5);
        let mut pilot = Pilot::new(ms(0));
        let mut p = Player::new();
        pilot.fly(&mut p, &[], &mut rng, ms(8000));
        assert_eq!(p.weapon, Weapon::Single);
        pilot.fly(&mut p, &[], &mut rng, ms(8050));
        assert_eq!(p.weapon, Weapon::Triple);
    }
}
