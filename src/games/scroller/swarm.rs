//! Flocking enemies.
//!
//! Every member steers with the classic boid rules (separation, alignment,
//! cohesion) plus a pull toward or away from the player and a soft wall
//! that keeps the flock on screen. Alignment and cohesion only count
//! members of the same flock; separation counts everybody.

use libm::sqrtf;

use crate::{
    config::{
        HEIGHT,
        SWARM_WEIGHTS,
        WIDTH,
    },
    rng::Rng,
};

const SEPARATION: f32 = 2.5;
const NEIGHBOURHOOD: f32 = 6.0;
const WALL: f32 = 4.0;
const WALL_WEIGHT: f32 = 2.0;
const DRIFT: f32 = 0.3;
/// Screen pixels per unit of velocity per second.
pub const PACE: f32 = 15.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwarmKind {
    #[default]
    Drone,
    /// Clusters tight and keeps away from the player.
    Defensive,
    /// Closes in and shoots.
    Aggressive,
}

impl SwarmKind {
    pub const ALL: [SwarmKind; 3] = [SwarmKind::Drone, SwarmKind::Defensive, SwarmKind::Aggressive];

    pub fn index(self) -> usize {
        self as usize
    }

    /// `(max_speed, max_force)`.
    pub fn limits(self) -> (f32, f32) {
        match self {
            SwarmKind::Drone => (1.0, 0.04),
            SwarmKind::Defensive => (0.8, 0.06),
            SwarmKind::Aggressive => (1.4, 0.05),
        }
    }

    /// `[separation, alignment, cohesion, seek player]`.
    pub fn weights(self) -> [f32; 4] {
        SWARM_WEIGHTS[self.index()]
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SwarmEnemy {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub health: i32,
    pub kind: SwarmKind,
    pub flock: u32,
    pub active: bool,
    /// Milliseconds since the last shot.
    pub shot_timer: u32,
    pub wing_phase: f32,
}

impl SwarmEnemy {
    /// A still member of `flock` at `(x, y)`.
    pub fn new(kind: SwarmKind, flock: u32, x: f32, y: f32) -> Self {
        let (max_speed, max_force) = kind.limits();
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            max_speed,
            max_force,
            health: 1,
            kind,
            flock,
            active: true,
            shot_timer: 0,
            wing_phase: 0.0,
        }
    }

    pub fn speed(&self) -> f32 {
        sqrtf(self.vx * self.vx + self.vy * self.vy)
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        let (dx, dy) = (x - self.x, y - self.y);
        sqrtf(dx * dx + dy * dy)
    }

    fn limit_force(&self, (x, y): (f32, f32)) -> (f32, f32) {
        limit((x, y), self.max_force)
    }

    /// Desired direction at full speed, minus current velocity, clamped.
    fn steer_along(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let mag = sqrtf(x * x + y * y);
        if mag <= 0.0 {
            return (0.0, 0.0);
        }
        let desired = (x / mag * self.max_speed, y / mag * self.max_speed);
        self.limit_force((desired.0 - self.vx, desired.1 - self.vy))
    }

    pub fn seek(&self, tx: f32, ty: f32) -> (f32, f32) {
        self.steer_along((tx - self.x, ty - self.y))
    }

    fn separation(&self, me: usize, pool: &[SwarmEnemy]) -> (f32, f32) {
        let mut sum = (0.0, 0.0);
        let mut count = 0;
        for (_, o) in others(me, pool) {
            let (dx, dy) = (self.x - o.x, self.y - o.y);
            let d = sqrtf(dx * dx + dy * dy);
            if d > 0.0 && d < SEPARATION {
                sum.0 += dx / d / d;
                sum.1 += dy / d / d;
                count += 1;
            }
        }
        if count == 0 {
            return (0.0, 0.0);
        }
        self.steer_along((sum.0 / count as f32, sum.1 / count as f32))
    }

    fn flockmates<'a>(&'a self, me: usize, pool: &'a [SwarmEnemy]) -> impl Iterator<Item = &'a SwarmEnemy> {
        others(me, pool).map(|(_, o)| o).filter(move |o| {
            let d = self.distance_to(o.x, o.y);
            o.flock == self.flock && d > 0.0 && d < NEIGHBOURHOOD
        })
    }

    fn alignment(&self, me: usize, pool: &[SwarmEnemy]) -> (f32, f32) {
        let mut sum = (0.0, 0.0);
        let mut count = 0;
        for o in self.flockmates(me, pool) {
            sum.0 += o.vx;
            sum.1 += o.vy;
            count += 1;
        }
        if count == 0 {
            return (0.0, 0.0);
        }
        self.steer_along((sum.0 / count as f32, sum.1 / count as f32))
    }

    fn cohesion(&self, me: usize, pool: &[SwarmEnemy]) -> (f32, f32) {
        let mut sum = (0.0, 0.0);
        let mut count = 0;
        for o in self.flockmates(me, pool) {
            sum.0 += o.x;
            sum.1 += o.y;
            count += 1;
        }
        if count == 0 {
            return (0.0, 0.0);
        }
        self.seek(sum.0 / count as f32, sum.1 / count as f32)
    }

    fn walls(&self) -> (f32, f32) {
        let (w, h) = (WIDTH as f32, HEIGHT as f32);
        let mut f = (0.0, 0.0);
        if self.x < WALL {
            f.0 += (WALL - self.x) * 0.1;
        }
        if self.x > w - WALL {
            f.0 -= (self.x - (w - WALL)) * 0.1;
        }
        if self.y < WALL {
            f.1 += (WALL - self.y) * 0.1;
        }
        if self.y > h - WALL {
            f.1 -= (self.y - (h - WALL)) * 0.1;
        }
        f
    }

    /// Sum of all weighted steering terms for the member at `me`.
    fn steering(&self, me: usize, pool: &[SwarmEnemy], player: (f32, f32)) -> (f32, f32) {
        let [ws, wa, wc, wp] = self.kind.weights();
        let terms = [
            (self.separation(me, pool), ws),
            (self.alignment(me, pool), wa),
            (self.cohesion(me, pool), wc),
            (self.walls(), WALL_WEIGHT),
            (self.seek(player.0, player.1), wp),
        ];
        terms
            .iter()
            .fold((0.0, 0.0), |acc, ((x, y), w)| (acc.0 + x * w, acc.1 + y * w))
    }
}

fn limit((x, y): (f32, f32), max: f32) -> (f32, f32) {
    let mag = sqrtf(x * x + y * y);
    if mag > max { (x / mag * max, y / mag * max) } else { (x, y) }
}

fn others(me: usize, pool: &[SwarmEnemy]) -> impl Iterator<Item = (usize, &SwarmEnemy)> {
    pool.iter().enumerate().filter(move |(i, o)| *i != me && o.active)
}

/// Step every active member once, in pool order. Members later in the pool
/// see the already-moved earlier ones. Velocity is capped to each member's
/// `max_speed` before it is integrated.
pub fn flock(pool: &mut [SwarmEnemy], player: (f32, f32), dt: f32) {
    let ms = (dt * 1000.0) as u32;
    for i in 0..pool.len() {
        if !pool[i].active {
            continue;
        }
        let steer = pool[i].steering(i, pool, player);

        let s = &mut pool[i];
        s.shot_timer = s.shot_timer.saturating_add(ms);
        s.wing_phase += dt * 8.0;
        s.vx += steer.0 - DRIFT;
        s.vy += steer.1;
        (s.vx, s.vy) = limit((s.vx, s.vy), s.max_speed);
        s.x += s.vx * dt * PACE;
        s.y += s.vy * dt * PACE;

        if s.x < -8.0 {
            s.active = false;
        }
    }
}

/// Fill free slots with up to `count` members of a new flock around
/// `(x, y)`. Returns how many were placed.
pub fn spawn(pool: &mut [SwarmEnemy], rng: &mut Rng, count: usize, kind: SwarmKind, flock: u32, x: f32, y: f32) -> usize {
    let mut placed = 0;
    for slot in pool.iter_mut().filter(|s| !s.active).take(count) {
        let mut s = SwarmEnemy::new(kind, flock, x + rng.range(-3, 3) as f32, y + rng.range(-3, 3) as f32);
        s.vx = -0.5 + rng.range(-50, 50) as f32 / 100.0;
        s.vy = rng.range(-50, 50) as f32 / 100.0;
        s.wing_phase = rng.between(0.0, core::f32::consts::TAU);
        *slot = s;
        placed += 1;
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_SWARM;

    const DT: f32 = 0.05;

    fn pairwise_sum(pool: &[SwarmEnemy]) -> f32 {
        let live: heapless::Vec<&SwarmEnemy, MAX_SWARM> = pool.iter().filter(|s| s.active).collect();
        let mut sum = 0.0;
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                sum += a.distance_to(b.x, b.y);
            }
        }
        sum
    }

    #[test]
    fn speed_never_exceeds_the_cap() {
        let mut rng = Rng::new(42);
        let mut pool = [SwarmEnemy::default(); MAX_SWARM];
        for (id, kind) in SwarmKind::ALL.into_iter().enumerate() {
            spawn(&mut pool, &mut rng, 5, kind, id as u32, 20.0, 8.0 + 8.0 * id as f32);
        }
        let mut player = (4.0, 16.0);
        for tick in 0..300 {
            player.1 = 16.0 + 10.0 * libm::sinf(tick as f32 * 0.05);
            flock(&mut pool, player, DT);
            for s in pool.iter().filter(|s| s.active) {
                assert!(s.speed() <= s.max_speed + 1e-5, "{:?} at {}", s.kind, s.speed());
            }
        }
    }

    #[test]
    fn defensive_flock_pulls_together() {
        let mut pool = [SwarmEnemy::default(); MAX_SWARM];
        pool[0] = SwarmEnemy::new(SwarmKind::Defensive, 1, 10.0, 10.0);
        pool[1] = SwarmEnemy::new(SwarmKind::Defensive, 1, 12.0, 10.0);
        pool[2] = SwarmEnemy::new(SwarmKind::Defensive, 1, 11.0, 12.0);

        let mut last = pairwise_sum(&pool);
        let start = last;
        for _ in 0..10 {
            flock(&mut pool, (30.0, 30.0), DT);
            let now = pairwise_sum(&pool);
            assert!(now <= last + 1e-4, "spread grew from {last} to {now}");
            last = now;
        }
        assert!(last < start);

        let cx = pool[..3].iter().map(|s| s.x).sum::<f32>() / 3.0;
        let cy = pool[..3].iter().map(|s| s.y).sum::<f32>() / 3.0;
        assert!((0.0..WIDTH as f32).contains(&cx));
        assert!((0.0..HEIGHT as f32).contains(&cy));
        assert!(pool[..3].iter().all(|s| s.active));
    }

    #[test]
    fn flocks_only_cohere_with_their_own() {
        let mut pool = [SwarmEnemy::default(); 2];
        pool[0] = SwarmEnemy::new(SwarmKind::Drone, 1, 16.0, 16.0);
        pool[1] = SwarmEnemy::new(SwarmKind::Drone, 2, 20.0, 16.0);
        assert_eq!(pool[0].cohesion(0, &pool), (0.0, 0.0));
        assert_eq!(pool[0].alignment(0, &pool), (0.0, 0.0));
        pool[1].flock = 1;
        assert!(pool[0].cohesion(0, &pool).0 > 0.0);
    }

    #[test]
    fn walls_push_inward() {
        let s = SwarmEnemy::new(SwarmKind::Drone, 0, 1.0, 31.0);
        let (fx, fy) = s.walls();
        assert!(fx > 0.0);
        assert!(fy < 0.0);
    }

    #[test]
    fn members_leave_past_the_left_edge() {
        let mut pool = [SwarmEnemy::new(SwarmKind::Aggressive, 0, -10.0, 16.0)];
        flock(&mut pool, (30.0, 16.0), DT);
        assert!(!pool[0].active);
    }
}
