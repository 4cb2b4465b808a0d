//! Boids for the bat-flock scene: separation, alignment, cohesion and a soft
//! push back from the panel edges.

use core::f32::consts::TAU;

use libm::sqrtf;

use crate::rng::Rng;

pub const BATS: usize = 12;

const MAX_SPEED: f32 = 1.5;
const MAX_FORCE: f32 = 0.03;
const SEPARATION: f32 = 3.0;
const NEIGHBOURHOOD: f32 = 8.0;
const EDGE: f32 = 4.0;
const SIZE: f32 = 32.0;

#[derive(Clone, Copy, Debug, Default)]
pub struct Boid {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub wing: f32,
}

impl Boid {
    fn spawn(rng: &mut Rng) -> Self {
        Self {
            x: 8.0 + rng.below(16) as f32,
            y: 8.0 + rng.below(16) as f32,
            vx: rng.between(-1.0, 1.0),
            vy: rng.between(-1.0, 1.0),
            wing: rng.between(0.0, TAU),
        }
    }

    pub fn speed(&self) -> f32 {
        sqrtf(self.vx * self.vx + self.vy * self.vy)
    }

    pub fn wings_up(&self) -> bool {
        libm::sinf(self.wing) > 0.0
    }
}

/// Scale `(x, y)` to length `len`; the zero vector stays put.
fn limit_to(x: f32, y: f32, len: f32) -> (f32, f32) {
    let mag = sqrtf(x * x + y * y);
    if mag > 0.0 { (x / mag * len, y / mag * len) } else { (0.0, 0.0) }
}

pub struct Flock {
    boids: [Boid; BATS],
}

impl Flock {
    pub fn new(rng: &mut Rng) -> Self {
        let mut flock = Self { boids: [Boid::default(); BATS] };
        flock.scatter(rng);
        flock
    }

    /// New random flock in the middle of the panel.
    pub fn scatter(&mut self, rng: &mut Rng) {
        for b in self.boids.iter_mut() {
            *b = Boid::spawn(rng);
        }
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn step(&mut self) {
        let snapshot = self.boids;
        for b in self.boids.iter_mut() {
            let (sx, sy) = separate(b, &snapshot);
            let (ax, ay) = align(b, &snapshot);
            let (cx, cy) = cohere(b, &snapshot);
            let (ex, ey) = edges(b);

            b.vx += sx * 1.5 + ax + cx + ex * 2.0;
            b.vy += sy * 1.5 + ay + cy + ey * 2.0;
            if b.speed() > MAX_SPEED {
                (b.vx, b.vy) = limit_to(b.vx, b.vy, MAX_SPEED);
            }
            b.x += b.vx;
            b.y += b.vy;
            b.wing += 0.2;
        }
    }
}

fn separate(b: &Boid, all: &[Boid]) -> (f32, f32) {
    let (mut x, mut y, mut n) = (0.0, 0.0, 0);
    for o in all {
        let (dx, dy) = (b.x - o.x, b.y - o.y);
        let d = sqrtf(dx * dx + dy * dy);
        if d > 0.0 && d < SEPARATION {
            // Closer neighbours push harder.
            x += dx / (d * d);
            y += dy / (d * d);
            n += 1;
        }
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    limit_to(x / n as f32, y / n as f32, MAX_FORCE)
}

fn align(b: &Boid, all: &[Boid]) -> (f32, f32) {
    let (mut x, mut y, mut n) = (0.0, 0.0, 0);
    for o in all {
        let (dx, dy) = (b.x - o.x, b.y - o.y);
        let d = sqrtf(dx * dx + dy * dy);
        if d > 0.0 && d < NEIGHBOURHOOD {
            x += o.vx;
            y += o.vy;
            n += 1;
        }
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    limit_to(x / n as f32, y / n as f32, MAX_FORCE)
}

fn cohere(b: &Boid, all: &[Boid]) -> (f32, f32) {
    let (mut x, mut y, mut n) = (0.0, 0.0, 0);
    for o in all {
        let (dx, dy) = (b.x - o.x, b.y - o.y);
        let d = sqrtf(dx * dx + dy * dy);
        if d > 0.0 && d < NEIGHBOURHOOD {
            x += o.x;
            y += o.y;
            n += 1;
        }
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    limit_to(x / n as f32 - b.x, y / n as f32 - b.y, MAX_FORCE)
}

fn edges(b: &Boid) -> (f32, f32) {
    let push = |v: f32| {
        if v < EDGE {
            (EDGE - v) * 0.1
        } else if v > SIZE - EDGE {
            -(v - (SIZE - EDGE)) * 0.1
        } else {
            0.0
        }
    };
    (push(b.x), push(b.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_is_capped() {
        let mut rng = Rng::new(12);
        let mut flock = Flock::new(&mut rng);
        for _ in 0..300 {
            flock.step();
            for b in flock.boids() {
                assert!(b.speed() <= MAX_SPEED + 1e-4);
            }
        }
    }

    #[test]
    fn edges_turn_the_flock_around() {
        let mut rng = Rng::new(5);
        let mut flock = Flock::new(&mut rng);
        for _ in 0..1000 {
            flock.step();
        }
        for b in flock.boids() {
            assert!((-10.0..42.0).contains(&b.x), "x {}", b.x);
            assert!((-10.0..42.0).contains(&b.y), "y {}", b.y);
        }
    }

    #[test]
    fn lone_boid_feels_no_neighbours() {
        let b = Boid { x: 16.0, y: 16.0, ..Boid::default() };
        let far = Boid { x: 0.0, y: 0.0, ..Boid::default() };
        assert_eq!(separate(&b, &[b, far]), (0.0, 0.0));
        assert_eq!(cohere(&b, &[b, far]), (0.0, 0.0));
        assert_eq!(edges(&b), (0.0, 0.0));
    }

    #[test]
    fn scatter_starts_near_the_middle() {
        let mut rng = Rng::new(1);
        let flock = Flock::new(&mut rng);
        for b in flock.boids() {
            assert!((8.0..24.0).contains(&b.x) && (8.0..24.0).contains(&b.y));
        }
    }
}
