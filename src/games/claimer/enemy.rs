//! The bouncing creatures that guard the unclaimed space.

use core::f32::consts::TAU;

use embedded_graphics::pixelcolor::{
    Rgb888,
    RgbColor,
};
use heapless::Deque;
use libm::{
    cosf,
    sinf,
    sqrtf,
};

use super::{
    Cell,
    FIELD,
    Field,
};
use crate::{
    color::{
        hsv,
        scale,
    },
    frame::Frame,
    rng::Rng,
};

/// Enemies stay this many cells clear of the border.
const MARGIN: f32 = 5.0;
const TRAIL_LEN: usize = 15;
const TRAIL_LIFE: f32 = 1.5;
const TRAIL_EVERY: f32 = 0.05;
/// Fixed animation step; the field runs at the tick rate.
const STEP: f32 = 0.05;
const STUCK_DISTANCE: f32 = 0.1;
const STUCK_TICKS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Kind {
    Butterfly,
    Turtle,
    Spiral,
    Star,
    Diamond,
    Jellyfish,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Butterfly,
        Kind::Turtle,
        Kind::Spiral,
        Kind::Star,
        Kind::Diamond,
        Kind::Jellyfish,
    ];
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    x: i32,
    y: i32,
    age: f32,
    color: Rgb888,
}

#[derive(Clone, Copy, Debug, Default)]
struct Phases {
    motion: f32,
    hue: f32,
    size: f32,
    morph: f32,
    glow: f32,
}

impl Phases {
    fn random(rng: &mut Rng) -> Self {
        Self {
            motion: rng.between(0.0, TAU),
            hue: rng.between(0.0, TAU),
            size: rng.between(0.0, TAU),
            morph: rng.between(0.0, TAU),
            glow: rng.between(0.0, TAU),
        }
    }

    fn advance(&mut self, dt: f32) {
        let wrap = |p: f32| if p > TAU { p - TAU } else { p };
        self.motion = wrap(self.motion + dt * 3.0);
        self.hue = wrap(self.hue + dt * 1.5);
        self.size = wrap(self.size + dt * 4.0);
        self.morph = wrap(self.morph + dt * 2.0);
        self.glow = wrap(self.glow + dt * 2.5);
    }
}

pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub speed: f32,
    pub kind: Kind,
    phases: Phases,
    trail: Deque<Segment, TRAIL_LEN>,
    since_segment: f32,
    last: (f32, f32),
    stuck: u32,
}

impl Enemy {
    pub fn new(x: f32, y: f32, dx: f32, dy: f32, speed: f32, kind: Kind, rng: &mut Rng) -> Self {
        Self {
            x,
            y,
            dx,
            dy,
            speed,
            kind,
            phases: Phases::random(rng),
            trail: Deque::new(),
            since_segment: 0.0,
            last: (x, y),
            stuck: 0,
        }
    }

    /// Cell the enemy is over.
    pub fn cell(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }

    /// Within one cell of `(x, y)` on both axes.
    pub fn near(&self, x: i32, y: i32) -> bool {
        let (cx, cy) = self.cell();
        (cx - x).abs() <= 1 && (cy - y).abs() <= 1
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    fn color(&self) -> Rgb888 {
        let p = &self.phases;
        let h = p.hue + sinf(p.motion) * 0.8 + cosf(p.morph) * 0.3;
        let s = 0.98 + 0.02 * sinf(p.size * 3.0);
        let v = 0.95 + 0.05 * (sinf(p.glow * 1.5) * 0.7 + 0.3);
        hsv(h / TAU, s, v)
    }

    fn animate(&mut self, rng: &mut Rng) {
        self.phases.advance(STEP);
        self.since_segment += STEP;
        if self.since_segment > TRAIL_EVERY {
            self.since_segment = 0.0;
            if self.trail.is_full() {
                self.trail.pop_front();
            }
            let segment = Segment {
                x: self.x as i32 + rng.range(-1, 2),
                y: self.y as i32 + rng.range(-1, 2),
                age: 0.0,
                color: self.color(),
            };
            let _ = self.trail.push_back(segment);
        }
        for s in self.trail.iter_mut() {
            s.age += STEP;
        }
        while self.trail.front().is_some_and(|s| s.age > TRAIL_LIFE) {
            self.trail.pop_front();
        }
    }

    /// One tick: animate, bounce off anything that is not open field, and
    /// recover from getting wedged.
    pub fn update(&mut self, field: &Field, rng: &mut Rng) {
        self.animate(rng);

        let open = |x: f32, y: f32| {
            let hi = FIELD as f32 - MARGIN - 1.0;
            (MARGIN..hi).contains(&x) && (MARGIN..hi).contains(&y) && field[y as usize][x as usize] == Cell::Empty
        };
        let nx = self.x + self.dx * self.speed;
        let ny = self.y + self.dy * self.speed;
        if open(nx, self.y) {
            self.x = nx;
        } else {
            self.dx = -self.dx + rng.range(-20, 20) as f32 / 100.0;
        }
        if open(self.x, ny) {
            self.y = ny;
        } else {
            self.dy = -self.dy + rng.range(-20, 20) as f32 / 100.0;
        }

        let (mx, my) = (self.x - self.last.0, self.y - self.last.1);
        let moved = sqrtf(mx * mx + my * my);
        if moved < STUCK_DISTANCE {
            self.stuck += 1;
            if self.stuck > STUCK_TICKS {
                debug!("claimer enemy wedged, recentring");
                self.x = FIELD as f32 / 2.0;
                self.y = FIELD as f32 / 2.0;
                self.dx = rng.range(-100, 100) as f32 / 100.0;
                self.dy = rng.range(-100, 100) as f32 / 100.0;
                if self.dx == 0.0 && self.dy == 0.0 {
                    (self.dx, self.dy) = (1.0, 0.7);
                }
                self.stuck = 0;
            }
        } else {
            self.stuck = 0;
        }
        self.last = (self.x, self.y);

        let mag = sqrtf(self.dx * self.dx + self.dy * self.dy);
        if mag > 0.1 {
            self.dx /= mag;
            self.dy /= mag;
        }
        let hi = FIELD as f32 - MARGIN - 1.0;
        self.x = self.x.clamp(MARGIN, hi);
        self.y = self.y.clamp(MARGIN, hi);
    }

    // ── Drawing ─────────────────────────────────────────────────────────────

    /// Draw at field offset `(ox, oy)`; nothing lands outside the field.
    pub fn draw(&self, f: &mut Frame, ox: i32, oy: i32) {
        let mut plot = |x: i32, y: i32, c: Rgb888| {
            if (0..FIELD as i32).contains(&x) && (0..FIELD as i32).contains(&y) {
                f.put(ox + x, oy + y, c);
            }
        };

        for s in &self.trail {
            let k = (1.0 - s.age / TRAIL_LIFE) * 0.8;
            let c = scale(s.color, k);
            if c.r() > 10 || c.g() > 10 || c.b() > 10 {
                plot(s.x, s.y, c);
            }
        }

        let p = &self.phases;
        let size = 2.5 + 1.2 * sinf(p.size) * sinf(p.motion * 0.5);
        let glow = 0.85 + 0.15 * (sinf(p.glow) + cosf(p.hue * 0.7));
        let base = scale(self.color(), glow);
        let (cx, cy) = self.cell();
        let polar = |a: f32, r: f32| ((cosf(a) * r) as i32, (sinf(a) * r) as i32);

        match self.kind {
            Kind::Butterfly => {
                for dy in -1..=1 {
                    plot(cx, cy + dy, scale(base, 0.9 + 0.1 * sinf(p.glow * 2.0)));
                }
                let beat = sinf(p.motion * 5.0) * 0.6 + 0.4;
                let spread = (2.0 + sinf(p.morph) * 0.8) * size;
                let reach = ((spread * (1.0 + beat)) as i32).min((4.0 + size * 2.0) as i32);
                for i in 1..=reach {
                    let wy = cy - 1 - sinf(p.motion + i as f32) as i32;
                    let rows = if i <= 3 { 3 } else if i <= 4 { 2 } else { 1 };
                    for r in 0..rows {
                        let c = if i >= 3 && r == 1 { Rgb888::new(base.r() / 2, base.g(), base.b()) } else { base };
                        plot(cx - i, wy - r, c);
                        plot(cx + i, wy - r, c);
                    }
                }
                for i in 1..=(reach / 2 + 2).min(4) {
                    let wy = cy + 1 + (cosf(p.motion * 2.0 + i as f32) * 0.5) as i32;
                    plot(cx - i, wy, base);
                    plot(cx + i, wy, base);
                    if i <= 3 {
                        plot(cx - i, wy + 1, base);
                        plot(cx + i, wy + 1, base);
                    }
                }
            }
            Kind::Turtle => {
                plot(cx, cy, scale(base, 0.8 + 0.2 * sinf(p.glow * 3.0)));
                let shell = p.motion + sinf(p.glow) * 0.5;
                for ring in 1..=3 {
                    for step in 0..12 {
                        let a = shell + step as f32 * 0.52;
                        let r = ring as f32 * (1.0 + sinf(shell * 2.0 + step as f32) * 0.7);
                        let (dx, dy) = polar(a, r);
                        plot(cx + dx, cy + dy, scale(base, 0.6 + 0.4 * sinf(a + ring as f32)));
                    }
                }
                let limb = Rgb888::new(base.r(), base.g() / 2, base.b() / 2);
                for l in 0..4 {
                    if sinf(p.motion * 3.0 + l as f32) > 0.2 {
                        let side = if l % 2 == 0 { -1 } else { 1 };
                        let lx = cx + side * 4;
                        let ly = cy + if l < 2 { -2 } else { 2 };
                        plot(lx, ly, limb);
                        plot(lx + side, ly, limb);
                    }
                }
            }
            Kind::Spiral => {
                plot(cx, cy, scale(base, 0.7 + 0.3 * sinf(p.glow * 4.0)));
                let arms = 5 + (sinf(p.morph) * 3.0) as i32;
                let stretch = size * (1.5 + sinf(p.size) * 0.5);
                let segments = (5.0 + size * 2.0) as i32;
                for arm in 0..arms {
                    for s in 1..=segments {
                        let a = p.motion + arm as f32 * (TAU / arms as f32) + s as f32 * 0.4;
                        let (dx, dy) = polar(a, s as f32 * stretch);
                        let c = scale(base, (1.0 - s as f32 * 0.1) * (0.7 + 0.3 * sinf(a)));
                        plot(cx + dx, cy + dy, c);
                        if s <= 5 {
                            plot(cx + dx + 1, cy + dy, c);
                            plot(cx + dx, cy + dy + 1, c);
                        }
                    }
                }
            }
            Kind::Star => {
                let core = scale(base, 1.2 + 0.3 * sinf(p.glow * 6.0));
                for (dx, dy) in [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)] {
                    plot(cx + dx, cy + dy, core);
                }
                let rays = 6 + (sinf(p.morph * 2.0) * 2.0) as i32;
                let length = (3.0 + size * 2.0) as i32;
                for ray in 0..rays {
                    let a = ray as f32 * TAU / rays as f32 + p.motion * 0.5;
                    for len in 1..=length {
                        let wobble = sinf(p.motion * 2.0 + len as f32 * 0.3) * 0.5;
                        let (dx, dy) = polar(a, len as f32 + wobble);
                        let c = scale(base, (1.0 - len as f32 * 0.15).max(0.0));
                        plot(cx + dx, cy + dy, c);
                        if len <= 4 {
                            let (sx, sy) = polar(a + core::f32::consts::FRAC_PI_2, 1.0);
                            plot(cx + dx + sx, cy + dy + sy, c);
                        }
                    }
                }
            }
            Kind::Diamond => {
                plot(cx, cy, scale(base, 1.3 + 0.4 * sinf(p.glow * 7.0)));
                let span = 2.5 + size * 2.5;
                let turn = p.motion + sinf(p.morph) * 0.3;
                for layer in 1..=3 {
                    for i in 0..8 {
                        let a = turn + i as f32 * 0.785;
                        let (dx, dy) = polar(a, span * layer as f32 / 3.0);
                        plot(cx + dx, cy + dy, scale(base, 1.0 - layer as f32 * 0.2));
                        if sinf(p.glow + (i + layer) as f32) > 0.6 {
                            plot(cx + dx / 2, cy + dy / 2, Rgb888::WHITE);
                        }
                    }
                }
                if sinf(p.morph) * cosf(p.motion * 0.3) > 0.2 {
                    let shell = Rgb888::new(base.r() / 3, base.g() / 3, base.b());
                    for i in 0..6 {
                        let (dx, dy) = polar(turn * 0.5 + i as f32 * 1.047, span + 2.0);
                        plot(cx + dx, cy + dy, shell);
                    }
                }
            }
            Kind::Jellyfish => {
                plot(cx, cy, scale(base, 0.9 + 0.1 * sinf(p.glow * 8.0)));
                let dome = (3.0 + size * 1.2) as i32;
                for row in 0..=2 {
                    let w = dome - row;
                    for i in -w..=w {
                        let k = 1.0 - row as f32 * 0.15 - i.abs() as f32 * 0.1;
                        plot(cx + i, cy - row, scale(base, k.max(0.0)));
                    }
                }
                let tentacles = 5 + (sinf(p.morph) * 3.0) as i32;
                for t in 0..tentacles.max(2) {
                    let phase = p.motion * 2.0 + t as f32 * 0.8;
                    let bx = cx - dome + t * 2 * dome / (tentacles.max(2) - 1);
                    for seg in 1..=7 {
                        let sway = sinf(phase + seg as f32 * 0.6) * 2.0 + cosf(phase * 0.7 + seg as f32 * 0.3) * 0.8;
                        let c = scale(base, 1.0 - seg as f32 * 0.12);
                        plot(bx + sway as i32, cy + seg, c);
                        if seg <= 4 {
                            plot(bx + sway as i32 + 1, cy + seg, c);
                        }
                    }
                }
            }
        }
    }
}
