//! Full-frame procedural effects.
//!
//! A steps to the next effect, B speeds the animation up and C slows it
//! down. Most effects are pure functions of pixel position and effect time;
//! matrix rain and the starfield carry a little state between frames.

use core::f32::consts::TAU;

use embassy_time::Instant;
use embedded_graphics::pixelcolor::{
    Rgb888,
    RgbColor,
};
use libm::{
    atan2f,
    cosf,
    expf,
    sinf,
    sqrtf,
};

use crate::{
    color::hsv,
    config::{
        HEIGHT,
        WIDTH,
    },
    frame::Frame,
    game::{
        Cooldown,
        ExitDetector,
        Game,
    },
    input::ButtonOctet,
    panel::Panel,
    rng::Rng,
};

const BRIGHTNESS: f32 = 0.6;
const TIME_STEP: f32 = 0.05;
const SPEED_STEP: f32 = 0.1;
const MIN_SPEED: f32 = 0.1;
const MAX_SPEED: f32 = 5.0;

const CX: f32 = WIDTH as f32 / 2.0;
const CY: f32 = HEIGHT as f32 / 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    Plasma,
    RainbowSpiral,
    MatrixRain,
    FireRipples,
    Vortex,
    Metaballs,
    PulsingBlobs,
    Starfield,
}

impl Effect {
    pub const ALL: [Effect; 8] = [
        Effect::Plasma,
        Effect::RainbowSpiral,
        Effect::MatrixRain,
        Effect::FireRipples,
        Effect::Vortex,
        Effect::Metaballs,
        Effect::PulsingBlobs,
        Effect::Starfield,
    ];

    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    /// Per-pixel shader for the stateless effects.
    fn shader(self) -> Option<fn(f32, f32, f32) -> Rgb888> {
        match self {
            Effect::Plasma => Some(plasma),
            Effect::RainbowSpiral => Some(rainbow_spiral),
            Effect::FireRipples => Some(fire_ripples),
            Effect::Vortex => Some(vortex),
            Effect::Metaballs => Some(metaballs),
            Effect::PulsingBlobs => Some(pulsing_blobs),
            Effect::MatrixRain | Effect::Starfield => None,
        }
    }
}

fn fract(v: f32) -> f32 {
    v - libm::floorf(v)
}

// ── Stateless shaders ───────────────────────────────────────────────────────
//
// Each takes the pixel centre offset `(cx, cy)` from the middle of the panel
// and the effect time `t`.

fn plasma(cx: f32, cy: f32, t: f32) -> Rgb888 {
    let (x, y) = (cx + CX, cy + CY);
    let v = sinf(x * 0.2 + t)
        + sinf(y * 0.3 + t * 0.8)
        + sinf((cx + cy) * 0.25 + t * 1.2)
        + sinf(sqrtf(cx * cx + cy * cy) * 0.3 + t * 0.7);
    hsv((v * 0.25 + 1.0) * 0.5, 1.0, 1.0)
}

fn rainbow_spiral(cx: f32, cy: f32, t: f32) -> Rgb888 {
    let angle = atan2f(cy, cx);
    let d = sqrtf(cx * cx + cy * cy);
    let hue = fract(angle / TAU + d * 0.1 - t * 0.3);
    hsv(hue, 1.0, 0.5 + 0.5 * sinf(d * 0.3 - t * 2.0))
}

fn fire_ripples(cx: f32, cy: f32, t: f32) -> Rgb888 {
    let d = sqrtf(cx * cx + cy * cy);
    let waves = sinf(d * 0.5 - t * 3.0) + sinf(d * 0.3 - t * 2.0) + sinf(d * 0.8 - t * 1.5);
    let i = (waves * 0.33 + 0.5).clamp(0.0, 1.0);
    Rgb888::new((i * 255.0) as u8, (i * i * 180.0) as u8, (i * i * i * 100.0) as u8)
}

fn vortex(cx: f32, cy: f32, t: f32) -> Rgb888 {
    let d = sqrtf(cx * cx + cy * cy);
    let twisted = atan2f(cy, cx) + d * 0.3 * sinf(t);
    let a = sinf(twisted * 3.0 + t * 2.0);
    let b = cosf(twisted * 5.0 - t * 1.5);
    let c = sinf(d * 0.8 + twisted * 2.0 + t);
    let i = (a * b + c) * 0.5 + 0.5;
    let i = i * i;
    hsv(fract(twisted / TAU + t * 0.1), 0.8 + i * 0.2, i)
}

fn metaballs(cx: f32, cy: f32, t: f32) -> Rgb888 {
    let balls = [
        (sinf(t * 0.7) * 8.0, cosf(t * 0.5) * 6.0),
        (cosf(t * 0.9) * 6.0, sinf(t * 0.8) * 8.0),
        (sinf(t * 1.2) * 4.0, cosf(t * 1.1) * 5.0),
    ];
    let size = 6.0 + 2.0 * sinf(t * 2.0);
    let mut field: f32 = balls
        .iter()
        .map(|&(bx, by)| {
            let (dx, dy) = (cx - bx, cy - by);
            size / (sqrtf(dx * dx + dy * dy) + 1.0)
        })
        .sum();
    field = field.min(2.0) + sinf(cx * 0.3 + t) * cosf(cy * 0.4 + t * 1.2) * 0.2;
    if field > 0.8 {
        hsv(fract(t * 0.1 + field * 0.3), 0.9, field * 0.5)
    } else {
        Rgb888::BLACK
    }
}

fn pulsing_blobs(cx: f32, cy: f32, t: f32) -> Rgb888 {
    let blob = |bx: f32, by: f32, pulse: f32| {
        let (dx, dy) = (cx - bx, cy - by);
        expf(-(sqrtf(dx * dx + dy * dy) / pulse) * 0.3)
    };
    let i = (blob(8.0, 6.0, 1.0 + 0.5 * sinf(t * 3.0))
        + blob(-8.0, 6.0, 1.0 + 0.5 * cosf(t * 2.5))
        + blob(0.0, -8.0, 1.0 + 0.3 * sinf(t * 4.0)))
    .min(1.0);
    if i > 0.1 {
        hsv(fract(0.7 + i * 0.3 + t * 0.05), 1.0, i)
    } else {
        Rgb888::BLACK
    }
}

// ── Matrix rain ─────────────────────────────────────────────────────────────

const TAIL: i32 = 8;

struct Rain {
    drops: [f32; WIDTH as usize],
}

impl Rain {
    fn new(rng: &mut Rng) -> Self {
        let mut drops = [0.0; WIDTH as usize];
        for d in drops.iter_mut() {
            *d = rng.below(HEIGHT as u32) as f32;
        }
        Self { drops }
    }

    fn advance(&mut self, speed: f32, rng: &mut Rng) {
        for d in self.drops.iter_mut() {
            *d += (0.3 + rng.below(10) as f32 * 0.01) * speed;
            if *d > (HEIGHT + TAIL) as f32 {
                *d = -(TAIL as f32) - rng.below(10) as f32;
            }
        }
    }

    fn draw(&self, f: &mut Frame) {
        f.blank();
        for (x, &d) in self.drops.iter().enumerate() {
            let head = d as i32;
            f.put(x as i32, head, Rgb888::GREEN);
            for y in (head - TAIL + 1).max(0)..head {
                let fade = (255 - (head - y) * 32).max(0) as u8;
                f.put(x as i32, y, Rgb888::new(0, fade, 0));
            }
        }
    }
}

// ── Starfield ───────────────────────────────────────────────────────────────

const MAX_DISTANCE: f32 = 27.627417; // centre to corner plus 5

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layer {
    Slow,
    Medium,
    Fast,
}

impl Layer {
    /// `(brightness floor, speed floor, speed spread, pace)`.
    fn params(self) -> (f32, f32, f32, f32) {
        match self {
            Layer::Slow => (0.4, 0.1, 1.0, 0.4),
            Layer::Medium => (0.5, 0.4, 2.0, 0.7),
            Layer::Fast => (0.6, 1.0, 4.0, 1.4),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Star {
    layer: Layer,
    angle: f32,
    distance: f32,
    brightness: f32,
    speed: f32,
}

impl Star {
    fn spawn(layer: Layer, distance: f32, rng: &mut Rng) -> Self {
        let (b, s, spread, _) = layer.params();
        Self {
            layer,
            angle: rng.between(0.0, TAU),
            distance,
            brightness: b + rng.between(0.0, 0.4),
            speed: s + rng.between(0.0, spread),
        }
    }

    fn position(&self, distance: f32) -> (i32, i32) {
        ((CX + cosf(self.angle) * distance) as i32, (CY + sinf(self.angle) * distance) as i32)
    }
}

const SLOW: usize = 8;
const MEDIUM: usize = 12;
const FAST: usize = 16;

struct Starfield {
    stars: [Star; SLOW + MEDIUM + FAST],
}

impl Starfield {
    fn new(rng: &mut Rng) -> Self {
        let mut stars = [Star::spawn(Layer::Slow, 0.0, rng); SLOW + MEDIUM + FAST];
        for (i, s) in stars.iter_mut().enumerate() {
            let layer = match i {
                i if i < SLOW => Layer::Slow,
                i if i < SLOW + MEDIUM => Layer::Medium,
                _ => Layer::Fast,
            };
            *s = Star::spawn(layer, rng.between(0.0, MAX_DISTANCE * 0.8), rng);
        }
        Self { stars }
    }

    fn advance(&mut self, speed: f32, rng: &mut Rng) {
        for s in self.stars.iter_mut() {
            s.distance += s.speed * speed * s.layer.params().3;
            if s.distance > MAX_DISTANCE {
                *s = Star::spawn(s.layer, rng.between(0.0, 2.0), rng);
            }
        }
    }

    fn draw(&self, f: &mut Frame, t: f32, speed: f32) {
        f.fill(Rgb888::new(0, 0, 8));
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let (xf, yf) = (x as f32, y as f32);
                let a = sinf(xf * 0.1 + t * 0.3) * cosf(yf * 0.15 + t * 0.2);
                let b = sinf(xf * 0.08 - t * 0.25) * cosf(yf * 0.12 - t * 0.15);
                let nebula = ((a + b) * 0.3 + 0.3).clamp(0.0, 0.4);
                if nebula > 0.2 {
                    let i = (nebula * 100.0) as u8;
                    f.put(x, y, Rgb888::new(i, i / 2, i));
                }
            }
        }

        let tint = |c: (f32, f32, f32), k: f32| Rgb888::new((c.0 * k) as u8, (c.1 * k) as u8, (c.2 * k) as u8);
        let (mut medium, mut fast) = (0, 0);
        for s in &self.stars {
            let (x, y) = s.position(s.distance);
            match s.layer {
                Layer::Slow => {
                    let k = s.brightness * (0.6 + 0.4 * sinf(t * 2.0));
                    f.put(x, y, tint((120.0, 120.0, 140.0), k));
                }
                Layer::Medium => {
                    let i = medium;
                    medium += 1;
                    let k = s.brightness * (0.7 + 0.3 * sinf(t * 3.0 + i as f32 * 0.5));
                    let c = if i % 5 == 0 { (255.0, 220.0, 180.0) } else { (200.0, 200.0, 220.0) };
                    f.put(x, y, tint(c, k));
                    if k > 0.7 && (1..WIDTH - 1).contains(&x) && (1..HEIGHT - 1).contains(&y) {
                        let halo = tint((80.0, 80.0, 100.0), k);
                        for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                            f.put(x + dx, y + dy, halo);
                        }
                    }
                }
                Layer::Fast => {
                    let i = fast;
                    fast += 1;
                    let k = s.brightness * (0.8 + 0.2 * sinf(t * 5.0 + i as f32 * 0.3));
                    let c = match i {
                        i if i % 7 == 0 => (255.0, 255.0, 180.0),
                        i if i % 11 == 0 => (180.0, 200.0, 255.0),
                        i if i % 13 == 0 => (255.0, 180.0, 180.0),
                        _ => (255.0, 245.0, 235.0),
                    };
                    f.put(x, y, tint(c, k));
                    if k > 0.7 && s.distance > 3.0 {
                        for step in 1..=2 {
                            let back = s.distance - step as f32 * s.speed * speed * 0.5;
                            if back > 0.0 {
                                let (tx, ty) = s.position(back);
                                f.put(tx, ty, tint((120.0, 140.0, 160.0), k * (1.0 - step as f32 * 0.4)));
                            }
                        }
                    }
                }
            }
        }
    }
}

// ── Game ────────────────────────────────────────────────────────────────────

pub struct ShaderGallery {
    effect: Effect,
    speed: f32,
    time: f32,
    rain: Rain,
    stars: Starfield,
    rng: Rng,
    next_effect: Cooldown,
    speed_change: Cooldown,
    exit: ExitDetector,
    quit: bool,
}

impl Default for ShaderGallery {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderGallery {
    pub fn new() -> Self {
        let mut rng = Rng::new(0x5ade);
        Self {
            effect: Effect::Plasma,
            speed: 1.0,
            time: 0.0,
            rain: Rain::new(&mut rng),
            stars: Starfield::new(&mut rng),
            rng,
            next_effect: Cooldown::from_millis(200),
            speed_change: Cooldown::from_millis(100),
            exit: ExitDetector::new(),
            quit: false,
        }
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

impl Game for ShaderGallery {
    fn name(&self) -> &'static str {
        "PRETTY"
    }

    fn description(&self) -> &'static str {
        "Procedural light shows"
    }

    fn init(&mut self, frame: &mut Frame, panel: &mut dyn Panel, now: Instant) {
        panel.set_brightness(BRIGHTNESS);
        self.rng = Rng::from_instant(now);
        self.rain = Rain::new(&mut self.rng);
        self.stars = Starfield::new(&mut self.rng);
        self.effect = Effect::Plasma;
        self.speed = 1.0;
        self.time = 0.0;
        self.next_effect.reset();
        self.speed_change.reset();
        self.exit.reset();
        self.quit = false;
        frame.blank();
    }

    fn handle_input(&mut self, input: ButtonOctet, now: Instant) {
        self.quit = self.exit.poll(input.d, now);
        if input.a && self.next_effect.try_fire(now) {
            self.effect = self.effect.next();
            info!("shader gallery: {:?}", self.effect);
        }
        if input.b && self.speed_change.try_fire(now) {
            self.speed = (self.speed + SPEED_STEP).min(MAX_SPEED);
        }
        if input.c && self.speed_change.try_fire(now) {
            self.speed = (self.speed - SPEED_STEP).max(MIN_SPEED);
        }
    }

    fn update(&mut self, _now: Instant) -> bool {
        if self.quit {
            return false;
        }
        self.time += TIME_STEP * self.speed;
        match self.effect {
            Effect::MatrixRain => self.rain.advance(self.speed, &mut self.rng),
            Effect::Starfield => self.stars.advance(self.speed, &mut self.rng),
            _ => {}
        }
        true
    }

    fn render(&mut self, frame: &mut Frame) {
        let t = self.time;
        match self.effect.shader() {
            Some(shade) => {
                for y in 0..HEIGHT {
                    for x in 0..WIDTH {
                        frame.put(x, y, shade(x as f32 - CX, y as f32 - CY, t));
                    }
                }
            }
            None if self.effect == Effect::MatrixRain => self.rain.draw(frame),
            None => self.stars.draw(frame, t, self.speed),
        }
    }
}
