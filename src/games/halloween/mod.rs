//! Halloween carousel: seven animated scenes that advance on their own every
//! eight seconds. A skips ahead, B pauses the carousel.

mod draw;
mod flock;

use embassy_time::Instant;

use crate::{
    config::WIDTH,
    frame::Frame,
    game::{
        ExitDetector,
        Game,
        millis_between,
    },
    input::{
        ButtonOctet,
        Edges,
    },
    panel::Panel,
    rng::Rng,
    scenes::storm::StormScene,
};
use flock::Flock;

const SCENE_MS: u64 = 8000;
const PAUSE_BLINK_MS: u64 = 2000;
const BLINK_MS: u64 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scene {
    Pumpkin,
    FlyingBats,
    BatFlock,
    WitchHat,
    CandleFlame,
    GhostlySpirits,
    StormyNight,
}

impl Scene {
    pub const ALL: [Scene; 7] = [
        Scene::Pumpkin,
        Scene::FlyingBats,
        Scene::BatFlock,
        Scene::WitchHat,
        Scene::CandleFlame,
        Scene::GhostlySpirits,
        Scene::StormyNight,
    ];

    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }
}

// ── Candle heat map ─────────────────────────────────────────────────────────

const HEAT_ROWS: i32 = 35;
/// Heat rows sit this far below the screen row they light.
const HEAT_LIFT: i32 = 3;
const WICK_X: i32 = 16;
const FLAME_BASE: i32 = 17;

pub struct Heat {
    cells: [f32; (WIDTH * HEAT_ROWS) as usize],
}

impl Heat {
    const fn new() -> Self {
        Self { cells: [0.0; (WIDTH * HEAT_ROWS) as usize] }
    }

    fn clear(&mut self) {
        self.cells = [0.0; (WIDTH * HEAT_ROWS) as usize];
    }

    fn index(x: i32, y: i32) -> Option<usize> {
        ((0..WIDTH).contains(&x) && (0..HEAT_ROWS).contains(&y)).then(|| (x + y * WIDTH) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> f32 {
        Self::index(x, y).map_or(0.0, |i| self.cells[i])
    }

    fn set(&mut self, x: i32, y: i32, v: f32) {
        if let Some(i) = Self::index(x, y) {
            self.cells[i] = v;
        }
    }

    /// One step: every cell averages itself with the cells below, cools
    /// slightly, and the wick feeds fresh heat.
    fn step(&mut self, flicker: f32, rng: &mut Rng) {
        for y in 0..HEAT_ROWS {
            for x in 0..WIDTH {
                let sum = self.get(x, y)
                    + self.get(x, y + 1)
                    + self.get(x, y + 2)
                    + self.get(x - 1, y + 1)
                    + self.get(x + 1, y + 1);
                self.set(x, y, sum / 5.0 * 0.96);
            }
        }
        for x in 0..WIDTH {
            self.set(x, HEAT_ROWS - 1, 0.0);
        }
        for _ in 0..3 {
            let fx = WICK_X + rng.below(3) as i32 - 1;
            self.set(fx, FLAME_BASE, flicker);
            self.set(fx, FLAME_BASE + 1, flicker * 0.8);
        }
    }
}

// ── Ghosts ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default)]
pub struct Ghost {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    phase: f32,
    opacity: f32,
}

impl Ghost {
    fn spawn(rng: &mut Rng) -> Self {
        Self {
            x: rng.below(32) as f32,
            y: rng.below(32) as f32,
            vx: rng.between(-0.5, 0.5),
            vy: rng.between(-0.5, 0.5),
            phase: rng.between(0.0, 10.0),
            opacity: rng.between(0.3, 0.8),
        }
    }

    fn drift(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.phase += 0.05;
        let wrap = |v: f32| match v {
            v if v < -5.0 => 37.0,
            v if v > 37.0 => -5.0,
            v => v,
        };
        self.x = wrap(self.x);
        self.y = wrap(self.y);
        self.opacity = 0.3 + 0.4 * libm::sinf(self.phase);
    }
}

// ── Title ───────────────────────────────────────────────────────────────────

const BATS: usize = 4;

fn bat_start(i: usize) -> f32 {
    -10.0 - i as f32 * 15.0
}

pub struct Halloween {
    scene: Scene,
    scene_start: Instant,
    paused_at: Option<Instant>,
    started: Instant,
    now: Instant,

    background: f32,
    pumpkin: f32,
    moon: f32,
    sparkle: f32,
    flicker: f32,
    bats: [f32; BATS],
    flock: Flock,
    heat: Heat,
    ghosts: [Ghost; 3],
    storm: StormScene,

    rng: Rng,
    edges: Edges,
    exit: ExitDetector,
    quit: bool,
}

impl Default for Halloween {
    fn default() -> Self {
        Self::new()
    }
}

impl Halloween {
    pub fn new() -> Self {
        let mut rng = Rng::new(31);
        let zero = Instant::from_ticks(0);
        Self {
            scene: Scene::Pumpkin,
            scene_start: zero,
            paused_at: None,
            started: zero,
            now: zero,
            background: 0.0,
            pumpkin: 0.0,
            moon: 0.0,
            sparkle: 0.0,
            flicker: 0.0,
            bats: core::array::from_fn(bat_start),
            flock: Flock::new(&mut rng),
            heat: Heat::new(),
            ghosts: [Ghost::default(); 3],
            storm: StormScene::new(31),
            rng,
            edges: Edges::default(),
            exit: ExitDetector::new(),
            quit: false,
        }
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Switch to `scene` with its animation state rewound.
    fn enter(&mut self, scene: Scene, now: Instant) {
        debug!("halloween scene {:?}", scene);
        self.scene = scene;
        self.scene_start = now;
        match scene {
            Scene::Pumpkin => self.pumpkin = 0.0,
            Scene::FlyingBats => self.bats = core::array::from_fn(bat_start),
            Scene::BatFlock => self.flock.scatter(&mut self.rng),
            Scene::WitchHat => self.sparkle = 0.0,
            Scene::CandleFlame => {
                self.heat.clear();
                self.flicker = 0.0;
            }
            Scene::GhostlySpirits => {
                for g in self.ghosts.iter_mut() {
                    *g = Ghost::spawn(&mut self.rng);
                }
            }
            Scene::StormyNight => self.storm.reset(self.rng.next_u32() as u64),
        }
    }

    fn animate(&mut self) {
        self.background += 0.02;
        for (i, b) in self.bats.iter_mut().enumerate() {
            *b += 0.3 + i as f32 * 0.1;
            if *b > 37.0 {
                *b = -10.0;
            }
        }
        match self.scene {
            Scene::Pumpkin => self.pumpkin += 0.05,
            Scene::FlyingBats => self.moon += 0.02,
            Scene::BatFlock => {
                self.moon += 0.02;
                self.flock.step();
            }
            Scene::WitchHat => self.sparkle += 0.03,
            Scene::CandleFlame => {
                self.flicker += 0.08;
                let intensity = 0.8 + 0.4 * libm::sinf(self.flicker * 8.0);
                self.heat.step(intensity, &mut self.rng);
            }
            Scene::GhostlySpirits => self.ghosts.iter_mut().for_each(Ghost::drift),
            Scene::StormyNight => self.storm.step(self.now),
        }
    }
}

impl Game for Halloween {
    fn name(&self) -> &'static str {
        "SPOOK"
    }

    fn description(&self) -> &'static str {
        "Halloween scenes"
    }

    fn init(&mut self, frame: &mut Frame, _panel: &mut dyn Panel, now: Instant) {
        self.rng = Rng::from_instant(now);
        self.started = now;
        self.now = now;
        self.paused_at = None;
        self.background = 0.0;
        self.moon = 0.0;
        self.edges = Edges::default();
        self.exit.reset();
        self.quit = false;
        self.enter(Scene::Pumpkin, now);
        frame.blank();
    }

    fn handle_input(&mut self, input: ButtonOctet, now: Instant) {
        let pressed = self.edges.rising(input);
        if pressed.a {
            self.enter(self.scene.next(), now);
        }
        if pressed.b {
            self.paused_at = match self.paused_at {
                Some(_) => {
                    // Resume with a fresh scene window.
                    self.scene_start = now;
                    None
                }
                None => Some(now),
            };
            info!("halloween paused: {}", self.paused_at.is_some());
        }
        self.quit = self.exit.poll(input.d, now);
    }

    fn update(&mut self, now: Instant) -> bool {
        if self.quit {
            return false;
        }
        self.now = now;
        if self.paused_at.is_none() && millis_between(self.scene_start, now) > SCENE_MS {
            self.enter(self.scene.next(), now);
        }
        self.animate();
        true
    }

    fn render(&mut self, frame: &mut Frame) {
        frame.blank();
        let millis = millis_between(self.started, self.now);
        match self.scene {
            Scene::Pumpkin => {
                draw::background(frame, self.background, &self.bats, millis);
                draw::pumpkin(frame, self.pumpkin);
            }
            Scene::FlyingBats => {
                draw::background(frame, self.background, &[], millis);
                draw::bats_over_moon(frame, self.moon, &self.bats, millis);
            }
            Scene::BatFlock => {
                draw::background(frame, self.background, &self.bats, millis);
                draw::bat_flock(frame, self.moon, self.flock.boids());
            }
            Scene::WitchHat => {
                draw::background(frame, self.background, &self.bats, millis);
                draw::witch_hat(frame, self.sparkle);
            }
            Scene::CandleFlame => {
                draw::background(frame, self.background, &self.bats, millis);
                draw::candle(frame, &self.heat, self.flicker);
            }
            Scene::GhostlySpirits => draw::ghosts(frame, &self.ghosts, self.background),
            Scene::StormyNight => self.storm.render(frame),
        }

        if let Some(t) = self.paused_at {
            let since = millis_between(t, self.now);
            if since < PAUSE_BLINK_MS && (since / BLINK_MS) % 2 == 0 {
                draw::pause_border(frame);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::pixelcolor::{
        Rgb888,
        RgbColor,
    };

    use super::*;
    use crate::{
        input::Button,
        panel::tests::RecordingPanel,
    };

    fn ms(t: u64) -> Instant {
        Instant::from_millis(t)
    }

    fn started() -> Halloween {
        let mut g = Halloween::new();
        g.init(&mut Frame::new(), &mut RecordingPanel::new(), ms(0));
        g
    }

    fn tap(g: &mut Halloween, button: Button, t: u64) {
        g.handle_input(ButtonOctet::only(button), ms(t));
        g.handle_input(ButtonOctet::NONE, ms(t + 10));
    }

    #[test]
    fn scenes_advance_every_eight_seconds() {
        let mut g = started();
        g.update(ms(8000));
        assert_eq!(g.scene(), Scene::Pumpkin);
        g.update(ms(8001));
        assert_eq!(g.scene(), Scene::FlyingBats);
        g.update(ms(16002));
        assert_eq!(g.scene(), Scene::BatFlock);
    }

    #[test]
    fn carousel_wraps_to_the_start() {
        assert_eq!(Scene::StormyNight.next(), Scene::Pumpkin);
        let mut g = started();
        for (i, _) in Scene::ALL.iter().enumerate() {
            tap(&mut g, Button::A, 100 + i as u64 * 100);
        }
        assert_eq!(g.scene(), Scene::Pumpkin);
    }

    #[test]
    fn a_skips_once_per_press_and_restarts_the_timer() {
        let mut g = started();
        g.handle_input(ButtonOctet::only(Button::A), ms(5000));
        g.handle_input(ButtonOctet::only(Button::A), ms(5100));
        assert_eq!(g.scene(), Scene::FlyingBats);
        g.update(ms(12000));
        assert_eq!(g.scene(), Scene::FlyingBats);
        g.update(ms(13001));
        assert_eq!(g.scene(), Scene::BatFlock);
    }

    #[test]
    fn b_pauses_the_carousel() {
        let mut g = started();
        tap(&mut g, Button::B, 1000);
        assert!(g.is_paused());
        g.update(ms(30_000));
        assert_eq!(g.scene(), Scene::Pumpkin);

        tap(&mut g, Button::B, 30_000);
        assert!(!g.is_paused());
        g.update(ms(38_000));
        assert_eq!(g.scene(), Scene::Pumpkin);
        g.update(ms(38_001));
        assert_eq!(g.scene(), Scene::FlyingBats);
    }

    #[test]
    fn pause_border_blinks_for_two_seconds() {
        let mut g = started();
        tap(&mut g, Button::B, 1000);
        let mut f = Frame::new();
        let border_at = |g: &mut Halloween, f: &mut Frame, t: u64| {
            g.update(ms(t));
            g.render(f);
            f.get(0, 0) == Rgb888::YELLOW && f.get(31, 31) == Rgb888::YELLOW
        };
        assert!(border_at(&mut g, &mut f, 1000));
        assert!(!border_at(&mut g, &mut f, 1250));
        assert!(border_at(&mut g, &mut f, 1450));
        assert!(!border_at(&mut g, &mut f, 3000));
    }

    #[test]
    fn every_scene_draws_something() {
        let mut g = started();
        for (i, scene) in Scene::ALL.into_iter().enumerate() {
            assert_eq!(g.scene(), scene);
            let base = i as u64 * 1000;
            for t in 0..20 {
                g.update(ms(base + t * 10));
            }
            if scene == Scene::GhostlySpirits {
                g.ghosts[0] = Ghost { x: 16.0, y: 16.0, opacity: 0.7, ..Ghost::default() };
            }
            let mut f = Frame::new();
            g.render(&mut f);
            assert!(!f.is_blank(), "{:?}", scene);
            tap(&mut g, Button::A, base + 500);
        }
    }

    #[test]
    fn candle_heat_rises_from_the_wick() {
        let mut rng = Rng::new(2);
        let mut heat = Heat::new();
        for _ in 0..30 {
            heat.step(1.0, &mut rng);
        }
        assert!(heat.get(WICK_X, FLAME_BASE - 3) > 0.1);
        assert_eq!(heat.get(WICK_X, HEAT_ROWS - 1), 0.0);
        assert!(heat.cells.iter().all(|&h| h <= 1.0));
    }

    #[test]
    fn skipping_to_the_candle_puts_it_out() {
        let mut g = started();
        for t in 0..4 {
            tap(&mut g, Button::A, 100 + t * 100);
        }
        assert_eq!(g.scene(), Scene::CandleFlame);
        for t in 0..50 {
            g.update(ms(1000 + t * 10));
        }
        assert!(g.heat.cells.iter().any(|&h| h > 0.0));
        for t in 0..7 {
            tap(&mut g, Button::A, 2000 + t * 100);
        }
        assert_eq!(g.scene(), Scene::CandleFlame);
        assert!(g.heat.cells.iter().all(|&h| h == 0.0));
    }

    #[test]
    fn ghosts_wrap_around_the_edges() {
        let mut g = Ghost { x: 37.0, y: -5.0, vx: 0.5, vy: -0.5, ..Ghost::default() };
        g.drift();
        assert_eq!((g.x, g.y), (-5.0, 37.0));
    }

    #[test]
    fn holding_d_leaves() {
        let mut g = started();
        let d = ButtonOctet::only(Button::D);
        g.handle_input(d, ms(100));
        assert!(g.update(ms(100)));
        g.handle_input(d, ms(1100));
        assert!(!g.update(ms(1100)));
    }
}
