//! Stormy night: drifting cloud particles, slanted rain, lightning and a
//! textured ground strip. Also the menu wallpaper.

use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb888;

use crate::{
    color::{
        lerp,
        scale,
    },
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
    noise::ValueNoise,
    panel::Panel,
    rng::Rng,
    scenes::lightning::Lightning,
};

// ── Tuning ──────────────────────────────────────────────────────────────────

const CLOUDS: usize = 80;
const DROPS: usize = 40;
const CLOUD_SPEED: f32 = 8.0;
const MAX_DT: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StormTheme {
    Classic,
    PurpleNightmare,
}

struct Palette {
    sky_top: Rgb888,
    sky_bottom: Rgb888,
    cloud_dark: Rgb888,
    cloud_light: Rgb888,
    bolt: Rgb888,
    glow: Rgb888,
    ground: Rgb888,
    rain: Rgb888,
}

impl StormTheme {
    const ALL: [StormTheme; 2] = [StormTheme::Classic, StormTheme::PurpleNightmare];

    pub fn next(self) -> Self {
        match self {
            StormTheme::Classic => StormTheme::PurpleNightmare,
            StormTheme::PurpleNightmare => StormTheme::Classic,
        }
    }

    fn palette(self) -> Palette {
        match self {
            StormTheme::Classic => Palette {
                sky_top: Rgb888::new(15, 15, 35),
                sky_bottom: Rgb888::new(5, 5, 20),
                cloud_dark: Rgb888::new(45, 45, 60),
                cloud_light: Rgb888::new(70, 70, 90),
                bolt: Rgb888::new(255, 255, 255),
                glow: Rgb888::new(200, 220, 255),
                ground: Rgb888::new(20, 25, 15),
                rain: Rgb888::new(80, 85, 95),
            },
            StormTheme::PurpleNightmare => Palette {
                sky_top: Rgb888::new(20, 5, 35),
                sky_bottom: Rgb888::new(10, 0, 20),
                cloud_dark: Rgb888::new(60, 35, 75),
                cloud_light: Rgb888::new(85, 55, 110),
                bolt: Rgb888::new(255, 255, 255),
                glow: Rgb888::new(200, 100, 255),
                ground: Rgb888::new(25, 10, 35),
                rain: Rgb888::new(70, 50, 80),
            },
        }
    }
}

#[derive(Clone, Copy, Default)]
struct Cloud {
    x: f32,
    y: f32,
    z: f32,
    vx: f32,
    vy: f32,
    density: f32,
}

#[derive(Clone, Copy, Default)]
struct RainDrop {
    x: f32,
    y: f32,
    speed: f32,
    length: f32,
}

pub struct StormScene {
    rng: Rng,
    noise: ValueNoise,
    theme: StormTheme,
    palette: Palette,
    clouds: [Cloud; CLOUDS],
    drops: [RainDrop; DROPS],
    lightning: Lightning,
    time: f32,
    last: Option<Instant>,
}

impl StormScene {
    pub fn new(seed: u64) -> Self {
        let mut rng = Rng::new(seed);
        let noise = ValueNoise::new(&mut rng);
        let theme = StormTheme::Classic;
        let mut scene = Self {
            rng,
            noise,
            theme,
            palette: theme.palette(),
            clouds: [Cloud::default(); CLOUDS],
            drops: [RainDrop::default(); DROPS],
            lightning: Lightning::new(),
            time: 0.0,
            last: None,
        };
        scene.reset(seed);
        scene
    }

    /// Fresh sky, random theme.
    pub fn reset(&mut self, seed: u64) {
        self.rng = Rng::new(seed);
        self.noise = ValueNoise::new(&mut self.rng);
        let idx = self.rng.below(StormTheme::ALL.len() as u32) as usize;
        self.set_theme(StormTheme::ALL[idx]);
        self.time = 0.0;
        self.last = None;
        self.lightning.reset();

        for c in self.clouds.iter_mut() {
            *c = Cloud {
                x: self.rng.range(-16, 48) as f32,
                y: self.rng.below(20) as f32,
                z: self.rng.below(100) as f32 / 100.0,
                vx: 0.5 + self.rng.below(100) as f32 / 200.0,
                vy: self.rng.range(-20, 20) as f32 / 100.0,
                density: 0.3 + self.rng.below(70) as f32 / 100.0,
            };
        }
        for d in self.drops.iter_mut() {
            *d = RainDrop {
                x: self.rng.range(-4, 36) as f32,
                y: self.rng.range(-8, 32) as f32,
                speed: 15.0 + self.rng.below(100) as f32 / 10.0,
                length: 2.0 + self.rng.below(30) as f32 / 10.0,
            };
        }
    }

    pub fn theme(&self) -> StormTheme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: StormTheme) {
        self.theme = theme;
        self.palette = theme.palette();
        self.lightning.set_colors(self.palette.bolt, self.palette.glow);
    }

    pub fn next_theme(&mut self) {
        self.set_theme(self.theme.next());
        debug!("storm theme {:?}", self.theme);
    }

    pub fn lightning(&self) -> &Lightning {
        &self.lightning
    }

    /// Advance to `now`. The first call only starts the clock.
    pub fn step(&mut self, now: Instant) {
        let dt = self
            .last
            .map_or(0.0, |t| millis_between(t, now) as f32 / 1000.0)
            .min(MAX_DT);
        self.last = Some(now);
        self.advance(dt);
    }

    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
        self.lightning.update(dt, &mut self.rng);

        let t = self.time;
        for c in self.clouds.iter_mut() {
            let nx = self.noise.sample(c.x * 0.1 + t * 0.2, c.y * 0.1);
            let ny = self.noise.sample(c.x * 0.1, c.y * 0.1 + t * 0.15);
            c.x += (c.vx + nx * 2.0) * dt * CLOUD_SPEED;
            c.y += (c.vy + ny * 0.5) * dt * CLOUD_SPEED;
            if c.x > 48.0 {
                c.x = -16.0;
            }
            if c.x < -16.0 {
                c.x = 48.0;
            }
            if c.y > 22.0 {
                c.y = 0.0;
            }
            if c.y < 0.0 {
                c.y = 22.0;
            }
        }

        for d in self.drops.iter_mut() {
            d.x += dt * 2.0;
            d.y += dt * d.speed;
            if d.y > 35.0 || d.x > 36.0 {
                d.x = self.rng.range(-4, 36) as f32;
                d.y = self.rng.range(-8, 2) as f32;
                d.speed = 15.0 + self.rng.below(100) as f32 / 10.0;
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let p = &self.palette;
        for y in 0..32 {
            frame.hline(0, 32, y, lerp(p.sky_top, p.sky_bottom, y as f32 / 32.0));
        }

        let t = self.time;
        for c in self.clouds.iter() {
            if !(0.0..32.0).contains(&c.x) || !(0.0..32.0).contains(&c.y) {
                continue;
            }
            let n = self.noise.sample(c.x * 0.3 + t * 0.1, c.y * 0.3 + t * 0.08);
            if n <= 0.35 {
                continue;
            }
            let base = if c.density > 0.7 { p.cloud_dark } else { p.cloud_light };
            let col = scale(base, 0.5 + c.z * 0.4);
            let (x, y) = (c.x as i32, c.y as i32);
            frame.put(x, y, col);
            if n > 0.55 && c.density > 0.6 {
                frame.put(x + 1, y, col);
                frame.put(x, y + 1, col);
            }
        }

        for d in self.drops.iter() {
            if !(0.0..32.0).contains(&d.x) || !(0.0..32.0).contains(&d.y) {
                continue;
            }
            let (x, y) = (d.x as i32, d.y as i32);
            frame.put(x, y, p.rain);
            for i in 1..d.length as i32 {
                if y - i < 0 {
                    break;
                }
                if self.rng.below(100) < 70 {
                    frame.put(x, y - i, p.rain);
                }
            }
        }

        self.lightning.render(frame);

        for y in 28..32 {
            for x in 0..32 {
                if self.noise.sample(x as f32 * 0.5, y as f32 * 0.5 + t) > 0.3 {
                    frame.put(x, y, p.ground);
                }
            }
        }

        self.lightning.render_flash(frame, &mut self.rng);
    }
}

/// The storm as a stand-alone title: C cycles the palette.
pub struct StormTitle {
    scene: StormScene,
    edges: Edges,
    exit: ExitDetector,
    quit: bool,
}

impl Default for StormTitle {
    fn default() -> Self {
        Self::new()
    }
}

impl StormTitle {
    pub fn new() -> Self {
        Self {
            scene: StormScene::new(1),
            edges: Edges::default(),
            exit: ExitDetector::new(),
            quit: false,
        }
    }
}

impl Game for StormTitle {
    fn name(&self) -> &'static str {
        "STORM"
    }

    fn description(&self) -> &'static str {
        "Thunder and rain"
    }

    fn init(&mut self, frame: &mut Frame, _panel: &mut dyn Panel, now: Instant) {
        self.scene.reset(Rng::from_instant(now).next_u32() as u64);
        self.edges = Edges::default();
        self.exit.reset();
        self.quit = false;
        frame.blank();
    }

    fn handle_input(&mut self, input: ButtonOctet, now: Instant) {
        if self.edges.rising(input).c {
            self.scene.next_theme();
        }
        self.quit = self.exit.poll(input.d, now);
    }

    fn update(&mut self, now: Instant) -> bool {
        self.scene.step(now);
        !self.quit
    }

    fn render(&mut self, frame: &mut Frame) {
        self.scene.render(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::RecordingPanel;

    #[test]
    fn clouds_stay_in_their_band() {
        let mut s = StormScene::new(9);
        for _ in 0..400 {
            s.advance(0.05);
        }
        for c in s.clouds.iter() {
            assert!((-16.0..=48.0 + 20.0).contains(&c.x));
            assert!((0.0..=22.0 + 5.0).contains(&c.y));
        }
    }

    #[test]
    fn render_paints_every_row() {
        let mut s = StormScene::new(4);
        s.advance(0.05);
        let mut f = Frame::new();
        s.render(&mut f);
        // The sky gradient never reaches black.
        for y in 0..28 {
            assert_ne!(f.get(0, y), Rgb888::new(0, 0, 0));
        }
    }

    #[test]
    fn c_press_cycles_palette() {
        let mut t = StormTitle::new();
        let mut f = Frame::new();
        let mut p = RecordingPanel::new();
        t.init(&mut f, &mut p, Instant::from_millis(0));
        let before = t.scene.theme();
        let c = ButtonOctet { c: true, ..ButtonOctet::NONE };
        t.handle_input(c, Instant::from_millis(50));
        t.handle_input(c, Instant::from_millis(100));
        assert_eq!(t.scene.theme(), before.next());
        assert!(t.update(Instant::from_millis(100)));
    }

    #[test]
    fn holding_d_leaves() {
        let mut t = StormTitle::new();
        t.init(&mut Frame::new(), &mut RecordingPanel::new(), Instant::from_millis(0));
        let d = ButtonOctet { d: true, ..ButtonOctet::NONE };
        t.handle_input(d, Instant::from_millis(100));
        assert!(t.update(Instant::from_millis(100)));
        t.handle_input(d, Instant::from_millis(1100));
        assert!(!t.update(Instant::from_millis(1100)));
    }

    #[test]
    fn releasing_d_early_restarts_the_hold() {
        let mut t = StormTitle::new();
        t.init(&mut Frame::new(), &mut RecordingPanel::new(), Instant::from_millis(0));
        let d = ButtonOctet { d: true, ..ButtonOctet::NONE };
        t.handle_input(d, Instant::from_millis(100));
        t.handle_input(ButtonOctet::NONE, Instant::from_millis(900));
        assert!(t.update(Instant::from_millis(900)));
        t.handle_input(d, Instant::from_millis(1000));
        t.handle_input(d, Instant::from_millis(1100));
        assert!(t.update(Instant::from_millis(1100)));
        t.handle_input(d, Instant::from_millis(2000));
        assert!(!t.update(Instant::from_millis(2000)));
    }
}
