//! Lane crosser.
//!
//! Every screen row is a lane holding a looping tile pattern that scrolls
//! one tile every `|speed|` frames, rightward for positive speeds. The 2×2
//! frog hops from the kerb at the bottom, across the road and the river, to
//! one of the five numbered slots in the bridge at the top.
//!
//! Controls: A hops up, B hops down, VolUp steps right, VolDown left.

use embassy_time::{
    Duration,
    Instant,
};
use embedded_graphics::pixelcolor::{
    Rgb888,
    RgbColor,
};

use crate::{
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
};

const BRIGHTNESS: f32 = 0.6;
const TIME_LIMIT: Duration = Duration::from_secs(60);
const LIVES: u32 = 3;
const SLOTS: usize = 5;
const START: (i32, i32) = (15, 30);

// ── Lanes ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LaneKind {
    Start,
    Road,
    Verge,
    Water,
    Bridge,
}

#[derive(Clone, Copy)]
pub struct Lane {
    pub kind: LaneKind,
    pattern: &'static [u8],
    pub speed: i32,
    offset: i32,
}

const fn lane(kind: LaneKind, pattern: &'static [u8], speed: i32) -> Lane {
    Lane {
        kind,
        pattern,
        speed,
        offset: 0,
    }
}

const KERB: &[u8] = b"................................";
const VERGE: &[u8] = b"________________________________";
const RAIL: &[u8] = b"kmkWkmkmkWkmkmkWkmkmkWkmkmkWkmkm";
const SLOT_ROW: &[u8] = b"mk111kmk222kmk333kmk444kmk555kmk";

static LAYOUT: [Lane; 32] = {
    use LaneKind::*;
    [
        lane(Bridge, RAIL, 0),
        lane(Bridge, RAIL, 0),
        lane(Bridge, SLOT_ROW, 0),
        lane(Bridge, SLOT_ROW, 0),
        lane(Water, b"~~~~~tt+tt+tt~~~~~~~~~~~~~~~tttttt+to~~~~~~~~~~~~~~~~~~~~~~~~~", -8),
        lane(Water, b"~~~~~TT+TT+TT~~~~~~~~~~~~~~~TTTTTT+To~~~~~~~~~~~~~~~~~~~~~~~~~", -8),
        lane(Water, b"~~nnnno~~~~~~~~~~~~~~~~nno~~~~~~nno~~~nnnnno~~~~~~~~~~", 10),
        lane(Water, b"~~nnnno~~~~~~~~~~~~~~~~nno~~~~~~nno~~~nnnnno~~~~~~~~~~", 10),
        lane(Water, b"~~~~nnnno~~~~~~~~~~~~~~~~~nnno~~~~~~~~~~~~~~~nnnnno~~~~~~~~~~~~", -12),
        lane(Water, b"~~~~nnnno~~~~~~~~~~~~~~~~~nnno~~~~~~~~~~~~~~~nnnnno~~~~~~~~~~~~", -12),
        lane(Water, b"~~~~~tt+tto~~~~~~~~~~~~~~~~tttt+tto~~~~~~~~~~~~~~~~~", 6),
        lane(Water, b"~~~~~TT+TTo~~~~~~~~~~~~~~~~TTTT+TTo~~~~~~~~~~~~~~~~~", 6),
        lane(Verge, VERGE, 0),
        lane(Verge, VERGE, 0),
        lane(Road, b"...r................c...........b....p..........c.................p...................", 8),
        lane(Road, b"..rOr..............cOc.........bOb..w.w........OcO...............ObO..................", 8),
        lane(Road, b"......y...............r..........c.....O......r..........O............................", -3),
        lane(Road, b".....yOy.............rOr........cOc...bbb....OrO........ggg...........................", -3),
        lane(Road, b"..b........c..................r........ccc.........rrr............gwg...........................", -6),
        lane(Road, b".bOb......cOc................rOr......bObO........rOrO...........gOgO...........................", -6),
        lane(Road, b".........y..................b.......ppp.........c.................b.........c.........", 7),
        lane(Road, b"........yOy................bOb......OppO.......O.O...............ObO.......cOc........", 7),
        lane(Road, b"...c.........r..............bb.........ccc....cwc............yyyW...........", -12),
        lane(Road, b"..cOc.......rOr............bOb........bObO...bObO...........yOyyO...........", -12),
        lane(Road, b"................r.........y.........c....................", -5),
        lane(Road, b"...............rOr.......yOy.......cOc...................", -5),
        lane(Road, b".bb...................c.......rrr...................", 9),
        lane(Road, b"ObOb.................cOc.....rOrOr..................", 9),
        lane(Start, KERB, 0),
        lane(Start, KERB, 0),
        lane(Start, KERB, 0),
        lane(Start, KERB, 0),
    ]
};

impl Lane {
    /// Whether this lane moves on frame `frame`.
    fn moves_on(&self, frame: u32) -> bool {
        self.speed != 0 && frame % self.speed.unsigned_abs() == 0
    }

    fn scroll(&mut self, frame: u32) {
        if self.moves_on(frame) {
            self.offset = (self.offset + self.speed.signum()).rem_euclid(self.pattern.len() as i32);
        }
    }

    /// Tile under screen column `x`; columns past the pattern read as kerb.
    pub fn tile(&self, x: i32) -> u8 {
        if !(0..WIDTH).contains(&x) {
            return b'.';
        }
        let len = self.pattern.len() as i32;
        self.pattern[(x - self.offset).rem_euclid(len) as usize]
    }
}

fn tile_color(tile: u8, x: i32) -> Option<Rgb888> {
    let c = match tile {
        b'_' => Rgb888::new(128, 0, 128),
        b'r' | b'k' | b'm' => Rgb888::RED,
        b'b' => Rgb888::BLUE,
        b'c' => Rgb888::CYAN,
        b'y' => Rgb888::YELLOW,
        b'O' | b'W' | b'w' => Rgb888::WHITE,
        b'n' | b't' | b'+' => Rgb888::new(139, 69, 19),
        b'T' if x % 3 == 0 => Rgb888::new(0, 155, 255),
        b'T' | b'o' => Rgb888::new(255, 165, 0),
        b'g' | b'F' => Rgb888::GREEN,
        b'Q' => Rgb888::new(0, 155, 255),
        b's' => Rgb888::new(0, 155, 30),
        b'S' => Rgb888::new(128, 0, 128),
        b'p' => Rgb888::new(255, 92, 203),
        // Two-tone river.
        b'~' if x % 2 == 0 => Rgb888::new(0, 55, 245),
        b'~' => Rgb888::new(0, 13, 105),
        _ => return None,
    };
    Some(c)
}

// ── Frog ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Death {
    Run,
    Drowned,
}

impl Death {
    fn animation(self) -> Duration {
        match self {
            Death::Run => Duration::from_millis(1000),
            Death::Drowned => Duration::from_millis(800),
        }
    }
}

pub struct Frog {
    pub x: i32,
    pub y: i32,
    pub lives: u32,
    pub score: u32,
    pub level: u32,
    pub death: Option<(Death, Instant)>,
}

impl Frog {
    fn new() -> Self {
        Self {
            x: START.0,
            y: START.1,
            lives: LIVES,
            score: 0,
            level: 1,
            death: None,
        }
    }

    pub fn alive(&self) -> bool {
        self.death.is_none()
    }

    fn hop(&mut self, dx: i32, dy: i32) {
        if !self.alive() {
            return;
        }
        self.x = (self.x + dx).clamp(0, WIDTH - 2);
        self.y = (self.y + dy).clamp(0, HEIGHT - 2);
    }

    fn die(&mut self, how: Death, now: Instant) {
        if self.alive() {
            debug!("frog {:?} at ({}, {})", how, self.x, self.y);
            self.death = Some((how, now));
        }
    }

    fn respawn(&mut self) {
        (self.x, self.y) = START;
        self.death = None;
    }

    fn draw(&self, f: &mut Frame, now: Instant) {
        let (x, y) = (self.x, self.y);
        match self.death {
            None => {
                f.fill_rect(x, y, 2, 2, Rgb888::GREEN);
                f.put(x, y, Rgb888::YELLOW);
                f.put(x + 1, y, Rgb888::YELLOW);
            }
            Some((Death::Run, t)) => {
                let ms = now.saturating_duration_since(t).as_millis();
                if ms < 1000 {
                    let c = if (ms / 100) % 2 == 0 { Rgb888::RED } else { Rgb888::new(255, 165, 0) };
                    f.fill_rect(x, y, 2, 2, c);
                }
            }
            Some((Death::Drowned, t)) => {
                let ms = now.saturating_duration_since(t).as_millis();
                if ms >= 800 {
                    return;
                }
                // Expanding square rings around the frog.
                let rings = ((ms / 100) as i32 + 1).min(4);
                for i in 1..rings {
                    let (sx, sy, side) = (x + 1 - i, y + 1 - i, 2 * i);
                    if sx < 0 || sy < 0 || sx + side >= WIDTH || sy + side >= HEIGHT {
                        continue;
                    }
                    f.hline(sx, sx + side, sy, Rgb888::WHITE);
                    f.hline(sx, sx + side, sy + side - 1, Rgb888::WHITE);
                    f.vline(sx, sy, sy + side, Rgb888::WHITE);
                    f.vline(sx + side - 1, sy, sy + side, Rgb888::WHITE);
                }
            }
        }
    }
}

// ── Game ────────────────────────────────────────────────────────────────────

pub struct Crosser {
    lanes: [Lane; 32],
    filled: [bool; SLOTS],
    frog: Frog,
    frame_count: u32,
    clock: Instant,
    buttons: Cooldown,
    exit: ExitDetector,
    quit: bool,
    now: Instant,
}

impl Default for Crosser {
    fn default() -> Self {
        Self::new()
    }
}

impl Crosser {
    pub fn new() -> Self {
        Self {
            lanes: LAYOUT,
            filled: [false; SLOTS],
            frog: Frog::new(),
            frame_count: 0,
            clock: Instant::from_ticks(0),
            buttons: Cooldown::from_millis(200),
            exit: ExitDetector::new(),
            quit: false,
            now: Instant::from_ticks(0),
        }
    }

    pub fn frog(&self) -> &Frog {
        &self.frog
    }

    pub fn lane(&self, y: i32) -> Option<&Lane> {
        usize::try_from(y).ok().and_then(|i| self.lanes.get(i))
    }

    /// Tile under `(x, y)`, with claimed bridge slots shown as filled.
    pub fn tile(&self, x: i32, y: i32) -> u8 {
        let Some(lane) = self.lane(y) else {
            return b'.';
        };
        let t = lane.tile(x);
        match t {
            b'1'..=b'5' if self.filled[(t - b'1') as usize] => b'g',
            _ => t,
        }
    }

    fn reset_lanes(&mut self) {
        self.lanes = LAYOUT;
        self.filled = [false; SLOTS];
    }

    fn check_collisions(&mut self, now: Instant) {
        if !self.frog.alive() {
            return;
        }
        let (x, y) = (self.frog.x, self.frog.y);
        let Some(lane) = self.lane(y).copied() else {
            return;
        };
        let (a, b) = (self.tile(x, y), self.tile(x + 1, y));

        match lane.kind {
            LaneKind::Road => {
                let clear = |t: u8| t == b'.' || t == b' ';
                if !clear(a) || !clear(b) {
                    self.frog.die(Death::Run, now);
                }
            }
            LaneKind::Water => {
                let wet = |t: u8| t == b'~' || t == b' ';
                if wet(a) && wet(b) {
                    self.frog.die(Death::Drowned, now);
                    return;
                }
                if lane.moves_on(self.frame_count) {
                    self.frog.x += lane.speed.signum();
                    if self.frog.x < 0 || self.frog.x > WIDTH - 2 {
                        self.frog.die(Death::Drowned, now);
                    }
                }
            }
            LaneKind::Bridge => {
                if let b'1'..=b'5' = a {
                    self.filled[(a - b'1') as usize] = true;
                    self.frog.score += 1;
                    self.frog.respawn();
                    self.clock = now;
                    info!("slot {} filled, score {}", a - b'0', self.frog.score);
                    if self.frog.score % SLOTS as u32 == 0 {
                        self.frog.level += 1;
                        self.reset_lanes();
                        info!("crosser level {}", self.frog.level);
                    }
                }
            }
            LaneKind::Start | LaneKind::Verge => {}
        }
    }

    fn check_timer(&mut self, now: Instant) {
        if self.frog.alive() && now.saturating_duration_since(self.clock) > TIME_LIMIT {
            self.frog.die(Death::Drowned, now);
        }

        let Some((how, t)) = self.frog.death else {
            return;
        };
        if now.saturating_duration_since(t) < how.animation() {
            return;
        }
        self.frog.lives = self.frog.lives.saturating_sub(1);
        if self.frog.lives > 0 {
            self.frog.respawn();
        } else {
            info!("crosser run over, score {}", self.frog.score);
            self.frog = Frog::new();
            self.reset_lanes();
        }
        self.clock = now;
    }

    /// Whole seconds left on the level clock.
    pub fn seconds_left(&self) -> u64 {
        let spent = self.now.saturating_duration_since(self.clock).as_secs();
        TIME_LIMIT.as_secs().saturating_sub(spent)
    }
}

impl Game for Crosser {
    fn name(&self) -> &'static str {
        "FROG"
    }

    fn description(&self) -> &'static str {
        "Cross the road and the river"
    }

    fn init(&mut self, frame: &mut Frame, panel: &mut dyn Panel, now: Instant) {
        panel.set_brightness(BRIGHTNESS);
        self.reset_lanes();
        self.frog = Frog::new();
        self.frame_count = 0;
        self.clock = now;
        self.buttons.reset();
        self.exit.reset();
        self.quit = false;
        self.now = now;
        frame.blank();
    }

    fn handle_input(&mut self, input: ButtonOctet, now: Instant) {
        self.quit = self.exit.poll(input.d, now);
        if input.a && self.buttons.try_fire(now) {
            self.frog.hop(0, -2);
        }
        if input.b && self.buttons.try_fire(now) {
            self.frog.hop(0, 2);
        }
        if input.vol_up && self.buttons.try_fire(now) {
            self.frog.hop(1, 0);
        }
        if input.vol_down && self.buttons.try_fire(now) {
            self.frog.hop(-1, 0);
        }
    }

    fn update(&mut self, now: Instant) -> bool {
        if self.quit {
            return false;
        }
        self.now = now;
        self.frame_count = self.frame_count.wrapping_add(1);
        let frame = self.frame_count;
        self.lanes.iter_mut().for_each(|l| l.scroll(frame));
        self.check_collisions(now);
        self.check_timer(now);
        true
    }

    fn render(&mut self, frame: &mut Frame) {
        frame.blank();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                if let Some(c) = tile_color(self.tile(x, y), x) {
                    frame.put(x, y, c);
                }
            }
        }
        self.frog.draw(frame, self.now);

        for i in 0..self.frog.lives as i32 {
            frame.put(i * 3, 0, Rgb888::GREEN);
            frame.put(i * 3 + 1, 0, Rgb888::GREEN);
        }
        let bar = (self.seconds_left() / 2) as i32;
        frame.hline(0, bar.min(WIDTH), HEIGHT - 1, Rgb888::YELLOW);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::RecordingPanel;

    fn ms(t: u64) -> Instant {
        Instant::from_millis(t)
    }

    fn started() -> Crosser {
        let mut g = Crosser::new();
        g.init(&mut Frame::new(), &mut RecordingPanel::new(), ms(0));
        g
    }

    #[test]
    fn holding_d_leaves() {
        let mut g = started();
        let d = ButtonOctet { d: true, ..ButtonOctet::NONE };
        g.handle_input(d, ms(100));
        assert!(g.update(ms(100)));
        g.handle_input(d, ms(1100));
        assert!(!g.update(ms(1100)));
    }

    #[test]
    fn releasing_d_early_restarts_the_hold() {
        let mut g = started();
        let d = ButtonOctet { d: true, ..ButtonOctet::NONE };
        g.handle_input(d, ms(100));
        g.handle_input(ButtonOctet::NONE, ms(900));
        assert!(g.update(ms(900)));
        g.handle_input(d, ms(1000));
        g.handle_input(d, ms(1100));
        assert!(g.update(ms(1100)));
        g.handle_input(d, ms(2000));
        assert!(!g.update(ms(2000)));
    }

    #[test]
    fn lanes_scroll_on_their_own_cadence() {
        let mut g = started();
        let before = g.tile(3, 14);
        assert_eq!(before, b'r');
        for t in 1..8 {
            g.update(ms(t * 50));
        }
        assert_eq!(g.tile(3, 14), b'r');
        g.update(ms(400));
        assert_eq!(g.tile(4, 14), b'r');
        // Leftward lane.
        assert_eq!(g.lane(16).map(|l| l.speed), Some(-3));
    }

    #[test]
    fn car_runs_the_frog_over() {
        let mut g = started();
        g.frog.x = 2;
        g.frog.y = 14;
        g.check_collisions(ms(100));
        assert_eq!(g.frog.death.map(|d| d.0), Some(Death::Run));
    }

    #[test]
    fn open_water_drowns() {
        let mut g = started();
        g.frog.x = 0;
        g.frog.y = 4;
        g.check_collisions(ms(100));
        assert_eq!(g.frog.death.map(|d| d.0), Some(Death::Drowned));
    }

    #[test]
    fn logs_carry_the_frog() {
        let mut g = started();
        g.frog.x = 2;
        g.frog.y = 6;
        g.frame_count = 9;
        g.update(ms(50));
        assert!(g.frog.alive());
        assert_eq!(g.frog.x, 3);
    }

    #[test]
    fn bridge_slot_scores_once() {
        let mut g = started();
        g.frog.x = 2;
        g.frog.y = 2;
        g.check_collisions(ms(100));
        assert_eq!(g.frog.score, 1);
        assert_eq!((g.frog.x, g.frog.y), START);
        assert_eq!(g.tile(3, 2), b'g');

        g.frog.x = 2;
        g.frog.y = 2;
        g.check_collisions(ms(200));
        assert_eq!(g.frog.score, 1);
    }

    #[test]
    fn five_slots_level_up() {
        let mut g = started();
        for slot in 0..5 {
            g.frog.x = 2 + slot * 6;
            g.frog.y = 2;
            g.check_collisions(ms(100));
        }
        assert_eq!(g.frog.score, 5);
        assert_eq!(g.frog.level, 2);
        assert_eq!(g.tile(2, 2), b'1');
    }

    #[test]
    fn clock_runs_out() {
        let mut g = started();
        g.update(ms(60_000));
        assert!(g.frog.alive());
        g.update(ms(60_050));
        assert_eq!(g.frog.death.map(|d| d.0), Some(Death::Drowned));
        g.update(ms(60_900));
        assert!(g.frog.alive());
        assert_eq!(g.frog.lives, 2);
    }

    #[test]
    fn last_life_restarts_the_run() {
        let mut g = started();
        g.frog.lives = 1;
        g.frog.score = 3;
        g.frog.die(Death::Run, ms(0));
        g.update(ms(1000));
        assert_eq!(g.frog.lives, LIVES);
        assert_eq!(g.frog.score, 0);
        assert_eq!(g.frog.level, 1);
    }

    #[test]
    fn hops_are_debounced() {
        let mut g = started();
        let a = ButtonOctet { a: true, ..ButtonOctet::NONE };
        g.handle_input(a, ms(1000));
        g.handle_input(a, ms(1100));
        assert_eq!(g.frog.y, 28);
        g.handle_input(a, ms(1250));
        assert_eq!(g.frog.y, 26);
    }

    #[test]
    fn frog_stays_on_the_panel() {
        let mut g = started();
        for _ in 0..40 {
            g.frog.hop(1, 0);
        }
        assert_eq!(g.frog.x, WIDTH - 2);
        for _ in 0..40 {
            g.frog.hop(0, -2);
        }
        assert_eq!(g.frog.y, 0);
    }

    #[test]
    fn init_sets_brightness_and_hud() {
        let mut g = Crosser::new();
        let mut p = RecordingPanel::new();
        g.init(&mut Frame::new(), &mut p, ms(0));
        assert_eq!(p.brightness(), BRIGHTNESS);
        let mut f = Frame::new();
        g.render(&mut f);
        assert_eq!(f.get(0, 0), Rgb888::GREEN);
        assert_eq!(f.get(29, HEIGHT - 1), Rgb888::YELLOW);
        assert_eq!(f.get(30, HEIGHT - 1), Rgb888::BLACK);
    }
}
