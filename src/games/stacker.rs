//! Falling-block stacker on a 10×20 well.
//!
//! Controls: A left, VolUp right, B rotate, VolDown soft drop, BrightDown
//! hard drop, BrightUp pause. Every move is edge-triggered.

use embassy_time::{
    Duration,
    Instant,
};
use embedded_graphics::{
    mono_font::{
        MonoTextStyle,
        ascii::FONT_4X6,
    },
    pixelcolor::Rgb888,
    prelude::*,
    text::{
        Baseline,
        Text,
    },
};
use heapless::Vec;
use libm::sinf;

use crate::{
    color::grey,
    config::{
        HEIGHT,
        WIDTH,
    },
    frame::Frame,
    game::{
        ExitDetector,
        Game,
    },
    input::{
        ButtonOctet,
        Edges,
    },
    panel::Panel,
    rng::Rng,
};

// ── Board ───────────────────────────────────────────────────────────────────

pub const BOARD_W: usize = 10;
pub const BOARD_H: usize = 20;
const OFFSET_X: i32 = 4;
const OFFSET_Y: i32 = 2;

const BRIGHTNESS: f32 = 0.5;
const LINE_SCORE: [u32; 5] = [0, 40, 100, 300, 1200];
const HARD_DROP_BONUS: u32 = 2;
/// Ticks the full rows flash before they collapse.
const CLEAR_FRAMES: u32 = 10;

const OUTER: Rgb888 = Rgb888::new(80, 120, 255);
const INNER: Rgb888 = Rgb888::new(160, 200, 255);

type Row = [Option<Shape>; BOARD_W];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shape {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl Shape {
    pub const ALL: [Shape; 7] = [Shape::I, Shape::O, Shape::T, Shape::S, Shape::Z, Shape::J, Shape::L];

    pub fn color(self) -> Rgb888 {
        match self {
            Shape::I => Rgb888::new(0, 255, 255),
            Shape::O => Rgb888::new(255, 255, 0),
            Shape::T => Rgb888::new(255, 0, 255),
            Shape::S => Rgb888::new(0, 255, 0),
            Shape::Z => Rgb888::new(255, 0, 0),
            Shape::J => Rgb888::new(0, 150, 255),
            Shape::L => Rgb888::new(255, 165, 0),
        }
    }

    /// Cells as `(col, row)` inside the rotation box.
    fn cells(self) -> [(i32, i32); 4] {
        match self {
            Shape::I => [(0, 1), (1, 1), (2, 1), (3, 1)],
            Shape::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
            Shape::T => [(1, 0), (0, 1), (1, 1), (2, 1)],
            Shape::S => [(1, 0), (2, 0), (0, 1), (1, 1)],
            Shape::Z => [(0, 0), (1, 0), (1, 1), (2, 1)],
            Shape::J => [(0, 0), (0, 1), (1, 1), (2, 1)],
            Shape::L => [(2, 0), (0, 1), (1, 1), (2, 1)],
        }
    }

    /// Side of the square the shape turns in.
    fn span(self) -> i32 {
        match self {
            Shape::I => 4,
            Shape::O => 2,
            _ => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    pub shape: Shape,
    cells: [(i32, i32); 4],
    pub x: i32,
    pub y: i32,
}

impl Piece {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            cells: shape.cells(),
            x: BOARD_W as i32 / 2 - 2,
            y: 0,
        }
    }

    fn shifted(mut self, dx: i32, dy: i32) -> Self {
        self.x += dx;
        self.y += dy;
        self
    }

    /// A quarter turn clockwise inside the shape's box, so every shape keeps
    /// all four cells however often it turns.
    fn rotated(mut self) -> Self {
        let n = self.shape.span();
        for c in &mut self.cells {
            *c = (n - 1 - c.1, c.0);
        }
        self
    }

    /// Board coordinates of the four cells.
    pub fn blocks(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells.iter().map(|&(c, r)| (self.x + c, self.y + r))
    }
}

struct Clearing {
    rows: Vec<usize, 4>,
    frames: u32,
}

// ── Game ────────────────────────────────────────────────────────────────────

pub struct Stacker {
    board: [Row; BOARD_H],
    current: Piece,
    next: Shape,
    clearing: Option<Clearing>,
    score: u32,
    lines: u32,
    level: u32,
    last_drop: Instant,
    paused: bool,
    game_over: bool,
    rng: Rng,
    edges: Edges,
    exit: ExitDetector,
    quit: bool,
    ticks: u32,
}

impl Default for Stacker {
    fn default() -> Self {
        Self::new()
    }
}

impl Stacker {
    pub fn new() -> Self {
        Self {
            board: [[None; BOARD_W]; BOARD_H],
            current: Piece::new(Shape::T),
            next: Shape::I,
            clearing: None,
            score: 0,
            lines: 0,
            level: 1,
            last_drop: Instant::from_ticks(0),
            paused: false,
            game_over: false,
            rng: Rng::new(0x5eed),
            edges: Edges::default(),
            exit: ExitDetector::new(),
            quit: false,
            ticks: 0,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_clearing(&self) -> bool {
        self.clearing.is_some()
    }

    pub fn current(&self) -> &Piece {
        &self.current
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Shape> {
        self.board.get(y).and_then(|row| row.get(x)).copied().flatten()
    }

    /// Milliseconds between gravity steps at the current level.
    pub fn drop_interval(&self) -> Duration {
        let ms = 500u32.saturating_sub(self.level * 30).max(50);
        Duration::from_millis(ms as u64)
    }

    fn restart(&mut self, now: Instant) {
        self.board = [[None; BOARD_W]; BOARD_H];
        self.clearing = None;
        self.score = 0;
        self.lines = 0;
        self.level = 1;
        self.paused = false;
        self.game_over = false;
        self.last_drop = now;
        self.next = self.random_shape();
        self.spawn();
    }

    fn random_shape(&mut self) -> Shape {
        Shape::ALL[self.rng.below(Shape::ALL.len() as u32) as usize]
    }

    fn spawn(&mut self) {
        self.current = Piece::new(self.next);
        self.next = self.random_shape();
        if !self.fits(&self.current) {
            self.game_over = true;
            info!("stacker game over: score {} lines {}", self.score, self.lines);
        }
    }

    fn fits(&self, piece: &Piece) -> bool {
        piece.blocks().all(|(x, y)| {
            (0..BOARD_W as i32).contains(&x)
                && y < BOARD_H as i32
                && (y < 0 || self.board[y as usize][x as usize].is_none())
        })
    }

    fn try_move(&mut self, candidate: Piece) -> bool {
        let ok = self.fits(&candidate);
        if ok {
            self.current = candidate;
        }
        ok
    }

    /// One row down, locking the piece when it lands.
    fn step_down(&mut self) {
        if !self.try_move(self.current.shifted(0, 1)) {
            self.lock();
        }
    }

    fn hard_drop(&mut self) {
        while self.try_move(self.current.shifted(0, 1)) {
            self.score += HARD_DROP_BONUS;
        }
        self.lock();
    }

    fn lock(&mut self) {
        let shape = self.current.shape;
        for (x, y) in self.current.blocks() {
            if y >= 0 {
                self.board[y as usize][x as usize] = Some(shape);
            }
        }

        let mut rows = Vec::new();
        for (y, row) in self.board.iter().enumerate().rev() {
            if row.iter().all(Option::is_some) {
                // A piece spans at most four rows.
                let _ = rows.push(y);
            }
        }
        if rows.is_empty() {
            self.spawn();
        } else {
            debug!("stacker clearing {} rows", rows.len());
            self.clearing = Some(Clearing { rows, frames: 0 });
        }
    }

    /// Drop the flashed rows, settle everything above and score.
    fn collapse(&mut self, rows: &[usize]) {
        let mut write = BOARD_H;
        for read in (0..BOARD_H).rev() {
            if rows.contains(&read) {
                continue;
            }
            write -= 1;
            self.board[write] = self.board[read];
        }
        for row in &mut self.board[..write] {
            *row = [None; BOARD_W];
        }

        let cleared = rows.len();
        self.lines += cleared as u32;
        self.level = self.lines / 10 + 1;
        self.score += LINE_SCORE[cleared] * self.level;
        info!(
            "stacker: {} lines, total {} level {} score {}",
            cleared, self.lines, self.level, self.score
        );
    }

    fn draw_background(&self, f: &mut Frame) {
        let t = self.ticks;
        for i in 0..20u32 {
            let x = ((i * 7 + t / 4) % 32) as i32;
            let y = ((i * 11 + t / 6) % 32) as i32;
            let b = (20.0 + sinf(t as f32 * 0.1 + i as f32) * 15.0) as u8;
            f.put(x, y, Rgb888::new(b, b, b + 10));
        }
        for y in 0..HEIGHT {
            let c = Rgb888::new(0, 0, (5 + y / 4) as u8);
            for x in [0, 1, 16, 17] {
                f.put(x, y, c);
            }
        }
    }

    fn draw_well(&self, f: &mut Frame) {
        let (w, h) = (BOARD_W as i32, BOARD_H as i32);
        f.hline(OFFSET_X - 2, OFFSET_X + w + 2, OFFSET_Y - 2, OUTER);
        f.hline(OFFSET_X - 2, OFFSET_X + w + 2, OFFSET_Y + h + 1, OUTER);
        f.vline(OFFSET_X - 2, OFFSET_Y - 1, OFFSET_Y + h + 1, OUTER);
        f.vline(OFFSET_X + w + 1, OFFSET_Y - 1, OFFSET_Y + h + 1, OUTER);

        f.hline(OFFSET_X - 1, OFFSET_X + w + 1, OFFSET_Y - 1, INNER);
        f.hline(OFFSET_X - 1, OFFSET_X + w + 1, OFFSET_Y + h, INNER);
        f.vline(OFFSET_X - 1, OFFSET_Y, OFFSET_Y + h, INNER);
        f.vline(OFFSET_X + w, OFFSET_Y, OFFSET_Y + h, INNER);

        let flash = self.clearing.as_ref().map(|c| {
            let v = sinf(c.frames as f32 * 0.8) * 127.0 + 128.0;
            (c.rows.clone(), grey(v as u8))
        });
        for (y, row) in self.board.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let Some(shape) = cell else {
                    continue;
                };
                let color = match &flash {
                    Some((rows, c)) if rows.contains(&y) => *c,
                    _ => shape.color(),
                };
                f.put(OFFSET_X + x as i32, OFFSET_Y + y as i32, color);
            }
        }

        if !self.game_over && !self.paused && self.clearing.is_none() {
            let c = self.current.shape.color();
            for (x, y) in self.current.blocks() {
                if (0..h).contains(&y) {
                    f.put(OFFSET_X + x, OFFSET_Y + y, c);
                }
            }
        }
    }

    fn draw_sidebar(&self, f: &mut Frame) {
        let frame = Rgb888::new(100, 100, 150);
        f.hline(18, 30, 0, frame);
        f.hline(18, 30, 6, frame);
        f.vline(18, 1, 6, frame);
        f.vline(29, 1, 6, frame);
        for x in [20, 22, 24, 26] {
            f.put(x, 1, Rgb888::new(200, 200, 255));
        }
        let preview = Piece::new(self.next);
        for &(c, r) in &preview.cells {
            f.put(21 + c, 2 + r, self.next.color());
        }

        let label = grey(150);
        f.put(17, 8, label);
        f.number(18, 8, self.score, Rgb888::new(255, 255, 0));
        f.put(17, 14, label);
        f.number(18, 14, self.level, Rgb888::new(0, 255, 100));
        f.number(18, 20, self.lines, Rgb888::new(255, 0, 200));
    }

    fn draw_game_over(&self, f: &mut Frame) {
        let t = self.ticks;
        let flash = Rgb888::new((sinf(t as f32 * 0.5) * 127.0 + 128.0) as u8, 0, 0);
        for i in 0..WIDTH {
            if (i as u32 + t / 4) % 4 == 0 {
                f.put(i, 0, flash);
                f.put(i, HEIGHT - 1, flash);
                f.put(0, i, flash);
                f.put(WIDTH - 1, i, flash);
            }
        }

        let style = MonoTextStyle::new(&FONT_4X6, Rgb888::RED);
        let _ = Text::with_baseline("GAME", Point::new(8, 8), style, Baseline::Top).draw(f);
        let _ = Text::with_baseline("OVER", Point::new(8, 16), style, Baseline::Top).draw(f);

        // "A" to restart.
        let y = Rgb888::YELLOW;
        f.put(15, 24, y);
        f.put(14, 25, y);
        f.put(16, 25, y);
        f.put(13, 26, y);
        f.put(17, 26, y);
    }

    fn draw_pause(&self, f: &mut Frame) {
        let v = (sinf(self.ticks as f32 * 0.2) * 100.0 + 155.0) as u8;
        let c = Rgb888::new(v, v, 0);
        for x in [12, 13, 15, 16] {
            f.vline(x, 8, 24, c);
        }
    }
}

impl Game for Stacker {
    fn name(&self) -> &'static str {
        "BLOCKS"
    }

    fn description(&self) -> &'static str {
        "Falling blocks"
    }

    fn init(&mut self, frame: &mut Frame, panel: &mut dyn Panel, now: Instant) {
        panel.set_brightness(BRIGHTNESS);
        self.rng = Rng::from_instant(now);
        self.edges = Edges::default();
        self.exit.reset();
        self.quit = false;
        self.ticks = 0;
        self.restart(now);
        frame.blank();
    }

    fn handle_input(&mut self, input: ButtonOctet, now: Instant) {
        self.quit = self.exit.poll(input.d, now);
        let pressed = self.edges.rising(input);

        if self.game_over {
            if pressed.a {
                self.restart(now);
            }
            return;
        }
        if self.paused {
            if pressed.bright_up {
                self.paused = false;
                self.last_drop = now;
            }
            return;
        }
        if self.clearing.is_some() {
            return;
        }

        if pressed.a {
            self.try_move(self.current.shifted(-1, 0));
        }
        if pressed.vol_up {
            self.try_move(self.current.shifted(1, 0));
        }
        if pressed.b && self.current.shape != Shape::O {
            self.try_move(self.current.rotated());
        }
        if pressed.vol_down {
            self.step_down();
        } else if pressed.bright_down {
            self.hard_drop();
        } else if pressed.bright_up {
            self.paused = true;
        }
    }

    fn update(&mut self, now: Instant) -> bool {
        if self.quit {
            return false;
        }
        self.ticks = self.ticks.wrapping_add(1);
        if self.game_over || self.paused {
            return true;
        }

        if let Some(clearing) = &mut self.clearing {
            clearing.frames += 1;
            if clearing.frames >= CLEAR_FRAMES {
                let rows = clearing.rows.clone();
                self.clearing = None;
                self.collapse(&rows);
                self.spawn();
                self.last_drop = now;
            }
            return true;
        }

        if now.saturating_duration_since(self.last_drop) >= self.drop_interval() {
            self.step_down();
            self.last_drop = now;
        }
        true
    }

    fn render(&mut self, frame: &mut Frame) {
        frame.blank();
        self.draw_background(frame);
        self.draw_well(frame);
        self.draw_sidebar(frame);
        if self.game_over {
            self.draw_game_over(frame);
        } else if self.paused {
            self.draw_pause(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::RecordingPanel;

    fn ms(t: u64) -> Instant {
        Instant::from_millis(t)
    }

    fn started() -> Stacker {
        let mut g = Stacker::new();
        g.init(&mut Frame::new(), &mut RecordingPanel::new(), ms(0));
        g
    }

    fn tap(g: &mut Stacker, b: ButtonOctet, t: u64) {
        g.handle_input(b, ms(t));
        g.handle_input(ButtonOctet::NONE, ms(t + 1));
    }

    fn no_overlap(g: &Stacker) -> bool {
        g.clearing.is_some()
            || g.game_over
            || g.current
                .blocks()
                .all(|(x, y)| y < 0 || g.cell(x as usize, y as usize).is_none())
    }

    #[test]
    fn every_shape_survives_four_turns() {
        for shape in Shape::ALL {
            let mut p = Piece::new(shape);
            for _ in 0..4 {
                p = p.rotated();
                let mut cells = p.cells;
                cells.sort();
                assert!(cells.windows(2).all(|w| w[0] != w[1]), "{:?}", shape);
                assert!(cells.iter().all(|&(c, r)| (0..shape.span()).contains(&c) && (0..shape.span()).contains(&r)));
            }
            let mut back = p.cells;
            let mut orig = shape.cells();
            back.sort();
            orig.sort();
            assert_eq!(back, orig);
        }
    }

    #[test]
    fn drop_interval_tracks_level() {
        let mut g = started();
        assert_eq!(g.drop_interval(), Duration::from_millis(470));
        g.level = 10;
        assert_eq!(g.drop_interval(), Duration::from_millis(200));
        g.level = 20;
        assert_eq!(g.drop_interval(), Duration::from_millis(50));
    }

    #[test]
    fn single_line_clear() {
        let mut g = started();
        for x in 0..BOARD_W {
            if x != 4 {
                g.board[19][x] = Some(Shape::Z);
            }
        }
        g.board[18][0] = Some(Shape::L);

        g.current = Piece::new(Shape::I).rotated();
        assert!(g.current.blocks().all(|(x, _)| x == 5));
        tap(&mut g, ButtonOctet::only(crate::input::Button::A), 10);
        assert!(g.current.blocks().all(|(x, _)| x == 4));

        tap(&mut g, ButtonOctet::only(crate::input::Button::BrightDown), 20);
        let bonus = g.score;
        assert_eq!(bonus, 16 * HARD_DROP_BONUS);
        assert!(g.is_clearing());
        assert_eq!(g.lines, 0);

        for t in 1..CLEAR_FRAMES {
            g.update(ms(20 + t as u64 * 50));
            assert!(g.is_clearing());
        }
        g.update(ms(20 + CLEAR_FRAMES as u64 * 50));
        assert!(!g.is_clearing());
        assert_eq!(g.lines, 1);
        assert_eq!(g.score, bonus + 40);

        // Everything above moved down one row.
        assert_eq!(g.cell(0, 19), Some(Shape::L));
        assert_eq!(g.cell(4, 19), Some(Shape::I));
        assert_eq!(g.cell(4, 18), Some(Shape::I));
        assert_eq!(g.cell(4, 17), Some(Shape::I));
        assert_eq!(g.cell(4, 16), None);
        assert_eq!(g.cell(1, 19), None);
    }

    #[test]
    fn separate_rows_collapse_together() {
        let mut g = started();
        g.board[19] = [Some(Shape::O); BOARD_W];
        g.board[18][3] = Some(Shape::T);
        g.board[17] = [Some(Shape::O); BOARD_W];
        g.board[16][7] = Some(Shape::J);
        g.collapse(&[19, 17]);
        assert_eq!(g.cell(3, 19), Some(Shape::T));
        assert_eq!(g.cell(7, 18), Some(Shape::J));
        assert!((0..18).all(|y| (0..BOARD_W).all(|x| g.cell(x, y).is_none())));
        assert_eq!(g.score, 100);
    }

    #[test]
    fn gravity_steps_on_the_interval() {
        let mut g = started();
        let y0 = g.current.y;
        g.update(ms(400));
        assert_eq!(g.current.y, y0);
        g.update(ms(470));
        assert_eq!(g.current.y, y0 + 1);
    }

    #[test]
    fn pause_freezes_gravity() {
        let mut g = started();
        tap(&mut g, ButtonOctet::only(crate::input::Button::BrightUp), 10);
        let y0 = g.current.y;
        g.update(ms(5000));
        assert_eq!(g.current.y, y0);
        tap(&mut g, ButtonOctet::only(crate::input::Button::BrightUp), 5010);
        g.update(ms(5100));
        assert_eq!(g.current.y, y0);
        g.update(ms(5500));
        assert_eq!(g.current.y, y0 + 1);
    }

    #[test]
    fn walls_stop_sideways_moves() {
        let mut g = started();
        g.current = Piece::new(Shape::O);
        for t in 0..10 {
            tap(&mut g, ButtonOctet::only(crate::input::Button::A), t * 10);
        }
        assert_eq!(g.current.blocks().map(|(x, _)| x).min(), Some(0));
    }

    #[test]
    fn pieces_never_overlap_the_stack() {
        use crate::input::Button;
        let mut g = started();
        let mut rng = Rng::new(77);
        let moves = [Button::A, Button::VolUp, Button::B, Button::VolDown, Button::BrightDown];
        for step in 0..3000u64 {
            let t = step * 50;
            let b = moves[rng.below(moves.len() as u32) as usize];
            g.handle_input(ButtonOctet::only(b), ms(t));
            g.handle_input(ButtonOctet::NONE, ms(t + 1));
            assert!(no_overlap(&g));
            g.update(ms(t + 2));
            assert!(no_overlap(&g));
            if g.is_game_over() {
                tap(&mut g, ButtonOctet::only(Button::A), t + 3);
            }
        }
    }

    #[test]
    fn topping_out_ends_the_game_and_a_restarts() {
        let mut g = started();
        for y in 0..2 {
            for x in 0..BOARD_W {
                if x != 9 {
                    g.board[y][x] = Some(Shape::S);
                }
            }
        }
        g.spawn();
        assert!(g.is_game_over());

        let mut f = Frame::new();
        g.render(&mut f);
        assert_eq!(f.get(15, 24), Rgb888::YELLOW);

        tap(&mut g, ButtonOctet::only(crate::input::Button::A), 100);
        assert!(!g.is_game_over());
        assert_eq!(g.score, 0);
        assert!(g.cell(0, 0).is_none());
    }

    #[test]
    fn init_sets_brightness() {
        let mut g = Stacker::new();
        let mut p = RecordingPanel::new();
        g.init(&mut Frame::new(), &mut p, ms(0));
        assert_eq!(p.brightness(), BRIGHTNESS);
    }

    #[test]
    fn holding_d_leaves() {
        let mut g = started();
        let d = ButtonOctet::only(crate::input::Button::D);
        g.handle_input(d, ms(0));
        assert!(g.update(ms(0)));
        g.handle_input(d, ms(1100));
        assert!(!g.update(ms(1100)));
    }
}
