//! Territory claim.
//!
//! The player runs along the walls of a 30×30 field. Stepping off a wall
//! lays a trail; reaching any wall again turns the trail into wall and every
//! enclosed pocket without an enemy in it becomes claimed. Claim 75% of the
//! open field to clear the level.
//!
//! Controls: A left, B right, VolUp up, VolDown down. Movement repeats every
//! 200 ms while a direction is held.

pub mod enemy;

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

use self::enemy::{
    Enemy,
    Kind,
};
use crate::{
    color::grey,
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
    input::{
        ButtonOctet,
        Edges,
    },
    panel::Panel,
    rng::Rng,
};

// ── Rules ───────────────────────────────────────────────────────────────────

pub const FIELD: usize = 30;
const OFFSET: i32 = 1;
const INTERIOR: usize = (FIELD - 2) * (FIELD - 2);

const TIME_LIMIT: Duration = Duration::from_secs(120);
const GAME_OVER: Duration = Duration::from_secs(5);
const MOVE_REPEAT_MS: u64 = 200;
const MAX_LIVES: u32 = 5;
const MAX_ENEMIES: usize = 8;
const WIN_PERCENT: f32 = 75.0;
const WIN_BONUS: u32 = 5000;
const AREA_POINTS: u32 = 5;
const TRAIL_POINTS: u32 = 10;

const WALL: Rgb888 = Rgb888::new(30, 60, 120);
const CLAIMED: Rgb888 = Rgb888::new(0, 150, 255);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cell {
    Empty,
    Wall,
    Trail,
    Claimed,
}

/// Indexed `[y][x]`.
pub type Field = [[Cell; FIELD]; FIELD];

pub(crate) fn fresh_field() -> Field {
    let mut field = [[Cell::Empty; FIELD]; FIELD];
    for (y, row) in field.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            if x == 0 || y == 0 || x == FIELD - 1 || y == FIELD - 1 {
                *cell = Cell::Wall;
            }
        }
    }
    field
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Playing,
    /// Waiting for A to retry the level.
    TimeUp,
    /// Waiting for A to start the next level.
    LevelDone,
    GameOver { since: Instant },
}

struct Runner {
    x: i32,
    y: i32,
    trail_start: (i32, i32),
    drawing: bool,
    trail: Vec<(u8, u8), INTERIOR>,
}

impl Runner {
    fn new() -> Self {
        let start = (FIELD as i32 / 2, FIELD as i32 - 1);
        Self {
            x: start.0,
            y: start.1,
            trail_start: start,
            drawing: false,
            trail: Vec::new(),
        }
    }
}

// ── Game ────────────────────────────────────────────────────────────────────

pub struct Claimer {
    field: Field,
    runner: Runner,
    enemies: Vec<Enemy, MAX_ENEMIES>,
    score: u32,
    level: u32,
    lives: u32,
    claimed: f32,
    phase: Phase,
    level_started: Instant,
    held: ButtonOctet,
    mover: Cooldown,
    edges: Edges,
    exit: ExitDetector,
    quit: bool,
    rng: Rng,
    now: Instant,
}

impl Default for Claimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Claimer {
    pub fn new() -> Self {
        Self {
            field: fresh_field(),
            runner: Runner::new(),
            enemies: Vec::new(),
            score: 0,
            level: 0,
            lives: MAX_LIVES,
            claimed: 0.0,
            phase: Phase::Playing,
            level_started: Instant::from_ticks(0),
            held: ButtonOctet::NONE,
            mover: Cooldown::from_millis(MOVE_REPEAT_MS),
            edges: Edges::default(),
            exit: ExitDetector::new(),
            quit: false,
            rng: Rng::new(0x9157),
            now: Instant::from_ticks(0),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Share of the open field already claimed, in percent.
    pub fn claimed_percentage(&self) -> f32 {
        self.claimed
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        self.field.get(y)?.get(x).copied()
    }

    pub fn position(&self) -> (i32, i32) {
        (self.runner.x, self.runner.y)
    }

    fn new_game(&mut self, now: Instant) {
        self.level = 0;
        self.lives = MAX_LIVES;
        self.score = 0;
        self.start_level(now);
    }

    fn start_level(&mut self, now: Instant) {
        self.field = fresh_field();
        self.runner = Runner::new();
        self.claimed = 0.0;
        self.phase = Phase::Playing;
        self.level_started = now;

        self.enemies.clear();
        let count = (1 + self.level as usize / 3).min(MAX_ENEMIES);
        let speed = 1.5 + self.level as f32 * 0.2;
        let lo = (FIELD as f32 * 0.3) as i32;
        let span = (FIELD as f32 * 0.4) as i32;
        for _ in 0..count {
            let x = (lo + self.rng.range(0, span)) as f32;
            let y = (lo + self.rng.range(0, span)) as f32;
            let mut dx = self.rng.range(-50, 50) as f32 / 100.0;
            let dy = self.rng.range(-50, 50) as f32 / 100.0;
            if dx == 0.0 && dy == 0.0 {
                dx = 1.0;
            }
            let kind = Kind::ALL[self.rng.below(Kind::ALL.len() as u32) as usize];
            let e = Enemy::new(x, y, dx, dy, speed, kind, &mut self.rng);
            let _ = self.enemies.push(e);
        }
        info!("claimer level {}: {} enemies at speed {}", self.level, count, speed);
    }

    fn held_direction(&self) -> Option<(i32, i32)> {
        let b = self.held;
        if b.a {
            Some((-1, 0))
        } else if b.b {
            Some((1, 0))
        } else if b.vol_up {
            Some((0, -1))
        } else if b.vol_down {
            Some((0, 1))
        } else {
            None
        }
    }

    /// One step in direction `(dx, dy)`, laying or closing trail.
    fn walk(&mut self, dx: i32, dy: i32) {
        let (nx, ny) = (self.runner.x + dx, self.runner.y + dy);
        let Some(target) = self.cell(nx, ny) else {
            return;
        };
        if matches!(target, Cell::Trail | Cell::Claimed) {
            return;
        }
        let here = self.cell(self.runner.x, self.runner.y);

        if here == Some(Cell::Wall) && target == Cell::Empty {
            self.runner.drawing = true;
            self.runner.trail.clear();
            self.runner.trail_start = (self.runner.x, self.runner.y);
        }
        self.runner.x = nx;
        self.runner.y = ny;

        if self.runner.drawing {
            match target {
                Cell::Empty => {
                    self.field[ny as usize][nx as usize] = Cell::Trail;
                    let _ = self.runner.trail.push((nx as u8, ny as u8));
                }
                Cell::Wall => self.close_trail(),
                _ => {}
            }
        }
    }

    fn close_trail(&mut self) {
        self.runner.drawing = false;
        if self.runner.trail.is_empty() {
            return;
        }
        for &(x, y) in &self.runner.trail {
            self.field[y as usize][x as usize] = Cell::Wall;
        }
        let laid = self.runner.trail.len() as u32;
        self.runner.trail.clear();
        let area = self.claim_enclosed();
        self.score += laid * TRAIL_POINTS;
        debug!("trail of {} closed, {} cells claimed", laid, area);
    }

    /// Convert every open pocket with no enemy in it. Returns the number of
    /// cells claimed.
    fn claim_enclosed(&mut self) -> u32 {
        let mut visited = [[false; FIELD]; FIELD];
        let mut total = 0;
        for sy in 1..FIELD - 1 {
            for sx in 1..FIELD - 1 {
                if visited[sy][sx] || self.field[sy][sx] != Cell::Empty {
                    continue;
                }
                let mut pocket: Vec<(u8, u8), INTERIOR> = Vec::new();
                let mut stack: Vec<(u8, u8), INTERIOR> = Vec::new();
                let mut guarded = false;
                visited[sy][sx] = true;
                let _ = stack.push((sx as u8, sy as u8));

                while let Some((x, y)) = stack.pop() {
                    let _ = pocket.push((x, y));
                    let (xi, yi) = (x as i32, y as i32);
                    guarded |= self.enemies.iter().any(|e| e.near(xi, yi));
                    for (nx, ny) in [(xi - 1, yi), (xi + 1, yi), (xi, yi - 1), (xi, yi + 1)] {
                        if self.cell(nx, ny) != Some(Cell::Empty) {
                            continue;
                        }
                        let seen = &mut visited[ny as usize][nx as usize];
                        if !*seen {
                            *seen = true;
                            let _ = stack.push((nx as u8, ny as u8));
                        }
                    }
                }

                if !guarded {
                    for &(x, y) in &pocket {
                        self.field[y as usize][x as usize] = Cell::Claimed;
                    }
                    let n = pocket.len() as u32;
                    self.score += n * AREA_POINTS;
                    total += n;
                }
            }
        }
        self.recount();
        total
    }

    fn recount(&mut self) {
        let (mut open, mut claimed) = (0u32, 0u32);
        for row in &self.field[1..FIELD - 1] {
            for cell in &row[1..FIELD - 1] {
                match cell {
                    Cell::Empty => open += 1,
                    Cell::Claimed => claimed += 1,
                    _ => {}
                }
            }
        }
        let total = open + claimed;
        self.claimed = if total > 0 { claimed as f32 / total as f32 * 100.0 } else { 0.0 };
    }

    fn check_collisions(&mut self, now: Instant) {
        let r = &self.runner;
        let hit = self.enemies.iter().any(|e| {
            let (cx, cy) = e.cell();
            (r.drawing && e.near(r.x, r.y))
                || self.cell(cx, cy) == Some(Cell::Trail)
                || (r.drawing && r.trail.iter().any(|&(x, y)| e.near(x as i32, y as i32)))
        });
        if hit {
            self.lose_life(now);
        }
    }

    fn lose_life(&mut self, now: Instant) {
        self.lives = self.lives.saturating_sub(1);
        for &(x, y) in &self.runner.trail {
            self.field[y as usize][x as usize] = Cell::Empty;
        }
        self.runner.trail.clear();
        self.runner.drawing = false;
        (self.runner.x, self.runner.y) = self.runner.trail_start;

        if self.lives == 0 {
            info!("claimer game over, score {}", self.score);
            self.phase = Phase::GameOver { since: now };
        } else {
            debug!("claimer: caught, {} lives left", self.lives);
        }
    }

    fn move_enemies(&mut self) {
        for e in self.enemies.iter_mut() {
            e.update(&self.field, &mut self.rng);
        }
    }

    fn time_left(&self) -> Duration {
        TIME_LIMIT
            .checked_sub(self.now.saturating_duration_since(self.level_started))
            .unwrap_or(Duration::from_ticks(0))
    }

    // ── Drawing ─────────────────────────────────────────────────────────────

    fn draw_field(&self, f: &mut Frame) {
        for (y, row) in self.field.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let c = match cell {
                    Cell::Wall => WALL,
                    Cell::Trail => Rgb888::YELLOW,
                    Cell::Claimed => CLAIMED,
                    Cell::Empty => continue,
                };
                f.put(OFFSET + x as i32, OFFSET + y as i32, c);
            }
        }
    }

    fn draw_runner(&self, f: &mut Frame) {
        let (px, py) = (OFFSET + self.runner.x, OFFSET + self.runner.y);
        let inside = |v: i32| (OFFSET..OFFSET + FIELD as i32).contains(&v);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx, dy) != (0, 0) && inside(px + dx) && inside(py + dy) {
                    f.put(px + dx, py + dy, Rgb888::new(100, 0, 0));
                }
            }
        }
        f.put(px, py, Rgb888::RED);
    }

    fn draw_hud(&self, f: &mut Frame) {
        let bottom = HEIGHT - 1;
        if self.phase == Phase::Playing {
            let left = self.time_left().as_millis() as f32 / TIME_LIMIT.as_millis() as f32;
            let lit = (left * HEIGHT as f32) as i32;
            let bar = if left > 0.5 {
                Rgb888::GREEN
            } else if left > 0.25 {
                Rgb888::YELLOW
            } else {
                Rgb888::RED
            };
            for y in 0..HEIGHT {
                f.put(WIDTH - 1, y, if y >= HEIGHT - lit { bar } else { grey(20) });
            }

            let dots = (self.claimed / 100.0 * 25.0) as i32;
            for i in 0..25 {
                f.put(6 + i, bottom, if i < dots { Rgb888::GREEN } else { grey(50) });
            }
        }
        for i in 0..MAX_LIVES {
            let c = if i < self.lives { Rgb888::RED } else { Rgb888::new(50, 0, 0) };
            f.put(i as i32, bottom, c);
        }
    }

    fn draw_banner(&self, f: &mut Frame) {
        let (text, color) = match self.phase {
            Phase::Playing => return,
            Phase::TimeUp => ("TIME", Rgb888::YELLOW),
            Phase::LevelDone => ("DONE", Rgb888::GREEN),
            Phase::GameOver { since } => {
                f.fill_rect(2, 6, 28, 22, Rgb888::BLACK);
                let style = MonoTextStyle::new(&FONT_4X6, Rgb888::RED);
                let _ = Text::with_baseline("GAME", Point::new(8, 8), style, Baseline::Top).draw(f);
                let _ = Text::with_baseline("OVER", Point::new(8, 14), style, Baseline::Top).draw(f);
                let gone = self.now.saturating_duration_since(since).as_secs();
                let left = GAME_OVER.as_secs().saturating_sub(gone);
                f.number(14, 21, left as u32, Rgb888::WHITE);
                return;
            }
        };
        f.fill_rect(6, 1, 20, 8, Rgb888::BLACK);
        let style = MonoTextStyle::new(&FONT_4X6, color);
        let _ = Text::with_baseline(text, Point::new(8, 2), style, Baseline::Top).draw(f);
    }
}

impl Game for Claimer {
    fn name(&self) -> &'static str {
        "QIX"
    }

    fn description(&self) -> &'static str {
        "Claim 75% of the field"
    }

    fn init(&mut self, frame: &mut Frame, _panel: &mut dyn Panel, now: Instant) {
        self.rng = Rng::from_instant(now);
        self.held = ButtonOctet::NONE;
        self.mover.reset();
        self.edges = Edges::default();
        self.exit.reset();
        self.quit = false;
        self.now = now;
        self.new_game(now);
        frame.blank();
    }

    fn handle_input(&mut self, input: ButtonOctet, now: Instant) {
        self.quit = self.exit.poll(input.d, now);
        self.held = input;
        let pressed = self.edges.rising(input);
        if !pressed.a {
            return;
        }
        match self.phase {
            Phase::Playing => {}
            Phase::TimeUp => self.start_level(now),
            Phase::LevelDone => {
                self.level += 1;
                self.start_level(now);
            }
            Phase::GameOver { .. } => self.new_game(now),
        }
    }

    fn update(&mut self, now: Instant) -> bool {
        if self.quit {
            return false;
        }
        self.now = now;

        match self.phase {
            Phase::GameOver { since } => {
                if now.saturating_duration_since(since) >= GAME_OVER {
                    self.new_game(now);
                } else {
                    self.move_enemies();
                }
                return true;
            }
            Phase::TimeUp | Phase::LevelDone => {
                self.move_enemies();
                return true;
            }
            Phase::Playing => {}
        }

        if now.saturating_duration_since(self.level_started) >= TIME_LIMIT {
            self.lose_life(now);
            if self.lives > 0 {
                self.phase = Phase::TimeUp;
            }
            self.move_enemies();
            return true;
        }

        if let Some((dx, dy)) = self.held_direction()
            && self.mover.try_fire(now)
        {
            self.walk(dx, dy);
        }
        self.move_enemies();
        self.check_collisions(now);
        self.recount();
        if self.phase == Phase::Playing && self.claimed >= WIN_PERCENT {
            self.score += WIN_BONUS;
            self.phase = Phase::LevelDone;
            info!("claimer level {} cleared, score {}", self.level, self.score);
        }
        true
    }

    fn render(&mut self, frame: &mut Frame) {
        frame.blank();
        for e in &self.enemies {
            e.draw(frame, OFFSET, OFFSET);
        }
        self.draw_field(frame);
        if self.phase == Phase::Playing {
            self.draw_runner(frame);
        }
        self.draw_hud(frame);
        self.draw_banner(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        input::Button,
        panel::tests::RecordingPanel,
    };

    fn ms(t: u64) -> Instant {
        Instant::from_millis(t)
    }

    fn started() -> Claimer {
        let mut g = Claimer::new();
        g.init(&mut Frame::new(), &mut RecordingPanel::new(), ms(0));
        g
    }

    /// One enemy parked in the middle of the field.
    fn with_parked_enemy() -> Claimer {
        let mut g = started();
        g.enemies.clear();
        let mut rng = Rng::new(1);
        let _ = g.enemies.push(Enemy::new(15.0, 15.0, 1.0, 0.0, 0.0, Kind::Star, &mut rng));
        g
    }

    fn walk_path(g: &mut Claimer, path: &[(i32, i32)]) {
        for &(dx, dy) in path {
            g.walk(dx, dy);
        }
    }

    #[test]
    fn starts_on_the_bottom_wall() {
        let g = started();
        assert_eq!(g.position(), (15, 29));
        assert_eq!(g.cell(15, 29), Some(Cell::Wall));
        assert_eq!(g.lives(), MAX_LIVES);
        assert_eq!(g.enemies.len(), 1);
        assert_eq!(g.claimed_percentage(), 0.0);
    }

    #[test]
    fn closing_a_trail_claims_the_empty_pocket() {
        let mut g = with_parked_enemy();
        g.runner.x = 0;
        g.runner.y = 25;
        walk_path(&mut g, &[(1, 0), (1, 0), (1, 0), (0, 1), (0, 1), (0, 1)]);
        assert!(g.runner.drawing);
        assert_eq!(g.cell(3, 28), Some(Cell::Trail));
        g.walk(0, 1);

        assert!(!g.runner.drawing);
        assert_eq!(g.cell(3, 27), Some(Cell::Wall));
        for y in 26..29 {
            for x in 1..3 {
                assert_eq!(g.cell(x, y), Some(Cell::Claimed));
            }
        }
        assert_eq!(g.cell(5, 5), Some(Cell::Empty));
        assert_eq!(g.score(), 6 * AREA_POINTS + 6 * TRAIL_POINTS);
        let expected = 6.0 / (INTERIOR as f32 - 6.0) * 100.0;
        assert!((g.claimed_percentage() - expected).abs() < 1e-4);
    }

    #[test]
    fn pockets_holding_an_enemy_stay_open() {
        let mut g = with_parked_enemy();
        g.enemies[0].x = 1.5;
        g.enemies[0].y = 27.0;
        g.runner.x = 0;
        g.runner.y = 25;
        walk_path(&mut g, &[(1, 0), (1, 0), (1, 0), (0, 1), (0, 1), (0, 1), (0, 1)]);
        assert_eq!(g.cell(1, 27), Some(Cell::Empty));
        assert!(g.cell(20, 20) == Some(Cell::Claimed));
    }

    #[test]
    fn percentage_never_passes_one_hundred() {
        let mut g = started();
        g.enemies.clear();
        g.runner.x = 0;
        g.runner.y = 10;
        let across: [(i32, i32); 29] = [(1, 0); 29];
        walk_path(&mut g, &across);
        assert_eq!(g.claimed_percentage(), 100.0);

        g.update(ms(50));
        assert_eq!(g.phase(), Phase::LevelDone);
        assert!(g.score() >= WIN_BONUS);
        assert!(g.claimed_percentage() <= 100.0);
    }

    #[test]
    fn next_level_after_a() {
        let mut g = started();
        g.phase = Phase::LevelDone;
        g.level = 2;
        g.handle_input(ButtonOctet::only(Button::A), ms(100));
        assert_eq!(g.level(), 3);
        assert_eq!(g.phase(), Phase::Playing);
        assert_eq!(g.enemies.len(), 2);
        assert!((g.enemies[0].speed - 2.1).abs() < 1e-5);
        assert_eq!(g.claimed_percentage(), 0.0);
    }

    #[test]
    fn enemy_on_the_trail_costs_a_life() {
        let mut g = with_parked_enemy();
        g.runner.x = 15;
        g.runner.y = 29;
        // Up to the cell just below the enemy.
        for _ in 0..13 {
            g.walk(0, -1);
        }
        assert!(g.runner.drawing);
        g.check_collisions(ms(10));

        assert_eq!(g.lives(), MAX_LIVES - 1);
        assert_eq!(g.position(), (15, 29));
        assert!(!g.runner.drawing);
        assert_eq!(g.cell(15, 20), Some(Cell::Empty));
    }

    #[test]
    fn last_life_shows_game_over_then_restarts() {
        let mut g = started();
        g.lives = 1;
        g.score = 400;
        g.lose_life(ms(1000));
        assert_eq!(g.phase(), Phase::GameOver { since: ms(1000) });

        let mut f = Frame::new();
        g.render(&mut f);
        assert_eq!(f.get(0, HEIGHT - 1), Rgb888::new(50, 0, 0));

        g.update(ms(5900));
        assert!(matches!(g.phase(), Phase::GameOver { .. }));
        g.update(ms(6000));
        assert_eq!(g.phase(), Phase::Playing);
        assert_eq!(g.lives(), MAX_LIVES);
        assert_eq!(g.score(), 0);
    }

    #[test]
    fn clock_running_out_costs_a_life() {
        let mut g = started();
        g.update(ms(119_950));
        assert_eq!(g.phase(), Phase::Playing);
        g.update(ms(120_000));
        assert_eq!(g.phase(), Phase::TimeUp);
        assert_eq!(g.lives(), MAX_LIVES - 1);

        g.handle_input(ButtonOctet::only(Button::A), ms(120_100));
        assert_eq!(g.phase(), Phase::Playing);
        assert_eq!(g.level(), 0);
    }

    #[test]
    fn held_direction_repeats_every_200ms() {
        let mut g = started();
        let right = ButtonOctet::only(Button::B);
        g.enemies.clear();
        g.handle_input(right, ms(0));
        g.update(ms(0));
        assert_eq!(g.position(), (16, 29));
        g.handle_input(right, ms(100));
        g.update(ms(100));
        assert_eq!(g.position(), (16, 29));
        g.handle_input(right, ms(200));
        g.update(ms(200));
        assert_eq!(g.position(), (17, 29));
    }

    #[test]
    fn own_trail_blocks_the_way_back() {
        let mut g = with_parked_enemy();
        g.walk(0, -1);
        g.walk(0, -1);
        g.walk(0, 1);
        assert_eq!(g.position(), (15, 27));
    }

    #[test]
    fn timer_bar_starts_full() {
        let mut g = started();
        let mut f = Frame::new();
        g.render(&mut f);
        assert_eq!(f.get(WIDTH - 1, 0), Rgb888::GREEN);
        assert_eq!(f.get(0, HEIGHT - 1), Rgb888::RED);
        assert_eq!(f.get(6, HEIGHT - 1), grey(50));
    }

    #[test]
    fn holding_d_leaves() {
        let mut g = started();
        let d = ButtonOctet::only(Button::D);
        g.handle_input(d, ms(0));
        assert!(g.update(ms(0)));
        g.handle_input(d, ms(1000));
        assert!(!g.update(ms(1000)));
    }
}
