//! Title catalogue and the scrolling picker drawn over the storm.

use alloc::{
    boxed::Box,
    vec::Vec,
};

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

use crate::{
    config::{
        HEIGHT,
        MENU_DEBOUNCE_MS,
        WIDTH,
    },
    frame::Frame,
    game::Game,
    games::{
        claimer::Claimer,
        crosser::Crosser,
        halloween::Halloween,
        racer::Racer,
        scroller::SideScroller,
        shader::ShaderGallery,
        stacker::Stacker,
    },
    input::ButtonOctet,
    scenes::storm::{
        StormScene,
        StormTitle,
    },
};

// ── Layout ──────────────────────────────────────────────────────────────────

const ROW_HEIGHT: i32 = 7;
const TOP: i32 = 2;
const VISIBLE: usize = ((HEIGHT - TOP) / ROW_HEIGHT) as usize;

const BAR: Rgb888 = Rgb888::new(60, 60, 20);
const TEXT: Rgb888 = Rgb888::new(100, 100, 255);
const SELECTED: Rgb888 = Rgb888::new(255, 255, 100);

const DEBOUNCE: Duration = Duration::from_millis(MENU_DEBOUNCE_MS);

pub struct GameEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub game: Box<dyn Game>,
}

impl GameEntry {
    /// Entry labelled with the title's own name and description.
    pub fn of(game: Box<dyn Game>) -> Self {
        Self {
            name: game.name(),
            description: game.description(),
            game,
        }
    }
}

pub struct Menu {
    entries: Vec<GameEntry>,
    selected: usize,
    scroll: usize,
    held: ButtonOctet,
    last_input: Option<Instant>,
    wallpaper: StormScene,
}

impl Menu {
    pub fn new(entries: Vec<GameEntry>) -> Self {
        Self {
            entries,
            selected: 0,
            scroll: 0,
            held: ButtonOctet::NONE,
            last_input: None,
            wallpaper: StormScene::new(0x5EED),
        }
    }

    /// Every title, in menu order.
    pub fn catalogue() -> Self {
        let games: [Box<dyn Game>; 8] = [
            Box::new(Halloween::new()),
            Box::new(SideScroller::new()),
            Box::new(Racer::new()),
            Box::new(Crosser::new()),
            Box::new(Claimer::new()),
            Box::new(Stacker::new()),
            Box::new(ShaderGallery::new()),
            Box::new(StormTitle::new()),
        ];
        Self::new(games.into_iter().map(GameEntry::of).collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn entry(&self, index: usize) -> Option<&GameEntry> {
        self.entries.get(index)
    }

    pub fn game_mut(&mut self, index: usize) -> Option<&mut dyn Game> {
        self.entries.get_mut(index).map(|e| -> &mut dyn Game { &mut *e.game })
    }

    /// Navigate with B/C, pick with A. Returns the index of the picked title.
    ///
    /// Inside the debounce window after an accepted press nothing is
    /// observed, including releases.
    pub fn update(&mut self, input: &ButtonOctet, now: Instant) -> Option<usize> {
        self.wallpaper.step(now);

        if self.entries.is_empty() {
            return None;
        }
        if let Some(t) = self.last_input
            && now.saturating_duration_since(t) < DEBOUNCE
        {
            return None;
        }

        let n = self.entries.len();
        if input.b && !self.held.b {
            self.held.b = true;
            self.selected = (self.selected + n - 1) % n;
            self.last_input = Some(now);
            debug!("menu -> {}", self.entries[self.selected].name);
        } else if !input.b {
            self.held.b = false;
        }

        if input.c && !self.held.c {
            self.held.c = true;
            self.selected = (self.selected + 1) % n;
            self.last_input = Some(now);
            debug!("menu -> {}", self.entries[self.selected].name);
        } else if !input.c {
            self.held.c = false;
        }

        if input.a && !self.held.a {
            self.held.a = true;
            self.last_input = Some(now);
            return Some(self.selected);
        } else if !input.a {
            self.held.a = false;
        }

        None
    }

    /// First visible row: moves only when the selection would leave the window.
    pub fn window_start(&mut self) -> usize {
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + VISIBLE {
            self.scroll = self.selected + 1 - VISIBLE;
        }
        self.scroll
    }

    pub fn render(&mut self, frame: &mut Frame) {
        self.wallpaper.render(frame);

        let start = self.window_start();
        let glyph = FONT_4X6.character_size.width as i32;
        for (row, (index, entry)) in self.entries.iter().enumerate().skip(start).take(VISIBLE).enumerate() {
            let y = TOP + row as i32 * ROW_HEIGHT;
            let color = if index == self.selected {
                frame.fill_rect(0, y, WIDTH, 6, BAR);
                SELECTED
            } else {
                TEXT
            };
            let x = (WIDTH - entry.name.len() as i32 * glyph) / 2;
            let style = MonoTextStyle::new(&FONT_4X6, color);
            let _ = Text::with_baseline(entry.name, Point::new(x, y), style, Baseline::Top).draw(frame);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::panel::Panel;

    /// Minimal title for launcher and menu tests.
    pub struct Dummy {
        pub label: &'static str,
        pub inits: u32,
        pub cleanups: u32,
        pub exit: crate::game::ExitDetector,
        pub quit: bool,
    }

    impl Dummy {
        pub fn new(label: &'static str) -> Self {
            Self {
                label,
                inits: 0,
                cleanups: 0,
                exit: crate::game::ExitDetector::new(),
                quit: false,
            }
        }
    }

    impl Game for Dummy {
        fn name(&self) -> &'static str {
            self.label
        }

        fn description(&self) -> &'static str {
            "test title"
        }

        fn init(&mut self, _frame: &mut Frame, _panel: &mut dyn Panel, _now: Instant) {
            self.inits += 1;
            self.exit.reset();
            self.quit = false;
        }

        fn handle_input(&mut self, input: ButtonOctet, now: Instant) {
            self.quit = self.exit.poll(input.d, now);
        }

        fn update(&mut self, _now: Instant) -> bool {
            !self.quit
        }

        fn render(&mut self, frame: &mut Frame) {
            frame.fill(Rgb888::new(0, 40, 0));
        }

        fn cleanup(&mut self) {
            self.cleanups += 1;
        }
    }

    pub fn dummy_menu(n: usize) -> Menu {
        const LABELS: [&str; 8] = ["ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT"];
        Menu::new(
            LABELS[..n]
                .iter()
                .map(|&l| GameEntry::of(Box::new(Dummy::new(l))))
                .collect(),
        )
    }

    fn press(m: &mut Menu, input: ButtonOctet, ms: u64) -> Option<usize> {
        let r = m.update(&input, Instant::from_millis(ms));
        m.update(&ButtonOctet::NONE, Instant::from_millis(ms + 250));
        r
    }

    const B: ButtonOctet = ButtonOctet { b: true, ..ButtonOctet::NONE };
    const C: ButtonOctet = ButtonOctet { c: true, ..ButtonOctet::NONE };
    const A: ButtonOctet = ButtonOctet { a: true, ..ButtonOctet::NONE };

    #[test]
    fn navigation_wraps_both_ways() {
        let mut m = dummy_menu(5);
        press(&mut m, B, 0);
        assert_eq!(m.selected(), 4);
        press(&mut m, C, 1000);
        press(&mut m, C, 2000);
        assert_eq!(m.selected(), 1);
        assert_eq!(press(&mut m, A, 3000), Some(1));
    }

    #[test]
    fn presses_inside_debounce_are_ignored() {
        let mut m = dummy_menu(5);
        m.update(&C, Instant::from_millis(0));
        m.update(&ButtonOctet::NONE, Instant::from_millis(50));
        m.update(&C, Instant::from_millis(100));
        assert_eq!(m.selected(), 1);
        // The release was never seen, so C is still considered held.
        m.update(&C, Instant::from_millis(300));
        assert_eq!(m.selected(), 1);
    }

    #[test]
    fn selection_stays_visible_without_jumping() {
        let mut m = dummy_menu(8);
        for i in 0..8u64 {
            let start = m.window_start();
            assert!((start..start + VISIBLE).contains(&m.selected()));
            press(&mut m, C, i * 1000);
        }
        // Wrapped back to the top.
        assert_eq!(m.selected(), 0);
        assert_eq!(m.window_start(), 0);
        // Walking down inside the window does not scroll.
        press(&mut m, C, 20_000);
        assert_eq!(m.window_start(), 0);
        // Walking up from the bottom keeps the window until the top edge.
        press(&mut m, B, 21_000);
        press(&mut m, B, 22_000);
        assert_eq!(m.selected(), 7);
        assert_eq!(m.window_start(), 4);
        press(&mut m, B, 23_000);
        assert_eq!(m.window_start(), 4);
    }

    #[test]
    fn catalogue_order() {
        let m = Menu::catalogue();
        let names: Vec<&str> = (0..m.len()).filter_map(|i| m.entry(i)).map(|e| e.name).collect();
        assert_eq!(names, ["SPOOK", "P-TYPE", "RACE", "FROG", "QIX", "BLOCKS", "PRETTY", "STORM"]);
    }

    #[test]
    fn selected_row_is_highlighted() {
        let mut m = dummy_menu(3);
        let mut f = Frame::new();
        m.render(&mut f);
        assert_eq!(f.get(0, TOP), BAR);
    }
}
