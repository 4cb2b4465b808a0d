//! Top-level state machine: menu, running title, exit transition.
//!
//! One [`Launcher::tick`] is one frame: sample input once, apply the global
//! brightness keys, dispatch to the menu or the running title, render, push.

use embassy_time::{
    Duration,
    Instant,
};

use crate::{
    brightness::BrightnessController,
    config::{
        INITIAL_BRIGHTNESS,
        TICK,
    },
    frame::Frame,
    game::Game,
    input::InputProvider,
    menu::Menu,
    panel::Panel,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LauncherState {
    Menu,
    /// Running the menu entry at this index.
    Playing(usize),
    /// The title has been cleaned up; one black frame before the menu.
    Exiting,
}

pub struct Launcher<P: Panel> {
    state: LauncherState,
    menu: Menu,
    frame: Frame,
    panel: P,
    brightness: BrightnessController,
}

impl<P: Panel> Launcher<P> {
    pub fn new(menu: Menu, mut panel: P) -> Self {
        panel.set_brightness(INITIAL_BRIGHTNESS);
        Self {
            state: LauncherState::Menu,
            menu,
            frame: Frame::new(),
            panel,
            brightness: BrightnessController::new(),
        }
    }

    pub fn state(&self) -> LauncherState {
        self.state
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// The running title, present exactly while playing.
    pub fn current(&mut self) -> Option<&mut dyn Game> {
        match self.state {
            LauncherState::Playing(i) => self.menu.game_mut(i),
            _ => None,
        }
    }

    pub fn tick(&mut self, input: &mut impl InputProvider, now: Instant) {
        let buttons = input.sample();
        self.brightness.process(&buttons, now, &mut self.panel);

        match self.state {
            LauncherState::Menu => {
                if let Some(i) = self.menu.update(&buttons, now) {
                    let name = self.menu.entry(i).map_or("?", |e| e.name);
                    info!("starting {}", name);
                    if let Some(game) = self.menu.game_mut(i) {
                        game.init(&mut self.frame, &mut self.panel, now);
                        self.state = LauncherState::Playing(i);
                    }
                }
            }
            LauncherState::Playing(i) => {
                let keep = match self.menu.game_mut(i) {
                    Some(game) => {
                        game.handle_input(buttons, now);
                        game.update(now)
                    }
                    None => false,
                };
                if !keep {
                    if let Some(game) = self.menu.game_mut(i) {
                        info!("leaving {}", game.name());
                        game.cleanup();
                    }
                    self.state = LauncherState::Exiting;
                }
            }
            LauncherState::Exiting => {
                self.state = LauncherState::Menu;
            }
        }

        match self.state {
            LauncherState::Menu => self.menu.render(&mut self.frame),
            LauncherState::Playing(i) => {
                if let Some(game) = self.menu.game_mut(i) {
                    game.render(&mut self.frame);
                }
            }
            LauncherState::Exiting => self.frame.blank(),
        }

        self.panel.push(&self.frame);
    }
}

/// Fixed-rate tick gate for the main loop.
pub struct Pacer {
    period: Duration,
    last: Option<Instant>,
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(TICK)
    }
}

impl Pacer {
    pub const fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    /// `true` when a full period has passed since the last accepted tick.
    pub fn due(&mut self, now: Instant) -> bool {
        let ready = self
            .last
            .is_none_or(|t| now.saturating_duration_since(t) >= self.period);
        if ready {
            self.last = Some(now);
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::pixelcolor::Rgb888;

    use super::*;
    use crate::{
        input::ButtonOctet,
        menu::tests::dummy_menu,
        panel::tests::RecordingPanel,
    };

    struct Held(ButtonOctet);

    impl InputProvider for Held {
        fn sample(&mut self) -> ButtonOctet {
            self.0
        }
    }

    fn assert_invariant(l: &mut Launcher<RecordingPanel>) {
        let playing = matches!(l.state(), LauncherState::Playing(_));
        assert_eq!(l.current().is_some(), playing);
    }

    #[test]
    fn long_press_d_returns_to_menu() {
        let mut l = Launcher::new(dummy_menu(3), RecordingPanel::new());
        let mut t = 0u64;
        let mut input = Held(ButtonOctet { a: true, ..ButtonOctet::NONE });
        l.tick(&mut input, Instant::from_millis(t));
        assert_eq!(l.state(), LauncherState::Playing(0));
        assert_invariant(&mut l);

        input.0 = ButtonOctet { d: true, ..ButtonOctet::NONE };
        t += 50;
        let t0 = t;
        let mut exited_at = None;
        while t <= t0 + 1200 {
            l.tick(&mut input, Instant::from_millis(t));
            assert_invariant(&mut l);
            if l.state() == LauncherState::Exiting && exited_at.is_none() {
                exited_at = Some(t);
                assert!(l.panel().last.is_blank());
            }
            if exited_at.is_some() {
                break;
            }
            t += 50;
        }
        assert_eq!(exited_at, Some(t0 + 1000));

        input.0 = ButtonOctet::NONE;
        l.tick(&mut input, Instant::from_millis(t + 50));
        assert_eq!(l.state(), LauncherState::Menu);
        assert_invariant(&mut l);
    }

    #[test]
    fn playing_renders_the_title() {
        let mut l = Launcher::new(dummy_menu(2), RecordingPanel::new());
        let mut input = Held(ButtonOctet { a: true, ..ButtonOctet::NONE });
        l.tick(&mut input, Instant::from_millis(0));
        input.0 = ButtonOctet::NONE;
        l.tick(&mut input, Instant::from_millis(50));
        assert_eq!(l.panel().last.get(5, 5), Rgb888::new(0, 40, 0));
        assert_eq!(l.panel().pushes, 2);
    }

    #[test]
    fn brightness_is_global() {
        let mut l = Launcher::new(dummy_menu(2), RecordingPanel::new());
        let mut input = Held(ButtonOctet { bright_up: true, ..ButtonOctet::NONE });
        l.tick(&mut input, Instant::from_millis(0));
        assert!((l.panel().brightness() - (INITIAL_BRIGHTNESS + 0.1)).abs() < 1e-6);
        assert_eq!(l.state(), LauncherState::Menu);
    }

    #[test]
    fn pacer_gates_at_the_tick_rate() {
        let mut p = Pacer::default();
        assert!(p.due(Instant::from_millis(0)));
        assert!(!p.due(Instant::from_millis(10)));
        assert!(!p.due(Instant::from_millis(40)));
        assert!(p.due(Instant::from_millis(50)));
        assert!(!p.due(Instant::from_millis(90)));
        assert!(p.due(Instant::from_millis(105)));
    }
}
