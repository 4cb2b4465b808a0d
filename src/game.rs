//! The lifecycle every title implements, plus the helpers they share.

use embassy_time::{
    Duration,
    Instant,
};

use crate::{
    config::EXIT_HOLD_MS,
    frame::Frame,
    input::ButtonOctet,
    panel::Panel,
};

/// A title the launcher can run.
///
/// Errors never cross this boundary: `update` and `render` are total, and a
/// title leaves by returning `false` from `update`. `init` must fully reset
/// the title so re-entering it after `cleanup` starts fresh.
pub trait Game {
    /// Menu label, at most eight glyphs.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn init(&mut self, frame: &mut Frame, panel: &mut dyn Panel, now: Instant);

    fn handle_input(&mut self, input: ButtonOctet, now: Instant);

    /// One world step. `false` asks the launcher to leave the title.
    fn update(&mut self, now: Instant) -> bool;

    fn render(&mut self, frame: &mut Frame);

    fn cleanup(&mut self) {}
}

/// Long-press D detector, one per title.
#[derive(Default)]
pub struct ExitDetector {
    pressed_since: Option<Instant>,
}

impl ExitDetector {
    pub const HOLD: Duration = Duration::from_millis(EXIT_HOLD_MS);

    pub const fn new() -> Self {
        Self { pressed_since: None }
    }

    /// Feed the current D level; `true` once it has been held for [`Self::HOLD`].
    pub fn poll(&mut self, d: bool, now: Instant) -> bool {
        match (d, self.pressed_since) {
            (false, _) => {
                self.pressed_since = None;
                false
            }
            (true, None) => {
                self.pressed_since = Some(now);
                false
            }
            (true, Some(t)) => now.saturating_duration_since(t) >= Self::HOLD,
        }
    }

    pub fn reset(&mut self) {
        self.pressed_since = None;
    }
}

/// Minimum spacing between two accepted actions.
pub struct Cooldown {
    period: Duration,
    last: Option<Instant>,
}

impl Cooldown {
    pub const fn from_millis(ms: u64) -> Self {
        Self {
            period: Duration::from_millis(ms),
            last: None,
        }
    }

    pub fn ready(&self, now: Instant) -> bool {
        self.last
            .is_none_or(|t| now.saturating_duration_since(t) >= self.period)
    }

    /// Accept the action if the period has elapsed, and restart the period.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        if self.ready(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Milliseconds between two instants, saturating at zero.
pub fn millis_between(earlier: Instant, later: Instant) -> u64 {
    later.saturating_duration_since(earlier).as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_needs_a_full_second() {
        let mut e = ExitDetector::new();
        let t0 = 10_000;
        assert!(!e.poll(true, Instant::from_millis(t0)));
        assert!(!e.poll(true, Instant::from_millis(t0 + 950)));
        assert!(e.poll(true, Instant::from_millis(t0 + 1000)));
    }

    #[test]
    fn release_restarts_the_hold() {
        let mut e = ExitDetector::new();
        e.poll(true, Instant::from_millis(0));
        e.poll(false, Instant::from_millis(900));
        assert!(!e.poll(true, Instant::from_millis(950)));
        assert!(!e.poll(true, Instant::from_millis(1900)));
        assert!(e.poll(true, Instant::from_millis(1950)));
    }

    #[test]
    fn detectors_are_independent() {
        let mut a = ExitDetector::new();
        let mut b = ExitDetector::new();
        a.poll(true, Instant::from_millis(0));
        assert!(!b.poll(true, Instant::from_millis(1500)));
        assert!(a.poll(true, Instant::from_millis(1500)));
    }

    #[test]
    fn cooldown_spacing() {
        let mut c = Cooldown::from_millis(200);
        assert!(c.try_fire(Instant::from_millis(5)));
        assert!(!c.try_fire(Instant::from_millis(100)));
        assert!(c.try_fire(Instant::from_millis(205)));
    }
}
