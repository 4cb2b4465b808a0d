//! Global brightness keys, handled before any title sees the input.

use embassy_time::{
    Duration,
    Instant,
};

use crate::{
    config::{
        BRIGHTNESS_COOLDOWN_MS,
        BRIGHTNESS_STEP,
    },
    input::ButtonOctet,
    panel::Panel,
};

const COOLDOWN: Duration = Duration::from_millis(BRIGHTNESS_COOLDOWN_MS);

/// Edge-triggered ±step with a cooldown shared by both keys.
///
/// Key state is only tracked outside the cooldown window, so a key that is
/// released and pressed again inside the window is seen as still held.
#[derive(Default)]
pub struct BrightnessController {
    up_held: bool,
    down_held: bool,
    last_change: Option<Instant>,
}

impl BrightnessController {
    pub const fn new() -> Self {
        Self {
            up_held: false,
            down_held: false,
            last_change: None,
        }
    }

    /// Returns the applied delta, if any. At most one step per call.
    pub fn process(&mut self, input: &ButtonOctet, now: Instant, panel: &mut dyn Panel) -> Option<f32> {
        if let Some(t) = self.last_change
            && now.saturating_duration_since(t) < COOLDOWN
        {
            return None;
        }

        let mut delta = None;
        if input.bright_up && !self.up_held {
            self.up_held = true;
            delta = Some(BRIGHTNESS_STEP);
        } else if !input.bright_up {
            self.up_held = false;
        }

        if input.bright_down && !self.down_held {
            self.down_held = true;
            if delta.is_none() {
                delta = Some(-BRIGHTNESS_STEP);
            }
        } else if !input.bright_down {
            self.down_held = false;
        }

        if let Some(d) = delta {
            panel.adjust_brightness(d);
            self.last_change = Some(now);
            debug!("brightness {}", panel.brightness());
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::RecordingPanel;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn up() -> ButtonOctet {
        ButtonOctet { bright_up: true, ..ButtonOctet::NONE }
    }

    fn down() -> ButtonOctet {
        ButtonOctet { bright_down: true, ..ButtonOctet::NONE }
    }

    #[test]
    fn rising_edge_steps_once() {
        let mut c = BrightnessController::new();
        let mut p = RecordingPanel::new();
        assert_eq!(c.process(&up(), at(0), &mut p), Some(0.1));
        // Held: no repeat, even after the cooldown.
        assert_eq!(c.process(&up(), at(500), &mut p), None);
        assert!((p.brightness() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn cooldown_swallows_fast_edges() {
        let mut c = BrightnessController::new();
        let mut p = RecordingPanel::new();
        c.process(&down(), at(1000), &mut p);
        assert_eq!(c.process(&ButtonOctet::NONE, at(1050), &mut p), None);
        assert_eq!(c.process(&up(), at(1100), &mut p), None);
        assert_eq!(c.process(&up(), at(1200), &mut p), Some(0.1));
        assert_eq!(p.levels.len(), 2);
    }

    #[test]
    fn adjustments_are_spaced_by_the_cooldown() {
        let mut c = BrightnessController::new();
        let mut p = RecordingPanel::new();
        let mut last: Option<u64> = None;
        // Alternate both keys every tick for five seconds.
        for tick in 0..100u64 {
            let ms = tick * 50;
            let input = match tick % 4 {
                0 => up(),
                2 => down(),
                _ => ButtonOctet::NONE,
            };
            if c.process(&input, at(ms), &mut p).is_some() {
                if let Some(prev) = last {
                    assert!(ms - prev >= BRIGHTNESS_COOLDOWN_MS);
                }
                last = Some(ms);
            }
        }
        assert!(last.is_some());
    }

    #[test]
    fn both_keys_together_step_up_only() {
        let mut c = BrightnessController::new();
        let mut p = RecordingPanel::new();
        let both = ButtonOctet { bright_up: true, bright_down: true, ..ButtonOctet::NONE };
        assert_eq!(c.process(&both, at(0), &mut p), Some(0.1));
        assert_eq!(p.levels.len(), 1);
    }
}
