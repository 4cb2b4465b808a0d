//! Output side of the frame pipeline.

use crate::frame::Frame;

/// A 32×32 matrix the launcher pushes one frame to per tick.
///
/// Pushing is synchronous and infallible from the caller's point of view:
/// a backend that can fail logs and drops the frame.
pub trait Panel {
    fn push(&mut self, frame: &Frame);

    /// Current brightness in `[0, 1]`.
    fn brightness(&self) -> f32;

    /// Set brightness; implementations clamp to `[0, 1]`.
    fn set_brightness(&mut self, level: f32);

    fn adjust_brightness(&mut self, delta: f32) {
        let level = self.brightness() + delta;
        self.set_brightness(level);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use embedded_graphics::pixelcolor::Rgb888;

    use super::*;

    /// Keeps the last pushed frame and every brightness change.
    pub struct RecordingPanel {
        pub level: f32,
        pub pushes: usize,
        pub last: Frame,
        pub levels: heapless::Vec<f32, 64>,
    }

    impl RecordingPanel {
        pub fn new() -> Self {
            Self {
                level: 0.5,
                pushes: 0,
                last: Frame::new(),
                levels: heapless::Vec::new(),
            }
        }
    }

    impl Panel for RecordingPanel {
        fn push(&mut self, frame: &Frame) {
            self.pushes += 1;
            self.last.pixels_mut().copy_from_slice(frame.pixels());
        }

        fn brightness(&self) -> f32 {
            self.level
        }

        fn set_brightness(&mut self, level: f32) {
            self.level = level.clamp(0.0, 1.0);
            let _ = self.levels.push(self.level);
        }
    }

    #[test]
    fn adjust_is_clamped() {
        let mut p = RecordingPanel::new();
        p.adjust_brightness(0.7);
        assert_eq!(p.brightness(), 1.0);
        p.adjust_brightness(-3.0);
        assert_eq!(p.brightness(), 0.0);
    }

    #[test]
    fn push_keeps_a_copy() {
        let mut p = RecordingPanel::new();
        let mut f = Frame::new();
        f.put(3, 4, Rgb888::new(9, 8, 7));
        p.push(&f);
        assert_eq!(p.pushes, 1);
        assert_eq!(p.last.get(3, 4), Rgb888::new(9, 8, 7));
    }
}
