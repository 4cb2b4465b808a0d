//! The 32×32 RGB888 frame every component draws into.
//!
//! `Frame` is an `embedded-graphics` draw target, so text and primitives work
//! as on the badge display, plus a handful of direct helpers the engines use
//! in their inner loops. Everything clips at the frame edge.

use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{
        Circle,
        Ellipse,
        Line,
        PrimitiveStyle,
    },
};

use crate::config::{
    HEIGHT,
    WIDTH,
};

const PIXELS: usize = (WIDTH * HEIGHT) as usize;

/// 3×5 digits, one row per byte, MSB on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

pub struct Frame {
    buf: [Rgb888; PIXELS],
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    pub const fn new() -> Self {
        Self {
            buf: [Rgb888::BLACK; PIXELS],
        }
    }

    #[inline]
    fn index(x: i32, y: i32) -> Option<usize> {
        if (0..WIDTH).contains(&x) && (0..HEIGHT).contains(&y) {
            Some((y * WIDTH + x) as usize)
        } else {
            None
        }
    }

    pub fn put(&mut self, x: i32, y: i32, color: Rgb888) {
        if let Some(i) = Self::index(x, y) {
            self.buf[i] = color;
        }
    }

    /// Colour at `(x, y)`, black outside the frame.
    pub fn get(&self, x: i32, y: i32) -> Rgb888 {
        Self::index(x, y).map_or(Rgb888::BLACK, |i| self.buf[i])
    }

    /// Saturating additive blend, used for glows.
    pub fn add(&mut self, x: i32, y: i32, color: Rgb888) {
        if let Some(i) = Self::index(x, y) {
            let c = self.buf[i];
            self.buf[i] = Rgb888::new(
                c.r().saturating_add(color.r()),
                c.g().saturating_add(color.g()),
                c.b().saturating_add(color.b()),
            );
        }
    }

    pub fn fill(&mut self, color: Rgb888) {
        self.buf.fill(color);
    }

    pub fn blank(&mut self) {
        self.fill(Rgb888::BLACK);
    }

    pub fn fill_rect(&mut self, x0: i32, y0: i32, w: i32, h: i32, color: Rgb888) {
        let x1 = x0.max(0);
        let y1 = y0.max(0);
        let x2 = (x0 + w).min(WIDTH);
        let y2 = (y0 + h).min(HEIGHT);
        for y in y1..y2 {
            let off = (y * WIDTH) as usize;
            for x in x1..x2 {
                self.buf[off + x as usize] = color;
            }
        }
    }

    /// Horizontal run `[x0, x1)` on row `y`.
    pub fn hline(&mut self, x0: i32, x1: i32, y: i32, color: Rgb888) {
        if !(0..HEIGHT).contains(&y) {
            return;
        }
        let xa = x0.max(0);
        let xb = x1.min(WIDTH);
        let off = (y * WIDTH) as usize;
        for x in xa..xb {
            self.buf[off + x as usize] = color;
        }
    }

    /// Vertical run `[y0, y1)` on column `x`.
    pub fn vline(&mut self, x: i32, y0: i32, y1: i32, color: Rgb888) {
        for y in y0.max(0)..y1.min(HEIGHT) {
            self.put(x, y, color);
        }
    }

    /// One pixel wide line, both ends inclusive.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb888) {
        let _ = Line::new(Point::new(x0, y0), Point::new(x1, y1))
            .into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(self);
    }

    /// Filled disc of radius `r` centred on `(cx, cy)`.
    pub fn circle(&mut self, cx: i32, cy: i32, r: i32, color: Rgb888) {
        if r < 0 {
            return;
        }
        let _ = Circle::with_center(Point::new(cx, cy), (2 * r + 1) as u32)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(self);
    }

    /// Filled ellipse with half-axes `rx` and `ry` centred on `(cx, cy)`.
    pub fn ellipse(&mut self, cx: i32, cy: i32, rx: i32, ry: i32, color: Rgb888) {
        if rx < 0 || ry < 0 {
            return;
        }
        let size = Size::new((2 * rx + 1) as u32, (2 * ry + 1) as u32);
        let _ = Ellipse::with_center(Point::new(cx, cy), size)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(self);
    }

    /// Decimal `value` in the 3×5 digit font, left-aligned at `(x, y)` with a
    /// 4 px pitch. Returns the x just past the last digit.
    pub fn number(&mut self, x: i32, y: i32, value: u32, color: Rgb888) -> i32 {
        let mut buf = [0u8; 10];
        let mut n = value;
        let mut len = 0;
        loop {
            buf[len] = (n % 10) as u8;
            len += 1;
            n /= 10;
            if n == 0 {
                break;
            }
        }
        let mut cx = x;
        for &d in buf[..len].iter().rev() {
            for (row, bits) in DIGITS[d as usize].iter().enumerate() {
                for col in 0..3 {
                    if bits & (0b100 >> col) != 0 {
                        self.put(cx + col, y + row as i32, color);
                    }
                }
            }
            cx += 4;
        }
        cx
    }

    /// Row-major pixel slice, 32 pixels per row.
    pub fn pixels(&self) -> &[Rgb888] {
        &self.buf
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb888] {
        &mut self.buf
    }

    pub fn is_blank(&self) -> bool {
        self.buf.iter().all(|&c| c == Rgb888::BLACK)
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for Frame {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            self.put(p.x, p.y, color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::primitives::Rectangle;

    use super::*;

    #[test]
    fn writes_outside_the_frame_are_clipped() {
        let mut f = Frame::new();
        f.put(-1, 0, Rgb888::RED);
        f.put(32, 31, Rgb888::RED);
        f.fill_rect(-5, -5, 3, 3, Rgb888::RED);
        f.hline(-10, 40, 40, Rgb888::RED);
        assert!(f.is_blank());
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut f = Frame::new();
        f.line(2, 3, 9, 5, Rgb888::WHITE);
        assert_eq!(f.get(2, 3), Rgb888::WHITE);
        assert_eq!(f.get(9, 5), Rgb888::WHITE);
        // Steep lines get one pixel per row.
        let mut f = Frame::new();
        f.line(4, 0, 6, 9, Rgb888::WHITE);
        for y in 0..=9 {
            assert_eq!((0..WIDTH).filter(|&x| f.get(x, y) == Rgb888::WHITE).count(), 1, "row {y}");
        }
    }

    #[test]
    fn circle_is_a_symmetric_disc() {
        let mut f = Frame::new();
        f.circle(10, 10, 3, Rgb888::RED);
        for (dx, dy) in [(0, 0), (3, 0), (-3, 0), (0, 3), (0, -3), (2, 2), (-2, -2)] {
            assert_eq!(f.get(10 + dx, 10 + dy), Rgb888::RED, "({dx}, {dy})");
        }
        assert_eq!(f.get(14, 10), Rgb888::BLACK);
        assert_eq!(f.get(13, 13), Rgb888::BLACK);
        let lit = f.pixels().iter().filter(|&&c| c == Rgb888::RED).count();
        // Between the inscribed and circumscribed squares of a 7 px disc.
        assert!((25..49).contains(&lit), "{lit}");
    }

    #[test]
    fn ellipse_is_wider_than_tall() {
        let mut f = Frame::new();
        f.ellipse(16, 16, 4, 1, Rgb888::GREEN);
        assert_eq!(f.get(12, 16), Rgb888::GREEN);
        assert_eq!(f.get(20, 16), Rgb888::GREEN);
        assert_eq!(f.get(16, 17), Rgb888::GREEN);
        assert_eq!(f.get(16, 18), Rgb888::BLACK);
        assert_eq!(f.get(21, 16), Rgb888::BLACK);
    }

    #[test]
    fn negative_radius_draws_nothing() {
        let mut f = Frame::new();
        f.circle(5, 5, -1, Rgb888::RED);
        f.ellipse(5, 5, 2, -1, Rgb888::RED);
        assert!(f.is_blank());
    }

    #[test]
    fn draw_target_accepts_primitives() {
        let mut f = Frame::new();
        Rectangle::new(Point::new(30, 30), Size::new(5, 5))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::GREEN))
            .draw(&mut f)
            .unwrap();
        assert_eq!(f.get(31, 31), Rgb888::GREEN);
        assert_eq!(f.get(29, 29), Rgb888::BLACK);
    }

    #[test]
    fn numbers_draw_most_significant_first() {
        let mut f = Frame::new();
        let end = f.number(0, 0, 17, Rgb888::WHITE);
        assert_eq!(end, 8);
        // "1" has its stem in the middle column, "7" a full top bar.
        assert_eq!(f.get(1, 4), Rgb888::WHITE);
        assert_eq!(f.get(0, 4), Rgb888::WHITE);
        assert_eq!(f.get(4, 4), Rgb888::BLACK);
        assert_eq!(f.get(6, 4), Rgb888::WHITE);
        assert_eq!(f.get(4, 0), Rgb888::WHITE);
    }

    #[test]
    fn additive_blend_saturates() {
        let mut f = Frame::new();
        f.put(1, 1, Rgb888::new(200, 10, 0));
        f.add(1, 1, Rgb888::new(100, 10, 5));
        assert_eq!(f.get(1, 1), Rgb888::new(255, 20, 5));
    }
}
