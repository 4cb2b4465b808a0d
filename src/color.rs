//! Colour helpers shared by all titles.

use embedded_graphics::pixelcolor::{
    Rgb888,
    RgbColor,
};
use palette::{
    FromColor,
    Hsv,
    Srgb,
};

/// HSV → RGB. `h` is in turns and wraps, `s` and `v` are clamped to `[0, 1]`.
pub fn hsv(h: f32, s: f32, v: f32) -> Rgb888 {
    let turns = h - libm::floorf(h);
    let hsv: Hsv = Hsv::new(turns * 360.0, s.clamp(0.0, 1.0), v.clamp(0.0, 1.0));
    let rgb: Srgb<u8> = Srgb::from_color(hsv).into_format();
    Rgb888::new(rgb.red, rgb.green, rgb.blue)
}

/// Same as [`hsv`] with the hue given in degrees.
pub fn hsv_deg(deg: f32, s: f32, v: f32) -> Rgb888 {
    hsv(deg / 360.0, s, v)
}

/// Multiply every channel by `k`; channels saturate at 255.
pub fn scale(c: Rgb888, k: f32) -> Rgb888 {
    let ch = |v: u8| (v as f32 * k).clamp(0.0, 255.0) as u8;
    Rgb888::new(ch(c.r()), ch(c.g()), ch(c.b()))
}

/// Linear blend from `a` (t = 0) to `b` (t = 1).
pub fn lerp(a: Rgb888, b: Rgb888, t: f32) -> Rgb888 {
    let t = t.clamp(0.0, 1.0);
    let ch = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t) as u8;
    Rgb888::new(ch(a.r(), b.r()), ch(a.g(), b.g()), ch(a.b(), b.b()))
}

/// Grey level `v` on all three channels.
pub const fn grey(v: u8) -> Rgb888 {
    Rgb888::new(v, v, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(hsv(0.0, 1.0, 1.0), Rgb888::new(255, 0, 0));
        assert_eq!(hsv(1.0 / 3.0, 1.0, 1.0), Rgb888::new(0, 255, 0));
        assert_eq!(hsv(2.0 / 3.0, 1.0, 1.0), Rgb888::new(0, 0, 255));
    }

    #[test]
    fn hue_wraps() {
        assert_eq!(hsv(1.0, 1.0, 1.0), hsv(0.0, 1.0, 1.0));
        assert_eq!(hsv(-0.5, 0.0, 1.0), Rgb888::WHITE);
    }

    #[test]
    fn scale_and_lerp() {
        assert_eq!(scale(Rgb888::new(200, 100, 10), 0.5), Rgb888::new(100, 50, 5));
        assert_eq!(scale(Rgb888::new(200, 100, 10), 2.0), Rgb888::new(255, 200, 20));
        assert_eq!(lerp(Rgb888::BLACK, Rgb888::new(100, 200, 50), 0.5), Rgb888::new(50, 100, 25));
    }
}
