//! Scene painters. Each takes the animation phases it needs and paints the
//! whole frame.

use core::f32::consts::TAU;

use embedded_graphics::pixelcolor::{
    Rgb888,
    RgbColor,
};
use libm::{
    cosf,
    sinf,
    sqrtf,
};

use super::{
    Ghost,
    flock::Boid,
};
use crate::{
    color::hsv_deg,
    config::{
        HEIGHT,
        WIDTH,
    },
    frame::Frame,
};

const BAT_SHADOW: Rgb888 = Rgb888::new(25, 5, 25);

/// Purple nebula with a few dim bats crossing it.
pub fn background(f: &mut Frame, phase: f32, bats: &[f32], millis: u64) {
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let (xf, yf) = (x as f32, y as f32);
            let n1 = sinf(xf * 0.1 + phase * 0.3) * cosf(yf * 0.15 + phase * 0.2);
            let n2 = sinf(xf * 0.08 - phase * 0.25) * cosf(yf * 0.12 - phase * 0.15);
            let n3 = sinf((xf + yf) * 0.06 + phase * 0.4) * 0.5;
            let nebula = ((n1 + n2 + n3) * 0.3 + 0.2).clamp(0.0, 0.6);
            let c = if nebula > 0.05 {
                let base = nebula * 100.0;
                let shift = sinf(xf * 0.2 + phase * 0.1) + cosf(yf * 0.15 - phase * 0.08);
                let ch = |k: f32| (base * k).clamp(0.0, 255.0) as u8;
                Rgb888::new(ch(0.8), ch(0.3 + shift * 0.2), ch(1.2 + shift * 0.3))
            } else {
                Rgb888::new(0, 0, 8)
            };
            f.put(x, y, c);
        }
    }
    flying_bats(f, bats, millis, BAT_SHADOW);
}

/// Five-pixel bat; `(x, y)` is the left wing tip at body height.
fn bat(f: &mut Frame, x: i32, y: i32, wings_up: bool, c: Rgb888) {
    f.put(x + 2, y, c);
    if wings_up {
        for dx in [0, 1, 3, 4] {
            f.put(x + dx, y - 1, c);
        }
    } else {
        f.put(x, y + 1, c);
        f.put(x + 1, y, c);
        f.put(x + 3, y, c);
        f.put(x + 4, y + 1, c);
    }
}

fn flying_bats(f: &mut Frame, bats: &[f32], millis: u64, c: Rgb888) {
    for (i, &pos) in bats.iter().enumerate() {
        let x = pos as i32;
        if !(-5..=37).contains(&x) {
            continue;
        }
        let bob = sinf(millis as f32 * 0.01 + i as f32) * 3.0;
        let y = 8 + i as i32 * 6 + bob as i32;
        let wings_up = (millis / 200 + i as u64) % 2 == 0;
        bat(f, x, y, wings_up, c);
    }
}

fn moon(f: &mut Frame, phase: f32) {
    const MX: i32 = 20;
    const MY: i32 = 8;
    const R: f32 = 6.0;

    let glow = 0.8 + 0.2 * sinf(phase * 1.2);
    for dy in -8..=8 {
        for dx in -8..=8 {
            let d = sqrtf((dx * dx + dy * dy) as f32);
            if d > R && d <= R + 2.5 {
                let v = ((R + 2.5 - d) / 2.5 * glow * 0.4 * 150.0) as u8;
                if v > 8 {
                    f.put(MX + dx, MY + dy, Rgb888::new(v, v, v.saturating_add(20)));
                }
            } else if d <= R {
                let surface = sinf(dx as f32 * 0.8 + phase * 0.3) * cosf(dy as f32 * 0.9 - phase * 0.2) * 0.1;
                let k = (0.85 + surface) * glow * (0.7 + (R - d) / R * 0.3);
                let (w, y) = (k * 240.0, k * 220.0);
                f.put(MX + dx, MY + dy, Rgb888::new(w as u8, y as u8, (y * 0.8) as u8));
            }
        }
    }
    let crater = Rgb888::new(160, 150, 120);
    for (dx, dy) in [(-2, -1), (-1, -1), (1, 2), (3, -2)] {
        f.put(MX + dx, MY + dy, crater);
    }
}

pub fn pumpkin(f: &mut Frame, phase: f32) {
    const CX: i32 = 16;
    const CY: i32 = 16;

    let glow = 0.8 + 0.4 * sinf(phase * 1.5);
    let sparkle = 0.6 + 0.3 * sinf(phase * 2.3);

    for y in -10..=10 {
        for x in -8..=8 {
            let d = sqrtf((x * x) as f32 + (y * y) as f32 * 0.8);
            if d > 6.5 && d <= 9.0 {
                let k = (9.0 - d) / 2.5 * glow * 0.3;
                let orange = (k * 150.0) as u8;
                if orange > 10 {
                    f.put(CX + x, CY + y, Rgb888::new(orange, (k * 80.0) as u8, 0));
                }
            } else if d <= 6.5 {
                let depth = (6.5 - d) / 6.5;
                let base = (180.0 + sinf(phase) * 75.0 * glow).clamp(0.0, 255.0);
                let body = base * (0.7 + depth * 0.3);
                let flicker = sinf(phase * 4.0 + x as f32 * 0.3 + y as f32 * 0.2) * 0.1 + 1.0;
                let r = (body * flicker).clamp(0.0, 255.0) as u8;
                f.put(CX + x, CY + y, Rgb888::new(r, (body * 0.6) as u8, 0));
            }
        }
    }

    let ridge = 140.0 + sinf(phase * 0.8) * 40.0;
    let ridge = Rgb888::new(ridge as u8, (ridge * 0.5) as u8, 0);
    for dx in [-3, 0, 3] {
        f.vline(CX + dx, CY - 6, CY + 7, ridge);
    }

    // Carved face.
    for (dx, dy) in [(-3, -2), (-2, -1), (-1, -1), (-2, 0), (3, -2), (2, -1), (1, -1), (2, 0)] {
        f.put(CX + dx, CY + dy, Rgb888::BLACK);
    }
    for x in -4..=4 {
        f.put(CX + x, CY + 3, Rgb888::BLACK);
        if x % 2 == 0 && x != 0 {
            f.put(CX + x, CY + 2, Rgb888::BLACK);
        }
        if x == -2 || x == 2 {
            f.put(CX + x, CY + 4, Rgb888::BLACK);
        }
    }
    f.put(CX - 1, CY + 2, Rgb888::BLACK);
    f.put(CX + 1, CY + 2, Rgb888::BLACK);

    let stem = Rgb888::new(0, (80.0 + sinf(phase * 0.5) * 30.0) as u8, 0);
    f.vline(CX, CY - 11, CY - 8, stem);
    f.put(CX - 1, CY - 10, stem);
    f.put(CX + 1, CY - 10, stem);

    let eyes = sinf(phase * 2.0) * 0.5 + 0.5;
    if eyes > 0.3 {
        let (r, g, b) = ((eyes * 255.0) as u8, (eyes * 200.0) as u8, (eyes * 100.0) as u8);
        f.put(CX - 2, CY - 1, Rgb888::new(r, g, b));
        f.put(CX + 2, CY - 1, Rgb888::new(r, g, b));
        let outer = Rgb888::new(r / 2, g / 2, 0);
        for (dx, dy) in [(-4, -1), (4, -1), (-3, -3), (3, -3), (-3, 0), (3, 0)] {
            f.put(CX + dx, CY + dy, outer);
        }
    }

    if sparkle > 0.7 {
        let v = sparkle * 150.0;
        for i in 0..6 {
            let a = phase * 0.5 + i as f32 * TAU / 6.0;
            let rx = 10.0 + sinf(phase * 3.0 + i as f32) * 2.0;
            let ry = 8.0 + cosf(phase * 2.5 + i as f32) * 2.0;
            f.put(CX + (cosf(a) * rx) as i32, CY + (sinf(a) * ry) as i32, Rgb888::new(v as u8, (v * 0.7) as u8, 0));
        }
    }
}

/// Black bats crossing a big moon.
pub fn bats_over_moon(f: &mut Frame, moon_phase: f32, bats: &[f32], millis: u64) {
    moon(f, moon_phase);
    flying_bats(f, bats, millis, Rgb888::BLACK);
}

pub fn bat_flock(f: &mut Frame, moon_phase: f32, boids: &[Boid]) {
    moon(f, moon_phase);
    let c = Rgb888::new(30, 10, 30);
    for b in boids {
        let (x, y) = (b.x as i32, b.y as i32);
        if !(0..WIDTH).contains(&x) || !(0..HEIGHT).contains(&y) {
            continue;
        }
        f.put(x, y, c);
        if b.wings_up() {
            f.hline(x - 1, x + 2, y - 1, c);
        } else {
            f.put(x - 1, y + 1, c);
            f.put(x + 1, y + 1, c);
        }
    }
}

pub fn witch_hat(f: &mut Frame, phase: f32) {
    const CX: i32 = 16;
    const CY: i32 = 20;

    let hat = Rgb888::new(50, 0, 50);
    f.fill_rect(CX - 8, CY, 17, 2, hat);
    for y in 0..15 {
        let w = (6 - y / 3).max(1);
        f.hline(CX - w, CX + w + 1, CY - y - 1, hat);
    }
    f.put(CX, CY - 16, hat);

    for i in 0..8 {
        let a = phase + i as f32 * TAU / 8.0;
        let rx = 8.0 + sinf(phase * 2.0) * 2.0;
        let ry = 8.0 + cosf(phase * 2.0) * 2.0;
        let c = hsv_deg(phase * 60.0 + i as f32 * 45.0, 1.0, 0.5 + sinf(phase * 3.0 + i as f32) * 0.5);
        f.put(CX + (cosf(a) * rx) as i32, CY - 8 + (sinf(a) * ry) as i32, c);
    }

    let moon = Rgb888::new(200, 200, 150);
    for y in -3..=3 {
        for x in -3..=3 {
            if x * x + y * y <= 9 {
                f.put(25 + x, 6 + y, moon);
            }
        }
    }
}

fn heat_color(h: f32) -> Option<Rgb888> {
    match h {
        h if h > 0.5 => Some(Rgb888::new(255, 255, 180)),
        h if h > 0.4 => Some(Rgb888::new(255, 200, 0)),
        h if h > 0.3 => Some(Rgb888::new(255, 100, 0)),
        h if h > 0.2 => Some(Rgb888::new(200, 50, 0)),
        h if h > 0.1 => Some(Rgb888::new(100, 20, 0)),
        _ => None,
    }
}

pub fn candle(f: &mut Frame, heat: &super::Heat, flicker_phase: f32) {
    const CX: i32 = 16;
    const BOTTOM: i32 = 28;

    f.fill_rect(CX - 2, BOTTOM - 8, 5, 9, Rgb888::new(200, 180, 120));
    f.vline(CX, BOTTOM - 10, BOTTOM - 8, Rgb888::new(60, 40, 20));

    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            if let Some(c) = heat_color(heat.get(x, y + super::HEAT_LIFT)) {
                f.put(x, y, c);
            }
        }
    }

    let drip = Rgb888::new(180, 160, 100);
    let d = sinf(flicker_phase * 0.3);
    if d > 0.5 {
        f.vline(CX - 2, BOTTOM + 1, BOTTOM + 3, drip);
    }
    if d < -0.3 {
        f.put(CX + 2, BOTTOM + 1, drip);
    }
}

pub fn ghosts(f: &mut Frame, ghosts: &[Ghost], phase: f32) {
    const SIZE: i32 = 8;

    for g in ghosts {
        let opacity = g.opacity * (0.7 + 0.3 * sinf(g.phase));
        let (gx, gy) = (g.x as i32, g.y as i32);
        for dy in -SIZE..=SIZE {
            for dx in -SIZE..=SIZE {
                let d = sqrtf((dx * dx + dy * dy) as f32);
                if d > SIZE as f32 {
                    continue;
                }
                let k = (1.0 - d / SIZE as f32) * opacity;
                if k > 0.1 {
                    let (w, b) = ((k * 200.0) as u8, (k * 150.0) as u8);
                    f.put(gx + dx, gy + dy, Rgb888::new(w, w, w.saturating_add(b / 2)));
                }
            }
        }

        for i in 1..=3 {
            let k = g.opacity * (0.3 - i as f32 * 0.1);
            if k > 0.0 {
                let v = (k * 100.0) as u8;
                let tx = (g.x - g.vx * i as f32 * 2.0) as i32;
                let ty = (g.y - g.vy * i as f32 * 2.0) as i32;
                f.put(tx, ty, Rgb888::new(v, v, v.saturating_add(20)));
            }
        }

        // Eyes glow and fade together.
        let glow = 0.5 + 0.5 * sinf(phase * 2.0 + g.phase);
        let eye = Rgb888::new((40.0 + glow * 200.0) as u8, (glow * 40.0) as u8, 0);
        f.put(gx - 2, gy - 1, eye);
        f.put(gx + 2, gy - 1, eye);
    }
}

/// Yellow frame shown while the pause blink is on.
pub fn pause_border(f: &mut Frame) {
    let c = Rgb888::YELLOW;
    f.hline(0, WIDTH, 0, c);
    f.hline(0, WIDTH, HEIGHT - 1, c);
    f.vline(0, 0, HEIGHT, c);
    f.vline(WIDTH - 1, 0, HEIGHT, c);
}
