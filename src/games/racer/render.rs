//! Drawing the road, back to front: sky, ridge, road surface, scenery,
//! traffic, rain and finally the tunnel overlay.

use embedded_graphics::pixelcolor::{
    Rgb888,
    RgbColor,
};
use libm::{
    powf,
    roundf,
    sinf,
};

use super::{
    road::Road,
    theme::Theme,
};
use crate::{
    color::{
        grey,
        lerp,
        scale,
    },
    config::{
        HEIGHT,
        WIDTH,
    },
    frame::Frame,
};

const HORIZON: i32 = HEIGHT / 2;
const RAIN: Rgb888 = Rgb888::new(100, 100, 255);

fn blend(frame: &mut Frame, x: i32, y: i32, c: Rgb888, alpha: f32) {
    let under = frame.get(x, y);
    frame.put(x, y, lerp(under, c, alpha));
}

/// Inclusive vertical run blended over what is already drawn.
fn blend_column(frame: &mut Frame, x: i32, y0: i32, y1: i32, c: Rgb888, alpha: f32) {
    for y in y0.max(0)..=y1.min(HEIGHT - 1) {
        blend(frame, x, y, c, alpha);
    }
}

/// Tunnel lighting: dark at the far end, full at the mouth. The desert wall
/// gets a warm tint on top.
fn tunnel_shade(c: Rgb888, p: f32, desert: bool) -> Rgb888 {
    let f = 0.2 + 0.8 * p;
    let base = scale(c, f);
    if !desert {
        return base;
    }
    let k = 0.1 - f;
    let ch = |v: u8, tint: f32| (v as f32 + tint * k).clamp(0.0, 255.0) as u8;
    Rgb888::new(ch(base.r(), 100.0), ch(base.g(), 100.0), ch(base.b(), 10.0))
}

impl Road {
    pub fn draw(&mut self, frame: &mut Frame) {
        frame.blank();
        self.draw_sky(frame);
        self.draw_ridge(frame);
        self.draw_surface(frame);

        for o in self.scenery.iter() {
            o.draw(frame, self.curve, self.hill, &mut self.rng);
        }
        for car in self.traffic.iter() {
            car.draw(frame, self.curve, self.hill);
        }

        if self.rain.falling() {
            for d in self.rain.drops.iter() {
                frame.put(d.x as i32, d.y as i32, RAIN);
            }
        }

        if self.tunnel.active() && self.tunnel.progress() > 0.0 {
            self.draw_tunnel(frame);
        }
    }

    fn draw_sky(&self, frame: &mut Frame) {
        let spec = &self.spec;
        let band = (HORIZON / spec.sky.len() as i32).max(1);
        for y in 0..HORIZON {
            let i = ((y / band) as usize).min(spec.sky.len() - 1);
            frame.hline(0, WIDTH, y, spec.sky[i]);
        }

        // The sun drifts against the long-range bend.
        let sun_x = (WIDTH / 3 - (roundf(-self.t_curve * 0.01) as i32 + WIDTH)).abs() % 48 - 8;
        let f = &spec.features;
        if f.sun {
            let desert = self.theme() == Theme::Desert;
            let lift = if desert { 6 } else { 0 };
            frame.circle(sun_x, HEIGHT / 3 - lift, 8 - spec.sun_size_mod, spec.sun[0]);
            if !desert {
                frame.circle(sun_x, HEIGHT / 2, 6 - spec.sun_size_mod, spec.sun[1]);
            }
            let stripe = spec.sky[spec.sky.len() - 1];
            for y in (HEIGHT / 4 - 3)..WIDTH / 2 {
                if y % 2 != 0 {
                    frame.hline(0, WIDTH, y, stripe);
                }
            }
        }
        if f.moon {
            frame.circle(sun_x, 5, 4, Rgb888::WHITE);
        }
        if f.stars {
            for i in 0..20 {
                let x = (i * 7 + 13) % WIDTH;
                let y = (i * 11 + 7) % (HEIGHT / 3);
                if (x + y) % 5 == 0 {
                    frame.put(x, y, Rgb888::WHITE);
                }
            }
        }
        if f.clouds {
            // A few puffs drifting with the road.
            let drift = (self.distance * 0.002) as i32;
            for i in 0..3 {
                let x = (i * 13 + drift).rem_euclid(WIDTH + 8) - 4;
                let y = 2 + (i * 3) % 5;
                frame.hline(x, x + 4, y, grey(235));
                frame.hline(x + 1, x + 3, y - 1, grey(250));
            }
        }
    }

    fn draw_ridge(&self, frame: &mut Frame) {
        let hills = &self.spec.hills;
        let m = &self.mountain;
        let top = m.top as i32;
        for x in 0..WIDTH {
            let y = m.ridge[x as usize] as i32;
            frame.vline(x, y, HEIGHT, hills[2]);
            let c = if y > top + 1 { hills[3] } else { hills[0] };
            frame.put(x, y, c);
            if y == top && y < 12 {
                frame.put(x, y + 1, hills[1]);
            }
        }
    }

    fn draw_surface(&self, frame: &mut Frame) {
        let spec = &self.spec;
        let flag = self.flag_progress();
        for y in HORIZON..HEIGHT {
            let p = (y - HORIZON) as f32 / HORIZON as f32;
            let far = 1.0 - p;
            let middle = 0.5 + (self.curve / 10.0) * powf(far, 3.0);
            let lift = (self.hill / 4.0) * powf(far, 2.0);
            let width = 0.1 + 0.8 * p;
            let left = (WIDTH as f32 * (middle - width / 2.0)) as i32;
            let right = (WIDTH as f32 * (middle + width / 2.0)) as i32;
            let row = (y + lift as i32).clamp(HORIZON, HEIGHT - 1);
            let b = 0.2 + 0.8 * p;

            let phase = 20.0 * powf(far, 3.0) + self.distance * 0.01 * (1.0 + self.speed * 0.02);
            let grass = spec.grass[if sinf(phase) > 0.0 { 0 } else { 1 }];
            frame.hline(0, left, row, scale(grass, b));
            frame.hline(right, WIDTH, row, scale(grass, b));
            frame.hline(left, right, row, grey((50.0 * b) as u8));

            if left > 0 && left < WIDTH {
                frame.put(left, row, scale(spec.edge[0], b));
            }
            if right > 0 && right < WIDTH {
                frame.put(right, row, scale(spec.edge[1], b));
            }

            if let Some(fp) = flag {
                // Rolls from the horizon down to the car.
                let flag_y = HORIZON as f32 + (HEIGHT - 1 - HORIZON) as f32 * fp;
                if (y as f32 - flag_y).abs() <= 1.0 {
                    let cell = ((4.0 * p) as i32).max(1);
                    for x in left..right {
                        let dark = (x.div_euclid(cell) + y / cell) % 2 == 0;
                        let c = if dark { Rgb888::BLACK } else { grey((255.0 * b) as u8) };
                        frame.put(x, row, c);
                    }
                }
            }

            let cx = (WIDTH as f32 * middle) as i32;
            if cx > left && cx < right {
                let lit = ((y as f32 + self.distance * 0.1) as i32 / 4) % 2 == 0;
                let v = if lit { 255.0 } else { 20.0 };
                frame.put(cx, row, grey((v * b) as u8));
            }
        }
    }

    /// Walls rise from the verge, the roof closes over the sky. Everything
    /// is blended in by the tunnel's fade.
    fn draw_tunnel(&self, frame: &mut Frame) {
        let spec = &self.spec;
        let desert = self.theme() == Theme::Desert;
        let alpha = self.tunnel.progress();
        let w = WIDTH as f32;

        for y in 0..HORIZON {
            let p = y as f32 / HORIZON as f32;
            let far = 1.0 - p;
            let middle = 0.5 + (self.curve / 10.0) * powf(far, 3.0);
            let lift = (self.hill / 4.0) * powf(far, 2.0);
            let width = (0.1 + 0.8 * p) * 0.6;
            let clip = (0.1 + 0.8 * p) * 0.3;

            let left_grass = ((middle - width - clip) * w) as i32;
            let left_clip = ((middle - width) * w) as i32;
            let right_clip = ((middle + width) * w) as i32;
            let right_grass = ((middle + width + clip) * w) as i32;

            let wall_phase = 20.0 * powf(far, 3.0) + self.distance * 0.01;
            let wall = spec.tunnel_wall[if sinf(wall_phase) > 0.0 { 0 } else { 1 }];
            let wall = tunnel_shade(wall, p, desert);
            let edge_phase = w * powf(far, 3.0) + self.distance * 0.1;
            let edge = spec.tunnel_edge[if sinf(edge_phase) > 0.0 { 0 } else { 1 }];
            let edge = tunnel_shade(edge, p, desert);

            let roof = HORIZON - y - lift as i32;
            let floor = HORIZON + y;
            if roof <= 0 || roof >= HEIGHT {
                continue;
            }

            for x in 0..WIDTH {
                blend(frame, x, roof, wall, alpha);
            }
            for e in 0..=(left_clip - left_grass).max(0) {
                for x in [left_clip - e, left_grass - e, right_clip + e, right_grass + e] {
                    blend_column(frame, x, roof - 1, floor, wall, alpha);
                }
            }

            let marker_phase = 100.0 * powf(far, 3.0) + self.distance * self.speed * 0.002;
            let marker = if sinf(marker_phase) > 0.8 {
                tunnel_shade(Rgb888::YELLOW, p, false)
            } else {
                edge
            };
            let m = (right_grass - left_grass) / 4;
            blend(frame, left_grass + m, roof, marker, alpha);
            blend(frame, left_grass + 3 * m, roof, marker, alpha);
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_time::Instant;

    use super::*;

    #[test]
    fn sky_and_road_fill_the_frame() {
        let mut road = Road::new(1);
        road.set_theme(Theme::Day, Instant::from_millis(0));
        road.update(40.0, Instant::from_millis(50));
        let mut f = Frame::new();
        road.draw(&mut f);
        // Sky band colour at the very top unless the sun covers it.
        let top = f.get(31, 0);
        assert_ne!(top, Rgb888::BLACK);
        // Road surface is grey at the bottom centre.
        let c = f.get(16, 31);
        assert!(c.r() == c.g() && c.g() == c.b());
    }

    #[test]
    fn chequered_flag_crosses_the_road() {
        let mut road = Road::new(1);
        road.set_theme(Theme::Day, Instant::from_millis(0));
        road.since_theme = 1499.0;
        let mut f = Frame::new();
        road.draw(&mut f);
        assert!((4..28).any(|x| f.get(x, 31) == Rgb888::BLACK));
        assert!((4..28).all(|x| f.get(x, 20) != Rgb888::BLACK));
    }

    #[test]
    fn tunnel_covers_the_sky() {
        let mut road = Road::new(1);
        road.set_theme(Theme::Day, Instant::from_millis(0));
        road.trigger_tunnel(Instant::from_millis(0));
        road.update(40.0, Instant::from_millis(4000));
        assert_eq!(road.tunnel.progress(), 1.0);
        let mut f = Frame::new();
        road.draw(&mut f);
        let sky = road.spec.sky[0];
        assert!((0..WIDTH).all(|x| f.get(x, HORIZON - 2) != sky));
    }

    #[test]
    fn desert_tint_stays_in_range() {
        let c = tunnel_shade(Rgb888::new(245, 191, 66), 0.0, true);
        assert!(c.r() <= 245);
        let d = tunnel_shade(Rgb888::WHITE, 1.0, false);
        assert_eq!(d, Rgb888::WHITE);
    }
}
