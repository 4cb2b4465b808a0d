//! Back to front: nebula, cavern, particles, enemies, swarms, shots,
//! power-ups, the ship and the HUD.

use embedded_graphics::pixelcolor::{
    Rgb888,
    RgbColor,
};
use libm::sinf;

use super::{
    SideScroller,
    actors::{
        EnemyKind,
        PowerUpKind,
    },
    swarm::SwarmKind,
    theme::Theme,
    weapons::Weapon,
};
use crate::{
    color::{
        hsv_deg,
        scale,
    },
    config::{
        HEIGHT,
        TRAIL_LEN,
        WIDTH,
    },
    frame::Frame,
};

const DEMO_BADGE: Rgb888 = Rgb888::new(100, 100, 255);

/// "GAME" over "OVER" in a 4-row pixel font.
static GAME_OVER_GLYPHS: [(i32, i32); 74] = [
    // G
    (4, 12), (4, 13), (4, 14), (4, 15), (5, 12), (5, 15), (6, 14), (6, 15),
    // A
    (8, 12), (8, 13), (8, 14), (8, 15), (9, 12), (9, 14), (10, 12), (10, 13), (10, 14), (10, 15),
    // M
    (12, 12), (12, 13), (12, 14), (12, 15), (13, 12), (14, 13), (15, 12), (15, 13), (15, 14), (15, 15),
    // E
    (17, 12), (17, 13), (17, 14), (17, 15), (18, 12), (18, 14), (18, 15), (19, 12), (19, 14), (19, 15),
    // O
    (6, 18), (6, 19), (6, 20), (6, 21), (7, 18), (7, 21), (8, 18), (8, 19), (8, 20), (8, 21),
    // V
    (10, 18), (10, 19), (11, 20), (12, 21), (13, 20), (14, 18), (14, 19),
    // E
    (16, 18), (16, 19), (16, 20), (16, 21), (17, 18), (17, 20), (17, 21), (18, 18), (18, 20), (18, 21),
    // R
    (20, 18), (20, 19), (20, 20), (20, 21), (21, 18), (21, 20), (22, 18), (22, 19), (22, 21),
];

impl SideScroller {
    fn millis(&self) -> u64 {
        self.now.as_millis()
    }

    pub(super) fn draw(&mut self, frame: &mut Frame) {
        frame.blank();
        self.draw_nebula(frame);
        self.draw_terrain(frame);
        self.draw_particles(frame);
        self.draw_enemies(frame);
        self.draw_swarm(frame);
        self.draw_bullets(frame);
        self.draw_powerups(frame);
        self.draw_player(frame);
        self.draw_hud(frame);

        if self.game_over() {
            let v = if (self.millis() / 300) % 2 == 1 { 255 } else { 150 };
            let c = Rgb888::new(v, v / 2, v / 2);
            for &(x, y) in GAME_OVER_GLYPHS.iter() {
                frame.put(x, y, c);
            }
        } else if self.demo {
            frame.put(0, 0, DEMO_BADGE);
            frame.put(1, 0, DEMO_BADGE);
            frame.put(0, 1, DEMO_BADGE);
        }
    }

    fn draw_nebula(&self, frame: &mut Frame) {
        let spec = self.theme.spec();
        let t = self.millis() as f32 * 0.0005;
        let scroll = self.terrain_offset * 50.0;
        let n = &self.perlin;
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let (fx, fy) = (x as f32, y as f32);
                let a = n.noise((fx + scroll * 0.1) * 0.05, fy * 0.05 + t * 0.3);
                let b = n.noise((fx + scroll * 0.05) * 0.08, fy * 0.08 - t * 0.2);
                let c = n.noise((fx + scroll * 0.02) * 0.12, fy * 0.12 + t * 0.1);
                let density = ((a * 0.5 + b * 0.3 + c * 0.2) * 0.4 + 0.1).clamp(0.0, 0.5);
                if density <= 0.05 {
                    continue;
                }
                let shift = n.noise(fx * 0.03, fy * 0.03 + t * 0.1);
                let tint = match shift {
                    s if s > 0.3 => spec.nebula[0],
                    s if s > -0.2 => spec.nebula[1],
                    _ => spec.nebula[2],
                };
                frame.put(x, y, scale(tint, density));
            }
        }
    }

    fn draw_terrain(&self, frame: &mut Frame) {
        let spec = self.theme.spec();
        for x in 0..WIDTH {
            let (floor, ceiling) = spec.walls(&self.perlin, x, self.terrain_offset);
            for y in HEIGHT - floor..HEIGHT {
                let depth = (y - (HEIGHT - floor)) as f32 / floor as f32;
                frame.put(x, y, scale(spec.floor, 0.6 + depth * 0.4));
            }
            for y in 0..ceiling {
                let depth = (ceiling - y) as f32 / ceiling as f32;
                frame.put(x, y, scale(spec.ceiling, 0.6 + depth * 0.4));
            }
        }
        for x in (0..WIDTH).step_by(4) {
            if let Some((floor, ceiling)) = spec.highlight(&self.perlin, x, self.terrain_offset) {
                if (0..HEIGHT - 1).contains(&floor) {
                    frame.put(x, floor, spec.highlight);
                }
                if (1..HEIGHT).contains(&ceiling) {
                    frame.put(x, ceiling, spec.highlight);
                }
            }
        }
    }

    fn draw_particles(&self, frame: &mut Frame) {
        for p in self.particles.iter().filter(|p| p.active) {
            frame.put(p.x as i32, p.y as i32, scale(p.color, p.fade()));
        }
    }

    fn draw_enemies(&self, frame: &mut Frame) {
        for e in self.enemies.iter().filter(|e| e.active) {
            let (x, y) = (e.x as i32, e.y as i32);
            if !(0..WIDTH).contains(&x) || !(0..HEIGHT).contains(&y) {
                continue;
            }
            match e.kind {
                EnemyKind::Basic => frame.put(x, y, Rgb888::new(255, 80, 80)),
                EnemyKind::Fast => {
                    frame.put(x, y, Rgb888::new(255, 80, 255));
                    frame.put(x - 1, y, Rgb888::new(180, 60, 180));
                }
                EnemyKind::Tank => {
                    let hull = Rgb888::new(230, 130, 60);
                    frame.put(x - 1, y, hull);
                    frame.put(x + 1, y, hull);
                    frame.put(x, y - 1, hull);
                    frame.put(x, y + 1, hull);
                    frame.put(x, y, Rgb888::new(255, 180, 80));
                }
                EnemyKind::Shooter => {
                    frame.put(x, y, Rgb888::new(255, 255, 80));
                    frame.put(x - 1, y, Rgb888::new(230, 230, 60));
                }
            }
        }
    }

    fn draw_swarm(&mut self, frame: &mut Frame) {
        for s in self.swarm.iter().filter(|s| s.active) {
            let (x, y) = (s.x as i32, s.y as i32);
            if !(-2..WIDTH + 2).contains(&x) || !(-2..HEIGHT + 2).contains(&y) {
                continue;
            }
            let wing = sinf(s.wing_phase);
            match s.kind {
                SwarmKind::Drone => {
                    let pulse = wing * 0.3 + 0.7;
                    frame.put(x, y, scale(Rgb888::new(120, 200, 255), pulse));
                    if wing > 0.0 {
                        let c = scale(Rgb888::new(60, 120, 180), pulse);
                        frame.put(x - 1, y, c);
                        frame.put(x + 1, y, c);
                    }
                }
                SwarmKind::Defensive => {
                    let pulse = sinf(s.wing_phase * 0.8) * 0.2 + 0.8;
                    let c = scale(Rgb888::new(80, 180, 80), pulse);
                    for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                        frame.put(x + dx, y + dy, c);
                    }
                    frame.put(x, y, scale(Rgb888::new(120, 255, 120), pulse));
                }
                SwarmKind::Aggressive => {
                    let pulse = sinf(s.wing_phase * 1.2) * 0.4 + 0.6;
                    frame.put(x, y, scale(Rgb888::new(255, 100, 100), pulse));
                    if wing > 0.0 {
                        let c = scale(Rgb888::new(200, 60, 60), pulse);
                        for (dx, dy) in [(-1, -1), (1, -1), (-1, 1), (1, 1)] {
                            frame.put(x + dx, y + dy, c);
                        }
                    } else {
                        let c = scale(Rgb888::new(180, 40, 40), pulse);
                        frame.put(x - 1, y, c);
                        frame.put(x + 1, y, c);
                    }
                }
            }
            if self.rng.one_in(6) {
                frame.put(x + 1, y, Rgb888::new(80, 80, 120));
            }
        }
    }

    fn draw_bullets(&self, frame: &mut Frame) {
        for b in self.bullets.iter().filter(|b| b.active) {
            let (head, tail) = b.weapon.colors();

            // Oldest first; the newest segment is the brightest.
            let len = b.trail.len();
            let mut prev: Option<(f32, f32)> = None;
            for (i, &(x, y)) in b.trail.oldest_ordered().enumerate() {
                if let Some((px, py)) = prev {
                    let age = len - 1 - i;
                    let k = (len - age) as f32 / len as f32 * 0.8;
                    frame.line(px as i32, py as i32, x as i32, y as i32, scale(tail, k));
                }
                prev = Some((x, y));
            }
            debug_assert!(len <= TRAIL_LEN);

            let (x, y) = (b.x as i32, b.y as i32);
            let core = if b.weapon == Weapon::Missile { Rgb888::new(255, 255, 200) } else { head };
            frame.put(x, y, core);
            if b.weapon != Weapon::Single {
                let glow = scale(head, 0.3);
                for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                    frame.put(x + dx, y + dy, glow);
                }
            }
            if b.weapon == Weapon::Quad {
                let glow = scale(head, 0.5);
                for (dx, dy) in [(-2, 0), (2, 0), (0, -2), (0, 2)] {
                    frame.put(x + dx, y + dy, glow);
                }
            }
        }

        for b in self.enemy_bullets.iter().filter(|b| b.active) {
            let (x, y) = (b.x as i32, b.y as i32);
            if !(0..WIDTH).contains(&x) || !(0..HEIGHT).contains(&y) {
                continue;
            }
            frame.put(x, y, Rgb888::new(255, 130, 130));
            frame.put(x + 1, y, Rgb888::new(200, 80, 80));
            frame.put(x + 2, y, Rgb888::new(150, 60, 60));
        }
    }

    fn draw_powerups(&self, frame: &mut Frame) {
        for p in self.powerups.iter().filter(|p| p.active) {
            let (x, y) = (p.x as i32, p.y as i32);
            let pulse = sinf(p.phase) * 0.5 + 0.5;
            let c = match p.kind {
                PowerUpKind::Weapon => hsv_deg(p.phase * 60.0, 1.0, pulse),
                PowerUpKind::Health => scale(Rgb888::new(255, 80, 80), pulse),
                PowerUpKind::Speed => scale(Rgb888::new(80, 80, 255), pulse),
            };
            frame.put(x, y, c);
            if ((p.phase * 10.0) as i32) % 3 == 0 {
                for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                    frame.put(x + dx, y + dy, Rgb888::WHITE);
                }
            }
        }
    }

    fn draw_player(&self, frame: &mut Frame) {
        let p = &self.player;
        if !p.alive {
            return;
        }
        // Blink while invulnerable.
        if p.invulnerable(self.now) && (self.millis() / 100) % 2 == 0 {
            return;
        }
        let (x, y) = (p.x as i32, p.y as i32);
        let hull = Rgb888::new(150, 200, 255);
        frame.put(x, y, hull);
        frame.put(x, y - 1, hull);
        frame.put(x, y + 1, hull);

        let tip = match p.weapon {
            Weapon::Single => Rgb888::new(255, 255, 200),
            Weapon::Triple => Rgb888::new(150, 255, 150),
            Weapon::Missile => Rgb888::new(255, 150, 150),
            Weapon::Quad => Rgb888::new(255, 150, 255),
        };
        frame.put(x + 1, y, tip);
        if p.weapon == Weapon::Quad {
            let cross = Rgb888::new(200, 100, 200);
            frame.put(x - 1, y, cross);
            frame.put(x, y - 1, cross);
            frame.put(x, y + 1, cross);
        }
    }

    fn draw_hud(&self, frame: &mut Frame) {
        let health = self.player.health.clamp(0, 100);
        let green = (255 * health / 100) as u8;
        for i in 0..health * 20 / 100 {
            frame.put(6 + i, 1, Rgb888::new(255 - green, green, 0));
        }

        let pips = (self.score / 100).min(8) as i32;
        for i in 0..pips {
            frame.put(28 + i % 4, 1 + i / 4, Rgb888::YELLOW);
        }

        let spec = self.theme.spec();
        for i in 0..=self.theme.index() as i32 {
            frame.put(2 + i, 30, scale(spec.highlight, 0.5));
        }

        if let Some(next) = self.theme.next() {
            let span = next.spec().threshold - spec.threshold;
            let progress = ((self.distance - spec.threshold) / span * 8.0) as i32;
            for i in 0..progress.clamp(0, 8) {
                frame.put(12 + i, 30, Rgb888::new(100, 100, 100));
            }
        }
    }
}
