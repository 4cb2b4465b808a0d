//! Roadside objects and oncoming traffic.
//!
//! Both live in the road's own coordinates: `road_y` runs from the horizon
//! (0) to the player (16) and `track` is the lateral offset, scaled by
//! perspective when projected. All sprites are drawn parametrically and
//! grow with `0.2 + 0.8 * perspective`.

use embedded_graphics::pixelcolor::{
    Rgb888,
    RgbColor,
};
use libm::powf;

use crate::{
    color::grey,
    config::{
        HEIGHT,
        WIDTH,
    },
    frame::Frame,
    rng::Rng,
};

const HORIZON: f32 = (HEIGHT / 2) as f32;
/// Sprites this close to the horizon would be a single dot, so they stay
/// hidden until they are more than one row down the road. The road itself
/// is painted from the horizon row.
const POP_IN: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SceneryKind {
    Tree,
    Bush,
    StreetLight,
    Skyscraper,
    Building,
    OfficeTower,
    TunnelIntro,
    TunnelOutro,
    Cactus,
    PalmTree,
    WindTurbine,
    RadioTower,
    Billboard,
    Monument,
    WaterTower,
    Factory,
    ClockTower,
    Church,
    Barn,
    Windmill,
    Pyramid,
    Volcano,
}

/// Fired when an object rolls past the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Passed {
    Nothing,
    TunnelEntrance,
    TunnelExit,
}

/// Where a road-space point lands on screen, and how big it is drawn.
fn project(road_y: f32, track: f32, curve: f32, hill: f32) -> Option<(i32, i32, f32)> {
    if road_y >= HORIZON || road_y <= POP_IN {
        return None;
    }
    let p = (road_y / HORIZON).min(1.0);
    let middle = 0.5 + (curve / 10.0) * powf(1.0 - p, 3.0);
    let lift = (hill / 4.0) * powf(1.0 - p, 2.0);
    let x = (WIDTH as f32 * (middle + track * 0.7 * p)) as i32;
    let y = (HORIZON + road_y + lift) as i32;
    if x < -10 || x > WIDTH + 10 || y < 0 || y > HEIGHT {
        return None;
    }
    Some((x, y, 0.2 + 0.8 * p))
}

fn sized(base: f32, scale: f32, min: i32) -> i32 {
    ((base * scale) as i32).max(min)
}

// ── Scenery ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
pub struct SceneryObject {
    pub kind: SceneryKind,
    pub track: f32,
    pub road_y: f32,
    pub active: bool,
}

impl Default for SceneryObject {
    fn default() -> Self {
        Self {
            kind: SceneryKind::Tree,
            track: 0.0,
            road_y: 0.0,
            active: false,
        }
    }
}

impl SceneryObject {
    pub fn spawn(&mut self, kind: SceneryKind, track: f32, road_y: f32) {
        *self = Self {
            kind,
            track,
            road_y,
            active: true,
        };
    }

    pub fn update(&mut self, speed: f32, curve: f32) -> Passed {
        if !self.active {
            return Passed::Nothing;
        }
        self.road_y += speed * 0.008;
        self.track += curve * 0.002;
        if self.road_y < HORIZON {
            return Passed::Nothing;
        }
        self.active = false;
        match self.kind {
            SceneryKind::TunnelIntro => Passed::TunnelEntrance,
            SceneryKind::TunnelOutro => Passed::TunnelExit,
            _ => Passed::Nothing,
        }
    }

    pub fn draw(&self, frame: &mut Frame, curve: f32, hill: f32, rng: &mut Rng) {
        if !self.active {
            return;
        }
        let Some((x, y, s)) = project(self.road_y, self.track, curve, hill) else {
            return;
        };
        use SceneryKind::*;
        match self.kind {
            Tree => tree(frame, x, y, s),
            Bush => bush(frame, x, y, s),
            StreetLight => street_light(frame, x, y, s),
            Skyscraper => skyscraper(frame, x, y, s),
            Building => building(frame, x, y, s),
            OfficeTower => office_tower(frame, x, y, s, rng),
            Cactus => cactus(frame, x, y, s),
            PalmTree => palm_tree(frame, x, y, s),
            WindTurbine => wind_turbine(frame, x, y, s),
            RadioTower => radio_tower(frame, x, y, s),
            Billboard => billboard(frame, x, y, s),
            Monument => monument(frame, x, y, s),
            WaterTower => water_tower(frame, x, y, s),
            Factory => factory(frame, x, y, s, rng),
            ClockTower => clock_tower(frame, x, y, s),
            Church => church(frame, x, y, s),
            Barn => barn(frame, x, y, s),
            Windmill => windmill(frame, x, y, s),
            Pyramid => pyramid(frame, x, y, s),
            Volcano => volcano(frame, x, y, s, rng),
            // Drawn by the tunnel overlay.
            TunnelIntro | TunnelOutro => {}
        }
    }
}

const BROWN: Rgb888 = Rgb888::new(139, 69, 19);
const DOOR: Rgb888 = Rgb888::new(101, 67, 33);
const METAL: Rgb888 = grey(128);
const STONE: Rgb888 = grey(105);

fn tree(f: &mut Frame, x: i32, y: i32, s: f32) {
    let trunk = sized(4.0, s, 1);
    f.fill_rect(x, y - trunk, 1, trunk, BROWN);
    let r = sized(3.0, s, 1);
    f.circle(x, y - trunk - r, r, Rgb888::new(34, 139, 34));
}

fn bush(f: &mut Frame, x: i32, y: i32, s: f32) {
    let r = sized(2.0, s, 1);
    f.ellipse(x, y, r, r / 2, Rgb888::new(85, 107, 47));
}

fn street_light(f: &mut Frame, x: i32, y: i32, s: f32) {
    let pole = sized(6.0, s, 2);
    f.line(x, y, x, y - pole, grey(169));
    if s > 0.3 {
        let arm = sized(2.0, s, 1);
        // Lamps lean toward the road.
        let end = if x < WIDTH / 2 { x + arm } else { x - arm };
        f.line(x, y - pole, end, y - pole, Rgb888::new(255, 255, 224));
    }
}

fn windows(f: &mut Frame, left: i32, top: i32, w: i32, h: i32, first: i32, every: i32, c: Rgb888) {
    let mut floor = first;
    while floor < h {
        let mut col = 1;
        while col < w - 1 {
            f.put(left + col, top + floor, c);
            col += 2;
        }
        floor += every;
    }
}

fn skyscraper(f: &mut Frame, x: i32, y: i32, s: f32) {
    let w = sized(4.0, s, 2);
    let h = sized(20.0, s, 5);
    f.fill_rect(x - w / 2, y - h, w, h, Rgb888::new(80, 80, 90));
    if s > 0.3 {
        windows(f, x - w / 2, y - h, w, h - 2, 1, 3, Rgb888::new(120, 140, 160));
    }
    if s > 0.4 {
        f.line(x, y - h, x, y - h - (3.0 * s) as i32, Rgb888::new(60, 60, 70));
    }
}

fn building(f: &mut Frame, x: i32, y: i32, s: f32) {
    let w = sized(5.0, s, 2);
    let h = sized(12.0, s, 3);
    f.fill_rect(x - w / 2, y - h, w, h, Rgb888::new(100, 100, 110));
    if s > 0.2 {
        windows(f, x - w / 2, y - h, w, h - 1, 2, 3, Rgb888::new(140, 160, 180));
    }
}

fn office_tower(f: &mut Frame, x: i32, y: i32, s: f32, rng: &mut Rng) {
    let w = sized(6.0, s, 3);
    let h = sized(15.0, s, 4);
    f.fill_rect(x - w / 2, y - h, w, h, Rgb888::new(60, 60, 70));
    if s > 0.25 {
        let mut floor = 1;
        while floor < h - 1 {
            let mut col = 1;
            while col < w - 1 {
                if rng.one_in(3) {
                    f.put(x - w / 2 + col, y - h + floor, Rgb888::new(255, 255, 200));
                }
                col += 2;
            }
            floor += 2;
        }
    }
}

fn cactus(f: &mut Frame, x: i32, y: i32, s: f32) {
    let c = Rgb888::new(0, 128, 0);
    let h = sized(8.0, s, 3);
    let w = sized(2.0, s, 1);
    f.fill_rect(x - w / 2, y - h, w, h, c);
    if s > 0.4 {
        let arm = sized(3.0, s, 1);
        f.fill_rect(x - w - arm, y - h / 2, arm, 1, c);
        f.fill_rect(x - w - arm, y - h / 2 - arm, 1, arm, c);
        f.fill_rect(x + w, y - h / 2, arm, 1, c);
        f.fill_rect(x + w + arm - 1, y - h / 2 - arm, 1, arm, c);
    }
}

fn palm_tree(f: &mut Frame, x: i32, y: i32, s: f32) {
    let trunk = sized(10.0, s, 4);
    f.fill_rect(x, y - trunk, 1, trunk, BROWN);
    let leaves = Rgb888::new(34, 139, 34);
    let frond = sized(4.0, s, 2);
    let top = y - trunk;
    for i in -frond..=frond {
        f.put(x + i, top, leaves);
        f.put(x, top + i, leaves);
    }
    if s > 0.3 {
        for i in 1..=frond / 2 {
            f.put(x + i, top - i, leaves);
            f.put(x - i, top - i, leaves);
        }
    }
}

fn wind_turbine(f: &mut Frame, x: i32, y: i32, s: f32) {
    let c = grey(240);
    let h = sized(15.0, s, 6);
    let hub = y - h;
    f.line(x, y, x, hub, c);
    if s > 0.3 {
        let blade = sized(3.0, s, 2);
        f.line(x, hub, x - blade, hub - 1, c);
        f.line(x, hub, x + blade, hub - 1, c);
        f.line(x, hub, x, hub - blade, c);
    }
}

fn radio_tower(f: &mut Frame, x: i32, y: i32, s: f32) {
    let h = sized(20.0, s, 8);
    for i in 0..h {
        let w = (((h - i) as f32 * s * 0.3) as i32).max(1);
        if w > 1 {
            f.line(x - w / 2, y - i, x + w / 2, y - i, Rgb888::new(255, 0, 0));
        } else {
            f.put(x, y - i, Rgb888::new(255, 0, 0));
        }
    }
    if s > 0.4 {
        let step = (h / 4).max(1);
        let mut i = h / 4;
        while i < h {
            let w = (((h - i) as f32 * s * 0.2) as i32).max(1);
            f.line(x - w, y - i, x + w, y - i, METAL);
            i += step;
        }
    }
}

fn billboard(f: &mut Frame, x: i32, y: i32, s: f32) {
    let w = sized(8.0, s, 3);
    let h = sized(4.0, s, 2);
    let pole = sized(6.0, s, 3);
    f.line(x - w / 3, y, x - w / 3, y - pole, METAL);
    f.line(x + w / 3, y, x + w / 3, y - pole, METAL);
    f.fill_rect(x - w / 2, y - pole - h, w, h, Rgb888::WHITE);
    if s > 0.3 {
        f.fill_rect(x - w / 2 + 1, y - pole - h + 1, w - 2, 1, Rgb888::RED);
    }
}

fn monument(f: &mut Frame, x: i32, y: i32, s: f32) {
    let h = sized(12.0, s, 5);
    let base = sized(6.0, s, 3);
    f.fill_rect(x - base / 2, y - 2, base, 2, STONE);
    for i in 0..h {
        let taper = 1.0 - i as f32 / h as f32 * 0.5;
        let w = ((base as f32 * taper * 0.6) as i32).max(1);
        f.fill_rect(x - w / 2, y - 2 - i, w, 1, STONE);
    }
    if s > 0.4 {
        f.put(x, y - 2 - h, Rgb888::new(255, 215, 0));
    }
}

fn water_tower(f: &mut Frame, x: i32, y: i32, s: f32) {
    let w = sized(7.0, s, 3);
    let h = sized(4.0, s, 2);
    let legs = sized(8.0, s, 4);
    for lx in [x - w / 3, x + w / 3, x] {
        f.line(lx, y, lx, y - legs, METAL);
    }
    f.fill_rect(x - w / 2, y - legs - h, w, h, Rgb888::new(135, 206, 235));
    f.fill_rect(x - w / 2, y - legs - h, w, 1, METAL);
}

fn factory(f: &mut Frame, x: i32, y: i32, s: f32, rng: &mut Rng) {
    let w = sized(10.0, s, 4);
    let h = sized(8.0, s, 3);
    f.fill_rect(x - w / 2, y - h, w, h, Rgb888::new(70, 70, 80));
    let stack = sized(12.0, s, 4);
    let (s1, s2) = (x - w / 3, x + w / 4);
    f.fill_rect(s1, y - h - stack, 1, stack, grey(60));
    f.fill_rect(s2, y - h - stack, 1, stack, grey(60));
    if s > 0.4 {
        f.put(s1 - 1, y - h - stack - 1, grey(180));
        f.put(s2 + 1, y - h - stack - 1, grey(180));
    }
    if s > 0.3 {
        let mut i = 2;
        while i < h - 1 {
            let mut j = 2;
            while j < w - 1 {
                if rng.one_in(3) {
                    f.put(x - w / 2 + j, y - h + i, Rgb888::YELLOW);
                }
                j += 3;
            }
            i += 2;
        }
    }
}

fn clock_tower(f: &mut Frame, x: i32, y: i32, s: f32) {
    let w = sized(4.0, s, 2);
    let h = sized(18.0, s, 6);
    f.fill_rect(x - w / 2, y - h, w, h, BROWN);
    if s > 0.3 {
        let face = sized(2.0, s, 1);
        let cy = y - h / 2;
        f.fill_rect(x - face / 2, cy - face / 2, face, face, Rgb888::WHITE);
        f.put(x, cy, Rgb888::BLACK);
        f.put(x, cy - 1, Rgb888::BLACK);
        f.put(x + 1, cy, Rgb888::BLACK);
    }
    if s > 0.4 {
        let spire = sized(4.0, s, 2);
        for i in 0..spire {
            let sw = (spire - i).max(1);
            f.fill_rect(x - sw / 2, y - h - i, sw, 1, grey(50));
        }
    }
}

fn church(f: &mut Frame, x: i32, y: i32, s: f32) {
    let w = sized(7.0, s, 3);
    let h = sized(10.0, s, 4);
    f.fill_rect(x - w / 2, y - h, w, h, BROWN);
    let steeple = sized(8.0, s, 3);
    f.fill_rect(x - 1, y - h - steeple, 2, steeple, STONE);
    if s > 0.3 {
        let top = y - h - steeple;
        f.put(x, top - 1, Rgb888::WHITE);
        f.put(x, top - 2, Rgb888::WHITE);
        f.put(x - 1, top - 1, Rgb888::WHITE);
        f.put(x + 1, top - 1, Rgb888::WHITE);

        let glass = Rgb888::new(100, 100, 255);
        let mut i = 2;
        while i < h - 2 {
            f.put(x - 1, y - h + i, glass);
            f.put(x + 1, y - h + i, glass);
            i += 3;
        }
    }
}

fn barn(f: &mut Frame, x: i32, y: i32, s: f32) {
    let w = sized(9.0, s, 4);
    let h = sized(7.0, s, 3);
    f.fill_rect(x - w / 2, y - h, w, h, Rgb888::new(139, 0, 0));
    let roof = sized(3.0, s, 2);
    for i in 0..roof {
        let rw = w - i;
        f.fill_rect(x - rw / 2, y - h - i, rw, 1, STONE);
    }
    if s > 0.3 {
        f.fill_rect(x - 1, y - h / 2, 2, h / 2, DOOR);
    }
    if s > 0.4 {
        let silo = sized(8.0, s, 4);
        let sx = x + w / 2 + 1;
        f.fill_rect(sx, y - silo, 2, silo, grey(192));
        f.put(sx, y - silo - 1, STONE);
        f.put(sx + 1, y - silo - 1, STONE);
    }
}

fn windmill(f: &mut Frame, x: i32, y: i32, s: f32) {
    let w = sized(4.0, s, 2);
    let h = sized(10.0, s, 4);
    f.fill_rect(x - w / 2, y - h, w, h, Rgb888::new(245, 245, 220));
    let hub = y - h + h / 4;
    if s > 0.3 {
        let b = sized(6.0, s, 3);
        f.line(x - b, hub - b, x + b, hub + b, BROWN);
        f.line(x + b, hub - b, x - b, hub + b, BROWN);
    }
    f.put(x, hub, grey(50));
    if s > 0.3 {
        f.fill_rect(x - 1, y - h / 3, 1, h / 3, DOOR);
    }
}

fn pyramid(f: &mut Frame, x: i32, y: i32, s: f32) {
    let sand = Rgb888::new(238, 203, 173);
    let shadow = Rgb888::new(205, 170, 125);
    let w = sized(8.0, s, 3);
    let h = sized(6.0, s, 2);
    let row_width = |row: i32| w - row * 2 * w / h;
    for row in 0..h {
        let rw = row_width(row).max(1);
        let c = if row < h / 2 { sand } else { shadow };
        f.fill_rect(x - rw / 2, y - row, rw, 1, c);
    }
    if s > 0.4 {
        for i in 0..h {
            let ew = row_width(i);
            if ew > 0 {
                f.put(x - ew / 2, y - i, shadow);
            }
        }
    }
}

fn volcano(f: &mut Frame, x: i32, y: i32, s: f32, rng: &mut Rng) {
    let lava = Rgb888::new(255, 69, 0);
    let w = sized(10.0, s, 4);
    let h = sized(8.0, s, 3);
    for row in 0..h {
        let rw = (w - row * w / h).max(1);
        f.fill_rect(x - rw / 2, y - row, rw, 1, grey(64));
    }
    if s > 0.3 {
        let crater = (w / 3).max(1);
        f.fill_rect(x - crater / 2, y - h, crater, 1, lava);
    }
    if s > 0.5 {
        for sx in [x - w / 3, x + w / 3] {
            for j in 0..h / 2 {
                if rng.one_in(3) {
                    f.put(sx, y - h + j + 1, Rgb888::new(255, 140, 0));
                }
            }
        }
        if w >= 6 {
            f.put(x - 1, y - h, lava);
            f.put(x + 1, y - h, lava);
        }
    }
}

// ── Traffic ─────────────────────────────────────────────────────────────────

pub const TRAFFIC_COLORS: [Rgb888; 4] = [
    Rgb888::new(255, 255, 0),
    Rgb888::new(0, 255, 255),
    Rgb888::new(255, 0, 255),
    Rgb888::new(0, 255, 0),
];

pub const TRACK_LIMIT: f32 = 0.8;

#[derive(Clone, Copy, Default)]
pub struct TrafficCar {
    pub track: f32,
    pub road_y: f32,
    pub active: bool,
    pub color: usize,
}

impl TrafficCar {
    pub fn spawn(&mut self, track: f32, road_y: f32, color: usize) {
        *self = Self {
            track: track.clamp(-TRACK_LIMIT, TRACK_LIMIT),
            road_y,
            active: true,
            color: color % TRAFFIC_COLORS.len(),
        };
    }

    pub fn update(&mut self, speed: f32, curve: f32) {
        if !self.active {
            return;
        }
        self.road_y += speed * 0.008;
        self.track = (self.track + curve * 0.002).clamp(-TRACK_LIMIT, TRACK_LIMIT);
        if self.road_y >= HORIZON {
            self.active = false;
        }
    }

    pub fn bounce(&mut self, dir: f32) {
        self.track = (self.track + dir * 0.2).clamp(-TRACK_LIMIT, TRACK_LIMIT);
    }

    /// In the band just ahead of the player and overlapping their lane.
    pub fn hits_player(&self, player: f32) -> bool {
        self.active && (10.0..=18.0).contains(&self.road_y) && (self.track - player).abs() < 0.4
    }

    pub fn overlaps(&self, other: &TrafficCar) -> bool {
        self.active
            && other.active
            && (self.road_y - other.road_y).abs() < 2.0
            && (self.track - other.track).abs() < 0.3
    }

    pub fn draw(&self, f: &mut Frame, curve: f32, hill: f32) {
        if !self.active {
            return;
        }
        let Some((x, y, s)) = project(self.road_y, self.track, curve, hill) else {
            return;
        };
        let w = sized(8.0, s, 3);
        let h = sized(4.0, s, 2);
        let left = x - w / 2;
        let right = x + w / 2 - 1;
        f.fill_rect(left, y - h, w, h, TRAFFIC_COLORS[self.color]);
        if s > 0.3 {
            f.line(left, y - h, right, y - h, Rgb888::BLACK);
            f.put(left, y - 1, Rgb888::BLACK);
            f.put(right, y - 1, Rgb888::BLACK);
        }
        if s > 0.5 {
            f.put(left + 1, y - h, Rgb888::WHITE);
            f.put(right - 1, y - h, Rgb888::WHITE);
        }
        if w >= 4 {
            f.put(left + 1, y - 1, Rgb888::RED);
            f.put(right - 1, y - 1, Rgb888::RED);
        } else {
            f.put(x, y - 1, Rgb888::RED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_leave_at_the_player_row() {
        let mut o = SceneryObject::default();
        o.spawn(SceneryKind::Barn, 0.8, 0.5);
        let mut ticks = 0;
        while o.active {
            assert!(o.road_y < HORIZON);
            o.update(60.0, 1.0);
            ticks += 1;
        }
        assert!(o.road_y >= HORIZON);
        assert!(ticks > 1);
    }

    #[test]
    fn tunnel_markers_report_when_passed() {
        let mut o = SceneryObject::default();
        o.spawn(SceneryKind::TunnelIntro, 0.9, 15.9);
        assert_eq!(o.update(50.0, 0.0), Passed::TunnelEntrance);
        o.spawn(SceneryKind::TunnelOutro, 0.9, 15.9);
        assert_eq!(o.update(50.0, 0.0), Passed::TunnelExit);
        o.spawn(SceneryKind::Tree, 0.9, 15.9);
        assert_eq!(o.update(50.0, 0.0), Passed::Nothing);
        assert!(!o.active);
    }

    #[test]
    fn traffic_stays_on_the_road() {
        let mut c = TrafficCar::default();
        c.spawn(0.75, 0.2, 1);
        for _ in 0..200 {
            c.update(1.0, 2.0);
            assert!(c.track.abs() <= TRACK_LIMIT);
        }
        assert!(!c.active);
    }

    #[test]
    fn collision_band() {
        let mut c = TrafficCar::default();
        c.spawn(0.0, 15.0, 0);
        assert!(c.hits_player(0.0));
        assert!(c.hits_player(0.39));
        assert!(!c.hits_player(0.5));
        c.road_y = 5.0;
        assert!(!c.hits_player(0.0));
    }

    #[test]
    fn sprites_pop_in_below_the_horizon_row() {
        assert!(project(0.5, 0.0, 0.0, 0.0).is_none());
        assert!(project(POP_IN, 0.0, 0.0, 0.0).is_none());
        let (_, y, scale) = project(1.5, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(y, HORIZON as i32 + 1);
        assert!(scale < 0.3);
    }

    #[test]
    fn near_objects_are_drawn_bigger() {
        let mut rng = Rng::new(3);
        let mut near = Frame::new();
        let mut far = Frame::new();
        let mut o = SceneryObject::default();
        o.spawn(SceneryKind::Skyscraper, 0.5, 14.0);
        o.draw(&mut near, 0.0, 0.0, &mut rng);
        o.road_y = 3.0;
        o.draw(&mut far, 0.0, 0.0, &mut rng);
        let lit = |f: &Frame| f.pixels().iter().filter(|&&c| c != Rgb888::BLACK).count();
        assert!(lit(&near) > lit(&far));
        assert!(lit(&far) > 0);
    }
}
