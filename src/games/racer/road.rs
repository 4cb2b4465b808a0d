//! Road state: camera, theme, weather, tunnel and the two object pools.

use embassy_time::{
    Duration,
    Instant,
};
use libm::{
    cosf,
    roundf,
    sinf,
};

use super::{
    scenery::{
        Passed,
        SceneryKind,
        SceneryObject,
        TrafficCar,
    },
    theme::{
        Theme,
        ThemeSpec,
    },
};
use crate::{
    config::{
        RACER_THEME_DISTANCE,
        SCENERY_POOL,
        TRAFFIC_POOL,
        WIDTH,
    },
    game::millis_between,
    rng::Rng,
};

/// Fixed integration step of the curve accumulators.
pub const DT: f32 = 0.016;
pub const TUNNEL_MS: u64 = 8000;
pub const RAIN_MS: u64 = 60_000;
/// The chequered flag shows for this much distance before a theme change.
pub const FLAG_DISTANCE: f32 = 200.0;
pub const START_THEME: Theme = Theme::Cityscape;

const RIDGE_POINTS: usize = 64;
const RIDGE_BASE: f32 = 15.0;

// ── Tunnel ──────────────────────────────────────────────────────────────────

/// Fade envelope over a normalised tunnel run: in over the first fifth,
/// solid for the middle three fifths, out over the last fifth.
pub fn tunnel_envelope(t: f32) -> f32 {
    if t < 0.2 {
        t / 0.2
    } else if t > 0.8 {
        (1.0 - t) / 0.2
    } else {
        1.0
    }
}

#[derive(Default)]
pub struct Tunnel {
    started: Option<Instant>,
    progress: f32,
}

impl Tunnel {
    pub fn enter(&mut self, now: Instant) {
        if self.started.is_none() {
            self.started = Some(now);
            self.progress = 0.0;
            debug!("tunnel in");
        }
    }

    pub fn leave(&mut self) {
        self.started = None;
        self.progress = 0.0;
    }

    pub fn update(&mut self, now: Instant) {
        let Some(t0) = self.started else { return };
        let t = millis_between(t0, now) as f32 / TUNNEL_MS as f32;
        if t >= 1.0 {
            self.leave();
        } else {
            self.progress = tunnel_envelope(t);
        }
    }

    pub fn active(&self) -> bool {
        self.started.is_some()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }
}

// ── Rain ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Default)]
pub struct RainDrop {
    pub x: f32,
    pub y: f32,
    pub v: f32,
}

pub struct Rain {
    since: Option<Instant>,
    pub wind: f32,
    pub drops: [RainDrop; WIDTH as usize],
}

impl Rain {
    const TARGET_V: f32 = 5.0;

    fn new() -> Self {
        Self {
            since: None,
            wind: 0.0,
            drops: [RainDrop::default(); WIDTH as usize],
        }
    }

    pub fn falling(&self) -> bool {
        self.since.is_some()
    }

    pub fn start(&mut self, now: Instant, rng: &mut Rng) {
        if self.since.is_some() {
            return;
        }
        self.since = Some(now);
        self.wind = rng.between(-1.0, 1.0);
        for (x, d) in self.drops.iter_mut().enumerate() {
            *d = RainDrop {
                x: x as f32,
                y: -(rng.below(WIDTH as u32) as f32),
                v: 1.0,
            };
        }
        debug!("rain");
    }

    pub fn stop(&mut self) {
        self.since = None;
    }

    fn update(&mut self, now: Instant, theme: Theme, rng: &mut Rng) {
        if let Some(t0) = self.since
            && millis_between(t0, now) > RAIN_MS
        {
            self.stop();
        }
        if !self.falling() && theme.rainy() && rng.below(1000) == 1 {
            self.start(now, rng);
        }
        if !self.falling() {
            return;
        }

        for d in self.drops.iter_mut() {
            let accel = 0.2 + 0.01 * d.y.max(0.0);
            if d.v < Self::TARGET_V {
                d.v = (d.v + accel).min(Self::TARGET_V);
            }
            d.y += d.v + self.wind * 0.8;
            d.x += self.wind * 0.3;
            if d.x < 0.0 {
                d.x += WIDTH as f32;
            } else if d.x >= WIDTH as f32 {
                d.x -= WIDTH as f32;
            }
            if d.y > WIDTH as f32 || d.y < -(WIDTH as f32) {
                d.y = -(rng.below(WIDTH as u32) as f32);
                d.v = 1.0;
            }
        }
    }
}

// ── Mountains ───────────────────────────────────────────────────────────────

pub struct Mountain {
    pub height: f32,
    /// Ridge height per column, already in screen rows.
    pub ridge: [f32; RIDGE_POINTS],
    pub top: f32,
}

impl Mountain {
    fn new(height: f32) -> Self {
        Self {
            height,
            ridge: [RIDGE_BASE; RIDGE_POINTS],
            top: RIDGE_BASE,
        }
    }

    /// Ease toward the theme's height and rebuild the ridge from the drift.
    fn regenerate(&mut self, drift: f32, target: f32) {
        if self.height < target {
            self.height = (self.height + 0.01).min(target);
        } else if self.height > target {
            self.height = (self.height - 0.01).max(target);
        }
        let mut top = RIDGE_BASE;
        for (j, r) in self.ridge.iter_mut().enumerate() {
            let s = cosf(drift * 0.001 + j as f32 * 0.1) * self.height;
            *r = if s <= 0.0 { RIDGE_BASE + s } else { RIDGE_BASE - 0.8 * s };
            top = top.min(*r);
        }
        self.top = top;
    }
}

// ── Road ────────────────────────────────────────────────────────────────────

pub struct Road {
    pub(super) rng: Rng,
    theme: Theme,
    pub(super) spec: ThemeSpec,
    pub frame_count: u32,
    pub distance: f32,
    section: f32,
    /// Bend and rise of the road this frame.
    pub curve: f32,
    pub hill: f32,
    pub p_curve: f32,
    pub t_curve: f32,
    pub p_hill: f32,
    pub t_hill: f32,
    pub speed: f32,
    pub since_theme: f32,
    pub tunnel: Tunnel,
    pub rain: Rain,
    pub mountain: Mountain,
    pub scenery: [SceneryObject; SCENERY_POOL],
    pub traffic: [TrafficCar; TRAFFIC_POOL],
    next_scenery: Option<Instant>,
    next_traffic: Option<Instant>,
}

impl Road {
    pub fn new(seed: u64) -> Self {
        let spec = START_THEME.spec();
        Self {
            rng: Rng::new(seed),
            theme: START_THEME,
            mountain: Mountain::new(spec.hill_height),
            spec,
            frame_count: 0,
            distance: 0.0,
            section: 0.0,
            curve: 0.0,
            hill: 0.0,
            p_curve: 0.0,
            t_curve: 0.0,
            p_hill: 0.0,
            t_hill: 0.0,
            speed: 0.0,
            since_theme: 0.0,
            tunnel: Tunnel::default(),
            rain: Rain::new(),
            scenery: [SceneryObject::default(); SCENERY_POOL],
            traffic: [TrafficCar::default(); TRAFFIC_POOL],
            next_scenery: None,
            next_traffic: None,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme, now: Instant) {
        self.theme = theme;
        self.spec = theme.spec();
        if self.spec.features.rain {
            self.rain.start(now, &mut self.rng);
        } else {
            self.rain.stop();
        }
        info!("road theme {:?}", theme);
    }

    pub fn next_theme(&mut self, now: Instant) {
        self.set_theme(self.theme.next(), now);
    }

    /// Manual tunnel, only honoured on the plain day road.
    pub fn trigger_tunnel(&mut self, now: Instant) -> bool {
        if self.theme != Theme::Day || self.tunnel.active() {
            return false;
        }
        self.tunnel.enter(now);
        true
    }

    /// Distance left before the next theme change, once the flag is due.
    pub fn flag_progress(&self) -> Option<f32> {
        let lead_in = RACER_THEME_DISTANCE - FLAG_DISTANCE;
        (self.since_theme >= lead_in).then(|| ((self.since_theme - lead_in) / FLAG_DISTANCE).min(1.0))
    }

    pub fn update(&mut self, speed: f32, now: Instant) {
        self.speed = speed;
        self.frame_count = self.frame_count.wrapping_add(1);
        self.distance += speed;
        self.section += speed * DT;

        let f = self.frame_count as f32;
        self.curve = sinf(f * 0.02) * 2.0;
        self.hill = sinf(f * 0.015) * 1.5;
        self.p_curve += (self.curve - self.p_curve) * DT;
        self.t_curve += roundf(self.curve * self.section * 0.001) * speed * 0.01;
        self.p_hill += (self.hill - self.p_hill) * DT;
        self.t_hill += roundf(self.hill * self.section * 0.001) * speed * 0.01;

        self.tunnel.update(now);
        self.rain.update(now, self.theme, &mut self.rng);

        self.since_theme += speed * DT;
        if self.since_theme >= RACER_THEME_DISTANCE {
            self.next_theme(now);
            self.since_theme = 0.0;
        }

        self.mountain.regenerate(-self.t_curve, self.spec.hill_height);

        self.spawn_scenery(now);
        for i in 0..self.scenery.len() {
            match self.scenery[i].update(speed, self.curve) {
                Passed::TunnelEntrance => self.tunnel.enter(now),
                Passed::TunnelExit => self.tunnel.leave(),
                Passed::Nothing => {}
            }
        }

        self.spawn_traffic(now);
        for car in self.traffic.iter_mut() {
            car.update(speed, self.curve);
        }
    }

    fn pick_scenery(&mut self) -> SceneryKind {
        let spec = &self.spec;
        let allowed = |k: SceneryKind| !spec.filtered || spec.features.allows(k);
        let total: u32 = spec
            .scenery
            .iter()
            .filter(|(k, _)| allowed(*k))
            .map(|&(_, w)| w as u32)
            .sum();
        let mut roll = self.rng.below(total);
        let mut kind = spec.scenery[0].0;
        for &(k, w) in spec.scenery.iter().filter(|(k, _)| allowed(*k)) {
            if roll < w as u32 {
                kind = k;
                break;
            }
            roll -= w as u32;
        }
        // One tunnel at a time: the table's first kind stands in.
        if kind == SceneryKind::TunnelIntro && self.tunnel.active() {
            kind = spec.scenery[0].0;
        }
        kind
    }

    fn spawn_scenery(&mut self, now: Instant) {
        if self.next_scenery.is_some_and(|t| now < t) {
            return;
        }
        let Some(slot) = self.scenery.iter().position(|o| !o.active) else {
            return;
        };
        let kind = self.pick_scenery();
        let side = self.rng.sign();
        let track = side * (0.6 + self.rng.below(80) as f32 * 0.01) + (self.rng.below(40) as f32 - 20.0) * 0.005;
        let road_y = 0.1 + self.rng.below(10) as f32 * 0.1;
        self.scenery[slot].spawn(kind, track, road_y);
        self.next_scenery = Some(now + Duration::from_millis(500 + self.rng.below(1500) as u64));
    }

    fn spawn_traffic(&mut self, now: Instant) {
        if self.next_traffic.is_some_and(|t| now < t) {
            return;
        }
        let Some(slot) = self.traffic.iter().position(|c| !c.active) else {
            return;
        };
        let track = -0.6 + self.rng.below(120) as f32 / 100.0;
        let road_y = 0.1 + self.rng.below(5) as f32 * 0.1;
        let color = self.rng.below(4) as usize;
        self.traffic[slot].spawn(track, road_y, color);
        self.next_traffic = Some(now + Duration::from_millis(1000 + self.rng.below(3000) as u64));
    }

    /// Whether any car hit the player. Only when nobody did do cars shove
    /// each other apart.
    pub fn collide(&mut self, player: f32) -> bool {
        if self.traffic.iter().any(|c| c.hits_player(player)) {
            return true;
        }
        for i in 0..self.traffic.len() {
            for j in i + 1..self.traffic.len() {
                if self.traffic[i].overlaps(&self.traffic[j]) {
                    let dir = if self.traffic[i].track < self.traffic[j].track { -1.0 } else { 1.0 };
                    self.traffic[i].bounce(dir);
                    self.traffic[j].bounce(-dir);
                }
            }
        }
        false
    }
}
