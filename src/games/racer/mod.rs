//! Pseudo-3D arcade racer.
//!
//! A scanline-projected road bends and rises on two slow sine waves. Scenery
//! and oncoming cars ride toward the player in road space; the theme rolls
//! over every 1500 units of distance, announced by a chequered flag.
//!
//! Controls: A steers left, VolUp steers right, C or VolDown accelerates,
//! B brakes, D cycles the theme, A+B calls a tunnel on the day road.

mod render;
pub mod road;
pub mod scenery;
pub mod theme;

use embassy_time::{
    Duration,
    Instant,
};
use embedded_graphics::pixelcolor::{
    Rgb888,
    RgbColor,
};

use self::road::Road;
use crate::{
    color::grey,
    config::{
        HEIGHT,
        WIDTH,
    },
    frame::Frame,
    game::{
        Cooldown,
        ExitDetector,
        Game,
    },
    input::ButtonOctet,
    panel::Panel,
    rng::Rng,
};

const BRIGHTNESS: f32 = 0.8;
const FLASH: Duration = Duration::from_millis(500);
const BUTTON_DEBOUNCE_MS: u64 = 200;

// ── Player car ──────────────────────────────────────────────────────────────

pub struct Car {
    pub position: f32,
    pub velocity: f32,
    pub speed: f32,
    pub auto_accel: bool,
}

impl Default for Car {
    fn default() -> Self {
        Self::new()
    }
}

impl Car {
    pub const STEER: f32 = 0.05;
    pub const FRICTION: f32 = 0.85;
    pub const MAX_VELOCITY: f32 = 0.1;
    pub const EDGE: f32 = 1.2;
    pub const AUTO_RATE: f32 = 0.3;
    pub const AUTO_TARGET: f32 = 60.0;
    pub const TOP_SPEED: f32 = 100.0;

    pub const fn new() -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            speed: 20.0,
            auto_accel: true,
        }
    }

    /// Steering physics for one tick; `left` and `right` are 0 or 1.
    pub fn steer(&mut self, left: f32, right: f32) {
        self.velocity += (right - left) * Self::STEER;
        self.velocity *= Self::FRICTION;
        self.velocity = self.velocity.clamp(-Self::MAX_VELOCITY, Self::MAX_VELOCITY);
        self.position += self.velocity;
        if self.position.abs() > Self::EDGE {
            self.position = self.position.clamp(-Self::EDGE, Self::EDGE);
            self.velocity *= 0.5;
        }

        if self.auto_accel && self.speed < Self::AUTO_TARGET {
            self.speed = (self.speed + Self::AUTO_RATE).min(Self::AUTO_TARGET);
        }
    }

    pub fn brake(&mut self) {
        if self.speed > 0.0 {
            self.speed = (self.speed - 0.8).max(0.0);
            self.auto_accel = false;
        }
    }

    pub fn accelerate(&mut self) {
        if self.speed < Self::TOP_SPEED {
            self.speed = (self.speed + 0.5).min(Self::TOP_SPEED);
            self.auto_accel = true;
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let x = WIDTH / 2 + (self.position * WIDTH as f32 * 0.3) as i32 - 4;
        let y = HEIGHT - 3;
        let red = Rgb888::new(255, 0, 0);
        let dark = Rgb888::new(200, 0, 0);

        f.fill_rect(x, y, 8, 1, red);
        f.fill_rect(x, y + 1, 8, 2, dark);
        f.fill_rect(x + 3, y + 1, 2, 1, Rgb888::WHITE);
        f.fill_rect(x + 1, y - 1, 6, 1, Rgb888::BLUE);
        // Driver and passenger.
        f.fill_rect(x + 1, y - 1, 2, 2, Rgb888::YELLOW);
        f.fill_rect(x + 5, y - 1, 2, 2, Rgb888::new(139, 69, 19));
        f.fill_rect(x, y + 2, 2, 1, grey(128));
        f.fill_rect(x + 6, y + 2, 2, 1, grey(128));
        f.fill_rect(x, y, 2, 1, red);
        f.fill_rect(x + 6, y, 2, 1, red);
    }
}

// ── Game ────────────────────────────────────────────────────────────────────

pub struct Racer {
    car: Car,
    road: Road,
    rng: Rng,
    exit: ExitDetector,
    buttons: Cooldown,
    quit: bool,
    crashed_at: Option<Instant>,
    now: Instant,
}

impl Default for Racer {
    fn default() -> Self {
        Self::new()
    }
}

impl Racer {
    pub fn new() -> Self {
        Self {
            car: Car::new(),
            road: Road::new(0),
            rng: Rng::new(0),
            exit: ExitDetector::new(),
            buttons: Cooldown::from_millis(BUTTON_DEBOUNCE_MS),
            quit: false,
            crashed_at: None,
            now: Instant::from_ticks(0),
        }
    }

    pub fn car(&self) -> &Car {
        &self.car
    }

    pub fn road(&self) -> &Road {
        &self.road
    }

    /// Remaining strength of the crash flash, in `[0, 1]`.
    pub fn flash(&self) -> f32 {
        self.crashed_at.map_or(0.0, |t| {
            let left = FLASH.as_millis().saturating_sub(self.now.saturating_duration_since(t).as_millis());
            left as f32 / FLASH.as_millis() as f32
        })
    }

    /// Player against traffic. A fresh hit halves the speed and kicks the
    /// steering; further hits during the flash are ignored.
    fn collide(&mut self, now: Instant) {
        if self.road.collide(self.car.position) && self.crashed_at.is_none() {
            self.crashed_at = Some(now);
            self.car.speed *= 0.5;
            self.car.velocity = (self.car.velocity + 0.1 * self.rng.sign())
                .clamp(-Car::MAX_VELOCITY, Car::MAX_VELOCITY);
            debug!("crash at speed {}", self.car.speed);
        }
        if let Some(t) = self.crashed_at
            && now.saturating_duration_since(t) > FLASH
        {
            self.crashed_at = None;
        }
    }
}

impl Game for Racer {
    fn name(&self) -> &'static str {
        "RACE"
    }

    fn description(&self) -> &'static str {
        "Pseudo-3D road racer"
    }

    fn init(&mut self, frame: &mut Frame, panel: &mut dyn Panel, now: Instant) {
        panel.set_brightness(BRIGHTNESS);
        let seed = Rng::from_instant(now).next_u32() as u64;
        self.car = Car::new();
        self.road = Road::new(seed);
        self.rng = Rng::new(seed ^ 0xA5A5);
        self.exit.reset();
        self.buttons.reset();
        self.quit = false;
        self.crashed_at = None;
        self.now = now;
        frame.blank();
    }

    fn handle_input(&mut self, input: ButtonOctet, now: Instant) {
        self.quit = self.exit.poll(input.d, now);

        self.car.steer(input.a as u8 as f32, input.vol_up as u8 as f32);
        if input.b {
            self.car.brake();
        }
        if input.c || input.vol_down {
            self.car.accelerate();
        }

        if input.d && self.buttons.try_fire(now) {
            self.road.next_theme(now);
        }
        if input.a && input.b && self.buttons.try_fire(now) {
            self.road.trigger_tunnel(now);
        }
    }

    fn update(&mut self, now: Instant) -> bool {
        if self.quit {
            return false;
        }
        self.now = now;
        self.road.update(self.car.speed, now);
        self.collide(now);
        true
    }

    fn render(&mut self, frame: &mut Frame) {
        self.road.draw(frame);
        self.car.draw(frame);

        if self.flash() > 0.5 {
            for i in (0..WIDTH).step_by(4) {
                frame.put(i, 0, Rgb888::RED);
                frame.put(i, HEIGHT - 1, Rgb888::RED);
                frame.put(0, i, Rgb888::RED);
                frame.put(WIDTH - 1, i, Rgb888::RED);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::RecordingPanel;

    fn ms(t: u64) -> Instant {
        Instant::from_millis(t)
    }

    fn started() -> Racer {
        let mut r = Racer::new();
        r.init(&mut Frame::new(), &mut RecordingPanel::new(), ms(0));
        r
    }

    #[test]
    fn steering_stays_within_limits() {
        let mut car = Car::new();
        for i in 0..400 {
            let (l, r) = if (i / 50) % 2 == 0 { (1.0, 0.0) } else { (0.0, 1.0) };
            car.steer(l, r);
            assert!(car.velocity.abs() <= Car::MAX_VELOCITY);
            assert!(car.position.abs() <= Car::EDGE);
            assert!((0.0..=Car::TOP_SPEED).contains(&car.speed));
        }
    }

    #[test]
    fn auto_accel_settles_at_sixty_and_brake_disables_it() {
        let mut car = Car::new();
        for _ in 0..500 {
            car.steer(0.0, 0.0);
        }
        assert_eq!(car.speed, Car::AUTO_TARGET);
        for _ in 0..200 {
            car.brake();
        }
        assert_eq!(car.speed, 0.0);
        assert!(!car.auto_accel);
        car.steer(0.0, 0.0);
        assert_eq!(car.speed, 0.0);
        for _ in 0..300 {
            car.accelerate();
        }
        assert_eq!(car.speed, Car::TOP_SPEED);
    }

    #[test]
    fn collision_halves_speed_and_flashes() {
        let mut r = started();
        r.car.position = 0.0;
        r.car.speed = 60.0;
        r.road.traffic[0].spawn(0.0, 15.0, 0);
        r.now = ms(100);
        r.collide(ms(100));
        assert_eq!(r.car.speed, 30.0);
        assert!(r.car.velocity.abs() > 0.0);
        assert!(r.flash() > 0.5);

        // Still touching: no second penalty during the flash.
        r.collide(ms(150));
        assert_eq!(r.car.speed, 30.0);

        r.road.traffic[0].active = false;
        r.now = ms(700);
        r.collide(ms(700));
        assert_eq!(r.flash(), 0.0);
    }

    #[test]
    fn crash_kick_respects_the_velocity_cap() {
        for seed in 0..16 {
            let mut r = started();
            r.rng = Rng::new(seed);
            r.car.position = -0.5;
            let right = ButtonOctet { vol_up: true, ..ButtonOctet::NONE };
            for t in 0..4 {
                r.handle_input(right, ms(t * 50));
                assert!(r.update(ms(t * 50)));
            }
            r.road.traffic[0].spawn(r.car.position, 15.0, 0);
            assert!(r.update(ms(200)));
            assert!(r.flash() > 0.5);
            assert!(r.car.velocity.abs() <= Car::MAX_VELOCITY);
        }
    }

    #[test]
    fn velocity_and_position_hold_after_every_update() {
        let mut r = started();
        let mut pick = Rng::new(77);
        for tick in 0..2000u64 {
            let now = ms(tick * 50);
            let input = ButtonOctet {
                a: pick.one_in(3),
                b: pick.one_in(8),
                c: pick.one_in(4),
                vol_up: pick.one_in(3),
                ..ButtonOctet::NONE
            };
            if tick % 40 == 0 {
                r.road.traffic[0].spawn(r.car.position, 15.0, 0);
            }
            r.handle_input(input, now);
            assert!(r.update(now));
            assert!(r.car.velocity.abs() <= Car::MAX_VELOCITY, "tick {tick}");
            assert!(r.car.position.abs() <= Car::EDGE, "tick {tick}");
            assert!((0.0..=Car::TOP_SPEED).contains(&r.car.speed), "tick {tick}");
        }
    }

    #[test]
    fn flash_draws_a_red_border() {
        let mut r = started();
        r.road.traffic[0].spawn(0.0, 15.0, 0);
        r.collide(ms(0));
        let mut f = Frame::new();
        r.render(&mut f);
        assert_eq!(f.get(0, 8), Rgb888::RED);
        assert_eq!(f.get(WIDTH - 1, 4), Rgb888::RED);
    }

    #[test]
    fn d_cycles_theme_with_debounce() {
        let mut r = started();
        let before = r.road.theme();
        let d = ButtonOctet { d: true, ..ButtonOctet::NONE };
        r.handle_input(d, ms(1000));
        r.handle_input(d, ms(1050));
        assert_eq!(r.road.theme(), before.next());
        r.handle_input(ButtonOctet::NONE, ms(1100));
        r.handle_input(d, ms(1300));
        assert_eq!(r.road.theme(), before.next().next());
    }

    #[test]
    fn holding_d_leaves() {
        let mut r = started();
        let d = ButtonOctet { d: true, ..ButtonOctet::NONE };
        let mut t = 0;
        while t < 1000 {
            r.handle_input(d, ms(t));
            assert!(r.update(ms(t)));
            t += 50;
        }
        r.handle_input(d, ms(1000));
        assert!(!r.update(ms(1000)));
    }

    #[test]
    fn a_plus_b_tunnel_needs_day() {
        let mut r = started();
        let ab = ButtonOctet { a: true, b: true, ..ButtonOctet::NONE };
        r.handle_input(ab, ms(500));
        assert!(!r.road.tunnel.active());
        r.road.set_theme(theme::Theme::Day, ms(500));
        r.handle_input(ab, ms(1000));
        assert!(r.road.tunnel.active());
    }

    #[test]
    fn init_sets_racer_brightness() {
        let mut r = Racer::new();
        let mut p = RecordingPanel::new();
        r.init(&mut Frame::new(), &mut p, ms(0));
        assert_eq!(p.brightness(), BRIGHTNESS);
    }
}
