//! Horizontal cave shooter.
//!
//! The ship flies right through a Perlin cavern while conventional enemies
//! and flocking swarms come at it. Themes change with distance travelled.
//! The title boots into attract mode flown by [`demo::Pilot`]; pressing A
//! hands over the controls. Losing all health shows GAME OVER for five
//! seconds and then falls back to attract mode.
//!
//! Controls: VolUp/VolDown move vertically, BrightDown/BrightUp move
//! horizontally, A fires, B cycles the weapon.

pub mod actors;
pub mod demo;
mod render;
pub mod swarm;
pub mod theme;
pub mod weapons;

use embassy_time::{
    Duration,
    Instant,
};

use self::{
    actors::{
        Enemy,
        EnemyKind,
        Particle,
        PowerUp,
        PowerUpKind,
    },
    demo::Pilot,
    swarm::{
        SwarmEnemy,
        SwarmKind,
    },
    theme::Theme,
    weapons::{
        Bullet,
        EnemyBullet,
        Weapon,
    },
};
use crate::{
    config::{
        HEIGHT,
        MAX_BULLETS,
        MAX_ENEMIES,
        MAX_ENEMY_BULLETS,
        MAX_PARTICLES,
        MAX_POWERUPS,
        MAX_SWARM,
        WIDTH,
    },
    frame::Frame,
    game::{
        ExitDetector,
        Game,
    },
    input::{
        ButtonOctet,
        Edges,
    },
    noise::Perlin,
    panel::Panel,
    rng::Rng,
};

const GAME_OVER: Duration = Duration::from_secs(5);
/// Grace period after taking over from the autopilot.
const TAKEOVER: Duration = Duration::from_millis(100);
const WEAPON_SWAP_GUARD: Duration = Duration::from_millis(300);
const MAX_DT: f32 = 0.1;

const ENEMY_EVERY: Duration = Duration::from_millis(1500);
const TANK_AFTER: Duration = Duration::from_millis(800);
const SWARM_EVERY: Duration = Duration::from_millis(4000);
const SMALL_SWARM_AFTER: Duration = Duration::from_millis(2000);
/// A small swarm pulls the next big one this much closer.
const SMALL_SWARM_REBATE: Duration = Duration::from_millis(1500);

const SHOOTER_SHOT_SPEED: f32 = 3.0;
const SWARM_SHOT_SPEED: f32 = 2.5;
const SWARM_SHOT_RANGE: f32 = 12.0;
const SWARM_SHOT_INTERVAL_MS: u32 = 1200;

// ── Player ──────────────────────────────────────────────────────────────────

pub struct Player {
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub weapon: Weapon,
    pub last_shot: Option<Instant>,
    pub invulnerable_until: Option<Instant>,
    pub alive: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub const MAX_HEALTH: i32 = 100;

    pub const fn new() -> Self {
        Self {
            x: 4.0,
            y: 16.0,
            health: Self::MAX_HEALTH,
            weapon: Weapon::Single,
            last_shot: None,
            invulnerable_until: None,
            alive: true,
        }
    }

    pub fn weapon_ready(&self, now: Instant) -> bool {
        self.last_shot
            .is_none_or(|t| now.saturating_duration_since(t) >= self.weapon.cadence())
    }

    pub fn invulnerable(&self, now: Instant) -> bool {
        self.invulnerable_until.is_some_and(|t| now < t)
    }

    /// Keep the ship one pixel inside the panel.
    fn clamp(&mut self) {
        self.x = self.x.clamp(1.0, (WIDTH - 2) as f32);
        self.y = self.y.clamp(1.0, (HEIGHT - 2) as f32);
    }

    /// Take `damage` and go untouchable for `grace`. Returns `true` when
    /// this hit was fatal.
    fn hurt(&mut self, damage: i32, grace: Duration, now: Instant) -> bool {
        self.health -= damage;
        self.invulnerable_until = Some(now + grace);
        if self.health <= 0 {
            self.alive = false;
        }
        !self.alive
    }
}

// ── Game ────────────────────────────────────────────────────────────────────

pub struct SideScroller {
    player: Player,
    bullets: [Bullet; MAX_BULLETS],
    enemy_bullets: [EnemyBullet; MAX_ENEMY_BULLETS],
    enemies: [Enemy; MAX_ENEMIES],
    swarm: [SwarmEnemy; MAX_SWARM],
    particles: [Particle; MAX_PARTICLES],
    powerups: [PowerUp; MAX_POWERUPS],

    perlin: Perlin,
    rng: Rng,
    theme: Theme,
    distance: f32,
    terrain_offset: f32,
    score: u32,

    demo: bool,
    pilot: Pilot,
    took_over: Option<Instant>,
    game_over_since: Option<Instant>,

    last_tick: Instant,
    last_enemy: Instant,
    last_swarm: Instant,
    next_flock: u32,

    exit: ExitDetector,
    edges: Edges,
    quit: bool,
    now: Instant,
}

impl Default for SideScroller {
    fn default() -> Self {
        Self::new()
    }
}

impl SideScroller {
    pub fn new() -> Self {
        let t0 = Instant::from_ticks(0);
        let mut rng = Rng::new(0);
        Self {
            player: Player::new(),
            bullets: core::array::from_fn(|_| Bullet::default()),
            enemy_bullets: [EnemyBullet::default(); MAX_ENEMY_BULLETS],
            enemies: [Enemy::default(); MAX_ENEMIES],
            swarm: [SwarmEnemy::default(); MAX_SWARM],
            particles: [Particle::default(); MAX_PARTICLES],
            powerups: [PowerUp::default(); MAX_POWERUPS],
            perlin: Perlin::new(&mut rng),
            rng,
            theme: Theme::SpaceBlue,
            distance: 0.0,
            terrain_offset: 0.0,
            score: 0,
            demo: true,
            pilot: Pilot::new(t0),
            took_over: None,
            game_over_since: None,
            last_tick: t0,
            last_enemy: t0,
            last_swarm: t0,
            next_flock: 0,
            exit: ExitDetector::new(),
            edges: Edges::default(),
            quit: false,
            now: t0,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn in_demo(&self) -> bool {
        self.demo
    }

    pub fn game_over(&self) -> bool {
        self.game_over_since.is_some()
    }

    /// Fresh run in attract mode. Input edge state and the exit detector
    /// survive so a held button is not seen as a new press.
    fn restart(&mut self, now: Instant) {
        self.player = Player::new();
        self.bullets.iter_mut().for_each(|b| b.active = false);
        self.enemy_bullets.iter_mut().for_each(|b| b.active = false);
        self.enemies.iter_mut().for_each(|e| e.active = false);
        self.swarm.iter_mut().for_each(|s| s.active = false);
        self.particles.iter_mut().for_each(|p| p.active = false);
        self.powerups.iter_mut().for_each(|p| p.active = false);
        self.theme = Theme::SpaceBlue;
        self.distance = 0.0;
        self.terrain_offset = 0.0;
        self.score = 0;
        self.demo = true;
        self.pilot = Pilot::new(now);
        self.took_over = None;
        self.game_over_since = None;
        self.last_tick = now;
        self.last_enemy = now;
        self.last_swarm = now;
        self.now = now;
        info!("side-scroller: attract mode");
    }

    fn fire(&mut self, now: Instant) {
        if self.player.weapon_ready(now) {
            weapons::fire(&mut self.bullets, self.player.weapon, self.player.x, self.player.y);
            self.player.last_shot = Some(now);
        }
    }

    /// Nearest live target, conventional or swarm, to `(x, y)`.
    fn nearest_target(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let conventional = self.enemies.iter().filter(|e| e.active).map(|e| (e.x, e.y));
        let flocking = self.swarm.iter().filter(|s| s.active).map(|s| (s.x, s.y));
        conventional.chain(flocking).min_by(|a, b| {
            let da = (a.0 - x) * (a.0 - x) + (a.1 - y) * (a.1 - y);
            let db = (b.0 - x) * (b.0 - x) + (b.1 - y) * (b.1 - y);
            da.total_cmp(&db)
        })
    }

    // ── Tick stages ─────────────────────────────────────────────────────────

    fn advance_world(&mut self) {
        self.terrain_offset += 0.02;
        self.distance += if self.demo { 2.0 } else { 0.5 };
        let theme = Theme::for_distance(self.distance);
        if theme != self.theme {
            info!("side-scroller theme {:?}", theme);
            self.theme = theme;
        }
    }

    fn update_player(&mut self, now: Instant) {
        if !self.player.alive {
            return;
        }
        if self.demo {
            self.pilot
                .fly(&mut self.player, &self.enemy_bullets, &mut self.rng, now);
            self.fire(now);
        }
        self.player.clamp();
        if self.rng.one_in(3) {
            actors::exhaust(&mut self.particles, &mut self.rng, self.player.x, self.player.y);
        }
    }

    fn update_bullets(&mut self, dt: f32) {
        for i in 0..self.bullets.len() {
            if !self.bullets[i].active {
                continue;
            }
            self.bullets[i].advance(dt);
            if self.bullets[i].weapon == Weapon::Missile {
                let target = self.nearest_target(self.bullets[i].x, self.bullets[i].y);
                self.bullets[i].home(target, dt);
            }
        }
        for b in self.enemy_bullets.iter_mut().filter(|b| b.active) {
            b.advance(dt);
        }
    }

    fn update_enemies(&mut self, dt: f32) {
        let (px, py) = (self.player.x, self.player.y);
        for e in self.enemies.iter_mut().filter(|e| e.active) {
            if e.update(dt, py) {
                weapons::fire_at(&mut self.enemy_bullets, e.x - 1.0, e.y, px, py, SHOOTER_SHOT_SPEED);
            }
        }
    }

    fn update_swarm(&mut self, dt: f32) {
        let (px, py) = (self.player.x, self.player.y);
        swarm::flock(&mut self.swarm, (px, py), dt);
        for s in self.swarm.iter_mut().filter(|s| s.active) {
            if s.kind == SwarmKind::Aggressive
                && s.shot_timer > SWARM_SHOT_INTERVAL_MS
                && s.distance_to(px, py) < SWARM_SHOT_RANGE
                && self.rng.one_in(8)
            {
                weapons::fire_at(&mut self.enemy_bullets, s.x, s.y, px, py, SWARM_SHOT_SPEED);
                s.shot_timer = 0;
            }
        }
    }

    fn update_powerups(&mut self, dt: f32) {
        for i in 0..self.powerups.len() {
            let p = &mut self.powerups[i];
            if !p.active {
                continue;
            }
            p.update(dt);
            if !p.touches(self.player.x, self.player.y) {
                continue;
            }
            match p.kind {
                PowerUpKind::Weapon => self.player.weapon = self.player.weapon.next(),
                PowerUpKind::Health => {
                    self.player.health = (self.player.health + 25).min(Player::MAX_HEALTH)
                }
                PowerUpKind::Speed => {}
            }
            p.active = false;
            let (x, y) = (p.x, p.y);
            debug!("power-up {:?}", p.kind);
            actors::explode(&mut self.particles, &mut self.rng, x, y, 5);
        }
    }

    fn collide(&mut self, now: Instant) {
        let Self {
            player: p,
            bullets,
            enemy_bullets,
            enemies,
            swarm,
            particles,
            powerups,
            rng,
            score,
            game_over_since,
            ..
        } = self;

        for b in bullets.iter_mut().filter(|b| b.active) {
            for e in enemies.iter_mut().filter(|e| e.active) {
                if (b.x - e.x).abs() < 2.0 && (b.y - e.y).abs() < 2.0 {
                    b.active = false;
                    e.health -= 1;
                    actors::explode(particles, rng, e.x, e.y, 3);
                    if e.health <= 0 {
                        actors::explode(particles, rng, e.x, e.y, 8);
                        *score += e.kind.bounty();
                        if rng.one_in(10) {
                            actors::drop_powerup(powerups, rng, e.x, e.y);
                        }
                        e.active = false;
                    }
                    break;
                }
            }
        }

        for b in bullets.iter_mut().filter(|b| b.active) {
            for s in swarm.iter_mut().filter(|s| s.active) {
                if (b.x - s.x).abs() < 1.5 && (b.y - s.y).abs() < 1.5 {
                    b.active = false;
                    s.health -= 1;
                    actors::explode(particles, rng, s.x, s.y, 2);
                    if s.health <= 0 {
                        actors::explode(particles, rng, s.x, s.y, 4);
                        *score += (s.kind.index() as u32 + 1) * 5;
                        if rng.one_in(15) {
                            actors::drop_powerup(powerups, rng, s.x, s.y);
                        }
                        s.active = false;
                    }
                    break;
                }
            }
        }

        let mut died = false;

        if p.alive && !p.invulnerable(now) {
            for b in enemy_bullets.iter_mut().filter(|b| b.active) {
                if (b.x - p.x).abs() < 2.0 && (b.y - p.y).abs() < 2.0 {
                    b.active = false;
                    died |= p.hurt(10, Duration::from_millis(500), now);
                    actors::explode(particles, rng, p.x, p.y, 5);
                    break;
                }
            }
        }

        if p.alive && !p.invulnerable(now) {
            for e in enemies.iter_mut().filter(|e| e.active) {
                if (e.x - p.x).abs() < 2.0 && (e.y - p.y).abs() < 2.0 {
                    died |= p.hurt(20, Duration::from_millis(1000), now);
                    actors::explode(particles, rng, p.x, p.y, 8);
                    actors::explode(particles, rng, e.x, e.y, 5);
                    e.active = false;
                    break;
                }
            }
        }

        if p.alive && !p.invulnerable(now) {
            for s in swarm.iter_mut().filter(|s| s.active) {
                if (s.x - p.x).abs() < 1.8 && (s.y - p.y).abs() < 1.8 {
                    died |= p.hurt(5, Duration::from_millis(300), now);
                    actors::explode(particles, rng, p.x, p.y, 4);
                    actors::explode(particles, rng, s.x, s.y, 3);
                    s.active = false;
                    break;
                }
            }
        }

        if died {
            actors::explode(particles, rng, p.x, p.y, 15);
            *game_over_since = Some(now);
            info!("side-scroller: game over, score {}", *score);
        }
    }

    fn spawn(&mut self, now: Instant) {
        let since_enemy = now.saturating_duration_since(self.last_enemy);
        if since_enemy > ENEMY_EVERY {
            let kind = EnemyKind::ALL[self.rng.below(4) as usize];
            self.spawn_enemy(kind);
            self.last_enemy = now;
        } else if since_enemy > TANK_AFTER && self.rng.below(100) < 5 {
            self.spawn_enemy(EnemyKind::Tank);
            self.last_enemy = now;
        }

        let since_swarm = now.saturating_duration_since(self.last_swarm);
        if since_swarm > SWARM_EVERY {
            let kind = SwarmKind::ALL[self.rng.below(3) as usize];
            let size = 3 + self.rng.below(4) as usize;
            let y = self.rng.range(5, HEIGHT - 5) as f32;
            self.spawn_flock(size, kind, WIDTH as f32 + 5.0, y);
            self.last_swarm = now;
        } else if since_swarm > SMALL_SWARM_AFTER && self.rng.below(100) < 4 {
            let size = 2 + self.rng.below(3) as usize;
            let y = self.rng.range(8, HEIGHT - 8) as f32;
            self.spawn_flock(size, SwarmKind::Aggressive, WIDTH as f32 + 3.0, y);
            self.last_swarm = now.checked_sub(SMALL_SWARM_REBATE).unwrap_or(now);
        }
    }

    fn spawn_enemy(&mut self, kind: EnemyKind) {
        if let Some(e) = self.enemies.iter_mut().find(|e| !e.active) {
            e.spawn(kind, &mut self.rng);
        }
    }

    fn spawn_flock(&mut self, size: usize, kind: SwarmKind, x: f32, y: f32) {
        let id = self.next_flock;
        self.next_flock = self.next_flock.wrapping_add(1);
        let placed = swarm::spawn(&mut self.swarm, &mut self.rng, size, kind, id, x, y);
        debug!("flock {} of {} {:?}", id, placed, kind);
    }

    fn manual_controls(&mut self, input: ButtonOctet, now: Instant) {
        const STEP: f32 = 1.0;
        if input.vol_up {
            self.player.y -= STEP;
        }
        if input.vol_down {
            self.player.y += STEP;
        }
        if input.bright_down {
            self.player.x -= STEP;
        }
        if input.bright_up {
            self.player.x += STEP;
        }
        if input.a {
            self.fire(now);
        }
        if input.b
            && self
                .player
                .last_shot
                .is_none_or(|t| now.saturating_duration_since(t) > WEAPON_SWAP_GUARD)
        {
            self.player.weapon = self.player.weapon.next();
            self.player.last_shot = Some(now);
        }
    }
}

impl Game for SideScroller {
    fn name(&self) -> &'static str {
        "P-TYPE"
    }

    fn description(&self) -> &'static str {
        "Cave shooter with swarms"
    }

    fn init(&mut self, frame: &mut Frame, _panel: &mut dyn Panel, now: Instant) {
        self.rng = Rng::from_instant(now);
        self.perlin = Perlin::new(&mut self.rng);
        self.next_flock = 0;
        self.exit.reset();
        self.edges = Edges::default();
        self.quit = false;
        self.restart(now);
        frame.blank();
    }

    fn handle_input(&mut self, input: ButtonOctet, now: Instant) {
        self.quit = self.exit.poll(input.d, now);
        let pressed = self.edges.rising(input);

        if self.game_over() {
            if pressed.a {
                self.restart(now);
            }
            return;
        }

        if self.demo {
            if pressed.a {
                self.demo = false;
                self.took_over = Some(now);
                info!("side-scroller: player took over");
            }
            return;
        }

        let settled = self
            .took_over
            .is_none_or(|t| now.saturating_duration_since(t) > TAKEOVER);
        if settled {
            self.manual_controls(input, now);
        }
    }

    fn update(&mut self, now: Instant) -> bool {
        if self.quit {
            return false;
        }
        let elapsed = now.saturating_duration_since(self.last_tick).as_millis();
        let dt = (elapsed as f32 / 1000.0).min(MAX_DT);
        self.last_tick = now;
        self.now = now;

        if let Some(t) = self.game_over_since {
            if now.saturating_duration_since(t) > GAME_OVER {
                self.restart(now);
            }
            return true;
        }

        self.advance_world();
        self.update_player(now);
        self.update_bullets(dt);
        self.update_enemies(dt);
        self.update_swarm(dt);
        for p in self.particles.iter_mut().filter(|p| p.active) {
            p.update(dt);
        }
        self.update_powerups(dt);
        self.collide(now);
        self.spawn(now);
        true
    }

    fn render(&mut self, frame: &mut Frame) {
        self.draw(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::RecordingPanel;

    fn ms(t: u64) -> Instant {
        Instant::from_millis(t)
    }

    fn started(t: u64) -> SideScroller {
        let mut g = SideScroller::new();
        g.init(&mut Frame::new(), &mut RecordingPanel::new(), ms(t));
        g
    }

    fn press(a: bool) -> ButtonOctet {
        ButtonOctet { a, ..ButtonOctet::NONE }
    }

    #[test]
    fn boots_into_attract_mode_and_a_takes_over() {
        let mut g = started(0);
        assert!(g.in_demo());
        g.handle_input(press(true), ms(50));
        assert!(!g.in_demo());
        // Holding A does not re-trigger anything but fire.
        g.handle_input(press(true), ms(100));
        assert!(!g.in_demo());
    }

    #[test]
    fn attract_mode_travels_four_times_faster() {
        let mut g = started(0);
        for t in 1..=10 {
            g.handle_input(ButtonOctet::NONE, ms(t * 50));
            g.update(ms(t * 50));
        }
        assert_eq!(g.distance(), 20.0);

        g.handle_input(press(true), ms(600));
        g.handle_input(ButtonOctet::NONE, ms(650));
        g.update(ms(650));
        assert_eq!(g.distance(), 20.5);
    }

    #[test]
    fn theme_follows_distance_travelled() {
        let mut g = started(0);
        g.distance = 999.0;
        g.update(ms(50));
        assert_eq!(g.theme(), Theme::VolcanicRed);
    }

    #[test]
    fn manual_fire_respects_cadence() {
        let mut g = started(0);
        g.handle_input(press(true), ms(0));
        let mut t = 200;
        let mut shots = 0;
        while t <= 1200 {
            g.handle_input(press(true), ms(t));
            if g.player.last_shot == Some(ms(t)) {
                shots += 1;
            }
            t += 50;
        }
        // Single shot, 150 ms cadence sampled every 50 ms: one shot per 150 ms.
        assert_eq!(shots, 7);
    }

    #[test]
    fn b_cycles_weapon_with_guard() {
        let mut g = started(0);
        g.handle_input(press(true), ms(0));
        let b = ButtonOctet { b: true, ..ButtonOctet::NONE };
        g.handle_input(b, ms(200));
        assert_eq!(g.player.weapon, Weapon::Triple);
        g.handle_input(b, ms(300));
        assert_eq!(g.player.weapon, Weapon::Triple);
        g.handle_input(b, ms(550));
        assert_eq!(g.player.weapon, Weapon::Missile);
    }

    #[test]
    fn death_shows_game_over_then_returns_to_attract() {
        let mut g = started(0);
        g.handle_input(press(true), ms(0));
        g.player.health = 5;
        let (x, y) = (g.player.x, g.player.y);
        g.enemy_bullets[0] = EnemyBullet {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            active: true,
        };
        g.collide(ms(1000));
        assert!(g.game_over());
        assert!(!g.player.alive);

        assert!(g.update(ms(3000)));
        assert!(g.game_over());
        assert!(g.update(ms(6050)));
        assert!(!g.game_over());
        assert!(g.in_demo());
        assert_eq!(g.player.health, Player::MAX_HEALTH);
    }

    #[test]
    fn a_restarts_from_game_over() {
        let mut g = started(0);
        g.game_over_since = Some(ms(100));
        g.handle_input(press(true), ms(200));
        assert!(!g.game_over());
        assert!(g.in_demo());
    }

    #[test]
    fn invulnerability_blocks_repeat_hits() {
        let mut g = started(0);
        let (x, y) = (g.player.x, g.player.y);
        for b in g.enemy_bullets.iter_mut().take(2) {
            *b = EnemyBullet {
                x,
                y,
                vx: 0.0,
                vy: 0.0,
                active: true,
            };
        }
        g.collide(ms(1000));
        assert_eq!(g.player.health, 90);
        g.collide(ms(1200));
        assert_eq!(g.player.health, 90);
        g.collide(ms(1600));
        assert_eq!(g.player.health, 80);
    }

    #[test]
    fn kills_score_by_kind() {
        let mut g = started(0);
        g.enemies[0] = Enemy {
            x: 20.0,
            y: 10.0,
            health: 1,
            kind: EnemyKind::Shooter,
            active: true,
            ..Enemy::default()
        };
        g.bullets[0].launch(20.0, 10.0, 4.0, 0.0, Weapon::Single);
        g.swarm[0] = SwarmEnemy::new(SwarmKind::Defensive, 0, 10.0, 25.0);
        g.bullets[1].launch(10.0, 25.0, 4.0, 0.0, Weapon::Single);
        g.collide(ms(100));
        assert_eq!(g.score(), 40 + 10);
        assert!(!g.enemies[0].active);
        assert!(!g.swarm[0].active);
    }

    #[test]
    fn spawns_arrive_on_schedule() {
        let mut g = started(0);
        let mut t = 0;
        while t < 1550 {
            t += 50;
            g.update(ms(t));
        }
        assert!(g.last_enemy > ms(0));
        while t < 4050 {
            t += 50;
            g.update(ms(t));
        }
        assert!(g.last_swarm > ms(0));
        assert!(g.next_flock > 0);
    }

    #[test]
    fn player_stays_on_the_panel() {
        let mut g = started(0);
        g.handle_input(press(true), ms(0));
        let up_left = ButtonOctet {
            vol_up: true,
            bright_down: true,
            ..ButtonOctet::NONE
        };
        for t in 1..60 {
            g.handle_input(up_left, ms(200 + t * 50));
            g.update(ms(200 + t * 50));
            if g.game_over() {
                break;
            }
            assert!(g.player.x >= 1.0 && g.player.y >= 1.0);
        }
    }

    #[test]
    fn holding_d_leaves() {
        let mut g = started(0);
        let d = ButtonOctet { d: true, ..ButtonOctet::NONE };
        let mut t = 0;
        while t < 1000 {
            g.handle_input(d, ms(t));
            assert!(g.update(ms(t)));
            t += 50;
        }
        g.handle_input(d, ms(1000));
        assert!(!g.update(ms(1000)));
    }
}
