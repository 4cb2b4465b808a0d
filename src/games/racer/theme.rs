//! The fourteen road themes: sky, verge, kerb, hill and tunnel palettes,
//! sky features and the roadside scenery each one spawns.

use embedded_graphics::pixelcolor::Rgb888;

use super::scenery::SceneryKind::{
    self,
    *,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Theme {
    Day,
    Night,
    StarryNight,
    Vice,
    Desert,
    DayToo,
    Snow,
    F32,
    Red,
    Cyber,
    Sunset,
    Ocean,
    Neon,
    Cityscape,
}

impl Theme {
    pub const ALL: [Theme; 14] = [
        Theme::Day,
        Theme::Night,
        Theme::StarryNight,
        Theme::Vice,
        Theme::Desert,
        Theme::DayToo,
        Theme::Snow,
        Theme::F32,
        Theme::Red,
        Theme::Cyber,
        Theme::Sunset,
        Theme::Ocean,
        Theme::Neon,
        Theme::Cityscape,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Themes that may start a shower on their own.
    pub fn rainy(self) -> bool {
        matches!(self, Theme::Night | Theme::StarryNight)
    }
}

#[derive(Clone, Copy, Default)]
pub struct Features {
    pub sun: bool,
    pub moon: bool,
    pub stars: bool,
    pub rain: bool,
    pub trees: bool,
    pub bushes: bool,
    pub street_lights: bool,
    pub signs: bool,
    pub clouds: bool,
}

impl Features {
    /// Whether a kind drawn from the shared table fits this theme.
    pub fn allows(&self, kind: SceneryKind) -> bool {
        match kind {
            Tree | PalmTree => self.trees,
            Bush => self.bushes,
            StreetLight => self.street_lights,
            Billboard => self.signs,
            _ => true,
        }
    }
}

pub struct ThemeSpec {
    pub hill_height: f32,
    pub features: Features,
    pub sun_size_mod: i32,
    pub sun: [Rgb888; 2],
    /// Alternating verge colours.
    pub grass: [Rgb888; 2],
    /// Left and right kerb.
    pub edge: [Rgb888; 2],
    /// Outline, ridge, fill, shade.
    pub hills: [Rgb888; 4],
    /// Horizon bands, top first.
    pub sky: [Rgb888; 4],
    pub tunnel_wall: [Rgb888; 2],
    pub tunnel_edge: [Rgb888; 2],
    /// Weighted spawn table.
    pub scenery: &'static [(SceneryKind, u8)],
    /// Whether the shared table is filtered through `features`.
    pub filtered: bool,
}

const fn c(r: u8, g: u8, b: u8) -> Rgb888 {
    Rgb888::new(r, g, b)
}

const YELLOW_SUN: [Rgb888; 2] = [c(255, 255, 0), c(255, 200, 0)];
const MEADOW_HILLS: [Rgb888; 4] = [c(42, 170, 138), c(26, 187, 43), c(50, 205, 50), c(1, 50, 32)];
const DUSK_HILLS: [Rgb888; 4] = [c(132, 77, 163), c(102, 59, 148), c(67, 28, 118), c(34, 28, 105)];
const DEFAULT_WALL: [Rgb888; 2] = [c(42, 170, 138), c(26, 187, 43)];

// ── Scenery tables ──────────────────────────────────────────────────────────

const CITY: &[(SceneryKind, u8)] = &[
    (Skyscraper, 1),
    (OfficeTower, 1),
    (Building, 1),
    (Billboard, 1),
    (RadioTower, 1),
];

const DESERT: &[(SceneryKind, u8)] = &[
    (Cactus, 1),
    (WindTurbine, 1),
    (RadioTower, 1),
    (Monument, 1),
    (WaterTower, 1),
    (Billboard, 1),
    (Pyramid, 2),
    (TunnelIntro, 1),
    (TunnelOutro, 1),
];

const RURAL: &[(SceneryKind, u8)] = &[
    (Tree, 1),
    (Bush, 1),
    (StreetLight, 1),
    (Building, 1),
    (Barn, 1),
    (Windmill, 1),
    (WaterTower, 1),
    (Church, 1),
    (Billboard, 1),
    (PalmTree, 1),
];

const MILITARY: &[(SceneryKind, u8)] = &[
    (RadioTower, 1),
    (Factory, 1),
    (WaterTower, 1),
    (Bush, 1),
    (WindTurbine, 1),
    (Billboard, 1),
    (Building, 1),
];

const VOLCANIC: &[(SceneryKind, u8)] = &[
    (Volcano, 2),
    (RadioTower, 1),
    (Factory, 1),
    (Building, 1),
    (Billboard, 1),
    (TunnelIntro, 1),
    (TunnelOutro, 1),
];

const WINTER: &[(SceneryKind, u8)] = &[
    (Tree, 1),
    (Church, 1),
    (Barn, 1),
    (Windmill, 1),
    (ClockTower, 1),
    (WaterTower, 1),
    (Factory, 1),
    (WindTurbine, 1),
];

const GENERAL: &[(SceneryKind, u8)] = &[
    (Tree, 1),
    (Bush, 1),
    (StreetLight, 1),
    (Building, 1),
    (WaterTower, 1),
    (RadioTower, 1),
    (Billboard, 1),
    (Factory, 1),
    (Church, 1),
    (Barn, 1),
    (Windmill, 1),
    (ClockTower, 1),
    (PalmTree, 1),
    (WindTurbine, 1),
    (Monument, 1),
];

// ── Palettes ────────────────────────────────────────────────────────────────

impl Theme {
    pub fn spec(self) -> ThemeSpec {
        match self {
            Theme::Day => ThemeSpec {
                hill_height: 8.0,
                features: Features { sun: true, trees: true, bushes: true, clouds: true, ..Features::default() },
                sun_size_mod: 3,
                sun: YELLOW_SUN,
                grass: [c(0, 255, 0), c(0, 200, 0)],
                edge: [c(255, 255, 255), c(200, 200, 200)],
                hills: MEADOW_HILLS,
                sky: [c(135, 206, 235), c(176, 224, 230), c(220, 220, 220), c(255, 255, 255)],
                tunnel_wall: DEFAULT_WALL,
                tunnel_edge: [c(0, 0, 0), c(255, 255, 255)],
                scenery: RURAL,
                filtered: false,
            },
            Theme::Night => ThemeSpec {
                hill_height: 8.0,
                features: Features {
                    moon: true,
                    stars: true,
                    rain: true,
                    trees: true,
                    bushes: true,
                    street_lights: true,
                    signs: true,
                    ..Features::default()
                },
                sun_size_mod: 0,
                sun: YELLOW_SUN,
                grass: [c(0, 100, 0), c(0, 80, 0)],
                edge: [c(150, 150, 150), c(100, 100, 100)],
                hills: DUSK_HILLS,
                sky: [c(25, 25, 112), c(72, 61, 139), c(47, 79, 79), c(0, 0, 0)],
                tunnel_wall: DEFAULT_WALL,
                tunnel_edge: [c(235, 123, 120), c(237, 191, 118)],
                scenery: GENERAL,
                filtered: true,
            },
            Theme::StarryNight => ThemeSpec {
                hill_height: 8.0,
                features: Features {
                    moon: true,
                    stars: true,
                    rain: true,
                    trees: true,
                    bushes: true,
                    street_lights: true,
                    signs: true,
                    ..Features::default()
                },
                sun_size_mod: 0,
                sun: YELLOW_SUN,
                grass: [c(0, 60, 0), c(0, 40, 0)],
                edge: [c(120, 120, 120), c(80, 80, 80)],
                hills: DUSK_HILLS,
                sky: [c(75, 0, 130), c(72, 61, 139), c(25, 25, 112), c(0, 0, 0)],
                tunnel_wall: [c(0, 60, 0), c(0, 40, 0)],
                tunnel_edge: [c(51, 51, 68), c(255, 255, 0)],
                scenery: GENERAL,
                filtered: true,
            },
            Theme::Vice => ThemeSpec {
                hill_height: 3.0,
                features: Features { sun: true, street_lights: true, signs: true, ..Features::default() },
                sun_size_mod: 0,
                sun: YELLOW_SUN,
                grass: [c(255, 20, 147), c(255, 0, 255)],
                edge: [c(0, 255, 255), c(255, 255, 0)],
                hills: MEADOW_HILLS,
                sky: [c(255, 20, 147), c(199, 21, 133), c(128, 0, 128), c(75, 0, 130)],
                tunnel_wall: [c(255, 20, 147), c(75, 0, 130)],
                tunnel_edge: [c(51, 51, 68), c(255, 255, 0)],
                scenery: CITY,
                filtered: false,
            },
            Theme::Desert => ThemeSpec {
                hill_height: 0.0,
                features: Features { sun: true, clouds: true, ..Features::default() },
                sun_size_mod: 4,
                sun: YELLOW_SUN,
                grass: [c(238, 203, 173), c(222, 184, 135)],
                edge: [c(160, 82, 45), c(210, 180, 140)],
                hills: [c(243, 112, 49), c(247, 167, 65), c(239, 222, 99), c(197, 153, 96)],
                sky: [c(255, 165, 0), c(255, 140, 0), c(255, 215, 0), c(255, 255, 224)],
                tunnel_wall: [c(245, 191, 66), c(160, 82, 45)],
                tunnel_edge: [c(255, 255, 255), c(0, 0, 0)],
                scenery: DESERT,
                filtered: false,
            },
            Theme::DayToo => ThemeSpec {
                hill_height: 8.0,
                features: Features { sun: true, trees: true, bushes: true, clouds: true, ..Features::default() },
                sun_size_mod: 0,
                sun: YELLOW_SUN,
                grass: [c(0, 255, 0), c(0, 200, 0)],
                edge: [c(255, 255, 255), c(200, 200, 200)],
                hills: MEADOW_HILLS,
                sky: [c(0, 191, 255), c(135, 206, 250), c(176, 224, 230), c(240, 248, 255)],
                tunnel_wall: DEFAULT_WALL,
                tunnel_edge: [c(0, 0, 0), c(255, 255, 255)],
                scenery: RURAL,
                filtered: false,
            },
            Theme::Snow => ThemeSpec {
                hill_height: 8.0,
                features: Features { sun: true, trees: true, clouds: true, ..Features::default() },
                sun_size_mod: 6,
                sun: YELLOW_SUN,
                grass: [c(255, 250, 250), c(220, 220, 220)],
                edge: [c(169, 169, 169), c(192, 192, 192)],
                hills: [c(106, 112, 114), c(92, 103, 106), c(46, 70, 78), c(46, 74, 82)],
                sky: [c(128, 128, 128), c(169, 169, 169), c(211, 211, 211), c(248, 248, 255)],
                tunnel_wall: [c(240, 248, 255), c(176, 196, 222)],
                tunnel_edge: [c(155, 51, 0), c(255, 255, 0)],
                scenery: WINTER,
                filtered: false,
            },
            Theme::F32 => ThemeSpec {
                hill_height: 8.0,
                features: Features {
                    sun: true,
                    trees: true,
                    bushes: true,
                    street_lights: true,
                    signs: true,
                    ..Features::default()
                },
                sun_size_mod: 6,
                sun: YELLOW_SUN,
                grass: [c(85, 107, 47), c(107, 142, 35)],
                edge: [c(105, 105, 105), c(128, 128, 128)],
                hills: [c(50, 50, 55), c(60, 60, 105), c(100, 100, 120), c(115, 115, 145)],
                sky: [c(85, 107, 47), c(107, 142, 35), c(128, 128, 128), c(169, 169, 169)],
                tunnel_wall: [c(85, 107, 47), c(107, 142, 35)],
                tunnel_edge: [c(51, 51, 68), c(255, 255, 0)],
                scenery: MILITARY,
                filtered: false,
            },
            Theme::Red => ThemeSpec {
                hill_height: 2.0,
                features: Features { sun: true, bushes: true, ..Features::default() },
                sun_size_mod: 0,
                sun: [c(255, 200, 0), c(250, 150, 0)],
                grass: [c(139, 0, 0), c(178, 34, 34)],
                edge: [c(255, 99, 71), c(255, 69, 0)],
                hills: [c(156, 0, 1), c(126, 24, 7), c(94, 18, 3), c(74, 15, 0)],
                sky: [c(220, 20, 60), c(178, 34, 34), c(139, 0, 0), c(0, 0, 0)],
                tunnel_wall: [c(139, 69, 19), c(205, 92, 92)],
                tunnel_edge: [c(255, 0, 0), c(255, 255, 255)],
                scenery: VOLCANIC,
                filtered: false,
            },
            Theme::Cyber => ThemeSpec {
                hill_height: 6.0,
                features: Features {
                    stars: true,
                    bushes: true,
                    street_lights: true,
                    signs: true,
                    ..Features::default()
                },
                sun_size_mod: 2,
                sun: YELLOW_SUN,
                grass: [c(0, 255, 127), c(0, 128, 128)],
                edge: [c(0, 255, 255), c(255, 0, 255)],
                hills: [c(0, 100, 150), c(0, 150, 200), c(0, 200, 255), c(50, 150, 255)],
                sky: [c(0, 0, 50), c(0, 50, 100), c(0, 100, 200), c(0, 150, 255)],
                tunnel_wall: [c(0, 255, 127), c(0, 128, 128)],
                tunnel_edge: [c(0, 255, 255), c(255, 0, 255)],
                scenery: GENERAL,
                filtered: true,
            },
            Theme::Sunset => ThemeSpec {
                hill_height: 7.0,
                features: Features {
                    sun: true,
                    trees: true,
                    bushes: true,
                    signs: true,
                    clouds: true,
                    ..Features::default()
                },
                sun_size_mod: 2,
                sun: YELLOW_SUN,
                grass: [c(100, 80, 0), c(150, 120, 50)],
                edge: [c(255, 100, 0), c(255, 200, 100)],
                hills: [c(200, 100, 50), c(255, 150, 100), c(255, 200, 150), c(255, 180, 120)],
                sky: [c(255, 150, 50), c(255, 100, 100), c(200, 50, 150), c(100, 0, 100)],
                tunnel_wall: [c(100, 80, 0), c(150, 120, 50)],
                tunnel_edge: [c(255, 100, 0), c(255, 200, 100)],
                scenery: GENERAL,
                filtered: true,
            },
            Theme::Ocean => ThemeSpec {
                hill_height: 5.0,
                features: Features { sun: true, bushes: true, clouds: true, ..Features::default() },
                sun_size_mod: 4,
                sun: [c(0, 155, 255), c(0, 200, 255)],
                grass: [c(0, 100, 100), c(0, 150, 150)],
                edge: [c(0, 200, 200), c(100, 255, 255)],
                hills: [c(0, 50, 100), c(0, 80, 150), c(0, 120, 200), c(50, 150, 255)],
                sky: [c(135, 206, 250), c(70, 130, 180), c(25, 25, 112), c(0, 0, 139)],
                tunnel_wall: [c(0, 100, 100), c(0, 150, 150)],
                tunnel_edge: [c(0, 200, 200), c(100, 255, 255)],
                scenery: GENERAL,
                filtered: true,
            },
            Theme::Neon => ThemeSpec {
                hill_height: 4.0,
                features: Features {
                    stars: true,
                    bushes: true,
                    street_lights: true,
                    signs: true,
                    ..Features::default()
                },
                sun_size_mod: 3,
                sun: [c(255, 205, 0), c(205, 200, 0)],
                grass: [c(255, 0, 255), c(75, 0, 130)],
                edge: [c(255, 0, 255), c(0, 255, 0)],
                hills: [c(255, 0, 150), c(150, 255, 0), c(255, 255, 0), c(255, 100, 200)],
                sky: [c(0, 0, 0), c(50, 0, 50), c(100, 0, 100), c(255, 0, 255)],
                tunnel_wall: [c(255, 0, 255), c(75, 0, 130)],
                tunnel_edge: [c(255, 0, 255), c(0, 255, 0)],
                scenery: GENERAL,
                filtered: true,
            },
            Theme::Cityscape => ThemeSpec {
                hill_height: 0.0,
                features: Features { sun: true, street_lights: true, signs: true, ..Features::default() },
                sun_size_mod: 3,
                sun: [c(255, 155, 0), c(255, 100, 0)],
                grass: [c(40, 40, 40), c(60, 60, 60)],
                edge: [c(255, 255, 0), c(255, 255, 255)],
                hills: [c(80, 80, 90), c(100, 100, 110), c(60, 60, 70), c(120, 120, 130)],
                sky: [c(255, 165, 0), c(255, 69, 0), c(139, 0, 139), c(25, 25, 112)],
                tunnel_wall: [c(40, 40, 40), c(60, 60, 60)],
                tunnel_edge: [c(255, 255, 0), c(255, 255, 255)],
                scenery: GENERAL,
                filtered: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_visits_every_theme() {
        let mut t = Theme::Day;
        for expected in Theme::ALL.iter().skip(1) {
            t = t.next();
            assert_eq!(t, *expected);
        }
        assert_eq!(t.next(), Theme::Day);
    }

    #[test]
    fn every_table_can_spawn() {
        for t in Theme::ALL {
            let s = t.spec();
            let total: u32 = s
                .scenery
                .iter()
                .filter(|(k, _)| !s.filtered || s.features.allows(*k))
                .map(|&(_, w)| w as u32)
                .sum();
            assert!(total > 0, "{t:?}");
        }
    }

    #[test]
    fn only_desert_and_red_dig_tunnels() {
        for t in Theme::ALL {
            let digs = t.spec().scenery.iter().any(|(k, _)| *k == TunnelIntro);
            assert_eq!(digs, matches!(t, Theme::Desert | Theme::Red), "{t:?}");
        }
    }
}
