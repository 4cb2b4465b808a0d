//! Cavern themes. Each one carries its nebula and rock palettes and the
//! shape of the terrain noise; the theme in force is picked by distance.

use embedded_graphics::pixelcolor::Rgb888;

use crate::noise::Perlin;

/// Terrain never grows past this many rows from either edge.
pub const MAX_WALL: i32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Theme {
    SpaceBlue,
    VolcanicRed,
    ForestGreen,
    IceCyan,
    DesertOrange,
    PurpleNebula,
}

pub struct ThemeSpec {
    pub nebula: [Rgb888; 3],
    pub floor: Rgb888,
    pub ceiling: Rgb888,
    pub highlight: Rgb888,
    pub amplitude: f32,
    pub frequency: f32,
    pub roughness: f32,
    pub floor_bias: f32,
    pub ceiling_bias: f32,
    pub threshold: f32,
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgb888 {
    Rgb888::new(r, g, b)
}

static SPECS: [ThemeSpec; 6] = [
    // Rolling hills.
    ThemeSpec {
        nebula: [rgb(60, 40, 120), rgb(80, 60, 180), rgb(120, 80, 200)],
        floor: rgb(120, 80, 60),
        ceiling: rgb(100, 100, 120),
        highlight: rgb(220, 180, 120),
        amplitude: 3.0,
        frequency: 0.1,
        roughness: 1.0,
        floor_bias: 0.0,
        ceiling_bias: 0.0,
        threshold: 0.0,
    },
    // Jagged peaks.
    ThemeSpec {
        nebula: [rgb(120, 40, 40), rgb(180, 60, 40), rgb(200, 80, 60)],
        floor: rgb(140, 70, 30),
        ceiling: rgb(120, 60, 40),
        highlight: rgb(255, 150, 80),
        amplitude: 5.0,
        frequency: 0.15,
        roughness: 2.0,
        floor_bias: 1.0,
        ceiling_bias: -1.0,
        threshold: 1000.0,
    },
    ThemeSpec {
        nebula: [rgb(40, 120, 40), rgb(60, 160, 80), rgb(80, 180, 100)],
        floor: rgb(60, 100, 40),
        ceiling: rgb(80, 120, 60),
        highlight: rgb(150, 220, 120),
        amplitude: 2.0,
        frequency: 0.08,
        roughness: 0.5,
        floor_bias: -0.5,
        ceiling_bias: 0.5,
        threshold: 2000.0,
    },
    // Crystalline.
    ThemeSpec {
        nebula: [rgb(60, 120, 180), rgb(80, 160, 220), rgb(100, 180, 255)],
        floor: rgb(120, 140, 160),
        ceiling: rgb(140, 160, 180),
        highlight: rgb(200, 240, 255),
        amplitude: 4.0,
        frequency: 0.2,
        roughness: 1.8,
        floor_bias: 0.5,
        ceiling_bias: -0.5,
        threshold: 3000.0,
    },
    // Long dunes.
    ThemeSpec {
        nebula: [rgb(180, 120, 60), rgb(220, 160, 80), rgb(255, 180, 100)],
        floor: rgb(160, 120, 80),
        ceiling: rgb(140, 100, 60),
        highlight: rgb(255, 220, 150),
        amplitude: 6.0,
        frequency: 0.05,
        roughness: 0.3,
        floor_bias: 2.0,
        ceiling_bias: 1.0,
        threshold: 4000.0,
    },
    ThemeSpec {
        nebula: [rgb(120, 60, 160), rgb(160, 80, 200), rgb(200, 100, 240)],
        floor: rgb(80, 40, 120),
        ceiling: rgb(100, 60, 140),
        highlight: rgb(180, 120, 255),
        amplitude: 7.0,
        frequency: 0.25,
        roughness: 2.5,
        floor_bias: 1.5,
        ceiling_bias: -1.5,
        threshold: 5000.0,
    },
];

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::SpaceBlue,
        Theme::VolcanicRed,
        Theme::ForestGreen,
        Theme::IceCyan,
        Theme::DesertOrange,
        Theme::PurpleNebula,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static ThemeSpec {
        &SPECS[self.index()]
    }

    /// Highest theme whose threshold has been reached.
    pub fn for_distance(distance: f32) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|t| t.spec().threshold <= distance)
            .unwrap_or(Theme::SpaceBlue)
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

/// Raw floor and ceiling noise for one column, before bias and clamping.
fn wall_noise(spec: &ThemeSpec, perlin: &Perlin, nx: f32) -> (f32, f32) {
    let mut floor = perlin.noise(nx, 0.0) * spec.amplitude;
    let mut ceiling = perlin.noise(nx, 10.0) * spec.amplitude;
    if spec.roughness > 1.0 {
        let extra = spec.roughness - 1.0;
        floor += perlin.noise(nx * 2.0, 0.5) * extra;
        ceiling += perlin.noise(nx * 2.0, 10.5) * extra;
    }
    (floor, ceiling)
}

impl ThemeSpec {
    fn column(&self, x: i32, offset: f32) -> f32 {
        (x as f32 + offset * 50.0) * self.frequency
    }

    /// Floor and ceiling thickness at column `x`, each in `[1, MAX_WALL]`.
    pub fn walls(&self, perlin: &Perlin, x: i32, offset: f32) -> (i32, i32) {
        let (floor, ceiling) = wall_noise(self, perlin, self.column(x, offset));
        (
            ((floor + 3.0 + self.floor_bias) as i32).clamp(1, MAX_WALL),
            ((ceiling + 3.0 + self.ceiling_bias) as i32).clamp(1, MAX_WALL),
        )
    }

    /// Rows of the glint on the floor and ceiling at column `x`, if the
    /// detail noise lights one up there.
    pub fn highlight(&self, perlin: &Perlin, x: i32, offset: f32) -> Option<(i32, i32)> {
        let detail = perlin.noise((x as f32 + offset * 30.0) * self.frequency * 2.0, 5.0) * self.roughness;
        if detail <= 1.0 {
            return None;
        }
        let (floor, ceiling) = wall_noise(self, perlin, self.column(x, offset));
        Some((
            32 - (floor + 5.0 + self.floor_bias) as i32,
            (ceiling + 5.0 + self.ceiling_bias) as i32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    #[test]
    fn theme_follows_distance() {
        assert_eq!(Theme::for_distance(0.0), Theme::SpaceBlue);
        assert_eq!(Theme::for_distance(999.5), Theme::SpaceBlue);
        assert_eq!(Theme::for_distance(1000.0), Theme::VolcanicRed);
        assert_eq!(Theme::for_distance(4500.0), Theme::DesertOrange);
        assert_eq!(Theme::for_distance(1.0e6), Theme::PurpleNebula);
        assert_eq!(Theme::PurpleNebula.next(), None);
    }

    #[test]
    fn walls_stay_clamped() {
        let perlin = Perlin::new(&mut Rng::new(11));
        for theme in Theme::ALL {
            let spec = theme.spec();
            for step in 0..200 {
                let offset = step as f32 * 0.37;
                for x in 0..32 {
                    let (floor, ceiling) = spec.walls(&perlin, x, offset);
                    assert!((1..=MAX_WALL).contains(&floor), "{theme:?} floor {floor}");
                    assert!((1..=MAX_WALL).contains(&ceiling), "{theme:?} ceiling {ceiling}");
                }
            }
        }
    }
}
