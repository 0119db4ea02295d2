#![allow(dead_code)]

use chrono::NaiveDate;
use surveysim::ephemeris::Ephemeris;
use surveysim::models::{ModifiedJulianDate, NightStats, Program, Tile};

pub const NIGHT_MJD: f64 = 58850.0;

/// LST sweeps 360 degrees per day starting at `NIGHT_MJD`; every object is
/// at a fixed altitude.
#[derive(Debug, Clone, Copy)]
pub struct LinearEphemeris {
    pub altitude: f64,
}

impl Default for LinearEphemeris {
    fn default() -> Self {
        Self { altitude: 60.0 }
    }
}

impl Ephemeris for LinearEphemeris {
    fn mjd_to_lst(&self, mjd: ModifiedJulianDate) -> f64 {
        (mjd.value() - NIGHT_MJD) * 360.0
    }

    fn altaz(&self, _ra: f64, _dec: f64, _lst: f64) -> (f64, f64) {
        (self.altitude, 180.0)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Night with twilights at LST 36 and 180 under [`LinearEphemeris`].
pub fn night(moonrise: f64, moonset: f64, fraction: f64) -> NightStats {
    NightStats {
        moonrise: moonrise.into(),
        moonset: moonset.into(),
        evening_twilight: (NIGHT_MJD + 0.1).into(),
        morning_twilight: (NIGHT_MJD + 0.5).into(),
        midnight: (NIGHT_MJD + 0.3).into(),
        moon_ra: 0.0,
        moon_dec: 0.0,
        moon_illuminated_fraction: fraction,
        date_tag: "20200102".into(),
    }
}

/// Moon neither rises nor sets.
pub fn moonless_night(fraction: f64) -> NightStats {
    night(-1.0, -1.0, fraction)
}

/// Tile with an explicit LST window.
pub fn tile(id: i32, dec: f64, program: Program, lst_min: f64, lst_max: f64) -> Tile {
    Tile {
        lst_min,
        lst_max,
        ..Tile::from_catalog(id, 0.0, dec, 0, 0.01, program, 1, 600.0, 0.0)
    }
}

/// Deterministic spread of tiles over the sky, alternating programs.
pub fn tile_grid(n: i32) -> Vec<Tile> {
    (0..n)
        .map(|i| {
            let program = match i % 3 {
                0 => Program::Dark,
                1 => Program::Grey,
                _ => Program::Bright,
            };
            let ra = (i as f64 * 37.0) % 360.0;
            let dec = -25.0 + (i as f64 * 13.0) % 110.0;
            Tile::from_catalog(i + 1, ra, dec, i % 4, 0.02, program, 1, 900.0, 0.0)
        })
        .collect()
}
