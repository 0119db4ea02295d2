//! Survey tiles: fixed sky fields scheduled until complete.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-width of the LST window around a tile's design hour angle, degrees.
pub const LST_HALF_WINDOW_DEG: f64 = 15.0;

/// Status at or above which a tile is complete and retired from planning.
pub const STATUS_COMPLETED: i32 = 2;

/// Observing program a tile belongs to.
///
/// Only `Dark` is treated specially by the planner; every other tag is in the
/// grey/bright class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Program {
    Dark,
    Grey,
    Bright,
    Other(String),
}

impl Program {
    pub fn is_dark(&self) -> bool {
        matches!(self, Program::Dark)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Program::Dark => "DARK",
            Program::Grey => "GREY",
            Program::Bright => "BRIGHT",
            Program::Other(tag) => tag,
        }
    }
}

impl From<&str> for Program {
    fn from(tag: &str) -> Self {
        // Catalog tags are fixed-width and may carry trailing padding
        match tag.trim().to_ascii_uppercase().as_str() {
            "DARK" => Program::Dark,
            "GREY" | "GRAY" => Program::Grey,
            "BRIGHT" => Program::Bright,
            other => Program::Other(other.to_string()),
        }
    }
}

impl From<String> for Program {
    fn from(tag: String) -> Self {
        Program::from(tag.as_str())
    }
}

impl From<Program> for String {
    fn from(program: Program) -> Self {
        program.as_str().to_string()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static declination-band priority in 1..=8.
pub fn priority_for_dec(dec: f64) -> i32 {
    if dec <= -15.0 {
        1
    } else if dec <= 0.0 {
        2
    } else if dec <= 15.0 {
        3
    } else if dec <= 30.0 {
        4
    } else if dec <= 45.0 {
        5
    } else if dec <= 60.0 {
        6
    } else if dec < 75.0 {
        7
    } else {
        8
    }
}

/// Wrap an angle in degrees into [0, 360).
pub fn normalize_lst(lst: f64) -> f64 {
    let wrapped = lst.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// One candidate field of the survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: i32,
    pub ra: f64,
    pub dec: f64,
    pub pass_number: i32,
    pub dust_extinction: f64,
    pub program: Program,
    pub obs_conditions: i16,
    /// Twice the nominal exposure time (bright-time assumption).
    pub max_exposure_len: f64,
    pub lst_min: f64,
    pub lst_max: f64,
    pub priority: i32,
    pub status: i32,
}

impl Tile {
    /// Build a tile from its catalog entry, deriving the LST window,
    /// exposure cap and declination priority.
    #[allow(clippy::too_many_arguments)]
    pub fn from_catalog(
        id: i32,
        ra: f64,
        dec: f64,
        pass_number: i32,
        dust_extinction: f64,
        program: Program,
        obs_conditions: i16,
        obs_time: f64,
        hour_angle: f64,
    ) -> Self {
        let lst = ra + hour_angle;
        Self {
            id,
            ra,
            dec,
            pass_number,
            dust_extinction,
            program,
            obs_conditions,
            max_exposure_len: 2.0 * obs_time,
            lst_min: normalize_lst(lst - LST_HALF_WINDOW_DEG),
            lst_max: normalize_lst(lst + LST_HALF_WINDOW_DEG),
            priority: priority_for_dec(dec),
            status: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status >= STATUS_COMPLETED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_priority_band_edges() {
        assert_eq!(priority_for_dec(-30.0), 1);
        assert_eq!(priority_for_dec(-15.0), 1);
        assert_eq!(priority_for_dec(-14.9), 2);
        assert_eq!(priority_for_dec(0.0), 2);
        assert_eq!(priority_for_dec(15.0), 3);
        assert_eq!(priority_for_dec(30.0), 4);
        assert_eq!(priority_for_dec(45.0), 5);
        assert_eq!(priority_for_dec(60.0), 6);
        assert_eq!(priority_for_dec(74.9), 7);
        assert_eq!(priority_for_dec(75.0), 8);
        assert_eq!(priority_for_dec(89.0), 8);
    }

    #[test]
    fn test_program_parsing() {
        assert_eq!(Program::from("DARK"), Program::Dark);
        assert_eq!(Program::from("DARK  "), Program::Dark);
        assert_eq!(Program::from("grey"), Program::Grey);
        assert_eq!(Program::from("BRIGHT"), Program::Bright);
        assert_eq!(Program::from("EXTRA"), Program::Other("EXTRA".into()));
        assert!(!Program::from("EXTRA").is_dark());
    }

    #[test]
    fn test_program_serde_as_string() {
        let json = serde_json::to_string(&Program::Dark).unwrap();
        assert_eq!(json, "\"DARK\"");
        let back: Program = serde_json::from_str("\"BRIGHT\"").unwrap();
        assert_eq!(back, Program::Bright);
    }

    #[test]
    fn test_window_wraps_below_zero() {
        let tile = Tile::from_catalog(1, 5.0, 10.0, 0, 0.02, Program::Dark, 1, 1000.0, 0.0);
        assert_eq!(tile.lst_min, 350.0);
        assert_eq!(tile.lst_max, 20.0);
        assert_eq!(tile.max_exposure_len, 2000.0);
        assert_eq!(tile.priority, 3);
        assert_eq!(tile.status, 0);
    }

    #[test]
    fn test_window_wraps_above_360() {
        let tile = Tile::from_catalog(2, 350.0, -20.0, 1, 0.0, Program::Bright, 4, 300.0, 10.0);
        assert_eq!(tile.lst_min, 345.0);
        assert_eq!(tile.lst_max, 15.0);
        assert_eq!(tile.priority, 1);
    }

    #[test]
    fn test_window_edge_at_360_is_zero() {
        let tile = Tile::from_catalog(3, 345.0, 0.0, 0, 0.0, Program::Dark, 1, 1.0, 0.0);
        assert_eq!(tile.lst_max, 0.0);
    }

    proptest! {
        #[test]
        fn prop_normalized_lst_in_range(lst in -1.0e4f64..1.0e4) {
            let wrapped = normalize_lst(lst);
            prop_assert!((0.0..360.0).contains(&wrapped));
        }

        #[test]
        fn prop_priority_in_range(dec in -90.0f64..=90.0) {
            let p = priority_for_dec(dec);
            prop_assert!((1..=8).contains(&p));
        }
    }
}
