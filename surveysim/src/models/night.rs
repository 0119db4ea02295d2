//! Per-night ephemeris facts supplied to the planner.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ModifiedJulianDate;

/// Ground-truth ephemeris record for one night.
///
/// Moonrise and moonset carry a negative sentinel when the event does not
/// happen during the night. Field aliases accept the keys used by older
/// night-stats exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightStats {
    #[serde(alias = "MJDmoonrise")]
    pub moonrise: ModifiedJulianDate,
    #[serde(alias = "MJDmoonset")]
    pub moonset: ModifiedJulianDate,
    /// End of evening twilight.
    #[serde(alias = "MJDetwi")]
    pub evening_twilight: ModifiedJulianDate,
    /// Start of morning twilight.
    #[serde(alias = "MJDmtwi")]
    pub morning_twilight: ModifiedJulianDate,
    #[serde(alias = "MJDmidnight")]
    pub midnight: ModifiedJulianDate,
    #[serde(alias = "MoonRA")]
    pub moon_ra: f64,
    #[serde(alias = "MoonDEC")]
    pub moon_dec: f64,
    #[serde(alias = "MoonFrac")]
    pub moon_illuminated_fraction: f64,
    /// Night date tag, `YYYYMMDD`.
    #[serde(alias = "dirName")]
    pub date_tag: String,
}

impl NightStats {
    pub fn moon_rises(&self) -> bool {
        self.moonrise.value() > 0.0
    }

    pub fn moon_sets(&self) -> bool {
        self.moonset.value() > 0.0
    }

    /// Calendar date encoded in the date tag, if it is a valid `YYYYMMDD`.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date_tag, "%Y%m%d").ok()
    }
}
