//! Ephemeris seam used by the planner.
//!
//! The planner only needs two pure conversions: MJD to local sidereal time,
//! and equatorial to horizontal coordinates at a given LST. [`SiteEphemeris`]
//! provides a reference implementation using mean sidereal time; precise
//! ephemerides can be plugged in through the [`Ephemeris`] trait.

use serde::{Deserialize, Serialize};

use crate::models::{normalize_lst, ModifiedJulianDate};

/// Kitt Peak latitude, degrees north.
pub const KPNO_LATITUDE_DEG: f64 = 31.0 + (57.0 + 50.3 / 60.0) / 60.0;
/// Kitt Peak longitude, degrees east.
pub const KPNO_LONGITUDE_DEG: f64 = -(111.0 + (35.0 + 59.6 / 60.0) / 60.0);
/// Kitt Peak civil offset from UTC, hours.
pub const KPNO_UTC_OFFSET_HOURS: f64 = -7.0;

/// Conversions the planner needs from an ephemeris library.
pub trait Ephemeris {
    /// Local sidereal time in degrees, in [0, 360).
    fn mjd_to_lst(&self, mjd: ModifiedJulianDate) -> f64;

    /// Altitude and azimuth in degrees of `(ra, dec)` at local sidereal time `lst`.
    fn altaz(&self, ra: f64, dec: f64, lst: f64) -> (f64, f64);
}

/// Observatory location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Geodetic latitude, degrees north.
    pub latitude: f64,
    /// Longitude, degrees east.
    pub longitude: f64,
    /// Civil time offset used to anchor nights at local noon.
    pub utc_offset_hours: f64,
}

impl Site {
    pub fn kitt_peak() -> Self {
        Self {
            latitude: KPNO_LATITUDE_DEG,
            longitude: KPNO_LONGITUDE_DEG,
            utc_offset_hours: KPNO_UTC_OFFSET_HOURS,
        }
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::kitt_peak()
    }
}

/// Mean-sidereal-time ephemeris for a fixed site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteEphemeris {
    site: Site,
}

impl SiteEphemeris {
    pub fn new(site: Site) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }
}

impl Default for SiteEphemeris {
    fn default() -> Self {
        Self::new(Site::kitt_peak())
    }
}

impl Ephemeris for SiteEphemeris {
    fn mjd_to_lst(&self, mjd: ModifiedJulianDate) -> f64 {
        // IAU 1982 mean sidereal time, linear term only
        let days_since_j2000 = mjd.value() - 51544.5;
        let gmst = 280.460_618_37 + 360.985_647_366_29 * days_since_j2000;
        normalize_lst(gmst + self.site.longitude)
    }

    fn altaz(&self, ra: f64, dec: f64, lst: f64) -> (f64, f64) {
        let ha = (lst - ra).to_radians();
        let dec = dec.to_radians();
        let lat = self.site.latitude.to_radians();

        let sin_alt = dec.sin() * lat.sin() + dec.cos() * lat.cos() * ha.cos();
        let alt = sin_alt.clamp(-1.0, 1.0).asin();

        // Azimuth measured from north through east
        let y = -dec.cos() * ha.sin();
        let x = dec.sin() * lat.cos() - dec.cos() * lat.sin() * ha.cos();
        let az = normalize_lst(y.atan2(x).to_degrees());

        (alt.to_degrees(), az)
    }
}
