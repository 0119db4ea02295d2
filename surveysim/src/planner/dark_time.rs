//! Dark-time windows for one night.
//!
//! A night has up to two moon-free LST intervals between evening and
//! morning twilight. Outside them the sky is GREY or BRIGHT depending on
//! the moon's illumination and altitude at local midnight.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ephemeris::Ephemeris;
use crate::models::{ModifiedJulianDate, NightStats};

/// Moon illuminated fraction below which moonlit time is GREY.
pub const GREY_MAX_ILLUMINATION: f64 = 0.2;

/// Moon `altitude x illuminated fraction` (degrees) below which moonlit
/// time is GREY.
pub const GREY_MAX_ALTITUDE_ILLUMINATION: f64 = 12.0;

/// Sky brightness class at a given LST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SkyBrightness {
    Dark,
    Grey,
    Bright,
}

impl SkyBrightness {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkyBrightness::Dark => "DARK",
            SkyBrightness::Grey => "GREY",
            SkyBrightness::Bright => "BRIGHT",
        }
    }
}

impl fmt::Display for SkyBrightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Brightness of the night outside its dark windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoonPhaseClass {
    Grey,
    Bright,
}

impl From<MoonPhaseClass> for SkyBrightness {
    fn from(class: MoonPhaseClass) -> Self {
        match class {
            MoonPhaseClass::Grey => SkyBrightness::Grey,
            MoonPhaseClass::Bright => SkyBrightness::Bright,
        }
    }
}

/// Moon events during the night, decoded from the sentinel encoding where a
/// non-positive MJD means the event does not happen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoonEvents {
    NeitherRisesNorSets,
    RisesOnly { rise: ModifiedJulianDate },
    SetsOnly { set: ModifiedJulianDate },
    RisesAndSets { rise: ModifiedJulianDate, set: ModifiedJulianDate },
}

impl MoonEvents {
    pub fn from_night(night: &NightStats) -> Self {
        match (night.moon_rises(), night.moon_sets()) {
            (false, false) => MoonEvents::NeitherRisesNorSets,
            (true, false) => MoonEvents::RisesOnly {
                rise: night.moonrise,
            },
            (false, true) => MoonEvents::SetsOnly { set: night.moonset },
            (true, true) => MoonEvents::RisesAndSets {
                rise: night.moonrise,
                set: night.moonset,
            },
        }
    }
}

/// How to treat a night on which the moon neither rises nor sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoonlessNightPolicy {
    /// The whole night between twilights is dark.
    #[default]
    FullNight,
    /// No dark time at all, as the legacy planner produced.
    NoDarkTime,
}

/// Open LST interval `(begin, end)` in degrees.
///
/// `begin > end` is allowed and describes the interval as written; no wrap
/// through 0/360 is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LstWindow {
    pub begin: f64,
    pub end: f64,
}

impl LstWindow {
    /// A window with both bounds positive. An LST of exactly 0.0 collides
    /// with the legacy "absent" encoding and yields `None`.
    pub fn new(begin: f64, end: f64) -> Option<Self> {
        (begin > 0.0 && end > 0.0).then_some(Self { begin, end })
    }

    /// Strict containment, `begin < lst < end`.
    ///
    /// A window with `begin > end` (one that crosses LST 0) contains nothing.
    pub fn contains(&self, lst: f64) -> bool {
        self.begin < lst && lst < self.end
    }
}

/// Dark windows and moon class for one night.
///
/// Computed once per night by [`compute_dark_windows`] and passed by value
/// to everything that asks whether an LST is dark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DarkWindowState {
    pub dark1: Option<LstWindow>,
    pub dark2: Option<LstWindow>,
    pub moon_phase_class: MoonPhaseClass,
}

impl DarkWindowState {
    /// Brightness at `lst`.
    pub fn is_dark(&self, lst: f64) -> SkyBrightness {
        is_dark(lst, self)
    }

    pub fn windows(&self) -> impl Iterator<Item = &LstWindow> {
        self.dark1.iter().chain(self.dark2.iter())
    }

    pub fn has_dark_time(&self) -> bool {
        self.dark1.is_some() || self.dark2.is_some()
    }

    /// `[dark1_begin, dark1_end, dark2_begin, dark2_end]` with -1.0 for
    /// absent windows.
    pub fn as_sentinels(&self) -> [f64; 4] {
        let bounds = |w: Option<LstWindow>| w.map_or((-1.0, -1.0), |w| (w.begin, w.end));
        let (b1, e1) = bounds(self.dark1);
        let (b2, e2) = bounds(self.dark2);
        [b1, e1, b2, e2]
    }
}

/// DARK if `lst` lies strictly inside a dark window, otherwise the night's
/// moon phase class.
pub fn is_dark(lst: f64, state: &DarkWindowState) -> SkyBrightness {
    if state.windows().any(|w| w.contains(lst)) {
        SkyBrightness::Dark
    } else {
        state.moon_phase_class.into()
    }
}

/// GREY or BRIGHT from the moon's illumination and its altitude at local
/// midnight.
pub fn classify_moon_phase<E: Ephemeris + ?Sized>(night: &NightStats, ephemeris: &E) -> MoonPhaseClass {
    let lst_midnight = ephemeris.mjd_to_lst(night.midnight);
    let (altitude, _) = ephemeris.altaz(night.moon_ra, night.moon_dec, lst_midnight);
    let fraction = night.moon_illuminated_fraction;

    if fraction < GREY_MAX_ILLUMINATION || altitude * fraction < GREY_MAX_ALTITUDE_ILLUMINATION {
        MoonPhaseClass::Grey
    } else {
        MoonPhaseClass::Bright
    }
}

/// Dark windows for `night`.
pub fn compute_dark_windows<E: Ephemeris + ?Sized>(
    night: &NightStats,
    ephemeris: &E,
    moonless: MoonlessNightPolicy,
) -> DarkWindowState {
    let window = |begin: ModifiedJulianDate, end: ModifiedJulianDate| {
        LstWindow::new(ephemeris.mjd_to_lst(begin), ephemeris.mjd_to_lst(end))
    };
    let etwi = night.evening_twilight;
    let mtwi = night.morning_twilight;

    let (dark1, dark2) = match MoonEvents::from_night(night) {
        MoonEvents::RisesAndSets { rise, set } if rise < etwi => {
            // Moon up at dusk: dark only after it sets
            if set < mtwi {
                (window(set, mtwi), None)
            } else {
                (None, None)
            }
        }
        MoonEvents::RisesAndSets { rise, set } => {
            if rise < mtwi {
                let after_set = if set < mtwi { window(set, mtwi) } else { None };
                (window(etwi, rise), after_set)
            } else {
                (window(etwi, mtwi), None)
            }
        }
        MoonEvents::RisesOnly { rise } => {
            if rise < etwi {
                (None, None)
            } else {
                (window(etwi, rise), None)
            }
        }
        MoonEvents::SetsOnly { set } => {
            if set < mtwi {
                (window(set, mtwi), None)
            } else {
                (None, None)
            }
        }
        MoonEvents::NeitherRisesNorSets => match moonless {
            MoonlessNightPolicy::FullNight => (window(etwi, mtwi), None),
            MoonlessNightPolicy::NoDarkTime => (None, None),
        },
    };

    DarkWindowState {
        dark1,
        dark2,
        moon_phase_class: classify_moon_phase(night, ephemeris),
    }
}
