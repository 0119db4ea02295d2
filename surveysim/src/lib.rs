//! # surveysim
//!
//! Weather simulation and nightly observability planning for a fixed-field
//! spectroscopic survey.
//!
//! ## Features
//!
//! - **Weather**: seeded simulation of dome closures, seeing and
//!   transparency on a regular time grid, with nearest-sample lookup
//! - **Planning**: per-night dark-time windows, tile eligibility and
//!   priority ranking from night ephemeris facts
//! - **Persistence**: checksummed JSON table files for weather and plans
//! - **Time Handling**: Modified Julian Date conversions
//!
//! ## Architecture
//!
//! - [`weather`]: weather table generation, query and persistence
//! - [`planner`]: survey planner, dark windows and nightly plans
//! - [`ephemeris`]: the LST / alt-az seam and a mean-sidereal-time site model
//! - [`models`]: tiles, night stats, observation records, MJD
//! - [`io`]: table files, the tile catalog and JSON loaders
//! - [`config`]: TOML survey configuration
//!
//! Library code logs through the `log` facade; binaries choose the backend.

pub mod config;
pub mod ephemeris;
pub mod error;
pub mod io;
pub mod models;
pub mod planner;
pub mod weather;

pub use config::SurveyConfig;
pub use ephemeris::{Ephemeris, Site, SiteEphemeris};
pub use error::{Result, SurveyError};
pub use models::{ModifiedJulianDate, NightStats, ObservedTile, Program, Tile};
pub use planner::{DarkWindowState, NightPlan, SkyBrightness, SurveyPlanner};
pub use weather::{Weather, WeatherOptions, WeatherRow};
