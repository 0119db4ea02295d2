//! Survey configuration file support.
//!
//! The configuration is read from a TOML file with the layout:
//!
//! ```toml
//! [survey]
//! first_day = "2020-01-01"
//! last_day = "2020-03-01"
//! output_path = "output"
//!
//! [site]
//! latitude = 31.964
//! longitude = -111.5999
//! utc_offset_hours = -7.0
//!
//! [weather]
//! time_step_minutes = 5.0
//! seed = 123
//!
//! [planner]
//! legacy_moonless_window = false
//! ```
//!
//! Every section except `[survey]` is optional.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ephemeris::Site;
use crate::error::{Result, SurveyError};
use crate::weather::{SeeingModel, TransparencyModel, DOME_CLOSED_PROBABILITIES};

/// File name searched by [`SurveyConfig::from_default_location`].
pub const CONFIG_FILE_NAME: &str = "surveysim.toml";

/// Complete survey configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    pub survey: SurveySettings,
    #[serde(default)]
    pub site: Site,
    #[serde(default)]
    pub weather: WeatherSettings,
    #[serde(default)]
    pub planner: PlannerSettings,
}

/// Survey date bounds and output location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySettings {
    /// The survey starts on the evening of this date.
    pub first_day: NaiveDate,
    /// The survey stops on the morning of this date.
    pub last_day: NaiveDate,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

/// Weather simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSettings {
    #[serde(default = "default_time_step_minutes")]
    pub time_step_minutes: f64,
    /// Random seed; generation is unreproducible when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Probability that the dome stays closed all night, January first.
    #[serde(default = "default_dome_closed_probabilities")]
    pub dome_closed_probabilities: [f64; 12],
    #[serde(default)]
    pub seeing: SeeingModel,
    #[serde(default)]
    pub transparency: TransparencyModel,
}

/// Nightly planner settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Reproduce the legacy planner, which found no dark time on nights
    /// when the moon neither rises nor sets.
    #[serde(default)]
    pub legacy_moonless_window: bool,
}

fn default_output_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_time_step_minutes() -> f64 {
    5.0
}

fn default_dome_closed_probabilities() -> [f64; 12] {
    DOME_CLOSED_PROBABILITIES
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            time_step_minutes: default_time_step_minutes(),
            seed: None,
            dome_closed_probabilities: default_dome_closed_probabilities(),
            seeing: SeeingModel::default(),
            transparency: TransparencyModel::default(),
        }
    }
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            survey: SurveySettings {
                first_day: NaiveDate::from_ymd_opt(2019, 12, 1).unwrap_or_default(),
                last_day: NaiveDate::from_ymd_opt(2024, 11, 30).unwrap_or_default(),
                output_path: default_output_path(),
            },
            site: Site::default(),
            weather: WeatherSettings::default(),
            planner: PlannerSettings::default(),
        }
    }
}

impl SurveyConfig {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SurveyConfig = toml::from_str(content).map_err(|e| {
            SurveyError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load survey configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(SurveyConfig)` if the file was read, parsed and validated
    /// * `Err(SurveyError::Configuration)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            SurveyError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    /// Load survey configuration from the default location.
    ///
    /// Searches for `surveysim.toml` in:
    /// 1. Current directory
    /// 2. `surveysim/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            Path::new("surveysim").join(CONFIG_FILE_NAME),
            Path::new("..").join(CONFIG_FILE_NAME),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Loading survey configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Err(SurveyError::configuration(format!(
            "No {} found in standard locations",
            CONFIG_FILE_NAME
        )))
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.survey.first_day >= self.survey.last_day {
            return Err(SurveyError::configuration(format!(
                "first_day ({}) must be before last_day ({})",
                self.survey.first_day, self.survey.last_day
            )));
        }

        if !(self.weather.time_step_minutes > 0.0) {
            return Err(SurveyError::configuration(format!(
                "time_step_minutes must be positive, got {}",
                self.weather.time_step_minutes
            )));
        }

        if let Some((month, p)) = self
            .weather
            .dome_closed_probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(SurveyError::configuration(format!(
                "dome_closed_probabilities[{}] = {} is not a probability",
                month, p
            )));
        }

        self.weather.seeing.validate()?;
        self.weather.transparency.validate()?;

        if !(-90.0..=90.0).contains(&self.site.latitude) {
            return Err(SurveyError::configuration(format!(
                "site latitude {} outside [-90, 90]",
                self.site.latitude
            )));
        }

        Ok(())
    }

    /// Resolve an output file name.
    ///
    /// Relative names are placed under `survey.output_path`; absolute paths
    /// are returned unchanged.
    pub fn get_path<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        let name = name.as_ref();
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.survey.output_path.join(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
[survey]
first_day = "2020-01-01"
last_day = "2020-03-01"
"#;

        let config = SurveyConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.survey.first_day, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(config.survey.output_path, PathBuf::from("."));
        assert_eq!(config.weather.time_step_minutes, 5.0);
        assert_eq!(config.weather.seed, None);
        assert_eq!(config.site, Site::kitt_peak());
        assert!(!config.planner.legacy_moonless_window);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[survey]
first_day = "2020-01-01"
last_day = "2020-03-01"
output_path = "/tmp/survey"

[site]
latitude = -30.17
longitude = -70.8
utc_offset_hours = -4.0

[weather]
time_step_minutes = 10.0
seed = 123
dome_closed_probabilities = [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.5, 0.5, 0.1, 0.1, 0.1, 0.1]

[weather.seeing]
median_arcsec = 0.9

[planner]
legacy_moonless_window = true
"#;

        let config = SurveyConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.weather.seed, Some(123));
        assert_eq!(config.weather.time_step_minutes, 10.0);
        assert_eq!(config.weather.dome_closed_probabilities[6], 0.5);
        assert_eq!(config.weather.seeing.median_arcsec, 0.9);
        assert_eq!(config.site.utc_offset_hours, -4.0);
        assert!(config.planner.legacy_moonless_window);
    }

    #[test]
    fn test_rejects_inverted_dates() {
        let toml = r#"
[survey]
first_day = "2020-03-01"
last_day = "2020-01-01"
"#;

        let err = SurveyConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, SurveyError::Configuration(_)));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut config = SurveyConfig::default();
        config.weather.dome_closed_probabilities[3] = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unparseable_toml() {
        let err = SurveyConfig::from_toml_str("[survey\nfirst_day = 1").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_get_path() {
        let mut config = SurveyConfig::default();
        config.survey.output_path = PathBuf::from("/data/out");
        assert_eq!(config.get_path("weather.json"), PathBuf::from("/data/out/weather.json"));
        assert_eq!(config.get_path("/abs/weather.json"), PathBuf::from("/abs/weather.json"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(SurveyConfig::default().validate().is_ok());
    }
}
