//! Simulated observing conditions on a regular time grid.
//!
//! A [`Weather`] table covers the nights `start_date..stop_date`. Night `i`
//! spans 24 hours from local noon of `start_date + i` days, sampled every
//! `86400 / steps_per_day` seconds. Each row holds whether the dome is open,
//! the seeing FWHM in arcseconds and the transparency in [0, 1].
//!
//! Generation draws from a single random stream in a fixed order: one
//! dome-closure draw per night, then the seeing series, then the
//! transparency series. The same seed therefore reproduces the same table.

pub mod atmosphere;

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub use atmosphere::{sample_gaussian_process, SeeingModel, SpectralShape, TransparencyModel};

use crate::config::SurveyConfig;
use crate::error::{Result, SurveyError};
use crate::io::table_file::{read_table, write_table};
use crate::models::{local_noon_on_date, ModifiedJulianDate};

/// `format` tag of weather table files.
pub const WEATHER_FORMAT: &str = "surveysim-weather";

const SECONDS_PER_DAY: f64 = 86400.0;

/// Probability that the dome stays closed for a whole night, by calendar
/// month starting with January.
pub const DOME_CLOSED_PROBABILITIES: [f64; 12] = [
    0.35, 0.35, 0.32, 0.22, 0.16, 0.17, 0.52, 0.55, 0.32, 0.18, 0.24, 0.34,
];

/// Dome-closed probability for `month` (1 = January) from a monthly table.
pub fn dome_closed_probability(probabilities: &[f64; 12], month: u32) -> f64 {
    probabilities[(month.clamp(1, 12) - 1) as usize]
}

/// Number of samples per day for a time step, which must divide a day
/// evenly.
pub fn steps_per_day(time_step: Duration) -> Result<usize> {
    let step_sec = time_step.as_secs_f64();
    if step_sec <= 0.0 {
        return Err(SurveyError::configuration("Time step must be positive."));
    }

    let steps = (SECONDS_PER_DAY / step_sec).round();
    // Same tolerance as numpy.allclose with default rtol/atol
    let covered = steps * step_sec;
    if steps < 1.0 || (covered - SECONDS_PER_DAY).abs() > 1e-8 + 1e-5 * SECONDS_PER_DAY {
        return Err(SurveyError::configuration(
            "Requested time_step does not evenly divide 24 hours.",
        ));
    }

    Ok(steps as usize)
}

/// Parameters for [`Weather::generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherOptions {
    pub time_step: Duration,
    /// Random seed; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Site offset from UTC, used to anchor each night at local noon.
    pub utc_offset_hours: f64,
    pub dome_closed_probabilities: [f64; 12],
    pub seeing: SeeingModel,
    pub transparency: TransparencyModel,
}

impl Default for WeatherOptions {
    fn default() -> Self {
        Self {
            time_step: Duration::from_secs(300),
            seed: None,
            utc_offset_hours: crate::ephemeris::KPNO_UTC_OFFSET_HOURS,
            dome_closed_probabilities: DOME_CLOSED_PROBABILITIES,
            seeing: SeeingModel::default(),
            transparency: TransparencyModel::default(),
        }
    }
}

impl WeatherOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_step(mut self, time_step: Duration) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn from_config(config: &SurveyConfig) -> Result<Self> {
        let time_step = Duration::try_from_secs_f64(config.weather.time_step_minutes * 60.0)
            .map_err(|e| {
                SurveyError::configuration(format!(
                    "invalid time_step_minutes {}: {}",
                    config.weather.time_step_minutes, e
                ))
            })?;

        Ok(Self {
            time_step,
            seed: config.weather.seed,
            utc_offset_hours: config.site.utc_offset_hours,
            dome_closed_probabilities: config.weather.dome_closed_probabilities,
            seeing: config.weather.seeing,
            transparency: config.weather.transparency,
        })
    }

    fn validate(&self) -> Result<()> {
        if let Some(p) = self
            .dome_closed_probabilities
            .iter()
            .find(|p| !(0.0..=1.0).contains(*p))
        {
            return Err(SurveyError::configuration(format!(
                "dome-closed probability {} is not in [0, 1]",
                p
            )));
        }
        self.seeing.validate()?;
        self.transparency.validate()
    }
}

/// Conditions at one sample time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherRow {
    pub mjd: ModifiedJulianDate,
    pub dome_open: bool,
    /// Seeing FWHM, arcseconds.
    pub seeing: f32,
    /// Transparency in [0, 1].
    pub transparency: f32,
}

/// Table metadata persisted alongside the columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherMeta {
    pub start_date: NaiveDate,
    pub stop_date: NaiveDate,
    pub num_nights: usize,
    pub steps_per_day: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WeatherColumns {
    mjd: Vec<f64>,
    dome_open: Vec<bool>,
    seeing: Vec<f32>,
    transparency: Vec<f32>,
}

impl WeatherColumns {
    fn len(&self) -> usize {
        self.mjd.len()
    }
}

/// Tabulated weather for a survey date range.
#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    meta: WeatherMeta,
    columns: WeatherColumns,
}

impl Weather {
    /// Simulate weather for the nights `start_date..stop_date`.
    ///
    /// Fails with a configuration error when the range is empty or the time
    /// step does not evenly divide a day.
    pub fn generate(
        start_date: NaiveDate,
        stop_date: NaiveDate,
        options: &WeatherOptions,
    ) -> Result<Self> {
        let num_nights = (stop_date - start_date).num_days();
        if num_nights <= 0 {
            return Err(SurveyError::configuration("Expected start_date < stop_date."));
        }
        let num_nights = num_nights as usize;
        let steps_per_day = steps_per_day(options.time_step)?;
        options.validate()?;

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => {
                log::warn!("Will generate unreproducible random numbers.");
                StdRng::from_entropy()
            }
        };

        let num_rows = num_nights * steps_per_day;
        let t0 = local_noon_on_date(start_date, options.utc_offset_hours);
        let mjd: Vec<f64> = (0..num_rows)
            .map(|i| t0.value() + i as f64 / steps_per_day as f64)
            .collect();

        let mut dome_open = vec![true; num_rows];
        for (i, night) in dome_open.chunks_mut(steps_per_day).enumerate() {
            let first = ModifiedJulianDate::new(mjd[i * steps_per_day]);
            let p_closed =
                dome_closed_probability(&options.dome_closed_probabilities, first.utc_date().month());
            if rng.gen::<f64>() < p_closed {
                night.fill(false);
            }
        }

        let dt_sec = SECONDS_PER_DAY / steps_per_day as f64;
        let seeing = options.seeing.sample(num_rows, dt_sec, &mut rng);
        let transparency = options.transparency.sample(num_rows, dt_sec, &mut rng);

        let weather = Self {
            meta: WeatherMeta {
                start_date,
                stop_date,
                num_nights,
                steps_per_day,
            },
            columns: WeatherColumns {
                mjd,
                dome_open,
                seeing,
                transparency,
            },
        };

        log::info!(
            "Generated {} nights of weather ({} rows, dome open {:.1}% of nights)",
            num_nights,
            num_rows,
            100.0 * weather.open_night_fraction()
        );

        Ok(weather)
    }

    /// Simulate weather over the survey configured in `config`.
    pub fn from_config(config: &SurveyConfig) -> Result<Self> {
        Self::generate(
            config.survey.first_day,
            config.survey.last_day,
            &WeatherOptions::from_config(config)?,
        )
    }

    /// Load a table previously written by [`Weather::save`].
    pub fn restore<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let (meta, columns): (WeatherMeta, WeatherColumns) = read_table(path, WEATHER_FORMAT)?;

        let expected_nights = (meta.stop_date - meta.start_date).num_days();
        if meta.num_nights == 0 || expected_nights != meta.num_nights as i64 {
            return Err(SurveyError::format(format!(
                "{}: {} nights does not match {}..{}",
                path.display(),
                meta.num_nights,
                meta.start_date,
                meta.stop_date
            )));
        }

        let expected_rows = meta
            .num_nights
            .checked_mul(meta.steps_per_day)
            .ok_or_else(|| {
                SurveyError::format(format!(
                    "{}: {} nights x {} steps overflows",
                    path.display(),
                    meta.num_nights,
                    meta.steps_per_day
                ))
            })?;
        let lengths = [
            columns.mjd.len(),
            columns.dome_open.len(),
            columns.seeing.len(),
            columns.transparency.len(),
        ];
        if meta.steps_per_day == 0 || lengths.iter().any(|&n| n != expected_rows) {
            return Err(SurveyError::format(format!(
                "{}: column lengths {:?} do not match {} nights x {} steps",
                path.display(),
                lengths,
                meta.num_nights,
                meta.steps_per_day
            )));
        }

        log::info!("Restored weather from {}", path.display());
        Ok(Self { meta, columns })
    }

    /// Write the table to `path`, refusing to replace an existing file
    /// unless `overwrite` is set.
    pub fn save<P: AsRef<Path>>(&self, path: P, overwrite: bool) -> Result<()> {
        let path = path.as_ref();
        write_table(path, WEATHER_FORMAT, &self.meta, &self.columns, overwrite)?;
        log::info!("Saved weather to {}", path.display());
        Ok(())
    }

    /// Conditions at the sample nearest to `time`.
    pub fn get(&self, time: ModifiedJulianDate) -> Result<WeatherRow> {
        let offset = self.offset_of(time)?;
        Ok(self.row_at(offset))
    }

    /// Conditions at several times; fails without partial results if any
    /// time lies outside the table.
    pub fn get_many(&self, times: &[ModifiedJulianDate]) -> Result<Vec<WeatherRow>> {
        let offsets = times
            .iter()
            .map(|&t| self.offset_of(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(offsets.into_iter().map(|i| self.row_at(i)).collect())
    }

    fn offset_of(&self, time: ModifiedJulianDate) -> Result<usize> {
        let t0 = self.columns.mjd.first().copied().unwrap_or(f64::NAN);
        let offset = ((time.value() - t0) * self.meta.steps_per_day as f64 + 0.5).floor();
        if !offset.is_finite() || offset < 0.0 || offset >= self.columns.len() as f64 {
            return Err(SurveyError::OutOfRange(format!(
                "Cannot get weather beyond tabulated range: MJD {} maps to row {} of {}",
                time.value(),
                offset,
                self.columns.len()
            )));
        }
        Ok(offset as usize)
    }

    fn row_at(&self, i: usize) -> WeatherRow {
        WeatherRow {
            mjd: ModifiedJulianDate::new(self.columns.mjd[i]),
            dome_open: self.columns.dome_open[i],
            seeing: self.columns.seeing[i],
            transparency: self.columns.transparency[i],
        }
    }

    /// Row `i`, if it exists.
    pub fn row(&self, i: usize) -> Option<WeatherRow> {
        (i < self.num_rows()).then(|| self.row_at(i))
    }

    pub fn rows(&self) -> impl Iterator<Item = WeatherRow> + '_ {
        (0..self.num_rows()).map(|i| self.row_at(i))
    }

    pub fn meta(&self) -> &WeatherMeta {
        &self.meta
    }

    pub fn start_date(&self) -> NaiveDate {
        self.meta.start_date
    }

    pub fn stop_date(&self) -> NaiveDate {
        self.meta.stop_date
    }

    pub fn num_nights(&self) -> usize {
        self.meta.num_nights
    }

    pub fn steps_per_day(&self) -> usize {
        self.meta.steps_per_day
    }

    pub fn num_rows(&self) -> usize {
        self.columns.len()
    }

    pub fn mjd(&self) -> &[f64] {
        &self.columns.mjd
    }

    pub fn dome_open(&self) -> &[bool] {
        &self.columns.dome_open
    }

    pub fn seeing(&self) -> &[f32] {
        &self.columns.seeing
    }

    pub fn transparency(&self) -> &[f32] {
        &self.columns.transparency
    }

    /// Fraction of nights on which the dome opens.
    pub fn open_night_fraction(&self) -> f64 {
        let open = self
            .columns
            .dome_open
            .chunks(self.meta.steps_per_day)
            .filter(|night| night[0])
            .count();
        open as f64 / self.meta.num_nights as f64
    }
}
