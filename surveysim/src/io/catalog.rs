//! Tile catalog table.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::models::{Program, Tile};

/// Column-oriented tile catalog as exported by the footprint tools.
///
/// Upper-case aliases accept the legacy column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileCatalogTable {
    #[serde(alias = "TILEID")]
    pub id: Vec<i32>,
    #[serde(alias = "RA")]
    pub ra: Vec<f64>,
    #[serde(alias = "DEC")]
    pub dec: Vec<f64>,
    #[serde(alias = "PASS")]
    pub pass: Vec<i32>,
    #[serde(alias = "IN_DESI")]
    pub in_survey_flag: Vec<i32>,
    #[serde(alias = "EBV_MED")]
    pub dust_extinction: Vec<f64>,
    #[serde(alias = "AIRMASS", default)]
    pub airmass: Vec<f64>,
    #[serde(alias = "EXPOSEFAC", default)]
    pub exposure_factor: Vec<f64>,
    #[serde(alias = "STAR_DENSITY", default)]
    pub star_density: Vec<f64>,
    #[serde(alias = "PROGRAM")]
    pub program: Vec<String>,
    #[serde(alias = "OBSCONDITIONS")]
    pub obs_conditions: Vec<i16>,
    #[serde(alias = "OBSTIME")]
    pub obs_time: Vec<f64>,
    #[serde(alias = "HA")]
    pub hour_angle: Vec<f64>,
}

impl TileCatalogTable {
    /// Number of rows, after checking that every required column has the
    /// same length. Optional columns may be empty.
    pub fn num_rows(&self) -> Result<usize> {
        let n = self.id.len();
        let required = [
            ("ra", self.ra.len()),
            ("dec", self.dec.len()),
            ("pass", self.pass.len()),
            ("in_survey_flag", self.in_survey_flag.len()),
            ("dust_extinction", self.dust_extinction.len()),
            ("program", self.program.len()),
            ("obs_conditions", self.obs_conditions.len()),
            ("obs_time", self.obs_time.len()),
            ("hour_angle", self.hour_angle.len()),
        ];
        let optional = [
            ("airmass", self.airmass.len()),
            ("exposure_factor", self.exposure_factor.len()),
            ("star_density", self.star_density.len()),
        ];

        let bad = required
            .iter()
            .find(|(_, len)| *len != n)
            .or_else(|| optional.iter().find(|(_, len)| *len != 0 && *len != n));

        match bad {
            Some((name, len)) => Err(SurveyError::Catalog(format!(
                "column {} has {} rows, expected {}",
                name, len, n
            ))),
            None => Ok(n),
        }
    }

    /// Build planner tiles from the rows flagged as part of the survey.
    pub fn to_tiles(&self) -> Result<Vec<Tile>> {
        let n = self.num_rows()?;
        let tiles: Vec<Tile> = (0..n)
            .filter(|&i| self.in_survey_flag[i] == 1)
            .map(|i| {
                Tile::from_catalog(
                    self.id[i],
                    self.ra[i],
                    self.dec[i],
                    self.pass[i],
                    self.dust_extinction[i],
                    Program::from(self.program[i].as_str()),
                    self.obs_conditions[i],
                    self.obs_time[i],
                    self.hour_angle[i],
                )
            })
            .collect();

        log::debug!("Catalog: {} of {} rows in survey", tiles.len(), n);
        Ok(tiles)
    }
}
