//! Nightly plan output.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::dark_time::DarkWindowState;
use crate::error::Result;
use crate::io::table_file::{read_table, write_table};
use crate::models::{Program, Tile};

/// `format` tag of night plan files.
pub const PLAN_FORMAT: &str = "surveysim-obsplan";

/// One eligible tile in a night's plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub id: i32,
    pub ra: f64,
    pub dec: f64,
    pub dust_extinction: f64,
    pub lst_min: f64,
    pub lst_max: f64,
    pub max_exposure_len: f64,
    pub priority: i32,
    pub status: i32,
    pub program: Program,
    pub obs_conditions: i16,
}

impl From<&Tile> for PlanEntry {
    fn from(tile: &Tile) -> Self {
        Self {
            id: tile.id,
            ra: tile.ra,
            dec: tile.dec,
            dust_extinction: tile.dust_extinction,
            lst_min: tile.lst_min,
            lst_max: tile.lst_max,
            max_exposure_len: tile.max_exposure_len,
            priority: tile.priority,
            status: tile.status,
            program: tile.program.clone(),
            obs_conditions: tile.obs_conditions,
        }
    }
}

/// Header metadata of a plan file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMeta {
    pub night: String,
    pub moon_illuminated_fraction: f64,
    pub moon_ra: f64,
    pub moon_dec: f64,
}

/// Column layout of a plan file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanColumns {
    pub id: Vec<i32>,
    pub ra: Vec<f64>,
    pub dec: Vec<f64>,
    pub dust_extinction: Vec<f64>,
    pub lst_min: Vec<f64>,
    pub lst_max: Vec<f64>,
    pub max_exposure_len: Vec<f64>,
    pub priority: Vec<i32>,
    pub status: Vec<i32>,
    pub program: Vec<Program>,
    pub obs_conditions: Vec<i16>,
}

impl PlanColumns {
    fn push(&mut self, entry: &PlanEntry) {
        self.id.push(entry.id);
        self.ra.push(entry.ra);
        self.dec.push(entry.dec);
        self.dust_extinction.push(entry.dust_extinction);
        self.lst_min.push(entry.lst_min);
        self.lst_max.push(entry.lst_max);
        self.max_exposure_len.push(entry.max_exposure_len);
        self.priority.push(entry.priority);
        self.status.push(entry.status);
        self.program.push(entry.program.clone());
        self.obs_conditions.push(entry.obs_conditions);
    }
}

/// Eligible tiles for one night, highest priority first.
#[derive(Debug, Clone, PartialEq)]
pub struct NightPlan {
    pub date_tag: String,
    pub dark_windows: DarkWindowState,
    pub moon_illuminated_fraction: f64,
    pub moon_ra: f64,
    pub moon_dec: f64,
    pub entries: Vec<PlanEntry>,
}

impl NightPlan {
    /// Number of tiles left to observe tonight.
    pub fn tiles_todo(&self) -> usize {
        self.entries.len()
    }

    /// Output identifier, `obsplan<YYYYMMDD>`.
    pub fn output_name(&self) -> String {
        format!("obsplan{}", self.date_tag)
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.output_name())
    }

    pub fn meta(&self) -> PlanMeta {
        PlanMeta {
            night: self.date_tag.clone(),
            moon_illuminated_fraction: self.moon_illuminated_fraction,
            moon_ra: self.moon_ra,
            moon_dec: self.moon_dec,
        }
    }

    pub fn columns(&self) -> PlanColumns {
        let mut columns = PlanColumns::default();
        for entry in &self.entries {
            columns.push(entry);
        }
        columns
    }

    /// Write the plan as `<dir>/obsplan<YYYYMMDD>.json`, replacing any
    /// earlier plan for the same night.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        write_table(&path, PLAN_FORMAT, &self.meta(), &self.columns(), true)?;
        log::info!(
            "Wrote {} with {} tiles",
            path.display(),
            self.tiles_todo()
        );
        Ok(path)
    }
}

/// Read a plan file written by [`NightPlan::save`].
pub fn read_plan<P: AsRef<Path>>(path: P) -> Result<(PlanMeta, PlanColumns)> {
    read_table(path.as_ref(), PLAN_FORMAT)
}
