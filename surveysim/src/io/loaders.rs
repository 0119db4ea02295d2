//! JSON loaders for planner inputs.
//!
//! Inputs come from several generations of tooling, so each loader accepts a
//! bare JSON array, a single object, or an object wrapping the array under
//! one of a few known keys.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use super::catalog::TileCatalogTable;
use crate::models::{NightStats, ObservedTile, Tile};

/// Candidate keys holding the list of night records
const NIGHT_KEYS: &[&str] = &["nights", "night_stats", "nightStats", "stats"];

/// Candidate keys holding the list of observation records
const OBSERVATION_KEYS: &[&str] = &["observations", "observed", "tiles", "obslist"];

/// Candidate keys holding a column-oriented catalog
const CATALOG_KEYS: &[&str] = &["tiles", "catalog", "columns"];

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))
}

/// Find the records array in `payload`: the payload itself, a known key, or
/// a single object treated as a one-element list.
fn find_records<'a>(payload: &'a Value, keys: &[&str]) -> Vec<&'a Value> {
    if let Some(items) = payload.as_array() {
        return items.iter().collect();
    }

    if let Some(obj) = payload.as_object() {
        for key in keys {
            if let Some(items) = obj.get(*key).and_then(Value::as_array) {
                return items.iter().collect();
            }
        }
    }

    vec![payload]
}

fn parse_records<T: DeserializeOwned>(payload: &Value, keys: &[&str], what: &str) -> Result<Vec<T>> {
    find_records(payload, keys)
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            T::deserialize(record).with_context(|| format!("Invalid {} record at index {}", what, i))
        })
        .collect()
}

/// Loader for per-night ephemeris records
pub struct NightStatsLoader;

impl NightStatsLoader {
    pub fn load_from_file(path: &Path) -> Result<Vec<NightStats>> {
        let payload = read_json(path)?;
        Self::from_value(&payload).with_context(|| format!("Failed to load {}", path.display()))
    }

    pub fn load_from_str(json: &str) -> Result<Vec<NightStats>> {
        let payload: Value = serde_json::from_str(json).context("Failed to parse night stats JSON")?;
        Self::from_value(&payload)
    }

    fn from_value(payload: &Value) -> Result<Vec<NightStats>> {
        parse_records(payload, NIGHT_KEYS, "night stats")
    }
}

/// Loader for observation logs: `(tile id, status)` pairs
pub struct ObservationLogLoader;

impl ObservationLogLoader {
    pub fn load_from_file(path: &Path) -> Result<Vec<ObservedTile>> {
        let payload = read_json(path)?;
        Self::from_value(&payload).with_context(|| format!("Failed to load {}", path.display()))
    }

    pub fn load_from_str(json: &str) -> Result<Vec<ObservedTile>> {
        let payload: Value =
            serde_json::from_str(json).context("Failed to parse observation log JSON")?;
        Self::from_value(&payload)
    }

    fn from_value(payload: &Value) -> Result<Vec<ObservedTile>> {
        // Column layout: {"TILEID": [...], "STATUS": [...]}
        if let Some(obj) = payload.as_object() {
            let ids = ["tile_id", "TILEID", "tileid"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_array));
            let statuses = ["status", "STATUS"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_array));

            if let (Some(ids), Some(statuses)) = (ids, statuses) {
                anyhow::ensure!(
                    ids.len() == statuses.len(),
                    "Observation log has {} ids but {} statuses",
                    ids.len(),
                    statuses.len()
                );
                return ids
                    .iter()
                    .zip(statuses)
                    .enumerate()
                    .map(|(i, (id, status))| {
                        let id = id.as_i64().with_context(|| format!("Bad tile id at row {}", i))?;
                        let status = status
                            .as_i64()
                            .with_context(|| format!("Bad status at row {}", i))?;
                        Ok(ObservedTile::new(
                            i32::try_from(id).context("Tile id out of range")?,
                            i32::try_from(status).context("Status out of range")?,
                        ))
                    })
                    .collect();
            }
        }

        parse_records(payload, OBSERVATION_KEYS, "observation")
    }
}

/// Loader for the tile catalog
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load the catalog table from a JSON file.
    pub fn load_table(path: &Path) -> Result<TileCatalogTable> {
        let payload = read_json(path)?;
        Self::table_from_value(&payload).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Load the catalog and keep only in-survey tiles.
    pub fn load_tiles(path: &Path) -> Result<Vec<Tile>> {
        let table = Self::load_table(path)?;
        let tiles = table
            .to_tiles()
            .with_context(|| format!("Malformed tile catalog {}", path.display()))?;
        log::info!("Loaded {} tiles from {}", tiles.len(), path.display());
        Ok(tiles)
    }

    pub fn load_from_str(json: &str) -> Result<TileCatalogTable> {
        let payload: Value = serde_json::from_str(json).context("Failed to parse catalog JSON")?;
        Self::table_from_value(&payload)
    }

    fn table_from_value(payload: &Value) -> Result<TileCatalogTable> {
        let table_value = payload
            .as_object()
            .and_then(|obj| CATALOG_KEYS.iter().find_map(|k| obj.get(*k)))
            .filter(|v| v.is_object())
            .unwrap_or(payload);

        TileCatalogTable::deserialize(table_value).context("Catalog is not a column table")
    }
}
