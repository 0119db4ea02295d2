//! Observation results fed back to the planner.

use serde::{Deserialize, Serialize};

/// Latest status of one tile, as reported by the night's observations.
///
/// Status 0 is unobserved, 1 partially observed and 2 or more complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedTile {
    #[serde(alias = "TILEID", alias = "tileid")]
    pub tile_id: i32,
    #[serde(alias = "STATUS")]
    pub status: i32,
}

impl ObservedTile {
    pub fn new(tile_id: i32, status: i32) -> Self {
        Self { tile_id, status }
    }
}
