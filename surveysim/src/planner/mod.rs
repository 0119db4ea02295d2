//! Nightly observability planner.
//!
//! The planner owns the survey's tile catalog and each tile's observing
//! status. Once per night it folds in the latest observation results,
//! works out when the sky is dark, and ranks the tiles that can usefully be
//! observed.
//!
//! ```ignore
//! let mut planner = SurveyPlanner::new(tiles, SiteEphemeris::default())?;
//! for night in nights {
//!     let plan = planner.plan_night(&night, &observed_since_last_night);
//!     plan.save(&output_dir)?;
//! }
//! ```

pub mod dark_time;
pub mod plan;


use std::collections::HashMap;

pub use dark_time::{
    classify_moon_phase, compute_dark_windows, is_dark, DarkWindowState, LstWindow, MoonEvents,
    MoonPhaseClass, MoonlessNightPolicy, SkyBrightness, GREY_MAX_ALTITUDE_ILLUMINATION,
    GREY_MAX_ILLUMINATION,
};
pub use plan::{read_plan, NightPlan, PlanColumns, PlanEntry, PlanMeta, PLAN_FORMAT};

use crate::config::PlannerSettings;
use crate::ephemeris::{Ephemeris, SiteEphemeris};
use crate::error::{Result, SurveyError};
use crate::io::TileCatalogTable;
use crate::models::{NightStats, ObservedTile, Tile, STATUS_COMPLETED};

/// Outcome of [`SurveyPlanner::update_status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Entries that matched a catalog tile.
    pub applied: usize,
    /// Entries whose id is not in the catalog; these are ignored.
    pub unmatched: usize,
}

/// Whether `tile` is worth observing under `state`.
///
/// DARK-program tiles need both edges of their LST window in dark time;
/// every other program needs at least one edge outside dark time.
pub fn is_eligible(tile: &Tile, state: &DarkWindowState) -> bool {
    let edge_min = state.is_dark(tile.lst_min);
    let edge_max = state.is_dark(tile.lst_max);

    if tile.program.is_dark() {
        edge_min == SkyBrightness::Dark && edge_max == SkyBrightness::Dark
    } else {
        edge_min != SkyBrightness::Dark || edge_max != SkyBrightness::Dark
    }
}

/// Survey-long planner state.
#[derive(Debug, Clone)]
pub struct SurveyPlanner<E = SiteEphemeris> {
    tiles: Vec<Tile>,
    index: HashMap<i32, usize>,
    ephemeris: E,
    moonless: MoonlessNightPolicy,
}

impl<E: Ephemeris> SurveyPlanner<E> {
    /// Take ownership of the catalog. Duplicate tile ids are rejected.
    pub fn new(tiles: Vec<Tile>, ephemeris: E) -> Result<Self> {
        let mut index = HashMap::with_capacity(tiles.len());
        for (i, tile) in tiles.iter().enumerate() {
            if index.insert(tile.id, i).is_some() {
                return Err(SurveyError::Catalog(format!("duplicate tile id {}", tile.id)));
            }
        }

        log::info!("Planner initialized with {} tiles", tiles.len());
        Ok(Self {
            tiles,
            index,
            ephemeris,
            moonless: MoonlessNightPolicy::default(),
        })
    }

    /// Build from a catalog table, keeping the in-survey rows.
    pub fn from_catalog(table: &TileCatalogTable, ephemeris: E) -> Result<Self> {
        Self::new(table.to_tiles()?, ephemeris)
    }

    pub fn with_moonless_policy(mut self, policy: MoonlessNightPolicy) -> Self {
        self.moonless = policy;
        self
    }

    pub fn with_settings(self, settings: &PlannerSettings) -> Self {
        let policy = if settings.legacy_moonless_window {
            MoonlessNightPolicy::NoDarkTime
        } else {
            MoonlessNightPolicy::FullNight
        };
        self.with_moonless_policy(policy)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: i32) -> Option<&Tile> {
        self.index.get(&id).map(|&i| &self.tiles[i])
    }

    pub fn ephemeris(&self) -> &E {
        &self.ephemeris
    }

    pub fn moonless_policy(&self) -> MoonlessNightPolicy {
        self.moonless
    }

    /// Tiles not yet complete.
    pub fn remaining_tiles(&self) -> usize {
        self.tiles.iter().filter(|t| !t.is_completed()).count()
    }

    /// Overwrite tile statuses in list order; the last entry for an id wins.
    ///
    /// Status normally only grows, but the observation log is authoritative:
    /// a lower status replaces a higher one (logged as a warning), so a
    /// retracted exposure puts its tile back into planning.
    pub fn update_status(&mut self, observed: &[ObservedTile]) -> StatusUpdate {
        let mut summary = StatusUpdate::default();

        for obs in observed {
            match self.index.get(&obs.tile_id) {
                Some(&i) => {
                    let tile = &mut self.tiles[i];
                    if obs.status < tile.status {
                        log::warn!(
                            "Tile {} status decreases from {} to {}",
                            tile.id,
                            tile.status,
                            obs.status
                        );
                    }
                    tile.status = obs.status;
                    summary.applied += 1;
                }
                None => {
                    log::debug!("Ignoring status for unknown tile {}", obs.tile_id);
                    summary.unmatched += 1;
                }
            }
        }

        if summary.unmatched > 0 {
            log::debug!(
                "{} of {} observation entries matched no tile",
                summary.unmatched,
                observed.len()
            );
        }
        summary
    }

    /// Dark windows for `night` under this planner's ephemeris.
    pub fn compute_dark_windows(&self, night: &NightStats) -> DarkWindowState {
        compute_dark_windows(night, &self.ephemeris, self.moonless)
    }

    /// Fold in `observed`, then rank every incomplete tile that is eligible
    /// tonight by descending priority. Ties keep catalog order.
    pub fn plan_night(&mut self, night: &NightStats, observed: &[ObservedTile]) -> NightPlan {
        self.update_status(observed);
        let state = self.compute_dark_windows(night);

        let mut entries: Vec<PlanEntry> = self
            .tiles
            .iter()
            .filter(|tile| tile.status < STATUS_COMPLETED)
            .filter(|tile| is_eligible(tile, &state))
            .map(PlanEntry::from)
            .collect();
        // sort_by is stable
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));

        log::info!(
            "Night {}: {} tiles eligible, moon {}, dark windows {:?}",
            night.date_tag,
            entries.len(),
            SkyBrightness::from(state.moon_phase_class),
            state.as_sentinels()
        );

        NightPlan {
            date_tag: night.date_tag.clone(),
            dark_windows: state,
            moon_illuminated_fraction: night.moon_illuminated_fraction,
            moon_ra: night.moon_ra,
            moon_dec: night.moon_dec,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModifiedJulianDate, Program};

    /// LST equals the fractional day in degrees; the moon is always high.
    #[derive(Debug)]
    struct DayFractionEphemeris;

    impl Ephemeris for DayFractionEphemeris {
        fn mjd_to_lst(&self, mjd: ModifiedJulianDate) -> f64 {
            mjd.value().fract() * 360.0
        }

        fn altaz(&self, _ra: f64, _dec: f64, _lst: f64) -> (f64, f64) {
            (70.0, 0.0)
        }
    }

    fn tile(id: i32, dec: f64, program: Program, lst_min: f64, lst_max: f64) -> Tile {
        Tile {
            lst_min,
            lst_max,
            ..Tile::from_catalog(id, 0.0, dec, 0, 0.0, program, 1, 600.0, 0.0)
        }
    }

    fn moonless_night(fraction: f64) -> NightStats {
        NightStats {
            moonrise: (-1.0).into(),
            moonset: (-1.0).into(),
            evening_twilight: 58850.1.into(),
            morning_twilight: 58850.5.into(),
            midnight: 58850.3.into(),
            moon_ra: 0.0,
            moon_dec: 0.0,
            moon_illuminated_fraction: fraction,
            date_tag: "20200102".into(),
        }
    }

    fn planner(tiles: Vec<Tile>) -> SurveyPlanner<DayFractionEphemeris> {
        SurveyPlanner::new(tiles, DayFractionEphemeris).unwrap()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let tiles = vec![
            tile(1, 0.0, Program::Dark, 50.0, 80.0),
            tile(1, 10.0, Program::Dark, 50.0, 80.0),
        ];
        let err = SurveyPlanner::new(tiles, DayFractionEphemeris).unwrap_err();
        assert!(matches!(err, SurveyError::Catalog(_)));
    }

    #[test]
    fn test_update_status_last_write_wins() {
        let mut p = planner(vec![
            tile(1, 0.0, Program::Dark, 50.0, 80.0),
            tile(2, 0.0, Program::Dark, 50.0, 80.0),
        ]);
        let summary = p.update_status(&[
            ObservedTile::new(1, 1),
            ObservedTile::new(1, 2),
            ObservedTile::new(99, 2),
        ]);

        assert_eq!(summary, StatusUpdate { applied: 2, unmatched: 1 });
        assert_eq!(p.tile(1).unwrap().status, 2);
        assert_eq!(p.tile(2).unwrap().status, 0);
        assert_eq!(p.remaining_tiles(), 1);
    }

    #[test]
    fn test_update_status_allows_decrease() {
        let mut p = planner(vec![tile(1, 0.0, Program::Dark, 50.0, 80.0)]);
        p.update_status(&[ObservedTile::new(1, 2)]);
        p.update_status(&[ObservedTile::new(1, 1)]);
        assert_eq!(p.tile(1).unwrap().status, 1);
    }

    #[test]
    fn test_eligibility_rule() {
        let state = DarkWindowState {
            dark1: LstWindow::new(36.0, 180.0),
            dark2: None,
            moon_phase_class: MoonPhaseClass::Bright,
        };

        // DARK program: both edges dark
        assert!(is_eligible(&tile(1, 0.0, Program::Dark, 50.0, 80.0), &state));
        assert!(!is_eligible(&tile(2, 0.0, Program::Dark, 170.0, 200.0), &state));
        // Other programs: at least one edge not dark
        assert!(!is_eligible(&tile(3, 0.0, Program::Bright, 50.0, 80.0), &state));
        assert!(is_eligible(&tile(4, 0.0, Program::Bright, 170.0, 200.0), &state));
        assert!(is_eligible(&tile(5, 0.0, Program::Grey, 200.0, 230.0), &state));
    }

    #[test]
    fn test_plan_sorted_and_excludes_completed() {
        let mut p = planner(vec![
            tile(1, -30.0, Program::Dark, 50.0, 80.0),
            tile(2, 50.0, Program::Dark, 60.0, 90.0),
            tile(3, 20.0, Program::Dark, 70.0, 100.0),
            tile(4, 50.0, Program::Dark, 80.0, 110.0),
            tile(5, 80.0, Program::Dark, 90.0, 120.0),
        ]);

        let plan = p.plan_night(&moonless_night(0.5), &[ObservedTile::new(5, 2)]);
        let ids: Vec<i32> = plan.entries.iter().map(|e| e.id).collect();

        // priorities: 1 -> 1, 2 -> 6, 3 -> 4, 4 -> 6; tile 5 is complete
        assert_eq!(ids, vec![2, 4, 3, 1]);
        assert_eq!(plan.tiles_todo(), 4);
        assert_eq!(plan.output_name(), "obsplan20200102");
    }

    #[test]
    fn test_plan_carries_moon_metadata() {
        let mut p = planner(vec![tile(1, 0.0, Program::Bright, 200.0, 230.0)]);
        let night = NightStats {
            moon_ra: 150.0,
            moon_dec: 12.0,
            ..moonless_night(0.75)
        };
        let plan = p.plan_night(&night, &[]);

        assert_eq!(plan.moon_illuminated_fraction, 0.75);
        assert_eq!(plan.moon_ra, 150.0);
        assert_eq!(plan.moon_dec, 12.0);
        assert_eq!(plan.dark_windows.moon_phase_class, MoonPhaseClass::Bright);
        assert_eq!(plan.entries.len(), 1);
    }

    #[test]
    fn test_legacy_settings_select_no_dark_time() {
        let settings = PlannerSettings {
            legacy_moonless_window: true,
        };
        let p = planner(vec![]).with_settings(&settings);
        assert_eq!(p.moonless_policy(), MoonlessNightPolicy::NoDarkTime);
        assert!(!p.compute_dark_windows(&moonless_night(0.5)).has_dark_time());
    }
}
