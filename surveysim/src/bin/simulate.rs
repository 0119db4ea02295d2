//! Survey simulation driver.
//!
//! Generates the weather for the configured survey and, when a tile catalog
//! and night stats are supplied, plans every night in turn.
//!
//! # Usage
//!
//! ```bash
//! SURVEYSIM_CONFIG=surveysim.toml cargo run --bin surveysim-simulate
//!
//! SURVEYSIM_TILES=tiles.json SURVEYSIM_NIGHTS=nights.json \
//!   cargo run --bin surveysim-simulate
//! ```
//!
//! # Environment Variables
//!
//! - `SURVEYSIM_CONFIG`: configuration file (default: search for `surveysim.toml`)
//! - `SURVEYSIM_WEATHER`: weather output name (default: `weather.json`)
//! - `SURVEYSIM_TILES`: tile catalog JSON
//! - `SURVEYSIM_NIGHTS`: night stats JSON
//! - `SURVEYSIM_OBSERVED`: observation log applied before the first night
//! - `RUST_LOG`: log filter (default: info)

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use surveysim::config::SurveyConfig;
use surveysim::ephemeris::SiteEphemeris;
use surveysim::io::{CatalogLoader, NightStatsLoader, ObservationLogLoader};
use surveysim::planner::SurveyPlanner;
use surveysim::weather::Weather;

fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = match env::var("SURVEYSIM_CONFIG") {
        Ok(path) => SurveyConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration {}", path))?,
        Err(_) => SurveyConfig::from_default_location().context("Failed to load configuration")?,
    };

    info!(
        "Simulating survey {} to {}",
        config.survey.first_day, config.survey.last_day
    );

    let weather = Weather::from_config(&config).context("Weather generation failed")?;
    let weather_name = env::var("SURVEYSIM_WEATHER").unwrap_or_else(|_| "weather.json".to_string());
    let weather_path = config.get_path(&weather_name);
    weather
        .save(&weather_path, true)
        .with_context(|| format!("Failed to save {}", weather_path.display()))?;

    match (env::var("SURVEYSIM_TILES"), env::var("SURVEYSIM_NIGHTS")) {
        (Ok(tiles), Ok(nights)) => plan_survey(&config, Path::new(&tiles), Path::new(&nights))?,
        _ => info!("No SURVEYSIM_TILES/SURVEYSIM_NIGHTS given, skipping planning"),
    }

    Ok(())
}

fn plan_survey(config: &SurveyConfig, tiles: &Path, nights: &Path) -> anyhow::Result<()> {
    let tiles = CatalogLoader::load_tiles(tiles)?;
    let nights = NightStatsLoader::load_from_file(nights)?;
    let mut observed = match env::var("SURVEYSIM_OBSERVED") {
        Ok(path) => ObservationLogLoader::load_from_file(&PathBuf::from(path))?,
        Err(_) => Vec::new(),
    };

    let mut planner = SurveyPlanner::new(tiles, SiteEphemeris::new(config.site))?
        .with_settings(&config.planner);

    for night in &nights {
        let plan = planner.plan_night(night, &observed);
        plan.save(&config.survey.output_path)
            .with_context(|| format!("Failed to save plan for {}", night.date_tag))?;
        // Observations come from an external executor; later nights see none
        observed.clear();
    }

    info!(
        "Planned {} nights, {} tiles remaining",
        nights.len(),
        planner.remaining_tiles()
    );
    Ok(())
}
