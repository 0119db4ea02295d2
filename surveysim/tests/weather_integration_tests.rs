mod support;

use proptest::prelude::*;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

use support::date;
use surveysim::config::SurveyConfig;
use surveysim::weather::{Weather, WeatherOptions};
use surveysim::{ModifiedJulianDate, SurveyError};

fn generate(seed: u64) -> Weather {
    Weather::generate(
        date(2020, 1, 1),
        date(2020, 1, 15),
        &WeatherOptions::default().with_seed(seed),
    )
    .unwrap()
}

#[test]
fn same_seed_reproduces_table() {
    let a = generate(123);
    let b = generate(123);

    assert_eq!(a.dome_open(), b.dome_open());
    assert_eq!(a.seeing(), b.seeing());
    assert_eq!(a.transparency(), b.transparency());
    assert_eq!(a, b);
}

#[test]
fn different_seed_changes_atmosphere_not_grid() {
    let a = generate(1);
    let b = generate(2);

    assert_eq!(a.mjd(), b.mjd());
    assert_ne!(a.seeing(), b.seeing());
    assert_ne!(a.transparency(), b.transparency());
}

#[test]
fn unseeded_generation_still_works() {
    let weather = Weather::generate(
        date(2020, 1, 1),
        date(2020, 1, 2),
        &WeatherOptions::default(),
    )
    .unwrap();
    assert_eq!(weather.num_rows(), 288);
}

#[test]
fn save_restore_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("weather.json");
    let weather = generate(42);

    weather.save(&path, false).unwrap();
    let restored = Weather::restore(&path).unwrap();

    assert_eq!(restored, weather);
    assert_eq!(restored.start_date(), date(2020, 1, 1));
    assert_eq!(restored.stop_date(), date(2020, 1, 15));
    assert_eq!(restored.num_nights(), 14);
    assert_eq!(restored.steps_per_day(), 288);
}

#[test]
fn save_respects_overwrite_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("weather.json");

    generate(1).save(&path, false).unwrap();
    let err = generate(2).save(&path, false).unwrap_err();
    assert!(matches!(err, SurveyError::Io(_)));
    assert_eq!(Weather::restore(&path).unwrap(), generate(1));

    generate(2).save(&path, true).unwrap();
    assert_eq!(Weather::restore(&path).unwrap(), generate(2));
}

#[test]
fn restore_rejects_inconsistent_metadata() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("weather.json");
    generate(7).save(&path, false).unwrap();

    // Metadata is outside the checksum; the night count check catches this
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replace("\"num_nights\":14", "\"num_nights\":13")).unwrap();

    let err = Weather::restore(&path).unwrap_err();
    assert!(matches!(err, SurveyError::Format(_)));
}

#[test]
fn restore_rejects_overflowing_row_count() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("weather.json");
    generate(7).save(&path, false).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"steps_per_day\":288"));
    fs::write(
        &path,
        text.replace("\"steps_per_day\":288", "\"steps_per_day\":18446744073709551615"),
    )
    .unwrap();

    let err = Weather::restore(&path).unwrap_err();
    assert!(matches!(err, SurveyError::Format(_)));
    assert!(err.to_string().contains("overflows"));
}

#[test]
fn query_outside_table_is_range_error() {
    let weather = generate(3);
    let first = weather.mjd()[0];
    let step = 1.0 / weather.steps_per_day() as f64;

    for t in [first - step, first + 14.0, first + 100.0] {
        let err = weather.get(ModifiedJulianDate::new(t)).unwrap_err();
        assert!(err.is_out_of_range(), "{t} should be out of range");
    }
}

#[test]
fn weather_from_config() {
    let config = SurveyConfig::from_toml_str(
        r#"
[survey]
first_day = "2021-03-01"
last_day = "2021-03-04"

[weather]
time_step_minutes = 10.0
seed = 9
"#,
    )
    .unwrap();

    let weather = Weather::from_config(&config).unwrap();
    assert_eq!(weather.num_nights(), 3);
    assert_eq!(weather.steps_per_day(), 144);
    assert_eq!(weather, Weather::from_config(&config).unwrap());
}

#[test]
fn coarse_time_step() {
    let weather = Weather::generate(
        date(2020, 1, 1),
        date(2020, 1, 3),
        &WeatherOptions::default()
            .with_seed(5)
            .with_time_step(Duration::from_secs(3600)),
    )
    .unwrap();
    assert_eq!(weather.num_rows(), 48);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn perturbed_query_returns_exact_row(row in 0usize..(14 * 288), jitter in -0.49f64..0.49) {
        let weather = generate(11);
        let step = 1.0 / weather.steps_per_day() as f64;
        let t = weather.mjd()[row];

        let found = weather.get(ModifiedJulianDate::new(t + jitter * step)).unwrap();
        prop_assert_eq!(found.mjd.value(), t);
        prop_assert_eq!(found, weather.row(row).unwrap());
    }
}
