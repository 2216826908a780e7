use gcodelevel_core::{CalibrationSet, Error};
use gcodelevel_settings::Config;
use gcodelevel_surface::MaximizerStrategy;
use tempfile::TempDir;

fn calibrated() -> Config {
    let mut config = Config::new();
    config.calibration.points = CalibrationSet::from_triples(&[
        [0.0, 0.0, 0.10],
        [100.0, 0.0, 0.25],
        [0.0, 100.0, -0.05],
        [100.0, 100.0, 0.30],
    ]);
    config.calibration.x_degree = 1;
    config.calibration.y_degree = 1;
    config.machine.z_max = 40.0;
    config.optimizer.strategy = MaximizerStrategy::RandomSampling {
        samples: 64,
        seed: 7,
    };
    config
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("level.toml");

    let config = calibrated();
    config.save_to_file(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();

    assert_eq!(loaded, config);
    assert!(loaded.is_calibrated());
}

#[test]
fn test_json_round_trip_into_nested_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("level.json");

    let config = calibrated();
    config.save_to_file(&path).unwrap();
    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_partial_toml_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(
        &path,
        "[calibration]\npoints = [[0.0, 0.0, 0.2], [50.0, 50.0, 0.4]]\n\n[machine]\nz_max = 25.0\n",
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.calibration.points.len(), 2);
    assert_eq!(config.calibration.x_degree, 2);
    assert_eq!(config.machine.z_max, 25.0);
    assert_eq!(config.machine.z_min, 0.0);
    assert_eq!(config.subdivision.line_break_distance, 10.0);
    assert_eq!(config.optimizer.strategy, MaximizerStrategy::default());
}

#[test]
fn test_strategy_is_selected_by_kind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("newton.toml");
    std::fs::write(
        &path,
        concat!(
            "[optimizer.strategy]\n",
            "kind = \"newton\"\n",
            "start = 0.5\n",
            "slope_epsilon = 1e-6\n",
            "max_iterations = 50\n",
        ),
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.optimizer.strategy.name(), "newton");
}

#[test]
fn test_invalid_values_are_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[machine]\nz_min = 10.0\nz_max = 5.0\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(err.is_config_error());
    assert_eq!(err.code(), "CONFIG_INVALID_VALUE");
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"machine\": ").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert_eq!(err.code(), "CONFIG_PARSE");
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_validation_rules() {
    let mut config = Config::new();
    config.subdivision.arc_segment_distance = -1.0;
    assert!(config.validate().is_err());

    let mut config = Config::new();
    config.optimizer.telos = 0.5;
    assert!(config.validate().is_err());

    let mut config = Config::new();
    config.optimizer.threshold = 0.0;
    assert!(config.validate().is_err());

    let mut config = Config::new();
    config.optimizer.strategy = MaximizerStrategy::UniformSampling { samples: 0 };
    assert!(config.validate().is_err());

    let mut config = Config::new();
    config.machine.z_min = 3.0;
    config.machine.z_max = 3.0;
    assert!(config.validate().is_ok());
}

#[test]
fn test_explicit_path_wins_over_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("explicit.toml");
    calibrated().save_to_file(&path).unwrap();

    let config = Config::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.machine.z_max, 40.0);
}
