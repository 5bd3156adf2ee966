use std::io::Write;
use std::path::PathBuf;
use thermwatch::cli::Cli;
use thermwatch::config::{Config, OutputFormat, MIN_INTERVAL_MS};
use tempfile::NamedTempFile;

#[test]
fn test_load_full_valid_config() {
    let toml_content = r#"
        log_level = "debug"
        [poll]
        interval_ms = 250
        quick_test = true
        [output]
        format = "json"
        log_enabled = true
        log_dir = "/var/log/thermwatch"
        history_capacity = 50
        trend_window = 10
        refresh_interval_ms = 2000
        [sensors]
        bridge_path = "C:/tools/bridge.exe"
        bridge_timeout_ms = 1500
        wmi_timeout_ms = 900
        shell_timeout_ms = 2500
        [sensors.thermal_model]
        idle_celsius = 40.0
        max_rise_celsius = 30.0
        exponent = 2.0
        noise_celsius = 0.5
        min_celsius = 35.0
        max_celsius = 90.0
    "#;

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let config = Config::load(&cli).unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.poll.interval_ms, 250);
    assert!(config.poll.quick_test);
    assert_eq!(config.output.format, OutputFormat::Json);
    assert!(config.output.log_enabled);
    assert_eq!(config.output.log_dir, PathBuf::from("/var/log/thermwatch"));
    assert_eq!(config.output.history_capacity, 50);
    assert_eq!(config.output.trend_window, 10);
    assert_eq!(config.output.refresh_interval_ms, Some(2000));
    assert_eq!(config.sensors.bridge_path, PathBuf::from("C:/tools/bridge.exe"));
    assert_eq!(config.sensors.bridge_timeout_ms, 1500);
    assert_eq!(config.sensors.wmi_timeout_ms, 900);
    assert_eq!(config.sensors.shell_timeout_ms, 2500);
    assert_eq!(config.sensors.thermal_model.idle_celsius, 40.0);
    assert_eq!(config.sensors.thermal_model.max_celsius, 90.0);
}

#[test]
fn test_missing_file_yields_defaults() {
    let cli = Cli {
        config: Some(PathBuf::from("/nonexistent/thermwatch.toml")),
        ..Default::default()
    };
    let config = Config::load(&cli).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_cli_overrides_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [poll]
        interval_ms = 3000
        [output]
        format = "csv"
    "#
    )
    .unwrap();

    let path = file.path().to_string_lossy().into_owned();
    let cli = Cli::parse_lenient_from(["thermwatch", "-c", path.as_str(), "--format", "text", "-i", "750", "-l"]);
    let config = Config::load(&cli).unwrap();

    assert_eq!(config.poll.interval_ms, 750);
    assert_eq!(config.output.format, OutputFormat::Text);
    assert!(config.output.log_enabled);
}

#[test]
fn test_interval_below_minimum_is_raised() {
    let cli = Cli::parse_lenient_from(["thermwatch", "-c", "/nonexistent.toml", "--interval", "50"]);
    let config = Config::load(&cli).unwrap();
    assert_eq!(config.poll.interval_ms, MIN_INTERVAL_MS);
}

#[test]
fn test_file_interval_below_minimum_is_raised() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[poll]\ninterval_ms = 10\n").unwrap();
    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    assert_eq!(Config::load(&cli).unwrap().poll.interval_ms, MIN_INTERVAL_MS);
}

#[test]
fn test_malformed_cli_values_keep_file_settings() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[poll]\ninterval_ms = 400\n[output]\nformat = \"json\"\n").unwrap();

    let path = file.path().to_string_lossy().into_owned();
    let cli = Cli::parse_lenient_from(["thermwatch", "-c", path.as_str(), "-i", "soon", "-f", "yaml"]);
    let config = Config::load(&cli).unwrap();

    assert_eq!(config.poll.interval_ms, 400);
    assert_eq!(config.output.format, OutputFormat::Json);
}
