// Environment variables are process-wide, so this runs in its own binary.
use figment::Jail;
use thermwatch::cli::Cli;
use thermwatch::config::{Config, OutputFormat};

#[test]
fn test_env_overrides_file_and_default_file_is_found() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "thermwatch.toml",
            r#"
            [poll]
            interval_ms = 2000
            [sensors]
            wmi_timeout_ms = 500
        "#,
        )?;
        jail.set_env("THERMWATCH_POLL__INTERVAL_MS", "1500");
        jail.set_env("THERMWATCH_OUTPUT__FORMAT", "text");

        let config = Config::load(&Cli::default()).map_err(|e| e.to_string())?;
        assert_eq!(config.poll.interval_ms, 1500);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.sensors.wmi_timeout_ms, 500);
        Ok(())
    });
}
