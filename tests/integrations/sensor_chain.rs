use std::sync::Arc;
use std::time::Duration;
use thermwatch::{
    core::{SensorSource, MAX_VALID_CELSIUS, MIN_VALID_CELSIUS},
    sensors::{
        test_utils::{FakeCommandRunner, ScriptedSource},
        wmi::{ACPI_THERMAL_ZONE, TEMPERATURE_PROBE},
        BridgeSource, ShellCimSource, TemperatureResolver, ThermalModel, WmiSource,
    },
};

fn resolver(sources: Vec<Box<dyn SensorSource>>) -> TemperatureResolver {
    TemperatureResolver::new(sources, ThermalModel::default())
}

#[tokio::test]
async fn test_first_valid_source_wins_and_later_sources_are_not_called() {
    let first = ScriptedSource::failing("bridge");
    let second = ScriptedSource::reading("wmi-acpi", 45.0);
    let third = ScriptedSource::reading("wmi-probe", 70.0);
    let (first_calls, second_calls, third_calls) = (first.calls(), second.calls(), third.calls());

    let resolution = resolver(vec![Box::new(first), Box::new(second), Box::new(third)])
        .resolve(50.0)
        .await;

    assert_eq!(resolution.temperature.celsius(), 45.0);
    assert_eq!(resolution.source, "wmi-acpi");
    assert_eq!(first_calls.get(), 1);
    assert_eq!(second_calls.get(), 1);
    assert_eq!(third_calls.get(), 0);
}

#[tokio::test]
async fn test_out_of_range_readings_are_skipped() {
    let resolution = resolver(vec![
        Box::new(ScriptedSource::reading("bridge", 150.0)),
        Box::new(ScriptedSource::reading("wmi-acpi", -5.0)),
        Box::new(ScriptedSource::reading("wmi-probe", 0.0)),
        Box::new(ScriptedSource::reading("wmi-thermal-zone", 120.0)),
        Box::new(ScriptedSource::reading("shell-cim", 66.6)),
    ])
    .resolve(10.0)
    .await;

    assert_eq!(resolution.source, "shell-cim");
    assert_eq!(resolution.temperature.celsius(), 66.6);
}

#[tokio::test]
async fn test_all_sources_failing_at_80_percent_uses_the_model() {
    let sources: Vec<Box<dyn SensorSource>> = ["bridge", "wmi-acpi", "wmi-probe", "wmi-thermal-zone", "shell-cim"]
        .into_iter()
        .map(|name| Box::new(ScriptedSource::failing(name)) as Box<dyn SensorSource>)
        .collect();
    let chain = resolver(sources);

    // 37 + 35 * 0.8^1.5, give or take one degree of noise.
    let center = 37.0 + 35.0 * 0.8f64.powf(1.5);
    for _ in 0..50 {
        let resolution = chain.resolve(80.0).await;
        let celsius = resolution.temperature.celsius();
        assert!(resolution.is_simulated());
        assert!((celsius - center).abs() <= 1.0 + 1e-9, "estimate {} too far from {}", celsius, center);
        assert!(celsius > MIN_VALID_CELSIUS && celsius < MAX_VALID_CELSIUS);
    }
}

#[tokio::test]
async fn test_model_estimate_stays_in_bounds_at_extremes() {
    let chain = resolver(vec![]);
    for usage in [0.0, 100.0, -20.0, 250.0, f64::NAN] {
        let celsius = chain.resolve(usage).await.temperature.celsius();
        assert!((30.0..=95.0).contains(&celsius), "usage {} gave {}", usage, celsius);
    }
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_source_counts_as_a_miss() {
    let slow = ScriptedSource::hanging("bridge", Duration::from_secs(30));
    let slow_calls = slow.calls();
    let chain = resolver(vec![
        Box::new(slow),
        Box::new(ScriptedSource::reading("wmi-acpi", 52.0)),
    ]);

    let started = tokio::time::Instant::now();
    let resolution = chain.resolve(20.0).await;

    assert_eq!(slow_calls.get(), 1);
    assert_eq!(resolution.source, "wmi-acpi");
    // The bridge was abandoned at its 2s budget, not after 30s.
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_real_sources_over_a_fake_runner() {
    let runner = Arc::new(FakeCommandRunner::new());
    runner.add_success("bridge.exe", "starting\n{\"cpuTemperature\": null}\n");
    runner.add_success("wmic", "CurrentTemperature=2500\r\n");
    runner.add_success("wmic", "CurrentReading=\r\n");
    runner.add_success("powershell", "3131\r\n");

    let timeout = Duration::from_secs(1);
    let chain = resolver(vec![
        Box::new(BridgeSource::new("bridge.exe", timeout, runner.clone())),
        Box::new(WmiSource::new(ACPI_THERMAL_ZONE, timeout, runner.clone())),
        Box::new(WmiSource::new(TEMPERATURE_PROBE, timeout, runner.clone())),
        Box::new(ShellCimSource::new(timeout, runner.clone()).unwrap()),
    ]);

    let resolution = chain.resolve(10.0).await;
    assert_eq!(resolution.source, "shell-cim");
    assert!((resolution.temperature.celsius() - 39.95).abs() < 1e-9);
    assert_eq!(runner.calls().len(), 4);
}
