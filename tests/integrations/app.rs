#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{harness, text_config};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use thermwatch::{
    app::App,
    config::OutputFormat,
    counters::test_utils::FakeCounters,
    poll::PollState,
    sensors::test_utils::{FakeCommandRunner, ScriptedSource},
    sink::test_utils::SharedBuffer,
};
use tokio::sync::watch;

#[tokio::test]
async fn test_quick_test_samples_exactly_once() {
    let mut config = text_config();
    config.poll.quick_test = true;
    let h = harness(config, 25.0, vec![Box::new(ScriptedSource::reading("bridge", 44.0))]);

    let app = h.builder.build().await.unwrap();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let report = app.run(shutdown_rx).await.unwrap();

    assert_eq!(report.state, PollState::Stopped);
    assert_eq!(report.cycles, 1);
    assert_eq!(FakeCounters::read_count(&h.counter_reads), 1);

    let out = h.output.contents();
    let sample_lines: Vec<&str> = out.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(sample_lines.len(), 1);
    assert!(sample_lines[0].contains("44.00°C (bridge)"));
    assert!(out.contains("Session summary"));
}

#[tokio::test(start_paused = true)]
async fn test_continuous_mode_stops_between_cycles_on_shutdown() {
    let mut config = text_config();
    config.poll.interval_ms = 500;
    let h = harness(config, 10.0, vec![Box::new(ScriptedSource::reading("bridge", 41.0))]);

    let app = h.builder.build().await.unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let run = tokio::spawn(app.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(1250)).await;
    shutdown_tx.send(true).unwrap();
    let report = run.await.unwrap().unwrap();

    // Cycles at 0, 500 and 1000ms.
    assert_eq!(report.state, PollState::Stopped);
    assert_eq!(report.cycles, 3);
    assert_eq!(FakeCounters::read_count(&h.counter_reads), 3);
    assert_eq!(report.samples_buffered, 3);
    assert!(h.output.contents().contains("Samples: 3"));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_slow_resolve_finishes_the_cycle() {
    let mut config = text_config();
    config.poll.interval_ms = 100;
    let sources: Vec<Box<dyn thermwatch::core::SensorSource>> = vec![
        Box::new(ScriptedSource::hanging("bridge", Duration::from_secs(10))),
        Box::new(ScriptedSource::reading("wmi-acpi", 50.0)),
    ];
    let h = harness(config, 10.0, sources);

    let app = h.builder.build().await.unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let run = tokio::spawn(app.run(shutdown_rx));

    // The first cycle is stuck in the bridge's 2s budget when shutdown arrives.
    tokio::time::sleep(Duration::from_millis(500)).await;
    shutdown_tx.send(true).unwrap();
    let report = run.await.unwrap().unwrap();

    assert_eq!(report.cycles, 1);
    assert!(h.output.contents().contains("50.00°C (wmi-acpi)"));
}

#[tokio::test]
async fn test_default_chain_falls_through_to_wmi_acpi() {
    let mut config = text_config();
    config.poll.quick_test = true;
    config.output.format = OutputFormat::Json;

    let runner = Arc::new(FakeCommandRunner::new());
    // No bridge response queued, so the bridge fails like a missing executable.
    runner.add_success("wmic", "\r\n\r\nCurrentTemperature=3131\r\n\r\n");

    let output = SharedBuffer::new();
    let app = App::builder(config)
        .counters_override(Box::new(FakeCounters::new(30.0, Default::default())))
        .runner_override(runner.clone())
        .output_override(Box::new(output.clone()))
        .build()
        .await
        .unwrap();
    let (_tx, rx) = watch::channel(false);
    app.run(rx).await.unwrap();

    let out = output.contents();
    let first = out.lines().next().unwrap();
    let sample: serde_json::Value = serde_json::from_str(first).unwrap();
    assert_eq!(sample["cpuTempSource"], "wmi-acpi");
    let celsius = sample["cpuTemp"].as_f64().unwrap();
    assert!((celsius - 39.95).abs() < 1e-6, "got {}", celsius);

    assert_eq!(runner.get_call_count("sensor-bridge.exe"), 1);
    assert_eq!(runner.get_call_count("wmic"), 1);
    assert_eq!(runner.get_call_count("powershell"), 0);
}

#[tokio::test]
async fn test_logging_writes_header_and_one_row_per_sample() {
    let dir = TempDir::new().unwrap();
    let mut config = text_config();
    config.poll.quick_test = true;
    config.output.log_enabled = true;
    config.output.log_dir = dir.path().join("logs");
    let h = harness(config, 33.333, vec![Box::new(ScriptedSource::reading("bridge", 47.125))]);

    let app = h.builder.build().await.unwrap();
    let log_path = app.log_path().unwrap().to_path_buf();
    let (_tx, rx) = watch::channel(false);
    app.run(rx).await.unwrap();

    let mut reader = csv::Reader::from_path(&log_path).unwrap();
    assert_eq!(
        reader.headers().unwrap(),
        vec![
            "Timestamp",
            "CPU Usage (%)",
            "CPU Temp (°C)",
            "GPU Usage (%)",
            "GPU Temp (°C)"
        ]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][1], "33.33");
    assert_eq!(&rows[0][3], "12.50");
    assert_eq!(&rows[0][4], "48.00");
}

#[tokio::test]
async fn test_unwritable_log_dir_disables_logging_only() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let mut config = text_config();
    config.poll.quick_test = true;
    config.output.log_enabled = true;
    config.output.log_dir = blocker.join("logs");
    let h = harness(config, 20.0, vec![Box::new(ScriptedSource::reading("bridge", 40.0))]);

    let app = h.builder.build().await.unwrap();
    assert!(app.log_path().is_none());
    let (_tx, rx) = watch::channel(false);
    let report = app.run(rx).await.unwrap();

    assert_eq!(report.cycles, 1);
    assert!(h.output.contents().contains("40.00°C (bridge)"));
}
