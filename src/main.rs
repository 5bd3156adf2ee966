//! ThermWatch - CPU/GPU utilization and temperature monitor
//!
//! Samples CPU and GPU usage and temperature on a fixed interval and renders
//! them to the console, optionally logging every sample to CSV.

use anyhow::Result;
use thermwatch::{app::App, cli::Cli, config::Config};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_lenient();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        init_tracing("warn");
        error!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    init_tracing(&config.log_level);

    info!("ThermWatch starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Poll Interval: {}ms", config.poll.interval_ms);
    info!("Quick Test: {}", config.poll.quick_test);
    info!("Output Format: {}", config.output.format);
    info!(
        "CSV Logging: {}",
        if config.output.log_enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    info!("Log Directory: {}", config.output.log_dir.display());
    info!("Sensor Bridge: {}", config.sensors.bridge_path.display());
    info!("-------------------------------------------------------");

    // =========================================================================
    // Create Shutdown Channel
    // =========================================================================
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received. Finishing the current sample...");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                // Dropping the sender would stop the loop, so hold it.
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    let app = match App::builder(config).build().await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start monitor: {:#}", e);
            std::process::exit(1);
        }
    };

    let report = app.run(shutdown_rx).await?;
    info!("Exiting after {} samples.", report.cycles);

    Ok(())
}
