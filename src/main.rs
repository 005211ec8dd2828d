//! pws2mqtt - Main Entry Point
//!
//! Loads configuration from the environment, connects to the broker and runs
//! the publish scheduler. Every fatal condition surfaces here as an
//! [`AppError`] and leaves the process with its documented exit code.

use clap::{Parser, Subcommand};
use pws2mqtt::config::{Config, PollMode};
use pws2mqtt::error::{exit_codes, sanitize_error_message, AppError, AppResult};
use pws2mqtt::observability::init_default_logging;
use pws2mqtt::scheduler::Scheduler;
use pws2mqtt::transport::mqtt::MqttClient;
use pws2mqtt::weather::{WundergroundClient, WundergroundConfig};
use std::process;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

/// Weather Underground to Home Assistant MQTT bridge
#[derive(Parser)]
#[command(name = "pws2mqtt")]
#[command(about = "Publish Weather Underground PWS observations as Home Assistant MQTT sensors")]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the polling service
    Run {
        /// Run a single publish cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Validate configuration
    Config {
        /// Show current configuration with secrets redacted
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(cli.verbose);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting pws2mqtt");

    let exit_code = match execute(cli.command).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            let exit_code = e.exit_code();
            error!(exit_code, "{}", sanitize_error_message(&e.to_string()));
            exit_code
        }
    };

    info!(exit_code, "Application shutdown complete");
    process::exit(exit_code);
}

async fn execute(command: Commands) -> AppResult<()> {
    let mut config = Config::from_env()?;

    match command {
        Commands::Run { once } => {
            if once {
                config.schedule.poll = PollMode::Once;
            }
            run_service(config).await
        }
        Commands::Config { show } => handle_config_command(&config, show),
    }
}

async fn run_service(config: Config) -> AppResult<()> {
    info!(
        sensor_set = %config.sensor_set.name,
        stations = ?config.weather.station_ids,
        max_retries = config.weather.max_retries,
        "Service starting"
    );

    let source = WundergroundClient::new(WundergroundConfig::from(&config.weather))
        .map_err(AppError::WeatherClient)?;
    let mut mqtt = MqttClient::new(&config.mqtt)?;
    let events = mqtt.connect()?;

    let result = {
        let scheduler = Scheduler::new(&config, &source, &mqtt);
        tokio::select! {
            result = scheduler.run(events) => result,
            signal_name = shutdown_signal() => {
                info!(signal = signal_name, "Received shutdown signal, shutting down gracefully");
                Ok(())
            }
        }
    };

    // After a terminal broker event the event loop is already gone
    if result.is_ok() {
        if let Err(e) = mqtt.disconnect().await {
            warn!(error = %e, "Error during MQTT disconnect");
        }
    }

    result
}

fn handle_config_command(config: &Config, show: bool) -> AppResult<()> {
    if show {
        match toml::to_string_pretty(&config.redacted()) {
            Ok(rendered) => {
                println!("Current configuration:");
                println!("{rendered}");
            }
            Err(e) => warn!(error = %e, "Failed to render configuration"),
        }
    }

    info!("Configuration validation complete");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() -> &'static str {
    let handlers = signal(SignalKind::interrupt())
        .and_then(|sigint| Ok((sigint, signal(SignalKind::terminate())?)));

    match handlers {
        Ok((mut sigint, mut sigterm)) => {
            tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to install signal handlers");
            std::future::pending().await
        }
    }
}
