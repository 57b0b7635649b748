//! sora-battery CLI: read or watch the mouse battery from a terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sora_battery_core::config::Settings;
use sora_battery_core::device;
use sora_battery_core::poller::{self, Monitor, Poller, TraySurface};
use sora_battery_core::presentation::Presentation;
use sora_battery_core::profile::DeviceProfile;
use sora_battery_core::transport::HidapiBackend;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "sora-battery",
    version,
    about = "Battery status monitor for Ninjutso Sora wireless mice"
)]
struct Cli {
    /// Settings file (defaults to ./appsettings.json, then built-in Sora V2 IDs).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the battery once and print it.
    Status {
        /// Print status and presentation as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Poll the battery until Ctrl-C, printing every reading.
    Watch {
        /// Seconds between polls (overrides the settings file).
        #[arg(long)]
        interval: Option<u64>,
    },
    /// List every HID interface and mark the ones matching the settings.
    ListDevices,
}

/// Prints each presentation on its own line.
struct ConsoleSurface;

impl TraySurface for ConsoleSurface {
    fn show(&mut self, presentation: &Presentation) {
        println!("[{}] {}", presentation.icon_key, presentation.tooltip);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = Settings::load_or_default(cli.config.as_deref())?;
    let identity = settings.identity()?;
    let mut poller_config = settings.poller_config();
    let monitor = Arc::new(Monitor::new(
        HidapiBackend,
        identity,
        DeviceProfile::SORA_V2,
    ));

    match cli.command {
        Commands::Status { json } => {
            let status = poller::poll_status_with_timeout(
                Arc::clone(&monitor),
                poller_config.exchange_timeout,
            )
            .await;
            let presentation = monitor.present(&status);
            if json {
                let out = serde_json::json!({
                    "status": status,
                    "presentation": presentation,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("[{}] {}", presentation.icon_key, presentation.tooltip);
            }
        }
        Commands::Watch { interval } => {
            if let Some(secs) = interval {
                anyhow::ensure!(secs > 0, "--interval must be at least 1 second");
                poller_config.interval = Duration::from_secs(secs);
            }
            let (poller, handle) = Poller::new(Arc::clone(&monitor), ConsoleSurface, poller_config);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    handle.shutdown();
                }
            });
            poller.run().await;
        }
        Commands::ListDevices => {
            let devices = device::enumerate_all(monitor.backend())
                .context("enumerate HID devices")?;
            if devices.is_empty() {
                println!("No HID devices found.");
            }
            for dev in &devices {
                let marker = if monitor.identity().matches(dev) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} VID: 0x{:04X}, PID: 0x{:04X}, usage page: 0x{:04X}, interface: {}, product: {}",
                    dev.vendor_id,
                    dev.product_id,
                    dev.usage_page,
                    dev.interface_number,
                    dev.product.as_deref().unwrap_or("?")
                );
            }
        }
    }

    Ok(())
}
