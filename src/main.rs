//! MQTT to IOTA ledger bridge.
//!
//! # Architecture Overview
//!
//! ```text
//!     MQTT broker
//!         │  /devices/+
//!         ▼
//!  ┌──────────────┐   Connected    ┌──────────────────┐
//!  │  transport   │──────────────▶│ readiness check  │──▶ exit 1 on failure
//!  │  (rumqttc)   │               │  (getNodeInfo)   │
//!  └──────┬───────┘               └──────────────────┘
//!         │ Message
//!         ▼
//!  ┌──────────────┐   FIFO, one    ┌──────────────────┐
//!  │   ingest     │──────────────▶│ ledger submitter │──▶ IOTA node
//!  │   queue      │   in flight    │ (zero-value tx)  │
//!  └──────────────┘               └──────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use tangle_bridge::config::{self, ObservabilityConfig};
use tangle_bridge::ledger::NodeClient;
use tangle_bridge::observability::{logging, metrics};
use tangle_bridge::{Bridge, BridgeError};

#[derive(Parser)]
#[command(name = "tangle-bridge")]
#[command(about = "Forward MQTT messages to the IOTA ledger as zero-value transactions", long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(short, long, env = "BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Check that the ledger node is reachable, then exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            let err = BridgeError::from(e);
            tracing::error!(error = %err, "Refusing to start");
            return ExitCode::from(err.exit_code());
        }
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability);
    tracing::info!("tangle-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(address) = &config.observability.metrics_address {
        match address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = match NodeClient::new(&config.ledger) {
        Ok(client) => client,
        Err(e) => {
            let err = BridgeError::LedgerSetup(e);
            tracing::error!(error = %err, "Refusing to start");
            return ExitCode::from(err.exit_code());
        }
    };
    tracing::info!(
        node = %client.endpoint(),
        mqtt_url = %config.mqtt.url,
        topic = %config.mqtt.topic,
        "Configuration loaded"
    );

    let bridge = Bridge::new(config, Arc::new(client));

    let result = if cli.check {
        bridge.check_ledger().await.map(|info| {
            tracing::info!(
                app_name = info.app_name.as_deref().unwrap_or("unknown"),
                app_version = info.app_version.as_deref().unwrap_or("unknown"),
                "Ledger node reachable"
            );
        })
    } else {
        bridge.run().await
    };

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Exiting");
            ExitCode::from(e.exit_code())
        }
    }
}
