//! Shutdown coordination and connection teardown.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::transport::Transport;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes the subscription connection on termination.
///
/// Queued and in-flight ingestion tasks are not awaited.
pub struct ShutdownHook {
    connection: Option<Arc<dyn Transport>>,
}

impl ShutdownHook {
    pub fn new(connection: Option<Arc<dyn Transport>>) -> Self {
        Self { connection }
    }

    /// Best effort: close errors are logged, never returned.
    pub async fn run(self) {
        tracing::info!("Cleaning up");

        let Some(connection) = self.connection else {
            return;
        };
        match connection.close().await {
            Ok(()) => tracing::info!("Closed MQTT client"),
            Err(e) => tracing::warn!(error = %e, "Failed to close MQTT client"),
        }
    }
}
