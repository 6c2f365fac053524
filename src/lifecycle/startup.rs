//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the submission client and ingestion queue from configuration
//! - Open the subscription connection and hand it to the connection manager
//! - Run until a termination signal or a fatal readiness failure
//! - Run the shutdown hook on the way out

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{BridgeConfig, ConfigError};
use crate::ingest::{IngestionQueue, QueueForwarder, TaskCounter};
use crate::ledger::{LedgerApi, LedgerError, LedgerSubmitter, NodeInfo, SubmissionConfig};
use crate::lifecycle::shutdown::{Shutdown, ShutdownHook};
use crate::lifecycle::signals;
use crate::transport::{
    ConnectionError, ConnectionManager, MqttTransport, Transport, TransportEvent,
};

/// Top-level failures, each mapped to a process exit code.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger client setup failed: {0}")]
    LedgerSetup(#[source] LedgerError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl BridgeError {
    /// 1 for an unreachable ledger, 2 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            BridgeError::Connection(ConnectionError::LedgerUnreachable(_)) => 1,
            _ => 2,
        }
    }
}

/// The running service: one connection, one queue, one ledger client.
pub struct Bridge {
    config: BridgeConfig,
    ledger: Arc<dyn LedgerApi>,
    counter: Arc<TaskCounter>,
    shutdown: Shutdown,
}

impl Bridge {
    pub fn new(config: BridgeConfig, ledger: Arc<dyn LedgerApi>) -> Self {
        Self {
            config,
            ledger,
            counter: Arc::new(TaskCounter::new()),
            shutdown: Shutdown::new(),
        }
    }

    /// Tasks created so far.
    pub fn tasks_issued(&self) -> u64 {
        self.counter.issued()
    }

    /// One readiness check, without connecting to the broker.
    pub async fn check_ledger(&self) -> Result<NodeInfo, BridgeError> {
        self.ledger
            .node_info()
            .await
            .map_err(|e| BridgeError::Connection(ConnectionError::LedgerUnreachable(e)))
    }

    /// Connect to the configured broker and serve until SIGINT/SIGTERM.
    pub async fn run(&self) -> Result<(), BridgeError> {
        let (transport, events) =
            MqttTransport::connect(&self.config.mqtt).map_err(ConnectionError::from)?;
        tracing::info!(client_id = %transport.client_id(), "MQTT client created");
        self.serve(Arc::new(transport), events, signals::wait_for_termination())
            .await
    }

    /// Serve `events` from `transport` until `signal` resolves or the
    /// readiness check fails. The shutdown hook runs in both cases.
    pub async fn serve<F>(
        &self,
        transport: Arc<dyn Transport>,
        events: mpsc::UnboundedReceiver<TransportEvent>,
        signal: F,
    ) -> Result<(), BridgeError>
    where
        F: Future<Output = ()>,
    {
        let submission = Arc::new(SubmissionConfig::from(&self.config.ledger));
        let submitter = LedgerSubmitter::new(self.ledger.clone(), submission);
        let (queue, worker) = IngestionQueue::spawn(submitter);

        let forwarder = QueueForwarder::new(self.counter.clone(), queue.clone());
        let mut manager = ConnectionManager::new(
            transport.clone(),
            self.ledger.clone(),
            self.config.mqtt.topic.clone(),
            Arc::new(forwarder),
        );
        manager.mark_connecting();

        tracing::info!(topic = %self.config.mqtt.topic, "Bridge starting");

        let managed = manager.run(events, self.shutdown.subscribe());
        tokio::pin!(managed);
        tokio::pin!(signal);

        let result = tokio::select! {
            result = &mut managed => result.map_err(BridgeError::from),
            _ = &mut signal => {
                self.shutdown.trigger();
                managed.await.map_err(BridgeError::from)
            }
        };

        if let Err(e) = &result {
            tracing::error!(error = %e, "Bridge stopped");
        }

        ShutdownHook::new(Some(transport)).run().await;

        let abandoned = queue.pending();
        if abandoned > 0 {
            tracing::warn!(tasks = abandoned, "Abandoning queued tasks");
        }
        worker.abort();

        result
    }
}
