//! Connection state machine and message handler attachment.
//!
//! # Responsibilities
//! - Track connection state from transport lifecycle events
//! - Subscribe and gate message acceptance on ledger reachability
//! - Keep exactly one message handler attached across reconnects

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

use crate::ledger::{LedgerApi, LedgerError};
use crate::observability::metrics;
use crate::transport::events::TransportEvent;
use crate::transport::{Transport, TransportError};

/// Connection state for lifecycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    fn gauge_value(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Reconnecting => 3,
        }
    }
}

/// Errors that stop the connection manager.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The readiness check failed after connecting. Fatal; never retried.
    #[error("Ledger unreachable: {0}")]
    LedgerUnreachable(#[source] LedgerError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Receives messages from the live connection.
pub trait MessageHandler: Send + Sync {
    /// Must return quickly; it runs on the transport's event path.
    fn on_message(&self, topic: &str, payload: &[u8]);
}

/// Whether a message handler is attached to the live connection.
#[derive(Default)]
pub struct SubscriptionHandle {
    handler: Option<Arc<dyn MessageHandler>>,
}

impl SubscriptionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.handler.is_some()
    }

    /// Detach the current handler. Returns whether one was attached.
    pub fn detach(&mut self) -> bool {
        self.handler.take().is_some()
    }

    /// Detach whatever is attached, then attach `handler`.
    pub fn reattach(&mut self, handler: Arc<dyn MessageHandler>) {
        if self.detach() {
            tracing::debug!("Detached previous message handler");
        }
        self.handler = Some(handler);
    }

    /// Deliver to the attached handler. Returns false when nothing is attached.
    pub fn dispatch(&self, topic: &str, payload: &[u8]) -> bool {
        match &self.handler {
            Some(handler) => {
                handler.on_message(topic, payload);
                true
            }
            None => false,
        }
    }
}

/// Owns the subscription connection's lifecycle.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    ledger: Arc<dyn LedgerApi>,
    topic: String,
    handler: Arc<dyn MessageHandler>,
    handle: SubscriptionHandle,
    state: ConnectionState,
}

impl ConnectionManager {
    /// Manage `transport`. Starts disconnected; see [`Self::mark_connecting`].
    pub fn new(
        transport: Arc<dyn Transport>,
        ledger: Arc<dyn LedgerApi>,
        topic: impl Into<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            transport,
            ledger,
            topic: topic.into(),
            handler,
            handle: SubscriptionHandle::new(),
            state: ConnectionState::Disconnected,
        }
    }

    /// The transport has begun its first connection attempt.
    pub fn mark_connecting(&mut self) {
        if self.state == ConnectionState::Disconnected {
            self.set_state(ConnectionState::Connecting);
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_handler_attached(&self) -> bool {
        self.handle.is_attached()
    }

    /// The connection object, for the shutdown hook.
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// React to one transport event.
    pub async fn handle_event(&mut self, event: TransportEvent) -> Result<(), ConnectionError> {
        match event {
            TransportEvent::Connected => self.on_connected().await?,
            TransportEvent::Message { topic, payload } => {
                if !self.handle.dispatch(&topic, &payload) {
                    tracing::debug!(topic = %topic, "No message handler attached, dropping message");
                }
            }
            TransportEvent::Closed => {
                self.set_state(ConnectionState::Disconnected);
                tracing::warn!("MQTT disconnected, will try to reconnect");
            }
            TransportEvent::Error(error) => {
                tracing::warn!(error = %error, "MQTT connection error");
            }
            TransportEvent::Reconnecting => {
                self.set_state(ConnectionState::Reconnecting);
                metrics::record_reconnect();
                tracing::info!("MQTT attempting reconnect");
            }
        }
        Ok(())
    }

    async fn on_connected(&mut self) -> Result<(), ConnectionError> {
        self.set_state(ConnectionState::Connected);
        tracing::info!("MQTT connected");

        match self.transport.subscribe(&self.topic).await {
            Ok(()) => tracing::info!(topic = %self.topic, "MQTT subscribed"),
            Err(e) => tracing::warn!(topic = %self.topic, error = %e, "MQTT subscribe failed"),
        }

        match self.ledger.node_info().await {
            Ok(info) => {
                tracing::info!(
                    app_name = info.app_name.as_deref().unwrap_or("unknown"),
                    app_version = info.app_version.as_deref().unwrap_or("unknown"),
                    "Ledger readiness check passed"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "[FATAL] Ledger readiness check failed");
                return Err(ConnectionError::LedgerUnreachable(e));
            }
        }

        self.handle.reattach(self.handler.clone());
        tracing::info!("Starting service");
        Ok(())
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "Connection state changed");
        }
        self.state = state;
        metrics::record_connection_state(state.gauge_value());
    }

    /// Process events until the stream ends, shutdown fires, or a fatal error occurs.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ConnectionError> {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await?,
                    None => {
                        tracing::info!("Transport event stream ended");
                        return Ok(());
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Connection manager received shutdown signal");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerResult, NodeInfo, SentTransaction, Transfer};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedTransport {
        subscriptions: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
            self.subscriptions.lock().unwrap().push(topic.to_string());
            Ok(())
        }

        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    struct StubLedger {
        reachable: bool,
        transfers: AtomicUsize,
    }

    impl StubLedger {
        fn new(reachable: bool) -> Arc<Self> {
            Arc::new(Self {
                reachable,
                transfers: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LedgerApi for StubLedger {
        async fn node_info(&self) -> LedgerResult<NodeInfo> {
            if self.reachable {
                Ok(NodeInfo::default())
            } else {
                Err(LedgerError::Node {
                    status: 503,
                    message: "down".to_string(),
                })
            }
        }

        async fn send_transfer(
            &self,
            _seed: &str,
            _depth: u32,
            _mwm: u32,
            _transfers: &[Transfer],
        ) -> LedgerResult<Vec<SentTransaction>> {
            self.transfers.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
    }

    impl MessageHandler for CountingHandler {
        fn on_message(&self, _topic: &str, _payload: &[u8]) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fixture(
        reachable: bool,
    ) -> (
        ConnectionManager,
        Arc<ScriptedTransport>,
        Arc<StubLedger>,
        Arc<CountingHandler>,
    ) {
        let transport = Arc::new(ScriptedTransport::default());
        let ledger = StubLedger::new(reachable);
        let handler = Arc::new(CountingHandler::default());
        let manager = ConnectionManager::new(
            transport.clone(),
            ledger.clone(),
            "/devices/+",
            handler.clone(),
        );
        (manager, transport, ledger, handler)
    }

    #[test]
    fn reattach_replaces_the_handler() {
        let mut handle = SubscriptionHandle::new();
        let first = Arc::new(CountingHandler::default());
        let second = Arc::new(CountingHandler::default());

        assert!(!handle.detach());
        handle.reattach(first.clone());
        handle.reattach(second.clone());
        assert!(handle.is_attached());
        assert!(handle.dispatch("/t", b"x"));
        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);

        assert!(handle.detach());
        assert!(!handle.dispatch("/t", b"x"));
    }

    #[tokio::test]
    async fn connect_subscribes_and_attaches() {
        let (mut manager, transport, _, handler) = fixture(true);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        manager.mark_connecting();
        assert_eq!(manager.state(), ConnectionState::Connecting);

        manager.handle_event(TransportEvent::Connected).await.unwrap();
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(manager.is_handler_attached());
        assert_eq!(*transport.subscriptions.lock().unwrap(), vec!["/devices/+"]);

        manager
            .handle_event(TransportEvent::message("/devices/AB01", "{}"))
            .await
            .unwrap();
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_reconnects_keep_one_handler() {
        let (mut manager, transport, _, handler) = fixture(true);

        manager.handle_event(TransportEvent::Connected).await.unwrap();
        for _ in 0..5 {
            manager.handle_event(TransportEvent::Closed).await.unwrap();
            assert_eq!(manager.state(), ConnectionState::Disconnected);
            manager
                .handle_event(TransportEvent::Error("connection reset".to_string()))
                .await
                .unwrap();
            manager.handle_event(TransportEvent::Reconnecting).await.unwrap();
            assert_eq!(manager.state(), ConnectionState::Reconnecting);
            manager.handle_event(TransportEvent::Connected).await.unwrap();
        }

        manager
            .handle_event(TransportEvent::message("/devices/AB01", "{\"temp\":1}"))
            .await
            .unwrap();
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.subscriptions.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn failed_readiness_is_fatal_and_submits_nothing() {
        let (mut manager, _, ledger, handler) = fixture(false);

        let err = manager.handle_event(TransportEvent::Connected).await.unwrap_err();
        assert!(matches!(err, ConnectionError::LedgerUnreachable(_)));
        assert!(!manager.is_handler_attached());

        manager
            .handle_event(TransportEvent::message("/devices/AB01", "{}"))
            .await
            .unwrap();
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ledger.transfers.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn messages_before_connect_are_dropped() {
        let (mut manager, _, _, handler) = fixture(true);
        manager
            .handle_event(TransportEvent::message("/devices/AB01", "early"))
            .await
            .unwrap();
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_and_on_fatal() {
        let (manager, _, _, handler) = fixture(true);
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        tx.send(TransportEvent::Connected).unwrap();
        tx.send(TransportEvent::message("/devices/AB01", "a")).unwrap();
        let task = tokio::spawn(manager.run(rx, shutdown_rx));

        tokio::task::yield_now().await;
        while handler.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        shutdown_tx.send(()).unwrap();
        assert!(task.await.unwrap().is_ok());

        let (manager, _, _, _) = fixture(false);
        let (tx, rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        tx.send(TransportEvent::Connected).unwrap();
        let result = manager.run(rx, shutdown_rx).await;
        assert!(matches!(result, Err(ConnectionError::LedgerUnreachable(_))));
    }
}
