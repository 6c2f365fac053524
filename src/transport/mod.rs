//! Subscription transport subsystem.
//!
//! # Data Flow
//! ```text
//! broker
//!     → mqtt.rs (rumqttc event loop, fixed-interval reconnect)
//!     → events.rs (Connected / Message / Closed / Error / Reconnecting)
//!     → connection.rs (state machine, readiness gate, handler attachment)
//!     → MessageHandler (forwards to the ingestion queue)
//!
//! Connection States:
//!     Disconnected → Connecting → Connected ⇄ Reconnecting → Connected …
//! ```
//!
//! # Design Decisions
//! - Data flows one way; nothing is published back to the broker
//! - Reconnection belongs to the transport; the manager only reacts
//! - Exactly one handler is attached no matter how many reconnects happen

use async_trait::async_trait;
use thiserror::Error;

pub mod connection;
pub mod events;
pub mod mqtt;

pub use connection::{
    ConnectionError, ConnectionManager, ConnectionState, MessageHandler, SubscriptionHandle,
};
pub use events::TransportEvent;
pub use mqtt::{MqttEndpoint, MqttTransport};

/// Errors raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Invalid broker URL: {0}")]
    InvalidUrl(String),

    #[error("Client error: {0}")]
    Client(String),
}

/// Commands the connection manager and shutdown hook issue to a live connection.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}
