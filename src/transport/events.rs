//! Lifecycle and message events delivered by a transport.

/// One event from the subscription connection, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The broker accepted the connection.
    Connected,
    /// A message arrived on a subscribed topic.
    Message { topic: String, payload: Vec<u8> },
    /// The connection was lost or closed.
    Closed,
    /// A transport-level error; reconnection follows.
    Error(String),
    /// A reconnection attempt is starting.
    Reconnecting,
}

impl TransportEvent {
    pub fn message(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        TransportEvent::Message {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}
