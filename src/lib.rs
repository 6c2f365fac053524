//! MQTT to IOTA ledger bridge library.

pub mod config;
pub mod ingest;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod transport;

pub use config::schema::BridgeConfig;
pub use lifecycle::{Bridge, BridgeError, Shutdown};
