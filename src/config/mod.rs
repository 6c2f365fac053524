//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment keys, e.g. MQTT_FULL_URL, IOTA_SEED (loader.rs)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the process reads it exactly once
//! - All fields have defaults so an empty environment still starts
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{BridgeConfig, LedgerConfig, LogFormat, MqttConfig, ObservabilityConfig};
pub use validation::ValidationError;
