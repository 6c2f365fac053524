//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check ledger fields are expressible in trytes
//! - Check the broker URL and node host parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::BridgeConfig;
use crate::ledger::trytes::{self, ADDRESS_LENGTH, ADDRESS_WITH_CHECKSUM_LENGTH, TAG_LENGTH};
use crate::transport::mqtt::MqttEndpoint;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("mqtt.url: {0}")]
    MqttUrl(String),

    #[error("mqtt.topic must not be empty")]
    EmptyTopic,

    #[error("mqtt.reconnect_period_ms must be greater than zero")]
    ZeroReconnectPeriod,

    #[error("ledger.host: {0}")]
    LedgerHost(String),

    #[error("ledger.address must be {ADDRESS_LENGTH} or {ADDRESS_WITH_CHECKSUM_LENGTH} trytes")]
    Address,

    #[error("ledger.seed must be 1 to {ADDRESS_LENGTH} trytes")]
    Seed,

    #[error("ledger.tag encodes to {0} trytes, at most {TAG_LENGTH} allowed")]
    TagTooLong(usize),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = MqttEndpoint::parse(&config.mqtt.url) {
        errors.push(ValidationError::MqttUrl(e.to_string()));
    }
    if config.mqtt.topic.trim().is_empty() {
        errors.push(ValidationError::EmptyTopic);
    }
    if config.mqtt.reconnect_period_ms == 0 {
        errors.push(ValidationError::ZeroReconnectPeriod);
    }

    match url::Url::parse(&config.ledger.host) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::LedgerHost(format!(
            "unsupported scheme '{}'",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError::LedgerHost(e.to_string())),
    }

    let address = &config.ledger.address;
    if !trytes::is_trytes(address)
        || !(address.len() == ADDRESS_LENGTH || address.len() == ADDRESS_WITH_CHECKSUM_LENGTH)
    {
        errors.push(ValidationError::Address);
    }

    let seed = &config.ledger.seed;
    if seed.is_empty() || seed.len() > ADDRESS_LENGTH || !trytes::is_trytes(seed) {
        errors.push(ValidationError::Seed);
    }

    let tag_len = trytes::encoded_len(config.ledger.tag.as_bytes());
    if tag_len > TAG_LENGTH {
        errors.push(ValidationError::TagTooLong(tag_len));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
