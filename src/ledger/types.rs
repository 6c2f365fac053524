//! Ledger-specific types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::schema::LedgerConfig;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// HTTP connection or request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with an error response.
    #[error("Node error ({status}): {message}")]
    Node { status: u16, message: String },

    /// The node answered with a body we could not interpret.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid node URL.
    #[error("Invalid node URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A field that must be trytes was not.
    #[error("Invalid trytes in {0}")]
    InvalidTrytes(&'static str),

    /// Address length is not 81 or 90 trytes.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Tag encodes to more than 27 trytes.
    #[error("Tag too long: {0} trytes")]
    InvalidTag(usize),

    /// The node returned no transactions for an attached bundle.
    #[error("Attachment returned no transactions")]
    EmptyAttachment,
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Hash of a transaction, 81 trytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single transfer descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Target address, checksum stripped (81 trytes).
    pub address: String,
    /// Value moved. Always zero for data transfers.
    pub value: i64,
    /// Message already encoded as trytes.
    pub message: String,
    /// Tag already encoded as trytes.
    pub tag: String,
}

/// A transaction the node accepted, as returned by a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: TransactionId,
    /// Position within its bundle; 0 is the tail.
    pub current_index: u64,
    pub trytes: String,
}

/// Subset of the node's `getNodeInfo` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub latest_milestone_index: Option<u64>,
    #[serde(default)]
    pub latest_solid_subtangle_milestone_index: Option<u64>,
    #[serde(default)]
    pub neighbors: Option<u32>,
}

/// Immutable parameters shared by every submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionConfig {
    pub address: String,
    pub seed: String,
    pub tag: String,
    pub depth: u32,
    pub min_weight_magnitude: u32,
}

impl From<&LedgerConfig> for SubmissionConfig {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            address: config.address.clone(),
            seed: config.seed.clone(),
            tag: config.tag.clone(),
            depth: config.depth,
            min_weight_magnitude: config.min_weight_magnitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_config_copies_ledger_settings() {
        let ledger = LedgerConfig::default();
        let config = SubmissionConfig::from(&ledger);
        assert_eq!(config.address, ledger.address);
        assert_eq!(config.tag, "iota-mqtt-poc");
        assert_eq!(config.depth, 9);
        assert_eq!(config.min_weight_magnitude, 18);
    }

    #[test]
    fn node_info_tolerates_missing_fields() {
        let info: NodeInfo =
            serde_json::from_str(r#"{"appName":"IRI","appVersion":"1.8.6","duration":0}"#).unwrap();
        assert_eq!(info.app_name.as_deref(), Some("IRI"));
        assert!(info.latest_milestone_index.is_none());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Node {
            status: 400,
            message: "Invalid depth input".to_string(),
        };
        assert_eq!(err.to_string(), "Node error (400): Invalid depth input");
    }
}
