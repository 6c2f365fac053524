//! Ledger submission: one payload in, one zero-value transaction out.

use std::sync::Arc;

use crate::ledger::client::LedgerApi;
use crate::ledger::trytes;
use crate::ledger::types::{
    LedgerError, LedgerResult, SubmissionConfig, TransactionId, Transfer,
};

/// Wraps a single ledger transfer call for the ingestion worker.
#[derive(Clone)]
pub struct LedgerSubmitter {
    api: Arc<dyn LedgerApi>,
    config: Arc<SubmissionConfig>,
}

impl LedgerSubmitter {
    pub fn new(api: Arc<dyn LedgerApi>, config: Arc<SubmissionConfig>) -> Self {
        Self { api, config }
    }

    /// Build the single transfer descriptor for `payload`.
    pub fn transfer_for(&self, payload: &str) -> Transfer {
        Transfer {
            address: trytes::no_checksum(&self.config.address).to_string(),
            value: 0,
            message: trytes::encode(payload.as_bytes()),
            tag: trytes::encode(self.config.tag.as_bytes()),
        }
    }

    /// Record `payload` on the ledger and return the resulting transaction hash.
    ///
    /// Errors from the network are returned unchanged; nothing is retried.
    pub async fn submit(&self, payload: &str) -> LedgerResult<TransactionId> {
        let transfers = [self.transfer_for(payload)];
        let sent = self
            .api
            .send_transfer(
                &self.config.seed,
                self.config.depth,
                self.config.min_weight_magnitude,
                &transfers,
            )
            .await?;

        sent.into_iter()
            .next()
            .map(|tx| tx.hash)
            .ok_or(LedgerError::EmptyAttachment)
    }
}

impl std::fmt::Debug for LedgerSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerSubmitter")
            .field("address", &self.config.address)
            .field("depth", &self.config.depth)
            .field("min_weight_magnitude", &self.config.min_weight_magnitude)
            .finish()
    }
}
