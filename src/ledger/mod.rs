//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! payload text
//!     → submitter.rs (transfer descriptor: address, value 0, message, tag)
//!     → trytes.rs (transport encoding)
//!     → bundle.rs (transaction trytes, bundle hash via kerl.rs)
//!     → client.rs (tips → attachToTangle → store → broadcast)
//!     → transaction hash via curl.rs
//! ```
//!
//! # Constraints
//! - Value is always zero; the ledger only carries data
//! - Depth and minimum weight magnitude are fixed for the process lifetime
//! - Never log the seed

pub mod bundle;
pub mod client;
pub mod curl;
pub mod kerl;
pub mod submitter;
pub mod trytes;
pub mod types;

pub use client::{LedgerApi, NodeClient};
pub use submitter::LedgerSubmitter;
pub use types::{
    LedgerError, LedgerResult, NodeInfo, SentTransaction, SubmissionConfig, TransactionId,
    Transfer,
};
