//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! connection manager, ingestion worker, ledger client produce:
//!     → logging.rs (structured log events: task_id, tx_hash, topic)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
