//! Ingestion subsystem.
//!
//! # Data Flow
//! ```text
//! MessageHandler::on_message (forwarder.rs)
//!     → task.rs (next id, payload text)
//!     → queue.rs (FIFO, one submission in flight)
//!     → LedgerSubmitter
//!     → QueueEvent (Started / Succeeded / Failed / Idle)
//! ```
//!
//! # Design Decisions
//! - Enqueue never blocks the transport event path
//! - The queue is unbounded and lives only in memory

pub mod forwarder;
pub mod queue;
pub mod task;

pub use forwarder::QueueForwarder;
pub use queue::{IngestionQueue, QueueEvent};
pub use task::{IngestionTask, TaskCounter};
