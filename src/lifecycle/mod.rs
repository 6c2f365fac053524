//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Ledger client → Ingestion queue → Connection manager
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop event loop → Close connection → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - The queue is not drained on shutdown; pending tasks are abandoned
//! - A failed readiness check still runs the shutdown hook before exit

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownHook};
pub use startup::{Bridge, BridgeError};
