//! Serialized ingestion queue.
//!
//! # Responsibilities
//! - Accept tasks without blocking the transport callback
//! - Submit them one at a time, in arrival order
//! - Report per-task outcomes and an idle signal when drained
//!
//! Failed submissions are logged and dropped: no requeue, no backoff.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::ingest::task::IngestionTask;
use crate::ledger::{LedgerSubmitter, TransactionId};
use crate::observability::metrics;

const EVENT_CAPACITY: usize = 256;

/// Observable progress of the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    Started { id: u64 },
    Succeeded { id: u64, tx: TransactionId },
    Failed { id: u64, error: String },
    /// Nothing pending or in flight.
    Idle,
}

/// Producer side of the queue. Cheap to clone.
#[derive(Clone)]
pub struct IngestionQueue {
    tx: mpsc::UnboundedSender<IngestionTask>,
    pending: Arc<AtomicUsize>,
    events: broadcast::Sender<QueueEvent>,
}

impl IngestionQueue {
    /// Start the worker on the current runtime.
    pub fn spawn(submitter: LedgerSubmitter) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = Worker {
            rx,
            submitter,
            pending: pending.clone(),
            events: events.clone(),
        };
        let handle = tokio::spawn(worker.run());

        (
            Self {
                tx,
                pending,
                events,
            },
            handle,
        )
    }

    /// Append `task` to the tail of the queue. Never waits on the ledger.
    pub fn enqueue(&self, task: IngestionTask) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let id = task.id;
        if self.tx.send(task).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(task_id = id, "Ingestion worker stopped, dropping task");
        }
    }

    /// Tasks waiting or in flight.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }
}

struct Worker {
    rx: mpsc::UnboundedReceiver<IngestionTask>,
    submitter: LedgerSubmitter,
    pending: Arc<AtomicUsize>,
    events: broadcast::Sender<QueueEvent>,
}

impl Worker {
    async fn run(mut self) {
        tracing::debug!("Ingestion worker started");

        // The worker is the only writer of the depth gauge.
        while let Some(task) = self.rx.recv().await {
            metrics::record_queue_depth(self.pending.load(Ordering::SeqCst));
            self.process(task).await;

            let remaining = self.pending.fetch_sub(1, Ordering::SeqCst) - 1;
            metrics::record_queue_depth(remaining);
            if remaining == 0 {
                tracing::info!("All tasks have been processed, waiting for more");
                let _ = self.events.send(QueueEvent::Idle);
            }
        }

        tracing::debug!("Ingestion worker stopped");
    }

    async fn process(&self, task: IngestionTask) {
        tracing::info!(task_id = task.id, "Processing task");
        let _ = self.events.send(QueueEvent::Started { id: task.id });

        let started = Instant::now();
        let event = match self.submitter.submit(&task.payload).await {
            Ok(tx) => {
                metrics::record_submission(true, started);
                tracing::info!(task_id = task.id, tx_hash = %tx, "Transfer succeeded");
                QueueEvent::Succeeded { id: task.id, tx }
            }
            Err(e) => {
                metrics::record_submission(false, started);
                tracing::error!(task_id = task.id, error = %e, "Transfer failed, dropping task");
                QueueEvent::Failed {
                    id: task.id,
                    error: e.to_string(),
                }
            }
        };
        let _ = self.events.send(event);
        tracing::debug!(task_id = task.id, "Finished processing task");
    }
}
