//! Bridge from transport messages to the ingestion queue.

use std::sync::Arc;

use crate::ingest::queue::IngestionQueue;
use crate::ingest::task::{IngestionTask, TaskCounter};
use crate::observability::metrics;
use crate::transport::MessageHandler;

/// Turns each inbound message into a numbered task and enqueues it.
#[derive(Clone)]
pub struct QueueForwarder {
    counter: Arc<TaskCounter>,
    queue: IngestionQueue,
}

impl QueueForwarder {
    pub fn new(counter: Arc<TaskCounter>, queue: IngestionQueue) -> Self {
        Self { counter, queue }
    }
}

impl MessageHandler for QueueForwarder {
    fn on_message(&self, topic: &str, payload: &[u8]) {
        let task = IngestionTask::from_bytes(self.counter.next_id(), payload);
        tracing::info!(task_id = task.id, topic = %topic, payload = %task.payload, "Adding task");
        metrics::record_task_received();
        self.queue.enqueue(task);
    }
}
