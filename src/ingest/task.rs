//! Ingestion tasks and their id source.

use std::sync::atomic::{AtomicU64, Ordering};

/// One inbound message awaiting submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionTask {
    pub id: u64,
    pub payload: String,
}

impl IngestionTask {
    /// Build a task from raw transport bytes, replacing invalid UTF-8.
    pub fn from_bytes(id: u64, payload: &[u8]) -> Self {
        Self {
            id,
            payload: String::from_utf8_lossy(payload).into_owned(),
        }
    }
}

/// Monotonic task id source. The first id handed out is 1.
#[derive(Debug, Default)]
pub struct TaskCounter {
    last: AtomicU64,
}

impl TaskCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn ids_start_at_one_and_increase() {
        let counter = TaskCounter::new();
        assert_eq!(counter.next_id(), 1);
        assert_eq!(counter.next_id(), 2);
        assert_eq!(counter.issued(), 2);
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let counter = Arc::new(TaskCounter::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || (0..250).map(|_| counter.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 1000);
        assert_eq!(ids.last(), Some(&1000));
    }

    #[test]
    fn lossy_payload() {
        let task = IngestionTask::from_bytes(7, &[b'o', b'k', 0xFF]);
        assert_eq!(task.id, 7);
        assert!(task.payload.starts_with("ok"));
    }
}
