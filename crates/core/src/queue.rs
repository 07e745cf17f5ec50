//! Pending review queue.
//!
//! Records received by the ingestion bridge wait here until an operator commits them. The queue is
//! the only shared structure between the request-handling side (many concurrent producers) and the
//! operator side (the single consumer), so every access goes through one mutex and every critical
//! section is purely in-memory. Nothing here ever awaits while holding the lock.

use crate::record::CandidateRecord;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct PendingQueue {
    records: Mutex<Vec<CandidateRecord>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CandidateRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a record and returns the queue length after the append.
    pub fn push(&self, record: CandidateRecord) -> usize {
        let mut records = self.lock();
        records.push(record);
        records.len()
    }

    /// Appends `record` unless a record with the same id is already queued.
    ///
    /// Returns the queue length after the append, or `None` if the record was already present.
    pub fn push_if_absent(&self, record: CandidateRecord) -> Option<usize> {
        let mut records = self.lock();
        if records.iter().any(|r| r.id == record.id) {
            return None;
        }
        records.push(record);
        Some(records.len())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every queued record in arrival order.
    pub fn snapshot(&self) -> Vec<CandidateRecord> {
        self.lock().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<CandidateRecord> {
        self.lock().iter().find(|r| r.id == id).cloned()
    }

    /// Removes exactly the records whose ids are in `ids` and returns how many were removed.
    ///
    /// Records appended after the caller took its snapshot are left in place.
    pub fn remove_committed(&self, ids: &[Uuid]) -> usize {
        let ids: HashSet<&Uuid> = ids.iter().collect();
        let mut records = self.lock();
        let before = records.len();
        records.retain(|r| !ids.contains(&r.id));
        before - records.len()
    }

    /// Discards every queued record and returns them.
    pub fn clear(&self) -> Vec<CandidateRecord> {
        std::mem::take(&mut *self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Score;
    use std::sync::Arc;

    fn record(name: &str) -> CandidateRecord {
        CandidateRecord::from_parts(name.into(), Score::clamped(70), None, None, None, None)
    }

    #[test]
    fn remove_committed_keeps_later_arrivals() {
        let queue = PendingQueue::new();
        queue.push(record("A"));
        queue.push(record("B"));
        let snapshot = queue.snapshot();
        queue.push(record("C"));

        let ids: Vec<Uuid> = snapshot.iter().map(|r| r.id).collect();
        assert_eq!(queue.remove_committed(&ids), 2);

        let left = queue.snapshot();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "C");
    }

    #[test]
    fn push_if_absent_rejects_same_id() {
        let queue = PendingQueue::new();
        let first = record("A");
        assert_eq!(queue.push_if_absent(first.clone()), Some(1));
        assert_eq!(queue.push_if_absent(first), None);
        assert_eq!(queue.push_if_absent(record("A")), Some(2));
    }

    #[test]
    fn clear_returns_discarded_records() {
        let queue = PendingQueue::new();
        queue.push(record("A"));
        let discarded = queue.clear();
        assert_eq!(discarded.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn concurrent_pushes_are_not_lost() {
        let queue = Arc::new(PendingQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        queue.push(record(&format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 400);
    }
}
