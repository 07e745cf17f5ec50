//! Commit gateway.
//!
//! Moves pending records into the durable backend on explicit operator action. A commit works on
//! a snapshot of the queue:
//!
//! 1. copy the records to commit (queue lock held only for the copy),
//! 2. append their rows to the backend in one batch,
//! 3. on success, remove exactly those ids from the queue.
//!
//! A failed append leaves the queue exactly as it was, so the operator can retry. Records that
//! arrive while a commit is in flight are not part of it and stay queued. Every accepted row is
//! also mirrored, marked Validated, in the gateway's committed store.
//!
//! Every backend write runs to completion in its own task while holding the commit lock. A caller
//! that stops waiting (a dropped request, a client-side timeout) does not cancel the write or the
//! queue update that follows it, and the next commit waits for that write to settle before it
//! takes its snapshot. The gateway never reports a failure for a write that can still land.
//! Bounding slow backends is the sink's job; see [`HttpRowSink`](crate::sink::HttpRowSink).

use crate::queue::PendingQueue;
use crate::record::{BackendRow, CandidateRecord};
use crate::session::SessionStore;
use crate::sink::RowSink;
use crate::{ScoutError, ScoutResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Result of a successful commit.
#[derive(Clone, Debug)]
pub struct CommitReport {
    /// Committed records, marked Validated, in queue order.
    pub committed: Vec<CandidateRecord>,
    /// Queue length after the committed records were removed.
    pub remaining: usize,
}

pub struct CommitGateway {
    sink: Arc<dyn RowSink>,
    committed: Arc<SessionStore>,
    commit_lock: Arc<Mutex<()>>,
}

impl CommitGateway {
    pub fn new(sink: Arc<dyn RowSink>) -> Self {
        Self {
            sink,
            committed: Arc::new(SessionStore::new()),
            commit_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn backend(&self) -> String {
        self.sink.describe()
    }

    /// Validated records written during this process's lifetime.
    pub fn committed(&self) -> &SessionStore {
        &self.committed
    }

    /// Appends `records` to the backend as Validated rows without touching any queue.
    ///
    /// Serialized with commits. Returns the Validated copies on success.
    ///
    /// # Errors
    ///
    /// Returns a backend error (`BackendUnavailable`, `BackendTimeout`, …) if the append fails.
    pub async fn write(&self, records: &[CandidateRecord]) -> ScoutResult<Vec<CandidateRecord>> {
        let sink = self.sink.clone();
        let committed = self.committed.clone();
        let records = records.to_vec();
        self.run_locked(async move { append(sink.as_ref(), &committed, &records).await })
            .await
    }

    /// Commits every record currently in `queue`.
    ///
    /// An empty queue is a successful no-op.
    pub async fn commit_all(&self, queue: &Arc<PendingQueue>) -> ScoutResult<CommitReport> {
        let sink = self.sink.clone();
        let committed = self.committed.clone();
        let queue = queue.clone();
        self.run_locked(async move {
            let snapshot = queue.snapshot();
            commit_snapshot(sink.as_ref(), &committed, &queue, snapshot).await
        })
        .await
    }

    /// Commits the single queued record with `id`.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::PendingRecordNotFound` if no queued record has that id, or a
    /// backend error if the append fails.
    pub async fn commit_one(&self, queue: &Arc<PendingQueue>, id: Uuid) -> ScoutResult<CommitReport> {
        let sink = self.sink.clone();
        let committed = self.committed.clone();
        let queue = queue.clone();
        self.run_locked(async move {
            let record = queue.get(id).ok_or(ScoutError::PendingRecordNotFound(id))?;
            commit_snapshot(sink.as_ref(), &committed, &queue, vec![record]).await
        })
        .await
    }

    /// Takes the commit lock and runs `work` in a detached task that owns the guard.
    async fn run_locked<T>(
        &self,
        work: impl Future<Output = ScoutResult<T>> + Send + 'static,
    ) -> ScoutResult<T>
    where
        T: Send + 'static,
    {
        let guard: OwnedMutexGuard<()> = self.commit_lock.clone().lock_owned().await;
        tokio::spawn(async move {
            let result = work.await;
            drop(guard);
            result
        })
        .await
        .map_err(|e| ScoutError::BackendUnavailable(format!("commit task failed: {e}")))?
    }
}

async fn append(
    sink: &dyn RowSink,
    committed: &SessionStore,
    records: &[CandidateRecord],
) -> ScoutResult<Vec<CandidateRecord>> {
    let validated: Vec<CandidateRecord> = records.iter().map(CandidateRecord::validated).collect();
    if validated.is_empty() {
        return Ok(validated);
    }

    let rows: Vec<BackendRow> = validated.iter().map(CandidateRecord::to_row).collect();
    match sink.append_rows(&rows).await {
        Ok(()) => {
            tracing::info!("committed {} row(s) to {}", rows.len(), sink.describe());
            committed.extend(validated.iter().cloned());
            Ok(validated)
        }
        Err(e) => {
            tracing::error!("commit to {} failed: {}", sink.describe(), e);
            Err(e)
        }
    }
}

async fn commit_snapshot(
    sink: &dyn RowSink,
    mirror: &SessionStore,
    queue: &PendingQueue,
    snapshot: Vec<CandidateRecord>,
) -> ScoutResult<CommitReport> {
    let committed = append(sink, mirror, &snapshot).await?;
    let ids: Vec<Uuid> = snapshot.iter().map(|r| r.id).collect();
    queue.remove_committed(&ids);

    Ok(CommitReport {
        committed,
        remaining: queue.len(),
    })
}
