//! Ingestion bridge.
//!
//! External agents push candidate records at any time. The bridge validates the payload just
//! enough to build a record, queues it as Pending and acknowledges straight away, so the caller's
//! latency never depends on the durable backend. Operators later review the queue and commit it
//! through the [`CommitGateway`], which mirrors what it commits, marked Validated, in a
//! process-lifetime [`SessionStore`]. Operators can also queue a record from their own session.

use crate::gateway::{CommitGateway, CommitReport};
use crate::queue::PendingQueue;
use crate::record::CandidateRecord;
use crate::score::Score;
use crate::session::SessionStore;
use crate::{ScoutError, ScoutResult};
use scout_types::NonEmptyText;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Record fields as supplied by an external caller. Only `name` and `score` are required.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct IngestPayload {
    pub name: Option<String>,
    /// A number, or a string holding one.
    pub score: Option<serde_json::Value>,
    pub identifier: Option<String>,
    pub category: Option<String>,
    pub reference_url: Option<String>,
    pub raw_text: Option<String>,
}

impl IngestPayload {
    /// Validates the payload and builds a Pending record from it.
    ///
    /// The name must be non-empty and single-line; the score must be numeric and is rounded and
    /// clamped into range. Absent optional fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::MalformedPayload` describing the first problem found.
    pub fn into_record(self) -> ScoutResult<CandidateRecord> {
        let name = self
            .name
            .ok_or_else(|| ScoutError::MalformedPayload("missing field `name`".into()))?;
        let name = NonEmptyText::single_line(name)
            .map_err(|e| ScoutError::MalformedPayload(format!("invalid `name`: {e}")))?;

        let score = match self.score {
            None | Some(serde_json::Value::Null) => {
                return Err(ScoutError::MalformedPayload("missing field `score`".into()))
            }
            Some(value) => parse_score(&value).ok_or_else(|| {
                ScoutError::MalformedPayload(format!("`score` is not a number: {value}"))
            })?,
        };

        Ok(CandidateRecord::from_parts(
            name.into_string(),
            score,
            self.identifier,
            self.category,
            self.reference_url,
            self.raw_text,
        ))
    }
}

fn parse_score(value: &serde_json::Value) -> Option<Score> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then(|| Score::from_f64(number))
}

/// Acknowledgement for a queued record.
#[derive(Clone, Debug)]
pub struct Receipt {
    pub id: Uuid,
    /// Queue length including this record.
    pub queued: usize,
}

pub struct IngestionBridge {
    queue: Arc<PendingQueue>,
    gateway: CommitGateway,
}

impl IngestionBridge {
    pub fn new(gateway: CommitGateway) -> Self {
        Self {
            queue: Arc::new(PendingQueue::new()),
            gateway,
        }
    }

    pub fn backend(&self) -> String {
        self.gateway.backend()
    }

    /// Validates `payload` and queues it for review. Does not touch the backend.
    pub fn receive(&self, payload: IngestPayload) -> ScoutResult<Receipt> {
        let record = payload.into_record()?;
        Ok(self.enqueue(record))
    }

    /// Queues an already-built record (for example one produced by the pipeline).
    pub fn enqueue(&self, record: CandidateRecord) -> Receipt {
        let id = record.id;
        let name = record.name.clone();
        let queued = self.queue.push(record);
        tracing::info!("queued {:?} for review ({} pending)", name, queued);
        Receipt { id, queued }
    }

    /// Queues the first record in `session` called `name` for review.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::SessionRecordNotFound` if no record has that name, or
    /// `ScoutError::AlreadyPending` if that record is already queued.
    pub fn queue_from_session(&self, session: &SessionStore, name: &str) -> ScoutResult<Receipt> {
        let record = session.require_by_name(name)?;
        let id = record.id;
        let queued = self
            .queue
            .push_if_absent(record)
            .ok_or(ScoutError::AlreadyPending(id))?;
        tracing::info!("queued session record {:?} for review ({} pending)", name, queued);
        Ok(Receipt { id, queued })
    }

    /// Validates `payload` and writes it straight to the backend, bypassing the queue.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::MalformedPayload` for a bad payload, or a backend error if the write
    /// fails. Nothing is queued or mirrored on failure.
    pub async fn save(&self, payload: IngestPayload) -> ScoutResult<CandidateRecord> {
        let record = payload.into_record()?;
        let written = self.gateway.write(std::slice::from_ref(&record)).await?;
        written
            .into_iter()
            .next()
            .ok_or_else(|| ScoutError::BackendUnavailable("backend accepted no rows".into()))
    }

    pub fn pending(&self) -> Vec<CandidateRecord> {
        self.queue.snapshot()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Discards every pending record and returns how many were dropped.
    pub fn clear_pending(&self) -> usize {
        let dropped = self.queue.clear().len();
        tracing::info!("cleared {} pending record(s)", dropped);
        dropped
    }

    pub async fn commit_all(&self) -> ScoutResult<CommitReport> {
        self.gateway.commit_all(&self.queue).await
    }

    pub async fn commit_one(&self, id: Uuid) -> ScoutResult<CommitReport> {
        self.gateway.commit_one(&self.queue, id).await
    }

    /// Validated records written during this process's lifetime.
    pub fn committed(&self) -> &SessionStore {
        self.gateway.committed()
    }
}
