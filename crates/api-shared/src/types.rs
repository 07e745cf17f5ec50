//! Request and response bodies for the REST API.
//!
//! These are plain wire shapes: ids and timestamps travel as strings, tiers and statuses as their
//! display labels. Conversion from the core domain types happens in `api-rest`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
    /// Records waiting in the pending review queue
    pub pending: usize,
    /// Where commits are written
    pub backend: String,
}

/// Outcome label returned by the ingestion and commit endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
    Received,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordRes {
    pub id: String,
    pub name: String,
    pub identifier: String,
    pub category: String,
    pub score: u8,
    pub tier: String,
    pub status: String,
    pub reference_url: String,
    pub raw_text: String,
    pub received_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListRecordsRes {
    pub count: usize,
    pub records: Vec<RecordRes>,
}

/// A candidate pushed by an external agent. `name` and `score` are required.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct IngestReq {
    pub name: Option<String>,
    /// Number, or a string holding a number
    #[schema(value_type = Option<f64>)]
    pub score: Option<serde_json::Value>,
    pub identifier: Option<String>,
    pub category: Option<String>,
    pub reference_url: Option<String>,
    pub raw_text: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestRes {
    pub status: OutcomeStatus,
    pub id: Option<String>,
    /// Pending queue length after this record was queued
    pub queued: Option<usize>,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CommitRes {
    pub status: OutcomeStatus,
    pub committed: Vec<RecordRes>,
    /// Records still pending after the commit
    pub remaining: usize,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearRes {
    pub cleared: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchReq {
    pub query: String,
    /// Keep the current session records instead of replacing them
    #[serde(default)]
    pub append: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ParseReq {
    pub raw_text: String,
    #[serde(default)]
    pub append: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchRes {
    pub records: Vec<RecordRes>,
    /// Non-fatal scoring notices
    pub notices: Vec<String>,
    /// Session size after the batch was stored
    pub session_size: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct InviteReq {
    pub name: String,
}

/// Names a session record to queue for review.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QueueReq {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct InviteRes {
    pub record: RecordRes,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub status: OutcomeStatus,
    pub message: String,
}

impl ErrorRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: message.into(),
        }
    }
}
