//! Candidate records.

use crate::constants::{DEFAULT_CATEGORY, DEFAULT_IDENTIFIER};
use crate::extract::ExtractedFields;
use crate::score::{Assessment, Score, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Whether a record has reached durable storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    Pending,
    Validated,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "Pending",
            RecordStatus::Validated => "Validated",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scored candidate.
///
/// `tier` is kept in lockstep with `score`; the only constructors derive it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CandidateRecord {
    pub id: Uuid,
    pub name: String,
    pub identifier: String,
    pub category: String,
    score: Score,
    tier: Tier,
    pub reference_url: String,
    pub raw_text: String,
    status: RecordStatus,
    pub received_at: DateTime<Utc>,
}

impl CandidateRecord {
    /// Builds a pending record from a fragment's extracted fields and its assessment.
    pub fn from_fragment(fields: ExtractedFields, assessment: &Assessment, raw_text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: fields.name,
            identifier: fields.identifier,
            category: fields.category,
            score: assessment.score,
            tier: assessment.tier,
            reference_url: fields.reference_url,
            raw_text: raw_text.to_string(),
            status: RecordStatus::Pending,
            received_at: Utc::now(),
        }
    }

    /// Builds a pending record from caller-supplied values, defaulting the optional ones.
    pub fn from_parts(
        name: String,
        score: Score,
        identifier: Option<String>,
        category: Option<String>,
        reference_url: Option<String>,
        raw_text: Option<String>,
    ) -> Self {
        let or_default = |value: Option<String>, default: &str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            id: Uuid::new_v4(),
            name,
            identifier: or_default(identifier, DEFAULT_IDENTIFIER),
            category: or_default(category, DEFAULT_CATEGORY),
            score,
            tier: score.tier(),
            reference_url: or_default(reference_url, ""),
            raw_text: raw_text.unwrap_or_default(),
            status: RecordStatus::Pending,
            received_at: Utc::now(),
        }
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    /// Returns a copy marked as durably stored. The original is left untouched.
    pub fn validated(&self) -> Self {
        Self {
            status: RecordStatus::Validated,
            ..self.clone()
        }
    }

    /// The five backend columns: name, category, score, status, reference URL.
    pub fn to_row(&self) -> BackendRow {
        BackendRow {
            name: self.name.clone(),
            category: self.category.clone(),
            score: self.score.value(),
            status: self.status.as_str().to_string(),
            reference_url: self.reference_url.clone(),
        }
    }
}

/// One row appended to the durable backend, in column order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendRow {
    pub name: String,
    pub category: String,
    pub score: u8,
    pub status: String,
    pub reference_url: String,
}

impl BackendRow {
    pub const HEADERS: [&'static str; 5] = ["Name", "Category", "Score", "Status", "Reference URL"];

    pub fn cells(&self) -> [String; 5] {
        [
            self.name.clone(),
            self.category.clone(),
            self.score.to_string(),
            self.status.clone(),
            self.reference_url.clone(),
        ]
    }
}
