//! Session store.
//!
//! An ordered collection of records that lives as long as its owner: one operator session, or the
//! whole process for the bridge's committed mirror. Records are never deduplicated; the same name
//! may legitimately appear after repeated searches. Name lookups resolve to the first record in
//! store order.
//!
//! The store is internally synchronized so the HTTP bridge and the operator console can share one
//! instance. Every operation holds the lock only for the duration of the in-memory change.

use crate::record::CandidateRecord;
use crate::{ScoutError, ScoutResult};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct SessionStore {
    records: Mutex<Vec<CandidateRecord>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CandidateRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds one record after all existing ones.
    pub fn append(&self, record: CandidateRecord) {
        self.lock().push(record);
    }

    /// Adds records after all existing ones, preserving their order.
    pub fn extend(&self, records: impl IntoIterator<Item = CandidateRecord>) {
        self.lock().extend(records);
    }

    /// Clears the store and repopulates it in one step. Readers never observe the empty state.
    pub fn replace(&self, records: Vec<CandidateRecord>) {
        *self.lock() = records;
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every record in store order.
    pub fn snapshot(&self) -> Vec<CandidateRecord> {
        self.lock().clone()
    }

    /// The first record (in store order) whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<CandidateRecord> {
        self.lock().iter().find(|r| r.name == name).cloned()
    }

    /// Like [`find_by_name`](Self::find_by_name) but reports a miss as an error.
    pub fn require_by_name(&self, name: &str) -> ScoutResult<CandidateRecord> {
        self.find_by_name(name)
            .ok_or_else(|| ScoutError::SessionRecordNotFound(name.to_string()))
    }

    /// Distinct names in first-seen order, for pickers that offer one entry per candidate.
    pub fn unique_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in self.lock().iter() {
            if !names.contains(&record.name) {
                names.push(record.name.clone());
            }
        }
        names
    }

    /// Renders the whole store as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::CsvSerialization` if a row cannot be written.
    pub fn export_csv(&self) -> ScoutResult<String> {
        export_csv(&self.snapshot())
    }
}

#[derive(Serialize)]
struct ExportRow<'a> {
    name: &'a str,
    identifier: &'a str,
    category: &'a str,
    score: u8,
    tier: &'static str,
    status: &'static str,
    reference_url: &'a str,
    raw_text: &'a str,
}

/// Renders `records` as CSV with a header row.
pub fn export_csv(records: &[CandidateRecord]) -> ScoutResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if records.is_empty() {
        writer
            .write_record([
                "name",
                "identifier",
                "category",
                "score",
                "tier",
                "status",
                "reference_url",
                "raw_text",
            ])
            .map_err(ScoutError::CsvSerialization)?;
    }

    for record in records {
        writer
            .serialize(ExportRow {
                name: &record.name,
                identifier: &record.identifier,
                category: &record.category,
                score: record.score().value(),
                tier: record.tier().as_str(),
                status: record.status().as_str(),
                reference_url: &record.reference_url,
                raw_text: &record.raw_text,
            })
            .map_err(ScoutError::CsvSerialization)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ScoutError::CsvSerialization(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(ScoutError::CsvEncoding)
}
