//! Durable row backends.
//!
//! The durable store is a spreadsheet-like, append-only table. The core only ever appends whole
//! batches of five-column rows through [`RowSink`]; it never reads, updates or deletes rows.

use crate::record::BackendRow;
use crate::{ScoutError, ScoutResult};
use async_trait::async_trait;
use serde_json::json;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[async_trait]
pub trait RowSink: Send + Sync {
    /// Appends `rows` as one batch. Either the whole batch is accepted or an error is returned.
    ///
    /// Implementations bound their own latency and only return once the outcome is known, or
    /// once it never will be (see [`HttpRowSink`]).
    async fn append_rows(&self, rows: &[BackendRow]) -> ScoutResult<()>;

    /// Short description for logs (a path or a URL).
    fn describe(&self) -> String;
}

/// Appends rows to a local CSV file, writing the column headers when the file is new.
#[derive(Clone, Debug)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_blocking(path: &Path, rows: &[BackendRow]) -> ScoutResult<()> {
        let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(ScoutError::BackendWrite)?;

        // Buffer the batch so a serialisation failure leaves the file untouched.
        let mut writer = csv::Writer::from_writer(Vec::new());
        if needs_header {
            writer
                .write_record(BackendRow::HEADERS)
                .map_err(ScoutError::CsvSerialization)?;
        }
        for row in rows {
            writer
                .write_record(row.cells())
                .map_err(ScoutError::CsvSerialization)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ScoutError::CsvSerialization(e.into_error().into()))?;

        file.write_all(&bytes).map_err(ScoutError::BackendWrite)?;
        file.sync_data().map_err(ScoutError::BackendWrite)
    }
}

#[async_trait]
impl RowSink for CsvFileSink {
    async fn append_rows(&self, rows: &[BackendRow]) -> ScoutResult<()> {
        let path = self.path.clone();
        let rows = rows.to_vec();
        tokio::task::spawn_blocking(move || Self::append_blocking(&path, &rows))
            .await
            .map_err(|e| ScoutError::BackendUnavailable(format!("append task failed: {e}")))?
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Posts rows as JSON to a sheet web hook: `{"rows": [[name, category, score, status, url], …]}`.
///
/// Each request is bounded by `timeout`. A request that times out reports
/// `ScoutError::BackendTimeout` even though the endpoint may still have applied it, so a retry
/// after a timeout can append the rows twice. Delivery to this backend is at-least-once.
#[derive(Clone, Debug)]
pub struct HttpRowSink {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpRowSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RowSink for HttpRowSink {
    async fn append_rows(&self, rows: &[BackendRow]) -> ScoutResult<()> {
        let cells: Vec<[String; 5]> = rows.iter().map(BackendRow::cells).collect();
        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&json!({ "rows": cells }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScoutError::BackendTimeout(self.timeout)
                } else {
                    ScoutError::BackendRequest(e)
                }
            })?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(ScoutError::BackendUnavailable(format!(
                "sheet endpoint returned {status}: {body}"
            )))
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// In-memory sink. Can be switched into a failing mode to simulate an unreachable backend.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Mutex<Vec<BackendRow>>,
    failure: Mutex<Option<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent append fail with `reason`, or succeed again with `None`.
    pub fn set_failure(&self, reason: Option<&str>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = reason.map(str::to_string);
    }

    pub fn rows(&self) -> Vec<BackendRow> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RowSink for MemorySink {
    async fn append_rows(&self, rows: &[BackendRow]) -> ScoutResult<()> {
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(reason) = failure {
            return Err(ScoutError::BackendUnavailable(reason));
        }
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(rows);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(name: &str) -> BackendRow {
        BackendRow {
            name: name.into(),
            category: "Cardiologist".into(),
            score: 85,
            status: "Validated".into(),
            reference_url: String::new(),
        }
    }

    #[tokio::test]
    async fn csv_sink_writes_header_once_and_appends() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let sink = CsvFileSink::new(temp_dir.path().join("sheet.csv"));

        sink.append_rows(&[row("A")]).await.expect("first append");
        sink.append_rows(&[row("B, Jr."), row("C")]).await.expect("second append");

        let contents = std::fs::read_to_string(sink.path()).expect("read sheet");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "Name,Category,Score,Status,Reference URL");
        assert_eq!(lines[1], "A,Cardiologist,85,Validated,");
        assert_eq!(lines[2], "\"B, Jr.\",Cardiologist,85,Validated,");
        assert_eq!(lines.len(), 4);
    }

    #[tokio::test]
    async fn csv_sink_reports_unwritable_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let sink = CsvFileSink::new(temp_dir.path().join("missing").join("sheet.csv"));

        let err = sink.append_rows(&[row("A")]).await.expect_err("should fail");
        assert!(err.is_backend());
    }

    #[tokio::test]
    async fn http_sink_times_out_on_silent_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            // Accept and hold the connection without ever answering.
            let (socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let sink = HttpRowSink::new(format!("http://{addr}/append"), Duration::from_millis(100));
        let err = sink.append_rows(&[row("A")]).await.expect_err("should time out");

        assert!(matches!(err, ScoutError::BackendTimeout(d) if d == Duration::from_millis(100)));
        assert!(err.is_backend());
        server.abort();
    }

    #[tokio::test]
    async fn memory_sink_failure_mode_rejects_whole_batch() {
        let sink = MemorySink::new();
        sink.set_failure(Some("quota exceeded"));
        let err = sink.append_rows(&[row("A")]).await.expect_err("should fail");
        assert!(err.to_string().contains("quota exceeded"));
        assert!(sink.rows().is_empty());

        sink.set_failure(None);
        sink.append_rows(&[row("A")]).await.expect("should succeed");
        assert_eq!(sink.rows().len(), 1);
    }
}
