//! # Scout Core
//!
//! Core business logic for the candidate scout.
//!
//! This crate contains the ingestion and scoring pipeline and the state it feeds:
//! - Segmentation of raw generated text into per-candidate fragments
//! - Table-driven field extraction with silent fallbacks
//! - Rubric and delegated scoring with tiering
//! - The session store, the pending review queue and the commit gateway
//!
//! **No API concerns**: HTTP routing, request/response shapes and process bootstrapping belong in
//! `api-rest`, `api-shared` and the binaries.

pub mod bridge;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod generator;
pub mod pipeline;
pub mod queue;
pub mod record;
pub mod score;
pub mod segment;
pub mod session;
pub mod sink;

pub use bridge::{IngestPayload, IngestionBridge, Receipt};
pub use config::{CoreConfig, ScoringMode};
pub use error::{ScoutError, ScoutResult};
pub use extract::{ExtractedFields, Field, FieldExtractor, FieldRule};
pub use gateway::{CommitGateway, CommitReport};
pub use generator::{GeminiGenerator, StaticGenerator, TextGenerator};
pub use pipeline::{BatchReport, CandidatePipeline, Invite, StoreMode};
pub use queue::PendingQueue;
pub use record::{BackendRow, CandidateRecord, RecordStatus};
pub use score::{Assessment, Rubric, Score, Scorer, Tier};
pub use segment::{Fragment, Segmenter};
pub use session::SessionStore;
pub use sink::{CsvFileSink, HttpRowSink, MemorySink, RowSink};

pub use constants::DEFAULT_SHEET_PATH;
