//! # API Shared
//!
//! Shared utilities and definitions for the scout APIs.
//!
//! Contains:
//! - Request/response wire types (`types` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//! - API key validation for the state-changing endpoints
//!
//! Used by `api-rest` and the `scout-run` binary.

pub mod auth;
pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
