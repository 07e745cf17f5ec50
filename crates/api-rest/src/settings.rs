//! Environment-driven startup configuration.
//!
//! Everything the servers need is read here exactly once and turned into explicit values; nothing
//! below the binaries consults the environment again.
//!
//! | Variable | Default |
//! |---|---|
//! | `SCOUT_REST_ADDR` | `0.0.0.0:3000` |
//! | `SCOUT_DELIMITER` | `\|\|\|` |
//! | `SCOUT_MIN_FRAGMENT_LEN` | `30` |
//! | `SCOUT_SCORING` | `rubric` |
//! | `SCOUT_FALLBACK_SCORE` | `85` |
//! | `SCOUT_GENERATION_TIMEOUT_SECS` | `30` |
//! | `SCOUT_COMMIT_TIMEOUT_SECS` | `15` (per request to the sheet endpoint) |
//! | `GEMINI_API_KEY` | unset (search and invitations disabled) |
//! | `SCOUT_GEMINI_MODEL` / `SCOUT_GEMINI_BASE_URL` | Gemini defaults |
//! | `SCOUT_SHEET_URL` | unset (use the CSV file) |
//! | `SCOUT_SHEET_PATH` | `scout_sheet.csv` |
//! | `SCOUT_API_KEY` | unset (ingestion open) |

use std::sync::Arc;

use scout_core::config::{
    score_from_env_value, scoring_mode_from_env_value, secs_from_env_value, usize_from_env_value,
};
use scout_core::constants::{
    DEFAULT_COMMIT_TIMEOUT_SECS, DEFAULT_DELIMITER, DEFAULT_FALLBACK_SCORE,
    DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_MIN_FRAGMENT_LEN,
};
use scout_core::{
    CandidatePipeline, CommitGateway, CoreConfig, CsvFileSink, GeminiGenerator, HttpRowSink,
    IngestionBridge, RowSink, ScoutResult, SessionStore, TextGenerator, DEFAULT_SHEET_PATH,
};

use crate::AppState;

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Settings resolved from the process environment.
#[derive(Clone, Debug)]
pub struct Settings {
    pub rest_addr: String,
    pub core: CoreConfig,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub sheet_url: Option<String>,
    pub sheet_path: String,
    pub api_key: Option<String>,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> ScoutResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which returns the raw value of a variable if set.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::InvalidInput` if any numeric or enumerated setting cannot be parsed,
    /// or if the resulting core configuration is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ScoutResult<Self> {
        let core = CoreConfig::new(
            non_blank(lookup("SCOUT_DELIMITER")).unwrap_or_else(|| DEFAULT_DELIMITER.into()),
            usize_from_env_value(
                "SCOUT_MIN_FRAGMENT_LEN",
                lookup("SCOUT_MIN_FRAGMENT_LEN"),
                DEFAULT_MIN_FRAGMENT_LEN,
            )?,
            scoring_mode_from_env_value(lookup("SCOUT_SCORING"))?,
            score_from_env_value(
                "SCOUT_FALLBACK_SCORE",
                lookup("SCOUT_FALLBACK_SCORE"),
                DEFAULT_FALLBACK_SCORE,
            )?,
            secs_from_env_value(
                "SCOUT_GENERATION_TIMEOUT_SECS",
                lookup("SCOUT_GENERATION_TIMEOUT_SECS"),
                DEFAULT_GENERATION_TIMEOUT_SECS,
            )?,
            secs_from_env_value(
                "SCOUT_COMMIT_TIMEOUT_SECS",
                lookup("SCOUT_COMMIT_TIMEOUT_SECS"),
                DEFAULT_COMMIT_TIMEOUT_SECS,
            )?,
        )?;

        Ok(Self {
            rest_addr: non_blank(lookup("SCOUT_REST_ADDR"))
                .unwrap_or_else(|| DEFAULT_REST_ADDR.into()),
            core,
            gemini_api_key: non_blank(lookup("GEMINI_API_KEY")),
            gemini_model: non_blank(lookup("SCOUT_GEMINI_MODEL")),
            gemini_base_url: non_blank(lookup("SCOUT_GEMINI_BASE_URL")),
            sheet_url: non_blank(lookup("SCOUT_SHEET_URL")),
            sheet_path: non_blank(lookup("SCOUT_SHEET_PATH"))
                .unwrap_or_else(|| DEFAULT_SHEET_PATH.into()),
            api_key: non_blank(lookup("SCOUT_API_KEY")),
        })
    }

    /// The generation client, if an API key was supplied.
    pub fn generator(&self) -> Option<Arc<dyn TextGenerator>> {
        self.gemini_api_key.as_ref().map(|key| {
            Arc::new(GeminiGenerator::new(
                key.clone(),
                self.gemini_model.clone(),
                self.gemini_base_url.clone(),
                self.core.generation_timeout(),
            )) as Arc<dyn TextGenerator>
        })
    }

    /// The durable backend: the HTTP sheet endpoint if configured, otherwise the CSV file.
    pub fn sink(&self) -> Arc<dyn RowSink> {
        match &self.sheet_url {
            Some(url) => Arc::new(HttpRowSink::new(url.clone(), self.core.commit_timeout())),
            None => Arc::new(CsvFileSink::new(self.sheet_path.clone())),
        }
    }

    /// Builds the shared application state from these settings.
    pub fn build_state(&self) -> AppState {
        let generator = self.generator();
        if generator.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set; search and invitations are disabled");
        }

        let gateway = CommitGateway::new(self.sink());
        AppState {
            pipeline: Arc::new(CandidatePipeline::new(&self.core, generator)),
            session: Arc::new(SessionStore::new()),
            bridge: Arc::new(IngestionBridge::new(gateway)),
            api_key: self.api_key.as_deref().map(Arc::from),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::ScoringMode;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.rest_addr, DEFAULT_REST_ADDR);
        assert_eq!(settings.core.delimiter(), "|||");
        assert_eq!(settings.core.min_fragment_len(), 30);
        assert_eq!(settings.core.scoring_mode(), ScoringMode::Rubric);
        assert_eq!(settings.sheet_path, DEFAULT_SHEET_PATH);
        assert!(settings.generator().is_none());
        assert!(settings.api_key.is_none());
        assert_eq!(settings.sink().describe(), DEFAULT_SHEET_PATH);
    }

    #[test]
    fn overrides_are_applied() {
        let settings = Settings::from_lookup(lookup(&[
            ("SCOUT_DELIMITER", "---"),
            ("SCOUT_MIN_FRAGMENT_LEN", "10"),
            ("SCOUT_SCORING", "delegated"),
            ("SCOUT_COMMIT_TIMEOUT_SECS", "3"),
            ("GEMINI_API_KEY", "k"),
            ("SCOUT_API_KEY", "  secret "),
            ("SCOUT_SHEET_URL", "http://sheet.example/append"),
        ]))
        .unwrap();
        assert_eq!(settings.core.delimiter(), "---");
        assert_eq!(settings.core.min_fragment_len(), 10);
        assert_eq!(settings.core.scoring_mode(), ScoringMode::Delegated);
        assert_eq!(settings.core.commit_timeout(), Duration::from_secs(3));
        assert!(settings.generator().is_some());
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.sink().describe(), "http://sheet.example/append");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Settings::from_lookup(lookup(&[("SCOUT_SCORING", "vibes")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("SCOUT_FALLBACK_SCORE", "101")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("SCOUT_COMMIT_TIMEOUT_SECS", "0")])).is_err());
    }
}
