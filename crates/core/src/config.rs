//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as an
//! `Arc<CoreConfig>`. Request handling never reads process-wide environment variables; the
//! `*_from_env_value` helpers here only parse values the binaries have already read.

use crate::constants::{
    DEFAULT_COMMIT_TIMEOUT_SECS, DEFAULT_DELIMITER, DEFAULT_FALLBACK_SCORE,
    DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_MIN_FRAGMENT_LEN,
};
use crate::{ScoutError, ScoutResult};
use std::str::FromStr;
use std::time::Duration;

/// Which scoring strategy the pipeline uses for each fragment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoringMode {
    /// Fixed keyword/points rubric. Deterministic and offline.
    #[default]
    Rubric,
    /// Ask the text-generation service for a score, falling back to a fixed value.
    Delegated,
}

impl FromStr for ScoringMode {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rubric" => Ok(ScoringMode::Rubric),
            "delegated" => Ok(ScoringMode::Delegated),
            other => Err(ScoutError::InvalidInput(format!(
                "unknown scoring mode {other:?} (expected \"rubric\" or \"delegated\")"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    delimiter: String,
    min_fragment_len: usize,
    scoring_mode: ScoringMode,
    fallback_score: u8,
    generation_timeout: Duration,
    commit_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::InvalidInput` if:
    /// - the delimiter is empty or whitespace,
    /// - the fallback score is above 100,
    /// - either timeout is zero.
    pub fn new(
        delimiter: String,
        min_fragment_len: usize,
        scoring_mode: ScoringMode,
        fallback_score: u8,
        generation_timeout: Duration,
        commit_timeout: Duration,
    ) -> ScoutResult<Self> {
        if delimiter.trim().is_empty() {
            return Err(ScoutError::InvalidInput(
                "delimiter cannot be empty".into(),
            ));
        }
        if fallback_score > 100 {
            return Err(ScoutError::InvalidInput(format!(
                "fallback score {fallback_score} is outside 0..=100"
            )));
        }
        if generation_timeout.is_zero() || commit_timeout.is_zero() {
            return Err(ScoutError::InvalidInput(
                "timeouts must be greater than zero".into(),
            ));
        }

        Ok(Self {
            delimiter,
            min_fragment_len,
            scoring_mode,
            fallback_score,
            generation_timeout,
            commit_timeout,
        })
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn min_fragment_len(&self) -> usize {
        self.min_fragment_len
    }

    pub fn scoring_mode(&self) -> ScoringMode {
        self.scoring_mode
    }

    pub fn fallback_score(&self) -> u8 {
        self.fallback_score
    }

    pub fn generation_timeout(&self) -> Duration {
        self.generation_timeout
    }

    pub fn commit_timeout(&self) -> Duration {
        self.commit_timeout
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.into(),
            min_fragment_len: DEFAULT_MIN_FRAGMENT_LEN,
            scoring_mode: ScoringMode::default(),
            fallback_score: DEFAULT_FALLBACK_SCORE,
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            commit_timeout: Duration::from_secs(DEFAULT_COMMIT_TIMEOUT_SECS),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the scoring mode from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`ScoringMode::Rubric`].
pub fn scoring_mode_from_env_value(value: Option<String>) -> ScoutResult<ScoringMode> {
    let parsed = non_blank(value).map(|v| v.parse::<ScoringMode>()).transpose()?;
    Ok(parsed.unwrap_or_default())
}

/// Parse a non-negative integer setting, falling back to `default` when unset.
pub fn usize_from_env_value(name: &str, value: Option<String>, default: usize) -> ScoutResult<usize> {
    match non_blank(value) {
        Some(v) => v
            .parse::<usize>()
            .map_err(|e| ScoutError::InvalidInput(format!("{name}={v:?} is not a count: {e}"))),
        None => Ok(default),
    }
}

/// Parse a score setting (0..=100), falling back to `default` when unset.
pub fn score_from_env_value(name: &str, value: Option<String>, default: u8) -> ScoutResult<u8> {
    match non_blank(value) {
        Some(v) => match v.parse::<u8>() {
            Ok(score) if score <= 100 => Ok(score),
            _ => Err(ScoutError::InvalidInput(format!(
                "{name}={v:?} is not a score between 0 and 100"
            ))),
        },
        None => Ok(default),
    }
}

/// Parse a whole-seconds duration setting, falling back to `default_secs` when unset.
pub fn secs_from_env_value(
    name: &str,
    value: Option<String>,
    default_secs: u64,
) -> ScoutResult<Duration> {
    match non_blank(value) {
        Some(v) => v.parse::<u64>().map(Duration::from_secs).map_err(|e| {
            ScoutError::InvalidInput(format!("{name}={v:?} is not a number of seconds: {e}"))
        }),
        None => Ok(Duration::from_secs(default_secs)),
    }
}
