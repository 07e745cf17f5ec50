//! Text-generation service client.
//!
//! The pipeline only needs one capability from the upstream model: turn a prompt into a single
//! blob of text, optionally with search grounding enabled. [`TextGenerator`] is that seam.
//! [`GeminiGenerator`] talks to the Gemini REST API; [`StaticGenerator`] returns canned replies
//! for offline runs and tests.

use crate::constants::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::{ScoutError, ScoutResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends `prompt` and returns the model's text.
    ///
    /// `grounded` asks the service to back its answer with live search results.
    async fn generate(&self, prompt: &str, grounded: bool) -> ScoutResult<String>;
}

/// Gemini `generateContent` client.
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into())
                .trim_end_matches('/')
                .to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send(&self, prompt: &str, grounded: bool) -> ScoutResult<String> {
        let mut body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        if grounded {
            body["tools"] = json!([{ "google_search": {} }]);
        }

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ScoutError::GenerationRequest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ScoutError::GenerationStatus { status, body });
        }

        let parsed: GenerateContentRes = resp.json().await.map_err(ScoutError::GenerationRequest)?;
        parsed.text().ok_or(ScoutError::GenerationEmpty)
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str, grounded: bool) -> ScoutResult<String> {
        tracing::debug!(model = %self.model, grounded, "sending generation request");
        match tokio::time::timeout(self.timeout, self.send(prompt, grounded)).await {
            Ok(result) => result,
            Err(_) => Err(ScoutError::GenerationTimeout(self.timeout)),
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentRes {
    #[serde(default)]
    candidates: Vec<ResCandidate>,
}

#[derive(Deserialize)]
struct ResCandidate {
    content: Option<ResContent>,
}

#[derive(Deserialize)]
struct ResContent {
    #[serde(default)]
    parts: Vec<ResPart>,
}

#[derive(Deserialize)]
struct ResPart {
    text: Option<String>,
}

impl GenerateContentRes {
    /// Concatenates the text parts of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Replays fixed replies in order, repeating the last one. An empty script fails every call.
pub struct StaticGenerator {
    replies: Mutex<Vec<String>>,
}

impl StaticGenerator {
    pub fn new(replies: Vec<String>) -> Self {
        let mut replies = replies;
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
        }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()])
    }

    pub fn failing() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    async fn generate(&self, _prompt: &str, _grounded: bool) -> ScoutResult<String> {
        let mut replies = self
            .replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match replies.len() {
            0 => Err(ScoutError::GenerationUnconfigured),
            1 => Ok(replies[0].clone()),
            _ => Ok(replies.pop().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let raw = r####"{"candidates":[{"content":{"parts":[{"text":"### A"},{"text":"\nTYPE: B"}]}},
                     {"content":{"parts":[{"text":"ignored"}]}}]}"####;
        let parsed: GenerateContentRes = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("### A\nTYPE: B"));
    }

    #[test]
    fn response_without_text_is_empty() {
        let parsed: GenerateContentRes = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(parsed.text().is_none());

        let parsed: GenerateContentRes =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert!(parsed.text().is_none());
    }

    #[test]
    fn endpoint_uses_model_and_trims_base_url() {
        let generator = GeminiGenerator::new(
            "key".into(),
            Some("gemini-test".into()),
            Some("http://localhost:9999/".into()),
            Duration::from_secs(1),
        );
        assert_eq!(
            generator.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
    }

    #[tokio::test]
    async fn static_generator_replays_in_order_then_repeats() {
        let generator = StaticGenerator::new(vec!["one".into(), "two".into()]);
        assert_eq!(generator.generate("p", false).await.unwrap(), "one");
        assert_eq!(generator.generate("p", false).await.unwrap(), "two");
        assert_eq!(generator.generate("p", true).await.unwrap(), "two");
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error_not_a_panic() {
        let generator = GeminiGenerator::new(
            "key".into(),
            None,
            Some("http://127.0.0.1:9".into()),
            Duration::from_secs(2),
        );
        assert!(generator.generate("hello", false).await.is_err());
    }
}
