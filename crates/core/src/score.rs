//! Candidate scoring and tiering.
//!
//! Two strategies are supported:
//!
//! - **Rubric**: start at [`RUBRIC_BASE_SCORE`] and add points once per keyword found anywhere in
//!   the fragment (case-insensitive substring match), clamped to 100.
//! - **Delegated**: ask the text-generation service for a number and take the first integer in
//!   its reply. Any failure (transport, timeout, no number) resolves to a fixed fallback score.
//!
//! Tiers use descending inclusive bands: `>= 90` is Platinum, `>= 75` is Gold, anything lower is
//! Silver. The tier is always derived from the score, never stored independently.

use crate::config::{CoreConfig, ScoringMode};
use crate::constants::{
    GOLD_THRESHOLD, PLATINUM_THRESHOLD, RUBRIC_BASE_SCORE, RUBRIC_KEYWORDS,
};
use crate::generator::TextGenerator;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+").unwrap());

/// A score in `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "i64")]
pub struct Score(u8);

impl Score {
    pub const MAX: Score = Score(100);

    /// Clamps any integer into the valid range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    /// Rounds and clamps a floating-point score. `NaN` becomes 0.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self(0);
        }
        Self(value.round().clamp(0.0, 100.0) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn tier(&self) -> Tier {
        Tier::for_score(*self)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl TryFrom<i64> for Score {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(format!("score {value} is outside 0..=100"))
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse label derived from a score. Ordering follows prestige.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub fn for_score(score: Score) -> Self {
        match score.value() {
            s if s >= PLATINUM_THRESHOLD => Tier::Platinum,
            s if s >= GOLD_THRESHOLD => Tier::Gold,
            _ => Tier::Silver,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring one fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assessment {
    pub score: Score,
    pub tier: Tier,
    /// Set when delegated scoring fell back; carries the reason for the operator.
    pub notice: Option<String>,
}

impl Assessment {
    fn of(score: Score) -> Self {
        Self {
            score,
            tier: score.tier(),
            notice: None,
        }
    }
}

/// Keyword/points table.
#[derive(Clone, Debug)]
pub struct Rubric {
    base: u8,
    keywords: Vec<(String, u8)>,
}

impl Rubric {
    pub fn new(base: u8, keywords: impl IntoIterator<Item = (String, u8)>) -> Self {
        Self {
            base,
            keywords: keywords
                .into_iter()
                .map(|(k, points)| (k.to_lowercase(), points))
                .collect(),
        }
    }

    pub fn score(&self, text: &str) -> Score {
        let haystack = text.to_lowercase();
        let total = self
            .keywords
            .iter()
            .filter(|(keyword, _)| haystack.contains(keyword.as_str()))
            .fold(i64::from(self.base), |acc, (_, points)| acc + i64::from(*points));
        Score::clamped(total)
    }

    pub fn assess(&self, text: &str) -> Assessment {
        Assessment::of(self.score(text))
    }
}

impl Default for Rubric {
    fn default() -> Self {
        Self::new(
            RUBRIC_BASE_SCORE,
            RUBRIC_KEYWORDS.iter().map(|(k, p)| (k.to_string(), *p)),
        )
    }
}

/// Returns the first integer literal in `reply`, clamped to a score.
pub fn parse_score_reply(reply: &str) -> Option<Score> {
    let found = FIRST_INTEGER.find(reply)?;
    let value = found.as_str().parse::<i64>().ok()?;
    Some(Score::clamped(value))
}

fn score_prompt(fragment: &str) -> String {
    format!(
        "Rate the speaking prestige of the following candidate on a scale from 0 to 100. \
         Reply with the number only.\n\n{fragment}"
    )
}

/// Scores fragments with the configured strategy.
#[derive(Clone)]
pub enum Scorer {
    Rubric(Rubric),
    Delegated {
        generator: Arc<dyn TextGenerator>,
        fallback: Score,
    },
}

impl Scorer {
    /// Builds the scorer selected by `cfg`.
    ///
    /// Delegated mode without a generator degrades to the rubric with a warning, since scoring
    /// must stay available.
    pub fn from_config(cfg: &CoreConfig, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        match (cfg.scoring_mode(), generator) {
            (ScoringMode::Rubric, _) => Scorer::Rubric(Rubric::default()),
            (ScoringMode::Delegated, Some(generator)) => Scorer::Delegated {
                generator,
                fallback: Score::clamped(i64::from(cfg.fallback_score())),
            },
            (ScoringMode::Delegated, None) => {
                tracing::warn!("delegated scoring requested without a generator; using rubric");
                Scorer::Rubric(Rubric::default())
            }
        }
    }

    /// Scores one fragment. Never fails.
    pub async fn assess(&self, fragment: &str) -> Assessment {
        match self {
            Scorer::Rubric(rubric) => rubric.assess(fragment),
            Scorer::Delegated {
                generator,
                fallback,
            } => {
                let reason = match generator.generate(&score_prompt(fragment), false).await {
                    Ok(reply) => match parse_score_reply(&reply) {
                        Some(score) => return Assessment::of(score),
                        None => format!("no score in reply {:?}", truncate(&reply, 60)),
                    },
                    Err(e) => e.to_string(),
                };

                tracing::warn!("delegated scoring unavailable, using fallback {}: {}", fallback, reason);
                Assessment {
                    notice: Some(format!("scoring unavailable ({reason}); used fallback {fallback}")),
                    ..Assessment::of(*fallback)
                }
            }
        }
    }
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scorer::Rubric(rubric) => f.debug_tuple("Rubric").field(rubric).finish(),
            Scorer::Delegated { fallback, .. } => f
                .debug_struct("Delegated")
                .field("fallback", fallback)
                .finish_non_exhaustive(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::StaticGenerator;

    const ANA: &str = "### Dr. Ana Li\nTYPE: Cardiologist\nNPI: 1234567890\nKeynote speaker at TED.";

    #[test]
    fn rubric_scores_documented_scenario() {
        let assessment = Rubric::default().assess(ANA);
        assert_eq!(assessment.score.value(), 85);
        assert_eq!(assessment.tier, Tier::Gold);
        assert!(assessment.notice.is_none());
    }

    #[test]
    fn rubric_counts_each_keyword_once() {
        let rubric = Rubric::default();
        assert_eq!(rubric.score("keynote keynote KEYNOTE and more text").value(), 65);
    }

    #[test]
    fn rubric_clamps_to_one_hundred() {
        let text = "Keynote at TED, podcast host, bestselling author with a million followers, \
                    chief medical officer, president and founder, professor";
        assert_eq!(Rubric::default().score(text), Score::MAX);
    }

    #[test]
    fn rubric_without_keywords_is_base_score() {
        let assessment = Rubric::default().assess("A quiet clinician with no public profile.");
        assert_eq!(assessment.score.value(), RUBRIC_BASE_SCORE);
        assert_eq!(assessment.tier, Tier::Silver);
    }

    #[test]
    fn tier_bands_are_inclusive() {
        assert_eq!(Score::clamped(90).tier(), Tier::Platinum);
        assert_eq!(Score::clamped(89).tier(), Tier::Gold);
        assert_eq!(Score::clamped(75).tier(), Tier::Gold);
        assert_eq!(Score::clamped(74).tier(), Tier::Silver);
    }

    #[test]
    fn tier_is_monotonic_in_score() {
        let tiers: Vec<Tier> = (0..=100).map(|s| Score::clamped(s).tier()).collect();
        assert!(tiers.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn score_clamps_out_of_range_values() {
        assert_eq!(Score::clamped(-5).value(), 0);
        assert_eq!(Score::clamped(250).value(), 100);
        assert_eq!(Score::from_f64(87.6).value(), 88);
        assert_eq!(Score::from_f64(f64::NAN).value(), 0);
    }

    #[test]
    fn parse_score_reply_takes_first_integer() {
        assert_eq!(parse_score_reply("Score: 92/100").map(|s| s.value()), Some(92));
        assert_eq!(parse_score_reply("about 140").map(|s| s.value()), Some(100));
        assert_eq!(parse_score_reply("no idea"), None);
    }

    #[tokio::test]
    async fn delegated_uses_generator_reply() {
        let scorer = Scorer::Delegated {
            generator: Arc::new(StaticGenerator::reply("I'd say 93.")),
            fallback: Score::clamped(85),
        };
        let assessment = scorer.assess(ANA).await;
        assert_eq!(assessment.score.value(), 93);
        assert_eq!(assessment.tier, Tier::Platinum);
        assert!(assessment.notice.is_none());
    }

    #[tokio::test]
    async fn delegated_falls_back_on_failure_deterministically() {
        let scorer = Scorer::Delegated {
            generator: Arc::new(StaticGenerator::failing()),
            fallback: Score::clamped(85),
        };
        let first = scorer.assess(ANA).await;
        let second = scorer.assess(ANA).await;

        assert_eq!(first.score.value(), 85);
        assert_eq!(first.tier, Tier::Gold);
        assert!(first.notice.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn delegated_falls_back_when_reply_has_no_number() {
        let scorer = Scorer::Delegated {
            generator: Arc::new(StaticGenerator::reply("Excellent candidate!")),
            fallback: Score::clamped(88),
        };
        let assessment = scorer.assess(ANA).await;
        assert_eq!(assessment.score.value(), 88);
        assert!(assessment.notice.unwrap().contains("no score"));
    }

    #[test]
    fn delegated_mode_without_generator_uses_rubric() {
        let cfg = CoreConfig::new(
            "|||".into(),
            30,
            ScoringMode::Delegated,
            85,
            std::time::Duration::from_secs(1),
            std::time::Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(Scorer::from_config(&cfg, None), Scorer::Rubric(_)));
    }
}
