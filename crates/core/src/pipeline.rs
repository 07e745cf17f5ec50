//! Candidate ingestion pipeline.
//!
//! raw text → [`Segmenter`] → fragment → [`FieldExtractor`] + [`Scorer`] → [`CandidateRecord`]
//!
//! Fragments are processed strictly in batch order, one at a time, so records come out in the
//! same order the generation service listed the candidates. Extraction and scoring never fail;
//! only the calls that reach the generation service for a whole batch or an invitation can.

use crate::config::CoreConfig;
use crate::extract::FieldExtractor;
use crate::generator::TextGenerator;
use crate::record::CandidateRecord;
use crate::score::Scorer;
use crate::segment::Segmenter;
use crate::session::SessionStore;
use crate::{ScoutError, ScoutResult};
use std::sync::Arc;

/// How a batch's records are placed into the session store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreMode {
    /// Clear the store first; the new batch supersedes the previous one.
    #[default]
    Replace,
    /// Keep existing records and add the new ones after them.
    Append,
}

/// Records produced from one raw batch.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub records: Vec<CandidateRecord>,
    /// Non-fatal scoring notices (one per fragment that used the fallback score).
    pub notices: Vec<String>,
}

/// A drafted invitation for one session record.
#[derive(Clone, Debug)]
pub struct Invite {
    pub record: CandidateRecord,
    pub message: String,
}

pub struct CandidatePipeline {
    segmenter: Segmenter,
    extractor: FieldExtractor,
    scorer: Scorer,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl CandidatePipeline {
    /// Builds the pipeline described by `cfg`.
    ///
    /// `generator` is optional: without it, searches and invitations are unavailable and
    /// delegated scoring degrades to the rubric.
    pub fn new(cfg: &CoreConfig, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            segmenter: Segmenter::from_config(cfg),
            extractor: FieldExtractor::standard(),
            scorer: Scorer::from_config(cfg, generator.clone()),
            generator,
        }
    }

    fn generator(&self) -> ScoutResult<&Arc<dyn TextGenerator>> {
        self.generator.as_ref().ok_or(ScoutError::GenerationUnconfigured)
    }

    /// Turns a raw batch into scored records, in fragment order.
    pub async fn process_batch(&self, raw: &str) -> BatchReport {
        let mut report = BatchReport::default();

        for fragment in self.segmenter.segments(raw) {
            let fields = self.extractor.extract(fragment.text());
            let assessment = self.scorer.assess(fragment.text()).await;
            if let Some(notice) = &assessment.notice {
                report
                    .notices
                    .push(format!("{} (fragment {}): {}", fields.name, fragment.index, notice));
            }
            report
                .records
                .push(CandidateRecord::from_fragment(fields, &assessment, fragment.text()));
        }

        tracing::info!(
            "processed batch: {} record(s), {} scoring fallback(s)",
            report.records.len(),
            report.notices.len()
        );
        report
    }

    /// Processes `raw` and places the records into `session`.
    pub async fn ingest_text(
        &self,
        raw: &str,
        session: &SessionStore,
        mode: StoreMode,
    ) -> BatchReport {
        let report = self.process_batch(raw).await;
        match mode {
            StoreMode::Replace => session.replace(report.records.clone()),
            StoreMode::Append => session.extend(report.records.clone()),
        }
        report
    }

    /// Asks the generation service (search-grounded) for candidates matching `query`, then
    /// processes the reply into `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if no generator is configured or the generation call fails. The session
    /// store is untouched in that case.
    pub async fn search(
        &self,
        query: &str,
        session: &SessionStore,
        mode: StoreMode,
    ) -> ScoutResult<BatchReport> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScoutError::InvalidInput("search query cannot be empty".into()));
        }

        let raw = self.generator()?.generate(&search_prompt(query), true).await?;
        Ok(self.ingest_text(&raw, session, mode).await)
    }

    /// Drafts an invitation for the session record named `name` (first match by store order).
    ///
    /// # Errors
    ///
    /// Returns `ScoutError::SessionRecordNotFound` if no record has that name, or a generation
    /// error if the draft cannot be produced.
    pub async fn draft_invite(&self, session: &SessionStore, name: &str) -> ScoutResult<Invite> {
        let record = session.require_by_name(name)?;
        let message = self
            .generator()?
            .generate(&invite_prompt(&record), false)
            .await?;

        Ok(Invite {
            record,
            message: message.trim().to_string(),
        })
    }
}

fn search_prompt(query: &str) -> String {
    format!(
        "Find real, currently practising professionals matching: {query}\n\
         For each candidate write:\n\
         ### <full name>\n\
         TYPE: <specialty or role>\n\
         NPI: <NPI number, digits only, if known>\n\
         URL: <one reference URL>\n\
         followed by a short bio covering speaking engagements, audience and leadership roles.\n\
         Separate candidates with |||"
    )
}

fn invite_prompt(record: &CandidateRecord) -> String {
    format!(
        "Draft a short, warm invitation asking {name} ({category}) to speak at our event. \
         Reference their background where relevant:\n\n{bio}",
        name = record.name,
        category = record.category,
        bio = record.raw_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringMode;
    use crate::constants::{DEFAULT_IDENTIFIER, DEFAULT_NAME};
    use crate::generator::StaticGenerator;
    use crate::score::{Score, Tier};
    use std::time::Duration;

    const ANA: &str = "### Dr. Ana Li\nTYPE: Cardiologist\nNPI: 1234567890\nKeynote speaker at TED.|||";

    fn delegated_cfg() -> CoreConfig {
        CoreConfig::new(
            "|||".into(),
            30,
            ScoringMode::Delegated,
            85,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn documented_batch_yields_one_gold_record() {
        let pipeline = CandidatePipeline::new(&CoreConfig::default(), None);
        let report = pipeline.process_batch(ANA).await;

        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.name, "Dr. Ana Li");
        assert_eq!(record.identifier, "1234567890");
        assert_eq!(record.category, "Cardiologist");
        assert_eq!(record.score().value(), 85);
        assert_eq!(record.tier(), Tier::Gold);
        assert!(record.raw_text.starts_with("### Dr. Ana Li"));
        assert!(report.notices.is_empty());
    }

    #[tokio::test]
    async fn short_fragment_yields_no_records() {
        let pipeline = CandidatePipeline::new(&CoreConfig::default(), None);
        assert!(pipeline.process_batch("### X|||").await.records.is_empty());
    }

    #[tokio::test]
    async fn records_keep_fragment_order() {
        let pipeline = CandidatePipeline::new(&CoreConfig::default(), None);
        let raw = "### First Person\nTYPE: A\nsome longer bio text|||\
                   A fragment without any header but long enough|||\
                   ### Third Person\nTYPE: C\nmore bio text here";
        let names: Vec<String> = pipeline
            .process_batch(raw)
            .await
            .records
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["First Person", DEFAULT_NAME, "Third Person"]);
    }

    #[tokio::test]
    async fn rubric_pipeline_is_idempotent() {
        let pipeline = CandidatePipeline::new(&CoreConfig::default(), None);
        let a = pipeline.process_batch(ANA).await.records.remove(0);
        let b = pipeline.process_batch(ANA).await.records.remove(0);
        assert_eq!(
            (&a.name, &a.identifier, &a.category, a.score()),
            (&b.name, &b.identifier, &b.category, b.score())
        );
    }

    #[tokio::test]
    async fn delegated_failure_falls_back_and_reports_notice() {
        let generator: Arc<dyn TextGenerator> = Arc::new(StaticGenerator::failing());
        let pipeline = CandidatePipeline::new(&delegated_cfg(), Some(generator));

        let report = pipeline.process_batch(ANA).await;

        assert_eq!(report.records[0].score(), Score::clamped(85));
        assert_eq!(report.notices.len(), 1);
        assert!(report.notices[0].starts_with("Dr. Ana Li"));
    }

    #[tokio::test]
    async fn search_replaces_or_appends_session() {
        let reply = "### Dr. Ana Li\nTYPE: Cardiologist\nKeynote speaker at TED conference.|||\
                     ### Prof. Sam Okoro\nTYPE: Oncologist\nPodcast host and professor.";
        let generator: Arc<dyn TextGenerator> = Arc::new(StaticGenerator::reply(reply));
        let pipeline = CandidatePipeline::new(&CoreConfig::default(), Some(generator));
        let session = SessionStore::new();

        pipeline.search("cardiology speakers", &session, StoreMode::Replace).await.unwrap();
        assert_eq!(session.len(), 2);

        pipeline.search("cardiology speakers", &session, StoreMode::Append).await.unwrap();
        assert_eq!(session.len(), 4);

        pipeline.search("cardiology speakers", &session, StoreMode::Replace).await.unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.snapshot()[1].identifier, DEFAULT_IDENTIFIER);
    }

    #[tokio::test]
    async fn search_failure_leaves_session_untouched() {
        let generator: Arc<dyn TextGenerator> = Arc::new(StaticGenerator::failing());
        let pipeline = CandidatePipeline::new(&CoreConfig::default(), Some(generator));
        let session = SessionStore::new();
        pipeline.ingest_text(ANA, &session, StoreMode::Replace).await;

        assert!(pipeline.search("anything", &session, StoreMode::Replace).await.is_err());
        assert_eq!(session.len(), 1);
    }

    #[tokio::test]
    async fn search_without_generator_is_unconfigured() {
        let pipeline = CandidatePipeline::new(&CoreConfig::default(), None);
        let err = pipeline
            .search("anything", &SessionStore::new(), StoreMode::Replace)
            .await
            .expect_err("should fail");
        assert!(matches!(err, ScoutError::GenerationUnconfigured));
    }

    #[tokio::test]
    async fn invite_uses_first_record_with_that_name() {
        let generator: Arc<dyn TextGenerator> =
            Arc::new(StaticGenerator::reply("  Dear Dr. Li, ...  "));
        let pipeline = CandidatePipeline::new(&CoreConfig::default(), Some(generator));
        let session = SessionStore::new();
        pipeline.ingest_text(ANA, &session, StoreMode::Append).await;
        pipeline.ingest_text(ANA, &session, StoreMode::Append).await;
        let first_id = session.snapshot()[0].id;

        let invite = pipeline.draft_invite(&session, "Dr. Ana Li").await.unwrap();

        assert_eq!(invite.record.id, first_id);
        assert_eq!(invite.message, "Dear Dr. Li, ...");
        assert!(matches!(
            pipeline.draft_invite(&session, "Nobody").await,
            Err(ScoutError::SessionRecordNotFound(_))
        ));
    }
}
