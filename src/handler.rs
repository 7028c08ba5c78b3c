//! Report request handler: the status state machine.
//!
//! ```text
//! validate ─▶ read doc ─▶ write `processing` ─▶ generate ─┬─ Generated ─▶ write `completed`
//!                                                          └─ Failed ────▶ fallback ─▶ write `completed`
//! ```
//!
//! Only validation, a missing document, and store I/O surface as errors.
//! AI or search outages are absorbed by the fallback report, so every
//! accepted request ends `completed` unless the store itself fails.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use smehub_report_core::fallback::build_fallback;
use smehub_report_core::models::{
    check_document_id, BusinessInfo, ReportRequest, ReportStatus, ReportUpdate,
};
use smehub_report_core::store::DocumentStore;

use crate::generator::{GenerationOutcome, ReportGenerator};

/// Errors surfaced to the caller of [`ReportHandler::handle`].
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Validation(String),
    #[error("report not found: {0}")]
    NotFound(String),
    #[error("document store error: {0:#}")]
    Store(anyhow::Error),
}

/// Which path produced the stored report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportSource {
    #[serde(rename = "ai")]
    Generated,
    #[serde(rename = "fallback")]
    Fallback,
}

/// Result of a successfully handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutcome {
    pub report_id: String,
    pub source: ReportSource,
    pub status: ReportStatus,
}

pub struct ReportHandler {
    store: Arc<dyn DocumentStore>,
    generator: ReportGenerator,
}

fn validate(request: &ReportRequest) -> Result<(), HandlerError> {
    if request.report_id.trim().is_empty() || request.user_id.trim().is_empty() {
        return Err(HandlerError::Validation(
            "Missing required fields: reportId or userId".to_string(),
        ));
    }
    check_document_id(&request.report_id)
        .map_err(|e| HandlerError::Validation(format!("Invalid reportId: {}", e)))
}

/// Run the generator and fall back to the template report on failure.
pub async fn produce_report(
    generator: &ReportGenerator,
    info: &BusinessInfo,
    final_prompt: &str,
) -> (String, ReportSource) {
    match generator.generate(info, final_prompt).await {
        GenerationOutcome::Generated(text) => (text, ReportSource::Generated),
        GenerationOutcome::Failed(reason) => {
            warn!(reason = %reason, "AI generation failed; using fallback report");
            (build_fallback(info, final_prompt), ReportSource::Fallback)
        }
    }
}

impl ReportHandler {
    pub fn new(store: Arc<dyn DocumentStore>, generator: ReportGenerator) -> Self {
        Self { store, generator }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Process one report request end to end.
    #[instrument(skip(self, request), fields(report_id = %request.report_id))]
    pub async fn handle(&self, request: &ReportRequest) -> Result<HandlerOutcome, HandlerError> {
        validate(request)?;
        let id = request.report_id.as_str();

        match self.store.get_report(id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(HandlerError::NotFound(id.to_string())),
            Err(e) => {
                return Err(HandlerError::Store(
                    e.context("failed to read report document"),
                ))
            }
        }

        self.store
            .merge_update(id, &ReportUpdate::processing(Utc::now()))
            .await
            .map_err(|e| HandlerError::Store(e.context("failed to mark report processing")))?;
        info!("report marked processing");

        let (report, source) =
            produce_report(&self.generator, &request.business_info, &request.final_prompt).await;

        if let Err(e) = self
            .store
            .merge_update(id, &ReportUpdate::completed(report, Utc::now()))
            .await
        {
            let e = e.context("failed to store completed report");
            self.record_failure(id, &e).await;
            return Err(HandlerError::Store(e));
        }

        info!(source = ?source, "report completed");
        Ok(HandlerOutcome {
            report_id: id.to_string(),
            source,
            status: ReportStatus::Completed,
        })
    }

    /// Best-effort `failed` note after the completed write was rejected.
    async fn record_failure(&self, id: &str, cause: &anyhow::Error) {
        let note = format!("{:#}", cause);
        match self
            .store
            .merge_update(id, &ReportUpdate::failed(note, Utc::now()))
            .await
        {
            Ok(()) => warn!("report marked failed"),
            Err(e) => {
                let error = format!("{:#}", e);
                error!(error = %error, "could not mark report failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::tests::{acme, test_settings, StubCompletion, StubSearch};
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use smehub_report_core::models::ReportDocument;
    use smehub_report_core::provider::{CompletionProvider, SearchSnippet};
    use smehub_report_core::store::memory::InMemoryStore;
    use std::sync::Mutex;
    use std::time::Duration;

    fn request(id: &str) -> ReportRequest {
        ReportRequest {
            report_id: id.to_string(),
            user_id: "u1".to_string(),
            business_info: acme(),
            final_prompt: "Summarize market".to_string(),
        }
    }

    fn seeded_store(ids: &[&str]) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        for id in ids {
            store.insert(ReportDocument::pending(*id, Utc::now())).unwrap();
        }
        store
    }

    fn handler_with(
        store: Arc<dyn DocumentStore>,
        search: StubSearch,
        completion: Arc<dyn CompletionProvider>,
    ) -> ReportHandler {
        ReportHandler::new(
            store,
            ReportGenerator::new(Arc::new(search), completion, test_settings()),
        )
    }

    /// Completion stub that reads the document status while "generating".
    struct ObservingCompletion {
        store: Arc<InMemoryStore>,
        report_id: String,
        seen: Mutex<Vec<Option<ReportStatus>>>,
    }

    #[async_trait]
    impl CompletionProvider for ObservingCompletion {
        fn model_name(&self) -> &str {
            "observer"
        }

        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _timeout: Duration,
        ) -> Result<String> {
            let doc = self.store.get_report(&self.report_id).await?;
            self.seen.lock().unwrap().push(doc.and_then(|d| d.status));
            Ok("# Observed report".to_string())
        }
    }

    /// Store that delegates to an in-memory store but rejects chosen writes.
    struct FlakyStore {
        inner: Arc<InMemoryStore>,
        fail_status: Vec<ReportStatus>,
        fail_reads: bool,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn get_report(&self, id: &str) -> Result<Option<ReportDocument>> {
            if self.fail_reads {
                bail!("connection refused");
            }
            self.inner.get_report(id).await
        }

        async fn merge_update(&self, id: &str, update: &ReportUpdate) -> Result<()> {
            if update.status.is_some_and(|s| self.fail_status.contains(&s)) {
                bail!("deadline exceeded");
            }
            self.inner.merge_update(id, update).await
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_ai_path_completes_with_generated_report() {
        let store = seeded_store(&["r1"]);
        let handler = handler_with(
            store.clone(),
            StubSearch(Some(vec![SearchSnippet::new("context")])),
            Arc::new(StubCompletion::replying("# Acme AI report")),
        );

        let outcome = handler.handle(&request("r1")).await.unwrap();
        assert_eq!(outcome.source, ReportSource::Generated);
        assert_eq!(outcome.status, ReportStatus::Completed);

        let doc = store.get_report("r1").await.unwrap().unwrap();
        assert_eq!(doc.status, Some(ReportStatus::Completed));
        assert_eq!(doc.generated_report, "# Acme AI report");
        assert!(doc.completed_at.is_some());
        assert!(doc.updated_at.is_some());
        assert!(doc.created_at.is_some());
    }

    #[tokio::test]
    async fn test_completion_failure_stores_fallback() {
        let store = seeded_store(&["r1"]);
        let handler = handler_with(
            store.clone(),
            StubSearch(None),
            Arc::new(StubCompletion::failing()),
        );

        let outcome = handler.handle(&request("r1")).await.unwrap();
        assert_eq!(outcome.source, ReportSource::Fallback);

        let doc = store.get_report("r1").await.unwrap().unwrap();
        assert_eq!(doc.status, Some(ReportStatus::Completed));
        assert_eq!(
            doc.generated_report,
            build_fallback(&acme(), "Summarize market")
        );
        assert!(doc.generated_report.contains("Acme"));
        assert!(doc.generated_report.contains("Summarize market"));
        assert!(doc.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_completion_timeout_stores_fallback() {
        let store = seeded_store(&["r1"]);
        let mut slow = StubCompletion::replying("# Late");
        slow.delay = Duration::from_secs(30);
        let mut settings = test_settings();
        settings.completion_timeout = Duration::from_millis(50);

        let handler = ReportHandler::new(
            store.clone(),
            ReportGenerator::new(Arc::new(StubSearch(Some(vec![]))), Arc::new(slow), settings),
        );

        let outcome = handler.handle(&request("r1")).await.unwrap();
        assert_eq!(outcome.source, ReportSource::Fallback);

        let doc = store.get_report("r1").await.unwrap().unwrap();
        assert_eq!(doc.status, Some(ReportStatus::Completed));
        assert_eq!(doc.generated_report, build_fallback(&acme(), "Summarize market"));
    }

    #[tokio::test]
    async fn test_search_failure_still_uses_ai() {
        let store = seeded_store(&["r1"]);
        let handler = handler_with(
            store.clone(),
            StubSearch(None),
            Arc::new(StubCompletion::replying("# AI despite no search")),
        );

        let outcome = handler.handle(&request("r1")).await.unwrap();
        assert_eq!(outcome.source, ReportSource::Generated);
        let doc = store.get_report("r1").await.unwrap().unwrap();
        assert_eq!(doc.generated_report, "# AI despite no search");
    }

    #[tokio::test]
    async fn test_unknown_report_is_not_found_without_writes() {
        let store = seeded_store(&["other"]);
        let handler = handler_with(
            store.clone(),
            StubSearch(Some(vec![])),
            Arc::new(StubCompletion::replying("# x")),
        );

        let err = handler.handle(&request("missing")).await.unwrap_err();
        assert!(matches!(err, HandlerError::NotFound(ref id) if id == "missing"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_rejects_before_store_access() {
        let store = Arc::new(FlakyStore {
            inner: seeded_store(&[]),
            fail_status: vec![],
            fail_reads: true,
        });
        let handler = handler_with(
            store,
            StubSearch(Some(vec![])),
            Arc::new(StubCompletion::replying("# x")),
        );

        let mut no_user = request("r1");
        no_user.user_id = " ".to_string();
        assert!(matches!(
            handler.handle(&no_user).await,
            Err(HandlerError::Validation(_))
        ));
        assert!(matches!(
            handler.handle(&request("")).await,
            Err(HandlerError::Validation(_))
        ));
        for bad_id in ["a/b", ".", "..", "__meta__", " r1", "r1 "] {
            assert!(
                matches!(handler.handle(&request(bad_id)).await, Err(HandlerError::Validation(_))),
                "{:?} should be rejected",
                bad_id
            );
        }
    }

    #[tokio::test]
    async fn test_padded_id_does_not_touch_trimmed_document() {
        let store = seeded_store(&["r1"]);
        let handler = handler_with(
            store.clone(),
            StubSearch(Some(vec![])),
            Arc::new(StubCompletion::replying("# x")),
        );

        let err = handler.handle(&request(" r1")).await.unwrap_err();
        assert!(matches!(err, HandlerError::Validation(ref msg) if msg.contains("whitespace")));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_processing_is_visible_during_generation() {
        let store = seeded_store(&["r1"]);
        let completion = Arc::new(ObservingCompletion {
            store: store.clone(),
            report_id: "r1".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let handler = handler_with(store.clone(), StubSearch(Some(vec![])), completion.clone());

        handler.handle(&request("r1")).await.unwrap();

        assert_eq!(
            *completion.seen.lock().unwrap(),
            vec![Some(ReportStatus::Processing)]
        );
        let statuses: Vec<_> = store
            .updates_for("r1")
            .into_iter()
            .filter_map(|u| u.status)
            .collect();
        assert_eq!(statuses, vec![ReportStatus::Processing, ReportStatus::Completed]);
    }

    #[tokio::test]
    async fn test_processing_written_even_when_already_completed() {
        let store = seeded_store(&[]);
        let mut doc = ReportDocument::pending("r1", Utc::now());
        doc.status = Some(ReportStatus::Completed);
        doc.generated_report = "# old".to_string();
        store.insert(doc).unwrap();

        let handler = handler_with(
            store.clone(),
            StubSearch(Some(vec![])),
            Arc::new(StubCompletion::replying("# new")),
        );
        handler.handle(&request("r1")).await.unwrap();

        let first = store.updates_for("r1").into_iter().next().unwrap();
        assert_eq!(first.status, Some(ReportStatus::Processing));
        assert_eq!(
            store.get_report("r1").await.unwrap().unwrap().generated_report,
            "# new"
        );
    }

    #[tokio::test]
    async fn test_store_read_failure_is_store_error() {
        let store = Arc::new(FlakyStore {
            inner: seeded_store(&["r1"]),
            fail_status: vec![],
            fail_reads: true,
        });
        let handler = handler_with(
            store,
            StubSearch(Some(vec![])),
            Arc::new(StubCompletion::replying("# x")),
        );

        let err = handler.handle(&request("r1")).await.unwrap_err();
        assert!(matches!(err, HandlerError::Store(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_processing_write_failure_skips_generation() {
        let inner = seeded_store(&["r1"]);
        let completion = Arc::new(StubCompletion::replying("# x"));
        let handler = handler_with(
            Arc::new(FlakyStore {
                inner: inner.clone(),
                fail_status: vec![ReportStatus::Processing],
                fail_reads: false,
            }),
            StubSearch(Some(vec![])),
            completion.clone(),
        );

        let err = handler.handle(&request("r1")).await.unwrap_err();
        assert!(matches!(err, HandlerError::Store(_)));
        assert!(completion.prompts.lock().unwrap().is_empty());
        assert_eq!(inner.write_count(), 0);
    }

    #[tokio::test]
    async fn test_completed_write_failure_leaves_failed_note() {
        let inner = seeded_store(&["r1"]);
        let handler = handler_with(
            Arc::new(FlakyStore {
                inner: inner.clone(),
                fail_status: vec![ReportStatus::Completed],
                fail_reads: false,
            }),
            StubSearch(Some(vec![])),
            Arc::new(StubCompletion::replying("# x")),
        );

        let err = handler.handle(&request("r1")).await.unwrap_err();
        assert!(matches!(err, HandlerError::Store(_)));

        let doc = inner.get_report("r1").await.unwrap().unwrap();
        assert_eq!(doc.status, Some(ReportStatus::Failed));
        assert!(doc.error.unwrap().contains("deadline exceeded"));
        assert!(doc.generated_report.is_empty());
        assert!(doc.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_completed_write_failure_without_note_stays_processing() {
        let inner = seeded_store(&["r1"]);
        let handler = handler_with(
            Arc::new(FlakyStore {
                inner: inner.clone(),
                fail_status: vec![ReportStatus::Completed, ReportStatus::Failed],
                fail_reads: false,
            }),
            StubSearch(Some(vec![])),
            Arc::new(StubCompletion::failing()),
        );

        assert!(handler.handle(&request("r1")).await.is_err());
        let doc = inner.get_report("r1").await.unwrap().unwrap();
        assert_eq!(doc.status, Some(ReportStatus::Processing));
    }
}
