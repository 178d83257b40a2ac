//! Analysis Pipeline — extract, prompt, complete, parse. Strictly sequential and fail-fast:
//! a failed stage ends the request and later stages never run.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::analysis::extractor::DocumentExtractor;
use crate::analysis::models::{ExtractedText, JobDescription, ResumeDocument};
use crate::analysis::parser::{parse_response, ParseOutcome};
use crate::analysis::prompts::build_prompt;
use crate::llm_client::CompletionBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extraction,
    Completion,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extraction => f.write_str("extraction"),
            Stage::Completion => f.write_str("completion"),
        }
    }
}

/// Terminal failure of one analysis. `detail` is for logs only; callers branch on `stage`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} stage failed: {detail}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub detail: String,
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    extractor: Arc<dyn DocumentExtractor>,
    backend: Arc<dyn CompletionBackend>,
}

impl AnalysisPipeline {
    pub fn new(extractor: Arc<dyn DocumentExtractor>, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { extractor, backend }
    }

    /// Extraction stage on its own. Used by `analyze` and by the text preview endpoint.
    pub async fn extract_text(
        &self,
        document: ResumeDocument,
    ) -> Result<ExtractedText, PipelineFailure> {
        self.extractor.extract(document).await.map_err(|e| {
            error!("Extraction stage failed: {e}");
            PipelineFailure {
                stage: Stage::Extraction,
                detail: e.to_string(),
            }
        })
    }

    /// Runs one analysis. Returns the parser's outcome unchanged, or the failing stage.
    pub async fn analyze(
        &self,
        document: ResumeDocument,
        jd: &JobDescription,
    ) -> Result<ParseOutcome, PipelineFailure> {
        let resume = self.extract_text(document).await?;

        let prompt = build_prompt(&resume, jd);
        info!("Built analysis prompt ({} chars)", prompt.as_str().len());

        info!("Requesting completion");
        let raw = self.backend.complete(&prompt).await.map_err(|e| {
            error!("Error generating response: {e}");
            PipelineFailure {
                stage: Stage::Completion,
                detail: e.to_string(),
            }
        })?;
        info!("Response generated successfully ({} chars)", raw.as_str().len());

        Ok(parse_response(&raw))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::analysis::extractor::{ExtractionFailure, PdfExtractor};
    use crate::analysis::models::{AnalysisPrompt, RawResponse};
    use crate::analysis::parser::ErrorKind;
    use crate::llm_client::LlmError;

    /// Extractor double that returns canned text or a failure.
    pub(crate) struct StubExtractor(pub Result<String, ExtractionFailure>);

    #[async_trait]
    impl DocumentExtractor for StubExtractor {
        async fn extract(
            &self,
            _document: ResumeDocument,
        ) -> Result<ExtractedText, ExtractionFailure> {
            let text = self.0.clone()?;
            ExtractedText::new(text).ok_or(ExtractionFailure::NoText)
        }
    }

    /// Completion double that records every prompt it receives.
    /// `None` replies simulate an unreachable backend.
    pub(crate) struct CountingBackend {
        reply: Option<String>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl CountingBackend {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionBackend for CountingBackend {
        async fn complete(&self, prompt: &AnalysisPrompt) -> Result<RawResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.as_str().to_string());
            match &self.reply {
                Some(text) => Ok(RawResponse::new(text.clone())),
                None => Err(LlmError::Api {
                    status: 429,
                    message: "Quota exceeded".to_string(),
                }),
            }
        }
    }

    fn pipeline(
        extractor: impl DocumentExtractor + 'static,
        backend: Arc<CountingBackend>,
    ) -> AnalysisPipeline {
        AnalysisPipeline::new(Arc::new(extractor), backend)
    }

    fn document() -> ResumeDocument {
        ResumeDocument::new("resume.pdf", b"%PDF-1.4".to_vec())
    }

    fn jd(text: &str) -> JobDescription {
        JobDescription::new(text).unwrap()
    }

    #[tokio::test]
    async fn test_scenario_a_result_is_returned_unchanged() {
        let payload = json!({
            "JD Match": "70%",
            "MissingKeywords": {"Technical Skills": ["AWS"]},
            "Profile Summary": "...",
            "Improvement Suggestions": ["Add AWS experience"],
            "Resume Strengths": ["Strong SQL skills"],
            "Key Role Requirements": "..."
        });
        let backend = Arc::new(CountingBackend::replying(&payload.to_string()));
        let pipeline = pipeline(
            StubExtractor(Ok("Python, SQL, 3 years experience".to_string())),
            backend.clone(),
        );

        let outcome = pipeline
            .analyze(document(), &jd("Requires Python, SQL, AWS"))
            .await
            .unwrap();

        let ParseOutcome::Analysis(result) = outcome else {
            panic!("expected analysis, got {outcome:?}");
        };
        assert_eq!(Value::Object(result.0), payload);
        assert_eq!(backend.calls(), 1);

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Python, SQL, 3 years experience"));
        assert!(prompts[0].contains("Requires Python, SQL, AWS"));
    }

    #[tokio::test]
    async fn test_scenario_b_refusal_is_format_error() {
        let backend = Arc::new(CountingBackend::replying("I cannot process this request."));
        let pipeline = pipeline(StubExtractor(Ok("Resume".to_string())), backend.clone());

        let outcome = pipeline.analyze(document(), &jd("JD")).await.unwrap();

        let ParseOutcome::Error(err) = outcome else {
            panic!("expected error result, got {outcome:?}");
        };
        assert_eq!(err.kind, ErrorKind::Format);
        assert_eq!(err.raw_response, "I cannot process this request.");
    }

    #[tokio::test]
    async fn test_scenario_c_unreadable_pdf_never_calls_backend() {
        let backend = Arc::new(CountingBackend::replying("{}"));
        let pipeline = pipeline(PdfExtractor, backend.clone());
        let encrypted = ResumeDocument::new(
            "locked.pdf",
            b"%PDF-1.6\ntrailer << /Encrypt 9 0 R >>\n%%EOF".to_vec(),
        );

        let failure = pipeline.analyze(encrypted, &jd("JD")).await.unwrap_err();

        assert_eq!(failure.stage, Stage::Extraction);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_resume_text_stops_before_completion() {
        let backend = Arc::new(CountingBackend::replying("{}"));
        let pipeline = pipeline(StubExtractor(Ok("  \n ".to_string())), backend.clone());

        let failure = pipeline.analyze(document(), &jd("JD")).await.unwrap_err();

        assert_eq!(failure.stage, Stage::Extraction);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_is_completion_stage() {
        let backend = Arc::new(CountingBackend::failing());
        let pipeline = pipeline(StubExtractor(Ok("Resume".to_string())), backend.clone());

        let failure = pipeline.analyze(document(), &jd("JD")).await.unwrap_err();

        assert_eq!(failure.stage, Stage::Completion);
        assert!(failure.detail.contains("Quota exceeded"));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_each_analysis_calls_backend_again() {
        let backend = Arc::new(CountingBackend::replying("{\"JD Match\": \"10%\"}"));
        let pipeline = pipeline(StubExtractor(Ok("Resume".to_string())), backend.clone());

        let first = pipeline.analyze(document(), &jd("JD")).await.unwrap();
        let second = pipeline.analyze(document(), &jd("JD")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_undecodable_reply_keeps_raw_text() {
        let raw = "Here you go: {\"JD Match\": 70%} hope it helps";
        let backend = Arc::new(CountingBackend::replying(raw));
        let pipeline = pipeline(StubExtractor(Ok("Resume".to_string())), backend);

        let outcome = pipeline.analyze(document(), &jd("JD")).await.unwrap();

        assert_eq!(
            outcome,
            ParseOutcome::Error(crate::analysis::parser::ErrorResult {
                kind: ErrorKind::Parse,
                raw_response: raw.to_string(),
            })
        );
    }
}
