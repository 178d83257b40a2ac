//! Axum route handlers for the Analysis API.

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::models::{JobDescription, ResumeDocument};
use crate::analysis::parser::{AnalysisResult, ErrorKind, ParseOutcome};
use crate::analysis::schema::{validate, AnalysisReport, SchemaViolation};
use crate::errors::AppError;
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const JOB_DESCRIPTION_FIELD: &str = "job_description";

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

/// Body of a completed analysis. A model reply that could not be decoded is still a
/// completed analysis: it comes back as `status: "error"` with the raw text attached.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalyzeResponse {
    Ok {
        analysis_id: Uuid,
        analyzed_at: DateTime<Utc>,
        result: AnalysisResult,
        report: AnalysisReport,
        schema_violations: Vec<SchemaViolation>,
    },
    Error {
        analysis_id: Uuid,
        analyzed_at: DateTime<Utc>,
        kind: ErrorKind,
        raw_response: String,
    },
}

impl AnalyzeResponse {
    fn from_outcome(analysis_id: Uuid, outcome: ParseOutcome) -> Self {
        let analyzed_at = Utc::now();
        match outcome {
            ParseOutcome::Analysis(result) => {
                let report = AnalysisReport::from_result(&result);
                let schema_violations = validate(&result).err().unwrap_or_default();
                AnalyzeResponse::Ok {
                    analysis_id,
                    analyzed_at,
                    result,
                    report,
                    schema_violations,
                }
            }
            ParseOutcome::Error(err) => AnalyzeResponse::Error {
                analysis_id,
                analyzed_at,
                kind: err.kind,
                raw_response: err.raw_response,
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
///
/// Multipart form with a `resume` PDF file and a `job_description` text field.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let (document, jd) = read_analysis_form(multipart).await?;

    let analysis_id = Uuid::new_v4();
    let span = info_span!("analysis", %analysis_id, filename = %document.filename);

    let outcome = state.pipeline.analyze(document, &jd).instrument(span).await?;

    let response = AnalyzeResponse::from_outcome(analysis_id, outcome);
    match &response {
        AnalyzeResponse::Ok {
            report,
            schema_violations,
            ..
        } => info!(
            %analysis_id,
            jd_match = %report.jd_match,
            missing_keywords = report.missing_keywords.total(),
            violations = schema_violations.len(),
            "Analysis completed"
        ),
        AnalyzeResponse::Error { kind, .. } => {
            info!(%analysis_id, ?kind, "Analysis completed with unusable model reply")
        }
    }

    Ok(Json(response))
}

/// POST /api/v1/extract
///
/// Runs extraction alone so the user can check what text the resume yields before
/// spending a completion call on it.
pub async fn handle_extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    let document = read_resume_form(multipart).await?;
    let filename = document.filename.clone();

    let text = state
        .pipeline
        .extract_text(document)
        .instrument(info_span!("extract", %filename))
        .await?;

    let text = text.as_str().to_string();
    Ok(Json(ExtractResponse {
        filename,
        chars: text.chars().count(),
        text,
    }))
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub filename: String,
    pub chars: usize,
    pub text: String,
}

async fn read_analysis_form(
    mut multipart: Multipart,
) -> Result<(ResumeDocument, JobDescription), AppError> {
    let mut resume: Option<ResumeDocument> = None;
    let mut jd_text: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(RESUME_FIELD) => resume = Some(read_resume_field(field).await?),
            Some(JOB_DESCRIPTION_FIELD) => jd_text = Some(field.text().await?),
            _ => {}
        }
    }

    let document = resume
        .ok_or_else(|| AppError::Validation(format!("'{RESUME_FIELD}' file is required")))?;
    let jd = jd_text
        .and_then(JobDescription::new)
        .ok_or_else(|| AppError::Validation(format!("{JOB_DESCRIPTION_FIELD} cannot be empty")))?;

    Ok((document, jd))
}

async fn read_resume_form(mut multipart: Multipart) -> Result<ResumeDocument, AppError> {
    let mut resume: Option<ResumeDocument> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(RESUME_FIELD) {
            resume = Some(read_resume_field(field).await?);
        }
    }

    resume.ok_or_else(|| AppError::Validation(format!("'{RESUME_FIELD}' file is required")))
}

/// Empty uploads are passed through; the extractor reports them as unreadable.
async fn read_resume_field(field: Field<'_>) -> Result<ResumeDocument, AppError> {
    let filename = field
        .file_name()
        .map(str::to_owned)
        .unwrap_or_else(|| "resume.pdf".to_string());
    validate_pdf_filename(&filename)?;
    let bytes = field.bytes().await?;
    Ok(ResumeDocument::new(filename, bytes))
}

fn validate_pdf_filename(filename: &str) -> Result<(), AppError> {
    let is_pdf = std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Resume must be a PDF file, got '{filename}'"
        )))
    }
}
