//! Response Parser — recovers the structured result from free model text.
//!
//! Models routinely wrap the JSON object in prose or markdown fences, so the payload is taken
//! as the span from the first `{` to the last `}` of the trimmed text. This deliberately keeps
//! the outermost span even when the text holds several unrelated brace regions; in that case
//! the slice usually fails to decode and the caller gets a `parse` error with the raw text.
//!
//! The parser does not check the schema. See `schema::validate` for that.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::analysis::models::RawResponse;

/// A decoded result object, passed on exactly as the model produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisResult(pub Map<String, Value>);

impl AnalysisResult {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// No `{ ... }` span in the response.
    Format,
    /// A span exists but is not a JSON object.
    Parse,
}

/// A model reply that could not be turned into a result. The raw text is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResult {
    pub kind: ErrorKind,
    pub raw_response: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Analysis(AnalysisResult),
    Error(ErrorResult),
}

/// Returns the candidate payload: first `{` through last `}` of the trimmed text, inclusive.
pub fn locate_payload(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end > start {
        Some(&trimmed[start..=end])
    } else {
        None
    }
}

pub fn parse_response(raw: &RawResponse) -> ParseOutcome {
    let Some(payload) = locate_payload(raw.as_str()) else {
        error!("Could not find valid JSON in response");
        return ParseOutcome::Error(ErrorResult {
            kind: ErrorKind::Format,
            raw_response: raw.as_str().to_string(),
        });
    };

    match serde_json::from_str::<Map<String, Value>>(payload) {
        Ok(map) => {
            info!("Successfully parsed JSON response ({} keys)", map.len());
            ParseOutcome::Analysis(AnalysisResult(map))
        }
        Err(e) => {
            error!("JSON parsing error: {e}");
            ParseOutcome::Error(ErrorResult {
                kind: ErrorKind::Parse,
                raw_response: raw.as_str().to_string(),
            })
        }
    }
}
