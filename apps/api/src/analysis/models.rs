//! Request-scoped values that flow through one analysis. None of them outlive the request.

use bytes::Bytes;
use serde::Serialize;

/// An uploaded resume: raw PDF bytes plus the client-supplied filename.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    pub filename: String,
    pub bytes: Bytes,
}

impl ResumeDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Text recovered from a resume. Always contains at least one non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    /// Returns `None` when the text is empty or whitespace-only.
    pub fn new(text: String) -> Option<Self> {
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free-text job description supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription(String);

impl JobDescription {
    /// Rejects empty or whitespace-only text; no other validation applies.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The fully rendered instruction payload sent to the completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt(String);

impl AnalysisPrompt {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    #[cfg(test)]
    pub(crate) fn from_static(text: &str) -> Self {
        Self(text.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unmodified text returned by the completion backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawResponse(String);

impl RawResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_text_rejects_whitespace() {
        assert!(ExtractedText::new(" \n\t ".to_string()).is_none());
        assert!(ExtractedText::new(String::new()).is_none());
        assert_eq!(
            ExtractedText::new("  Rust  ".to_string()).unwrap().as_str(),
            "  Rust  "
        );
    }

    #[test]
    fn test_job_description_requires_content() {
        assert!(JobDescription::new("").is_none());
        assert!(JobDescription::new("\n").is_none());
        assert_eq!(JobDescription::new("Rust dev").unwrap().as_str(), "Rust dev");
    }
}
