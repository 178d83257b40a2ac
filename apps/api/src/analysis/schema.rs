//! Schema view and validation for decoded analysis results.
//!
//! Two separate concerns, kept apart from the parser:
//! - `AnalysisReport::from_result` is the consumer-side view. Missing or mistyped keys fall
//!   back to empty defaults so a decodable result always renders.
//! - `validate` is the strict check of the result contract. It reports violations and never
//!   mutates or rejects the result itself.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::analysis::parser::AnalysisResult;

pub const KEY_JD_MATCH: &str = "JD Match";
pub const KEY_MISSING_KEYWORDS: &str = "MissingKeywords";
pub const KEY_PROFILE_SUMMARY: &str = "Profile Summary";
pub const KEY_IMPROVEMENT_SUGGESTIONS: &str = "Improvement Suggestions";
pub const KEY_RESUME_STRENGTHS: &str = "Resume Strengths";
pub const KEY_KEY_ROLE_REQUIREMENTS: &str = "Key Role Requirements";

/// Fixed missing-keyword categories, in display order.
pub const KEYWORD_CATEGORIES: [&str; 4] = [
    "Technical Skills",
    "Soft Skills",
    "Experience",
    "Education/Certifications",
];

fn match_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{1,3}%$").expect("static regex is valid"))
}

// ────────────────────────────────────────────────────────────────────────────
// Typed view
// ────────────────────────────────────────────────────────────────────────────

/// Missing keywords, either grouped by category or (older replies) a flat list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MissingKeywords {
    Categorized(Vec<KeywordCategory>),
    Flat(Vec<String>),
}

impl Default for MissingKeywords {
    fn default() -> Self {
        MissingKeywords::Categorized(Vec::new())
    }
}

impl MissingKeywords {
    pub fn total(&self) -> usize {
        match self {
            MissingKeywords::Categorized(categories) => {
                categories.iter().map(|c| c.keywords.len()).sum()
            }
            MissingKeywords::Flat(keywords) => keywords.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordCategory {
    pub category: String,
    pub keywords: Vec<String>,
}

/// Score interpretation bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBand {
    /// 80–100%: highly qualified.
    Excellent,
    /// 65–79%: well-qualified with some gaps.
    Good,
    /// 50–64%: core qualifications, significant gaps.
    Moderate,
    /// Below 50%.
    NeedsImprovement,
}

impl MatchBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            MatchBand::Excellent
        } else if score >= 65.0 {
            MatchBand::Good
        } else if score >= 50.0 {
            MatchBand::Moderate
        } else {
            MatchBand::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Score exactly as the model wrote it; "N/A" when absent.
    pub jd_match: String,
    pub match_score: Option<f64>,
    pub match_band: Option<MatchBand>,
    pub missing_keywords: MissingKeywords,
    pub profile_summary: String,
    pub improvement_suggestions: Vec<String>,
    pub resume_strengths: Vec<String>,
    pub key_role_requirements: String,
}

impl AnalysisReport {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let jd_match = result
            .get(KEY_JD_MATCH)
            .and_then(Value::as_str)
            .unwrap_or("N/A")
            .to_string();
        let match_score = parse_match_score(&jd_match);

        Self {
            match_band: match_score.map(MatchBand::from_score),
            match_score,
            jd_match,
            missing_keywords: missing_keywords(result.get(KEY_MISSING_KEYWORDS)),
            profile_summary: string_or_default(result.get(KEY_PROFILE_SUMMARY)),
            improvement_suggestions: string_list(result.get(KEY_IMPROVEMENT_SUGGESTIONS)),
            resume_strengths: string_list(result.get(KEY_RESUME_STRENGTHS)),
            key_role_requirements: string_or_default(result.get(KEY_KEY_ROLE_REQUIREMENTS)),
        }
    }
}

/// "72%" -> 72.0. Tolerates surrounding whitespace and a missing percent sign.
pub fn parse_match_score(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn string_or_default(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Keeps only the string elements of an array; anything else yields an empty list.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn missing_keywords(value: Option<&Value>) -> MissingKeywords {
    match value {
        Some(Value::Object(map)) => MissingKeywords::Categorized(
            KEYWORD_CATEGORIES
                .iter()
                .filter_map(|category| {
                    let keywords = string_list(map.get(*category));
                    (!keywords.is_empty()).then(|| KeywordCategory {
                        category: category.to_string(),
                        keywords,
                    })
                })
                .collect(),
        ),
        Some(Value::Array(_)) => MissingKeywords::Flat(string_list(value)),
        _ => MissingKeywords::default(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Strict validation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    pub key: String,
    pub problem: String,
}

impl SchemaViolation {
    fn new(key: &str, problem: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            problem: problem.into(),
        }
    }
}

/// Checks a decoded result against the full result contract.
pub fn validate(result: &AnalysisResult) -> Result<(), Vec<SchemaViolation>> {
    let mut violations = Vec::new();

    match result.get(KEY_JD_MATCH) {
        Some(Value::String(s)) if match_pattern().is_match(s) => {}
        Some(Value::String(s)) => violations.push(SchemaViolation::new(
            KEY_JD_MATCH,
            format!("'{s}' is not a percentage like '70%'"),
        )),
        Some(_) => violations.push(SchemaViolation::new(KEY_JD_MATCH, "must be a string")),
        None => violations.push(SchemaViolation::new(KEY_JD_MATCH, "missing")),
    }

    match result.get(KEY_MISSING_KEYWORDS) {
        Some(Value::Object(map)) => {
            for category in KEYWORD_CATEGORIES {
                if let Some(v) = map.get(category) {
                    if !is_string_list(v) {
                        violations.push(SchemaViolation::new(
                            KEY_MISSING_KEYWORDS,
                            format!("category '{category}' must be a list of strings"),
                        ));
                    }
                }
            }
        }
        Some(_) => violations.push(SchemaViolation::new(
            KEY_MISSING_KEYWORDS,
            "must be a mapping of category to keywords",
        )),
        None => violations.push(SchemaViolation::new(KEY_MISSING_KEYWORDS, "missing")),
    }

    match result.get(KEY_PROFILE_SUMMARY) {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(Value::String(_)) => {
            violations.push(SchemaViolation::new(KEY_PROFILE_SUMMARY, "must not be empty"))
        }
        Some(_) => violations.push(SchemaViolation::new(KEY_PROFILE_SUMMARY, "must be a string")),
        None => violations.push(SchemaViolation::new(KEY_PROFILE_SUMMARY, "missing")),
    }

    for key in [KEY_IMPROVEMENT_SUGGESTIONS, KEY_RESUME_STRENGTHS] {
        match result.get(key) {
            Some(v) if is_string_list(v) => {}
            Some(_) => violations.push(SchemaViolation::new(key, "must be a list of strings")),
            None => violations.push(SchemaViolation::new(key, "missing")),
        }
    }

    match result.get(KEY_KEY_ROLE_REQUIREMENTS) {
        Some(Value::String(_)) => {}
        Some(_) => violations.push(SchemaViolation::new(
            KEY_KEY_ROLE_REQUIREMENTS,
            "must be a string",
        )),
        None => violations.push(SchemaViolation::new(KEY_KEY_ROLE_REQUIREMENTS, "missing")),
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn is_string_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_string))
}
