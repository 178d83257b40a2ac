use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if the completion backend credentials are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Optional caller-side deadline for the completion call. Unset means no deadline.
    pub llm_timeout_secs: Option<u64>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            google_api_key: require_env("GOOGLE_API_KEY")?,
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: optional_env("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            llm_timeout_secs: optional_env("LLM_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_UPLOAD_BYTES must be a byte count")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
