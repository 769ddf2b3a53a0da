use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Attach the web search tool to every forecast request.
    pub web_search: bool,
    /// Applied around the model call by the pipeline.
    pub upstream_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            web_search: parse_flag(
                "FORECAST_WEB_SEARCH",
                std::env::var("FORECAST_WEB_SEARCH").ok().as_deref(),
                true,
            )?,
            upstream_timeout: Duration::from_secs(
                std::env::var("UPSTREAM_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse::<u64>()
                    .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_flag(key: &str, value: Option<&str>, default: bool) -> Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("{key} must be true or false, got '{other}'"),
        },
    }
}
