use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::layout::{default_sheet_config, MeasureFailurePolicy, SheetConfig};

/// Application configuration loaded from environment variables.
/// Startup fails if a variable is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Order backend. Without it saves go to a process-local store.
    pub backend_url: Option<String>,
    pub column_capacity: f32,
    pub safety_margin: f32,
    pub failure_policy: MeasureFailurePolicy,
    /// Open booklets untouched for this long are dropped.
    pub session_idle_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = default_sheet_config();
        Ok(Config {
            backend_url: optional_env("BACKEND_URL"),
            column_capacity: parse_env("COLUMN_CAPACITY", defaults.column_capacity)?,
            safety_margin: parse_env("SAFETY_MARGIN", defaults.safety_margin)?,
            failure_policy: match optional_env("MEASURE_FAILURE_POLICY") {
                Some(raw) => parse_failure_policy(&raw)?,
                None => defaults.failure_policy,
            },
            session_idle_timeout: Duration::from_secs_f32(parse_env(
                "SESSION_IDLE_TIMEOUT_SECS",
                DEFAULT_SESSION_IDLE_SECS,
            )?),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn sheet_config(&self) -> SheetConfig {
        SheetConfig {
            column_capacity: self.column_capacity,
            safety_margin: self.safety_margin,
            failure_policy: self.failure_policy,
        }
    }
}

const DEFAULT_SESSION_IDLE_SECS: f32 = 3600.0;

impl Default for Config {
    fn default() -> Self {
        let sheet = default_sheet_config();
        Config {
            backend_url: None,
            column_capacity: sheet.column_capacity,
            safety_margin: sheet.safety_margin,
            failure_policy: sheet.failure_policy,
            session_idle_timeout: Duration::from_secs_f32(DEFAULT_SESSION_IDLE_SECS),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

fn parse_failure_policy(raw: &str) -> Result<MeasureFailurePolicy> {
    raw.parse::<MeasureFailurePolicy>()
        .map_err(|e: String| anyhow!(e))
        .context("MEASURE_FAILURE_POLICY must be 'spill' or 'fits'")
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env(key: &str, default: f32) -> Result<f32> {
    let Some(raw) = optional_env(key) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<f32>()
        .with_context(|| format!("{key} must be a number, got '{raw}'"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(anyhow!("{key} must be a non-negative number, got '{raw}'"));
    }
    Ok(value)
}
