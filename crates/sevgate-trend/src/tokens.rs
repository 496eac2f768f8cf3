//! Token budget estimate
//!
//! `estimate = base + per_violation * count + report_bytes / 4`, measured
//! against a fixed ceiling and appended to `token-usage.jsonl`.

use crate::jsonl::{JsonlLog, TrendError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sevgate_core::GateConfig;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_TOKEN_MAX: u64 = 1_000_000;
pub const BASE_TOKENS: u64 = 20_000;
pub const TOKENS_PER_VIOLATION: u64 = 150;
pub const BYTES_PER_TOKEN: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningLevel {
    Ok,
    Info,
    Warning,
    Critical,
}

impl WarningLevel {
    /// Above 95, 85 and 75 percent respectively
    pub fn from_percent(percent: f64) -> Self {
        if percent > 95.0 {
            WarningLevel::Critical
        } else if percent > 85.0 {
            WarningLevel::Warning
        } else if percent > 75.0 {
            WarningLevel::Info
        } else {
            WarningLevel::Ok
        }
    }
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningLevel::Ok => write!(f, "OK"),
            WarningLevel::Info => write!(f, "INFO"),
            WarningLevel::Warning => write!(f, "WARNING"),
            WarningLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub timestamp: DateTime<Utc>,
    pub estimated: u64,
    pub max_tokens: u64,
    pub percent_used: f64,
    pub remaining: u64,
    pub warning_level: WarningLevel,
}

impl TokenUsage {
    /// Operator-facing line for anything above OK
    pub fn warning(&self) -> Option<String> {
        let message = match self.warning_level {
            WarningLevel::Ok => return None,
            WarningLevel::Info => "token usage is climbing",
            WarningLevel::Warning => "token usage is high; consider summarizing",
            WarningLevel::Critical => "token budget nearly exhausted; update evidence now",
        };
        Some(format!(
            "{}: {} ({:.1}% of {}, {} remaining)",
            self.warning_level, message, self.percent_used, self.max_tokens, self.remaining
        ))
    }
}

#[derive(Debug)]
pub struct TokenTracker {
    log: JsonlLog<TokenUsage>,
    max_tokens: u64,
}

impl TokenTracker {
    pub fn new(path: impl Into<PathBuf>, max_tokens: u64) -> Self {
        Self {
            log: JsonlLog::new(path),
            max_tokens: max_tokens.max(1),
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.token_usage_path(), config.token_max)
    }

    pub fn max_tokens(&self) -> u64 {
        self.max_tokens
    }

    pub fn estimate(&self, violation_count: usize, report_bytes: usize) -> TokenUsage {
        let estimated = BASE_TOKENS
            + TOKENS_PER_VIOLATION * violation_count as u64
            + report_bytes as u64 / BYTES_PER_TOKEN;
        let percent_used = estimated as f64 * 100.0 / self.max_tokens as f64;
        TokenUsage {
            timestamp: Utc::now(),
            estimated,
            max_tokens: self.max_tokens,
            percent_used,
            remaining: self.max_tokens.saturating_sub(estimated),
            warning_level: WarningLevel::from_percent(percent_used),
        }
    }

    pub fn record(&self, usage: &TokenUsage) -> Result<(), TrendError> {
        if let Some(message) = usage.warning() {
            tracing::warn!(estimated = usage.estimated, "{}", message);
        }
        self.log.append(usage)
    }

    pub fn tail(&self, n: usize) -> Result<Vec<TokenUsage>, TrendError> {
        self.log.tail(n)
    }
}
