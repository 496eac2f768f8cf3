//! Severity history
//!
//! One [`HistoryEntry`] per gate decision, appended to
//! `severity-history.jsonl`. The trend compares the two most recent entries.

use crate::jsonl::{JsonlLog, TrendError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sevgate_core::{EvaluatedViolation, GateConfig, Platform, Severity, SeverityCounts, SEVGATE_VERSION};
use sevgate_policy::GateDecision;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Average-score movement that counts as a change
pub const SCORE_DELTA_THRESHOLD: f64 = 10.0;
/// Violation-count movement that counts as a change
pub const COUNT_DELTA_THRESHOLD: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    pub counts: SeverityCounts,
    pub total: usize,
    pub average_score: f64,
    /// Percentage of evaluations that were computed rather than fallbacks
    pub intelligent_rate: f64,
    #[serde(default)]
    pub by_platform: BTreeMap<Platform, usize>,
    pub gate_passed: bool,
    #[serde(default)]
    pub blocked_by: Option<Severity>,
    #[serde(default)]
    pub engine_version: String,
}

impl HistoryEntry {
    /// Summarize a decision; `evaluated` is the set that took part in it
    pub fn from_decision(evaluated: &[EvaluatedViolation], decision: &GateDecision) -> Self {
        let n = evaluated.len();
        let average_score = if n == 0 {
            0.0
        } else {
            round1(evaluated.iter().map(|ev| ev.score()).sum::<f64>() / n as f64)
        };
        let intelligent_rate = if n == 0 {
            100.0
        } else {
            let computed = evaluated.iter().filter(|ev| ev.evaluation.is_computed()).count();
            round1(computed as f64 * 100.0 / n as f64)
        };

        let mut by_platform = BTreeMap::new();
        for ev in evaluated {
            *by_platform.entry(ev.violation.platform()).or_insert(0) += 1;
        }

        Self {
            timestamp: Utc::now(),
            commit: None,
            branch: None,
            counts: decision.violation_counts,
            total: decision.violation_counts.total(),
            average_score,
            intelligent_rate,
            by_platform,
            gate_passed: !decision.should_block,
            blocked_by: decision.blocked_by,
            engine_version: SEVGATE_VERSION.to_string(),
        }
    }

    pub fn with_commit(mut self, commit: impl Into<String>, branch: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self.branch = Some(branch.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Worsening,
    Improving,
    Stable,
    InsufficientData,
}

impl Trend {
    /// Worsening wins when one delta rises and the other falls
    pub fn classify(previous: &HistoryEntry, latest: &HistoryEntry) -> Self {
        let score_delta = latest.average_score - previous.average_score;
        let count_delta = latest.total as i64 - previous.total as i64;
        if score_delta > SCORE_DELTA_THRESHOLD || count_delta > COUNT_DELTA_THRESHOLD {
            Trend::Worsening
        } else if score_delta < -SCORE_DELTA_THRESHOLD || count_delta < -COUNT_DELTA_THRESHOLD {
            Trend::Improving
        } else {
            Trend::Stable
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Worsening => write!(f, "WORSENING"),
            Trend::Improving => write!(f, "IMPROVING"),
            Trend::Stable => write!(f, "STABLE"),
            Trend::InsufficientData => write!(f, "INSUFFICIENT_DATA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<HistoryEntry>,
    pub score_delta: f64,
    pub count_delta: i64,
    /// Entries examined
    pub window: usize,
    /// Share of examined entries whose gate passed, 0..=100
    pub pass_rate: f64,
}

impl TrendReport {
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        let window = entries.len();
        let pass_rate = if window == 0 {
            0.0
        } else {
            round1(entries.iter().filter(|e| e.gate_passed).count() as f64 * 100.0 / window as f64)
        };

        let latest = entries.pop();
        let previous = entries.pop();
        match (previous, latest) {
            (Some(previous), Some(latest)) => Self {
                trend: Trend::classify(&previous, &latest),
                score_delta: round1(latest.average_score - previous.average_score),
                count_delta: latest.total as i64 - previous.total as i64,
                latest: Some(latest),
                previous: Some(previous),
                window,
                pass_rate,
            },
            (_, latest) => Self {
                trend: Trend::InsufficientData,
                latest,
                previous: None,
                score_delta: 0.0,
                count_delta: 0,
                window,
                pass_rate,
            },
        }
    }
}

#[derive(Debug)]
pub struct SeverityTracker {
    log: JsonlLog<HistoryEntry>,
}

impl SeverityTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            log: JsonlLog::new(path),
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.severity_history_path())
    }

    pub fn record(&self, entry: &HistoryEntry) -> Result<(), TrendError> {
        self.log.append(entry)?;
        tracing::debug!(
            path = %self.log.path().display(),
            total = entry.total,
            gate_passed = entry.gate_passed,
            "severity history appended"
        );
        Ok(())
    }

    pub fn tail(&self, n: usize) -> Result<Vec<HistoryEntry>, TrendError> {
        self.log.tail(n)
    }

    /// Trend over the last `limit` entries (at least two are read)
    pub fn trend(&self, limit: usize) -> Result<TrendReport, TrendError> {
        Ok(TrendReport::from_entries(self.log.tail(limit.max(2))?))
    }
}
