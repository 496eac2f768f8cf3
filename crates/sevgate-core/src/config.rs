//! Gate configuration
//!
//! Layered as defaults, then an optional YAML file named by `SEVGATE_CONFIG`,
//! then `SEVGATE_*` environment variables. Invalid values are fatal at startup.

use crate::error::SevgateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// How the blocking policy treats evaluated violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockingMode {
    /// Block on any CRITICAL or HIGH
    #[default]
    Normal,
    /// Block on any violation at all
    Strict,
    /// Block on CRITICAL or HIGH, report the rest as deferred debt
    #[serde(alias = "critical_high_only")]
    CriticalHighOnly,
}

impl fmt::Display for BlockingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockingMode::Normal => write!(f, "normal"),
            BlockingMode::Strict => write!(f, "strict"),
            BlockingMode::CriticalHighOnly => write!(f, "criticalHighOnly"),
        }
    }
}

impl FromStr for BlockingMode {
    type Err = SevgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "normal" => Ok(BlockingMode::Normal),
            "strict" => Ok(BlockingMode::Strict),
            "criticalhighonly" => Ok(BlockingMode::CriticalHighOnly),
            _ => Err(SevgateError::config(format!("invalid blocking mode '{}'", s))),
        }
    }
}

/// Which violations a no-argument gate check considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateScope {
    /// Only violations in staged files
    #[default]
    Staging,
    /// Every violation in the repository
    Repo,
}

impl FromStr for GateScope {
    type Err = SevgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staging" | "staged" => Ok(GateScope::Staging),
            "repo" | "repository" => Ok(GateScope::Repo),
            _ => Err(SevgateError::config(format!("invalid gate scope '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub mode: BlockingMode,
    pub scope: GateScope,

    // === Advisory thresholds ===
    /// Technical debt ceiling in hours
    pub tech_debt_max_hours: f64,
    /// Minimum acceptable maintainability index (0..=100)
    pub maintainability_min: f64,

    // === Session gate ===
    /// How long an ALLOWED gate check stays valid
    pub gate_validity_ms: u64,

    // === Storage ===
    pub history_dir: PathBuf,
    /// Scanner output consumed by the no-argument gate check
    pub violations_path: PathBuf,
    pub repo_root: PathBuf,

    // === Budgets ===
    pub token_max: u64,
    pub git_timeout_ms: u64,
    pub vcs_concurrency: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            mode: BlockingMode::Normal,
            scope: GateScope::Staging,
            tech_debt_max_hours: 100.0,
            maintainability_min: 60.0,
            gate_validity_ms: 600_000,
            history_dir: PathBuf::from(".audit_tmp"),
            violations_path: PathBuf::from(".audit_tmp/ast-summary.json"),
            repo_root: PathBuf::from("."),
            token_max: 1_000_000,
            git_timeout_ms: 2_000,
            vcs_concurrency: 4,
        }
    }
}

impl GateConfig {
    /// Load from YAML; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, SevgateError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| SevgateError::config(format!("invalid YAML: {}", e)))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SevgateError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SevgateError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    /// Defaults, then `SEVGATE_CONFIG`, then the process environment. Validated.
    pub fn load() -> Result<Self, SevgateError> {
        let base = match std::env::var("SEVGATE_CONFIG") {
            Ok(path) => Self::from_yaml_file(path)?,
            Err(_) => Self::default(),
        };
        let config = base.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        tracing::debug!(mode = %config.mode, "configuration loaded");
        Ok(config)
    }

    /// Overlay `SEVGATE_*` variables read through `lookup`
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, SevgateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SEVGATE_BLOCKING_MODE") {
            self.mode = v.parse()?;
        }
        if let Some(v) = lookup("SEVGATE_GATE_SCOPE") {
            self.scope = v.parse()?;
        }
        if let Some(v) = lookup("SEVGATE_TECH_DEBT_MAX_HOURS") {
            self.tech_debt_max_hours = parse_number("SEVGATE_TECH_DEBT_MAX_HOURS", &v)?;
        }
        if let Some(v) = lookup("SEVGATE_MAINTAINABILITY_MIN") {
            self.maintainability_min = parse_number("SEVGATE_MAINTAINABILITY_MIN", &v)?;
        }
        if let Some(v) = lookup("SEVGATE_GATE_VALIDITY_MS") {
            self.gate_validity_ms = parse_number("SEVGATE_GATE_VALIDITY_MS", &v)?;
        }
        if let Some(v) = lookup("SEVGATE_HISTORY_DIR") {
            self.history_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SEVGATE_VIOLATIONS_PATH") {
            self.violations_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SEVGATE_REPO_ROOT") {
            self.repo_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("SEVGATE_TOKEN_MAX") {
            self.token_max = parse_number("SEVGATE_TOKEN_MAX", &v)?;
        }
        if let Some(v) = lookup("SEVGATE_GIT_TIMEOUT_MS") {
            self.git_timeout_ms = parse_number("SEVGATE_GIT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("SEVGATE_VCS_CONCURRENCY") {
            self.vcs_concurrency = parse_number("SEVGATE_VCS_CONCURRENCY", &v)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), SevgateError> {
        if self.history_dir.as_os_str().is_empty() {
            return Err(SevgateError::config("history_dir must not be empty"));
        }
        if self.gate_validity_ms == 0 {
            return Err(SevgateError::config("gate_validity_ms must be positive"));
        }
        if !self.tech_debt_max_hours.is_finite() || self.tech_debt_max_hours <= 0.0 {
            return Err(SevgateError::config("tech_debt_max_hours must be positive"));
        }
        if !(0.0..=100.0).contains(&self.maintainability_min) {
            return Err(SevgateError::config(
                "maintainability_min must be between 0 and 100",
            ));
        }
        if self.token_max == 0 {
            return Err(SevgateError::config("token_max must be positive"));
        }
        if self.git_timeout_ms == 0 {
            return Err(SevgateError::config("git_timeout_ms must be positive"));
        }
        if self.vcs_concurrency == 0 {
            return Err(SevgateError::config("vcs_concurrency must be at least 1"));
        }
        Ok(())
    }

    pub fn gate_validity(&self) -> Duration {
        Duration::from_millis(self.gate_validity_ms)
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_millis(self.git_timeout_ms)
    }

    pub fn severity_history_path(&self) -> PathBuf {
        self.history_dir.join("severity-history.jsonl")
    }

    pub fn token_usage_path(&self) -> PathBuf {
        self.history_dir.join("token-usage.jsonl")
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, SevgateError> {
    raw.trim()
        .parse()
        .map_err(|_| SevgateError::config(format!("{} is not a valid number: '{}'", key, raw)))
}
