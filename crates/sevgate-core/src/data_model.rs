//! Data model: violations, severity tiers and evaluations

use crate::context::ContextSnapshot;
use crate::error::SevgateError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity tier, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[serde(alias = "low", alias = "Low", alias = "info", alias = "INFO")]
    Low,
    #[serde(alias = "medium", alias = "Medium")]
    Medium,
    #[serde(alias = "high", alias = "High")]
    High,
    #[serde(alias = "critical", alias = "Critical")]
    Critical,
}

impl Severity {
    /// Most severe first
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Map a final score to its tier: ≥85, ≥65, ≥40, below.
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Severity::Critical
        } else if score >= 65.0 {
            Severity::High
        } else if score >= 40.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Tiers that stop a commit in normal mode
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    /// Estimated remediation effort in hours
    pub fn debt_hours(&self) -> f64 {
        match self {
            Severity::Critical => 4.0,
            Severity::High => 2.0,
            Severity::Medium => 1.0,
            Severity::Low => 0.5,
        }
    }

    /// What the developer is expected to do about a finding of this tier
    pub fn action(&self) -> &'static str {
        match self {
            Severity::Critical => "Fix IMMEDIATELY (blocks commit)",
            Severity::High => "Fix in this PR (blocks merge to main)",
            Severity::Medium => "Create tech debt issue for next sprint",
            Severity::Low => "Consider fixing when touching this code",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

impl FromStr for Severity {
    type Err = SevgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Severity::Critical),
            "HIGH" => Ok(Severity::High),
            "MEDIUM" => Ok(Severity::Medium),
            "LOW" | "INFO" => Ok(Severity::Low),
            other => Err(SevgateError::intake(format!("unknown severity '{}'", other))),
        }
    }
}

/// Per-tier counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    #[serde(rename = "CRITICAL")]
    pub critical: usize,
    #[serde(rename = "HIGH")]
    pub high: usize,
    #[serde(rename = "MEDIUM")]
    pub medium: usize,
    #[serde(rename = "LOW")]
    pub low: usize,
}

impl SeverityCounts {
    pub fn from_severities(severities: impl IntoIterator<Item = Severity>) -> Self {
        let mut counts = Self::default();
        for severity in severities {
            counts.add(severity);
        }
        counts
    }

    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }

    /// CRITICAL + HIGH
    pub fn blocking(&self) -> usize {
        self.critical + self.high
    }

    /// Highest tier with a non-zero count
    pub fn highest(&self) -> Option<Severity> {
        Severity::ALL.into_iter().find(|s| self.get(*s) > 0)
    }

    /// "2 CRITICAL, 1 HIGH" style listing of the non-zero tiers
    pub fn describe(&self) -> String {
        Severity::ALL
            .iter()
            .filter(|s| self.get(**s) > 0)
            .map(|s| format!("{} {}", self.get(*s), s))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Platform derived from the first segment of a rule id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Backend,
    Frontend,
    Other,
}

impl Platform {
    pub fn from_rule_id(rule_id: &str) -> Self {
        let head = rule_id.split('.').next().unwrap_or_default();
        match head.to_ascii_lowercase().as_str() {
            "ios" | "swift" => Platform::Ios,
            "android" | "kotlin" => Platform::Android,
            "backend" => Platform::Backend,
            "frontend" => Platform::Frontend,
            _ => Platform::Other,
        }
    }
}

/// Numeric measurements a scanner may attach to a finding.
///
/// Absent fields read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViolationMetrics {
    #[serde(alias = "complexity")]
    pub cyclomatic_complexity: f64,
    pub method_count: f64,
    pub duplicate_count: f64,
    pub nested_loops: f64,
    #[serde(alias = "depth")]
    pub prop_drilling_depth: f64,
    #[serde(alias = "arraySize")]
    pub data_size: f64,
    pub list_size: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responsibilities: Vec<String>,
}

impl ViolationMetrics {
    /// Reject negative or non-finite measurements
    pub fn validate(&self) -> Result<(), SevgateError> {
        let fields = [
            ("cyclomaticComplexity", self.cyclomatic_complexity),
            ("methodCount", self.method_count),
            ("duplicateCount", self.duplicate_count),
            ("nestedLoops", self.nested_loops),
            ("propDrillingDepth", self.prop_drilling_depth),
            ("dataSize", self.data_size),
            ("listSize", self.list_size),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(SevgateError::Metric(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_hint() -> Severity {
    Severity::Medium
}

/// A single static-analysis finding as reported by a scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Dotted rule namespace, e.g. `ios.solid.dip.concrete_dependency`
    pub rule_id: String,

    /// Scanner's own severity guess, used when evaluation falls back
    #[serde(alias = "severity", default = "default_hint")]
    pub severity_hint: Severity,

    #[serde(alias = "file", default)]
    pub file_path: String,

    #[serde(default)]
    pub line: u32,

    #[serde(default)]
    pub column: u32,

    #[serde(default)]
    pub message: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: ViolationMetrics,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concrete_dependency: Option<String>,
}

impl Violation {
    pub fn new(
        rule_id: impl Into<String>,
        file_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity_hint: Severity::Medium,
            file_path: file_path.into(),
            line: 0,
            column: 0,
            message: message.into(),
            metrics: ViolationMetrics::default(),
            class_name: None,
            concrete_dependency: None,
        }
    }

    pub fn with_severity_hint(mut self, severity: Severity) -> Self {
        self.severity_hint = severity;
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_metrics(mut self, metrics: ViolationMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_concrete_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.concrete_dependency = Some(dependency.into());
        self
    }

    pub fn platform(&self) -> Platform {
        Platform::from_rule_id(&self.rule_id)
    }
}

/// Raw analyzer scores, each 0..=100
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactBreakdown {
    pub security: u32,
    pub performance: u32,
    pub stability: u32,
    pub maintainability: u32,
}

/// Whether an evaluation was computed or fell back to the scanner's hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationOrigin {
    Computed,
    Fallback { error: String },
}

/// Risk-weighted verdict for a single violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub severity: Severity,
    /// Final score after context multipliers, 0..=100
    pub score: f64,
    /// Weighted sum before context multipliers
    pub base_score: f64,
    pub breakdown: ImpactBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextSnapshot>,
    pub recommendation: String,
    pub origin: EvaluationOrigin,
}

impl Evaluation {
    /// Evaluation used when context derivation or scoring failed
    pub fn fallback(violation: &Violation, error: impl Into<String>) -> Self {
        Self {
            severity: violation.severity_hint,
            score: 50.0,
            base_score: 50.0,
            breakdown: ImpactBreakdown::default(),
            context: None,
            recommendation: violation.message.clone(),
            origin: EvaluationOrigin::Fallback {
                error: error.into(),
            },
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.origin, EvaluationOrigin::Computed)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.origin {
            EvaluationOrigin::Fallback { error } => Some(error),
            EvaluationOrigin::Computed => None,
        }
    }
}

/// A violation together with its evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedViolation {
    pub violation: Violation,
    pub evaluation: Evaluation,
}

impl EvaluatedViolation {
    pub fn new(violation: Violation, evaluation: Evaluation) -> Self {
        Self {
            violation,
            evaluation,
        }
    }

    pub fn severity(&self) -> Severity {
        self.evaluation.severity
    }

    pub fn score(&self) -> f64 {
        self.evaluation.score
    }

    pub fn file_path(&self) -> &str {
        &self.violation.file_path
    }

    pub fn rule_id(&self) -> &str {
        &self.violation.rule_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Severity::from_score(85.0), Severity::Critical);
        assert_eq!(Severity::from_score(84.9999), Severity::High);
        assert_eq!(Severity::from_score(65.0), Severity::High);
        assert_eq!(Severity::from_score(64.9999), Severity::Medium);
        assert_eq!(Severity::from_score(40.0), Severity::Medium);
        assert_eq!(Severity::from_score(39.9999), Severity::Low);
        assert_eq!(Severity::from_score(0.0), Severity::Low);
    }

    #[test]
    fn test_severity_parsing_is_case_insensitive() {
        assert_eq!("medium".parse::<Severity>().unwrap(), Severity::Medium);
        assert_eq!("Critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("info".parse::<Severity>().unwrap(), Severity::Low);
        assert!("urgent".parse::<Severity>().is_err());
    }

    #[test]
    fn test_violation_from_scanner_json() {
        let json = r#"{
            "ruleId": "security.hardcoded_secret",
            "severity": "medium",
            "filePath": "/src/infra/config.go",
            "line": 12,
            "message": "password: \"abc123\"",
            "metrics": null
        }"#;
        let v: Violation = serde_json::from_str(json).unwrap();
        assert_eq!(v.severity_hint, Severity::Medium);
        assert_eq!(v.column, 0);
        assert_eq!(v.metrics, ViolationMetrics::default());
    }

    #[test]
    fn test_metrics_validation() {
        let ok = ViolationMetrics {
            cyclomatic_complexity: 12.0,
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad = ViolationMetrics {
            method_count: -3.0,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(SevgateError::Metric(_))));
    }

    #[test]
    fn test_counts() {
        let counts = SeverityCounts::from_severities([
            Severity::Critical,
            Severity::High,
            Severity::High,
            Severity::Low,
        ]);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.blocking(), 3);
        assert_eq!(counts.highest(), Some(Severity::Critical));
        assert_eq!(counts.describe(), "1 CRITICAL, 2 HIGH, 1 LOW");

        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(json["HIGH"], 2);
    }

    #[test]
    fn test_platform_from_rule_id() {
        assert_eq!(Platform::from_rule_id("ios.solid.dip"), Platform::Ios);
        assert_eq!(Platform::from_rule_id("backend.sql.raw"), Platform::Backend);
        assert_eq!(Platform::from_rule_id("security.xss"), Platform::Other);
    }

    #[test]
    fn test_fallback_evaluation() {
        let v = Violation::new("x.y", "a.ts", "boom").with_severity_hint(Severity::High);
        let eval = Evaluation::fallback(&v, "bad metric");
        assert_eq!(eval.severity, Severity::High);
        assert_eq!(eval.score, 50.0);
        assert!(!eval.is_computed());
        assert_eq!(eval.error(), Some("bad metric"));
    }
}
