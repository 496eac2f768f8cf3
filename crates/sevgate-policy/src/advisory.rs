//! Advisory health metrics
//!
//! Technical debt hours and the maintainability index are reported alongside
//! an ALLOW decision. They never block on their own.

use serde::{Deserialize, Serialize};
use sevgate_core::{Severity, SeverityCounts};

pub fn technical_debt_hours(counts: &SeverityCounts) -> f64 {
    Severity::ALL
        .iter()
        .map(|s| counts.get(*s) as f64 * s.debt_hours())
        .sum()
}

/// 100 − 5·CRITICAL − 2·HIGH − MEDIUM − 0.5·LOW, clamped to 0..=100
pub fn maintainability_index(counts: &SeverityCounts) -> f64 {
    let penalty = 5.0 * counts.critical as f64
        + 2.0 * counts.high as f64
        + counts.medium as f64
        + 0.5 * counts.low as f64;
    (100.0 - penalty).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvisoryStatus {
    Ok,
    Warn,
}

/// One advisory line attached to a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub name: String,
    pub status: AdvisoryStatus,
    pub message: String,
}

impl Advisory {
    pub fn ok(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: AdvisoryStatus::Ok,
            message: message.into(),
        }
    }

    pub fn warn(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: AdvisoryStatus::Warn,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalDebt {
    pub hours: f64,
    pub max_hours: f64,
    pub exceeded: bool,
}

impl TechnicalDebt {
    pub fn assess(counts: &SeverityCounts, max_hours: f64) -> Self {
        let hours = technical_debt_hours(counts);
        Self {
            hours,
            max_hours,
            exceeded: hours > max_hours,
        }
    }

    pub fn advisory(&self) -> Advisory {
        if self.exceeded {
            Advisory::warn(
                "technical_debt",
                format!(
                    "Technical debt {:.1}h exceeds ceiling of {:.1}h",
                    self.hours, self.max_hours
                ),
            )
        } else {
            Advisory::ok(
                "technical_debt",
                format!("Technical debt {:.1}h of {:.1}h", self.hours, self.max_hours),
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Maintainability {
    pub index: f64,
    pub minimum: f64,
    pub passed: bool,
}

impl Maintainability {
    pub fn assess(counts: &SeverityCounts, minimum: f64) -> Self {
        let index = maintainability_index(counts);
        Self {
            index,
            minimum,
            passed: index >= minimum,
        }
    }

    pub fn advisory(&self) -> Advisory {
        if self.passed {
            Advisory::ok(
                "maintainability",
                format!("Maintainability {:.1}/100", self.index),
            )
        } else {
            Advisory::warn(
                "maintainability",
                format!(
                    "Maintainability {:.1}/100 below minimum {:.1}",
                    self.index, self.minimum
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(c: usize, h: usize, m: usize, l: usize) -> SeverityCounts {
        SeverityCounts {
            critical: c,
            high: h,
            medium: m,
            low: l,
        }
    }

    #[test]
    fn test_debt_hours() {
        assert_eq!(technical_debt_hours(&counts(1, 1, 1, 1)), 7.5);
        assert_eq!(technical_debt_hours(&counts(0, 0, 0, 0)), 0.0);
    }

    #[test]
    fn test_maintainability_index() {
        assert_eq!(maintainability_index(&counts(0, 0, 15, 0)), 85.0);
        assert_eq!(maintainability_index(&counts(1, 2, 3, 4)), 86.0);
        assert_eq!(maintainability_index(&counts(30, 0, 0, 0)), 0.0);
    }

    #[test]
    fn test_ceilings() {
        let debt = TechnicalDebt::assess(&counts(0, 0, 120, 0), 100.0);
        assert!(debt.exceeded);
        assert_eq!(debt.advisory().status, AdvisoryStatus::Warn);

        let m = Maintainability::assess(&counts(0, 0, 50, 0), 60.0);
        assert!(!m.passed);
        assert!(m.advisory().message.contains("below minimum 60.0"));

        let m = Maintainability::assess(&counts(0, 0, 0, 2), 60.0);
        assert!(m.passed);
        assert_eq!(m.advisory().message, "Maintainability 99.0/100");
    }
}
