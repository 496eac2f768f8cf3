//! Gate decision

use crate::advisory::{Advisory, Maintainability, TechnicalDebt};
use serde::{Deserialize, Serialize};
use sevgate_core::{BlockingMode, Severity, SeverityCounts};
use std::fmt::Write as _;

/// Outcome of one blocking-policy run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub should_block: bool,
    pub mode: BlockingMode,
    pub reason: String,
    pub violation_counts: SeverityCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<Severity>,
    /// Rule ids behind a block, at most ten
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocking_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_debt: Option<TechnicalDebt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainability: Option<Maintainability>,
    /// MEDIUM + LOW left for later in criticalHighOnly mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deferred_violations: Option<usize>,
    #[serde(default)]
    pub advisories: Vec<Advisory>,
}

impl GateDecision {
    pub fn allow(mode: BlockingMode, reason: impl Into<String>, counts: SeverityCounts) -> Self {
        Self {
            should_block: false,
            mode,
            reason: reason.into(),
            violation_counts: counts,
            blocked_by: None,
            blocking_rules: Vec::new(),
            technical_debt: None,
            maintainability: None,
            deferred_violations: None,
            advisories: Vec::new(),
        }
    }

    pub fn block(
        mode: BlockingMode,
        reason: impl Into<String>,
        counts: SeverityCounts,
        rules: Vec<String>,
    ) -> Self {
        Self {
            should_block: true,
            blocked_by: counts.highest(),
            blocking_rules: rules,
            ..Self::allow(mode, reason, counts)
        }
    }

    /// Attach the debt and maintainability advisories
    pub fn with_health(mut self, debt: TechnicalDebt, maintainability: Maintainability) -> Self {
        self.advisories.push(debt.advisory());
        self.advisories.push(maintainability.advisory());
        self.technical_debt = Some(debt);
        self.maintainability = Some(maintainability);
        self
    }

    pub fn with_deferred(mut self, deferred: usize) -> Self {
        self.deferred_violations = Some(deferred);
        self
    }

    pub fn is_allowed(&self) -> bool {
        !self.should_block
    }

    /// "ALLOWED" or "BLOCKED"
    pub fn status(&self) -> &'static str {
        if self.should_block {
            "BLOCKED"
        } else {
            "ALLOWED"
        }
    }

    /// Human-readable summary for commit hooks and the CLI
    pub fn format_message(&self) -> String {
        let mut out = String::new();
        let headline = if self.should_block {
            "COMMIT BLOCKED"
        } else {
            "COMMIT ALLOWED"
        };
        let _ = writeln!(out, "{} ({} mode)", headline, self.mode);
        let _ = writeln!(out, "Reason: {}", self.reason);

        if self.violation_counts.total() > 0 {
            let _ = writeln!(out);
            for severity in Severity::ALL {
                let _ = writeln!(out, "  {}: {}", severity, self.violation_counts.get(severity));
            }
        }

        if !self.blocking_rules.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Rules to fix:");
            for rule in &self.blocking_rules {
                let _ = writeln!(out, "  - {}", rule);
            }
        }

        if self.technical_debt.is_some() || self.maintainability.is_some() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Technical Debt Tracking");
            if let Some(debt) = &self.technical_debt {
                let _ = writeln!(
                    out,
                    "  Estimated effort: {:.1}h (ceiling {:.1}h){}",
                    debt.hours,
                    debt.max_hours,
                    if debt.exceeded { " EXCEEDED" } else { "" }
                );
            }
            if let Some(m) = &self.maintainability {
                let _ = writeln!(
                    out,
                    "  Maintainability: {:.1}/100 (minimum {:.1}){}",
                    m.index,
                    m.minimum,
                    if m.passed { "" } else { " BELOW MINIMUM" }
                );
            }
            if let Some(deferred) = self.deferred_violations {
                let _ = writeln!(out, "  Deferred violations: {}", deferred);
            }
        }

        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_sets_highest_tier() {
        let counts = SeverityCounts {
            high: 2,
            low: 1,
            ..Default::default()
        };
        let decision = GateDecision::block(BlockingMode::Normal, "2 HIGH", counts, vec![]);
        assert_eq!(decision.blocked_by, Some(Severity::High));
        assert_eq!(decision.status(), "BLOCKED");
    }

    #[test]
    fn test_serializes_camel_case() {
        let decision = GateDecision::allow(
            BlockingMode::CriticalHighOnly,
            "No violations found",
            SeverityCounts::default(),
        );
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["shouldBlock"], false);
        assert_eq!(json["mode"], "criticalHighOnly");
        assert_eq!(json["violationCounts"]["CRITICAL"], 0);
        assert!(json.get("blockedBy").is_none());

        let back: GateDecision = serde_json::from_value(json).unwrap();
        assert_eq!(back, decision);
    }
}
