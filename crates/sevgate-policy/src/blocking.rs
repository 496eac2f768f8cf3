//! Blocking policy
//!
//! Turns evaluated violations into a block/allow [`GateDecision`]. Only tiers
//! decide; debt hours and maintainability ride along as advisories.

use crate::advisory::{Maintainability, TechnicalDebt};
use crate::decision::GateDecision;
use sevgate_core::{BlockingMode, EvaluatedViolation, GateConfig, Severity, SeverityCounts};

/// Rule ids listed in a block reason
pub const MAX_LISTED_RULES: usize = 10;

/// Whether `path` contains one of the non-empty `files`
pub fn in_scope(path: &str, files: &[String]) -> bool {
    files
        .iter()
        .any(|file| !file.is_empty() && path.contains(file.as_str()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockingPolicy {
    mode: BlockingMode,
    tech_debt_max_hours: f64,
    maintainability_min: f64,
}

impl Default for BlockingPolicy {
    fn default() -> Self {
        Self::new(BlockingMode::Normal)
    }
}

impl BlockingPolicy {
    pub fn new(mode: BlockingMode) -> Self {
        Self {
            mode,
            tech_debt_max_hours: 100.0,
            maintainability_min: 60.0,
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.mode)
            .with_tech_debt_max_hours(config.tech_debt_max_hours)
            .with_maintainability_min(config.maintainability_min)
    }

    pub fn with_tech_debt_max_hours(mut self, hours: f64) -> Self {
        self.tech_debt_max_hours = hours;
        self
    }

    pub fn with_maintainability_min(mut self, minimum: f64) -> Self {
        self.maintainability_min = minimum;
        self
    }

    pub fn mode(&self) -> BlockingMode {
        self.mode
    }

    pub fn decide(&self, evaluated: &[EvaluatedViolation]) -> GateDecision {
        let decision = self.decide_scoped(evaluated.iter());
        tracing::info!(
            mode = %self.mode,
            blocked = decision.should_block,
            total = decision.violation_counts.total(),
            "gate decision"
        );
        decision
    }

    /// Same rules, restricted to violations whose path contains one of `files`
    pub fn decide_for_files(
        &self,
        evaluated: &[EvaluatedViolation],
        files: &[String],
    ) -> GateDecision {
        let scoped = evaluated.iter().filter(|ev| in_scope(ev.file_path(), files));
        let decision = self.decide_scoped(scoped);
        tracing::info!(
            mode = %self.mode,
            files = files.len(),
            blocked = decision.should_block,
            total = decision.violation_counts.total(),
            "scoped gate decision"
        );
        decision
    }

    fn decide_scoped<'a>(
        &self,
        evaluated: impl Iterator<Item = &'a EvaluatedViolation>,
    ) -> GateDecision {
        let evaluated: Vec<&EvaluatedViolation> = evaluated.collect();
        let counts = SeverityCounts::from_severities(evaluated.iter().map(|ev| ev.severity()));

        if counts.total() == 0 {
            return self.allowed(GateDecision::allow(self.mode, "No violations found", counts));
        }

        match self.mode {
            BlockingMode::Normal | BlockingMode::CriticalHighOnly if counts.blocking() > 0 => {
                let rules = offending_rules(&evaluated, Severity::is_blocking);
                let reason = format!(
                    "{} blocking violation(s): {} [{}]",
                    counts.blocking(),
                    counts.describe(),
                    rules.join(", ")
                );
                GateDecision::block(self.mode, reason, counts, rules)
            }
            BlockingMode::Strict => {
                let rules = offending_rules(&evaluated, |_| true);
                let reason = format!(
                    "Strict mode: {} violation(s) found ({}) [{}]",
                    counts.total(),
                    counts.describe(),
                    rules.join(", ")
                );
                GateDecision::block(self.mode, reason, counts, rules)
            }
            BlockingMode::CriticalHighOnly => {
                let deferred = counts.medium + counts.low;
                let reason = format!(
                    "No CRITICAL or HIGH violations; {} deferred as technical debt ({})",
                    deferred,
                    counts.describe()
                );
                self.allowed(GateDecision::allow(self.mode, reason, counts))
                    .with_deferred(deferred)
            }
            BlockingMode::Normal => {
                let reason = format!("No blocking violations ({})", counts.describe());
                self.allowed(GateDecision::allow(self.mode, reason, counts))
            }
        }
    }

    fn allowed(&self, decision: GateDecision) -> GateDecision {
        let counts = decision.violation_counts;
        decision.with_health(
            TechnicalDebt::assess(&counts, self.tech_debt_max_hours),
            Maintainability::assess(&counts, self.maintainability_min),
        )
    }
}

/// Distinct rule ids of the matching violations, most severe first
fn offending_rules(
    evaluated: &[&EvaluatedViolation],
    matches: impl Fn(&Severity) -> bool,
) -> Vec<String> {
    let mut offending: Vec<&&EvaluatedViolation> = evaluated
        .iter()
        .filter(|ev| matches(&ev.severity()))
        .collect();
    offending.sort_by(|a, b| b.severity().cmp(&a.severity()));

    let mut rules: Vec<String> = Vec::new();
    for ev in offending {
        if rules.len() == MAX_LISTED_RULES {
            break;
        }
        if !rules.iter().any(|r| r == ev.rule_id()) {
            rules.push(ev.rule_id().to_string());
        }
    }
    rules
}
