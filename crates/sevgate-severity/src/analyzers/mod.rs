//! Impact analyzers
//!
//! Each analyzer maps a violation and its context to a 0..=100 score built
//! from named, individually capped sub-scores. Analyzers are pure.

mod maintainability;
mod performance;
mod security;
mod stability;

pub use maintainability::MaintainabilityAnalyzer;
pub use performance::{estimate_blocking_ms, PerformanceAnalyzer};
pub use security::SecurityAnalyzer;
pub use stability::StabilityAnalyzer;

use serde::Serialize;
use sevgate_core::{DecisionContext, ImpactBreakdown, Violation};

/// One named contribution to an analyzer's score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubScore {
    pub name: &'static str,
    pub score: u32,
    pub budget: u32,
}

impl SubScore {
    pub fn new(name: &'static str, raw: u32, budget: u32) -> Self {
        Self {
            name,
            score: raw.min(budget),
            budget,
        }
    }
}

/// Sub-scores of one analyzer and their clamped total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactAssessment {
    pub total: u32,
    pub factors: Vec<SubScore>,
}

impl ImpactAssessment {
    pub fn new(factors: Vec<SubScore>) -> Self {
        let total = factors.iter().map(|f| f.score).sum::<u32>().min(100);
        Self { total, factors }
    }

    pub fn factor(&self, name: &str) -> Option<u32> {
        self.factors.iter().find(|f| f.name == name).map(|f| f.score)
    }
}

pub trait ImpactAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn assess(&self, violation: &Violation, context: &DecisionContext) -> ImpactAssessment;

    fn analyze(&self, violation: &Violation, context: &DecisionContext) -> u32 {
        self.assess(violation, context).total
    }
}

/// Runs all four analyzers
pub fn analyze_all(violation: &Violation, context: &DecisionContext) -> ImpactBreakdown {
    ImpactBreakdown {
        security: SecurityAnalyzer.analyze(violation, context),
        performance: PerformanceAnalyzer.analyze(violation, context),
        stability: StabilityAnalyzer.analyze(violation, context),
        maintainability: MaintainabilityAnalyzer.analyze(violation, context),
    }
}

/// Case-insensitive view of a rule id for family matching.
///
/// `has` is a substring test, `mentions` matches a whole segment where
/// segments are split on `.`, `_` and `-`.
pub(crate) struct RuleId {
    lower: String,
}

impl RuleId {
    pub(crate) fn new(rule_id: &str) -> Self {
        Self {
            lower: rule_id.to_ascii_lowercase(),
        }
    }

    pub(crate) fn has(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    pub(crate) fn mentions(&self, word: &str) -> bool {
        self.lower
            .split(|c: char| c == '.' || c == '_' || c == '-')
            .any(|segment| segment == word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_score_is_capped() {
        let s = SubScore::new("x", 70, 40);
        assert_eq!(s.score, 40);
    }

    #[test]
    fn test_assessment_total_is_clamped() {
        let a = ImpactAssessment::new(vec![
            SubScore::new("a", 50, 50),
            SubScore::new("b", 40, 40),
            SubScore::new("c", 30, 30),
        ]);
        assert_eq!(a.total, 100);
        assert_eq!(a.factor("b"), Some(40));
        assert_eq!(a.factor("zzz"), None);
    }

    #[test]
    fn test_rule_id_matching() {
        let id = RuleId::new("iOS.Memory.Retain_Cycle");
        assert!(id.has("retain_cycle"));
        assert!(id.mentions("memory"));
        assert!(!id.mentions("memo"));
        assert!(!RuleId::new("stack_trace.exposed").mentions("race"));
    }

    #[test]
    fn test_unrelated_rule_scores_zero_everywhere() {
        let v = Violation::new("style.trailing_whitespace", "src/a.ts", "trailing space");
        let b = analyze_all(&v, &DecisionContext::default());
        assert_eq!(b, ImpactBreakdown::default());
    }
}
