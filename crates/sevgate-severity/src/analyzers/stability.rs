//! Stability impact: crashes, data corruption, undefined behavior

use super::{ImpactAnalyzer, ImpactAssessment, RuleId, SubScore};
use sevgate_core::{DecisionContext, Violation};

pub struct StabilityAnalyzer;

fn crash(rule: &RuleId, violation: &Violation, ctx: &DecisionContext) -> u32 {
    if rule.has("force_unwrap") || rule.has("null_assertion") || rule.has("force_cast") {
        if ctx.value_can_be_nil {
            50
        } else {
            30
        }
    } else if rule.has("empty_catch") {
        if ctx.is_critical_path {
            45
        } else {
            25
        }
    } else if rule.has("force_try") {
        40
    } else if rule.mentions("index") && rule.mentions("bounds") {
        35
    } else if violation.message.to_lowercase().contains("division by zero") {
        35
    } else {
        0
    }
}

fn corruption(rule: &RuleId, ctx: &DecisionContext) -> u32 {
    if rule.mentions("race") {
        if ctx.is_shared_state {
            30
        } else {
            15
        }
    } else if rule.mentions("transaction") {
        if ctx.is_multi_step_operation {
            25
        } else {
            0
        }
    } else if rule.mentions("invariant") {
        20
    } else if rule.has("direct_mutation") {
        if ctx.is_shared_state {
            25
        } else {
            0
        }
    } else {
        0
    }
}

fn undefined_behavior(rule: &RuleId) -> u32 {
    if rule.mentions("lsp") {
        20
    } else if rule.mentions("undefined") {
        18
    } else if rule.has("untyped_catch") {
        15
    } else {
        0
    }
}

impl ImpactAnalyzer for StabilityAnalyzer {
    fn name(&self) -> &'static str {
        "stability"
    }

    fn assess(&self, violation: &Violation, context: &DecisionContext) -> ImpactAssessment {
        let rule = RuleId::new(&violation.rule_id);
        ImpactAssessment::new(vec![
            SubScore::new("crash", crash(&rule, violation, context), 50),
            SubScore::new("dataCorruption", corruption(&rule, context), 30),
            SubScore::new("undefinedBehavior", undefined_behavior(&rule), 20),
        ])
    }
}
