//! Maintainability impact: coupling, complexity, duplication, testability

use super::{ImpactAnalyzer, ImpactAssessment, RuleId, SubScore};
use sevgate_core::{DecisionContext, Violation};

pub struct MaintainabilityAnalyzer;

fn coupling(rule: &RuleId, violation: &Violation, ctx: &DecisionContext) -> u32 {
    if rule.mentions("dip") {
        if ctx.dependency_count > 10 {
            30
        } else {
            20
        }
    } else if rule.mentions("isp") {
        15
    } else if rule.has("prop_drilling") {
        if violation.metrics.prop_drilling_depth > 5.0 {
            25
        } else {
            10
        }
    } else {
        0
    }
}

fn complexity(rule: &RuleId, violation: &Violation) -> u32 {
    let metrics = &violation.metrics;
    let cyclomatic = if metrics.cyclomatic_complexity > 20.0 {
        30
    } else if metrics.cyclomatic_complexity > 15.0 {
        20
    } else if metrics.cyclomatic_complexity > 10.0 {
        10
    } else {
        0
    };

    let structural = if (rule.mentions("god") && rule.mentions("class"))
        || rule.has("god_class")
        || rule.has("massive_view_controller")
    {
        if metrics.method_count > 30.0 {
            30
        } else if metrics.method_count > 20.0 {
            20
        } else {
            15
        }
    } else if rule.mentions("nested") {
        25
    } else if rule.has("callback_hell") {
        20
    } else {
        0
    };

    cyclomatic.max(structural)
}

fn duplication(rule: &RuleId, violation: &Violation) -> u32 {
    if rule.has("duplicat") {
        (violation.metrics.duplicate_count * 5.0).min(20.0) as u32
    } else if rule.mentions("ocp") {
        15
    } else {
        0
    }
}

fn testability(rule: &RuleId, ctx: &DecisionContext) -> u32 {
    if rule.has("missing_test") {
        if ctx.is_critical_path {
            20
        } else if ctx.has_business_logic {
            15
        } else {
            5
        }
    } else if rule.mentions("dip") {
        15
    } else if rule.has("mock_in_production") {
        18
    } else {
        0
    }
}

impl ImpactAnalyzer for MaintainabilityAnalyzer {
    fn name(&self) -> &'static str {
        "maintainability"
    }

    fn assess(&self, violation: &Violation, context: &DecisionContext) -> ImpactAssessment {
        let rule = RuleId::new(&violation.rule_id);
        ImpactAssessment::new(vec![
            SubScore::new("coupling", coupling(&rule, violation, context), 30),
            SubScore::new("complexity", complexity(&rule, violation), 30),
            SubScore::new("duplication", duplication(&rule, violation), 20),
            SubScore::new("testability", testability(&rule, context), 20),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sevgate_core::ViolationMetrics;

    fn assess(v: Violation, ctx: &DecisionContext) -> ImpactAssessment {
        MaintainabilityAnalyzer.assess(&v, ctx)
    }

    fn with_metrics(rule_id: &str, metrics: ViolationMetrics) -> Violation {
        Violation::new(rule_id, "src/a.ts", "").with_metrics(metrics)
    }

    #[test]
    fn test_coupling() {
        let fan_in = DecisionContext {
            dependency_count: 11,
            ..Default::default()
        };
        let plain = DecisionContext::default();
        let dip = assess(Violation::new("dip.violation", "a.ts", ""), &fan_in);
        assert_eq!(dip.factor("coupling"), Some(30));
        assert_eq!(dip.factor("testability"), Some(15));
        assert_eq!(
            assess(Violation::new("dip.violation", "a.ts", ""), &plain).factor("coupling"),
            Some(20)
        );
        assert_eq!(
            assess(Violation::new("isp.violation", "a.ts", ""), &plain).factor("coupling"),
            Some(15)
        );

        let deep = with_metrics(
            "prop_drilling.violation",
            ViolationMetrics {
                prop_drilling_depth: 7.0,
                ..Default::default()
            },
        );
        assert_eq!(assess(deep, &plain).factor("coupling"), Some(25));
        let shallow = with_metrics(
            "prop_drilling.violation",
            ViolationMetrics {
                prop_drilling_depth: 3.0,
                ..Default::default()
            },
        );
        assert_eq!(assess(shallow, &plain).factor("coupling"), Some(10));
        assert_eq!(
            assess(Violation::new("unrelated.rule", "a.ts", ""), &plain).factor("coupling"),
            Some(0)
        );
    }

    #[test]
    fn test_complexity() {
        let plain = DecisionContext::default();
        let cc = |n: f64| {
            with_metrics(
                "test.rule",
                ViolationMetrics {
                    cyclomatic_complexity: n,
                    ..Default::default()
                },
            )
        };
        assert_eq!(assess(cc(25.0), &plain).factor("complexity"), Some(30));
        assert_eq!(assess(cc(18.0), &plain).factor("complexity"), Some(20));
        assert_eq!(assess(cc(12.0), &plain).factor("complexity"), Some(10));
        assert_eq!(assess(cc(10.0), &plain).factor("complexity"), Some(0));

        let god = |methods: f64| {
            with_metrics(
                "god.class.violation",
                ViolationMetrics {
                    method_count: methods,
                    ..Default::default()
                },
            )
        };
        assert_eq!(assess(god(35.0), &plain).factor("complexity"), Some(30));
        assert_eq!(assess(god(25.0), &plain).factor("complexity"), Some(20));
        assert_eq!(assess(god(5.0), &plain).factor("complexity"), Some(15));

        assert_eq!(
            assess(Violation::new("nested.code.violation", "a.ts", ""), &plain).factor("complexity"),
            Some(25)
        );
        assert_eq!(
            assess(Violation::new("frontend.callback_hell", "a.ts", ""), &plain)
                .factor("complexity"),
            Some(20)
        );
    }

    #[test]
    fn test_duplication() {
        let plain = DecisionContext::default();
        let dup = |count: f64| {
            with_metrics(
                "duplicate.code.violation",
                ViolationMetrics {
                    duplicate_count: count,
                    ..Default::default()
                },
            )
        };
        assert_eq!(assess(dup(2.0), &plain).factor("duplication"), Some(10));
        assert_eq!(assess(dup(10.0), &plain).factor("duplication"), Some(20));
        assert_eq!(
            assess(Violation::new("ocp.violation", "a.ts", ""), &plain).factor("duplication"),
            Some(15)
        );
    }

    #[test]
    fn test_testability() {
        let missing = || Violation::new("backend.missing_tests", "a.ts", "");
        let critical = DecisionContext {
            is_critical_path: true,
            ..Default::default()
        };
        let business = DecisionContext {
            has_business_logic: true,
            ..Default::default()
        };
        assert_eq!(assess(missing(), &critical).total, 20);
        assert_eq!(assess(missing(), &business).total, 15);
        assert_eq!(assess(missing(), &DecisionContext::default()).total, 5);
        assert_eq!(
            assess(
                Violation::new("backend.mock_in_production", "a.ts", ""),
                &DecisionContext::default()
            )
            .total,
            18
        );
    }
}
