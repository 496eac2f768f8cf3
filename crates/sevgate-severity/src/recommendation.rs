//! Human-readable recommendations
//!
//! A recommendation is the tier, an explanation of why the context makes the
//! finding matter, the action the tier demands, and a fix template chosen by
//! rule family.

use once_cell::sync::Lazy;
use sevgate_core::{DecisionContext, Severity, Violation};
use std::collections::HashMap;

/// Architectural rule families with dedicated fix templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleFamily {
    Srp,
    Ocp,
    Lsp,
    Isp,
    Dip,
    CleanArchitecture,
    Cqrs,
}

static RULE_FAMILIES: Lazy<HashMap<&'static str, RuleFamily>> = Lazy::new(|| {
    HashMap::from([
        ("solid.srp", RuleFamily::Srp),
        ("solid.ocp", RuleFamily::Ocp),
        ("solid.lsp", RuleFamily::Lsp),
        ("solid.isp", RuleFamily::Isp),
        ("solid.dip", RuleFamily::Dip),
        ("clean_arch", RuleFamily::CleanArchitecture),
        ("clean_architecture", RuleFamily::CleanArchitecture),
        ("cqrs", RuleFamily::Cqrs),
    ])
});

impl RuleFamily {
    /// Look up the family by the rule id's dotted segments.
    ///
    /// `ios.solid.srp.massive_class` matches on the `solid.srp` pair,
    /// `backend.clean_arch.domain_imports_infra` on the `clean_arch` segment.
    pub fn from_rule_id(rule_id: &str) -> Option<Self> {
        let lower = rule_id.to_ascii_lowercase();
        let segments: Vec<&str> = lower.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            if let Some(next) = segments.get(i + 1) {
                let pair = format!("{}.{}", segment, next);
                if let Some(family) = RULE_FAMILIES.get(pair.as_str()) {
                    return Some(*family);
                }
            }
            if let Some(family) = RULE_FAMILIES.get(*segment) {
                return Some(*family);
            }
        }
        None
    }

    pub fn fix_template(&self, violation: &Violation) -> String {
        let class = violation.class_name.as_deref().unwrap_or("this type");
        match self {
            RuleFamily::Srp => {
                let responsibilities = &violation.metrics.responsibilities;
                if responsibilities.is_empty() {
                    return "Extract responsibilities into separate classes (SRP)".to_string();
                }
                let extracted: Vec<String> = responsibilities
                    .iter()
                    .map(|r| format!("- {}Service: {}", capitalize(r), r))
                    .collect();
                format!(
                    "Split {} into focused types (SRP):\n{}\n{} keeps only coordination",
                    class,
                    extracted.join("\n"),
                    class
                )
            }
            RuleFamily::Ocp => format!(
                "Replace the type switch in {} with a protocol and one conformance per case (OCP)",
                class
            ),
            RuleFamily::Lsp => format!(
                "Make {} honor the base contract: accept at least what the parent accepts and never throw where it doesn't (LSP)",
                class
            ),
            RuleFamily::Isp => {
                "Split the interface into role-specific protocols so clients depend only on the methods they call (ISP)".to_string()
            }
            RuleFamily::Dip => match &violation.concrete_dependency {
                Some(dependency) => format!(
                    "Define a protocol for {dep} and inject it into {class} instead of constructing {dep} directly (DIP)",
                    dep = dependency,
                    class = class
                ),
                None => "Inject protocol abstraction instead of concrete type (DIP)".to_string(),
            },
            RuleFamily::CleanArchitecture => {
                "Move the dependency behind a port declared in the domain layer and implement it in infrastructure (Clean Architecture)".to_string()
            }
            RuleFamily::Cqrs => {
                "Split into a Command that changes state and returns nothing, and a Query that returns data without side effects (CQRS)".to_string()
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Why this context makes the finding matter, one line per factor
pub fn explain_impact(ctx: &DecisionContext) -> String {
    let mut impacts = Vec::new();
    if ctx.is_critical_path {
        impacts.push("Affects critical user flow (checkout, payment, signup)".to_string());
    }
    if ctx.dependency_count > 10 {
        impacts.push(format!(
            "{} modules depend on this (ripple effect)",
            ctx.dependency_count
        ));
    }
    if ctx.call_frequency > 1000 {
        impacts.push(format!(
            "Executed {} times/day (high frequency)",
            ctx.call_frequency
        ));
    }
    if ctx.is_main_thread {
        impacts.push("Runs on UI thread (can freeze app)".to_string());
    }
    if ctx.handles_payments {
        impacts.push("PAYMENT PROCESSING - highest priority".to_string());
    }
    if ctx.handles_pii {
        impacts.push("Handles personal data (GDPR compliance)".to_string());
    }
    if impacts.is_empty() {
        "Standard code quality issue".to_string()
    } else {
        impacts.join("\n- ")
    }
}

/// Family template when the rule belongs to one, else the scanner's message
pub fn suggest_fix(violation: &Violation) -> String {
    match RuleFamily::from_rule_id(&violation.rule_id) {
        Some(family) => family.fix_template(violation),
        None => violation.message.clone(),
    }
}

pub fn recommend(violation: &Violation, severity: Severity, ctx: &DecisionContext) -> String {
    format!(
        "{}: {}\n\nImpact: {}\nAction Required: {}\n\nSuggested Fix:\n{}",
        severity,
        violation.message,
        explain_impact(ctx),
        severity.action(),
        suggest_fix(violation)
    )
}
