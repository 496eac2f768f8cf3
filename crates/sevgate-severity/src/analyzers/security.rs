//! Security impact: exposure, injection, auth and transport risk

use super::{ImpactAnalyzer, ImpactAssessment, RuleId, SubScore};
use sevgate_core::{DecisionContext, Violation};

pub struct SecurityAnalyzer;

fn data_exposure(rule: &RuleId, ctx: &DecisionContext) -> u32 {
    if rule.has("hardcoded_secret") || (rule.mentions("hardcoded") && rule.has("secret")) {
        if ctx.is_production_code {
            40
        } else {
            25
        }
    } else if rule.has("userdefaults_sensitive")
        || rule.has("sensitive_storage")
        || rule.has("insecure_storage")
    {
        35
    } else if rule.has("console_log") || rule.has("sensitive_log") || rule.has("log_sensitive") {
        if ctx.handles_pii || ctx.handles_credentials {
            30
        } else {
            5
        }
    } else if rule.mentions("xss") {
        30
    } else {
        0
    }
}

fn injection(rule: &RuleId, ctx: &DecisionContext) -> u32 {
    if rule.mentions("sql") {
        30
    } else if rule.mentions("xss") {
        if ctx.user_generated_content {
            25
        } else {
            15
        }
    } else if rule.mentions("eval") {
        25
    } else {
        0
    }
}

fn authentication(rule: &RuleId, ctx: &DecisionContext) -> u32 {
    if rule.has("missing_auth") {
        if ctx.handles_payments {
            20
        } else if ctx.handles_pii {
            18
        } else {
            15
        }
    } else if rule.mentions("weak") && rule.mentions("auth") {
        15
    } else {
        0
    }
}

fn network(rule: &RuleId, ctx: &DecisionContext) -> u32 {
    if rule.has("http_url") || rule.has("insecure_http") {
        if ctx.handles_credentials || ctx.handles_payments {
            10
        } else {
            5
        }
    } else if rule.has("ssl_pinning") {
        if ctx.is_production_api() {
            8
        } else {
            3
        }
    } else if rule.has("missing_csp") {
        6
    } else {
        0
    }
}

impl ImpactAnalyzer for SecurityAnalyzer {
    fn name(&self) -> &'static str {
        "security"
    }

    fn assess(&self, violation: &Violation, context: &DecisionContext) -> ImpactAssessment {
        let rule = RuleId::new(&violation.rule_id);
        ImpactAssessment::new(vec![
            SubScore::new("dataExposure", data_exposure(&rule, context), 40),
            SubScore::new("injection", injection(&rule, context), 30),
            SubScore::new("authentication", authentication(&rule, context), 20),
            SubScore::new("network", network(&rule, context), 10),
        ])
    }
}
