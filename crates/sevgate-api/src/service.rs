//! Gate service
//!
//! Wires the pipeline end to end:
//! violations → evaluator → blocking policy → session gate → history.
//! Everything here is synchronous; the HTTP layer runs it on the blocking pool.

use crate::error::ServiceError;
use crate::metrics::GateMetrics;
use crate::source::{JsonFileSource, ViolationSource};
use serde::{Deserialize, Serialize};
use sevgate_core::{EvaluatedViolation, GateConfig, GateScope, Severity, Violation};
use sevgate_policy::{in_scope, BlockingPolicy, GateDecision};
use sevgate_session::{
    EnforcementStatus, GateSessionStore, GateStatus, PreflightRequest, PreflightResponse,
    RequiredAction, TestRegistration,
};
use sevgate_severity::SeverityEvaluator;
use sevgate_trend::{HistoryEntry, SeverityTracker, TokenTracker, TokenUsage, TrendReport};
use std::sync::Arc;

/// Violations listed in a gate check response
pub const MAX_LISTED_VIOLATIONS: usize = 50;

// === Responses ===

/// Compact view of one evaluated violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationSummary {
    pub rule_id: String,
    pub severity: Severity,
    pub score: f64,
    pub file_path: String,
    pub line: u32,
    pub message: String,
    pub intelligent: bool,
}

impl From<&EvaluatedViolation> for ViolationSummary {
    fn from(ev: &EvaluatedViolation) -> Self {
        Self {
            rule_id: ev.violation.rule_id.clone(),
            severity: ev.severity(),
            score: ev.score(),
            file_path: ev.violation.file_path.clone(),
            line: ev.violation.line,
            message: ev.violation.message.clone(),
            intelligent: ev.evaluation.is_computed(),
        }
    }
}

/// Result of running the pipeline over a batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateRun {
    pub decision: GateDecision,
    pub message: String,
    pub evaluated: Vec<EvaluatedViolation>,
    pub token_usage: TokenUsage,
    /// Persistence problems; never affect the decision
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl GateRun {
    /// CRITICAL and HIGH if there are any, otherwise MEDIUM and LOW
    pub fn listed_violations(&self) -> Vec<ViolationSummary> {
        let blocking: Vec<&EvaluatedViolation> = self
            .evaluated
            .iter()
            .filter(|ev| ev.severity().is_blocking())
            .collect();
        let chosen: Vec<&EvaluatedViolation> = if blocking.is_empty() {
            self.evaluated.iter().collect()
        } else {
            blocking
        };
        chosen
            .into_iter()
            .take(MAX_LISTED_VIOLATIONS)
            .map(ViolationSummary::from)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateCheckResponse {
    pub status: GateStatus,
    pub violations: Vec<ViolationSummary>,
    pub reason: String,
    pub session_id: String,
    pub check_count: u64,
    /// Milliseconds the result stays valid; zero when blocked
    pub valid_for: u64,
    pub message: String,
    pub decision: GateDecision,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

// === Service ===

pub struct GateService {
    config: GateConfig,
    evaluator: SeverityEvaluator,
    policy: BlockingPolicy,
    session: GateSessionStore,
    history: SeverityTracker,
    tokens: TokenTracker,
    source: Arc<dyn ViolationSource>,
    metrics: GateMetrics,
}

impl GateService {
    pub fn new(
        config: GateConfig,
        evaluator: SeverityEvaluator,
        source: Arc<dyn ViolationSource>,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        Ok(Self {
            policy: BlockingPolicy::from_config(&config),
            session: GateSessionStore::from_config(&config),
            history: SeverityTracker::from_config(&config),
            tokens: TokenTracker::from_config(&config),
            metrics: GateMetrics::new()?,
            config,
            evaluator,
            source,
        })
    }

    /// Service over the configured repository and scanner output file
    pub fn from_config(config: GateConfig) -> Result<Self, ServiceError> {
        let evaluator = SeverityEvaluator::for_repository(&config);
        let source = Arc::new(JsonFileSource::new(config.violations_path.clone()));
        Self::new(config, evaluator, source)
    }

    pub fn with_session(mut self, session: GateSessionStore) -> Self {
        self.session = session;
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn session(&self) -> &GateSessionStore {
        &self.session
    }

    pub fn metrics(&self) -> &GateMetrics {
        &self.metrics
    }

    /// Evaluate, decide and persist. `scope` restricts the run to violations
    /// whose path contains one of the given files; the rest are never scored.
    pub fn run(&self, violations: Vec<Violation>, scope: Option<&[String]>) -> GateRun {
        let violations = match scope {
            Some(files) => {
                let total = violations.len();
                let scoped: Vec<Violation> = violations
                    .into_iter()
                    .filter(|v| in_scope(&v.file_path, files))
                    .collect();
                tracing::debug!(total, kept = scoped.len(), "scoped violations");
                scoped
            }
            None => violations,
        };

        let evaluated = self.evaluator.evaluate_all(violations);
        let computed = evaluated.iter().filter(|ev| ev.evaluation.is_computed()).count();
        self.metrics.evaluations(computed, evaluated.len() - computed);

        let decision = match scope {
            Some(files) => self.policy.decide_for_files(&evaluated, files),
            None => self.policy.decide(&evaluated),
        };

        let mut warnings = Vec::new();
        let mut entry = HistoryEntry::from_decision(&evaluated, &decision);
        let vcs = self.evaluator.vcs();
        if let (Ok(commit), Ok(branch)) = (vcs.head_commit(), vcs.current_branch()) {
            entry = entry.with_commit(commit, branch);
        }
        if let Err(e) = self.history.record(&entry) {
            tracing::warn!(error = %e, "severity history not persisted");
            warnings.push(e.to_string());
        }

        let message = decision.format_message();
        let token_usage = self.tokens.estimate(evaluated.len(), message.len());
        if let Err(e) = self.tokens.record(&token_usage) {
            tracing::warn!(error = %e, "token usage not persisted");
            warnings.push(e.to_string());
        }
        if let Some(warning) = token_usage.warning() {
            warnings.push(warning);
        }

        GateRun {
            decision,
            message,
            evaluated,
            token_usage,
            warnings,
        }
    }

    /// Files the configured gate scope restricts a check to
    fn scope_files(&self) -> Option<Vec<String>> {
        match self.config.scope {
            GateScope::Repo => None,
            GateScope::Staging => match self.evaluator.vcs().staged_files() {
                Ok(files) => Some(files),
                Err(e) => {
                    tracing::warn!(error = %e, "staged files unavailable, checking whole repository");
                    None
                }
            },
        }
    }

    /// No-argument gate check: load scanner output, decide, open the window
    pub fn gate_check(&self) -> Result<GateCheckResponse, ServiceError> {
        let violations = self.source.load()?;
        let scope = self.scope_files();
        let run = self.run(violations, scope.as_deref());
        let receipt = self.session.record_check(&run.decision);
        self.metrics.gate_check(&receipt.status.to_string());

        Ok(GateCheckResponse {
            status: receipt.status,
            violations: run.listed_violations(),
            reason: run.decision.reason.clone(),
            session_id: receipt.session_id,
            check_count: receipt.check_count,
            valid_for: receipt.valid_for,
            message: run.message,
            decision: run.decision,
            warnings: run.warnings,
        })
    }

    pub fn enforcement_status(&self) -> EnforcementStatus {
        self.session.enforcement_status()
    }

    pub fn preflight(&self, request: &PreflightRequest) -> PreflightResponse {
        let response = self.session.preflight(request);
        let outcome = match response.required_action {
            None => "allowed",
            Some(RequiredAction::RunGateCheck) => "refused_gate",
            Some(RequiredAction::CreateTestFirst) => "refused_tdd",
        };
        self.metrics.preflight(outcome);
        response
    }

    pub fn register_test(&self, test_file_path: &str) -> TestRegistration {
        self.session.register_test(test_file_path)
    }

    pub fn reset_tdd(&self) -> usize {
        self.session.reset_tdd()
    }

    pub fn trend(&self, limit: usize) -> Result<TrendReport, ServiceError> {
        Ok(self.history.trend(limit)?)
    }
}
