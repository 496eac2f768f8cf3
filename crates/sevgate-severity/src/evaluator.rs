//! Risk-weighted severity evaluation
//!
//! base = 0.40·security + 0.30·stability + 0.20·performance + 0.10·maintainability,
//! then compounded context multipliers, clamped to 0..=100 and mapped to a tier.

use crate::analyzers::analyze_all;
use crate::classifier::ContentClassifier;
use crate::context_builder::ContextBuilder;
use crate::recommendation::recommend;
use crate::vcs::{CachedVcs, VersionControl};
use sevgate_core::{
    DecisionContext, EvaluatedViolation, Evaluation, EvaluationOrigin, ImpactBreakdown, Layer,
    Severity, SevgateError, Violation,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error(transparent)]
    InvalidInput(#[from] SevgateError),

    #[error("EVAL/non-finite score {0}")]
    NonFinite(f64),

    #[error("EVAL/evaluation panicked: {0}")]
    Panicked(String),
}

/// Analyzer weights. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactWeights {
    pub security: f64,
    pub stability: f64,
    pub performance: f64,
    pub maintainability: f64,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            security: 0.40,
            stability: 0.30,
            performance: 0.20,
            maintainability: 0.10,
        }
    }
}

impl ImpactWeights {
    pub fn base_score(&self, breakdown: &ImpactBreakdown) -> f64 {
        self.security * breakdown.security as f64
            + self.stability * breakdown.stability as f64
            + self.performance * breakdown.performance as f64
            + self.maintainability * breakdown.maintainability as f64
    }
}

/// Compound the context multipliers over `base` and clamp to 0..=100.
pub fn apply_context_multipliers(base: f64, ctx: &DecisionContext, rule_id: &str) -> f64 {
    let mut multiplier = 1.0;

    if ctx.is_production_code {
        if ctx.is_critical_path {
            multiplier *= 1.5;
        }
        if ctx.handles_payments {
            multiplier *= 2.0;
        }
        if ctx.handles_pii {
            multiplier *= 1.4;
        }
        if ctx.is_user_facing && !ctx.has_error_boundary {
            multiplier *= 1.3;
        }
        if ctx.is_public_api {
            multiplier *= 1.2;
        }
    }

    if ctx.is_main_thread && base > 30.0 {
        multiplier *= 2.0;
    }
    if ctx.dependency_count > 10 {
        multiplier *= 1.0 + ctx.dependency_count as f64 / 50.0;
    }
    if ctx.call_frequency > 1000 {
        multiplier *= 1.2;
    }

    let rule = rule_id.to_ascii_lowercase();
    if rule.contains("solid.") && ctx.layer == Layer::Domain {
        multiplier *= 1.4;
    }
    if rule.contains("clean_arch.") && rule.contains("domain") {
        multiplier *= 1.6;
    }

    if ctx.is_test_code {
        multiplier *= 0.3;
    }
    if ctx.has_error_boundary && ctx.has_fallback {
        multiplier *= 0.7;
    }
    if ctx.has_retry_logic {
        multiplier *= 0.9;
    }

    (base * multiplier).clamp(0.0, 100.0)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Turns violations into evaluations. Never fails past its own boundary.
pub struct SeverityEvaluator {
    vcs: Arc<dyn VersionControl>,
    classifier: Arc<dyn ContentClassifier>,
    weights: ImpactWeights,
    vcs_concurrency: usize,
}

impl SeverityEvaluator {
    pub fn new(vcs: Arc<dyn VersionControl>, classifier: Arc<dyn ContentClassifier>) -> Self {
        Self {
            vcs,
            classifier,
            weights: ImpactWeights::default(),
            vcs_concurrency: 4,
        }
    }

    pub fn with_weights(mut self, weights: ImpactWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_vcs_concurrency(mut self, workers: usize) -> Self {
        self.vcs_concurrency = workers.max(1);
        self
    }

    pub fn vcs(&self) -> &Arc<dyn VersionControl> {
        &self.vcs
    }

    /// Score a violation against an already-built context
    pub fn score(
        &self,
        violation: &Violation,
        context: &DecisionContext,
    ) -> Result<Evaluation, EvaluationError> {
        violation.metrics.validate()?;

        let breakdown = analyze_all(violation, context);
        let base_score = self.weights.base_score(&breakdown);
        let score = apply_context_multipliers(base_score, context, &violation.rule_id);
        if !score.is_finite() || !base_score.is_finite() {
            return Err(EvaluationError::NonFinite(score));
        }
        let severity = Severity::from_score(score);

        Ok(Evaluation {
            severity,
            score,
            base_score,
            breakdown,
            context: Some(context.snapshot()),
            recommendation: recommend(violation, severity, context),
            origin: EvaluationOrigin::Computed,
        })
    }

    fn try_with(
        &self,
        builder: &ContextBuilder,
        violation: &Violation,
    ) -> Result<Evaluation, EvaluationError> {
        catch_unwind(AssertUnwindSafe(|| {
            let context = builder.build(violation);
            self.score(violation, &context)
        }))
        .map_err(|payload| EvaluationError::Panicked(panic_message(payload)))?
    }

    fn evaluate_with(&self, builder: &ContextBuilder, violation: &Violation) -> Evaluation {
        match self.try_with(builder, violation) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::warn!(
                    rule_id = %violation.rule_id,
                    file = %violation.file_path,
                    error = %e,
                    "severity evaluation fell back to scanner hint"
                );
                Evaluation::fallback(violation, e.to_string())
            }
        }
    }

    pub fn try_evaluate(&self, violation: &Violation) -> Result<Evaluation, EvaluationError> {
        let builder = ContextBuilder::new(self.vcs.clone(), self.classifier.clone());
        self.try_with(&builder, violation)
    }

    /// Evaluate one violation, falling back to its hint on any failure
    pub fn evaluate(&self, violation: &Violation) -> Evaluation {
        let builder = ContextBuilder::new(self.vcs.clone(), self.classifier.clone());
        self.evaluate_with(&builder, violation)
    }

    /// Evaluate a batch with per-path VCS answers cached and prefetched
    pub fn evaluate_all(&self, violations: Vec<Violation>) -> Vec<EvaluatedViolation> {
        if violations.is_empty() {
            return Vec::new();
        }
        let cached: Arc<dyn VersionControl> = Arc::new(CachedVcs::with_concurrency(
            self.vcs.clone(),
            self.vcs_concurrency,
        ));
        let builder = ContextBuilder::new(cached, self.classifier.clone());

        let paths: Vec<String> = violations.iter().map(|v| v.file_path.clone()).collect();
        builder.prefetch(&paths);

        let evaluated: Vec<EvaluatedViolation> = violations
            .into_iter()
            .map(|v| {
                let evaluation = self.evaluate_with(&builder, &v);
                EvaluatedViolation::new(v, evaluation)
            })
            .collect();

        let fallbacks = evaluated.iter().filter(|e| !e.evaluation.is_computed()).count();
        tracing::debug!(
            total = evaluated.len(),
            fallbacks,
            "evaluated violation batch"
        );
        evaluated
    }
}
