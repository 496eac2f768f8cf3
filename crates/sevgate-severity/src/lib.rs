//! sevgate severity: context-aware, risk-weighted severity for scanner findings
//!
//! # Architecture
//!
//! ```text
//! Violation ──► ContextBuilder ──► DecisionContext
//!                  │    │                 │
//!         VersionControl ContentClassifier│
//!                                         ▼
//!      Security · Performance · Stability · Maintainability analyzers
//!                                         │
//!                                         ▼
//!          weighted base ──► context multipliers ──► tier + recommendation
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sevgate_core::{Severity, Violation};
//! use sevgate_severity::testing::{InMemoryVcs, StaticClassifier};
//! use sevgate_severity::SeverityEvaluator;
//!
//! let evaluator = SeverityEvaluator::new(
//!     Arc::new(InMemoryVcs::new()),
//!     Arc::new(StaticClassifier::new()),
//! );
//! let violation = Violation::new(
//!     "security.hardcoded_secret",
//!     "/src/infra/config.go",
//!     "password: \"abc123\"",
//! );
//! let evaluation = evaluator.evaluate(&violation);
//! assert_eq!(evaluation.breakdown.security, 40);
//! assert_eq!(evaluation.severity, Severity::Low);
//! ```

pub mod analyzers;
pub mod classifier;
pub mod context_builder;
pub mod evaluator;
pub mod recommendation;
pub mod testing;
pub mod vcs;

pub use analyzers::{
    ImpactAnalyzer, ImpactAssessment, MaintainabilityAnalyzer, PerformanceAnalyzer,
    SecurityAnalyzer, StabilityAnalyzer, SubScore,
};
pub use classifier::{ContentClassifier, ContentSignals, KeywordClassifier};
pub use context_builder::ContextBuilder;
pub use evaluator::{apply_context_multipliers, EvaluationError, ImpactWeights, SeverityEvaluator};
pub use recommendation::RuleFamily;
pub use vcs::{CachedVcs, GitCli, VcsError, VersionControl};

use sevgate_core::GateConfig;
use std::sync::Arc;

impl SeverityEvaluator {
    /// Evaluator backed by `git` and the files under `config.repo_root`
    pub fn for_repository(config: &GateConfig) -> Self {
        let vcs = GitCli::new(&config.repo_root).with_timeout(config.git_timeout());
        SeverityEvaluator::new(
            Arc::new(vcs),
            Arc::new(KeywordClassifier::new(&config.repo_root)),
        )
        .with_vcs_concurrency(config.vcs_concurrency)
    }
}
