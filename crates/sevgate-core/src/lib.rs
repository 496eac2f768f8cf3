//! sevgate core: data model, decision context, errors and configuration
//!
//! Every other crate in the workspace speaks in these types. Scanners hand us
//! [`Violation`]s, the severity crate turns each into an [`Evaluation`], the
//! policy crate folds evaluations into a gate decision, and the session and
//! trend crates persist what happened.

pub mod config;
pub mod context;
pub mod data_model;
pub mod error;

pub use config::{BlockingMode, GateConfig, GateScope};
pub use context::{ContextSnapshot, DecisionContext, Layer};
pub use data_model::{
    EvaluatedViolation, Evaluation, EvaluationOrigin, ImpactBreakdown, Platform, Severity,
    SeverityCounts, Violation, ViolationMetrics,
};
pub use error::SevgateError;

/// Engine version reported by the API and written into history entries.
pub const SEVGATE_VERSION: &str = "1.0.0";
