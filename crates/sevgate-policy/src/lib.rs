//! sevgate policy: commit and agent gate blocking decisions
//!
//! Three modes:
//! - `normal` blocks on any CRITICAL or HIGH
//! - `strict` blocks on anything
//! - `criticalHighOnly` blocks like normal and reports MEDIUM + LOW as deferred
//!
//! An allowed decision carries technical-debt and maintainability advisories.

pub mod advisory;
pub mod blocking;
pub mod decision;

pub use advisory::{
    maintainability_index, technical_debt_hours, Advisory, AdvisoryStatus, Maintainability,
    TechnicalDebt,
};
pub use blocking::{in_scope, BlockingPolicy, MAX_LISTED_RULES};
pub use decision::GateDecision;
