//! Decision context: what we know about where a violation lives
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Architectural layer inferred from the file path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Layer {
    Domain,
    Application,
    Infrastructure,
    Presentation,
    #[default]
    Unknown,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Domain => write!(f, "DOMAIN"),
            Layer::Application => write!(f, "APPLICATION"),
            Layer::Infrastructure => write!(f, "INFRASTRUCTURE"),
            Layer::Presentation => write!(f, "PRESENTATION"),
            Layer::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Per-violation context. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionContext {
    // === Execution surface ===
    pub is_main_thread: bool,
    pub is_user_facing: bool,
    pub in_hot_path: bool,

    // === Classification ===
    pub is_production_code: bool,
    pub is_test_code: bool,
    pub layer: Layer,

    // === Business sensitivity ===
    pub is_critical_path: bool,
    pub handles_payments: bool,
    #[serde(rename = "handlesPII")]
    pub handles_pii: bool,
    pub handles_credentials: bool,
    pub user_generated_content: bool,

    // === Mitigations ===
    pub has_error_boundary: bool,
    pub has_fallback: bool,
    pub has_retry_logic: bool,

    // === Blast radius ===
    pub dependency_count: u32,
    #[serde(rename = "isPublicAPI")]
    pub is_public_api: bool,
    pub is_shared_kernel: bool,

    // === Usage and history ===
    pub call_frequency: u32,
    pub modification_frequency: u32,
    pub last_modified: Option<DateTime<Utc>>,

    // === State hints for the analyzers ===
    pub is_shared_state: bool,
    pub is_multi_step_operation: bool,
    pub value_can_be_nil: bool,
    pub has_business_logic: bool,
    pub data_size: f64,
    pub list_size: f64,
}

impl DecisionContext {
    /// Production code that is also reachable from outside the module
    pub fn is_production_api(&self) -> bool {
        self.is_production_code && self.is_public_api
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            is_main_thread: self.is_main_thread,
            is_critical_path: self.is_critical_path,
            is_production: self.is_production_code,
            dependency_count: self.dependency_count,
            call_frequency: self.call_frequency,
        }
    }
}

/// The slice of the context that is echoed back with an evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub is_main_thread: bool,
    pub is_critical_path: bool,
    pub is_production: bool,
    pub dependency_count: u32,
    pub call_frequency: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_is_inert() {
        let ctx = DecisionContext::default();
        assert_eq!(ctx.layer, Layer::Unknown);
        assert_eq!(ctx.dependency_count, 0);
        assert!(ctx.last_modified.is_none());
        assert!(!ctx.is_production_api());
    }

    #[test]
    fn test_snapshot() {
        let ctx = DecisionContext {
            is_production_code: true,
            is_critical_path: true,
            call_frequency: 1000,
            ..Default::default()
        };
        let snap = ctx.snapshot();
        assert!(snap.is_production);
        assert!(snap.is_critical_path);
        assert_eq!(snap.call_frequency, 1000);
        assert!(!snap.is_main_thread);
    }
}
