//! Pre-flight write authorization messages

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Edit,
    #[serde(alias = "create_file", alias = "create")]
    Create,
    Write,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Edit => write!(f, "edit"),
            ActionKind::Create => write!(f, "create"),
            ActionKind::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightRequest {
    pub action_kind: ActionKind,
    pub target_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_content: Option<String>,
    /// Skip the test-first requirement; the gate itself still applies
    #[serde(default)]
    pub bypass_tdd: bool,
}

impl PreflightRequest {
    pub fn new(action_kind: ActionKind, target_path: impl Into<String>) -> Self {
        Self {
            action_kind,
            target_path: target_path.into(),
            proposed_content: None,
            bypass_tdd: false,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.proposed_content = Some(content.into());
        self
    }

    pub fn bypassing_tdd(mut self) -> Self {
        self.bypass_tdd = true;
        self
    }
}

/// What the caller must do before retrying a refused write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequiredAction {
    RunGateCheck,
    CreateTestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightResponse {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidate_test_paths: Vec<String>,
}

impl PreflightResponse {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            required_action: None,
            candidate_test_paths: Vec::new(),
        }
    }

    pub fn refuse(reason: impl Into<String>, action: RequiredAction) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            required_action: Some(action),
            candidate_test_paths: Vec::new(),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidate_test_paths = candidates;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRegistration {
    pub registered: bool,
    pub test_file_path: String,
    pub session_test_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
