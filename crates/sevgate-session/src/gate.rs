//! Gate session store
//!
//! One store per agent session. The last gate check opens a validity window;
//! writes are authorized only while that window is open and, for
//! implementation files, only once a matching test has been registered.
//! Gate and TDD state share one mutex so a pre-flight sees a consistent view.

use crate::clock::{Clock, SystemClock};
use crate::preflight::{PreflightRequest, PreflightResponse, RequiredAction, TestRegistration};
use crate::tdd::{candidate_test_paths, is_test_path, TddState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sevgate_core::GateConfig;
use sevgate_policy::GateDecision;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

// === Status types ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    Allowed,
    Blocked,
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateStatus::Allowed => write!(f, "ALLOWED"),
            GateStatus::Blocked => write!(f, "BLOCKED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateCheckRecord {
    pub timestamp: DateTime<Utc>,
    pub status: GateStatus,
    pub reason: String,
}

/// Why the gate is closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    NotChecked,
    Expired {
        #[serde(rename = "elapsedMs")]
        elapsed_ms: u64,
        #[serde(rename = "windowMs")]
        window_ms: u64,
    },
    CheckBlocked {
        reason: String,
    },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::NotChecked => {
                write!(f, "Gate has not been checked in this session; run a gate check first")
            }
            BlockReason::Expired {
                elapsed_ms,
                window_ms,
            } => write!(
                f,
                "Gate check expired {}s ago (valid for {}s); run a gate check again",
                (elapsed_ms - window_ms.min(elapsed_ms)) / 1000,
                window_ms / 1000
            ),
            BlockReason::CheckBlocked { reason } => {
                write!(f, "Last gate check BLOCKED: {}", reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnforcementStatus {
    Allowed {
        #[serde(rename = "validForMs")]
        valid_for_ms: u64,
    },
    Blocked {
        reason: BlockReason,
    },
}

impl EnforcementStatus {
    pub fn is_allowed(&self) -> bool {
        matches!(self, EnforcementStatus::Allowed { .. })
    }
}

/// Snapshot of the session gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGate {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<GateCheckRecord>,
    pub check_count: u64,
    pub validity_window_ms: u64,
}

/// Returned to the caller of a gate check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateCheckReceipt {
    pub session_id: String,
    pub status: GateStatus,
    pub check_count: u64,
    /// Milliseconds the result stays valid; zero when blocked
    pub valid_for: u64,
    pub timestamp: DateTime<Utc>,
}

// === Store ===

#[derive(Debug)]
struct SessionState {
    gate: SessionGate,
    tdd: TddState,
}

pub struct GateSessionStore {
    clock: Arc<dyn Clock>,
    inner: Mutex<SessionState>,
}

impl GateSessionStore {
    pub fn new(validity_window: Duration) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            inner: Mutex::new(SessionState {
                gate: SessionGate {
                    session_id: Uuid::new_v4().to_string(),
                    last_check: None,
                    check_count: 0,
                    validity_window_ms: validity_window.as_millis() as u64,
                },
                tdd: TddState::default(),
            }),
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.gate_validity())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn session_id(&self) -> String {
        self.state().gate.session_id.clone()
    }

    pub fn snapshot(&self) -> SessionGate {
        self.state().gate.clone()
    }

    /// Record a gate check and restart the validity window
    pub fn record_check(&self, decision: &GateDecision) -> GateCheckReceipt {
        let now = self.clock.now();
        let status = if decision.should_block {
            GateStatus::Blocked
        } else {
            GateStatus::Allowed
        };

        let mut state = self.state();
        state.gate.check_count += 1;
        state.gate.last_check = Some(GateCheckRecord {
            timestamp: now,
            status,
            reason: decision.reason.clone(),
        });

        tracing::info!(
            session_id = %state.gate.session_id,
            check_count = state.gate.check_count,
            %status,
            "gate check recorded"
        );

        GateCheckReceipt {
            session_id: state.gate.session_id.clone(),
            status,
            check_count: state.gate.check_count,
            valid_for: match status {
                GateStatus::Allowed => state.gate.validity_window_ms,
                GateStatus::Blocked => 0,
            },
            timestamp: now,
        }
    }

    pub fn is_gate_valid(&self) -> bool {
        self.enforcement_status().is_allowed()
    }

    pub fn enforcement_status(&self) -> EnforcementStatus {
        let now = self.clock.now();
        status_at(&self.state().gate, now)
    }

    /// Authorize a write, evaluated under a single lock
    pub fn preflight(&self, request: &PreflightRequest) -> PreflightResponse {
        let now = self.clock.now();
        let state = self.state();

        tracing::debug!(
            action = %request.action_kind,
            path = %request.target_path,
            content_bytes = request.proposed_content.as_ref().map(|c| c.len()).unwrap_or(0),
            "pre-flight"
        );

        if let EnforcementStatus::Blocked { reason } = status_at(&state.gate, now) {
            tracing::info!(path = %request.target_path, %reason, "pre-flight refused by gate");
            return PreflightResponse::refuse(reason.to_string(), RequiredAction::RunGateCheck);
        }

        let target = request.target_path.as_str();
        if is_test_path(target) || state.tdd.has_test_for(target) {
            return PreflightResponse::allow();
        }

        if request.bypass_tdd {
            tracing::warn!(path = target, "pre-flight bypassing test-first requirement");
            return PreflightResponse::allow();
        }

        let candidates = candidate_test_paths(target);
        tracing::info!(path = target, "pre-flight refused: no test registered");
        PreflightResponse::refuse(
            format!(
                "Create the test first: no test registered for {} in this session. Write one of: {}",
                target,
                candidates.join(", ")
            ),
            RequiredAction::CreateTestFirst,
        )
        .with_candidates(candidates)
    }

    pub fn register_test(&self, test_file_path: &str) -> TestRegistration {
        let mut state = self.state();
        let path = test_file_path.trim();

        if !is_test_path(path) {
            return TestRegistration {
                registered: false,
                test_file_path: path.to_string(),
                session_test_count: state.tdd.len(),
                reason: Some(format!("{} does not look like a test file", path)),
            };
        }

        let fresh = state.tdd.register(path);
        tracing::info!(path, fresh, total = state.tdd.len(), "test registered");
        TestRegistration {
            registered: true,
            test_file_path: path.to_string(),
            session_test_count: state.tdd.len(),
            reason: None,
        }
    }

    /// Forget every registered test; returns how many were cleared
    pub fn reset_tdd(&self) -> usize {
        let cleared = self.state().tdd.reset();
        tracing::info!(cleared, "test-first state reset");
        cleared
    }

    pub fn registered_tests(&self) -> Vec<String> {
        self.state()
            .tdd
            .tests_created_this_session
            .iter()
            .cloned()
            .collect()
    }
}

fn status_at(gate: &SessionGate, now: DateTime<Utc>) -> EnforcementStatus {
    let Some(check) = &gate.last_check else {
        return EnforcementStatus::Blocked {
            reason: BlockReason::NotChecked,
        };
    };
    if check.status == GateStatus::Blocked {
        return EnforcementStatus::Blocked {
            reason: BlockReason::CheckBlocked {
                reason: check.reason.clone(),
            },
        };
    }
    let elapsed_ms = (now - check.timestamp).num_milliseconds().max(0) as u64;
    if elapsed_ms >= gate.validity_window_ms {
        return EnforcementStatus::Blocked {
            reason: BlockReason::Expired {
                elapsed_ms,
                window_ms: gate.validity_window_ms,
            },
        };
    }
    EnforcementStatus::Allowed {
        valid_for_ms: gate.validity_window_ms - elapsed_ms,
    }
}
