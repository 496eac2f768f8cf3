//! sevgate session: gate validity window and test-first write authorization
//!
//! ```text
//! NOT_CHECKED ──check──► ALLOWED ──window elapses──► EXPIRED
//!      │                   ▲  │                         │
//!      └──check(block)──► BLOCKED ◄──────────check──────┘
//! ```
//!
//! A [`GateSessionStore`] is injected wherever the gate is consulted; nothing
//! here is process-global.

pub mod clock;
pub mod gate;
pub mod preflight;
pub mod tdd;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::{
    BlockReason, EnforcementStatus, GateCheckReceipt, GateCheckRecord, GateSessionStore,
    GateStatus, SessionGate,
};
pub use preflight::{
    ActionKind, PreflightRequest, PreflightResponse, RequiredAction, TestRegistration,
};
pub use tdd::{candidate_test_paths, covers, is_test_path, TddState};
