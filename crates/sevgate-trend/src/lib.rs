//! sevgate trend: append-only history of gate decisions and token budget
//!
//! Both logs are JSON Lines under the configured history directory. Appends
//! are serialized per log; readers tolerate a missing file and skip lines
//! they cannot parse.

pub mod jsonl;
pub mod severity;
pub mod tokens;

pub use jsonl::{JsonlLog, TrendError};
pub use severity::{HistoryEntry, SeverityTracker, Trend, TrendReport};
pub use tokens::{TokenTracker, TokenUsage, WarningLevel, DEFAULT_TOKEN_MAX};
