//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SevgateError {
    #[error("CONFIG/{0}")]
    Config(String),

    #[error("METRIC/{0}")]
    Metric(String),

    #[error("INTAKE/{0}")]
    Intake(String),
}

impl SevgateError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn intake(msg: impl Into<String>) -> Self {
        Self::Intake(msg.into())
    }
}
