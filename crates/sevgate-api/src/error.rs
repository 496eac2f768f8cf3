//! Service error model
use sevgate_core::SevgateError;
use sevgate_trend::TrendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] SevgateError),

    #[error(transparent)]
    Trend(#[from] TrendError),

    #[error("METRICS/{0}")]
    Metrics(#[from] prometheus::Error),
}

impl ServiceError {
    /// Caller-side problems as opposed to server-side failures
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Core(SevgateError::Intake(_)) | ServiceError::Core(SevgateError::Metric(_))
        )
    }
}
