//! Where gate checks get their violations

use serde::Deserialize;
use sevgate_core::{SevgateError, Violation};
use std::path::PathBuf;

/// Supplies the scanner output for a no-argument gate check
pub trait ViolationSource: Send + Sync {
    fn load(&self) -> Result<Vec<Violation>, SevgateError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Intake {
    List(Vec<Violation>),
    Wrapped {
        #[serde(alias = "violations")]
        findings: Vec<Violation>,
    },
}

/// Accepts a bare array or an object with `findings` / `violations`
pub fn parse_violations(raw: &str) -> Result<Vec<Violation>, SevgateError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Intake>(raw) {
        Ok(Intake::List(violations)) | Ok(Intake::Wrapped { findings: violations }) => {
            Ok(violations)
        }
        Err(_) => {
            // re-parse as a plain list for a precise error location
            serde_json::from_str::<Vec<Violation>>(raw)
                .map_err(|e| SevgateError::intake(format!("invalid violation payload: {}", e)))
        }
    }
}

/// Scanner summary file on disk; a missing file means no findings yet
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ViolationSource for JsonFileSource {
    fn load(&self) -> Result<Vec<Violation>, SevgateError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => parse_violations(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "no scanner output, treating as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(SevgateError::intake(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Fixed list, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Vec<Violation>);

impl ViolationSource for StaticSource {
    fn load(&self) -> Result<Vec<Violation>, SevgateError> {
        Ok(self.0.clone())
    }
}
