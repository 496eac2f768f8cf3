//! File-content signals
//!
//! Keyword sniffing over the source file a violation points at. Unreadable
//! files produce empty signals.

use once_cell::sync::Lazy;
use regex::RegexSet;
use std::path::{Path, PathBuf};

/// What the file content says about mitigations and sensitivity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentSignals {
    pub has_error_boundary: bool,
    pub has_fallback: bool,
    pub has_retry_logic: bool,
    pub declares_public_api: bool,
    pub mentions_credentials: bool,
    pub mentions_pii: bool,
}

pub trait ContentClassifier: Send + Sync {
    fn classify(&self, path: &str) -> ContentSignals;
}

static PUBLIC_DECLARATION: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"\bexport\s",
        r"\bpublic\s",
        r"\bopen\s+class\b",
        r"\bpub\s+(fn|struct|enum|trait)\b",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

const ERROR_BOUNDARY_MARKERS: &[&str] = &["try {", "ErrorBoundary", "catch {", "do {"];
const FALLBACK_MARKERS: &[&str] = &["fallback", "default value", "?? ", "|| "];
const RETRY_MARKERS: &[&str] = &["retry", "maxRetries", "exponentialBackoff"];
const CREDENTIAL_MARKERS: &[&str] = &["password", "token", "apikey", "secret", "credential"];
const PII_MARKERS: &[&str] = &["email", "phone", "address", "ssn", "personaldata", "pii"];

fn any_of(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Reads files from disk and scans them for keywords
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    root: PathBuf,
}

impl KeywordClassifier {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn classify_text(text: &str) -> ContentSignals {
        let lower = text.to_lowercase();
        ContentSignals {
            has_error_boundary: any_of(text, ERROR_BOUNDARY_MARKERS),
            has_fallback: any_of(text, FALLBACK_MARKERS),
            has_retry_logic: any_of(text, RETRY_MARKERS),
            declares_public_api: PUBLIC_DECLARATION.is_match(text),
            mentions_credentials: any_of(&lower, CREDENTIAL_MARKERS),
            mentions_pii: any_of(&lower, PII_MARKERS),
        }
    }

    fn read(&self, path: &str) -> Option<String> {
        let direct = Path::new(path);
        if let Ok(text) = std::fs::read_to_string(direct) {
            return Some(text);
        }
        let relative = path.trim_start_matches('/');
        std::fs::read_to_string(self.root.join(relative)).ok()
    }
}

impl ContentClassifier for KeywordClassifier {
    fn classify(&self, path: &str) -> ContentSignals {
        match self.read(path) {
            Some(text) => Self::classify_text(&text),
            None => {
                tracing::debug!(path, "content unreadable, using empty signals");
                ContentSignals::default()
            }
        }
    }
}
