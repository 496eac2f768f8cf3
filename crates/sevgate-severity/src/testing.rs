//! In-memory collaborators for tests and dry runs

use crate::classifier::{ContentClassifier, ContentSignals};
use crate::vcs::{VcsError, VersionControl};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted version control. Unknown paths answer with zeros.
#[derive(Debug, Default)]
pub struct InMemoryVcs {
    staged: Vec<String>,
    uncommitted: Vec<String>,
    commits: HashMap<String, u32>,
    dependents: HashMap<String, u32>,
    modified: HashMap<String, DateTime<Utc>>,
    branch: String,
    head: String,
    ahead_behind: (u32, u32),
    broken: bool,
    queries: AtomicUsize,
    queried: Mutex<Vec<String>>,
}

impl InMemoryVcs {
    pub fn new() -> Self {
        Self {
            branch: "main".to_string(),
            head: "0000000000000000000000000000000000000000".to_string(),
            ..Default::default()
        }
    }

    /// Every query fails as if run outside a repository
    pub fn not_a_repository() -> Self {
        Self {
            broken: true,
            ..Self::new()
        }
    }

    pub fn with_staged(mut self, files: &[&str]) -> Self {
        self.staged = files.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_uncommitted(mut self, files: &[&str]) -> Self {
        self.uncommitted = files.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_commit_count(mut self, path: &str, count: u32) -> Self {
        self.commits.insert(path.to_string(), count);
        self
    }

    pub fn with_dependents(mut self, path: &str, count: u32) -> Self {
        self.dependents.insert(path.to_string(), count);
        self
    }

    pub fn with_last_modified(mut self, path: &str, at: DateTime<Utc>) -> Self {
        self.modified.insert(path.to_string(), at);
        self
    }

    pub fn with_branch(mut self, branch: &str, head: &str) -> Self {
        self.branch = branch.to_string();
        self.head = head.to_string();
        self
    }

    pub fn with_ahead_behind(mut self, ahead: u32, behind: u32) -> Self {
        self.ahead_behind = (ahead, behind);
        self
    }

    /// Number of queries answered so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Distinct paths asked about by per-path queries, sorted
    pub fn queried_paths(&self) -> Vec<String> {
        let mut paths = self.queried.lock().unwrap_or_else(|p| p.into_inner()).clone();
        paths.sort();
        paths.dedup();
        paths
    }

    fn answer_for<T>(&self, path: &str, value: impl FnOnce() -> T) -> Result<T, VcsError> {
        self.queried
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(path.to_string());
        self.answer(value)
    }

    fn answer<T>(&self, value: impl FnOnce() -> T) -> Result<T, VcsError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(VcsError::NotARepository("in-memory".to_string()));
        }
        Ok(value())
    }
}

impl VersionControl for InMemoryVcs {
    fn staged_files(&self) -> Result<Vec<String>, VcsError> {
        self.answer(|| self.staged.clone())
    }

    fn uncommitted_files(&self) -> Result<Vec<String>, VcsError> {
        self.answer(|| self.uncommitted.clone())
    }

    fn commit_count_since(&self, path: &str, _days: u32) -> Result<u32, VcsError> {
        self.answer_for(path, || self.commits.get(path).copied().unwrap_or(0))
    }

    fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>, VcsError> {
        self.answer_for(path, || self.modified.get(path).copied())
    }

    fn dependents_count(&self, path: &str) -> Result<u32, VcsError> {
        self.answer_for(path, || self.dependents.get(path).copied().unwrap_or(0))
    }

    fn current_branch(&self) -> Result<String, VcsError> {
        self.answer(|| self.branch.clone())
    }

    fn head_commit(&self) -> Result<String, VcsError> {
        self.answer(|| self.head.clone())
    }

    fn ahead_behind(&self, _upstream: &str) -> Result<(u32, u32), VcsError> {
        self.answer(|| self.ahead_behind)
    }
}

/// Fixed content signals per path
#[derive(Debug, Clone, Default)]
pub struct StaticClassifier {
    signals: HashMap<String, ContentSignals>,
}

impl StaticClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, signals: ContentSignals) -> Self {
        self.signals.insert(path.to_string(), signals);
        self
    }
}

impl ContentClassifier for StaticClassifier {
    fn classify(&self, path: &str) -> ContentSignals {
        self.signals.get(path).copied().unwrap_or_default()
    }
}
