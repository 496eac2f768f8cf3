//! Version-control query facade
//!
//! Read-only queries used to build decision context and to scope gate checks.
//! [`GitCli`] shells out with a per-invocation deadline; [`CachedVcs`] memoizes
//! per-path answers for one batch and can prefetch them on a bounded pool.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VcsError {
    #[error("VCS/not a git repository: {0}")]
    NotARepository(String),

    #[error("VCS/git timed out after {0:?}")]
    Timeout(Duration),

    #[error("VCS/failed to spawn git: {0}")]
    Spawn(String),

    #[error("VCS/git command failed: {0}")]
    CommandFailed(String),

    #[error("VCS/unexpected git output: {0}")]
    Parse(String),
}

/// Queries the gate needs from version control
pub trait VersionControl: Send + Sync {
    fn staged_files(&self) -> Result<Vec<String>, VcsError>;

    fn uncommitted_files(&self) -> Result<Vec<String>, VcsError>;

    /// Commits touching `path` in the last `days` days
    fn commit_count_since(&self, path: &str, days: u32) -> Result<u32, VcsError>;

    fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>, VcsError>;

    /// Tracked files that appear to import `path`
    fn dependents_count(&self, path: &str) -> Result<u32, VcsError>;

    fn current_branch(&self) -> Result<String, VcsError>;

    fn head_commit(&self) -> Result<String, VcsError>;

    /// `(ahead, behind)` relative to `upstream`
    fn ahead_behind(&self, upstream: &str) -> Result<(u32, u32), VcsError>;

    /// Warm per-path answers ahead of a batch. No-op unless the backend caches.
    fn prefetch(&self, _paths: &[String]) {}
}

/// File stem used by the fan-in search: `src/user/UserService.swift` → `UserService`
pub fn import_stem(path: &str) -> &str {
    let name = path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// `git` subprocess backend
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    timeout: Duration,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            timeout: Duration::from_millis(2_000),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run git and return stdout. `allow_exit_one` treats exit status 1 as an
    /// empty result (git grep with no matches).
    fn run(&self, args: &[&str], allow_exit_one: bool) -> Result<String, VcsError> {
        let mut command = Command::new("git");
        command.args(args).current_dir(&self.root);
        let (status, out, err) = run_with_deadline(&mut command, self.timeout).map_err(|e| {
            tracing::debug!(?args, error = %e, "git invocation failed");
            e
        })?;

        if status.success() {
            return Ok(out);
        }
        if allow_exit_one && status.code() == Some(1) && err.trim().is_empty() {
            return Ok(String::new());
        }
        if err.contains("not a git repository") {
            return Err(VcsError::NotARepository(self.root.display().to_string()));
        }
        Err(VcsError::CommandFailed(err.trim().to_string()))
    }
}

/// Spawn `command` and collect its output, killing it once `timeout` passes
pub fn run_with_deadline(
    command: &mut Command,
    timeout: Duration,
) -> Result<(ExitStatus, String, String), VcsError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| VcsError::Spawn(e.to_string()))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let reader = std::thread::spawn(move || {
        let mut out = String::new();
        let mut err = String::new();
        if let Some(mut s) = stdout {
            let _ = s.read_to_string(&mut out);
        }
        if let Some(mut s) = stderr {
            let _ = s.read_to_string(&mut err);
        }
        (out, err)
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(VcsError::Timeout(timeout));
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(5)),
            Err(e) => return Err(VcsError::CommandFailed(e.to_string())),
        }
    };

    let (out, err) = reader
        .join()
        .map_err(|_| VcsError::CommandFailed("output reader panicked".to_string()))?;
    Ok((status, out, err))
}

fn non_empty_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Paths from `git status --porcelain`: `XY PATH`, or `XY OLD -> NEW` for renames
pub fn parse_porcelain(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|l| l.len() > 3)
        .map(|l| {
            let path = &l[3..];
            path.rsplit(" -> ").next().unwrap_or(path).to_string()
        })
        .collect()
}

/// `(ahead, behind)` from `git rev-list --left-right --count UPSTREAM...HEAD`,
/// which prints the upstream-only count first
pub fn parse_left_right(raw: &str) -> Result<(u32, u32), VcsError> {
    let mut parts = raw.split_whitespace().map(str::parse::<u32>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(behind)), Some(Ok(ahead)), None) => Ok((ahead, behind)),
        _ => Err(VcsError::Parse(raw.trim().to_string())),
    }
}

impl VersionControl for GitCli {
    fn staged_files(&self) -> Result<Vec<String>, VcsError> {
        let out = self.run(&["diff", "--cached", "--name-only", "--diff-filter=ACMR"], false)?;
        Ok(non_empty_lines(&out))
    }

    fn uncommitted_files(&self) -> Result<Vec<String>, VcsError> {
        let out = self.run(&["status", "--porcelain"], false)?;
        Ok(parse_porcelain(&out))
    }

    fn commit_count_since(&self, path: &str, days: u32) -> Result<u32, VcsError> {
        let since = format!("--since={} days ago", days);
        let out = self.run(&["log", &since, "--oneline", "--follow", "--", path], false)?;
        Ok(non_empty_lines(&out).len() as u32)
    }

    fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>, VcsError> {
        let out = self.run(&["log", "-1", "--format=%cI", "--", path], false)?;
        let raw = out.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|e| VcsError::Parse(format!("{}: {}", raw, e)))
    }

    fn dependents_count(&self, path: &str) -> Result<u32, VcsError> {
        let stem = import_stem(path);
        if stem.is_empty() {
            return Ok(0);
        }
        let pattern = format!("import.*{}", regex::escape(stem));
        let out = self.run(&["grep", "-l", "-E", &pattern], true)?;
        Ok(non_empty_lines(&out).len() as u32)
    }

    fn current_branch(&self) -> Result<String, VcsError> {
        Ok(self.run(&["rev-parse", "--abbrev-ref", "HEAD"], false)?.trim().to_string())
    }

    fn head_commit(&self) -> Result<String, VcsError> {
        Ok(self.run(&["rev-parse", "HEAD"], false)?.trim().to_string())
    }

    fn ahead_behind(&self, upstream: &str) -> Result<(u32, u32), VcsError> {
        let range = format!("{}...HEAD", upstream);
        let out = self.run(&["rev-list", "--left-right", "--count", &range], false)?;
        parse_left_right(&out)
    }
}

#[derive(Default)]
struct PathCache {
    commits: HashMap<(String, u32), Result<u32, VcsError>>,
    modified: HashMap<String, Result<Option<DateTime<Utc>>, VcsError>>,
    dependents: HashMap<String, Result<u32, VcsError>>,
}

/// Memoizing wrapper. One instance per evaluation batch.
pub struct CachedVcs {
    inner: Arc<dyn VersionControl>,
    cache: Mutex<PathCache>,
    pool: Option<rayon::ThreadPool>,
}

impl CachedVcs {
    pub fn new(inner: Arc<dyn VersionControl>) -> Self {
        Self::with_concurrency(inner, 4)
    }

    pub fn with_concurrency(inner: Arc<dyn VersionControl>, workers: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("sevgate-vcs-{}", i))
            .build()
            .map_err(|e| tracing::warn!("vcs prefetch pool unavailable: {}", e))
            .ok();
        Self {
            inner,
            cache: Mutex::new(PathCache::default()),
            pool,
        }
    }

    fn cached<K, V, F, G>(&self, select: F, key: K, compute: G) -> Result<V, VcsError>
    where
        K: std::hash::Hash + Eq + Clone,
        V: Clone,
        F: Fn(&mut PathCache) -> &mut HashMap<K, Result<V, VcsError>>,
        G: FnOnce() -> Result<V, VcsError>,
    {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = select(&mut cache).get(&key) {
                return hit.clone();
            }
        }
        let value = compute();
        if let Ok(mut cache) = self.cache.lock() {
            select(&mut cache).insert(key, value.clone());
        }
        value
    }
}

impl VersionControl for CachedVcs {
    fn staged_files(&self) -> Result<Vec<String>, VcsError> {
        self.inner.staged_files()
    }

    fn uncommitted_files(&self) -> Result<Vec<String>, VcsError> {
        self.inner.uncommitted_files()
    }

    fn commit_count_since(&self, path: &str, days: u32) -> Result<u32, VcsError> {
        self.cached(
            |c| &mut c.commits,
            (path.to_string(), days),
            || self.inner.commit_count_since(path, days),
        )
    }

    fn last_modified(&self, path: &str) -> Result<Option<DateTime<Utc>>, VcsError> {
        self.cached(
            |c| &mut c.modified,
            path.to_string(),
            || self.inner.last_modified(path),
        )
    }

    fn dependents_count(&self, path: &str) -> Result<u32, VcsError> {
        self.cached(
            |c| &mut c.dependents,
            path.to_string(),
            || self.inner.dependents_count(path),
        )
    }

    fn current_branch(&self) -> Result<String, VcsError> {
        self.inner.current_branch()
    }

    fn head_commit(&self) -> Result<String, VcsError> {
        self.inner.head_commit()
    }

    fn ahead_behind(&self, upstream: &str) -> Result<(u32, u32), VcsError> {
        self.inner.ahead_behind(upstream)
    }

    fn prefetch(&self, paths: &[String]) {
        let mut unique: Vec<&String> = paths.iter().collect();
        unique.sort();
        unique.dedup();

        let warm = |path: &&String| {
            let _ = self.commit_count_since(path, 30);
            let _ = self.dependents_count(path);
            let _ = self.last_modified(path);
        };
        match &self.pool {
            Some(pool) => pool.install(|| unique.par_iter().for_each(warm)),
            None => unique.iter().for_each(warm),
        }
    }
}
