//! Append-only JSON Lines log

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendError {
    #[error("PERSIST/io {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("PERSIST/encode: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TrendError {
    fn io(path: &Path, source: io::Error) -> Self {
        TrendError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One JSON document per line; appends are serialized
#[derive(Debug)]
pub struct JsonlLog<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _entry: PhantomData<fn() -> T>,
}

impl<T> JsonlLog<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _entry: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Serialize> JsonlLog<T> {
    pub fn append(&self, entry: &T) -> Result<(), TrendError> {
        let line = serde_json::to_string(entry)?;
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TrendError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| TrendError::io(&self.path, e))?;
        writeln!(file, "{}", line).map_err(|e| TrendError::io(&self.path, e))?;
        file.flush().map_err(|e| TrendError::io(&self.path, e))
    }
}

impl<T: DeserializeOwned> JsonlLog<T> {
    /// Parse entries in file order, handing each to `visit`. A missing file
    /// is an empty log; lines that fail to parse are skipped.
    fn scan(&self, mut visit: impl FnMut(T)) -> Result<(), TrendError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(TrendError::io(&self.path, e)),
        };

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| TrendError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => visit(entry),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %e,
                    "skipping malformed log line"
                ),
            }
        }
        Ok(())
    }

    /// Every readable entry, oldest first
    pub fn read_all(&self) -> Result<Vec<T>, TrendError> {
        let mut entries = Vec::new();
        self.scan(|entry| entries.push(entry))?;
        Ok(entries)
    }

    /// Last `n` readable entries, oldest first. Holds at most `n` in memory.
    pub fn tail(&self, n: usize) -> Result<Vec<T>, TrendError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut window = VecDeque::with_capacity(n.min(1024));
        self.scan(|entry| {
            if window.len() == n {
                window.pop_front();
            }
            window.push_back(entry);
        })?;
        Ok(window.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        n: u32,
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log: JsonlLog<Row> = JsonlLog::new(dir.path().join("none.jsonl"));
        assert!(log.read_all().unwrap().is_empty());
        assert!(log.tail(3).unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_directories_and_tails() {
        let dir = tempfile::tempdir().unwrap();
        let log = JsonlLog::new(dir.path().join("nested/dir/rows.jsonl"));
        for n in 0..5 {
            log.append(&Row { n }).unwrap();
        }
        assert_eq!(log.tail(2).unwrap(), vec![Row { n: 3 }, Row { n: 4 }]);
        assert_eq!(log.tail(50).unwrap().len(), 5);

        let text = fs::read_to_string(log.path()).unwrap();
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        fs::write(&path, "{\"n\":1}\nnot json\n\n{\"n\":2}\n").unwrap();
        let log: JsonlLog<Row> = JsonlLog::new(&path);
        assert_eq!(log.read_all().unwrap(), vec![Row { n: 1 }, Row { n: 2 }]);
    }

    #[test]
    fn test_tail_keeps_last_readable_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.jsonl");
        let mut text = String::new();
        for n in 0..1000 {
            text.push_str(&format!("{{\"n\":{}}}\n", n));
        }
        text.push_str("{\"n\":\n");
        fs::write(&path, text).unwrap();

        let log: JsonlLog<Row> = JsonlLog::new(&path);
        assert_eq!(
            log.tail(3).unwrap(),
            vec![Row { n: 997 }, Row { n: 998 }, Row { n: 999 }]
        );
        assert!(log.tail(0).unwrap().is_empty());
        assert_eq!(log.tail(5000).unwrap().len(), 1000);
    }
}
