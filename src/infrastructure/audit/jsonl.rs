use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde_json::Value;

use crate::domain::ports::AuditSink;

/// Appends one JSON record per line to a file.
///
/// Writes take an exclusive lock so concurrent executors sharing a log never
/// interleave partial lines. The file is only ever opened for append.
#[derive(Debug, Clone)]
pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(path: &Path, line: &str) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.lock_exclusive()?;
        let result = writeln!(file, "{line}").and_then(|()| file.flush());
        let _ = file.unlock();
        result
    }
}

#[async_trait]
impl AuditSink for JsonlAuditLog {
    async fn append(&self, record: &Value) -> io::Result<()> {
        let line = serde_json::to_string(record)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::append_line(&path, &line))
            .await
            .map_err(io::Error::other)?
    }
}
