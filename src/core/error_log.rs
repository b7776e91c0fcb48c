//! Append-only error log.
//!
//! Each entry is one line: `[yyyy-MM-dd HH:mm:ss] ERROR: <message>`, in local
//! time. The log is written for operators and never read back.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Timestamp format of error log entries
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// File-backed error log
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry stamped with the current local time.
    ///
    /// Failing to write the log is reported through tracing only.
    pub async fn record(&self, message: &str) {
        self.record_at(Local::now().naive_local(), message).await
    }

    pub async fn record_at(&self, timestamp: NaiveDateTime, message: &str) {
        tracing::error!("{}", message);

        if let Err(e) = self.append(&format_entry(timestamp, message)).await {
            tracing::warn!("Failed to write error log {}: {}", self.path.display(), e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

/// Render one log line, including the trailing newline
pub fn format_entry(timestamp: NaiveDateTime, message: &str) -> String {
    format!(
        "[{}] ERROR: {}\n",
        timestamp.format(TIMESTAMP_FORMAT),
        message.replace('\n', " ")
    )
}
