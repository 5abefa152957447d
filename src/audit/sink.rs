//! Audit sink abstraction and the append-only file sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use super::{AuditError, AuditEvent};

/// Destination for audit event batches.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Write a batch of events. Returns the number successfully written.
    async fn write_batch(&self, events: &[AuditEvent]) -> Result<usize, AuditError>;

    /// Sink name for logging.
    fn name(&self) -> &'static str;
}

/// Append-only JSON-lines file sink.
///
/// Events land in `<dir>/audit-YYYY-MM-DD.json`, one JSON object per line.
/// The date is resolved per batch, so a long-running process rolls over to a
/// new file at midnight UTC.
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn current_file(&self) -> PathBuf {
        let date = Utc::now().format("%Y-%m-%d");
        self.directory.join(format!("audit-{}.json", date))
    }

    async fn ensure_directory(&self) -> Result<(), AuditError> {
        if !Path::new(&self.directory).exists() {
            tokio::fs::create_dir_all(&self.directory).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AuditSink for FileSink {
    async fn write_batch(&self, events: &[AuditEvent]) -> Result<usize, AuditError> {
        if events.is_empty() {
            return Ok(0);
        }

        self.ensure_directory().await?;

        let mut lines = String::new();
        for event in events {
            lines.push_str(&serde_json::to_string(event)?);
            lines.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_file())
            .await?;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;

        Ok(events.len())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
