//! Outcomes of completed backup and restore operations

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of a committed backup.
///
/// Only ever built after the archive has been renamed into place, so it
/// never describes a partial file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupResult {
    /// Final archive path
    pub output_file: Utf8PathBuf,

    /// Bytes written to the archive
    pub size_bytes: u64,

    /// Hex SHA-256 of the committed archive, when checksums are enabled
    pub checksum: Option<String>,

    /// When streaming started
    pub started_at: DateTime<Utc>,

    /// When the archive was committed
    pub finished_at: DateTime<Utc>,
}

impl BackupResult {
    /// Wall-clock duration of the backup
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Result of a completed restore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreResult {
    pub success: bool,

    /// Directory inside the container that was restored into
    pub restored_path: String,

    /// Entries reported by the extracting tar
    pub file_count: u64,

    /// Size of the backup file streamed into the container
    pub bytes_written: u64,

    pub duration: Duration,

    /// Non-fatal notices collected during validation and extraction
    pub warnings: Vec<String>,
}
