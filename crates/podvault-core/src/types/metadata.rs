//! Backup metadata persisted by callers alongside an archive.

use crate::error::Result;
use crate::types::{BackupOptions, BackupResult};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider type recorded for container filesystem backups.
pub const FILESYSTEM_PROVIDER: &str = "filesystem";

/// Metadata describing a finished backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Provider that produced the archive
    #[serde(rename = "type")]
    pub provider_type: String,

    pub namespace: String,
    pub pod: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    pub source_path: String,
    pub output_file: Utf8PathBuf,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub compressed: bool,
    pub created_at: DateTime<Utc>,
}

impl BackupMetadata {
    /// Describe a committed filesystem backup.
    pub fn from_backup(opts: &BackupOptions, result: &BackupResult) -> Self {
        Self {
            provider_type: FILESYSTEM_PROVIDER.to_string(),
            namespace: opts.namespace.clone(),
            pod: opts.pod.clone(),
            container: opts.container.clone(),
            source_path: opts.source_path.clone(),
            output_file: result.output_file.clone(),
            size_bytes: result.size_bytes,
            checksum: result.checksum.clone(),
            compressed: opts.compress,
            created_at: result.finished_at,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
