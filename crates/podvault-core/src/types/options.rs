//! Backup and restore options

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Options for archiving a path inside a running container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupOptions {
    /// Kubernetes namespace of the pod
    pub namespace: String,

    /// Pod name
    pub pod: String,

    /// Container name (defaults to the pod's first container)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,

    /// Absolute path inside the container to archive
    pub source_path: String,

    /// Local path the archive is committed to
    pub output_file: Utf8PathBuf,

    /// Gzip the archive inside the container
    #[serde(default)]
    pub compress: bool,

    /// tar exclude patterns, passed through in order
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Free-form settings carried alongside the backup
    #[serde(default)]
    pub extras: HashMap<String, String>,
}

impl BackupOptions {
    /// Create options for the required fields
    pub fn new(
        namespace: impl Into<String>,
        pod: impl Into<String>,
        source_path: impl Into<String>,
        output_file: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            pod: pod.into(),
            source_path: source_path.into(),
            output_file: output_file.into(),
            ..Default::default()
        }
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Temporary path the archive is streamed into before commit
    pub fn temp_file(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}.tmp", self.output_file))
    }
}

/// Options for extracting a local archive into a running container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreOptions {
    /// Kubernetes namespace of the pod
    pub namespace: String,

    /// Pod name
    pub pod: String,

    /// Container name (defaults to the pod's first container)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,

    /// Local archive to stream into the container
    pub backup_file: Utf8PathBuf,

    /// Absolute directory inside the container to extract into
    pub target_path: String,

    /// Replace files that already exist in the target
    #[serde(default)]
    pub overwrite: bool,

    /// Preserve permissions recorded in the archive
    #[serde(default)]
    pub preserve_perms: bool,

    /// Archive members to skip, passed through in order
    #[serde(default)]
    pub skip_paths: Vec<String>,
}

impl RestoreOptions {
    /// Create options for the required fields
    pub fn new(
        namespace: impl Into<String>,
        pod: impl Into<String>,
        backup_file: impl Into<Utf8PathBuf>,
        target_path: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            pod: pod.into(),
            backup_file: backup_file.into(),
            target_path: target_path.into(),
            ..Default::default()
        }
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_preserve_perms(mut self, preserve_perms: bool) -> Self {
        self.preserve_perms = preserve_perms;
        self
    }

    pub fn with_skip_path(mut self, path: impl Into<String>) -> Self {
        self.skip_paths.push(path.into());
        self
    }
}
