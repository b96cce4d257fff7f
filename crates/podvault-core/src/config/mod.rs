//! Engine configuration

mod loader;

use serde::{Deserialize, Serialize};

pub use loader::{CONFIG_FILE_NAMES, KUBECTL_ENV};

/// Default capacity of the progress channel
pub const DEFAULT_PROGRESS_CAPACITY: usize = 100;

/// Default remote-exec binary
pub const DEFAULT_KUBECTL: &str = "kubectl";

/// Settings shared by the backup and restore engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path or name of the kubectl binary
    pub kubectl: String,

    /// Buffer size of the progress channel
    pub progress_capacity: usize,

    /// Compute a SHA-256 over the committed archive
    pub checksum: bool,

    /// Probe the remote path size before streaming
    pub estimate_size: bool,

    /// fsync the temp file before renaming it into place
    pub sync_on_commit: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kubectl: DEFAULT_KUBECTL.to_string(),
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
            checksum: true,
            estimate_size: true,
            sync_on_commit: true,
        }
    }
}

impl EngineConfig {
    /// Use a different kubectl binary
    pub fn with_kubectl(mut self, kubectl: impl Into<String>) -> Self {
        self.kubectl = kubectl.into();
        self
    }

    pub fn with_progress_capacity(mut self, capacity: usize) -> Self {
        self.progress_capacity = capacity;
        self
    }

    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn with_size_estimate(mut self, estimate_size: bool) -> Self {
        self.estimate_size = estimate_size;
        self
    }
}
