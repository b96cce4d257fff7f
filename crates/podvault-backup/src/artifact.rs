//! Temp-file ownership for atomic commits.

use camino::{Utf8Path, Utf8PathBuf};
use podvault_core::{Error, Result};
use tokio::fs::{self, File, OpenOptions};
use tracing::{debug, warn};

/// A temporary file that is removed on drop unless committed.
///
/// The final path is only ever produced by a rename of the fully written
/// temp file, so it is never observed half-written.
#[derive(Debug)]
pub struct PendingArtifact {
    path: Utf8PathBuf,
    committed: bool,
}

impl PendingArtifact {
    /// Create (or truncate) the temp file and take ownership of it.
    pub async fn create(path: &Utf8Path) -> Result<(Self, File)> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(|e| Error::stream("temp file creation", e))?;

        debug!("Created temp file {}", path);
        Ok((
            Self {
                path: path.to_owned(),
                committed: false,
            },
            file,
        ))
    }

    /// Rename the temp file to `destination`.
    ///
    /// On failure the artifact is dropped and the temp file removed.
    pub async fn commit(mut self, destination: &Utf8Path) -> Result<()> {
        fs::rename(&self.path, destination)
            .await
            .map_err(|e| Error::stream("commit rename", e))?;
        debug!("Committed {} -> {}", self.path, destination);
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingArtifact {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed temp file {}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove temp file {}: {}", self.path, e),
        }
    }
}
