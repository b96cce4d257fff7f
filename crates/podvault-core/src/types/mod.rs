//! Type definitions for podvault

pub mod metadata;
pub mod options;
pub mod progress;
pub mod results;

pub use metadata::{BackupMetadata, FILESYSTEM_PROVIDER};
pub use options::{BackupOptions, RestoreOptions};
pub use progress::Progress;
pub use results::{BackupResult, RestoreResult};
