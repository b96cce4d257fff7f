//! # podvault-core
//!
//! Core library for podvault providing:
//! - Backup and restore option types with their validation rules
//! - Progress events and operation results
//! - The shared error taxonomy
//! - Engine configuration loading (podvault.yaml)

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::{EngineConfig, DEFAULT_PROGRESS_CAPACITY};
pub use error::{Error, ErrorKind, Result};
pub use types::{
    BackupMetadata, BackupOptions, BackupResult, Progress, RestoreOptions, RestoreResult,
    FILESYSTEM_PROVIDER,
};
pub use utils::format_bytes;
