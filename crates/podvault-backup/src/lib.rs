//! Podvault streaming engines
//!
//! This crate backs up and restores the filesystem of a running container by
//! streaming a tar archive through `kubectl exec`. Archive bytes flow
//! straight between the remote process and a local file; they are never
//! buffered whole in memory or passed through a shell.
//!
//! # Features
//!
//! - **Atomic backups**: archives are written to `<output>.tmp` and renamed
//!   into place only after the remote tar exits cleanly
//! - **Checksums**: SHA-256 computed over the exact committed bytes
//! - **Progress**: byte counts with ETA plus per-entry events, delivered on
//!   a bounded channel that never blocks the stream
//! - **Cancellation**: a `CancellationToken` kills the remote process and
//!   removes partial output
//! - **Restore pre-flight**: target path, archive format, local file and
//!   pod checks before anything is extracted
//!
//! # Examples
//!
//! ```no_run
//! use podvault_backup::{progress_channel, BackupEngine};
//! use podvault_core::{BackupOptions, EngineConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> podvault_core::Result<()> {
//!     let engine = BackupEngine::from_config(EngineConfig::default());
//!     let opts = BackupOptions::new("default", "web-0", "/var/lib/data", "data.tar.gz")
//!         .with_compression(true);
//!
//!     let (progress, mut rx) = progress_channel(100);
//!     let printer = tokio::spawn(async move {
//!         while let Some(event) = rx.recv().await {
//!             println!("{}", event);
//!         }
//!     });
//!
//!     let result = engine.execute(&opts, progress, CancellationToken::new()).await?;
//!     printer.await.ok();
//!
//!     println!("Backup created: {} bytes", result.size_bytes);
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod backup;
pub mod checksum;
pub mod command;
pub mod compression;
pub mod exec;
pub mod progress;
pub mod provider;
pub mod restore;

// Re-export commonly used types
pub use artifact::PendingArtifact;
pub use backup::{parse_size_output, BackupEngine, BACKUP_COMPLETED};
pub use checksum::{calculate_checksum, ChecksumWriter};
pub use compression::{is_supported_archive, Compression, SUPPORTED_EXTENSIONS};
pub use exec::{ExecOutput, KubectlExec, ProcessControl, RemoteExec, RemoteProcess};
pub use progress::{progress_channel, ProgressEmitter, ProgressWriter};
pub use provider::{BackupProvider, FilesystemProvider, ProviderRegistry};
pub use restore::{RestoreEngine, RESTORE_COMPLETED, SYSTEM_DIRECTORIES};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
