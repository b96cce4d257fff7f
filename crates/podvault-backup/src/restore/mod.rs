//! Restore engine: stream a local archive into `tar -x` inside a container.
//!
//! Stages run in order and any failure stops the restore before the next:
//! option validation, backup format check, local file and pod verification,
//! then extraction with the backup file wired directly to the remote
//! process's stdin.

mod validation;

pub use validation::{
    system_directory_warning, validate_backup_format, validate_restore_options,
    validate_target_path, verify_backup_file, SYSTEM_DIRECTORIES,
};

use crate::command;
use crate::exec::{BoxedReader, KubectlExec, LossyLines, ProcessControl, RemoteExec, RemoteProcess};
use crate::progress::{parse_restore_line, ProgressEmitter, TarLine};
use podvault_core::{
    BackupMetadata, EngineConfig, Error, Progress, RestoreOptions, RestoreResult, Result,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Message of the final event of a successful restore
pub const RESTORE_COMPLETED: &str = "Restore completed successfully";

/// Restores local archives into running containers
pub struct RestoreEngine {
    exec: Arc<dyn RemoteExec>,
    config: EngineConfig,
}

/// Kubernetes pod list, reduced to what pod verification reads
#[derive(Debug, Deserialize)]
struct PodList {
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
}

#[derive(Debug, Deserialize)]
struct PodMetadata {
    name: String,
}

#[derive(Debug, Default)]
struct Extraction {
    files: u64,
    warnings: Vec<String>,
}

impl RestoreEngine {
    pub fn new(exec: Arc<dyn RemoteExec>, config: EngineConfig) -> Self {
        Self { exec, config }
    }

    /// Engine driving the kubectl binary named in `config`
    pub fn from_config(config: EngineConfig) -> Self {
        let exec = Arc::new(KubectlExec::new(config.kubectl.clone()));
        Self::new(exec, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Confirm `pod` exists in `namespace`.
    pub async fn verify_pod(&self, namespace: &str, pod: &str) -> Result<()> {
        let args = command::list_pods_args(namespace);
        let output = self
            .exec
            .output(&args)
            .await?
            .ensure_success(&self.exec.describe(&args))?;

        let pods: PodList = serde_json::from_slice(&output.stdout)?;
        if pods.items.iter().any(|p| p.metadata.name == pod) {
            debug!("Pod {}/{} found", namespace, pod);
            Ok(())
        } else {
            Err(Error::pod_not_found(namespace, pod))
        }
    }

    /// Run a restore.
    ///
    /// `metadata`, when the caller has it, is checked against the archive
    /// before anything touches the cluster. Cancelling `cancel` kills the
    /// remote process.
    pub async fn execute(
        &self,
        opts: &RestoreOptions,
        metadata: Option<&BackupMetadata>,
        progress: ProgressEmitter,
        cancel: CancellationToken,
    ) -> Result<RestoreResult> {
        let span = info_span!("restore", id = %Uuid::new_v4(), pod = %opts.pod);
        self.run(opts, metadata, progress, cancel)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        opts: &RestoreOptions,
        metadata: Option<&BackupMetadata>,
        progress: ProgressEmitter,
        cancel: CancellationToken,
    ) -> Result<RestoreResult> {
        let started = Instant::now();
        let mut warnings = Vec::new();

        validate_restore_options(opts)?;
        if let Some(warning) = system_directory_warning(&opts.target_path) {
            warn!("{}", warning);
            warnings.push(warning);
        }

        validate_backup_format(opts, metadata)?;

        let bytes = verify_backup_file(opts).await?;
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            verified = self.verify_pod(&opts.namespace, &opts.pod) => verified?,
        }

        info!(
            "Restoring {} into {}/{}:{}",
            opts.backup_file, opts.namespace, opts.pod, opts.target_path
        );

        let stdin = tokio::fs::File::open(&opts.backup_file)
            .await
            .map_err(|e| Error::stream("backup file open", e))?
            .into_std()
            .await;

        let args = command::restore_args(opts);
        let RemoteProcess {
            stdout,
            stderr,
            mut control,
        } = self.exec.spawn(&args, Some(stdin)).await?;

        let streams = async {
            tokio::join!(
                drain_stdout(stdout),
                scan_stderr(stderr, progress.clone())
            )
            .1
        };
        let extraction = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            extraction = streams => Some(extraction),
        };
        let Some(extraction) = extraction else {
            warn!("Restore cancelled, terminating remote process");
            terminate(control.as_mut()).await;
            return Err(Error::Cancelled);
        };

        let waited = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = control.wait() => Some(result),
        };
        match waited {
            Some(result) => result?,
            None => {
                warn!("Restore cancelled, terminating remote process");
                terminate(control.as_mut()).await;
                return Err(Error::Cancelled);
            }
        }

        warnings.extend(extraction.warnings);
        progress.emit(Progress::new(100, 100, RESTORE_COMPLETED));
        info!(
            "Restore complete: {} entries into {}",
            extraction.files, opts.target_path
        );

        Ok(RestoreResult {
            success: true,
            restored_path: opts.target_path.clone(),
            file_count: extraction.files,
            bytes_written: bytes,
            duration: started.elapsed(),
            warnings,
        })
    }
}

async fn drain_stdout(mut stdout: BoxedReader) {
    if let Err(e) = tokio::io::copy(&mut stdout, &mut tokio::io::sink()).await {
        debug!("Stopped draining tar stdout: {}", e);
    }
}

async fn scan_stderr(stderr: BoxedReader, progress: ProgressEmitter) -> Extraction {
    let mut lines = LossyLines::new(stderr);
    let mut extraction = Extraction::default();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_restore_line(&line) {
                TarLine::Entry(path) => {
                    extraction.files += 1;
                    progress.emit(Progress::unbounded(
                        extraction.files as i64,
                        format!("Restoring: {}", path),
                    ));
                }
                TarLine::Notice(msg) => {
                    warn!("tar: {}", msg);
                    progress.emit(Progress::unbounded(extraction.files as i64, msg));
                    extraction.warnings.push(msg.to_string());
                }
                TarLine::Blank => {}
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read tar output: {}", e);
                break;
            }
        }
    }

    extraction
}

async fn terminate(control: &mut dyn ProcessControl) {
    if let Err(e) = control.kill().await {
        warn!("Failed to kill remote process: {}", e);
    }
}
