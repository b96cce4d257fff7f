//! Backup engine: stream a tar archive out of a container into a local file.
//!
//! Stages: validate options, estimate the remote size (best-effort), spawn
//! `kubectl exec ... tar -c`, copy stdout into `<output>.tmp` while scanning
//! stderr, wait for the process, then fsync and rename into place. The temp
//! file is removed on every failure path, including cancellation.

use crate::artifact::PendingArtifact;
use crate::checksum::ChecksumWriter;
use crate::command;
use crate::exec::{
    BoxedReader, KubectlExec, LossyLines, ProcessControl, RemoteExec, RemoteProcess,
};
use crate::progress::{
    byte_progress_message, parse_backup_line, ProgressEmitter, ProgressWriter, TarLine,
};
use chrono::Utc;
use podvault_core::{BackupOptions, BackupResult, EngineConfig, Error, Progress, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Message of the final event of a successful backup
pub const BACKUP_COMPLETED: &str = "Backup completed successfully";

/// Streams container filesystems into local archives
pub struct BackupEngine {
    exec: Arc<dyn RemoteExec>,
    config: EngineConfig,
}

struct CopyOutcome {
    bytes: u64,
    checksum: Option<String>,
    file: File,
}

impl BackupEngine {
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

    /// Reject options missing a required field.
    pub fn validate_options(opts: &BackupOptions) -> Result<()> {
        let required = [
            ("namespace", opts.namespace.as_str()),
            ("pod", opts.pod.as_str()),
            ("source path", opts.source_path.as_str()),
            ("output file", opts.output_file.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{} is required", field)));
            }
        }
        Ok(())
    }

    /// Size in bytes of the source path, from `du -sb` in the container.
    pub async fn estimate_size(&self, opts: &BackupOptions) -> Result<u64> {
        let args = command::size_probe_args(
            &opts.namespace,
            &opts.pod,
            opts.container.as_deref(),
            &opts.source_path,
        );
        let output = self
            .exec
            .output(&args)
            .await?
            .ensure_success(&self.exec.describe(&args))?;
        parse_size_output(&output.stdout_lossy())
    }

    /// Run a backup.
    ///
    /// Events are published on `progress`; the channel closes when this
    /// returns and the caller drops its own emitter clones. Cancelling
    /// `cancel` kills the remote process and removes the temp file.
    pub async fn execute(
        &self,
        opts: &BackupOptions,
        progress: ProgressEmitter,
        cancel: CancellationToken,
    ) -> Result<BackupResult> {
        let span = info_span!("backup", id = %Uuid::new_v4(), pod = %opts.pod);
        self.run(opts, progress, cancel).instrument(span).await
    }

    async fn run(
        &self,
        opts: &BackupOptions,
        progress: ProgressEmitter,
        cancel: CancellationToken,
    ) -> Result<BackupResult> {
        Self::validate_options(opts)?;
        info!(
            "Backing up {}/{}:{} to {}",
            opts.namespace, opts.pod, opts.source_path, opts.output_file
        );

        let total = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            total = self.estimate_total(opts) => total,
        };

        let started_at = Utc::now();
        let args = command::backup_args(opts);
        let RemoteProcess {
            stdout,
            stderr,
            mut control,
        } = self.exec.spawn(&args, None).await?;

        let (artifact, file) = match PendingArtifact::create(&opts.temp_file()).await {
            Ok(created) => created,
            Err(e) => {
                terminate(control.as_mut()).await;
                return Err(e);
            }
        };

        // Stops the stderr scan when the copy fails or the caller cancels,
        // so a remote process blocked on a full stdout pipe cannot hang us.
        let abort = cancel.child_token();

        let copy = async {
            let result = tokio::select! {
                biased;
                () = abort.cancelled() => Err(Error::Cancelled),
                result = copy_archive(
                    stdout,
                    file,
                    total,
                    self.config.checksum,
                    progress.clone(),
                ) => result,
            };
            if result.is_err() {
                abort.cancel();
            }
            result
        };
        let scan = scan_stderr(stderr, progress.clone(), abort.clone());

        let (copied, files) = tokio::join!(copy, scan);

        if cancel.is_cancelled() {
            warn!("Backup cancelled, terminating remote process");
            terminate(control.as_mut()).await;
            return Err(Error::Cancelled);
        }

        let outcome = match copied {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Archive stream failed: {}", e);
                terminate(control.as_mut()).await;
                return Err(e);
            }
        };

        let waited = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = control.wait() => Some(result),
        };
        match waited {
            Some(result) => result?,
            None => {
                warn!("Backup cancelled, terminating remote process");
                terminate(control.as_mut()).await;
                return Err(Error::Cancelled);
            }
        }

        debug!("Remote tar finished: {} entries, {} bytes", files, outcome.bytes);

        let CopyOutcome {
            bytes,
            checksum,
            file,
        } = outcome;
        if self.config.sync_on_commit {
            file.sync_all()
                .await
                .map_err(|e| Error::stream("temp file sync", e))?;
        }
        drop(file);

        artifact.commit(&opts.output_file).await?;
        progress.emit(Progress::new(100, 100, BACKUP_COMPLETED));

        let finished_at = Utc::now();
        info!(
            "Backup complete: {} ({} bytes, {} entries)",
            opts.output_file, bytes, files
        );

        Ok(BackupResult {
            output_file: opts.output_file.clone(),
            size_bytes: bytes,
            checksum,
            started_at,
            finished_at,
        })
    }

    async fn estimate_total(&self, opts: &BackupOptions) -> Option<u64> {
        if !self.config.estimate_size {
            return None;
        }
        match self.estimate_size(opts).await {
            Ok(0) => None,
            Ok(size) => {
                debug!("Estimated source size: {} bytes", size);
                Some(size)
            }
            Err(e) => {
                warn!("Size estimate unavailable, reporting bytes only: {}", e);
                None
            }
        }
    }
}

/// Parse `du -sb` output: the first whitespace-delimited token in bytes.
pub fn parse_size_output(output: &str) -> Result<u64> {
    output
        .split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| Error::SizeParse {
            output: output.trim().to_string(),
        })
}

async fn copy_archive(
    mut stdout: BoxedReader,
    file: File,
    total: Option<u64>,
    checksum: bool,
    progress: ProgressEmitter,
) -> Result<CopyOutcome> {
    let file = BufWriter::new(file);
    let mut sink = if checksum {
        ChecksumWriter::new(file)
    } else {
        ChecksumWriter::disabled(file)
    };

    let bytes = match total {
        Some(total) => {
            let mut writer = ProgressWriter::new(&mut sink, progress, total);
            let bytes = tokio::io::copy(&mut stdout, &mut writer)
                .await
                .map_err(|e| Error::stream("archive copy", e))?;
            writer
                .flush()
                .await
                .map_err(|e| Error::stream("archive flush", e))?;
            bytes
        }
        None => {
            let bytes = tokio::io::copy(&mut stdout, &mut sink)
                .await
                .map_err(|e| Error::stream("archive copy", e))?;
            sink.flush()
                .await
                .map_err(|e| Error::stream("archive flush", e))?;
            progress.emit(Progress::unbounded(
                bytes as i64,
                byte_progress_message(bytes, 0, Duration::ZERO),
            ));
            bytes
        }
    };

    let checksum = sink.sum();
    let file = sink.into_inner().into_inner();
    Ok(CopyOutcome {
        bytes,
        checksum,
        file,
    })
}

async fn scan_stderr(
    stderr: BoxedReader,
    progress: ProgressEmitter,
    abort: CancellationToken,
) -> u64 {
    let mut lines = LossyLines::new(stderr);
    let mut files: u64 = 0;

    loop {
        let line = tokio::select! {
            biased;
            () = abort.cancelled() => break,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) => match parse_backup_line(&line) {
                TarLine::Entry(path) => {
                    files += 1;
                    progress.emit(Progress::unbounded(
                        files as i64,
                        format!("Backing up: {}", path),
                    ));
                }
                TarLine::Notice(msg) => {
                    warn!("tar: {}", msg);
                    progress.emit(Progress::unbounded(files as i64, msg));
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

    files
}

async fn terminate(control: &mut dyn ProcessControl) {
    if let Err(e) = control.kill().await {
        warn!("Failed to kill remote process: {}", e);
    }
}
