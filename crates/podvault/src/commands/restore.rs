//! Restore command
//!
//! Connects the CLI restore UI to the podvault-backup restore engine.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use podvault_backup::{progress_channel, RestoreEngine};
use podvault_core::{format_bytes, BackupMetadata, RestoreOptions};
use tracing::debug;

use super::backup::metadata_path;
use crate::output;

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Archive to restore (.tar, .tar.gz, .tgz, .tar.bz2, .tar.xz)
    pub backup_file: Utf8PathBuf,

    /// Pod to restore into
    pub pod: String,

    /// Absolute directory inside the container to extract into
    #[arg(short, long)]
    pub target: String,

    /// Namespace of the pod
    #[arg(short, long, default_value = "default")]
    pub namespace: String,

    /// Container within the pod
    #[arg(short, long)]
    pub container: Option<String>,

    /// Overwrite existing files in the target
    #[arg(long)]
    pub overwrite: bool,

    /// Preserve permissions recorded in the archive
    #[arg(short, long)]
    pub preserve_perms: bool,

    /// Archive member to skip (repeatable)
    #[arg(long)]
    pub skip: Vec<String>,

    /// Backup metadata JSON (defaults to <backup_file>.json when present)
    #[arg(short, long)]
    pub metadata: Option<Utf8PathBuf>,
}

pub async fn run(args: RestoreArgs, config: Option<&Utf8Path>, quiet: bool) -> Result<()> {
    let config = super::load_config(config)?;
    let metadata = load_metadata(&args.backup_file, args.metadata.as_deref())?;

    let mut opts = RestoreOptions::new(&args.namespace, &args.pod, &args.backup_file, &args.target)
        .with_overwrite(args.overwrite)
        .with_preserve_perms(args.preserve_perms);
    if let Some(container) = &args.container {
        opts = opts.with_container(container);
    }
    for path in &args.skip {
        opts = opts.with_skip_path(path);
    }

    if !quiet {
        output::header("Restore");
        output::kv("Backup", opts.backup_file.as_str());
        output::kv("Pod", &format!("{}/{}", opts.namespace, opts.pod));
        if let Some(container) = &opts.container {
            output::kv("Container", container);
        }
        output::kv("Target", &opts.target_path);
        if let Some(metadata) = &metadata {
            output::kv(
                "Created",
                &metadata.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            );
            output::kv(
                "Source",
                &format!("{}/{}:{}", metadata.namespace, metadata.pod, metadata.source_path),
            );
        }
        if !opts.overwrite {
            output::info("Existing files are kept; use --overwrite to replace them");
        }
        println!();
    }

    let engine = RestoreEngine::from_config(config);
    let (progress, rx) = progress_channel(engine.config().progress_capacity);
    let renderer = output::render_progress(rx, quiet);
    let cancel = super::cancel_on_ctrl_c();

    let result = engine
        .execute(&opts, metadata.as_ref(), progress, cancel)
        .await;
    renderer.await.ok();
    let result = result.context("Restore failed")?;

    if !quiet {
        for warning in &result.warnings {
            output::warning(warning);
        }
        output::success("Restore completed successfully");
        println!();
        output::kv("Restored to", &result.restored_path);
        output::kv("Entries", &result.file_count.to_string());
        output::kv("Archive size", &format_bytes(result.bytes_written));
        output::kv("Duration", &format!("{:.1}s", result.duration.as_secs_f64()));
    }

    Ok(())
}

/// Read metadata from `explicit`, or from the sidecar next to the archive.
///
/// An explicit path must exist; a missing sidecar just means no metadata.
fn load_metadata(
    backup_file: &Utf8Path,
    explicit: Option<&Utf8Path>,
) -> Result<Option<BackupMetadata>> {
    let path = match explicit {
        Some(path) => path.to_owned(),
        None => {
            let sidecar = metadata_path(backup_file);
            if !sidecar.exists() {
                return Ok(None);
            }
            debug!("Using metadata sidecar {}", sidecar);
            sidecar
        }
    };

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read metadata {}", path))?;
    let metadata = BackupMetadata::from_json(&json)
        .with_context(|| format!("Invalid metadata in {}", path))?;
    Ok(Some(metadata))
}
