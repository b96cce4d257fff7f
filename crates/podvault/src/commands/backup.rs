//! Backup command

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use podvault_backup::{BackupProvider, KubectlExec, ProviderRegistry};
use podvault_core::{format_bytes, BackupMetadata, BackupOptions, FILESYSTEM_PROVIDER};
use std::sync::Arc;

use crate::output;

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Pod to back up
    pub pod: String,

    /// Directory inside the container
    pub path: String,

    /// Namespace of the pod
    #[arg(short, long, default_value = "default")]
    pub namespace: String,

    /// Container within the pod
    #[arg(short, long)]
    pub container: Option<String>,

    /// Archive to write (defaults to <pod>-<timestamp>.tar[.gz])
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,

    /// Gzip the archive inside the container
    #[arg(short = 'z', long)]
    pub compress: bool,

    /// Exclude pattern passed to tar (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Skip the SHA-256 checksum
    #[arg(long)]
    pub no_checksum: bool,

    /// Write backup metadata as JSON next to the archive
    #[arg(long)]
    pub write_metadata: bool,
}

pub async fn run(args: BackupArgs, config: Option<&Utf8Path>, quiet: bool) -> Result<()> {
    let mut config = super::load_config(config)?;
    if args.no_checksum {
        config = config.with_checksum(false);
    }

    let output_file = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_name(&args.pod, args.compress));

    let mut opts = BackupOptions::new(&args.namespace, &args.pod, &args.path, output_file)
        .with_compression(args.compress);
    if let Some(container) = &args.container {
        opts = opts.with_container(container);
    }
    for pattern in &args.exclude {
        opts = opts.with_exclude(pattern);
    }

    let exec = Arc::new(KubectlExec::new(config.kubectl.clone()));
    let provider = ProviderRegistry::with_defaults().create(FILESYSTEM_PROVIDER, exec, config)?;
    provider.validate_options(&opts)?;

    if !quiet {
        output::header("Backup");
        output::kv("Pod", &format!("{}/{}", opts.namespace, opts.pod));
        if let Some(container) = &opts.container {
            output::kv("Container", container);
        }
        output::kv("Source", &opts.source_path);
        output::kv("Output", opts.output_file.as_str());
        println!();
    }

    let (progress, rx) = provider.stream_progress();
    let renderer = output::render_progress(rx, quiet);
    let cancel = super::cancel_on_ctrl_c();

    let result = provider.execute(&opts, progress, cancel).await;
    renderer.await.ok();
    let result = result.context("Backup failed")?;

    if args.write_metadata {
        let metadata = BackupMetadata::from_backup(&opts, &result);
        let path = metadata_path(&result.output_file);
        std::fs::write(&path, metadata.to_json()?)
            .with_context(|| format!("Failed to write metadata to {}", path))?;
        if !quiet {
            output::info(&format!("Metadata written to {}", path));
        }
    }

    if !quiet {
        output::success("Backup created successfully");
        println!();
        output::kv("Location", result.output_file.as_str());
        output::kv("Size", &format_bytes(result.size_bytes));
        if let Some(checksum) = &result.checksum {
            output::kv("SHA-256", checksum);
        }
        output::kv(
            "Duration",
            &format!("{:.1}s", result.duration().as_secs_f64()),
        );
        println!();
        output::info("Restore with:");
        println!(
            "  podvault restore {} {} --namespace {} --target {}",
            result.output_file, opts.pod, opts.namespace, opts.source_path
        );
    }

    Ok(())
}

/// `<pod>-<timestamp>.tar` or `.tar.gz` in the working directory
fn default_output_name(pod: &str, compress: bool) -> Utf8PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let ext = if compress { "tar.gz" } else { "tar" };
    Utf8PathBuf::from(format!("{}-{}.{}", pod, timestamp, ext))
}

/// Metadata sidecar path for an archive
pub(crate) fn metadata_path(archive: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{}.json", archive))
}
