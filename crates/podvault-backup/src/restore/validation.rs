//! Pre-flight checks for restore: options, backup format and local file.

use crate::compression::{is_supported_archive, SUPPORTED_EXTENSIONS};
use podvault_core::{BackupMetadata, Error, RestoreOptions, Result, FILESYSTEM_PROVIDER};
use std::path::Component;
use tokio::fs;

/// Targets that are allowed but deserve a warning
pub const SYSTEM_DIRECTORIES: &[&str] = &[
    "/", "/bin", "/boot", "/dev", "/etc", "/lib", "/proc", "/root", "/sbin", "/sys", "/usr",
    "/var",
];

/// Reject options missing a required field or with an unsafe target path.
pub fn validate_restore_options(opts: &RestoreOptions) -> Result<()> {
    let required = [
        ("namespace", opts.namespace.as_str()),
        ("pod", opts.pod.as_str()),
        ("backup file", opts.backup_file.as_str()),
        ("target path", opts.target_path.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(Error::validation(format!("{} is required", field)));
        }
    }

    validate_target_path(&opts.target_path)
}

/// Target paths must be absolute and free of `..` segments.
pub fn validate_target_path(target: &str) -> Result<()> {
    if !target.starts_with('/') {
        return Err(Error::validation(format!(
            "target path must be absolute: {}",
            target
        )));
    }

    if std::path::Path::new(target)
        .components()
        .any(|c| c == Component::ParentDir)
    {
        return Err(Error::validation(format!(
            "target path cannot contain '..': {}",
            target
        )));
    }

    Ok(())
}

/// Warning for restores into a well-known system directory.
pub fn system_directory_warning(target: &str) -> Option<String> {
    let normalized = match target.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    SYSTEM_DIRECTORIES
        .contains(&normalized)
        .then(|| format!("restoring to system directory {}", normalized))
}

/// Check the archive extension and, when supplied, the recorded provider.
pub fn validate_backup_format(
    opts: &RestoreOptions,
    metadata: Option<&BackupMetadata>,
) -> Result<()> {
    if !is_supported_archive(opts.backup_file.as_str()) {
        tracing::debug!(
            "Rejected {}, supported extensions: {}",
            opts.backup_file,
            SUPPORTED_EXTENSIONS.join(", ")
        );
        return Err(Error::unsupported_format(opts.backup_file.as_str()));
    }

    if let Some(metadata) = metadata {
        if metadata.provider_type != FILESYSTEM_PROVIDER {
            return Err(Error::provider_mismatch(
                FILESYSTEM_PROVIDER,
                &metadata.provider_type,
            ));
        }
    }

    Ok(())
}

/// Stat the local backup file; returns its size.
pub async fn verify_backup_file(opts: &RestoreOptions) -> Result<u64> {
    let meta = match fs::metadata(&opts.backup_file).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::BackupFileNotFound {
                path: opts.backup_file.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !meta.is_file() {
        return Err(Error::NotARegularFile {
            path: opts.backup_file.to_string(),
        });
    }

    Ok(meta.len())
}
