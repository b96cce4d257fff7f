//! kubectl argument construction.
//!
//! Every command is built as an argument vector and handed to the process
//! layer as-is; nothing is ever joined into a shell string.

use crate::compression::Compression;
use podvault_core::{BackupOptions, RestoreOptions};

/// Arguments for streaming a tar archive of `source_path` to stdout.
///
/// `v` is always set so stderr carries one line per archived entry.
pub fn backup_args(opts: &BackupOptions) -> Vec<String> {
    let mut args = exec_prefix(&opts.namespace, &opts.pod, opts.container.as_deref(), false);

    args.push("tar".to_string());
    args.push(if opts.compress { "-czvf" } else { "-cvf" }.to_string());
    args.push("-".to_string());
    args.extend(opts.exclude.iter().map(|p| format!("--exclude={}", p)));
    args.push("-C".to_string());
    args.push("/".to_string());
    args.push(opts.source_path.trim_start_matches('/').to_string());

    args
}

/// Arguments for extracting a tar archive read from stdin into `target_path`.
pub fn restore_args(opts: &RestoreOptions) -> Vec<String> {
    let compression = Compression::detect(opts.backup_file.as_str());
    let mut args = exec_prefix(&opts.namespace, &opts.pod, opts.container.as_deref(), true);

    args.push("tar".to_string());
    args.push(compression.extract_flag().to_string());
    args.push("-".to_string());
    args.push("-C".to_string());
    args.push(opts.target_path.clone());
    if !opts.overwrite {
        args.push("--keep-old-files".to_string());
    }
    if opts.preserve_perms {
        args.push("-p".to_string());
    }
    args.extend(opts.skip_paths.iter().map(|p| format!("--exclude={}", p)));

    args
}

/// Arguments for `du -sb <path>` inside the container.
pub fn size_probe_args(
    namespace: &str,
    pod: &str,
    container: Option<&str>,
    path: &str,
) -> Vec<String> {
    let mut args = exec_prefix(namespace, pod, container, false);
    args.extend(["du", "-sb", path].map(String::from));
    args
}

/// Arguments for listing the pods of a namespace as JSON.
pub fn list_pods_args(namespace: &str) -> Vec<String> {
    ["get", "pods", "-n", namespace, "-o", "json"]
        .map(String::from)
        .to_vec()
}

fn exec_prefix(namespace: &str, pod: &str, container: Option<&str>, stdin: bool) -> Vec<String> {
    let mut args = vec!["exec".to_string()];
    if stdin {
        args.push("-i".to_string());
    }
    args.push("-n".to_string());
    args.push(namespace.to_string());
    args.push(pod.to_string());
    if let Some(container) = container {
        args.push("-c".to_string());
        args.push(container.to_string());
    }
    args.push("--".to_string());
    args
}
