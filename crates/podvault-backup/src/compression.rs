//! Archive compression detection.
//!
//! Compression is inferred from the backup file name so the extracting tar
//! in the container is started with the matching decompression flag.

use std::fmt;

/// Archive extensions accepted for restore, longest first.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".tar.bz2", ".tar.gz", ".tar.xz", ".tgz", ".tar"];

/// Compression applied to a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl Compression {
    /// Detect compression from a file name suffix (case-insensitive).
    ///
    /// Unknown suffixes map to [`Compression::None`].
    pub fn detect(file_name: &str) -> Self {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Self::Gzip
        } else if lower.ends_with(".tar.bz2") {
            Self::Bzip2
        } else if lower.ends_with(".tar.xz") {
            Self::Xz
        } else {
            Self::None
        }
    }

    /// tar flag extracting this compression verbosely from stdin
    pub fn extract_flag(self) -> &'static str {
        match self {
            Self::None => "-xvf",
            Self::Gzip => "-xzvf",
            Self::Bzip2 => "-xjvf",
            Self::Xz => "-xJvf",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Gzip => write!(f, "gzip"),
            Self::Bzip2 => write!(f, "bzip2"),
            Self::Xz => write!(f, "xz"),
        }
    }
}

/// Whether the file name ends in one of [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_archive(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
