//! SHA-256 checksums over streamed archive bytes.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::AsyncWrite;

/// Writer that calculates a SHA-256 checksum while writing.
///
/// Only the bytes the inner sink accepted are hashed, so after the final
/// write `sum()` is the checksum of exactly what was committed. The writer
/// is meant to be owned by a single task; it takes `&mut self` for every
/// write and holds no lock.
#[derive(Debug)]
pub struct ChecksumWriter<W> {
    inner: W,
    hasher: Option<Sha256>,
    bytes_written: u64,
}

impl<W> ChecksumWriter<W> {
    /// Wrap `inner`, hashing everything written through it.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Some(Sha256::new()),
            bytes_written: 0,
        }
    }

    /// Wrap `inner` without hashing; only bytes are counted.
    pub fn disabled(inner: W) -> Self {
        Self {
            inner,
            hasher: None,
            bytes_written: 0,
        }
    }

    /// Hex digest of the bytes written so far, if hashing is enabled.
    pub fn sum(&self) -> Option<String> {
        self.hasher
            .as_ref()
            .map(|hasher| format!("{:x}", hasher.clone().finalize()))
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for ChecksumWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let n = ready!(Pin::new(&mut this.inner).poll_write(cx, buf))?;
        if let Some(hasher) = this.hasher.as_mut() {
            hasher.update(&buf[..n]);
        }
        this.bytes_written += n as u64;
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// Calculates the SHA-256 checksum of a file on disk.
pub fn calculate_checksum(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
