//! Progress events for backup and restore operations.
//!
//! Engines publish [`Progress`] values on a bounded `tokio::sync::mpsc`
//! channel. The sending side never blocks: when the consumer lags and the
//! buffer is full the event is dropped and counted. The channel closes once
//! every [`ProgressEmitter`] clone has been dropped, which happens when the
//! engine call that owns it returns.
//!
//! Byte-count events (archive stdout) and file-count events (tar stderr)
//! are each ordered on their own axis, but are not ordered relative to each
//! other.

use podvault_core::{format_bytes, Progress};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::{Duration, Instant};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace};

/// Create a progress channel with the given buffer capacity.
///
/// A capacity of zero is raised to one.
pub fn progress_channel(capacity: usize) -> (ProgressEmitter, mpsc::Receiver<Progress>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ProgressEmitter {
            tx: Some(tx),
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

/// Non-blocking publisher of progress events.
#[derive(Debug, Clone)]
pub struct ProgressEmitter {
    tx: Option<mpsc::Sender<Progress>>,
    dropped: Arc<AtomicU64>,
}

impl ProgressEmitter {
    /// Emitter that discards every event.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish an event without waiting for buffer space.
    pub fn emit(&self, progress: Progress) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(progress) {
            Ok(()) => {}
            Err(TrySendError::Full(progress)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(
                    "Progress consumer lagging, dropped event ({} total): {}",
                    dropped, progress.message
                );
            }
            Err(TrySendError::Closed(_)) => {
                trace!("Progress receiver closed, discarding event");
            }
        }
    }

    /// Events discarded because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// A classified line of tar's verbose stderr output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TarLine<'a> {
    /// One archived or extracted entry
    Entry(&'a str),
    /// A `tar:` diagnostic with the program prefix removed; reported, never
    /// fatal on its own
    Notice(&'a str),
    /// Blank line
    Blank,
}

/// Classify a stderr line from `tar -c...v`.
///
/// `tar: <msg>` is a notice carrying `<msg>`; any other non-empty line is
/// an archived path.
pub fn parse_backup_line(line: &str) -> TarLine<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        TarLine::Blank
    } else if let Some(msg) = line.strip_prefix("tar: ") {
        TarLine::Notice(msg)
    } else {
        TarLine::Entry(line)
    }
}

/// Classify a stderr line from `tar -x...v`.
///
/// bsdtar prefixes entries with `x `; GNU tar prints the bare path. Any
/// line containing `tar:` is a notice carrying the text after it, so
/// `bsdtar: <msg>` and `tar: <msg>` both yield `<msg>`.
pub fn parse_restore_line(line: &str) -> TarLine<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        TarLine::Blank
    } else if let Some(path) = line.strip_prefix("x ") {
        TarLine::Entry(path)
    } else if let Some((_, msg)) = line.split_once("tar:") {
        TarLine::Notice(msg.trim_start())
    } else {
        TarLine::Entry(line)
    }
}

/// Estimated time remaining given the bytes done so far.
pub fn estimate_eta(done: u64, total: u64, elapsed: Duration) -> Option<Duration> {
    if done == 0 || total == 0 || elapsed.is_zero() {
        return None;
    }
    if done >= total {
        return Some(Duration::ZERO);
    }
    let rate = done as f64 / elapsed.as_secs_f64();
    Some(Duration::from_secs_f64((total - done) as f64 / rate))
}

/// Format a duration as `1h02m`, `3m05s` or `12s`.
pub fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

/// Message for a byte-count event, e.g. `1.0 MB / 2.0 MB (50%, ETA 4s)`.
pub fn byte_progress_message(done: u64, total: u64, elapsed: Duration) -> String {
    if total == 0 {
        return format!("{} written", format_bytes(done));
    }
    let pct = (done as f64 / total as f64 * 100.0).min(100.0) as u8;
    match estimate_eta(done, total, elapsed) {
        Some(eta) => format!(
            "{} / {} ({}%, ETA {})",
            format_bytes(done),
            format_bytes(total),
            pct,
            format_eta(eta)
        ),
        None => format!("{} / {} ({}%)", format_bytes(done), format_bytes(total), pct),
    }
}

/// Sink that emits a byte-count event for every successful write.
///
/// `total` is the estimated size; the archive may end up larger or smaller
/// than the estimate, `current` is always the true cumulative count.
#[derive(Debug)]
pub struct ProgressWriter<W> {
    inner: W,
    emitter: ProgressEmitter,
    total: u64,
    written: u64,
    started: Instant,
}

impl<W> ProgressWriter<W> {
    pub fn new(inner: W, emitter: ProgressEmitter, total: u64) -> Self {
        Self {
            inner,
            emitter,
            total,
            written: 0,
            started: Instant::now(),
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for ProgressWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let n = ready!(Pin::new(&mut this.inner).poll_write(cx, buf))?;
        if n > 0 {
            this.written += n as u64;
            this.emitter.emit(Progress::new(
                this.written as i64,
                this.total as i64,
                byte_progress_message(this.written, this.total, this.started.elapsed()),
            ));
        }
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
