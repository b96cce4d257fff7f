//! Remote-exec process streaming.
//!
//! [`RemoteExec`] is the seam between the engines and `kubectl`. A spawned
//! [`RemoteProcess`] exposes stdout and stderr as async byte streams and a
//! control handle to wait for or kill the process. Payload bytes are never
//! collected in memory; only the short helper commands run through
//! [`RemoteExec::output`] are captured whole.

use async_trait::async_trait;
use podvault_core::{Error, Result};
use std::fs::File;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

/// Boxed async byte stream from a remote process
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Wait for or terminate a running remote process
#[async_trait]
pub trait ProcessControl: Send {
    /// Block until the process exits; non-zero exit is an error.
    async fn wait(&mut self) -> Result<()>;

    /// Kill the process and reap it.
    async fn kill(&mut self) -> Result<()>;
}

/// A running remote-exec process
pub struct RemoteProcess {
    pub stdout: BoxedReader,
    pub stderr: BoxedReader,
    pub control: Box<dyn ProcessControl>,
}

/// Captured output of a short-lived command
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub success: bool,
    pub status: String,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ExecOutput {
    /// Stdout as lossy UTF-8
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Turn an unsuccessful exit into [`Error::CommandFailed`].
    pub fn ensure_success(self, command: &str) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            let stderr = self.stderr.trim();
            let status = if stderr.is_empty() {
                self.status.clone()
            } else {
                format!("{}: {}", self.status, stderr)
            };
            Err(Error::command_failed(command, status))
        }
    }
}

/// Line reader over process output that tolerates non-UTF-8 bytes.
///
/// Archive member names are arbitrary bytes; they are decoded lossily
/// instead of aborting the scan.
pub struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Next line including its terminator, or `None` at end of stream.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

/// Runs commands against the cluster
#[async_trait]
pub trait RemoteExec: Send + Sync {
    /// Start a streaming process. `stdin`, when given, becomes the process's
    /// standard input directly.
    async fn spawn(&self, args: &[String], stdin: Option<File>) -> Result<RemoteProcess>;

    /// Run a command to completion and capture its output.
    async fn output(&self, args: &[String]) -> Result<ExecOutput>;

    /// Human-readable command line for logs and errors
    fn describe(&self, args: &[String]) -> String {
        format!("kubectl {}", args.join(" "))
    }
}

/// [`RemoteExec`] backed by the kubectl binary
#[derive(Debug, Clone)]
pub struct KubectlExec {
    program: String,
}

impl KubectlExec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for KubectlExec {
    fn default() -> Self {
        Self::new(podvault_core::config::DEFAULT_KUBECTL)
    }
}

#[async_trait]
impl RemoteExec for KubectlExec {
    async fn spawn(&self, args: &[String], stdin: Option<File>) -> Result<RemoteProcess> {
        let command = self.describe(args);
        debug!("Spawning: {}", command);

        let stdin = match stdin {
            Some(file) => Stdio::from(file),
            None => Stdio::null(),
        };

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::spawn(&command, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::spawn(&command, std::io::Error::other("stdout not piped")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::spawn(&command, std::io::Error::other("stderr not piped")))?;

        Ok(RemoteProcess {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            control: Box::new(ChildControl { child, command }),
        })
    }

    async fn output(&self, args: &[String]) -> Result<ExecOutput> {
        let command = self.describe(args);
        debug!("Running: {}", command);

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::spawn(&command, e))?;

        Ok(ExecOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }
}

struct ChildControl {
    child: Child,
    command: String,
}

#[async_trait]
impl ProcessControl for ChildControl {
    async fn wait(&mut self) -> Result<()> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| Error::stream("process wait", e))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::command_failed(&self.command, status.to_string()))
        }
    }

    async fn kill(&mut self) -> Result<()> {
        self.child.kill().await?;
        Ok(())
    }
}
