//! Common test helpers for podvault-backup integration tests
//!
//! - `MockExec`: in-memory `RemoteExec` that records invocations and plays
//!   back canned stdout, stderr, exit status and helper-command output
//! - `FailingReader`: stdout that breaks partway through the archive
//! - fake `kubectl` shell scripts for end-to-end runs through real processes

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use podvault_backup::exec::BoxedReader;
use podvault_backup::{ExecOutput, ProcessControl, RemoteExec, RemoteProcess};
use podvault_core::{Error, Progress, Result};
use std::io::Read;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tempfile::TempDir;
use tokio::io::{AsyncRead, DuplexStream, ReadBuf};
use tokio::sync::mpsc;

// ─── Command Log ─────────────────────────────────────────────────────────────

/// Records of remote-exec invocations for verification.
/// Each entry is (kind, args) where kind is `spawn` or `output`.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct CommandLog {
    #[allow(clippy::type_complexity)]
    pub calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

#[allow(dead_code)]
impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: &str, args: &[String]) {
        let mut calls = self.calls.lock().unwrap();
        calls.push((kind.to_string(), args.to_vec()));
    }

    /// All argument vectors recorded for `kind`.
    pub fn calls_for(&self, kind: &str) -> Vec<Vec<String>> {
        let calls = self.calls.lock().unwrap();
        calls
            .iter()
            .filter(|(k, _)| k == kind)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn call_count(&self, kind: &str) -> usize {
        self.calls_for(kind).len()
    }

    /// Assert some `kind` call had an argument equal to each of `expected`.
    pub fn assert_called_with(&self, kind: &str, expected: &[&str]) {
        let calls = self.calls_for(kind);
        let matching = calls
            .iter()
            .any(|args| expected.iter().all(|e| args.iter().any(|a| a == e)));
        assert!(
            matching,
            "no '{}' call with args {:?}. Actual calls: {:?}",
            kind, expected, calls
        );
    }

    pub fn assert_not_called(&self, kind: &str) {
        let calls = self.calls_for(kind);
        assert!(
            calls.is_empty(),
            "'{}' was called but should not have been: {:?}",
            kind,
            calls
        );
    }
}

// ─── Mock Remote Exec ────────────────────────────────────────────────────────

/// What the mocked stdout of a spawned process does
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockStdout {
    /// Yield these bytes then end
    Bytes(Vec<u8>),
    /// Yield this many bytes then fail with the given message
    FailAfter(usize, String),
    /// Stay open until the process is killed
    Hang,
}

/// In-memory `RemoteExec` driven by canned responses.
#[allow(dead_code)]
pub struct MockExec {
    pub log: CommandLog,
    stdout: MockStdout,
    stderr: Vec<u8>,
    exit_status: Option<String>,
    spawn_error: Option<String>,
    outputs: Vec<(String, ExecOutput)>,
    killed: Arc<AtomicBool>,
    stdin: Arc<Mutex<Option<Vec<u8>>>>,
}

#[allow(dead_code)]
impl MockExec {
    pub fn new() -> Self {
        Self {
            log: CommandLog::new(),
            stdout: MockStdout::Bytes(Vec::new()),
            stderr: Vec::new(),
            exit_status: None,
            spawn_error: None,
            outputs: Vec::new(),
            killed: Arc::new(AtomicBool::new(false)),
            stdin: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_stdout(mut self, stdout: MockStdout) -> Self {
        self.stdout = stdout;
        self
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.as_bytes().to_vec();
        self
    }

    /// Make `wait()` fail as a non-zero exit with this status.
    pub fn with_exit_failure(mut self, status: &str) -> Self {
        self.exit_status = Some(status.to_string());
        self
    }

    pub fn with_spawn_error(mut self, message: &str) -> Self {
        self.spawn_error = Some(message.to_string());
        self
    }

    /// Successful helper output for commands whose joined args contain `pattern`.
    pub fn with_output(mut self, pattern: &str, stdout: &str) -> Self {
        self.outputs.push((
            pattern.to_string(),
            ExecOutput {
                success: true,
                status: "exit status: 0".to_string(),
                stdout: stdout.as_bytes().to_vec(),
                stderr: String::new(),
            },
        ));
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    /// Bytes the process received on stdin, if it was given a file.
    pub fn stdin_bytes(&self) -> Option<Vec<u8>> {
        self.stdin.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteExec for MockExec {
    async fn spawn(&self, args: &[String], stdin: Option<std::fs::File>) -> Result<RemoteProcess> {
        self.log.record("spawn", args);

        if let Some(message) = &self.spawn_error {
            return Err(Error::spawn(
                self.describe(args),
                std::io::Error::other(message.clone()),
            ));
        }

        if let Some(mut file) = stdin {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            *self.stdin.lock().unwrap() = Some(bytes);
        }

        let mut hold = None;
        let stdout: BoxedReader = match &self.stdout {
            MockStdout::Bytes(bytes) => Box::new(std::io::Cursor::new(bytes.clone())),
            MockStdout::FailAfter(n, message) => Box::new(FailingReader::new(*n, message)),
            MockStdout::Hang => {
                let (reader, writer) = tokio::io::duplex(64);
                hold = Some(writer);
                Box::new(reader)
            }
        };

        Ok(RemoteProcess {
            stdout,
            stderr: Box::new(std::io::Cursor::new(self.stderr.clone())),
            control: Box::new(MockControl {
                command: self.describe(args),
                exit_status: self.exit_status.clone(),
                killed: Arc::clone(&self.killed),
                hold,
            }),
        })
    }

    async fn output(&self, args: &[String]) -> Result<ExecOutput> {
        self.log.record("output", args);

        let joined = args.join(" ");
        let canned = self
            .outputs
            .iter()
            .find(|(pattern, _)| joined.contains(pattern.as_str()))
            .map(|(_, output)| output.clone());

        Ok(canned.unwrap_or_else(|| ExecOutput {
            success: false,
            status: "exit status: 1".to_string(),
            stdout: Vec::new(),
            stderr: format!("no canned output for: {}", joined),
        }))
    }
}

struct MockControl {
    command: String,
    exit_status: Option<String>,
    killed: Arc<AtomicBool>,
    hold: Option<DuplexStream>,
}

#[async_trait]
impl ProcessControl for MockControl {
    async fn wait(&mut self) -> Result<()> {
        match &self.exit_status {
            Some(status) => Err(Error::command_failed(&self.command, status.clone())),
            None => Ok(()),
        }
    }

    async fn kill(&mut self) -> Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        self.hold.take();
        Ok(())
    }
}

// ─── Failing Reader ──────────────────────────────────────────────────────────

/// Reader that yields `remaining` zero bytes and then fails.
pub struct FailingReader {
    remaining: usize,
    message: String,
}

impl FailingReader {
    pub fn new(bytes: usize, message: &str) -> Self {
        Self {
            remaining: bytes,
            message: message.to_string(),
        }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        if this.remaining == 0 {
            return Poll::Ready(Err(std::io::Error::other(this.message.clone())));
        }
        let n = this.remaining.min(buf.remaining());
        buf.put_slice(&vec![0u8; n]);
        this.remaining -= n;
        Poll::Ready(Ok(()))
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// Temp directory as a UTF-8 path; keep the `TempDir` alive for the test.
pub fn utf8_temp_dir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    (tmp, path)
}

/// Number of regular files directly inside `dir`.
#[allow(dead_code)]
pub fn file_count(dir: &Utf8Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .count()
}

/// Drain a progress receiver whose senders have all been dropped.
#[allow(dead_code)]
pub async fn collect_progress(mut rx: mpsc::Receiver<Progress>) -> Vec<Progress> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Pod list JSON as returned by `kubectl get pods -o json`.
#[allow(dead_code)]
pub fn pod_list_json(names: &[&str]) -> String {
    let items: Vec<String> = names
        .iter()
        .map(|name| format!(r#"{{"metadata":{{"name":"{}","namespace":"default"}}}}"#, name))
        .collect();
    format!(
        r#"{{"apiVersion":"v1","kind":"List","items":[{}]}}"#,
        items.join(",")
    )
}

// ─── Fake kubectl ────────────────────────────────────────────────────────────

/// Writes a fake `kubectl` script into `dir` and returns its path.
///
/// The script logs every invocation to `kubectl.log`, answers the size
/// probe and pod listing, streams a small binary archive for `tar -c`, and
/// for `tar -x` copies stdin to `restored.bin`. Extra `(pattern, exit)`
/// rules are checked first and make matching invocations fail.
#[cfg(unix)]
#[allow(dead_code)]
pub fn create_fake_kubectl(dir: &Utf8Path, failures: &[(&str, i32)]) -> Utf8PathBuf {
    let script_path = dir.join("kubectl");
    let log_path = dir.join("kubectl.log");
    let restored_path = dir.join("restored.bin");

    let mut script = format!(
        "#!/bin/sh\necho \"$*\" >> \"{log}\"\ncase \"$*\" in\n",
        log = log_path
    );
    for (pattern, exit_code) in failures {
        script.push_str(&format!(
            "  *\"{pattern}\"*) echo \"error: {pattern}\" >&2; exit {exit_code} ;;\n"
        ));
    }
    script.push_str(&format!(
        r#"  *"du -sb"*) printf '12\t/data\n' ;;
  *"get pods"*) printf '%s' '{pods}' ;;
  *"tar -c"*) printf 'tar\000\377payload'; printf 'tar: Removing leading `/'"'"' from member names\ndata/\ndata/a.txt\n' >&2 ;;
  *"tar -x"*) cat > "{restored}"; printf 'x data/\nx data/a.txt\n' >&2 ;;
  *) echo "unexpected: $*" >&2; exit 1 ;;
esac
"#,
        pods = pod_list_json(&["web-0"]),
        restored = restored_path,
    ));

    std::fs::write(&script_path, script).unwrap();
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    script_path
}

/// Writes a fake `kubectl` that hangs on invocations containing `pattern`.
///
/// `exec` replaces the shell so killing the child stops the sleep too.
#[cfg(unix)]
#[allow(dead_code)]
pub fn create_stalling_kubectl(dir: &Utf8Path, pattern: &str) -> Utf8PathBuf {
    let script_path = dir.join("kubectl");
    let script = format!(
        "#!/bin/sh\ncase \"$*\" in\n  *\"{pattern}\"*) exec sleep 30 ;;\n  *) echo \"unexpected: $*\" >&2; exit 1 ;;\nesac\n"
    );

    std::fs::write(&script_path, script).unwrap();
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    script_path
}

/// Bytes the fake `tar -c` writes to stdout.
#[allow(dead_code)]
pub const FAKE_ARCHIVE: &[u8] = b"tar\x00\xffpayload";

/// Read the fake kubectl invocation log.
#[allow(dead_code)]
pub fn read_kubectl_log(dir: &Utf8Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("kubectl.log"))
        .unwrap_or_default()
        .lines()
        .map(|s| s.to_string())
        .collect()
}
