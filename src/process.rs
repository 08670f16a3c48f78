#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader},
    process::{Child, Command},
    task::JoinHandle,
    time::timeout,
};
use tracing::debug;

/// How long output pipes are drained after a timed out child was killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Drop guard that terminates a spawned child process if callers forget to
/// await it.
struct ChildDropGuard(Option<Child>);

impl ChildDropGuard {
    /// Wraps the provided child process with the drop guard.
    fn new(child: Child) -> Self {
        Self(Some(child))
    }

    /// Returns a mutable reference to the underlying child process.
    fn child_mut(&mut self) -> Result<&mut Child> {
        self.0
            .as_mut()
            .context("child process already taken from guard")
    }

    /// Prevents the guard from killing the process on drop.
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for ChildDropGuard {
    fn drop(&mut self) {
        if let Some(child) = self.0.as_mut() {
            let _ = child.start_kill();
        }
    }
}

/// Captured result of a subprocess.
#[derive(Debug)]
pub struct Collected {
    /// Exit status, `None` if the process was killed at its deadline.
    pub status:    Option<ExitStatus>,
    /// Contents written to stdout.
    pub stdout:    Vec<u8>,
    /// Contents written to stderr.
    pub stderr:    Vec<u8>,
    /// Whether the deadline expired before the process finished.
    pub timed_out: bool,
}

impl Collected {
    /// Exit code of the process, see [`exit_code`].
    pub fn exit_code(&self) -> Option<i32> {
        self.status.map(exit_code)
    }
}

/// Describes how stdin should be wired for the spawned process.
#[derive(Debug)]
pub enum StdinSource {
    /// Attach nothing to stdin.
    Null,
    /// Write the provided bytes, then close stdin.
    Bytes(Vec<u8>),
}

/// Maps an exit status to a single code. A process killed by a signal gets
/// `128 + signal`, as shells report it.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

/// Reads a pipe to the end on a separate task.
fn drain<R>(pipe: R, name: &'static str) -> JoinHandle<Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .with_context(|| format!("failed to read {name}"))?;
        Ok(buf)
    })
}

/// Waits for a drain task. When `grace` is given, a task still running after
/// it is abandoned and yields nothing; that happens when a killed process
/// left a grandchild holding the pipe open.
async fn finish_drain(
    task: JoinHandle<Result<Vec<u8>>>,
    name: &str,
    grace: Option<Duration>,
) -> Result<Vec<u8>> {
    match grace {
        None => task.await.with_context(|| format!("{name} task join error"))?,
        Some(limit) => {
            let abort = task.abort_handle();
            match timeout(limit, task).await {
                Ok(joined) => joined.with_context(|| format!("{name} task join error"))?,
                Err(_) => {
                    abort.abort();
                    debug!("gave up draining {name} of a killed process");
                    Ok(Vec::new())
                }
            }
        }
    }
}

/// Spawns a command, optionally feeds stdin, and collects stdout/stderr.
///
/// When `deadline` expires the process is killed and whatever it wrote so far
/// is returned with `timed_out` set. Only spawn and I/O failures are errors.
pub async fn run_collect(
    program: impl AsRef<OsStr>,
    args: &[OsString],
    stdin: StdinSource,
    cwd: Option<&Path>,
    deadline: Option<Duration>,
) -> Result<Collected> {
    let program = program.as_ref();
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match &stdin {
        StdinSource::Null => {
            cmd.stdin(Stdio::null());
        }
        StdinSource::Bytes(_) => {
            cmd.stdin(Stdio::piped());
        }
    }

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut guard = ChildDropGuard::new(
        cmd.spawn()
            .with_context(|| format!("failed to spawn {}", program.to_string_lossy()))?,
    );

    if let StdinSource::Bytes(bytes) = stdin
        && let Some(mut handle) = guard.child_mut()?.stdin.take()
    {
        tokio::spawn(async move {
            if !bytes.is_empty() {
                let _ = handle.write_all(&bytes).await;
            }
            let _ = handle.shutdown().await;
        });
    }

    let stdout = guard
        .child_mut()?
        .stdout
        .take()
        .context("missing stdout pipe")?;
    let stderr = guard
        .child_mut()?
        .stderr
        .take()
        .context("missing stderr pipe")?;
    let out_task = drain(stdout, "stdout");
    let err_task = drain(stderr, "stderr");

    let waited = {
        let child = guard.child_mut()?;
        match deadline {
            Some(limit) => timeout(limit, child.wait()).await.ok(),
            None => Some(child.wait().await),
        }
    };

    let (status, timed_out) = match waited {
        Some(status) => (Some(status.context("failed to wait on process")?), false),
        None => {
            guard
                .child_mut()?
                .kill()
                .await
                .context("failed to kill timed out process")?;
            (None, true)
        }
    };
    guard.disarm();

    let grace = timed_out.then_some(DRAIN_GRACE);
    let stdout = finish_drain(out_task, "stdout", grace).await?;
    let stderr = finish_drain(err_task, "stderr", grace).await?;

    Ok(Collected {
        status,
        stdout,
        stderr,
        timed_out,
    })
}
