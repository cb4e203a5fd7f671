//! Builder for executing external tool commands with timeout support.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output, unmodified (tools may emit binary data).
    pub stdout: Vec<u8>,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Standard output decoded as lossy UTF-8.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use rp_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> rp_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .arg("-v").arg("quiet")
///     .arg("-print_format").arg("json")
///     .arg("-show_format")
///     .arg("/path/to/video.mp4")
///     .execute()
///     .await?;
/// println!("{}", output.stdout_lossy());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// The arguments accumulated so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn build(&self, stdin: Stdio) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - Returns [`rp_core::Error::Tool`] if the process times out (message
    ///   includes the timeout duration).
    /// - Returns [`rp_core::Error::Tool`] if the process exits with a non-zero
    ///   status (message includes stderr).
    /// - Returns [`rp_core::Error::Tool`] if spawning the process fails.
    pub async fn execute(&self) -> rp_core::Result<ToolOutput> {
        let program_name = self.program_name();
        let child = self
            .build(Stdio::null())
            .spawn()
            .map_err(|e| rp_core::Error::tool(&program_name, format!("failed to spawn: {e}")))?;

        wait_for(program_name, child, self.timeout, None).await
    }

    /// Spawn the command with a piped stdin that the caller feeds
    /// incrementally through [`ToolProcess::write`].
    ///
    /// The child is killed if the returned [`ToolProcess`] is dropped before
    /// [`ToolProcess::finish`] completes. Stderr is drained on a background
    /// task so a chatty child cannot stall on a full pipe while the caller
    /// is blocked writing stdin. Must be called inside a tokio runtime.
    pub fn spawn_streaming(&self) -> rp_core::Result<ToolProcess> {
        let program_name = self.program_name();
        let mut child = self
            .build(Stdio::piped())
            .spawn()
            .map_err(|e| rp_core::Error::tool(&program_name, format!("failed to spawn: {e}")))?;
        let stdin = child.stdin.take();
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                // A read error just truncates the diagnostics.
                let _ = pipe.read_to_end(&mut buf).await;
                buf
            })
        });

        Ok(ToolProcess {
            program_name,
            child,
            stdin,
            stderr,
            timeout: self.timeout,
        })
    }
}

/// A running tool whose stdin is streamed by the caller.
#[derive(Debug)]
pub struct ToolProcess {
    program_name: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    timeout: Duration,
}

impl ToolProcess {
    /// Write `data` to the child's stdin.
    ///
    /// # Errors
    ///
    /// Returns [`rp_core::Error::Tool`] if stdin is closed, the write fails,
    /// or the child does not accept `data` within the command timeout.
    pub async fn write(&mut self, data: &[u8]) -> rp_core::Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            rp_core::Error::tool(&self.program_name, "stdin already closed")
        })?;
        match tokio::time::timeout(self.timeout, stdin.write_all(data)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(rp_core::Error::tool(
                &self.program_name,
                format!("failed to write stdin: {e}"),
            )),
            Err(_elapsed) => Err(rp_core::Error::tool(
                &self.program_name,
                format!("stdin write timed out after {:?}", self.timeout),
            )),
        }
    }

    /// Close stdin and wait for the process to exit.
    ///
    /// Same error semantics as [`ToolCommand::execute`].
    pub async fn finish(mut self) -> rp_core::Result<ToolOutput> {
        if let Some(mut stdin) = self.stdin.take() {
            // A flush failure here means the child already exited; its exit
            // status below carries the real cause.
            let _ = stdin.shutdown().await;
        }
        wait_for(self.program_name, self.child, self.timeout, self.stderr).await
    }
}

async fn wait_for(
    program_name: String,
    child: Child,
    timeout: Duration,
    stderr_drain: Option<JoinHandle<Vec<u8>>>,
) -> rp_core::Result<ToolOutput> {
    // On timeout the future owning `child` is dropped and kill_on_drop reaps it.
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let stderr = match stderr_drain {
                Some(drain) => drain.await.unwrap_or_default(),
                None => output.stderr,
            };
            let tool_output = ToolOutput {
                status: output.status,
                stdout: output.stdout,
                stderr: String::from_utf8_lossy(&stderr).to_string(),
            };

            if !output.status.success() {
                return Err(rp_core::Error::tool(
                    program_name,
                    format!(
                        "exited with status {}: {}",
                        output.status,
                        tool_output.stderr.trim()
                    ),
                ));
            }

            Ok(tool_output)
        }
        Ok(Err(e)) => Err(rp_core::Error::tool(
            program_name,
            format!("I/O error waiting for process: {e}"),
        )),
        Err(_elapsed) => Err(rp_core::Error::tool(
            program_name,
            format!("timed out after {timeout:?}"),
        )),
    }
}
