use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use anyhow::Context as _;
use tokio::{
    io::{AsyncReadExt as _, AsyncWriteExt as _},
    process::Command,
};

use crate::config::CompilerConfig;

/// Outcome of one compile task. Success iff the compiler exited with 0;
/// diagnostics are never inspected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Success,
    CompilationError,
}

/// Outcome of running a binary under a wall-clock deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success(String),
    RuntimeError,
    TimeLimitExceeded,
}

/// Invokes external processes: the compiler, candidate binaries, and custom
/// checker binaries.
#[derive(Debug, Clone)]
pub struct Execution {
    shell: PathBuf,
}

impl Execution {
    pub const DEFAULT_SHELL: &str = "/bin/sh";

    pub fn new() -> Self {
        Self {
            shell: Self::DEFAULT_SHELL.into(),
        }
    }

    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn get_shell(&self) -> &Path {
        &self.shell
    }

    /// Runs the configured compile command with `#{src}`/`#{out}` expanded.
    /// Compiler output is captured and discarded; only the exit status
    /// decides the outcome.
    pub async fn compile(
        &self,
        source: &Path,
        target: &Path,
        compiler: &CompilerConfig,
    ) -> anyhow::Result<CompileOutcome> {
        let cmd = compiler.compile_command(source, target)?;
        log::info!("Compiling: {}", cmd);

        let output = Command::new(&self.shell)
            .args(["-c", &cmd])
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| {
                format!(
                    "Failed to spawn '{} -c {}'",
                    self.shell.to_string_lossy(),
                    cmd
                )
            })?;

        Ok(if output.status.success() {
            CompileOutcome::Success
        } else {
            CompileOutcome::CompilationError
        })
    }

    /// Runs `executable` with `input` piped to stdin under a hard wall-clock
    /// deadline. Exit 0 maps to `Success(stdout)`, the deadline to
    /// `TimeLimitExceeded`, any other exit to `RuntimeError`.
    pub async fn run(
        &self,
        executable: &Path,
        input: &str,
        time_limit: Duration,
    ) -> anyhow::Result<ExecutionOutcome> {
        let mut proc = Command::new(executable)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", executable.to_string_lossy()))?;

        let stdin = proc.stdin.take().context("Failed to open stdin")?;
        let mut stdout = proc.stdout.take().context("Failed to open stdout")?;
        let mut stderr = proc.stderr.take().context("Failed to open stderr")?;

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let res = tokio::time::timeout(time_limit, async {
            let fut_stdin = async {
                let mut stdin = stdin;
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await?;
                drop(stdin); // NOTE: this line is essential
                Ok::<_, std::io::Error>(())
            };
            let fut_stdout = stdout.read_to_end(&mut stdout_buf);
            let fut_stderr = stderr.read_to_end(&mut stderr_buf);
            let fut_exit_status = proc.wait();

            tokio::try_join!(fut_stdin, fut_stdout, fut_stderr, fut_exit_status)
                .context("Failed to communicate with subprocess")
        })
        .await;

        match res {
            Err(_) => {
                proc.kill()
                    .await
                    .unwrap_or_else(|e| log::warn!("Failed to kill TLE process: {:#}", e));
                Ok(ExecutionOutcome::TimeLimitExceeded)
            }

            Ok(Err(e)) => Err(e),

            Ok(Ok((_, _, _, exit_status))) => {
                if exit_status.success() {
                    Ok(ExecutionOutcome::Success(
                        String::from_utf8_lossy(&stdout_buf).into_owned(),
                    ))
                } else {
                    Ok(ExecutionOutcome::RuntimeError)
                }
            }
        }
    }
}

impl Default for Execution {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes an executable `/bin/sh` script into the temp dir and returns
    /// its path.
    pub fn script(name: &str, body: &str) -> PathBuf {
        static SEQ: AtomicUsize = AtomicUsize::new(0);
        let n = SEQ.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "cpj-test-{}-{}-{}",
            std::process::id(),
            n,
            name
        ));
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();

        use std::os::unix::fs::PermissionsExt as _;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
