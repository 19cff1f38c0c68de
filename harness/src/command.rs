//! Subprocess execution for the external `leo` client.
//!
//! One [`CommandSpec`] describes one invocation; [`ProcessRunner`] executes
//! it with the argument list passed verbatim (no shell), so quoting and
//! injection are never a concern. Both output streams are captured in full
//! and a non-zero exit becomes [`CommandError::Failed`] carrying them, which
//! lets callers classify domain outcomes ("already exists", "Transaction
//! rejected") without re-running anything. Retries are deliberately left to
//! callers: replaying a broadcast could double-submit.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use leodev_common::error::CommandError;

/// Immutable description of one external-binary execution.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub binary: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
    /// Payload written to the child's stdin, then the stream is closed.
    /// Needed for commands that prompt for interactive confirmation.
    pub stdin: Option<String>,
    /// Short human label used in logs and error messages.
    pub label: String,
}

impl CommandSpec {
    pub fn new(binary: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
            stdin: None,
            label: label.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }
}

/// Captured streams of a zero-exit invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Both streams concatenated, for marker matching.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// The seam between the harness and the operating system. Drivers and
/// coordinators take this trait so tests can substitute scripted runners.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, CommandError>;
}

/// Real runner on top of `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, CommandError> {
        debug!(
            "running {}: {} {:?}",
            spec.label,
            spec.binary.display(),
            spec.args
        );

        let mut command = Command::new(&spec.binary);
        command.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }
        command.envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command.stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| CommandError::Spawn {
            label: spec.label.clone(),
            source,
        })?;

        if let Some(payload) = &spec.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                // Write then close, so a prompting command never blocks
                // waiting for more input. A child that exited before reading
                // is reported through its exit status, not here.
                let _ = stdin.write_all(payload.as_bytes()).await;
                let _ = stdin.shutdown().await;
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| CommandError::Spawn {
                label: spec.label.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(CommandError::Failed {
                label: spec.label,
                code: output.status.code(),
                stdout,
                stderr,
            })
        }
    }
}
