use crate::error::KabuError;
use crate::executor::ExecutionConfig;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Result of one script run. Failures are data, not errors: the runner
/// never propagates, so the orchestrator can always proceed to its diff
/// and reporting stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub exit_code: Option<i32>,
}

impl ExecutionOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
            exit_code: Some(0),
        }
    }

    pub fn failed(error: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            exit_code,
        }
    }
}

/// Isolation seam for script execution. Returning from `run` is the
/// completion signal: implementations must not resolve before the script
/// has fully finished (for a subprocess, before the child has exited).
pub trait ScriptRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        script: &'a str,
    ) -> Pin<Box<dyn Future<Output = ExecutionOutcome> + Send + 'a>>;

    /// Human-readable invocation, for logs.
    fn command_line(&self) -> String;
}

/// Runs scripts by piping them to a configured interpreter's stdin and
/// waiting for the child to exit. The script is trusted: no timeout, no
/// resource limits.
pub struct SubprocessRunner {
    config: ExecutionConfig,
}

impl SubprocessRunner {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    async fn execute(&self, script: &str) -> Result<std::process::Output, KabuError> {
        let mut command = Command::new(&self.config.command);
        command.args(&self.config.args);
        command.stdin(Stdio::piped());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        for (key, value) in &self.config.env_vars {
            command.env(key, value);
        }

        if let Some(ref cwd) = self.config.working_dir {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| {
            KabuError::ExecutionFailed(format!(
                "Failed to spawn {}: {}",
                self.config.command, e
            ))
        })?;

        // Feed stdin while the output pipes drain: a script larger than the
        // pipe buffer would otherwise deadlock against an interpreter that
        // is itself blocked writing output.
        let stdin = child.stdin.take();
        let feed = async move {
            match stdin {
                // stdin drops at the end of the arm, closing the pipe and
                // signalling EOF to the interpreter
                Some(mut stdin) => stdin.write_all(script.as_bytes()).await,
                None => Ok(()),
            }
        };

        let (output, fed) = tokio::join!(child.wait_with_output(), feed);

        if let Err(e) = fed {
            // The interpreter may exit before consuming the whole script;
            // its exit status is authoritative then.
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(KabuError::ExecutionFailed(format!(
                    "Failed to write to stdin: {}",
                    e
                )));
            }
        }

        output.map_err(|e| KabuError::ExecutionFailed(e.to_string()))
    }

    fn outcome_from_output(output: std::process::Output) -> ExecutionOutcome {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("script stdout:\n{}", stdout.trim_end());
        }

        if output.status.success() {
            return ExecutionOutcome::succeeded();
        }

        let exit_code = output.status.code();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("script stderr:\n{}", stderr.trim_end());
        }

        // The last stderr line is the interpreter's final error message
        // (e.g. the closing line of a Python traceback).
        let message = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| match exit_code {
                Some(code) => format!("script exited with status {}", code),
                None => "script terminated by signal".to_string(),
            });

        ExecutionOutcome::failed(message, exit_code)
    }
}

impl ScriptRunner for SubprocessRunner {
    fn run<'a>(
        &'a self,
        script: &'a str,
    ) -> Pin<Box<dyn Future<Output = ExecutionOutcome> + Send + 'a>> {
        Box::pin(async move {
            match self.execute(script).await {
                Ok(output) => Self::outcome_from_output(output),
                Err(KabuError::ExecutionFailed(message)) => ExecutionOutcome::failed(message, None),
                Err(e) => ExecutionOutcome::failed(e.to_string(), None),
            }
        })
    }

    fn command_line(&self) -> String {
        self.config.get_full_command()
    }
}
