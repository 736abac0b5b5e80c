use crate::models::artifact::PublishedArtifact;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Script ran to completion; zero or more artifacts were published.
    Success,
    /// No script has been saved yet, nothing was executed.
    ScriptMissing,
    /// The script itself failed; publishing was skipped.
    ExecutionError,
    /// The script succeeded but nothing could be published.
    PublishError,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::ScriptMissing => "script-missing",
            RunStatus::ExecutionError => "execution-error",
            RunStatus::PublishError => "publish-error",
        }
    }
}

/// Typed outcome of one pipeline invocation.
///
/// The wire contract is the rendered text; the struct exists so library
/// callers can branch on status without parsing prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub artifacts: Vec<PublishedArtifact>,
    pub error: Option<String>,
}

impl RunReport {
    pub fn success(artifacts: Vec<PublishedArtifact>) -> Self {
        Self {
            status: RunStatus::Success,
            artifacts,
            error: None,
        }
    }

    pub fn script_missing(message: String) -> Self {
        Self {
            status: RunStatus::ScriptMissing,
            artifacts: Vec::new(),
            error: Some(message),
        }
    }

    pub fn execution_error(message: String) -> Self {
        Self {
            status: RunStatus::ExecutionError,
            artifacts: Vec::new(),
            error: Some(message),
        }
    }

    pub fn publish_error(reason: String) -> Self {
        Self {
            status: RunStatus::PublishError,
            artifacts: Vec::new(),
            error: Some(reason),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// One report string per invocation. Exactly one of four forms:
    /// `executed successfully`, the same followed by one bullet line per
    /// published artifact, `Error: {message}`, or
    /// `execution succeeded, but publishing failed: {reason}`.
    pub fn render(&self) -> String {
        match self.status {
            RunStatus::Success => {
                let mut report = String::from("executed successfully");
                for artifact in &self.artifacts {
                    report.push_str(&format!("\n- {}: {}", artifact.filename, artifact.url));
                }
                report
            }
            RunStatus::ScriptMissing | RunStatus::ExecutionError => {
                format!("Error: {}", self.error.as_deref().unwrap_or("unknown error"))
            }
            RunStatus::PublishError => format!(
                "execution succeeded, but publishing failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
