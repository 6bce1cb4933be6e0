//! Error types for tool invocations.

use std::path::PathBuf;
use thiserror::Error;

use crate::invocation::ToolKind;

/// Result type for tool invocations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Ways an external generator call can fail.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Empty command line for {0} tool")]
    EmptyCommand(ToolKind),

    #[error("Failed to start {tool} tool '{program}': {source}")]
    Spawn {
        tool: ToolKind,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} tool exited with status {}: {}", describe_exit(.exit_code), .stderr.trim())]
    Failed {
        tool: ToolKind,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("{tool} tool exited cleanly but produced no output at {}", .path.display())]
    MissingOutput {
        tool: ToolKind,
        path: PathBuf,
        stdout: String,
        stderr: String,
    },

    #[error("{tool} tool timed out after {secs} seconds")]
    Timeout { tool: ToolKind, secs: u64 },
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

impl ToolError {
    /// Which generator failed.
    pub fn tool(&self) -> ToolKind {
        match self {
            ToolError::EmptyCommand(tool) => *tool,
            ToolError::Spawn { tool, .. }
            | ToolError::Failed { tool, .. }
            | ToolError::MissingOutput { tool, .. }
            | ToolError::Timeout { tool, .. } => *tool,
        }
    }

    /// Captured standard error, when the process ran.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ToolError::Failed { stderr, .. } | ToolError::MissingOutput { stderr, .. } => {
                Some(stderr)
            }
            _ => None,
        }
    }

    /// Check if retrying the same call could succeed.
    ///
    /// Generators are remote APIs behind a CLI, so failures after a clean
    /// start are usually transient. A tool that cannot even be started is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ToolError::Failed { .. } | ToolError::MissingOutput { .. } | ToolError::Timeout { .. }
        )
    }

    /// Short label for metrics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ToolError::EmptyCommand(_) => "empty_command",
            ToolError::Spawn { .. } => "spawn",
            ToolError::Failed { .. } => "failed",
            ToolError::MissingOutput { .. } => "missing_output",
            ToolError::Timeout { .. } => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display_includes_stderr() {
        let err = ToolError::Failed {
            tool: ToolKind::Narration,
            exit_code: Some(2),
            stdout: String::new(),
            stderr: "quota exceeded\n".to_string(),
        };
        assert_eq!(err.to_string(), "narration tool exited with status 2: quota exceeded");
        assert_eq!(err.tool(), ToolKind::Narration);
        assert_eq!(err.stderr(), Some("quota exceeded\n"));
    }

    #[test]
    fn test_retryable() {
        assert!(ToolError::Timeout { tool: ToolKind::Music, secs: 5 }.is_retryable());
        assert!(!ToolError::EmptyCommand(ToolKind::Music).is_retryable());
        assert!(!ToolError::Spawn {
            tool: ToolKind::MotionClip,
            program: "generate-veo".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .is_retryable());
    }
}
