//! Process-backed tool runner.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{ToolError, ToolResult};
use crate::invocation::{ToolInvocation, ToolRunner};

/// Captured output kept in errors, from the end of the stream.
const MAX_CAPTURED_BYTES: usize = 8 * 1024;

/// Whether `path` exists and holds at least one byte.
///
/// Zero-byte files left behind by a crashed generator count as absent.
pub async fn is_complete_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// Runs generators as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessToolRunner {
    /// Per-call timeout
    timeout: Option<Duration>,
}

impl ProcessToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a per-call timeout; the child is killed when it elapses.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve the program on PATH, for startup diagnostics.
    pub fn locate(program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

#[async_trait]
impl ToolRunner for ProcessToolRunner {
    async fn invoke(&self, invocation: &ToolInvocation) -> ToolResult<PathBuf> {
        let tool = invocation.tool;
        let program = invocation
            .program()
            .ok_or(ToolError::EmptyCommand(tool))?
            .to_string();

        debug!(tool = %tool, "Running {} {}", program, invocation.args().join(" "));
        let started = Instant::now();

        let child = Command::new(&program)
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                tool,
                program: program.clone(),
                source,
            })?;

        // Dropping the wait future on timeout kills the child (kill_on_drop).
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        tool = %tool,
                        "Tool timed out after {} seconds, killing process",
                        limit.as_secs()
                    );
                    return Err(ToolError::Timeout {
                        tool,
                        secs: limit.as_secs(),
                    });
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|source| ToolError::Spawn {
            tool,
            program: program.clone(),
            source,
        })?;

        let stdout = tail(&output.stdout);
        let stderr = tail(&output.stderr);

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool,
                exit_code: output.status.code(),
                stdout,
                stderr,
            });
        }

        if !is_complete_file(&invocation.expected_output).await {
            return Err(ToolError::MissingOutput {
                tool,
                path: invocation.expected_output.clone(),
                stdout,
                stderr,
            });
        }

        info!(
            tool = %tool,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated {}",
            invocation.expected_output.display()
        );
        Ok(invocation.expected_output.clone())
    }
}

/// Lossy UTF-8 of the last `MAX_CAPTURED_BYTES` of a stream.
fn tail(bytes: &[u8]) -> String {
    let start = bytes.len().saturating_sub(MAX_CAPTURED_BYTES);
    String::from_utf8_lossy(&bytes[start..]).into_owned()
}
