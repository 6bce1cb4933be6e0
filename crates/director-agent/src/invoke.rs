//! Generator calls with retry and metrics.

use director_tools::{ToolError, ToolInvocation, ToolResult, ToolRunner};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

use crate::metrics;
use crate::retry::{retry_async_if, RetryConfig};

/// Invoke a generator, retrying retryable failures per `retry`.
pub(crate) async fn invoke_tool(
    runner: &dyn ToolRunner,
    invocation: &ToolInvocation,
    retry: &RetryConfig,
) -> ToolResult<PathBuf> {
    let tool = invocation.tool.as_str();
    debug!(tool, output = %invocation.output().display(), "Invoking generator");

    let result = retry_async_if(
        retry,
        || async {
            let started = Instant::now();
            let result = runner.invoke(invocation).await;
            let outcome = match &result {
                Ok(_) => "success",
                Err(e) => e.kind_label(),
            };
            metrics::record_tool_invocation(tool, outcome, started.elapsed().as_secs_f64());
            result
        },
        ToolError::is_retryable,
    )
    .await;

    result.into_result()
}
