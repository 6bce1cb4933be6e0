//! Structured run logging.
//!
//! Every pipeline event carries the run id and the stage it came from, so a
//! single production can be followed in JSON logs.

use director_models::SceneId;
use tracing::{error, info, warn, Span};

/// Logger bound to one production run and one pipeline stage.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    operation: String,
}

impl RunLogger {
    /// Create a logger for a run and operation (e.g. "production", "assembly").
    pub fn new(run_id: &str, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Same run, different stage.
    pub fn for_operation(&self, operation: &str) -> Self {
        Self::new(&self.run_id, operation)
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Error: {}", message
        );
    }

    /// Log a scene that will be missing from the final video.
    pub fn log_scene_failure(&self, scene_id: SceneId, message: &str) {
        warn!(
            run_id = %self.run_id,
            operation = %self.operation,
            scene_id = scene_id.get(),
            "Scene failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span for the whole stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            run_id = %self.run_id,
            operation = %self.operation
        )
    }

    /// Span for one scene inside the stage.
    pub fn scene_span(&self, scene_id: SceneId) -> Span {
        tracing::info_span!(
            "scene",
            run_id = %self.run_id,
            operation = %self.operation,
            scene_id = scene_id.get()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let logger = RunLogger::new("run-123", "production");

        assert_eq!(logger.run_id(), "run-123");
        assert_eq!(logger.operation(), "production");
    }

    #[test]
    fn test_for_operation_keeps_run_id() {
        let logger = RunLogger::new("run-123", "production").for_operation("assembly");

        assert_eq!(logger.run_id(), "run-123");
        assert_eq!(logger.operation(), "assembly");
    }
}
