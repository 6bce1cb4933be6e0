//! Director error types.
//!
//! Only run-scoped failures are errors. Scene-scoped failures become
//! [`SceneFailure`] records and never propagate past the scene boundary.

use director_media::MediaError;
use director_models::ManifestError;
use director_tools::ToolError;
use thiserror::Error;

use crate::report::SceneFailure;

pub type DirectorResult<T> = Result<T, DirectorError>;

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("Planning failed: {0}")]
    Planning(String),

    #[error("Invalid manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Reference image for group '{group}' failed: {source}")]
    ReferenceGeneration {
        group: String,
        #[source]
        source: ToolError,
    },

    #[error("No scenes were successfully rendered ({} failed)", .failed.len())]
    NoScenesRendered { failed: Vec<SceneFailure> },

    #[error("Concatenation failed: {}", .source.diagnostic())]
    Concatenation {
        #[source]
        source: MediaError,
        failed: Vec<SceneFailure>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DirectorError {
    pub fn planning(msg: impl Into<String>) -> Self {
        Self::Planning(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Pipeline phase the error aborted, for logs and exit messages.
    pub fn phase(&self) -> &'static str {
        match self {
            DirectorError::Planning(_) | DirectorError::Manifest(_) => "planning",
            DirectorError::ReferenceGeneration { .. } => "reference_generation",
            DirectorError::Tool(_) => "production",
            DirectorError::NoScenesRendered { .. } | DirectorError::Concatenation { .. } => {
                "assembly"
            }
            DirectorError::Config(_) => "configuration",
            DirectorError::Io(_) | DirectorError::Json(_) => "workspace",
        }
    }

    /// Scene failures carried by the error, if any.
    pub fn scene_failures(&self) -> &[SceneFailure] {
        match self {
            DirectorError::NoScenesRendered { failed }
            | DirectorError::Concatenation { failed, .. } => failed,
            _ => &[],
        }
    }
}
