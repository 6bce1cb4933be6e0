//! The uniform "run a generator, verify its output" contract.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ToolResult;

/// The generator families the pipeline calls out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Text-to-video clip generator
    MotionClip,
    /// Text-to-image generator (also used for reference images)
    StillImage,
    /// Text-to-speech
    Narration,
    /// Text-to-music
    Music,
    /// Topic research feeding the planner
    Research,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::MotionClip => "motion_clip",
            ToolKind::StillImage => "still_image",
            ToolKind::Narration => "narration",
            ToolKind::Music => "music",
            ToolKind::Research => "research",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generator call: the argument vector and the file it must produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool: ToolKind,
    /// Program followed by its arguments
    pub argv: Vec<String>,
    pub expected_output: PathBuf,
}

impl ToolInvocation {
    pub fn new(tool: ToolKind, argv: Vec<String>, expected_output: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            argv,
            expected_output: expected_output.into(),
        }
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    pub fn output(&self) -> &Path {
        &self.expected_output
    }

    /// Value following `flag` in the argument vector.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.argv
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.argv.get(i + 1))
            .map(String::as_str)
    }
}

/// Runs generator invocations.
///
/// Succeeds only when the process exits zero and `expected_output` exists and
/// is non-empty; returns the output path.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn invoke(&self, invocation: &ToolInvocation) -> ToolResult<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_accessors() {
        let inv = ToolInvocation::new(
            ToolKind::Music,
            vec![
                "gen-music".to_string(),
                "calm strings".to_string(),
                "--duration".to_string(),
                "6".to_string(),
            ],
            "/tmp/score.mp3",
        );
        assert_eq!(inv.program(), Some("gen-music"));
        assert_eq!(inv.args().len(), 3);
        assert_eq!(inv.flag_value("--duration"), Some("6"));
        assert_eq!(inv.flag_value("--output"), None);
    }

    #[test]
    fn test_empty_argv_accessors() {
        let inv = ToolInvocation::new(ToolKind::Research, vec![], "/tmp/notes.md");
        assert_eq!(inv.program(), None);
        assert!(inv.args().is_empty());
    }
}
