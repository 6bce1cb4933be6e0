//! Fakes for driving the pipeline without generators or ffmpeg.

#![allow(dead_code)]

use async_trait::async_trait;
use director_agent::{DirectorConfig, DirectorResult, Planner};
use director_media::{FfmpegCommand, MediaEngine, MediaError, MediaResult};
use director_models::ProductionManifest;
use director_tools::{ToolError, ToolInvocation, ToolKind, ToolResult, ToolRunner};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// How a matching invocation should fail.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Exit,
    Timeout,
}

struct FaultRule {
    tool: Option<ToolKind>,
    path_fragment: String,
    fault: Fault,
}

/// Tool runner that writes a small file to the expected output.
#[derive(Default)]
pub struct FakeRunner {
    invocations: Mutex<Vec<ToolInvocation>>,
    rules: Mutex<Vec<FaultRule>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail invocations of `tool` (any tool when `None`) whose output path contains `fragment`.
    pub fn fail_when(&self, tool: Option<ToolKind>, fragment: &str, fault: Fault) {
        self.rules.lock().unwrap().push(FaultRule {
            tool,
            path_fragment: fragment.to_string(),
            fault,
        });
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn count(&self, tool: ToolKind) -> usize {
        self.invocations().iter().filter(|i| i.tool == tool).count()
    }

    /// Invocations whose output lives under `scene_<id>/`.
    pub fn for_scene(&self, id: u32) -> Vec<ToolInvocation> {
        let dir = format!("scene_{id}");
        self.invocations()
            .into_iter()
            .filter(|i| i.output().components().any(|c| c.as_os_str() == dir.as_str()))
            .collect()
    }

    fn fault_for(&self, invocation: &ToolInvocation) -> Option<Fault> {
        let output = invocation.output().to_string_lossy().to_string();
        self.rules
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                r.tool.map_or(true, |t| t == invocation.tool) && output.contains(&r.path_fragment)
            })
            .map(|r| r.fault)
    }
}

#[async_trait]
impl ToolRunner for FakeRunner {
    async fn invoke(&self, invocation: &ToolInvocation) -> ToolResult<PathBuf> {
        self.invocations.lock().unwrap().push(invocation.clone());

        match self.fault_for(invocation) {
            Some(Fault::Exit) => Err(ToolError::Failed {
                tool: invocation.tool,
                exit_code: Some(2),
                stdout: String::new(),
                stderr: "generator refused the prompt".to_string(),
            }),
            Some(Fault::Timeout) => Err(ToolError::Timeout {
                tool: invocation.tool,
                secs: 1,
            }),
            None => {
                let output = invocation.output();
                if let Some(parent) = output.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(output, invocation.tool.as_str()).unwrap();
                Ok(output.to_path_buf())
            }
        }
    }
}

/// Media engine that writes placeholder clips and records every command.
///
/// The concat output gets the concat list's text as its content, so tests
/// can read the scene order back from the final file.
pub struct FakeEngine {
    commands: Mutex<Vec<FfmpegCommand>>,
    failing_clips: Mutex<Vec<String>>,
    native_audio: bool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::with_native_audio(true)
    }

    pub fn with_native_audio(native_audio: bool) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            failing_clips: Mutex::new(Vec::new()),
            native_audio,
        }
    }

    /// Make the render of `clips/scene_<id>.mp4` fail.
    pub fn fail_render(&self, id: u32) {
        self.failing_clips.lock().unwrap().push(format!("scene_{id}.mp4"));
    }

    /// Make the stream-copy concat fail.
    pub fn fail_concat(&self) {
        self.failing_clips
            .lock()
            .unwrap()
            .push("final.partial.mp4".to_string());
    }

    pub fn commands(&self) -> Vec<FfmpegCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// The render command for one scene's clip.
    pub fn render_for(&self, id: u32) -> Option<FfmpegCommand> {
        let name = format!("scene_{id}.mp4");
        self.commands()
            .into_iter()
            .find(|c| c.output().file_name().is_some_and(|n| n == name.as_str()))
    }

    fn is_concat(command: &FfmpegCommand) -> bool {
        command
            .inputs()
            .first()
            .is_some_and(|i| i.args.iter().any(|a| a == "concat"))
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn run(&self, command: &FfmpegCommand) -> MediaResult<()> {
        self.commands.lock().unwrap().push(command.clone());

        let name = command
            .output()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.failing_clips.lock().unwrap().contains(&name) {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with status 1",
                Some("Error while decoding stream #0:0\n".to_string()),
                Some(1),
            ));
        }

        let content = if Self::is_concat(command) {
            std::fs::read_to_string(&command.inputs()[0].source)?
        } else {
            format!("clip {name}")
        };
        std::fs::write(command.output(), content)?;
        Ok(())
    }

    async fn has_audio_stream(&self, _path: &Path) -> MediaResult<bool> {
        Ok(self.native_audio)
    }
}

/// Planner returning a fixed manifest.
pub struct StaticPlanner(pub ProductionManifest);

#[async_trait]
impl Planner for StaticPlanner {
    async fn plan(&self, _topic: &str) -> DirectorResult<ProductionManifest> {
        Ok(self.0.clone())
    }
}

/// Config rooted in a temp directory.
pub fn test_config(tmp: &TempDir) -> DirectorConfig {
    DirectorConfig {
        output_dir: tmp.path().join("movies"),
        work_dir: tmp.path().join("work"),
        max_scene_parallel: 2,
        max_render_parallel: 2,
        ..Default::default()
    }
}
