//! Argument contracts for each generator family.

use director_models::ImageStyle;
use std::path::Path;

use crate::invocation::{ToolInvocation, ToolKind};

/// Clip lengths the motion-clip generator accepts, in seconds.
pub const MOTION_CLIP_DURATIONS: &[u32] = &[4, 6, 8];

/// Aspect ratio requested from the motion-clip generator.
pub const MOTION_CLIP_ASPECT_RATIO: &str = "16:9";

pub const DEFAULT_MOTION_CLIP_CMD: &str = "generate-veo";
pub const DEFAULT_STILL_IMAGE_CMD: &str = "generate-gemini-image";
pub const DEFAULT_NARRATION_CMD: &str = "gen-tts";
pub const DEFAULT_MUSIC_CMD: &str = "gen-music";
pub const DEFAULT_RESEARCH_CMD: &str = "deep-research";

/// Nearest duration the motion-clip generator accepts; ties round up.
pub fn snap_motion_duration(seconds: u32) -> u32 {
    MOTION_CLIP_DURATIONS
        .iter()
        .copied()
        .min_by_key(|allowed| (allowed.abs_diff(seconds), u32::MAX - allowed))
        .unwrap_or(seconds)
}

/// Executable names for each generator, overridable from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCommands {
    pub motion_clip: String,
    pub still_image: String,
    pub narration: String,
    pub music: String,
    pub research: String,
}

impl Default for GeneratorCommands {
    fn default() -> Self {
        Self {
            motion_clip: DEFAULT_MOTION_CLIP_CMD.to_string(),
            still_image: DEFAULT_STILL_IMAGE_CMD.to_string(),
            narration: DEFAULT_NARRATION_CMD.to_string(),
            music: DEFAULT_MUSIC_CMD.to_string(),
            research: DEFAULT_RESEARCH_CMD.to_string(),
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl GeneratorCommands {
    /// `<veo> <prompt> --duration <d> --aspect-ratio 16:9 --output-file <out> [--reference-image <ref>]`
    pub fn motion_clip(
        &self,
        prompt: &str,
        duration: u32,
        output: &Path,
        reference: Option<&Path>,
    ) -> ToolInvocation {
        let mut argv = vec![
            self.motion_clip.clone(),
            prompt.to_string(),
            "--duration".to_string(),
            duration.to_string(),
            "--aspect-ratio".to_string(),
            MOTION_CLIP_ASPECT_RATIO.to_string(),
            "--output-file".to_string(),
            path_arg(output),
        ];
        if let Some(reference) = reference {
            argv.push("--reference-image".to_string());
            argv.push(path_arg(reference));
        }
        ToolInvocation::new(ToolKind::MotionClip, argv, output)
    }

    /// `<image> --prompt <p> --output-dir <dir> --filename <name> --count 1 --style <style> [--reference-image <ref>]`
    ///
    /// The image tool takes a directory and a file name instead of a path.
    pub fn still_image(
        &self,
        prompt: &str,
        style: &ImageStyle,
        output: &Path,
        reference: Option<&Path>,
    ) -> ToolInvocation {
        let dir = output.parent().unwrap_or_else(|| Path::new("."));
        let filename = output
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut argv = vec![
            self.still_image.clone(),
            "--prompt".to_string(),
            prompt.to_string(),
            "--output-dir".to_string(),
            path_arg(dir),
            "--filename".to_string(),
            filename,
            "--count".to_string(),
            "1".to_string(),
            "--style".to_string(),
            style.as_str().to_string(),
        ];
        if let Some(reference) = reference {
            argv.push("--reference-image".to_string());
            argv.push(path_arg(reference));
        }
        ToolInvocation::new(ToolKind::StillImage, argv, output)
    }

    /// `<tts> <text> --voice-name <voice> --output-file <out> --audio-format MP3`
    pub fn narration(&self, text: &str, voice: &str, output: &Path) -> ToolInvocation {
        let argv = vec![
            self.narration.clone(),
            text.to_string(),
            "--voice-name".to_string(),
            voice.to_string(),
            "--output-file".to_string(),
            path_arg(output),
            "--audio-format".to_string(),
            "MP3".to_string(),
        ];
        ToolInvocation::new(ToolKind::Narration, argv, output)
    }

    /// `<music> <prompt> --duration <d> --output <out> --format mp3`
    pub fn music(&self, prompt: &str, duration: u32, output: &Path) -> ToolInvocation {
        let argv = vec![
            self.music.clone(),
            prompt.to_string(),
            "--duration".to_string(),
            duration.to_string(),
            "--output".to_string(),
            path_arg(output),
            "--format".to_string(),
            "mp3".to_string(),
        ];
        ToolInvocation::new(ToolKind::Music, argv, output)
    }

    /// `<research> <topic> --output-file <out>`
    pub fn research(&self, topic: &str, output: &Path) -> ToolInvocation {
        let argv = vec![
            self.research.clone(),
            topic.to_string(),
            "--output-file".to_string(),
            path_arg(output),
        ];
        ToolInvocation::new(ToolKind::Research, argv, output)
    }
}
