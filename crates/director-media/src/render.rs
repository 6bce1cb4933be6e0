//! Per-scene render graphs.
//!
//! A [`SceneRender`] describes how one scene's assets become an intermediate
//! clip in the canonical [`RenderProfile`]. The visual branch and the audio
//! branch are independent tagged variants, and [`SceneRender::to_command`] is
//! the single place that turns them into an FFmpeg filter graph.
//!
//! Every clip is cut to exactly the scene duration with audio and video
//! present, so clips can be joined with a stream-copy concat.

use director_models::RenderProfile;
use std::path::{Path, PathBuf};

use crate::command::{FfmpegCommand, FfmpegInput};
use crate::filters::{
    motion_clip_chain, narration_music_mix, silence_source, single_track, still_chain, KenBurns,
    DEFAULT_MUSIC_VOLUME,
};

/// Visual source of a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderSource {
    /// Generated video, re-encoded to the profile
    MotionClip { path: PathBuf },
    /// Still image looped for the scene duration
    Still {
        path: PathBuf,
        ken_burns: Option<KenBurns>,
    },
}

impl RenderSource {
    pub fn path(&self) -> &Path {
        match self {
            RenderSource::MotionClip { path } | RenderSource::Still { path, .. } => path,
        }
    }
}

/// Where a scene's soundtrack comes from at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioPlan {
    /// Audio stream of the motion clip, untouched apart from resampling
    Native,
    /// A silent track for the whole scene
    Silent,
    /// Narration as the primary track, music attenuated underneath.
    /// Without narration, silence of the scene's length is the primary.
    Mixed {
        narration: Option<PathBuf>,
        music: Option<PathBuf>,
    },
}

/// Everything needed to render one intermediate clip.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRender {
    pub source: RenderSource,
    pub audio: AudioPlan,
    /// Scene length in seconds
    pub duration: f64,
    pub output: PathBuf,
    /// Music level under narration
    pub music_volume: f64,
}

impl SceneRender {
    pub fn new(
        source: RenderSource,
        audio: AudioPlan,
        duration: f64,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            audio,
            duration,
            output: output.into(),
            music_volume: DEFAULT_MUSIC_VOLUME,
        }
    }

    pub fn with_music_volume(mut self, volume: f64) -> Self {
        self.music_volume = volume;
        self
    }

    /// Build the FFmpeg command for this scene.
    pub fn to_command(&self, profile: &RenderProfile) -> FfmpegCommand {
        let d = self.duration;

        let (visual_input, video_chain) = match &self.source {
            RenderSource::MotionClip { path } => {
                (FfmpegInput::file(path), motion_clip_chain(d, profile))
            }
            RenderSource::Still { path, ken_burns } => (
                FfmpegInput::file(path)
                    .args(["-loop", "1", "-framerate"])
                    .arg(profile.fps.to_string())
                    .duration(d),
                still_chain(d, profile, ken_burns.as_ref()),
            ),
        };

        let mut cmd = FfmpegCommand::new(&self.output).input(visual_input);
        let mut graph = format!("[0:v]{video_chain}[v]");

        // Audio inputs start at index 1.
        let audio_graph = match &self.audio {
            AudioPlan::Native => single_track("0:a", profile, "a"),
            AudioPlan::Mixed {
                narration: Some(narration),
                music: Some(music),
            } => {
                cmd = cmd.input_file(narration).input_file(music);
                narration_music_mix("1:a", "2:a", self.music_volume, profile, "a")
            }
            AudioPlan::Mixed {
                narration: Some(narration),
                music: None,
            } => {
                cmd = cmd.input_file(narration);
                single_track("1:a", profile, "a")
            }
            AudioPlan::Mixed {
                narration: None,
                music: Some(music),
            } => {
                cmd = cmd
                    .input(FfmpegInput::lavfi(silence_source(profile)).duration(d))
                    .input_file(music);
                narration_music_mix("1:a", "2:a", self.music_volume, profile, "a")
            }
            AudioPlan::Silent
            | AudioPlan::Mixed {
                narration: None,
                music: None,
            } => {
                cmd = cmd.input(FfmpegInput::lavfi(silence_source(profile)).duration(d));
                single_track("1:a", profile, "a")
            }
        };
        graph.push(';');
        graph.push_str(&audio_graph);

        cmd.filter_complex(graph)
            .map("[v]")
            .map("[a]")
            .output_args(profile.to_ffmpeg_args())
            .duration(d)
    }
}
