//! The media engine seam used by the assembly stage.

use async_trait::async_trait;
use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe;

/// Executes FFmpeg commands and answers stream questions about files.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Run a command to completion; the output exists on success.
    async fn run(&self, command: &FfmpegCommand) -> MediaResult<()>;

    /// Whether the file has an audio stream.
    async fn has_audio_stream(&self, path: &Path) -> MediaResult<bool>;
}

/// [`MediaEngine`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    runner: FfmpegRunner,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any single FFmpeg run that exceeds `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn run(&self, command: &FfmpegCommand) -> MediaResult<()> {
        self.runner.run(command).await
    }

    async fn has_audio_stream(&self, path: &Path) -> MediaResult<bool> {
        probe::has_audio_stream(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::FfmpegRunner;
    use crate::render::{AudioPlan, RenderSource, SceneRender};
    use std::sync::{Arc, Mutex};
    use crate::{concat_command, probe_media, write_concat_list};
    use director_models::RenderProfile;
    use tempfile::TempDir;

    async fn lavfi(args: &[&str], out: &Path) {
        let status = tokio::process::Command::new("ffmpeg")
            .args(["-y", "-v", "error"])
            .args(args)
            .arg(out)
            .status()
            .await
            .unwrap();
        assert!(status.success());
    }

    fn small_profile() -> RenderProfile {
        RenderProfile::default().with_resolution(320, 180).with_fps(15)
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_mix_is_bounded_by_narration() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("image.png");
        let narration = dir.path().join("narration.mp3");
        let music = dir.path().join("score.mp3");
        let clip = dir.path().join("clip.mp4");

        lavfi(&["-f", "lavfi", "-i", "color=c=blue:s=640x360", "-frames:v", "1"], &image).await;
        lavfi(&["-f", "lavfi", "-i", "sine=frequency=440:duration=4"], &narration).await;
        lavfi(&["-f", "lavfi", "-i", "sine=frequency=220:duration=10"], &music).await;

        let render = SceneRender::new(
            RenderSource::Still { path: image, ken_burns: Some(Default::default()) },
            AudioPlan::Mixed { narration: Some(narration), music: Some(music) },
            4.0,
            &clip,
        );
        FfmpegEngine::new().run(&render.to_command(&small_profile())).await.unwrap();

        let info = probe_media(&clip).await.unwrap();
        assert!(info.has_audio);
        assert!((info.duration - 4.0).abs() < 0.2, "duration was {}", info.duration);
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_render_and_concat_motion_clips() {
        let dir = TempDir::new().unwrap();
        let engine = FfmpegEngine::new().with_timeout(120);
        let profile = small_profile();
        let mut clips = Vec::new();

        for (i, with_audio) in [(1, true), (2, false)] {
            let source = dir.path().join(format!("video_{i}.mp4"));
            if with_audio {
                lavfi(
                    &["-f", "lavfi", "-i", "testsrc=duration=3:size=1280x720:rate=30",
                      "-f", "lavfi", "-i", "sine=frequency=1000:duration=3", "-shortest"],
                    &source,
                )
                .await;
            } else {
                let src = "testsrc=duration=3:size=640x480:rate=24";
                lavfi(&["-f", "lavfi", "-i", src], &source).await;
            }
            assert_eq!(engine.has_audio_stream(&source).await.unwrap(), with_audio);

            let audio = if with_audio { AudioPlan::Native } else { AudioPlan::Silent };
            let clip = dir.path().join(format!("clip_{i}.mp4"));
            let source = RenderSource::MotionClip { path: source };
            let render = SceneRender::new(source, audio, 4.0, &clip);
            engine.run(&render.to_command(&profile)).await.unwrap();
            clips.push(clip);
        }

        let list = dir.path().join("concat.txt");
        let output = dir.path().join("final.mp4");
        write_concat_list(&list, &clips).await.unwrap();
        engine.run(&concat_command(&list, &output)).await.unwrap();

        let info = probe_media(&output).await.unwrap();
        assert!(info.has_audio);
        assert_eq!((info.width, info.height), (320, 180));
        assert!((info.duration - 8.0).abs() < 0.3, "duration was {}", info.duration);
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_render_reports_progress_to_completion() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("image.png");
        let clip = dir.path().join("clip.mp4");
        lavfi(&["-f", "lavfi", "-i", "color=c=red:s=320x180", "-frames:v", "1"], &image).await;

        let render = SceneRender::new(
            RenderSource::Still { path: image, ken_burns: None },
            AudioPlan::Silent,
            2.0,
            &clip,
        );
        let command = render.to_command(&small_profile());
        let total_ms = command.output_duration_ms().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        FfmpegRunner::new()
            .run_with_progress(&command, move |p| sink.lock().unwrap().push(p))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let last = seen.last().expect("no progress reported");
        assert!(last.is_complete);
        assert!(last.percentage(total_ms) > 90.0);
    }
}
