//! Assembly: per-scene renders, then one stream-copy concat.

use director_media::{
    concat_command, move_file, remove_files, write_concat_list, AudioPlan, KenBurns,
    MediaEngine, MediaResult, RenderSource, SceneRender,
};
use director_models::{
    AssetMap, AssetRecord, AudioSource, ProductionManifest, RenderProfile, Scene, SceneId,
    VisualAsset,
};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{DirectorError, DirectorResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::report::{FailurePhase, SceneFailure};
use crate::workspace::RunWorkspace;

/// What assembly put into the final video.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub output: PathBuf,
    /// Scenes in the video, in manifest order
    pub rendered: Vec<SceneId>,
    /// Scenes left out, in manifest order
    pub failures: Vec<SceneFailure>,
}

pub struct Editor {
    engine: Arc<dyn MediaEngine>,
    workspace: RunWorkspace,
    profile: RenderProfile,
    max_parallel: usize,
    ken_burns: Option<KenBurns>,
    music_volume: f64,
    logger: RunLogger,
}

impl Editor {
    pub fn new(engine: Arc<dyn MediaEngine>, workspace: RunWorkspace) -> Self {
        Self {
            engine,
            workspace,
            profile: RenderProfile::default(),
            max_parallel: 2,
            ken_burns: Some(KenBurns::default()),
            music_volume: director_media::filters::DEFAULT_MUSIC_VOLUME,
            logger: RunLogger::new("local", "assembly"),
        }
    }

    pub fn with_profile(mut self, profile: RenderProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn with_ken_burns(mut self, ken_burns: Option<KenBurns>) -> Self {
        self.ken_burns = ken_burns;
        self
    }

    pub fn with_music_volume(mut self, volume: f64) -> Self {
        self.music_volume = volume;
        self
    }

    pub fn with_logger(mut self, logger: RunLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Render every scene that has assets and join the clips, in manifest order, into `output`.
    pub async fn assemble(
        &self,
        manifest: &ProductionManifest,
        assets: &AssetMap,
        output: &Path,
    ) -> DirectorResult<AssemblyReport> {
        self.logger
            .log_start(&format!("{} scenes -> {}", manifest.scenes.len(), output.display()));
        tokio::fs::create_dir_all(self.workspace.clips_dir()).await?;

        let mut failures = Vec::new();
        let mut jobs = Vec::new();
        for scene in &manifest.scenes {
            match assets.get(&scene.id) {
                Some(record) => jobs.push((scene, record)),
                None => failures.push(SceneFailure::new(
                    scene.id,
                    FailurePhase::MissingAssets,
                    "no assets were produced",
                )),
            }
        }

        // `buffered` yields in submission order, so results stay in manifest order.
        let outcomes: Vec<(SceneId, PathBuf, Result<(), String>)> = stream::iter(jobs)
            .map(|(scene, record)| async move {
                let clip = self.workspace.clip_path(scene.id);
                let result = self.render_scene(scene, record, &clip).await;
                (scene.id, clip, result)
            })
            .buffered(self.max_parallel)
            .collect()
            .await;

        let mut attempted = Vec::with_capacity(outcomes.len());
        let mut clips = Vec::new();
        let mut rendered = Vec::new();
        for (id, clip, result) in outcomes {
            match result {
                Ok(()) => {
                    clips.push(clip.clone());
                    rendered.push(id);
                }
                Err(message) => {
                    self.logger.log_scene_failure(id, &message);
                    failures.push(SceneFailure::new(id, FailurePhase::Render, message));
                }
            }
            attempted.push(clip);
        }

        let position = |id: SceneId| manifest.scenes.iter().position(|s| s.id == id);
        failures.sort_by_key(|f| position(f.scene_id));
        for failure in &failures {
            metrics::record_scene_failure(failure.phase.as_str());
        }

        if clips.is_empty() {
            remove_files(&attempted).await;
            self.logger.log_error("no scenes rendered");
            return Err(DirectorError::NoScenesRendered { failed: failures });
        }

        let concatenated = self.concatenate(&clips, output).await;

        let list = self.workspace.concat_list_path();
        let removed = remove_files(&attempted).await + remove_files(&[list]).await;
        debug!(removed, "Removed intermediate files");

        if let Err(source) = concatenated {
            self.logger
                .log_error(&format!("concatenation failed: {}", source.diagnostic()));
            return Err(DirectorError::Concatenation {
                source,
                failed: failures,
            });
        }
        self.logger.log_completion(&format!(
            "{} of {} scenes in {}",
            rendered.len(),
            manifest.scenes.len(),
            output.display()
        ));

        Ok(AssemblyReport {
            output: output.to_path_buf(),
            rendered,
            failures,
        })
    }

    /// Render one scene to `clip`; the error is the message recorded for the scene.
    async fn render_scene(
        &self,
        scene: &Scene,
        record: &AssetRecord,
        clip: &Path,
    ) -> Result<(), String> {
        let started = Instant::now();
        let audio = self.audio_plan(scene, record).await;
        let render = SceneRender::new(
            self.render_source(record),
            audio,
            f64::from(scene.duration),
            clip,
        )
        .with_music_volume(self.music_volume);

        debug!(scene_id = scene.id.get(), audio = ?render.audio, "Rendering scene");
        self.engine
            .run(&render.to_command(&self.profile))
            .await
            .map_err(|e| e.diagnostic())?;

        metrics::record_clip_rendered(started.elapsed().as_secs_f64());
        Ok(())
    }

    fn render_source(&self, record: &AssetRecord) -> RenderSource {
        match &record.visual {
            VisualAsset::Video(path) => RenderSource::MotionClip { path: path.clone() },
            VisualAsset::Image(path) => RenderSource::Still {
                path: path.clone(),
                ken_burns: self.ken_burns,
            },
        }
    }

    async fn audio_plan(&self, scene: &Scene, record: &AssetRecord) -> AudioPlan {
        match (scene.audio_source, &record.visual) {
            (AudioSource::Native, VisualAsset::Video(path)) => {
                match self.engine.has_audio_stream(path).await {
                    Ok(true) => AudioPlan::Native,
                    Ok(false) => {
                        info!(
                            scene_id = scene.id.get(),
                            "Motion clip has no audio stream, using silence"
                        );
                        AudioPlan::Silent
                    }
                    Err(e) => {
                        warn!(
                            scene_id = scene.id.get(),
                            "Could not probe motion clip, using silence: {}", e
                        );
                        AudioPlan::Silent
                    }
                }
            }
            (AudioSource::Native, VisualAsset::Image(_)) | (AudioSource::Silent, _) => {
                AudioPlan::Silent
            }
            (AudioSource::Generated, _) => match (&record.narration, &record.music) {
                (None, None) => AudioPlan::Silent,
                (narration, music) => AudioPlan::Mixed {
                    narration: narration.clone(),
                    music: music.clone(),
                },
            },
        }
    }

    async fn concatenate(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()> {
        let list = self.workspace.concat_list_path();
        let partial = self.workspace.partial_output_path();

        write_concat_list(&list, clips).await?;

        if let Err(e) = self.engine.run(&concat_command(&list, &partial)).await {
            remove_files(&[partial]).await;
            return Err(e);
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        move_file(&partial, output).await?;

        info!(output = %output.display(), clips = clips.len(), "Final video written");
        Ok(())
    }
}
