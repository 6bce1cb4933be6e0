//! Concurrent per-scene asset production.
//!
//! Every scene runs in its own task; a semaphore bounds how many talk to the
//! generators at once. A scene that fails (or panics) becomes a
//! [`SceneFailure`] and never takes the run down with it.

use director_models::{
    AssetMap, AssetRecord, ProductionManifest, Scene, SceneId, VisualAsset, VisualType,
};
use director_tools::{
    is_complete_file, snap_motion_duration, GeneratorCommands, ToolInvocation, ToolResult,
    ToolRunner,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn, Instrument};

use crate::error::DirectorResult;
use crate::invoke::invoke_tool;
use crate::logging::RunLogger;
use crate::metrics;
use crate::reference_cache::ReferenceCache;
use crate::report::{FailurePhase, SceneFailure};
use crate::retry::RetryConfig;
use crate::workspace::RunWorkspace;

/// Result of one scene's production task.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneOutcome {
    Produced(AssetRecord),
    Failed(SceneFailure),
}

/// Assets for the scenes that succeeded and failures for the rest.
#[derive(Debug, Clone, Default)]
pub struct ProductionResults {
    pub assets: AssetMap,
    /// In manifest order
    pub failures: Vec<SceneFailure>,
}

impl ProductionResults {
    pub fn failed_ids(&self) -> Vec<SceneId> {
        self.failures.iter().map(|f| f.scene_id).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone)]
pub struct SceneAssetProducer {
    runner: Arc<dyn ToolRunner>,
    commands: Arc<GeneratorCommands>,
    workspace: Arc<RunWorkspace>,
    max_parallel: usize,
    retry: RetryConfig,
    logger: RunLogger,
}

impl SceneAssetProducer {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        commands: GeneratorCommands,
        workspace: RunWorkspace,
        max_parallel: usize,
    ) -> Self {
        Self {
            runner,
            commands: Arc::new(commands),
            workspace: Arc::new(workspace),
            max_parallel: max_parallel.max(1),
            retry: RetryConfig::none(),
            logger: RunLogger::new("local", "production"),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_logger(mut self, logger: RunLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Produce assets for every scene of the manifest.
    pub async fn produce(
        &self,
        manifest: &ProductionManifest,
        references: &ReferenceCache,
    ) -> ProductionResults {
        self.logger.log_start(&format!(
            "{} scenes, {} at a time",
            manifest.scenes.len(),
            self.max_parallel
        ));

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = JoinSet::new();

        for scene in &manifest.scenes {
            let producer = self.clone();
            let scene = scene.clone();
            let reference = scene
                .reference_label()
                .and_then(|label| references.get(label))
                .map(Path::to_path_buf);
            let semaphore = semaphore.clone();
            let span = self.logger.scene_span(scene.id);

            tasks.spawn(
                async move {
                    let id = scene.id;
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return SceneOutcome::Failed(SceneFailure::new(
                                id,
                                FailurePhase::Production,
                                "worker pool closed",
                            ))
                        }
                    };

                    let work = producer.produce_scene(&scene, reference.as_deref());
                    match AssertUnwindSafe(work).catch_unwind().await {
                        Ok(Ok(record)) => SceneOutcome::Produced(record),
                        Ok(Err(e)) => SceneOutcome::Failed(SceneFailure::new(
                            id,
                            FailurePhase::Production,
                            e.to_string(),
                        )),
                        Err(_) => SceneOutcome::Failed(SceneFailure::new(
                            id,
                            FailurePhase::Production,
                            "scene task panicked",
                        )),
                    }
                }
                .instrument(span),
            );
        }

        let mut results = ProductionResults::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(SceneOutcome::Produced(record)) => {
                    debug!(scene_id = record.scene_id.get(), "Scene assets ready");
                    results.assets.insert(record.scene_id, record);
                }
                Ok(SceneOutcome::Failed(failure)) => results.failures.push(failure),
                Err(e) => warn!("Scene task did not complete: {}", e),
            }
        }

        // Tasks lost to cancellation still have to be reported.
        for scene in &manifest.scenes {
            let known = results.assets.contains_key(&scene.id)
                || results.failures.iter().any(|f| f.scene_id == scene.id);
            if !known {
                results.failures.push(SceneFailure::new(
                    scene.id,
                    FailurePhase::Production,
                    "task aborted",
                ));
            }
        }

        let position = |id: SceneId| manifest.scenes.iter().position(|s| s.id == id);
        results.failures.sort_by_key(|f| position(f.scene_id));

        for failure in &results.failures {
            self.logger.log_scene_failure(failure.scene_id, &failure.message);
            metrics::record_scene_failure(failure.phase.as_str());
        }
        self.logger.log_completion(&format!(
            "{} produced, {} failed",
            results.assets.len(),
            results.failures.len()
        ));
        results
    }

    async fn produce_scene(
        &self,
        scene: &Scene,
        reference: Option<&Path>,
    ) -> DirectorResult<AssetRecord> {
        tokio::fs::create_dir_all(self.workspace.scene_dir(scene.id)).await?;

        let (visual, narration, music) = tokio::try_join!(
            self.visual(scene, reference),
            self.narration(scene),
            self.music(scene),
        )?;

        Ok(AssetRecord::new(scene.id, visual)
            .with_narration(narration)
            .with_music(music))
    }

    async fn visual(&self, scene: &Scene, reference: Option<&Path>) -> ToolResult<VisualAsset> {
        let path = self.workspace.visual_path(scene.id, scene.visual_type);

        if is_complete_file(&path).await {
            debug!(scene_id = scene.id.get(), "Visual cached");
        } else {
            let invocation = match scene.visual_type {
                VisualType::Video => {
                    let duration = snap_motion_duration(scene.duration);
                    if duration != scene.duration {
                        warn!(
                            scene_id = scene.id.get(),
                            requested = scene.duration,
                            used = duration,
                            "Motion clip length not supported by the generator, snapping"
                        );
                    }
                    self.commands
                        .motion_clip(&scene.visual_prompt, duration, &path, reference)
                }
                VisualType::Image => self.commands.still_image(
                    &scene.visual_prompt,
                    &scene.image_style,
                    &path,
                    reference,
                ),
            };
            self.invoke(&invocation).await?;
        }

        Ok(match scene.visual_type {
            VisualType::Video => VisualAsset::Video(path),
            VisualType::Image => VisualAsset::Image(path),
        })
    }

    async fn narration(&self, scene: &Scene) -> ToolResult<Option<PathBuf>> {
        let Some(text) = scene.narration() else {
            return Ok(None);
        };

        let path = self.workspace.narration_path(scene.id);
        if !is_complete_file(&path).await {
            let invocation = self.commands.narration(text, &scene.voice_id, &path);
            self.invoke(&invocation).await?;
        }
        Ok(Some(path))
    }

    async fn music(&self, scene: &Scene) -> ToolResult<Option<PathBuf>> {
        let Some(prompt) = scene.music() else {
            return Ok(None);
        };

        let path = self.workspace.music_path(scene.id);
        if !is_complete_file(&path).await {
            let invocation = self.commands.music(prompt, scene.duration, &path);
            self.invoke(&invocation).await?;
        }
        Ok(Some(path))
    }

    async fn invoke(&self, invocation: &ToolInvocation) -> ToolResult<PathBuf> {
        invoke_tool(self.runner.as_ref(), invocation, &self.retry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use director_models::AudioSource;
    use director_tools::ToolKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        invocations: Mutex<Vec<ToolInvocation>>,
        panic_on: Option<ToolKind>,
    }

    #[async_trait]
    impl ToolRunner for Recorder {
        async fn invoke(&self, invocation: &ToolInvocation) -> ToolResult<PathBuf> {
            self.invocations.lock().unwrap().push(invocation.clone());
            if self.panic_on == Some(invocation.tool) {
                panic!("generator crashed");
            }
            std::fs::write(invocation.output(), b"data").unwrap();
            Ok(invocation.output().to_path_buf())
        }
    }

    /// Tracks how many generator calls are running at once.
    #[derive(Default)]
    struct Gauge {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ToolRunner for Gauge {
        async fn invoke(&self, invocation: &ToolInvocation) -> ToolResult<PathBuf> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            std::fs::write(invocation.output(), b"data").unwrap();
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(invocation.output().to_path_buf())
        }
    }

    fn producer(tmp: &TempDir, runner: Arc<Recorder>) -> SceneAssetProducer {
        SceneAssetProducer::new(
            runner,
            GeneratorCommands::default(),
            RunWorkspace::new(tmp.path()),
            2,
        )
    }

    #[tokio::test]
    async fn test_motion_clip_duration_is_snapped() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(Recorder::default());
        let manifest = ProductionManifest::new(
            "T",
            "t",
            vec![Scene::new(1, 5, "waves").with_audio_source(AudioSource::Native)],
        );

        let results = producer(&tmp, runner.clone())
            .produce(&manifest, &ReferenceCache::empty())
            .await;

        assert!(results.is_complete());
        let invocations = runner.invocations.lock().unwrap();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].flag_value("--duration"), Some("6"));
    }

    #[tokio::test]
    async fn test_panicking_scene_becomes_failure() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(Recorder {
            panic_on: Some(ToolKind::Music),
            ..Default::default()
        });
        let manifest = ProductionManifest::new(
            "T",
            "t",
            vec![
                Scene::new(1, 4, "a").with_audio_source(AudioSource::Silent),
                Scene::new(2, 4, "b").with_music("drums"),
            ],
        );

        let results = producer(&tmp, runner)
            .produce(&manifest, &ReferenceCache::empty())
            .await;

        assert_eq!(results.assets.len(), 1);
        assert_eq!(results.failed_ids(), vec![SceneId(2)]);
        assert_eq!(results.failures[0].message, "scene task panicked");
    }

    #[tokio::test]
    async fn test_generated_scene_records_tracks() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(Recorder::default());
        let manifest = ProductionManifest::new(
            "T",
            "t",
            vec![Scene::new(1, 4, "map")
                .with_visual_type(VisualType::Image)
                .with_narration("In 1492...")
                .with_music("strings")],
        );

        let results = producer(&tmp, runner)
            .produce(&manifest, &ReferenceCache::empty())
            .await;

        let record = &results.assets[&SceneId(1)];
        assert_eq!(record.visual_type(), VisualType::Image);
        assert!(record.narration.is_some());
        assert!(record.music.is_some());
    }

    #[tokio::test]
    async fn test_pool_width_bounds_concurrent_scenes() {
        let tmp = TempDir::new().unwrap();
        let gauge = Arc::new(Gauge::default());
        // Silent scenes make exactly one generator call each.
        let scenes = (1..=6u32)
            .map(|id| Scene::new(id, 4, "shot").with_audio_source(AudioSource::Silent))
            .collect();
        let manifest = ProductionManifest::new("T", "t", scenes);

        let results = SceneAssetProducer::new(
            gauge.clone(),
            GeneratorCommands::default(),
            RunWorkspace::new(tmp.path()),
            2,
        )
        .produce(&manifest, &ReferenceCache::empty())
        .await;

        assert_eq!(results.assets.len(), 6);
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 2);
        assert_eq!(gauge.in_flight.load(Ordering::SeqCst), 0);
    }
}
