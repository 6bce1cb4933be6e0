//! Top-level orchestration: plan, prefill references, produce, assemble.

use chrono::Utc;
use director_media::{FfmpegEngine, MediaEngine};
use director_models::{sanitize_filename, ProductionManifest};
use director_tools::{ProcessToolRunner, ToolRunner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::DirectorConfig;
use crate::editor::Editor;
use crate::error::{DirectorError, DirectorResult};
use crate::gemini::GeminiPlanner;
use crate::logging::RunLogger;
use crate::planner::Planner;
use crate::producer::SceneAssetProducer;
use crate::reference_cache::ReferenceCacheBuilder;
use crate::report::{merge_failures, ProductionReport};
use crate::workspace::RunWorkspace;

pub struct Director {
    config: DirectorConfig,
    planner: Arc<dyn Planner>,
    runner: Arc<dyn ToolRunner>,
    engine: Arc<dyn MediaEngine>,
}

impl Director {
    pub fn new(
        config: DirectorConfig,
        planner: Arc<dyn Planner>,
        runner: Arc<dyn ToolRunner>,
        engine: Arc<dyn MediaEngine>,
    ) -> Self {
        Self {
            config,
            planner,
            runner,
            engine,
        }
    }

    /// Director with the real generators, FFmpeg and the Gemini planner.
    pub fn from_config(config: DirectorConfig) -> DirectorResult<Self> {
        let runner: Arc<dyn ToolRunner> = Arc::new(process_runner(&config));
        let mut planner = GeminiPlanner::from_config(&config)?;
        if config.use_research {
            planner = planner.with_research(
                runner.clone(),
                config.commands.clone(),
                config.work_dir.join("research"),
            );
        }
        let engine = Arc::new(ffmpeg_engine(&config));
        Ok(Self::new(config, Arc::new(planner), runner, engine))
    }

    /// Director with the real generators and FFmpeg, and a caller-chosen planner.
    pub fn with_planner(config: DirectorConfig, planner: Arc<dyn Planner>) -> Self {
        let runner = Arc::new(process_runner(&config));
        let engine = Arc::new(ffmpeg_engine(&config));
        Self::new(config, planner, runner, engine)
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    /// Plan a video for `topic` and produce it to the default output path.
    pub async fn create_movie(&self, topic: &str) -> DirectorResult<ProductionReport> {
        let manifest = self.plan(topic).await?;
        self.produce_manifest(&manifest, None).await
    }

    pub async fn plan(&self, topic: &str) -> DirectorResult<ProductionManifest> {
        let manifest = self.planner.plan(topic).await?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// `<output_dir>/<sanitized title>.mp4`
    pub fn default_output_path(&self, manifest: &ProductionManifest) -> PathBuf {
        self.config
            .output_path_for(&sanitize_filename(&manifest.title))
    }

    /// Produce a planned manifest; `output` defaults to [`Self::default_output_path`].
    ///
    /// Lost scenes are listed in the report. Errors are reserved for run-wide
    /// failures: an invalid manifest, a reference image that cannot be
    /// generated, no scene rendered, or a failed concat. Once assembly has
    /// started, `report.json` is written whatever the outcome.
    pub async fn produce_manifest(
        &self,
        manifest: &ProductionManifest,
        output: Option<PathBuf>,
    ) -> DirectorResult<ProductionReport> {
        manifest.validate()?;

        let run_id = Uuid::new_v4().to_string();
        let logger = RunLogger::new(&run_id, "director");
        let output = output.unwrap_or_else(|| self.default_output_path(manifest));

        let span = logger.create_span();
        self.run(manifest, &output, &run_id, &logger)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        manifest: &ProductionManifest,
        output: &Path,
        run_id: &str,
        logger: &RunLogger,
    ) -> DirectorResult<ProductionReport> {
        let started_at = Utc::now();
        logger.log_start(&format!(
            "'{}' ({} scenes, {}s)",
            manifest.title,
            manifest.scenes.len(),
            manifest.computed_duration()
        ));

        let workspace = RunWorkspace::for_manifest(&self.config.work_dir, manifest);
        workspace.create().await?;
        workspace.write_manifest(manifest).await?;

        let mut references = ReferenceCacheBuilder::new(
            self.runner.clone(),
            self.config.commands.clone(),
            workspace.clone(),
        )
        .with_retry(self.config.tool_retry());
        references.prefill(manifest).await?;
        let references = references.finish();
        logger.log_progress(&format!("{} reference images ready", references.len()));

        let production = SceneAssetProducer::new(
            self.runner.clone(),
            self.config.commands.clone(),
            workspace.clone(),
            self.config.max_scene_parallel,
        )
        .with_retry(self.config.tool_retry())
        .with_logger(logger.for_operation("production"))
        .produce(manifest, &references)
        .await;

        let editor = Editor::new(self.engine.clone(), workspace.clone())
            .with_profile(self.config.profile.clone())
            .with_max_parallel(self.config.max_render_parallel)
            .with_ken_burns(self.config.ken_burns())
            .with_music_volume(self.config.music_volume)
            .with_logger(logger.for_operation("assembly"));

        let mut report = ProductionReport {
            run_id: run_id.to_string(),
            title: manifest.title.clone(),
            topic: manifest.topic.clone(),
            output: None,
            rendered: Vec::new(),
            failures: Vec::new(),
            started_at,
            finished_at: started_at,
        };

        let assembly = editor.assemble(manifest, &production.assets, output).await;
        let assembled = match assembly {
            Ok(assembly) => {
                report.output = Some(assembly.output);
                report.rendered = assembly.rendered;
                report.failures =
                    merge_failures(manifest, production.failures, assembly.failures);
                Ok(())
            }
            Err(DirectorError::NoScenesRendered { failed }) => {
                report.failures = merge_failures(manifest, production.failures, failed);
                Err(DirectorError::NoScenesRendered {
                    failed: report.failures.clone(),
                })
            }
            Err(DirectorError::Concatenation { source, failed }) => {
                report.failures = merge_failures(manifest, production.failures, failed);
                Err(DirectorError::Concatenation {
                    source,
                    failed: report.failures.clone(),
                })
            }
            Err(e) => {
                report.failures = production.failures;
                Err(e)
            }
        };

        // Written for failed assemblies too.
        report.finished_at = Utc::now();
        let report_path = workspace.write_report(&report).await?;
        if let Err(e) = assembled {
            logger.log_error(&format!("{e}, report at {}", report_path.display()));
            return Err(e);
        }

        logger.log_completion(&format!(
            "{} of {} scenes rendered in {}s, report at {}",
            report.rendered.len(),
            manifest.scenes.len(),
            report.elapsed_secs(),
            report_path.display()
        ));
        Ok(report)
    }
}

fn process_runner(config: &DirectorConfig) -> ProcessToolRunner {
    let runner = ProcessToolRunner::new();
    match config.tool_timeout {
        Some(timeout) => runner.with_timeout(timeout),
        None => runner,
    }
}

fn ffmpeg_engine(config: &DirectorConfig) -> FfmpegEngine {
    let engine = FfmpegEngine::new();
    match config.render_timeout {
        Some(timeout) => engine.with_timeout(timeout.as_secs()),
        None => engine,
    }
}
