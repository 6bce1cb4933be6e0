//! `director`: turn a topic (or a manifest file) into a finished video.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use director_agent::config::load_env_files;
use director_agent::{
    Director, DirectorConfig, DirectorError, ManifestFilePlanner, ProductionReport,
};

#[derive(Debug, Parser)]
#[command(
    name = "director",
    version,
    about = "Plan, generate and edit a short video about a topic"
)]
struct Cli {
    /// Topic of the video
    #[arg(required_unless_present = "manifest")]
    topic: Option<String>,

    /// Produce this manifest instead of planning one
    #[arg(long, value_name = "JSON")]
    manifest: Option<PathBuf>,

    /// Directory for finished videos
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Exact output file (overrides --output-dir)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Root of per-run working directories
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// Scenes produced at once
    #[arg(long, value_name = "N")]
    parallel: Option<usize>,

    /// Render still images without pan/zoom
    #[arg(long)]
    no_ken_burns: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut DirectorConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.work_dir {
            config.work_dir = dir.clone();
        }
        if let Some(parallel) = self.parallel {
            config.max_scene_parallel = parallel.max(1);
        }
        if self.no_ken_burns {
            config.ken_burns = false;
        }
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("director={level}").parse()?)
        .add_directive(format!("director_agent={level}").parse()?)
        .add_directive(format!("director_tools={level}").parse()?)
        .add_directive(format!("director_media={level}").parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(verbose)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<ProductionReport> {
    let mut config = DirectorConfig::from_env();
    cli.apply(&mut config);
    config
        .ensure_dirs()
        .context("Failed to create output or working directory")?;
    director_media::check_ffmpeg().context("ffmpeg is required")?;

    info!("Director config: {:?}", config);

    let director = match &cli.manifest {
        Some(path) => Director::with_planner(config, Arc::new(ManifestFilePlanner::new(path))),
        None => Director::from_config(config)?,
    };

    let topic = cli.topic.as_deref().unwrap_or_default();
    let manifest = director.plan(topic).await?;
    info!(
        title = %manifest.title,
        scenes = manifest.scenes.len(),
        "Manifest ready"
    );

    Ok(director.produce_manifest(&manifest, cli.output.clone()).await?)
}

fn print_summary(report: &ProductionReport) {
    if let Some(output) = &report.output {
        println!("Premiere: {}", output.display());
    }
    if !report.failures.is_empty() {
        println!("Missing scenes:");
        for failure in &report.failures {
            println!("  {failure}");
        }
    }
}

#[tokio::main]
async fn main() {
    load_env_files();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    match run(cli).await {
        Ok(report) => {
            if !report.is_complete() {
                warn!(failed = report.failures.len(), "Video is missing scenes");
            }
            print_summary(&report);
        }
        Err(e) => {
            if let Some(director_error) = e.downcast_ref::<DirectorError>() {
                error!(phase = director_error.phase(), "Run failed: {:#}", e);
                for failure in director_error.scene_failures() {
                    eprintln!("  {failure}");
                }
            } else {
                error!("Run failed: {:#}", e);
            }
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
