//! Director configuration.
//!
//! Built once at process start and handed to every component; nothing reads
//! the environment after that.

use director_media::filters::{DEFAULT_KEN_BURNS_MAX_ZOOM, DEFAULT_MUSIC_VOLUME};
use director_media::KenBurns;
use director_models::RenderProfile;
use director_tools::GeneratorCommands;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryConfig;

/// Default Gemini endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Planner models, tried in order.
pub const DEFAULT_PLANNER_MODELS: &[&str] = &["gemini-2.5-pro", "gemini-2.5-flash"];

/// API key wrapper that never prints its value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Director configuration.
#[derive(Debug, Clone)]
pub struct DirectorConfig {
    /// Gemini API key for the planner
    pub gemini_api_key: Option<ApiKey>,
    /// Gemini API base URL
    pub gemini_base_url: String,
    /// Planner models in fallback order
    pub planner_models: Vec<String>,
    /// Run the research tool before planning
    pub use_research: bool,
    /// Generator executables
    pub commands: GeneratorCommands,
    /// Where finished videos go
    pub output_dir: PathBuf,
    /// Root of per-run working directories
    pub work_dir: PathBuf,
    /// Scenes producing assets at once (sized for API rate limits)
    pub max_scene_parallel: usize,
    /// Scene clips rendering at once
    pub max_render_parallel: usize,
    /// Per generator call timeout
    pub tool_timeout: Option<Duration>,
    /// Per FFmpeg run timeout
    pub render_timeout: Option<Duration>,
    /// Retries per generator call (0 disables)
    pub tool_max_retries: u32,
    /// First retry delay, doubled each attempt
    pub tool_retry_base_delay: Duration,
    /// Pan/zoom still images
    pub ken_burns: bool,
    pub ken_burns_max_zoom: f64,
    /// Background music level under narration
    pub music_volume: f64,
    /// Target profile for intermediate clips
    pub profile: RenderProfile,
}

fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Movies"))
        .unwrap_or_else(|| PathBuf::from("Movies"))
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            planner_models: DEFAULT_PLANNER_MODELS.iter().map(|m| m.to_string()).collect(),
            use_research: false,
            commands: GeneratorCommands::default(),
            output_dir: default_output_dir(),
            work_dir: PathBuf::from("/tmp/director_agent"),
            max_scene_parallel: 3,
            max_render_parallel: 2,
            tool_timeout: Some(Duration::from_secs(900)), // 15 minutes
            render_timeout: Some(Duration::from_secs(600)),
            tool_max_retries: 0,
            tool_retry_base_delay: Duration::from_secs(2),
            ken_burns: true,
            ken_burns_max_zoom: DEFAULT_KEN_BURNS_MAX_ZOOM,
            music_volume: DEFAULT_MUSIC_VOLUME,
            profile: RenderProfile::default(),
        }
    }
}

/// `.env` file in the user config directory (`~/.config/director-agent/.env`).
pub fn user_env_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("director-agent").join(".env"))
}

/// Load `.env` files into the process environment.
///
/// Real environment variables win, then the local `.env`, then the user one.
pub fn load_env_files() {
    dotenvy::dotenv().ok();
    if let Some(path) = user_env_file() {
        dotenvy::from_path(path).ok();
    }
}

impl DirectorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parse = |key: &str| get(key).and_then(|v| v.parse::<u64>().ok());

        let secs = |key: &str, default: Option<Duration>| match parse(key) {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => default,
        };

        let commands = GeneratorCommands {
            motion_clip: get("VEO_CMD").unwrap_or(defaults.commands.motion_clip),
            still_image: get("IMAGE_CMD").unwrap_or(defaults.commands.still_image),
            narration: get("TTS_CMD").unwrap_or(defaults.commands.narration),
            music: get("MUSIC_CMD").unwrap_or(defaults.commands.music),
            research: get("DEEP_RESEARCH_CMD").unwrap_or(defaults.commands.research),
        };

        Self {
            gemini_api_key: get("GEMINI_API_KEY").map(ApiKey::new),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            planner_models: get("DIRECTOR_PLANNER_MODEL")
                .map(|v| {
                    v.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.planner_models),
            use_research: get("DIRECTOR_USE_RESEARCH")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.use_research),
            commands,
            output_dir: get("DIRECTOR_OUTPUT_DIR")
                .map(|v| expand_home(&v))
                .unwrap_or(defaults.output_dir),
            work_dir: get("DIRECTOR_WORK_DIR")
                .map(|v| expand_home(&v))
                .unwrap_or(defaults.work_dir),
            max_scene_parallel: parse_or(
                &get,
                "DIRECTOR_MAX_SCENE_PARALLEL",
                defaults.max_scene_parallel,
            )
            .max(1),
            max_render_parallel: parse_or(
                &get,
                "DIRECTOR_MAX_RENDER_PARALLEL",
                defaults.max_render_parallel,
            )
            .max(1),
            tool_timeout: secs("DIRECTOR_TOOL_TIMEOUT_SECS", defaults.tool_timeout),
            render_timeout: secs("DIRECTOR_RENDER_TIMEOUT_SECS", defaults.render_timeout),
            tool_max_retries: parse_or(&get, "DIRECTOR_TOOL_RETRIES", defaults.tool_max_retries),
            tool_retry_base_delay: defaults.tool_retry_base_delay,
            ken_burns: get("DIRECTOR_KEN_BURNS")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.ken_burns),
            ken_burns_max_zoom: parse_or(
                &get,
                "DIRECTOR_KEN_BURNS_ZOOM",
                defaults.ken_burns_max_zoom,
            ),
            music_volume: parse_or(&get, "DIRECTOR_MUSIC_VOLUME", defaults.music_volume),
            profile: defaults.profile,
        }
    }

    /// Ensure output and working directories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        std::fs::create_dir_all(&self.work_dir)?;
        Ok(())
    }

    /// Ken Burns settings, when enabled.
    pub fn ken_burns(&self) -> Option<KenBurns> {
        self.ken_burns.then_some(KenBurns {
            max_zoom: self.ken_burns_max_zoom,
        })
    }

    /// Retry policy for generator calls.
    pub fn tool_retry(&self) -> RetryConfig {
        RetryConfig::new("tool_invocation")
            .with_max_retries(self.tool_max_retries)
            .with_base_delay(self.tool_retry_base_delay)
    }

    /// Default location of a finished video.
    pub fn output_path_for(&self, file_stem: &str) -> PathBuf {
        self.output_dir.join(format!("{file_stem}.mp4"))
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> T
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| Path::new(value).to_path_buf()),
        None => PathBuf::from(value),
    }
}
