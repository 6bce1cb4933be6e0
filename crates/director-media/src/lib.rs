#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for scene assembly.
//!
//! This crate provides:
//! - Type-safe, multi-input FFmpeg command building
//! - Progress parsing from `-progress pipe:2`, logged at debug level
//! - Per-scene render graphs normalized to one [`RenderProfile`](director_models::RenderProfile)
//! - Concat-demuxer list files for stream-copy concatenation
//! - FFprobe stream inspection
//! - The [`MediaEngine`] seam used by the assembly stage

pub mod command;
pub mod concat;
pub mod engine;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod render;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegInput, FfmpegRunner};
pub use concat::{concat_command, escape_concat_path, render_concat_list, write_concat_list};
pub use engine::{FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use filters::KenBurns;
pub use fs_utils::{move_file, remove_files};
pub use probe::{probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use render::{AudioPlan, RenderSource, SceneRender};
