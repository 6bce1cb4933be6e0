//! Invocation of the external generative tools.
//!
//! Every generator (motion clip, still image, narration, music, research) is
//! an argument-vector command that must exit zero and leave a non-empty
//! output file behind. [`ToolRunner`] is the seam the rest of the system
//! depends on; [`ProcessToolRunner`] is the real implementation.

pub mod error;
pub mod generators;
pub mod invocation;
pub mod runner;

pub use error::{ToolError, ToolResult};
pub use generators::{snap_motion_duration, GeneratorCommands, MOTION_CLIP_DURATIONS};
pub use invocation::{ToolInvocation, ToolKind, ToolRunner};
pub use runner::{is_complete_file, ProcessToolRunner};
