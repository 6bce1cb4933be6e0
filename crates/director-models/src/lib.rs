//! Shared data models for the director agent.
//!
//! This crate provides Serde-serializable types for:
//! - Production manifests and scenes (the planner's output)
//! - Per-scene asset records (the producer's output)
//! - The canonical render profile every intermediate clip is encoded to

pub mod asset;
pub mod encoding;
pub mod manifest;
pub mod scene;
pub mod utils;

// Re-export common types
pub use asset::{AssetMap, AssetRecord, VisualAsset};
pub use encoding::RenderProfile;
pub use manifest::{ManifestError, ManifestResult, ProductionManifest};
pub use scene::{AudioSource, ImageStyle, Scene, SceneId, VisualType};
pub use utils::sanitize_filename;
