//! Per-scene asset records produced by the asset pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::scene::{SceneId, VisualType};

/// The visual file generated for a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "path", rename_all = "lowercase")]
pub enum VisualAsset {
    Video(PathBuf),
    Image(PathBuf),
}

impl VisualAsset {
    pub fn path(&self) -> &Path {
        match self {
            VisualAsset::Video(path) | VisualAsset::Image(path) => path,
        }
    }

    pub fn visual_type(&self) -> VisualType {
        match self {
            VisualAsset::Video(_) => VisualType::Video,
            VisualAsset::Image(_) => VisualType::Image,
        }
    }
}

/// Files generated for one scene. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssetRecord {
    pub scene_id: SceneId,

    pub visual: VisualAsset,

    /// Synthesized narration, when the scene has generated audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<PathBuf>,

    /// Synthesized background score, when the scene has generated audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<PathBuf>,
}

impl AssetRecord {
    pub fn new(scene_id: SceneId, visual: VisualAsset) -> Self {
        Self {
            scene_id,
            visual,
            narration: None,
            music: None,
        }
    }

    pub fn with_narration(mut self, path: Option<PathBuf>) -> Self {
        self.narration = path;
        self
    }

    pub fn with_music(mut self, path: Option<PathBuf>) -> Self {
        self.music = path;
        self
    }

    pub fn visual_type(&self) -> VisualType {
        self.visual.visual_type()
    }

    pub fn has_generated_audio(&self) -> bool {
        self.narration.is_some() || self.music.is_some()
    }
}

/// Asset records keyed by scene id.
pub type AssetMap = BTreeMap<SceneId, AssetRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visual_asset_serialization() {
        let asset = VisualAsset::Image(PathBuf::from("/tmp/scene_1/image.png"));
        let json = serde_json::to_string(&asset).unwrap();
        assert_eq!(json, r#"{"type":"image","path":"/tmp/scene_1/image.png"}"#);
        assert_eq!(asset.visual_type(), VisualType::Image);
    }

    #[test]
    fn test_record_audio_flags() {
        let record = AssetRecord::new(SceneId(4), VisualAsset::Video("v.mp4".into()));
        assert!(!record.has_generated_audio());

        let record = record.with_music(Some("score.mp3".into()));
        assert!(record.has_generated_audio());
        assert_eq!(record.visual_type(), VisualType::Video);
    }
}
