//! Production manifest: the planner's shot list.
//!
//! The manifest is the only contract shared between planning, asset
//! production and assembly. It is validated once, up front, and treated as
//! immutable afterwards; per-scene derived state lives in
//! [`AssetRecord`](crate::AssetRecord)s instead.

use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::scene::{Scene, SceneId};
use crate::utils::sanitize_filename;

/// Errors raised while parsing or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Manifest JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest has no scenes")]
    NoScenes,

    #[error("Duplicate scene id {0}")]
    DuplicateSceneId(SceneId),

    #[error("Scene {0} has zero duration")]
    ZeroDuration(SceneId),

    #[error("Scene {0} has an empty visual prompt")]
    EmptyVisualPrompt(SceneId),

    #[error("Scene {0} has an empty reference group label")]
    EmptyReferenceGroup(SceneId),

    #[error(
        "Reference group '{group}' is used by scene {scene_id} but no scene defines its prompt"
    )]
    UndefinedReferenceGroup { group: String, scene_id: SceneId },

    #[error("Reference groups '{first}' and '{second}' both map to the file name '{stem}'")]
    ReferenceGroupCollision {
        first: String,
        second: String,
        stem: String,
    },
}

pub type ManifestResult<T> = Result<T, ManifestError>;

/// A complete production plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductionManifest {
    pub title: String,

    pub topic: String,

    /// Scenes in presentation order
    pub scenes: Vec<Scene>,

    /// Target length in seconds; informational only
    #[serde(default)]
    pub total_duration: u32,
}

impl ProductionManifest {
    /// Build a manifest, filling `total_duration` from the scenes.
    pub fn new(title: impl Into<String>, topic: impl Into<String>, scenes: Vec<Scene>) -> Self {
        let total_duration = scenes.iter().map(|s| s.duration).sum();
        Self {
            title: title.into(),
            topic: topic.into(),
            scenes,
            total_duration,
        }
    }

    /// Parse and validate a manifest from JSON.
    pub fn from_json(json: &str) -> ManifestResult<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_json_pretty(&self) -> ManifestResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON schema describing the manifest, for structured LLM output.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(ProductionManifest)
    }

    /// Check the structural rules production relies on.
    pub fn validate(&self) -> ManifestResult<()> {
        if self.scenes.is_empty() {
            return Err(ManifestError::NoScenes);
        }

        let mut seen = HashSet::with_capacity(self.scenes.len());
        for scene in &self.scenes {
            if !seen.insert(scene.id) {
                return Err(ManifestError::DuplicateSceneId(scene.id));
            }
            if scene.duration == 0 {
                return Err(ManifestError::ZeroDuration(scene.id));
            }
            if scene.visual_prompt.trim().is_empty() {
                return Err(ManifestError::EmptyVisualPrompt(scene.id));
            }
            if scene.reference_group.is_some() && scene.reference_label().is_none() {
                return Err(ManifestError::EmptyReferenceGroup(scene.id));
            }
        }

        // Reference images are stored under the sanitized label.
        let mut stems: HashMap<String, &str> = HashMap::new();
        for (label, _) in self.reference_definitions() {
            let stem = sanitize_filename(label);
            if let Some(first) = stems.get(&stem) {
                return Err(ManifestError::ReferenceGroupCollision {
                    first: first.to_string(),
                    second: label.to_string(),
                    stem,
                });
            }
            stems.insert(stem, label);
        }

        let defined: HashSet<&str> = stems.values().copied().collect();
        for scene in &self.scenes {
            if let Some(label) = scene.reference_label() {
                if !defined.contains(label) {
                    return Err(ManifestError::UndefinedReferenceGroup {
                        group: label.to_string(),
                        scene_id: scene.id,
                    });
                }
            }
        }

        Ok(())
    }

    /// Distinct reference groups with their defining prompt, in manifest order.
    ///
    /// The first scene carrying a label and a non-empty prompt defines the
    /// group; later prompts for the same label are ignored.
    pub fn reference_definitions(&self) -> Vec<(&str, &str)> {
        let mut seen = HashSet::new();
        self.scenes
            .iter()
            .filter_map(Scene::reference_definition)
            .filter(|(label, _)| seen.insert(*label))
            .collect()
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn scene_ids(&self) -> Vec<SceneId> {
        self.scenes.iter().map(|s| s.id).collect()
    }

    /// Sum of scene durations in seconds.
    pub fn computed_duration(&self) -> u32 {
        self.scenes.iter().map(|s| s.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{AudioSource, VisualType};

    fn scene(id: u32) -> Scene {
        Scene::new(id, 4, format!("Shot {id}"))
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "title": "Test Movie",
            "topic": "Testing",
            "total_duration": 10,
            "scenes": [
                {"id": 1, "duration": 6, "visual_type": "image", "image_style": "Infographic",
                 "visual_prompt": "A timeline", "audio_source": "generated",
                 "narration_text": "Once upon a time", "music_prompt": "calm"},
                {"id": 2, "duration": 4, "visual_prompt": "A ship", "audio_source": "native"}
            ]
        }"#;
        let manifest = ProductionManifest::from_json(json).unwrap();
        assert_eq!(manifest.scenes.len(), 2);
        assert_eq!(manifest.scenes[0].visual_type, VisualType::Image);
        assert_eq!(manifest.scenes[1].audio_source, AudioSource::Native);
        assert_eq!(manifest.computed_duration(), 10);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let json = r#"{"title": "T", "topic": "t", "hero_prompt": "someone", "total_duration": 4,
            "scenes": [{"id": 1, "duration": 4, "visual_prompt": "Shot 1"}]}"#;
        assert!(ProductionManifest::from_json(json).is_ok());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            ProductionManifest::from_json(r#"{"title": "T", "topic": "t", "scenes": [{"id": 1}]}"#),
            Err(ManifestError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_empty_scene_list() {
        let manifest = ProductionManifest::new("T", "t", vec![]);
        assert!(matches!(manifest.validate(), Err(ManifestError::NoScenes)));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let manifest = ProductionManifest::new("T", "t", vec![scene(1), scene(2), scene(1)]);
        assert!(matches!(
            manifest.validate(),
            Err(ManifestError::DuplicateSceneId(SceneId(1)))
        ));
    }

    #[test]
    fn test_rejects_zero_duration_and_blank_prompt() {
        let mut zero = scene(1);
        zero.duration = 0;
        assert!(matches!(
            ProductionManifest::new("T", "t", vec![zero]).validate(),
            Err(ManifestError::ZeroDuration(_))
        ));

        let blank = Scene::new(2, 4, "  ");
        assert!(matches!(
            ProductionManifest::new("T", "t", vec![blank]).validate(),
            Err(ManifestError::EmptyVisualPrompt(_))
        ));
    }

    #[test]
    fn test_undefined_reference_group() {
        let manifest = ProductionManifest::new(
            "T",
            "t",
            vec![scene(1).with_reference("boat", None)],
        );
        assert!(matches!(
            manifest.validate(),
            Err(ManifestError::UndefinedReferenceGroup { .. })
        ));
    }

    #[test]
    fn test_reference_defined_by_later_scene_is_valid() {
        let manifest = ProductionManifest::new(
            "T",
            "t",
            vec![
                scene(1).with_reference("boat", None),
                scene(2).with_reference("boat", Some("a red trawler")),
            ],
        );
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_rejects_labels_sharing_a_file_name() {
        let manifest = ProductionManifest::new(
            "T",
            "t",
            vec![
                scene(1).with_reference("Hero", Some("a red fox")),
                scene(2).with_reference("hero!", Some("a grey wolf")),
            ],
        );
        match manifest.validate() {
            Err(ManifestError::ReferenceGroupCollision {
                first,
                second,
                stem,
            }) => {
                assert_eq!((first.as_str(), second.as_str()), ("Hero", "hero!"));
                assert_eq!(stem, "hero");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let symbols = ProductionManifest::new(
            "T",
            "t",
            vec![
                scene(1).with_reference("???", Some("a lighthouse")),
                scene(2).with_reference("!!!", Some("a harbour")),
            ],
        );
        assert!(matches!(
            symbols.validate(),
            Err(ManifestError::ReferenceGroupCollision { .. })
        ));
    }

    #[test]
    fn test_reference_definitions_first_wins() {
        let manifest = ProductionManifest::new(
            "T",
            "t",
            vec![
                scene(3).with_reference("captain", Some("first prompt")),
                scene(1).with_reference("boat", Some("a boat")),
                scene(2).with_reference("captain", Some("second prompt")),
            ],
        );
        assert_eq!(
            manifest.reference_definitions(),
            vec![("captain", "first prompt"), ("boat", "a boat")]
        );
    }

    #[test]
    fn test_json_schema_mentions_scenes() {
        let schema = serde_json::to_string(&ProductionManifest::json_schema()).unwrap();
        assert!(schema.contains("visual_prompt"));
        assert!(schema.contains("audio_source"));
    }
}
