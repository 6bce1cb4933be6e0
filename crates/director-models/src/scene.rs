//! Scene definitions: one shot of a production.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default narration voice.
pub const DEFAULT_VOICE_ID: &str = "Charon";

/// Identifier of a scene, unique within a manifest.
///
/// Names the scene's working directory; it does not define ordering.
/// Manifest order does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SceneId(pub u32);

impl SceneId {
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SceneId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Kind of visual asset a scene is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum VisualType {
    /// Generated motion clip
    #[default]
    Video,
    /// Generated still image, animated at assembly time
    Image,
}

impl VisualType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualType::Video => "video",
            VisualType::Image => "image",
        }
    }
}

impl fmt::Display for VisualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualType {
    type Err = SceneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "video" => Ok(VisualType::Video),
            "image" => Ok(VisualType::Image),
            _ => Err(SceneParseError::VisualType(s.to_string())),
        }
    }
}

/// Where a scene's soundtrack comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioSource {
    /// The motion clip carries its own soundtrack
    Native,
    /// Narration and music are synthesized
    #[default]
    #[serde(alias = "default")]
    Generated,
    /// No audio track
    Silent,
}

impl AudioSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioSource::Native => "native",
            AudioSource::Generated => "generated",
            AudioSource::Silent => "silent",
        }
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioSource {
    type Err = SceneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(AudioSource::Native),
            "generated" | "default" => Ok(AudioSource::Generated),
            "silent" => Ok(AudioSource::Silent),
            _ => Err(SceneParseError::AudioSource(s.to_string())),
        }
    }
}

/// Style tag handed to the still-image generator.
///
/// Unknown tags are kept verbatim so planners can experiment with new looks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ImageStyle {
    #[default]
    Cinematic,
    Infographic,
    Model3d,
    VintageMap,
    Watercolor,
    Custom(String),
}

impl ImageStyle {
    /// Known styles, in the order the planner is told about them.
    pub const KNOWN: &'static [ImageStyle] = &[
        ImageStyle::Cinematic,
        ImageStyle::Infographic,
        ImageStyle::Model3d,
        ImageStyle::VintageMap,
        ImageStyle::Watercolor,
    ];

    /// Returns the tag as passed to the generator.
    pub fn as_str(&self) -> &str {
        match self {
            ImageStyle::Cinematic => "Cinematic",
            ImageStyle::Infographic => "Infographic",
            ImageStyle::Model3d => "3D Model",
            ImageStyle::VintageMap => "Vintage Map",
            ImageStyle::Watercolor => "Watercolor",
            ImageStyle::Custom(tag) => tag,
        }
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ImageStyle {
    fn from(tag: String) -> Self {
        let normalized = tag.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "cinematic" => ImageStyle::Cinematic,
            "infographic" => ImageStyle::Infographic,
            "3d model" | "3d" => ImageStyle::Model3d,
            "vintage map" => ImageStyle::VintageMap,
            "watercolor" => ImageStyle::Watercolor,
            _ => ImageStyle::Custom(tag),
        }
    }
}

impl From<&str> for ImageStyle {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<ImageStyle> for String {
    fn from(style: ImageStyle) -> Self {
        style.as_str().to_string()
    }
}

impl JsonSchema for ImageStyle {
    fn schema_name() -> String {
        "ImageStyle".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <String as JsonSchema>::json_schema(gen)
    }
}

#[derive(Debug, Error)]
pub enum SceneParseError {
    #[error("Unknown visual type: {0}")]
    VisualType(String),
    #[error("Unknown audio source: {0}")]
    AudioSource(String),
}

/// One shot in the production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Unique scene identifier
    pub id: SceneId,

    /// Duration in whole seconds
    pub duration: u32,

    /// Motion clip or still image
    #[serde(default)]
    pub visual_type: VisualType,

    /// Prompt for the visual generator
    pub visual_prompt: String,

    /// Style tag; only meaningful for still images
    #[serde(default)]
    pub image_style: ImageStyle,

    /// Scenes sharing a label share one generated reference image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_group: Option<String>,

    /// Prompt for the group's reference image, set on the defining scene
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_prompt: Option<String>,

    #[serde(default)]
    pub audio_source: AudioSource,

    /// Narration script (generated audio only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration_text: Option<String>,

    /// Narration voice
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    /// Background music prompt (generated audio only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_prompt: Option<String>,
}

fn default_voice_id() -> String {
    DEFAULT_VOICE_ID.to_string()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Scene {
    /// Create a scene with default style and audio settings.
    pub fn new(id: impl Into<SceneId>, duration: u32, visual_prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            duration,
            visual_type: VisualType::default(),
            visual_prompt: visual_prompt.into(),
            image_style: ImageStyle::default(),
            reference_group: None,
            reference_prompt: None,
            audio_source: AudioSource::default(),
            narration_text: None,
            voice_id: default_voice_id(),
            music_prompt: None,
        }
    }

    pub fn with_visual_type(mut self, visual_type: VisualType) -> Self {
        self.visual_type = visual_type;
        self
    }

    pub fn with_image_style(mut self, style: impl Into<ImageStyle>) -> Self {
        self.image_style = style.into();
        self
    }

    pub fn with_audio_source(mut self, source: AudioSource) -> Self {
        self.audio_source = source;
        self
    }

    pub fn with_narration(mut self, text: impl Into<String>) -> Self {
        self.narration_text = Some(text.into());
        self
    }

    pub fn with_music(mut self, prompt: impl Into<String>) -> Self {
        self.music_prompt = Some(prompt.into());
        self
    }

    /// Join a reference group; pass a prompt on the group's defining scene.
    pub fn with_reference(mut self, group: impl Into<String>, prompt: Option<&str>) -> Self {
        self.reference_group = Some(group.into());
        self.reference_prompt = prompt.map(str::to_string);
        self
    }

    /// Whether narration and music should be synthesized for this scene.
    ///
    /// Only `generated` scenes ever get synthesized tracks; `native` wins even
    /// when narration or music text is present.
    pub fn wants_generated_audio(&self) -> bool {
        self.audio_source == AudioSource::Generated
    }

    /// Narration script to synthesize, if any.
    pub fn narration(&self) -> Option<&str> {
        if self.wants_generated_audio() {
            non_blank(&self.narration_text)
        } else {
            None
        }
    }

    /// Music prompt to synthesize, if any.
    pub fn music(&self) -> Option<&str> {
        if self.wants_generated_audio() {
            non_blank(&self.music_prompt)
        } else {
            None
        }
    }

    /// The reference group this scene reads from.
    pub fn reference_label(&self) -> Option<&str> {
        non_blank(&self.reference_group)
    }

    /// `(label, prompt)` when this scene can define its group's reference.
    pub fn reference_definition(&self) -> Option<(&str, &str)> {
        Some((self.reference_label()?, non_blank(&self.reference_prompt)?))
    }
}
