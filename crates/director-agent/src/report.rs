//! Run reports and per-scene failure records.

use chrono::{DateTime, Utc};
use director_models::{ProductionManifest, SceneId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Stage at which a scene was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePhase {
    /// A generator call failed while producing assets
    Production,
    /// Rendering the intermediate clip failed
    Render,
    /// Assembly found no asset record for the scene
    MissingAssets,
}

impl FailurePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePhase::Production => "production",
            FailurePhase::Render => "render",
            FailurePhase::MissingAssets => "missing_assets",
        }
    }
}

impl fmt::Display for FailurePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one scene is missing from the final video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneFailure {
    pub scene_id: SceneId,
    pub phase: FailurePhase,
    pub message: String,
}

impl SceneFailure {
    pub fn new(scene_id: SceneId, phase: FailurePhase, message: impl Into<String>) -> Self {
        Self {
            scene_id,
            phase,
            message: message.into(),
        }
    }
}

impl fmt::Display for SceneFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene {} ({}): {}", self.scene_id, self.phase, self.message)
    }
}

/// Merge failure lists, keeping the earliest record per scene, ordered by manifest position.
pub fn merge_failures(
    manifest: &ProductionManifest,
    earlier: Vec<SceneFailure>,
    later: Vec<SceneFailure>,
) -> Vec<SceneFailure> {
    let mut seen = HashSet::new();
    let mut merged: Vec<SceneFailure> = earlier
        .into_iter()
        .chain(later)
        .filter(|f| seen.insert(f.scene_id))
        .collect();

    let position = |id: SceneId| {
        manifest
            .scenes
            .iter()
            .position(|s| s.id == id)
            .unwrap_or(usize::MAX)
    };
    merged.sort_by_key(|f| position(f.scene_id));
    merged
}

/// Outcome of a production run, written to `report.json` in the run workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionReport {
    pub run_id: String,
    pub title: String,
    pub topic: String,
    /// Final video; absent when the run produced nothing
    pub output: Option<PathBuf>,
    /// Scenes present in the final video, in order
    pub rendered: Vec<SceneId>,
    /// Scenes missing from the final video
    pub failures: Vec<SceneFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProductionReport {
    /// Whether every scene made it into the video.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<SceneId> {
        self.failures.iter().map(|f| f.scene_id).collect()
    }

    pub fn elapsed_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
