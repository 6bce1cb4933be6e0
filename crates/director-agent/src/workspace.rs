//! Per-run working directory layout.
//!
//! ```text
//! <work_dir>/<title>/
//!   manifest.json
//!   report.json
//!   ref_<group>.png
//!   scene_<id>/video.mp4 | image.png, narration.mp3, score.mp3
//!   clips/scene_<id>.mp4
//!   clips/concat.txt
//! ```
//!
//! Paths are deterministic so a rerun of the same manifest finds the assets
//! of the previous attempt.

use director_models::{sanitize_filename, ProductionManifest, SceneId, VisualType};
use std::path::{Path, PathBuf};

use crate::error::DirectorResult;
use crate::report::ProductionReport;

#[derive(Debug, Clone)]
pub struct RunWorkspace {
    root: PathBuf,
}

impl RunWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace for a manifest under `work_dir`, keyed by its title.
    pub fn for_manifest(work_dir: &Path, manifest: &ProductionManifest) -> Self {
        Self::new(work_dir.join(sanitize_filename(&manifest.title)))
    }

    /// Create the root and clips directories.
    pub async fn create(&self) -> DirectorResult<()> {
        tokio::fs::create_dir_all(self.clips_dir()).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scene_dir(&self, id: SceneId) -> PathBuf {
        self.root.join(format!("scene_{id}"))
    }

    pub fn visual_path(&self, id: SceneId, visual_type: VisualType) -> PathBuf {
        let name = match visual_type {
            VisualType::Video => "video.mp4",
            VisualType::Image => "image.png",
        };
        self.scene_dir(id).join(name)
    }

    pub fn narration_path(&self, id: SceneId) -> PathBuf {
        self.scene_dir(id).join("narration.mp3")
    }

    pub fn music_path(&self, id: SceneId) -> PathBuf {
        self.scene_dir(id).join("score.mp3")
    }

    /// Reference image for a group label.
    pub fn reference_path(&self, label: &str) -> PathBuf {
        self.root.join(format!("ref_{}.png", sanitize_filename(label)))
    }

    pub fn clips_dir(&self) -> PathBuf {
        self.root.join("clips")
    }

    pub fn clip_path(&self, id: SceneId) -> PathBuf {
        self.clips_dir().join(format!("scene_{id}.mp4"))
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.clips_dir().join("concat.txt")
    }

    /// Concat target; moved to the final output only on success.
    pub fn partial_output_path(&self) -> PathBuf {
        self.root.join("final.partial.mp4")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("manifest.json")
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join("report.json")
    }

    pub async fn write_manifest(&self, manifest: &ProductionManifest) -> DirectorResult<PathBuf> {
        let path = self.manifest_path();
        tokio::fs::write(&path, manifest.to_json_pretty()?).await?;
        Ok(path)
    }

    pub async fn write_report(&self, report: &ProductionReport) -> DirectorResult<PathBuf> {
        let path = self.report_path();
        tokio::fs::write(&path, serde_json::to_string_pretty(report)?).await?;
        Ok(path)
    }
}
