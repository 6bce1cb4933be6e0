//! The planning boundary: topic in, validated manifest out.

use async_trait::async_trait;
use director_models::ProductionManifest;
use std::path::PathBuf;
use tracing::info;

use crate::error::{DirectorError, DirectorResult};

/// Turns a topic into a production manifest.
///
/// Implementations must return a manifest that passed
/// [`ProductionManifest::validate`]; a malformed plan is a planning error.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, topic: &str) -> DirectorResult<ProductionManifest>;
}

/// Loads a hand-written or previously planned manifest from disk.
///
/// The topic is ignored; the file is the plan.
#[derive(Debug, Clone)]
pub struct ManifestFilePlanner {
    path: PathBuf,
}

impl ManifestFilePlanner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Planner for ManifestFilePlanner {
    async fn plan(&self, _topic: &str) -> DirectorResult<ProductionManifest> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DirectorError::planning(format!("Cannot read manifest {}: {}", self.path.display(), e))
        })?;
        let manifest = ProductionManifest::from_json(&text)?;
        info!(
            title = %manifest.title,
            scenes = manifest.scenes.len(),
            "Loaded manifest from {}",
            self.path.display()
        );
        Ok(manifest)
    }
}
