//! Reference images shared across scenes of one reference group.
//!
//! Filling the cache takes `&mut ReferenceCacheBuilder`, so generation is
//! serialized. Production only accepts the frozen [`ReferenceCache`], so no
//! scene can start before every group has its image.

use director_models::{ImageStyle, ManifestError, ProductionManifest};
use director_tools::{is_complete_file, GeneratorCommands, ToolRunner};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{DirectorError, DirectorResult};
use crate::invoke::invoke_tool;
use crate::retry::RetryConfig;
use crate::workspace::RunWorkspace;

pub struct ReferenceCacheBuilder {
    runner: Arc<dyn ToolRunner>,
    commands: GeneratorCommands,
    workspace: RunWorkspace,
    retry: RetryConfig,
    entries: BTreeMap<String, PathBuf>,
}

impl ReferenceCacheBuilder {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        commands: GeneratorCommands,
        workspace: RunWorkspace,
    ) -> Self {
        Self {
            runner,
            commands,
            workspace,
            retry: RetryConfig::none(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Path of the reference image for `label`, generating it if absent.
    ///
    /// An image already on disk is reused whatever prompt produced it. Two
    /// labels that share a file name are rejected.
    pub async fn ensure(&mut self, label: &str, prompt: &str) -> DirectorResult<PathBuf> {
        if let Some(path) = self.entries.get(label) {
            return Ok(path.clone());
        }

        let path = self.workspace.reference_path(label);
        if let Some((first, _)) = self.entries.iter().find(|(_, p)| **p == path) {
            return Err(ManifestError::ReferenceGroupCollision {
                first: first.clone(),
                second: label.to_string(),
                stem: director_models::sanitize_filename(label),
            }
            .into());
        }
        if is_complete_file(&path).await {
            debug!(group = label, path = %path.display(), "Reference image cached");
        } else {
            info!(group = label, "Generating reference image");
            let invocation = self
                .commands
                .still_image(prompt, &ImageStyle::Cinematic, &path, None);
            invoke_tool(self.runner.as_ref(), &invocation, &self.retry)
                .await
                .map_err(|source| DirectorError::ReferenceGeneration {
                    group: label.to_string(),
                    source,
                })?;
        }

        self.entries.insert(label.to_string(), path.clone());
        Ok(path)
    }

    /// Ensure every reference group of the manifest, in manifest order.
    pub async fn prefill(&mut self, manifest: &ProductionManifest) -> DirectorResult<()> {
        for (label, prompt) in manifest.reference_definitions() {
            self.ensure(label, prompt).await?;
        }
        Ok(())
    }

    pub fn finish(self) -> ReferenceCache {
        ReferenceCache {
            entries: self.entries,
        }
    }
}

/// Read-only reference images, keyed by group label.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCache {
    entries: BTreeMap<String, PathBuf>,
}

impl ReferenceCache {
    /// An empty cache, for manifests without reference groups.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&Path> {
        self.entries.get(label).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use director_models::Scene;
    use director_tools::{ToolError, ToolInvocation, ToolKind, ToolResult};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingRunner {
        calls: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    #[async_trait]
    impl ToolRunner for CountingRunner {
        async fn invoke(&self, invocation: &ToolInvocation) -> ToolResult<PathBuf> {
            self.calls.lock().unwrap().push(invocation.output().to_path_buf());
            if self.fail {
                return Err(ToolError::Failed {
                    tool: ToolKind::StillImage,
                    exit_code: Some(1),
                    stdout: String::new(),
                    stderr: "quota exceeded".to_string(),
                });
            }
            std::fs::write(invocation.output(), b"png").unwrap();
            Ok(invocation.output().to_path_buf())
        }
    }

    fn builder(tmp: &TempDir, runner: Arc<CountingRunner>) -> ReferenceCacheBuilder {
        let workspace = RunWorkspace::new(tmp.path());
        ReferenceCacheBuilder::new(runner, GeneratorCommands::default(), workspace)
    }

    #[tokio::test]
    async fn test_ensure_generates_once() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(CountingRunner::default());
        let mut cache = builder(&tmp, runner.clone());

        let first = cache.ensure("hero", "a red fox").await.unwrap();
        let second = cache.ensure("hero", "a red fox").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_reuses_file_on_disk() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(CountingRunner::default());
        let mut cache = builder(&tmp, runner.clone());
        std::fs::write(RunWorkspace::new(tmp.path()).reference_path("hero"), b"png").unwrap();

        cache.ensure("hero", "a different prompt").await.unwrap();

        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_labels_sharing_a_file_are_not_merged() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(CountingRunner::default());
        let mut cache = builder(&tmp, runner.clone());

        cache.ensure("Hero", "a red fox").await.unwrap();
        let err = cache.ensure("hero!", "a grey wolf").await.unwrap_err();

        assert!(matches!(
            err,
            DirectorError::Manifest(ManifestError::ReferenceGroupCollision { .. })
        ));
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prefill_failure_names_group() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(CountingRunner {
            fail: true,
            ..Default::default()
        });
        let manifest = ProductionManifest::new(
            "T",
            "t",
            vec![Scene::new(1, 4, "x").with_reference("ship", Some("a galleon"))],
        );

        let err = builder(&tmp, runner).prefill(&manifest).await.unwrap_err();
        match err {
            DirectorError::ReferenceGeneration { group, source } => {
                assert_eq!(group, "ship");
                assert_eq!(source.stderr(), Some("quota exceeded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_finish_exposes_paths() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(CountingRunner::default());
        let manifest = ProductionManifest::new(
            "T",
            "t",
            vec![
                Scene::new(1, 4, "x").with_reference("ship", Some("a galleon")),
                Scene::new(2, 4, "y").with_reference("ship", None),
            ],
        );
        let mut cache = builder(&tmp, runner);
        cache.prefill(&manifest).await.unwrap();
        let cache = cache.finish();

        assert_eq!(cache.len(), 1);
        assert!(cache.get("ship").is_some());
        assert!(cache.get("crew").is_none());
    }
}
