//! Director agent: topic in, finished video out.
//!
//! This crate provides:
//! - Planners that turn a topic into a [`ProductionManifest`](director_models::ProductionManifest)
//! - The reference cache shared by scenes of one reference group
//! - Concurrent per-scene asset production under a bounded worker pool
//! - Assembly of rendered scene clips into the final video
//! - Run configuration, structured logging and metrics

pub mod config;
pub mod director;
pub mod editor;
pub mod error;
pub mod gemini;
pub mod invoke;
pub mod logging;
pub mod metrics;
pub mod planner;
pub mod producer;
pub mod reference_cache;
pub mod report;
pub mod retry;
pub mod workspace;

pub use config::DirectorConfig;
pub use director::Director;
pub use editor::{AssemblyReport, Editor};
pub use error::{DirectorError, DirectorResult};
pub use gemini::GeminiPlanner;
pub use logging::RunLogger;
pub use planner::{ManifestFilePlanner, Planner};
pub use producer::{ProductionResults, SceneAssetProducer, SceneOutcome};
pub use reference_cache::{ReferenceCache, ReferenceCacheBuilder};
pub use report::{FailurePhase, ProductionReport, SceneFailure};
pub use retry::RetryConfig;
pub use workspace::RunWorkspace;
