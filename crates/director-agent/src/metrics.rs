//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the binary does not install an
//! exporter, so these are no-ops unless an embedding application does.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const TOOL_INVOCATIONS_TOTAL: &str = "director_tool_invocations_total";
    pub const TOOL_DURATION_SECONDS: &str = "director_tool_duration_seconds";
    pub const SCENE_FAILURES_TOTAL: &str = "director_scene_failures_total";
    pub const CLIPS_RENDERED_TOTAL: &str = "director_clips_rendered_total";
    pub const RENDER_DURATION_SECONDS: &str = "director_render_duration_seconds";
}

/// Record one generator call and its outcome (`success` or an error kind).
pub fn record_tool_invocation(tool: &str, outcome: &str, duration_secs: f64) {
    let labels = [("tool", tool.to_string()), ("outcome", outcome.to_string())];
    counter!(names::TOOL_INVOCATIONS_TOTAL, &labels).increment(1);

    let labels = [("tool", tool.to_string())];
    histogram!(names::TOOL_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a scene lost at `phase`.
pub fn record_scene_failure(phase: &str) {
    let labels = [("phase", phase.to_string())];
    counter!(names::SCENE_FAILURES_TOTAL, &labels).increment(1);
}

/// Record one intermediate clip rendered.
pub fn record_clip_rendered(duration_secs: f64) {
    counter!(names::CLIPS_RENDERED_TOTAL).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS).record(duration_secs);
}
