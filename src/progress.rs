//! Progress-callback trait for per-posting pipeline events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress`] to receive real-time
//! events as the pipeline scores and composes each posting.
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal progress bar, a log aggregator, or a
//! channel without the library knowing how the host application
//! communicates. The trait is `Send + Sync` because the scoring and
//! composition stages run postings concurrently.

use std::sync::Arc;

/// Called by the pipeline as it processes each posting.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `on_posting_scored` and `on_posting_composed` may
/// be called concurrently from different tasks; implementations must guard
/// shared mutable state.
pub trait RunProgressCallback: Send + Sync {
    /// Called once with the number of postings that matched today's date.
    fn on_run_start(&self, total_postings: usize) {
        let _ = total_postings;
    }

    /// Called when a posting has been scored. `degraded` is true when the
    /// scoring oracle failed and the sentinel was substituted.
    fn on_posting_scored(&self, subject: &str, degraded: bool) {
        let _ = (subject, degraded);
    }

    /// Called when a posting's message has been composed. `degraded` is true
    /// when the templated fallback body was used.
    fn on_posting_composed(&self, subject: &str, degraded: bool) {
        let _ = (subject, degraded);
    }

    /// Called once after dispatch with the final counts.
    fn on_run_complete(&self, total_postings: usize, dispatched: usize) {
        let _ = (total_postings, dispatched);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopRunProgress;

impl RunProgressCallback for NoopRunProgress {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
