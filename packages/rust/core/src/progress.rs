//! Progress callbacks shared by the batch stages and the single-shot pipeline.

use tailor_shared::TailorError;

use crate::pipeline::PipelineStep;

/// Progress callback for reporting stage status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Item-level progress within the current phase (1-based).
    fn item(&self, current: usize, total: usize, detail: &str);
    /// A single item failed; the batch continues.
    fn item_failed(&self, detail: &str, error: &TailorError);
    /// A single-shot pipeline step failed; the run stops.
    fn step_failed(&self, step: PipelineStep, error: &TailorError);
    /// Called when the stage completes.
    fn done(&self, summary: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item(&self, _current: usize, _total: usize, _detail: &str) {}
    fn item_failed(&self, _detail: &str, _error: &TailorError) {}
    fn step_failed(&self, _step: PipelineStep, _error: &TailorError) {}
    fn done(&self, _summary: &str) {}
}
