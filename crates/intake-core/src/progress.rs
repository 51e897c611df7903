use crate::policy::ExclusionDecision;

/// Trait for reporting scan progress.
///
/// CLI implements with indicatif; embedders forward to their own UI.
/// All methods have default no-op implementations and may be called from
/// several scan threads at once.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _session_id: u64, _roots: usize) {}
    fn on_scan_progress(&self, _items_scanned: usize, _current_path: &str) {}
    fn on_excluded(&self, _decision: &ExclusionDecision) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
