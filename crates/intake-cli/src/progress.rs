use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use intake_core::{ExclusionDecision, ProgressReporter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// CLI progress reporter: a spinner while the tree is scanned.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
    excluded: AtomicUsize,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            excluded: AtomicUsize::new(0),
        }
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, _session_id: u64, roots: usize) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(format!("Scanning {} dropped item(s)...", roots));
        pb.enable_steady_tick(Duration::from_millis(80));

        let mut guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = guard.replace(pb) {
            old.finish_and_clear();
        }
    }

    fn on_scan_progress(&self, items_scanned: usize, current_path: &str) {
        let guard = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!(
                "Scanning... {} items, {} excluded ({})",
                HumanCount(items_scanned as u64),
                HumanCount(self.excluded.load(Ordering::Relaxed) as u64),
                current_path
            ));
        }
    }

    fn on_excluded(&self, _decision: &ExclusionDecision) {
        self.excluded.fetch_add(1, Ordering::Relaxed);
    }

    fn on_scan_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} files admitted in {:.2}s",
            total_files, duration_secs
        );
    }
}
