use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::Error;
use crate::patterns::UnsupportedPattern;
use crate::policy::{EntryKind, ExclusionDecision, ExclusionPolicy, ExclusionReason};
use crate::progress::ProgressReporter;
use crate::scanner::TreeScanner;
use crate::session::{ScanState, SessionManager};
use crate::source::{EntryRef, FsEntry};
use crate::tree::ScanForest;

pub struct IntakeEngine {
    config: AppConfig,
    policy: ExclusionPolicy,
    sessions: SessionManager,
}

/// Read-only snapshot of a finished session.
#[derive(Debug)]
pub struct ScanResult {
    pub session_id: u64,
    pub started_at: DateTime<Utc>,
    pub forest: ScanForest,
    pub excluded: Vec<ExclusionDecision>,
    pub unsupported_patterns: Vec<UnsupportedPattern>,
    pub items_scanned: usize,
    pub scan_duration: Duration,
    /// Phases the session moved through, ending in `Done`.
    pub states: Vec<ScanState>,
}

impl IntakeEngine {
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        config.validate()?;
        let policy = ExclusionPolicy::new(&config);
        Ok(Self {
            config,
            policy,
            sessions: SessionManager::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Open filesystem roots. A path that cannot be opened is reported as a
    /// scan-error exclusion instead of failing the whole drop.
    pub fn open_paths(&self, paths: &[PathBuf]) -> (Vec<EntryRef>, Vec<ExclusionDecision>) {
        let mut roots = Vec::new();
        let mut failed = Vec::new();

        for path in paths {
            match FsEntry::open(path, self.config.read_batch_size) {
                Ok(entry) => roots.push(entry),
                Err(err) => {
                    warn!("Error opening {}: {}", path.display(), err);
                    let name = display_name(path);
                    failed.push(ExclusionDecision::exclude(
                        &name,
                        &name,
                        EntryKind::Folder,
                        ExclusionReason::ScanError {
                            message: err.to_string(),
                        },
                    ));
                }
            }
        }

        (roots, failed)
    }

    /// Run one session over the dropped roots, in order. Starting a scan
    /// supersedes any scan still running on this engine; the older call then
    /// returns [`Error::Superseded`].
    pub fn scan(
        &self,
        roots: &[EntryRef],
        reporter: &dyn ProgressReporter,
    ) -> Result<ScanResult, Error> {
        let session = self.sessions.begin();
        info!(
            "Session {}: scanning {} dropped item(s)",
            session.id(),
            roots.len()
        );
        reporter.on_scan_start(session.id(), roots.len());
        session.set_state(ScanState::LoadingRules);

        let scan_start = Instant::now();
        let scanner = TreeScanner::new(&session, &self.policy, reporter)
            .with_ignore_file_name(&self.config.ignore_file_name);

        let mut nodes = Vec::new();
        for root in roots {
            if let Some(node) = scanner.scan_root(root.as_ref())? {
                debug!(
                    "Root {}: {} files, {} bytes",
                    node.path, node.file_count, node.total_size
                );
                nodes.push(node);
            }
        }

        // a late supersede still discards this result
        session.check_active()?;
        session.set_state(ScanState::Done);

        let scan_duration = scan_start.elapsed();
        let forest = ScanForest::new(nodes);
        let excluded = session.excluded().snapshot();

        info!(
            "Session {}: {} files admitted, {} excluded, {} items scanned in {:.2}s",
            session.id(),
            forest.total_files(),
            excluded.len(),
            session.items_scanned(),
            scan_duration.as_secs_f64(),
        );
        reporter.on_scan_complete(forest.total_files(), scan_duration.as_secs_f64());

        if forest.is_empty() {
            return Err(Error::NoAdmittedFiles { excluded });
        }

        Ok(ScanResult {
            session_id: session.id(),
            started_at: session.started_at(),
            forest,
            excluded,
            unsupported_patterns: session.unsupported_patterns(),
            items_scanned: session.items_scanned(),
            scan_duration,
            states: session.transitions(),
        })
    }

    /// Convenience: open filesystem paths and scan them in one session.
    /// Paths that fail to open are merged into the exclusion log.
    pub fn scan_paths(
        &self,
        paths: &[PathBuf],
        reporter: &dyn ProgressReporter,
    ) -> Result<ScanResult, Error> {
        let (roots, failed) = self.open_paths(paths);
        match self.scan(&roots, reporter) {
            Ok(mut result) => {
                result.excluded.extend(failed);
                Ok(result)
            }
            Err(Error::NoAdmittedFiles { mut excluded }) => {
                excluded.extend(failed);
                Err(Error::NoAdmittedFiles { excluded })
            }
            Err(err) => Err(err),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
