use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::Error;
use crate::patterns::UnsupportedPattern;
use crate::scanner::ExcludedItemLog;

/// Session phases, in the only order a session moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScanState {
    Idle,
    LoadingRules,
    Scanning,
    Done,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanState::Idle => "idle",
            ScanState::LoadingRules => "loading-rules",
            ScanState::Scanning => "scanning",
            ScanState::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// State owned by one drop-to-tree scan. A new drop gets a new session;
/// nothing from an older session carries over.
#[derive(Debug)]
pub struct ScanSession {
    id: u64,
    started_at: DateTime<Utc>,
    state: Mutex<Vec<ScanState>>,
    items_scanned: AtomicUsize,
    excluded: ExcludedItemLog,
    unsupported: Mutex<Vec<UnsupportedPattern>>,
    superseded: Arc<AtomicBool>,
}

impl ScanSession {
    /// A standalone session that nothing can supersede.
    pub fn new(id: u64) -> Self {
        Self::with_flag(id, Arc::new(AtomicBool::new(false)))
    }

    fn with_flag(id: u64, superseded: Arc<AtomicBool>) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            state: Mutex::new(vec![ScanState::Idle]),
            items_scanned: AtomicUsize::new(0),
            excluded: ExcludedItemLog::new(),
            unsupported: Mutex::new(Vec::new()),
            superseded,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> ScanState {
        let history = self.state.lock().unwrap_or_else(|e| e.into_inner());
        history.last().copied().unwrap_or(ScanState::Idle)
    }

    /// Every state this session has entered, oldest first.
    pub fn transitions(&self) -> Vec<ScanState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Move forward to `next`. Repeating the current state or stepping back
    /// is a no-op.
    pub fn set_state(&self, next: ScanState) {
        let mut history = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let current = history.last().copied().unwrap_or(ScanState::Idle);
        if next > current {
            debug!("Session {}: {} -> {}", self.id, current, next);
            history.push(next);
        } else if next < current {
            debug!(
                "Session {}: ignoring {} while already {}",
                self.id, next, current
            );
        }
    }

    /// Add `count` discovered entries; returns the new total.
    pub fn record_scanned(&self, count: usize) -> usize {
        self.items_scanned.fetch_add(count, Ordering::Relaxed) + count
    }

    pub fn items_scanned(&self) -> usize {
        self.items_scanned.load(Ordering::Relaxed)
    }

    pub fn excluded(&self) -> &ExcludedItemLog {
        &self.excluded
    }

    pub fn add_unsupported(&self, patterns: &[UnsupportedPattern]) {
        if patterns.is_empty() {
            return;
        }
        self.unsupported
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(patterns);
    }

    pub fn unsupported_patterns(&self) -> Vec<UnsupportedPattern> {
        self.unsupported
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_superseded(&self) -> bool {
        self.superseded.load(Ordering::SeqCst)
    }

    /// Err once a newer session has taken over.
    pub fn check_active(&self) -> Result<(), Error> {
        if self.is_superseded() {
            return Err(Error::Superseded(self.id));
        }
        Ok(())
    }

    /// Mark this session abandoned from the outside.
    pub fn cancel(&self) {
        self.superseded.store(true, Ordering::SeqCst);
    }
}

/// Hands out sessions. Beginning a session supersedes the previous one.
#[derive(Debug, Default)]
pub struct SessionManager {
    next_id: AtomicU64,
    current: Mutex<Option<Arc<AtomicBool>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> ScanSession {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let flag = Arc::new(AtomicBool::new(false));

        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.replace(Arc::clone(&flag)) {
            if !previous.swap(true, Ordering::SeqCst) {
                info!("Session {} supersedes the scan in flight", id);
            }
        }

        debug!("Began scan session {}", id);
        ScanSession::with_flag(id, flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_supersedes_previous() {
        let manager = SessionManager::new();
        let first = manager.begin();
        assert!(first.check_active().is_ok());

        let second = manager.begin();
        assert!(first.is_superseded());
        assert!(matches!(first.check_active(), Err(Error::Superseded(id)) if id == first.id()));
        assert!(second.check_active().is_ok());
        assert!(second.id() > first.id());
    }

    #[test]
    fn test_state_transitions() {
        let session = ScanSession::new(1);
        assert_eq!(session.state(), ScanState::Idle);
        session.set_state(ScanState::LoadingRules);
        session.set_state(ScanState::Scanning);
        session.set_state(ScanState::Done);
        assert_eq!(session.state(), ScanState::Done);
    }

    #[test]
    fn test_state_never_moves_backward() {
        let session = ScanSession::new(1);
        session.set_state(ScanState::LoadingRules);
        session.set_state(ScanState::Scanning);
        session.set_state(ScanState::LoadingRules);
        session.set_state(ScanState::Scanning);
        assert_eq!(session.state(), ScanState::Scanning);
        assert_eq!(
            session.transitions(),
            vec![ScanState::Idle, ScanState::LoadingRules, ScanState::Scanning]
        );
    }

    #[test]
    fn test_counter_is_shared_across_threads() {
        let session = ScanSession::new(1);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        session.record_scanned(1);
                    }
                });
            }
        });
        assert_eq!(session.items_scanned(), 8000);
    }

    #[test]
    fn test_cancel_standalone_session() {
        let session = ScanSession::new(7);
        session.cancel();
        assert!(matches!(session.check_active(), Err(Error::Superseded(7))));
    }
}
