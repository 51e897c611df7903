pub mod config;
pub mod engine;
pub mod error;
pub mod patterns;
pub mod policy;
pub mod progress;
pub mod scanner;
pub mod selection;
pub mod session;
pub mod source;
pub mod tree;

pub use config::AppConfig;
pub use engine::{IntakeEngine, ScanResult};
pub use error::Error;
pub use patterns::{IgnoreRule, PatternCompiler, RuleSet, UnsupportedPattern};
pub use policy::{EntryKind, ExclusionDecision, ExclusionPolicy, ExclusionReason};
pub use progress::{ProgressReporter, SilentReporter};
pub use selection::{Manifest, ManifestSummary, SelectionAggregator, SelectionSet};
pub use session::{ScanSession, ScanState, SessionManager};
pub use source::{Entry, EntryReader, EntryRef, FsEntry, MemoryNode};
pub use tree::{DirectoryNode, FileRecord, ScanForest};
