use std::fmt;
use std::sync::Arc;

use ahash::AHashSet;
use serde::Serialize;

use crate::config::{normalize_extension, AppConfig};
use crate::patterns::{IgnoreRule, PatternCompiler, RuleSet};
use crate::tree::FileRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Folder => write!(f, "folder"),
        }
    }
}

/// Why an entry was left out. `label()` is the fixed taxonomy string shown
/// to users; `detail()` carries the specifics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    DisallowedType { extension: Option<String> },
    ExceedsSizeLimit { size: u64, limit: u64 },
    HiddenFolder { segment: String },
    IgnoreRule { pattern: String, line: usize },
    ScanError { message: String },
}

impl ExclusionReason {
    pub fn label(&self) -> &'static str {
        match self {
            ExclusionReason::DisallowedType { .. } => "disallowed type",
            ExclusionReason::ExceedsSizeLimit { .. } => "exceeds size limit",
            ExclusionReason::HiddenFolder { .. } => "hidden/system folder",
            ExclusionReason::IgnoreRule { .. } => "matched ignore rule",
            ExclusionReason::ScanError { .. } => "scan error",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ExclusionReason::DisallowedType { extension: Some(ext) } => format!(".{}", ext),
            ExclusionReason::DisallowedType { extension: None } => "no extension".to_string(),
            ExclusionReason::ExceedsSizeLimit { size, limit } => {
                format!("{} bytes > {} bytes", size, limit)
            }
            ExclusionReason::HiddenFolder { segment } => segment.clone(),
            ExclusionReason::IgnoreRule { pattern, line } => {
                format!("'{}' (line {})", pattern, line)
            }
            ExclusionReason::ScanError { message } => message.clone(),
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.detail())
    }
}

/// Outcome of testing one entry. `reason` is set iff `admitted` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExclusionDecision {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub admitted: bool,
    pub reason: Option<ExclusionReason>,
}

impl ExclusionDecision {
    pub fn admit(name: &str, path: &str, kind: EntryKind) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind,
            admitted: true,
            reason: None,
        }
    }

    pub fn exclude(name: &str, path: &str, kind: EntryKind, reason: ExclusionReason) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind,
            admitted: false,
            reason: Some(reason),
        }
    }

    pub fn reason_label(&self) -> Option<&'static str> {
        self.reason.as_ref().map(|r| r.label())
    }
}

#[derive(Debug)]
struct PolicySettings {
    extensions: AHashSet<String>,
    max_file_size: u64,
    include_hidden: bool,
    excluded_folders: AHashSet<String>,
    critical_folders: AHashSet<String>,
}

/// Admit-or-reject rules for one scan session.
///
/// The settings and compiler are shared; [`ExclusionPolicy::with_ignore_file`]
/// produces a copy bound to one root's ignore rules.
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    settings: Arc<PolicySettings>,
    compiler: Arc<PatternCompiler>,
    rules: RuleSet,
}

impl ExclusionPolicy {
    pub fn new(config: &AppConfig) -> Self {
        let settings = PolicySettings {
            extensions: config.normalized_extensions().into_iter().collect(),
            max_file_size: config.max_file_size,
            include_hidden: config.include_hidden,
            excluded_folders: config.excluded_folders.iter().cloned().collect(),
            critical_folders: config.critical_folders.iter().cloned().collect(),
        };
        Self {
            settings: Arc::new(settings),
            compiler: Arc::new(PatternCompiler::new()),
            rules: RuleSet::empty(),
        }
    }

    /// Same settings and compiler cache, with rules compiled from `content`.
    pub fn with_ignore_file(&self, content: &str) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            compiler: Arc::clone(&self.compiler),
            rules: self.compiler.compile(content),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn compiler(&self) -> &PatternCompiler {
        &self.compiler
    }

    pub fn max_file_size(&self) -> u64 {
        self.settings.max_file_size
    }

    pub fn include_hidden(&self) -> bool {
        self.settings.include_hidden
    }

    /// Check every segment of `path` (root name first) against the
    /// hidden/system folder rules.
    pub fn evaluate_folder(&self, name: &str, path: &str) -> ExclusionDecision {
        let settings = &self.settings;
        let blocked = path.split('/').filter(|s| !s.is_empty()).find(|segment| {
            if settings.include_hidden {
                settings.critical_folders.contains(*segment)
            } else {
                segment.starts_with('.') || settings.excluded_folders.contains(*segment)
            }
        });

        match blocked {
            Some(segment) => ExclusionDecision::exclude(
                name,
                path,
                EntryKind::Folder,
                ExclusionReason::HiddenFolder {
                    segment: segment.to_string(),
                },
            ),
            None => ExclusionDecision::admit(name, path, EntryKind::Folder),
        }
    }

    pub fn evaluate_file(&self, file: &FileRecord) -> ExclusionDecision {
        let allowed = file
            .extension
            .as_ref()
            .is_some_and(|ext| self.settings.extensions.contains(ext));
        if !allowed {
            return ExclusionDecision::exclude(
                &file.name,
                &file.path,
                EntryKind::File,
                ExclusionReason::DisallowedType {
                    extension: file.extension.clone(),
                },
            );
        }

        if file.size > self.settings.max_file_size {
            return ExclusionDecision::exclude(
                &file.name,
                &file.path,
                EntryKind::File,
                ExclusionReason::ExceedsSizeLimit {
                    size: file.size,
                    limit: self.settings.max_file_size,
                },
            );
        }

        ExclusionDecision::admit(&file.name, &file.path, EntryKind::File)
    }

    /// True if an active ignore rule matches the root-relative path.
    pub fn evaluate_against_patterns(&self, relative_path: &str) -> bool {
        self.rules.is_ignored(relative_path)
    }

    pub fn matching_rule(&self, relative_path: &str) -> Option<&IgnoreRule> {
        self.rules.matching_rule(relative_path)
    }

    /// Ignore rules first, then hidden/system segments.
    pub fn admit_folder(&self, name: &str, path: &str, relative_path: &str) -> ExclusionDecision {
        if let Some(rule) = self.matching_rule(relative_path) {
            return ExclusionDecision::exclude(
                name,
                path,
                EntryKind::Folder,
                ExclusionReason::IgnoreRule {
                    pattern: rule.pattern.clone(),
                    line: rule.line,
                },
            );
        }
        self.evaluate_folder(name, path)
    }

    /// Decision for a file that has not had its metadata fetched yet. Only
    /// ignore rules can be checked at this point.
    pub fn pre_check_file(&self, name: &str, path: &str, relative_path: &str) -> ExclusionDecision {
        match self.matching_rule(relative_path) {
            Some(rule) => ExclusionDecision::exclude(
                name,
                path,
                EntryKind::File,
                ExclusionReason::IgnoreRule {
                    pattern: rule.pattern.clone(),
                    line: rule.line,
                },
            ),
            None => ExclusionDecision::admit(name, path, EntryKind::File),
        }
    }
}
