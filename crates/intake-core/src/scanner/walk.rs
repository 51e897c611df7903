use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::config::DEFAULT_IGNORE_FILE_NAME;
use crate::error::Error;
use crate::policy::{EntryKind, ExclusionDecision, ExclusionPolicy, ExclusionReason};
use crate::progress::ProgressReporter;
use crate::session::{ScanSession, ScanState};
use crate::source::{read_all_entries, Entry, EntryRef};
use crate::tree::{DirectoryNode, FileRecord};

/// Detail recorded for a symbolic link found while listing a folder.
pub const SYMLINK_SKIPPED: &str = "symbolic link skipped";

/// Builds the [`DirectoryNode`] tree for dropped roots.
///
/// Sibling folders are scanned in parallel. Each folder's node is assembled
/// from its children's finished nodes, so no node is shared between threads;
/// only the session's exclusion log and progress counter are.
pub struct TreeScanner<'a> {
    session: &'a ScanSession,
    policy: &'a ExclusionPolicy,
    reporter: &'a dyn ProgressReporter,
    ignore_file_name: String,
}

impl<'a> TreeScanner<'a> {
    pub fn new(
        session: &'a ScanSession,
        policy: &'a ExclusionPolicy,
        reporter: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            session,
            policy,
            reporter,
            ignore_file_name: DEFAULT_IGNORE_FILE_NAME.to_string(),
        }
    }

    pub fn with_ignore_file_name(mut self, name: &str) -> Self {
        self.ignore_file_name = name.to_string();
        self
    }

    /// Scan one dropped root. `Ok(None)` means nothing under it was admitted;
    /// the reasons are in the session's exclusion log. Only supersession is
    /// an error.
    pub fn scan_root(&self, root: &dyn Entry) -> Result<Option<DirectoryNode>, Error> {
        self.session.check_active()?;
        self.session.record_scanned(1);

        match root.kind() {
            EntryKind::File => {
                self.session.set_state(ScanState::Scanning);
                let path = root.name();
                Ok(self
                    .evaluate_file_entry(self.policy, root, path, path)
                    .map(DirectoryNode::single_file))
            }
            EntryKind::Folder => self.scan_folder_root(root),
        }
    }

    fn scan_folder_root(&self, root: &dyn Entry) -> Result<Option<DirectoryNode>, Error> {
        let name = root.name();
        let decision = self.policy.evaluate_folder(name, name);
        if !decision.admitted {
            self.exclude(decision);
            return Ok(None);
        }

        let entries = match read_all_entries(root) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Error scanning {}: {}", root.path().display(), err);
                self.exclude(scan_error(name, name, EntryKind::Folder, &err));
                return Ok(None);
            }
        };

        let policy = self.load_rules(root, &entries);

        self.session.set_state(ScanState::Scanning);
        let node = self.scan_entries(&policy, name, name, "", 0, entries)?;

        if node.file_count == 0 {
            debug!("Root {} has no admitted files", name);
            return Ok(None);
        }
        Ok(Some(node))
    }

    /// Compile the ignore file sitting directly in the root, if any. The rules
    /// apply to the whole root; nested ignore files are ordinary files.
    fn load_rules(&self, root: &dyn Entry, entries: &[EntryRef]) -> ExclusionPolicy {
        let ignore_file = entries
            .iter()
            .find(|e| !e.is_dir() && e.name() == self.ignore_file_name);

        let Some(ignore_file) = ignore_file else {
            trace!("No {} in {}", self.ignore_file_name, root.path().display());
            return self.policy.clone();
        };

        match ignore_file.read_to_string() {
            Ok(content) => {
                let policy = self.policy.with_ignore_file(&content);
                self.session.add_unsupported(policy.rules().unsupported());
                info!(
                    "Loaded {} ignore rules ({} unsupported) from {}",
                    policy.rules().rules().len(),
                    policy.rules().unsupported().len(),
                    ignore_file.path().display()
                );
                policy
            }
            Err(err) => {
                warn!(
                    "Error loading {}: {}",
                    ignore_file.path().display(),
                    err
                );
                self.policy.clone()
            }
        }
    }

    fn scan_entries(
        &self,
        policy: &ExclusionPolicy,
        name: &str,
        path: &str,
        relative: &str,
        depth: usize,
        entries: Vec<EntryRef>,
    ) -> Result<DirectoryNode, Error> {
        self.session.check_active()?;

        let scanned = self.session.record_scanned(entries.len());
        self.reporter.on_scan_progress(scanned, path);

        let (links, entries): (Vec<EntryRef>, Vec<EntryRef>) =
            entries.into_iter().partition(|e| e.is_symlink());
        for link in &links {
            let link_path = join_path(path, link.name());
            self.exclude(ExclusionDecision::exclude(
                link.name(),
                &link_path,
                link.kind(),
                ExclusionReason::ScanError {
                    message: SYMLINK_SKIPPED.to_string(),
                },
            ));
        }

        let (dirs, files): (Vec<EntryRef>, Vec<EntryRef>) =
            entries.into_iter().partition(|e| e.is_dir());

        let (files, children) = rayon::join(
            || self.scan_files(policy, path, relative, &files),
            || self.scan_subdirs(policy, path, relative, depth, &dirs),
        );

        Ok(DirectoryNode::assemble(path, name, depth, files, children?))
    }

    fn scan_files(
        &self,
        policy: &ExclusionPolicy,
        path: &str,
        relative: &str,
        files: &[EntryRef],
    ) -> Vec<FileRecord> {
        files
            .par_iter()
            .filter_map(|entry| {
                let file_path = join_path(path, entry.name());
                let file_relative = join_path(relative, entry.name());
                self.evaluate_file_entry(policy, entry.as_ref(), &file_path, &file_relative)
            })
            .collect()
    }

    fn scan_subdirs(
        &self,
        policy: &ExclusionPolicy,
        path: &str,
        relative: &str,
        depth: usize,
        dirs: &[EntryRef],
    ) -> Result<Vec<DirectoryNode>, Error> {
        dirs.par_iter()
            .filter_map(|dir| {
                if let Err(err) = self.session.check_active() {
                    return Some(Err(err));
                }

                let name = dir.name();
                let dir_path = join_path(path, name);
                let dir_relative = join_path(relative, name);

                let decision = policy.admit_folder(name, &dir_path, &dir_relative);
                if !decision.admitted {
                    self.exclude(decision);
                    return None;
                }

                match read_all_entries(dir.as_ref()) {
                    Ok(entries) => Some(self.scan_entries(
                        policy,
                        name,
                        &dir_path,
                        &dir_relative,
                        depth + 1,
                        entries,
                    )),
                    Err(err) => {
                        warn!("Error scanning {}: {}", dir.path().display(), err);
                        self.exclude(scan_error(name, &dir_path, EntryKind::Folder, &err));
                        None
                    }
                }
            })
            .collect()
    }

    /// Ignore rules first so an ignored file never costs a metadata fetch.
    fn evaluate_file_entry(
        &self,
        policy: &ExclusionPolicy,
        entry: &dyn Entry,
        path: &str,
        relative: &str,
    ) -> Option<FileRecord> {
        let name = entry.name();

        let decision = policy.pre_check_file(name, path, relative);
        if !decision.admitted {
            self.exclude(decision);
            return None;
        }

        let size = match entry.size() {
            Ok(size) => size,
            Err(err) => {
                warn!("Error getting metadata for {}: {}", entry.path().display(), err);
                self.exclude(scan_error(name, path, EntryKind::File, &err));
                return None;
            }
        };

        let record = FileRecord::new(name, path, size, entry.path().to_path_buf());
        let decision = policy.evaluate_file(&record);
        if !decision.admitted {
            self.exclude(decision);
            return None;
        }

        trace!("Admitted {} ({} bytes)", path, size);
        Some(record)
    }

    fn exclude(&self, decision: ExclusionDecision) {
        if let Some(reason) = &decision.reason {
            debug!("Excluded {} {}: {}", decision.kind, decision.path, reason);
        }
        self.reporter.on_excluded(&decision);
        self.session.excluded().append(decision);
    }
}

fn scan_error(name: &str, path: &str, kind: EntryKind, err: &std::io::Error) -> ExclusionDecision {
    ExclusionDecision::exclude(
        name,
        path,
        kind,
        ExclusionReason::ScanError {
            message: err.to_string(),
        },
    )
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
