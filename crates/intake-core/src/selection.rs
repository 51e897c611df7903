use std::collections::BTreeSet;

use ahash::AHashSet;
use serde::Serialize;
use tracing::debug;

use crate::error::Error;
use crate::tree::{DirectoryNode, FileRecord, ScanForest};

/// Folder paths chosen for hand-off. Files directly under a root need no
/// entry here; they are always included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    paths: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every folder offered for selection: direct children of each root with
    /// at least one admitted file, sorted by name within each root.
    pub fn selectable(forest: &ScanForest) -> Vec<&DirectoryNode> {
        forest
            .roots
            .iter()
            .flat_map(|root| root.children.iter().filter(|dir| dir.file_count > 0))
            .collect()
    }

    /// The default selection: everything selectable.
    pub fn all(forest: &ScanForest) -> Self {
        let mut selection = Self::new();
        for dir in Self::selectable(forest) {
            selection.insert(&dir.path);
        }
        selection
    }

    pub fn insert(&mut self, path: &str) -> bool {
        self.paths.insert(path.to_string())
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(|p| p.as_str())
    }

    pub fn all_selected(&self, forest: &ScanForest) -> bool {
        Self::selectable(forest)
            .iter()
            .all(|dir| self.contains(&dir.path))
    }

    /// Select everything selectable, or deselect it all if it already is.
    pub fn toggle_all(&mut self, forest: &ScanForest) {
        let select = !self.all_selected(forest);
        for dir in Self::selectable(forest) {
            if select {
                self.insert(&dir.path);
            } else {
                self.remove(&dir.path);
            }
        }
    }

    /// True if there is anything to hand off at all: a selected folder or a
    /// root with direct files.
    pub fn has_content(&self, forest: &ScanForest) -> bool {
        forest.roots.iter().any(|root| !root.files.is_empty()) || !self.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LargestFile {
    pub path: String,
    pub size: u64,
}

/// Pre-flight totals for the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestSummary {
    pub total_files: usize,
    pub total_size: u64,
    pub largest_file: Option<LargestFile>,
}

impl ManifestSummary {
    pub fn from_files(files: &[FileRecord]) -> Self {
        Self {
            total_files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            largest_file: files.iter().max_by_key(|f| f.size).map(|f| LargestFile {
                path: f.path.clone(),
                size: f.size,
            }),
        }
    }
}

/// Flat, deduplicated list of files ready for hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub files: Vec<FileRecord>,
    pub summary: ManifestSummary,
}

pub struct SelectionAggregator;

impl SelectionAggregator {
    /// Root files first, then each selected folder's whole subtree, in tree
    /// order. A path reachable twice is kept at its first position.
    pub fn aggregate(forest: &ScanForest, selection: &SelectionSet) -> Result<Manifest, Error> {
        let mut collector = Collector::default();

        for root in &forest.roots {
            collector.extend(root.files.iter());
            for child in &root.children {
                collect_selected(child, selection, &mut collector);
            }
        }

        if collector.files.is_empty() {
            return Err(Error::EmptySelection);
        }

        debug!(
            "Aggregated {} files ({} duplicates dropped)",
            collector.files.len(),
            collector.duplicates
        );

        let summary = ManifestSummary::from_files(&collector.files);
        Ok(Manifest {
            files: collector.files,
            summary,
        })
    }
}

fn collect_selected(node: &DirectoryNode, selection: &SelectionSet, collector: &mut Collector) {
    if selection.contains(&node.path) {
        collector.extend(node.iter_files());
        return;
    }
    for child in &node.children {
        collect_selected(child, selection, collector);
    }
}

#[derive(Default)]
struct Collector {
    seen: AHashSet<String>,
    files: Vec<FileRecord>,
    duplicates: usize,
}

impl Collector {
    fn extend<'a>(&mut self, files: impl Iterator<Item = &'a FileRecord>) {
        for file in files {
            if self.seen.insert(file.path.clone()) {
                self.files.push(file.clone());
            } else {
                self.duplicates += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(path: &str, size: u64) -> FileRecord {
        let name = path.rsplit('/').next().unwrap();
        FileRecord::new(name, path, size, PathBuf::from(path))
    }

    fn dir(path: &str, depth: usize, files: Vec<FileRecord>, children: Vec<DirectoryNode>) -> DirectoryNode {
        let name = path.rsplit('/').next().unwrap();
        DirectoryNode::assemble(path, name, depth, files, children)
    }

    fn sample_forest() -> ScanForest {
        let nested = dir("r/docs/api", 2, vec![file("r/docs/api/ref.md", 30)], vec![]);
        let docs = dir("r/docs", 1, vec![file("r/docs/guide.md", 20)], vec![nested]);
        let src = dir("r/src", 1, vec![file("r/src/main.rs", 10)], vec![]);
        let root = dir("r", 0, vec![file("r/readme.md", 5)], vec![docs, src]);
        ScanForest::new(vec![root])
    }

    fn paths(manifest: &Manifest) -> Vec<&str> {
        manifest.files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_root_files_always_included() {
        let forest = sample_forest();
        let manifest = SelectionAggregator::aggregate(&forest, &SelectionSet::new()).unwrap();
        assert_eq!(paths(&manifest), vec!["r/readme.md"]);
    }

    #[test]
    fn test_selected_folder_brings_whole_subtree() {
        let forest = sample_forest();
        let mut selection = SelectionSet::new();
        selection.insert("r/docs");

        let manifest = SelectionAggregator::aggregate(&forest, &selection).unwrap();
        assert_eq!(
            paths(&manifest),
            vec!["r/readme.md", "r/docs/guide.md", "r/docs/api/ref.md"]
        );
        assert_eq!(manifest.summary.total_files, 3);
        assert_eq!(manifest.summary.total_size, 55);
        assert_eq!(
            manifest.summary.largest_file,
            Some(LargestFile {
                path: "r/docs/api/ref.md".to_string(),
                size: 30
            })
        );
    }

    #[test]
    fn test_nested_selection_without_parent() {
        let forest = sample_forest();
        let mut selection = SelectionSet::new();
        selection.insert("r/docs/api");

        let manifest = SelectionAggregator::aggregate(&forest, &selection).unwrap();
        assert_eq!(paths(&manifest), vec!["r/readme.md", "r/docs/api/ref.md"]);
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let root = dir("r", 0, vec![file("r/a.md", 1)], vec![]);
        // the same root dropped twice
        let forest = ScanForest::new(vec![root.clone(), root]);
        let manifest = SelectionAggregator::aggregate(&forest, &SelectionSet::new()).unwrap();
        assert_eq!(paths(&manifest), vec!["r/a.md"]);

        let forest = sample_forest();
        let mut selection = SelectionSet::new();
        selection.insert("r/docs");
        selection.insert("r/docs/api");
        let manifest = SelectionAggregator::aggregate(&forest, &selection).unwrap();
        assert_eq!(manifest.files.len(), 3);
    }

    #[test]
    fn test_empty_result_is_an_error() {
        let docs = dir("r/docs", 1, vec![file("r/docs/guide.md", 20)], vec![]);
        let forest = ScanForest::new(vec![dir("r", 0, vec![], vec![docs])]);

        let result = SelectionAggregator::aggregate(&forest, &SelectionSet::new());
        assert!(matches!(result, Err(Error::EmptySelection)));

        let result = SelectionAggregator::aggregate(&ScanForest::default(), &SelectionSet::new());
        assert!(matches!(result, Err(Error::EmptySelection)));
    }

    #[test]
    fn test_default_selection_and_toggle() {
        let forest = sample_forest();
        let mut selection = SelectionSet::all(&forest);
        let selected: Vec<_> = selection.iter().collect();
        assert_eq!(selected, vec!["r/docs", "r/src"]);
        assert!(selection.all_selected(&forest));

        selection.toggle_all(&forest);
        assert!(selection.is_empty());

        selection.insert("r/src");
        selection.toggle_all(&forest);
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_has_content() {
        let forest = sample_forest();
        assert!(SelectionSet::new().has_content(&forest));

        let docs = dir("r/docs", 1, vec![file("r/docs/guide.md", 20)], vec![]);
        let forest = ScanForest::new(vec![dir("r", 0, vec![], vec![docs])]);
        assert!(!SelectionSet::new().has_content(&forest));
        assert!(SelectionSet::all(&forest).has_content(&forest));
    }
}
