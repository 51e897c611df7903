use std::path::PathBuf;

use serde::Serialize;

/// An admitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// `<root name>/<path relative to root>`; unique across a forest.
    pub path: String,
    pub name: String,
    pub size: u64,
    /// Lowercased text after the last `.`, if any.
    pub extension: Option<String>,
    /// Where the transport can read the bytes from.
    pub location: PathBuf,
}

impl FileRecord {
    pub fn new(name: &str, path: &str, size: u64, location: PathBuf) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            size,
            extension: extension_of(name),
            location,
        }
    }
}

pub fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// A scanned folder with aggregates over its retained subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryNode {
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub files: Vec<FileRecord>,
    pub children: Vec<DirectoryNode>,
    pub file_count: usize,
    pub total_size: u64,
    /// Set when a single dropped file stands in for a folder.
    pub is_file_root: bool,
}

impl DirectoryNode {
    /// Build a node from resolved parts. Files and children are sorted by
    /// name, empty children are pruned and aggregates computed bottom-up.
    pub fn assemble(
        path: &str,
        name: &str,
        depth: usize,
        mut files: Vec<FileRecord>,
        mut children: Vec<DirectoryNode>,
    ) -> Self {
        children.retain(|child| !child.is_prunable());
        files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        children.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));

        let file_count =
            files.len() + children.iter().map(|child| child.file_count).sum::<usize>();
        let total_size = files.iter().map(|f| f.size).sum::<u64>()
            + children.iter().map(|child| child.total_size).sum::<u64>();

        Self {
            path: path.to_string(),
            name: name.to_string(),
            depth,
            files,
            children,
            file_count,
            total_size,
            is_file_root: false,
        }
    }

    pub fn single_file(file: FileRecord) -> Self {
        let path = file.path.clone();
        let name = file.name.clone();
        let mut node = Self::assemble(&path, &name, 0, vec![file], vec![]);
        node.is_file_root = true;
        node
    }

    pub fn is_prunable(&self) -> bool {
        self.file_count == 0 && self.children.is_empty()
    }

    /// Depth-first, files of a node before its children.
    pub fn iter_files(&self) -> Box<dyn Iterator<Item = &FileRecord> + '_> {
        Box::new(
            self.files
                .iter()
                .chain(self.children.iter().flat_map(|child| child.iter_files())),
        )
    }

    pub fn find(&self, path: &str) -> Option<&DirectoryNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    pub fn largest_file(&self) -> Option<&FileRecord> {
        self.iter_files().max_by_key(|f| f.size)
    }

    /// True if every node's aggregates equal its direct files plus its
    /// children's aggregates and no empty child is attached.
    pub fn aggregates_consistent(&self) -> bool {
        let count = self.files.len() + self.children.iter().map(|c| c.file_count).sum::<usize>();
        let size = self.files.iter().map(|f| f.size).sum::<u64>()
            + self.children.iter().map(|c| c.total_size).sum::<u64>();
        count == self.file_count
            && size == self.total_size
            && self
                .children
                .iter()
                .all(|c| !c.is_prunable() && c.aggregates_consistent())
    }
}

/// Ordered result of one scan session, one node per admitted dropped root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanForest {
    pub roots: Vec<DirectoryNode>,
}

impl ScanForest {
    pub fn new(roots: Vec<DirectoryNode>) -> Self {
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn total_files(&self) -> usize {
        self.roots.iter().map(|r| r.file_count).sum()
    }

    pub fn total_size(&self) -> u64 {
        self.roots.iter().map(|r| r.total_size).sum()
    }

    pub fn largest_file(&self) -> Option<&FileRecord> {
        self.roots
            .iter()
            .filter_map(|r| r.largest_file())
            .max_by_key(|f| f.size)
    }

    pub fn find(&self, path: &str) -> Option<&DirectoryNode> {
        self.roots.iter().find_map(|r| r.find(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, size: u64) -> FileRecord {
        let name = path.rsplit('/').next().unwrap();
        FileRecord::new(name, path, size, PathBuf::from(path))
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.TXT"), Some("txt".to_string()));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension_of(".env"), Some("env".to_string()));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_assemble_aggregates_and_prunes() {
        let empty = DirectoryNode::assemble("r/empty", "empty", 1, vec![], vec![]);
        let deep = DirectoryNode::assemble("r/a/b", "b", 2, vec![file("r/a/b/x.txt", 7)], vec![]);
        let a = DirectoryNode::assemble("r/a", "a", 1, vec![file("r/a/y.txt", 3)], vec![deep]);
        let root = DirectoryNode::assemble(
            "r",
            "r",
            0,
            vec![file("r/z.txt", 1), file("r/m.txt", 2)],
            vec![empty, a],
        );

        assert_eq!(root.file_count, 4);
        assert_eq!(root.total_size, 13);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.files[0].name, "m.txt");
        assert!(root.aggregates_consistent());
        assert_eq!(root.largest_file().unwrap().name, "x.txt");
        assert_eq!(root.find("r/a/b").unwrap().file_count, 1);
    }

    #[test]
    fn test_children_sorted_by_name() {
        let b = DirectoryNode::assemble("r/b", "b", 1, vec![file("r/b/1.txt", 1)], vec![]);
        let a = DirectoryNode::assemble("r/a", "a", 1, vec![file("r/a/1.txt", 1)], vec![]);
        let root = DirectoryNode::assemble("r", "r", 0, vec![], vec![b, a]);
        let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_single_file_root() {
        let node = DirectoryNode::single_file(file("notes.txt", 12));
        assert!(node.is_file_root);
        assert_eq!(node.file_count, 1);
        assert_eq!(node.total_size, 12);
        assert_eq!(node.path, "notes.txt");
    }

    #[test]
    fn test_forest_summary() {
        let forest = ScanForest::new(vec![
            DirectoryNode::single_file(file("a.txt", 4)),
            DirectoryNode::assemble("r", "r", 0, vec![file("r/b.txt", 9)], vec![]),
        ]);
        assert_eq!(forest.total_files(), 2);
        assert_eq!(forest.total_size(), 13);
        assert_eq!(forest.largest_file().unwrap().path, "r/b.txt");
    }
}
