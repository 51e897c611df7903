use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Entry, EntryKind, EntryReader, EntryRef};
use crate::config::DEFAULT_READ_BATCH_SIZE;

/// Description of an in-memory tree. Turn it into entries with
/// [`MemoryNode::into_entry`].
#[derive(Debug, Clone)]
pub enum MemoryNode {
    File {
        name: String,
        size: u64,
        content: Option<String>,
        fail_metadata: bool,
    },
    Dir {
        name: String,
        children: Vec<MemoryNode>,
        fail_listing: bool,
        batch_size: usize,
    },
    /// A symbolic link; listed by its parent, never followed.
    Link { name: String },
}

impl MemoryNode {
    pub fn file(name: &str, size: u64) -> Self {
        MemoryNode::File {
            name: name.to_string(),
            size,
            content: None,
            fail_metadata: false,
        }
    }

    pub fn text(name: &str, content: &str) -> Self {
        MemoryNode::File {
            name: name.to_string(),
            size: content.len() as u64,
            content: Some(content.to_string()),
            fail_metadata: false,
        }
    }

    /// A file whose metadata fetch fails.
    pub fn unreadable_file(name: &str) -> Self {
        MemoryNode::File {
            name: name.to_string(),
            size: 0,
            content: None,
            fail_metadata: true,
        }
    }

    pub fn dir(name: &str, children: Vec<MemoryNode>) -> Self {
        MemoryNode::Dir {
            name: name.to_string(),
            children,
            fail_listing: false,
            batch_size: DEFAULT_READ_BATCH_SIZE,
        }
    }

    /// A folder whose listing fails.
    pub fn unreadable_dir(name: &str) -> Self {
        MemoryNode::Dir {
            name: name.to_string(),
            children: Vec::new(),
            fail_listing: true,
            batch_size: DEFAULT_READ_BATCH_SIZE,
        }
    }

    pub fn symlink(name: &str) -> Self {
        MemoryNode::Link {
            name: name.to_string(),
        }
    }

    /// Set the listing batch size on this folder and every folder below it.
    pub fn with_batch_size(self, size: usize) -> Self {
        match self {
            MemoryNode::Dir {
                name,
                children,
                fail_listing,
                ..
            } => MemoryNode::Dir {
                name,
                children: children
                    .into_iter()
                    .map(|c| c.with_batch_size(size))
                    .collect(),
                fail_listing,
                batch_size: size.max(1),
            },
            file => file,
        }
    }

    pub fn into_entry(self) -> EntryRef {
        self.build(Path::new(""))
    }

    fn build(self, parent: &Path) -> EntryRef {
        match self {
            MemoryNode::File {
                name,
                size,
                content,
                fail_metadata,
            } => Arc::new(MemoryEntry {
                path: parent.join(&name),
                name,
                kind: EntryKind::File,
                size,
                content,
                children: Vec::new(),
                fail: fail_metadata,
                batch_size: DEFAULT_READ_BATCH_SIZE,
                symlink: false,
            }),
            MemoryNode::Link { name } => Arc::new(MemoryEntry {
                path: parent.join(&name),
                name,
                kind: EntryKind::File,
                size: 0,
                content: None,
                children: Vec::new(),
                fail: false,
                batch_size: DEFAULT_READ_BATCH_SIZE,
                symlink: true,
            }),
            MemoryNode::Dir {
                name,
                children,
                fail_listing,
                batch_size,
            } => {
                let path = parent.join(&name);
                let children = children.into_iter().map(|c| c.build(&path)).collect();
                Arc::new(MemoryEntry {
                    path,
                    name,
                    kind: EntryKind::Folder,
                    size: 0,
                    content: None,
                    children,
                    fail: fail_listing,
                    batch_size,
                    symlink: false,
                })
            }
        }
    }
}

/// Entry backed by memory. Folders hand out their children `batch_size` at
/// a time, which makes paginated listing observable in tests.
#[derive(Debug)]
pub struct MemoryEntry {
    name: String,
    path: PathBuf,
    kind: EntryKind,
    size: u64,
    content: Option<String>,
    children: Vec<EntryRef>,
    fail: bool,
    batch_size: usize,
    symlink: bool,
}

impl Entry for MemoryEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> EntryKind {
        self.kind
    }

    fn size(&self) -> io::Result<u64> {
        if self.fail {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("Error getting metadata for {}", self.path.display()),
            ));
        }
        Ok(self.size)
    }

    fn reader(&self) -> io::Result<Box<dyn EntryReader + '_>> {
        if self.kind != EntryKind::Folder {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a folder", self.path.display()),
            ));
        }
        if self.fail {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("Error reading directory {}", self.path.display()),
            ));
        }
        Ok(Box::new(MemoryReader {
            children: &self.children,
            position: 0,
            batch_size: self.batch_size,
        }))
    }

    fn read_to_string(&self) -> io::Result<String> {
        self.content.clone().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} has no text content", self.path.display()),
            )
        })
    }

    fn is_symlink(&self) -> bool {
        self.symlink
    }
}

struct MemoryReader<'a> {
    children: &'a [EntryRef],
    position: usize,
    batch_size: usize,
}

impl EntryReader for MemoryReader<'_> {
    fn read_batch(&mut self) -> io::Result<Vec<EntryRef>> {
        let end = (self.position + self.batch_size).min(self.children.len());
        let batch = self.children[self.position..end].to_vec();
        self.position = end;
        Ok(batch)
    }
}
