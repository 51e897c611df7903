//! Root entry references handed to the scanner.
//!
//! An [`Entry`] is either a file or a folder. Folders are listed through an
//! [`EntryReader`] one batch at a time; a backend is free to return fewer
//! entries than it holds per call, and an empty batch ends the listing.

pub mod fs;
pub mod memory;

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

pub use crate::policy::EntryKind;
pub use fs::FsEntry;
pub use memory::{MemoryEntry, MemoryNode};

pub type EntryRef = Arc<dyn Entry>;

pub trait Entry: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Location in the backing store.
    fn path(&self) -> &Path;

    fn kind(&self) -> EntryKind;

    /// Metadata fetch. May hit storage.
    fn size(&self) -> io::Result<u64>;

    /// Start listing a folder's children.
    fn reader(&self) -> io::Result<Box<dyn EntryReader + '_>>;

    fn read_to_string(&self) -> io::Result<String>;

    fn is_dir(&self) -> bool {
        self.kind() == EntryKind::Folder
    }

    /// Symbolic links are listed so they can be accounted for, but the
    /// scanner never follows them.
    fn is_symlink(&self) -> bool {
        false
    }
}

pub trait EntryReader: Send {
    /// Next batch of children. Empty means the listing is complete.
    fn read_batch(&mut self) -> io::Result<Vec<EntryRef>>;
}

/// Drain a reader, accumulating every batch until an empty one comes back.
pub fn read_all_entries(entry: &dyn Entry) -> io::Result<Vec<EntryRef>> {
    let mut reader = entry.reader()?;
    let mut entries = Vec::new();
    loop {
        let batch = reader.read_batch()?;
        if batch.is_empty() {
            break;
        }
        entries.extend(batch);
    }
    Ok(entries)
}
