use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

use super::{Entry, EntryKind, EntryReader, EntryRef};
use crate::config::DEFAULT_READ_BATCH_SIZE;

/// A file or folder on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsEntry {
    name: String,
    path: PathBuf,
    kind: EntryKind,
    batch_size: usize,
    symlink: bool,
}

impl FsEntry {
    /// Open a dropped root. Symlinked roots are followed.
    pub fn open(path: &Path, batch_size: usize) -> io::Result<EntryRef> {
        let metadata = fs::metadata(path)?;
        let kind = if metadata.is_dir() {
            EntryKind::Folder
        } else {
            EntryKind::File
        };
        Ok(Arc::new(Self {
            name: root_name(path)?,
            path: path.to_path_buf(),
            kind,
            batch_size: batch_size.max(1),
            symlink: false,
        }))
    }

    pub fn open_default(path: &Path) -> io::Result<EntryRef> {
        Self::open(path, DEFAULT_READ_BATCH_SIZE)
    }
}

/// Name of a dropped root. `.` and `..` have no file name of their own, so
/// they take the name of the folder they resolve to.
fn root_name(path: &Path) -> io::Result<String> {
    if let Some(name) = path.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }
    let resolved = fs::canonicalize(path)?;
    Ok(resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| resolved.to_string_lossy().into_owned()))
}

impl Entry for FsEntry {
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
        Ok(fs::metadata(&self.path)?.len())
    }

    fn reader(&self) -> io::Result<Box<dyn EntryReader + '_>> {
        let entries = fs::read_dir(&self.path).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Error reading directory {}: {}", self.path.display(), err),
            )
        })?;
        Ok(Box::new(FsReader {
            entries,
            batch_size: self.batch_size,
        }))
    }

    fn read_to_string(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    fn is_symlink(&self) -> bool {
        self.symlink
    }
}

struct FsReader {
    entries: fs::ReadDir,
    batch_size: usize,
}

impl EntryReader for FsReader {
    fn read_batch(&mut self) -> io::Result<Vec<EntryRef>> {
        let mut batch: Vec<EntryRef> = Vec::with_capacity(self.batch_size);

        while batch.len() < self.batch_size {
            let entry = match self.entries.next() {
                Some(entry) => entry?,
                None => break,
            };

            let path = entry.path();
            let file_type = entry.file_type().map_err(|err| {
                io::Error::new(
                    err.kind(),
                    format!("Error getting file type for {}: {}", path.display(), err),
                )
            })?;

            // links are listed but never followed; the scanner logs them
            let symlink = file_type.is_symlink();
            let kind = if file_type.is_dir() || (symlink && path.is_dir()) {
                EntryKind::Folder
            } else {
                EntryKind::File
            };
            if symlink {
                trace!("Listing symlink {} without following it", path.display());
            }

            batch.push(Arc::new(FsEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                kind,
                batch_size: self.batch_size,
                symlink,
            }));
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::read_all_entries;
    use tempfile::tempdir;

    #[test]
    fn test_open_detects_kind_and_name() {
        let tmp = tempdir().unwrap();
        let file_path = tmp.path().join("a.txt");
        fs::write(&file_path, "hello").unwrap();

        let dir = FsEntry::open_default(tmp.path()).unwrap();
        assert_eq!(dir.kind(), EntryKind::Folder);

        let file = FsEntry::open_default(&file_path).unwrap();
        assert_eq!(file.kind(), EntryKind::File);
        assert_eq!(file.name(), "a.txt");
        assert_eq!(file.size().unwrap(), 5);
        assert_eq!(file.read_to_string().unwrap(), "hello");
    }

    #[test]
    fn test_listing_in_small_batches() {
        let tmp = tempdir().unwrap();
        for i in 0..5 {
            fs::write(tmp.path().join(format!("{}.txt", i)), "x").unwrap();
        }
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let root = FsEntry::open(tmp.path(), 2).unwrap();
        let mut reader = root.reader().unwrap();
        assert_eq!(reader.read_batch().unwrap().len(), 2);
        drop(reader);

        let entries = read_all_entries(root.as_ref()).unwrap();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries.iter().filter(|e| e.is_dir()).count(), 1);
    }

    #[test]
    fn test_dot_paths_take_the_resolved_folder_name() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("proj");
        fs::create_dir_all(root.join("sub")).unwrap();

        let entry = FsEntry::open_default(&root.join("sub").join("..")).unwrap();
        assert_eq!(entry.name(), "proj");
        assert_eq!(entry.kind(), EntryKind::Folder);

        let entry = FsEntry::open_default(&root.join("sub").join(".")).unwrap();
        assert_eq!(entry.name(), "sub");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_listed_as_links() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "x").unwrap();
        fs::create_dir(tmp.path().join("dir")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("a.txt"), tmp.path().join("link.txt")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("dir"), tmp.path().join("link_dir")).unwrap();

        let root = FsEntry::open_default(tmp.path()).unwrap();
        let entries = read_all_entries(root.as_ref()).unwrap();
        assert_eq!(entries.len(), 4);

        let link = entries.iter().find(|e| e.name() == "link.txt").unwrap();
        assert!(link.is_symlink());
        assert_eq!(link.kind(), EntryKind::File);

        let link_dir = entries.iter().find(|e| e.name() == "link_dir").unwrap();
        assert!(link_dir.is_symlink());
        assert_eq!(link_dir.kind(), EntryKind::Folder);

        let plain = entries.iter().find(|e| e.name() == "a.txt").unwrap();
        assert!(!plain.is_symlink());
    }

    #[test]
    fn test_missing_path_fails_to_open() {
        let tmp = tempdir().unwrap();
        assert!(FsEntry::open_default(&tmp.path().join("nope")).is_err());
    }
}
