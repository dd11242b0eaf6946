use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::types::DiskTimestamp;

/// Snapshots of every directory of a tree, by absolute directory path. Ordered
/// so a parent directory is always visited before its children.
pub type SnapshotMap = BTreeMap<PathBuf, Snapshot>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    name: String,
    size: u64,
    modified: DiskTimestamp,
}

impl FileEntry {
    pub fn new(name: String, size: u64, modified: DiskTimestamp) -> Self {
        Self {
            name,
            size,
            modified,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> DiskTimestamp {
        self.modified
    }
}

/// Immediate content of one directory at a point in time. Counts, total size
/// and last modification are computed at construction and can't diverge from
/// the entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    path: PathBuf,
    files: Vec<FileEntry>,
    directories: Vec<String>,
    total_size: u64,
    last_modified: DiskTimestamp,
}

impl Snapshot {
    pub fn new(path: PathBuf, mut files: Vec<FileEntry>, mut directories: Vec<String>) -> Self {
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files.dedup_by(|a, b| a.name == b.name);
        directories.sort();
        directories.dedup();

        let total_size = files.iter().map(|file| file.size).sum();
        let last_modified = files
            .iter()
            .map(|file| file.modified)
            .max()
            .unwrap_or_default();

        Self {
            path,
            files,
            directories,
            total_size,
            last_modified,
        }
    }

    /// Snapshot of a directory without any content
    pub fn empty(path: PathBuf) -> Self {
        Self::new(path, vec![], vec![])
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File entries, ordered by name
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Subdirectory names, ordered
    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    pub fn file(&self, name: &str) -> Option<&FileEntry> {
        self.files
            .binary_search_by(|file| file.name.as_str().cmp(name))
            .ok()
            .map(|index| &self.files[index])
    }

    pub fn total_file_count(&self) -> u64 {
        self.files.len() as u64
    }

    pub fn total_directory_count(&self) -> u64 {
        self.directories.len() as u64
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn last_modified(&self) -> DiskTimestamp {
        self.last_modified
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }
}
