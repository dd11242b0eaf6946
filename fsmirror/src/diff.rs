use std::collections::{HashMap, HashSet};

use fsmirror_core::{change::Change, error::DiffError, snapshot::Snapshot};

/// Compare two snapshots of the same directory. A missing new snapshot means
/// the directory can't be listed anymore.
pub struct SnapshotDiff<'a> {
    old: &'a Snapshot,
    new: Option<&'a Snapshot>,
}

impl<'a> SnapshotDiff<'a> {
    pub fn new(old: &'a Snapshot, new: Option<&'a Snapshot>) -> Result<Self, DiffError> {
        if let Some(new_) = new {
            if old.path() != new_.path() {
                return Err(DiffError::PathMismatch(
                    old.path().to_path_buf(),
                    new_.path().to_path_buf(),
                ));
            }
        }

        Ok(Self { old, new })
    }

    /// Name sets are compared on every call whatever the counts are, so a
    /// file added while another is removed is reported as both.
    pub fn changes(&self) -> Vec<Change> {
        let new = match self.new {
            Some(new) => new,
            None => return vec![Change::DirectoryRemoved(self.old.path().to_path_buf())],
        };
        if self.old == new {
            return vec![];
        }

        let path = new.path();
        let old_files = self.old.files().iter().map(|file| file.name());
        let new_files = new.files().iter().map(|file| file.name());
        let old_directories = self.old.directories().iter().map(String::as_str);
        let new_directories = new.directories().iter().map(String::as_str);
        let mut changes = vec![];

        changes.extend(
            self.updated_files(new)
                .into_iter()
                .map(|name| Change::FileUpdated(path.join(name))),
        );
        changes.extend(
            difference(new_files.clone(), old_files.clone())
                .into_iter()
                .map(|name| Change::FileAdded(path.join(name))),
        );
        changes.extend(
            difference(old_files, new_files)
                .into_iter()
                .map(|name| Change::FileRemoved(path.join(name))),
        );
        changes.extend(
            difference(new_directories.clone(), old_directories.clone())
                .into_iter()
                .map(|name| Change::DirectoryAdded(path.join(name))),
        );
        changes.extend(
            difference(old_directories, new_directories)
                .into_iter()
                .map(|name| Change::DirectoryRemoved(path.join(name))),
        );

        changes
    }

    fn updated_files(&self, new: &'a Snapshot) -> Vec<&'a str> {
        let old_sizes: HashMap<&str, u64> = self
            .old
            .files()
            .iter()
            .map(|file| (file.name(), file.size()))
            .collect();

        new.files()
            .iter()
            .filter(|file| {
                old_sizes
                    .get(file.name())
                    .map(|old_size| *old_size != file.size())
                    .unwrap_or(false)
            })
            .map(|file| file.name())
            .collect()
    }
}

/// Names of `left` absent from `right`, in `left` order
pub fn difference<'n>(
    left: impl Iterator<Item = &'n str>,
    right: impl Iterator<Item = &'n str>,
) -> Vec<&'n str> {
    let right: HashSet<&str> = right.collect();
    left.filter(|name| !right.contains(name)).collect()
}
