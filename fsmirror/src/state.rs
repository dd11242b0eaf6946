use std::path::{Path, PathBuf};

use fsmirror_core::{
    snapshot::{FileEntry, Snapshot, SnapshotMap},
    types::Side,
};

/// Last known snapshots of one watched tree
pub struct SnapshotStore {
    side: Side,
    root: PathBuf,
    snapshots: SnapshotMap,
}

impl SnapshotStore {
    pub fn new(side: Side, root: PathBuf) -> Self {
        Self {
            side,
            root,
            snapshots: SnapshotMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, path: &Path) -> Option<&Snapshot> {
        self.snapshots.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.snapshots.contains_key(path)
    }

    pub fn snapshots(&self) -> &SnapshotMap {
        &self.snapshots
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Replace all known snapshots by a fresh generation. Paths absent from
    /// `snapshots` are forgotten.
    pub fn replace(&mut self, snapshots: SnapshotMap) {
        self.snapshots = snapshots;
    }

    /// Record a file written at `path` (and its missing parent directories)
    /// as if it had been scanned
    pub fn record_file(&mut self, path: &Path, entry: FileEntry) {
        if let Some(parent) = path.parent() {
            if !parent.starts_with(&self.root) {
                return;
            }
            self.record_directory(parent);
            self.update(parent, |files, _| {
                files.retain(|file| file.name() != entry.name());
                files.push(entry);
            });
        }
    }

    pub fn forget_file(&mut self, path: &Path) {
        if let (Some(parent), Some(name)) = (path.parent(), file_name(path)) {
            if self.contains(parent) {
                self.update(parent, |files, _| files.retain(|file| file.name() != name));
            }
        }
    }

    /// Record directory at `path` and its missing parents as if they had been
    /// scanned
    pub fn record_directory(&mut self, path: &Path) {
        if path == self.root || !path.starts_with(&self.root) {
            return;
        }

        if let (Some(parent), Some(name)) = (path.parent(), file_name(path)) {
            self.record_directory(parent);
            self.update(parent, |_, directories| directories.push(name));
        }
        if !self.contains(path) {
            self.snapshots
                .insert(path.to_path_buf(), Snapshot::empty(path.to_path_buf()));
        }
    }

    /// Forget directory at `path` with all its subtree
    pub fn forget_directory(&mut self, path: &Path) {
        if path == self.root {
            return;
        }

        self.snapshots.retain(|known, _| !known.starts_with(path));
        if let (Some(parent), Some(name)) = (path.parent(), file_name(path)) {
            if self.contains(parent) {
                self.update(parent, |_, directories| {
                    directories.retain(|directory| directory != &name)
                });
            }
        }
    }

    fn update(
        &mut self,
        directory: &Path,
        edit: impl FnOnce(&mut Vec<FileEntry>, &mut Vec<String>),
    ) {
        let (mut files, mut directories) = match self.snapshots.get(directory) {
            Some(snapshot) => (snapshot.files().to_vec(), snapshot.directories().to_vec()),
            None => (vec![], vec![]),
        };
        edit(&mut files, &mut directories);
        self.snapshots.insert(
            directory.to_path_buf(),
            Snapshot::new(directory.to_path_buf(), files, directories),
        );
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
}
