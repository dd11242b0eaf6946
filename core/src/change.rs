use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

/// A classified difference between two snapshots of the same directory.
/// Paths are absolute, under the watched root.
#[derive(Debug, Eq, PartialEq, Hash, Clone)]
pub enum Change {
    FileAdded(PathBuf),
    FileUpdated(PathBuf),
    FileRemoved(PathBuf),
    DirectoryAdded(PathBuf),
    DirectoryRemoved(PathBuf),
}

impl Change {
    pub fn path(&self) -> &Path {
        match self {
            Change::FileAdded(path)
            | Change::FileUpdated(path)
            | Change::FileRemoved(path)
            | Change::DirectoryAdded(path)
            | Change::DirectoryRemoved(path) => path,
        }
    }

    pub fn utf8_icon(&self) -> &str {
        match self {
            Change::FileAdded(_) => "🗎🆕",
            Change::FileUpdated(_) => "🗎⬆",
            Change::FileRemoved(_) => "🗎❌",
            Change::DirectoryAdded(_) => "🗀🆕",
            Change::DirectoryRemoved(_) => "🗀❌",
        }
    }
}

impl Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("{} {}", self.utf8_icon(), self.path().display()))
    }
}
