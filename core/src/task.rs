use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use strum_macros::Display as StrumDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
pub enum TaskAction {
    AddFile,
    UpdateFile,
    DeleteFile,
    AddDirectory,
    DeleteDirectory,
}

impl TaskAction {
    /// Removals of a cycle are applied before its additions, so an entry
    /// replaced by another kind of entry is freed first
    pub fn is_removal(&self) -> bool {
        matches!(self, TaskAction::DeleteFile | TaskAction::DeleteDirectory)
    }
}

/// A filesystem operation to apply on the synchronized tree. `source` is the
/// watched entry (which may no longer exist for deletions), `destination` is
/// the mirrored entry to write or remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    action: TaskAction,
    source: PathBuf,
    destination: PathBuf,
}

impl Task {
    pub fn new(action: TaskAction, source: PathBuf, destination: PathBuf) -> Self {
        Self {
            action,
            source,
            destination,
        }
    }

    pub fn action(&self) -> TaskAction {
        self.action
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!(
            "{} {} -> {}",
            self.action,
            self.source.display(),
            self.destination.display()
        ))
    }
}
