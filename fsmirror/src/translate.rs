use std::path::{Path, PathBuf};

use fsmirror_core::{
    change::Change,
    error::RelativePathError,
    task::{Task, TaskAction},
};

trait IntoRelative {
    fn relative(&self, prefix: &Path) -> Result<PathBuf, RelativePathError>;
}

impl IntoRelative for Path {
    fn relative(&self, prefix: &Path) -> Result<PathBuf, RelativePathError> {
        Ok(self
            .strip_prefix(prefix)
            .map_err(|_| RelativePathError {
                path: self.to_path_buf(),
                root: prefix.to_path_buf(),
            })?
            .to_path_buf())
    }
}

/// Rewrite changes observed under `watched_root` into tasks targeting the
/// same relative paths under `target_root`
pub struct ChangeTranslator {
    watched_root: PathBuf,
    target_root: PathBuf,
}

impl ChangeTranslator {
    pub fn new(watched_root: PathBuf, target_root: PathBuf) -> Self {
        Self {
            watched_root,
            target_root,
        }
    }

    pub fn translate(&self, change: &Change) -> Result<Option<Task>, RelativePathError> {
        let source = change.path().to_path_buf();
        let relative_path = source.relative(&self.watched_root)?;

        // The watched root itself is never mirrored as a task
        if relative_path.as_os_str().is_empty() {
            log::debug!("Ignore change on watched root: {}", change);
            return Ok(None);
        }

        let destination = self.target_root.join(relative_path);
        let action = match change {
            Change::FileAdded(_) => TaskAction::AddFile,
            Change::FileUpdated(_) => TaskAction::UpdateFile,
            Change::FileRemoved(_) => TaskAction::DeleteFile,
            Change::DirectoryAdded(_) => TaskAction::AddDirectory,
            Change::DirectoryRemoved(_) => TaskAction::DeleteDirectory,
        };

        Ok(Some(Task::new(action, source, destination)))
    }
}
