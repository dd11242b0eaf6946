use std::io;
use std::path::{Path, PathBuf};

use fsmirror_core::{error::InitialMirrorError, store::FileStore};
use walkdir::WalkDir;

/// Make `secondary` a copy of `primary`: clear secondary top level entries,
/// then copy every file (and folder) of primary.
pub struct InitialMirror<'a> {
    store: &'a dyn FileStore,
    primary: PathBuf,
    secondary: PathBuf,
}

impl<'a> InitialMirror<'a> {
    pub fn new(store: &'a dyn FileStore, primary: PathBuf, secondary: PathBuf) -> Self {
        Self {
            store,
            primary,
            secondary,
        }
    }

    /// Return copied files count
    pub fn run(&self) -> Result<u64, InitialMirrorError> {
        self.clear()?;
        self.copy()
    }

    fn clear(&self) -> Result<(), InitialMirrorError> {
        let entries = self
            .store
            .list_entries(&self.secondary)
            .map_err(|error| InitialMirrorError::Clear(self.secondary.clone(), error))?;

        for path in entries {
            log::debug!("Remove {}", path.display());
            self.store
                .remove_all(&path)
                .map_err(|error| InitialMirrorError::Clear(path.clone(), error))?;
        }

        Ok(())
    }

    fn copy(&self) -> Result<u64, InitialMirrorError> {
        let mut copied = 0;

        for entry in WalkDir::new(&self.primary).follow_links(false) {
            let entry = entry.map_err(|error| {
                let path = error
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.primary.clone());
                InitialMirrorError::Walk(path, io::Error::from(error))
            })?;
            let relative_path = match entry.path().strip_prefix(&self.primary) {
                Ok(relative_path) if !relative_path.as_os_str().is_empty() => relative_path,
                // Root itself
                _ => continue,
            };
            let destination = self.secondary.join(relative_path);

            if entry.path_is_symlink() {
                log::debug!("Ignore symbolic link {}", entry.path().display());
            } else if entry.file_type().is_dir() {
                self.store.create_dir_all(&destination).map_err(|error| {
                    InitialMirrorError::Copy(entry.path().to_path_buf(), destination.clone(), error)
                })?;
            } else {
                log::debug!("Copy {} -> {}", entry.path().display(), destination.display());
                self.store
                    .copy_file(entry.path(), &destination)
                    .map_err(|error| {
                        InitialMirrorError::Copy(
                            entry.path().to_path_buf(),
                            destination.clone(),
                            error,
                        )
                    })?;
                copied += 1;
            }
        }

        Ok(copied)
    }
}
