use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use mockall::automock;
use tempfile::NamedTempFile;

use crate::{snapshot::FileEntry, types::DiskTimestamp};

/// Immediate content of a directory, as returned by `FileStore::list_directory`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub files: Vec<FileEntry>,
    pub directories: Vec<String>,
}

/// Kind of a single entry, as returned by `FileStore::stat`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryMetadata {
    File(FileEntry),
    Directory,
    Symlink,
}

#[automock]
pub trait FileStore: Send + Sync {
    /// List files and subdirectories of `path` in one call. Symbolic links are
    /// never reported.
    fn list_directory(&self, path: &Path) -> io::Result<DirectoryListing>;
    /// Paths of every entry of `path`, symbolic links and non utf-8 names
    /// included
    fn list_entries(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
    /// Describe the entry at `path` without following symbolic links. `None`
    /// if there is no such entry.
    fn stat(&self, path: &Path) -> io::Result<Option<EntryMetadata>>;
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
    /// Write `content` at `path`, creating parent directories as needed
    fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()>;
    /// Remove file at `path`. An absent file is not an error.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    /// Remove file or directory (recursively) at `path`. An absent path is not
    /// an error.
    fn remove_all(&self, path: &Path) -> io::Result<()>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn copy_file(&self, source: &Path, destination: &Path) -> io::Result<()> {
        let content = self.read_file(source)?;
        self.write_file(destination, &content)
    }
}

/// `FileStore` backed by the local disk
#[derive(Debug, Clone, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    pub fn new() -> Self {
        Self
    }
}

impl FileStore for LocalFileStore {
    fn list_directory(&self, path: &Path) -> io::Result<DirectoryListing> {
        let mut listing = DirectoryListing::default();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(name) => {
                    log::debug!("Ignore non utf-8 name {:?} in {}", name, path.display());
                    continue;
                }
            };
            // Entry can disappear between listing and stat
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(error) => {
                    log::debug!("Ignore {} ({})", entry.path().display(), error);
                    continue;
                }
            };

            if file_type.is_symlink() {
                log::debug!("Ignore symbolic link {}", entry.path().display());
            } else if file_type.is_dir() {
                listing.directories.push(name);
            } else {
                let metadata = match entry.metadata() {
                    Ok(metadata) => metadata,
                    Err(error) => {
                        log::debug!("Ignore {} ({})", entry.path().display(), error);
                        continue;
                    }
                };
                let modified = metadata
                    .modified()
                    .map(DiskTimestamp::from)
                    .unwrap_or_default();
                listing
                    .files
                    .push(FileEntry::new(name, metadata.len(), modified));
            }
        }

        Ok(listing)
    }

    fn list_entries(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect()
    }

    fn stat(&self, path: &Path) -> io::Result<Option<EntryMetadata>> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error),
        };

        let file_type = metadata.file_type();
        Ok(Some(if file_type.is_symlink() {
            EntryMetadata::Symlink
        } else if file_type.is_dir() {
            EntryMetadata::Directory
        } else {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            let modified = metadata
                .modified()
                .map(DiskTimestamp::from)
                .unwrap_or_default();
            EntryMetadata::File(FileEntry::new(name, metadata.len(), modified))
        }))
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let parent = match path.parent() {
            Some(parent) => parent,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("No parent directory for {}", path.display()),
                ))
            }
        };
        fs::create_dir_all(parent)?;

        // Destination is replaced at once, never truncated
        let mut temporary = NamedTempFile::new_in(parent)?;
        temporary.write_all(content)?;
        temporary.persist(path).map_err(|error| error.error)?;

        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(error),
        };

        if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use testdir::testdir;
    use uuid::Uuid;

    fn tmpdir() -> PathBuf {
        let path = testdir!().join(PathBuf::from(Uuid::new_v4().to_string()));
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn test_list_directory() {
        // Given
        let tmpdir_ = tmpdir();
        fs::write(tmpdir_.join("a.txt"), b"0123456789").unwrap();
        fs::write(tmpdir_.join("b.txt"), b"").unwrap();
        fs::create_dir(tmpdir_.join("Folder")).unwrap();
        fs::write(tmpdir_.join("Folder").join("c.txt"), b"ignored").unwrap();

        // When
        let mut listing = LocalFileStore::new().list_directory(&tmpdir_).unwrap();
        listing.files.sort_by(|a, b| a.name().cmp(b.name()));

        // Then
        assert_eq!(listing.directories, vec!["Folder".to_string()]);
        assert_eq!(
            listing
                .files
                .iter()
                .map(|file| (file.name(), file.size()))
                .collect::<Vec<(&str, u64)>>(),
            vec![("a.txt", 10), ("b.txt", 0)]
        );
        assert!(listing.files[0].modified() > DiskTimestamp(0));
    }

    #[test]
    fn test_list_missing_directory() {
        // Given
        let tmpdir_ = tmpdir();

        // When
        let result = LocalFileStore::new().list_directory(&tmpdir_.join("missing"));

        // Then
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_directory_ignore_symlinks() {
        // Given
        let tmpdir_ = tmpdir();
        fs::create_dir(tmpdir_.join("Folder")).unwrap();
        fs::write(tmpdir_.join("a.txt"), b"a").unwrap();
        std::os::unix::fs::symlink(&tmpdir_, tmpdir_.join("Folder").join("loop")).unwrap();
        std::os::unix::fs::symlink(tmpdir_.join("a.txt"), tmpdir_.join("link.txt")).unwrap();

        // When
        let root = LocalFileStore::new().list_directory(&tmpdir_).unwrap();
        let folder = LocalFileStore::new()
            .list_directory(&tmpdir_.join("Folder"))
            .unwrap();

        // Then
        assert_eq!(root.files.len(), 1);
        assert_eq!(root.directories, vec!["Folder".to_string()]);
        assert_eq!(folder, DirectoryListing::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_list_entries_include_every_kind() {
        // Given
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};
        let tmpdir_ = tmpdir();
        fs::create_dir(tmpdir_.join("Folder")).unwrap();
        fs::write(tmpdir_.join("a.txt"), b"a").unwrap();
        fs::write(tmpdir_.join(OsStr::from_bytes(b"latin\xe9.txt")), b"b").unwrap();
        std::os::unix::fs::symlink(tmpdir_.join("a.txt"), tmpdir_.join("link.txt")).unwrap();

        // When
        let mut entries = LocalFileStore::new().list_entries(&tmpdir_).unwrap();
        entries.sort();

        // Then
        let mut expected = vec![
            tmpdir_.join("Folder"),
            tmpdir_.join("a.txt"),
            tmpdir_.join(OsStr::from_bytes(b"latin\xe9.txt")),
            tmpdir_.join("link.txt"),
        ];
        expected.sort();
        assert_eq!(entries, expected);
    }

    #[test]
    fn test_stat() {
        // Given
        let tmpdir_ = tmpdir();
        fs::create_dir(tmpdir_.join("Folder")).unwrap();
        fs::write(tmpdir_.join("a.txt"), b"0123").unwrap();
        let store = LocalFileStore::new();

        // When
        let file = store.stat(&tmpdir_.join("a.txt")).unwrap();
        let folder = store.stat(&tmpdir_.join("Folder")).unwrap();
        let missing = store.stat(&tmpdir_.join("missing.txt")).unwrap();

        // Then
        match file {
            Some(EntryMetadata::File(entry)) => {
                assert_eq!(entry.name(), "a.txt");
                assert_eq!(entry.size(), 4);
            }
            other => panic!("Expected a file, got {:?}", other),
        }
        assert_eq!(folder, Some(EntryMetadata::Directory));
        assert_eq!(missing, None);
    }

    #[test]
    fn test_write_file_create_parents_and_overwrite() {
        // Given
        let tmpdir_ = tmpdir();
        let path = tmpdir_.join("Folder").join("Sub").join("a.txt");
        let store = LocalFileStore::new();

        // When
        store.write_file(&path, b"first").unwrap();
        store.write_file(&path, b"second").unwrap();

        // Then
        assert_eq!(fs::read(&path).unwrap(), b"second".to_vec());
        assert_eq!(
            fs::read_dir(path.parent().unwrap()).unwrap().count(),
            1,
            "No temporary file must remain"
        );
    }

    #[test]
    fn test_copy_file() {
        // Given
        let tmpdir_ = tmpdir();
        fs::write(tmpdir_.join("a.txt"), b"content").unwrap();
        let store = LocalFileStore::new();

        // When
        store
            .copy_file(&tmpdir_.join("a.txt"), &tmpdir_.join("copy").join("a.txt"))
            .unwrap();

        // Then
        assert_eq!(
            store.read_file(&tmpdir_.join("copy").join("a.txt")).unwrap(),
            b"content".to_vec()
        );
    }

    #[test]
    fn test_removes_are_idempotent() {
        // Given
        let tmpdir_ = tmpdir();
        fs::create_dir_all(tmpdir_.join("Folder").join("Sub")).unwrap();
        fs::write(tmpdir_.join("Folder").join("Sub").join("a.txt"), b"a").unwrap();
        fs::write(tmpdir_.join("b.txt"), b"b").unwrap();
        let store = LocalFileStore::new();

        // When
        store.remove_file(&tmpdir_.join("b.txt")).unwrap();
        store.remove_file(&tmpdir_.join("b.txt")).unwrap();
        store.remove_all(&tmpdir_.join("Folder")).unwrap();
        store.remove_all(&tmpdir_.join("Folder")).unwrap();

        // Then
        assert!(!tmpdir_.join("b.txt").exists());
        assert!(!tmpdir_.join("Folder").exists());
    }
}
