use std::fs;
use std::path::{Path, PathBuf};

use fsmirror_core::{snapshot::FileEntry, snapshot::Snapshot, types::DiskTimestamp};
use testdir::testdir;
use uuid::Uuid;
use walkdir::WalkDir;

pub fn tmpdir() -> PathBuf {
    let path = testdir!().join(PathBuf::from(Uuid::new_v4().to_string()));
    fs::create_dir_all(&path).unwrap();
    path
}

/// Write `(relative_path, content)` files under `root`, creating folders
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (relative_path, content) in files {
        let absolute_path = root.join(relative_path);
        fs::create_dir_all(absolute_path.parent().unwrap()).unwrap();
        fs::write(&absolute_path, content).unwrap();
    }
}

/// Relative paths of every file and folder under `root`, sorted
pub fn disk_files(root: &Path) -> Vec<String> {
    let mut files = WalkDir::new(root)
        .into_iter()
        .map(|entry| {
            entry
                .unwrap()
                .path()
                .strip_prefix(root)
                .unwrap()
                .display()
                .to_string()
        })
        .filter(|p| !p.is_empty())
        .collect::<Vec<String>>();
    files.sort();
    files
}

/// Build a snapshot from raw `(file_name, size)` files and folder names
pub fn snapshot(path: &str, files: &[(&str, u64)], directories: &[&str]) -> Snapshot {
    Snapshot::new(
        PathBuf::from(path),
        files
            .iter()
            .map(|(name, size)| FileEntry::new(name.to_string(), *size, DiskTimestamp(*size)))
            .collect(),
        directories.iter().map(|name| name.to_string()).collect(),
    )
}
