use std::{io, path::PathBuf};

use thiserror::Error;

use crate::task::Task;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Unable to list directory {0}: {1}")]
    Unreadable(PathBuf, #[source] io::Error),
    #[error("Scan of {0} interrupted by stop signal")]
    Interrupted(PathBuf),
}

impl ScanError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ScanError::Unreadable(path, _) | ScanError::Interrupted(path) => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("Snapshots describe different directories ({0} and {1})")]
    PathMismatch(PathBuf, PathBuf),
}

#[derive(Debug, Error)]
#[error("Path {path} is not under watched root {root}")]
pub struct RelativePathError {
    pub path: PathBuf,
    pub root: PathBuf,
}

#[derive(Debug, Error)]
#[error("Task '{task}' failed: {source}")]
pub struct TaskExecutionError {
    pub task: Task,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Error)]
pub enum InitialMirrorError {
    #[error("Unable to clear {0}: {1}")]
    Clear(PathBuf, #[source] io::Error),
    #[error("Unable to walk {0}: {1}")]
    Walk(PathBuf, #[source] io::Error),
    #[error("Unable to copy {0} into {1}: {2}")]
    Copy(PathBuf, PathBuf, #[source] io::Error),
    #[error("Unable to scan mirrored tree: {0}")]
    Scan(#[from] ScanError),
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Initial mirror error: {0}")]
    InitialMirror(#[from] InitialMirrorError),
    #[error("Relative path error: {0}")]
    RelativePath(#[from] RelativePathError),
    #[error("Diff error: {0}")]
    Diff(#[from] DiffError),
    #[error("Unexpected error: {0:#}")]
    Unexpected(#[from] anyhow::Error),
}
