use std::panic;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use fsmirror_core::{
    error::ScanError,
    snapshot::{Snapshot, SnapshotMap},
    store::FileStore,
};

/// Result of a tree scan. `skipped` lists directories which could not be
/// listed: their subtree is absent from `snapshots`.
#[derive(Debug, Default)]
pub struct Scan {
    pub snapshots: SnapshotMap,
    pub skipped: Vec<PathBuf>,
}

impl Scan {
    pub fn is_skipped(&self, path: &Path) -> bool {
        self.skipped.iter().any(|skipped| path.starts_with(skipped))
    }

    fn merge(&mut self, other: Scan) {
        self.snapshots.extend(other.snapshots);
        self.skipped.extend(other.skipped);
    }
}

pub struct Scanner<'a> {
    store: &'a dyn FileStore,
    stop_signal: Arc<AtomicBool>,
    threads: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(store: &'a dyn FileStore, stop_signal: Arc<AtomicBool>) -> Self {
        Self {
            store,
            stop_signal,
            threads: 1,
        }
    }

    /// Scan root subdirectories with up to `threads` workers
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    fn is_stopped(&self) -> bool {
        self.stop_signal.load(Ordering::Relaxed)
    }

    /// Produce a snapshot for `root` and every directory below it. Fail only if
    /// root itself can't be listed (or on stop signal). Unreadable
    /// subdirectories are logged and skipped.
    pub fn scan(&self, root: &Path) -> Result<Scan, ScanError> {
        if self.is_stopped() {
            return Err(ScanError::Interrupted(root.to_path_buf()));
        }

        let root_snapshot = self.snapshot(root)?;
        let children = self.children(&root_snapshot);
        let mut scan = Scan::default();
        scan.snapshots.insert(root.to_path_buf(), root_snapshot);

        if self.threads > 1 && children.len() > 1 {
            scan.merge(self.scan_parallel(children)?);
        } else {
            for child in children {
                self.scan_subtree(&child, &mut scan)?;
            }
        }

        log::debug!(
            "Scanned {} ({} directories, {} skipped)",
            root.display(),
            scan.snapshots.len(),
            scan.skipped.len()
        );
        Ok(scan)
    }

    fn scan_parallel(&self, children: Vec<PathBuf>) -> Result<Scan, ScanError> {
        let mut groups: Vec<Vec<PathBuf>> = vec![vec![]; self.threads.min(children.len())];
        let groups_count = groups.len();
        for (index, child) in children.into_iter().enumerate() {
            groups[index % groups_count].push(child);
        }

        // Each worker fills its own map, merged once all workers are done
        let results = thread::scope(|scope| {
            let handles = groups
                .into_iter()
                .map(|group| {
                    scope.spawn(move || -> Result<Scan, ScanError> {
                        let mut partial = Scan::default();
                        for child in group {
                            self.scan_subtree(&child, &mut partial)?;
                        }
                        Ok(partial)
                    })
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(payload) => panic::resume_unwind(payload),
                })
                .collect::<Vec<Result<Scan, ScanError>>>()
        });

        let mut scan = Scan::default();
        for result in results {
            scan.merge(result?);
        }
        Ok(scan)
    }

    fn scan_subtree(&self, path: &Path, scan: &mut Scan) -> Result<(), ScanError> {
        if self.is_stopped() {
            return Err(ScanError::Interrupted(path.to_path_buf()));
        }

        let snapshot = match self.snapshot(path) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                log::error!("Skip subtree: {}", error);
                scan.skipped.push(path.to_path_buf());
                return Ok(());
            }
        };

        let children = self.children(&snapshot);
        scan.snapshots.insert(path.to_path_buf(), snapshot);
        for child in children {
            self.scan_subtree(&child, scan)?;
        }

        Ok(())
    }

    fn snapshot(&self, path: &Path) -> Result<Snapshot, ScanError> {
        let listing = self
            .store
            .list_directory(path)
            .map_err(|error| ScanError::Unreadable(path.to_path_buf(), error))?;
        Ok(Snapshot::new(
            path.to_path_buf(),
            listing.files,
            listing.directories,
        ))
    }

    fn children(&self, snapshot: &Snapshot) -> Vec<PathBuf> {
        snapshot
            .directories()
            .iter()
            .map(|name| snapshot.path().join(name))
            .collect()
    }
}
