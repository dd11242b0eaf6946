use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fsmirror_core::{config::MirrorConfig, types::Side};

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Context {
    pub primary: PathBuf,
    pub secondary: PathBuf,
    pub poll_interval: Duration,
    pub watch_secondary: bool,
    pub scan_threads: usize,
    pub propagate_directories: bool,
    pub exit_after_sync: bool,
}

impl Context {
    /// Build context for given roots. Roots are created if missing and
    /// canonicalized. They must not be nested into each other.
    pub fn new(primary: &Path, secondary: &Path, config: &MirrorConfig) -> Result<Self, Error> {
        fs::create_dir_all(primary)?;
        fs::create_dir_all(secondary)?;
        let primary = fs::canonicalize(primary)?;
        let secondary = fs::canonicalize(secondary)?;

        if primary.starts_with(&secondary) || secondary.starts_with(&primary) {
            return Err(Error::StartupError(format!(
                "Primary '{}' and secondary '{}' must not be nested",
                primary.display(),
                secondary.display()
            )));
        }

        Ok(Self {
            primary,
            secondary,
            poll_interval: config.poll_interval,
            watch_secondary: config.watch_secondary,
            scan_threads: config.scan_threads.max(1),
            propagate_directories: config.propagate_directories,
            exit_after_sync: config.exit_after_sync,
        })
    }

    pub fn root(&self, side: Side) -> &Path {
        match side {
            Side::Primary => &self.primary,
            Side::Secondary => &self.secondary,
        }
    }

    /// Sides polled at each cycle, in polling order
    pub fn watched_sides(&self) -> Vec<Side> {
        if self.watch_secondary {
            vec![Side::Primary, Side::Secondary]
        } else {
            vec![Side::Primary]
        }
    }
}
