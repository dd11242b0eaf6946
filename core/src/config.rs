use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};

use ini::Ini;

use crate::{utils::strbool, CONFIG_SECTION};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_SCAN_THREADS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    pub poll_interval: Duration,
    pub watch_secondary: bool,
    pub scan_threads: usize,
    pub propagate_directories: bool,
    pub exit_after_sync: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            watch_secondary: false,
            scan_threads: DEFAULT_SCAN_THREADS,
            propagate_directories: false,
            exit_after_sync: false,
        }
    }
}

impl MirrorConfig {
    pub fn default_path() -> Result<PathBuf> {
        let user_home_folder_path = dirs::home_dir().context("Unable to determine home folder")?;
        Ok(if cfg!(target_os = "windows") {
            user_home_folder_path
                .join("AppData")
                .join("Local")
                .join("fsmirror.conf")
        } else {
            user_home_folder_path.join(".fsmirror.conf")
        })
    }

    /// Read config from the default config file, or use defaults if there is
    /// no such file
    pub fn from_env() -> Result<Self> {
        let config_file_path = Self::default_path()?;
        if !config_file_path.exists() {
            log::debug!(
                "No config file at '{}', use defaults",
                config_file_path.display()
            );
            return Ok(Self::default());
        }

        Self::from_file(&config_file_path)
    }

    pub fn from_file(config_file_path: &Path) -> Result<Self> {
        let config_ini = Ini::load_from_file(config_file_path).context(format!(
            "Error when loading config file at '{}'",
            config_file_path.display()
        ))?;
        Self::from_ini(config_ini)
    }

    pub fn from_ini(config_ini: Ini) -> Result<Self> {
        let defaults = Self::default();
        let section = match config_ini.section(Some(CONFIG_SECTION)) {
            Some(section) => section,
            None => return Ok(defaults),
        };

        let poll_interval = match section.get("poll_interval_ms") {
            Some(value) => Duration::from_millis(
                value
                    .trim()
                    .parse::<u64>()
                    .context("Unable to read poll_interval_ms config")?,
            ),
            None => defaults.poll_interval,
        };
        let scan_threads = match section.get("scan_threads") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .context("Unable to read scan_threads config")?
                .max(1),
            None => defaults.scan_threads,
        };
        let watch_secondary = section
            .get("watch_secondary")
            .map(strbool)
            .unwrap_or(defaults.watch_secondary);
        let propagate_directories = section
            .get("propagate_directories")
            .map(strbool)
            .unwrap_or(defaults.propagate_directories);
        let exit_after_sync = section
            .get("exit_after_sync")
            .map(strbool)
            .unwrap_or(defaults.exit_after_sync);

        Ok(Self {
            poll_interval,
            watch_secondary,
            scan_threads,
            propagate_directories,
            exit_after_sync,
        })
    }
}
