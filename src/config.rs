//! Runtime configuration
//!
//! Both directories are validated before any other work happens.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Seen-set database file inside the state directory
pub const DB_FILE_NAME: &str = "processed_files.db";

/// Append-only mutation log inside the state directory
pub const LOG_FILE_NAME: &str = "process_log.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} does not exist or is not mounted: {}", .path.display())]
    Missing { var: &'static str, path: PathBuf },

    #[error("{var} is not a directory: {}", .path.display())]
    NotADirectory { var: &'static str, path: PathBuf },
}

/// Validated directories for a run
#[derive(Debug, Clone)]
pub struct Config {
    pub manga_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn new(manga_dir: &Path, data_dir: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            manga_dir: require_dir("MANGA_DIR", manga_dir)?,
            data_dir: require_dir("DATA_DIR", data_dir)?,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

/// Trim surrounding whitespace (env files often carry some) and check the
/// path is an existing directory.
fn require_dir(var: &'static str, raw: &Path) -> Result<PathBuf, ConfigError> {
    let path = match raw.to_str() {
        Some(s) => PathBuf::from(s.trim()),
        None => raw.to_path_buf(),
    };

    match path.metadata() {
        Ok(meta) if meta.is_dir() => Ok(path),
        Ok(_) => Err(ConfigError::NotADirectory { var, path }),
        Err(_) => Err(ConfigError::Missing { var, path }),
    }
}
