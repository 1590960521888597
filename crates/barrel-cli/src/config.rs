//! `config.json` loading.
//!
//! The config lives in the working directory and uses the camelCase keys
//! of the JavaScript tooling it sits next to. Every key is optional.

use barrel_watcher::{IndexOptions, DEFAULT_BARREL_FILE, DEFAULT_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "config.json";

/// Errors raised while loading the config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BarrelConfig {
    /// Root folders, relative to the working directory.
    pub folders_to_watch: Vec<String>,

    /// Files never scanned for exports, relative to the working directory.
    pub ignore_files: Vec<String>,

    /// Name of the generated barrel file.
    pub barrel_file: String,

    /// Component file extensions.
    pub extensions: Vec<String>,
}

impl Default for BarrelConfig {
    fn default() -> Self {
        Self {
            folders_to_watch: vec!["app".into(), "styles".into(), "public/img".into()],
            ignore_files: Vec::new(),
            barrel_file: DEFAULT_BARREL_FILE.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl BarrelConfig {
    /// Loads a config file.
    ///
    /// A missing file is an error only when `required` is set; otherwise
    /// the defaults apply.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        if !path.exists() {
            if required {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replaces the configured folders when any are given on the command line.
    pub fn with_folders(mut self, folders: Vec<String>) -> Self {
        if !folders.is_empty() {
            self.folders_to_watch = folders;
        }
        self
    }

    /// Absolute root folders, in configured order.
    pub fn roots(&self, base: &Path) -> Vec<PathBuf> {
        self.folders_to_watch
            .iter()
            .map(|folder| resolve(base, folder))
            .collect()
    }

    /// Indexing options with every path resolved against `base`.
    pub fn index_options(&self, base: &Path) -> IndexOptions {
        let mut options = IndexOptions::default()
            .with_barrel_file_name(&self.barrel_file)
            .with_extensions(self.extensions.iter().cloned());

        for root in self.roots(base) {
            options = options.with_root(root);
        }
        for file in &self.ignore_files {
            options = options.ignore(resolve(base, file));
        }
        options
    }
}

/// Joins onto `base`, canonicalizing when the path exists so it matches
/// the paths reported by file system events.
fn resolve(base: &Path, path: &str) -> PathBuf {
    let joined = base.join(path);
    joined.canonicalize().unwrap_or(joined)
}
