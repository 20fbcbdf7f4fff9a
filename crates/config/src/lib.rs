//! Run settings for retitle.
//!
//! Values are layered with [`figment`], lowest priority first:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. The settings file (see [`KeyValueFile`]), by default
//!    `<config dir>/retitle/config.txt`.
//! 3. `GEMINI_API_KEY` from the environment.
//! 4. `RETITLE_*` environment variables, e.g. `RETITLE_BATCH_SIZE=5`.
//!
//! Command-line flags are applied on top by the binary.

pub mod error;
mod file;

pub use crate::file::KeyValueFile;
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Serialized};
use retitle_describe::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "config.txt";
const ENV_PREFIX: &str = "RETITLE_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API key. Empty means "not configured".
    pub api_key: String,
    /// Folder of images to rename.
    pub directory: PathBuf,
    pub model: String,
    pub endpoint: String,
    /// Per-request timeout for the model API.
    pub timeout_secs: u64,
    pub batch_size: usize,
    /// Whether to pause between batches.
    pub pause: bool,
    pub pause_secs: u64,
    /// Attempts per batch on transient errors.
    pub max_attempts: usize,
    pub retry_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            directory: current_dir(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            batch_size: 10,
            pause: true,
            pause_secs: 5,
            max_attempts: 3,
            retry_delay_secs: 10,
        }
    }
}

impl Config {
    /// Default settings file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "retitle").map(|dirs| dirs.config_dir().join(FILE_NAME))
    }

    /// Loads settings from defaults, the settings file at `path` and the
    /// environment.
    ///
    /// A configured directory that does not exist falls back to the current
    /// working directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(KeyValueFile::new(path.as_ref()))
            .merge(Env::raw().only(&["GEMINI_API_KEY"]).map(|_| "api_key".into()))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::from_figment(figment)
    }

    pub(crate) fn from_figment(figment: Figment) -> Result<Self> {
        let mut config: Self = figment.extract().or_raise(|| ErrorKind::Extract)?;
        config.api_key = config.api_key.trim().to_string();
        if !config.directory.is_dir() {
            tracing::warn!(
                directory = %config.directory.display(),
                "Configured directory does not exist, using the working directory"
            );
            config.directory = current_dir();
        }
        Ok(config)
    }

    /// Whether a run can start: a key is present and the directory exists.
    pub fn validate(&self) -> Result<()> {
        if !self.directory.is_dir() {
            exn::bail!(ErrorKind::InvalidDirectory(self.directory.clone()));
        }
        if self.api_key.trim().is_empty() {
            exn::bail!(ErrorKind::MissingApiKey);
        }
        Ok(())
    }

    /// Writes the API key and directory to the settings file at `path`,
    /// creating parent directories as needed. Other fields are not persisted.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Io(parent.to_path_buf()))?;
        }
        std::fs::write(path, file::render(&self.api_key, &self.directory))
            .or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
        tracing::debug!(path = %path.display(), "Settings saved");
        Ok(())
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
