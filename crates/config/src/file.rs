//! The persisted settings file: one `KEY=value` pair per line.

use figment::value::{Dict, Map, Value};
use figment::{Metadata, Profile, Provider, Source};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

pub(crate) const API_KEY: &str = "GEMINI_API_KEY";
pub(crate) const DIRECTORY: &str = "DEFAULT_FOLDER_PATH";

/// A [`Provider`] for the settings file.
///
/// Recognised keys map onto [`Config`](crate::Config) fields:
/// `GEMINI_API_KEY` to `api_key` and `DEFAULT_FOLDER_PATH` to `directory`.
/// A missing or unreadable file (bad permissions, not UTF-8) provides
/// nothing. Lines without `=` and unknown keys are skipped.
pub struct KeyValueFile {
    path: PathBuf,
}

impl KeyValueFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    fn parse(&self, contents: &str) -> Dict {
        let mut dict = Dict::new();
        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!(path = %self.path.display(), line = number + 1, "Ignoring malformed settings line");
                continue;
            };
            let field = match key.trim() {
                API_KEY => "api_key",
                DIRECTORY => "directory",
                other => {
                    tracing::debug!(key = other, "Ignoring unknown settings key");
                    continue;
                },
            };
            dict.insert(field.to_string(), Value::from(value.trim().to_string()));
        }
        dict
    }
}

impl Provider for KeyValueFile {
    fn metadata(&self) -> Metadata {
        Metadata::named("settings file").source(Source::File(self.path.clone()))
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let dict = match std::fs::read_to_string(&self.path) {
            Ok(contents) => self.parse(&contents),
            Err(e) if e.kind() == IoErrorKind::NotFound => Dict::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Unreadable settings file, using defaults");
                Dict::new()
            },
        };
        Ok(Map::from([(Profile::Default, dict)]))
    }
}

/// Renders the settings file contents.
pub(crate) fn render(api_key: &str, directory: &Path) -> String {
    format!("{API_KEY}={api_key}\n{DIRECTORY}={}\n", directory.display())
}
