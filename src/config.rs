use std::fs;
use std::path::{Path, PathBuf};

use crate::playback::AudioSettings;
use crate::schedule::FollowUpSchedule;

/// Settings read from a JSON file; every field may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON array of poems.
    pub poems_path: PathBuf,
    /// Where the review queue is persisted.
    pub review_path: PathBuf,
    /// Where cleared tests are recorded.
    pub clears_path: PathBuf,
    pub audio: AudioSettings,
    pub schedule: FollowUpSchedule,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poems_path: PathBuf::from("poems.json"),
            review_path: PathBuf::from("review.json"),
            clears_path: PathBuf::from("clears.json"),
            audio: AudioSettings::default(),
            schedule: FollowUpSchedule::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    ParseError {
        path: String,
        source: serde_json::Error,
    },
}

impl PartialEq for ConfigError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ReadError { path: left, .. }, Self::ReadError { path: right, .. }) => {
                left == right
            }
            (Self::ParseError { path: left, .. }, Self::ParseError { path: right, .. }) => {
                left == right
            }
            _ => false,
        }
    }
}

impl Eq for ConfigError {}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_slice(&data).map_err(|source| ConfigError::ParseError {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
