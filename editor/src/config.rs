use std::path::{Path, PathBuf};

use hammer_core::HistoryConfig;
use serde::Deserialize;
use thiserror::Error;

/// Errors reported by the editor binary.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("unknown object \"{0}\"")]
    UnknownObject(String),
    #[error("an object named \"{0}\" already exists")]
    DuplicateName(String),
    #[error("key \"{0}\" cannot be changed")]
    ReadOnlyKey(String),
    #[error("\"{0}\" cannot be grouped")]
    NotGroupable(String),
    #[error(transparent)]
    Document(#[from] hammer_core::DocumentError),
    #[error("line {line}: {source}")]
    Script {
        line: usize,
        source: Box<EditorError>,
    },
}

pub type EditorResult<T = ()> = Result<T, EditorError>;

/// Top-level editor configuration loaded from `hammer.toml`.
///
/// ```toml
/// [history]
/// undo_levels = 100
/// max_bytes = 0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistoryConfig,
}

/// Load an editor config from a TOML file.
pub fn load_config(path: &Path) -> EditorResult<EditorConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| EditorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| EditorError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the editor config, falling back to defaults if the file is missing
/// or invalid.
pub fn load_or_default(path: &Path) -> EditorConfig {
    match load_config(path) {
        Ok(config) => {
            log::info!(
                "Loaded config {} ({} undo levels)",
                path.display(),
                config.history.undo_levels
            );
            config
        }
        Err(EditorError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No config at {}, using defaults", path.display());
            EditorConfig::default()
        }
        Err(e) => {
            log::warn!("{e}, using defaults");
            EditorConfig::default()
        }
    }
}
