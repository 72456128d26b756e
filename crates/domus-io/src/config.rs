use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session settings, read from a JSON file at startup.
///
/// Every field has a default, so a partial file (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory the engine reads its input from and writes artifacts to.
    pub staging_dir: PathBuf,
    /// Directory holding the example graphs.
    pub examples_dir: PathBuf,
    pub engine: EngineSettings,
    pub viewport: ViewportSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub padding: f64,
    pub fallback_width: f64,
    pub fallback_height: f64,
    /// Share of the container the drawing occupies, in percent.
    pub size_percent: f64,
    /// Pixel size of the drawing container; zero when unknown.
    pub client_width: f64,
    pub client_height: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("."),
            examples_dir: PathBuf::from("example-graphs"),
            engine: EngineSettings::default(),
            viewport: ViewportSettings::default(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("domus-engine"),
            args: Vec::new(),
        }
    }
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            padding: 8.0,
            fallback_width: 800.0,
            fallback_height: 600.0,
            size_percent: 90.0,
            client_width: 0.0,
            client_height: 0.0,
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::from_json(&json)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.viewport.padding, 8.0);
        assert_eq!(config.viewport.fallback_width, 800.0);
        assert_eq!(config.viewport.fallback_height, 600.0);
        assert_eq!(config.viewport.size_percent, 90.0);
        assert_eq!(config.examples_dir, PathBuf::from("example-graphs"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SessionConfig::from_json(
            r#"{ "staging_dir": "/tmp/domus", "viewport": { "padding": 4 }, "engine": { "args": ["--quiet"] } }"#,
        )
        .unwrap();
        assert_eq!(config.staging_dir, PathBuf::from("/tmp/domus"));
        assert_eq!(config.viewport.padding, 4.0);
        assert_eq!(config.viewport.fallback_width, 800.0);
        assert_eq!(config.engine.program, PathBuf::from("domus-engine"));
        assert_eq!(config.engine.args, vec!["--quiet".to_string()]);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(SessionConfig::from_json("{}").unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            SessionConfig::from_json(r#"{ "viewport": { "padding": "wide" } }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domus.json");
        fs::write(&path, SessionConfig::default().to_json().unwrap()).unwrap();
        assert_eq!(SessionConfig::load(&path).unwrap(), SessionConfig::default());
        assert!(matches!(
            SessionConfig::load(&dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
