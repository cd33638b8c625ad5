//! Persistent configuration
//!
//! A small TOML file in the platform config directory. A missing file is
//! not an error; saves go through a tempfile rename so a crash can never
//! leave a half-written config behind.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The two models the interface can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelId {
    #[default]
    Flash,
    Pro,
}

impl ModelId {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Flash => "gemini-2.5-flash",
            ModelId::Pro => "gemini-2.5-pro",
        }
    }

    pub fn all() -> [ModelId; 2] {
        [ModelId::Flash, ModelId::Pro]
    }

    pub fn parse(value: &str) -> Result<Self, UnknownModelError> {
        match value.trim() {
            "gemini-2.5-flash" | "flash" => Ok(ModelId::Flash),
            "gemini-2.5-pro" | "pro" => Ok(ModelId::Pro),
            other => Err(UnknownModelError {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct UnknownModelError {
    value: String,
}

impl fmt::Display for UnknownModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known = ModelId::all()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Unknown model '{}' (expected one of: {})", self.value, known)
    }
}

impl StdError for UnknownModelError {}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Model used when no `--model` flag is given.
    pub default_model: Option<String>,
}

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn StdError>> {
        Self::load_from_path(&Self::config_path())
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, Box<dyn StdError>> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn StdError>> {
        self.save_to_path(&Self::config_path())
    }

    pub(crate) fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn StdError>> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };
        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(config_path)
            .map_err(|err| -> Box<dyn StdError> { Box::new(err) })?;
        Ok(())
    }

    pub(crate) fn config_path() -> PathBuf {
        let proj_dirs = ProjectDirs::from("ng", "gregoryuniversity", "uturu")
            .expect("Failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }

    /// Resolve the effective model: CLI flag first, then the config
    /// default, then the built-in default.
    pub fn resolve_model(&self, flag: Option<&str>) -> Result<ModelId, UnknownModelError> {
        if let Some(value) = flag {
            return ModelId::parse(value);
        }
        match self.default_model.as_deref() {
            Some(value) => ModelId::parse(value),
            None => Ok(ModelId::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_parse_both_long_and_short_names() {
        assert_eq!(ModelId::parse("gemini-2.5-flash").unwrap(), ModelId::Flash);
        assert_eq!(ModelId::parse("flash").unwrap(), ModelId::Flash);
        assert_eq!(ModelId::parse("gemini-2.5-pro").unwrap(), ModelId::Pro);
        assert_eq!(ModelId::parse("pro").unwrap(), ModelId::Pro);
        assert!(ModelId::parse("gpt-4o").is_err());
        assert_eq!(ModelId::default(), ModelId::Flash);
    }

    #[test]
    fn unknown_model_error_lists_the_choices() {
        let err = ModelId::parse("nope").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("nope"));
        assert!(text.contains("gemini-2.5-flash"));
        assert!(text.contains("gemini-2.5-pro"));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.default_model.is_none());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            default_model: Some("gemini-2.5-pro".to_string()),
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.default_model.as_deref(), Some("gemini-2.5-pro"));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_model = [not toml").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn model_resolution_prefers_the_flag() {
        let config = Config {
            default_model: Some("gemini-2.5-pro".to_string()),
        };
        assert_eq!(config.resolve_model(Some("flash")).unwrap(), ModelId::Flash);
        assert_eq!(config.resolve_model(None).unwrap(), ModelId::Pro);

        let empty = Config::default();
        assert_eq!(empty.resolve_model(None).unwrap(), ModelId::Flash);
        assert!(empty.resolve_model(Some("bogus")).is_err());
    }
}
