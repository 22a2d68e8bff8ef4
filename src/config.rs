//! Locations of saved templates, profiles and licenses.

use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::installer::DEFAULT_PYTHON;
use crate::profile::ProfileStore;
use crate::store::TemplateStore;

/// Name of the optional settings file inside the config directory.
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "STENCIL_CONFIG_DIR";

#[derive(Debug, Default, Deserialize)]
struct Settings {
    #[serde(default)]
    default_profile: Option<String>,
    #[serde(default)]
    python: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub config_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub licenses_file: PathBuf,
    /// Profile used when a command does not name one.
    pub default_profile: Option<String>,
    /// Interpreter used to install Python dependencies.
    pub python: String,
}

impl Config {
    /// A configuration rooted at `config_dir`, without reading `config.json`.
    pub fn with_dir<P: Into<PathBuf>>(config_dir: P) -> Self {
        let config_dir = config_dir.into();
        Self {
            templates_dir: config_dir.join("templates"),
            profiles_dir: config_dir.join("profiles"),
            licenses_file: config_dir.join("licenses.json"),
            config_dir,
            default_profile: None,
            python: DEFAULT_PYTHON.to_string(),
        }
    }

    /// Resolves the config directory (`dir`, falling back to the platform
    /// config directory) and reads `config.json` from it if present.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let config_dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .map(|dir| dir.join("stencil"))
                .ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "no configuration directory could be found, set {CONFIG_DIR_ENV}"
                    ))
                })?,
        };
        let mut config = Self::with_dir(config_dir);

        let settings_path = config.config_dir.join(CONFIG_FILE);
        if settings_path.is_file() {
            let settings: Settings = serde_json::from_str(&fs::read_to_string(&settings_path)?)?;
            config.default_profile = settings.default_profile;
            if let Some(python) = settings.python {
                config.python = python;
            }
            debug!("Loaded settings from '{}'", settings_path.display());
        }

        debug!("Using configuration: {config:?}");
        Ok(config)
    }

    /// Creates the config, templates and profiles directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.templates_dir, &self.profiles_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn template_store(&self) -> TemplateStore {
        TemplateStore::new(&self.templates_dir)
    }

    pub fn profile_store(&self) -> ProfileStore {
        ProfileStore::new(&self.profiles_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_is_derived_from_config_dir() {
        let config = Config::with_dir("/cfg");
        assert_eq!(config.templates_dir, PathBuf::from("/cfg/templates"));
        assert_eq!(config.profiles_dir, PathBuf::from("/cfg/profiles"));
        assert_eq!(config.licenses_file, PathBuf::from("/cfg/licenses.json"));
        assert_eq!(config.python, DEFAULT_PYTHON);
    }

    #[test]
    fn settings_file_is_optional() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(dir.path())).unwrap();
        assert_eq!(config, Config::with_dir(dir.path()));
    }

    #[test]
    fn settings_file_is_read() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"default_profile": "work", "python": "python3.12", "unknown": 1}"#,
        )
        .unwrap();
        let config = Config::load(Some(dir.path())).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("work"));
        assert_eq!(config.python, "python3.12");
    }

    #[test]
    fn ensure_dirs_creates_layout() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_dir(dir.path().join("stencil"));
        config.ensure_dirs().unwrap();
        assert!(config.templates_dir.is_dir());
        assert!(config.profiles_dir.is_dir());
    }
}
