//! Named sets of reusable default values.

use indexmap::IndexMap;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{fields, PROFILE_EXTENSION};
use crate::error::{Error, Result};
use crate::store::list_names;
use crate::validation::validate_name;

pub type ProfileData = IndexMap<String, Option<String>>;

/// A named bag of optional fields (author, license, URLs, ...).
///
/// Known fields are always present, unset ones as `None`. Unknown fields
/// are kept and become additional tokens at deploy time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    name: String,
    data: ProfileData,
}

impl Profile {
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        let data = fields::ALL.iter().map(|f| (f.to_string(), None)).collect();
        Ok(Self { name, data })
    }

    /// Creates a profile from stored data, filling in missing known fields.
    pub fn from_data<S: Into<String>>(name: S, data: ProfileData) -> Result<Self> {
        let mut profile = Self::new(name)?;
        profile.data.extend(data);
        Ok(profile)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ProfileData {
        &self.data
    }

    pub fn into_data(self) -> ProfileData {
        self.data
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_deref())
    }

    pub fn set<S: Into<String>>(&mut self, field: S, value: Option<String>) {
        self.data.insert(field.into(), value);
    }
}

/// Profiles saved as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{PROFILE_EXTENSION}"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    pub fn load(&self, name: &str) -> Result<Profile> {
        validate_name(name)?;
        let path = self.path(name);
        if !path.is_file() {
            return Err(Error::ProfileNotFound { name: name.to_string() });
        }
        let data: ProfileData = serde_json::from_str(&fs::read_to_string(&path)?)?;
        debug!("Loaded profile '{name}' from '{}'", path.display());
        Profile::from_data(name, data)
    }

    pub fn save(&self, profile: &Profile, overwrite: bool) -> Result<PathBuf> {
        let path = self.path(profile.name());
        if path.exists() && !overwrite {
            return Err(Error::AlreadyExists {
                kind: "profile".to_string(),
                name: profile.name().to_string(),
            });
        }
        let content = serde_json::to_string_pretty(profile.data())?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, content)?;
        info!("Saved profile '{}' to '{}'", profile.name(), path.display());
        Ok(path)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        list_names(&self.dir, PROFILE_EXTENSION)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let path = self.path(name);
        if !path.is_file() {
            return Err(Error::ProfileNotFound { name: name.to_string() });
        }
        fs::remove_file(&path)?;
        info!("Deleted profile '{name}'");
        Ok(())
    }

    /// Renames the profile `old` to `new`, replacing an existing `new` only
    /// when `overwrite` is set.
    pub fn rename(&self, old: &str, new: &str, overwrite: bool) -> Result<PathBuf> {
        validate_name(old)?;
        validate_name(new)?;
        let from = self.path(old);
        if !from.is_file() {
            return Err(Error::ProfileNotFound { name: old.to_string() });
        }
        let to = self.path(new);
        if to.exists() && !overwrite {
            return Err(Error::AlreadyExists { kind: "profile".to_string(), name: new.to_string() });
        }
        fs::rename(&from, &to)?;
        info!("Renamed profile '{old}' to '{new}'");
        Ok(to)
    }
}
