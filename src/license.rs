//! License text lookup used at deploy time.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Full, human-readable name, e.g. "MIT License".
    pub name: String,
    /// License text. `[year]` and `[fullname]` are filled in on deploy.
    pub body: String,
}

/// Resolves a license key (as stored in a profile) to its text.
pub trait LicenseResolver {
    fn resolve(&self, key: &str) -> Option<License>;
}

/// Licenses read from a JSON object of `key -> { name, body }`.
#[derive(Debug, Default)]
pub struct LicenseFile {
    licenses: IndexMap<String, License>,
}

impl LicenseFile {
    /// Loads the license file. A missing file yields an empty set.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            debug!("No license file at '{}'", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let licenses: IndexMap<String, License> = serde_json::from_str(&content)?;
        debug!("Loaded {} license(s) from '{}'", licenses.len(), path.display());
        Ok(Self::from_licenses(licenses))
    }

    pub fn from_licenses(licenses: IndexMap<String, License>) -> Self {
        let licenses = licenses.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect();
        Self { licenses }
    }
}

impl LicenseResolver for LicenseFile {
    fn resolve(&self, key: &str) -> Option<License> {
        self.licenses.get(&key.trim().to_lowercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut licenses = IndexMap::new();
        licenses.insert(
            "MIT".to_string(),
            License { name: "MIT License".into(), body: "Permission is hereby granted".into() },
        );
        let file = LicenseFile::from_licenses(licenses);
        assert_eq!(file.resolve("mit").unwrap().name, "MIT License");
        assert_eq!(file.resolve(" Mit ").unwrap().name, "MIT License");
        assert!(file.resolve("gpl-3.0").is_none());
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = LicenseFile::load(dir.path().join("licenses.json")).unwrap();
        assert!(file.resolve("mit").is_none());
    }

    #[test]
    fn loads_json_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("licenses.json");
        std::fs::write(&path, r#"{"bsd-3-clause": {"name": "BSD 3-Clause", "body": "text"}}"#)
            .unwrap();
        let file = LicenseFile::load(&path).unwrap();
        assert_eq!(file.resolve("BSD-3-Clause").unwrap().body, "text");
    }
}
