//! In-memory representation of a template.
//!
//! - `codec`: the binary encoding of a [`TemplateArchive`]

pub mod codec;

use indexmap::IndexMap;

use crate::constants::DEFAULT_LANGUAGE;
use crate::error::{Error, Result};

pub use codec::{decode, encode, encode_to};

/// A template: a file tree plus the metadata needed to deploy it.
///
/// File keys are relative, `/`-separated paths and keep their insertion
/// order, which is also the order they are encoded and deployed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateArchive {
    pub files: IndexMap<String, Vec<u8>>,
    /// Profile defaults used when deploying without a profile.
    pub profile_data: IndexMap<String, Option<String>>,
    pub dependencies: Vec<String>,
    /// Key of the blueprint that produced this archive.
    pub language: String,
}

impl Default for TemplateArchive {
    fn default() -> Self {
        Self {
            files: IndexMap::new(),
            profile_data: IndexMap::new(),
            dependencies: Vec::new(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl TemplateArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    /// Total size of all file contents, in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.values().map(|v| v.len() as u64).sum()
    }

    /// Sets the dependencies installed after deploying this template.
    ///
    /// Only Python templates support dependency installation.
    pub fn set_dependencies<I, S>(&mut self, dependencies: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.language != "python" {
            return Err(Error::NotSupported(
                "dependency installations are only supported for Python templates"
                    .to_string(),
            ));
        }
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        log::info!("Dependencies set: {:?}", self.dependencies);
        Ok(())
    }
}

/// Checks that `key` is a relative, `/`-separated path that stays below the
/// directory it is deployed into.
///
/// Returns the reason the key is unsafe.
pub fn check_file_key(key: &str) -> std::result::Result<(), &'static str> {
    if key.is_empty() {
        return Err("it is empty");
    }
    if key.starts_with('/') {
        return Err("it is absolute");
    }
    if key.contains('\\') {
        return Err("it contains a backslash");
    }
    for segment in key.split('/') {
        match segment {
            "" => return Err("it contains an empty path segment"),
            "." | ".." => return Err("it contains a relative path segment"),
            s if s.len() == 2 && s.ends_with(':') => return Err("it contains a drive prefix"),
            _ => {}
        }
    }
    Ok(())
}
