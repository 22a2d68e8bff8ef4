//! Saved templates, kept as `<dir>/<name>.stx` archive files.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::{self, TemplateArchive};
use crate::constants::TEMPLATE_EXTENSION;
use crate::error::{Error, Result};
use crate::validation::validate_name;

/// Sorted names of the files in `dir` with the given extension.
///
/// A missing directory holds no names.
pub(crate) fn list_names(dir: &Path, extension: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{TEMPLATE_EXTENSION}"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Encodes and saves `archive` under `name`.
    ///
    /// The archive is fully encoded before the file is touched, so a limit
    /// error never leaves a partial file behind.
    pub fn save(&self, name: &str, archive: &TemplateArchive, overwrite: bool) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.path(name);
        if path.exists() && !overwrite {
            return Err(Error::AlreadyExists { kind: "template".to_string(), name: name.to_string() });
        }

        let bytes = archive::encode(archive)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, &bytes)?;
        info!("Saved template '{name}' to '{}' ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<TemplateArchive> {
        validate_name(name)?;
        let path = self.path(name);
        if !path.is_file() {
            return Err(Error::TemplateNotFound { name: name.to_string() });
        }
        let archive = archive::decode(&fs::read(&path)?)?;
        debug!("Loaded template '{name}' ({} file(s))", archive.files.len());
        Ok(archive)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        list_names(&self.dir, TEMPLATE_EXTENSION)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let path = self.path(name);
        if !path.is_file() {
            return Err(Error::TemplateNotFound { name: name.to_string() });
        }
        fs::remove_file(&path)?;
        info!("Deleted template '{name}'");
        Ok(())
    }

    /// Renames the template `old` to `new`, replacing an existing `new` only
    /// when `overwrite` is set.
    pub fn rename(&self, old: &str, new: &str, overwrite: bool) -> Result<PathBuf> {
        validate_name(old)?;
        validate_name(new)?;
        let from = self.path(old);
        if !from.is_file() {
            return Err(Error::TemplateNotFound { name: old.to_string() });
        }
        let to = self.path(new);
        if to.exists() && !overwrite {
            return Err(Error::AlreadyExists { kind: "template".to_string(), name: new.to_string() });
        }
        fs::rename(&from, &to)?;
        info!("Renamed template '{old}' to '{new}'");
        Ok(to)
    }
}
