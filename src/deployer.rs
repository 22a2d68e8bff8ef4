//! Materializes a [`TemplateArchive`] into a directory.

use chrono::{Local, NaiveDate};
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::fs;
use std::collections::HashSet;
use std::path::{Component, Path};

use crate::archive::{check_file_key, TemplateArchive};
use crate::constants::{fields, tokens};
use crate::error::{Error, Result};
use crate::ext::PathExt;
use crate::license::LicenseResolver;
use crate::placeholder::{merge_profile_data, to_slug, Placeholders, ResolveContext};

/// Options of a single deploy.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Defaults to the target directory's name.
    pub project_name: Option<String>,
    /// Defaults to the slug of the project name. Requires `project_name`.
    pub project_slug: Option<String>,
    /// Overrides the profile defaults stored in the archive.
    pub profile: Option<IndexMap<String, Option<String>>>,
    /// Overwrite files that already exist in the target.
    pub force: bool,
}

/// Soft warnings raised by a successful deploy.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// Files written, in archive order.
    pub written: Vec<String>,
    /// Existing files that were replaced.
    pub overwritten: Vec<String>,
    /// Files that still hold unresolved tokens, with those tokens.
    pub unresolved: Vec<(String, Vec<String>)>,
}

impl DeployReport {
    pub fn is_clean(&self) -> bool {
        self.overwritten.is_empty() && self.unresolved.is_empty()
    }
}

pub struct TemplateDeployer<'a> {
    archive: &'a TemplateArchive,
    licenses: &'a dyn LicenseResolver,
    today: NaiveDate,
}

impl<'a> TemplateDeployer<'a> {
    pub fn new(archive: &'a TemplateArchive, licenses: &'a dyn LicenseResolver) -> Self {
        Self { archive, licenses, today: Local::now().date_naive() }
    }

    /// Uses `today` for the year and calendar version tokens.
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    fn project_names(target: &Path, options: &DeployOptions) -> Result<(String, String)> {
        let project_name = match (&options.project_name, &options.project_slug) {
            (Some(name), _) => name.clone(),
            (None, Some(_)) => {
                return Err(Error::InvalidArgument(
                    "a project slug cannot be given without a project name".to_string(),
                ))
            }
            (None, None) => {
                let target = fs::canonicalize(target)?;
                let name = target
                    .file_name()
                    .ok_or_else(|| Error::InvalidPath { path: target.display().to_string() })?;
                Path::new(name).to_str_checked()?.to_string()
            }
        };
        let project_slug = match &options.project_slug {
            Some(slug) => {
                if !slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_') {
                    return Err(Error::InvalidArgument(format!(
                        "project slug '{slug}' may only contain lower-case letters, numbers and underscores"
                    )));
                }
                slug.clone()
            }
            None => to_slug(&project_name),
        };
        if project_slug.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "no valid project slug can be derived from '{project_name}'"
            )));
        }
        Ok((project_name, project_slug))
    }

    /// Fails unless every destination key is distinct and stays below `target`.
    fn check_destinations(target: &Path, files: &[(String, &Vec<u8>)]) -> Result<()> {
        let mut seen = HashSet::new();
        for (key, _) in files {
            if let Err(reason) = check_file_key(key) {
                return Err(Error::InvalidFormat { reason: format!("file key '{key}' is unsafe: {reason}") });
            }
            let inside = target.join(key).strip_prefix(target).is_ok_and(|rel| {
                rel.components().all(|c| matches!(c, Component::Normal(_)))
            });
            if !inside {
                return Err(Error::InvalidFormat {
                    reason: format!("file key '{key}' points outside the target directory"),
                });
            }
            if !seen.insert(key.as_str()) {
                return Err(Error::InvalidFormat { reason: format!("file '{key}' appears more than once") });
            }
        }
        Ok(())
    }

    /// Writes the archive's files into `target`.
    ///
    /// No file is written when one of them already exists and `force` is not
    /// set. Writes are not transactional: an I/O error part way through
    /// leaves the files written so far in place.
    pub fn deploy<P: AsRef<Path>>(&self, target: P, options: DeployOptions) -> Result<DeployReport> {
        let target = target.as_ref();
        if !target.is_dir() {
            return Err(Error::NotADirectory { path: target.display().to_string() });
        }

        let (project_name, project_slug) = Self::project_names(target, &options)?;
        info!("Deploying '{}' template as {project_name} ({project_slug}) into '{}'", self.archive.language, target.display());

        let files: Vec<(String, &Vec<u8>)> = self
            .archive
            .files
            .iter()
            .map(|(key, data)| (key.replace(tokens::PATH_SLUG, &project_slug), data))
            .collect();
        Self::check_destinations(target, &files)?;

        let existing: Vec<String> =
            files.iter().filter(|(key, _)| target.join(key).exists()).map(|(key, _)| key.clone()).collect();
        if !existing.is_empty() && !options.force {
            return Err(Error::WouldOverwrite { paths: existing });
        }

        let profile = merge_profile_data(&self.archive.profile_data, options.profile.as_ref());
        let license = profile
            .get(fields::PREFERRED_LICENSE)
            .and_then(|key| key.as_deref())
            .and_then(|key| {
                let license = self.licenses.resolve(key);
                if license.is_none() {
                    warn!("License '{key}' could not be resolved");
                }
                license
            });
        let placeholders = Placeholders::resolve(&ResolveContext {
            project_name: &project_name,
            project_slug: &project_slug,
            today: self.today,
            profile: &profile,
            license: license.as_ref(),
        });

        let mut report = DeployReport { overwritten: existing, ..Default::default() };
        for (key, data) in files {
            let path = target.join(&key);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let substitution = placeholders.apply(data);
            fs::write(&path, &substitution.content)?;
            debug!("Wrote '{key}' ({} bytes)", substitution.content.len());

            if !substitution.unresolved.is_empty() {
                warn!("'{key}' contains unresolved values: {}", substitution.unresolved.join(", "));
                report.unresolved.push((key.clone(), substitution.unresolved));
            }
            report.written.push(key);
        }

        if !report.overwritten.is_empty() {
            warn!("Overwrote existing files: {}", report.overwritten.join(", "));
        }
        info!("Deployed {} file(s) into '{}'", report.written.len(), target.display());
        Ok(report)
    }
}
