//! Turns a project directory into a [`TemplateArchive`].

use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::archive::TemplateArchive;
use crate::blueprint::{symbolize_keys, BlueprintContext, BlueprintRegistry, BlueprintSource};
use crate::constants::limits;
use crate::error::{Error, Result};
use crate::ext::PathExt;
use crate::ignore::ExcludeSet;
use crate::placeholder::to_slug;

/// Options of a single build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Literal project name to replace. Defaults to the root directory's name.
    pub project_name: Option<String>,
    /// Literal project slug to replace. Defaults to the slug of the name.
    pub project_slug: Option<String>,
    /// Blueprint to apply. Without one only paths are rewritten.
    pub blueprint: Option<BlueprintSource>,
    /// Profile fields known at build time.
    pub profile: Option<IndexMap<String, Option<String>>>,
    /// Store the profile in the archive as deploy-time defaults.
    pub store_profile: bool,
    /// Only rewrite attributes the profile can provide a value for.
    pub only_replace_profile_data: bool,
}

/// Normalizes CRLF line endings of text content. Binary content is kept as is.
fn normalize_line_endings(data: Vec<u8>) -> Vec<u8> {
    match String::from_utf8(data) {
        Ok(text) if text.contains("\r\n") => text.replace("\r\n", "\n").into_bytes(),
        Ok(text) => text.into_bytes(),
        Err(err) => err.into_bytes(),
    }
}

pub struct TemplateBuilder {
    root: PathBuf,
    excludes: ExcludeSet,
}

impl TemplateBuilder {
    /// Creates a builder over `root`, which must be an existing directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::NotADirectory { path: root.display().to_string() });
        }
        Ok(Self { root: root.to_path_buf(), excludes: ExcludeSet::empty() })
    }

    pub fn with_excludes(mut self, excludes: ExcludeSet) -> Self {
        self.excludes = excludes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the root directory, used as the default project name.
    pub fn root_name(&self) -> Result<String> {
        let root = fs::canonicalize(&self.root)?;
        let name = root
            .file_name()
            .ok_or_else(|| Error::InvalidPath { path: root.display().to_string() })?;
        Ok(Path::new(name).to_str_checked()?.to_string())
    }

    /// Lists every file under the root that is not excluded, sorted by path.
    ///
    /// Excluded directories are not descended into.
    pub fn find_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root).sort_by_file_name().into_iter();

        for entry in walker.filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let excluded = entry
                .path()
                .strip_prefix(&self.root)
                .ok()
                .and_then(|relative| relative.to_slash_string().ok())
                .is_some_and(|key| self.excludes.is_excluded(&key));
            if excluded {
                debug!("Excluding '{}'", entry.path().display());
            }
            !excluded
        }) {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        debug!("Found {} file(s) under '{}'", files.len(), self.root.display());
        Ok(files)
    }

    /// Reads `paths` into archive entries keyed by their root-relative path.
    pub fn load_files(&self, paths: &[PathBuf]) -> Result<IndexMap<String, Vec<u8>>> {
        let mut files = IndexMap::with_capacity(paths.len());
        for path in paths {
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let key = relative.to_slash_string()?;
            let data = normalize_line_endings(fs::read(path)?);
            trace!("Loaded '{key}' ({} bytes)", data.len());
            files.insert(key, data);
        }
        Ok(files)
    }

    /// Walks the root, loads the files and applies the selected blueprint.
    pub fn build(&self, options: BuildOptions, registry: &BlueprintRegistry) -> Result<TemplateArchive> {
        let project_name = match options.project_name {
            Some(name) => name,
            None => self.root_name()?,
        };
        let project_slug = options.project_slug.unwrap_or_else(|| to_slug(&project_name));
        info!("Building template from '{}' (name: {project_name}, slug: {project_slug})", self.root.display());

        let files = self.load_files(&self.find_files()?)?;
        if files.is_empty() {
            return Err(Error::NoFiles);
        }
        if files.len() as u64 > limits::MAX_FILES {
            warn!(
                "{} files were found but templates hold at most {}; saving this template will fail",
                files.len(),
                limits::MAX_FILES
            );
        }

        let mut archive = TemplateArchive::new();
        match options.blueprint {
            Some(source) => {
                let blueprint = source.resolve(registry)?;
                let profile = options.profile.as_ref().filter(|_| options.only_replace_profile_data);
                let ctx = BlueprintContext {
                    project_name: &project_name,
                    project_slug: &project_slug,
                    profile,
                };
                archive.files = blueprint.apply(files, &ctx)?;
                archive.language = blueprint.key().to_string();
            }
            None => {
                archive.files = symbolize_keys(files, &project_slug)?;
            }
        }

        if options.store_profile {
            match options.profile {
                Some(profile) => archive.profile_data = profile,
                None => warn!("No profile was given, so none was stored in the template"),
            }
        }

        info!(
            "Built '{}' template with {} file(s) ({} bytes)",
            archive.language,
            archive.files.len(),
            archive.total_size()
        );
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, key: &str, content: &[u8]) {
        let path = root.join(key);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", b"# MyApp\r\n");
        write(dir.path(), "myapp/__init__.py", b"__version__ = \"0.1.0\"\n");
        write(dir.path(), "myapp/core.pyc", &[0x42, 0x0d, 0x0a, 0xff]);
        write(dir.path(), ".git/HEAD", b"ref: refs/heads/main\n");
        dir
    }

    fn options() -> BuildOptions {
        BuildOptions {
            project_name: Some("MyApp".to_string()),
            project_slug: Some("myapp".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn root_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(matches!(TemplateBuilder::new(&file), Err(Error::NotADirectory { .. })));
    }

    #[test]
    fn find_files_skips_excluded_and_sorts() {
        let dir = project();
        let builder = TemplateBuilder::new(dir.path())
            .unwrap()
            .with_excludes(ExcludeSet::new([".git", "*.pyc"]).unwrap());
        let files = builder.find_files().unwrap();
        let keys: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_slash_string().unwrap())
            .collect();
        assert_eq!(keys, vec!["README.md", "myapp/__init__.py"]);
    }

    #[test]
    fn text_line_endings_are_normalized() {
        let dir = project();
        let builder = TemplateBuilder::new(dir.path()).unwrap();
        let files = builder.load_files(&builder.find_files().unwrap()).unwrap();
        assert_eq!(files["README.md"], b"# MyApp\n".to_vec());
        assert_eq!(files["myapp/core.pyc"], vec![0x42, 0x0d, 0x0a, 0xff]);
    }

    #[test]
    fn build_without_blueprint_only_rewrites_paths() {
        let dir = project();
        let builder = TemplateBuilder::new(dir.path())
            .unwrap()
            .with_excludes(ExcludeSet::with_defaults(["*.pyc"]).unwrap());
        let archive = builder.build(options(), &BlueprintRegistry::default()).unwrap();
        assert_eq!(archive.language, "none");
        assert_eq!(archive.filenames(), vec!["README.md", "PROJECTSLUG/__init__.py"]);
        assert_eq!(archive.files["README.md"], b"# MyApp\n".to_vec());
    }

    #[test]
    fn build_with_python_blueprint() {
        let dir = project();
        let builder = TemplateBuilder::new(dir.path())
            .unwrap()
            .with_excludes(ExcludeSet::with_defaults(["*.pyc"]).unwrap());
        let registry = BlueprintRegistry::builtin().unwrap();
        let archive = builder
            .build(BuildOptions { blueprint: Some("python".into()), ..options() }, &registry)
            .unwrap();

        assert_eq!(archive.language, "python");
        let readme = String::from_utf8(archive.files["README.md"].clone()).unwrap();
        assert!(readme.starts_with("# $:project_name:\n"));
        assert!(readme.contains("## Acknowledgements"));
        assert_eq!(
            archive.files["PROJECTSLUG/__init__.py"],
            b"__version__ = \"$:starting_version:\"\n".to_vec()
        );
    }

    #[test]
    fn unknown_blueprint_is_rejected() {
        let dir = project();
        let builder = TemplateBuilder::new(dir.path()).unwrap();
        let registry = BlueprintRegistry::builtin().unwrap();
        let err = builder
            .build(BuildOptions { blueprint: Some("cobol".into()), ..options() }, &registry)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownBlueprint { .. }));
    }

    #[test]
    fn files_sharing_a_symbolized_key_fail_the_build() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "myapp/a.txt", b"one");
        write(dir.path(), "PROJECTSLUG/a.txt", b"two");
        let builder = TemplateBuilder::new(dir.path()).unwrap();

        let err = builder.build(options(), &BlueprintRegistry::default()).unwrap_err();
        assert!(matches!(err, Error::PathCollision { ref key, .. } if key == "PROJECTSLUG/a.txt"));

        let registry = BlueprintRegistry::builtin().unwrap();
        let err = builder
            .build(BuildOptions { blueprint: Some("generic".into()), ..options() }, &registry)
            .unwrap_err();
        assert!(matches!(err, Error::PathCollision { .. }));
    }

    #[test]
    fn empty_tree_is_an_error() {
        let dir = TempDir::new().unwrap();
        let builder = TemplateBuilder::new(dir.path()).unwrap();
        let err = builder.build(options(), &BlueprintRegistry::default()).unwrap_err();
        assert!(matches!(err, Error::NoFiles));
    }

    #[test]
    fn profile_is_stored_on_request() {
        let dir = project();
        let builder = TemplateBuilder::new(dir.path()).unwrap();
        let mut profile = IndexMap::new();
        profile.insert("author_name".to_string(), Some("Barney".to_string()));

        let archive = builder
            .build(
                BuildOptions { profile: Some(profile.clone()), ..options() },
                &BlueprintRegistry::default(),
            )
            .unwrap();
        assert!(archive.profile_data.is_empty());

        let archive = builder
            .build(
                BuildOptions { profile: Some(profile.clone()), store_profile: true, ..options() },
                &BlueprintRegistry::default(),
            )
            .unwrap();
        assert_eq!(archive.profile_data, profile);
    }

    #[test]
    fn default_name_comes_from_root() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("cool_tool");
        write(&root, "cool_tool/main.py", b"print('cool_tool')\n");
        let builder = TemplateBuilder::new(&root).unwrap();
        assert_eq!(builder.root_name().unwrap(), "cool_tool");
        let archive = builder.build(BuildOptions::default(), &BlueprintRegistry::default()).unwrap();
        assert_eq!(archive.filenames(), vec!["PROJECTSLUG/main.py"]);
    }
}
