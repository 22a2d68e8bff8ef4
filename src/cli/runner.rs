use crate::{
    archive::TemplateArchive,
    blueprint::{BlueprintRegistry, BlueprintSource},
    builder::{BuildOptions, TemplateBuilder},
    cli::{BuildArgs, Cli, Commands, DeleteArgs, DeployArgs, ListArgs, RenameArgs},
    config::Config,
    constants::{fields, DEFAULT_EXCLUDE_PATTERNS},
    deployer::{DeployOptions, DeployReport, TemplateDeployer},
    error::{Error, Result},
    ignore::{read_pattern_file, ExcludeSet},
    installer::{install_dependencies, read_requirements},
    license::LicenseFile,
    loader::BuildSource,
    profile::Profile,
    validation::validate_name,
};
use log::{debug, info};
use std::path::PathBuf;

/// Exclude patterns of a build, unioned from the extension, directory and
/// pattern file options.
pub fn exclude_patterns(args: &BuildArgs) -> Result<Vec<String>> {
    let dirs = match &args.ignore_dirs {
        Some(dirs) => dirs.clone(),
        None => DEFAULT_EXCLUDE_PATTERNS.iter().map(|p| p.to_string()).collect(),
    };
    let exts = args
        .ignore_exts
        .iter()
        .chain(&args.extend_ignore_exts)
        .map(|ext| ext.trim().trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!("*.{ext}"));

    let mut patterns: Vec<String> = dirs
        .into_iter()
        .chain(args.extend_ignore_dirs.iter().cloned())
        .map(|dir| dir.trim().to_string())
        .filter(|dir| !dir.is_empty())
        .chain(exts)
        .collect();
    for file in &args.exclude_from {
        patterns.extend(read_pattern_file(file)?);
    }
    Ok(patterns)
}

/// Where a build reads its project from: `--from-repo`, else `--source`,
/// which may itself be a repository URL.
fn build_source(args: &BuildArgs) -> BuildSource {
    match &args.from_repo {
        Some(url) => BuildSource::Git(url.clone()),
        None => BuildSource::from_string(&args.source),
    }
}

/// Orchestrates the `build`, `deploy` and `list` commands.
pub struct Runner {
    config: Config,
    registry: BlueprintRegistry,
}

impl Runner {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self { config, registry: BlueprintRegistry::builtin()? })
    }

    /// Loads the named profile, or the configured default one.
    fn load_profile(&self, name: Option<&str>) -> Result<Option<Profile>> {
        let store = self.config.profile_store();
        match name {
            Some(name) => store.load(name).map(Some),
            None => match self.config.default_profile.as_deref() {
                Some(name) if store.exists(name) => store.load(name).map(Some),
                Some(name) => {
                    debug!("Default profile '{name}' does not exist, continuing without one");
                    Ok(None)
                }
                None => Ok(None),
            },
        }
    }

    /// Picks the blueprint of a build: the requested one, else the profile's
    /// preferred language when a blueprint exists for it.
    fn blueprint_for(&self, requested: Option<&str>, profile: Option<&Profile>) -> Option<BlueprintSource> {
        if let Some(key) = requested {
            return Some(BlueprintSource::ByKey(key.to_lowercase()));
        }
        let language = profile?.get(fields::PREFERRED_LANGUAGE)?.to_lowercase();
        if self.registry.get(&language).is_some() {
            debug!("Using the profile's preferred language '{language}' as blueprint");
            Some(BlueprintSource::ByKey(language))
        } else {
            None
        }
    }

    pub fn build(&self, args: BuildArgs) -> Result<TemplateArchive> {
        validate_name(&args.name)?;
        let store = self.config.template_store();
        if !args.check && !args.overwrite && store.exists(&args.name) {
            return Err(Error::AlreadyExists { kind: "template".to_string(), name: args.name });
        }

        let source = build_source(&args);
        info!("Building '{}' from {source}", args.name);
        let loaded = source.load()?;

        let excludes = ExcludeSet::new(exclude_patterns(&args)?)?;
        let builder = TemplateBuilder::new(loaded.root())?.with_excludes(excludes);

        let profile = self.load_profile(args.profile.as_deref())?;
        let options = BuildOptions {
            project_name: args.project_name.clone(),
            project_slug: args.project_slug.clone(),
            blueprint: self.blueprint_for(args.blueprint.as_deref(), profile.as_ref()),
            profile: profile.map(Profile::into_data),
            store_profile: args.store_profile,
            only_replace_profile_data: args.only_replace_profile_data,
        };
        let mut archive = builder.build(options, &self.registry)?;

        let mut dependencies = args.with_installs.clone();
        if let Some(file) = &args.with_requirements_file {
            dependencies.extend(read_requirements(file)?);
        }
        if !dependencies.is_empty() {
            archive.set_dependencies(dependencies)?;
        }

        if args.check {
            print_manifest(&args.name, &archive);
            return Ok(archive);
        }

        let path = store.save(&args.name, &archive, args.overwrite)?;
        println!(
            "Template '{}' built with {} file(s) and saved to {}.",
            args.name,
            archive.files.len(),
            path.display()
        );
        Ok(archive)
    }

    pub fn deploy(&self, args: DeployArgs) -> Result<DeployReport> {
        let archive = self.config.template_store().load(&args.name)?;
        let profile = self.load_profile(args.profile.as_deref())?;
        let licenses = LicenseFile::load(&self.config.licenses_file)?;

        let options = DeployOptions {
            project_name: args.project_name.clone(),
            project_slug: args.slug.clone(),
            profile: profile.map(Profile::into_data),
            force: args.force,
        };
        let report = TemplateDeployer::new(&archive, &licenses).deploy(&args.target, options)?;

        if !report.overwritten.is_empty() {
            eprintln!("Warning: overwrote {}.", report.overwritten.join(", "));
        }
        for (file, tokens) in &report.unresolved {
            eprintln!("Warning: {file} contains unresolved values for {}.", tokens.join(", "));
        }

        if args.no_installs {
            debug!("Skipping dependency installation");
        } else {
            install_dependencies(&args.target, &archive.dependencies, &self.config.python)?;
        }

        println!(
            "Template '{}' deployed with {} file(s) to {}.",
            args.name,
            report.written.len(),
            args.target.display()
        );
        Ok(report)
    }

    pub fn list(&self, args: ListArgs) -> Result<Vec<String>> {
        let names = if args.profiles {
            self.config.profile_store().list()?
        } else {
            self.config.template_store().list()?
        };
        for name in &names {
            println!("{name}");
        }
        Ok(names)
    }

    /// Deletes every named template or profile, skipping missing ones with a
    /// warning. Returns the names that were deleted.
    pub fn delete(&self, args: DeleteArgs) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for name in &args.names {
            let result = if args.profiles {
                self.config.profile_store().delete(name)
            } else {
                self.config.template_store().delete(name)
            };
            match result {
                Ok(()) => deleted.push(name.clone()),
                Err(e @ (Error::TemplateNotFound { .. } | Error::ProfileNotFound { .. })) => {
                    eprintln!("Warning: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        println!("Deleted {} of {} name(s).", deleted.len(), args.names.len());
        Ok(deleted)
    }

    pub fn rename(&self, args: RenameArgs) -> Result<PathBuf> {
        let (kind, path) = if args.profiles {
            ("Profile", self.config.profile_store().rename(&args.old, &args.new, args.overwrite)?)
        } else {
            ("Template", self.config.template_store().rename(&args.old, &args.new, args.overwrite)?)
        };
        println!("{kind} '{}' renamed to '{}'.", args.old, args.new);
        Ok(path)
    }
}

fn print_manifest(name: &str, archive: &TemplateArchive) {
    println!("Template '{name}' ({}):", archive.language);
    for (key, data) in &archive.files {
        println!("  {key} ({} bytes)", data.len());
    }
    if !archive.dependencies.is_empty() {
        println!("Dependencies: {}", archive.dependencies.join(", "));
    }
    println!("{} file(s), {} bytes in total.", archive.files.len(), archive.total_size());
}

/// Main entry point for CLI execution
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config_dir.as_deref())?;
    config.ensure_dirs()?;
    let runner = Runner::new(config)?;
    match cli.command {
        Commands::Build(args) => runner.build(args).map(|_| ()),
        Commands::Deploy(args) => runner.deploy(args).map(|_| ()),
        Commands::List(args) => runner.list(args).map(|_| ()),
        Commands::Delete(args) => runner.delete(args).map(|_| ()),
        Commands::Rename(args) => runner.rename(args).map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn build_args(argv: &[&str]) -> BuildArgs {
        let mut full = vec!["stencil", "build"];
        full.extend(argv);
        match Cli::parse_from(full).command {
            Commands::Build(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn exclude_patterns_union_every_source() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("patterns");
        fs::write(&file, "# c\n/secret.txt\n").unwrap();
        let file = file.display().to_string();
        let args = build_args(&[
            "t",
            "--ignore-dirs",
            ".git",
            "--extend-ignore-dirs",
            "node_modules",
            "--extend-ignore-exts",
            ".log",
            "--exclude-from",
            &file,
        ]);
        assert_eq!(
            exclude_patterns(&args).unwrap(),
            vec![".git", "node_modules", "*.pyc", "*.pyd", "*.pyo", "*.log", "/secret.txt"]
        );
    }

    #[test]
    fn default_dirs_are_used_unless_replaced() {
        let args = build_args(&["t"]);
        let patterns = exclude_patterns(&args).unwrap();
        assert!(patterns.contains(&".git".to_string()));
        assert!(patterns.contains(&"*.egg-info".to_string()));
    }

    #[test]
    fn source_may_be_a_directory_or_a_repository() {
        assert_eq!(build_source(&build_args(&["t"])), BuildSource::FileSystem(".".into()));
        assert_eq!(
            build_source(&build_args(&["t", "--source", "projects/app"])),
            BuildSource::FileSystem("projects/app".into())
        );
        assert_eq!(
            build_source(&build_args(&["t", "--source", "https://github.com/user/repo.git"])),
            BuildSource::Git("https://github.com/user/repo.git".to_string())
        );
        assert_eq!(
            build_source(&build_args(&["t", "--source", "git@github.com:user/repo.git"])),
            BuildSource::Git("git@github.com:user/repo.git".to_string())
        );
        assert_eq!(
            build_source(&build_args(&["t", "--source", "dir", "--from-repo", "https://x.io/a/b"])),
            BuildSource::Git("https://x.io/a/b".to_string())
        );
    }

    #[test]
    fn missing_exclude_file_fails() {
        let args = build_args(&["t", "--exclude-from", "/does/not/exist"]);
        assert!(matches!(exclude_patterns(&args), Err(Error::PatternSourceNotFound { .. })));
    }

    #[test]
    fn preferred_language_selects_blueprint() {
        let dir = TempDir::new().unwrap();
        let runner = Runner::new(Config::with_dir(dir.path())).unwrap();
        let mut profile = Profile::new("p").unwrap();
        profile.set(fields::PREFERRED_LANGUAGE, Some("Python".to_string()));
        assert!(matches!(
            runner.blueprint_for(None, Some(&profile)),
            Some(BlueprintSource::ByKey(key)) if key == "python"
        ));

        profile.set(fields::PREFERRED_LANGUAGE, Some("cobol".to_string()));
        assert!(runner.blueprint_for(None, Some(&profile)).is_none());
        assert!(matches!(
            runner.blueprint_for(Some("rust"), Some(&profile)),
            Some(BlueprintSource::ByKey(key)) if key == "rust"
        ));
    }

    #[test]
    fn missing_default_profile_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::with_dir(dir.path());
        config.default_profile = Some("gone".to_string());
        let runner = Runner::new(config).unwrap();
        assert!(runner.load_profile(None).unwrap().is_none());
        assert!(matches!(runner.load_profile(Some("gone")), Err(Error::ProfileNotFound { .. })));
    }
}
