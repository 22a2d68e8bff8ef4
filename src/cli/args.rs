use crate::constants::{exit_codes, verbosity};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#;

/// Capture a project as a reusable template and deploy it elsewhere.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding templates, profiles and settings.
    #[arg(long, value_name = "DIR", env = "STENCIL_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a template from a project directory or repository.
    Build(BuildArgs),
    /// Deploy a saved template into a directory.
    Deploy(DeployArgs),
    /// List saved templates or profiles.
    List(ListArgs),
    /// Delete saved templates or profiles.
    Delete(DeleteArgs),
    /// Rename a saved template or profile.
    Rename(RenameArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Name to save the template as.
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Project directory or git repository URL to build from.
    #[arg(short, long, value_name = "DIR|URL", default_value = ".")]
    pub source: String,

    /// Replace an existing template with the same name.
    #[arg(long)]
    pub overwrite: bool,

    /// Show what would be saved without saving it.
    #[arg(long)]
    pub check: bool,

    /// Build from a git repository instead of a local directory.
    #[arg(long, value_name = "URL")]
    pub from_repo: Option<String>,

    /// Dependencies to install when the template is deployed (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "DEPS")]
    pub with_installs: Vec<String>,

    /// Read deployment dependencies from a requirements file.
    #[arg(long, value_name = "FILE")]
    pub with_requirements_file: Option<PathBuf>,

    /// File extensions to exclude (comma-separated).
    #[arg(long, value_delimiter = ',', default_value = "pyc,pyd,pyo", value_name = "EXTS")]
    pub ignore_exts: Vec<String>,

    /// Additional file extensions to exclude (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "EXTS")]
    pub extend_ignore_exts: Vec<String>,

    /// Directories to exclude, replacing the default list (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "DIRS")]
    pub ignore_dirs: Option<Vec<String>>,

    /// Additional directories to exclude (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "DIRS")]
    pub extend_ignore_dirs: Vec<String>,

    /// Read gitignore-style exclude patterns from a file.
    #[arg(long, value_name = "FILE")]
    pub exclude_from: Vec<PathBuf>,

    /// Blueprint to apply (generic, python, rust).
    #[arg(short, long, value_name = "KEY")]
    pub blueprint: Option<String>,

    /// Project name to replace (defaults to the source directory's name).
    #[arg(long, value_name = "NAME")]
    pub project_name: Option<String>,

    /// Project slug to replace (defaults to the slug of the project name).
    #[arg(long, value_name = "SLUG")]
    pub project_slug: Option<String>,

    /// Profile to build with.
    #[arg(short, long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Store the profile in the template as deploy-time defaults.
    #[arg(long)]
    pub store_profile: bool,

    /// Only replace attributes the profile has values for.
    #[arg(long)]
    pub only_replace_profile_data: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Name of the template to deploy.
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Directory to deploy into.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub target: PathBuf,

    /// Overwrite files that already exist.
    #[arg(short, long)]
    pub force: bool,

    /// Do not install the template's dependencies.
    #[arg(long)]
    pub no_installs: bool,

    /// Project name (defaults to the target directory's name).
    #[arg(long = "name", value_name = "PROJECT_NAME")]
    pub project_name: Option<String>,

    /// Project slug (defaults to the slug of the project name).
    #[arg(long, value_name = "SLUG", requires = "project_name")]
    pub slug: Option<String>,

    /// Profile to deploy with.
    #[arg(short, long, value_name = "PROFILE")]
    pub profile: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// List profiles instead of templates.
    #[arg(long)]
    pub profiles: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Names of the templates (or profiles) to delete.
    #[arg(value_name = "NAME", required = true, num_args = 1..)]
    pub names: Vec<String>,

    /// Delete profiles instead of templates.
    #[arg(long)]
    pub profiles: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RenameArgs {
    /// Current name.
    #[arg(value_name = "OLD")]
    pub old: String,

    /// New name.
    #[arg(value_name = "NEW")]
    pub new: String,

    /// Rename a profile instead of a template.
    #[arg(long)]
    pub profiles: bool,

    /// Replace an existing template or profile called NEW.
    #[arg(long)]
    pub overwrite: bool,
}

/// Parse command line arguments, printing help when a required input is missing.
pub fn parse_cli() -> Cli {
    Cli::try_parse().unwrap_or_else(|e| {
        if e.kind() == ErrorKind::MissingRequiredArgument
            || e.kind() == ErrorKind::MissingSubcommand
        {
            let mut command = Cli::command().help_template(HELP_TEMPLATE);
            if let Err(print_err) = command.print_help() {
                eprintln!("Failed to display help information: {print_err}");
            } else {
                println!();
            }
            std::process::exit(exit_codes::FAILURE);
        } else {
            e.exit();
        }
    })
}

/// Map `-v` counts to the appropriate log level.
pub fn get_log_level_from_verbose(verbose_count: u8) -> LevelFilter {
    match verbose_count {
        verbosity::OFF => LevelFilter::Error,
        verbosity::INFO => LevelFilter::Info,
        verbosity::DEBUG => LevelFilter::Debug,
        verbosity::TRACE.. => LevelFilter::Trace,
    }
}
