/// Handles argument parsing and command dispatch.
pub mod cli;

/// Defines custom error types.
pub mod error;

/// Constants used across the crate.
pub mod constants;

/// Extension traits for standard library types.
pub mod ext;

/// The template archive and its binary encoding.
pub mod archive;

/// Rule sets turning a project into a template.
pub mod blueprint;

/// Builds templates from project directories.
pub mod builder;

/// Deploys templates into directories.
pub mod deployer;

/// Deploy-time token resolution.
pub mod placeholder;

/// Gitignore-style exclude patterns.
pub mod ignore;

/// Named sets of default values.
pub mod profile;

/// License text lookup.
pub mod license;

/// Saved templates.
pub mod store;

/// Build sources, including git repositories.
pub mod loader;

/// Dependency installation after deploy.
pub mod installer;

/// Locations of templates, profiles and settings.
pub mod config;

/// Name validation.
pub mod validation;
