use std::process::ExitStatus;
use thiserror::Error;

use crate::constants::exit_codes;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse exclude patterns. Original error: {0}")]
    GlobSetParseError(#[from] globset::Error),

    #[error("Failed to compile file pattern. Original error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Failed to clone repository. Original error: {0}")]
    Git2Error(#[from] git2::Error),

    #[error("Failed to (de)serialize JSON data. Original error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to walk directory. Original error: {0}")]
    WalkDirError(#[from] walkdir::Error),

    /// The byte stream is not a template archive, or is corrupt.
    #[error("Invalid template archive: {reason}.")]
    InvalidFormat { reason: String },

    /// The byte stream carries the legacy archive magic.
    #[error("Unsupported template archive version: this archive was written in the legacy format and must be read with a legacy decoder.")]
    UnsupportedVersion,

    #[error("Template archive is truncated: expected {expected} more byte(s) while reading {field}.")]
    Truncated { field: String, expected: usize },

    /// A field does not fit the fixed-width length encoding of the archive format.
    #[error("Cannot save template: {field} is {actual}, the maximum is {limit}.")]
    LimitExceeded { field: String, limit: u64, actual: u64 },

    #[error("Invalid name '{name}': names may only contain lower-case letters, numbers and underscores (at most 32 characters).")]
    InvalidName { name: String },

    #[error("'{key}' is not a registered blueprint (choose between: {available}).")]
    UnknownBlueprint { key: String, available: String },

    #[error("Invalid argument: {0}.")]
    InvalidArgument(String),

    #[error("Not supported: {0}.")]
    NotSupported(String),

    #[error("Cannot build template: no files were provided.")]
    NoFiles,

    #[error("Cannot build template: '{first}' and '{second}' would both be stored as '{key}'.")]
    PathCollision { key: String, first: String, second: String },

    #[error("Cannot proceed: the template would overwrite existing files ({}). Use --force to overwrite them.", paths.join(", "))]
    WouldOverwrite { paths: Vec<String> },

    #[error("Cannot proceed: '{path}' is not a directory.")]
    NotADirectory { path: String },

    #[error("No template named '{name}' exists.")]
    TemplateNotFound { name: String },

    #[error("No profile named '{name}' exists.")]
    ProfileNotFound { name: String },

    #[error("A {kind} called '{name}' already exists. Use --overwrite to replace it.")]
    AlreadyExists { kind: String, name: String },

    #[error("Cannot read pattern file '{path}': file not found.")]
    PatternSourceNotFound { path: String },

    #[error("Dependency installation failed with status: {status}")]
    DependencyInstallError { status: ExitStatus },

    #[error("Path '{path}' contains invalid Unicode characters.")]
    InvalidPath { path: String },
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(exit_codes::FAILURE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn would_overwrite_lists_every_path() {
        let err = Error::WouldOverwrite {
            paths: vec!["README.md".to_string(), "app/__init__.py".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("README.md, app/__init__.py"));
        assert!(message.contains("--force"));
    }

    #[test]
    fn limit_exceeded_names_the_field() {
        let err = Error::LimitExceeded {
            field: "file count".to_string(),
            limit: 0xFFFF,
            actual: 0x10000,
        };
        assert_eq!(
            err.to_string(),
            "Cannot save template: file count is 65536, the maximum is 65535."
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::IoError(_)));
    }
}
