use log::{debug, info};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Interpreter used to run pip when none is configured.
pub const DEFAULT_PYTHON: &str = "python3";

/// Reads dependency specifiers from a pip requirements file.
///
/// Blank lines, comments and pip options (`-r`, `--index-url`, ...) are skipped.
pub fn read_requirements<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path.as_ref())?;
    Ok(contents
        .lines()
        .map(|line| line.split(" #").next().unwrap_or(line).trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .map(str::to_string)
        .collect())
}

/// Installs `dependencies` with `<python> -m pip install` inside `dir`.
///
/// Does nothing when there is nothing to install. A non-zero exit status
/// is an error.
pub fn install_dependencies<P: AsRef<Path>>(
    dir: P,
    dependencies: &[String],
    python: &str,
) -> Result<()> {
    if dependencies.is_empty() {
        debug!("No dependencies to install");
        return Ok(());
    }

    info!("Installing dependencies: {}", dependencies.join(", "));
    let status = Command::new(python)
        .args(["-m", "pip", "install"])
        .args(dependencies)
        .current_dir(dir.as_ref())
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        return Err(Error::DependencyInstallError { status });
    }
    info!("Dependencies installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn requirements_skip_comments_and_options() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requirements.txt");
        fs::write(&path, "# deps\nrequests>=2.0  # http\n\n-r base.txt\nclick\n").unwrap();
        assert_eq!(read_requirements(&path).unwrap(), vec!["requests>=2.0", "click"]);
    }

    #[test]
    fn nothing_to_install_runs_nothing() {
        let dir = TempDir::new().unwrap();
        install_dependencies(dir.path(), &[], "definitely-not-a-python").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn failing_installer_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = install_dependencies(dir.path(), &["requests".to_string()], "false").unwrap_err();
        assert!(matches!(err, Error::DependencyInstallError { .. }));
    }
}
