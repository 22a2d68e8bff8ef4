use std::path::{Component, Path};

use crate::error::{Error, Result};

/// Extension trait for Path to provide convenient string conversion methods
pub trait PathExt {
    /// Converts a path to a string slice, returning an error if the path contains invalid Unicode characters.
    ///
    /// # Examples
    /// ```
    /// use stencil::ext::PathExt;
    /// use std::path::Path;
    ///
    /// let path = Path::new("test");
    /// assert_eq!(path.to_str_checked().unwrap(), "test");
    /// ```
    fn to_str_checked(&self) -> Result<&str>;

    /// Joins the normal components of a relative path with `/`, whatever the
    /// host separator is. Archive keys are always stored in this form.
    ///
    /// # Examples
    /// ```
    /// use stencil::ext::PathExt;
    /// use std::path::Path;
    ///
    /// let path = Path::new("docs").join("source").join("conf.py");
    /// assert_eq!(path.to_slash_string().unwrap(), "docs/source/conf.py");
    /// ```
    fn to_slash_string(&self) -> Result<String>;
}

impl PathExt for Path {
    fn to_str_checked(&self) -> Result<&str> {
        self.to_str()
            .ok_or_else(|| Error::InvalidPath { path: self.display().to_string() })
    }

    fn to_slash_string(&self) -> Result<String> {
        let mut parts = Vec::new();
        for component in self.components() {
            if let Component::Normal(part) = component {
                parts.push(
                    part.to_str()
                        .ok_or_else(|| Error::InvalidPath { path: self.display().to_string() })?,
                );
            }
        }
        Ok(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_to_str_checked_valid() {
        let path = Path::new("valid_path");
        assert_eq!(path.to_str_checked().unwrap(), "valid_path");
    }

    #[test]
    fn test_to_slash_string_joins_components() {
        let path: PathBuf = ["pkg", "sub", "mod.py"].iter().collect();
        assert_eq!(path.to_slash_string().unwrap(), "pkg/sub/mod.py");
    }

    #[test]
    fn test_to_slash_string_skips_current_dir() {
        let path = Path::new("./README.md");
        assert_eq!(path.to_slash_string().unwrap(), "README.md");
    }
}
