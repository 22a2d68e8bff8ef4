use crate::constants::DEFAULT_EXCLUDE_PATTERNS;
use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log::{debug, info, warn};
use std::{fs::read_to_string, path::Path};

/// Reads gitignore-style patterns from a file, one per line.
///
/// Blank lines and `#` comments are dropped. A missing file is an error.
pub fn read_pattern_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::PatternSourceNotFound { path: path.display().to_string() });
    }
    let contents = read_to_string(path)?;
    let patterns: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    debug!("Read {} pattern(s) from '{}'", patterns.len(), path.display());
    Ok(patterns)
}

/// Translates one gitignore-style pattern into globs matched against
/// root-relative, `/`-separated paths.
///
/// Returns `None` for patterns that cannot be expressed (negations).
fn pattern_to_globs(pattern: &str) -> Option<Vec<String>> {
    let pattern = pattern.trim();
    if pattern.is_empty() || pattern.starts_with('#') {
        return Some(Vec::new());
    }
    if pattern.starts_with('!') {
        return None;
    }

    let dir_only = pattern.ends_with('/');
    let body = pattern.trim_end_matches('/');
    let anchored = body.starts_with('/') || body.contains('/');
    let body = body.trim_start_matches('/');
    if body.is_empty() {
        return Some(Vec::new());
    }

    let base = if anchored { body.to_string() } else { format!("**/{body}") };
    let mut globs = vec![format!("{base}/**")];
    if !dir_only {
        globs.insert(0, base);
    }
    Some(globs)
}

/// A compiled set of exclude patterns.
#[derive(Debug, Clone)]
pub struct ExcludeSet {
    patterns: Vec<String>,
    globs: GlobSet,
}

impl ExcludeSet {
    /// Compiles the given patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let mut builder = GlobSetBuilder::new();

        for pattern in &patterns {
            let Some(globs) = pattern_to_globs(pattern) else {
                warn!("Negated exclude patterns are not supported, skipping '{pattern}'");
                continue;
            };
            for glob in globs {
                debug!("Adding exclude pattern: {glob} to globset");
                builder.add(GlobBuilder::new(&glob).literal_separator(true).build()?);
            }
        }

        info!("Loaded the following exclude patterns: {patterns:?}");
        Ok(Self { patterns, globs: builder.build()? })
    }

    /// The default exclude list plus `extra`.
    pub fn with_defaults<I, S>(extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = DEFAULT_EXCLUDE_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .chain(extra.into_iter().map(Into::into));
        Self::new(patterns)
    }

    /// An exclude set matching nothing.
    pub fn empty() -> Self {
        Self { patterns: Vec::new(), globs: GlobSet::empty() }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether a root-relative, `/`-separated path is excluded.
    pub fn is_excluded(&self, relative: &str) -> bool {
        self.globs.is_match(relative)
    }
}

impl Default for ExcludeSet {
    fn default() -> Self {
        Self::empty()
    }
}
