use crate::error::Result;
use log::debug;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use url::Url;

/// Where a template is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildSource {
    /// Local project directory
    FileSystem(PathBuf),
    /// Git repository URL (HTTPS or SSH)
    Git(String),
}

impl std::fmt::Display for BuildSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildSource::FileSystem(path) => write!(f, "local path: '{}'", path.display()),
            BuildSource::Git(repo) => write!(f, "git repository: '{repo}'"),
        }
    }
}

impl BuildSource {
    pub fn from_string(s: &str) -> Self {
        if is_git_url(s) {
            BuildSource::Git(s.to_string())
        } else {
            BuildSource::FileSystem(PathBuf::from(s))
        }
    }

    /// Makes the source available on disk.
    pub fn load(self) -> Result<LoadedSource> {
        match self {
            BuildSource::FileSystem(path) => Ok(LoadedSource::Local(path)),
            BuildSource::Git(repo) => Ok(LoadedSource::Cloned(clone_repository(&repo)?)),
        }
    }
}

/// A source directory ready to be built.
#[derive(Debug)]
pub enum LoadedSource {
    Local(PathBuf),
    /// Removed from disk when dropped.
    Cloned(ClonedRepository),
}

impl LoadedSource {
    pub fn root(&self) -> &Path {
        match self {
            LoadedSource::Local(path) => path,
            LoadedSource::Cloned(repo) => repo.path(),
        }
    }
}

/// Determines if a string represents a git repository URL.
///
/// Supports:
/// - URLs with an `http`, `https`, `git` or `ssh` scheme
/// - SCP-like SSH addresses: `git@github.com:user/repo`
pub fn is_git_url(s: &str) -> bool {
    if let Ok(url) = Url::parse(s) {
        return matches!(url.scheme(), "http" | "https" | "git" | "ssh");
    }

    let (Some(at), Some(colon)) = (s.find('@'), s.rfind(':')) else {
        return false;
    };
    if s.contains("://") || colon < at {
        return false;
    }
    let (user, host, path) = (&s[..at], &s[at + 1..colon], &s[colon + 1..]);
    !user.is_empty() && host.contains('.') && path.contains('/')
}

/// Extracts the repository name from an HTTPS or SSH URL.
pub fn repo_name(repo_url: &str) -> String {
    let path = match repo_url.rsplit_once(':') {
        Some((_, path)) if !repo_url.contains("://") => path,
        _ => repo_url,
    };
    let name = path.trim_end_matches('/').rsplit('/').next().unwrap_or("").trim_end_matches(".git");
    if name.is_empty() || name.contains('@') {
        "template".to_string()
    } else {
        name.to_string()
    }
}

/// A repository cloned into a temporary directory.
#[derive(Debug)]
pub struct ClonedRepository {
    _dir: TempDir,
    path: PathBuf,
}

impl ClonedRepository {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ssh_key_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("id_rsa"))
}

/// Clones `repo_url` into a fresh temporary directory.
///
/// The clone keeps the repository's name as its directory name, so builds
/// from it default to that project name.
pub fn clone_repository(repo_url: &str) -> Result<ClonedRepository> {
    let dir = TempDir::new()?;
    let path = dir.path().join(repo_name(repo_url));
    debug!("Cloning repository '{repo_url}' to '{}'.", path.display());

    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");
        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(key) = ssh_key_path().filter(|key| key.is_file()) {
                return git2::Cred::ssh_key(username, None, &key, None);
            }
            return git2::Cred::ssh_key_from_agent(username);
        }
        git2::Cred::default()
    });

    let mut fetch_opts = git2::FetchOptions::new();
    fetch_opts.remote_callbacks(callbacks);

    let mut builder = git2::build::RepoBuilder::new();
    builder.fetch_options(fetch_opts);
    builder.clone(repo_url, &path)?;

    debug!("Cloned '{repo_url}'.");
    Ok(ClonedRepository { _dir: dir, path })
}
