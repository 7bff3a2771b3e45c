//! The addressable identity of a documentation artifact.

use thiserror::Error;

/// Hosts whose repositories this service knows how to clone and mirror.
const SUPPORTED_HOSTS: &[&str] = &["github.com", "gitlab.com"];

/// The sentinel version string meaning "resolve the newest tag (or the
/// default branch, if there are none)".
pub const LATEST: &str = "latest";

const DEFAULT_FILE: &str = "index.html";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("the host of the remote repository is not supported")]
    UnsupportedHost,
    #[error("the repository path provided is invalid")]
    InvalidPath,
}

/// A parsed `host/org/repo[@version][/module[/file]]` reference.
///
/// Owns all of its string data; cheap to `Clone` when handing a copy to a
/// background job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteSource {
    /// Canonical `host/org/name`, no scheme, no trailing slash.
    pub repository: String,
    /// An opaque ref, or [`LATEST`].
    pub version: String,
    /// Possibly empty.
    pub module: String,
    /// Never empty; defaults to `index.html`.
    pub file: String,
}

impl RemoteSource {
    /// Parses a request path of the form
    /// `host/org/repo[@version][/module[/file...]]`.
    pub fn parse(path: &str) -> Result<Self, SourceError> {
        let path = path.trim_start_matches('/');
        if path.contains("..") {
            return Err(SourceError::InvalidPath);
        }

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let host = segments.next().ok_or(SourceError::InvalidPath)?;
        let org = segments.next().ok_or(SourceError::InvalidPath)?;
        let repo_and_version = segments.next().ok_or(SourceError::InvalidPath)?;

        if !SUPPORTED_HOSTS.contains(&host) {
            return Err(SourceError::UnsupportedHost);
        }

        let (repo, version) = match repo_and_version.split_once('@') {
            Some((repo, version)) if !repo.is_empty() && !version.is_empty() => {
                (repo, version.to_string())
            }
            Some(_) => return Err(SourceError::InvalidPath),
            None => (repo_and_version, LATEST.to_string()),
        };
        if repo.is_empty() {
            return Err(SourceError::InvalidPath);
        }

        let module = segments.next().unwrap_or("").to_string();
        let rest: Vec<&str> = segments.collect();
        let file = if rest.is_empty() {
            DEFAULT_FILE.to_string()
        } else {
            rest.join("/")
        };

        Ok(Self {
            repository: format!("{host}/{org}/{repo}"),
            version,
            module,
            file,
        })
    }

    /// Returns a clone of `self` with `version` replaced — used when a
    /// `SyncLatest` job resolves a concrete tag and chains to
    /// `SyncRepository`.
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            repository: self.repository.clone(),
            version: version.into(),
            module: self.module.clone(),
            file: self.file.clone(),
        }
    }

    /// Returns a clone of `self` with `module` and `file` cleared, i.e. the
    /// repository-level identity used as a store/job key.
    pub fn repository_only(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            version: self.version.clone(),
            module: String::new(),
            file: DEFAULT_FILE.to_string(),
        }
    }

    pub fn is_latest(&self) -> bool {
        self.version == LATEST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_host() {
        assert_eq!(
            RemoteSource::parse("invalid.com/org/repo"),
            Err(SourceError::UnsupportedHost)
        );
    }

    #[test]
    fn rejects_short_path() {
        assert_eq!(
            RemoteSource::parse("github.com/org"),
            Err(SourceError::InvalidPath)
        );
    }

    #[test]
    fn rejects_dotdot() {
        assert_eq!(
            RemoteSource::parse("github.com/org/repo/../"),
            Err(SourceError::InvalidPath)
        );
    }

    #[test]
    fn defaults_version_and_file() {
        let s = RemoteSource::parse("github.com/org/repo").unwrap();
        assert_eq!(s.repository, "github.com/org/repo");
        assert_eq!(s.version, LATEST);
        assert_eq!(s.module, "");
        assert_eq!(s.file, "index.html");
    }

    #[test]
    fn parses_module() {
        let s = RemoteSource::parse("github.com/org/repo/mod").unwrap();
        assert_eq!(s.module, "mod");
        assert_eq!(s.file, "index.html");
    }

    #[test]
    fn parses_module_and_file() {
        let s = RemoteSource::parse("github.com/org/repo/mod/main.js").unwrap();
        assert_eq!(s.module, "mod");
        assert_eq!(s.file, "main.js");
    }

    #[test]
    fn parses_pinned_version() {
        let s = RemoteSource::parse("github.com/org/repo@v1.0.0/mod/main.js").unwrap();
        assert_eq!(s.version, "v1.0.0");
        assert_eq!(s.module, "mod");
        assert_eq!(s.file, "main.js");
    }

    #[test]
    fn with_version_rebinds_only_version() {
        let s = RemoteSource::parse("github.com/org/repo/mod").unwrap();
        let pinned = s.with_version("v2.1.0");
        assert_eq!(pinned.version, "v2.1.0");
        assert_eq!(pinned.module, "mod");
        assert_eq!(pinned.repository, s.repository);
    }
}
