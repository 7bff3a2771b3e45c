//! Thin capability over an external VCS executable.
//!
//! Every operation here shells out to the configured `git` binary via
//! [`tokio::process::Command`] — there is no in-process parsing of the VCS
//! wire protocol (no `git2`/`gix`).

pub mod error;

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

pub use error::{GitError, GitResult};

/// A resolved reference: a ref name paired with the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub tag: String,
    pub commit: String,
}

/// The capability surface `Repository` depends on. Expressed as a trait
/// (with [`GitClient`] as its only real implementation) so integration
/// tests can substitute a fake without touching the network.
#[async_trait]
pub trait VcsCapability: Send + Sync {
    async fn clone_shallow(&self, repository: &str, reference: &str, dest: &Path) -> GitResult<()>;
    async fn fetch_latest_tag(&self, repository: &str) -> GitResult<Tag>;
    async fn default_branch(&self, repository: &str) -> GitResult<Tag>;
}

/// Invokes a configurable `git`-compatible executable as a child process.
#[derive(Debug, Clone)]
pub struct GitClient {
    executable: String,
}

impl GitClient {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn repo_url(repository: &str) -> String {
        format!("https://{repository}")
    }

    async fn run(&self, args: &[&str]) -> GitResult<(String, std::process::ExitStatus)> {
        debug!(executable = %self.executable, ?args, "invoking git");

        let mut child = Command::new(&self.executable)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GitError::NotInstalled
                } else {
                    GitError::Io(e)
                }
            })?;

        let mut stdout_buf = String::new();
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                stdout_buf.push_str(&line);
                stdout_buf.push('\n');
            }
        }
        // stderr is drained so the child never blocks on a full pipe, but its
        // contents aren't otherwise inspected.
        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(_)) = lines.next_line().await {}
        }

        let status = child.wait().await?;
        Ok((stdout_buf, status))
    }
}

#[async_trait]
impl VcsCapability for GitClient {
    async fn clone_shallow(&self, repository: &str, reference: &str, dest: &Path) -> GitResult<()> {
        let url = Self::repo_url(repository);
        let dest_str = dest.to_string_lossy().into_owned();
        let (_, status) = self
            .run(&[
                "clone",
                "--depth=1",
                "--branch",
                reference,
                &url,
                &dest_str,
            ])
            .await?;

        match status.code() {
            Some(0) => Ok(()),
            Some(128) => Err(GitError::NotFound(format!("{repository}@{reference}"))),
            _ => Err(GitError::AbnormalExit(format!(
                "git clone exited with {:?}",
                status.code()
            ))),
        }
    }

    async fn fetch_latest_tag(&self, repository: &str) -> GitResult<Tag> {
        let url = Self::repo_url(repository);
        let (stdout, status) = self
            .run(&[
                "ls-remote",
                "--tags",
                "--sort=-v:refname",
                "-c",
                "versionsort.suffix=-",
                &url,
            ])
            .await?;

        if !status.success() {
            return Err(GitError::AbnormalExit(format!(
                "git ls-remote --tags exited with {:?}",
                status.code()
            )));
        }

        for line in stdout.lines() {
            let Some((commit, reference)) = line.split_once('\t') else {
                continue;
            };
            let Some(tag) = reference.strip_prefix("refs/tags/") else {
                continue;
            };
            let accepted = tag
                .chars()
                .next()
                .map(|c| c == 'v' || c.is_ascii_digit())
                .unwrap_or(false);
            if accepted {
                return Ok(Tag {
                    tag: tag.to_string(),
                    commit: commit.to_string(),
                });
            }
        }

        self.default_branch(repository).await
    }

    async fn default_branch(&self, repository: &str) -> GitResult<Tag> {
        let url = Self::repo_url(repository);
        let (stdout, status) = self.run(&["ls-remote", "--symref", &url]).await?;

        if !status.success() {
            return Err(GitError::AbnormalExit(format!(
                "git ls-remote --symref exited with {:?}",
                status.code()
            )));
        }

        let mut lines = stdout.lines();
        let ref_line = lines
            .next()
            .ok_or_else(|| GitError::AbnormalReference("empty ls-remote --symref output".into()))?;
        let branch = ref_line
            .strip_prefix("ref: refs/heads/")
            .and_then(|s| s.strip_suffix("\tHEAD"))
            .ok_or_else(|| GitError::AbnormalReference(ref_line.to_string()))?;

        let commit_line = lines
            .next()
            .ok_or_else(|| GitError::AbnormalReference("missing commit line".into()))?;
        let commit = commit_line
            .split_once('\t')
            .map(|(commit, _)| commit)
            .ok_or_else(|| GitError::AbnormalReference(commit_line.to_string()))?;

        Ok(Tag {
            tag: branch.to_string(),
            commit: commit.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_prefix_stripping_is_literal() {
        let reference = "refs/tags/v1.2.3";
        assert_eq!(reference.strip_prefix("refs/tags/"), Some("v1.2.3"));
    }

    #[test]
    fn symref_prefix_and_suffix_strip() {
        let line = "ref: refs/heads/main\tHEAD";
        let branch = line
            .strip_prefix("ref: refs/heads/")
            .and_then(|s| s.strip_suffix("\tHEAD"));
        assert_eq!(branch, Some("main"));
    }

    #[test]
    fn tag_acceptance_rule() {
        let accepted = |s: &str| {
            s.chars()
                .next()
                .map(|c| c == 'v' || c.is_ascii_digit())
                .unwrap_or(false)
        };
        assert!(accepted("v1.0.0"));
        assert!(accepted("2024.01"));
        assert!(!accepted("release-candidate"));
    }
}
