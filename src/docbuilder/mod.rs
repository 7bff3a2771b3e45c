//! Thin capability over an external documentation-generator executable.
//!
//! Like [`crate::git::GitClient`], every operation shells out to a
//! configured binary (`zig` by default) via [`tokio::process::Command`].

pub mod error;

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::warn;

pub use error::{DocBuildError, DocBuildResult};

use crate::store::{Manifest, ModuleDir};

/// A minimal `build.zig` that exposes a `zigdocs` step, used when the
/// target repository's own checkout doesn't ship one.
const BUILD_DESCRIPTOR: &str = include_str!("build_descriptor.zig");
const BUILD_DESCRIPTOR_NAME: &str = "zigdocs_build.zig";

#[async_trait]
pub trait DocGenerator: Send + Sync {
    async fn build(&self, work_dir: &Path, cache_dir: Option<&Path>) -> DocBuildResult<Manifest>;
}

#[derive(Debug, Clone)]
pub struct DocBuilder {
    executable: String,
}

impl DocBuilder {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Best-effort dependency fetch from a `build.zig.zon` manifest, if one
    /// is present. A line-oriented scan, not a full Zon parser. Failures
    /// are logged, never fatal.
    async fn fetch_dependencies(&self, work_dir: &Path, cache_dir: Option<&Path>) {
        let zon_path = work_dir.join("build.zig.zon");
        let contents = match tokio::fs::read_to_string(&zon_path).await {
            Ok(c) => c,
            Err(_) => return,
        };

        for url in extract_dependency_urls(&contents) {
            let mut command = Command::new(&self.executable);
            command
                .arg("fetch")
                .arg(&url)
                .current_dir(work_dir)
                .stdout(Stdio::null())
                .stderr(Stdio::null());
            if let Some(cache) = cache_dir {
                command.env("ZIG_GLOBAL_CACHE_DIR", cache);
                command.env("ZIG_CACHE_DIR", cache);
            }

            match command.status().await {
                Ok(status) if status.success() => {}
                Ok(status) => warn!(%url, ?status, "zig fetch failed, continuing"),
                Err(e) => warn!(%url, error = %e, "failed to spawn zig fetch, continuing"),
            }
        }
    }

    async fn open_output(&self, work_dir: &Path) -> DocBuildResult<Manifest> {
        let output_dir = work_dir.join("zig-out").join("zigdocs");
        let mut read_dir = tokio::fs::read_dir(&output_dir).await?;

        let mut manifest = Manifest::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let dir = ModuleDir::open(&path)?;
            manifest.insert(name, dir);
        }

        Ok(manifest)
    }
}

#[async_trait]
impl DocGenerator for DocBuilder {
    async fn build(&self, work_dir: &Path, cache_dir: Option<&Path>) -> DocBuildResult<Manifest> {
        self.fetch_dependencies(work_dir, cache_dir).await;

        let descriptor_path = work_dir.join(BUILD_DESCRIPTOR_NAME);
        tokio::fs::write(&descriptor_path, BUILD_DESCRIPTOR).await?;

        let mut command = Command::new(&self.executable);
        command
            .arg("build")
            .arg("--build-file")
            .arg(&descriptor_path)
            .arg("zigdocs")
            .current_dir(work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cache) = cache_dir {
            command.env("ZIG_GLOBAL_CACHE_DIR", cache);
            command.env("ZIG_CACHE_DIR", cache);
        }

        let output = command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocBuildError::NotInstalled
            } else {
                DocBuildError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(DocBuildError::AbnormalExit(format!(
                "zig build exited with {:?}",
                output.status.code()
            )));
        }

        self.open_output(work_dir).await
    }
}

/// Extracts `.url = "..."` dependency entries from a `build.zig.zon` file,
/// stripping any `#fragment` suffix (Zon dependency URLs carry an integrity
/// hash as a URL fragment, which `zig fetch` does not want).
fn extract_dependency_urls(contents: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(".url") else {
            continue;
        };
        let Some(start) = rest.find('"') else { continue };
        let Some(end) = rest[start + 1..].find('"') else {
            continue;
        };
        let raw_url = &rest[start + 1..start + 1 + end];
        let url = raw_url.split('#').next().unwrap_or(raw_url);
        if !url.is_empty() {
            urls.push(url.to_string());
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_urls_and_strips_fragment() {
        let zon = r#"
        .dependencies = .{
            .foo = .{
                .url = "https://example.com/foo.tar.gz#abcdef",
            },
            .bar = .{
                .url = "https://example.com/bar.tar.gz",
            },
        },
        "#;
        let urls = extract_dependency_urls(zon);
        assert_eq!(
            urls,
            vec![
                "https://example.com/foo.tar.gz".to_string(),
                "https://example.com/bar.tar.gz".to_string(),
            ]
        );
    }

    #[test]
    fn no_dependencies_yields_empty() {
        assert!(extract_dependency_urls("").is_empty());
    }
}
