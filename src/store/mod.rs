//! Filesystem-rooted artifact cache.
//!
//! The on-disk layout *is* the cache key: `<root>/<repository>/<version>/`
//! holds one subdirectory per module, and `<root>/<repository>/latest` is a
//! symlink to a sibling version directory.

pub mod error;
pub mod manifest;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub use error::{StoreError, StoreResult};
pub use manifest::{Manifest, ModuleDir};

use crate::source::RemoteSource;

/// Backing abstraction for [`ArtifactStore`], expressed as a trait with a
/// single implementation so a future remote-store backend is an additional
/// `impl`, not a rewrite.
pub trait StorageBackend: Send + Sync {
    fn root(&self) -> &Path;
}

/// The only backend implemented: a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDirBackend {
    root: PathBuf,
}

impl LocalDirBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StorageBackend for LocalDirBackend {
    fn root(&self) -> &Path {
        &self.root
    }
}

/// The artifact cache itself.
pub struct ArtifactStore<B: StorageBackend = LocalDirBackend> {
    backend: B,
}

impl ArtifactStore<LocalDirBackend> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: LocalDirBackend::new(root),
        }
    }
}

impl<B: StorageBackend> ArtifactStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    fn version_dir(&self, loc: &RemoteSource) -> PathBuf {
        self.backend
            .root()
            .join(&loc.repository)
            .join(&loc.version)
    }

    fn latest_link(&self, repository: &str) -> PathBuf {
        self.backend.root().join(repository).join("latest")
    }

    /// Opens the manifest for `loc`. A version directory that exists but
    /// contains zero module subdirectories is treated the same as a missing
    /// directory (`StoreError::NotFound`), so a `latest` symlink published
    /// before its target has any modules still reads as a miss.
    pub fn open_manifest(&self, loc: &RemoteSource) -> StoreResult<Manifest> {
        let dir = self.version_dir(loc);
        let read_dir = match std::fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(StoreError::ReadFailed(e.to_string())),
        };

        let mut manifest = Manifest::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| StoreError::ReadFailed(e.to_string()))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let module_dir = ModuleDir::open(&path).map_err(StoreError::Io)?;
            manifest.insert(name, module_dir);
        }

        if manifest.is_empty() {
            debug!(path = %dir.display(), "version directory exists but has no modules, treating as miss");
            return Err(StoreError::NotFound);
        }

        Ok(manifest)
    }

    /// Copies every module in `artifacts` into the store under `loc`, one
    /// regular file at a time. Not atomic across files: a crash mid-write
    /// leaves a partial directory, which the next `open_manifest` may
    /// observe as an incomplete (but non-empty) manifest.
    pub fn write_manifest(&self, loc: &RemoteSource, artifacts: &Path) -> StoreResult<()> {
        let target_root = self.version_dir(loc);
        std::fs::create_dir_all(&target_root)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        for entry in std::fs::read_dir(artifacts).map_err(|e| StoreError::WriteFailed(e.to_string()))? {
            let entry = entry.map_err(|e| StoreError::WriteFailed(e.to_string()))?;
            let module_src = entry.path();
            if !module_src.is_dir() {
                continue;
            }
            let module_name = entry.file_name();
            let module_dst = target_root.join(&module_name);
            std::fs::create_dir_all(&module_dst)
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

            for file in walkdir::WalkDir::new(&module_src)
                .into_iter()
                .filter_map(|r| r.ok())
                .filter(|e| e.file_type().is_file())
            {
                let relative = file
                    .path()
                    .strip_prefix(&module_src)
                    .expect("walkdir yields paths under module_src");
                let dst = module_dst.join(relative);
                if let Some(parent) = dst.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
                }
                std::fs::copy(file.path(), &dst).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
            }
        }

        Ok(())
    }

    /// Atomically repoints `<root>/<repository>/latest` at `loc.version`,
    /// creating the version directory first if it does not yet exist.
    pub fn link_latest(&self, loc: &RemoteSource) -> StoreResult<()> {
        let version_dir = self.version_dir(loc);
        std::fs::create_dir_all(&version_dir).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let link_path = self.latest_link(&loc.repository);
        let tmp_path = link_path.with_extension("tmp-link");

        if tmp_path.exists() {
            let _ = std::fs::remove_file(&tmp_path);
        }

        #[cfg(unix)]
        std::os::unix::fs::symlink(&loc.version, &tmp_path)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        #[cfg(not(unix))]
        std::os::windows::fs::symlink_dir(&loc.version, &tmp_path)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        match std::fs::rename(&tmp_path, &link_path) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "failed to swap latest symlink");
                let _ = std::fs::remove_file(&tmp_path);
                Err(StoreError::WriteFailed(e.to_string()))
            }
        }
    }
}
