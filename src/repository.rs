//! Orchestrates [`crate::store`], [`crate::git`], [`crate::docbuilder`], and
//! [`crate::worker`] into the on-demand sync pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::docbuilder::DocGenerator;
use crate::git::VcsCapability;
use crate::job::{Job, JobKind};
use crate::source::RemoteSource;
use crate::store::{ArtifactStore, LocalDirBackend, Manifest, StoreError};
use crate::worker::{WorkerError, WorkerPool};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a read attempt against the repository yielded.
pub enum RepositoryOutcome {
    /// A manifest was already present in the store.
    Manifest(Manifest),
    /// Nothing was cached; a build has been dispatched (or one was already
    /// running for the same fingerprint). Not an error.
    Queued,
}

#[derive(Clone)]
pub struct Repository {
    store: Arc<ArtifactStore<LocalDirBackend>>,
    git: Arc<dyn VcsCapability>,
    docbuilder: Arc<dyn DocGenerator>,
    pool: WorkerPool,
    zig_cache_dir: Option<PathBuf>,
}

impl Repository {
    pub fn new(
        store: ArtifactStore<LocalDirBackend>,
        git: Arc<dyn VcsCapability>,
        docbuilder: Arc<dyn DocGenerator>,
        pool: WorkerPool,
        zig_cache_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            git,
            docbuilder,
            pool,
            zig_cache_dir,
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// The central read path: return the cached manifest, or dispatch a
    /// build and report [`RepositoryOutcome::Queued`].
    pub fn get_docs_manifest(&self, loc: &RemoteSource) -> Result<RepositoryOutcome, RepositoryError> {
        match self.store.open_manifest(loc) {
            Ok(manifest) => Ok(RepositoryOutcome::Manifest(manifest)),
            Err(StoreError::NotFound) => {
                self.enqueue(loc);
                Ok(RepositoryOutcome::Queued)
            }
            Err(e) => Err(RepositoryError::Store(e)),
        }
    }

    fn enqueue(&self, loc: &RemoteSource) {
        if loc.is_latest() {
            let job = Job::new(JobKind::SyncLatest, loc.clone());
            let repo = self.clone();
            let body_loc = loc.clone();
            self.submit(&job, async move { repo.run_sync_latest(body_loc).await });
        } else {
            let job = Job::new(JobKind::SyncRepository, loc.clone());
            let repo = self.clone();
            let body_loc = loc.clone();
            self.submit(&job, async move { repo.run_sync_repository(body_loc).await });
        }
    }

    fn submit<F>(&self, job: &Job, body: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match self.pool.add_job(job, body) {
            Ok(()) => debug!(fingerprint = %job.fingerprint(), "job dispatched"),
            Err(WorkerError::JobExists) => {
                debug!(fingerprint = %job.fingerprint(), "job already in flight, coalescing")
            }
            Err(WorkerError::PoolStopped) => {
                warn!(fingerprint = %job.fingerprint(), "pool is shutting down, job dropped")
            }
        }
    }

    /// `SyncLatest` job body: resolve the newest tag, publish `latest`,
    /// then chain a `SyncRepository` job for the resolved version.
    async fn run_sync_latest(&self, loc: RemoteSource) {
        let tag = match self.git.fetch_latest_tag(&loc.repository).await {
            Ok(tag) => tag,
            Err(e) => {
                warn!(repository = %loc.repository, error = %e, "failed to resolve latest tag");
                return;
            }
        };

        let resolved = loc.with_version(tag.tag.clone());

        if let Err(e) = self.store.link_latest(&resolved) {
            warn!(repository = %loc.repository, error = %e, "failed to link latest");
            return;
        }

        let job = Job::new(JobKind::SyncRepository, resolved.clone());
        self.submit(&job, {
            let repo = self.clone();
            async move { repo.run_sync_repository(resolved).await }
        });
    }

    /// `SyncRepository` job body: clone, build, write, and notify waiters.
    async fn run_sync_repository(&self, loc: RemoteSource) {
        let work_dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "failed to create scratch directory");
                return;
            }
        };

        if let Err(e) = self
            .git
            .clone_shallow(&loc.repository, &loc.version, work_dir.path())
            .await
        {
            warn!(repository = %loc.repository, version = %loc.version, error = %e, "clone failed");
            return;
        }

        let descriptor = work_dir.path().join("build.zig.zon");
        if tokio::fs::metadata(&descriptor).await.is_err() {
            debug!(repository = %loc.repository, "no build descriptor found, skipping build");
            return;
        }

        if let Err(e) = self
            .docbuilder
            .build(work_dir.path(), self.zig_cache_dir.as_deref())
            .await
        {
            warn!(repository = %loc.repository, version = %loc.version, error = %e, "doc build failed");
            return;
        }

        let artifacts_dir = work_dir.path().join("zig-out").join("zigdocs");
        if let Err(e) = self.store.write_manifest(&loc, &artifacts_dir) {
            warn!(repository = %loc.repository, version = %loc.version, error = %e, "failed to write manifest");
            return;
        }

        self.pool.notify_ready(&loc.repository, &loc.version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docbuilder::DocBuildResult;
    use crate::git::{GitResult, Tag};
    use crate::store::ModuleDir;
    use async_trait::async_trait;
    use std::path::Path;

    struct FakeGit;

    #[async_trait]
    impl VcsCapability for FakeGit {
        async fn clone_shallow(&self, _repository: &str, _reference: &str, dest: &Path) -> GitResult<()> {
            std::fs::create_dir_all(dest).unwrap();
            std::fs::write(dest.join("build.zig.zon"), "").unwrap();
            Ok(())
        }

        async fn fetch_latest_tag(&self, _repository: &str) -> GitResult<Tag> {
            Ok(Tag {
                tag: "v1.0.0".to_string(),
                commit: "deadbeef".to_string(),
            })
        }

        async fn default_branch(&self, _repository: &str) -> GitResult<Tag> {
            Ok(Tag {
                tag: "main".to_string(),
                commit: "deadbeef".to_string(),
            })
        }
    }

    struct FakeDocBuilder;

    #[async_trait]
    impl DocGenerator for FakeDocBuilder {
        async fn build(&self, work_dir: &Path, _cache_dir: Option<&Path>) -> DocBuildResult<Manifest> {
            let output = work_dir.join("zig-out").join("zigdocs").join("mymodule");
            std::fs::create_dir_all(&output).unwrap();
            std::fs::write(output.join("index.html"), b"<html></html>").unwrap();
            let mut manifest = Manifest::new();
            manifest.insert("mymodule".to_string(), ModuleDir::open(&output).unwrap());
            Ok(manifest)
        }
    }

    fn repository(root: &Path) -> Repository {
        Repository::new(
            ArtifactStore::new(root),
            Arc::new(FakeGit),
            Arc::new(FakeDocBuilder),
            WorkerPool::new(),
            None,
        )
    }

    #[tokio::test]
    async fn cold_miss_returns_queued_and_eventually_populates_store() {
        let root = tempfile::tempdir().unwrap();
        let repo = repository(root.path());
        let loc = RemoteSource::parse("github.com/a/b").unwrap();

        match repo.get_docs_manifest(&loc).unwrap() {
            RepositoryOutcome::Queued => {}
            RepositoryOutcome::Manifest(_) => panic!("expected a cold miss"),
        }

        let ready = repo
            .pool()
            .wait_ready(&loc.repository, "v1.0.0", std::time::Duration::from_secs(2))
            .await;
        assert!(ready);

        let pinned = loc.with_version("v1.0.0");
        match repo.get_docs_manifest(&pinned).unwrap() {
            RepositoryOutcome::Manifest(m) => assert_eq!(m.module_names(), vec!["mymodule".to_string()]),
            RepositoryOutcome::Queued => panic!("expected a warm hit after sync completed"),
        }
    }

    #[tokio::test]
    async fn duplicate_requests_coalesce_into_one_job() {
        let root = tempfile::tempdir().unwrap();
        let repo = repository(root.path());
        let loc = RemoteSource::parse("github.com/a/b").unwrap();

        for _ in 0..3 {
            match repo.get_docs_manifest(&loc).unwrap() {
                RepositoryOutcome::Queued => {}
                RepositoryOutcome::Manifest(_) => panic!("unexpected warm hit"),
            }
        }
    }
}
