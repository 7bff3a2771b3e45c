//! Background work items dispatched onto the [`crate::worker::WorkerPool`].

use crate::source::RemoteSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Resolve `latest` to a concrete version, then chain a
    /// [`JobKind::SyncRepository`] for it.
    SyncLatest,
    /// Clone, build, and write one concrete `(repository, version)`.
    SyncRepository,
}

impl JobKind {
    fn as_str(&self) -> &'static str {
        match self {
            JobKind::SyncLatest => "sync_latest",
            JobKind::SyncRepository => "sync_repository",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub location: RemoteSource,
    pub kind: JobKind,
}

impl Job {
    pub fn new(kind: JobKind, location: RemoteSource) -> Self {
        Self { location, kind }
    }

    /// Uniquely identifies this job among all in-flight jobs in the owning
    /// pool: `kind:repository@version`. Two jobs of *different* kinds for
    /// the same repository/version are deliberately allowed to run
    /// concurrently — coalescing is per-fingerprint, not per-repository.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}@{}",
            self.kind.as_str(),
            self.location.repository,
            self.location.version
        )
    }
}
