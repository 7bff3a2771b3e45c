//! Fingerprinted job registry.
//!
//! Admits at most one concurrently-running job per fingerprint
//! (`kind:repository@version`), and hosts a completion-notification
//! registry keyed by `(repository, version)` so waiters get a single
//! `broadcast`-channel wakeup instead of polling the store on an interval.

pub mod error;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub use error::{WorkerError, WorkerResult};

use crate::job::Job;

struct JobTable {
    handles: HashMap<String, JoinHandle<()>>,
    shutdown: bool,
}

type NotifyKey = (String, String);

struct Inner {
    jobs: Mutex<JobTable>,
    notifications: Mutex<HashMap<NotifyKey, broadcast::Sender<()>>>,
}

/// Cheap to `Clone` (an `Arc` around the shared registry); every clone
/// refers to the same pool.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<Inner>,
}

/// Deregisters a job's fingerprint when dropped, including on panic or
/// early return from the wrapped future, so completion is exactly once.
struct JobGuard {
    inner: Arc<Inner>,
    fingerprint: String,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        let mut table = self.inner.jobs.lock().expect("job table mutex poisoned");
        table.handles.remove(&self.fingerprint);
        debug!(fingerprint = %self.fingerprint, "job deregistered");
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPool {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: Mutex::new(JobTable {
                    handles: HashMap::new(),
                    shutdown: false,
                }),
                notifications: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Admits `job` if no job with the same fingerprint is already
    /// in-flight, spawning `body` on its own task. Returns
    /// [`WorkerError::JobExists`] if one is — callers should treat that as
    /// "someone else is already handling it", not a hard failure.
    pub fn add_job<F>(&self, job: &Job, body: F) -> WorkerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let fingerprint = job.fingerprint();

        let mut table = self.inner.jobs.lock().expect("job table mutex poisoned");
        if table.shutdown {
            return Err(WorkerError::PoolStopped);
        }
        if table.handles.contains_key(&fingerprint) {
            return Err(WorkerError::JobExists);
        }

        let guard = JobGuard {
            inner: Arc::clone(&self.inner),
            fingerprint: fingerprint.clone(),
        };
        let handle = tokio::spawn(async move {
            let _guard = guard;
            body.await;
        });

        table.handles.insert(fingerprint.clone(), handle);
        debug!(%fingerprint, "job admitted");
        Ok(())
    }

    /// Wakes every current waiter for `(repository, version)`. Called by a
    /// `SyncRepository` job on success.
    pub fn notify_ready(&self, repository: &str, version: &str) {
        let key = (repository.to_string(), version.to_string());
        let mut notifications = self
            .inner
            .notifications
            .lock()
            .expect("notifications mutex poisoned");
        if let Some(sender) = notifications.get(&key) {
            let _ = sender.send(());
            if sender.receiver_count() == 0 {
                notifications.remove(&key);
            }
        }
    }

    /// Awaits readiness of `(repository, version)` up to `timeout`.
    pub async fn wait_ready(&self, repository: &str, version: &str, timeout: Duration) -> bool {
        let key = (repository.to_string(), version.to_string());
        let mut receiver = {
            let mut notifications = self
                .inner
                .notifications
                .lock()
                .expect("notifications mutex poisoned");
            let sender = notifications
                .entry(key)
                .or_insert_with(|| broadcast::channel(1).0);
            sender.subscribe()
        };

        tokio::time::timeout(timeout, receiver.recv()).await.is_ok()
    }

    /// Sets the pool to refuse new jobs, then joins every currently
    /// registered task. Idempotent: a second call observes an already-empty
    /// table and returns immediately.
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut table = self.inner.jobs.lock().expect("job table mutex poisoned");
            table.shutdown = true;
            table.handles.drain().map(|(_, handle)| handle).collect()
        };

        info!(count = handles.len(), "waiting for in-flight jobs to drain");
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobKind;
    use crate::source::RemoteSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn job(kind: JobKind) -> Job {
        Job::new(
            kind,
            RemoteSource {
                repository: "github.com/a/b".to_string(),
                version: "latest".to_string(),
                module: String::new(),
                file: "index.html".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn duplicate_fingerprint_is_rejected() {
        let pool = WorkerPool::new();
        let j = job(JobKind::SyncLatest);

        pool.add_job(&j, async { tokio::time::sleep(Duration::from_millis(50)).await })
            .unwrap();
        let result = pool.add_job(&j, async {});
        assert!(matches!(result, Err(WorkerError::JobExists)));
    }

    #[tokio::test]
    async fn job_completion_deregisters_fingerprint() {
        let pool = WorkerPool::new();
        let j = job(JobKind::SyncRepository);

        pool.add_job(&j, async {}).unwrap();
        // Give the spawned task a chance to run and drop its guard.
        tokio::time::sleep(Duration::from_millis(20)).await;
        // Now the same fingerprint should be admissible again.
        pool.add_job(&j, async {}).unwrap();
    }

    #[tokio::test]
    async fn shutdown_refuses_new_jobs_and_is_idempotent() {
        let pool = WorkerPool::new();
        pool.shutdown().await;
        let result = pool.add_job(&job(JobKind::SyncLatest), async {});
        assert!(matches!(result, Err(WorkerError::PoolStopped)));
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn wait_ready_observes_notify() {
        let pool = WorkerPool::new();
        let pool2 = pool.clone();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter2 = Arc::clone(&counter);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            counter2.fetch_add(1, Ordering::SeqCst);
            pool2.notify_ready("github.com/a/b", "v1.0.0");
        });

        let ready = pool
            .wait_ready("github.com/a/b", "v1.0.0", Duration::from_secs(1))
            .await;
        assert!(ready);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wait_ready_times_out_without_notify() {
        let pool = WorkerPool::new();
        let ready = pool
            .wait_ready("github.com/a/b", "v9.9.9", Duration::from_millis(20))
            .await;
        assert!(!ready);
    }
}
