use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("a job with this fingerprint is already running")]
    JobExists,
    #[error("the worker pool has been shut down")]
    PoolStopped,
}

pub type WorkerResult<T> = Result<T, WorkerError>;
