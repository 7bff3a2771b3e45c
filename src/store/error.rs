use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("artifact not found")]
    NotFound,
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("failed to read store: {0}")]
    ReadFailed(String),
    #[error("failed to write store: {0}")]
    WriteFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
