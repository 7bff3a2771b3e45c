use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("git executable not installed")]
    NotInstalled,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("git exited abnormally: {0}")]
    AbnormalExit(String),
    #[error("unexpected reference format: {0}")]
    AbnormalReference(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GitResult<T> = Result<T, GitError>;
