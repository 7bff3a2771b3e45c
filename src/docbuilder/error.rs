use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocBuildError {
    #[error("zig executable not installed")]
    NotInstalled,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zig build exited abnormally: {0}")]
    AbnormalExit(String),
    #[error("invalid build.zig.zon file: {0}")]
    InvalidZonFile(String),
}

pub type DocBuildResult<T> = Result<T, DocBuildError>;
