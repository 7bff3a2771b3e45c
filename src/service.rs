//! Thin read-side facade used by the HTTP layer.

use std::path::Path;

use thiserror::Error;

use crate::repository::{Repository, RepositoryError, RepositoryOutcome};
use crate::source::RemoteSource;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("module not found")]
    ModuleNotFound,
    #[error("unrecognized file extension")]
    UnrecognizedFileExtension,
    #[error("a build has been dispatched for this repository")]
    Queued,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Clone)]
pub struct Service {
    repository: Repository,
}

impl Service {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub fn pool(&self) -> &crate::worker::WorkerPool {
        self.repository.pool()
    }

    pub fn get_modules_list(&self, loc: &RemoteSource) -> Result<Vec<String>, ServiceError> {
        match self.repository.get_docs_manifest(loc)? {
            RepositoryOutcome::Manifest(manifest) => Ok(manifest.module_names()),
            RepositoryOutcome::Queued => Err(ServiceError::Queued),
        }
    }

    pub async fn get_docs_resource(&self, loc: &RemoteSource) -> Result<(Vec<u8>, &'static str), ServiceError> {
        let content_type = content_type_for(&loc.file).ok_or(ServiceError::UnrecognizedFileExtension)?;

        match self.repository.get_docs_manifest(loc)? {
            RepositoryOutcome::Queued => Err(ServiceError::Queued),
            RepositoryOutcome::Manifest(manifest) => {
                let module_dir = manifest.get(&loc.module).ok_or(ServiceError::ModuleNotFound)?;
                let path = module_dir.path().join(&loc.file);
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|_| ServiceError::ModuleNotFound)?;
                Ok((bytes, content_type))
            }
        }
    }
}

/// Hardcoded extension-to-content-type table. Not a general MIME sniffer:
/// unrecognized extensions are a hard error.
fn content_type_for(file: &str) -> Option<&'static str> {
    let ext = Path::new(file).extension()?.to_str()?;
    match ext {
        "html" => Some("text/html"),
        "md" => Some("text/markdown"),
        "wasm" => Some("application/wasm"),
        "js" => Some("application/javascript"),
        "css" => Some("text/css"),
        "tar" => Some("application/x-tar"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_map_to_content_type() {
        assert_eq!(content_type_for("index.html"), Some("text/html"));
        assert_eq!(content_type_for("main.js"), Some("application/javascript"));
        assert_eq!(content_type_for("bundle.tar"), Some("application/x-tar"));
    }

    #[test]
    fn unknown_or_missing_extension_is_none() {
        assert_eq!(content_type_for("index.zzz"), None);
        assert_eq!(content_type_for("README"), None);
    }
}
