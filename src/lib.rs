//! On-demand HTML documentation mirror for remote source repositories.
//!
//! See `DESIGN.md` for the grounding ledger behind each module.

pub mod cli;
pub mod config;
pub mod docbuilder;
pub mod git;
pub mod http;
pub mod job;
pub mod repository;
pub mod service;
pub mod source;
pub mod state;
pub mod store;
pub mod worker;

use std::sync::Arc;

use config::Config;
use docbuilder::DocBuilder;
use git::GitClient;
use repository::Repository;
use service::Service;
use state::AppState;
use store::ArtifactStore;
use worker::WorkerPool;

/// Wires every component together from a resolved [`Config`]. Split out of
/// `main` so integration tests can build the same `AppState` a real process
/// would.
pub fn build_app_state(cfg: &Config) -> AppState {
    let store = ArtifactStore::new(&cfg.data_dir);
    let git = Arc::new(GitClient::new(cfg.git_executable.clone()));
    let docbuilder = Arc::new(DocBuilder::new(cfg.zig_executable.clone()));
    let pool = WorkerPool::new();

    let repository = Repository::new(store, git, docbuilder, pool, cfg.zig_cache_dir.clone());
    let service = Service::new(repository);
    AppState::new(service)
}
