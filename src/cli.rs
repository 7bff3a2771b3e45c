//! Command-line interface. Flags double as environment-variable bindings
//! via `#[arg(env = ...)]`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "zigdocs-server", about = "On-demand HTML doc mirror")]
pub struct Args {
    /// Path to an optional TOML config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "ZIGDOCS_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "ZIGDOCS_PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "ZIGDOCS_HTTP_WORKERS")]
    pub http_workers: Option<usize>,

    #[arg(long, env = "ZIGDOCS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, env = "ZIGDOCS_GIT_EXECUTABLE")]
    pub git_executable: Option<String>,

    #[arg(long, env = "ZIGDOCS_ZIG_EXECUTABLE")]
    pub zig_executable: Option<String>,

    #[arg(long, env = "ZIGDOCS_ZIG_CACHE_DIR")]
    pub zig_cache_dir: Option<PathBuf>,

    #[arg(long, env = "ZIGDOCS_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// Applies any flags the user actually passed on top of a `Config`
    /// already layered from defaults, file, and environment. CLI flags win.
    pub fn apply(&self, mut cfg: Config) -> Config {
        if let Some(v) = &self.host {
            cfg.host = v.clone();
        }
        if let Some(v) = self.port {
            cfg.port = v;
        }
        if let Some(v) = self.http_workers {
            cfg.http_workers = v;
        }
        if let Some(v) = &self.data_dir {
            cfg.data_dir = v.clone();
        }
        if let Some(v) = &self.git_executable {
            cfg.git_executable = v.clone();
        }
        if let Some(v) = &self.zig_executable {
            cfg.zig_executable = v.clone();
        }
        if let Some(v) = &self.zig_cache_dir {
            cfg.zig_cache_dir = Some(v.clone());
        }
        if let Some(v) = &self.log_level {
            cfg.log_level = v.clone();
        }
        cfg
    }
}
