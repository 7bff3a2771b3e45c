//! Layered configuration: compiled-in defaults, then an optional TOML file,
//! then environment variables, then CLI flags (applied last, in `main`).

pub mod helpers;

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub http_workers: usize,
    pub data_dir: PathBuf,
    pub git_executable: String,
    pub zig_executable: String,
    pub zig_cache_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "::".to_string(),
            port: 8080,
            http_workers: 4,
            data_dir: PathBuf::from("data"),
            git_executable: "git".to_string(),
            zig_executable: "zig".to_string(),
            zig_cache_dir: None,
            log_level: "info".to_string(),
        }
    }
}

/// Partial config as read from an optional TOML file; every field is
/// optional so a file may override only the keys it cares about.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    http_workers: Option<usize>,
    data_dir: Option<PathBuf>,
    git_executable: Option<String>,
    zig_executable: Option<String>,
    zig_cache_dir: Option<PathBuf>,
    log_level: Option<String>,
}

impl Config {
    /// Builds a `Config` by layering defaults, an optional TOML file at
    /// `config_path`, and environment variables, in that order. CLI flags
    /// are applied afterward by the caller (see `cli::Args::apply`).
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut cfg = Self::default();

        if let Some(path) = config_path {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
            let file_cfg: FileConfig = toml::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
            cfg.merge_file(file_cfg);
        }

        cfg.merge_env();
        Ok(cfg)
    }

    fn merge_file(&mut self, file: FileConfig) {
        if let Some(v) = file.host {
            self.host = v;
        }
        if let Some(v) = file.port {
            self.port = v;
        }
        if let Some(v) = file.http_workers {
            self.http_workers = v;
        }
        if let Some(v) = file.data_dir {
            self.data_dir = v;
        }
        if let Some(v) = file.git_executable {
            self.git_executable = v;
        }
        if let Some(v) = file.zig_executable {
            self.zig_executable = v;
        }
        if file.zig_cache_dir.is_some() {
            self.zig_cache_dir = file.zig_cache_dir;
        }
        if let Some(v) = file.log_level {
            self.log_level = v;
        }
    }

    fn merge_env(&mut self) {
        self.host = helpers::env_or("ZIGDOCS_HOST", &self.host);
        self.port = helpers::env_parsed("ZIGDOCS_PORT", self.port);
        self.http_workers = helpers::env_parsed("ZIGDOCS_HTTP_WORKERS", self.http_workers);
        self.data_dir = helpers::env_opt("ZIGDOCS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| self.data_dir.clone());
        self.git_executable = helpers::env_or("ZIGDOCS_GIT_EXECUTABLE", &self.git_executable);
        self.zig_executable = helpers::env_or("ZIGDOCS_ZIG_EXECUTABLE", &self.zig_executable);
        if let Some(dir) = helpers::env_opt("ZIGDOCS_ZIG_CACHE_DIR") {
            self.zig_cache_dir = Some(PathBuf::from(dir));
        }
        self.log_level = helpers::env_or("ZIGDOCS_LOG_LEVEL", &self.log_level);
    }

    /// Formats `host:port` for `TcpListener::bind`, bracketing `host` when
    /// it is an IPv6 literal (`::` or similar) so the port separator is
    /// unambiguous.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
