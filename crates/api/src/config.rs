use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory exported report artifacts are written to.
    pub export_dir: PathBuf,
    /// Scheduler tick interval in seconds (default: `60`, one wall-clock
    /// minute, the resolution of schedule due-ness).
    pub scheduler_tick_secs: u64,
    /// Cap on simultaneously executing scheduled reports per tick.
    pub scheduler_max_concurrent: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default            |
    /// |----------------------------|--------------------|
    /// | `HOST`                     | `0.0.0.0`          |
    /// | `PORT`                     | `3000`             |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`               |
    /// | `EXPORT_DIR`               | `./exports`        |
    /// | `SCHEDULER_TICK_SECS`      | `60`               |
    /// | `SCHEDULER_MAX_CONCURRENT` | `4`                |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let export_dir = PathBuf::from(
            std::env::var("EXPORT_DIR").unwrap_or_else(|_| "./exports".into()),
        );

        let scheduler_tick_secs: u64 = std::env::var("SCHEDULER_TICK_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("SCHEDULER_TICK_SECS must be a valid u64");

        let scheduler_max_concurrent: usize = std::env::var("SCHEDULER_MAX_CONCURRENT")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("SCHEDULER_MAX_CONCURRENT must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            export_dir,
            scheduler_tick_secs,
            scheduler_max_concurrent,
        }
    }
}
