use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory downloads are written to (default: `downloads`).
    pub download_dir: PathBuf,
    /// Path to the downloader executable (default: `yt-dlp`).
    pub ytdlp_path: String,
    /// Number of concurrent download workers (default: `2`).
    pub worker_concurrency: usize,
    /// Hard wall-clock limit for a single download, in seconds (default: `1800`).
    pub job_timeout_secs: u64,
    /// How long terminal job records stay queryable, in seconds (default: `86400`).
    pub result_retention_secs: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `8000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `DOWNLOAD_DIR`          | `downloads`                |
    /// | `YTDLP_PATH`            | `yt-dlp`                   |
    /// | `WORKER_CONCURRENCY`    | `2`                        |
    /// | `JOB_TIMEOUT_SECS`      | `1800`                     |
    /// | `RESULT_RETENTION_SECS` | `86400`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
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

        let download_dir =
            PathBuf::from(std::env::var("DOWNLOAD_DIR").unwrap_or_else(|_| "downloads".into()));

        let ytdlp_path = std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".into());

        let worker_concurrency: usize = std::env::var("WORKER_CONCURRENCY")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("WORKER_CONCURRENCY must be a valid usize");

        let job_timeout_secs: u64 = std::env::var("JOB_TIMEOUT_SECS")
            .unwrap_or_else(|_| "1800".into())
            .parse()
            .expect("JOB_TIMEOUT_SECS must be a valid u64");

        let result_retention_secs: i64 = std::env::var("RESULT_RETENTION_SECS")
            .unwrap_or_else(|_| "86400".into())
            .parse()
            .expect("RESULT_RETENTION_SECS must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            download_dir,
            ytdlp_path,
            worker_concurrency,
            job_timeout_secs,
            result_retention_secs,
        }
    }
}
