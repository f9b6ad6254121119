use std::path::{Path, PathBuf};

/// Application configuration DTO (pure data, no logic)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite database path
    pub database_path: PathBuf,

    /// Directory receiving decrypted attachment content
    pub parts_dir: PathBuf,

    /// Process-local cache directory for per-attempt temp blobs
    pub cache_dir: PathBuf,

    /// Maximum transfer size (0 when not configured)
    pub max_attachment_bytes: u64,

    /// Request timeout in seconds (0 when not configured)
    pub download_timeout_secs: u64,

    /// Raw response format name, e.g. "raw" or "json_envelope"
    pub response_format: String,

    /// Retry ceiling (0 when not configured)
    pub max_failure_count: u32,

    /// Base backoff between attempts in milliseconds
    pub retry_backoff_ms: u64,

    /// Directory for rolling log files (empty disables file logging)
    pub logs_dir: PathBuf,
}

fn str_at<'a>(value: &'a toml::Value, section: &str, key: &str) -> &'a str {
    value
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn int_at(value: &toml::Value, section: &str, key: &str) -> i64 {
    value
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(0)
}

impl AppConfig {
    /// Create AppConfig from TOML value
    ///
    /// Negative numbers are read as 0, the same as a missing value.
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        Ok(Self {
            database_path: PathBuf::from(str_at(toml_value, "storage", "database_path")),
            parts_dir: PathBuf::from(str_at(toml_value, "storage", "parts_dir")),
            cache_dir: PathBuf::from(str_at(toml_value, "storage", "cache_dir")),
            max_attachment_bytes: int_at(toml_value, "download", "max_attachment_bytes").max(0)
                as u64,
            download_timeout_secs: int_at(toml_value, "download", "timeout_secs").max(0) as u64,
            response_format: str_at(toml_value, "download", "response_format").to_string(),
            max_failure_count: int_at(toml_value, "jobs", "max_failure_count")
                .clamp(0, i64::from(u32::MAX)) as u32,
            retry_backoff_ms: int_at(toml_value, "jobs", "retry_backoff_ms").max(0) as u64,
            logs_dir: PathBuf::from(str_at(toml_value, "logging", "logs_dir")),
        })
    }

    /// Create empty AppConfig (all empty/default values)
    pub fn empty() -> Self {
        Self {
            database_path: PathBuf::new(),
            parts_dir: PathBuf::new(),
            cache_dir: PathBuf::new(),
            max_attachment_bytes: 0,
            download_timeout_secs: 0,
            response_format: String::new(),
            max_failure_count: 0,
            retry_backoff_ms: 0,
            logs_dir: PathBuf::new(),
        }
    }

    /// Create AppConfig with every path placed under `base_dir`.
    ///
    /// The base directory is computed by the caller (e.g. with the `dirs` crate).
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            database_path: base_dir.join("courier.db"),
            parts_dir: base_dir.join("parts"),
            cache_dir: base_dir.join("cache"),
            logs_dir: base_dir.join("logs"),
            ..Self::empty()
        }
    }
}
