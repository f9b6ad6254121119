//! # Configuration Loader
//!
//! ## Responsibilities
//!
//! - Read TOML configuration files
//! - Parse TOML into the AppConfig DTO
//! - Report I/O and parsing errors with context
//!
//! ## Prohibited
//!
//! - No validation logic
//! - No default value logic (see `wiring`)
//!
//! Pure data loading only. Accept whatever is in the file.

use anyhow::Context;
use courier_core::AppConfig;
use std::path::PathBuf;

/// Directory name under the platform data directory.
const APP_DIR_NAME: &str = "courier";

/// Load configuration from a TOML file
///
/// **NO validation is performed**:
/// - Empty strings are valid (they are facts)
/// - Missing sections result in empty values (facts)
///
/// # Errors
///
/// Returns error if:
/// - File cannot be read (I/O error)
/// - Content is not valid TOML (parse error)
pub fn load_config(config_path: PathBuf) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
}

/// Configuration used when no file is given: every path lives under the
/// platform data directory.
pub fn default_config() -> anyhow::Result<AppConfig> {
    let base_dir = dirs::data_local_dir()
        .context("Failed to determine the local data directory")?
        .join(APP_DIR_NAME);
    Ok(AppConfig::with_base_dir(&base_dir))
}
