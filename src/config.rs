//! Configuration loading
//!
//! Layers embedded defaults, optional config files, and SLATE_* environment
//! variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub director: DirectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Optional library.json overriding the built-in reference data
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// User id attributed to CLI sessions
    #[serde(default = "default_user")]
    pub default_user: String,
    /// Transcript entries fetched by `slate transcript`
    #[serde(default = "default_transcript_limit")]
    pub transcript_limit: u32,
}

fn default_user() -> String {
    "local".to_string()
}

fn default_transcript_limit() -> u32 {
    50
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            default_user: default_user(),
            transcript_limit: default_transcript_limit(),
        }
    }
}

/// Load configuration from embedded defaults, files, and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority)
        // prefix_separator("_") so SLATE_DATABASE__PATH works (single _
        // after prefix; config-rs 0.14 would otherwise require SLATE__).
        .add_source(
            Environment::with_prefix("SLATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_deserialize() {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap();
        let app: AppConfig = config.try_deserialize().unwrap();
        assert_eq!(app.database.path, "data/slate.db");
        assert_eq!(app.director.default_user, "local");
        assert!(app.library.path.is_none());
    }
}
