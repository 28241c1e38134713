//! Configuration loading for forum search.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/forum-search/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ForumError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the RocksDB entity store
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Path to the Tantivy full-text index directory
    #[serde(default = "default_search_index_path")]
    pub search_index_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Record every executed search term in the search log
    #[serde(default = "default_log_search_queries")]
    pub log_search_queries: bool,

    /// Maximum blurb length in characters
    #[serde(default = "default_blurb_length")]
    pub blurb_length: usize,

    /// Results per entity type for the header (quick) search
    #[serde(default = "default_header_search_limit")]
    pub header_search_limit: usize,

    /// Results per entity type for the full-page search
    #[serde(default = "default_full_page_search_limit")]
    pub full_page_search_limit: usize,

    /// Deadline for a whole search request
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", "forum-search")
        .map(|p| p.data_local_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .to_string()
}

fn default_search_index_path() -> String {
    ProjectDirs::from("", "", "forum-search")
        .map(|p| p.data_local_dir().join("search-index"))
        .unwrap_or_else(|| PathBuf::from("./search-index"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_search_queries() -> bool {
    true
}

fn default_blurb_length() -> usize {
    200
}

fn default_header_search_limit() -> usize {
    5
}

fn default_full_page_search_limit() -> usize {
    50
}

fn default_search_timeout_ms() -> u64 {
    5000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            search_index_path: default_search_index_path(),
            log_level: default_log_level(),
            log_search_queries: default_log_search_queries(),
            blurb_length: default_blurb_length(),
            header_search_limit: default_header_search_limit(),
            full_page_search_limit: default_full_page_search_limit(),
            search_timeout_ms: default_search_timeout_ms(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/forum-search/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (FORUM_SEARCH_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ForumError> {
        let config_dir = ProjectDirs::from("", "", "forum-search")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| ForumError::Config(e.to_string()))?
            .set_default("search_index_path", default_search_index_path())
            .map_err(|e| ForumError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| ForumError::Config(e.to_string()))?
            .set_default("log_search_queries", default_log_search_queries())
            .map_err(|e| ForumError::Config(e.to_string()))?
            .set_default("blurb_length", default_blurb_length() as i64)
            .map_err(|e| ForumError::Config(e.to_string()))?
            .set_default("header_search_limit", default_header_search_limit() as i64)
            .map_err(|e| ForumError::Config(e.to_string()))?
            .set_default(
                "full_page_search_limit",
                default_full_page_search_limit() as i64,
            )
            .map_err(|e| ForumError::Config(e.to_string()))?
            .set_default("search_timeout_ms", default_search_timeout_ms() as i64)
            .map_err(|e| ForumError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: FORUM_SEARCH_DB_PATH, FORUM_SEARCH_LOG_SEARCH_QUERIES, etc.
        builder = builder.add_source(
            Environment::with_prefix("FORUM_SEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ForumError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ForumError::Config(e.to_string()))?;

        settings.validate().map_err(ForumError::Config)?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.blurb_length == 0 {
            return Err("blurb_length must be > 0".to_string());
        }
        if self.header_search_limit == 0 || self.full_page_search_limit == 0 {
            return Err("search limits must be > 0".to_string());
        }
        if self.search_timeout_ms == 0 {
            return Err("search_timeout_ms must be > 0".to_string());
        }
        Ok(())
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }

    /// Expand ~ in search_index_path to the home directory
    pub fn expanded_index_path(&self) -> PathBuf {
        expand_home(&self.search_index_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.log_search_queries);
        assert_eq!(settings.blurb_length, 200);
        assert_eq!(settings.header_search_limit, 5);
        assert_eq!(settings.full_page_search_limit, 50);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.blurb_length, 200);
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.blurb_length = 0;
        assert!(settings.validate().is_err());

        settings.blurb_length = 100;
        settings.header_search_limit = 0;
        assert!(settings.validate().is_err());

        settings.header_search_limit = 5;
        settings.search_timeout_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_expand_plain_path() {
        let settings = Settings {
            db_path: "/var/lib/forum/db".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.expanded_db_path(), PathBuf::from("/var/lib/forum/db"));
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.blurb_length, settings.blurb_length);
        assert_eq!(decoded.log_search_queries, settings.log_search_queries);
    }
}
