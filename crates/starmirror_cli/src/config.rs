//! Configuration file support for starmirror.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `STARMIRROR_`, sections split by `__`,
//!    e.g., `STARMIRROR_GITHUB__TOKEN`)
//! 3. Config file (./starmirror.toml, then ~/.config/starmirror/config.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/starmirror/starmirror.db` on
//! Linux (using the XDG state directory) if not explicitly configured.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/starmirror/starmirror.db"  # optional, this is the default
//!
//! [github]
//! username = "octocat"
//! token = "ghp_..."  # optional, raises the API rate limit
//! api_base = "https://api.github.com"
//!
//! [sync]
//! schedule_time = "02:00"
//! prune_on_partial_fetch = false
//! requests_per_second = 10
//! no_rate_limit = false
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

use starmirror::github::DEFAULT_API_BASE;
use starmirror::rate_limit::GITHUB_DEFAULT_RPS;
use starmirror::scheduler::DEFAULT_SCHEDULE_TIME;

const APP_NAME: &str = "starmirror";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Supports sqlite:// and postgres:// schemes.
    pub url: Option<String>,
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// User whose starred list is mirrored.
    pub username: Option<String>,
    /// Personal access token, sent as a bearer token when present.
    pub token: Option<String>,
    pub api_base: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            username: None,
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Sync and scheduling options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Local time of the daily run, `HH:MM`.
    pub schedule_time: String,
    /// Delete local-only records even when the starred list was only partly fetched.
    pub prune_on_partial_fetch: bool,
    /// Proactive request rate against the GitHub API.
    pub requests_per_second: u32,
    /// Whether to disable proactive rate limiting.
    pub no_rate_limit: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            schedule_time: DEFAULT_SCHEDULE_TIME.to_string(),
            prune_on_partial_fetch: false,
            requests_per_second: GITHUB_DEFAULT_RPS,
            no_rate_limit: false,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/starmirror/config.toml)
    /// 3. Local config file (./starmirror.toml)
    /// 4. Environment variables with STARMIRROR_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = Self::default_config_path()
            && path.exists()
        {
            tracing::debug!(path = %path.display(), "Loading config file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let local_config = PathBuf::from("starmirror.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./starmirror.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., STARMIRROR_DATABASE__URL -> database.url
        builder = builder.add_source(Self::environment());

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    fn environment() -> Environment {
        Environment::with_prefix("STARMIRROR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter enables read-write access and creates the file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("starmirror.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Get the GitHub token, ignoring an empty value.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/starmirror` or `~/.local/state/starmirror`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert!(config.github.username.is_none());
        assert!(config.github.token.is_none());
        assert_eq!(config.github.api_base, "https://api.github.com");
        assert_eq!(config.sync.schedule_time, "02:00");
        assert!(!config.sync.prune_on_partial_fetch);
        assert_eq!(config.sync.requests_per_second, 10);
        assert!(!config.sync.no_rate_limit);
    }

    #[test]
    fn test_full_config_parsing() {
        let config = from_toml(
            r#"
            [database]
            url = "sqlite:///tmp/test.db"

            [github]
            username = "octocat"
            token = "ghp_test123"
            api_base = "https://ghe.example.com/api/v3"

            [sync]
            schedule_time = "04:30"
            prune_on_partial_fetch = true
            requests_per_second = 2
            no_rate_limit = true
        "#,
        );

        assert_eq!(
            config.database.url,
            Some("sqlite:///tmp/test.db".to_string())
        );
        assert_eq!(config.github.username.as_deref(), Some("octocat"));
        assert_eq!(config.github_token().as_deref(), Some("ghp_test123"));
        assert_eq!(config.github.api_base, "https://ghe.example.com/api/v3");
        assert_eq!(config.sync.schedule_time, "04:30");
        assert!(config.sync.prune_on_partial_fetch);
        assert_eq!(config.sync.requests_per_second, 2);
        assert!(config.sync.no_rate_limit);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = from_toml(
            r#"
            [github]
            username = "octocat"
        "#,
        );

        assert_eq!(config.github.username.as_deref(), Some("octocat"));
        assert_eq!(config.github.api_base, DEFAULT_API_BASE);
        assert_eq!(config.sync.schedule_time, DEFAULT_SCHEDULE_TIME);
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config = from_toml(
            r#"
            [github]
            token = "   "
        "#,
        );
        assert!(config.github_token().is_none());
    }

    #[test]
    fn test_database_url_defaults_to_state_dir() {
        let config = Config::default();
        if let Some(url) = config.database_url() {
            assert!(url.starts_with("sqlite://"));
            assert!(url.contains("starmirror.db"));
            assert!(url.ends_with("?mode=rwc"));
        }
    }

    #[test]
    fn test_database_url_respects_configured_value() {
        let config = Config {
            database: DatabaseConfig {
                url: Some("postgres:///starmirror".to_string()),
            },
            ..Config::default()
        };
        assert_eq!(
            config.database_url(),
            Some("postgres:///starmirror".to_string())
        );
    }

    #[test]
    fn test_environment_overrides_file() {
        let env = std::collections::HashMap::from([
            ("STARMIRROR_GITHUB__USERNAME".to_string(), "from-env".to_string()),
            ("STARMIRROR_SYNC__PRUNE_ON_PARTIAL_FETCH".to_string(), "true".to_string()),
        ]);
        let config: Config = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                "[github]\nusername = \"from-file\"",
                FileFormat::Toml,
            ))
            .add_source(Config::environment().source(Some(env)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.github.username.as_deref(), Some("from-env"));
        assert!(config.sync.prune_on_partial_fetch);
    }

    #[test]
    fn test_config_invalid_toml() {
        let result = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                "this is not [valid toml",
                FileFormat::Toml,
            ))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_unknown_fields_ignored() {
        let config = from_toml(
            r#"
            [sync]
            schedule_time = "01:15"
            active_within_days = 60

            [gitlab]
            host = "gitlab.com"
        "#,
        );
        assert_eq!(config.sync.schedule_time, "01:15");
    }
}
