//! Configuration management for session-cleaner.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Args;
use crate::session::{
    CounterIdProvider, ExpiryPolicy, RandomIdProvider, SessionStore, SessionStoreBuilder,
    StoreConfig,
};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session store configuration.
    pub store: StoreSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Which built-in ID provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdProviderKind {
    /// OS-random base64 tokens.
    #[default]
    Random,
    /// Sequential `sess-XXXXXXXX` tokens.
    Counter,
}

impl FromStr for IdProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "counter" => Ok(Self::Counter),
            other => Err(other.to_string()),
        }
    }
}

/// Session store configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Idle window in milliseconds.
    pub idle_timeout_ms: u64,
    /// Expiry policy.
    pub policy: ExpiryPolicy,
    /// ID provider.
    pub id_provider: IdProviderKind,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 5_000,
            policy: ExpiryPolicy::OnUpdate,
            id_provider: IdProviderKind::Random,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SESSION_CLEANER_IDLE_TIMEOUT_MS") {
            self.store.idle_timeout_ms = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SESSION_CLEANER_IDLE_TIMEOUT_MS", value))?;
        }

        if let Some(value) = lookup("SESSION_CLEANER_POLICY") {
            self.store.policy = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SESSION_CLEANER_POLICY", value))?;
        }

        if let Some(value) = lookup("SESSION_CLEANER_ID_PROVIDER") {
            self.store.id_provider = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SESSION_CLEANER_ID_PROVIDER", value))?;
        }

        if let Some(level) = lookup("SESSION_CLEANER_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ms) = args.idle_timeout_ms {
            self.store.idle_timeout_ms = ms;
        }

        if args.sliding {
            self.store.policy = ExpiryPolicy::Sliding;
        }

        if let Some(kind) = args.id_provider {
            self.store.id_provider = kind;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        Self::load_with(args, |key| std::env::var(key).ok())
    }

    /// Load configuration, reading environment overrides through `lookup`.
    pub fn load_with<F>(args: &Args, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env_with(lookup)?;
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to a validated [`StoreConfig`].
    pub fn to_store_config(&self) -> Result<StoreConfig, ConfigError> {
        if self.store.idle_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "idle_timeout_ms",
                self.store.idle_timeout_ms.to_string(),
            ));
        }

        Ok(StoreConfig::default()
            .with_idle_timeout(Duration::from_millis(self.store.idle_timeout_ms))
            .with_policy(self.store.policy))
    }

    /// Store builder with the configured timeout, policy and ID provider.
    pub fn store_builder(&self) -> Result<SessionStoreBuilder, ConfigError> {
        let builder = SessionStore::builder(self.to_store_config()?);
        Ok(match self.store.id_provider {
            IdProviderKind::Random => builder.id_provider(RandomIdProvider),
            IdProviderKind::Counter => builder.id_provider(CounterIdProvider),
        })
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file: {0}")]
    Io(std::io::Error),
    /// JSON parsing error.
    #[error("failed to parse config file: {0}")]
    Json(serde_json::Error),
    /// A setting had an unusable value.
    #[error("invalid value for {0}: '{1}'")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store.idle_timeout_ms, 5_000);
        assert_eq!(config.store.policy, ExpiryPolicy::OnUpdate);
        assert_eq!(config.store.id_provider, IdProviderKind::Random);
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "store": {
                "idle_timeout_ms": 250,
                "policy": "sliding",
                "id_provider": "counter"
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.store.idle_timeout_ms, 250);
        assert_eq!(config.store.policy, ExpiryPolicy::Sliding);
        assert_eq!(config.store.id_provider, IdProviderKind::Counter);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "store": { "idle_timeout_ms": 9000 } }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.store.idle_timeout_ms, 9000);
        assert_eq!(config.store.policy, ExpiryPolicy::OnUpdate); // Default
        assert_eq!(config.logging.level, "info"); // Default
    }

    #[test]
    fn test_config_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_config_missing_file() {
        let result = Config::from_file(Path::new("/nonexistent/session-cleaner.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_apply_env() {
        let mut config = Config::default();
        config
            .apply_env_with(env(&[
                ("SESSION_CLEANER_IDLE_TIMEOUT_MS", "1500"),
                ("SESSION_CLEANER_POLICY", "sliding"),
                ("RUST_LOG", "warn"),
            ]))
            .unwrap();

        assert_eq!(config.store.idle_timeout_ms, 1500);
        assert_eq!(config.store.policy, ExpiryPolicy::Sliding);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_env_log_level_beats_rust_log() {
        let mut config = Config::default();
        config
            .apply_env_with(env(&[
                ("SESSION_CLEANER_LOG_LEVEL", "trace"),
                ("RUST_LOG", "warn"),
            ]))
            .unwrap();
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_apply_env_invalid() {
        let mut config = Config::default();
        let result = config.apply_env_with(env(&[("SESSION_CLEANER_IDLE_TIMEOUT_MS", "soon")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue("SESSION_CLEANER_IDLE_TIMEOUT_MS", _))
        ));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            idle_timeout_ms: Some(42),
            sliding: true,
            id_provider: Some(IdProviderKind::Counter),
            log_level: Some("debug".to_string()),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.store.idle_timeout_ms, 42);
        assert_eq!(config.store.policy, ExpiryPolicy::Sliding);
        assert_eq!(config.store.id_provider, IdProviderKind::Counter);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_apply_empty_args_keeps_config() {
        let mut config = Config::default();
        config.store.idle_timeout_ms = 777;

        config.apply_args(&Args::default());
        assert_eq!(config.store.idle_timeout_ms, 777);
    }

    #[test]
    fn test_load_with_env_between_file_and_args() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "store": { "idle_timeout_ms": 9000, "policy": "sliding" } }"#)
            .unwrap();

        let args = Args {
            config: Some(file.path().to_path_buf()),
            log_level: Some("debug".to_string()),
            ..Args::default()
        };
        let config = Config::load_with(
            &args,
            env(&[
                ("SESSION_CLEANER_IDLE_TIMEOUT_MS", "300"),
                ("SESSION_CLEANER_LOG_LEVEL", "warn"),
            ]),
        )
        .unwrap();

        assert_eq!(config.store.idle_timeout_ms, 300); // env beats file
        assert_eq!(config.store.policy, ExpiryPolicy::Sliding); // file beats default
        assert_eq!(config.log_filter(), "debug"); // args beat env
    }

    #[test]
    fn test_to_store_config() {
        let mut config = Config::default();
        config.store.idle_timeout_ms = 1200;
        config.store.policy = ExpiryPolicy::Sliding;

        let store_config = config.to_store_config().unwrap();
        assert_eq!(store_config.idle_timeout, Duration::from_millis(1200));
        assert_eq!(store_config.policy, ExpiryPolicy::Sliding);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.store.idle_timeout_ms = 0;

        let result = config.to_store_config();
        assert!(matches!(result, Err(ConfigError::InvalidValue("idle_timeout_ms", _))));
    }

    #[tokio::test]
    async fn test_store_builder_uses_counter_ids() {
        let mut config = Config::default();
        config.store.id_provider = IdProviderKind::Counter;

        let store = config.store_builder().unwrap().build().unwrap();
        let id = store.create_session().unwrap();
        assert!(id.as_str().starts_with("sess-"));
        assert_eq!(store.idle_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"idle_timeout_ms\""));
        assert!(json.contains("\"on_update\""));
        assert!(json.contains("\"random\""));
    }
}
