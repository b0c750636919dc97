//! Root-scope configuration inputs
//!
//! [`NetworkConfig`] carries the values the application scope is built from:
//! base URL, HTTP cache directory and size, and the preference store handle.
//! It is immutable once handed to [`NetModule`](crate::repos::NetModule).

use ahash::RandomState;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Default REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Default HTTP cache size: 10 MiB
pub const DEFAULT_CACHE_SIZE: u64 = 10 * 1024 * 1024;

pub const ENV_BASE_URL: &str = "SCOPED_GRAPH_BASE_URL";
pub const ENV_CACHE_DIR: &str = "SCOPED_GRAPH_CACHE_DIR";
pub const ENV_CACHE_SIZE: &str = "SCOPED_GRAPH_CACHE_SIZE";

/// Errors reading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Shared key/value preference handle.
///
/// Clones share the same underlying store.
#[derive(Clone, Default)]
pub struct PreferenceStore {
    entries: Arc<DashMap<String, String, RandomState>>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether two handles point at the same store
    pub fn same_store(&self, other: &PreferenceStore) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("entries", &self.len())
            .finish()
    }
}

/// Configuration inputs for the application scope
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    base_url: String,
    cache_dir: PathBuf,
    cache_size: u64,
    preferences: PreferenceStore,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: std::env::temp_dir().join("scoped-graph-http-cache"),
            cache_size: DEFAULT_CACHE_SIZE,
            preferences: PreferenceStore::new(),
        }
    }
}

impl NetworkConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read overrides through `lookup`; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            config = config.with_base_url(url);
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            config = config.with_cache_dir(dir);
        }
        if let Some(raw) = lookup(ENV_CACHE_SIZE) {
            let size = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: ENV_CACHE_SIZE,
                value: raw.clone(),
                reason: "expected a byte count",
            })?;
            config = config.with_cache_size(size);
        }

        Ok(config)
    }

    /// Set the REST base URL; a trailing slash is dropped
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Set the HTTP cache size in bytes
    pub fn with_cache_size(mut self, bytes: u64) -> Self {
        self.cache_size = bytes;
        self
    }

    pub fn with_preferences(mut self, preferences: PreferenceStore) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.cache_size(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_builder_chain() {
        let config = NetworkConfig::new()
            .with_base_url("https://api.example.com/")
            .with_cache_dir("/tmp/cache")
            .with_cache_size(1024);

        assert_eq!(config.base_url(), "https://api.example.com");
        assert_eq!(config.cache_dir(), &PathBuf::from("/tmp/cache"));
        assert_eq!(config.cache_size(), 1024);
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://api.example.com"),
            (ENV_CACHE_SIZE, " 2048 "),
        ]
        .into_iter()
        .collect();

        let config = NetworkConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url(), "https://api.example.com");
        assert_eq!(config.cache_size(), 2048);
    }

    #[test]
    fn test_from_lookup_invalid_size() {
        let err = NetworkConfig::from_lookup(|k| (k == ENV_CACHE_SIZE).then(|| "ten".to_string()))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: ENV_CACHE_SIZE,
                value: "ten".into(),
                reason: "expected a byte count",
            }
        );
    }

    #[test]
    fn test_preference_store_shared_between_clones() {
        let prefs = PreferenceStore::new();
        let other = prefs.clone();

        prefs.set("user", "octocat");
        assert_eq!(other.get("user").as_deref(), Some("octocat"));
        assert!(prefs.same_store(&other));
        assert!(!prefs.same_store(&PreferenceStore::new()));

        assert_eq!(other.remove("user").as_deref(), Some("octocat"));
        assert!(prefs.is_empty());
    }
}
