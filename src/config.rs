use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::memory::ring::DEFAULT_CAPACITY;
use crate::memory::search::DistanceMetric;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct VigilConfig {
    pub server: ServerConfig,
    pub memory: MemoryConfig,
    pub similarity: SimilarityConfig,
    pub reasoning: ReasoningConfig,
    pub responders: ResponderConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    pub path: String,
    pub short_term_capacity: usize,
    pub flush_every_updates: u64,
    pub flush_interval_secs: u64,
    pub save_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimilarityConfig {
    pub provider: String,
    pub metric: DistanceMetric,
    pub dimensions: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReasoningConfig {
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ResponderConfig {
    pub n8n_webhook_url: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub events_db_path: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 8000,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        let path = default_vigil_dir()
            .join("memory_store.json")
            .to_string_lossy()
            .into_owned();
        Self {
            path,
            short_term_capacity: DEFAULT_CAPACITY,
            flush_every_updates: 10,
            flush_interval_secs: 5,
            save_timeout_ms: 5000,
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            provider: "hashed".into(),
            metric: DistanceMetric::Cosine,
            dimensions: 64,
        }
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            provider: "template".into(),
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            api_key: String::new(),
            timeout_ms: 1000,
        }
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            n8n_webhook_url: None,
            slack_webhook_url: None,
            events_db_path: None,
            timeout_ms: 10_000,
        }
    }
}

impl MemoryConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }
}

impl ReasoningConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ResponderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Returns `~/.vigil/`, or `./.vigil/` when no home directory is known.
pub fn default_vigil_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vigil")
}

/// Returns the default config file path: `~/.vigil/config.toml`
pub fn default_config_path() -> PathBuf {
    default_vigil_dir().join("config.toml")
}

impl VigilConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            VigilConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VIGIL_MEMORY_PATH") {
            self.memory.path = val;
        }
        if let Ok(val) = std::env::var("VIGIL_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("VIGIL_TRANSPORT") {
            self.server.transport = val;
        }
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            self.reasoning.api_key = val;
        }
        if let Ok(val) = std::env::var("N8N_WEBHOOK_URL") {
            self.responders.n8n_webhook_url = Some(val);
        }
        if let Ok(val) = std::env::var("SLACK_WEBHOOK_URL") {
            self.responders.slack_webhook_url = Some(val);
        }
        if let Ok(val) = std::env::var("VIGIL_EVENTS_DB") {
            self.responders.events_db_path = Some(val);
        }
    }

    /// Resolve the memory snapshot path, expanding `~` if needed.
    pub fn resolved_memory_path(&self) -> PathBuf {
        expand_tilde(&self.memory.path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = VigilConfig::default();
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.memory.short_term_capacity, 30);
        assert_eq!(config.similarity.metric, DistanceMetric::Cosine);
        assert_eq!(config.reasoning.provider, "template");
        assert_eq!(config.reasoning.timeout(), Duration::from_secs(1));
        assert!(config.memory.path.ends_with("memory_store.json"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[memory]
path = "/tmp/vigil.json"
flush_every_updates = 3

[similarity]
metric = "manhattan"
"#;
        let config: VigilConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.memory.path, "/tmp/vigil.json");
        assert_eq!(config.memory.flush_every_updates, 3);
        assert_eq!(config.similarity.metric, DistanceMetric::Manhattan);
        // defaults still apply for unset fields
        assert_eq!(config.memory.short_term_capacity, 30);
        assert_eq!(config.similarity.dimensions, 64);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = VigilConfig::default();
        std::env::set_var("VIGIL_MEMORY_PATH", "/tmp/override.json");
        std::env::set_var("VIGIL_LOG_LEVEL", "trace");
        std::env::set_var("N8N_WEBHOOK_URL", "http://localhost:5678/webhook/x");

        config.apply_env_overrides();

        assert_eq!(config.memory.path, "/tmp/override.json");
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(
            config.responders.n8n_webhook_url.as_deref(),
            Some("http://localhost:5678/webhook/x")
        );

        // Clean up
        std::env::remove_var("VIGIL_MEMORY_PATH");
        std::env::remove_var("VIGIL_LOG_LEVEL");
        std::env::remove_var("N8N_WEBHOOK_URL");
    }

    #[test]
    fn tilde_expands_to_home() {
        let expanded = expand_tilde("~/x.json");
        if dirs::home_dir().is_some() {
            assert!(!expanded.starts_with("~"));
        }
        assert_eq!(expand_tilde("/abs/x.json"), PathBuf::from("/abs/x.json"));
    }
}
