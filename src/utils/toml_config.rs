//! TOML-based configuration for the research core
//!
//! This module provides declarative configuration for planning thresholds,
//! dispatch limits and remote agent endpoints via a TOML file
//! (`ares-research.toml`).
//!
//! Use `ResearchConfigManager` for thread-safe access to the current
//! configuration; `reload()` swaps in a freshly loaded file without blocking
//! readers.

use crate::types::ResearchDepth;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Root configuration structure loaded from ares-research.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub planning: PlanningConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Remote specialist agents keyed by agent type
    #[serde(default)]
    pub agents: HashMap<String, AgentEndpointConfig>,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Planning Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Dimensions at or below this relevance produce no sources
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f32,

    /// Dimensions at or above this relevance also produce a supplementary source
    #[serde(default = "default_supplementary_relevance")]
    pub supplementary_relevance: f32,

    #[serde(default)]
    pub default_depth: ResearchDepth,
}

fn default_min_relevance() -> f32 {
    0.3
}

fn default_supplementary_relevance() -> f32 {
    0.6
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            min_relevance: default_min_relevance(),
            supplementary_relevance: default_supplementary_relevance(),
            default_depth: ResearchDepth::default(),
        }
    }
}

// ============= Dispatch Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Applied when a task request carries no timeout of its own
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Upper bound on simultaneously in-flight remote calls
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_concurrent_tasks() -> usize {
    8
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
        }
    }
}

impl DispatchConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

// ============= Agent Endpoint Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEndpointConfig {
    /// Base URL; tasks are posted to `{endpoint}/tasks`
    pub endpoint: String,

    /// Overrides the dispatch default for this agent
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Environment variable holding a bearer token for this agent
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

impl AgentEndpointConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms: None,
            auth_token_env: None,
        }
    }

    /// Resolve the bearer token, if one is configured and set
    pub fn auth_token(&self) -> Option<String> {
        self.auth_token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.is_empty())
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Agent '{0}' has an invalid endpoint '{1}'")]
    InvalidEndpoint(String, String),
}

impl ResearchConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: ResearchConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let planning = &self.planning;
        for (name, value) in [
            ("min_relevance", planning.min_relevance),
            ("supplementary_relevance", planning.supplementary_relevance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "planning.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if planning.supplementary_relevance < planning.min_relevance {
            return Err(ConfigError::ValidationError(
                "planning.supplementary_relevance must not be below planning.min_relevance"
                    .to_string(),
            ));
        }

        if self.dispatch.default_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.default_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.dispatch.max_concurrent_tasks == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.max_concurrent_tasks must be greater than zero".to_string(),
            ));
        }

        for (name, agent) in &self.agents {
            let endpoint = agent.endpoint.trim();
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::InvalidEndpoint(
                    name.clone(),
                    agent.endpoint.clone(),
                ));
            }
            if agent.timeout_ms == Some(0) {
                return Err(ConfigError::ValidationError(format!(
                    "agents.{}.timeout_ms must be greater than zero",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Get agent endpoint config by agent type
    pub fn get_agent(&self, agent_type: &str) -> Option<&AgentEndpointConfig> {
        self.agents.get(agent_type)
    }

    /// Sorted agent types, for display
    pub fn agent_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ============= Configuration Manager =============

/// Thread-safe configuration manager with lock-free reads
pub struct ResearchConfigManager {
    config: Arc<ArcSwap<ResearchConfig>>,
    config_path: PathBuf,
}

impl ResearchConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = ResearchConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
        })
    }

    /// Create a config manager directly from a config (useful for testing)
    pub fn from_config(config: ResearchConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("ares-research.toml"),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<ResearchConfig> {
        self.config.load_full()
    }

    /// Reload the configuration from disk. On failure the previous
    /// configuration stays active.
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = ResearchConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }
}

impl Clone for ResearchConfigManager {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            config_path: self.config_path.clone(),
        }
    }
}
