//! Main application configuration
//!
//! This module defines the primary configuration structures for the pug-room
//! matchmaking service, including environment variable and TOML file loading
//! and validation.

use crate::game::TeamPartitionPolicy;
use crate::queue::{validate_queue_name, validate_queue_size};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub matchmaking: MatchmakingSettings,
    pub commands: CommandSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for health check and metrics endpoints
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// How often gauges are refreshed from manager stats
    pub metrics_update_interval_seconds: u64,
}

/// A queue registered at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSettings {
    pub name: String,
    pub size: usize,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// How a popped queue is split into teams
    pub team_partition: TeamPartitionPolicy,
    /// Queues created when the service starts
    pub default_queues: Vec<QueueSettings>,
}

/// Chat command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    /// Prefix marking a message as a command
    pub prefix: String,
    /// Players allowed to run admin commands
    pub admins: Vec<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "pug-room".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            shutdown_timeout_seconds: 30,
            metrics_update_interval_seconds: 30,
        }
    }
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            admins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;

        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(port) = env::var("HEALTH_PORT") {
            self.service.health_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HEALTH_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Matchmaking settings
        if let Ok(policy) = env::var("TEAM_PARTITION") {
            self.matchmaking.team_partition = policy
                .parse()
                .map_err(|e| anyhow!("Invalid TEAM_PARTITION value: {}", e))?;
        }
        if let Ok(queues) = env::var("DEFAULT_QUEUES") {
            self.matchmaking.default_queues = parse_queue_list(&queues)?;
        }

        // Command settings
        if let Ok(prefix) = env::var("COMMAND_PREFIX") {
            self.commands.prefix = prefix;
        }
        if let Ok(admins) = env::var("ADMINS") {
            self.commands.admins = admins
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get metrics refresh interval as Duration
    pub fn metrics_update_interval(&self) -> Duration {
        Duration::from_secs(self.service.metrics_update_interval_seconds)
    }
}

/// Parse a `name:size,name:size` queue list
pub fn parse_queue_list(value: &str) -> Result<Vec<QueueSettings>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, size) = entry
                .split_once(':')
                .ok_or_else(|| anyhow!("Invalid queue entry '{}': expected name:size", entry))?;
            let size = size
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid size in queue entry '{}'", entry))?;
            Ok(QueueSettings {
                name: name.trim().to_string(),
                size,
            })
        })
        .collect()
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.service.metrics_update_interval_seconds == 0 {
        return Err(anyhow!("Metrics update interval must be greater than 0"));
    }

    // Validate startup queues
    let mut names = HashSet::new();
    for queue in &config.matchmaking.default_queues {
        validate_queue_name(&queue.name)?;
        validate_queue_size(queue.size)?;
        if !names.insert(queue.name.as_str()) {
            return Err(anyhow!("Duplicate default queue: {}", queue.name));
        }
    }

    // Validate command settings
    if config.commands.prefix.is_empty() {
        return Err(anyhow!("Command prefix cannot be empty"));
    }
    if config.commands.prefix.chars().any(char::is_whitespace) {
        return Err(anyhow!("Command prefix cannot contain whitespace"));
    }

    Ok(())
}
