//! Configuration management for the pug-room service
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for the matchmaking service.

pub mod app;

// Re-export commonly used types
pub use app::{
    parse_queue_list, validate_config, AppConfig, CommandSettings, MatchmakingSettings,
    QueueSettings, ServiceSettings,
};
