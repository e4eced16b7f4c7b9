//! # Configuration Management
//!
//! Centralized configuration for the packet protocol.
//!
//! This module provides structured configuration for the frame codec, the event router and
//! logging. Every section is optional in a config file and falls back to its defaults.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment variables via `from_env()`
//!
//! ## Example
//! ```toml
//! [codec]
//! max_frame_size = 65536
//! reject_trailing_bytes = true
//!
//! [router]
//! dispatch_policy = "run_all"
//!
//! [logging]
//! app_name = "lobby-server"
//! log_level = "debug"
//! json_format = false
//! ```

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Max allowed frame size (id + payload), 16 MB
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Size of the packet id header at the start of every frame
pub const FRAME_HEADER_SIZE: usize = 4;

/// Main protocol configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProtocolConfig {
    /// Frame codec configuration
    #[serde(default)]
    pub codec: CodecConfig,

    /// Event router configuration
    #[serde(default)]
    pub router: RouterConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProtocolConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(size) = std::env::var("PACKET_DELIVERY_MAX_FRAME_SIZE") {
            config.codec.max_frame_size = size.parse::<usize>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid PACKET_DELIVERY_MAX_FRAME_SIZE: {e}"))
            })?;
        }

        if let Ok(flag) = std::env::var("PACKET_DELIVERY_REJECT_TRAILING_BYTES") {
            config.codec.reject_trailing_bytes = flag.parse::<bool>().map_err(|e| {
                ProtocolError::ConfigError(format!(
                    "Invalid PACKET_DELIVERY_REJECT_TRAILING_BYTES: {e}"
                ))
            })?;
        }

        if let Ok(policy) = std::env::var("PACKET_DELIVERY_DISPATCH_POLICY") {
            config.router.dispatch_policy = match policy.as_str() {
                "fail_fast" => DispatchPolicy::FailFast,
                "run_all" => DispatchPolicy::RunAll,
                other => {
                    return Err(ProtocolError::ConfigError(format!(
                        "Invalid PACKET_DELIVERY_DISPATCH_POLICY: {other}"
                    )))
                }
            };
        }

        if let Ok(level) = std::env::var("PACKET_DELIVERY_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid PACKET_DELIVERY_LOG_LEVEL: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Frame codec configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Maximum frame size in bytes, header included
    pub max_frame_size: usize,

    /// Whether bytes left over after a packet's `read` fail the decode
    pub reject_trailing_bytes: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            reject_trailing_bytes: true,
        }
    }
}

impl CodecConfig {
    /// Validate codec configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_frame_size < FRAME_HEADER_SIZE {
            errors.push(format!(
                "Max frame size too small: {} (minimum: {FRAME_HEADER_SIZE} bytes for the packet id)",
                self.max_frame_size
            ));
        } else if self.max_frame_size > u32::MAX as usize {
            errors.push(format!(
                "Max frame size too large: {} (maximum: {} bytes)",
                self.max_frame_size,
                u32::MAX
            ));
        }

        errors
    }
}

/// What the router does when a handler fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Stop at the first failing handler and return its error
    #[default]
    FailFast,
    /// Run every handler, log each failure, return the first error
    RunAll,
}

/// Event router configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Handler failure policy
    pub dispatch_policy: DispatchPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("packet-delivery"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
