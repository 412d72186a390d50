//! # Configuration Management
//!
//! Centralized configuration for the Photon decoder.
//!
//! The decoder itself needs almost nothing configured: the defaults reproduce the
//! classic behavior exactly (no caps on pending fragment series, responses routed
//! to the request callback). The knobs here exist for callers that must bound memory
//! or want responses delivered separately.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Resource Considerations
//! - `max_segment_length` (16 MB) caps the buffer a single fragment series may allocate
//! - `max_pending_segments` and `segment_ttl` bound the pending table when set

use crate::error::{constants, ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Largest fragment series the reassembler will allocate for (16 MB)
pub const MAX_SEGMENT_LENGTH: usize = 16 * 1024 * 1024;

/// Main decoder configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ParserConfig {
    /// Fragment reassembly limits
    #[serde(default)]
    pub reassembly: ReassemblyConfig,

    /// Which callback receives decoded operation responses
    #[serde(default)]
    pub response_routing: ResponseRouting,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ParserConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_OPEN))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_READ))
        })?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_PARSE))
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(max) = std::env::var("PHOTON_MAX_PENDING_SEGMENTS") {
            if let Ok(val) = max.parse::<usize>() {
                config.reassembly.max_pending_segments = Some(val);
            }
        }

        if let Ok(max) = std::env::var("PHOTON_MAX_SEGMENT_LENGTH") {
            if let Ok(val) = max.parse::<usize>() {
                config.reassembly.max_segment_length = val;
            }
        }

        if let Ok(ttl) = std::env::var("PHOTON_SEGMENT_TTL_MS") {
            if let Ok(val) = ttl.parse::<u64>() {
                config.reassembly.segment_ttl = Some(Duration::from_millis(val));
            }
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
        let content = toml::to_string_pretty(self).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_SERIALIZE))
        })?;

        std::fs::write(path, content).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_WRITE))
        })?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.reassembly.validate());
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

/// Destination of decoded operation responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseRouting {
    /// Deliver responses through `on_request`, as the classic parser does
    #[default]
    RequestCallback,
    /// Deliver responses through `on_response`
    ResponseCallback,
}

/// Fragment reassembly configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReassemblyConfig {
    /// Maximum number of incomplete series kept at once; the oldest is evicted
    /// when a new series would exceed it. `None` means unbounded.
    ///
    /// `Some(0)` fails `validate`. A reassembler built from an unvalidated config
    /// treats it as `Some(1)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pending_segments: Option<usize>,

    /// Largest declared total length accepted for a series
    pub max_segment_length: usize,

    /// Age after which `evict_expired` drops an incomplete series.
    /// `None` means series never expire.
    #[serde(
        with = "option_duration_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub segment_ttl: Option<Duration>,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            max_pending_segments: None,
            max_segment_length: MAX_SEGMENT_LENGTH,
            segment_ttl: None,
        }
    }
}

impl ReassemblyConfig {
    /// Validate reassembly configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(max) = self.max_pending_segments {
            if max == 0 {
                errors.push("Max pending segments must be greater than 0".to_string());
            } else if max > 1_000_000 {
                errors.push(format!(
                    "Max pending segments very high: {max} (maximum recommended: 1,000,000)"
                ));
            }
        }

        if self.max_segment_length == 0 {
            errors.push("Max segment length cannot be 0".to_string());
        } else if self.max_segment_length > u32::MAX as usize {
            errors.push(format!(
                "Max segment length too large: {} bytes (wire lengths are 32-bit)",
                self.max_segment_length
            ));
        }

        if let Some(ttl) = self.segment_ttl {
            if ttl.as_millis() < 10 {
                errors.push("Segment TTL too short (minimum: 10ms)".to_string());
            } else if ttl.as_secs() > 3600 {
                errors.push("Segment TTL too long (maximum: 1 hour)".to_string());
            }
        }

        errors
    }
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
            app_name: String::from("photon-protocol"),
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

/// Helper module for optional Duration serialization as milliseconds
mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration
            .map(|d| d.as_millis() as u64)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
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
