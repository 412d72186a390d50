//! # Error Types
//!
//! Error handling for the Photon decoder.
//!
//! Most malformed input never surfaces as an error: truncated packets, encrypted
//! packets and checksum mismatches are dropped silently by the parser (and counted
//! in [`Metrics`](crate::utils::metrics::Metrics)). What does surface is a value
//! payload the deserializer cannot interpret, because that points at a protocol
//! version mismatch or a corrupted capture the caller needs to see.
//!
//! ## Error Categories
//! - **Decode Errors**: truncated values, unknown type codes, bad UTF-8, negative lengths
//! - **Configuration Errors**: unreadable or invalid TOML, failed validation
//! - **I/O Errors**: configuration file access
//!
//! ## Example Usage
//! ```rust
//! use photon_protocol::error::{ProtocolError, Result};
//! use photon_protocol::protocol16::{Protocol16, ValueDecoder};
//! use tracing::{error, info};
//!
//! fn decode(payload: &[u8]) -> Result<u8> {
//!     let event = Protocol16.decode_event(payload)?;
//!     Ok(event.code)
//! }
//!
//! match decode(&[]) {
//!     Ok(code) => info!(code, "Decoded event"),
//!     Err(e) => error!(error = %e, "Malformed event payload"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Configuration errors
    pub const ERR_CONFIG_OPEN: &str = "Failed to open config file";
    pub const ERR_CONFIG_READ: &str = "Failed to read config file";
    pub const ERR_CONFIG_PARSE: &str = "Failed to parse TOML";
    pub const ERR_CONFIG_SERIALIZE: &str = "Failed to serialize config";
    pub const ERR_CONFIG_WRITE: &str = "Failed to write config file";

    /// Logging errors
    pub const ERR_LOGGING_INIT: &str = "Failed to install tracing subscriber";
}

// ProtocolError is the primary error type for all decoder operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unexpected end of payload while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("Unknown Protocol16 type code: {0}")]
    UnknownTypeCode(u8),

    #[error("Invalid UTF-8 in string value")]
    InvalidUtf8,

    #[error("Invalid collection length: {0}")]
    InvalidLength(i32),

    #[error("Value nesting exceeds depth limit of {0}")]
    NestingTooDeep(usize),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl ProtocolError {
    /// True for errors raised while decoding a value payload.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnexpectedEof(_)
                | ProtocolError::UnknownTypeCode(_)
                | ProtocolError::InvalidUtf8
                | ProtocolError::InvalidLength(_)
                | ProtocolError::NestingTooDeep(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
