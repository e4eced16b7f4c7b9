//! # Error Types
//!
//! Error handling for the packet protocol.
//!
//! This module defines every error variant that can occur while registering packet types,
//! encoding and decoding frames, and dispatching decoded packets to handlers.
//!
//! ## Error Categories
//! - **Registry Errors**: unknown packet types or ids, duplicate registrations
//! - **Codec Errors**: truncated frames, malformed fields, trailing bytes, oversized frames
//! - **Routing Errors**: identifier collisions, failing handlers
//! - **Transport Errors**: closed sinks and I/O failures from the surrounding stream
//!
//! Registration-time errors are configuration bugs and should fail loudly before any traffic
//! flows. Decode-time errors mean the frame boundary can no longer be trusted; use
//! [`ProtocolError::is_fatal`] to decide whether a connection must be torn down.
//!
//! ## Example Usage
//! ```rust
//! use packet_delivery::error::{ProtocolError, Result};
//! use tracing::{error, info};
//!
//! fn check_frame(frame: &[u8]) -> Result<u32> {
//!     if frame.len() < 4 {
//!         return Err(ProtocolError::Truncated {
//!             needed: 4,
//!             remaining: frame.len(),
//!         });
//!     }
//!     Ok(u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]))
//! }
//!
//! match check_frame(&[0, 0]) {
//!     Ok(id) => info!(id, "frame header ok"),
//!     Err(e) => error!(error = %e, fatal = e.is_fatal(), "bad frame"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants shared by the codec and the transport glue.
pub mod constants {
    pub const ERR_EMPTY_STRING: &str = "Empty strings cannot be written";
    pub const ERR_SINK_CLOSED: &str = "Frame sink closed";
    pub const ERR_WRITE_CONSUMED: &str = "Packet::write consumed buffered bytes";
}

// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Packet type {0} is not registered in the vault")]
    UnknownType(&'static str),

    #[error("No such packet: id {0} is not registered in the vault")]
    UnknownId(u32),

    #[error("Packet type {0} is already registered in the vault")]
    DuplicatePacket(&'static str),

    #[error("Invalid string write: {}", constants::ERR_EMPTY_STRING)]
    InvalidStringWrite,

    #[error("Handler identifier already bound: {0}")]
    IdentifierCollision(String),

    #[error("Frame truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Frame has {0} unread trailing bytes")]
    TrailingBytes(usize),

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("Invalid boolean byte: {0:#04x}")]
    InvalidBool(u8),

    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("Length {0} does not fit in a u32 prefix")]
    LengthOverflow(usize),

    #[error("Handler {id} failed: {reason}")]
    Handler { id: String, reason: String },

    #[error("Connection closed: {}", constants::ERR_SINK_CLOSED)]
    ConnectionClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl ProtocolError {
    /// Whether the error leaves the connection in a state that cannot be resynchronized.
    ///
    /// Vault misses in either direction mean the peers registered different packets. Fatal
    /// errors should close the connection instead of reading the next frame.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(_)
                | ProtocolError::UnknownType(_)
                | ProtocolError::UnknownId(_)
                | ProtocolError::Truncated { .. }
                | ProtocolError::TrailingBytes(_)
                | ProtocolError::OversizedFrame(_)
                | ProtocolError::InvalidBool(_)
                | ProtocolError::InvalidUtf8
                | ProtocolError::ConnectionClosed
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
