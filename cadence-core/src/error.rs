//! Cadence Error Types
//!
//! Every fallible operation in the workspace reports through [`CadenceError`].
//! Backend crates map their native errors into these variants.

use std::io;
use thiserror::Error;

/// Main error type for cadence operations
#[derive(Error, Debug)]
pub enum CadenceError {
    /// IO error from the underlying OS transport
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Transport context could not be created
    #[error("Context creation failed: {0}")]
    Context(String),

    /// A socket could not be connected (or bound) to its endpoint
    #[error("Failed to connect '{endpoint}': {reason}")]
    Connect { endpoint: String, reason: String },

    /// Endpoint or address string is malformed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The transport rejected a send
    #[error("Send on '{endpoint}' failed: {reason}")]
    Send { endpoint: String, reason: String },

    /// The transport failed while receiving
    #[error("Receive on '{endpoint}' failed: {reason}")]
    Receive { endpoint: String, reason: String },

    /// Polling the registered sockets failed
    #[error("Poll failed: {0}")]
    Poll(String),

    /// Topic name is not part of the configured topic list
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// Construction-time configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Received bytes are not a well-formed envelope
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// A payload could not be serialized into an envelope
    #[error("Payload codec failure: {0}")]
    Codec(String),

    /// Payload accessor does not match the envelope's union discriminant
    #[error("Payload mismatch: expected variant {expected}, envelope carries {actual}")]
    PayloadMismatch { expected: u16, actual: u16 },

    /// Socket closed
    #[error("Socket closed")]
    SocketClosed,
}

/// Result type alias for cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;

impl CadenceError {
    /// Create a connection error for `endpoint`
    pub fn connect(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connect {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a send error for `endpoint`
    pub fn send(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Send {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a receive error for `endpoint`
    pub fn receive(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Receive {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid frame error with a message
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }

    /// Create a payload codec error with a message
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Create an invalid configuration error with a message
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an unknown topic error
    pub fn unknown_topic(name: impl Into<String>) -> Self {
        Self::UnknownTopic(name.into())
    }

    /// Check if this error is recoverable
    ///
    /// Per-cycle transport hiccups are recoverable; logic errors such as an
    /// unknown topic and construction failures are not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            Self::Send { .. } | Self::Receive { .. } | Self::Poll(_) | Self::InvalidFrame(_) => true,
            _ => false,
        }
    }

    /// Check if this is a connection error
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Context(_) | Self::SocketClosed
        )
    }
}
