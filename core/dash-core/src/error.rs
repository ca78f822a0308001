//! Error types for nightwatch-core operations.
//!
//! `Display` output of every variant is the operator-facing message; the
//! dashboard shows it verbatim in a notice.

use nightwatch_protocol::RecordId;
use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// Transport Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// A failed call to the remote API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Non-success HTTP status. `message` is the server's `detail` when it sent
    /// one, otherwise `"<code> <reason>"`.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("{0}")]
    Network(String),

    /// A success response whose body was not the expected shape.
    #[error("Unexpected response from {context}: {details}")]
    Decode { context: String, details: String },
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Validation Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// A local precondition failure. These never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Start a shift first.")]
    NoActiveShift,

    #[error("Task title is empty.")]
    EmptyTitle,

    #[error("Task not found: {0}")]
    UnknownTask(RecordId),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Client Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Anything a dashboard operation can fail with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ClientError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

/// Convenience type alias for Results using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {details}")]
    Parse { path: PathBuf, details: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
