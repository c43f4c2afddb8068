//! Error types for courier.
//!
//! Two families live here. [`SessionError`] is data: it is what the session
//! layer hands us when the connection misbehaves, and it travels to observers
//! inside [`Event::Error`](crate::Event::Error). [`CourierError`] is what the
//! crate's own fallible operations (construction, draining) return.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Infrastructure failures reported by the session layer.
///
/// These are delivered to every observer's baseline error handler. Errors
/// caused by a caller's own request are returned from that request instead.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionError {
    #[error("Connection closed: {reason}")]
    ConnectionClosed {
        reason: String,
    },

    #[error("Connection failed: {message}")]
    ConnectionFailed {
        message: String,
    },

    #[error("Failed to decode incoming frame: {message}")]
    Decode {
        message: String,
    },

    #[error("Session timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Session error: {message}")]
    Other {
        message: String,
    },
}

impl SessionError {
    /// Creates a catch-all session error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Validation errors raised while checking configuration.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },
}

/// Execution errors raised by the delivery machinery.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Delivery queue is full (capacity: {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Delivery queue disconnected: {path}")]
    Disconnected {
        path: String,
    },

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Failed to spawn worker '{name}': {message}")]
    WorkerSpawn {
        name: String,
        message: String,
    },
}

/// Top-level error type for courier.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

impl CourierError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Execution(e) => matches!(
                e,
                ExecutionError::Timeout { .. } | ExecutionError::QueueFull { .. }
            ),
        }
    }
}

/// Result type alias for courier operations.
pub type CourierResult<T> = Result<T, CourierError>;
