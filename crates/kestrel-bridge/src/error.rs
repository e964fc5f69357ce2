//! Error types for kestrel-bridge

use thiserror::Error;

/// Errors translating a pod event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The event timestamp is not RFC 3339
    #[error("Invalid timestamp {timestamp:?}: {reason}")]
    Format { timestamp: String, reason: String },

    /// The pod state has no schedule status counterpart
    #[error("Unknown pod state: {0}")]
    UnknownState(String),
}
