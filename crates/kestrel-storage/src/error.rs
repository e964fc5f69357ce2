//! Error types for kestrel-storage
//!
//! [`ConfigStoreError`] is what callers of the store see. Every variant
//! carries the operation and key it failed on, and the variant alone is
//! enough to decide between retrying, giving up, or treating the failure
//! as an expected conflict.

use std::fmt::Display;

use kestrel_core::ConfigKey;
use thiserror::Error;

use crate::metrics::StoreOp;

/// Which of the two record payloads an error concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// The job configuration (stored compressed)
    Config,
    /// The configuration add-on (stored raw)
    AddOn,
}

impl Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Config => f.write_str("config"),
            Payload::AddOn => f.write_str("config add-on"),
        }
    }
}

/// Errors from the compression codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The compressor could not write or finalize its stream
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Compressed framing was recognized but the stream is invalid
    #[error("Corrupt compressed payload: {0}")]
    Corrupt(String),
}

/// Errors reported by a backing [`ConfigClient`](crate::ConfigClient)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A record with the same key already exists
    #[error("Record already exists")]
    AlreadyExists,

    /// Transport, I/O or database failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// The call context was cancelled before the operation applied
    #[error("Operation cancelled")]
    Cancelled,

    /// The call context deadline passed before the operation applied
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// A stored row could not be encoded or decoded by the backend
    #[error("Row serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// Create a new Backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Whether repeating the call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Backend(_) | ClientError::Cancelled | ClientError::DeadlineExceeded
        )
    }
}

impl From<redb::DatabaseError> for ClientError {
    fn from(err: redb::DatabaseError) -> Self {
        ClientError::Backend(err.to_string())
    }
}

impl From<redb::TransactionError> for ClientError {
    fn from(err: redb::TransactionError) -> Self {
        ClientError::Backend(err.to_string())
    }
}

impl From<redb::TableError> for ClientError {
    fn from(err: redb::TableError) -> Self {
        ClientError::Backend(err.to_string())
    }
}

impl From<redb::StorageError> for ClientError {
    fn from(err: redb::StorageError) -> Self {
        ClientError::Backend(err.to_string())
    }
}

impl From<redb::CommitError> for ClientError {
    fn from(err: redb::CommitError) -> Self {
        ClientError::Backend(err.to_string())
    }
}

impl From<postcard::Error> for ClientError {
    fn from(err: postcard::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

/// Errors returned by [`JobConfigStore`](crate::JobConfigStore) operations
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    /// A payload could not be marshalled or unmarshalled
    #[error("{op} {key}: {payload} serialization failed: {reason}")]
    Serialization {
        op: StoreOp,
        key: ConfigKey,
        payload: Payload,
        reason: String,
    },

    /// The config payload could not be compressed
    #[error("{op} {key}: failed to compress config: {source}")]
    Encoding {
        op: StoreOp,
        key: ConfigKey,
        #[source]
        source: CodecError,
    },

    /// The stored config has compressed framing but does not decompress
    #[error("{op} {key}: corrupt record: {source}")]
    CorruptRecord {
        op: StoreOp,
        key: ConfigKey,
        #[source]
        source: CodecError,
    },

    /// A config with this key was already created
    #[error("{op} {key}: config already exists")]
    AlreadyExists { op: StoreOp, key: ConfigKey },

    /// No config with this key exists
    #[error("{op} {key}: config not found")]
    NotFound { op: StoreOp, key: ConfigKey },

    /// The backing client failed; the client error is passed through
    #[error("{op} {key}: {source}")]
    Infrastructure {
        op: StoreOp,
        key: ConfigKey,
        #[source]
        source: ClientError,
    },
}

impl ConfigStoreError {
    /// Map a backing client error, surfacing conflicts as [`Self::AlreadyExists`]
    pub fn from_client(op: StoreOp, key: ConfigKey, err: ClientError) -> Self {
        match err {
            ClientError::AlreadyExists => Self::AlreadyExists { op, key },
            source => Self::Infrastructure { op, key, source },
        }
    }

    /// The operation that failed
    pub fn op(&self) -> StoreOp {
        match self {
            Self::Serialization { op, .. }
            | Self::Encoding { op, .. }
            | Self::CorruptRecord { op, .. }
            | Self::AlreadyExists { op, .. }
            | Self::NotFound { op, .. }
            | Self::Infrastructure { op, .. } => *op,
        }
    }

    /// The key the operation was addressed to
    pub fn key(&self) -> &ConfigKey {
        match self {
            Self::Serialization { key, .. }
            | Self::Encoding { key, .. }
            | Self::CorruptRecord { key, .. }
            | Self::AlreadyExists { key, .. }
            | Self::NotFound { key, .. }
            | Self::Infrastructure { key, .. } => key,
        }
    }

    /// Whether the caller may retry the operation
    ///
    /// Only transient infrastructure failures qualify. Serialization and
    /// corruption failures will repeat; conflicts and misses are answers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Infrastructure { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Whether this is a miss on get
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is a create conflict
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Errors loading [`StoreSettings`](crate::StoreSettings)
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("Failed to open backend: {0}")]
    Backend(#[from] ClientError),
}
