//! Error types for kestrel-logging

use thiserror::Error;

/// Errors setting up the global subscriber
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid filter directive: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create rolling appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}
