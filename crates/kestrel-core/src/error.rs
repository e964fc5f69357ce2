//! Error types shared across Kestrel crates

use thiserror::Error;

/// Errors related to job identity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Invalid job id format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_error_display() {
        let err = IdentityError::InvalidFormat("job id must not be empty".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid job id format"));
        assert!(msg.contains("must not be empty"));
    }
}
