//! Job identity and record keys
//!
//! A configuration record is addressed by the job that owns it and a
//! caller-assigned version number. [`ConfigKey`] is that composite key.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Separator between the job id and the version in encoded keys
const KEY_SEPARATOR: u8 = 0x00;

/// Identifier of the workload owning a configuration
///
/// Job ids are opaque strings. They must be non-empty and must not contain
/// a NUL byte, which is reserved as the separator in encoded keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Create a new job id
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        if value.is_empty() {
            return Err(IdentityError::InvalidFormat(
                "job id must not be empty".to_string(),
            ));
        }
        if value.as_bytes().contains(&KEY_SEPARATOR) {
            return Err(IdentityError::InvalidFormat(format!(
                "job id {:?} contains a NUL byte",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Get the job id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for JobId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for JobId {
    type Error = IdentityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

/// Composite key of a configuration record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
    /// Owning job
    pub job_id: JobId,
    /// Caller-assigned configuration version
    pub version: u64,
}

impl ConfigKey {
    /// Create a new config key
    pub fn new(job_id: JobId, version: u64) -> Self {
        Self { job_id, version }
    }

    /// Encode the key for byte-ordered stores
    ///
    /// Layout: job id bytes, a NUL separator, then the version big-endian,
    /// so all versions of one job sort together and in version order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let id = self.job_id.as_str().as_bytes();
        let mut out = Vec::with_capacity(id.len() + 1 + 8);
        out.extend_from_slice(id);
        out.push(KEY_SEPARATOR);
        out.extend_from_slice(&self.version.to_be_bytes());
        out
    }
}

impl Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.job_id, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_validation() {
        assert!(JobId::new("job-1").is_ok());
        assert!(matches!(
            JobId::new(""),
            Err(IdentityError::InvalidFormat(_))
        ));
        assert!(matches!(
            JobId::new("bad\0id"),
            Err(IdentityError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_job_id_display() {
        let id = JobId::new("job-1").unwrap();
        assert_eq!(id.to_string(), "job-1");
        assert_eq!(id.as_str(), "job-1");
    }

    #[test]
    fn test_job_id_serde_rejects_invalid() {
        let bytes = postcard::to_allocvec(&String::new()).unwrap();
        assert!(postcard::from_bytes::<JobId>(&bytes).is_err());

        let bytes = postcard::to_allocvec(&"job-7".to_string()).unwrap();
        let id: JobId = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(id.as_str(), "job-7");
    }

    #[test]
    fn test_config_key_display() {
        let key = ConfigKey::new(JobId::new("job-1").unwrap(), 3);
        assert_eq!(key.to_string(), "job-1@3");
    }

    #[test]
    fn test_config_key_bytes_layout() {
        let key = ConfigKey::new(JobId::new("ab").unwrap(), 1);
        assert_eq!(key.to_bytes(), vec![b'a', b'b', 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_config_key_bytes_sort_by_version() {
        let id = JobId::new("job").unwrap();
        let low = ConfigKey::new(id.clone(), 2).to_bytes();
        let high = ConfigKey::new(id, 256).to_bytes();
        assert!(low < high);
    }

    #[test]
    fn test_config_key_prefix_jobs_do_not_collide() {
        // "job" @ v and "job-1" @ v must never encode identically
        let a = ConfigKey::new(JobId::new("job").unwrap(), 0).to_bytes();
        let b = ConfigKey::new(JobId::new("job-1").unwrap(), 0).to_bytes();
        assert_ne!(a, b);
    }
}
