//! The persisted config record
//!
//! One [`ConfigRecord`] per `(job id, version)`. The config payload is
//! compressed; the add-on payload is stored raw. Older records may hold an
//! uncompressed config, which [`ConfigRecord::to_config`] accepts.

use chrono::{DateTime, Utc};
use kestrel_core::{ConfigAddOn, ConfigKey, JobConfig, JobId};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{ConfigStoreError, Payload};
use crate::metrics::StoreOp;

/// A row of the job config table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Owning job
    pub job_id: JobId,
    /// Caller-assigned version
    pub version: u64,
    /// Serialized [`JobConfig`], gzip compressed (raw on legacy rows)
    pub config: Vec<u8>,
    /// Serialized [`ConfigAddOn`], never compressed
    pub config_addon: Vec<u8>,
    /// When the record was created
    pub creation_time: DateTime<Utc>,
}

impl ConfigRecord {
    /// Build a record from its payloads
    ///
    /// Serializes and compresses `config`, serializes `addon` as is.
    pub fn encode(
        key: &ConfigKey,
        config: &JobConfig,
        addon: &ConfigAddOn,
        compression_level: u32,
        creation_time: DateTime<Utc>,
    ) -> Result<Self, ConfigStoreError> {
        let op = StoreOp::Create;

        let config_bytes =
            postcard::to_allocvec(config).map_err(|e| ConfigStoreError::Serialization {
                op,
                key: key.clone(),
                payload: Payload::Config,
                reason: e.to_string(),
            })?;

        let config_bytes = codec::compress_with_level(&config_bytes, compression_level)
            .map_err(|source| ConfigStoreError::Encoding {
                op,
                key: key.clone(),
                source,
            })?;

        let addon_bytes =
            postcard::to_allocvec(addon).map_err(|e| ConfigStoreError::Serialization {
                op,
                key: key.clone(),
                payload: Payload::AddOn,
                reason: e.to_string(),
            })?;

        Ok(Self {
            job_id: key.job_id.clone(),
            version: key.version,
            config: config_bytes,
            config_addon: addon_bytes,
            creation_time,
        })
    }

    /// The record's composite key
    pub fn key(&self) -> ConfigKey {
        ConfigKey::new(self.job_id.clone(), self.version)
    }

    /// Decode the config payload
    pub fn to_config(&self) -> Result<JobConfig, ConfigStoreError> {
        let op = StoreOp::Get;

        let bytes = codec::decompress(&self.config).map_err(|source| {
            ConfigStoreError::CorruptRecord {
                op,
                key: self.key(),
                source,
            }
        })?;

        postcard::from_bytes(&bytes).map_err(|e| ConfigStoreError::Serialization {
            op,
            key: self.key(),
            payload: Payload::Config,
            reason: e.to_string(),
        })
    }

    /// Decode the add-on payload
    pub fn to_config_addon(&self) -> Result<ConfigAddOn, ConfigStoreError> {
        postcard::from_bytes(&self.config_addon).map_err(|e| ConfigStoreError::Serialization {
            op: StoreOp::Get,
            key: self.key(),
            payload: Payload::AddOn,
            reason: e.to_string(),
        })
    }

    /// Whether the config payload carries compression framing
    pub fn is_config_compressed(&self) -> bool {
        codec::is_compressed(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kestrel_core::JobType;

    fn key() -> ConfigKey {
        ConfigKey::new(JobId::new("job-1").unwrap(), 0)
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 6, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_encode_decode() {
        let config = JobConfig::new("batch-A")
            .with_job_type(JobType::Batch)
            .with_instance_count(10);
        let addon = ConfigAddOn::new().with_system_label("peloton.job_id", "job-1");

        let record = ConfigRecord::encode(&key(), &config, &addon, 6, at()).unwrap();
        assert_eq!(record.key(), key());
        assert_eq!(record.creation_time, at());
        assert!(record.is_config_compressed());

        assert_eq!(record.to_config().unwrap(), config);
        assert_eq!(record.to_config_addon().unwrap(), addon);
    }

    #[test]
    fn test_add_on_is_stored_raw() {
        let addon = ConfigAddOn::new().with_system_label("a", "b");
        let record =
            ConfigRecord::encode(&key(), &JobConfig::new("x"), &addon, 6, at()).unwrap();

        assert_eq!(record.config_addon, postcard::to_allocvec(&addon).unwrap());
    }

    #[test]
    fn test_legacy_uncompressed_config_decodes() {
        let config = JobConfig::new("legacy").with_owning_team("old-team");
        let record = ConfigRecord {
            job_id: key().job_id,
            version: 0,
            config: postcard::to_allocvec(&config).unwrap(),
            config_addon: postcard::to_allocvec(&ConfigAddOn::new()).unwrap(),
            creation_time: at(),
        };

        assert!(!record.is_config_compressed());
        assert_eq!(record.to_config().unwrap(), config);
    }

    #[test]
    fn test_truncated_config_is_corrupt_not_serialization() {
        let mut record =
            ConfigRecord::encode(&key(), &JobConfig::new("batch-A"), &ConfigAddOn::new(), 6, at())
                .unwrap();
        let cut = record.config.len() - 3;
        record.config.truncate(cut);

        let err = record.to_config().unwrap_err();
        assert!(matches!(err, ConfigStoreError::CorruptRecord { .. }));
    }

    #[test]
    fn test_garbage_raw_config_is_serialization_error() {
        let mut record =
            ConfigRecord::encode(&key(), &JobConfig::new("batch-A"), &ConfigAddOn::new(), 6, at())
                .unwrap();
        // Not gzip, and not a valid encoded config either
        record.config = vec![0xff, 0xff, 0xff];

        let err = record.to_config().unwrap_err();
        assert!(matches!(
            err,
            ConfigStoreError::Serialization {
                payload: Payload::Config,
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_add_on_is_serialization_error() {
        let mut record =
            ConfigRecord::encode(&key(), &JobConfig::new("batch-A"), &ConfigAddOn::new(), 6, at())
                .unwrap();
        record.config_addon = vec![0xff, 0xff, 0xff];

        let err = record.to_config_addon().unwrap_err();
        assert!(matches!(
            err,
            ConfigStoreError::Serialization {
                payload: Payload::AddOn,
                ..
            }
        ));
    }
}
