//! Versioned job config store
//!
//! [`JobConfigStore`] turns configs into [`ConfigRecord`]s and back, and
//! delegates durability to a [`ConfigClient`]. It keeps no state of its
//! own: no cache, no locks, no retries. Each call reports exactly one
//! outcome to the metrics observer.

use std::sync::Arc;

use async_trait::async_trait;
use kestrel_core::{Clock, ConfigAddOn, ConfigKey, JobConfig, JobId, SystemClock};
use tracing::{debug, instrument, warn};

use crate::client::ConfigClient;
use crate::codec::{DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL};
use crate::context::CallContext;
use crate::error::ConfigStoreError;
use crate::metrics::{NoopMetrics, Outcome, StoreMetrics, StoreOp};
use crate::record::ConfigRecord;

/// Operations on versioned job configs
///
/// Configs are immutable: a new configuration is always a new version,
/// chosen by the caller. There is no update.
#[async_trait]
pub trait JobConfigOps: Send + Sync {
    /// Persist `config` and `addon` as version `version` of `job_id`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::AlreadyExists`] if that version was
    /// already created. The stored record is left untouched.
    async fn create(
        &self,
        ctx: &CallContext,
        job_id: &JobId,
        version: u64,
        config: &JobConfig,
        addon: &ConfigAddOn,
    ) -> Result<(), ConfigStoreError>;

    /// Load version `version` of `job_id`
    ///
    /// Returns both payloads or an error, never one without the other.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::NotFound`] if the version does not
    /// exist, [`ConfigStoreError::CorruptRecord`] if the stored config does
    /// not decompress, and [`ConfigStoreError::Serialization`] if a payload
    /// does not decode.
    async fn get(
        &self,
        ctx: &CallContext,
        job_id: &JobId,
        version: u64,
    ) -> Result<(JobConfig, ConfigAddOn), ConfigStoreError>;

    /// Delete version `version` of `job_id`
    ///
    /// Deleting a version that does not exist succeeds.
    async fn delete(
        &self,
        ctx: &CallContext,
        job_id: &JobId,
        version: u64,
    ) -> Result<(), ConfigStoreError>;
}

/// Default [`JobConfigOps`] implementation over a [`ConfigClient`]
pub struct JobConfigStore<C, M = NoopMetrics> {
    client: C,
    metrics: M,
    clock: Arc<dyn Clock>,
    compression_level: u32,
}

impl<C: ConfigClient> JobConfigStore<C, NoopMetrics> {
    /// Create a store that records no metrics
    pub fn new(client: C) -> Self {
        Self::with_metrics(client, NoopMetrics)
    }
}

impl<C: ConfigClient, M: StoreMetrics> JobConfigStore<C, M> {
    /// Create a store reporting outcomes to `metrics`
    pub fn with_metrics(client: C, metrics: M) -> Self {
        Self {
            client,
            metrics,
            clock: Arc::new(SystemClock),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Use a custom clock for creation times
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Set the compression level for new configs (0-9, clamped)
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(MAX_COMPRESSION_LEVEL);
        self
    }

    /// Get a reference to the backing client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Get a reference to the metrics observer
    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Get the compression level
    pub fn compression_level(&self) -> u32 {
        self.compression_level
    }

    async fn try_create(
        &self,
        ctx: &CallContext,
        key: ConfigKey,
        config: &JobConfig,
        addon: &ConfigAddOn,
    ) -> Result<(), ConfigStoreError> {
        let record = ConfigRecord::encode(
            &key,
            config,
            addon,
            self.compression_level,
            self.clock.now_utc(),
        )?;

        self.client
            .create_if_absent(ctx, record)
            .await
            .map_err(|e| ConfigStoreError::from_client(StoreOp::Create, key, e))
    }

    async fn try_get(
        &self,
        ctx: &CallContext,
        key: ConfigKey,
    ) -> Result<(JobConfig, ConfigAddOn), ConfigStoreError> {
        let record = self
            .client
            .fetch_by_key(ctx, &key)
            .await
            .map_err(|e| ConfigStoreError::from_client(StoreOp::Get, key.clone(), e))?
            .ok_or(ConfigStoreError::NotFound {
                op: StoreOp::Get,
                key,
            })?;

        if !record.is_config_compressed() {
            debug!("Read uncompressed legacy config");
        }

        let config = record.to_config()?;
        let addon = record.to_config_addon()?;
        Ok((config, addon))
    }

    fn observe<T>(&self, op: StoreOp, result: &Result<T, ConfigStoreError>) {
        match result {
            Ok(_) => {
                debug!(op = %op, "Job config operation succeeded");
                self.metrics.record(op, Outcome::Success);
            }
            Err(e) => {
                if e.is_not_found() || e.is_already_exists() {
                    debug!(op = %op, error = %e, "Job config operation failed");
                } else {
                    warn!(op = %op, error = %e, "Job config operation failed");
                }
                self.metrics.record(op, Outcome::Failure);
            }
        }
    }
}

#[async_trait]
impl<C: ConfigClient, M: StoreMetrics> JobConfigOps for JobConfigStore<C, M> {
    #[instrument(skip(self, ctx, config, addon), fields(job_id = %job_id, version))]
    async fn create(
        &self,
        ctx: &CallContext,
        job_id: &JobId,
        version: u64,
        config: &JobConfig,
        addon: &ConfigAddOn,
    ) -> Result<(), ConfigStoreError> {
        let key = ConfigKey::new(job_id.clone(), version);
        let result = self.try_create(ctx, key, config, addon).await;
        self.observe(StoreOp::Create, &result);
        result
    }

    #[instrument(skip(self, ctx), fields(job_id = %job_id, version))]
    async fn get(
        &self,
        ctx: &CallContext,
        job_id: &JobId,
        version: u64,
    ) -> Result<(JobConfig, ConfigAddOn), ConfigStoreError> {
        let key = ConfigKey::new(job_id.clone(), version);
        let result = self.try_get(ctx, key).await;
        self.observe(StoreOp::Get, &result);
        result
    }

    #[instrument(skip(self, ctx), fields(job_id = %job_id, version))]
    async fn delete(
        &self,
        ctx: &CallContext,
        job_id: &JobId,
        version: u64,
    ) -> Result<(), ConfigStoreError> {
        let key = ConfigKey::new(job_id.clone(), version);
        let result = self
            .client
            .delete_by_key(ctx, &key)
            .await
            .map_err(|e| ConfigStoreError::from_client(StoreOp::Delete, key, e));
        self.observe(StoreOp::Delete, &result);
        result
    }
}

impl<C: std::fmt::Debug, M> std::fmt::Debug for JobConfigStore<C, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobConfigStore")
            .field("client", &self.client)
            .field("compression_level", &self.compression_level)
            .finish_non_exhaustive()
    }
}
