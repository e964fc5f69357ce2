//! redb-backed config client
//!
//! Records live in a single `job_config` table keyed by
//! [`ConfigKey::to_bytes`], with the postcard-encoded [`ConfigRecord`] as
//! value. redb runs one write transaction at a time, which is what makes
//! the check-then-insert of `create_if_absent` atomic.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use kestrel_core::ConfigKey;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::client::ConfigClient;
use crate::context::CallContext;
use crate::error::ClientError;
use crate::record::ConfigRecord;

// Key: job id ++ 0x00 ++ version (big-endian), Value: serialized ConfigRecord
pub const JOB_CONFIG: TableDefinition<&[u8], &[u8]> = TableDefinition::new("job_config");

/// Configuration for the redb client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedbClientConfig {
    /// Path to the database file
    pub db_path: PathBuf,
    /// Cache size in bytes
    pub cache_size: usize,
}

impl Default for RedbClientConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/kestrel.redb"),
            cache_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// redb implementation of [`ConfigClient`]
///
/// Blocking database work runs on tokio's blocking pool. Writes re-check
/// the call context right before committing and abort the transaction if
/// it was cancelled or expired in the meantime.
#[derive(Clone)]
pub struct RedbConfigClient {
    db: Arc<Database>,
    config: RedbClientConfig,
}

impl RedbConfigClient {
    /// Open or create the database
    #[instrument(skip(config), fields(path = %config.db_path.display()))]
    pub fn open(config: RedbClientConfig) -> Result<Self, ClientError> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ClientError::backend(e.to_string()))?;
        }

        let db = Database::builder()
            .set_cache_size(config.cache_size)
            .create(&config.db_path)?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(JOB_CONFIG)?;
        write_txn.commit()?;

        info!("Opened job config database");

        Ok(Self {
            db: Arc::new(db),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &RedbClientConfig {
        &self.config
    }

    /// Number of stored records
    pub fn len(&self) -> Result<u64, ClientError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(JOB_CONFIG)?;
        Ok(table.len()?)
    }

    /// Whether no records are stored
    pub fn is_empty(&self) -> Result<bool, ClientError> {
        Ok(self.len()? == 0)
    }

    /// Store a record as is, replacing any existing one
    ///
    /// Bypasses the create-if-absent contract. Meant for seeding rows
    /// written by older versions, e.g. uncompressed configs.
    pub fn insert_raw(&self, record: &ConfigRecord) -> Result<(), ClientError> {
        let key = record.key().to_bytes();
        let value = postcard::to_allocvec(record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(JOB_CONFIG)?;
            table.insert(key.as_slice(), value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn insert_if_absent(
        db: &Database,
        ctx: &CallContext,
        record: &ConfigRecord,
    ) -> Result<(), ClientError> {
        let key = record.key().to_bytes();
        let value = postcard::to_allocvec(record)?;

        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(JOB_CONFIG)?;
            if table.get(key.as_slice())?.is_some() {
                drop(table);
                write_txn.abort()?;
                return Err(ClientError::AlreadyExists);
            }
            table.insert(key.as_slice(), value.as_slice())?;
        }

        if let Err(e) = ctx.check() {
            write_txn.abort()?;
            return Err(e);
        }
        write_txn.commit()?;
        Ok(())
    }

    fn read(db: &Database, key: &[u8]) -> Result<Option<ConfigRecord>, ClientError> {
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(JOB_CONFIG)?;
        match table.get(key)? {
            Some(value) => Ok(Some(postcard::from_bytes(value.value())?)),
            None => Ok(None),
        }
    }

    fn remove(db: &Database, ctx: &CallContext, key: &[u8]) -> Result<bool, ClientError> {
        let write_txn = db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(JOB_CONFIG)?;
            table.remove(key)?.is_some()
        };

        if let Err(e) = ctx.check() {
            write_txn.abort()?;
            return Err(e);
        }
        write_txn.commit()?;
        Ok(removed)
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, ClientError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, ClientError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| ClientError::backend(format!("blocking task failed: {}", e)))?
    }
}

impl std::fmt::Debug for RedbConfigClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbConfigClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ConfigClient for RedbConfigClient {
    async fn create_if_absent(
        &self,
        ctx: &CallContext,
        record: ConfigRecord,
    ) -> Result<(), ClientError> {
        ctx.check()?;
        let ctx = ctx.clone();
        let key = record.key();

        self.blocking(move |db| Self::insert_if_absent(db, &ctx, &record))
            .await?;
        debug!(key = %key, "Inserted config record");
        Ok(())
    }

    async fn fetch_by_key(
        &self,
        ctx: &CallContext,
        key: &ConfigKey,
    ) -> Result<Option<ConfigRecord>, ClientError> {
        ctx.check()?;
        let key = key.to_bytes();
        self.blocking(move |db| Self::read(db, &key)).await
    }

    async fn delete_by_key(&self, ctx: &CallContext, key: &ConfigKey) -> Result<(), ClientError> {
        ctx.check()?;
        let ctx = ctx.clone();
        let key_bytes = key.to_bytes();

        let removed = self
            .blocking(move |db| Self::remove(db, &ctx, &key_bytes))
            .await?;
        if removed {
            debug!(key = %key, "Deleted config record");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kestrel_core::JobId;
    use tempfile::TempDir;

    fn create_test_client() -> (RedbConfigClient, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = RedbClientConfig {
            db_path: temp_dir.path().join("test.redb"),
            ..Default::default()
        };
        let client = RedbConfigClient::open(config).unwrap();
        (client, temp_dir)
    }

    fn record(job: &str, version: u64, payload: &[u8]) -> ConfigRecord {
        ConfigRecord {
            job_id: JobId::new(job).unwrap(),
            version,
            config: payload.to_vec(),
            config_addon: b"addon".to_vec(),
            creation_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_fetch_delete() {
        let (client, _temp) = create_test_client();
        let ctx = CallContext::background();
        let rec = record("job-1", 0, b"cfg");
        let key = rec.key();

        client.create_if_absent(&ctx, rec.clone()).await.unwrap();
        assert_eq!(client.len().unwrap(), 1);
        assert_eq!(client.fetch_by_key(&ctx, &key).await.unwrap(), Some(rec));

        client.delete_by_key(&ctx, &key).await.unwrap();
        assert!(client.is_empty().unwrap());
        assert!(client.fetch_by_key(&ctx, &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_conflict_keeps_first() {
        let (client, _temp) = create_test_client();
        let ctx = CallContext::background();
        let first = record("job-1", 3, b"first");

        client.create_if_absent(&ctx, first.clone()).await.unwrap();
        let err = client
            .create_if_absent(&ctx, record("job-1", 3, b"second"))
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::AlreadyExists);

        let stored = client.fetch_by_key(&ctx, &first.key()).await.unwrap();
        assert_eq!(stored, Some(first));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let (client, _temp) = create_test_client();
        let ctx = CallContext::background();
        let key = ConfigKey::new(JobId::new("ghost").unwrap(), 1);

        client.delete_by_key(&ctx, &key).await.unwrap();
        client.delete_by_key(&ctx, &key).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_context_is_rejected() {
        let (client, _temp) = create_test_client();
        let ctx = CallContext::background();
        ctx.cancel();
        let rec = record("job-1", 0, b"cfg");
        let key = rec.key();

        assert_eq!(
            client.create_if_absent(&ctx, rec).await.unwrap_err(),
            ClientError::Cancelled
        );
        assert_eq!(
            client.fetch_by_key(&ctx, &key).await.unwrap_err(),
            ClientError::Cancelled
        );
        assert!(client.is_empty().unwrap());
    }

    #[test]
    fn test_cancel_before_commit_aborts_write() {
        let (client, _temp) = create_test_client();
        let ctx = CallContext::background();
        ctx.cancel();

        let err =
            RedbConfigClient::insert_if_absent(&client.db, &ctx, &record("job-1", 0, b"cfg"))
                .unwrap_err();
        assert_eq!(err, ClientError::Cancelled);
        assert!(client.is_empty().unwrap());
    }

    #[test]
    fn test_cancel_before_commit_keeps_record() {
        let (client, _temp) = create_test_client();
        let rec = record("job-1", 0, b"cfg");
        client.insert_raw(&rec).unwrap();

        let ctx = CallContext::background();
        ctx.cancel();
        let err = RedbConfigClient::remove(&client.db, &ctx, &rec.key().to_bytes()).unwrap_err();
        assert_eq!(err, ClientError::Cancelled);
        assert_eq!(client.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = RedbClientConfig {
            db_path: temp_dir.path().join("nested").join("reopen.redb"),
            ..Default::default()
        };
        let rec = record("job-1", 7, b"durable");
        let ctx = CallContext::background();

        {
            let client = RedbConfigClient::open(config.clone()).unwrap();
            client.create_if_absent(&ctx, rec.clone()).await.unwrap();
        }

        let client = RedbConfigClient::open(config).unwrap();
        assert_eq!(client.fetch_by_key(&ctx, &rec.key()).await.unwrap(), Some(rec));
    }

    #[tokio::test]
    async fn test_corrupt_row_is_serialization_error() {
        let (client, _temp) = create_test_client();
        let key = ConfigKey::new(JobId::new("job-1").unwrap(), 0);

        let write_txn = client.db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(JOB_CONFIG).unwrap();
            table
                .insert(key.to_bytes().as_slice(), [0xffu8, 0xff].as_slice())
                .unwrap();
        }
        write_txn.commit().unwrap();

        let err = client
            .fetch_by_key(&CallContext::background(), &key)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Serialization(_)));
    }
}
