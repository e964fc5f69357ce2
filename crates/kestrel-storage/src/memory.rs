//! In-memory config client
//!
//! Suitable for testing and simulation environments.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use kestrel_core::ConfigKey;
use tracing::trace;

use crate::client::ConfigClient;
use crate::context::CallContext;
use crate::error::ClientError;
use crate::record::ConfigRecord;

/// In-memory implementation of [`ConfigClient`]
///
/// Uses `DashMap` for concurrent access. The presence check and insert of
/// `create_if_absent` happen under the same shard lock, so racing creates
/// for one key have a single winner.
#[derive(Debug, Default)]
pub struct InMemoryConfigClient {
    records: DashMap<ConfigKey, ConfigRecord>,
}

impl InMemoryConfigClient {
    /// Create a new, empty client
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Store a record as is, replacing any existing one
    ///
    /// Bypasses the create-if-absent contract. Meant for seeding rows
    /// written by older versions, e.g. uncompressed configs.
    pub fn insert_raw(&self, record: ConfigRecord) {
        self.records.insert(record.key(), record);
    }
}

#[async_trait]
impl ConfigClient for InMemoryConfigClient {
    async fn create_if_absent(
        &self,
        ctx: &CallContext,
        record: ConfigRecord,
    ) -> Result<(), ClientError> {
        ctx.check()?;

        match self.records.entry(record.key()) {
            Entry::Occupied(_) => Err(ClientError::AlreadyExists),
            Entry::Vacant(slot) => {
                trace!(key = %slot.key(), "Inserted config record");
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn fetch_by_key(
        &self,
        ctx: &CallContext,
        key: &ConfigKey,
    ) -> Result<Option<ConfigRecord>, ClientError> {
        ctx.check()?;
        Ok(self.records.get(key).map(|r| r.clone()))
    }

    async fn delete_by_key(&self, ctx: &CallContext, key: &ConfigKey) -> Result<(), ClientError> {
        ctx.check()?;
        if self.records.remove(key).is_some() {
            trace!(key = %key, "Deleted config record");
        }
        Ok(())
    }
}
