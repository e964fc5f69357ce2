//! Backing client abstraction
//!
//! The store never talks to a database directly. It goes through a
//! [`ConfigClient`], which only offers key-addressed create, fetch, and
//! delete.

use std::sync::Arc;

use async_trait::async_trait;
use kestrel_core::ConfigKey;

use crate::context::CallContext;
use crate::error::ClientError;
use crate::record::ConfigRecord;

/// Key-addressed storage of config records
///
/// # Contract
///
/// `create_if_absent` must be atomic per key: when several calls race on
/// the same key, exactly one succeeds and every other call returns
/// [`ClientError::AlreadyExists`]. An existing record is never overwritten.
///
/// Implementations honor the [`CallContext`]: a cancelled or expired
/// context fails the call with [`ClientError::Cancelled`] or
/// [`ClientError::DeadlineExceeded`] without applying a write.
#[async_trait]
pub trait ConfigClient: Send + Sync {
    /// Insert a record unless one with the same key exists
    async fn create_if_absent(
        &self,
        ctx: &CallContext,
        record: ConfigRecord,
    ) -> Result<(), ClientError>;

    /// Fetch the record stored under `key`, if any
    async fn fetch_by_key(
        &self,
        ctx: &CallContext,
        key: &ConfigKey,
    ) -> Result<Option<ConfigRecord>, ClientError>;

    /// Delete the record stored under `key`
    ///
    /// Deleting a missing key succeeds.
    async fn delete_by_key(&self, ctx: &CallContext, key: &ConfigKey) -> Result<(), ClientError>;
}

#[async_trait]
impl<C: ConfigClient + ?Sized> ConfigClient for Arc<C> {
    async fn create_if_absent(
        &self,
        ctx: &CallContext,
        record: ConfigRecord,
    ) -> Result<(), ClientError> {
        (**self).create_if_absent(ctx, record).await
    }

    async fn fetch_by_key(
        &self,
        ctx: &CallContext,
        key: &ConfigKey,
    ) -> Result<Option<ConfigRecord>, ClientError> {
        (**self).fetch_by_key(ctx, key).await
    }

    async fn delete_by_key(&self, ctx: &CallContext, key: &ConfigKey) -> Result<(), ClientError> {
        (**self).delete_by_key(ctx, key).await
    }
}
