//! # Kestrel Storage
//!
//! Versioned, immutable job configuration storage.
//!
//! Each `(job id, version)` pair maps to one record holding the job's
//! configuration and its system add-on. Configurations are gzip compressed
//! on write; records written before compression existed are still read.
//!
//! ## Features
//!
//! - **JobConfigOps / JobConfigStore**: create, get, and delete by version
//! - **ConfigClient trait**: key-addressed backing storage
//! - **InMemoryConfigClient**: DashMap-backed client for testing/simulation
//! - **RedbConfigClient**: durable client for production
//! - **CallContext**: cancellation and deadlines for every call
//! - **StoreMetrics**: per-operation success/failure counters
//! - **StoreSettings**: TOML configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use kestrel_core::{ConfigAddOn, JobConfig, JobId};
//! use kestrel_storage::{CallContext, InMemoryConfigClient, JobConfigOps, JobConfigStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = JobConfigStore::new(InMemoryConfigClient::new());
//!     let ctx = CallContext::background();
//!     let job_id = JobId::new("job-1").unwrap();
//!
//!     store
//!         .create(&ctx, &job_id, 0, &JobConfig::new("batch-A"), &ConfigAddOn::new())
//!         .await
//!         .unwrap();
//!
//!     let (config, _addon) = store.get(&ctx, &job_id, 0).await.unwrap();
//!     assert_eq!(config.name, "batch-A");
//!
//!     store.delete(&ctx, &job_id, 0).await.unwrap();
//! }
//! ```

pub mod client;
pub mod codec;
pub mod context;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod persistent;
pub mod record;
pub mod settings;
pub mod store;

// Re-exports
pub use client::ConfigClient;
pub use codec::DecodeOutcome;
pub use context::CallContext;
pub use error::{ClientError, CodecError, ConfigStoreError, Payload, SettingsError};
pub use memory::InMemoryConfigClient;
pub use metrics::{CounterMetrics, MetricsSnapshot, NoopMetrics, Outcome, StoreMetrics, StoreOp};
pub use persistent::{RedbClientConfig, RedbConfigClient};
pub use record::ConfigRecord;
pub use settings::{BackendSettings, StoreSettings};
pub use store::{JobConfigOps, JobConfigStore};
