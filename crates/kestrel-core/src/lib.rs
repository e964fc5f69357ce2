//! # Kestrel Core
//!
//! Core types shared by the Kestrel job configuration crates.
//!
//! ## Key Types
//!
//! - [`JobId`]: Validated identifier of the workload that owns a configuration
//! - [`ConfigKey`]: Composite `(job id, version)` key addressing one record
//! - [`JobConfig`] / [`ConfigAddOn`]: The two payload shapes persisted per version
//! - [`PodEvent`] / [`TaskEvent`]: Lifecycle events of the two scheduler APIs
//! - [`Clock`]: Time abstraction for testability

pub mod error;
pub mod event;
pub mod identity;
pub mod job;
pub mod traits;

// Re-export main types
pub use error::*;
pub use event::*;
pub use identity::*;
pub use job::*;
pub use traits::*;
