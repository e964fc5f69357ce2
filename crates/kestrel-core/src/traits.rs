//! Core traits for Kestrel

use chrono::{DateTime, Utc};

/// Time abstraction for testability
///
/// Record creation times come from a [`Clock`] so tests can pin them.
pub trait Clock: Send + Sync {
    /// Get the current UTC datetime
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real clock implementation using system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_utc(&self) -> DateTime<Utc> {
        (**self).now_utc()
    }
}
