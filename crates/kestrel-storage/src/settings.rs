//! Store settings, parsed from TOML
//!
//! ```toml
//! compression_level = 9
//! call_timeout_ms = 2000
//!
//! [backend]
//! kind = "redb"
//! db_path = "/var/lib/kestrel/job_config.redb"
//! ```
//!
//! Every field is optional. An empty document yields an in-memory store
//! with the default compression level and no call timeout.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::ConfigClient;
use crate::codec::{DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL};
use crate::context::CallContext;
use crate::error::SettingsError;
use crate::memory::InMemoryConfigClient;
use crate::metrics::StoreMetrics;
use crate::persistent::{RedbClientConfig, RedbConfigClient};
use crate::store::JobConfigStore;

/// Which client backs the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendSettings {
    /// Process-local, lost on exit
    #[default]
    Memory,
    /// Durable redb file
    Redb(RedbClientConfig),
}

/// Top-level store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: BackendSettings,
    /// Gzip level for new configs, 0-9
    pub compression_level: u32,
    /// Deadline applied to contexts from [`StoreSettings::call_context`]
    pub call_timeout_ms: Option<u64>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            call_timeout_ms: None,
        }
    }
}

impl StoreSettings {
    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(SettingsError::Invalid(format!(
                "compression_level must be 0-{}, got {}",
                MAX_COMPRESSION_LEVEL, self.compression_level
            )));
        }
        if self.call_timeout_ms == Some(0) {
            return Err(SettingsError::Invalid(
                "call_timeout_ms must be positive".to_string(),
            ));
        }
        if let BackendSettings::Redb(redb) = &self.backend
            && redb.db_path.as_os_str().is_empty()
        {
            return Err(SettingsError::Invalid("db_path must not be empty".to_string()));
        }
        Ok(())
    }

    /// The configured call timeout
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// A fresh context carrying the configured timeout, if any
    pub fn call_context(&self) -> CallContext {
        match self.call_timeout() {
            Some(timeout) => CallContext::with_timeout(timeout),
            None => CallContext::background(),
        }
    }

    /// Open the configured backend
    pub fn open_client(&self) -> Result<Arc<dyn ConfigClient>, SettingsError> {
        let client: Arc<dyn ConfigClient> = match &self.backend {
            BackendSettings::Memory => Arc::new(InMemoryConfigClient::new()),
            BackendSettings::Redb(config) => Arc::new(RedbConfigClient::open(config.clone())?),
        };
        Ok(client)
    }

    /// Open the configured backend and wrap it in a store
    pub fn open_store<M: StoreMetrics>(
        &self,
        metrics: M,
    ) -> Result<JobConfigStore<Arc<dyn ConfigClient>, M>, SettingsError> {
        self.validate()?;
        let client = self.open_client()?;
        info!(
            backend = ?self.backend,
            compression_level = self.compression_level,
            "Opened job config store"
        );
        Ok(JobConfigStore::with_metrics(client, metrics)
            .with_compression_level(self.compression_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NoopMetrics;
    use crate::store::JobConfigOps;
    use kestrel_core::{ConfigAddOn, JobConfig, JobId};
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = StoreSettings::from_toml_str("").unwrap();
        assert_eq!(settings, StoreSettings::default());
        assert_eq!(settings.backend, BackendSettings::Memory);
        assert_eq!(settings.compression_level, 6);
        assert!(settings.call_timeout().is_none());
    }

    #[test]
    fn test_parse_redb_backend() {
        let settings = StoreSettings::from_toml_str(
            r#"
            compression_level = 9
            call_timeout_ms = 250

            [backend]
            kind = "redb"
            db_path = "/tmp/kestrel/configs.redb"
            "#,
        )
        .unwrap();

        assert_eq!(settings.compression_level, 9);
        assert_eq!(settings.call_timeout(), Some(Duration::from_millis(250)));
        match settings.backend {
            BackendSettings::Redb(redb) => {
                assert_eq!(redb.db_path, Path::new("/tmp/kestrel/configs.redb"));
                assert_eq!(redb.cache_size, RedbClientConfig::default().cache_size);
            }
            other => panic!("expected redb backend, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_out_of_range_level() {
        let err = StoreSettings::from_toml_str("compression_level = 10").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = StoreSettings::from_toml_str("call_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let err = StoreSettings::from_toml_str("[backend]\nkind = \"cassandra\"").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = StoreSettings::load("/nonexistent/kestrel.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kestrel.toml");
        std::fs::write(&path, "compression_level = 1\n").unwrap();

        let settings = StoreSettings::load(&path).unwrap();
        assert_eq!(settings.compression_level, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_context_carries_timeout() {
        let settings = StoreSettings {
            call_timeout_ms: Some(100),
            ..Default::default()
        };
        let ctx = settings.call_context();
        assert!(ctx.deadline().is_some());

        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(ctx.check().is_err());

        assert!(StoreSettings::default().call_context().deadline().is_none());
    }

    #[tokio::test]
    async fn test_open_redb_store() {
        let temp_dir = TempDir::new().unwrap();
        let settings = StoreSettings {
            backend: BackendSettings::Redb(RedbClientConfig {
                db_path: temp_dir.path().join("store.redb"),
                ..Default::default()
            }),
            compression_level: 3,
            call_timeout_ms: None,
        };

        let store = settings.open_store(NoopMetrics).unwrap();
        assert_eq!(store.compression_level(), 3);

        let ctx = settings.call_context();
        let job_id = JobId::new("job-1").unwrap();
        store
            .create(&ctx, &job_id, 0, &JobConfig::new("redb"), &ConfigAddOn::new())
            .await
            .unwrap();
        let (config, _) = store.get(&ctx, &job_id, 0).await.unwrap();
        assert_eq!(config.name, "redb");
    }
}
