//! Job configuration payloads
//!
//! Every configuration version persists two payloads: the [`JobConfig`]
//! itself and a small [`ConfigAddOn`] carrying system metadata.

use serde::{Deserialize, Serialize};

/// A key/value label attached to a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    /// Create a new label
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Kind of workload a job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum JobType {
    /// Run-to-completion tasks
    #[default]
    Batch,
    /// Long-running tasks
    Service,
}

/// Per-instance resource request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourceConfig {
    pub cpu_limit: f64,
    pub mem_limit_mb: f64,
    pub disk_limit_mb: f64,
    pub gpu_limit: f64,
}

/// Scheduling guarantees for a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SlaConfig {
    pub priority: u32,
    pub preemptible: bool,
    /// Upper bound on concurrently running instances (0 = unbounded)
    pub max_running_instances: u32,
}

/// Configuration of a job at one version
///
/// `name` must stay the first field: the encoded form then starts with a
/// string length followed by UTF-8, which can never look like gzip framing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobConfig {
    pub name: String,
    pub owning_team: String,
    pub description: String,
    pub job_type: JobType,
    pub instance_count: u32,
    pub labels: Vec<Label>,
    pub default_resources: ResourceConfig,
    pub sla: SlaConfig,
}

impl JobConfig {
    /// Create a config with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the owning team
    pub fn with_owning_team(mut self, team: impl Into<String>) -> Self {
        self.owning_team = team.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the job type
    pub fn with_job_type(mut self, job_type: JobType) -> Self {
        self.job_type = job_type;
        self
    }

    /// Set the instance count
    pub fn with_instance_count(mut self, count: u32) -> Self {
        self.instance_count = count;
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push(Label::new(key, value));
        self
    }

    /// Set the default per-instance resources
    pub fn with_resources(mut self, resources: ResourceConfig) -> Self {
        self.default_resources = resources;
        self
    }

    /// Set the SLA
    pub fn with_sla(mut self, sla: SlaConfig) -> Self {
        self.sla = sla;
        self
    }
}

/// System metadata stored next to a job configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigAddOn {
    pub system_labels: Vec<Label>,
}

impl ConfigAddOn {
    /// Create an empty add-on
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system label
    pub fn with_system_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.system_labels.push(Label::new(key, value));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_config_builder() {
        let config = JobConfig::new("batch-A")
            .with_owning_team("infra")
            .with_job_type(JobType::Service)
            .with_instance_count(3)
            .with_label("tier", "gold");

        assert_eq!(config.name, "batch-A");
        assert_eq!(config.owning_team, "infra");
        assert_eq!(config.job_type, JobType::Service);
        assert_eq!(config.instance_count, 3);
        assert_eq!(config.labels, vec![Label::new("tier", "gold")]);
    }

    #[test]
    fn test_encoded_config_never_starts_with_gzip_magic() {
        // 31 is the gzip magic's first byte; 0x8b can never start a UTF-8 char
        let name: String = "\u{8b}".repeat(15) + "x";
        assert_eq!(name.len(), 31);

        let bytes = postcard::to_allocvec(&JobConfig::new(name)).unwrap();
        assert_eq!(bytes[0], 0x1f);
        assert_ne!(bytes[1], 0x8b);
    }

    #[test]
    fn test_add_on_defaults_empty() {
        let addon = ConfigAddOn::new();
        assert!(addon.system_labels.is_empty());

        let addon = addon.with_system_label("owner", "system");
        assert_eq!(addon.system_labels.len(), 1);
    }
}
