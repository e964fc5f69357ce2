//! Configuration types for the logging system

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default log level (can be overridden by RUST_LOG)
    pub default_level: String,

    /// Console output configuration
    pub console: ConsoleConfig,

    /// File output configuration
    pub file: Option<FileConfig>,

    /// JSONL output configuration
    pub jsonl: JsonlConfig,

    /// Per-target levels, e.g. `kestrel_storage = "debug"`
    pub targets: BTreeMap<String, String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleConfig::default(),
            file: None,
            jsonl: JsonlConfig::default(),
            targets: BTreeMap::new(),
        }
    }
}

impl LogConfig {
    /// Create a config for development (verbose console output)
    pub fn development() -> Self {
        Self {
            default_level: "debug".to_string(),
            console: ConsoleConfig {
                enabled: true,
                pretty: true,
                ansi: true,
                level: Some("debug".to_string()),
                test_writer: false,
            },
            ..Default::default()
        }
    }

    /// Create a config for production (JSONL file output, daily rotation)
    pub fn production(log_dir: PathBuf) -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleConfig {
                enabled: false,
                ..ConsoleConfig::default()
            },
            file: Some(FileConfig {
                directory: log_dir,
                prefix: "kestrel".to_string(),
                rotation: RotationStrategy::Daily,
                max_files: Some(30),
            }),
            ..Default::default()
        }
    }

    /// Create a config for testing (minimal output, captured by the test harness)
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            console: ConsoleConfig {
                enabled: true,
                pretty: false,
                ansi: false,
                level: Some("warn".to_string()),
                test_writer: true,
            },
            ..Default::default()
        }
    }

    /// Set the level for one target
    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.targets.insert(target.into(), level.into());
        self
    }

    /// Filter directives: the default level followed by per-target levels
    pub fn directives(&self) -> String {
        let mut directives = self.default_level.clone();
        for (target, level) in &self.targets {
            directives.push(',');
            directives.push_str(target);
            directives.push('=');
            directives.push_str(level);
        }
        directives
    }
}

/// Console output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Enable console output
    pub enabled: bool,
    /// Use pretty (human-readable) format
    pub pretty: bool,
    /// Include ANSI colors
    pub ansi: bool,
    /// Level for console output (can be stricter than the global filter)
    pub level: Option<String>,
    /// Write through the test harness so output is captured per test
    pub test_writer: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pretty: false, // JSONL by default
            ansi: false,
            level: None,
            test_writer: false,
        }
    }
}

/// File output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Directory for log files
    pub directory: PathBuf,
    /// File name prefix
    pub prefix: String,
    /// Rotation strategy
    pub rotation: RotationStrategy,
    /// Maximum rotated files to retain
    pub max_files: Option<usize>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: "kestrel".to_string(),
            rotation: RotationStrategy::Daily,
            max_files: Some(7),
        }
    }
}

/// File rotation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Rotate daily
    #[default]
    Daily,
    /// Rotate hourly
    Hourly,
    /// Never rotate (single file, truncated on start)
    Never,
}

/// JSONL formatting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlConfig {
    /// Flatten event fields to root level
    pub flatten_events: bool,
    /// Include span list in events
    pub include_spans: bool,
    /// Include current span details
    pub include_current_span: bool,
    /// Include file/line information
    pub include_location: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            flatten_events: true,
            include_spans: true,
            include_current_span: true,
            include_location: true,
        }
    }
}
