//! Structured JSONL logging for Kestrel
//!
//! One place to install the global `tracing` subscriber, whether the
//! process is a long-running service or a test binary.
//!
//! # Features
//!
//! - **JSONL Output**: Structured JSON lines format for log aggregation (default)
//! - **Pretty Console**: Human-readable output for development
//! - **Per-target Levels**: `RUST_LOG`-style directives from config
//! - **File Rotation**: Daily/hourly log rotation via tracing-appender
//!
//! # Quick Start
//!
//! ```ignore
//! use kestrel_logging::{KestrelSubscriberBuilder, LogConfig};
//!
//! // JSONL to console
//! let _guard = KestrelSubscriberBuilder::new().init();
//!
//! // Development mode with pretty human-readable output
//! let _guard = KestrelSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```
//!
//! Keep the returned guard alive while logging to a file; dropping it
//! flushes and stops the background writer.

pub mod config;
pub mod error;

pub use config::{ConsoleConfig, FileConfig, JsonlConfig, LogConfig, RotationStrategy};
pub use error::LogError;
pub use tracing_appender::non_blocking::WorkerGuard;

use std::fs::{self, File};

use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{
    self,
    format::{Format, Json, JsonFields},
};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type Base = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Base> + Send + Sync + 'static>;

/// Builder for configuring and initializing the Kestrel logging subscriber
///
/// By default, console output uses JSONL format. Use `LogConfig::development()`
/// for human-readable pretty output during development.
pub struct KestrelSubscriberBuilder {
    config: LogConfig,
}

impl KestrelSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    ///
    /// Default: JSONL output to console
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Initialize the subscriber globally
    ///
    /// Returns a guard that must be kept alive for the duration of the
    /// program when file output is enabled. Setup failures are reported on
    /// stderr and leave logging disabled.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                None
            }
        }
    }

    /// Try to initialize the subscriber globally
    ///
    /// Returns an error if a global subscriber has already been set, a
    /// filter directive does not parse, or the log file cannot be opened.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LogError> {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(self.config.directives())?,
        };

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if let Some(console) = self.console_layer()? {
            layers.push(console);
        }

        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = file_writer(file_config)?;
            guard = Some(file_guard);
            layers.push(json_layer(&self.config.jsonl).with_writer(writer).boxed());
        }

        Registry::default().with(env_filter).with(layers).try_init()?;
        Ok(guard)
    }

    fn console_layer(&self) -> Result<Option<BoxedLayer>, LogError> {
        let console = &self.config.console;
        if !console.enabled {
            return Ok(None);
        }

        let layer: BoxedLayer = if console.pretty {
            let layer = fmt::layer().with_ansi(console.ansi).with_target(true);
            if console.test_writer {
                layer.with_test_writer().boxed()
            } else {
                layer.boxed()
            }
        } else {
            let layer = json_layer(&self.config.jsonl);
            if console.test_writer {
                layer.with_test_writer().boxed()
            } else {
                layer.boxed()
            }
        };

        let layer = match &console.level {
            Some(level) => layer.with_filter(EnvFilter::try_new(level)?).boxed(),
            None => layer,
        };
        Ok(Some(layer))
    }
}

impl Default for KestrelSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn json_layer<S>(jsonl: &JsonlConfig) -> fmt::Layer<S, JsonFields, Format<Json>> {
    fmt::layer()
        .json()
        .with_current_span(jsonl.include_current_span)
        .with_span_list(jsonl.include_spans)
        .flatten_event(jsonl.flatten_events)
        .with_file(jsonl.include_location)
        .with_line_number(jsonl.include_location)
}

// Truncates for Never rotation, appends for the others
fn file_writer(file_config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LogError> {
    fs::create_dir_all(&file_config.directory)?;

    let rotation = match file_config.rotation {
        RotationStrategy::Never => {
            let path = file_config
                .directory
                .join(format!("{}.log", file_config.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file_config.prefix.clone())
        .filename_suffix("log");
    if let Some(max_files) = file_config.max_files {
        builder = builder.max_log_files(max_files);
    }
    Ok(tracing_appender::non_blocking(
        builder.build(&file_config.directory)?,
    ))
}

/// Initialize logging with default settings (JSONL to console)
pub fn init_default() -> Option<WorkerGuard> {
    KestrelSubscriberBuilder::new().init()
}

/// Initialize logging for development (verbose, pretty console output)
pub fn init_development() -> Option<WorkerGuard> {
    KestrelSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
}

/// Initialize logging for testing (minimal output)
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_testing() {
    let _ = KestrelSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}
