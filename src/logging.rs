//! Logging configuration for bindery
//!
//! Structured logging setup with JSON (production) and pretty (development)
//! output formats.
//!
//! # Features
//!
//! - `logging` - emit `tracing` events (default)
//! - `logging-json` - JSON structured output
//! - `logging-pretty` - colorful pretty output
//!
//! # Example
//!
//! ```rust,ignore
//! use bindery::logging;
//!
//! // Default settings (JSON if logging-json, pretty if logging-pretty)
//! logging::init();
//!
//! // Or a custom configuration
//! logging::builder()
//!     .with_level(tracing::Level::TRACE)
//!     .only_bindery()
//!     .init();
//! ```

#[cfg(feature = "logging")]
use tracing::Level;

/// Logging output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default)
    #[default]
    Json,
    /// Pretty colorful output (development)
    Pretty,
    /// Compact single-line output
    Compact,
}

/// Builder for logging configuration
#[cfg(feature = "logging")]
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
}

#[cfg(feature = "logging")]
impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::default(),
            target: None,
        }
    }
}

#[cfg(feature = "logging")]
impl LoggingBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Use JSON output
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use pretty output
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact single-line output
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Only show events from this crate's `bindery` target
    pub fn only_bindery(mut self) -> Self {
        self.target = Some("bindery");
        self
    }

    /// Install the configured subscriber as the global default.
    ///
    /// Does nothing unless a subscriber feature (`logging-pretty` or
    /// `logging-json`) is enabled; with `logging` alone the host application
    /// installs its own subscriber.
    #[allow(unused_variables)]
    pub fn init(self) {
        #[cfg(any(feature = "logging-pretty", feature = "logging-json"))]
        {
            use tracing_subscriber::EnvFilter;

            let filter = match self.target {
                Some(target) => {
                    EnvFilter::new(format!("{target}={level}", level = self.level))
                }
                None => EnvFilter::new(self.level.to_string()),
            };

            let builder = tracing_subscriber::fmt().with_env_filter(filter);

            match self.format {
                #[cfg(feature = "logging-json")]
                LogFormat::Json => builder.json().init(),
                LogFormat::Pretty => builder.pretty().init(),
                LogFormat::Compact => builder.compact().init(),
                #[cfg(not(feature = "logging-json"))]
                LogFormat::Json => builder.init(),
            }
        }
    }
}

/// Initialize logging with default settings
#[cfg(feature = "logging")]
pub fn init() {
    builder().init();
}

/// Initialize with pretty output at DEBUG level
#[cfg(feature = "logging")]
pub fn init_pretty() {
    builder().pretty().init();
}

/// Initialize with JSON output at DEBUG level
#[cfg(feature = "logging")]
pub fn init_json() {
    builder().json().init();
}

/// Start a custom logging configuration
#[cfg(feature = "logging")]
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}
