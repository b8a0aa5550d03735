//! Log output for programs and tests driving the scraper.
//!
//! The library itself only emits `tracing` events. Whoever embeds it calls
//! [`init_tracing`] once; `RUST_LOG` wins over the configured level.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Targets enabled by the fallback directive.
const CRATE_TARGETS: &[&str] = &["celcat_core", "celcat_providers"];

/// Failure to install the log subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    /// The filter directive does not parse.
    #[error("invalid log filter {directive:?}: {source}")]
    Filter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per event.
    #[default]
    Compact,
    /// Multi-line, for reading scraper runs by eye.
    Pretty,
    /// JSON lines.
    Json,
}

/// Log settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Replaces both `RUST_LOG` and `level` when set.
    pub directive: Option<String>,
    /// Write through the test harness capture instead of stderr.
    pub test_writer: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            directive: None,
            test_writer: false,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = Some(directive.into());
        self
    }

    /// Debug output captured per test.
    pub fn for_tests() -> Self {
        Self {
            level: Level::DEBUG,
            test_writer: true,
            ..Self::default()
        }
    }

    /// `celcat_core=<level>,celcat_providers=<level>`.
    pub fn default_directive(&self) -> String {
        let level = self.level.as_str().to_lowercase();
        CRATE_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Resolves the filter: explicit directive, then `RUST_LOG`, then
    /// [`default_directive`](Self::default_directive).
    pub fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(directive) = &self.directive {
            return parse_filter(directive);
        }
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => parse_filter(&self.default_directive()),
        }
    }
}

fn parse_filter(directive: &str) -> Result<EnvFilter, TracingError> {
    EnvFilter::try_new(directive).map_err(|source| TracingError::Filter {
        directive: directive.to_string(),
        source,
    })
}

/// Installs a global `fmt` subscriber.
///
/// # Errors
///
/// Fails on an invalid directive or when a subscriber is already set.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let writer = if config.test_writer {
        BoxMakeWriter::new(TestWriter::new())
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_writer(writer)
        .with_target(true);

    match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(TracingError::Install)
}
