//! Tracing subscriber configuration.
//!
//! Provides [`TracingConfig`], which configures and installs the `tracing`
//! subscriber used by hookwire's structured logging.
//!
//! # Example
//!
//! ```
//! use hookwire_core::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! TracingConfig::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .init();
//!
//! tracing::debug!("subscriber installed");
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line output with fields on their own lines.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// Newline-delimited JSON objects.
    Json,
}

/// Settings for the process-wide `tracing` subscriber.
///
/// Binding runs inside `plan` and `activate` spans carrying the definition
/// name; dispatch logs at `trace` from whichever thread made the call, so
/// thread names are always included.
///
/// ```
/// use hookwire_core::{TracingConfig, TracingFormat};
/// use tracing::Level;
///
/// // Watch a definition being planned and activated.
/// let debugging = TracingConfig::new()
///     .with_level(Level::DEBUG)
///     .with_span_events(true);
///
/// // Machine-readable, engine summaries only.
/// let service = TracingConfig::new()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("warn,hookwire_binding=info");
/// # let _ = (debugging, service);
/// ```
#[derive(Debug, Clone)]
pub struct TracingConfig {
    level: Level,
    format: TracingFormat,
    /// Directives such as `hookwire_interceptor=trace`, overriding `level`.
    directives: Option<String>,
    span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::default(),
            directives: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a configuration logging at `INFO` in the pretty format.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level used when no directives are given.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets how lines are rendered.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets per-target directives in `EnvFilter` syntax.
    ///
    /// Directives that fail to parse are ignored in favor of the level.
    #[must_use]
    pub fn with_env_filter(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// Logs when the binding spans open and close.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the level used when no directives are given.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the render format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    fn filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.as_str());
        self.directives
            .as_deref()
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(fallback)
    }

    /// Installs the subscriber for the whole process.
    ///
    /// Returns `false`, leaving the current subscriber in place, if one was
    /// already installed.
    pub fn init(&self) -> bool {
        let spans = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer()
            .with_thread_names(true)
            .with_span_events(spans);
        let registry = tracing_subscriber::registry().with(self.filter());

        let result = match self.format {
            TracingFormat::Pretty => registry.with(layer.pretty()).try_init(),
            TracingFormat::Compact => registry.with(layer.compact()).try_init(),
            TracingFormat::Json => registry.with(layer.json()).try_init(),
        };
        if result.is_err() {
            return false;
        }

        tracing::info!(level = %self.level, format = ?self.format, "tracing initialized");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_is_the_default_format() {
        assert_eq!(TracingFormat::default(), TracingFormat::Pretty);
    }

    #[test]
    fn defaults_log_info_without_spans() {
        let config = TracingConfig::default();
        assert_eq!(config.level(), Level::INFO);
        assert!(!config.span_events);
    }

    #[test]
    fn builders_set_every_field() {
        let config = TracingConfig::new()
            .with_level(Level::TRACE)
            .with_format(TracingFormat::Json)
            .with_env_filter("hookwire_binding=debug")
            .with_span_events(true);

        assert_eq!(config.level(), Level::TRACE);
        assert_eq!(config.format(), TracingFormat::Json);
        assert_eq!(config.directives.as_deref(), Some("hookwire_binding=debug"));
        assert!(config.span_events);
    }

    #[test]
    fn init_is_idempotent() {
        let config = TracingConfig::new().with_format(TracingFormat::Compact);
        config.init();
        assert!(!config.init());
    }
}
