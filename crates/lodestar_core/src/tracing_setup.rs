//! Tracing subscriber setup.
//!
//! The loader logs every module definition, request, alias link and load
//! failure through `tracing`. [`TracingSetup`] installs a subscriber that
//! renders those events; installing twice is harmless, the first subscriber
//! stays in place.
//!
//! # Filtering
//!
//! Without an explicit filter, `RUST_LOG` is honored when set; otherwise
//! everything at or above the configured level is shown. Loader internals
//! live under the `lodestar_loader` and `lodestar_dom` targets:
//!
//! ```
//! use lodestar_core::TracingSetup;
//!
//! TracingSetup::new().with_env_filter("lodestar_loader=debug,lodestar_dom=warn")
//! # ;
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable multi-line output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The configuration a [`TracingSetup`] applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured maximum level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
    /// The filter directives in effect.
    pub filter: String,
    /// Whether this call installed the subscriber. `false` if one was
    /// already installed.
    pub installed: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingSetup
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for the process-wide tracing subscriber.
///
/// # Example
///
/// ```
/// use lodestar_core::{TracingFormat, TracingSetup};
/// use tracing::Level;
///
/// // Development: readable output, loader internals at debug
/// let dev = TracingSetup::new()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);
///
/// // Production: JSON, warnings only outside the loader
/// let prod = TracingSetup::new()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("warn,lodestar_loader=info");
/// # let _ = (dev, prod);
/// ```
#[derive(Debug, Clone)]
pub struct TracingSetup {
    level: Level,
    format: TracingFormat,
    /// Explicit directives, e.g. `"lodestar_loader=debug"`.
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingSetup {
    /// Creates a setup with default settings: `INFO`, pretty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets explicit filter directives (`target=level,...`), overriding
    /// both the level and `RUST_LOG`.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Builds the filter: explicit directives, then `RUST_LOG`, then the level.
    ///
    /// Unparsable explicit directives fall back to the level.
    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(directives) => {
                EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str())),
        }
    }

    /// Installs the subscriber and returns the applied configuration.
    ///
    /// If a global subscriber is already installed it is left alone and
    /// [`TracingConfig::installed`] is `false`.
    pub fn install(&self) -> TracingConfig {
        let filter = self.filter();
        let directives = filter.to_string();

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let registry = tracing_subscriber::registry().with(filter);
        let installed = match self.format {
            TracingFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
        };

        if installed {
            tracing::debug!(
                level = %self.level,
                format = ?self.format,
                filter = %directives,
                "tracing subscriber installed"
            );
        }

        TracingConfig {
            level: self.level,
            format: self.format,
            filter: directives,
            installed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let setup = TracingSetup::default();
        assert_eq!(setup.level, Level::INFO);
        assert_eq!(setup.format, TracingFormat::Pretty);
        assert!(setup.env_filter.is_none());
        assert!(!setup.span_events);
    }

    #[test]
    fn builders() {
        let setup = TracingSetup::new()
            .with_level(Level::TRACE)
            .with_format(TracingFormat::Json)
            .with_env_filter("lodestar_loader=debug")
            .with_span_events(true);
        assert_eq!(setup.level, Level::TRACE);
        assert_eq!(setup.format, TracingFormat::Json);
        assert_eq!(setup.env_filter.as_deref(), Some("lodestar_loader=debug"));
        assert!(setup.span_events);
    }

    #[test]
    fn explicit_directives_win() {
        let setup = TracingSetup::new().with_env_filter("lodestar_loader=debug");
        assert_eq!(setup.filter().to_string(), "lodestar_loader=debug");
    }

    #[test]
    fn unparsable_directives_fall_back_to_the_level() {
        let setup = TracingSetup::new()
            .with_level(Level::WARN)
            .with_env_filter("lodestar_loader=loud");
        assert_eq!(setup.filter().to_string(), "warn");
    }

    #[test]
    fn installing_twice_keeps_the_first_subscriber() {
        TracingSetup::new().with_format(TracingFormat::Compact).install();
        let second = TracingSetup::new().with_format(TracingFormat::Json).install();

        assert!(!second.installed);
        assert_eq!(second.format, TracingFormat::Json);
    }
}
