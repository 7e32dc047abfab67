//! Logging integration for autodisable-rs.
//!
//! Provides a helper for configuring [`tracing`]-based logging from
//! [`LoggingConfig`] and for creating per-control spans.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs a global subscriber for `config`.
///
/// Debug mode writes pretty multi-line events with source locations;
/// otherwise each event is one JSON line carrying its control span. If the
/// host already installed a subscriber this does nothing.
pub fn setup_logging(config: &LoggingConfig) {
    let output = if config.debug {
        fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer().json().with_current_span(true).boxed()
    };

    let installed = tracing_subscriber::registry()
        .with(output)
        .with(level_filter(&config.level))
        .try_init()
        .is_ok();
    if !installed {
        tracing::debug!("keeping the existing global subscriber");
    }
}

/// Parses `level` as an `EnvFilter` directive, falling back to `info`.
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|e| {
        eprintln!("autodisable: ignoring log level {level:?}: {e}");
        EnvFilter::new("info")
    })
}

/// Creates a tracing span for a single control.
///
/// # Examples
///
/// ```
/// use autodisable_core::logging::control_span;
///
/// let span = control_span("form", 7);
/// let _guard = span.enter();
/// tracing::debug!("locked");
/// ```
pub fn control_span(kind: &str, id: u64) -> tracing::Span {
    tracing::debug_span!("control", kind, id)
}
