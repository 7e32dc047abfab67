//! Core error types for autodisable-rs.
//!
//! [`AutoDisableError`] covers everything that can go wrong while building
//! and driving controls: handler failures, unresolvable handler expressions,
//! malformed options, and configuration problems. Failures of a tracked
//! asynchronous operation are not errors in this sense; they travel through
//! the operation itself.

use thiserror::Error;

/// The primary error type for autodisable-rs.
#[derive(Error, Debug)]
pub enum AutoDisableError {
    // ── Triggers ─────────────────────────────────────────────────────

    /// A bound handler failed while handling an interaction event.
    #[error("Handler failed: {0}")]
    Handler(String),

    /// A declared handler expression could not be resolved to a callable.
    #[error("Unknown handler: {0}")]
    UnknownHandler(String),

    // ── Controls ─────────────────────────────────────────────────────

    /// The options expression attached to a control is malformed.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// `initialize()` was called more than once on the same control.
    #[error("Control has already been initialized")]
    AlreadyInitialized,

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The global configuration registry was configured twice.
    #[error("Configuration has already been set")]
    AlreadyConfigured,

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AutoDisableError {
    /// Shorthand for building a [`AutoDisableError::Handler`] from any message.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

/// A convenience type alias for `Result<T, AutoDisableError>`.
pub type AutoDisableResult<T> = Result<T, AutoDisableError>;
