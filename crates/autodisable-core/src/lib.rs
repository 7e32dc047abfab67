//! # autodisable-core
//!
//! Core types shared by the autodisable-rs crates: the error taxonomy, the
//! process-wide configuration registry, and tracing-based logging setup.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`config`] - Default configuration and the global [`CONFIG`] registry
//! - [`config_loader`] - Loading configuration from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod config;
pub mod config_loader;
pub mod error;
pub mod logging;

// Re-export the most commonly used types at the crate root.
pub use config::{AutoDisableConfig, LoggingConfig, CONFIG};
pub use error::{AutoDisableError, AutoDisableResult};
