//! # autodisable
//!
//! Duplicate-submission guard for forms and their controls.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `autodisable` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ## Usage
//!
//! ```
//! # #[cfg(feature = "forms")]
//! # {
//! use std::rc::Rc;
//! use autodisable::forms::prelude::*;
//!
//! autodisable::init(&autodisable::core::AutoDisableConfig::default());
//!
//! let state = Rc::new(FormState::new());
//! let form = ControlNode::builder(ControlDeclaration::new("form"))
//!     .validation(state.clone())
//!     .build()
//!     .unwrap();
//! form.initialize().unwrap();
//! assert!(form.is_locked());
//! # }
//! ```

/// Errors, configuration, and logging.
pub use autodisable_core as core;

/// Single-threaded signals and value watches.
#[cfg(feature = "signals")]
pub use autodisable_signals as signals;

/// Controls, triggers, and form/child propagation.
#[cfg(feature = "forms")]
pub use autodisable_forms as forms;

pub use autodisable_core::{AutoDisableConfig, AutoDisableError, AutoDisableResult, CONFIG};

// Third-party re-exports
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

/// Installs logging from `config` and registers it as the process-wide
/// default.
///
/// Returns `false` if a configuration was already registered; the earlier
/// one stays in effect.
pub fn init(config: &AutoDisableConfig) -> bool {
    autodisable_core::logging::setup_logging(&config.logging);
    match CONFIG.configure(config.clone()) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "keeping existing configuration");
            false
        }
    }
}
