//! # autodisable-forms
//!
//! Duplicate-submission guard and lock/busy state propagation for forms and
//! their controls.
//!
//! Each annotated form or control becomes a [`ControlNode`] with two
//! independent flags: *locked* (driven by the form's validation state) and
//! *busy* (driven by an in-flight operation). While a form is busy, repeated
//! submissions are dropped and every control inside the form is disabled.
//!
//! ## Usage
//!
//! ```
//! use std::rc::Rc;
//! use autodisable_forms::prelude::*;
//!
//! let handlers = Rc::new(HandlerRegistry::new());
//! let request = Deferred::new();
//! let pending = request.clone();
//! handlers.register("save", move |_event: &ControlEvent| Ok(Invocation::pending(&pending)));
//!
//! let state = Rc::new(FormState::new());
//! let form = ControlNode::builder(ControlDeclaration::new("form").attr("on-submit", "save()"))
//!     .validation(state.clone())
//!     .handlers(handlers)
//!     .build()
//!     .unwrap();
//! form.initialize().unwrap();
//!
//! let button = ControlNode::builder(ControlDeclaration::new("button").attr("type", "submit"))
//!     .owner(&form)
//!     .build()
//!     .unwrap();
//! button.initialize().unwrap();
//!
//! // Pristine forms are locked, and so is their submit button.
//! assert!(button.is_disabled());
//!
//! state.set_dirty();
//! assert!(!button.is_disabled());
//!
//! // Submitting makes everything busy until the request settles.
//! form.dispatch(&ControlEvent::submit()).unwrap();
//! assert!(button.is_busy());
//! assert!(matches!(form.dispatch(&ControlEvent::submit()).unwrap(), TriggerOutcome::Suppressed));
//!
//! request.resolve(serde_json::json!({"saved": true}));
//!
//! // A successful submission resets the form to pristine, which locks it again.
//! assert!(state.pristine());
//! assert!(!button.is_busy());
//! assert!(button.is_disabled());
//! ```
//!
//! ## Modules
//!
//! - [`control`] - The per-control state machine
//! - [`trigger`] - Event suppression and operation tracking
//! - [`aggregator`] - Validation-driven form locking
//! - [`propagator`] - Form-to-child propagation
//! - [`declaration`] - Control classification from markup
//! - [`options`] - Per-control options
//! - [`handler`] - Handlers and handler resolution
//! - [`operation`] - Asynchronous operations
//! - [`validation`] - Validation state consumed by forms
//! - [`element`] - Element side effects

pub mod aggregator;
pub mod control;
pub mod declaration;
pub mod element;
pub mod handler;
pub mod operation;
pub mod options;
pub mod propagator;
pub mod trigger;
pub mod validation;

pub use aggregator::FormAggregator;
pub use control::{ControlBuilder, ControlNode, ControlSnapshot, FormSignal};
pub use declaration::{ControlDeclaration, ControlKind, TriggerKind};
pub use element::{Element, MemoryElement, CLASS_AUTODISABLE, CLASS_BUSY, CLASS_LOCKED};
pub use handler::{ControlEvent, Handler, HandlerRegistry, HandlerResolver, Invocation};
pub use operation::{Deferred, Operation, OperationHandle, Outcome, Rejection};
pub use options::ControlOptions;
pub use propagator::ChildPropagator;
pub use trigger::{TriggerBinder, TriggerOutcome};
pub use validation::{FormState, ValidationSource, Validity};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::control::{ControlNode, ControlSnapshot};
    pub use crate::declaration::{ControlDeclaration, ControlKind, TriggerKind};
    pub use crate::element::{Element, MemoryElement};
    pub use crate::handler::{ControlEvent, HandlerRegistry, HandlerResolver, Invocation};
    pub use crate::operation::{Deferred, Operation, Rejection};
    pub use crate::options::ControlOptions;
    pub use crate::trigger::TriggerOutcome;
    pub use crate::validation::{FormState, ValidationSource, Validity};
    pub use autodisable_core::{AutoDisableError, AutoDisableResult};
}
