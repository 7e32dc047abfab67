//! Handlers and handler resolution.
//!
//! Markup declares a handler as an expression (`page.save()`); a
//! [`HandlerResolver`] turns that expression into a callable [`Handler`].
//! [`HandlerRegistry`] is a name-based resolver for hosts that register
//! their handlers up front.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use autodisable_core::{AutoDisableError, AutoDisableResult};

use crate::declaration::TriggerKind;
use crate::operation::{Deferred, OperationHandle};

/// The event passed to a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlEvent {
    /// Which interaction fired.
    pub trigger: TriggerKind,
    /// Host-supplied event data.
    pub payload: Value,
}

impl ControlEvent {
    /// A submit event without payload.
    pub const fn submit() -> Self {
        Self {
            trigger: TriggerKind::Submit,
            payload: Value::Null,
        }
    }

    /// A click event without payload.
    pub const fn click() -> Self {
        Self {
            trigger: TriggerKind::Click,
            payload: Value::Null,
        }
    }

    /// Attaches a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// What a handler produced.
pub enum Invocation {
    /// Synchronous completion with a value.
    Done(Value),
    /// An operation still in flight; the control becomes busy until it settles.
    Pending(OperationHandle),
}

impl Invocation {
    /// Wraps a [`Deferred`] as a pending invocation.
    pub fn pending(deferred: &Deferred) -> Self {
        Self::Pending(deferred.handle())
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done(value) => f.debug_tuple("Done").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<Deferred> for Invocation {
    fn from(deferred: Deferred) -> Self {
        Self::Pending(Rc::new(deferred))
    }
}

/// A resolved handler. Errors it returns reach the dispatcher unchanged.
pub type Handler = Rc<dyn Fn(&ControlEvent) -> AutoDisableResult<Invocation>>;

/// Turns a declared handler expression into a callable.
pub trait HandlerResolver {
    /// Resolves `expression`, or fails with [`AutoDisableError::UnknownHandler`].
    fn resolve(&self, expression: &str) -> AutoDisableResult<Handler>;
}

/// Name-based handler resolution.
///
/// Expressions resolve by their call target: `save`, `save()` and
/// `save($event)` all resolve to a handler registered as `save`. A dotted
/// target such as `page.save()` resolves to `page.save` if registered, and
/// falls back to the last segment (`save`) otherwise.
///
/// # Examples
///
/// ```
/// use autodisable_forms::handler::{ControlEvent, HandlerRegistry, HandlerResolver, Invocation};
///
/// let registry = HandlerRegistry::new();
/// registry.register("save", |_event: &ControlEvent| Ok(Invocation::Done(serde_json::Value::Null)));
///
/// let handler = registry.resolve("page.save($event)").unwrap();
/// assert!(matches!(handler(&ControlEvent::submit()).unwrap(), Invocation::Done(_)));
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RefCell<HashMap<String, Handler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.handlers.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a handler under `name`.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&ControlEvent) -> AutoDisableResult<Invocation> + 'static,
    ) {
        self.handlers
            .borrow_mut()
            .insert(name.into(), Rc::new(handler));
    }

    /// Removes a handler. Returns `true` if it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.handlers.borrow_mut().remove(name).is_some()
    }

    /// Returns `true` if a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.borrow().contains_key(name)
    }
}

impl HandlerResolver for HandlerRegistry {
    fn resolve(&self, expression: &str) -> AutoDisableResult<Handler> {
        let target = call_target(expression);
        let handlers = self.handlers.borrow();

        handlers
            .get(target)
            .or_else(|| {
                target
                    .rsplit_once('.')
                    .and_then(|(_, last)| handlers.get(last))
            })
            .map(Rc::clone)
            .ok_or_else(|| AutoDisableError::UnknownHandler(expression.to_string()))
    }
}

/// Strips the argument list from a call expression: `a.b(x)` -> `a.b`.
fn call_target(expression: &str) -> &str {
    let expression = expression.trim();
    expression
        .split_once('(')
        .map_or(expression, |(target, _)| target)
        .trim()
}
