//! Duplicate-submit guard.
//!
//! A [`TriggerBinder`] holds at most one handler per [`TriggerKind`]. When an
//! event fires it is dropped outright if the control is locked or already
//! tracking an operation; otherwise the handler runs and, if it hands back a
//! pending operation, the control becomes busy until that operation settles.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use autodisable_core::AutoDisableResult;

use crate::control::ControlNode;
use crate::declaration::TriggerKind;
use crate::handler::{ControlEvent, Handler, Invocation};
use crate::operation::{Deferred, OperationHandle};

/// What happened to a dispatched event.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// No handler is bound for the event's trigger.
    Unbound,
    /// The control was locked or had an operation pending; the handler did
    /// not run.
    Suppressed,
    /// The handler completed synchronously.
    Completed(Value),
    /// The handler started an operation; the control is busy until the
    /// returned deferred settles.
    Tracking(Deferred),
    /// The handler started an operation while the control was already
    /// tracking another one, so it is not tracked.
    Untracked(OperationHandle),
}

impl TriggerOutcome {
    /// Returns `true` if the handler ran.
    pub const fn ran(&self) -> bool {
        !matches!(self, Self::Unbound | Self::Suppressed)
    }

    /// The tracked operation, if any.
    pub const fn tracked(&self) -> Option<&Deferred> {
        match self {
            Self::Tracking(deferred) => Some(deferred),
            _ => None,
        }
    }
}

struct TriggerBinding {
    trigger: TriggerKind,
    expression: Option<String>,
    handler: Handler,
}

/// The handlers bound on one control.
#[derive(Default)]
pub struct TriggerBinder {
    bindings: RefCell<Vec<TriggerBinding>>,
}

impl fmt::Debug for TriggerBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.bindings
                    .borrow()
                    .iter()
                    .map(|b| (b.trigger, b.expression.clone())),
            )
            .finish()
    }
}

impl TriggerBinder {
    /// Binds `handler`, replacing any earlier binding for `trigger`.
    pub fn bind(&self, trigger: TriggerKind, expression: Option<String>, handler: Handler) {
        tracing::debug!(%trigger, expression = expression.as_deref(), "trigger bound");
        let mut bindings = self.bindings.borrow_mut();
        let binding = TriggerBinding {
            trigger,
            expression,
            handler,
        };
        match bindings.iter_mut().find(|b| b.trigger == trigger) {
            Some(existing) => *existing = binding,
            None => bindings.push(binding),
        }
    }

    /// Removes the binding for `trigger`. Returns `true` if one existed.
    pub fn unbind(&self, trigger: TriggerKind) -> bool {
        let mut bindings = self.bindings.borrow_mut();
        let before = bindings.len();
        bindings.retain(|b| b.trigger != trigger);
        bindings.len() != before
    }

    /// Returns `true` if a handler is bound for `trigger`.
    pub fn is_bound(&self, trigger: TriggerKind) -> bool {
        self.bindings.borrow().iter().any(|b| b.trigger == trigger)
    }

    /// The declared expression bound for `trigger`, if it came from markup.
    pub fn expression(&self, trigger: TriggerKind) -> Option<String> {
        self.bindings
            .borrow()
            .iter()
            .find(|b| b.trigger == trigger)
            .and_then(|b| b.expression.clone())
    }

    fn handler(&self, trigger: TriggerKind) -> Option<Handler> {
        self.bindings
            .borrow()
            .iter()
            .find(|b| b.trigger == trigger)
            .map(|b| Rc::clone(&b.handler))
    }

    /// Runs the handler for `event` against `node`.
    ///
    /// Handler errors are returned unchanged and leave the control's state
    /// as it was before the event.
    pub(crate) fn fire(
        &self,
        node: &ControlNode,
        event: &ControlEvent,
    ) -> AutoDisableResult<TriggerOutcome> {
        let Some(handler) = self.handler(event.trigger) else {
            return Ok(TriggerOutcome::Unbound);
        };

        if node.is_locked() || node.has_pending() {
            tracing::trace!(
                trigger = %event.trigger,
                locked = node.is_locked(),
                pending = node.has_pending(),
                "event suppressed"
            );
            return Ok(TriggerOutcome::Suppressed);
        }

        tracing::trace!(trigger = %event.trigger, "running handler");
        match handler(event)? {
            Invocation::Done(value) => Ok(TriggerOutcome::Completed(value)),
            Invocation::Pending(operation) => {
                match node.busy_lock(Some(Rc::clone(&operation))) {
                    Some(tracked) => Ok(TriggerOutcome::Tracking(tracked)),
                    None => Ok(TriggerOutcome::Untracked(operation)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::declaration::{ControlDeclaration, ATTR_TYPE};

    fn button() -> Rc<ControlNode> {
        ControlNode::builder(ControlDeclaration::new("button").attr(ATTR_TYPE, "submit"))
            .build()
            .unwrap()
    }

    fn counting(hits: &Rc<Cell<u32>>, deferred: Option<Deferred>) -> Handler {
        let hits = Rc::clone(hits);
        Rc::new(move |_: &ControlEvent| -> AutoDisableResult<Invocation> {
            hits.set(hits.get() + 1);
            Ok(match &deferred {
                Some(d) => Invocation::pending(d),
                None => Invocation::Done(Value::from(hits.get())),
            })
        })
    }

    #[test]
    fn test_unbound() {
        let node = button();
        let outcome = node.dispatch(&ControlEvent::click()).unwrap();
        assert!(matches!(outcome, TriggerOutcome::Unbound));
        assert!(!outcome.ran());
    }

    #[test]
    fn test_synchronous_handler() {
        let node = button();
        let hits = Rc::new(Cell::new(0));
        node.bind_handler(TriggerKind::Click, counting(&hits, None))
            .unwrap();

        let outcome = node.dispatch(&ControlEvent::click()).unwrap();
        assert!(matches!(outcome, TriggerOutcome::Completed(ref v) if *v == Value::from(1)));
        assert!(!node.is_busy());
    }

    #[test]
    fn test_suppressed_while_locked() {
        let node = button();
        let hits = Rc::new(Cell::new(0));
        node.bind_handler(TriggerKind::Click, counting(&hits, None))
            .unwrap();
        node.lock();

        let outcome = node.dispatch(&ControlEvent::click()).unwrap();
        assert!(matches!(outcome, TriggerOutcome::Suppressed));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_pending_operation_suppresses_repeats() {
        let node = button();
        let hits = Rc::new(Cell::new(0));
        let op = Deferred::new();
        node.bind_handler(TriggerKind::Click, counting(&hits, Some(op.clone())))
            .unwrap();

        let outcome = node.dispatch(&ControlEvent::click()).unwrap();
        let tracked = outcome.tracked().cloned().unwrap();
        assert!(node.is_busy());

        for _ in 0..3 {
            assert!(matches!(
                node.dispatch(&ControlEvent::click()).unwrap(),
                TriggerOutcome::Suppressed
            ));
        }
        assert_eq!(hits.get(), 1);

        op.resolve(Value::Null);
        assert!(!node.is_busy());
        assert!(!tracked.is_pending());
        assert!(node.dispatch(&ControlEvent::click()).unwrap().ran());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_busy_without_pending_does_not_suppress() {
        let node = button();
        let hits = Rc::new(Cell::new(0));
        let op = Deferred::new();
        node.bind_handler(TriggerKind::Click, counting(&hits, Some(op)))
            .unwrap();
        node.busy_lock(None);

        let outcome = node.dispatch(&ControlEvent::click()).unwrap();
        assert!(matches!(outcome, TriggerOutcome::Tracking(_)));
        assert!(node.has_pending());
    }

    #[test]
    fn test_handler_error_leaves_state_unchanged() {
        let node = button();
        node.bind_handler(
            TriggerKind::Click,
            Rc::new(|_: &ControlEvent| -> AutoDisableResult<Invocation> {
                Err(autodisable_core::AutoDisableError::handler("boom"))
            }),
        )
        .unwrap();

        let before = node.state();
        let err = node.dispatch(&ControlEvent::click()).unwrap_err();
        assert_eq!(err.to_string(), "Handler failed: boom");
        assert_eq!(node.state(), before);
    }

    #[test]
    fn test_rebind_replaces() {
        let binder = TriggerBinder::default();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        binder.bind(TriggerKind::Click, Some("first()".into()), counting(&first, None));
        binder.bind(TriggerKind::Click, Some("second()".into()), counting(&second, None));

        assert_eq!(binder.expression(TriggerKind::Click).as_deref(), Some("second()"));
        assert_eq!(binder.bindings.borrow().len(), 1);

        let handler = binder.handler(TriggerKind::Click).unwrap();
        handler(&ControlEvent::click()).unwrap();
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);

        assert!(binder.unbind(TriggerKind::Click));
        assert!(!binder.is_bound(TriggerKind::Click));
        assert!(!binder.unbind(TriggerKind::Click));
    }

    #[test]
    fn test_event_for_other_trigger_is_unbound() {
        let node = button();
        let hits = Rc::new(Cell::new(0));
        node.bind_handler(TriggerKind::Click, counting(&hits, None))
            .unwrap();
        assert!(matches!(
            node.dispatch(&ControlEvent::submit()).unwrap(),
            TriggerOutcome::Unbound
        ));
    }
}
