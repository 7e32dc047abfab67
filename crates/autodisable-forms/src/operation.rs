//! Asynchronous operations.
//!
//! A handler that starts background work hands back an [`OperationHandle`]:
//! anything implementing [`Operation`], i.e. something that accepts success,
//! failure and settle continuations. Controls only register continuations;
//! they never start, retry or cancel the work.
//!
//! [`Deferred`] is the built-in implementation: a settle-once cell whose
//! continuations run synchronously, in registration order, on the thread
//! that settles it. Continuations registered after settlement run
//! immediately.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

/// Why an operation failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("operation rejected: {reason}")]
pub struct Rejection {
    /// Human-readable reason.
    pub reason: String,
    /// Structured detail, `Value::Null` when there is none.
    pub detail: Value,
}

impl Rejection {
    /// Creates a rejection with no detail.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            detail: Value::Null,
        }
    }

    /// Attaches structured detail.
    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

/// The settled result of an operation.
pub type Outcome = Result<Value, Rejection>;

/// Continuation run when an operation succeeds.
pub type SuccessContinuation = Box<dyn FnOnce(&Value)>;

/// Continuation run when an operation fails.
pub type FailureContinuation = Box<dyn FnOnce(&Rejection)>;

/// Continuation run when an operation settles either way.
pub type SettleContinuation = Box<dyn FnOnce()>;

/// The capability a tracked operation must offer.
pub trait Operation {
    /// Registers a continuation for successful settlement.
    fn on_success(&self, continuation: SuccessContinuation);

    /// Registers a continuation for failed settlement.
    fn on_failure(&self, continuation: FailureContinuation);

    /// Registers a continuation for settlement of either kind.
    fn on_settle(&self, continuation: SettleContinuation);
}

/// A shared handle to an operation.
pub type OperationHandle = Rc<dyn Operation>;

impl fmt::Debug for dyn Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Operation")
    }
}

enum Continuation {
    Success(SuccessContinuation),
    Failure(FailureContinuation),
    Settle(SettleContinuation),
}

impl Continuation {
    fn run(self, outcome: &Outcome) {
        match (self, outcome) {
            (Self::Success(f), Ok(value)) => f(value),
            (Self::Failure(f), Err(rejection)) => f(rejection),
            (Self::Settle(f), _) => f(),
            _ => {}
        }
    }
}

enum DeferredState {
    Pending(Vec<Continuation>),
    Settled(Outcome),
}

/// A settle-once operation.
///
/// Clones share the same state, so one clone can be handed to a control
/// while another is kept to settle it later.
///
/// # Examples
///
/// ```
/// use autodisable_forms::operation::{Deferred, Operation};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let deferred = Deferred::new();
/// let done = Rc::new(Cell::new(false));
/// let flag = Rc::clone(&done);
/// deferred.on_settle(Box::new(move || flag.set(true)));
///
/// assert!(deferred.resolve(serde_json::json!({"id": 1})));
/// assert!(done.get());
/// assert!(!deferred.reject_with("too late"));
/// ```
#[derive(Clone)]
pub struct Deferred {
    inner: Rc<RefCell<DeferredState>>,
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner.borrow() {
            DeferredState::Pending(continuations) => f
                .debug_struct("Deferred")
                .field("state", &"pending")
                .field("continuations", &continuations.len())
                .finish(),
            DeferredState::Settled(outcome) => f
                .debug_struct("Deferred")
                .field("state", &"settled")
                .field("outcome", outcome)
                .finish(),
        }
    }
}

impl Deferred {
    /// Creates a pending operation.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(DeferredState::Pending(Vec::new()))),
        }
    }

    /// Creates an operation that has already succeeded.
    pub fn resolved(value: Value) -> Self {
        let deferred = Self::new();
        deferred.resolve(value);
        deferred
    }

    /// Creates an operation that has already failed.
    pub fn rejected(rejection: Rejection) -> Self {
        let deferred = Self::new();
        deferred.reject(rejection);
        deferred
    }

    /// Returns this operation as a shareable handle.
    pub fn handle(&self) -> OperationHandle {
        Rc::new(self.clone())
    }

    /// Returns `true` until the operation settles.
    pub fn is_pending(&self) -> bool {
        matches!(&*self.inner.borrow(), DeferredState::Pending(_))
    }

    /// Returns the outcome once settled.
    pub fn outcome(&self) -> Option<Outcome> {
        match &*self.inner.borrow() {
            DeferredState::Pending(_) => None,
            DeferredState::Settled(outcome) => Some(outcome.clone()),
        }
    }

    /// Returns `true` if both handles share the same state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Settles successfully. Returns `false` if already settled.
    pub fn resolve(&self, value: Value) -> bool {
        self.settle(Ok(value))
    }

    /// Settles as a failure. Returns `false` if already settled.
    pub fn reject(&self, rejection: Rejection) -> bool {
        self.settle(Err(rejection))
    }

    /// Shorthand for rejecting with a reason and no detail.
    pub fn reject_with(&self, reason: impl Into<String>) -> bool {
        self.reject(Rejection::new(reason))
    }

    /// Settles with `outcome`, running pending continuations in order.
    /// Returns `false` (and changes nothing) if already settled.
    pub fn settle(&self, outcome: Outcome) -> bool {
        let continuations = {
            let mut state = self.inner.borrow_mut();
            if matches!(&*state, DeferredState::Settled(_)) {
                tracing::warn!("ignoring settlement of an already settled operation");
                return false;
            }
            match std::mem::replace(&mut *state, DeferredState::Settled(outcome.clone())) {
                DeferredState::Pending(continuations) => continuations,
                DeferredState::Settled(_) => Vec::new(),
            }
        };

        for continuation in continuations {
            continuation.run(&outcome);
        }
        true
    }

    fn register(&self, continuation: Continuation) {
        let outcome = {
            let mut state = self.inner.borrow_mut();
            match &mut *state {
                DeferredState::Pending(continuations) => {
                    continuations.push(continuation);
                    return;
                }
                DeferredState::Settled(outcome) => outcome.clone(),
            }
        };
        continuation.run(&outcome);
    }
}

impl Operation for Deferred {
    fn on_success(&self, continuation: SuccessContinuation) {
        self.register(Continuation::Success(continuation));
    }

    fn on_failure(&self, continuation: FailureContinuation) {
        self.register(Continuation::Failure(continuation));
    }

    fn on_settle(&self, continuation: SettleContinuation) {
        self.register(Continuation::Settle(continuation));
    }
}

#[cfg(feature = "tokio")]
impl Deferred {
    /// Runs `future` on the current [`tokio::task::LocalSet`] and settles the
    /// returned operation with its output.
    ///
    /// # Panics
    ///
    /// Panics if called outside a `LocalSet`, as [`tokio::task::spawn_local`] does.
    pub fn spawn_local<F>(future: F) -> Self
    where
        F: std::future::Future<Output = Outcome> + 'static,
    {
        let deferred = Self::new();
        let settle = deferred.clone();
        tokio::task::spawn_local(async move {
            settle.settle(future.await);
        });
        deferred
    }
}
