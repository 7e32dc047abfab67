//! The per-control state machine.
//!
//! A [`ControlNode`] tracks two independent flags for one form or control:
//!
//! - **locked**: validation-driven disablement (`lock` / `unlock`);
//! - **busy**: disablement while an operation is in flight
//!   (`busy_lock` / `busy_unlock`), with at most one pending operation.
//!
//! Every transition is idempotent and is reflected on the node's [`Element`]
//! through the state classes and, depending on the [`ControlKind`], the
//! disabled attribute:
//!
//! | Kind | locked | busy |
//! |---|---|---|
//! | Form | publishes `disabled` | publishes `busy` and `disabled` |
//! | `SubmitControl` | disabled | disabled |
//! | `PlainControl` | class only, never disabled | disabled |
//!
//! A form publishes its state through a [`FormSignal`]; its children mirror
//! that signal (see [`crate::propagator`]). Nodes are single-threaded and
//! shared through `Rc`; no `RefCell` borrow is held while side effects,
//! signals or collaborators run, so re-entrant transitions are safe.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use autodisable_core::logging::control_span;
use autodisable_core::{AutoDisableConfig, AutoDisableError, AutoDisableResult, CONFIG};
use autodisable_signals::{Watch, WatchHold};
use serde_json::Value;

use crate::aggregator::FormAggregator;
use crate::declaration::{ControlDeclaration, ControlKind, TriggerKind};
use crate::element::{Element, MemoryElement, CLASS_AUTODISABLE, CLASS_BUSY, CLASS_LOCKED};
use crate::handler::{ControlEvent, Handler, HandlerResolver, Invocation};
use crate::operation::{Deferred, OperationHandle, Rejection};
use crate::options::ControlOptions;
use crate::propagator::ChildPropagator;
use crate::trigger::{TriggerBinder, TriggerOutcome};
use crate::validation::ValidationSource;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A form's aggregate state as seen by its children.
///
/// `disabled` is always `locked || busy` of the owning form.
#[derive(Debug, Default)]
pub struct FormSignal {
    disabled: Watch<bool>,
    busy: Watch<bool>,
}

impl FormSignal {
    /// Whether the form is currently disabled (locked or busy).
    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    /// Whether the form currently has an operation in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Watches the `disabled` flag. The receiver runs once immediately.
    pub fn watch_disabled(&self, receiver_id: &str, receiver: impl Fn(bool) + 'static) {
        self.disabled
            .watch(receiver_id, move |disabled: &bool| receiver(*disabled));
    }

    /// Watches the `busy` flag. The receiver runs once immediately.
    pub fn watch_busy(&self, receiver_id: &str, receiver: impl Fn(bool) + 'static) {
        self.busy.watch(receiver_id, move |busy: &bool| receiver(*busy));
    }

    /// Removes a receiver from both flags. Returns `true` if any was removed.
    pub fn unwatch(&self, receiver_id: &str) -> bool {
        let disabled = self.disabled.unwatch(receiver_id);
        let busy = self.busy.unwatch(receiver_id);
        disabled || busy
    }

    /// Number of receivers watching the `busy` flag.
    pub fn watcher_count(&self) -> usize {
        self.busy.watcher_count()
    }

    fn hold(&self) -> (WatchHold<'_, bool>, WatchHold<'_, bool>) {
        (self.busy.hold(), self.disabled.hold())
    }

    fn publish(&self, locked: bool, busy: bool) {
        let _hold = self.hold();
        self.busy.set(busy);
        self.disabled.set(locked || busy);
    }
}

#[derive(Debug, Default)]
struct ControlState {
    locked: bool,
    busy: bool,
    pending: Option<Deferred>,
}

/// A point-in-time view of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSnapshot {
    /// Validation-driven lock.
    pub locked: bool,
    /// Operation-driven busy state.
    pub busy: bool,
    /// Whether an operation is being tracked.
    pub pending: bool,
    /// Forms: the published `disabled` flag. Other controls: the element's
    /// disabled attribute.
    pub disabled: bool,
}

/// The state machine for one form or control.
pub struct ControlNode {
    id: u64,
    this: Weak<Self>,
    kind: ControlKind,
    has_click_trigger: bool,
    has_submit_trigger: bool,
    declaration: ControlDeclaration,
    options: ControlOptions,
    config: AutoDisableConfig,
    element: Rc<dyn Element>,
    owner: Option<Rc<Self>>,
    validation: Option<Rc<dyn ValidationSource>>,
    resolver: Option<Rc<dyn HandlerResolver>>,
    signal: FormSignal,
    triggers: TriggerBinder,
    state: RefCell<ControlState>,
    initialized: Cell<bool>,
    span: tracing::Span,
}

impl fmt::Debug for ControlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("tag", &self.declaration.tag())
            .field("state", &self.state.borrow())
            .field("options", &self.options)
            .field("owner", &self.owner.as_ref().map(|o| o.id))
            .finish_non_exhaustive()
    }
}

impl ControlNode {
    /// Starts building a node for `declaration`.
    pub fn builder(declaration: ControlDeclaration) -> ControlBuilder {
        ControlBuilder::new(declaration)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Installs trigger bindings, then the propagation watch.
    ///
    /// Forms with a submit handler bind `submit`; submit controls with a
    /// click handler bind `click`. Forms then follow their validation source
    /// and other controls follow their owning form.
    pub fn initialize(&self) -> AutoDisableResult<()> {
        if self.initialized.get() {
            return Err(AutoDisableError::AlreadyInitialized);
        }
        let _span = self.span.enter();

        self.element.add_class(CLASS_AUTODISABLE);

        match self.kind {
            ControlKind::Form if self.has_submit_trigger => {
                self.bind_declared(TriggerKind::Submit);
            }
            ControlKind::SubmitControl if self.has_click_trigger => {
                self.bind_declared(TriggerKind::Click);
            }
            _ => {}
        }

        if self.kind.is_form() {
            FormAggregator::install(self);
        } else {
            ChildPropagator::install(self);
        }

        self.initialized.set(true);
        tracing::debug!(state = ?self.state(), "control initialized");
        Ok(())
    }

    /// Returns `true` once [`ControlNode::initialize`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    // ── Lock ─────────────────────────────────────────────────────────

    /// Locks the control. No-op if already locked.
    pub fn lock(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.locked {
                return;
            }
            state.locked = true;
        }
        let _span = self.span.enter();
        tracing::debug!("locked");

        self.element.add_class(CLASS_LOCKED);
        match self.kind {
            ControlKind::Form => self.publish(),
            ControlKind::SubmitControl => self.element.set_disabled(true),
            ControlKind::PlainControl => {
                if !self.is_busy() {
                    self.element.set_disabled(false);
                }
            }
        }
    }

    /// Unlocks the control. No-op if not locked.
    pub fn unlock(&self) {
        {
            let mut state = self.state.borrow_mut();
            if !state.locked {
                return;
            }
            state.locked = false;
        }
        let _span = self.span.enter();
        tracing::debug!("unlocked");

        self.element.remove_class(CLASS_LOCKED);
        if self.kind.is_form() {
            self.publish();
        } else if !self.is_busy() {
            self.element.set_disabled(false);
        }
    }

    // ── Busy ─────────────────────────────────────────────────────────

    /// Marks the control busy, optionally tracking `operation`.
    ///
    /// No-op while another operation is pending. When an operation is given,
    /// the returned [`Deferred`] settles after the control has left the busy
    /// state, with the same value or rejection as `operation`.
    pub fn busy_lock(&self, operation: Option<OperationHandle>) -> Option<Deferred> {
        let tracked = {
            let mut state = self.state.borrow_mut();
            if state.pending.is_some() {
                return None;
            }
            state.busy = true;
            state.pending = operation.as_ref().map(|_| Deferred::new());
            state.pending.clone()
        };
        let _span = self.span.enter();
        tracing::debug!(tracking = tracked.is_some(), "busy");

        self.element.add_class(CLASS_BUSY);
        if self.kind.is_form() {
            self.publish();
        } else {
            self.element.set_disabled(true);
        }

        if let (Some(operation), Some(tracked)) = (operation, &tracked) {
            self.track(&operation, tracked);
        }
        tracked
    }

    /// Leaves the busy state. No-op if not busy.
    ///
    /// On a form, `success` together with the effective `lock_on_complete`
    /// resets the validation source to pristine. Children are notified once,
    /// after the form has settled.
    pub fn busy_unlock(&self, success: bool) {
        if !self.is_busy() {
            return;
        }
        let _span = self.span.enter();
        let _hold = self.signal.hold();

        {
            let mut state = self.state.borrow_mut();
            state.busy = false;
            state.pending = None;
        }
        tracing::debug!(success, "idle");

        self.element.remove_class(CLASS_BUSY);
        match self.kind {
            ControlKind::Form => {
                self.publish();
                if success && self.config.lock_on_complete(self.options.lock_on_complete) {
                    if let Some(validation) = &self.validation {
                        tracing::debug!("resetting form to pristine");
                        validation.set_pristine();
                    }
                }
            }
            ControlKind::SubmitControl => {
                if !self.is_locked() {
                    self.element.set_disabled(false);
                }
            }
            ControlKind::PlainControl => self.element.set_disabled(false),
        }
    }

    // ── Triggers ─────────────────────────────────────────────────────

    /// Delivers an interaction event to the bound handler, if any.
    pub fn dispatch(&self, event: &ControlEvent) -> AutoDisableResult<TriggerOutcome> {
        let _span = self.span.enter();
        self.triggers.fire(self, event)
    }

    /// Binds `handler` to `trigger`, replacing any earlier binding.
    ///
    /// Only `submit` on a form and `click` on a submit control are accepted.
    pub fn bind_handler(&self, trigger: TriggerKind, handler: Handler) -> AutoDisableResult<()> {
        self.check_trigger(trigger)?;
        self.triggers.bind(trigger, None, handler);
        Ok(())
    }

    /// Binds `expression` to `trigger`, replacing any earlier binding.
    ///
    /// The expression is resolved each time the trigger fires, so handlers
    /// registered after binding are found. An expression that does not
    /// resolve makes [`ControlNode::dispatch`] fail with
    /// [`AutoDisableError::UnknownHandler`].
    pub fn bind_expression(&self, trigger: TriggerKind, expression: &str) -> AutoDisableResult<()> {
        self.check_trigger(trigger)?;
        let handler = deferred_handler(self.resolver.clone(), expression.to_string());
        self.triggers
            .bind(trigger, Some(expression.to_string()), handler);
        Ok(())
    }

    /// The trigger bindings installed on this node.
    pub const fn triggers(&self) -> &TriggerBinder {
        &self.triggers
    }

    fn bind_declared(&self, trigger: TriggerKind) {
        if let Some(expression) = self.declaration.handler_expression(trigger) {
            let handler = deferred_handler(self.resolver.clone(), expression.to_string());
            self.triggers
                .bind(trigger, Some(expression.to_string()), handler);
        }
    }

    fn check_trigger(&self, trigger: TriggerKind) -> AutoDisableResult<()> {
        match (self.kind, trigger) {
            (ControlKind::Form, TriggerKind::Submit)
            | (ControlKind::SubmitControl, TriggerKind::Click) => Ok(()),
            (kind, trigger) => Err(AutoDisableError::Configuration(format!(
                "a {kind} control cannot be bound to {trigger}"
            ))),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Process-unique identifier.
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Classification, fixed at construction.
    pub const fn kind(&self) -> ControlKind {
        self.kind
    }

    /// Whether a click handler was declared.
    pub const fn has_click_trigger(&self) -> bool {
        self.has_click_trigger
    }

    /// Whether a submit handler was declared.
    pub const fn has_submit_trigger(&self) -> bool {
        self.has_submit_trigger
    }

    /// The declaration this node was built from.
    pub const fn declaration(&self) -> &ControlDeclaration {
        &self.declaration
    }

    /// Resolved options.
    pub const fn options(&self) -> &ControlOptions {
        &self.options
    }

    /// Configuration this node was built with.
    pub const fn config(&self) -> &AutoDisableConfig {
        &self.config
    }

    /// The element receiving side effects.
    pub fn element(&self) -> &dyn Element {
        self.element.as_ref()
    }

    /// The owning form, for non-form controls.
    pub const fn owner(&self) -> Option<&Rc<Self>> {
        self.owner.as_ref()
    }

    /// The validation source, for forms.
    pub fn validation(&self) -> Option<&Rc<dyn ValidationSource>> {
        self.validation.as_ref()
    }

    /// The aggregate signal this node publishes. Only forms publish to it.
    pub const fn form_signal(&self) -> &FormSignal {
        &self.signal
    }

    /// Whether the control is locked.
    pub fn is_locked(&self) -> bool {
        self.state.borrow().locked
    }

    /// Whether the control is busy.
    pub fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }

    /// Whether an operation is being tracked.
    pub fn has_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    /// The tracked operation, if any.
    pub fn pending(&self) -> Option<Deferred> {
        self.state.borrow().pending.clone()
    }

    /// Whether the control is currently disabled, as seen from outside.
    pub fn is_disabled(&self) -> bool {
        if self.kind.is_form() {
            self.signal.is_disabled()
        } else {
            self.element.is_disabled()
        }
    }

    /// A point-in-time view of the control.
    pub fn state(&self) -> ControlSnapshot {
        let (locked, busy, pending) = {
            let state = self.state.borrow();
            (state.locked, state.busy, state.pending.is_some())
        };
        ControlSnapshot {
            locked,
            busy,
            pending,
            disabled: self.is_disabled(),
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    pub(crate) fn weak(&self) -> Weak<Self> {
        self.this.clone()
    }

    pub(crate) fn receiver_id(&self) -> String {
        format!("autodisable-{}", self.id)
    }

    fn publish(&self) {
        let (locked, busy) = {
            let state = self.state.borrow();
            (state.locked, state.busy)
        };
        self.signal.publish(locked, busy);
    }

    fn is_tracking(&self, tracked: &Deferred) -> bool {
        self.state
            .borrow()
            .pending
            .as_ref()
            .is_some_and(|pending| pending.ptr_eq(tracked))
    }

    fn track(&self, operation: &OperationHandle, tracked: &Deferred) {
        let weak = self.weak();
        let forward = tracked.clone();
        operation.on_success(Box::new(move |value: &Value| {
            if let Some(node) = weak.upgrade() {
                if node.is_tracking(&forward) {
                    node.busy_unlock(true);
                }
            }
            forward.resolve(value.clone());
        }));

        let weak = self.weak();
        let forward = tracked.clone();
        operation.on_failure(Box::new(move |rejection: &Rejection| {
            if let Some(node) = weak.upgrade() {
                if node.is_tracking(&forward) {
                    let _span = node.span.enter();
                    tracing::debug!(%rejection, "tracked operation failed");
                    node.busy_unlock(false);
                }
            }
            forward.reject(rejection.clone());
        }));
    }
}

/// A handler that looks `expression` up through `resolver` on every call.
fn deferred_handler(resolver: Option<Rc<dyn HandlerResolver>>, expression: String) -> Handler {
    Rc::new(move |event: &ControlEvent| -> AutoDisableResult<Invocation> {
        let resolver = resolver
            .as_ref()
            .ok_or_else(|| AutoDisableError::UnknownHandler(expression.clone()))?;
        let handler = resolver.resolve(&expression)?;
        handler(event)
    })
}

impl Drop for ControlNode {
    fn drop(&mut self) {
        let receiver_id = self.receiver_id();
        if let Some(owner) = &self.owner {
            owner.signal.unwatch(&receiver_id);
        }
        if let Some(validation) = &self.validation {
            validation.unwatch(&receiver_id);
        }
    }
}

/// Builder for [`ControlNode`].
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use autodisable_forms::control::ControlNode;
/// use autodisable_forms::declaration::ControlDeclaration;
/// use autodisable_forms::validation::FormState;
///
/// let state = Rc::new(FormState::new());
/// let form = ControlNode::builder(ControlDeclaration::new("form"))
///     .validation(state.clone())
///     .build()
///     .unwrap();
/// form.initialize().unwrap();
///
/// // A pristine form starts locked.
/// assert!(form.is_locked());
/// state.set_dirty();
/// assert!(!form.is_locked());
/// ```
pub struct ControlBuilder {
    declaration: ControlDeclaration,
    element: Option<Rc<dyn Element>>,
    owner: Option<Rc<ControlNode>>,
    validation: Option<Rc<dyn ValidationSource>>,
    resolver: Option<Rc<dyn HandlerResolver>>,
    config: Option<AutoDisableConfig>,
    options: Option<ControlOptions>,
}

impl ControlBuilder {
    fn new(declaration: ControlDeclaration) -> Self {
        Self {
            declaration,
            element: None,
            owner: None,
            validation: None,
            resolver: None,
            config: None,
            options: None,
        }
    }

    /// The element to apply side effects to. Defaults to a [`MemoryElement`].
    #[must_use]
    pub fn element(mut self, element: Rc<dyn Element>) -> Self {
        self.element = Some(element);
        self
    }

    /// The owning form of a non-form control.
    #[must_use]
    pub fn owner(mut self, form: &Rc<ControlNode>) -> Self {
        self.owner = Some(Rc::clone(form));
        self
    }

    /// The validation source of a form.
    #[must_use]
    pub fn validation(mut self, validation: Rc<dyn ValidationSource>) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Resolves declared handler expressions.
    #[must_use]
    pub fn handlers(mut self, resolver: Rc<dyn HandlerResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Configuration for this node. Defaults to the global [`CONFIG`].
    #[must_use]
    pub fn config(mut self, config: AutoDisableConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Options for this node, bypassing the declared options expression.
    #[must_use]
    pub fn options(mut self, options: ControlOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Classifies the declaration, resolves options and creates the node.
    ///
    /// The node is inert until [`ControlNode::initialize`] is called.
    pub fn build(self) -> AutoDisableResult<Rc<ControlNode>> {
        let kind = self.declaration.kind();

        if let Some(owner) = &self.owner {
            if kind.is_form() {
                return Err(AutoDisableError::Configuration(
                    "a form cannot have an owning form".to_string(),
                ));
            }
            if !owner.kind.is_form() {
                return Err(AutoDisableError::Configuration(format!(
                    "owner must be a form, got a {} control",
                    owner.kind
                )));
            }
        }

        let options = match self.options {
            Some(options) => options,
            None => ControlOptions::parse(self.declaration.options_expression())?,
        };
        let config = self.config.unwrap_or_else(|| CONFIG.get().clone());
        let has_click_trigger = self
            .declaration
            .handler_expression(TriggerKind::Click)
            .is_some();
        let has_submit_trigger = self
            .declaration
            .handler_expression(TriggerKind::Submit)
            .is_some();
        let element = self
            .element
            .unwrap_or_else(|| Rc::new(MemoryElement::new()));
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);

        Ok(Rc::new_cyclic(|this| ControlNode {
            id,
            this: this.clone(),
            kind,
            has_click_trigger,
            has_submit_trigger,
            declaration: self.declaration,
            options,
            config,
            element,
            owner: self.owner,
            validation: self.validation,
            resolver: self.resolver,
            signal: FormSignal::default(),
            triggers: TriggerBinder::default(),
            state: RefCell::new(ControlState::default()),
            initialized: Cell::new(false),
            span: control_span(kind.as_str(), id),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ATTR_TYPE;
    use crate::validation::FormState;

    fn form() -> (Rc<ControlNode>, Rc<FormState>) {
        let state = Rc::new(FormState::new());
        let node = ControlNode::builder(ControlDeclaration::new("form"))
            .validation(state.clone())
            .build()
            .unwrap();
        (node, state)
    }

    fn child(form: &Rc<ControlNode>, tag: &str, type_attr: &str) -> Rc<ControlNode> {
        ControlNode::builder(ControlDeclaration::new(tag).attr(ATTR_TYPE, type_attr))
            .owner(form)
            .build()
            .unwrap()
    }

    fn standalone(tag: &str, type_attr: &str) -> Rc<ControlNode> {
        ControlNode::builder(ControlDeclaration::new(tag).attr(ATTR_TYPE, type_attr))
            .build()
            .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let node = standalone("input", "text");
        assert_eq!(
            node.state(),
            ControlSnapshot {
                locked: false,
                busy: false,
                pending: false,
                disabled: false,
            }
        );
        assert!(!node.is_initialized());
        assert!(!node.element().has_class(CLASS_AUTODISABLE));
    }

    #[test]
    fn test_initialize_adds_marker_once() {
        let node = standalone("input", "text");
        node.initialize().unwrap();
        assert!(node.element().has_class(CLASS_AUTODISABLE));
        assert!(matches!(
            node.initialize(),
            Err(AutoDisableError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_lock_idempotent() {
        let node = standalone("button", "submit");
        node.lock();
        let first = node.state();
        node.lock();
        assert_eq!(node.state(), first);
        assert!(first.locked);
        assert!(first.disabled);
        assert!(node.element().has_class(CLASS_LOCKED));
    }

    #[test]
    fn test_unlock_idempotent() {
        let node = standalone("button", "submit");
        node.unlock();
        assert!(!node.is_locked());
        node.lock();
        node.unlock();
        node.unlock();
        assert!(!node.is_locked());
        assert!(!node.is_disabled());
        assert!(!node.element().has_class(CLASS_LOCKED));
    }

    #[test]
    fn test_plain_control_lock_keeps_enabled() {
        let node = standalone("input", "text");
        node.element().set_disabled(true);
        node.lock();
        assert!(node.element().has_class(CLASS_LOCKED));
        assert!(!node.is_disabled());
    }

    #[test]
    fn test_busy_lock_without_operation() {
        let node = standalone("input", "text");
        assert!(node.busy_lock(None).is_none());
        assert!(node.is_busy());
        assert!(!node.has_pending());
        assert!(node.is_disabled());
        assert!(node.element().has_class(CLASS_BUSY));

        node.busy_unlock(false);
        assert!(!node.is_busy());
        assert!(!node.is_disabled());
        assert!(!node.element().has_class(CLASS_BUSY));
    }

    #[test]
    fn test_busy_lock_idempotent_while_pending() {
        let node = standalone("button", "submit");
        let first = Deferred::new();
        let second = Deferred::new();

        let tracked = node.busy_lock(Some(first.handle())).unwrap();
        assert!(node.busy_lock(Some(second.handle())).is_none());
        assert!(node.pending().unwrap().ptr_eq(&tracked));

        // Only the first operation releases the node.
        second.resolve(serde_json::Value::Null);
        assert!(node.is_busy());
        first.resolve(serde_json::Value::Null);
        assert!(!node.is_busy());
        assert!(!tracked.is_pending());
    }

    #[test]
    fn test_busy_unlock_idempotent() {
        let node = standalone("button", "submit");
        node.busy_lock(None);
        node.busy_unlock(true);
        let first = node.state();
        node.busy_unlock(true);
        assert_eq!(node.state(), first);
        assert!(!first.busy);
    }

    #[test]
    fn test_tracked_rejection_is_forwarded() {
        let node = standalone("button", "submit");
        let op = Deferred::new();
        let tracked = node.busy_lock(Some(op.handle())).unwrap();

        op.reject_with("timeout");
        assert!(!node.is_busy());
        assert!(!node.has_pending());
        assert_eq!(
            tracked.outcome().unwrap().unwrap_err().reason,
            "timeout".to_string()
        );
    }

    #[test]
    fn test_already_settled_operation_releases_immediately() {
        let node = standalone("button", "submit");
        let tracked = node
            .busy_lock(Some(Deferred::resolved(serde_json::json!(1)).handle()))
            .unwrap();
        assert!(!node.is_busy());
        assert_eq!(tracked.outcome(), Some(Ok(serde_json::json!(1))));
    }

    #[test]
    fn test_submit_control_stays_disabled_when_unbusy_but_locked() {
        let node = standalone("button", "submit");
        node.busy_lock(None);
        node.lock();
        node.busy_unlock(false);
        assert!(node.is_locked());
        assert!(node.is_disabled());
    }

    #[test]
    fn test_unlock_while_busy_keeps_disabled() {
        let node = standalone("input", "submit");
        node.lock();
        node.busy_lock(None);
        node.unlock();
        assert!(node.is_disabled());
        node.busy_unlock(false);
        assert!(!node.is_disabled());
    }

    #[test]
    fn test_form_publishes_locked_or_busy() {
        let (form, _state) = form();
        let signal = form.form_signal();
        assert!(!signal.is_disabled());

        form.lock();
        assert!(signal.is_disabled());
        assert!(!signal.is_busy());

        form.busy_lock(None);
        form.unlock();
        assert!(signal.is_disabled());
        assert!(signal.is_busy());

        form.busy_unlock(false);
        assert!(!signal.is_disabled());
        assert!(!signal.is_busy());
    }

    #[test]
    fn test_form_success_resets_pristine() {
        let (form, state) = form();
        form.initialize().unwrap();
        state.set_dirty();
        assert!(!form.is_locked());

        let op = Deferred::new();
        form.busy_lock(Some(op.handle()));
        op.resolve(serde_json::Value::Null);

        assert!(state.pristine());
        assert!(form.is_locked());
    }

    #[test]
    fn test_form_lock_on_complete_instance_override() {
        let state = Rc::new(FormState::new());
        let form = ControlNode::builder(
            ControlDeclaration::new("form").attr("autodisable", r#"{"lockOnComplete": false}"#),
        )
        .validation(state.clone())
        .build()
        .unwrap();
        form.initialize().unwrap();
        state.set_dirty();

        form.busy_lock(None);
        form.busy_unlock(true);
        assert!(!state.pristine());
        assert!(!form.is_locked());
    }

    #[test]
    fn test_form_lock_on_complete_config() {
        let state = Rc::new(FormState::new());
        let form = ControlNode::builder(ControlDeclaration::new("form"))
            .validation(state.clone())
            .config(AutoDisableConfig {
                lock_on_complete: false,
                ..AutoDisableConfig::default()
            })
            .build()
            .unwrap();
        form.initialize().unwrap();
        state.set_dirty();

        form.busy_lock(None);
        form.busy_unlock(true);
        assert!(!state.pristine());
    }

    #[test]
    fn test_builder_rejects_form_owner_mismatch() {
        let (form, _state) = form();
        let input = child(&form, "input", "text");

        let err = ControlNode::builder(ControlDeclaration::new("input"))
            .owner(&input)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("owner must be a form"));

        let err = ControlNode::builder(ControlDeclaration::new("form"))
            .owner(&form)
            .build()
            .unwrap_err();
        assert!(matches!(err, AutoDisableError::Configuration(_)));
    }

    #[test]
    fn test_builder_rejects_bad_options() {
        let err = ControlNode::builder(ControlDeclaration::new("form").attr("autodisable", "{oops"))
            .build()
            .unwrap_err();
        assert!(matches!(err, AutoDisableError::InvalidOptions(_)));
    }

    #[test]
    fn test_bind_handler_kind_check() {
        let input = standalone("input", "text");
        let handler: Handler =
            Rc::new(|_: &ControlEvent| -> AutoDisableResult<Invocation> {
                Ok(Invocation::Done(Value::Null))
            });
        assert!(input.bind_handler(TriggerKind::Click, Rc::clone(&handler)).is_err());

        let button = standalone("button", "submit");
        assert!(button.bind_handler(TriggerKind::Submit, Rc::clone(&handler)).is_err());
        assert!(button.bind_handler(TriggerKind::Click, handler).is_ok());
        assert!(button.triggers().is_bound(TriggerKind::Click));
    }

    #[test]
    fn test_drop_child_unwatches_form() {
        let (form, _state) = form();
        form.initialize().unwrap();
        let input = child(&form, "input", "text");
        input.initialize().unwrap();
        assert_eq!(form.form_signal().watcher_count(), 1);

        drop(input);
        assert_eq!(form.form_signal().watcher_count(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = standalone("input", "text");
        let b = standalone("input", "text");
        assert_ne!(a.id(), b.id());
        assert_ne!(a.receiver_id(), b.receiver_id());
    }
}
