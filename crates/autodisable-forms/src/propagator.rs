//! Form-to-child propagation.
//!
//! Every non-form control with an owning form mirrors that form's
//! [`FormSignal`]:
//!
//! - form busy: the child is busy (without tracking an operation);
//! - form not busy: the child leaves the busy state;
//! - form disabled and not busy: the child is locked, otherwise unlocked.
//!
//! The lock rule is re-applied after every busy change, so a child ends in
//! the state matching the form's settled flags regardless of which flag
//! changed last.

use std::rc::{Rc, Weak};

use crate::control::{ControlNode, FormSignal};

/// Installs and applies the propagation rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildPropagator;

impl ChildPropagator {
    /// Mirrors the busy flag of `signal` onto `child`.
    pub fn apply_busy(child: &ControlNode, signal: &FormSignal) {
        if signal.is_busy() {
            child.busy_lock(None);
        } else {
            child.busy_unlock(false);
        }
    }

    /// Mirrors the lock rule of `signal` onto `child`.
    pub fn apply_lock(child: &ControlNode, signal: &FormSignal) {
        if signal.is_disabled() && !signal.is_busy() {
            child.lock();
        } else {
            child.unlock();
        }
    }

    /// Watches the owning form of `child`. Controls without a form stay under
    /// manual control.
    pub(crate) fn install(child: &ControlNode) {
        let Some(form) = child.owner() else {
            tracing::debug!("control has no owning form");
            return;
        };

        let receiver_id = child.receiver_id();
        let signal = form.form_signal();

        let (child_ref, form_ref) = (child.weak(), Rc::downgrade(form));
        signal.watch_busy(&receiver_id, move |_| {
            with_pair(&child_ref, &form_ref, |child, signal| {
                Self::apply_busy(child, signal);
                Self::apply_lock(child, signal);
            });
        });

        let (child_ref, form_ref) = (child.weak(), Rc::downgrade(form));
        signal.watch_disabled(&receiver_id, move |_| {
            with_pair(&child_ref, &form_ref, Self::apply_lock);
        });
    }
}

fn with_pair(
    child: &Weak<ControlNode>,
    form: &Weak<ControlNode>,
    apply: impl FnOnce(&ControlNode, &FormSignal),
) {
    if let (Some(child), Some(form)) = (child.upgrade(), form.upgrade()) {
        apply(&child, form.form_signal());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::declaration::{ControlDeclaration, ATTR_TYPE};
    use crate::validation::FormState;

    fn form() -> (Rc<ControlNode>, Rc<FormState>) {
        let state = Rc::new(FormState::new());
        let node = ControlNode::builder(ControlDeclaration::new("form"))
            .validation(state.clone())
            .build()
            .unwrap();
        node.initialize().unwrap();
        (node, state)
    }

    fn child(form: &Rc<ControlNode>, tag: &str, type_attr: &str) -> Rc<ControlNode> {
        let node = ControlNode::builder(ControlDeclaration::new(tag).attr(ATTR_TYPE, type_attr))
            .owner(form)
            .build()
            .unwrap();
        node.initialize().unwrap();
        node
    }

    #[test]
    fn test_child_starts_from_form_state() {
        let (form, _state) = form();
        let button = child(&form, "button", "submit");
        let input = child(&form, "input", "text");

        assert!(button.is_locked());
        assert!(button.is_disabled());
        assert!(input.is_locked());
        assert!(!input.is_disabled());
    }

    #[test]
    fn test_form_busy_makes_children_busy() {
        let (form, state) = form();
        state.set_dirty();
        let input = child(&form, "input", "text");

        form.busy_lock(None);
        assert!(input.is_busy());
        assert!(!input.has_pending());
        assert!(!input.is_locked());
        assert!(input.is_disabled());

        form.busy_unlock(false);
        assert!(!input.is_busy());
        assert!(!input.is_disabled());
    }

    #[test]
    fn test_disabled_but_busy_does_not_lock_children() {
        let (form, state) = form();
        state.set_dirty();
        let button = child(&form, "button", "submit");

        form.busy_lock(None);
        state.set_invalid(true);
        assert!(form.is_locked());
        assert!(!button.is_locked());
        assert!(button.is_busy());

        form.busy_unlock(false);
        assert!(button.is_locked());
        assert!(!button.is_busy());
        assert!(button.is_disabled());
    }

    #[test]
    fn test_control_without_form() {
        let input = ControlNode::builder(ControlDeclaration::new("input"))
            .build()
            .unwrap();
        input.initialize().unwrap();
        assert!(!input.is_locked());
        assert!(!input.is_busy());
    }

    #[test]
    fn test_apply_lock_directly() {
        let (form, state) = form();
        let input = ControlNode::builder(ControlDeclaration::new("input"))
            .build()
            .unwrap();

        ChildPropagator::apply_lock(&input, form.form_signal());
        assert!(input.is_locked());

        state.set_dirty();
        ChildPropagator::apply_lock(&input, form.form_signal());
        assert!(!input.is_locked());
    }

    #[test]
    fn test_dropped_child_is_skipped() {
        let (form, state) = form();
        let input = child(&form, "input", "text");
        assert_eq!(form.form_signal().watcher_count(), 1);

        drop(input);
        state.set_dirty();
        assert!(!form.is_locked());
        assert_eq!(form.form_signal().watcher_count(), 0);
    }
}
