//! Validation state consumed by forms.
//!
//! A form does not validate anything itself. It watches a
//! [`ValidationSource`] for its `pristine` and `invalid` flags and asks it to
//! reset to pristine after a successful submission. [`FormState`] is a
//! minimal source for hosts whose validation layer only needs to push flags.

use std::fmt;
use std::rc::Rc;

use autodisable_signals::Watch;

/// The pair of validation flags a form reacts to, watched as one value so
/// simultaneous changes are observed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Validity {
    /// Unmodified since load or the last reset.
    pub pristine: bool,
    /// Fails at least one validation rule.
    pub invalid: bool,
}

impl Default for Validity {
    fn default() -> Self {
        Self {
            pristine: true,
            invalid: false,
        }
    }
}

/// Receiver for validity changes.
pub type ValidityReceiver = Rc<dyn Fn(&Validity)>;

/// The validation capability a form needs.
pub trait ValidationSource {
    /// Current flags.
    fn validity(&self) -> Validity;

    /// Resets the form to pristine.
    fn set_pristine(&self);

    /// Registers a receiver, evaluating it once immediately and again on
    /// every change. Re-registering an ID replaces the receiver.
    fn watch(&self, receiver_id: &str, receiver: ValidityReceiver);

    /// Removes a receiver. Returns `true` if it was registered.
    fn unwatch(&self, receiver_id: &str) -> bool;

    /// Shorthand for `validity().pristine`.
    fn pristine(&self) -> bool {
        self.validity().pristine
    }

    /// Shorthand for `validity().invalid`.
    fn invalid(&self) -> bool {
        self.validity().invalid
    }
}

/// In-memory validation flags with change notification.
///
/// # Examples
///
/// ```
/// use autodisable_forms::validation::{FormState, ValidationSource};
///
/// let state = FormState::new();
/// assert!(state.pristine());
/// state.set_dirty();
/// state.set_invalid(true);
/// assert!(!state.pristine());
/// assert!(state.invalid());
/// ```
#[derive(Default)]
pub struct FormState {
    validity: Watch<Validity>,
}

impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormState")
            .field("validity", &self.validity.get())
            .finish()
    }
}

impl FormState {
    /// A pristine, valid form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the given flags.
    pub fn with_validity(validity: Validity) -> Self {
        Self {
            validity: Watch::new(validity),
        }
    }

    /// Marks the form as modified.
    pub fn set_dirty(&self) {
        self.update(|v| v.pristine = false);
    }

    /// Sets the invalid flag.
    pub fn set_invalid(&self, invalid: bool) {
        self.update(|v| v.invalid = invalid);
    }

    /// Replaces both flags in one change.
    pub fn set_validity(&self, validity: Validity) {
        self.validity.set(validity);
    }

    fn update(&self, change: impl FnOnce(&mut Validity)) {
        let mut validity = self.validity.get();
        change(&mut validity);
        self.validity.set(validity);
    }
}

impl ValidationSource for FormState {
    fn validity(&self) -> Validity {
        self.validity.get()
    }

    fn set_pristine(&self) {
        self.update(|v| v.pristine = true);
    }

    fn watch(&self, receiver_id: &str, receiver: ValidityReceiver) {
        self.validity
            .watch(receiver_id, move |validity: &Validity| receiver(validity));
    }

    fn unwatch(&self, receiver_id: &str) -> bool {
        self.validity.unwatch(receiver_id)
    }
}
