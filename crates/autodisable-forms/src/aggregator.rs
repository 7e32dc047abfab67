//! Validation-driven form locking.
//!
//! A form is locked while `(pristine && options.pristine) ||
//! (invalid && options.invalid)`. The aggregator watches both flags as one
//! [`Validity`] value, so a change to either re-evaluates the rule once.
//! The rule is always evaluated against the source's current flags.

use std::rc::Rc;

use crate::control::ControlNode;
use crate::options::ControlOptions;
use crate::validation::Validity;

/// Applies the lock rule of one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormAggregator {
    options: ControlOptions,
}

impl FormAggregator {
    /// Creates an aggregator for the given options.
    pub const fn new(options: ControlOptions) -> Self {
        Self { options }
    }

    /// Whether a form with `validity` should be locked.
    ///
    /// ```
    /// use autodisable_forms::aggregator::FormAggregator;
    /// use autodisable_forms::options::ControlOptions;
    /// use autodisable_forms::validation::Validity;
    ///
    /// let aggregator = FormAggregator::new(ControlOptions::default());
    /// assert!(aggregator.should_lock(Validity { pristine: true, invalid: false }));
    /// assert!(!aggregator.should_lock(Validity { pristine: false, invalid: false }));
    /// ```
    pub const fn should_lock(&self, validity: Validity) -> bool {
        self.options.should_lock(validity.pristine, validity.invalid)
    }

    /// Locks or unlocks `form` according to `validity`.
    pub fn apply(&self, form: &ControlNode, validity: Validity) {
        if self.should_lock(validity) {
            form.lock();
        } else {
            form.unlock();
        }
    }

    /// Watches the form's validation source. Without one, the form's lock
    /// state is left to explicit `lock` / `unlock` calls.
    pub(crate) fn install(form: &ControlNode) {
        let Some(validation) = form.validation() else {
            tracing::debug!("form has no validation source");
            return;
        };

        let aggregator = Self::new(*form.options());
        let weak = form.weak();
        validation.watch(
            &form.receiver_id(),
            Rc::new(move |_: &Validity| {
                let Some(form) = weak.upgrade() else { return };
                let Some(validation) = form.validation() else { return };
                // The delivered payload may already be stale if another
                // receiver wrote to the source during this round.
                let validity = validation.validity();
                tracing::trace!(?validity, "validity changed");
                aggregator.apply(&form, validity);
            }),
        );
    }
}
