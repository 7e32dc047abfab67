//! Element side effects.
//!
//! A control never touches markup directly. Everything visible it does goes
//! through the [`Element`] trait: three state classes and one boolean
//! disabled attribute. [`MemoryElement`] keeps that state in memory for hosts
//! without a document and for tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

/// Permanent marker applied once a control is initialized.
pub const CLASS_AUTODISABLE: &str = "autodisable";

/// Toggled by `lock()` / `unlock()`.
pub const CLASS_LOCKED: &str = "autodisable-locked";

/// Toggled by `busy_lock()` / `busy_unlock()`.
pub const CLASS_BUSY: &str = "autodisable-busy";

/// The class and attribute mutation primitives a control needs.
pub trait Element {
    /// Adds a class. Adding a class that is already present has no effect.
    fn add_class(&self, class: &str);

    /// Removes a class. Removing an absent class has no effect.
    fn remove_class(&self, class: &str);

    /// Returns `true` if the class is present.
    fn has_class(&self, class: &str) -> bool;

    /// Sets or clears the disabled attribute.
    fn set_disabled(&self, disabled: bool);

    /// Returns `true` if the disabled attribute is set.
    fn is_disabled(&self) -> bool;
}

/// An in-memory [`Element`].
///
/// # Examples
///
/// ```
/// use autodisable_forms::element::{Element, MemoryElement};
///
/// let el = MemoryElement::new();
/// el.add_class("autodisable");
/// el.set_disabled(true);
/// assert!(el.has_class("autodisable"));
/// assert!(el.is_disabled());
/// ```
#[derive(Debug, Default)]
pub struct MemoryElement {
    classes: RefCell<BTreeSet<String>>,
    disabled: Cell<bool>,
}

impl MemoryElement {
    /// Creates an element with no classes that is not disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current classes in sorted order.
    pub fn classes(&self) -> Vec<String> {
        self.classes.borrow().iter().cloned().collect()
    }
}

impl Element for MemoryElement {
    fn add_class(&self, class: &str) {
        self.classes.borrow_mut().insert(class.to_string());
    }

    fn remove_class(&self, class: &str) {
        self.classes.borrow_mut().remove(class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().contains(class)
    }

    fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }

    fn is_disabled(&self) -> bool {
        self.disabled.get()
    }
}
