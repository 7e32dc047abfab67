//! # autodisable-signals
//!
//! Synchronous publish/subscribe plumbing used to propagate state between a
//! form and its controls. Everything here is single-threaded: receivers are
//! plain `Rc` closures and dispatch happens on the caller's stack.
//!
//! - [`Signal`] fans a payload out to named receivers, in connection order.
//! - [`Watch`] holds a value and notifies receivers when it changes. A
//!   [`WatchHold`] batches changes so receivers only ever see the settled value.
//!
//! ## Usage
//!
//! ```
//! use autodisable_signals::Watch;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let disabled = Watch::new(false);
//! let seen = Rc::new(Cell::new(0));
//! let seen_clone = Rc::clone(&seen);
//!
//! disabled.watch("child", move |_: &bool| seen_clone.set(seen_clone.get() + 1));
//! assert_eq!(seen.get(), 1); // initial evaluation
//!
//! disabled.set(true);
//! disabled.set(true); // unchanged, not delivered
//! assert_eq!(seen.get(), 2);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// The type signature for a signal receiver callback.
pub type SignalReceiver<T> = Rc<dyn Fn(&T)>;

/// A signal that can be connected to and dispatched.
///
/// Each signal carries a payload type `T`. Receivers are called in the order
/// they were connected. Dispatch works on a snapshot of the receiver list, so
/// a receiver may connect or disconnect receivers (or send again) while it runs.
///
/// # Examples
///
/// ```
/// use autodisable_signals::Signal;
/// use std::rc::Rc;
///
/// let signal: Signal<String> = Signal::new();
///
/// signal.connect("logger", Rc::new(|msg: &String| {
///     println!("Received: {msg}");
/// }));
///
/// assert_eq!(signal.send(&"hello".to_string()), 1);
/// ```
pub struct Signal<T: 'static> {
    receivers: RefCell<Vec<(String, SignalReceiver<T>)>>,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self
            .receivers
            .borrow()
            .iter()
            .map(|(id, _)| id.clone())
            .collect();
        f.debug_struct("Signal").field("receivers", &ids).finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Creates a new signal with no connected receivers.
    pub const fn new() -> Self {
        Self {
            receivers: RefCell::new(Vec::new()),
        }
    }

    /// Connects a receiver to this signal.
    ///
    /// If a receiver with the same ID is already connected, it is replaced in
    /// place and keeps its position in the dispatch order.
    pub fn connect(&self, receiver_id: impl Into<String>, callback: SignalReceiver<T>) {
        let id = receiver_id.into();
        let mut receivers = self.receivers.borrow_mut();

        if let Some(entry) = receivers.iter_mut().find(|(rid, _)| *rid == id) {
            entry.1 = callback;
        } else {
            receivers.push((id, callback));
        }
    }

    /// Disconnects the receiver with the given ID.
    ///
    /// Returns `true` if a receiver was found and removed.
    pub fn disconnect(&self, receiver_id: &str) -> bool {
        let mut receivers = self.receivers.borrow_mut();
        let len_before = receivers.len();
        receivers.retain(|(id, _)| id != receiver_id);
        receivers.len() < len_before
    }

    /// Sends the signal to all connected receivers.
    ///
    /// Returns the number of receivers that were called.
    pub fn send(&self, payload: &T) -> usize {
        let snapshot: Vec<SignalReceiver<T>> = self
            .receivers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        for callback in &snapshot {
            callback(payload);
        }
        snapshot.len()
    }

    /// Returns the number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers.borrow().len()
    }
}

/// A watched value.
///
/// Receivers registered with [`Watch::watch`] are evaluated once immediately
/// and then every time the value changes. Setting an equal value is not a
/// change and is never delivered.
///
/// A change made by a receiver while a value is being delivered is queued:
/// the current round finishes first, then every receiver sees the newer
/// value. The last value each receiver observes is always the stored one.
pub struct Watch<T: Clone + PartialEq + 'static> {
    value: RefCell<T>,
    holds: Cell<usize>,
    held_from: RefCell<Option<T>>,
    delivering: Cell<bool>,
    redeliver: Cell<bool>,
    signal: Signal<T>,
}

impl<T: Clone + PartialEq + Default + 'static> Default for Watch<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for Watch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("value", &*self.value.borrow())
            .field("held", &(self.holds.get() > 0))
            .field("receivers", &self.signal.receiver_count())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Watch<T> {
    /// Creates a watch holding `initial`.
    pub const fn new(initial: T) -> Self {
        Self {
            value: RefCell::new(initial),
            holds: Cell::new(0),
            held_from: RefCell::new(None),
            delivering: Cell::new(false),
            redeliver: Cell::new(false),
            signal: Signal::new(),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Replaces the value, notifying receivers if it changed.
    ///
    /// While the watch is held the change is recorded but not delivered.
    /// Returns `true` if the stored value changed.
    pub fn set(&self, value: T) -> bool {
        if *self.value.borrow() == value {
            return false;
        }
        *self.value.borrow_mut() = value;

        if self.holds.get() == 0 {
            self.deliver();
        }
        true
    }

    /// Registers a receiver and evaluates it once against the current value.
    ///
    /// Registering again under the same ID replaces the earlier receiver.
    pub fn watch(&self, receiver_id: impl Into<String>, callback: impl Fn(&T) + 'static) {
        let callback: SignalReceiver<T> = Rc::new(callback);
        self.signal.connect(receiver_id, Rc::clone(&callback));
        // Only the new receiver gets the initial evaluation.
        callback(&self.get());
    }

    /// Removes a receiver. Returns `true` if it was registered.
    pub fn unwatch(&self, receiver_id: &str) -> bool {
        self.signal.disconnect(receiver_id)
    }

    /// Returns the number of registered receivers.
    pub fn watcher_count(&self) -> usize {
        self.signal.receiver_count()
    }

    /// Returns `true` while at least one [`WatchHold`] is alive.
    pub fn is_held(&self) -> bool {
        self.holds.get() > 0
    }

    /// Suspends delivery until the returned guard (and any nested guards)
    /// are dropped. On release, receivers see the final value once, and only
    /// if it differs from the value at the time the first hold was taken.
    pub fn hold(&self) -> WatchHold<'_, T> {
        if self.holds.get() == 0 {
            *self.held_from.borrow_mut() = Some(self.get());
        }
        self.holds.set(self.holds.get() + 1);
        WatchHold { watch: self }
    }

    fn release(&self) {
        let remaining = self.holds.get().saturating_sub(1);
        self.holds.set(remaining);
        if remaining > 0 {
            return;
        }

        let held_from = self.held_from.borrow_mut().take();
        if held_from.as_ref() != Some(&*self.value.borrow()) {
            self.deliver();
        }
    }

    /// Sends the current value, repeating while receivers keep changing it.
    fn deliver(&self) {
        if self.delivering.replace(true) {
            self.redeliver.set(true);
            return;
        }

        let mut value = self.get();
        loop {
            self.redeliver.set(false);
            self.signal.send(&value);

            let current = self.get();
            if !self.redeliver.get() || current == value {
                break;
            }
            value = current;
        }
        self.delivering.set(false);
    }
}

/// Guard returned by [`Watch::hold`]. Dropping it flushes the watch.
#[must_use = "dropping the hold immediately flushes the watch"]
pub struct WatchHold<'a, T: Clone + PartialEq + 'static> {
    watch: &'a Watch<T>,
}

impl<T: Clone + PartialEq + 'static> Drop for WatchHold<'_, T> {
    fn drop(&mut self) {
        self.watch.release();
    }
}
