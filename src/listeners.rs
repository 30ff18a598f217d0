//! Bridging external event emitters into signals.
//!
//! [`Runtime::from_listeners`] subscribes to any type implementing
//! [`EventTarget`] and turns its events into writes on an otherwise ordinary
//! source signal. The subscription lives until the signal is unlinked from
//! its last dependent, at which point its disposer removes every listener it
//! registered.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::Runtime;
use crate::signal::Signal;
use crate::value::Value;

/// An event callback with identity.
///
/// Listeners compare by identity so a target can find the exact callback to
/// remove again: two handles are equal when they wrap the same closure.
pub struct Listener<E> {
    f: Rc<RefCell<dyn FnMut(E)>>,
}

impl<E: 'static> Listener<E> {
    /// Wrap a callback.
    pub fn new<F: FnMut(E) + 'static>(f: F) -> Listener<E> {
        Listener { f: Rc::new(RefCell::new(f)) }
    }

    /// Deliver an event to the callback.
    pub fn call(&self, event: E) {
        (self.f.borrow_mut())(event)
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Listener<E> {
        Listener { f: self.f.clone() }
    }
}

impl<E> PartialEq for Listener<E> {
    fn eq(&self, other: &Listener<E>) -> bool {
        Rc::ptr_eq(&self.f, &other.f)
    }
}

impl<E> Eq for Listener<E> {}

/// Something that can register and unregister event listeners by name.
pub trait EventTarget<E> {
    /// Register `listener` for events named `event`.
    fn add_listener(&self, event: &str, listener: Listener<E>);
    /// Unregister a previously registered listener.
    fn remove_listener(&self, event: &str, listener: &Listener<E>);
}

impl Runtime {
    /// A signal fed by the named events of `target`.
    ///
    /// The signal starts out undefined and takes on each event's payload as
    /// it arrives; events of all listed names feed the same signal. Its
    /// disposer removes every registered listener, so disconnecting the last
    /// dependent (for example through
    /// [`Signal::chain`](crate::Signal::chain) switching away) stops the
    /// subscription.
    pub fn from_listeners<E, T>(&self, events: &[&str], target: &T) -> Signal<E>
    where
        E: PartialEq + Clone + 'static,
        T: EventTarget<E> + Clone + 'static,
    {
        let signal = self.undefined::<E>();
        let core = Rc::downgrade(self.core());
        let id = signal.id();
        let mut registered = Vec::with_capacity(events.len());
        for &event in events {
            let core = core.clone();
            let listener = Listener::new(move |payload: E| {
                if let Some(core) = core.upgrade() {
                    core.set(id, Some(Value::new(payload)));
                }
            });
            target.add_listener(event, listener.clone());
            registered.push((event.to_string(), listener));
        }
        let target = target.clone();
        self.core().set_disposer(
            id,
            Box::new(move || {
                for (event, listener) in &registered {
                    target.remove_listener(event, listener);
                }
            }),
        );
        signal
    }
}
