//! Listener registry with explicit unsubscribe.
//!
//! [`Listeners::subscribe`] returns a [`Subscription`] guard. The listener is
//! removed when the guard is dropped or [`Subscription::unsubscribe`] is
//! called, whichever comes first.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback<T>>,
}

/// Set of callbacks notified with `&T`, in subscription order.
pub struct Listeners<T> {
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Listeners<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: BTreeMap::new(),
            })),
        }
    }

    /// Registers `listener` until the returned guard goes away.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut registry = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.insert(id, Arc::new(listener));

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let mut registry = inner.lock().unwrap_or_else(|p| p.into_inner());
                    registry.callbacks.remove(&id);
                }
            })),
        }
    }

    /// Calls every registered listener with `value`.
    ///
    /// Callbacks run outside the registry lock, so a listener may subscribe
    /// or drop its own subscription.
    pub fn emit(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = {
            let registry = self.inner.lock().unwrap_or_else(|p| p.into_inner());
            registry.callbacks.values().cloned().collect()
        };
        for callback in callbacks {
            callback(value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle that keeps a listener registered.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Removes the listener now.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}
