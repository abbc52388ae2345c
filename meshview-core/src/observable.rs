//! A value holder that notifies subscribers when it changes

use std::fmt;

type Subscriber<T> = Box<dyn FnMut(&T)>;

/// Single-threaded observable value.
///
/// Subscribers run synchronously inside [`Observable::set`], in subscription
/// order, with the new value.
pub struct Observable<T> {
    value: T,
    subscribers: Vec<Subscriber<T>>,
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            subscribers: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Mutable access that does not notify subscribers
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Replace the value and notify every subscriber, returning the old value
    pub fn set(&mut self, value: T) -> T {
        let old = std::mem::replace(&mut self.value, value);
        self.notify();
        old
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&T) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn notify(&mut self) {
        for subscriber in &mut self.subscribers {
            subscriber(&self.value);
        }
    }
}

impl<T: PartialEq> Observable<T> {
    /// Set only when the value differs; returns whether subscribers ran
    pub fn set_if_changed(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.set(value);
        true
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
