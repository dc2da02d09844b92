//! Callback registry passed into each scheduler tick
//!
//! Callbacks take two flags. For playthrough events both are always `true`.
//! For toggle events ongoing calls pass `(just_on, false)` and the single
//! closing call passes `(false, true)`.

use std::collections::HashMap;
use std::fmt;

/// Callback for a named event: `(first_or_just_on, last_or_just_off)`
pub type EventCallback = Box<dyn FnMut(bool, bool) + Send>;

/// Mapping from event name to callback
#[derive(Default)]
pub struct EventCallbacks {
    callbacks: HashMap<String, EventCallback>,
}

impl EventCallbacks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, builder style
    pub fn on<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(bool, bool) + Send + 'static,
    {
        self.insert(name, f);
        self
    }

    /// Register or replace a callback
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F) -> Option<EventCallback>
    where
        F: FnMut(bool, bool) + Send + 'static,
    {
        self.callbacks.insert(name.into(), Box::new(f))
    }

    /// Remove a callback
    pub fn remove(&mut self, name: &str) -> Option<EventCallback> {
        self.callbacks.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Registered names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.callbacks.keys().map(String::as_str)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut EventCallback> {
        self.callbacks.get_mut(name)
    }
}

// Manual Debug implementation (skip closures)
impl fmt::Debug for EventCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCallbacks")
            .field("names", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}
