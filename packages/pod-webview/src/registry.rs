//! # Subscription Registry
//!
//! Maps event types to the ordered list of callbacks interested in them.
//!
//! A callback is registered at most once per event type. "Once" is decided by
//! identity, not by behaviour: clones of the same [`Callback`] are the same
//! subscriber, two closures with identical code are not. Callbacks handed in
//! from JavaScript compare with `===` on the underlying function.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::event::EventData;

/// Signature of a delivery callback
pub type ListenerFn = dyn Fn(&str, &EventData) -> Result<()>;

/// Stored form: `None` means the host sent no data at all.
type InvokeFn = dyn Fn(&str, Option<&EventData>) -> Result<()>;

static NO_DATA: EventData = EventData::Null;

/// A delivery callback with a stable identity
#[derive(Clone)]
pub struct Callback {
    func: Rc<InvokeFn>,
    identity: Identity,
}

#[derive(Clone)]
enum Identity {
    /// Identity of the `Rc` allocation
    Local,
    /// Identity of the JavaScript function object
    #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
    Js(js_sys::Function),
}

impl Callback {
    /// Wrap a Rust closure. Events delivered without data reach it as
    /// `null`.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&str, &EventData) -> Result<()> + 'static,
    {
        Self {
            func: Rc::new(move |event_type: &str, event_data: Option<&EventData>| {
                func(event_type, event_data.unwrap_or(&NO_DATA))
            }),
            identity: Identity::Local,
        }
    }

    /// Wrap a JavaScript function; `invoke` adapts the call into it.
    #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
    pub(crate) fn from_js<F>(function: js_sys::Function, invoke: F) -> Self
    where
        F: Fn(&str, Option<&EventData>) -> Result<()> + 'static,
    {
        Self {
            func: Rc::new(invoke),
            identity: Identity::Js(function),
        }
    }

    /// Run the callback.
    pub fn invoke(&self, event_type: &str, event_data: &EventData) -> Result<()> {
        (self.func)(event_type, Some(event_data))
    }

    /// Run the callback for an event that carried no data.
    pub fn invoke_without_data(&self, event_type: &str) -> Result<()> {
        (self.func)(event_type, None)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        match (&self.identity, &other.identity) {
            (Identity::Local, Identity::Local) => {
                Rc::as_ptr(&self.func) as *const u8 == Rc::as_ptr(&other.func) as *const u8
            }
            #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
            (Identity::Js(a), Identity::Js(b)) => a == b,
            #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
            _ => false,
        }
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.identity {
            Identity::Local => "local",
            #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
            Identity::Js(_) => "js",
        };
        f.debug_struct("Callback")
            .field("kind", &kind)
            .field("ptr", &(Rc::as_ptr(&self.func) as *const u8))
            .finish()
    }
}

/// Event type → callbacks, in registration order
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    handlers: HashMap<String, Vec<Callback>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event_type`.
    ///
    /// Returns `false` when that callback was already registered for the type.
    pub fn subscribe(&mut self, event_type: &str, callback: Callback) -> bool {
        let callbacks = self.handlers.entry(event_type.to_string()).or_default();
        if callbacks.contains(&callback) {
            return false;
        }
        callbacks.push(callback);
        true
    }

    /// Remove `callback` from `event_type`.
    ///
    /// Returns `false` if it was not registered. Types left without callbacks
    /// are dropped.
    pub fn unsubscribe(&mut self, event_type: &str, callback: &Callback) -> bool {
        let Some(callbacks) = self.handlers.get_mut(event_type) else {
            return false;
        };
        let Some(index) = callbacks.iter().position(|c| c == callback) else {
            return false;
        };
        callbacks.remove(index);
        if callbacks.is_empty() {
            self.handlers.remove(event_type);
        }
        true
    }

    /// Copy of the callbacks currently registered for `event_type`.
    ///
    /// Delivery iterates over this copy so callbacks may mutate the registry.
    pub fn snapshot(&self, event_type: &str) -> Vec<Callback> {
        self.handlers.get(event_type).cloned().unwrap_or_default()
    }

    /// Number of callbacks registered for `event_type`
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map_or(0, Vec::len)
    }

    /// Event types with at least one callback
    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Whether no callback is registered at all
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
