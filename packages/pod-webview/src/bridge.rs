//! # Bridge
//!
//! The page-side end of the WebView message channel.
//!
//! ## Message Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            MESSAGE FLOW                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Page ──emit(type, data)──► Bridge ──{type,data}──────► native host    │
//! │                               │                                         │
//! │                               └──{eventType,eventData}─► parent frame  │
//! │                                  (only when no native host)            │
//! │                                                                         │
//! │  native host ──deliver(type, data)──► Bridge ──► callback 1            │
//! │                                               ──► callback 2            │
//! │                                               ──► ...                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Emission is fire-and-forget: success means the message was handed to a
//! transport, not that the host processed it. Delivery never fails: each
//! callback runs in isolation and its failure is dropped.
//!
//! All methods take `&self` so callbacks holding the bridge can subscribe,
//! unsubscribe or emit while a delivery is running.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::event::{empty_data, EventData, FallbackEnvelope, NativeEnvelope};
use crate::registry::{Callback, SubscriptionRegistry};
use crate::transport::{Transport, TransportKind};

/// Event bridge between the page and its native host
pub struct Bridge {
    config: BridgeConfig,
    registry: RefCell<SubscriptionRegistry>,
    native: Box<dyn Transport>,
    fallback: Box<dyn Transport>,
}

impl Bridge {
    /// Create a bridge over the given native and fallback transports.
    pub fn new<N, F>(config: BridgeConfig, native: N, fallback: F) -> Self
    where
        N: Transport + 'static,
        F: Transport + 'static,
    {
        Self {
            config,
            registry: RefCell::new(SubscriptionRegistry::new()),
            native: Box::new(native),
            fallback: Box::new(fallback),
        }
    }

    /// Configuration the bridge was built with
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // ========================================================================
    // SUBSCRIPTIONS
    // ========================================================================

    /// Register `callback` for `event_type`. Registering it twice is a no-op.
    pub fn subscribe(&self, event_type: &str, callback: Callback) {
        if self.registry.borrow_mut().subscribe(event_type, callback) {
            tracing::trace!(event_type, "subscribed");
        }
    }

    /// Remove `callback` from `event_type`; unknown pairs are ignored.
    pub fn unsubscribe(&self, event_type: &str, callback: &Callback) {
        if self.registry.borrow_mut().unsubscribe(event_type, callback) {
            tracing::trace!(event_type, "unsubscribed");
        }
    }

    /// Number of callbacks currently registered for `event_type`
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.registry.borrow().listener_count(event_type)
    }

    // ========================================================================
    // OUTBOUND
    // ========================================================================

    /// Whether a native host channel exists right now.
    pub fn is_native_transport_available(&self) -> bool {
        self.native.is_available()
    }

    /// Send an event to the host.
    ///
    /// Missing data is sent as the empty string. When the native transport
    /// is available it is the only one tried, even if the hand-off fails;
    /// otherwise the event is posted to the parent frame.
    pub fn emit(&self, event_type: &str, event_data: Option<EventData>) -> Result<TransportKind> {
        let data = event_data.unwrap_or_else(empty_data);
        tracing::debug!(event_type, data = %data, "> postEvent");

        if self.native.is_available() {
            let payload = NativeEnvelope::new(event_type, &data).to_json()?;
            return match self.native.post(&payload) {
                Ok(()) => Ok(TransportKind::Native),
                Err(e) => {
                    tracing::error!(event_type, error = %e, "Failed to post to native");
                    Err(e)
                }
            };
        }

        let payload = FallbackEnvelope::new(event_type, &data).to_json()?;
        self.fallback.post(&payload)?;
        Ok(TransportKind::Fallback)
    }

    /// Callback form of [`emit`](Self::emit): `on_complete` receives `None`
    /// once handed off, or the error of the failed attempt.
    pub fn emit_with<F>(&self, event_type: &str, event_data: Option<EventData>, on_complete: F)
    where
        F: FnOnce(Option<&Error>),
    {
        match self.emit(event_type, event_data) {
            Ok(_) => on_complete(None),
            Err(e) => on_complete(Some(&e)),
        }
    }

    /// Emit the configured lifecycle event with no data and no callback.
    pub fn announce_ready(&self) {
        let event_type = self.config.ready_event.clone();
        if let Err(e) = self.emit(&event_type, None) {
            tracing::warn!(event_type = %event_type, error = %e, "Ready announcement not delivered");
        }
    }

    // ========================================================================
    // INBOUND
    // ========================================================================

    /// Hand an event from the host to every callback registered for it.
    ///
    /// Callbacks run in registration order over a snapshot of the list, so
    /// subscriptions changed by a callback apply from the next delivery on.
    /// Returns how many callbacks were invoked.
    pub fn deliver(&self, event_type: &str, event_data: &EventData) -> usize {
        self.dispatch(event_type, Some(event_data))
    }

    /// [`deliver`](Self::deliver) for an event the host sent without data.
    ///
    /// Rust callbacks see `null`; JavaScript callbacks see `undefined`.
    pub fn deliver_without_data(&self, event_type: &str) -> usize {
        self.dispatch(event_type, None)
    }

    fn dispatch(&self, event_type: &str, event_data: Option<&EventData>) -> usize {
        match event_data {
            Some(data) => tracing::debug!(event_type, data = %data, "< receiveEvent"),
            None => tracing::debug!(event_type, "< receiveEvent"),
        }

        let callbacks = self.registry.borrow().snapshot(event_type);
        for callback in &callbacks {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| match event_data {
                Some(data) => callback.invoke(event_type, data),
                None => callback.invoke_without_data(event_type),
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::trace!(event_type, error = %e, "listener failed"),
                Err(_) => tracing::trace!(event_type, "listener panicked"),
            }
        }
        callbacks.len()
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Harness {
        bridge: Rc<Bridge>,
        native: Rc<MemoryTransport>,
        fallback: Rc<MemoryTransport>,
    }

    fn harness(native_available: bool) -> Harness {
        let native = Rc::new(MemoryTransport::new());
        native.set_available(native_available);
        let fallback = Rc::new(MemoryTransport::new());
        let bridge = Rc::new(Bridge::new(
            BridgeConfig::default(),
            Rc::clone(&native),
            Rc::clone(&fallback),
        ));
        Harness { bridge, native, fallback }
    }

    fn parse(payload: &str) -> serde_json::Value {
        serde_json::from_str(payload).unwrap()
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &str) -> Callback {
        let log = Rc::clone(log);
        let tag = tag.to_string();
        Callback::new(move |event_type, data| {
            log.borrow_mut().push(format!("{}:{}:{}", tag, event_type, data));
            Ok(())
        })
    }

    // ── subscribe / deliver ─────────────────────────────────────────────

    #[test]
    fn test_duplicate_subscribe_invokes_once() {
        let h = harness(true);
        let hits = Rc::new(Cell::new(0));
        let counter = {
            let hits = Rc::clone(&hits);
            Callback::new(move |_, _| {
                hits.set(hits.get() + 1);
                Ok(())
            })
        };

        h.bridge.subscribe("evt", counter.clone());
        h.bridge.subscribe("evt", counter);

        assert_eq!(h.bridge.deliver("evt", &json!(null)), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe_never_subscribed_is_noop() {
        let h = harness(true);
        let cb = Callback::new(|_, _| Ok(()));
        h.bridge.unsubscribe("nothing", &cb);
        assert_eq!(h.bridge.listener_count("nothing"), 0);
    }

    #[test]
    fn test_deliver_without_subscribers_is_silent() {
        let h = harness(true);
        assert_eq!(h.bridge.deliver("x", &json!({"payload": true})), 0);
        assert!(h.native.sent().is_empty());
        assert!(h.fallback.sent().is_empty());
    }

    #[test]
    fn test_deliver_without_data_reaches_listeners() {
        let h = harness(true);
        let log = Rc::new(RefCell::new(Vec::new()));
        h.bridge.subscribe("web_app_close", recorder(&log, "a"));

        assert_eq!(h.bridge.deliver_without_data("web_app_close"), 1);
        assert_eq!(h.bridge.deliver_without_data("unheard"), 0);
        assert_eq!(*log.borrow(), vec!["a:web_app_close:null"]);
    }

    #[test]
    fn test_failing_listener_does_not_block_others() {
        let h = harness(true);
        let log = Rc::new(RefCell::new(Vec::new()));

        h.bridge.subscribe("evt", recorder(&log, "first"));
        h.bridge.subscribe(
            "evt",
            Callback::new(|_, _| Err(Error::ListenerFailed("second is broken".into()))),
        );
        h.bridge.subscribe("evt", recorder(&log, "third"));

        assert_eq!(h.bridge.deliver("evt", &json!(1)), 3);
        assert_eq!(*log.borrow(), vec!["first:evt:1", "third:evt:1"]);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let h = harness(true);
        let log = Rc::new(RefCell::new(Vec::new()));

        h.bridge.subscribe("evt", recorder(&log, "a"));
        h.bridge.subscribe("evt", Callback::new(|_, _| panic!("listener bug")));
        h.bridge.subscribe("evt", recorder(&log, "c"));

        h.bridge.deliver("evt", &json!("x"));
        assert_eq!(*log.borrow(), vec![r#"a:evt:"x""#, r#"c:evt:"x""#]);
    }

    #[test]
    fn test_listener_receives_type_and_data() {
        let h = harness(true);
        let seen = Rc::new(RefCell::new(None));
        let cb = {
            let seen = Rc::clone(&seen);
            Callback::new(move |event_type, data| {
                *seen.borrow_mut() = Some((event_type.to_string(), data.clone()));
                Ok(())
            })
        };
        h.bridge.subscribe("permission_checked", cb);
        h.bridge.deliver("permission_checked", &json!({"granted": true}));

        assert_eq!(
            *seen.borrow(),
            Some(("permission_checked".to_string(), json!({"granted": true})))
        );
    }

    #[test]
    fn test_deliver_does_not_touch_registry() {
        let h = harness(true);
        h.bridge.subscribe("evt", Callback::new(|_, _| Ok(())));
        h.bridge.deliver("evt", &json!(null));
        h.bridge.deliver("evt", &json!(null));
        assert_eq!(h.bridge.listener_count("evt"), 1);
    }

    // ── reentrancy ──────────────────────────────────────────────────────

    #[test]
    fn test_callback_unsubscribing_itself_during_delivery() {
        let h = harness(true);
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<Callback>>> = Rc::new(RefCell::new(None));

        let once = {
            let bridge = Rc::downgrade(&h.bridge);
            let slot = Rc::clone(&slot);
            let log = Rc::clone(&log);
            Callback::new(move |event_type, _| {
                log.borrow_mut().push("once".to_string());
                if let (Some(bridge), Some(me)) = (bridge.upgrade(), slot.borrow().clone()) {
                    bridge.unsubscribe(event_type, &me);
                }
                Ok(())
            })
        };
        *slot.borrow_mut() = Some(once.clone());

        h.bridge.subscribe("evt", once);
        h.bridge.subscribe("evt", recorder(&log, "after"));

        h.bridge.deliver("evt", &json!(0));
        h.bridge.deliver("evt", &json!(0));

        assert_eq!(*log.borrow(), vec!["once", "after:evt:0", "after:evt:0"]);
        assert_eq!(h.bridge.listener_count("evt"), 1);
    }

    #[test]
    fn test_callback_subscribing_during_delivery_applies_next_time() {
        let h = harness(true);
        let log = Rc::new(RefCell::new(Vec::new()));
        let late = recorder(&log, "late");

        let adder = {
            let bridge = Rc::downgrade(&h.bridge);
            let late = late.clone();
            Callback::new(move |event_type, _| {
                if let Some(bridge) = bridge.upgrade() {
                    bridge.subscribe(event_type, late.clone());
                }
                Ok(())
            })
        };
        h.bridge.subscribe("evt", adder);

        assert_eq!(h.bridge.deliver("evt", &json!(1)), 1);
        assert!(log.borrow().is_empty());

        assert_eq!(h.bridge.deliver("evt", &json!(2)), 2);
        assert_eq!(*log.borrow(), vec!["late:evt:2"]);
    }

    #[test]
    fn test_callback_emitting_during_delivery() {
        let h = harness(true);
        let replier = {
            let bridge = Rc::downgrade(&h.bridge);
            Callback::new(move |_, data| {
                if let Some(bridge) = bridge.upgrade() {
                    bridge.emit("pong", Some(data.clone()))?;
                }
                Ok(())
            })
        };
        h.bridge.subscribe("ping", replier);
        h.bridge.deliver("ping", &json!(7));

        assert_eq!(
            h.native.sent().iter().map(|p| parse(p)).collect::<Vec<_>>(),
            vec![json!({"type": "pong", "data": 7})]
        );
    }

    // ── emit ────────────────────────────────────────────────────────────

    #[test]
    fn test_emit_native_without_data_sends_empty_string() {
        let h = harness(true);
        let called_with = Rc::new(RefCell::new(None));
        {
            let called_with = Rc::clone(&called_with);
            h.bridge.emit_with("evt", None, move |err| {
                *called_with.borrow_mut() = Some(err.cloned());
            });
        }

        assert_eq!(*called_with.borrow(), Some(None));
        let sent = h.native.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(parse(&sent[0]), json!({"type": "evt", "data": ""}));
        assert!(h.fallback.sent().is_empty());
    }

    #[test]
    fn test_emit_native_failure_reports_error_without_fallback() {
        let h = harness(true);
        h.native
            .fail_with(Some(Error::NativeTransport("handler threw".into())));

        let reported = Rc::new(RefCell::new(None));
        {
            let reported = Rc::clone(&reported);
            h.bridge.emit_with("evt", Some(json!({"a": 1})), move |err| {
                *reported.borrow_mut() = err.cloned();
            });
        }

        assert_eq!(
            *reported.borrow(),
            Some(Error::NativeTransport("handler threw".into()))
        );
        assert_eq!(h.native.attempts(), 1);
        assert_eq!(h.fallback.attempts(), 0);
    }

    #[test]
    fn test_emit_without_native_uses_fallback_envelope() {
        let h = harness(false);
        let result = h.bridge.emit("evt", Some(json!({"a": 1})));

        assert_eq!(result, Ok(TransportKind::Fallback));
        let sent = h.fallback.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(parse(&sent[0]), json!({"eventType": "evt", "eventData": {"a": 1}}));
        assert_eq!(h.native.attempts(), 0);
    }

    #[test]
    fn test_emit_fallback_failure_reported() {
        let h = harness(false);
        h.fallback
            .fail_with(Some(Error::FallbackTransport("no parent".into())));

        let reported = Rc::new(Cell::new(false));
        {
            let reported = Rc::clone(&reported);
            h.bridge.emit_with("evt", None, move |err| {
                reported.set(matches!(err, Some(Error::FallbackTransport(_))));
            });
        }
        assert!(reported.get());
    }

    #[test]
    fn test_availability_is_reprobed_each_call() {
        let h = harness(false);
        assert!(!h.bridge.is_native_transport_available());

        h.native.set_available(true);
        assert!(h.bridge.is_native_transport_available());
        assert_eq!(h.bridge.emit("a", None), Ok(TransportKind::Native));

        h.native.set_available(false);
        assert!(!h.bridge.is_native_transport_available());
        assert_eq!(h.bridge.emit("b", None), Ok(TransportKind::Fallback));
    }

    #[test]
    fn test_announce_ready_emits_lifecycle_event() {
        let h = harness(true);
        h.bridge.announce_ready();
        let sent = h.native.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(parse(&sent[0]), json!({"type": "web_app_initialized", "data": ""}));
    }

    #[test]
    fn test_announce_ready_swallows_transport_failure() {
        let h = harness(false);
        h.fallback
            .fail_with(Some(Error::FallbackTransport("detached".into())));
        h.bridge.announce_ready();
        assert_eq!(h.fallback.attempts(), 1);
    }
}
