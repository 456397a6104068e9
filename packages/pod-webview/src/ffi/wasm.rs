//! # WASM Bindings
//!
//! Installs the bridge on the page and exposes it to JavaScript.
//!
//! ## Page Global
//!
//! ```text
//! window.Pod.WebView = {
//!     subscribe(eventType, callback)              // alias: onEvent
//!     unsubscribe(eventType, callback)            // alias: offEvent
//!     emit(eventType, eventData?, callback?)
//!     postEvent(eventType, callback?, eventData?) // legacy argument order
//!     deliver(eventType, eventData)               // alias: receiveEvent
//!     isNativeTransportAvailable()                // alias: isAvailable
//!     materializeFiles(payload) -> Blob[]
//! }
//! ```
//!
//! The native container calls `window.Pod.WebView.receiveEvent(...)` to push
//! events into the page. Event data crosses the boundary as JSON.

#![cfg(all(feature = "wasm", target_arch = "wasm32"))]

use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use once_cell::unsync::OnceCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag};

use super::web_transport::{describe_js_error, NativeHandlerTransport, ParentFrameTransport};
use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::event::EventData;
use crate::files::{self, MaterializedFile};
use crate::registry::Callback;

// ============================================================================
// STATE
// ============================================================================

// js_sys values are !Send and the page is single-threaded
thread_local! {
    static BRIDGE: OnceCell<Rc<Bridge>> = OnceCell::new();
}

fn installed() -> Option<Rc<Bridge>> {
    BRIDGE.with(|cell| cell.get().cloned())
}

fn to_js_error(err: &Error) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Install with the default configuration as soon as the module starts.
#[cfg(feature = "auto-start")]
#[wasm_bindgen(start)]
pub fn pod_webview_start() {
    if let Err(e) = install(BridgeConfig::default()) {
        web_sys::console::error_1(&to_js_error(&e));
    }
}

/// Install the bridge on the page.
///
/// Accepts an optional JSON configuration, e.g.
/// `{"nativeHandler": "PodBridge", "logLevel": "debug"}`.
#[wasm_bindgen]
pub fn pod_webview_init(config_json: Option<String>) -> std::result::Result<(), JsValue> {
    let config = match config_json {
        Some(json) => BridgeConfig::from_json(&json),
        None => Ok(BridgeConfig::default()),
    }
    .map_err(|e| to_js_error(&e))?;

    install(config).map(|_| ()).map_err(|e| to_js_error(&e))
}

/// Whether the bridge has been installed
#[wasm_bindgen]
pub fn pod_webview_is_initialized() -> bool {
    installed().is_some()
}

/// Get version
#[wasm_bindgen]
pub fn pod_webview_version() -> String {
    crate::version().to_string()
}

/// Turn a file payload into `Blob`s; invalid items are skipped.
#[wasm_bindgen]
pub fn pod_webview_materialize_files(payload: JsValue) -> Array {
    materialize_blobs(&payload)
}

fn install(config: BridgeConfig) -> Result<Rc<Bridge>> {
    config.validate()?;
    if installed().is_some() {
        return Err(Error::AlreadyInitialized);
    }

    console_error_panic_hook::set_once();
    init_tracing(&config)?;

    let window = web_sys::window().ok_or_else(|| Error::Internal("no window".to_string()))?;
    let native = NativeHandlerTransport::new(config.native_handler.clone());
    let fallback = ParentFrameTransport::new(config.target_origin.clone());
    let bridge = Rc::new(Bridge::new(config, native, fallback));

    // Recorded only once the page can reach it, so a failed attach can be retried
    attach(&window, &bridge)?;
    BRIDGE
        .with(|cell| cell.set(Rc::clone(&bridge)))
        .map_err(|_| Error::AlreadyInitialized)?;

    tracing::info!("WebView bridge loaded");
    tracing::info!(available = bridge.is_native_transport_available(), "Native available");

    if bridge.config().announce_on_init {
        bridge.announce_ready();
    }
    Ok(bridge)
}

fn init_tracing(config: &BridgeConfig) -> Result<()> {
    // The embedding page may already own the global subscriber
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }
    let wasm_config = tracing_wasm::WASMLayerConfigBuilder::new()
        .set_max_level(config.max_level()?)
        .build();
    tracing_wasm::set_as_global_default_with_config(wasm_config);
    Ok(())
}

// ============================================================================
// PAGE GLOBAL
// ============================================================================

/// `Reflect.set` that fails on frozen or non-extensible targets instead of
/// quietly doing nothing.
fn set_property(target: &JsValue, key: &str, value: &JsValue) -> Result<()> {
    let stored = Reflect::set(target, &JsValue::from_str(key), value)
        .map_err(|e| Error::Internal(describe_js_error(&e)))?;
    if !stored {
        return Err(Error::Internal(format!("cannot set property '{}'", key)));
    }
    Ok(())
}

fn set_fn(target: &Object, names: &[&str], function: &JsValue) -> Result<()> {
    for name in names {
        set_property(target, name, function)?;
    }
    Ok(())
}

/// Publish the bridge as `root[namespace][objectName]`.
fn attach(root: &JsValue, bridge: &Rc<Bridge>) -> Result<()> {
    let config = bridge.config();

    // Reuse an existing namespace object; other scripts may hang off it
    let mut namespace = Reflect::get(root, &JsValue::from_str(&config.namespace))
        .map_err(|e| Error::Internal(describe_js_error(&e)))?;
    if !namespace.is_object() {
        namespace = Object::new().into();
        set_property(root, &config.namespace, &namespace)?;
    }

    let api = Object::new();

    let b = Rc::clone(bridge);
    let subscribe = Closure::<dyn Fn(JsValue, JsValue)>::new(move |event_type: JsValue, callback: JsValue| {
        if let Some(function) = callback.dyn_ref::<Function>() {
            b.subscribe(&event_type_from_js(&event_type), js_callback(function.clone()));
        }
    })
    .into_js_value();
    set_fn(&api, &["subscribe", "onEvent"], &subscribe)?;

    let b = Rc::clone(bridge);
    let unsubscribe = Closure::<dyn Fn(JsValue, JsValue)>::new(move |event_type: JsValue, callback: JsValue| {
        if let Some(function) = callback.dyn_ref::<Function>() {
            b.unsubscribe(&event_type_from_js(&event_type), &js_callback(function.clone()));
        }
    })
    .into_js_value();
    set_fn(&api, &["unsubscribe", "offEvent"], &unsubscribe)?;

    let b = Rc::clone(bridge);
    let emit = Closure::<dyn Fn(JsValue, JsValue, JsValue)>::new(
        move |event_type: JsValue, event_data: JsValue, callback: JsValue| {
            js_emit(&b, &event_type, &event_data, &callback);
        },
    )
    .into_js_value();
    set_fn(&api, &["emit"], &emit)?;

    let b = Rc::clone(bridge);
    let post_event = Closure::<dyn Fn(JsValue, JsValue, JsValue)>::new(
        move |event_type: JsValue, callback: JsValue, event_data: JsValue| {
            js_emit(&b, &event_type, &event_data, &callback);
        },
    )
    .into_js_value();
    set_fn(&api, &["postEvent"], &post_event)?;

    let b = Rc::clone(bridge);
    let deliver = Closure::<dyn Fn(JsValue, JsValue)>::new(move |event_type: JsValue, event_data: JsValue| {
        let event_type = event_type_from_js(&event_type);
        match js_to_json(&event_data) {
            Ok(Some(data)) => b.deliver(&event_type, &data),
            Ok(None) => b.deliver_without_data(&event_type),
            Err(e) => {
                tracing::warn!(error = %e, "Inbound event data is not JSON; delivering null");
                b.deliver(&event_type, &EventData::Null)
            }
        };
    })
    .into_js_value();
    set_fn(&api, &["deliver", "receiveEvent"], &deliver)?;

    let b = Rc::clone(bridge);
    let available = Closure::<dyn Fn() -> bool>::new(move || b.is_native_transport_available())
        .into_js_value();
    set_fn(&api, &["isNativeTransportAvailable", "isAvailable"], &available)?;

    let materialize = Closure::<dyn Fn(JsValue) -> Array>::new(|payload: JsValue| materialize_blobs(&payload))
        .into_js_value();
    set_fn(&api, &["materializeFiles"], &materialize)?;

    set_property(&namespace, &config.object_name, &api)
}

// ============================================================================
// JS <-> RUST
// ============================================================================

/// Event types are strings; anything else is coerced through its JSON text.
fn event_type_from_js(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_else(|| "undefined".to_string())
}

/// `undefined` maps to `None`; other values go through `JSON.stringify`.
fn js_to_json(value: &JsValue) -> Result<Option<EventData>> {
    if value.is_undefined() {
        return Ok(None);
    }
    let text = js_sys::JSON::stringify(value)
        .map_err(|e| Error::SerializationError(describe_js_error(&e)))?;
    match text.as_string() {
        Some(text) => Ok(Some(
            serde_json::from_str(&text).map_err(|e| Error::DeserializationError(e.to_string()))?,
        )),
        // Functions and symbols stringify to undefined
        None => Ok(Some(EventData::Null)),
    }
}

fn json_to_js(value: &EventData) -> Result<JsValue> {
    let text = serde_json::to_string(value)?;
    js_sys::JSON::parse(&text).map_err(|e| Error::DeserializationError(describe_js_error(&e)))
}

fn js_callback(function: Function) -> Callback {
    let target = function.clone();
    Callback::from_js(function, move |event_type, event_data| {
        let data = match event_data {
            Some(data) => json_to_js(data)?,
            None => JsValue::UNDEFINED,
        };
        target
            .call2(&JsValue::NULL, &JsValue::from_str(event_type), &data)
            .map(|_| ())
            .map_err(|e| Error::ListenerFailed(describe_js_error(&e)))
    })
}

fn js_emit(bridge: &Bridge, event_type: &JsValue, event_data: &JsValue, callback: &JsValue) {
    let event_type = event_type_from_js(event_type);
    let result = js_to_json(event_data).and_then(|data| bridge.emit(&event_type, data).map(|_| ()));

    let Some(callback) = callback.dyn_ref::<Function>() else {
        return;
    };
    let outcome = match result {
        Ok(()) => callback.call0(&JsValue::NULL),
        Err(e) => callback.call1(&JsValue::NULL, &to_js_error(&e)),
    };
    if let Err(e) = outcome {
        tracing::trace!(error = %describe_js_error(&e), "emit callback threw");
    }
}

fn to_blob(file: &MaterializedFile) -> std::result::Result<Blob, JsValue> {
    let bytes = js_sys::Uint8Array::from(&file.bytes[..]);
    let parts = Array::of1(&bytes);
    let options = BlobPropertyBag::new();
    options.set_type(&file.mime);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options)
}

fn materialize_blobs(payload: &JsValue) -> Array {
    let blobs = Array::new();
    let value = match js_to_json(payload) {
        Ok(Some(value)) => value,
        Ok(None) => EventData::Null,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping file payload");
            return blobs;
        }
    };
    let Ok(batch) = files::materialize(&value) else {
        return blobs;
    };
    for file in &batch.files {
        match to_blob(file) {
            Ok(blob) => {
                blobs.push(&blob);
            }
            Err(e) => tracing::warn!(index = file.index, error = %describe_js_error(&e), "Skipping file item"),
        }
    }
    blobs
}
