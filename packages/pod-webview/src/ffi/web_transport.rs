//! # Browser Transports
//!
//! - [`NativeHandlerTransport`]: the object the native container injects into
//!   the page (`window.PodBridge`) with a `postMessage(text)` method.
//! - [`ParentFrameTransport`]: `window.parent.postMessage(text, origin)`, used
//!   when the page runs in a plain browser frame during development.

use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Best-effort message of a JavaScript exception.
pub(crate) fn describe_js_error(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

// ============================================================================
// NATIVE HANDLER
// ============================================================================

/// Posts to `window[handler].postMessage`
#[derive(Debug, Clone)]
pub struct NativeHandlerTransport {
    handler: String,
}

impl NativeHandlerTransport {
    /// Use the global object named `handler`
    pub fn new(handler: impl Into<String>) -> Self {
        Self { handler: handler.into() }
    }

    /// Look the handler up again; the container may inject or remove it at
    /// any time.
    fn resolve(&self) -> Option<(JsValue, Function)> {
        let window = web_sys::window()?;
        let handler = Reflect::get(&window, &JsValue::from_str(&self.handler)).ok()?;
        if handler.is_undefined() || handler.is_null() {
            return None;
        }
        let post = Reflect::get(&handler, &JsValue::from_str("postMessage")).ok()?;
        let post = post.dyn_into::<Function>().ok()?;
        Some((handler, post))
    }
}

impl Transport for NativeHandlerTransport {
    fn is_available(&self) -> bool {
        self.resolve().is_some()
    }

    fn post(&self, payload: &str) -> Result<()> {
        let (handler, post) = self.resolve().ok_or_else(|| {
            Error::TransportUnavailable(format!("window.{}.postMessage is missing", self.handler))
        })?;
        // Called with the handler as `this`; Android JS interfaces require it
        post.call1(&handler, &JsValue::from_str(payload))
            .map(|_| ())
            .map_err(|e| Error::NativeTransport(describe_js_error(&e)))
    }
}

// ============================================================================
// PARENT FRAME
// ============================================================================

/// Posts to `window.parent` with a fixed target origin
#[derive(Debug, Clone)]
pub struct ParentFrameTransport {
    target_origin: String,
}

impl ParentFrameTransport {
    /// Address messages to `target_origin` (`"*"` for any)
    pub fn new(target_origin: impl Into<String>) -> Self {
        Self {
            target_origin: target_origin.into(),
        }
    }
}

impl Transport for ParentFrameTransport {
    fn is_available(&self) -> bool {
        web_sys::window().is_some()
    }

    fn post(&self, payload: &str) -> Result<()> {
        let window = web_sys::window()
            .ok_or_else(|| Error::FallbackTransport("no window in this context".to_string()))?;
        let parent = window
            .parent()
            .map_err(|e| Error::FallbackTransport(describe_js_error(&e)))?
            .ok_or_else(|| Error::FallbackTransport("no parent window".to_string()))?;
        parent
            .post_message(&JsValue::from_str(payload), &self.target_origin)
            .map_err(|e| Error::FallbackTransport(describe_js_error(&e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn window() -> web_sys::Window {
        web_sys::window().unwrap()
    }

    /// Install `window[name]`; each test uses its own name.
    fn inject(name: &str, handler: &JsValue) {
        Reflect::set(&window(), &JsValue::from_str(name), handler).unwrap();
    }

    fn remove(name: &str) {
        Reflect::delete_property(&window(), &JsValue::from_str(name)).unwrap();
    }

    fn make_handler(post_message_body: &str) -> JsValue {
        let source = format!(
            "return {{ sent: [], postMessage(message) {{ {} }} }};",
            post_message_body
        );
        Function::new_no_args(&source).call0(&JsValue::NULL).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_missing_handler_is_unavailable() {
        let transport = NativeHandlerTransport::new("PodBridgeNeverInjected");
        assert!(!transport.is_available());
        assert!(matches!(
            transport.post("{}"),
            Err(Error::TransportUnavailable(_))
        ));
    }

    #[wasm_bindgen_test]
    fn test_handler_needs_post_message_function() {
        let name = "PodBridgeShapes";
        let transport = NativeHandlerTransport::new(name);

        inject(name, &js_sys::Object::new());
        assert!(!transport.is_available());

        let wrong = js_sys::Object::new();
        Reflect::set(&wrong, &JsValue::from_str("postMessage"), &JsValue::from_str("nope")).unwrap();
        inject(name, &wrong);
        assert!(!transport.is_available());

        inject(name, &make_handler(""));
        assert!(transport.is_available());

        remove(name);
        assert!(!transport.is_available());
    }

    #[wasm_bindgen_test]
    fn test_post_calls_handler_as_receiver() {
        let name = "PodBridgeReceiver";
        let handler = make_handler("this.sent.push(message);");
        inject(name, &handler);

        let transport = NativeHandlerTransport::new(name);
        transport.post(r#"{"type":"evt","data":""}"#).unwrap();

        let sent: js_sys::Array = Reflect::get(&handler, &JsValue::from_str("sent"))
            .unwrap()
            .dyn_into()
            .unwrap();
        assert_eq!(sent.length(), 1);
        assert_eq!(sent.get(0).as_string().as_deref(), Some(r#"{"type":"evt","data":""}"#));
        remove(name);
    }

    #[wasm_bindgen_test]
    fn test_throwing_handler_maps_to_native_error() {
        let name = "PodBridgeThrows";
        inject(name, &make_handler("throw new Error('denied');"));

        let transport = NativeHandlerTransport::new(name);
        assert_eq!(
            transport.post("{}"),
            Err(Error::NativeTransport("denied".to_string()))
        );
        remove(name);
    }

    #[wasm_bindgen_test]
    fn test_parent_frame_post_succeeds_in_top_window() {
        // A top-level window is its own parent
        let transport = ParentFrameTransport::new("*");
        assert!(transport.is_available());
        assert!(transport.post(r#"{"eventType":"evt","eventData":""}"#).is_ok());
    }
}
