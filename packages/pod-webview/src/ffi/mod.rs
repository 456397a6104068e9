//! # FFI Bindings
//!
//! Browser bindings for the bridge.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         FFI ARCHITECTURE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Page JavaScript / native container                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              window.Pod.WebView  (wasm.rs)                      │   │
//! │  │  subscribe │ unsubscribe │ emit │ deliver │ materializeFiles     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        Bridge (core)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Transports (web_transport.rs)                   │   │
//! │  │  window.PodBridge.postMessage  │  window.parent.postMessage     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Nothing here throws into the page. Emit failures reach the emit callback
//! as a JavaScript `Error`; init failures reject through `pod_webview_init`.

mod web_transport;

mod wasm;

pub use wasm::*;
pub use web_transport::{NativeHandlerTransport, ParentFrameTransport};

#[cfg(test)]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);
