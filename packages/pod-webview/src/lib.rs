//! # Pod WebView
//!
//! Bidirectional event bridge between a web page running inside a native
//! application's WebView and the native host.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        POD WEBVIEW MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │   Bridge    │  │  Registry   │  │  Transport  │  │    Files     │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - emit      │  │ - subscribe │  │ - native    │  │ - batch      │   │
//! │  │ - deliver   │  │ - dedupe    │  │ - fallback  │  │ - legacy     │   │
//! │  │ - announce  │  │ - snapshot  │  │ - memory    │  │ - decode     │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         └────────────────┴────────────────┴────────────────┘           │
//! │                                   │                                     │
//! │  ┌─────────────┐  ┌─────────────┐ │ ┌─────────────────────────────────┐│
//! │  │   Event     │  │   Config    │ │ │        FFI (wasm32 only)        ││
//! │  │             │  │             │◄┘ │                                 ││
//! │  │ - envelopes │  │ - names     │   │ - window.Pod.WebView            ││
//! │  │ - constants │  │ - log level │   │ - PodBridge / parent transports ││
//! │  └─────────────┘  └─────────────┘   └─────────────────────────────────┘│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Bridge configuration
//! - [`event`] - Event payloads, well-known types, wire envelopes
//! - [`registry`] - Callbacks and the subscription registry
//! - [`transport`] - Transport trait and in-process transports
//! - [`bridge`] - The bridge itself
//! - [`files`] - File payload materialization
//!
//! ## Example
//!
//! ```
//! use pod_webview::{Bridge, BridgeConfig, Callback, MemoryTransport, NullTransport};
//! use serde_json::json;
//!
//! let bridge = Bridge::new(BridgeConfig::default(), NullTransport, MemoryTransport::new());
//! bridge.subscribe("web_app_close", Callback::new(|_, _| Ok(())));
//!
//! assert_eq!(bridge.deliver("web_app_close", &json!(null)), 1);
//! assert!(bridge.emit("custom_action", Some(json!({"data": "value"}))).is_ok());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod files;
pub mod registry;
pub mod transport;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod ffi;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use event::EventData;
pub use files::{FileBatch, FilePayload, MaterializedFile};
pub use registry::{Callback, SubscriptionRegistry};
pub use transport::{MemoryTransport, NullTransport, Transport, TransportKind};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of the bridge
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
