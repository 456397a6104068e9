//! # Loopback Example
//!
//! Plays both sides of the bridge in one process: the page subscribes and
//! emits, a fake native host drains the outbox and answers through `deliver`.
//!
//! ## Run
//!
//! ```bash
//! RUST_LOG=debug cargo run --example loopback_demo
//! ```

use std::rc::Rc;

use pod_webview::event::{PERMISSION_CHECKED, WEB_APP_CHECK_PERMISSION, WEB_APP_PICK_IMAGE};
use pod_webview::files::file_listener;
use pod_webview::{Bridge, BridgeConfig, Callback, MemoryTransport};
use serde_json::json;

const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// What the fake host sends back for each request it understands.
fn host_reply(request: &serde_json::Value) -> Option<(&'static str, serde_json::Value)> {
    match request["type"].as_str()? {
        WEB_APP_CHECK_PERMISSION => Some((
            PERMISSION_CHECKED,
            json!({"permission": request["data"]["permission"], "granted": true}),
        )),
        WEB_APP_PICK_IMAGE => Some((
            WEB_APP_PICK_IMAGE,
            json!({"items": [
                {"source": "gallery", "base64": PNG_B64, "mime": "image/png"},
                {"source": "camera", "mime": "image/jpeg"}
            ]}),
        )),
        _ => None,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Pod WebView: Loopback Example ===\n");

    let native = Rc::new(MemoryTransport::new());
    let fallback = Rc::new(MemoryTransport::new());
    let bridge = Bridge::new(BridgeConfig::default(), Rc::clone(&native), Rc::clone(&fallback));

    // Step 1: Page subscribes
    println!("Step 1: Subscribing to host events...");
    bridge.subscribe(
        PERMISSION_CHECKED,
        Callback::new(|event_type, data| {
            println!("  [page] {} -> {}", event_type, data);
            Ok(())
        }),
    );
    bridge.subscribe(
        WEB_APP_PICK_IMAGE,
        file_listener(|_, batch| {
            for file in &batch.files {
                println!("  [page] received {} ({} bytes)", file.mime, file.size());
            }
            println!("  [page] skipped {} item(s)", batch.skipped.len());
        }),
    );
    println!();

    // Step 2: Page announces itself and sends requests
    println!("Step 2: Emitting to the host...");
    bridge.announce_ready();
    bridge.emit_with(WEB_APP_CHECK_PERMISSION, Some(json!({"permission": "gallery"})), |err| {
        println!("  [page] check_permission handed off: {}", err.is_none());
    });
    bridge.emit_with(WEB_APP_PICK_IMAGE, None, |err| {
        println!("  [page] pick_image handed off: {}", err.is_none());
    });
    println!();

    // Step 3: Host drains the outbox and answers
    println!("Step 3: Host processing outbox...");
    for payload in native.drain() {
        println!("  [host] <- {}", payload);
        let request: serde_json::Value = match serde_json::from_str(&payload) {
            Ok(value) => value,
            Err(e) => {
                println!("  [host] unreadable payload: {}", e);
                continue;
            }
        };
        if let Some((event_type, data)) = host_reply(&request) {
            bridge.deliver(event_type, &data);
        }
    }
    println!();

    // Step 4: Without a native host, the parent frame gets the other envelope
    println!("Step 4: Native host gone, falling back to parent frame...");
    native.set_available(false);
    if let Ok(kind) = bridge.emit("custom_action", Some(json!({"data": "value"}))) {
        println!("  [page] sent via {}", kind);
    }
    for payload in fallback.drain() {
        println!("  [parent] <- {}", payload);
    }
    println!();

    println!("=== Example Complete ===");
}
