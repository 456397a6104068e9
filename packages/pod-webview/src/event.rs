//! # Events and Wire Envelopes
//!
//! An event is a free-form type string plus a JSON payload. The two outbound
//! transports wrap it in differently named envelopes:
//!
//! ```text
//! native transport   : {"type": "<eventType>", "data": <eventData>}
//! fallback transport : {"eventType": "<eventType>", "eventData": <eventData>}
//! ```
//!
//! Consumers exist for both shapes, so neither may be renamed.

use serde::Serialize;

use crate::error::Result;

/// Arbitrary JSON payload carried by an event
pub type EventData = serde_json::Value;

// ============================================================================
// WELL-KNOWN EVENT TYPES
// ============================================================================

/// Announced once when the bridge is installed
pub const WEB_APP_INITIALIZED: &str = "web_app_initialized";
/// The page finished its own setup
pub const WEB_APP_READY: &str = "web_app_ready";
/// Ask the host to close the web app
pub const WEB_APP_CLOSE: &str = "web_app_close";
/// Ask the host to expand the web app surface
pub const WEB_APP_EXPAND: &str = "web_app_expand";
/// Ask the host to pick an image; the reply carries a file payload
pub const WEB_APP_PICK_IMAGE: &str = "web_app_pick_image";
/// Ask the host whether a permission is granted
pub const WEB_APP_CHECK_PERMISSION: &str = "web_app_check_permission";
/// Host reply to [`WEB_APP_CHECK_PERMISSION`]
pub const PERMISSION_CHECKED: &str = "permission_checked";

/// Payload substituted when an event is emitted without data.
pub fn empty_data() -> EventData {
    EventData::String(String::new())
}

// ============================================================================
// ENVELOPES
// ============================================================================

/// Envelope handed to the native host's message handler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeEnvelope<'a> {
    /// Event type
    #[serde(rename = "type")]
    pub event_type: &'a str,
    /// Event payload
    pub data: &'a EventData,
}

impl<'a> NativeEnvelope<'a> {
    /// Wrap an event for the native transport
    pub fn new(event_type: &'a str, data: &'a EventData) -> Self {
        Self { event_type, data }
    }

    /// Encode as JSON text
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Envelope posted to the parent frame when no native host is present
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackEnvelope<'a> {
    /// Event type
    pub event_type: &'a str,
    /// Event payload
    pub event_data: &'a EventData,
}

impl<'a> FallbackEnvelope<'a> {
    /// Wrap an event for the parent frame
    pub fn new(event_type: &'a str, event_data: &'a EventData) -> Self {
        Self { event_type, event_data }
    }

    /// Encode as JSON text
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
