//! # Error Handling
//!
//! Error types for the Pod WebView bridge.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Lifecycle Errors                                                  │
//! │  │   ├── AlreadyInitialized    - Bridge already installed              │
//! │  │   └── InvalidConfig         - Rejected configuration                │
//! │  │                                                                      │
//! │  ├── Transport Errors                                                  │
//! │  │   ├── NativeTransport       - Native hand-off failed                │
//! │  │   ├── FallbackTransport     - Parent frame post failed              │
//! │  │   └── TransportUnavailable  - No channel to hand the message to     │
//! │  │                                                                      │
//! │  ├── Delivery Errors                                                   │
//! │  │   └── ListenerFailed        - A subscriber failed (always swallowed)│
//! │  │                                                                      │
//! │  └── File Payload Errors                                               │
//! │      ├── InvalidFilePayload    - Neither batch nor legacy shape        │
//! │      ├── InvalidFileItem       - One item of a batch is unusable       │
//! │      └── Base64Decode          - Item data is not valid base64         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Surfacing
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Internal (Rust)              WASM Boundary              Page (JS)     │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Result<T, Error>  ──────►  js_sys::Error(message) ──────► callback(e) │
//! │                                                                         │
//! │  Transport errors only ever reach the page through the emit callback. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the bridge
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Lifecycle Errors (100-199)
    // ========================================================================

    /// Bridge has already been installed
    #[error("Bridge has already been initialized.")]
    AlreadyInitialized,

    /// Configuration was rejected
    #[error("Invalid bridge configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Transport Errors (200-299)
    // ========================================================================

    /// The native handler threw while taking the message
    #[error("Failed to post to native: {0}")]
    NativeTransport(String),

    /// Posting to the parent frame failed
    #[error("Failed to post to parent frame: {0}")]
    FallbackTransport(String),

    /// The transport has nothing to hand the message to
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    // ========================================================================
    // Delivery Errors (300-399)
    // ========================================================================

    /// A subscriber failed while handling an event
    #[error("Listener failed: {0}")]
    ListenerFailed(String),

    // ========================================================================
    // File Payload Errors (400-499)
    // ========================================================================

    /// Payload matches neither the batch nor the legacy shape
    #[error("Invalid file payload: {0}")]
    InvalidFilePayload(String),

    /// One item of a batch cannot be materialized
    #[error("Invalid file item at index {index}: {reason}")]
    InvalidFileItem {
        /// Position of the item in the batch
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Item data is not valid base64
    #[error("Base64 decode failed: {0}")]
    Base64Decode(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// - 100-199: Lifecycle / configuration
    /// - 200-299: Transport
    /// - 300-399: Delivery
    /// - 400-499: File payloads
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            Error::AlreadyInitialized => 101,
            Error::InvalidConfig(_) => 102,

            Error::NativeTransport(_) => 200,
            Error::FallbackTransport(_) => 201,
            Error::TransportUnavailable(_) => 202,

            Error::ListenerFailed(_) => 300,

            Error::InvalidFilePayload(_) => 400,
            Error::InvalidFileItem { .. } => 401,
            Error::Base64Decode(_) => 402,

            Error::Internal(_) => 900,
            Error::SerializationError(_) => 902,
            Error::DeserializationError(_) => 903,
        }
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Base64Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_by_category() {
        assert_eq!(Error::AlreadyInitialized.code(), 101);
        assert_eq!(Error::NativeTransport("boom".into()).code(), 200);
        assert_eq!(Error::ListenerFailed("x".into()).code(), 300);
        assert_eq!(
            Error::InvalidFileItem { index: 2, reason: "missing base64".into() }.code(),
            401
        );
        assert_eq!(Error::Internal("x".into()).code(), 900);
    }

    #[test]
    fn test_json_error_converts() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), 902);
    }

    #[test]
    fn test_display_includes_item_index() {
        let err = Error::InvalidFileItem { index: 3, reason: "missing mime".into() };
        assert_eq!(err.to_string(), "Invalid file item at index 3: missing mime");
    }
}
