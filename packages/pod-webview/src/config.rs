//! # Bridge Configuration
//!
//! Names the bridge uses to find and expose itself on the page, plus the
//! lifecycle event announced at startup. Every field has a default so a page
//! can pass a partial JSON object (or nothing at all).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::event::WEB_APP_INITIALIZED;

/// Configuration for a [`Bridge`](crate::Bridge) and its browser bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Global namespace object on `window` (`window.Pod`)
    pub namespace: String,
    /// Property of the namespace holding the bridge API (`Pod.WebView`)
    pub object_name: String,
    /// Global object injected by the native host (`window.PodBridge`)
    pub native_handler: String,
    /// Origin passed to the parent frame's `postMessage`
    pub target_origin: String,
    /// Lifecycle event emitted once the bridge is installed
    pub ready_event: String,
    /// Emit `ready_event` right after installation
    pub announce_on_init: bool,
    /// Maximum log level: trace, debug, info, warn or error
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            namespace: "Pod".to_string(),
            object_name: "WebView".to_string(),
            native_handler: "PodBridge".to_string(),
            target_origin: "*".to_string(),
            ready_event: WEB_APP_INITIALIZED.to_string(),
            announce_on_init: true,
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfig(format!("Invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject names the bridge could not install itself under.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("namespace", &self.namespace),
            ("objectName", &self.object_name),
            ("nativeHandler", &self.native_handler),
            ("targetOrigin", &self.target_origin),
            ("readyEvent", &self.ready_event),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{} must not be empty", field)));
            }
        }
        self.max_level()?;
        Ok(())
    }

    /// The configured log level as a `tracing` level.
    pub fn max_level(&self) -> Result<tracing::Level> {
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| Error::InvalidConfig(format!("Unknown log level: {}", self.log_level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_page_globals() {
        let config = BridgeConfig::default();
        assert_eq!(config.namespace, "Pod");
        assert_eq!(config.object_name, "WebView");
        assert_eq!(config.native_handler, "PodBridge");
        assert_eq!(config.target_origin, "*");
        assert_eq!(config.ready_event, "web_app_initialized");
        assert!(config.announce_on_init);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BridgeConfig::from_json(r#"{"nativeHandler":"HostBridge","logLevel":"debug"}"#)
            .unwrap();
        assert_eq!(config.native_handler, "HostBridge");
        assert_eq!(config.namespace, "Pod");
        assert_eq!(config.max_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = BridgeConfig::from_json(r#"{"namespace":"  "}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref msg) if msg.contains("namespace")));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let err = BridgeConfig::from_json(r#"{"logLevel":"loud"}"#).unwrap_err();
        assert_eq!(err.code(), 102);
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            BridgeConfig::from_json("{"),
            Err(Error::InvalidConfig(_))
        ));
    }
}
