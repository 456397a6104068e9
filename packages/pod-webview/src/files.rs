//! # File Payloads
//!
//! The host answers a `web_app_pick_image` request by delivering a file
//! payload. Two shapes are in circulation:
//!
//! ```text
//! batch  : { "items": [ { "source": "...", "base64": "...", "mime": "image/png" }, ... ] }
//! legacy : { "base64": "...", "mime"?: "...", "assetId"?: "..." }
//! ```
//!
//! A payload matching neither shape is logged and dropped. Inside a batch,
//! every item stands alone: one with a missing field or undecodable data is
//! skipped and the rest still materialize.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::event::EventData;
use crate::registry::Callback;

/// Content type used when a legacy payload carries none
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Decoder matching what browsers accept in a `data:` URL: padding is
/// optional and unused trailing bits are ignored.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// One entry of a file payload, as sent by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileItem {
    /// Where the file came from (e.g. "base64", "camera", "gallery")
    pub source: Option<String>,
    /// File contents, standard base64 or a `data:` URL
    pub base64: Option<String>,
    /// Content type
    pub mime: Option<String>,
    /// Host-side asset identifier
    pub asset_id: Option<String>,
}

/// A parsed file payload
#[derive(Debug, Clone, PartialEq)]
pub enum FilePayload {
    /// `{items: [...]}`; items are kept raw so each one is validated alone
    Batch(Vec<EventData>),
    /// `{base64, mime?, assetId?}`
    Legacy(FileItem),
}

/// A decoded file ready to hand to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedFile {
    /// Position in the payload
    pub index: usize,
    /// Origin label from the host, if any
    pub source: Option<String>,
    /// Content type
    pub mime: String,
    /// Host-side asset identifier, if any
    pub asset_id: Option<String>,
    /// Decoded contents
    pub bytes: Bytes,
}

impl MaterializedFile {
    /// Size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Render as `data:<mime>;base64,<data>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Outcome of materializing a payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileBatch {
    /// Files that decoded cleanly, in payload order
    pub files: Vec<MaterializedFile>,
    /// One `Error::InvalidFileItem` per skipped item
    pub skipped: Vec<Error>,
}

impl FilePayload {
    /// Recognize a payload. A JSON string holding the payload is accepted too.
    pub fn parse(value: &EventData) -> Result<Self> {
        if let Some(text) = value.as_str() {
            let inner: EventData = serde_json::from_str(text)
                .map_err(|e| Error::InvalidFilePayload(format!("not a JSON object: {}", e)))?;
            return Self::parse_object(&inner);
        }
        Self::parse_object(value)
    }

    fn parse_object(value: &EventData) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidFilePayload("expected an object".to_string()))?;

        if let Some(items) = object.get("items") {
            let items = items
                .as_array()
                .ok_or_else(|| Error::InvalidFilePayload("items must be an array".to_string()))?;
            if items.is_empty() {
                return Err(Error::InvalidFilePayload("items array is required".to_string()));
            }
            return Ok(FilePayload::Batch(items.clone()));
        }

        if object.get("base64").is_some_and(|b| b.is_string()) {
            let item: FileItem = serde_json::from_value(value.clone())
                .map_err(|e| Error::InvalidFilePayload(e.to_string()))?;
            return Ok(FilePayload::Legacy(item));
        }

        Err(Error::InvalidFilePayload(
            "expected {items: [...]} or {base64, mime?}".to_string(),
        ))
    }

    /// Number of items in the payload
    pub fn len(&self) -> usize {
        match self {
            FilePayload::Batch(items) => items.len(),
            FilePayload::Legacy(_) => 1,
        }
    }

    /// Whether the payload carries no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode every item, skipping the ones that cannot be decoded.
    pub fn materialize(&self) -> FileBatch {
        let mut batch = FileBatch::default();
        match self {
            FilePayload::Batch(items) => {
                for (index, raw) in items.iter().enumerate() {
                    let decoded = serde_json::from_value::<FileItem>(raw.clone())
                        .map_err(|e| invalid_item(index, e.to_string()))
                        .and_then(|item| decode_item(index, &item, None));
                    batch.push(decoded);
                }
            }
            FilePayload::Legacy(item) => {
                batch.push(decode_item(0, item, Some(DEFAULT_MIME)));
            }
        }
        batch
    }
}

impl FileBatch {
    fn push(&mut self, decoded: Result<MaterializedFile>) {
        match decoded {
            Ok(file) => self.files.push(file),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping file item");
                self.skipped.push(e);
            }
        }
    }

    /// Whether no file materialized
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Parse and decode a payload in one go.
///
/// An unrecognized payload is logged and returned as the error; item-level
/// problems only show up in [`FileBatch::skipped`].
pub fn materialize(value: &EventData) -> Result<FileBatch> {
    let payload = FilePayload::parse(value).map_err(|e| {
        tracing::warn!(error = %e, "Dropping file payload");
        e
    })?;
    Ok(payload.materialize())
}

/// A callback that materializes every delivered payload and passes the
/// result to `handler`. Invalid payloads are logged and dropped.
pub fn file_listener<F>(handler: F) -> Callback
where
    F: Fn(&str, FileBatch) + 'static,
{
    Callback::new(move |event_type, data| {
        if let Ok(batch) = materialize(data) {
            handler(event_type, batch);
        }
        Ok(())
    })
}

// ============================================================================
// DECODING
// ============================================================================

fn invalid_item(index: usize, reason: impl Into<String>) -> Error {
    Error::InvalidFileItem {
        index,
        reason: reason.into(),
    }
}

fn decode_item(index: usize, item: &FileItem, default_mime: Option<&str>) -> Result<MaterializedFile> {
    let encoded = item
        .base64
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| invalid_item(index, "missing base64"))?;

    let (url_mime, data) = split_data_url(encoded);

    let mime = item
        .mime
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .or(url_mime)
        .or(default_mime)
        .ok_or_else(|| invalid_item(index, "missing mime"))?
        .to_string();

    let bytes = decode_base64(data).map_err(|e| invalid_item(index, e.to_string()))?;

    Ok(MaterializedFile {
        index,
        source: item.source.clone(),
        mime,
        asset_id: item.asset_id.clone(),
        bytes: Bytes::from(bytes),
    })
}

/// Split `data:<mime>;base64,<data>` into its mime and data parts.
fn split_data_url(encoded: &str) -> (Option<&str>, &str) {
    let Some(rest) = encoded.strip_prefix("data:") else {
        return (None, encoded);
    };
    match rest.split_once(";base64,") {
        Some((mime, data)) if !mime.is_empty() => (Some(mime), data),
        Some((_, data)) => (None, data),
        None => (None, encoded),
    }
}

fn decode_base64(data: &str) -> Result<Vec<u8>> {
    // Hosts wrap long base64 output at fixed line widths
    if data.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        return Ok(LENIENT.decode(compact)?);
    }
    Ok(LENIENT.decode(data)?)
}
