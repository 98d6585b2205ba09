// Payload templates: the status-update document patched onto every asset
// and the comment posted to every asset's feed. Both are loaded once.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

/// Field set on every per-asset copy of the status template.
pub const SERIAL_NUMBER_FIELD: &str = "serialNumber";

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("JSON file not found at: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to parse JSON from file: {}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("An error occurred while reading the JSON file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON file {} must contain an object", .0.display())]
    NotAnObject(PathBuf),
    #[error("JSON file {} is empty", .0.display())]
    Empty(PathBuf),
}

/// Status fields replaced on each asset. Key order follows the file.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPayload(Map<String, Value>);

/// Body of the feed entry posted after a successful update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommentPayload(Value);

/// One entry of a JSON Patch document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    pub op: &'static str,
    pub path: String,
    pub value: Value,
}

impl StatusPayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        StatusPayload(fields)
    }

    pub fn load(path: &Path) -> Result<Self, PayloadError> {
        match read_json(path)? {
            Value::Object(map) if map.is_empty() => Err(PayloadError::Empty(path.to_path_buf())),
            Value::Object(map) => Ok(StatusPayload(map)),
            _ => Err(PayloadError::NotAnObject(path.to_path_buf())),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// A fresh payload for one asset with `serialNumber` set. The template
    /// is left untouched.
    pub fn for_serial_number(&self, serial_number: &str) -> StatusPayload {
        let mut fields = self.0.clone();
        fields.insert(
            SERIAL_NUMBER_FIELD.to_string(),
            Value::String(serial_number.to_string()),
        );
        StatusPayload(fields)
    }

    /// One `replace` operation per top-level key. Keys go into the path
    /// as-is, without JSON Pointer escaping.
    pub fn patch_document(&self) -> Vec<PatchOperation> {
        self.0
            .iter()
            .map(|(key, value)| PatchOperation {
                op: "replace",
                path: format!("/{key}"),
                value: value.clone(),
            })
            .collect()
    }
}

impl CommentPayload {
    pub fn new(body: Value) -> Self {
        CommentPayload(body)
    }

    pub fn load(path: &Path) -> Result<Self, PayloadError> {
        let body = read_json(path)?;
        if is_blank(&body) {
            return Err(PayloadError::Empty(path.to_path_buf()));
        }
        Ok(CommentPayload(body))
    }

    pub fn body(&self) -> &Value {
        &self.0
    }
}

/// Load the status template, logging the reason on failure.
pub fn load_status_payload(path: &Path) -> Option<StatusPayload> {
    StatusPayload::load(path)
        .map_err(|e| error!("{e}"))
        .ok()
}

/// Load the comment template, logging the reason on failure.
pub fn load_comment_payload(path: &Path) -> Option<CommentPayload> {
    CommentPayload::load(path)
        .map_err(|e| error!("{e}"))
        .ok()
}

fn read_json(path: &Path) -> Result<Value, PayloadError> {
    let text = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => PayloadError::NotFound(path.to_path_buf()),
        _ => PayloadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_str(&text).map_err(|source| PayloadError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

// Empty containers, empty strings, null, false and zero carry nothing to send.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
