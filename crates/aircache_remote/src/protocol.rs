//! Wire format of the remote service.
//!
//! List responses are wrapped as `{success, count, data: [...]}`. Object
//! responses are bare JSON objects, although some servers wrap those as
//! `{success, data: {...}}` too; both forms are accepted.

use crate::error::{RemoteError, RemoteResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Decoded list response.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    /// Records from the `data` array.
    pub items: Vec<T>,
    /// The envelope's `success` flag (`true` when absent).
    pub success: bool,
    /// The envelope's `count` field, if present.
    pub count: Option<u64>,
    /// True when the envelope had no `data` field.
    ///
    /// The items are then empty. Callers decide whether an empty snapshot
    /// is trustworthy.
    pub data_missing: bool,
}

impl<T> Listing<T> {
    /// Creates a complete listing.
    pub fn new(items: Vec<T>) -> Self {
        let count = items.len() as u64;
        Self {
            items,
            success: true,
            count: Some(count),
            data_missing: false,
        }
    }

    /// Creates the listing decoded from an envelope without `data`.
    pub fn missing_data() -> Self {
        Self {
            items: Vec::new(),
            success: true,
            count: None,
            data_missing: true,
        }
    }
}

/// Decodes a list response.
pub fn decode_listing<T: DeserializeOwned>(body: &[u8]) -> RemoteResult<Listing<T>> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RemoteError::MalformedResponse(format!("invalid JSON: {e}")))?;

    match value {
        Value::Array(items) => Ok(Listing::new(decode_items(items)?)),
        Value::Object(mut envelope) => {
            let success = envelope
                .get("success")
                .and_then(Value::as_bool)
                .unwrap_or(true);
            let count = envelope.get("count").and_then(Value::as_u64);
            match envelope.remove("data") {
                None | Some(Value::Null) => Ok(Listing {
                    success,
                    count,
                    ..Listing::missing_data()
                }),
                Some(Value::Array(items)) => Ok(Listing {
                    items: decode_items(items)?,
                    success,
                    count,
                    data_missing: false,
                }),
                Some(other) => Err(RemoteError::MalformedResponse(format!(
                    "expected `data` array, found {}",
                    kind_of(&other)
                ))),
            }
        }
        other => Err(RemoteError::MalformedResponse(format!(
            "expected list envelope, found {}",
            kind_of(&other)
        ))),
    }
}

fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> RemoteResult<Vec<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| {
                RemoteError::MalformedResponse(format!("record {index}: {e}"))
            })
        })
        .collect()
}

/// Decodes an object response, unwrapping a `data` object if present.
pub fn decode_object<T: DeserializeOwned>(body: &[u8]) -> RemoteResult<T> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RemoteError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let record = match value {
        Value::Object(mut object) if matches!(object.get("data"), Some(Value::Object(_))) => {
            object.remove("data").unwrap_or(Value::Null)
        }
        Value::Object(object) => Value::Object(object),
        other => {
            return Err(RemoteError::MalformedResponse(format!(
                "expected object, found {}",
                kind_of(&other)
            )))
        }
    };

    serde_json::from_value(record).map_err(|e| RemoteError::MalformedResponse(e.to_string()))
}

/// Encodes a request body.
pub fn encode_body<T: Serialize>(record: &T) -> RemoteResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| RemoteError::InvalidRequest(e.to_string()))
}

/// Extracts a human-readable message from an error response body.
pub fn error_message(body: &[u8]) -> String {
    if let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(body) {
        let message = object.get("message").and_then(Value::as_str);
        let detail = object.get("error").and_then(Value::as_str);
        match (message, detail) {
            (Some(m), Some(d)) => return format!("{m}: {d}"),
            (Some(m), None) => return m.to_string(),
            (None, Some(d)) => return d.to_string(),
            (None, None) => {}
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "no response body".to_string()
    } else {
        text.chars().take(200).collect()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
