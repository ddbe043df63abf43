//! Codec for JSON-RPC envelopes
//!
//! Turns raw payloads into [`Envelope`]s of untyped call/response values and
//! serializes outgoing objects back to JSON text.
//!
//! Decoding stops at the envelope level on purpose: individual batch elements
//! stay as `serde_json::Value` so that one malformed element can be rejected
//! on its own while the rest of the batch is still processed.
//!
//! # Errors
//!
//! Request side (server):
//! - Invalid JSON → `Error::JsonRpc` with code `-32700` (Parse error)
//! - An empty batch `[]` → `Error::JsonRpc` with code `-32600` (Invalid Request)
//!
//! Response side (client):
//! - Empty, unparseable, `null` or scalar bodies → `Error::InvalidResponse`
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{codec, Envelope};
//!
//! let batch = codec::decode_request(br#"[{"jsonrpc":"2.0","method":"a","id":1}]"#).unwrap();
//! assert!(batch.is_batch());
//!
//! let err = codec::decode_request(b"{not json").unwrap_err();
//! assert_eq!(err.protocol_error().unwrap().code, -32700);
//! ```

use crate::error::{Error, ErrorObject, Result};
use crate::types::{json_type_name, Envelope, JsonRpcResponse};
use serde::Serialize;
use serde_json::Value;

/// Encode any serializable message to a JSON string
///
/// A slice of requests encodes as a batch array.
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode an incoming request payload
///
/// A JSON array becomes `Envelope::Batch`, anything else `Envelope::Single`.
/// Structural checks on the individual calls (object shape, version, method)
/// are left to the validator, so `null` or `42` decode fine here and are
/// rejected later as invalid requests.
pub fn decode_request(data: &[u8]) -> Result<Envelope<Value>> {
    let value: Value =
        serde_json::from_slice(data).map_err(|_| Error::JsonRpc(ErrorObject::parse_error()))?;

    match value {
        Value::Array(items) if items.is_empty() => Err(Error::JsonRpc(
            ErrorObject::invalid_request().with_detail("Batch cannot be empty"),
        )),
        Value::Array(items) => Ok(Envelope::Batch(items)),
        other => Ok(Envelope::Single(other)),
    }
}

/// Decode a response body received by the client
///
/// The body must be a JSON object (single response) or array (batch response).
pub fn decode_response(data: &str) -> Result<Envelope<Value>> {
    if data.trim().is_empty() {
        return Err(Error::InvalidResponse("empty response body".to_string()));
    }

    let value: Value = serde_json::from_str(data)
        .map_err(|e| Error::InvalidResponse(format!("unparseable response body: {}", e)))?;

    match value {
        Value::Array(items) => Ok(Envelope::Batch(items)),
        Value::Object(_) => Ok(Envelope::Single(value)),
        other => Err(Error::InvalidResponse(format!(
            "expected a response object or array, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Interpret one decoded value as a response object
pub fn parse_response(value: Value) -> Result<JsonRpcResponse> {
    serde_json::from_value(value).map_err(|e| Error::InvalidResponse(e.to_string()))
}
