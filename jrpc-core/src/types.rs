//! JSON-RPC 2.0 data model
//!
//! This module holds the value types shared by the server and client engines:
//!
//! 1. **Id**: the correlation token linking a call to its response
//! 2. **Params**: positional (`[...]`) or named (`{...}`) parameters
//! 3. **Call**: one call together with its eventual outcome
//! 4. **JsonRpcRequest / JsonRpcResponse**: the wire objects
//! 5. **Envelope**: a single object or a batch (JSON array) of them
//!
//! # Notifications
//!
//! A call without an `id` (absent or `null`) is a notification. No response
//! is ever produced for it. Throughout the crate this is modelled as
//! `Option<Id>` being `None`.
//!
//! # Call Lifecycle
//!
//! A [`Call`] is created by the client (or materialized from a decoded request
//! on the server), stays pending while neither `result` nor `error` is set,
//! and is resolved exactly once by [`Call::resolve`].

use crate::error::{Error, ErrorObject, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

/// Protocol version tag carried by every request and response
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request ID
///
/// Serialized untagged, directly as the inner value. `Hash + Eq` so ids can
/// key the client's pending-call map.
///
/// A peer may pick any JSON value as its id; whatever arrives is echoed back
/// unchanged. Ids that are neither strings nor `i64` integers land in
/// [`Id::Raw`].
///
/// ```rust
/// use jrpc_core::Id;
/// use serde_json::json;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
/// let id3: Id = serde_json::from_value(json!(1.5)).unwrap();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// assert_eq!(id3, Id::Raw(json!(1.5)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier
    String(String),
    /// Integer identifier, what the client's session counter produces
    Number(i64),
    /// Null identifier, used in responses whose request id could not be determined
    Null,
    /// Any other id value: fractional or out-of-range numbers, booleans,
    /// arrays, objects
    Raw(Value),
}

impl Id {
    /// Read the `id` member of a call object
    ///
    /// An absent member and an explicit `null` both mean "notification" and
    /// yield `None`. Every other value is kept as given.
    pub fn from_member(member: Option<&Value>) -> Option<Id> {
        match member {
            None | Some(Value::Null) => None,
            Some(value) => Some(Id::from(value.clone())),
        }
    }

    /// The id as a JSON value
    pub fn to_value(&self) -> Value {
        match self {
            Id::String(s) => Value::String(s.clone()),
            Id::Number(n) => Value::from(*n),
            Id::Null => Value::Null,
            Id::Raw(value) => value.clone(),
        }
    }
}

impl Eq for Id {}

impl Hash for Id {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Id::String(s) => s.hash(state),
            Id::Number(n) => n.hash(state),
            Id::Null => {}
            Id::Raw(value) => value.to_string().hash(state),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
            Id::Raw(value) => write!(f, "{}", value),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Id::Number(n),
            Err(_) => Id::Raw(Value::from(n)),
        }
    }
}

impl From<Value> for Id {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Id::Null,
            Value::String(s) => Id::String(s),
            Value::Number(n) => match n.as_i64() {
                Some(n) => Id::Number(n),
                None => Id::Raw(Value::Number(n)),
            },
            other => Id::Raw(other),
        }
    }
}

/// Name of a JSON value's type, for diagnostics
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Call parameters
///
/// JSON-RPC allows either an ordered list (bound by position) or a mapping
/// of parameter name to value (bound by name).
///
/// ```rust
/// use jrpc_core::Params;
/// use serde_json::json;
///
/// let positional: Params = serde_json::from_value(json!([1, 2])).unwrap();
/// assert!(matches!(positional, Params::Positional(ref v) if v.len() == 2));
///
/// let named: Params = serde_json::from_value(json!({"a": 1})).unwrap();
/// assert!(named.is_named());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    /// Ordered sequence of values
    Positional(Vec<Value>),
    /// Parameter name to value mapping
    Named(Map<String, Value>),
}

impl Params {
    /// Interpret a JSON value as params
    ///
    /// Returns `None` for anything that is neither an array nor an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(values) => Some(Params::Positional(values)),
            Value::Object(map) => Some(Params::Named(map)),
            _ => None,
        }
    }

    /// Build positional params from anything serializable into a JSON array
    /// or object (tuples, vectors, structs, maps)
    pub fn from_serializable<P: Serialize>(params: P) -> Result<Self> {
        let value = serde_json::to_value(params).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::from_value(value).ok_or_else(|| {
            Error::Serialization("params must serialize to a JSON array or object".to_string())
        })
    }

    /// Whether the params are named
    pub fn is_named(&self) -> bool {
        matches!(self, Params::Named(_))
    }

    /// Number of supplied values
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
        }
    }

    /// Whether no values were supplied
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

/// JSON-RPC 2.0 request object as sent on the wire
///
/// `id` is omitted for notifications, `params` when the call has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Name of the remote method
    pub method: String,
    /// Positional or named parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    /// Correlation id; absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

impl JsonRpcRequest {
    /// Create a request (or a notification when `id` is `None`)
    pub fn new(method: impl Into<String>, params: Option<Params>, id: Option<Id>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response object
///
/// Exactly one of `result` and `error` is present. The factory methods
/// enforce that on construction.
///
/// ```rust
/// use jrpc_core::{ErrorObject, Id, JsonRpcResponse};
/// use serde_json::json;
///
/// let ok = JsonRpcResponse::success(json!(19), Id::Number(1));
/// assert!(ok.is_success());
///
/// let failed = JsonRpcResponse::error(ErrorObject::method_not_found(), Id::Null);
/// assert!(failed.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Success payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    /// Id of the call this answers; `Id::Null` if it could not be determined
    #[serde(default = "null_id")]
    pub id: Id,
}

fn null_id() -> Id {
    Id::Null
}

impl JsonRpcResponse {
    /// Successful response
    pub fn success(result: Value, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Error response
    pub fn error(error: ErrorObject, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Whether this response carries a result
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Whether this response carries an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A single object or a batch of them
///
/// Deserialization tries `Batch` first, so a JSON array always becomes a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    /// JSON array of objects
    Batch(Vec<T>),
    /// One object
    Single(T),
}

impl<T> Envelope<T> {
    /// Whether this is a batch envelope
    pub fn is_batch(&self) -> bool {
        matches!(self, Envelope::Batch(_))
    }

    /// Number of objects carried
    pub fn len(&self) -> usize {
        match self {
            Envelope::Batch(items) => items.len(),
            Envelope::Single(_) => 1,
        }
    }

    /// Whether the envelope carries no objects (only possible for a batch)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into the carried objects, in order
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Envelope::Batch(items) => items,
            Envelope::Single(item) => vec![item],
        }
    }
}

/// One JSON-RPC call and its outcome
///
/// While pending, both `result` and `error` are `None`. [`Call::resolve`]
/// sets exactly one of them.
///
/// ```rust
/// use jrpc_core::{Call, Id, JsonRpcResponse, Params};
/// use serde_json::json;
///
/// let mut call = Call::new("subtract", Some(Params::Positional(vec![json!(42), json!(23)])), Id::Number(1));
/// assert!(call.is_pending());
///
/// call.resolve(JsonRpcResponse::success(json!(19), Id::Number(1)));
/// assert_eq!(call.result, Some(json!(19)));
/// assert!(!call.has_error());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Correlation id; `None` for notifications
    pub id: Option<Id>,
    /// Method name
    pub method: String,
    /// Parameters, if any
    pub params: Option<Params>,
    /// Success payload once resolved
    pub result: Option<Value>,
    /// Failure payload once resolved
    pub error: Option<ErrorObject>,
}

impl Call {
    /// A call that expects a response
    pub fn new(method: impl Into<String>, params: Option<Params>, id: Id) -> Self {
        Self {
            id: Some(id),
            method: method.into(),
            params,
            result: None,
            error: None,
        }
    }

    /// A fire-and-forget call
    pub fn notification(method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            id: None,
            method: method.into(),
            params,
            result: None,
            error: None,
        }
    }

    /// Whether no response will ever be produced for this call
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Whether the call is still waiting for its outcome
    pub fn is_pending(&self) -> bool {
        self.result.is_none() && self.error.is_none()
    }

    /// Whether the call resolved to an error
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Populate the outcome from a response
    ///
    /// An error member wins; otherwise the result is taken, with an absent
    /// result read as JSON `null`.
    pub fn resolve(&mut self, response: JsonRpcResponse) {
        match response.error {
            Some(error) => {
                self.error = Some(error);
                self.result = None;
            }
            None => {
                self.result = Some(response.result.unwrap_or(Value::Null));
                self.error = None;
            }
        }
    }

    /// The wire request for this call
    pub fn to_request(&self) -> JsonRpcRequest {
        JsonRpcRequest::new(self.method.clone(), self.params.clone(), self.id.clone())
    }

    /// Consume a resolved call, deserializing its result
    ///
    /// An error outcome becomes `Error::JsonRpc`; a pending call is an
    /// internal error.
    pub fn into_result<R: DeserializeOwned>(self) -> Result<R> {
        if let Some(error) = self.error {
            return Err(Error::JsonRpc(error));
        }
        let result = self
            .result
            .ok_or_else(|| Error::Internal(format!("call '{}' is still pending", self.method)))?;
        serde_json::from_value(result).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl From<JsonRpcRequest> for Call {
    fn from(request: JsonRpcRequest) -> Self {
        Self {
            id: request.id,
            method: request.method,
            params: request.params,
            result: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("test".to_string()).to_string(), "\"test\"");
        assert_eq!(Id::Number(42).to_string(), "42");
        assert_eq!(Id::Null.to_string(), "null");
    }

    #[test]
    fn test_id_from_member() {
        assert_eq!(Id::from_member(None), None);
        assert_eq!(Id::from_member(Some(&json!(null))), None);
        assert_eq!(Id::from_member(Some(&json!(7))), Some(Id::Number(7)));
        assert_eq!(
            Id::from_member(Some(&json!("abc"))),
            Some(Id::String("abc".into()))
        );
        assert_eq!(Id::from_member(Some(&json!(1.5))), Some(Id::Raw(json!(1.5))));
        assert_eq!(Id::from_member(Some(&json!(true))), Some(Id::Raw(json!(true))));
        assert_eq!(
            Id::from_member(Some(&json!({"a": 1}))),
            Some(Id::Raw(json!({"a": 1})))
        );
    }

    #[test]
    fn test_unusual_ids_echo_unchanged() {
        for raw in [json!(1.5), json!(18446744073709551615u64), json!(true), json!([1])] {
            let id = Id::from(raw.clone());
            assert_eq!(id.to_value(), raw);
            assert_eq!(serde_json::to_value(&id).unwrap(), raw);
            assert_eq!(serde_json::from_value::<Id>(raw.clone()).unwrap(), id);
        }
        assert_eq!(Id::from(u64::MAX), Id::Raw(json!(u64::MAX)));
        assert_eq!(Id::from(7u64), Id::Number(7));
    }

    #[test]
    fn test_raw_ids_key_a_map() {
        let mut ids = std::collections::HashMap::new();
        ids.insert(Id::Raw(json!(1.5)), 0);
        ids.insert(Id::Number(1), 1);
        assert_eq!(ids.get(&Id::from(json!(1.5))), Some(&0));
        assert_eq!(ids.get(&Id::from(json!(1))), Some(&1));
    }

    #[test]
    fn test_notification_request_omits_id() {
        let request = JsonRpcRequest::new("notify", None, None);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","method":"notify"}"#);
    }

    #[test]
    fn test_response_shapes() {
        let ok = JsonRpcResponse::success(Value::Null, Id::Number(3));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"jsonrpc": "2.0", "result": null, "id": 3})
        );

        let failed = JsonRpcResponse::error(ErrorObject::parse_error(), Id::Null);
        let value = serde_json::to_value(&failed).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32700);
        assert_eq!(value["id"], Value::Null);
    }

    #[test]
    fn test_resolve_sets_exactly_one() {
        let mut call = Call::new("m", None, Id::Number(1));
        call.resolve(JsonRpcResponse::error(ErrorObject::internal_error(), Id::Number(1)));
        assert!(call.has_error());
        assert!(call.result.is_none());

        call.resolve(JsonRpcResponse::success(json!("ok"), Id::Number(1)));
        assert!(!call.has_error());
        assert_eq!(call.result, Some(json!("ok")));
    }

    #[test]
    fn test_resolve_null_result_is_resolved() {
        let mut call = Call::new("m", None, Id::Number(1));
        let response: JsonRpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "result": null, "id": 1})).unwrap();
        call.resolve(response);

        assert!(!call.is_pending());
        assert_eq!(call.result, Some(Value::Null));
    }

    #[test]
    fn test_into_result() {
        let mut call = Call::new("sum", None, Id::Number(1));
        call.resolve(JsonRpcResponse::success(json!(6), Id::Number(1)));
        let sum: i64 = call.into_result().unwrap();
        assert_eq!(sum, 6);

        let pending = Call::new("sum", None, Id::Number(2));
        assert!(pending.into_result::<i64>().is_err());
    }

    #[test]
    fn test_envelope_untagged() {
        let batch: Envelope<Value> = serde_json::from_value(json!([{"a": 1}])).unwrap();
        assert!(batch.is_batch());
        assert_eq!(batch.len(), 1);

        let single: Envelope<Value> = serde_json::from_value(json!({"a": 1})).unwrap();
        assert!(!single.is_batch());
        assert_eq!(single.into_vec(), vec![json!({"a": 1})]);
    }

    #[test]
    fn test_params_from_serializable() {
        let params = Params::from_serializable((1, "two")).unwrap();
        assert_eq!(params, Params::Positional(vec![json!(1), json!("two")]));

        assert!(Params::from_serializable(5).is_err());
    }

    #[test]
    fn test_call_survives_the_wire() {
        let named = json!({"subtrahend": 23, "minuend": 42}).as_object().cloned().unwrap();
        let calls = vec![
            Call::new("subtract", Some(Params::Positional(vec![json!(42), json!(23)])), Id::Number(1)),
            Call::new("subtract", Some(Params::Named(named)), Id::String("req-2".into())),
            Call::new("get_data", None, Id::Raw(json!(1.5))),
            Call::new("get_data", None, Id::Raw(json!(u64::MAX))),
            Call::notification("notify_hello", Some(Params::Positional(vec![json!(7)]))),
            Call::notification("notify_sum", None),
        ];

        for call in calls {
            let json = crate::codec::encode(&call.to_request()).unwrap();
            let request: JsonRpcRequest = serde_json::from_str(&json).unwrap();
            let decoded = Call::from(request);

            assert_eq!(decoded.method, call.method);
            assert_eq!(decoded.params, call.params);
            assert_eq!(decoded.id, call.id);
            assert!(decoded.is_pending());
        }
    }
}
