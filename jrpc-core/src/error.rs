//! Error types for jrpc
//!
//! Two layers of errors live here:
//!
//! - **Error**: the crate-level error used in every `Result` (uses thiserror)
//! - **ErrorObject**: the wire-format `error` member of a JSON-RPC response
//!
//! On top of those sits the numeric taxonomy ([`ErrorCode`]) and the
//! [`ErrorMapper`], the table that turns a numeric code into the short
//! human-readable message placed in `error.message`.
//!
//! # Reserved Error Codes
//!
//! - `-32700`: Parse error (payload is not JSON)
//! - `-32600`: Invalid Request (wrong shape, wrong version, empty batch)
//! - `-32601`: Method not found (unknown or hidden method)
//! - `-32602`: Invalid params (shape, arity or missing required parameter)
//! - `-32603`: Internal error (uncaught operation failure)
//!
//! Codes in `-32768..=-32000` are reserved for the protocol. Anything else is
//! application-defined and passes through unchanged.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{ErrorCode, ErrorMapper, ErrorObject};
//!
//! let error = ErrorObject::invalid_params().with_detail("b not found");
//! assert_eq!(error.code, -32602);
//! assert_eq!(error.message, "Invalid params");
//!
//! let mapper = ErrorMapper::default().with_message(1001, "Insufficient funds");
//! assert_eq!(mapper.message(1001), "Insufficient funds");
//! assert_eq!(mapper.message(ErrorCode::MethodNotFound.code()), "Method not found");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Result type for jrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for jrpc operations
///
/// Handlers return this type, and so does every fallible engine boundary
/// (codec, binder, client commit). The server's dispatcher decides how each
/// variant surfaces on the wire:
///
/// - **Protocol-domain errors** (`JsonRpc`, `InvalidRequest`, `MethodNotFound`,
///   `InvalidParams`) keep their code and message verbatim.
/// - **Everything else** is flattened to `-32603 Internal error`, with the
///   original text only exposed in the `debug` member when debug mode is on.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// JSON-RPC protocol error, already in wire format
    ///
    /// Raised by handlers that want to answer with a specific code, and
    /// produced by the client when the server answered with an error object.
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] ErrorObject),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The transport collaborator failed to complete the exchange
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid JSON-RPC request format. Maps to `-32600`.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Method not found on the server. Maps to `-32601`.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid method parameters. Maps to `-32602`.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Unexpected failure. Maps to `-32603` with a generic message.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The response body was empty, `null`, or not JSON-RPC at all
    ///
    /// The client treats this as a failure of the whole exchange: no pending
    /// call is resolved.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A batch response carried an id that no pending call was waiting for
    ///
    /// Only raised when strict correlation is enabled on the client.
    #[error("Response for unknown id: {0}")]
    UnmatchedResponse(String),
}

impl Error {
    /// Build an application-defined error with a code and message
    ///
    /// ```rust
    /// use jrpc_core::Error;
    ///
    /// let err = Error::rpc(1001, "Insufficient funds");
    /// assert!(matches!(err, Error::JsonRpc(ref e) if e.code == 1001));
    /// ```
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Error::JsonRpc(ErrorObject::new(code, message))
    }

    /// The wire error this error maps to verbatim, if it is a protocol-domain error
    ///
    /// Returns `None` for failures that must be hidden behind a generic
    /// internal error (serialization, transport, internal...).
    pub fn protocol_error(&self) -> Option<ErrorObject> {
        match self {
            Error::JsonRpc(error) => Some(error.clone()),
            Error::InvalidRequest(detail) => {
                Some(ErrorObject::invalid_request().with_detail(detail.as_str()))
            }
            Error::MethodNotFound(detail) => {
                Some(ErrorObject::method_not_found().with_detail(detail.as_str()))
            }
            Error::InvalidParams(detail) => {
                Some(ErrorObject::invalid_params().with_detail(detail.as_str()))
            }
            _ => None,
        }
    }
}

/// Numeric JSON-RPC error codes
///
/// The five reserved codes have dedicated variants; every other code is
/// carried by `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `-32700`
    ParseError,
    /// `-32600`
    InvalidRequest,
    /// `-32601`
    MethodNotFound,
    /// `-32602`
    InvalidParams,
    /// `-32603`
    InternalError,
    /// Any other code (application-defined or implementation-defined server error)
    Custom(i64),
}

impl ErrorCode {
    /// Lowest code of the range reserved for the protocol
    pub const RESERVED_MIN: i64 = -32768;
    /// Highest code of the range reserved for the protocol
    pub const RESERVED_MAX: i64 = -32000;

    /// The numeric value sent on the wire
    pub const fn code(self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::Custom(code) => code,
        }
    }

    /// Whether a numeric code falls into the protocol-reserved range
    pub fn is_reserved(code: i64) -> bool {
        (Self::RESERVED_MIN..=Self::RESERVED_MAX).contains(&code)
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        match code {
            -32700 => ErrorCode::ParseError,
            -32600 => ErrorCode::InvalidRequest,
            -32601 => ErrorCode::MethodNotFound,
            -32602 => ErrorCode::InvalidParams,
            -32603 => ErrorCode::InternalError,
            other => ErrorCode::Custom(other),
        }
    }
}

impl From<ErrorCode> for i64 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// JSON-RPC error object as it appears in the `error` member of a response
///
/// ```json
/// {"code": -32602, "message": "Invalid params", "detail": "b not found"}
/// ```
///
/// `detail` is always serialized (as `null` when absent). `debug` is only
/// serialized when set, and the server only sets it in debug mode.
/// On deserialization the standard `data` member is accepted as `detail`,
/// so error objects from other JSON-RPC 2.0 servers decode too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Numeric error code
    pub code: i64,

    /// Short human-readable description
    pub message: String,

    /// Additional information about the failure (e.g. which parameter is missing)
    #[serde(default, alias = "data")]
    pub detail: Option<Value>,

    /// Debug channel, populated only when the server runs in debug mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

impl ErrorObject {
    /// Create an error with an explicit code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            debug: None,
        }
    }

    /// Create an error for a code using the default message table
    pub fn from_code(code: impl Into<ErrorCode>) -> Self {
        let code = code.into();
        Self::new(code.code(), default_message(code.code()))
    }

    /// Attach a detail payload
    pub fn with_detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach a debug payload
    pub fn with_debug(mut self, debug: impl Into<Value>) -> Self {
        self.debug = Some(debug.into());
        self
    }

    /// The typed code of this error
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self.code)
    }

    /// `-32700 Parse error`
    pub fn parse_error() -> Self {
        Self::from_code(ErrorCode::ParseError)
    }

    /// `-32600 Invalid Request`
    pub fn invalid_request() -> Self {
        Self::from_code(ErrorCode::InvalidRequest)
    }

    /// `-32601 Method not found`
    pub fn method_not_found() -> Self {
        Self::from_code(ErrorCode::MethodNotFound)
    }

    /// `-32602 Invalid params`
    pub fn invalid_params() -> Self {
        Self::from_code(ErrorCode::InvalidParams)
    }

    /// `-32603 Internal error`
    pub fn internal_error() -> Self {
        Self::from_code(ErrorCode::InternalError)
    }
}

impl fmt::Display for ErrorObject {
    /// Formats as "[code] message", e.g. "[-32601] Method not found"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorObject {}

const INTERNAL_ERROR_MESSAGE: &str = "Internal error";

fn default_message(code: i64) -> &'static str {
    match ErrorCode::from(code) {
        ErrorCode::ParseError => "Parse error",
        ErrorCode::InvalidRequest => "Invalid Request",
        ErrorCode::MethodNotFound => "Method not found",
        ErrorCode::InvalidParams => "Invalid params",
        ErrorCode::InternalError | ErrorCode::Custom(_) => INTERNAL_ERROR_MESSAGE,
    }
}

/// Table mapping numeric error codes to their human-readable messages
///
/// Starts out with the five reserved codes. Applications register messages
/// for their own codes with [`ErrorMapper::with_message`]; unknown codes map
/// to "Internal error".
#[derive(Debug, Clone)]
pub struct ErrorMapper {
    messages: HashMap<i64, String>,
}

impl Default for ErrorMapper {
    fn default() -> Self {
        let messages = [
            ErrorCode::ParseError,
            ErrorCode::InvalidRequest,
            ErrorCode::MethodNotFound,
            ErrorCode::InvalidParams,
            ErrorCode::InternalError,
        ]
        .into_iter()
        .map(|code| (code.code(), default_message(code.code()).to_string()))
        .collect();

        Self { messages }
    }
}

impl ErrorMapper {
    /// Create a mapper holding only the reserved codes
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or override) the message for a code
    pub fn with_message(mut self, code: i64, message: impl Into<String>) -> Self {
        self.insert(code, message);
        self
    }

    /// Register (or override) the message for a code in place
    pub fn insert(&mut self, code: i64, message: impl Into<String>) {
        self.messages.insert(code, message.into());
    }

    /// Message for a code, falling back to "Internal error"
    pub fn message(&self, code: i64) -> &str {
        self.messages
            .get(&code)
            .map(String::as_str)
            .unwrap_or(INTERNAL_ERROR_MESSAGE)
    }

    /// Build an error object for a code using this table's message
    pub fn error(&self, code: i64) -> ErrorObject {
        ErrorObject::new(code, self.message(code))
    }

    /// Whether a message is registered for a code
    pub fn contains(&self, code: i64) -> bool {
        self.messages.contains_key(&code)
    }
}
