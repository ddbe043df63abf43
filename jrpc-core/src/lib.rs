//! Core JSON-RPC 2.0 types, error taxonomy and codec for jrpc
//!
//! This crate holds everything the server and client engines share:
//!
//! - **Types**: [`Id`], [`Params`], [`Call`], the wire request/response objects
//!   and the single-or-batch [`Envelope`]
//! - **Errors**: the crate-level [`Error`], the wire [`ErrorObject`], the
//!   reserved [`ErrorCode`] taxonomy and the extensible [`ErrorMapper`]
//! - **Codec**: payload decoding into envelopes and JSON encoding
//! - **Audit**: the [`AuditSink`] seam both engines record exchanges into
//! - **Observability**: OpenTelemetry and `tracing` setup
//!
//! The crate is transport-agnostic. `jrpc-server` turns a request context
//! into a reply; `jrpc-client` talks to whatever implements its `Transport`.
//!
//! # Example
//!
//! ```rust
//! use jrpc_core::{codec, Call, Id, Params};
//! use serde_json::json;
//!
//! let call = Call::new("add", Some(Params::Named(json!({"a": 5, "b": 3}).as_object().unwrap().clone())), Id::Number(1));
//! let json = codec::encode(&call.to_request()).unwrap();
//!
//! assert_eq!(json, r#"{"jsonrpc":"2.0","method":"add","params":{"a":5,"b":3},"id":1}"#);
//! ```

pub mod audit;
pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use audit::{AuditSink, Exchange, Headers, TracingAuditSink};
pub use error::{Error, ErrorCode, ErrorMapper, ErrorObject, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Call, Envelope, Id, JsonRpcRequest, JsonRpcResponse, Params, JSONRPC_VERSION};
