//! Transport seam between the client engine and the network
//!
//! The engine never opens sockets itself. A [`Transport`] carries one encoded
//! request body to the server and hands back whatever came back, together with
//! the headers that were exchanged (kept for the audit trail). Timeouts,
//! retries and TLS belong to the transport.

use async_trait::async_trait;
use jrpc_core::{Headers, Result};

/// Raw outcome of one round trip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportReply {
    /// Headers actually sent with the request
    pub request_headers: Headers,
    pub response_headers: Headers,
    /// Response body; empty when the server wrote nothing
    pub body: String,
}

impl TransportReply {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_response_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response_headers.push((name.into(), value.into()));
        self
    }
}

/// Carries an encoded request to the server
///
/// Implementations return `Error::Transport` when the exchange could not be
/// completed. An HTTP-level reply with an empty body is not a transport
/// failure.
///
/// ```rust
/// use async_trait::async_trait;
/// use jrpc_client::{Transport, TransportReply};
///
/// struct Silent;
///
/// #[async_trait]
/// impl Transport for Silent {
///     async fn send(&self, _body: String) -> jrpc_core::Result<TransportReply> {
///         Ok(TransportReply::default())
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, body: String) -> Result<TransportReply>;
}
