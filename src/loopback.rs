//! In-process transport from a client session straight into a server

use async_trait::async_trait;
use jrpc_client::{Transport, TransportReply};
use jrpc_core::Result;
use jrpc_server::{JsonRpcServer, RequestContext};

/// Delivers each request body to a [`JsonRpcServer`] as an HTTP POST
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    server: JsonRpcServer,
    uri: String,
}

impl LoopbackTransport {
    pub fn new(server: JsonRpcServer) -> Self {
        Self {
            server,
            uri: "/".to_string(),
        }
    }

    /// Request URI presented to the server, query string included
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, body: String) -> Result<TransportReply> {
        let ctx = RequestContext::post(body)
            .with_uri(self.uri.clone())
            .with_header("Content-Type", "application/json");

        let reply = self.server.handle(&ctx).await;

        Ok(TransportReply {
            request_headers: ctx.headers,
            response_headers: reply.as_ref().map(|r| r.headers.clone()).unwrap_or_default(),
            body: reply.map(|r| r.body).unwrap_or_default(),
        })
    }
}
