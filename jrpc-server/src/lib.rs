//! JSON-RPC 2.0 server engine
//!
//! This crate turns one incoming HTTP-level request into the reply to write
//! back. It does not own a socket: the hosting HTTP layer builds a
//! [`RequestContext`] and hands it to [`JsonRpcServer::handle`].
//!
//! # Request Pipeline
//!
//! ```text
//! RequestContext
//!   -> discovery short-circuit (?smd)
//!   -> HTTP method check
//!   -> decode (single / batch)
//!   -> per call: CallValidator -> binder -> Dispatcher
//!   -> encode (mirrors the request shape)
//!   -> Reply + AuditSink
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use jrpc_server::{from_typed_fn, JsonRpcServer, MethodDef, ParameterSpec, RequestContext};
//!
//! # async fn example() -> jrpc_core::Result<()> {
//! let server = JsonRpcServer::builder()
//!     .method(
//!         MethodDef::new("subtract", from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a - b) }))
//!             .param(ParameterSpec::required("minuend"))
//!             .param(ParameterSpec::required("subtrahend")),
//!     )
//!     .build()?;
//!
//! let ctx = RequestContext::post(r#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#);
//! let reply = server.handle(&ctx).await.unwrap();
//! assert_eq!(reply.body, r#"{"jsonrpc":"2.0","result":19,"id":1}"#);
//! # Ok(())
//! # }
//! ```
//!
//! # Response Shape
//!
//! - single call: a single object, or no body for a notification
//! - batch: an array holding only the responses for calls with an id, or
//!   no body when there are none
//! - parse errors, empty batches and non-POST requests: a single error
//!   object with a null id

mod batch;
mod binder;
mod builder;
mod context;
mod dispatcher;
mod handler;
mod metrics;
mod registry;
mod service_map;
mod validator;

pub use batch::BatchProcessor;
pub use binder::bind;
pub use builder::{ServerBuilder, DEBUG_ENV};
pub use context::{Reply, RequestContext};
pub use dispatcher::{CallStatus, Dispatcher};
pub use handler::{from_fn, from_typed_fn, AsyncHandler, Handler, HandlerResult};
pub use jrpc_core::{AuditSink, Exchange, TracingAuditSink};
pub use metrics::ServerMetrics;
pub use registry::{
    MethodDef, MethodDescriptor, MethodEntry, MethodRegistry, ParameterSpec, RegistryBuilder,
    ReturnSpec, Visibility,
};
pub use service_map::{ServiceDescriptor, ServiceEntry, ServiceParameter, ServiceReturns};
pub use validator::{CallValidator, Rejection, ValidatedCall};

/// Re-exported for `#[rpc_method]` expansions
pub use serde_json::Value;

use chrono::Utc;
use jrpc_core::audit::record_exchange;
use jrpc_core::{codec, Envelope, ErrorCode, Headers, Id, JsonRpcResponse};
use std::sync::Arc;
use std::time::Instant;

/// Settings that shape replies
#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) discovery: bool,
    pub(crate) description: String,
    pub(crate) content_type: Option<String>,
    pub(crate) cross_origin: bool,
    pub(crate) service_name: String,
}

/// What one request produced, before encoding
enum Outcome {
    ServiceMap(Value),
    Single(JsonRpcResponse),
    Batch(Vec<JsonRpcResponse>),
    Nothing,
}

impl Outcome {
    fn kind(&self) -> &'static str {
        match self {
            Outcome::ServiceMap(_) => "discovery",
            Outcome::Single(_) => "single",
            Outcome::Batch(_) => "batch",
            Outcome::Nothing => "notification",
        }
    }
}

/// JSON-RPC 2.0 server engine
///
/// Cheap to clone; every clone shares the same registry and configuration.
/// All per-request state lives on the stack of [`handle`](Self::handle), so
/// one server may serve any number of requests concurrently.
#[derive(Clone)]
pub struct JsonRpcServer {
    registry: MethodRegistry,
    validator: CallValidator,
    dispatcher: Dispatcher,
    config: Arc<ServerConfig>,
    audit_sink: Option<Arc<dyn AuditSink>>,
    metrics: Option<Arc<ServerMetrics>>,
}

impl JsonRpcServer {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn is_debug(&self) -> bool {
        self.dispatcher.is_debug()
    }

    /// Handle one request
    ///
    /// Returns `None` when nothing must be written back: a single
    /// notification, or a batch made only of notifications.
    #[tracing::instrument(skip(self, ctx), name = "server.handle", fields(uri = %ctx.uri, body_len = ctx.body.len()))]
    pub async fn handle(&self, ctx: &RequestContext) -> Option<Reply> {
        let started_at = Utc::now();
        let timer = Instant::now();

        let outcome = self.process(ctx).await;
        let kind = outcome.kind();

        let (error_code, error_message) = match &outcome {
            Outcome::Single(JsonRpcResponse {
                error: Some(error),
                id: Id::Null,
                ..
            }) => (Some(error.code), Some(error.message.clone())),
            _ => (None, None),
        };

        let body = match outcome {
            Outcome::ServiceMap(document) => Some(document.to_string()),
            Outcome::Single(response) => Some(self.encode(&response)),
            Outcome::Batch(responses) => Some(self.encode(&responses)),
            Outcome::Nothing => None,
        };
        let reply = body.map(|body| Reply {
            headers: self.reply_headers(),
            body,
        });

        let elapsed = timer.elapsed();
        if let Some(ref metrics) = self.metrics {
            metrics.record_request(kind, elapsed.as_secs_f64());
        }
        tracing::debug!(kind = kind, replied = reply.is_some(), elapsed_ms = elapsed.as_millis() as u64, "Request handled");

        if let Some(ref sink) = self.audit_sink {
            let exchange = Exchange {
                service: self.config.service_name.clone(),
                request_headers: ctx.headers.clone(),
                request_body: String::from_utf8_lossy(&ctx.body).into_owned(),
                response_headers: reply.as_ref().map(|r| r.headers.clone()).unwrap_or_default(),
                response_body: reply.as_ref().map(|r| r.body.clone()).unwrap_or_default(),
                error_code,
                error_message,
                elapsed,
                started_at,
            };
            record_exchange(sink.as_ref(), &exchange).await;
        }

        reply
    }

    async fn process(&self, ctx: &RequestContext) -> Outcome {
        if self.config.discovery && ctx.has_query_param("smd") {
            if let Some(ref metrics) = self.metrics {
                metrics.record_discovery();
            }
            return Outcome::ServiceMap(self.service_map(ctx.path()).to_value());
        }

        if !ctx.is_post() {
            tracing::debug!(method = ?ctx.http_method, "Refusing non-POST request");
            self.count_error(ErrorCode::InvalidRequest.code());
            return Outcome::Single(
                self.dispatcher
                    .error_response(ErrorCode::InvalidRequest, Id::Null),
            );
        }

        match codec::decode_request(&ctx.payload()) {
            Err(e) => {
                tracing::debug!(error = %e, "Undecodable payload");
                let response = self.dispatcher.top_level_error(e);
                if let Some(ref error) = response.error {
                    self.count_error(error.code);
                }
                Outcome::Single(response)
            }
            Ok(Envelope::Single(call)) => match self.process_call(call).await {
                Some(response) => Outcome::Single(response),
                None => Outcome::Nothing,
            },
            Ok(Envelope::Batch(calls)) => {
                if let Some(ref metrics) = self.metrics {
                    metrics.record_batch(calls.len() as u64);
                }
                let responses = BatchProcessor::new()
                    .process_batch(calls, |call| self.process_call(call))
                    .await;
                if responses.is_empty() {
                    Outcome::Nothing
                } else {
                    Outcome::Batch(responses)
                }
            }
        }
    }

    /// Validate, bind and dispatch one call value
    async fn process_call(&self, call: Value) -> Option<JsonRpcResponse> {
        let validated = match self.validator.validate(call) {
            Ok(validated) => validated,
            Err(rejection) => {
                tracing::debug!(code = %rejection.code, id = ?rejection.id, detail = ?rejection.detail, "Call rejected");
                self.count_error(rejection.code.code());
                return self.dispatcher.reject(rejection);
            }
        };

        let args = match bind(validated.entry.descriptor(), validated.params.clone()) {
            Ok(args) => args,
            Err(error) => {
                self.count_error(error.code);
                return self.dispatcher.reject(Rejection {
                    code: error.error_code(),
                    id: validated.id,
                    detail: error.detail.as_ref().and_then(Value::as_str).map(str::to_string),
                });
            }
        };

        let method = validated.method.clone();
        let timer = Instant::now();
        let (response, status) = self.dispatcher.dispatch(validated, args).await;

        if let Some(ref metrics) = self.metrics {
            metrics.record_call(&method, status.as_str(), timer.elapsed().as_secs_f64());
        }

        response
    }

    /// The SMD service map for the given target path
    pub fn service_map(&self, target: &str) -> ServiceDescriptor {
        ServiceDescriptor::from_registry(
            &self.registry,
            target,
            self.config.description.clone(),
            self.config
                .content_type
                .clone()
                .unwrap_or_else(|| "application/json".to_string()),
        )
    }

    fn reply_headers(&self) -> Headers {
        let mut headers = Vec::new();
        if let Some(ref content_type) = self.config.content_type {
            headers.push(("Content-Type".to_string(), content_type.clone()));
        }
        if self.config.cross_origin {
            headers.push(("Access-Control-Allow-Origin".to_string(), "*".to_string()));
            headers.push((
                "Access-Control-Allow-Headers".to_string(),
                "x-requested-with, content-type".to_string(),
            ));
        }
        headers
    }

    fn encode<T: serde::Serialize>(&self, value: &T) -> String {
        codec::encode(value).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode response");
            self.encode_fallback()
        })
    }

    fn encode_fallback(&self) -> String {
        let response = self
            .dispatcher
            .error_response(ErrorCode::InternalError, Id::Null);
        serde_json::to_value(&response)
            .map(|value| value.to_string())
            .unwrap_or_default()
    }

    fn count_error(&self, code: i64) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_error(code);
        }
    }
}

impl std::fmt::Debug for JsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcServer")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
