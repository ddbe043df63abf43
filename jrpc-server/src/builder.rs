//! Server builder for configuring JSON-RPC servers
//!
//! # Basic Usage
//!
//! ```rust
//! use jrpc_server::{from_typed_fn, JsonRpcServer, MethodDef, ParameterSpec};
//!
//! # fn example() -> jrpc_core::Result<()> {
//! let server = JsonRpcServer::builder()
//!     .method(
//!         MethodDef::new("add", from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) }))
//!             .param(ParameterSpec::required("a"))
//!             .param(ParameterSpec::required("b")),
//!     )
//!     .description("Calculator")
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Defaults
//!
//! - debug mode: from `JRPC_DEBUG` (`1` or `true`), otherwise off
//! - discovery (`?smd`): on
//! - content type: `application/json`
//! - cross-origin headers: on
//! - audit sink: [`TracingAuditSink`] under the service name "Server"
//! - legacy `"version": "json-rpc-2.0"` shim: off
//! - observability and metrics: off

use crate::{
    CallValidator, Dispatcher, Handler, JsonRpcServer, MethodDef, RegistryBuilder, ServerConfig,
    ServerMetrics,
};
use jrpc_core::{AuditSink, Error, ErrorMapper, ObservabilityConfig, Result, TracingAuditSink};
use std::sync::Arc;

/// Environment variable that switches debug mode on
pub const DEBUG_ENV: &str = "JRPC_DEBUG";

/// Builder for [`JsonRpcServer`]
pub struct ServerBuilder {
    registry: RegistryBuilder,
    debug: bool,
    legacy_version_tag: bool,
    discovery: bool,
    description: String,
    content_type: Option<String>,
    cross_origin: bool,
    audit_sink: Option<Arc<dyn AuditSink>>,
    service_name: String,
    errors: ErrorMapper,
    metrics: bool,
    observability_config: Option<ObservabilityConfig>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            registry: RegistryBuilder::new(),
            debug: debug_from_env(),
            legacy_version_tag: false,
            discovery: true,
            description: String::new(),
            content_type: Some("application/json".to_string()),
            cross_origin: true,
            audit_sink: Some(Arc::new(TracingAuditSink)),
            service_name: "Server".to_string(),
            errors: ErrorMapper::default(),
            metrics: false,
            observability_config: None,
        }
    }

    /// Register an operation
    pub fn method(mut self, def: MethodDef) -> Self {
        self.registry = self.registry.method(def);
        self
    }

    pub fn methods(mut self, defs: impl IntoIterator<Item = MethodDef>) -> Self {
        self.registry = self.registry.methods(defs);
        self
    }

    /// Register a handler without parameter metadata
    ///
    /// Such a handler receives the positional params as given, or nothing
    /// for named params.
    pub fn handler(self, method: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        self.method(MethodDef::new(method, handler))
    }

    /// Hide a method name from calls and discovery, ignoring case
    pub fn hide(mut self, method: impl Into<String>) -> Self {
        self.registry = self.registry.hide(method);
        self
    }

    /// Expose failure text in the `debug` member of error objects
    pub fn debug(mut self, enable: bool) -> Self {
        self.debug = enable;
        self
    }

    /// Accept `"version": "json-rpc-2.0"` as a protocol version declaration
    pub fn legacy_version_tag(mut self, enable: bool) -> Self {
        self.legacy_version_tag = enable;
        self
    }

    /// Serve the SMD service map for `?smd` requests
    pub fn discovery(mut self, enable: bool) -> Self {
        self.discovery = enable;
        self
    }

    /// Service description shown in the service map
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Do not emit a Content-Type header
    pub fn without_content_type(mut self) -> Self {
        self.content_type = None;
        self
    }

    /// Emit `Access-Control-Allow-*` headers
    pub fn cross_origin(mut self, enable: bool) -> Self {
        self.cross_origin = enable;
        self
    }

    pub fn audit_sink(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit_sink = Some(Arc::new(sink));
        self
    }

    pub fn audit_sink_arc(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn without_audit(mut self) -> Self {
        self.audit_sink = None;
        self
    }

    /// Service name recorded with each exchange and used for metrics
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Message for an error code, overriding the standard one
    pub fn error_message(mut self, code: i64, message: impl Into<String>) -> Self {
        self.errors.insert(code, message);
        self
    }

    /// Record OpenTelemetry metrics
    pub fn with_metrics(mut self) -> Self {
        self.metrics = true;
        self
    }

    /// Initialize observability when the server is built; implies metrics
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self.metrics = true;
        self
    }

    pub fn with_default_observability(self) -> Self {
        self.with_observability(ObservabilityConfig::default())
    }

    pub fn build(self) -> Result<JsonRpcServer> {
        if let Some(config) = self.observability_config {
            jrpc_core::init_observability(config).map_err(|e| {
                Error::Internal(format!("Failed to initialize observability: {}", e))
            })?;
        }

        let metrics = self
            .metrics
            .then(|| Arc::new(ServerMetrics::new(self.service_name.clone())));

        let registry = self.registry.build();
        let validator =
            CallValidator::new(registry.clone()).with_legacy_version_tag(self.legacy_version_tag);
        let dispatcher = Dispatcher::new(self.debug, self.errors);

        tracing::info!(
            service = %self.service_name,
            methods = registry.len(),
            debug = self.debug,
            discovery = self.discovery,
            "JSON-RPC server ready"
        );

        Ok(JsonRpcServer {
            registry,
            validator,
            dispatcher,
            config: Arc::new(ServerConfig {
                discovery: self.discovery,
                description: self.description,
                content_type: self.content_type,
                cross_origin: self.cross_origin,
                service_name: self.service_name,
            }),
            audit_sink: self.audit_sink,
            metrics,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn debug_from_env() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| parse_flag(&value))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
