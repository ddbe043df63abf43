//! Client builder
//!
//! # Examples
//!
//! ```rust
//! use async_trait::async_trait;
//! use jrpc_client::{ClientBuilder, Transport, TransportReply};
//!
//! struct Silent;
//!
//! #[async_trait]
//! impl Transport for Silent {
//!     async fn send(&self, _body: String) -> jrpc_core::Result<TransportReply> {
//!         Ok(TransportReply::default())
//!     }
//! }
//!
//! # fn example() -> jrpc_core::Result<()> {
//! let client = ClientBuilder::new(Silent)
//!     .strict_correlation(true)
//!     .service_name("billing-client")
//!     .build()?;
//! assert!(!client.is_batching());
//! # Ok(())
//! # }
//! ```
//!
//! # Defaults
//!
//! - unmatched batch responses are dropped and logged
//! - audit sink: [`TracingAuditSink`] under the service name "Client"
//! - observability and metrics: off

use crate::{BatchCoordinator, ClientMetrics, JrpcClient, ResponseCorrelator, Transport};
use jrpc_core::{AuditSink, Error, ObservabilityConfig, Result, TracingAuditSink};
use std::sync::Arc;

/// Builder for configuring and creating a [`JrpcClient`]
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    strict_correlation: bool,
    audit_sink: Option<Arc<dyn AuditSink>>,
    service_name: String,
    metrics: bool,
    observability_config: Option<ObservabilityConfig>,
}

impl ClientBuilder {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    /// Share one transport between several sessions
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            strict_correlation: false,
            audit_sink: Some(Arc::new(TracingAuditSink)),
            service_name: "Client".to_string(),
            metrics: false,
            observability_config: None,
        }
    }

    /// Fail a batch whose response carries ids no call was waiting for
    pub fn strict_correlation(mut self, strict: bool) -> Self {
        self.strict_correlation = strict;
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

    /// Name recorded with each exchange and used as the metrics scope
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    pub fn with_metrics(mut self) -> Self {
        self.metrics = true;
        self
    }

    /// Initialize observability when the client is built; implies metrics
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self.metrics = true;
        self
    }

    pub fn with_default_observability(self) -> Self {
        self.with_observability(ObservabilityConfig::default())
    }

    pub fn build(mut self) -> Result<JrpcClient> {
        if let Some(config) = self.observability_config.take() {
            jrpc_core::init_observability(config).map_err(|e| {
                Error::Internal(format!("Failed to initialize observability: {}", e))
            })?;
        }
        Ok(self.into_client())
    }

    pub(crate) fn into_client(self) -> JrpcClient {
        let metrics = self
            .metrics
            .then(|| Arc::new(ClientMetrics::new(self.service_name.clone())));

        JrpcClient {
            transport: self.transport,
            coordinator: BatchCoordinator::new(),
            correlator: ResponseCorrelator::new().strict(self.strict_correlation),
            audit_sink: self.audit_sink,
            service_name: self.service_name,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransportReply;
    use async_trait::async_trait;

    struct Silent;

    #[async_trait]
    impl Transport for Silent {
        async fn send(&self, _body: String) -> Result<TransportReply> {
            Ok(TransportReply::default())
        }
    }

    #[test]
    fn test_builder_defaults() {
        let client = ClientBuilder::new(Silent).build().unwrap();
        assert_eq!(client.service_name, "Client");
        assert!(!client.correlator.is_strict());
        assert!(client.audit_sink.is_some());
        assert!(client.metrics.is_none());
    }

    #[test]
    fn test_builder_options() {
        let client = ClientBuilder::new(Silent)
            .strict_correlation(true)
            .without_audit()
            .service_name("billing")
            .with_metrics()
            .build()
            .unwrap();

        assert_eq!(client.service_name, "billing");
        assert!(client.correlator.is_strict());
        assert!(client.audit_sink.is_none());
        assert!(client.metrics.is_some());
    }
}
