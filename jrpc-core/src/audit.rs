//! Request/response audit trail
//!
//! Both engines hand every round trip to an [`AuditSink`] as an [`Exchange`].
//! Recording is fire-and-forget: [`record_exchange`] swallows sink errors and
//! panics after logging them, so a broken sink can never change a reply.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// Ordered header list, as written or received
pub type Headers = Vec<(String, String)>;

/// One recorded round trip
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    /// Logical name of the recording side, e.g. "Server" or "Client"
    pub service: String,
    pub request_headers: Headers,
    pub request_body: String,
    pub response_headers: Headers,
    pub response_body: String,
    /// Transport or top-level protocol error code, if the exchange failed
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
    /// Wall time spent on the exchange
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
}

impl Exchange {
    /// Start time as fractional UNIX seconds
    pub fn started_at_unix(&self) -> f64 {
        self.started_at.timestamp_micros() as f64 / 1_000_000.0
    }
}

/// Destination for recorded exchanges
///
/// ```rust
/// use async_trait::async_trait;
/// use jrpc_core::audit::{AuditSink, Exchange};
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct MemorySink(Mutex<Vec<Exchange>>);
///
/// #[async_trait]
/// impl AuditSink for MemorySink {
///     async fn record(&self, exchange: &Exchange) -> jrpc_core::Result<()> {
///         self.0.lock().unwrap().push(exchange.clone());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, exchange: &Exchange) -> Result<()>;
}

/// Emits each exchange as a structured `tracing` event at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, exchange: &Exchange) -> Result<()> {
        tracing::debug!(
            target: "jrpc::audit",
            service = %exchange.service,
            request_body = %exchange.request_body,
            response_body = %exchange.response_body,
            error_code = ?exchange.error_code,
            error_message = ?exchange.error_message,
            elapsed_secs = exchange.elapsed.as_secs_f64(),
            started_at = %exchange.started_at.to_rfc3339(),
            "Exchange recorded"
        );
        Ok(())
    }
}

/// Hand an exchange to a sink, absorbing any failure
pub async fn record_exchange(sink: &dyn AuditSink, exchange: &Exchange) {
    match AssertUnwindSafe(sink.record(exchange)).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(service = %exchange.service, error = %e, "Audit sink failed");
        }
        Err(_) => {
            tracing::warn!(service = %exchange.service, "Audit sink panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn exchange() -> Exchange {
        Exchange {
            service: "Server".to_string(),
            request_headers: vec![("Content-Type".into(), "application/json".into())],
            request_body: r#"{"jsonrpc":"2.0","method":"ping","id":1}"#.to_string(),
            response_headers: Vec::new(),
            response_body: r#"{"jsonrpc":"2.0","result":"pong","id":1}"#.to_string(),
            error_code: None,
            error_message: None,
            elapsed: Duration::from_millis(3),
            started_at: Utc::now(),
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn record(&self, _exchange: &Exchange) -> Result<()> {
            Err(Error::Internal("database unavailable".to_string()))
        }
    }

    struct PanickingSink;

    #[async_trait]
    impl AuditSink for PanickingSink {
        async fn record(&self, _exchange: &Exchange) -> Result<()> {
            panic!("sink exploded");
        }
    }

    #[derive(Default)]
    struct CountingSink(AtomicUsize);

    #[async_trait]
    impl AuditSink for CountingSink {
        async fn record(&self, _exchange: &Exchange) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failures_are_absorbed() {
        record_exchange(&FailingSink, &exchange()).await;
        record_exchange(&PanickingSink, &exchange()).await;
        record_exchange(&TracingAuditSink, &exchange()).await;
    }

    #[tokio::test]
    async fn test_records_once() {
        let sink = CountingSink::default();
        record_exchange(&sink, &exchange()).await;
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_started_at_unix() {
        let mut recorded = exchange();
        recorded.started_at = DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap();
        assert_eq!(recorded.started_at_unix(), 1_700_000_000.5);
    }
}
