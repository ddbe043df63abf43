//! Client session
//!
//! A [`JrpcClient`] is one logical session: it owns its id counter, its open
//! batch and its transport handle. Every operation takes `&mut self`, so a
//! session cannot be driven from two places at once; open one session per
//! concurrent caller.

use crate::{
    BatchCoordinator, ClientBuilder, ClientMetrics, CorrelationReport, ResponseCorrelator,
    Transport, TransportReply,
};
use chrono::Utc;
use jrpc_core::audit::record_exchange;
use jrpc_core::{codec, AuditSink, Call, Error, Exchange, JsonRpcRequest, Params, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// JSON-RPC 2.0 client session
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use jrpc_client::{JrpcClient, Transport, TransportReply};
///
/// struct Fixed;
///
/// #[async_trait]
/// impl Transport for Fixed {
///     async fn send(&self, _body: String) -> jrpc_core::Result<TransportReply> {
///         Ok(TransportReply::new(r#"{"jsonrpc":"2.0","result":19,"id":1}"#))
///     }
/// }
///
/// # async fn example() -> jrpc_core::Result<()> {
/// let mut client = JrpcClient::new(Fixed);
/// let difference: i64 = client.request("subtract", (42, 23)).await?;
/// assert_eq!(difference, 19);
/// # Ok(())
/// # }
/// ```
pub struct JrpcClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) coordinator: BatchCoordinator,
    pub(crate) correlator: ResponseCorrelator,
    pub(crate) audit_sink: Option<Arc<dyn AuditSink>>,
    pub(crate) service_name: String,
    pub(crate) metrics: Option<Arc<ClientMetrics>>,
}

impl JrpcClient {
    /// Session with default settings over the given transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        ClientBuilder::new(transport).into_client()
    }

    pub fn builder(transport: impl Transport + 'static) -> ClientBuilder {
        ClientBuilder::new(transport)
    }

    /// Whether calls are currently being accumulated
    pub fn is_batching(&self) -> bool {
        self.coordinator.is_batching()
    }

    /// Number of calls and notifications waiting in the open batch
    pub fn pending(&self) -> usize {
        self.coordinator.len()
    }

    /// Call a method
    ///
    /// When idle the call is sent at once and returned resolved. While a
    /// batch is open it is queued and returned pending; the resolved copy
    /// comes back from [`commit_batch`](Self::commit_batch).
    ///
    /// `params` must serialize to an array, an object, or `null`/`()` for
    /// no params.
    pub async fn call<P: Serialize>(&mut self, method: &str, params: P) -> Result<Call> {
        let params = to_params(params)?;
        self.call_with(method, params).await
    }

    #[tracing::instrument(skip(self, params), fields(method = %method))]
    pub async fn call_with(&mut self, method: &str, params: Option<Params>) -> Result<Call> {
        let mut call = self.coordinator.create_call(method, params);

        if self.coordinator.is_batching() {
            tracing::debug!(id = ?call.id, "Call queued");
            self.coordinator.enqueue(call.clone());
            return Ok(call);
        }

        let body = codec::encode(&call.to_request())?;
        let correlator = self.correlator;
        self.round_trip(body, "single", |reply| correlator.correlate_single(&mut call, reply))
            .await?;
        Ok(call)
    }

    /// Call a method and deserialize its result
    ///
    /// Not available while a batch is open, since the result would only be
    /// known after the commit.
    pub async fn request<P, R>(&mut self, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        if self.is_batching() {
            return Err(Error::Internal(format!(
                "cannot wait for '{}' while a batch is open",
                method
            )));
        }
        self.call(method, params).await?.into_result()
    }

    /// Send a notification; no response is expected
    pub async fn notify<P: Serialize>(&mut self, method: &str, params: P) -> Result<()> {
        let params = to_params(params)?;
        self.notify_with(method, params).await
    }

    #[tracing::instrument(skip(self, params), fields(method = %method))]
    pub async fn notify_with(&mut self, method: &str, params: Option<Params>) -> Result<()> {
        let mut call = Call::notification(method, params);

        if self.coordinator.is_batching() {
            tracing::debug!("Notification queued");
            self.coordinator.enqueue(call);
            return Ok(());
        }

        let body = codec::encode(&call.to_request())?;
        let correlator = self.correlator;
        self.round_trip(body, "notification", |reply| {
            correlator.correlate_single(&mut call, reply)
        })
        .await?;
        Ok(())
    }

    /// Start accumulating calls
    ///
    /// Returns `false` and changes nothing when a batch is already open.
    pub fn begin_batch(&mut self) -> bool {
        let started = self.coordinator.begin_batch();
        if !started {
            tracing::debug!("Batch already open");
        }
        started
    }

    /// Send the open batch in one round trip
    ///
    /// Returns `Ok(None)` without touching the transport when no batch is
    /// open or nothing was queued. On failure no call is resolved. Either
    /// way the session is idle again afterwards.
    #[tracing::instrument(skip(self), fields(batch_size = self.coordinator.len()))]
    pub async fn commit_batch(&mut self) -> Result<Option<Vec<Call>>> {
        let mut calls = match self.coordinator.take() {
            Some(calls) => calls,
            None => {
                tracing::debug!("Nothing to commit");
                return Ok(None);
            }
        };

        if let Some(ref metrics) = self.metrics {
            metrics.record_batch(calls.len() as u64);
        }

        let requests: Vec<JsonRpcRequest> = calls.iter().map(Call::to_request).collect();
        let body = codec::encode(&requests)?;
        let correlator = self.correlator;
        self.round_trip(body, "batch", |reply| correlator.correlate_batch(&mut calls, reply))
            .await?;

        Ok(Some(calls))
    }

    /// Discard the open batch without sending anything
    ///
    /// Returns `true`; a session without an open batch is simply left idle.
    pub fn rollback_batch(&mut self) -> bool {
        let discarded = self.coordinator.rollback();
        tracing::debug!(discarded = discarded, "Batch rolled back");
        true
    }

    /// Send one body, correlate the reply and record the exchange
    async fn round_trip<F>(&self, body: String, kind: &'static str, correlate: F) -> Result<CorrelationReport>
    where
        F: FnOnce(&str) -> Result<CorrelationReport>,
    {
        let started_at = Utc::now();
        let timer = Instant::now();

        let (reply, outcome) = match self.transport.send(body.clone()).await {
            Ok(reply) => {
                let outcome = correlate(&reply.body);
                (Some(reply), outcome)
            }
            Err(e) => (None, Err(e)),
        };
        let elapsed = timer.elapsed();

        match outcome {
            Ok(ref report) => {
                tracing::debug!(
                    kind = kind,
                    matched = report.matched,
                    unmatched = report.unmatched.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Round trip completed"
                );
            }
            Err(ref e) => {
                tracing::warn!(kind = kind, error = %e, "Round trip failed");
            }
        }

        if let Some(ref metrics) = self.metrics {
            match outcome {
                Ok(ref report) => {
                    metrics.record_round_trip(kind, "success", elapsed.as_secs_f64());
                    metrics.record_unmatched(report.unmatched.len() as u64);
                }
                Err(ref e) => {
                    metrics.record_round_trip(kind, "error", elapsed.as_secs_f64());
                    metrics.record_error(error_kind(e));
                }
            }
        }

        if let Some(ref sink) = self.audit_sink {
            let TransportReply {
                request_headers,
                response_headers,
                body: response_body,
            } = reply.unwrap_or_default();
            let exchange = Exchange {
                service: self.service_name.clone(),
                request_headers,
                request_body: body,
                response_headers,
                response_body,
                error_code: outcome.as_ref().err().and_then(error_code),
                error_message: outcome.as_ref().err().map(ToString::to_string),
                elapsed,
                started_at,
            };
            record_exchange(sink.as_ref(), &exchange).await;
        }

        outcome
    }
}

impl std::fmt::Debug for JrpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JrpcClient")
            .field("service_name", &self.service_name)
            .field("coordinator", &self.coordinator)
            .field("correlator", &self.correlator)
            .finish()
    }
}

/// Serialize call params; `null` means none
fn to_params<P: Serialize>(params: P) -> Result<Option<Params>> {
    let value = serde_json::to_value(params).map_err(|e| Error::Serialization(e.to_string()))?;
    match value {
        Value::Null => Ok(None),
        other => Params::from_value(other).map(Some).ok_or_else(|| {
            Error::Serialization("params must serialize to an array, an object or null".to_string())
        }),
    }
}

fn error_code(error: &Error) -> Option<i64> {
    match error {
        Error::JsonRpc(e) => Some(e.code),
        _ => None,
    }
}

fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::Transport(_) => "transport",
        Error::InvalidResponse(_) => "invalid_response",
        Error::UnmatchedResponse(_) => "unmatched_response",
        Error::JsonRpc(_) => "rpc",
        Error::Serialization(_) => "serialization",
        _ => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_params() {
        assert_eq!(to_params(()).unwrap(), None);
        assert_eq!(
            to_params((1, "a")).unwrap(),
            Some(Params::Positional(vec![json!(1), json!("a")]))
        );
        assert!(to_params(json!({"a": 1})).unwrap().unwrap().is_named());
        assert!(to_params(5).is_err());
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(error_kind(&Error::Transport("down".into())), "transport");
        assert_eq!(error_kind(&Error::rpc(-32700, "Parse error")), "rpc");
        assert_eq!(error_code(&Error::rpc(-32700, "Parse error")), Some(-32700));
        assert_eq!(error_code(&Error::Transport("down".into())), None);
    }
}
