//! Batch request processing
//!
//! A batch is a JSON array of call values. Elements are validated and
//! dispatched strictly one after another, in array order, and the responses
//! are collected in the same order. Notifications contribute nothing, so the
//! result may be shorter than the batch or empty.
//!
//! The processor itself knows nothing about validation or dispatch: it is
//! handed the per-call pipeline as a closure.

use jrpc_core::JsonRpcResponse;
use serde_json::Value;
use std::future::Future;

/// Runs the elements of a batch through a per-call pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchProcessor;

impl BatchProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Process every element in order, keeping the responses that were produced
    #[tracing::instrument(skip(self, batch_values, process), fields(batch_size = batch_values.len()))]
    pub async fn process_batch<F, Fut>(
        &self,
        batch_values: Vec<Value>,
        mut process: F,
    ) -> Vec<JsonRpcResponse>
    where
        F: FnMut(Value) -> Fut,
        Fut: Future<Output = Option<JsonRpcResponse>>,
    {
        let mut responses = Vec::with_capacity(batch_values.len());

        for value in batch_values {
            if let Some(response) = process(value).await {
                responses.push(response);
            }
        }

        tracing::debug!(response_count = responses.len(), "Batch processing completed");
        responses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jrpc_core::Id;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_sequential_order_and_notifications() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let batch = vec![json!({"id": 1}), json!({}), json!({"id": 2})];

        let responses = BatchProcessor::new()
            .process_batch(batch, |value| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().unwrap().push(value.clone());
                    value
                        .get("id")
                        .and_then(Value::as_i64)
                        .map(|id| JsonRpcResponse::success(json!("ok"), Id::Number(id)))
                }
            })
            .await;

        let ids: Vec<_> = responses.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![Id::Number(1), Id::Number(2)]);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_all_notifications_produce_nothing() {
        let responses = BatchProcessor::new()
            .process_batch(vec![json!({}), json!({})], |_| async { None })
            .await;
        assert!(responses.is_empty());
    }
}
