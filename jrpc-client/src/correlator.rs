//! Matching response objects back onto pending calls
//!
//! A batch response may come back in any order, so each element is matched
//! to its call by id. Matching is done in two passes: every element is
//! parsed and paired first, and calls are only resolved once the whole body
//! is known to be acceptable. A rejected body therefore never leaves a batch
//! half resolved.

use jrpc_core::{codec, Call, Envelope, Error, Id, JsonRpcResponse, Result};
use serde_json::Value;
use std::collections::HashMap;

/// What happened while correlating one body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationReport {
    /// Calls resolved from the body
    pub matched: usize,
    /// Response ids no pending call was waiting for, in body order
    pub unmatched: Vec<Id>,
    /// Ids of calls that expected a response but got none
    pub missing: Vec<Id>,
}

impl CorrelationReport {
    /// Every response matched and every call answered
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty() && self.missing.is_empty()
    }
}

/// Resolves pending calls from response bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseCorrelator {
    strict: bool,
}

impl ResponseCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `Error::UnmatchedResponse` instead of dropping responses
    /// that match no pending call
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Correlate the reply to a single, non-batch call
    ///
    /// The one response object resolves the call whatever its id, since
    /// top-level failures (parse errors and the like) come back with a null
    /// id.
    pub fn correlate_single(&self, call: &mut Call, body: &str) -> Result<CorrelationReport> {
        if call.is_notification() {
            return self.correlate_batch(std::slice::from_mut(call), body);
        }

        match codec::decode_response(body)? {
            Envelope::Single(value) => {
                let response = codec::parse_response(value)?;
                call.resolve(response);
                Ok(CorrelationReport {
                    matched: 1,
                    ..CorrelationReport::default()
                })
            }
            Envelope::Batch(values) => self.match_by_id(std::slice::from_mut(call), values),
        }
    }

    /// Correlate the reply to a batch
    ///
    /// An empty body is accepted only when every call was a notification. A
    /// single error object with a null id answers the whole batch (the
    /// server could not read it) and fails the exchange.
    pub fn correlate_batch(&self, calls: &mut [Call], body: &str) -> Result<CorrelationReport> {
        let expected = calls.iter().filter(|call| !call.is_notification()).count();
        if expected == 0 && body.trim().is_empty() {
            return Ok(CorrelationReport::default());
        }

        let values = match codec::decode_response(body)? {
            Envelope::Batch(values) => values,
            Envelope::Single(value) => {
                let response = codec::parse_response(value.clone())?;
                match response {
                    JsonRpcResponse {
                        error: Some(error),
                        id: Id::Null,
                        ..
                    } if expected > 0 => return Err(Error::JsonRpc(error)),
                    _ => vec![value],
                }
            }
        };

        self.match_by_id(calls, values)
    }

    fn match_by_id(&self, calls: &mut [Call], values: Vec<Value>) -> Result<CorrelationReport> {
        let mut pending: HashMap<Id, usize> = calls
            .iter()
            .enumerate()
            .filter_map(|(index, call)| call.id.clone().map(|id| (id, index)))
            .collect();

        let mut report = CorrelationReport::default();
        let mut resolved = Vec::with_capacity(values.len());

        for value in values {
            let response = match codec::parse_response(value) {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping malformed batch response element");
                    report.unmatched.push(Id::Null);
                    continue;
                }
            };

            match pending.remove(&response.id) {
                Some(index) => resolved.push((index, response)),
                None => {
                    tracing::warn!(id = %response.id, "Dropping response for unknown id");
                    report.unmatched.push(response.id);
                }
            }
        }

        if self.strict && !report.unmatched.is_empty() {
            let ids: Vec<String> = report.unmatched.iter().map(Id::to_string).collect();
            return Err(Error::UnmatchedResponse(ids.join(", ")));
        }

        report.matched = resolved.len();
        for (index, response) in resolved {
            calls[index].resolve(response);
        }

        let mut missing: Vec<(usize, Id)> = pending.into_iter().map(|(id, index)| (index, id)).collect();
        missing.sort_by_key(|(index, _)| *index);
        report.missing = missing.into_iter().map(|(_, id)| id).collect();
        if !report.missing.is_empty() {
            tracing::debug!(missing = report.missing.len(), "Calls left without a response");
        }

        Ok(report)
    }
}
