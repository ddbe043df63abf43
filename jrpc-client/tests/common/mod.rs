//! Common test utilities for jrpc-client integration tests
//!
//! [`ScriptedTransport`] answers each send with the next scripted reply and
//! keeps every body it was given, so tests can check what went over the
//! wire without a server.

#![allow(dead_code)]

use async_trait::async_trait;
use jrpc_client::{Transport, TransportReply};
use jrpc_core::{Error, Exchange, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Result<TransportReply>>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply body
    pub fn reply(self, body: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(TransportReply::new(body)
                .with_request_header("Content-Type", "application/json")
                .with_response_header("Content-Type", "application/json")));
        self
    }

    /// Queue a transport failure
    pub fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(Error::Transport(message.to_string())));
        self
    }

    /// Bodies sent so far, parsed as JSON
    pub fn sent(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|body| serde_json::from_str(body).unwrap())
            .collect()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, body: String) -> Result<TransportReply> {
        self.sent.lock().unwrap().push(body);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportReply::default()))
    }
}

/// Audit sink keeping exchanges in memory
#[derive(Clone, Default)]
pub struct MemorySink(pub Arc<Mutex<Vec<Exchange>>>);

impl MemorySink {
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl jrpc_core::AuditSink for MemorySink {
    async fn record(&self, exchange: &Exchange) -> Result<()> {
        self.0.lock().unwrap().push(exchange.clone());
        Ok(())
    }
}
