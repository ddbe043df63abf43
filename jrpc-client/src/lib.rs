//! JSON-RPC 2.0 client engine
//!
//! This crate turns method calls into request bodies and response bodies
//! back into resolved [`Call`](jrpc_core::Call)s. The network exchange itself
//! is delegated to a [`Transport`].
//!
//! # Core Features
//!
//! - **Single calls**: each call is its own round trip while no batch is open
//! - **Batching**: `begin_batch` / `commit_batch` / `rollback_batch` send many
//!   calls and notifications in one round trip
//! - **Correlation**: batch responses are matched to calls by id, in any order
//! - **Audit**: every round trip is recorded, including transport failures
//! - **Observability**: OpenTelemetry metrics through [`ClientMetrics`]
//!
//! # Batching
//!
//! ```rust
//! use async_trait::async_trait;
//! use jrpc_client::{JrpcClient, Transport, TransportReply};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Transport for Echo {
//!     async fn send(&self, _body: String) -> jrpc_core::Result<TransportReply> {
//!         Ok(TransportReply::new(
//!             r#"[{"jsonrpc":"2.0","result":"b","id":2},{"jsonrpc":"2.0","result":"a","id":1}]"#,
//!         ))
//!     }
//! }
//!
//! # async fn example() -> jrpc_core::Result<()> {
//! let mut client = JrpcClient::new(Echo);
//!
//! client.begin_batch();
//! client.call("first", ()).await?;
//! client.call("second", ()).await?;
//! client.notify("log", ["batched"]).await?;
//!
//! let calls = client.commit_batch().await?.unwrap();
//! assert_eq!(calls[0].result, Some(serde_json::json!("a")));
//! assert_eq!(calls[1].result, Some(serde_json::json!("b")));
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
mod client_builder;
mod correlator;
mod metrics;
mod transport;

pub use batch::{BatchCoordinator, BatchState};
pub use client::JrpcClient;
pub use client_builder::ClientBuilder;
pub use correlator::{CorrelationReport, ResponseCorrelator};
pub use metrics::ClientMetrics;
pub use transport::{Transport, TransportReply};
