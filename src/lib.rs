//! JRPC - JSON-RPC 2.0 server and client engine
//!
//! This is the convenience crate that re-exports all jrpc sub-crates. Use it
//! when you want a single dependency that provides both sides.
//!
//! # Architecture
//!
//! - **jrpc-core**: wire types, codec, errors, audit trail, observability
//! - **jrpc-server**: registry, validation, binding, dispatch, service map
//! - **jrpc-client**: batching, response correlation, transport seam
//! - **jrpc-macros**: `#[rpc_method]` for deriving method metadata
//!
//! Neither engine owns a socket. A hosting HTTP layer feeds
//! [`server::RequestContext`]s to the server, and the client talks through a
//! [`client::Transport`]. [`LoopbackTransport`] connects the two in process.
//!
//! # Quick Start
//!
//! ```rust
//! use jrpc::{rpc_method, JrpcClient, JsonRpcServer, LoopbackTransport};
//! use jrpc::core::Result;
//!
//! #[rpc_method]
//! async fn add(a: i64, b: i64) -> Result<i64> {
//!     Ok(a + b)
//! }
//!
//! # async fn example() -> Result<()> {
//! let server = JsonRpcServer::builder().method(add()).build()?;
//! let mut client = JrpcClient::new(LoopbackTransport::new(server));
//!
//! let sum: i64 = client.request("add", (5, 3)).await?;
//! assert_eq!(sum, 8);
//! # Ok(())
//! # }
//! ```

mod loopback;

pub use jrpc_client as client;
pub use jrpc_core as core;
pub use jrpc_macros as macros;
pub use jrpc_server as server;

pub use jrpc_client::JrpcClient;
pub use jrpc_macros::rpc_method;
pub use jrpc_server::JsonRpcServer;
pub use loopback::LoopbackTransport;
