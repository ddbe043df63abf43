//! Handler traits and adapters for JSON-RPC methods
//!
//! A handler receives the bound, ordered argument list of one call and
//! produces the call's result. By the time a handler runs, named parameters
//! have already been reordered and omitted trailing arguments filled with
//! their defaults, so every handler sees a plain positional list.
//!
//! # Creating Handlers
//!
//! 1. **from_fn**: wrap an async closure over the raw `Vec<Value>` arguments
//! 2. **from_typed_fn**: wrap an async closure over a deserializable tuple
//! 3. **#[rpc_method]**: annotate an `async fn` (via jrpc-macros)
//!
//! # Examples
//!
//! ```rust
//! use jrpc_server::{from_fn, from_typed_fn};
//!
//! let echo = from_fn(|args| async move { Ok(serde_json::Value::Array(args)) });
//!
//! let subtract = from_typed_fn(|(minuend, subtrahend): (i64, i64)| async move {
//!     Ok(minuend - subtrahend)
//! });
//! ```

use jrpc_core::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by every handler
pub type HandlerResult = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// An invocable JSON-RPC operation
pub trait Handler: Send + Sync {
    /// Run the operation with its bound arguments
    fn handle(&self, args: Vec<Value>) -> HandlerResult;
}

/// Handler backed by an async function over raw arguments
pub struct AsyncHandler<F, Fut>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    func: F,
}

impl<F, Fut> AsyncHandler<F, Fut>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Handler for AsyncHandler<F, Fut>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn handle(&self, args: Vec<Value>) -> HandlerResult {
        Box::pin((self.func)(args))
    }
}

/// Create a handler from an async function over raw JSON arguments
pub fn from_fn<F, Fut>(func: F) -> Box<dyn Handler>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Box::new(AsyncHandler::new(func))
}

/// Create a handler whose arguments are deserialized into `P`
///
/// The argument list is presented to serde as a JSON array, so `P` is
/// normally a tuple with one element per declared parameter (`(i64,)` for a
/// single argument, `()` for none). A mismatch in count or type is reported
/// as invalid params. Registered methods only ever see as many arguments
/// as they declare parameters.
pub fn from_typed_fn<P, R, F, Fut>(func: F) -> Box<dyn Handler>
where
    P: serde::de::DeserializeOwned + Send + 'static,
    R: serde::Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let func = Arc::new(func);

    from_fn(move |args: Vec<Value>| {
        let func = Arc::clone(&func);
        async move {
            let no_args = args.is_empty();
            let params: P = match serde_json::from_value(Value::Array(args)) {
                Ok(params) => params,
                // `()` only deserializes from null
                Err(e) if no_args => serde_json::from_value(Value::Null)
                    .map_err(|_| Error::InvalidParams(e.to_string()))?,
                Err(e) => return Err(Error::InvalidParams(e.to_string())),
            };

            let result = func(params).await?;

            serde_json::to_value(result).map_err(|e| Error::Serialization(e.to_string()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Serialize, Deserialize)]
    struct Total {
        sum: i64,
    }

    #[tokio::test]
    async fn test_typed_handler() {
        let handler = from_typed_fn(|(a, b): (i64, i64)| async move { Ok(Total { sum: a + b }) });

        let result = handler.handle(vec![json!(5), json!(3)]).await.unwrap();

        let total: Total = serde_json::from_value(result).unwrap();
        assert_eq!(total.sum, 8);
    }

    #[tokio::test]
    async fn test_typed_handler_rejects_wrong_types() {
        let handler = from_typed_fn(|(a,): (i64,)| async move { Ok(a) });

        let err = handler.handle(vec![json!("five")]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_unit_handler() {
        let handler = from_typed_fn(|(): ()| async move { Ok("pong") });
        assert_eq!(handler.handle(Vec::new()).await.unwrap(), json!("pong"));
    }

    #[tokio::test]
    async fn test_raw_handler_sees_all_args() {
        let handler = from_fn(|args| async move { Ok(json!(args.len())) });
        assert_eq!(handler.handle(vec![json!(1), json!(2), json!(3)]).await.unwrap(), json!(3));
    }
}
