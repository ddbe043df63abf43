//! Procedural macros for the jrpc JSON-RPC 2.0 engine
//!
//! # Available Macros
//!
//! ## `#[rpc_method]` - Method Definition From a Function
//!
//! Turns an `async fn` with typed arguments into a factory returning a
//! `jrpc_server::MethodDef`. The parameter metadata the server needs for
//! binding, validation and discovery is read from the signature at compile
//! time:
//!
//! - each argument becomes a parameter, in declaration order, named after it
//! - `Option<T>` arguments are optional with a `null` default
//! - arguments listed in `defaults(...)` are optional with that default
//! - the argument type is recorded as the parameter type name
//! - the first paragraph of the doc comment becomes the description
//!
//! # Examples
//!
//! ```ignore
//! use jrpc_core::Result;
//! use jrpc_macros::rpc_method;
//!
//! /// Subtract two integers
//! #[rpc_method(returns = "int")]
//! async fn subtract(minuend: i64, subtrahend: i64) -> Result<i64> {
//!     Ok(minuend - subtrahend)
//! }
//!
//! #[rpc_method(name = "math.sum", defaults(b = 0, c = 0))]
//! async fn sum(a: i64, b: i64, c: i64) -> Result<i64> {
//!     Ok(a + b + c)
//! }
//!
//! let server = JsonRpcServer::builder()
//!     .method(subtract())
//!     .method(sum())
//!     .build()?;
//! ```

mod method;

use proc_macro::TokenStream;

/// Attribute macro for defining JSON-RPC methods
///
/// # Properties
///
/// - `name = "..."`: method name on the wire (defaults to the function name)
/// - `description = "..."`: service map description (defaults to the doc comment)
/// - `returns = "..."`: return type name shown in the service map
/// - `defaults(arg = expr, ...)`: default values; `expr` must convert into
///   `serde_json::Value`
/// - `private`: build the definition but keep it out of the registry
///
/// # Limitations
///
/// - The function must be `async`, non-generic and free (no `self`)
/// - The return type must be `jrpc_core::Result<T>` with `T: Serialize`
/// - Arguments must be plain identifiers with `Deserialize` types
#[proc_macro_attribute]
pub fn rpc_method(attr: TokenStream, item: TokenStream) -> TokenStream {
    method::expand(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
