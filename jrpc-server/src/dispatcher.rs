//! Dispatch and error mapping
//!
//! The dispatcher runs a validated call's operation and turns the outcome
//! into a response object. It is also the single place where failures are
//! rendered for the wire, so validation rejections and top-level payload
//! errors go through it too.
//!
//! Failure mapping:
//!
//! - protocol-domain errors keep their code, message and detail
//! - any other error, and any panic inside the operation, become
//!   `-32603 Internal error`; the original text lands in `debug`
//!
//! The `debug` member is only ever serialized in debug mode. Outside debug
//! mode it is stripped even from errors raised verbatim by operations.
//!
//! Notifications never get a response from dispatch, whatever the outcome.

use crate::validator::{Rejection, ValidatedCall};
use futures::FutureExt;
use jrpc_core::{Error, ErrorCode, ErrorMapper, ErrorObject, Id, JsonRpcResponse};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Outcome of one dispatched call, for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Success,
    Error,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Error => "error",
        }
    }
}

/// Runs operations and renders failures
#[derive(Debug, Clone)]
pub struct Dispatcher {
    debug: bool,
    errors: Arc<ErrorMapper>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(false, ErrorMapper::default())
    }
}

impl Dispatcher {
    pub fn new(debug: bool, errors: ErrorMapper) -> Self {
        Self {
            debug,
            errors: Arc::new(errors),
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Invoke a validated call with its bound arguments
    ///
    /// Returns the response to emit (none for notifications) and the
    /// call's status.
    pub async fn dispatch(
        &self,
        call: ValidatedCall,
        args: Vec<Value>,
    ) -> (Option<JsonRpcResponse>, CallStatus) {
        let ValidatedCall {
            id, method, entry, ..
        } = call;

        let invocation = async move { entry.invoke(args).await };
        let outcome = match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(self.map_error(e)),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(method = %method, panic = %message, "Method panicked");
                Err(self.internal_error(message))
            }
        };

        let status = match outcome {
            Ok(_) => CallStatus::Success,
            Err(_) => CallStatus::Error,
        };

        let response = match (id, outcome) {
            (Some(id), Ok(value)) => Some(JsonRpcResponse::success(value, id)),
            (Some(id), Err(error)) => {
                tracing::debug!(method = %method, id = %id, error = %error, "Call failed");
                Some(JsonRpcResponse::error(self.render(error), id))
            }
            (None, Ok(_)) => None,
            (None, Err(error)) => {
                tracing::warn!(method = %method, error = %error, "Notification failed");
                None
            }
        };

        (response, status)
    }

    /// Response for a refused call, if one must be emitted
    ///
    /// Calls with an id are always answered. Calls without one are answered
    /// with a null id only when refused for structural reasons.
    pub fn reject(&self, rejection: Rejection) -> Option<JsonRpcResponse> {
        if rejection.id.is_none() && !rejection.is_structural() {
            tracing::debug!(code = %rejection.code, "Dropping rejection for notification");
            return None;
        }

        let mut error = self.errors.error(rejection.code.code());
        if let Some(detail) = rejection.detail {
            error = error.with_detail(detail);
        }
        Some(JsonRpcResponse::error(
            self.render(error),
            rejection.id.unwrap_or(Id::Null),
        ))
    }

    /// Response for a failure that concerns the payload as a whole
    pub fn top_level_error(&self, error: Error) -> JsonRpcResponse {
        let error = match error.protocol_error() {
            Some(object) => self.with_configured_message(object),
            None => self.internal_error(error.to_string()),
        };
        JsonRpcResponse::error(self.render(error), Id::Null)
    }

    /// Error response for a single reserved code
    pub fn error_response(&self, code: ErrorCode, id: Id) -> JsonRpcResponse {
        JsonRpcResponse::error(self.render(self.errors.error(code.code())), id)
    }

    fn map_error(&self, error: Error) -> ErrorObject {
        match error.protocol_error() {
            Some(object) => object,
            None => self.internal_error(error.to_string()),
        }
    }

    fn internal_error(&self, cause: String) -> ErrorObject {
        self.errors
            .error(ErrorCode::InternalError.code())
            .with_debug(cause)
    }

    fn with_configured_message(&self, mut error: ErrorObject) -> ErrorObject {
        if self.errors.contains(error.code) {
            error.message = self.errors.message(error.code).to_string();
        }
        error
    }

    /// Apply the debug-mode policy to an outgoing error
    fn render(&self, mut error: ErrorObject) -> ErrorObject {
        if self.debug {
            error.debug.get_or_insert(Value::Null);
        } else {
            error.debug = None;
        }
        error
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
