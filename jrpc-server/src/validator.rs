//! Call validation
//!
//! Every decoded call value passes through [`CallValidator::validate`]
//! before it is bound and dispatched. The checks run in a fixed order and
//! the first failure wins:
//!
//! 1. the call is a JSON object (Invalid Request)
//! 2. `jsonrpc` is `"2.0"` (Invalid Request)
//! 3. `method` names an exposed, non-hidden operation (Method not found)
//! 4. `params`, if present and non-null, is an array or object (Invalid params)
//! 5. enough parameters are supplied (Invalid params)
//!
//! The `id` member is taken as given; any JSON value is echoed back.
//!
//! The count check for positional params only compares lengths. It neither
//! rejects excess values nor checks that supplied values line up with
//! required parameters.

use crate::registry::{MethodEntry, MethodRegistry};
use jrpc_core::{ErrorCode, Id, Params, JSONRPC_VERSION};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Version marker accepted by the legacy shim
const LEGACY_VERSION_TAG: &str = "json-rpc-2.0";

/// A call that passed every check
#[derive(Clone)]
pub struct ValidatedCall {
    /// `None` for notifications
    pub id: Option<Id>,
    pub method: String,
    pub params: Option<Params>,
    pub entry: Arc<MethodEntry>,
}

impl ValidatedCall {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

impl std::fmt::Debug for ValidatedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedCall")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("params", &self.params)
            .finish()
    }
}

/// Why a call was refused
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub code: ErrorCode,
    /// Id of the refused call, when it could be read
    pub id: Option<Id>,
    pub detail: Option<String>,
}

impl Rejection {
    fn new(code: ErrorCode, id: Option<Id>) -> Self {
        Self {
            code,
            id,
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Whether the call was refused before its method was resolved
    ///
    /// Such payloads cannot be trusted as notifications, so they are answered
    /// even without an id.
    pub fn is_structural(&self) -> bool {
        self.code == ErrorCode::InvalidRequest
    }
}

/// Checks calls against the method registry
#[derive(Debug, Clone)]
pub struct CallValidator {
    registry: MethodRegistry,
    legacy_version_tag: bool,
}

impl CallValidator {
    pub fn new(registry: MethodRegistry) -> Self {
        Self {
            registry,
            legacy_version_tag: false,
        }
    }

    /// Accept `"version": "json-rpc-2.0"` in place of `"jsonrpc": "2.0"`
    pub fn with_legacy_version_tag(mut self, enable: bool) -> Self {
        self.legacy_version_tag = enable;
        self
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn validate(&self, call: Value) -> Result<ValidatedCall, Rejection> {
        let Value::Object(mut call) = call else {
            return Err(Rejection::new(ErrorCode::InvalidRequest, None)
                .with_detail("call must be an object"));
        };

        let id = Id::from_member(call.get("id"));

        if !self.declares_version(&call) {
            return Err(Rejection::new(ErrorCode::InvalidRequest, id));
        }

        let method = match call.get("method") {
            Some(Value::String(method)) if !method.is_empty() => method.clone(),
            _ => return Err(Rejection::new(ErrorCode::MethodNotFound, id)),
        };
        let Some(entry) = self.registry.get(&method) else {
            return Err(Rejection::new(ErrorCode::MethodNotFound, id));
        };

        let params = match call.remove("params") {
            None | Some(Value::Null) => None,
            Some(value) => match Params::from_value(value) {
                Some(params) => Some(params),
                None => return Err(Rejection::new(ErrorCode::InvalidParams, id)),
            },
        };

        let descriptor = entry.descriptor();
        match &params {
            None if descriptor.required_count() > 0 => {
                return Err(Rejection::new(ErrorCode::InvalidParams, id)
                    .with_detail("Empty required params"));
            }
            Some(Params::Positional(values)) if values.len() < descriptor.required_count() => {
                return Err(Rejection::new(ErrorCode::InvalidParams, id).with_detail(format!(
                    "Check numbers of required params (got {}, expected {})",
                    values.len(),
                    descriptor.required_count()
                )));
            }
            Some(Params::Named(named)) => {
                if let Some(missing) = descriptor
                    .required_params()
                    .find(|spec| !named.contains_key(&spec.name))
                {
                    return Err(Rejection::new(ErrorCode::InvalidParams, id)
                        .with_detail(format!("{} not found", missing.name)));
                }
            }
            _ => {}
        }

        Ok(ValidatedCall {
            id,
            method,
            params,
            entry,
        })
    }

    fn declares_version(&self, call: &Map<String, Value>) -> bool {
        if self.legacy_version_tag
            && call.get("version").and_then(Value::as_str) == Some(LEGACY_VERSION_TAG)
        {
            return true;
        }
        call.get("jsonrpc").and_then(Value::as_str) == Some(JSONRPC_VERSION)
    }
}
