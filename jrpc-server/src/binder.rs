//! Parameter binding
//!
//! Turns a call's raw params into the ordered argument list the target
//! operation expects:
//!
//! - positional params pass through unchanged
//! - named params are reordered by declaration; omitted names take the
//!   parameter's default and unknown keys are ignored
//! - absent params bind to an empty list
//!
//! Positional lists shorter than the declaration are completed later, when
//! the entry is invoked (see `MethodEntry::invoke`).

use crate::registry::MethodDescriptor;
use jrpc_core::{ErrorObject, Params};
use serde_json::Value;

/// Bind raw params against an operation's descriptor
///
/// The error arm is only reachable for calls that skipped validation: a
/// named call missing a required parameter.
pub fn bind(descriptor: &MethodDescriptor, params: Option<Params>) -> Result<Vec<Value>, ErrorObject> {
    match params {
        None => Ok(Vec::new()),
        Some(Params::Positional(values)) => Ok(values),
        Some(Params::Named(mut named)) => descriptor
            .params
            .iter()
            .map(|spec| match named.remove(&spec.name) {
                Some(value) => Ok(value),
                None if spec.required => Err(ErrorObject::invalid_params()
                    .with_detail(format!("{} not found", spec.name))),
                None => Ok(spec.default.clone()),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ParameterSpec;
    use serde_json::json;

    fn descriptor() -> MethodDescriptor {
        let mut descriptor = MethodDescriptor::new("transfer");
        descriptor.params = vec![
            ParameterSpec::required("from"),
            ParameterSpec::required("to"),
            ParameterSpec::optional("amount", 1),
            ParameterSpec::optional("memo", Value::Null),
        ];
        descriptor
    }

    fn named(value: Value) -> Option<Params> {
        Params::from_value(value)
    }

    #[test]
    fn test_named_reordered_with_defaults() {
        let args = bind(&descriptor(), named(json!({"to": "b", "from": "a"}))).unwrap();
        assert_eq!(args, vec![json!("a"), json!("b"), json!(1), Value::Null]);
    }

    #[test]
    fn test_named_ignores_unknown_keys() {
        let args = bind(
            &descriptor(),
            named(json!({"from": "a", "to": "b", "amount": 5, "bogus": true})),
        )
        .unwrap();
        assert_eq!(args, vec![json!("a"), json!("b"), json!(5), Value::Null]);
    }

    #[test]
    fn test_positional_passes_through() {
        let args = bind(&descriptor(), named(json!(["a"]))).unwrap();
        assert_eq!(args, vec![json!("a")]);
    }

    #[test]
    fn test_absent_binds_empty() {
        assert!(bind(&descriptor(), None).unwrap().is_empty());
    }

    #[test]
    fn test_named_missing_required() {
        let err = bind(&descriptor(), named(json!({"from": "a"}))).unwrap_err();
        assert_eq!(err.code, -32602);
        assert_eq!(err.detail, Some(json!("to not found")));
    }
}
