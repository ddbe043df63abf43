//! Service discovery
//!
//! Renders the registry as an SMD 2.0 service map, the document served in
//! answer to a request whose query string contains `smd`:
//!
//! ```json
//! {
//!   "transport": "POST",
//!   "envelope": "JSON-RPC-2.0",
//!   "SMDVersion": "2.0",
//!   "contentType": "application/json",
//!   "target": "/api",
//!   "description": "Calculator",
//!   "services": {
//!     "add": {
//!       "parameters": [
//!         {"name": "a", "optional": false, "type": "integer"},
//!         {"name": "b", "optional": true, "default": 0}
//!       ],
//!       "returns": {"type": "integer"}
//!     }
//!   }
//! }
//! ```
//!
//! Services are keyed by name in a sorted map, so the output depends only on
//! the registry contents.

use crate::registry::{MethodDescriptor, MethodRegistry, ParameterSpec, ReturnSpec};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// SMD 2.0 document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDescriptor {
    pub transport: String,
    pub envelope: String,
    #[serde(rename = "SMDVersion")]
    pub smd_version: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    /// Request path the service answers on, without the query string
    pub target: String,
    pub description: String,
    pub services: BTreeMap<String, ServiceEntry>,
}

/// One exposed operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Vec<ServiceParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<ServiceReturns>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceParameter {
    pub name: String,
    pub optional: bool,
    /// Only present for optional parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceReturns {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceDescriptor {
    /// Describe every exposed operation of a registry
    pub fn from_registry(
        registry: &MethodRegistry,
        target: impl Into<String>,
        description: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        let services = registry
            .descriptors()
            .into_iter()
            .map(|descriptor| (descriptor.name.clone(), ServiceEntry::from(descriptor)))
            .collect();

        Self {
            transport: "POST".to_string(),
            envelope: "JSON-RPC-2.0".to_string(),
            smd_version: "2.0".to_string(),
            content_type: content_type.into(),
            target: target.into(),
            description: description.into(),
            services,
        }
    }

    pub fn to_value(&self) -> Value {
        // Plain strings, bools and JSON values only
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<&MethodDescriptor> for ServiceEntry {
    fn from(descriptor: &MethodDescriptor) -> Self {
        Self {
            description: descriptor.description.clone(),
            parameters: descriptor.params.iter().map(ServiceParameter::from).collect(),
            returns: descriptor.returns.as_ref().map(ServiceReturns::from),
        }
    }
}

impl From<&ParameterSpec> for ServiceParameter {
    fn from(spec: &ParameterSpec) -> Self {
        Self {
            name: spec.name.clone(),
            optional: !spec.required,
            default: (!spec.required).then(|| spec.default.clone()),
            type_name: spec.type_name.clone(),
            description: spec.description.clone(),
        }
    }
}

impl From<&ReturnSpec> for ServiceReturns {
    fn from(spec: &ReturnSpec) -> Self {
        Self {
            type_name: spec.type_name.clone(),
            description: spec.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use crate::registry::MethodDef;
    use serde_json::json;

    fn registry() -> MethodRegistry {
        let noop = || from_fn(|_| async { Ok(Value::Null) });
        MethodRegistry::builder()
            .method(
                MethodDef::new("add", noop())
                    .description("Add two integers")
                    .param(ParameterSpec::required("a").with_type("integer"))
                    .param(ParameterSpec::optional("b", 0).with_description("second operand"))
                    .returns(ReturnSpec::new().with_type("integer")),
            )
            .method(MethodDef::new("ping", noop()))
            .method(MethodDef::new("reset", noop()))
            .hide("reset")
            .build()
    }

    #[test]
    fn test_document_shape() {
        let document =
            ServiceDescriptor::from_registry(&registry(), "/api", "Calculator", "application/json")
                .to_value();

        assert_eq!(
            document,
            json!({
                "transport": "POST",
                "envelope": "JSON-RPC-2.0",
                "SMDVersion": "2.0",
                "contentType": "application/json",
                "target": "/api",
                "description": "Calculator",
                "services": {
                    "add": {
                        "description": "Add two integers",
                        "parameters": [
                            {"name": "a", "optional": false, "type": "integer"},
                            {"name": "b", "optional": true, "default": 0, "description": "second operand"}
                        ],
                        "returns": {"type": "integer"}
                    },
                    "ping": {"parameters": []}
                }
            })
        );
    }

    #[test]
    fn test_output_is_stable() {
        let registry = registry();
        let first = serde_json::to_string(&ServiceDescriptor::from_registry(&registry, "/", "", "application/json")).unwrap();
        let second = serde_json::to_string(&ServiceDescriptor::from_registry(&registry, "/", "", "application/json")).unwrap();
        assert_eq!(first, second);
    }
}
