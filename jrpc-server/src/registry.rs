//! Method registry
//!
//! The registry is the server's table of exposed operations. Each entry
//! pairs a [`MethodDescriptor`] (name plus formal parameter metadata) with
//! the [`Handler`] that runs it. The table is built once by a
//! [`RegistryBuilder`], never mutated afterwards and shared behind an `Arc`,
//! so cloning a registry is cheap.
//!
//! # Hidden and private methods
//!
//! Names in the hidden set (compared case-insensitively) and definitions
//! marked [`MethodDef::private`] are left out of the table at build time.
//! They are neither callable nor listed by discovery.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_server::{from_typed_fn, MethodDef, MethodRegistry, ParameterSpec};
//! use serde_json::json;
//!
//! let registry = MethodRegistry::builder()
//!     .method(
//!         MethodDef::new("subtract", from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a - b) }))
//!             .param(ParameterSpec::required("minuend"))
//!             .param(ParameterSpec::optional("subtrahend", json!(0))),
//!     )
//!     .hide("internalReset")
//!     .build();
//!
//! assert!(registry.contains("subtract"));
//! assert_eq!(registry.get("subtract").unwrap().descriptor().required_count(), 1);
//! ```

use crate::handler::{Handler, HandlerResult};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Formal parameter metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    /// Required parameters must be supplied by every call
    pub required: bool,
    /// Value bound when an optional parameter is omitted
    pub default: Value,
    /// Informational type name, surfaced by discovery
    pub type_name: Option<String>,
    pub description: Option<String>,
}

impl ParameterSpec {
    /// A parameter every call must supply
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: Value::Null,
            type_name: None,
            description: None,
        }
    }

    /// A parameter that falls back to `default` when omitted
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: default.into(),
            type_name: None,
            description: None,
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Return value metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnSpec {
    pub type_name: Option<String>,
    pub description: Option<String>,
}

impl ReturnSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Metadata describing one exposed operation
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub name: String,
    /// Formal parameters in declaration order
    pub params: Vec<ParameterSpec>,
    pub description: Option<String>,
    pub returns: Option<ReturnSpec>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            description: None,
            returns: None,
        }
    }

    /// Number of parameters without a usable default
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }

    /// Required parameters in declaration order
    pub fn required_params(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.params.iter().filter(|p| p.required)
    }
}

/// Whether a definition is reachable from the outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    /// Registered but never exposed
    Private,
}

/// An operation definition: descriptor, handler and visibility
pub struct MethodDef {
    descriptor: MethodDescriptor,
    handler: Arc<dyn Handler>,
    visibility: Visibility,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        Self {
            descriptor: MethodDescriptor::new(name),
            handler: Arc::from(handler),
            visibility: Visibility::Public,
        }
    }

    /// Append a formal parameter
    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.descriptor.params.push(spec);
        self
    }

    /// Append several formal parameters
    pub fn params(mut self, specs: impl IntoIterator<Item = ParameterSpec>) -> Self {
        self.descriptor.params.extend(specs);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = Some(description.into());
        self
    }

    pub fn returns(mut self, returns: ReturnSpec) -> Self {
        self.descriptor.returns = Some(returns);
        self
    }

    /// Keep the definition out of the registry
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }
}

impl std::fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDef")
            .field("descriptor", &self.descriptor)
            .field("visibility", &self.visibility)
            .finish()
    }
}

/// A registered, invocable operation
pub struct MethodEntry {
    descriptor: MethodDescriptor,
    handler: Arc<dyn Handler>,
}

impl MethodEntry {
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    /// Run the operation
    ///
    /// The positional list is fitted to the formal parameter list: a shorter
    /// one is completed with the defaults of the trailing parameters, surplus
    /// values are dropped.
    pub fn invoke(&self, mut args: Vec<Value>) -> HandlerResult {
        let declared = self.descriptor.params.len();
        if args.len() < declared {
            let missing = &self.descriptor.params[args.len()..];
            args.extend(missing.iter().map(|p| p.default.clone()));
        } else {
            args.truncate(declared);
        }
        self.handler.handle(args)
    }
}

/// Read-only table of exposed operations
#[derive(Clone, Default)]
pub struct MethodRegistry {
    entries: Arc<HashMap<String, Arc<MethodEntry>>>,
    hidden: Arc<HashSet<String>>,
}

impl MethodRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Look up an exposed operation by its exact name
    pub fn get(&self, method: &str) -> Option<Arc<MethodEntry>> {
        if self.is_hidden(method) {
            return None;
        }
        self.entries.get(method).cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.get(method).is_some()
    }

    /// Whether the name is in the hidden set, ignoring case
    pub fn is_hidden(&self, method: &str) -> bool {
        self.hidden.contains(&method.to_lowercase())
    }

    /// Descriptors of every exposed operation, sorted by name
    pub fn descriptors(&self) -> Vec<&MethodDescriptor> {
        let mut descriptors: Vec<_> = self.entries.values().map(|e| e.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Names of every exposed operation, sorted
    pub fn methods(&self) -> Vec<String> {
        self.descriptors().into_iter().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods())
            .field("hidden", &self.hidden)
            .finish()
    }
}

/// Collects definitions and hidden names, then freezes them into a registry
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    defs: Vec<MethodDef>,
    hidden: HashSet<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, def: MethodDef) -> Self {
        self.defs.push(def);
        self
    }

    pub fn methods(mut self, defs: impl IntoIterator<Item = MethodDef>) -> Self {
        self.defs.extend(defs);
        self
    }

    /// Hide a method name; matching ignores case
    pub fn hide(mut self, method: impl Into<String>) -> Self {
        self.hidden.insert(method.into().to_lowercase());
        self
    }

    pub fn build(self) -> MethodRegistry {
        let mut entries = HashMap::with_capacity(self.defs.len());

        for def in self.defs {
            let name = def.descriptor.name.clone();

            if def.visibility == Visibility::Private {
                tracing::debug!(method = %name, "Skipping private method");
                continue;
            }
            if self.hidden.contains(&name.to_lowercase()) {
                tracing::debug!(method = %name, "Skipping hidden method");
                continue;
            }

            let entry = MethodEntry {
                descriptor: def.descriptor,
                handler: def.handler,
            };
            if entries.insert(name.clone(), Arc::new(entry)).is_some() {
                tracing::warn!(method = %name, "Method registered twice, keeping the last definition");
            }
        }

        tracing::debug!(method_count = entries.len(), "Method registry built");

        MethodRegistry {
            entries: Arc::new(entries),
            hidden: Arc::new(self.hidden),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use serde_json::json;

    fn echo(name: &str) -> MethodDef {
        MethodDef::new(name, from_fn(|args| async move { Ok(Value::Array(args)) }))
    }

    #[test]
    fn test_hidden_is_case_insensitive() {
        let registry = MethodRegistry::builder()
            .method(echo("Handle"))
            .method(echo("add"))
            .hide("handle")
            .build();

        assert!(!registry.contains("Handle"));
        assert!(!registry.contains("HANDLE"));
        assert!(registry.contains("add"));
        assert_eq!(registry.methods(), vec!["add".to_string()]);
    }

    #[test]
    fn test_private_methods_are_excluded() {
        let registry = MethodRegistry::builder()
            .method(echo("visible"))
            .method(echo("secret").private())
            .build();

        assert_eq!(registry.len(), 1);
        assert!(registry.get("secret").is_none());
    }

    #[test]
    fn test_duplicate_keeps_last() {
        let registry = MethodRegistry::builder()
            .method(echo("dup").description("first"))
            .method(echo("dup").description("second"))
            .build();

        let entry = registry.get("dup").unwrap();
        assert_eq!(entry.descriptor().description.as_deref(), Some("second"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = MethodRegistry::builder().method(echo("getUser")).build();
        assert!(registry.contains("getUser"));
        assert!(!registry.contains("getuser"));
    }

    #[tokio::test]
    async fn test_invoke_fits_declared_params() {
        let registry = MethodRegistry::builder()
            .method(
                echo("f")
                    .param(ParameterSpec::required("a"))
                    .param(ParameterSpec::optional("b", 10))
                    .param(ParameterSpec::optional("c", Value::Null)),
            )
            .build();

        let entry = registry.get("f").unwrap();
        let result = entry.invoke(vec![json!(1)]).await.unwrap();
        assert_eq!(result, json!([1, 10, null]));

        let result = entry.invoke(vec![json!(1), json!(2), json!(3), json!(4)]).await.unwrap();
        assert_eq!(result, json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_invoke_without_params_drops_args() {
        let registry = MethodRegistry::builder().method(echo("g")).build();

        let result = registry.get("g").unwrap().invoke(vec![json!(1)]).await.unwrap();
        assert_eq!(result, json!([]));
    }

    #[test]
    fn test_descriptors_sorted() {
        let registry = MethodRegistry::builder()
            .methods(vec![echo("zeta"), echo("alpha"), echo("mu")])
            .build();

        let names: Vec<_> = registry.descriptors().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mu", "zeta"]);
    }
}
