// src/discovery.rs

//! Binding store boundary
//!
//! Asset mappings are persisted as bindings in an external discovery store.
//! This module owns the binding value object, the narrow [`BindingStore`]
//! interface the pipeline consumes, and an in-memory reference
//! implementation. The store's own consistency model is out of scope; the
//! pipeline only relies on the four query/mutation operations below.

use crate::predicate::{Expr, FieldLookup};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Binding field name: the binding's UUID
pub const FIELD_UUID: &str = "uuid";
/// Binding field name: the resource query (glob plus recursive suffix)
pub const FIELD_QUERY: &str = "query";
/// Binding field name: the binding type
pub const FIELD_TYPE: &str = "type";
/// Binding field name: whether the binding is enabled
pub const FIELD_ENABLED: &str = "enabled";

/// A discovery-store binding
///
/// The underlying representation an asset mapping is translated to: a typed,
/// parameterized query against the resource repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    uuid: Uuid,
    query: String,
    type_name: String,
    parameters: IndexMap<String, Value>,
    enabled: bool,
}

impl Binding {
    pub fn new(
        uuid: Uuid,
        query: impl Into<String>,
        type_name: impl Into<String>,
        parameters: IndexMap<String, Value>,
    ) -> Self {
        Self {
            uuid,
            query: query.into(),
            type_name: type_name.into(),
            parameters,
            enabled: true,
        }
    }

    /// Mark the binding disabled; disabled bindings are excluded by the
    /// translator's base predicate
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn parameters(&self) -> &IndexMap<String, Value> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl FieldLookup for Binding {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            FIELD_UUID => Some(Value::String(self.uuid.to_string())),
            FIELD_QUERY => Some(Value::String(self.query.clone())),
            FIELD_TYPE => Some(Value::String(self.type_name.clone())),
            FIELD_ENABLED => Some(Value::Bool(self.enabled)),
            _ => None,
        }
    }

    fn parameter(&self, name: &str) -> Option<Value> {
        self.parameters.get(name).cloned()
    }
}

/// Narrow interface onto the external discovery store
///
/// Mutation always targets the root scope; queries come in a merged flavor
/// (root plus bindings inherited from dependency scopes) and a root-only
/// flavor. Predicates are binding-side expressions as produced by the
/// translator.
pub trait BindingStore {
    /// Add a binding to the root scope
    fn add_binding(&mut self, binding: Binding);

    /// Remove root-scope bindings matching the predicate, returning the count
    fn remove_bindings(&mut self, predicate: &Expr) -> usize;

    /// All bindings matching the predicate, inherited scopes included
    fn find_bindings(&self, predicate: &Expr) -> Vec<Binding>;

    /// Root-scope bindings matching the predicate
    fn find_root_bindings(&self, predicate: &Expr) -> Vec<Binding>;

    /// Whether any binding matches, inherited scopes included
    fn has_bindings(&self, predicate: &Expr) -> bool {
        !self.find_bindings(predicate).is_empty()
    }

    /// Whether any root-scope binding matches
    fn has_root_bindings(&self, predicate: &Expr) -> bool {
        !self.find_root_bindings(predicate).is_empty()
    }
}

/// In-memory discovery store
///
/// Reference implementation used by tests and embedding callers that do not
/// bring their own discovery engine.
#[derive(Debug, Default)]
pub struct InMemoryDiscovery {
    root: Vec<Binding>,
    inherited: Vec<Binding>,
}

impl InMemoryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a binding owned by a dependency scope (not removable through the
    /// root-scope mutation operations)
    pub fn add_inherited_binding(&mut self, binding: Binding) {
        self.inherited.push(binding);
    }
}

impl BindingStore for InMemoryDiscovery {
    fn add_binding(&mut self, binding: Binding) {
        debug!("Added binding {} for query '{}'", binding.uuid(), binding.query());
        self.root.push(binding);
    }

    fn remove_bindings(&mut self, predicate: &Expr) -> usize {
        let before = self.root.len();
        self.root.retain(|b| !predicate.evaluate(b));
        let removed = before - self.root.len();
        if removed > 0 {
            debug!("Removed {} binding(s)", removed);
        }
        removed
    }

    fn find_bindings(&self, predicate: &Expr) -> Vec<Binding> {
        self.inherited
            .iter()
            .chain(self.root.iter())
            .filter(|b| predicate.evaluate(*b))
            .cloned()
            .collect()
    }

    fn find_root_bindings(&self, predicate: &Expr) -> Vec<Binding> {
        self.root.iter().filter(|b| predicate.evaluate(*b)).cloned().collect()
    }
}
