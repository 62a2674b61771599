// src/scope.rs

//! Scopes and the extra-data slot boundary
//!
//! Installer descriptors live in a per-scope key-value "extra data" slot.
//! Dependency scopes are read-only; the root scope is mutable and persisted
//! through [`RootScopeStore::save`], which is the registry's unit of
//! atomicity.

use crate::error::Result;
use serde_json::{Map, Value};
use std::io;

/// Extra-data key under which installer descriptors are stored
pub const INSTALLERS_KEY: &str = "installers";

/// Read-only view of a dependency scope's extra data
#[derive(Debug, Clone, Default)]
pub struct Scope {
    name: String,
    extra: Map<String, Value>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), extra: Map::new() }
    }

    pub fn with_extra_key(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extra_key(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Mutable, persisted extra-data store of the root scope
///
/// `save` writes the whole slot back to wherever the scope lives (scope
/// configuration file, database row). A failed save must leave the persisted
/// state untouched; callers roll their in-memory state back and re-raise.
pub trait RootScopeStore {
    fn name(&self) -> &str;

    fn extra_key(&self, key: &str) -> Option<&Value>;

    fn set_extra_key(&mut self, key: &str, value: Value);

    fn remove_extra_key(&mut self, key: &str);

    /// Persist the scope; the single synchronous call registry mutations are
    /// atomic around
    fn save(&mut self) -> Result<()>;
}

/// In-memory root scope
///
/// Keeps the last saved snapshot so tests can assert what was actually
/// persisted, and can be told to fail the next save to exercise rollback
/// paths.
#[derive(Debug, Default)]
pub struct InMemoryRootScope {
    name: String,
    extra: Map<String, Value>,
    saved: Map<String, Value>,
    fail_next_save: bool,
}

impl InMemoryRootScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Make the next `save` call fail without persisting
    pub fn fail_next_save(&mut self) {
        self.fail_next_save = true;
    }

    /// The extra data as of the last successful save
    pub fn saved_extra_key(&self, key: &str) -> Option<&Value> {
        self.saved.get(key)
    }
}

impl RootScopeStore for InMemoryRootScope {
    fn name(&self) -> &str {
        &self.name
    }

    fn extra_key(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    fn set_extra_key(&mut self, key: &str, value: Value) {
        self.extra.insert(key.to_string(), value);
    }

    fn remove_extra_key(&mut self, key: &str) {
        self.extra.remove(key);
    }

    fn save(&mut self) -> Result<()> {
        if self.fail_next_save {
            self.fail_next_save = false;
            return Err(io::Error::other("simulated save failure").into());
        }
        self.saved = self.extra.clone();
        Ok(())
    }
}
