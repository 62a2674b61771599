// src/installer/mod.rs

//! Installer descriptors
//!
//! A descriptor is the persisted metadata about an installer implementation:
//! its name, the class name resolved against the installer factory at use
//! time, and its typed parameters. Descriptors are immutable; the layered
//! registry in [`manager`] owns their lifecycle.

pub mod data;
pub mod factory;
pub mod manager;

pub use factory::InstallerFactory;
pub use manager::ScopeInstallerManager;

use crate::error::{Error, Result};
use crate::predicate::FieldLookup;
use indexmap::IndexMap;
use serde_json::Value;

/// Descriptor field name: the installer name
pub const FIELD_NAME: &str = "name";
/// Descriptor field name: the installer class
pub const FIELD_CLASS: &str = "class";
/// Descriptor field name: the human-readable description
pub const FIELD_DESCRIPTION: &str = "description";

/// A typed installer parameter
///
/// Required parameters must be supplied by the server; optional parameters
/// may carry a default. A required parameter with a default is contradictory
/// and rejected at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallerParameter {
    name: String,
    required: bool,
    default_value: Option<Value>,
    description: Option<String>,
}

impl InstallerParameter {
    pub fn new(name: &str, required: bool) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::validation("The parameter name must not be empty"));
        }
        Ok(Self {
            name: name.to_string(),
            required,
            default_value: None,
            description: None,
        })
    }

    /// Attach a default value; only valid for optional parameters
    pub fn with_default(mut self, default_value: Value) -> Result<Self> {
        if self.required {
            return Err(Error::validation(format!(
                "The required parameter '{}' must not have a default value",
                self.name
            )));
        }
        self.default_value = Some(default_value);
        Ok(self)
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Immutable description of an installer implementation
#[derive(Debug, Clone, PartialEq)]
pub struct InstallerDescriptor {
    name: String,
    class_name: String,
    description: Option<String>,
    parameters: IndexMap<String, InstallerParameter>,
}

impl InstallerDescriptor {
    pub fn new(name: &str, class_name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::validation("The installer name must not be empty"));
        }
        if class_name.is_empty() {
            return Err(Error::validation("The installer class name must not be empty"));
        }
        Ok(Self {
            name: name.to_string(),
            class_name: class_name.to_string(),
            description: None,
            parameters: IndexMap::new(),
        })
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Add a parameter; insertion order is preserved
    pub fn with_parameter(mut self, parameter: InstallerParameter) -> Self {
        self.parameters.insert(parameter.name().to_string(), parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opaque class reference, resolved against the factory at use time
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parameters(&self) -> &IndexMap<String, InstallerParameter> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Result<&InstallerParameter> {
        self.parameters.get(name).ok_or_else(|| Error::NoSuchInstallerParameter {
            parameter: name.to_string(),
            installer: self.name.clone(),
        })
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Default values of the optional parameters that declare one, in
    /// insertion order
    pub fn default_parameter_values(&self) -> IndexMap<String, Value> {
        self.parameters
            .values()
            .filter_map(|p| p.default_value().map(|v| (p.name().to_string(), v.clone())))
            .collect()
    }
}

impl FieldLookup for InstallerDescriptor {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            FIELD_NAME => Some(Value::String(self.name.clone())),
            FIELD_CLASS => Some(Value::String(self.class_name.clone())),
            FIELD_DESCRIPTION => Some(
                self.description
                    .as_ref()
                    .map(|d| Value::String(d.clone()))
                    .unwrap_or(Value::Null),
            ),
            _ => None,
        }
    }
}
