// src/installer/data.rs

//! Persisted form of installer descriptors
//!
//! Descriptors are stored in a scope's extra-data slot as a JSON map keyed by
//! installer name. The serde structs below are the schema: unknown keys are
//! rejected, `required` defaults to false, and absent `default`/`description`
//! stay absent. Conversion into domain types happens after decoding.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{InstallerDescriptor, InstallerParameter};

/// Persisted installer entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallerData {
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, InstallerParameterData>,
}

/// Persisted installer parameter entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallerParameterData {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Decode one installer entry into a domain descriptor
///
/// `scope` only feeds the error message.
pub fn to_descriptor(scope: &str, name: &str, data: &InstallerData) -> Result<InstallerDescriptor> {
    let mut descriptor = InstallerDescriptor::new(name, &data.class)
        .map_err(|e| Error::invalid_config(scope, e.to_string()))?;
    if let Some(description) = &data.description {
        descriptor = descriptor.with_description(description);
    }
    for (param_name, param_data) in &data.parameters {
        let mut parameter = InstallerParameter::new(param_name, param_data.required)
            .map_err(|e| Error::invalid_config(scope, e.to_string()))?;
        if let Some(default) = &param_data.default {
            parameter = parameter
                .with_default(default.clone())
                .map_err(|e| Error::invalid_config(scope, e.to_string()))?;
        }
        if let Some(description) = &param_data.description {
            parameter = parameter.with_description(description);
        }
        descriptor = descriptor.with_parameter(parameter);
    }
    Ok(descriptor)
}

/// Encode a domain descriptor back into its persisted form
pub fn from_descriptor(descriptor: &InstallerDescriptor) -> InstallerData {
    InstallerData {
        class: descriptor.class_name().to_string(),
        description: descriptor.description().map(str::to_string),
        parameters: descriptor
            .parameters()
            .values()
            .map(|p| {
                (
                    p.name().to_string(),
                    InstallerParameterData {
                        required: p.is_required(),
                        default: p.default_value().cloned(),
                        description: p.description().map(str::to_string),
                    },
                )
            })
            .collect(),
    }
}

/// Decode a whole extra-data slot value (map keyed by installer name)
pub fn decode_installers(scope: &str, value: &Value) -> Result<IndexMap<String, InstallerDescriptor>> {
    let entries: IndexMap<String, InstallerData> = serde_json::from_value(value.clone())
        .map_err(|e| Error::invalid_config(scope, e.to_string()))?;
    entries
        .iter()
        .map(|(name, data)| Ok((name.clone(), to_descriptor(scope, name, data)?)))
        .collect()
}

/// Encode a descriptor map into an extra-data slot value
pub fn encode_installers(descriptors: &IndexMap<String, InstallerDescriptor>) -> Result<Value> {
    let entries: IndexMap<&str, InstallerData> = descriptors
        .iter()
        .map(|(name, d)| (name.as_str(), from_descriptor(d)))
        .collect();
    Ok(serde_json::to_value(entries)?)
}
