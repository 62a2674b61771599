// src/asset/mod.rs

//! Asset mappings
//!
//! An asset mapping binds a resource glob to a public path on a named server.
//! Mappings are value objects; their persisted form is a discovery-store
//! binding (see [`translator`] for the conversion rules and
//! [`manager`] for the store built on top of them).

pub mod manager;
pub mod translator;

pub use manager::DiscoveryAssetManager;

use crate::error::{Error, Result};
use crate::predicate::FieldLookup;
use serde_json::Value;
use uuid::Uuid;

/// Mapping field name: the resource glob
pub const FIELD_GLOB: &str = "glob";
/// Mapping field name: the target server
pub const FIELD_SERVER_NAME: &str = "serverName";
/// Mapping field name: the public path on the server
pub const FIELD_SERVER_PATH: &str = "serverPath";
/// Mapping field name: the mapping's UUID
pub const FIELD_UUID: &str = "uuid";

/// A rule mapping glob-selected repository resources to a public path on a
/// named server
///
/// Immutable after construction. The server name is a reference, not a
/// foreign key; it is resolved against the server collection at installation
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMapping {
    uuid: Uuid,
    glob: String,
    server_name: String,
    server_path: String,
}

impl AssetMapping {
    /// Create a mapping with a generated UUID
    pub fn new(glob: &str, server_name: &str, server_path: &str) -> Result<Self> {
        Self::with_uuid(Uuid::new_v4(), glob, server_name, server_path)
    }

    /// Create a mapping with a caller-supplied UUID
    pub fn with_uuid(uuid: Uuid, glob: &str, server_name: &str, server_path: &str) -> Result<Self> {
        if glob.is_empty() {
            return Err(Error::validation("The glob must not be empty"));
        }
        if server_name.is_empty() {
            return Err(Error::validation("The server name must not be empty"));
        }
        Ok(Self {
            uuid,
            glob: glob.to_string(),
            server_name: server_name.to_string(),
            server_path: normalize_server_path(server_path),
        })
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Normalized public path: exactly one leading `/`, no trailing `/`
    /// except for the root path itself
    pub fn server_path(&self) -> &str {
        &self.server_path
    }
}

impl FieldLookup for AssetMapping {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            FIELD_UUID => Some(Value::String(self.uuid.to_string())),
            FIELD_GLOB => Some(Value::String(self.glob.clone())),
            FIELD_SERVER_NAME => Some(Value::String(self.server_name.clone())),
            FIELD_SERVER_PATH => Some(Value::String(self.server_path.clone())),
            _ => None,
        }
    }
}

fn normalize_server_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}
