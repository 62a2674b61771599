// src/install/params.rs

//! Assembled installation parameters
//!
//! The immutable bundle handed to a resource installer: the resolved
//! installer and descriptor, the matched resources, the originating mapping,
//! the resolved server, the project root, the glob's fixed base path, and the
//! merged parameter values. Validation against the descriptor happens at
//! construction; afterwards the bundle is read-only and lives for a single
//! installation run.

use crate::asset::AssetMapping;
use crate::error::{NotInstallable, Result};
use crate::installer::InstallerDescriptor;
use crate::repository::{glob_base_path, Resource};
use crate::server::Server;
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ResourceInstaller;

/// Validated, immutable parameter bundle for one installation run
pub struct InstallationParams {
    installer: Arc<dyn ResourceInstaller>,
    descriptor: InstallerDescriptor,
    resources: Vec<Resource>,
    mapping: AssetMapping,
    server: Server,
    root_dir: PathBuf,
    base_path: String,
    parameter_values: IndexMap<String, Value>,
}

impl InstallationParams {
    /// Assemble and validate the bundle
    ///
    /// Merged values are the descriptor's optional-parameter defaults
    /// overridden key-by-key by the server's values. A server value for an
    /// undeclared parameter or a missing required parameter fails here.
    pub fn new(
        installer: Arc<dyn ResourceInstaller>,
        descriptor: InstallerDescriptor,
        resources: Vec<Resource>,
        mapping: AssetMapping,
        server: Server,
        root_dir: PathBuf,
    ) -> Result<Self> {
        let mut parameter_values = descriptor.default_parameter_values();
        for (name, value) in server.parameter_values() {
            parameter_values.insert(name.clone(), value.clone());
        }

        for name in parameter_values.keys() {
            if !descriptor.has_parameter(name) {
                return Err(
                    NotInstallable::no_such_parameter(name, descriptor.name()).into()
                );
            }
        }
        for parameter in descriptor.parameters().values() {
            if parameter.is_required() && !parameter_values.contains_key(parameter.name()) {
                return Err(NotInstallable::missing_parameter(
                    parameter.name(),
                    descriptor.name(),
                )
                .into());
            }
        }

        let base_path = glob_base_path(mapping.glob()).to_string();
        Ok(Self {
            installer,
            descriptor,
            resources,
            mapping,
            server,
            root_dir,
            base_path,
            parameter_values,
        })
    }

    pub fn installer(&self) -> &Arc<dyn ResourceInstaller> {
        &self.installer
    }

    pub fn descriptor(&self) -> &InstallerDescriptor {
        &self.descriptor
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn mapping(&self) -> &AssetMapping {
        &self.mapping
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// The glob's fixed, non-wildcard directory prefix
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Descriptor defaults overridden by server values
    pub fn parameter_values(&self) -> &IndexMap<String, Value> {
        &self.parameter_values
    }

    /// The server's document root, resolved against the project root when
    /// relative
    pub fn document_root(&self) -> PathBuf {
        let document_root = Path::new(self.server.document_root());
        if document_root.is_absolute() {
            document_root.to_path_buf()
        } else {
            self.root_dir.join(document_root)
        }
    }

    /// Public path of a resource: the mapping's server path joined with the
    /// resource's path relative to the base path
    pub fn server_path_for_resource(&self, resource: &Resource) -> String {
        let relative = resource
            .path()
            .strip_prefix(self.base_path.as_str())
            .unwrap_or(resource.path())
            .trim_matches('/');
        let joined = format!("{}/{}", self.mapping.server_path(), relative);
        format!("/{}", joined.trim_matches('/'))
    }
}
