// src/install/mod.rs

//! Installation orchestration
//!
//! `InstallationManager` drives the pipeline: resolve the mapping's server,
//! resolve the server's installer, match resources, assemble and validate
//! [`InstallationParams`], then hand each resource to the resolved
//! [`ResourceInstaller`]. The whole preparation is read-only; nothing touches
//! the filesystem until `install_resource` runs.

pub mod copy;
pub mod params;
pub mod symlink;
mod tree;

pub use copy::CopyInstaller;
pub use params::InstallationParams;
pub use symlink::SymlinkInstaller;

use crate::asset::AssetMapping;
use crate::error::{Error, NotInstallable, Result};
use crate::installer::{InstallerFactory, ScopeInstallerManager};
use crate::repository::{Resource, ResourceRepository};
use crate::server::ServerCollection;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The pluggable strategy performing the actual write
///
/// Implementations must be callable repeatedly with the same params for
/// different resources of one matched set; whether any setup cost is cached
/// across calls is the implementation's business.
pub trait ResourceInstaller: Send + Sync {
    /// Semantic validation beyond the descriptor's parameter schema
    fn validate_params(&self, _params: &InstallationParams) -> Result<()> {
        Ok(())
    }

    /// Install one resource at its computed server path
    fn install_resource(&self, resource: &Resource, params: &InstallationParams) -> Result<()>;
}

/// Orchestrates mapping resolution and installation
pub struct InstallationManager<R: ResourceRepository> {
    servers: ServerCollection,
    installers: ScopeInstallerManager,
    factory: InstallerFactory,
    repository: R,
    root_dir: PathBuf,
}

impl<R: ResourceRepository> InstallationManager<R> {
    pub fn new(
        servers: ServerCollection,
        installers: ScopeInstallerManager,
        factory: InstallerFactory,
        repository: R,
        root_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            servers,
            installers,
            factory,
            repository,
            root_dir: root_dir.into(),
        }
    }

    pub fn servers(&self) -> &ServerCollection {
        &self.servers
    }

    pub fn servers_mut(&mut self) -> &mut ServerCollection {
        &mut self.servers
    }

    pub fn installers(&self) -> &ScopeInstallerManager {
        &self.installers
    }

    pub fn installers_mut(&mut self) -> &mut ScopeInstallerManager {
        &mut self.installers
    }

    pub fn factory_mut(&mut self) -> &mut InstallerFactory {
        &mut self.factory
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Resolve a mapping into validated installation parameters
    ///
    /// Linear pipeline, no retries, read-only throughout. Every failure mode
    /// is a [`NotInstallable`] kind naming the offending server, installer,
    /// glob, class or parameter.
    pub fn prepare_installation(&self, mapping: &AssetMapping) -> Result<InstallationParams> {
        let server = self
            .servers
            .get(mapping.server_name())
            .map_err(|_| NotInstallable::server_not_found(mapping.server_name()))?;

        // Only a failed lookup becomes InstallerNotFound; registry load
        // errors (e.g. malformed scope data) surface unchanged
        let descriptor = match self.installers.descriptor(server.installer_name()) {
            Ok(descriptor) => descriptor,
            Err(Error::NoSuchInstaller { .. }) => {
                return Err(NotInstallable::installer_not_found(server.installer_name()).into());
            }
            Err(err) => return Err(err),
        };

        let resources = self.repository.find(mapping.glob())?;
        if resources.is_empty() {
            return Err(NotInstallable::no_resource_matches(mapping.glob()).into());
        }

        let installer = self.factory.instantiate(descriptor.class_name())?;

        let params = InstallationParams::new(
            installer,
            descriptor,
            resources,
            mapping.clone(),
            server.clone(),
            self.root_dir.clone(),
        )?;

        params.installer().validate_params(&params)?;

        debug!(
            "Prepared installation of '{}' to '{}' on server '{}' ({} resource(s))",
            mapping.glob(),
            mapping.server_path(),
            server.name(),
            params.resources().len()
        );
        Ok(params)
    }

    /// Install one matched resource; pure delegation to the resolved installer
    pub fn install_resource(&self, resource: &Resource, params: &InstallationParams) -> Result<()> {
        params.installer().install_resource(resource, params)?;
        info!(
            "Installed '{}' to '{}' on server '{}'",
            resource.path(),
            params.server_path_for_resource(resource),
            params.server().name()
        );
        Ok(())
    }
}
