// src/install/symlink.rs

//! Symlink installer
//!
//! Same placement discipline as the copy installer, but writes symlinks into
//! the document root instead of copying content. The `relative` parameter
//! (default true) selects relative link targets, which keep working when the
//! whole project tree is moved.

use crate::error::Result;
use crate::repository::Resource;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::tree::{relative_path, remove_existing, target_path};
use super::{InstallationParams, ResourceInstaller};

/// Name of the parameter selecting relative vs absolute link targets
pub const PARAM_RELATIVE: &str = "relative";

/// Reference installer symlinking resources into the document root
#[derive(Debug, Default)]
pub struct SymlinkInstaller;

impl SymlinkInstaller {
    pub fn new() -> Self {
        Self
    }

    fn link(&self, resource: &Resource, link_path: &Path, relative: bool) -> Result<()> {
        if let Some(parent) = link_path.parent() {
            fs::create_dir_all(parent)?;
        }
        remove_existing(link_path)?;

        let source = resource.filesystem_path().canonicalize()?;
        if relative {
            // Canonicalize the parent too so both sides of the computation
            // are free of symlinked components
            let parent = link_path
                .parent()
                .map(Path::canonicalize)
                .transpose()?
                .unwrap_or_default();
            std::os::unix::fs::symlink(relative_path(&parent, &source), link_path)?;
        } else {
            std::os::unix::fs::symlink(&source, link_path)?;
        }
        Ok(())
    }
}

impl ResourceInstaller for SymlinkInstaller {
    fn install_resource(&self, resource: &Resource, params: &InstallationParams) -> Result<()> {
        let document_root = params.document_root();
        fs::create_dir_all(&document_root)?;

        let relative = params
            .parameter_values()
            .get(PARAM_RELATIVE)
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        let server_path = params.server_path_for_resource(resource);
        if server_path == "/" {
            for child in resource.children()? {
                self.link(&child, &document_root.join(child.name()), relative)?;
            }
        } else {
            self.link(resource, &target_path(&document_root, &server_path), relative)?;
        }

        debug!(
            "Symlinked '{}' to '{}' ({})",
            resource.path(),
            server_path,
            if relative { "relative" } else { "absolute" }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetMapping;
    use crate::installer::{InstallerDescriptor, InstallerParameter};
    use crate::server::Server;
    use indexmap::IndexMap;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn descriptor() -> InstallerDescriptor {
        InstallerDescriptor::new("symlink", "symlink").unwrap().with_parameter(
            InstallerParameter::new(PARAM_RELATIVE, false)
                .unwrap()
                .with_default(json!(true))
                .unwrap(),
        )
    }

    fn params_for(
        resource: &Resource,
        server_values: IndexMap<String, serde_json::Value>,
        root_dir: PathBuf,
    ) -> InstallationParams {
        InstallationParams::new(
            Arc::new(SymlinkInstaller::new()),
            descriptor(),
            vec![resource.clone()],
            AssetMapping::new("/app/public", "localhost", "assets").unwrap(),
            Server::new("localhost", "symlink", "public_html")
                .unwrap()
                .with_parameter_values(server_values),
            root_dir,
        )
        .unwrap()
    }

    #[test]
    fn test_relative_symlink_by_default() {
        let project = TempDir::new().unwrap();
        let source = project.path().join("res");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("style.css"), b"body{}").unwrap();

        let resource = Resource::new("/app/public", &source);
        let params = params_for(&resource, IndexMap::new(), project.path().to_path_buf());
        SymlinkInstaller::new().install_resource(&resource, &params).unwrap();

        let link = project.path().join("public_html/assets");
        let target = fs::read_link(&link).unwrap();
        assert!(target.is_relative(), "expected relative target, got {target:?}");
        assert_eq!(fs::read(link.join("style.css")).unwrap(), b"body{}");
    }

    #[test]
    fn test_absolute_symlink_when_requested() {
        let project = TempDir::new().unwrap();
        let source = project.path().join("res");
        fs::create_dir_all(&source).unwrap();

        let mut values = IndexMap::new();
        values.insert(PARAM_RELATIVE.to_string(), json!(false));

        let resource = Resource::new("/app/public", &source);
        let params = params_for(&resource, values, project.path().to_path_buf());
        SymlinkInstaller::new().install_resource(&resource, &params).unwrap();

        let target = fs::read_link(project.path().join("public_html/assets")).unwrap();
        assert!(target.is_absolute(), "expected absolute target, got {target:?}");
    }

    #[test]
    fn test_reinstall_replaces_link() {
        let project = TempDir::new().unwrap();
        let source = project.path().join("res");
        fs::create_dir_all(&source).unwrap();

        let resource = Resource::new("/app/public", &source);
        let params = params_for(&resource, IndexMap::new(), project.path().to_path_buf());
        let installer = SymlinkInstaller::new();
        installer.install_resource(&resource, &params).unwrap();
        installer.install_resource(&resource, &params).unwrap();

        let link = project.path().join("public_html/assets");
        assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
    }
}
