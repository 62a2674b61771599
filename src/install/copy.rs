// src/install/copy.rs

//! Copy installer
//!
//! Copies matched resources into the server's document root. The document
//! root is resolved against the project root and created on demand;
//! re-running an installation replaces what an earlier run left behind
//! instead of stacking duplicates.

use crate::error::Result;
use crate::repository::Resource;
use std::fs;
use tracing::debug;

use super::tree::{copy_tree, remove_existing, target_path};
use super::{InstallationParams, ResourceInstaller};

/// Reference installer copying resource trees into the document root
#[derive(Debug, Default)]
pub struct CopyInstaller;

impl CopyInstaller {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceInstaller for CopyInstaller {
    fn install_resource(&self, resource: &Resource, params: &InstallationParams) -> Result<()> {
        let document_root = params.document_root();
        fs::create_dir_all(&document_root)?;

        let server_path = params.server_path_for_resource(resource);
        if server_path == "/" {
            // Directory-merge: replace same-named children, keep the rest
            for child in resource.children()? {
                let target = document_root.join(child.name());
                remove_existing(&target)?;
                copy_tree(child.filesystem_path(), &target)?;
            }
        } else {
            let target = target_path(&document_root, &server_path);
            remove_existing(&target)?;
            copy_tree(resource.filesystem_path(), &target)?;
        }

        debug!("Copied '{}' to '{}'", resource.path(), server_path);
        Ok(())
    }
}
