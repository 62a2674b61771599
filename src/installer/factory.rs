// src/installer/factory.rs

//! Installer factory
//!
//! Descriptors reference their implementation by class name; the factory maps
//! those names to pre-registered installer instances. Registration is where
//! an entry gets validated, so use-time resolution has a single failure mode:
//! the name is not registered.

use crate::error::NotInstallable;
use crate::install::{CopyInstaller, ResourceInstaller, SymlinkInstaller};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of installer implementations keyed by class name
#[derive(Default)]
pub struct InstallerFactory {
    installers: IndexMap<String, Arc<dyn ResourceInstaller>>,
}

impl InstallerFactory {
    /// An empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with the built-in `copy` and `symlink` installers
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory
            .register("copy", Arc::new(CopyInstaller::new()))
            .expect("non-empty builtin class name");
        factory
            .register("symlink", Arc::new(SymlinkInstaller::new()))
            .expect("non-empty builtin class name");
        factory
    }

    /// Register an installer under a class name, replacing any previous entry
    pub fn register(
        &mut self,
        class_name: &str,
        installer: Arc<dyn ResourceInstaller>,
    ) -> Result<(), NotInstallable> {
        if class_name.is_empty() {
            return Err(NotInstallable::installer_class_invalid(class_name));
        }
        debug!("Registered installer class '{class_name}'");
        self.installers.insert(class_name.to_string(), installer);
        Ok(())
    }

    pub fn is_registered(&self, class_name: &str) -> bool {
        self.installers.contains_key(class_name)
    }

    /// Resolve a class name to its installer
    pub fn instantiate(&self, class_name: &str) -> Result<Arc<dyn ResourceInstaller>, NotInstallable> {
        self.installers
            .get(class_name)
            .cloned()
            .ok_or_else(|| NotInstallable::installer_class_not_found(class_name))
    }
}
