// src/installer/manager.rs

//! Layered installer registry
//!
//! Descriptors come from three tiers: the built-in `copy` and `symlink`
//! installers, installers declared by dependency scopes, and installers
//! declared by the root scope. The root tier wins on name collision and is
//! the only mutable one; resolution keeps provenance explicit so a non-root
//! name can never be shadowed after loading.
//!
//! Mutations are transactional around the single `save` call of the root
//! scope store: both in-memory maps are snapshotted before the change,
//! persistence is attempted, and on failure the snapshots are restored and
//! the error re-raised.

use crate::error::{Error, Result};
use crate::predicate::Expr;
use crate::scope::{RootScopeStore, Scope, INSTALLERS_KEY};
use indexmap::IndexMap;
use serde_json::json;
use std::cell::RefCell;
use tracing::{debug, info};

use super::{data, InstallerDescriptor, InstallerParameter};

/// Provenance tier of the built-in descriptors
const BUILTIN_SCOPE: &str = "builtin";

/// A descriptor below the root tier, tagged with the scope that declared it
#[derive(Debug, Clone)]
struct OwnedDescriptor {
    scope: String,
    descriptor: InstallerDescriptor,
}

/// Lazily loaded registry state
#[derive(Debug, Clone, Default)]
struct Loaded {
    /// Built-in and dependency-scope descriptors (later scopes win)
    underlying: IndexMap<String, OwnedDescriptor>,
    /// Root-scope descriptors, the mutable tier
    root: IndexMap<String, InstallerDescriptor>,
}

impl Loaded {
    fn merged_get(&self, name: &str) -> Option<&InstallerDescriptor> {
        self.root
            .get(name)
            .or_else(|| self.underlying.get(name).map(|owned| &owned.descriptor))
    }

    fn merged_contains(&self, name: &str) -> bool {
        self.root.contains_key(name) || self.underlying.contains_key(name)
    }

    /// Merged view: non-shadowed underlying descriptors first, then the root
    /// tier
    fn merged_iter(&self) -> impl Iterator<Item = &InstallerDescriptor> {
        self.underlying
            .iter()
            .filter(|(name, _)| !self.root.contains_key(*name))
            .map(|(_, owned)| &owned.descriptor)
            .chain(self.root.values())
    }
}

/// Installer registry layered across the root scope and dependency scopes
pub struct ScopeInstallerManager {
    store: Box<dyn RootScopeStore>,
    scopes: Vec<Scope>,
    loaded: RefCell<Option<Loaded>>,
}

impl ScopeInstallerManager {
    /// Create a registry over a root scope store and the dependency scopes
    ///
    /// Nothing is read until the first access.
    pub fn new(store: Box<dyn RootScopeStore>, scopes: Vec<Scope>) -> Self {
        Self { store, scopes, loaded: RefCell::new(None) }
    }

    /// Add a descriptor to the root scope
    ///
    /// A name already taken by a built-in or dependency-scope descriptor is
    /// rejected; a root-owned name is silently redefined.
    pub fn add_root_descriptor(&mut self, descriptor: InstallerDescriptor) -> Result<()> {
        self.ensure_loaded()?;
        let mut guard = self.loaded.borrow_mut();
        let loaded = guard.as_mut().expect("registry loaded above");

        let name = descriptor.name().to_string();
        if !loaded.root.contains_key(&name)
            && let Some(owner) = loaded.underlying.get(&name)
        {
            return Err(Error::DuplicateInstaller { name, scope: owner.scope.clone() });
        }

        let snapshot = loaded.root.clone();
        loaded.root.insert(name.clone(), descriptor);
        if let Err(err) = persist(&mut *self.store, &loaded.root) {
            loaded.root = snapshot;
            return Err(err);
        }
        info!("Added installer '{name}'");
        Ok(())
    }

    /// Remove a root-scope descriptor
    ///
    /// A name that does not exist anywhere is a no-op; a name owned by a
    /// lower tier is rejected.
    pub fn remove_root_descriptor(&mut self, name: &str) -> Result<()> {
        self.ensure_loaded()?;
        let mut guard = self.loaded.borrow_mut();
        let loaded = guard.as_mut().expect("registry loaded above");

        if !loaded.root.contains_key(name) {
            if loaded.underlying.contains_key(name) {
                return Err(Error::no_such_installer(name, true));
            }
            return Ok(());
        }

        let snapshot = loaded.root.clone();
        loaded.root.shift_remove(name);
        if let Err(err) = persist(&mut *self.store, &loaded.root) {
            loaded.root = snapshot;
            return Err(err);
        }
        info!("Removed installer '{name}'");
        Ok(())
    }

    /// Remove all root-scope descriptors matching the predicate
    pub fn remove_root_descriptors(&mut self, predicate: &Expr) -> Result<usize> {
        self.retain_root(|descriptor| !predicate.evaluate(descriptor))
    }

    /// Remove every root-scope descriptor
    pub fn clear_root_descriptors(&mut self) -> Result<usize> {
        self.retain_root(|_| false)
    }

    fn retain_root(&mut self, keep: impl Fn(&InstallerDescriptor) -> bool) -> Result<usize> {
        self.ensure_loaded()?;
        let mut guard = self.loaded.borrow_mut();
        let loaded = guard.as_mut().expect("registry loaded above");

        let snapshot = loaded.root.clone();
        loaded.root.retain(|_, descriptor| keep(descriptor));
        let removed = snapshot.len() - loaded.root.len();
        if removed == 0 {
            return Ok(0);
        }
        if let Err(err) = persist(&mut *self.store, &loaded.root) {
            loaded.root = snapshot;
            return Err(err);
        }
        info!("Removed {removed} installer(s)");
        Ok(removed)
    }

    /// Look up a descriptor across all tiers
    pub fn descriptor(&self, name: &str) -> Result<InstallerDescriptor> {
        self.ensure_loaded()?;
        self.loaded
            .borrow()
            .as_ref()
            .and_then(|loaded| loaded.merged_get(name).cloned())
            .ok_or_else(|| Error::no_such_installer(name, false))
    }

    /// Look up a root-scope descriptor
    pub fn root_descriptor(&self, name: &str) -> Result<InstallerDescriptor> {
        self.ensure_loaded()?;
        self.loaded
            .borrow()
            .as_ref()
            .and_then(|loaded| loaded.root.get(name).cloned())
            .ok_or_else(|| Error::no_such_installer(name, true))
    }

    pub fn has_descriptor(&self, name: &str) -> Result<bool> {
        self.ensure_loaded()?;
        Ok(self.loaded.borrow().as_ref().is_some_and(|l| l.merged_contains(name)))
    }

    pub fn has_root_descriptor(&self, name: &str) -> Result<bool> {
        self.ensure_loaded()?;
        Ok(self.loaded.borrow().as_ref().is_some_and(|l| l.root.contains_key(name)))
    }

    /// All descriptors in the merged view
    pub fn descriptors(&self) -> Result<Vec<InstallerDescriptor>> {
        self.find_descriptors(&Expr::True)
    }

    /// All root-scope descriptors
    pub fn root_descriptors(&self) -> Result<Vec<InstallerDescriptor>> {
        self.find_root_descriptors(&Expr::True)
    }

    /// Merged descriptors matching the predicate
    pub fn find_descriptors(&self, predicate: &Expr) -> Result<Vec<InstallerDescriptor>> {
        self.ensure_loaded()?;
        Ok(self
            .loaded
            .borrow()
            .as_ref()
            .map(|loaded| {
                loaded.merged_iter().filter(|d| predicate.evaluate(*d)).cloned().collect()
            })
            .unwrap_or_default())
    }

    /// Root-scope descriptors matching the predicate
    pub fn find_root_descriptors(&self, predicate: &Expr) -> Result<Vec<InstallerDescriptor>> {
        self.ensure_loaded()?;
        Ok(self
            .loaded
            .borrow()
            .as_ref()
            .map(|loaded| {
                loaded.root.values().filter(|d| predicate.evaluate(*d)).cloned().collect()
            })
            .unwrap_or_default())
    }

    pub fn has_descriptors(&self, predicate: &Expr) -> Result<bool> {
        Ok(!self.find_descriptors(predicate)?.is_empty())
    }

    pub fn has_root_descriptors(&self, predicate: &Expr) -> Result<bool> {
        Ok(!self.find_root_descriptors(predicate)?.is_empty())
    }

    /// Provenance of a descriptor: `"builtin"`, a dependency scope name, or
    /// the root scope's name
    pub fn descriptor_scope(&self, name: &str) -> Result<Option<String>> {
        self.ensure_loaded()?;
        let guard = self.loaded.borrow();
        let loaded = guard.as_ref().expect("registry loaded above");
        if loaded.root.contains_key(name) {
            return Ok(Some(self.store.name().to_string()));
        }
        Ok(loaded.underlying.get(name).map(|owned| owned.scope.clone()))
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded.borrow().is_some() {
            return Ok(());
        }

        let mut underlying = IndexMap::new();
        for descriptor in builtin_descriptors() {
            underlying.insert(
                descriptor.name().to_string(),
                OwnedDescriptor { scope: BUILTIN_SCOPE.to_string(), descriptor },
            );
        }
        for scope in &self.scopes {
            if let Some(value) = scope.extra_key(INSTALLERS_KEY) {
                for (name, descriptor) in data::decode_installers(scope.name(), value)? {
                    underlying
                        .insert(name, OwnedDescriptor { scope: scope.name().to_string(), descriptor });
                }
            }
        }

        let root = match self.store.extra_key(INSTALLERS_KEY) {
            Some(value) => data::decode_installers(self.store.name(), value)?,
            None => IndexMap::new(),
        };

        debug!(
            "Loaded {} installer(s) ({} root-owned)",
            underlying.len() + root.iter().filter(|(n, _)| !underlying.contains_key(*n)).count(),
            root.len()
        );
        *self.loaded.borrow_mut() = Some(Loaded { underlying, root });
        Ok(())
    }
}

fn persist(store: &mut dyn RootScopeStore, root: &IndexMap<String, InstallerDescriptor>) -> Result<()> {
    if root.is_empty() {
        store.remove_extra_key(INSTALLERS_KEY);
    } else {
        store.set_extra_key(INSTALLERS_KEY, data::encode_installers(root)?);
    }
    store.save()
}

/// The two installers available regardless of scope configuration
fn builtin_descriptors() -> Vec<InstallerDescriptor> {
    let copy = InstallerDescriptor::new("copy", "copy")
        .expect("static descriptor")
        .with_description("Copies assets into the document root of the server");
    let symlink = InstallerDescriptor::new("symlink", "symlink")
        .expect("static descriptor")
        .with_description("Symlinks assets into the document root of the server")
        .with_parameter(
            InstallerParameter::new("relative", false)
                .expect("static parameter")
                .with_default(json!(true))
                .expect("optional parameter")
                .with_description("Whether to create relative or absolute links"),
        );
    vec![copy, symlink]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::{FIELD_CLASS, FIELD_NAME};
    use crate::predicate::Expr;
    use crate::scope::InMemoryRootScope;

    fn manager() -> ScopeInstallerManager {
        ScopeInstallerManager::new(Box::new(InMemoryRootScope::new("acme/app")), Vec::new())
    }

    fn manager_with_scope(scope: Scope) -> ScopeInstallerManager {
        ScopeInstallerManager::new(Box::new(InMemoryRootScope::new("acme/app")), vec![scope])
    }

    fn rsync_descriptor() -> InstallerDescriptor {
        InstallerDescriptor::new("rsync", "rsync").unwrap()
    }

    #[test]
    fn test_builtins_always_present() {
        let mgr = manager();
        assert!(mgr.has_descriptor("copy").unwrap());
        assert!(mgr.has_descriptor("symlink").unwrap());
        assert!(!mgr.has_root_descriptor("copy").unwrap());

        let symlink = mgr.descriptor("symlink").unwrap();
        assert_eq!(
            symlink.parameter("relative").unwrap().default_value(),
            Some(&json!(true))
        );
        assert_eq!(mgr.descriptor_scope("copy").unwrap().as_deref(), Some("builtin"));
    }

    #[test]
    fn test_add_and_get_root_descriptor() {
        let mut mgr = manager();
        mgr.add_root_descriptor(rsync_descriptor()).unwrap();

        assert_eq!(mgr.descriptor("rsync").unwrap(), rsync_descriptor());
        assert_eq!(mgr.root_descriptor("rsync").unwrap(), rsync_descriptor());
        assert_eq!(mgr.descriptor_scope("rsync").unwrap().as_deref(), Some("acme/app"));
    }

    #[test]
    fn test_add_persists_to_store() {
        let mut store = InMemoryRootScope::new("acme/app");
        store.set_extra_key("unrelated", json!(1));
        let mut mgr = ScopeInstallerManager::new(Box::new(store), Vec::new());
        mgr.add_root_descriptor(rsync_descriptor()).unwrap();

        // Round-trip through a fresh manager over the same persisted data
        let value = mgr.store.extra_key(INSTALLERS_KEY).cloned().unwrap();
        assert_eq!(value, json!({ "rsync": { "class": "rsync" } }));
    }

    #[test]
    fn test_add_rejects_builtin_collision() {
        let mut mgr = manager();
        let result = mgr.add_root_descriptor(InstallerDescriptor::new("copy", "my-copy").unwrap());
        assert!(matches!(
            result,
            Err(Error::DuplicateInstaller { ref name, ref scope }) if name == "copy" && scope == "builtin"
        ));
    }

    #[test]
    fn test_add_rejects_dependency_scope_collision() {
        let scope = Scope::new("acme/theme")
            .with_extra_key(INSTALLERS_KEY, json!({ "rsync": { "class": "rsync" } }));
        let mut mgr = manager_with_scope(scope);

        let result = mgr.add_root_descriptor(rsync_descriptor());
        assert!(matches!(
            result,
            Err(Error::DuplicateInstaller { ref scope, .. }) if scope == "acme/theme"
        ));
    }

    #[test]
    fn test_root_owned_name_may_be_redefined() {
        let mut mgr = manager();
        mgr.add_root_descriptor(rsync_descriptor()).unwrap();

        let redefined = InstallerDescriptor::new("rsync", "rsync-v2").unwrap();
        mgr.add_root_descriptor(redefined.clone()).unwrap();
        assert_eq!(mgr.descriptor("rsync").unwrap(), redefined);
    }

    #[test]
    fn test_root_persisted_data_shadows_lower_tiers() {
        // Shadowing that already exists in persisted data is honored on load
        let mut store = InMemoryRootScope::new("acme/app");
        store.set_extra_key(INSTALLERS_KEY, json!({ "copy": { "class": "custom-copy" } }));
        let mgr = ScopeInstallerManager::new(Box::new(store), Vec::new());

        assert_eq!(mgr.descriptor("copy").unwrap().class_name(), "custom-copy");
        assert!(mgr.has_root_descriptor("copy").unwrap());

        // The merged view contains no duplicate for the shadowed name
        let names: Vec<String> = mgr
            .descriptors()
            .unwrap()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names.iter().filter(|n| n.as_str() == "copy").count(), 1);
    }

    #[test]
    fn test_remove_root_descriptor() {
        let mut mgr = manager();
        mgr.add_root_descriptor(rsync_descriptor()).unwrap();
        mgr.remove_root_descriptor("rsync").unwrap();

        assert!(!mgr.has_descriptor("rsync").unwrap());
        // Absent everywhere: no-op
        mgr.remove_root_descriptor("rsync").unwrap();
        // Owned by a lower tier: rejected
        assert!(matches!(
            mgr.remove_root_descriptor("copy"),
            Err(Error::NoSuchInstaller { root: true, .. })
        ));
        assert!(mgr.has_descriptor("copy").unwrap());
    }

    #[test]
    fn test_remove_shadowing_root_descriptor_uncovers_builtin() {
        let mut store = InMemoryRootScope::new("acme/app");
        store.set_extra_key(INSTALLERS_KEY, json!({ "copy": { "class": "custom-copy" } }));
        let mut mgr = ScopeInstallerManager::new(Box::new(store), Vec::new());

        mgr.remove_root_descriptor("copy").unwrap();
        assert_eq!(mgr.descriptor("copy").unwrap().class_name(), "copy");
        assert_eq!(mgr.descriptor_scope("copy").unwrap().as_deref(), Some("builtin"));
    }

    #[test]
    fn test_remove_matching_and_clear() {
        let mut mgr = manager();
        mgr.add_root_descriptor(rsync_descriptor()).unwrap();
        mgr.add_root_descriptor(InstallerDescriptor::new("ftp", "ftp").unwrap()).unwrap();

        let removed = mgr
            .remove_root_descriptors(&Expr::same(FIELD_NAME, "ftp"))
            .unwrap();
        assert_eq!(removed, 1);
        assert!(mgr.has_descriptor("rsync").unwrap());

        assert_eq!(mgr.clear_root_descriptors().unwrap(), 1);
        assert!(mgr.root_descriptors().unwrap().is_empty());
        // Builtins survive a clear
        assert!(mgr.has_descriptor("copy").unwrap());
    }

    #[test]
    fn test_empty_root_set_removes_extra_key() {
        let mut mgr = manager();
        mgr.add_root_descriptor(rsync_descriptor()).unwrap();
        assert!(mgr.store.extra_key(INSTALLERS_KEY).is_some());

        mgr.remove_root_descriptor("rsync").unwrap();
        assert!(mgr.store.extra_key(INSTALLERS_KEY).is_none());
    }

    #[test]
    fn test_add_rolls_back_on_failed_save() {
        let mut store = InMemoryRootScope::new("acme/app");
        store.fail_next_save();
        let mut mgr = ScopeInstallerManager::new(Box::new(store), Vec::new());

        assert!(mgr.add_root_descriptor(rsync_descriptor()).is_err());
        assert!(!mgr.has_descriptor("rsync").unwrap());
        assert!(mgr.root_descriptors().unwrap().is_empty());

        // The registry is usable again afterwards
        mgr.add_root_descriptor(rsync_descriptor()).unwrap();
        assert!(mgr.has_descriptor("rsync").unwrap());
    }

    #[test]
    fn test_remove_rolls_back_on_failed_save() {
        let mut store = InMemoryRootScope::new("acme/app");
        store.set_extra_key(INSTALLERS_KEY, json!({ "rsync": { "class": "rsync" } }));
        store.fail_next_save();
        let mut mgr = ScopeInstallerManager::new(Box::new(store), Vec::new());

        assert!(mgr.remove_root_descriptor("rsync").is_err());
        assert!(mgr.has_root_descriptor("rsync").unwrap());
    }

    #[test]
    fn test_find_descriptors_by_predicate() {
        let mut mgr = manager();
        mgr.add_root_descriptor(rsync_descriptor()).unwrap();

        let by_class = mgr.find_descriptors(&Expr::same(FIELD_CLASS, "rsync")).unwrap();
        assert_eq!(by_class.len(), 1);
        assert_eq!(by_class[0].name(), "rsync");

        let root_only = mgr.find_root_descriptors(&Expr::True).unwrap();
        assert_eq!(root_only.len(), 1);
        assert!(mgr.has_descriptors(&Expr::same(FIELD_NAME, "copy")).unwrap());
        assert!(!mgr.has_root_descriptors(&Expr::same(FIELD_NAME, "copy")).unwrap());
    }

    #[test]
    fn test_dependency_scope_installers_loaded() {
        let scope = Scope::new("acme/theme").with_extra_key(
            INSTALLERS_KEY,
            json!({ "cdn": { "class": "cdn", "description": "Pushes to the CDN" } }),
        );
        let mgr = manager_with_scope(scope);

        let cdn = mgr.descriptor("cdn").unwrap();
        assert_eq!(cdn.description(), Some("Pushes to the CDN"));
        assert_eq!(mgr.descriptor_scope("cdn").unwrap().as_deref(), Some("acme/theme"));
        assert!(!mgr.has_root_descriptor("cdn").unwrap());
    }

    #[test]
    fn test_malformed_scope_data_is_an_error() {
        let scope = Scope::new("acme/theme")
            .with_extra_key(INSTALLERS_KEY, json!({ "cdn": { "klass": "cdn" } }));
        let mgr = manager_with_scope(scope);
        assert!(matches!(
            mgr.descriptor("copy"),
            Err(Error::InvalidConfig { ref scope, .. }) if scope == "acme/theme"
        ));
    }

    #[test]
    fn test_missing_installer_messages() {
        let mgr = manager();
        let err = mgr.descriptor("rsync").unwrap_err();
        assert!(!err.to_string().contains("root scope"));
        let err = mgr.root_descriptor("rsync").unwrap_err();
        assert!(err.to_string().contains("root scope"));
    }
}
