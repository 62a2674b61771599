// src/asset/manager.rs

//! Asset mapping store on top of the discovery store
//!
//! CRUD and predicate queries over asset mappings, implemented by translating
//! every operation into binding-side terms and delegating to the external
//! [`BindingStore`]. The manager itself holds no mapping state.

use crate::discovery::{Binding, BindingStore, FIELD_UUID};
use crate::error::{Error, Result};
use crate::predicate::Expr;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::translator::{self, ASSET_BINDING_TYPE, PARAM_PATH, PARAM_SERVER, RECURSIVE_SUFFIX};
use super::AssetMapping;

/// Asset mapping store backed by a discovery store
#[derive(Debug)]
pub struct DiscoveryAssetManager<S: BindingStore> {
    discovery: S,
}

impl<S: BindingStore> DiscoveryAssetManager<S> {
    pub fn new(discovery: S) -> Self {
        Self { discovery }
    }

    /// Access to the underlying discovery store
    pub fn discovery(&self) -> &S {
        &self.discovery
    }

    /// Add a mapping to the root scope
    pub fn add_root_mapping(&mut self, mapping: &AssetMapping) {
        debug!(
            "Mapping '{}' to '{}' on server '{}'",
            mapping.glob(),
            mapping.server_path(),
            mapping.server_name()
        );
        self.discovery.add_binding(mapping_to_binding(mapping));
    }

    /// Remove a root-scope mapping by UUID; absent UUIDs are a no-op
    pub fn remove_root_mapping(&mut self, uuid: Uuid) {
        self.discovery.remove_bindings(&translator::translate(Some(&uuid_predicate(uuid))));
    }

    /// Remove all root-scope mappings matching the predicate
    pub fn remove_root_mappings(&mut self, predicate: &Expr) -> usize {
        self.discovery.remove_bindings(&translator::translate(Some(predicate)))
    }

    /// Remove every root-scope mapping
    pub fn clear_root_mappings(&mut self) -> usize {
        self.discovery.remove_bindings(&translator::translate(None))
    }

    /// Look up a mapping by UUID across all scopes
    pub fn mapping(&self, uuid: Uuid) -> Result<AssetMapping> {
        self.discovery
            .find_bindings(&translator::translate(Some(&uuid_predicate(uuid))))
            .iter()
            .find_map(binding_to_mapping)
            .ok_or(Error::NoSuchMapping { uuid, root: false })
    }

    /// Look up a root-scope mapping by UUID
    pub fn root_mapping(&self, uuid: Uuid) -> Result<AssetMapping> {
        self.discovery
            .find_root_bindings(&translator::translate(Some(&uuid_predicate(uuid))))
            .iter()
            .find_map(binding_to_mapping)
            .ok_or(Error::NoSuchMapping { uuid, root: true })
    }

    /// All mappings across all scopes
    pub fn mappings(&self) -> Vec<AssetMapping> {
        self.find_mappings(&Expr::True)
    }

    /// All root-scope mappings
    pub fn root_mappings(&self) -> Vec<AssetMapping> {
        self.find_root_mappings(&Expr::True)
    }

    /// Mappings matching a mapping-side predicate, all scopes
    pub fn find_mappings(&self, predicate: &Expr) -> Vec<AssetMapping> {
        convert_all(self.discovery.find_bindings(&translator::translate(Some(predicate))))
    }

    /// Root-scope mappings matching a mapping-side predicate
    pub fn find_root_mappings(&self, predicate: &Expr) -> Vec<AssetMapping> {
        convert_all(self.discovery.find_root_bindings(&translator::translate(Some(predicate))))
    }

    pub fn has_mapping(&self, uuid: Uuid) -> bool {
        self.discovery
            .has_bindings(&translator::translate(Some(&uuid_predicate(uuid))))
    }

    pub fn has_mappings(&self, predicate: Option<&Expr>) -> bool {
        self.discovery.has_bindings(&translator::translate(predicate))
    }

    pub fn has_root_mappings(&self, predicate: Option<&Expr>) -> bool {
        self.discovery.has_root_bindings(&translator::translate(predicate))
    }
}

fn uuid_predicate(uuid: Uuid) -> Expr {
    // "uuid" is binding-native, so it passes through the translator unchanged
    Expr::same(FIELD_UUID, uuid.to_string())
}

fn mapping_to_binding(mapping: &AssetMapping) -> Binding {
    let mut parameters = IndexMap::new();
    parameters.insert(PARAM_SERVER.to_string(), Value::String(mapping.server_name().to_string()));
    parameters.insert(PARAM_PATH.to_string(), Value::String(mapping.server_path().to_string()));
    Binding::new(
        mapping.uuid(),
        format!("{}{}", mapping.glob(), RECURSIVE_SUFFIX),
        ASSET_BINDING_TYPE,
        parameters,
    )
}

fn binding_to_mapping(binding: &Binding) -> Option<AssetMapping> {
    let glob = binding.query().strip_suffix(RECURSIVE_SUFFIX)?;
    let server_name = binding.parameter(PARAM_SERVER)?.as_str()?;
    let server_path = binding.parameter(PARAM_PATH)?.as_str()?;
    match AssetMapping::with_uuid(binding.uuid(), glob, server_name, server_path) {
        Ok(mapping) => Some(mapping),
        Err(err) => {
            warn!("Skipping malformed asset binding {}: {}", binding.uuid(), err);
            None
        }
    }
}

fn convert_all(bindings: Vec<Binding>) -> Vec<AssetMapping> {
    bindings.iter().filter_map(binding_to_mapping).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{FIELD_GLOB, FIELD_SERVER_NAME};
    use crate::discovery::InMemoryDiscovery;

    fn manager() -> DiscoveryAssetManager<InMemoryDiscovery> {
        DiscoveryAssetManager::new(InMemoryDiscovery::new())
    }

    fn mapping(glob: &str, server: &str, path: &str) -> AssetMapping {
        AssetMapping::new(glob, server, path).unwrap()
    }

    #[test]
    fn test_add_and_get_round_trip() {
        let mut mgr = manager();
        let m = mapping("/app/public", "localhost", "assets");
        mgr.add_root_mapping(&m);

        assert_eq!(mgr.mapping(m.uuid()).unwrap(), m);
        assert_eq!(mgr.root_mapping(m.uuid()).unwrap(), m);
        assert!(mgr.has_mapping(m.uuid()));
    }

    #[test]
    fn test_binding_carries_recursive_suffix_and_parameters() {
        let mut mgr = manager();
        let m = mapping("/app/public", "localhost", "assets");
        mgr.add_root_mapping(&m);

        let bindings = mgr.discovery().find_bindings(&Expr::True);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].query(), "/app/public{,/**/*}");
        assert_eq!(bindings[0].type_name(), ASSET_BINDING_TYPE);
        assert_eq!(bindings[0].parameter(PARAM_SERVER).unwrap(), "localhost");
        assert_eq!(bindings[0].parameter(PARAM_PATH).unwrap(), "/assets");
    }

    #[test]
    fn test_get_missing_mapping_fails() {
        let uuid = Uuid::new_v4();
        match manager().mapping(uuid) {
            Err(Error::NoSuchMapping { uuid: u, root: false }) => assert_eq!(u, uuid),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_remove_by_uuid() {
        let mut mgr = manager();
        let m = mapping("/app/public", "localhost", "/");
        mgr.add_root_mapping(&m);
        mgr.remove_root_mapping(m.uuid());
        assert!(!mgr.has_mapping(m.uuid()));
        assert!(mgr.mappings().is_empty());
    }

    #[test]
    fn test_find_by_glob_and_server() {
        let mut mgr = manager();
        mgr.add_root_mapping(&mapping("/app/css", "localhost", "css"));
        mgr.add_root_mapping(&mapping("/app/js", "cdn", "js"));

        let by_glob = mgr.find_mappings(&Expr::same(FIELD_GLOB, "/app/css"));
        assert_eq!(by_glob.len(), 1);
        assert_eq!(by_glob[0].server_name(), "localhost");

        let by_server = mgr.find_mappings(&Expr::same(FIELD_SERVER_NAME, "cdn"));
        assert_eq!(by_server.len(), 1);
        assert_eq!(by_server[0].glob(), "/app/js");
    }

    #[test]
    fn test_remove_matching_and_clear() {
        let mut mgr = manager();
        mgr.add_root_mapping(&mapping("/app/css", "localhost", "css"));
        mgr.add_root_mapping(&mapping("/app/js", "cdn", "js"));

        assert_eq!(mgr.remove_root_mappings(&Expr::same(FIELD_SERVER_NAME, "cdn")), 1);
        assert_eq!(mgr.mappings().len(), 1);
        assert_eq!(mgr.clear_root_mappings(), 1);
        assert!(!mgr.has_mappings(None));
    }

    #[test]
    fn test_inherited_mappings_visible_but_not_root() {
        let mut discovery = InMemoryDiscovery::new();
        let inherited = mapping("/dep/assets", "localhost", "/");
        discovery.add_inherited_binding(mapping_to_binding(&inherited));
        let mgr = DiscoveryAssetManager::new(discovery);

        assert_eq!(mgr.mappings().len(), 1);
        assert!(mgr.root_mappings().is_empty());
        assert!(mgr.has_mappings(None));
        assert!(!mgr.has_root_mappings(None));
        assert!(matches!(
            mgr.root_mapping(inherited.uuid()),
            Err(Error::NoSuchMapping { root: true, .. })
        ));
    }

    #[test]
    fn test_disabled_bindings_are_invisible() {
        let mut discovery = InMemoryDiscovery::new();
        let m = mapping("/app/public", "localhost", "/");
        discovery.add_binding(mapping_to_binding(&m).disabled());
        let mgr = DiscoveryAssetManager::new(discovery);

        assert!(mgr.mappings().is_empty());
        assert!(!mgr.has_mapping(m.uuid()));
    }
}
