// src/lib.rs

//! Stagehand asset-installation pipeline
//!
//! Maps glob-selected repository resources to public paths on named servers,
//! resolves which installer implementation handles each server, validates
//! installer parameters and drives the actual write.
//!
//! # Architecture
//!
//! - Asset mappings are persisted as bindings in an external discovery store;
//!   queries over mapping fields are rewritten into binding-side predicates
//! - Installer descriptors are layered: built-ins, dependency scopes, then
//!   the root scope (root wins); only the root tier is mutable, with
//!   all-or-nothing persistence around a single save call
//! - Installation is a linear read-only pipeline producing validated,
//!   immutable [`InstallationParams`], then delegating each resource write to
//!   the resolved [`ResourceInstaller`]
//! - Reference installers: copy and symlink, both idempotent on re-run

pub mod asset;
pub mod discovery;
mod error;
pub mod install;
pub mod installer;
pub mod predicate;
pub mod repository;
pub mod scope;
pub mod server;

pub use asset::{AssetMapping, DiscoveryAssetManager};
pub use discovery::{Binding, BindingStore, InMemoryDiscovery};
pub use error::{Error, NotInstallable, Result};
pub use install::{
    CopyInstaller, InstallationManager, InstallationParams, ResourceInstaller, SymlinkInstaller,
};
pub use installer::{
    InstallerDescriptor, InstallerFactory, InstallerParameter, ScopeInstallerManager,
};
pub use predicate::{Comparison, Expr, FieldLookup};
pub use repository::{InMemoryRepository, Resource, ResourceRepository};
pub use scope::{InMemoryRootScope, RootScopeStore, Scope};
pub use server::{Server, ServerCollection};
