// src/error.rs

//! Error types for the asset-installation pipeline
//!
//! Two layers: `NotInstallable` enumerates the failure modes of the
//! installation pipeline itself (every kind carries the offending name), and
//! `Error` is the crate-wide type covering direct lookups, validation and
//! persistence on top of it.

use thiserror::Error;
use uuid::Uuid;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of `prepare_installation` and parameter assembly
///
/// Each variant maps to exactly one stage of the pipeline. Nothing is retried;
/// the pipeline is read-only until `install_resource` runs, so a failure at
/// any stage leaves no state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotInstallable {
    /// A parameter required by the installer was not supplied by the server
    #[error("Required parameter '{parameter}' of installer '{installer}' is missing")]
    MissingParameter { parameter: String, installer: String },

    /// A supplied parameter is not declared by the installer descriptor
    #[error("Installer '{installer}' has no parameter '{parameter}'")]
    NoSuchParameter { parameter: String, installer: String },

    /// The server references an installer that is not registered
    #[error("Installer '{name}' not found")]
    InstallerNotFound { name: String },

    /// The repository returned no resources for the mapping's glob
    #[error("No resources match the glob '{glob}'")]
    NoResourceMatches { glob: String },

    /// The mapping references a server that is not in the collection
    #[error("Server '{name}' not found")]
    ServerNotFound { name: String },

    /// The descriptor's class name has no registered installer
    #[error("Installer class '{class_name}' is not registered")]
    InstallerClassNotFound { class_name: String },

    /// The installer constructor cannot be invoked without arguments
    ///
    /// With pre-registered installer instances this is never produced; the
    /// kind is kept so handlers can switch exhaustively over the full family.
    #[error("Installer class '{class_name}' has no default constructor")]
    InstallerClassNoDefaultConstructor { class_name: String },

    /// The registered value does not satisfy the installer contract
    #[error("Installer class '{class_name}' is not a valid resource installer")]
    InstallerClassInvalid { class_name: String },
}

impl NotInstallable {
    pub fn missing_parameter(parameter: &str, installer: &str) -> Self {
        Self::MissingParameter {
            parameter: parameter.to_string(),
            installer: installer.to_string(),
        }
    }

    pub fn no_such_parameter(parameter: &str, installer: &str) -> Self {
        Self::NoSuchParameter {
            parameter: parameter.to_string(),
            installer: installer.to_string(),
        }
    }

    pub fn installer_not_found(name: &str) -> Self {
        Self::InstallerNotFound { name: name.to_string() }
    }

    pub fn no_resource_matches(glob: &str) -> Self {
        Self::NoResourceMatches { glob: glob.to_string() }
    }

    pub fn server_not_found(name: &str) -> Self {
        Self::ServerNotFound { name: name.to_string() }
    }

    pub fn installer_class_not_found(class_name: &str) -> Self {
        Self::InstallerClassNotFound { class_name: class_name.to_string() }
    }

    pub fn installer_class_invalid(class_name: &str) -> Self {
        Self::InstallerClassInvalid { class_name: class_name.to_string() }
    }
}

/// Errors that can occur anywhere in the crate
#[derive(Error, Debug)]
pub enum Error {
    /// A stage of the installation pipeline failed
    #[error(transparent)]
    NotInstallable(#[from] NotInstallable),

    /// Direct server lookup failed
    #[error("Server '{name}' does not exist")]
    NoSuchServer { name: String },

    /// Direct installer descriptor lookup failed
    #[error("Installer '{name}' does not exist{}", scope_suffix(.root))]
    NoSuchInstaller { name: String, root: bool },

    /// Direct installer parameter lookup failed
    #[error("Installer '{installer}' has no parameter '{parameter}'")]
    NoSuchInstallerParameter { parameter: String, installer: String },

    /// Asset mapping lookup by UUID failed
    #[error("Asset mapping '{uuid}' does not exist{}", scope_suffix(.root))]
    NoSuchMapping { uuid: Uuid, root: bool },

    /// Adding a descriptor whose name is taken by a dependency scope
    #[error("Installer '{name}' is already defined by scope '{scope}' and cannot be redefined")]
    DuplicateInstaller { name: String, scope: String },

    /// A value-object constructor rejected its input
    #[error("Invalid value: {0}")]
    Validation(String),

    /// Persisted installer data failed schema validation
    #[error("Invalid installer data in scope '{scope}': {reason}")]
    InvalidConfig { scope: String, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Persistence of the root scope failed
    #[error("Failed to persist scope '{scope}': {reason}")]
    Persistence { scope: String, reason: String },
}

fn scope_suffix(root: &bool) -> &'static str {
    if *root { " in the root scope" } else { "" }
}

impl Error {
    pub fn no_such_server(name: &str) -> Self {
        Self::NoSuchServer { name: name.to_string() }
    }

    pub fn no_such_installer(name: &str, root: bool) -> Self {
        Self::NoSuchInstaller { name: name.to_string(), root }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_config(scope: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig { scope: scope.to_string(), reason: reason.into() }
    }
}
