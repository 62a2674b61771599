// src/server/mod.rs

//! Installation targets
//!
//! A server is a named place assets get installed to: a document root, a URL
//! format for generating public URLs, and installer-specific parameters. The
//! collection tracks a default server so callers can omit the name for the
//! common single-server setup.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

/// Reserved name resolving to the collection's default server
pub const DEFAULT_SERVER: &str = "default";

/// Default URL format when none is configured
pub const DEFAULT_URL_FORMAT: &str = "/%s";

/// A named installation target
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    name: String,
    installer_name: String,
    document_root: String,
    url_format: String,
    parameter_values: IndexMap<String, Value>,
}

impl Server {
    /// Create a server with the default URL format and no parameters
    pub fn new(name: &str, installer_name: &str, document_root: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::validation("The server name must not be empty"));
        }
        if name == DEFAULT_SERVER {
            return Err(Error::validation(format!(
                "The server name must not be the reserved name '{DEFAULT_SERVER}'"
            )));
        }
        if installer_name.is_empty() {
            return Err(Error::validation("The installer name must not be empty"));
        }
        if document_root.is_empty() {
            return Err(Error::validation("The document root must not be empty"));
        }
        Ok(Self {
            name: name.to_string(),
            installer_name: installer_name.to_string(),
            document_root: document_root.to_string(),
            url_format: DEFAULT_URL_FORMAT.to_string(),
            parameter_values: IndexMap::new(),
        })
    }

    /// Replace the URL format; must contain a `%s` placeholder
    pub fn with_url_format(mut self, url_format: &str) -> Result<Self> {
        if url_format.is_empty() {
            return Err(Error::validation("The URL format must not be empty"));
        }
        if !url_format.contains("%s") {
            return Err(Error::validation("The URL format must contain a '%s' placeholder"));
        }
        self.url_format = url_format.to_string();
        Ok(self)
    }

    /// Replace the installer-specific parameter values
    pub fn with_parameter_values(mut self, values: IndexMap<String, Value>) -> Self {
        self.parameter_values = values;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn installer_name(&self) -> &str {
        &self.installer_name
    }

    /// Directory path, URL, or other installer-specific locator
    pub fn document_root(&self) -> &str {
        &self.document_root
    }

    pub fn url_format(&self) -> &str {
        &self.url_format
    }

    pub fn parameter_values(&self) -> &IndexMap<String, Value> {
        &self.parameter_values
    }

    /// Public URL for a server path, with the leading `/` stripped before
    /// substitution
    pub fn format_url(&self, server_path: &str) -> String {
        self.url_format.replacen("%s", server_path.trim_start_matches('/'), 1)
    }
}

/// Insertion-ordered collection of servers with a tracked default
#[derive(Debug, Default)]
pub struct ServerCollection {
    servers: IndexMap<String, Server>,
    default_name: Option<String>,
}

impl ServerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a server; the first server added becomes the default
    pub fn add(&mut self, server: Server) {
        debug!("Added server '{}'", server.name());
        if self.default_name.is_none() {
            self.default_name = Some(server.name().to_string());
        }
        self.servers.insert(server.name().to_string(), server);
    }

    /// Look up a server by name; the reserved name `"default"` resolves to
    /// the default server
    pub fn get(&self, name: &str) -> Result<&Server> {
        if name == DEFAULT_SERVER {
            return self.default_server();
        }
        self.servers.get(name).ok_or_else(|| Error::no_such_server(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        if name == DEFAULT_SERVER {
            return self.default_name.is_some();
        }
        self.servers.contains_key(name)
    }

    /// Remove a server; removing the default promotes the next remaining
    /// server in insertion order
    pub fn remove(&mut self, name: &str) {
        if self.servers.shift_remove(name).is_some() {
            debug!("Removed server '{name}'");
            if self.default_name.as_deref() == Some(name) {
                self.default_name = self.servers.keys().next().cloned();
            }
        }
    }

    pub fn default_server(&self) -> Result<&Server> {
        self.default_name
            .as_deref()
            .and_then(|name| self.servers.get(name))
            .ok_or_else(|| Error::no_such_server(DEFAULT_SERVER))
    }

    /// Reassign the default to an existing server
    pub fn set_default_server(&mut self, name: &str) -> Result<()> {
        if !self.servers.contains_key(name) {
            return Err(Error::no_such_server(name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn servers(&self) -> impl Iterator<Item = &Server> {
        self.servers.values()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn clear(&mut self) {
        self.servers.clear();
        self.default_name = None;
    }
}
