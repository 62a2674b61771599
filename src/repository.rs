// src/repository.rs

//! Resource repository boundary
//!
//! The pipeline matches resources by glob against an external repository and
//! only needs their repository paths plus a filesystem backing to install
//! from. This module owns the resource value object, the narrow
//! [`ResourceRepository`] interface, and an in-memory implementation that maps
//! repository paths to filesystem paths.

use crate::error::{Error, Result};
use globset::{Glob, GlobMatcher};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Characters that make a glob segment non-literal
const GLOB_METACHARACTERS: [char; 4] = ['*', '?', '[', '{'];

/// A repository resource backed by the filesystem
///
/// `path` is the resource's location inside the repository namespace (always
/// absolute, `/`-separated); `filesystem_path` is where its content lives on
/// disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    path: String,
    filesystem_path: PathBuf,
}

impl Resource {
    pub fn new(path: impl Into<String>, filesystem_path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), filesystem_path: filesystem_path.into() }
    }

    /// Repository path, e.g. `/app/public/css`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the repository path
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Backing filesystem location
    pub fn filesystem_path(&self) -> &Path {
        &self.filesystem_path
    }

    pub fn is_dir(&self) -> bool {
        self.filesystem_path.is_dir()
    }

    /// Direct children of a directory resource, repository paths extended per
    /// child, sorted by name
    pub fn children(&self) -> Result<Vec<Resource>> {
        if !self.is_dir() {
            return Ok(Vec::new());
        }
        let mut children = Vec::new();
        for entry in fs::read_dir(&self.filesystem_path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let child_path = if self.path == "/" {
                format!("/{name}")
            } else {
                format!("{}/{}", self.path, name)
            };
            children.push(Resource::new(child_path, entry.path()));
        }
        children.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(children)
    }
}

/// Narrow interface onto the external resource repository
pub trait ResourceRepository {
    /// All resources whose repository path matches the glob, sorted by path;
    /// possibly empty
    fn find(&self, glob: &str) -> Result<Vec<Resource>>;

    /// Whether any resource matches the glob
    fn contains(&self, glob: &str) -> Result<bool> {
        Ok(!self.find(glob)?.is_empty())
    }
}

/// In-memory repository mapping repository paths to filesystem paths
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    resources: BTreeMap<String, PathBuf>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under a repository path
    pub fn add(&mut self, path: impl Into<String>, filesystem_path: impl Into<PathBuf>) {
        self.resources.insert(path.into(), filesystem_path.into());
    }
}

impl ResourceRepository for InMemoryRepository {
    fn find(&self, glob: &str) -> Result<Vec<Resource>> {
        // A literal path is a direct lookup, not a pattern match
        if !glob.contains(GLOB_METACHARACTERS) {
            return Ok(self
                .resources
                .get(glob)
                .map(|fs_path| vec![Resource::new(glob, fs_path.clone())])
                .into_iter()
                .flatten()
                .collect());
        }

        let matcher = compile_glob(glob)?;
        Ok(self
            .resources
            .iter()
            .filter(|(path, _)| matcher.is_match(path))
            .map(|(path, fs_path)| Resource::new(path.clone(), fs_path.clone()))
            .collect())
    }
}

fn compile_glob(glob: &str) -> Result<GlobMatcher> {
    Glob::new(glob)
        .map(|g| g.compile_matcher())
        .map_err(|e| Error::Validation(format!("Invalid glob '{glob}': {e}")))
}

/// Longest fixed directory prefix of a glob
///
/// The glob itself when it contains no wildcard metacharacters; otherwise the
/// directory part before the first segment carrying one, `/` at the minimum.
pub fn glob_base_path(glob: &str) -> &str {
    match glob.find(GLOB_METACHARACTERS) {
        None => glob,
        Some(first_meta) => match glob[..first_meta].rfind('/') {
            Some(0) | None => "/",
            Some(last_slash) => &glob[..last_slash],
        },
    }
}
