// src/install/tree.rs

//! Filesystem tree operations shared by the copy and symlink installers
//!
//! Placement discipline for both installers: a resource installed at the
//! mapping's root path merges per child (replace same-named entries, keep the
//! rest), anywhere else the exact target node is replaced. Replacing before
//! writing is what makes re-installation idempotent.

use crate::error::Result;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Join a `/`-separated server path onto the document root
pub(super) fn target_path(document_root: &Path, server_path: &str) -> PathBuf {
    let mut target = document_root.to_path_buf();
    for segment in server_path.split('/').filter(|s| !s.is_empty()) {
        target.push(segment);
    }
    target
}

/// Remove whatever node exists at the path, if any
pub(super) fn remove_existing(path: &Path) -> Result<()> {
    match path.symlink_metadata() {
        Err(_) => Ok(()),
        Ok(metadata) => {
            if metadata.is_dir() {
                fs::remove_dir_all(path)?;
            } else {
                // Plain file or symlink (a symlink to a directory is still
                // removed as a link, not followed)
                fs::remove_file(path)?;
            }
            Ok(())
        }
    }
}

/// Recursively copy a file or directory tree
pub(super) fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    if !source.is_dir() {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, target)?;
        return Ok(());
    }

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let entry_target = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&entry_target)?;
        } else {
            if let Some(parent) = entry_target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &entry_target)?;
        }
    }
    Ok(())
}

/// Relative path from one directory to a target
///
/// Both paths must be absolute and free of `.`/`..` components; callers
/// canonicalize first.
pub(super) fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let common = from.iter().zip(to.iter()).take_while(|(a, b)| a == b).count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component);
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}
