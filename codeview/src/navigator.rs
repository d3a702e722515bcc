//! Root-constrained directory cursor.
//!
//! The cursor only ever moves by appending a single child name or by popping
//! one level, and never above the project root. Every refused move leaves the
//! cursor where it was.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::types::FileEntry;
use crate::error::{InvalidRootError, NavigationError};
use crate::io::fs_query::FileSystem;

/// Entries under the cursor plus whether an "up" entry should be offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<FileEntry>,
    pub show_parent: bool,
}

#[derive(Debug)]
pub struct FolderNavigator<F> {
    fs: F,
    root: PathBuf,
    cursor: PathBuf,
}

impl<F: FileSystem> FolderNavigator<F> {
    /// Open a navigator with `path` as both root and cursor.
    pub fn open(fs: F, path: impl AsRef<Path>) -> Result<Self, InvalidRootError> {
        let root = resolve_root(&fs, path.as_ref())?;
        Ok(Self {
            fs,
            cursor: root.clone(),
            root,
        })
    }

    /// Replace the root; the cursor moves to the new root.
    pub fn set_root(&mut self, path: impl AsRef<Path>) -> Result<(), InvalidRootError> {
        let root = resolve_root(&self.fs, path.as_ref())?;
        debug!(root = %root.display(), "project root set");
        self.cursor = root.clone();
        self.root = root;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn full_path(&self) -> &Path {
        &self.cursor
    }

    pub fn is_root(&self) -> bool {
        self.cursor == self.root
    }

    /// Descend into the subdirectory `name` of the cursor.
    pub fn go_child(&mut self, name: &str) -> Result<(), NavigationError> {
        validate_name(name)?;
        let candidate = self.cursor.join(name);
        let not_a_directory = || NavigationError::NotADirectory {
            name: name.to_string(),
            cursor: self.cursor.clone(),
        };
        if !self.fs.is_dir(&candidate) {
            return Err(not_a_directory());
        }
        let resolved = self
            .fs
            .canonicalize(&candidate)
            .map_err(|_| not_a_directory())?;
        if !resolved.starts_with(&self.root) {
            return Err(NavigationError::OutsideRoot {
                name: name.to_string(),
            });
        }
        debug!(cursor = %resolved.display(), "entered directory");
        self.cursor = resolved;
        Ok(())
    }

    /// Move one level up. Refused at the root.
    pub fn go_parent(&mut self) -> Result<(), NavigationError> {
        if self.is_root() {
            return Err(NavigationError::AtRoot);
        }
        self.cursor.pop();
        debug!(cursor = %self.cursor.display(), "left directory");
        Ok(())
    }

    /// Path of `name` under the cursor, for opening a file. Does not move the cursor.
    pub fn child_full_path(&self, name: &str) -> Result<PathBuf, NavigationError> {
        validate_name(name)?;
        Ok(self.cursor.join(name))
    }

    /// Entries under the cursor: directories first, then by name.
    pub fn list(&self) -> Result<Listing> {
        let mut entries = self
            .fs
            .read_dir(&self.cursor)
            .with_context(|| format!("list {}", self.cursor.display()))?;
        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(Listing {
            entries,
            show_parent: !self.is_root(),
        })
    }
}

fn resolve_root<F: FileSystem>(fs: &F, path: &Path) -> Result<PathBuf, InvalidRootError> {
    let invalid = |reason: String| InvalidRootError {
        path: path.to_path_buf(),
        reason,
    };
    if !fs.is_dir(path) {
        return Err(invalid("not an existing directory".to_string()));
    }
    fs.canonicalize(path).map_err(|err| invalid(err.to_string()))
}

/// Accept exactly one normal path component with no separators.
fn validate_name(name: &str) -> Result<(), NavigationError> {
    let invalid = || NavigationError::InvalidName(name.to_string());
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(invalid());
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}
