//! A code-viewing session: project root, active file, and its fold markers.
//!
//! The session owns the navigator and the active-file association. The text
//! itself lives in the caller's [`TextBuffer`] (the display widget), which the
//! session writes after a load and reads before a save.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::fold::{FoldExtraction, FoldOptions, extract_from_text};
use crate::error::{NoActiveFileError, SessionError};
use crate::io::document::{load_text, save_text};
use crate::io::fs_query::FileSystem;
use crate::navigator::{FolderNavigator, Listing};

/// The displayed text buffer of a code view.
pub trait TextBuffer {
    fn text(&self) -> &str;
    fn set_text(&mut self, text: String);
}

impl TextBuffer for String {
    fn text(&self) -> &str {
        self
    }

    fn set_text(&mut self, text: String) {
        *self = text;
    }
}

#[derive(Debug)]
pub struct Session<F> {
    navigator: FolderNavigator<F>,
    active_file: Option<PathBuf>,
    fold_options: FoldOptions,
}

impl<F: FileSystem> Session<F> {
    pub fn open(fs: F, root: impl AsRef<Path>, fold_options: FoldOptions) -> Result<Self, SessionError> {
        let navigator = FolderNavigator::open(fs, root)?;
        info!(root = %navigator.root().display(), "session opened");
        Ok(Self {
            navigator,
            active_file: None,
            fold_options,
        })
    }

    /// Switch to a new project root. The active file association is dropped.
    pub fn open_root(&mut self, root: impl AsRef<Path>) -> Result<(), SessionError> {
        self.navigator.set_root(root)?;
        self.active_file = None;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        self.navigator.root()
    }

    pub fn navigator(&self) -> &FolderNavigator<F> {
        &self.navigator
    }

    pub fn enter(&mut self, name: &str) -> Result<(), SessionError> {
        Ok(self.navigator.go_child(name)?)
    }

    pub fn leave(&mut self) -> Result<(), SessionError> {
        Ok(self.navigator.go_parent()?)
    }

    pub fn list(&self) -> anyhow::Result<Listing> {
        self.navigator.list()
    }

    pub fn active_file(&self) -> Option<&Path> {
        self.active_file.as_deref()
    }

    /// Load `name` from the cursor directory into `buffer` and make it the active file.
    ///
    /// On failure neither the buffer nor the active file changes.
    pub fn open_file<B: TextBuffer>(
        &mut self,
        name: &str,
        buffer: &mut B,
    ) -> Result<FoldExtraction, SessionError> {
        let path = self.navigator.child_full_path(name)?;
        let text = load_text(&path)?;
        let folds = extract_from_text(&text, &self.fold_options);
        buffer.set_text(text);
        debug!(path = %path.display(), markers = folds.markers.len(), "file opened");
        self.active_file = Some(path);
        Ok(folds)
    }

    /// Recompute markers after the buffer changed.
    pub fn refresh_folds<B: TextBuffer>(&self, buffer: &B) -> FoldExtraction {
        extract_from_text(buffer.text(), &self.fold_options)
    }

    /// Write the buffer back to the active file. Returns the path written.
    pub fn save<B: TextBuffer>(&self, buffer: &B) -> Result<PathBuf, SessionError> {
        let path = self.active_file.as_ref().ok_or(NoActiveFileError)?;
        save_text(path, buffer.text())?;
        Ok(path.clone())
    }
}
