//! Typed errors surfaced to the session layer.
//!
//! Orchestration and CLI code use `anyhow`; these types exist where callers
//! need to tell failure classes apart (navigation vs persistence vs "nothing
//! open").

use std::path::PathBuf;

use thiserror::Error;

use crate::core::fold::FoldKind;
use crate::core::types::Stage;

/// The requested project root is missing or not a directory.
#[derive(Error, Debug)]
#[error("invalid project root {}: {reason}", .path.display())]
pub struct InvalidRootError {
    pub path: PathBuf,
    pub reason: String,
}

/// A cursor move was refused. The cursor is left unchanged.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NavigationError {
    #[error("invalid entry name '{0}'")]
    InvalidName(String),
    #[error("no such directory '{name}' under {}", .cursor.display())]
    NotADirectory { name: String, cursor: PathBuf },
    #[error("'{name}' resolves outside the project root")]
    OutsideRoot { name: String },
    #[error("already at the project root")]
    AtRoot,
}

/// Reading or writing a document failed.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Save requested while no file is associated with the session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no file is open, nothing to save")]
pub struct NoActiveFileError;

/// An end token with no pending start of its grammar, or a start that never closed.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum FoldParseError {
    #[error("line {line}: unmatched {kind} end")]
    UnmatchedEnd { line: usize, kind: FoldKind },
    #[error("line {line}: unterminated {kind} start")]
    Unterminated { line: usize, kind: FoldKind },
}

/// A toolchain stage reported failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} failed: {reason}")]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
}

/// Umbrella error returned by [`crate::session::Session`] operations.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    InvalidRoot(#[from] InvalidRootError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    NoActiveFile(#[from] NoActiveFileError),
}
