//! File-system query capability consumed by the folder navigator.
//!
//! The [`FileSystem`] trait keeps navigation logic independent of the real
//! disk; tests can substitute an in-memory tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::types::FileEntry;

pub trait FileSystem {
    fn is_dir(&self, path: &Path) -> bool;
    /// Absolute path with symlinks and `.`/`..` resolved.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
    /// Entries directly under `dir`, in no particular order.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FileEntry>>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follow symlinks so a linked directory lists as a directory.
            let is_directory = entry.path().is_dir();
            entries.push(FileEntry { name, is_directory });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_dir_marks_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("src")).expect("mkdir");
        fs::write(temp.path().join("main.cpp"), "int main() {}\n").expect("write");

        let mut entries = StdFileSystem.read_dir(temp.path()).expect("read_dir");
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            entries,
            vec![FileEntry::file("main.cpp"), FileEntry::directory("src")]
        );
    }
}
