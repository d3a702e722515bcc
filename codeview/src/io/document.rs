//! Whole-file text load/save.
//!
//! Documents are UTF-8. Writes go straight to the target path with no temp
//! file, so a failed write may leave a partial file behind.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::PersistenceError;

/// Read the whole file at `path` as UTF-8 text.
pub fn load_text(path: &Path) -> Result<String, PersistenceError> {
    let text = fs::read_to_string(path).map_err(|source| PersistenceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = text.len(), "loaded document");
    Ok(text)
}

/// Replace the contents of `path` with `text`.
pub fn save_text(path: &Path, text: &str) -> Result<(), PersistenceError> {
    fs::write(path, text).map_err(|source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = text.len(), "saved document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_then_save_is_byte_identical() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("main.cpp");
        let original = "// 作业\r\nint main() {\n\treturn 0;\n}";
        fs::write(&path, original).expect("seed");

        let text = load_text(&path).expect("load");
        save_text(&path, &text).expect("save");

        assert_eq!(fs::read(&path).expect("read back"), original.as_bytes());
    }

    #[test]
    fn load_missing_file_is_a_read_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_text(&temp.path().join("missing.cpp")).unwrap_err();
        assert!(matches!(err, PersistenceError::Read { .. }));
    }

    #[test]
    fn save_into_missing_directory_is_a_write_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = save_text(&temp.path().join("nope/main.cpp"), "x").unwrap_err();
        assert!(matches!(err, PersistenceError::Write { .. }));
    }
}
