//! Filesystem helpers shared by the pipeline and the CLI.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::EnrichError;

/// Returns the directory a file at `path` lives in.
///
/// A bare file name lives in the current directory.
pub fn parent_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Ensures the parent directory of `path` exists.
///
/// Creates the directory structure if it doesn't exist using `create_dir_all`.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_parent_directory(path: &Path) -> Result<(), EnrichError> {
    let parent = parent_directory(path);
    std::fs::create_dir_all(&parent).map_err(|e| EnrichError::io(parent, e))
}

/// Serializes `value` as JSON indented with four spaces.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Replaces the contents of `path` with `bytes`.
///
/// The bytes go to a temporary file in the same directory which is then
/// renamed over `path`, so readers see either the old file or the new one.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or renamed.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), EnrichError> {
    let dir = parent_directory(path);
    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(|e| EnrichError::io(&dir, e))?;
    if let Err(e) = file.write_all(bytes).and_then(|()| file.flush()) {
        return Err(EnrichError::io(file.path(), e));
    }
    file.persist(path)
        .map_err(|e| EnrichError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_of_bare_file_name_is_current_directory() {
        assert_eq!(parent_directory(Path::new("out.json")), PathBuf::from("."));
        assert_eq!(
            parent_directory(Path::new("data/processed.json")),
            PathBuf::from("data")
        );
    }

    #[test]
    fn ensure_parent_directory_creates_nested_directories() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("a").join("b").join("out.json");

        ensure_parent_directory(&target).unwrap();
        assert!(temp.path().join("a").join("b").is_dir());
        assert!(!target.exists());
    }

    #[test]
    fn pretty_json_uses_four_space_indent() {
        let bytes = to_pretty_json(&serde_json::json!([{"text": "hi"}])).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "[\n    {\n        \"text\": \"hi\"\n    }\n]");
    }

    #[test]
    fn write_atomically_replaces_existing_content() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("out.json");
        std::fs::write(&target, "old content that is longer than the new one").unwrap();

        write_atomically(&target, b"[]").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "[]");
        let leftovers = std::fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
