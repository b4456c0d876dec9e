//! Collecting and reading TTCN-3 source files.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::LoadError;
use crate::base::constants::is_supported_extension;

/// Get the extension of `path` if it names a TTCN-3 source file.
pub fn validate_extension(path: &Path) -> Result<&str, LoadError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| is_supported_extension(ext))
        .ok_or_else(|| LoadError::UnsupportedExtension(path.to_path_buf()))
}

/// Read a source file.
pub fn load_file(path: &Path) -> Result<String, LoadError> {
    validate_extension(path)?;
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// All TTCN-3 source files below `root`, sorted by path.
pub fn collect_file_paths(root: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::NotADirectory(root.to_path_buf()));
    }
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && validate_extension(entry.path()).is_ok() {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_file_paths_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.ttcn"), "module A { }").unwrap();
        fs::write(dir.path().join("nested/b.ttcn3"), "module B { }").unwrap();
        fs::write(dir.path().join("c.ttcnpp"), "module C { }").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a module").unwrap();

        let paths = collect_file_paths(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.ttcn", "c.ttcnpp", "nested/b.ttcn3"]);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            collect_file_paths(&dir.path().join("missing")),
            Err(LoadError::NotADirectory(_))
        ));
        assert!(matches!(
            load_file(&dir.path().join("x.asn")),
            Err(LoadError::UnsupportedExtension(_))
        ));
        assert!(matches!(
            load_file(&dir.path().join("gone.ttcn")),
            Err(LoadError::Io { .. })
        ));
    }
}
