use std::path::Path;

use super::error::LoadError;
use super::file_loader;
use super::source_parser::ProjectSourceParser;
use crate::base::FileId;

/// Loads source files from disk into a project
#[derive(Debug, Default)]
pub struct WorkspaceLoader;

impl WorkspaceLoader {
    pub fn new() -> Self {
        Self
    }

    /// Loads every TTCN-3 file below `path` into `project`.
    ///
    /// Files that cannot be read are skipped and reported together once the
    /// others are loaded.
    pub fn load_directory(
        &self,
        path: &Path,
        project: &ProjectSourceParser,
    ) -> Result<Vec<FileId>, LoadError> {
        let paths = file_loader::collect_file_paths(path)?;
        let mut loaded = Vec::with_capacity(paths.len());
        let mut errors = Vec::new();

        for path in paths {
            match file_loader::load_file(&path) {
                Ok(text) => loaded.push(project.set_file_content(path, text)),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping file");
                    errors.push(e);
                }
            }
        }

        tracing::debug!(project = project.name(), files = loaded.len(), "directory loaded");
        if errors.is_empty() {
            Ok(loaded)
        } else {
            Err(LoadError::Files(errors))
        }
    }

    /// Loads a single file into `project`.
    pub fn load_file(
        &self,
        path: &Path,
        project: &ProjectSourceParser,
    ) -> Result<FileId, LoadError> {
        let text = file_loader::load_file(path)?;
        Ok(project.set_file_content(path, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::AnalysisOptions;
    use std::fs;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_load_directory_and_analyze() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.ttcn"),
            "module A { import from B all; const integer x := y; }",
        )
        .unwrap();
        fs::write(dir.path().join("b.ttcn3"), "module B { const integer y := 2; }").unwrap();

        let project = ProjectSourceParser::new("disk", AnalysisOptions::sequential());
        let files = WorkspaceLoader::new().load_directory(dir.path(), &project).unwrap();
        assert_eq!(files.len(), 2);
        let report = project.analyze(&CancellationToken::new());
        assert!(!report.has_errors(), "{:?}", report.markers.all());

        let single = WorkspaceLoader::new()
            .load_file(&dir.path().join("a.ttcn"), &project)
            .unwrap();
        assert_eq!(single, files[0]);
    }
}
