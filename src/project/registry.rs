//! Open projects by name.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::source_parser::ProjectSourceParser;
use crate::semantic::AnalysisOptions;

/// Explicit registry of open projects.
///
/// A project lives from [`open`](Self::open) until [`close`](Self::close);
/// handles already given out keep working after the close.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: RwLock<IndexMap<String, Arc<ProjectSourceParser>>>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a project, or return it if it is open already.
    pub fn open(&self, name: &str, options: AnalysisOptions) -> Arc<ProjectSourceParser> {
        let mut projects = self.projects.write();
        if let Some(project) = projects.get(name) {
            return Arc::clone(project);
        }
        tracing::debug!(project = name, "project opened");
        let project = Arc::new(ProjectSourceParser::new(name, options));
        projects.insert(name.to_string(), Arc::clone(&project));
        project
    }

    pub fn get(&self, name: &str) -> Option<Arc<ProjectSourceParser>> {
        self.projects.read().get(name).cloned()
    }

    pub fn close(&self, name: &str) -> Option<Arc<ProjectSourceParser>> {
        let closed = self.projects.write().shift_remove(name);
        if closed.is_some() {
            tracing::debug!(project = name, "project closed");
        }
        closed
    }

    /// Names of the open projects, in opening order.
    pub fn names(&self) -> Vec<String> {
        self.projects.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_get_close() {
        let registry = ProjectRegistry::new();
        let a = registry.open("a", AnalysisOptions::default());
        let again = registry.open("a", AnalysisOptions::sequential());
        assert!(Arc::ptr_eq(&a, &again));
        assert!(again.options().parallel);
        registry.open("b", AnalysisOptions::default());
        assert_eq!(registry.names(), vec!["a", "b"]);

        let closed = registry.close("a").unwrap();
        assert!(registry.get("a").is_none());
        assert!(registry.close("a").is_none());
        // handles outlive the registry entry
        closed.set_file_content("x.ttcn", "module X { }");
        assert_eq!(closed.file_count(), 1);
    }
}
