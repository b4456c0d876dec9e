//! The module snapshot and shared state of one check cycle.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use super::diagnostics::{Diagnostic, Markers, codes};
use super::options::AnalysisOptions;
use super::timestamp::CompilationTimestamp;
use crate::base::Name;
use crate::syntax::Module;

/// The set of modules visible to one check cycle.
///
/// Modules are frozen `Arc` snapshots; edits made while a cycle runs produce
/// new snapshots and never touch the ones held here. Module names declared
/// by more than one file are excluded from resolution.
#[derive(Debug, Default, Clone)]
pub struct ModuleSet {
    modules: IndexMap<Name, Arc<Module>>,
    duplicates: IndexMap<Name, Vec<Arc<Module>>>,
}

impl ModuleSet {
    pub fn new(modules: impl IntoIterator<Item = Arc<Module>>) -> Self {
        let mut set = Self::default();
        for module in modules {
            let name = module.name().clone();
            if let Some(dups) = set.duplicates.get_mut(&name) {
                dups.push(module);
            } else if let Some(first) = set.modules.shift_remove(&name) {
                set.duplicates.insert(name, vec![first, module]);
            } else {
                set.modules.insert(name, module);
            }
        }
        set
    }

    /// The unique module called `name`.
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name).map(|m| m.as_ref())
    }

    pub fn get_arc(&self, name: &str) -> Option<&Arc<Module>> {
        self.modules.get(name)
    }

    /// Uniquely named modules, in insertion order.
    pub fn modules(&self) -> impl Iterator<Item = &Arc<Module>> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn is_duplicate(&self, name: &str) -> bool {
        self.duplicates.contains_key(name)
    }

    /// Report every module name declared more than once, at each declaration.
    pub fn report_duplicates(&self, markers: &Markers) {
        for (name, modules) in &self.duplicates {
            for (idx, module) in modules.iter().enumerate() {
                let other = &modules[if idx == 0 { 1 } else { 0 }];
                markers.report(
                    Diagnostic::error(
                        *module.identifier.location(),
                        format!(
                            "Modules must be unique, but `{}' was declared multiple times",
                            name
                        ),
                    )
                    .with_code(codes::DUPLICATE_MODULE)
                    .with_related(*other.identifier.location(), "other declaration"),
                );
            }
        }
    }
}

/// Everything a check needs besides the node being checked.
pub struct CheckContext<'a> {
    pub modules: &'a ModuleSet,
    pub timestamp: CompilationTimestamp,
    pub markers: &'a Markers,
    pub options: &'a AnalysisOptions,
    pub cancel: &'a CancellationToken,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        modules: &'a ModuleSet,
        timestamp: CompilationTimestamp,
        markers: &'a Markers,
        options: &'a AnalysisOptions,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            modules,
            timestamp,
            markers,
            options,
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
