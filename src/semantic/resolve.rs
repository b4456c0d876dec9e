//! Module-level symbol resolution.
//!
//! A reference is resolved in the module it appears in. Local definitions
//! win; an unqualified name not found locally is searched in every import,
//! honouring the defining module's visibility rules and the
//! `import of imports` flag. Two distinct candidates make the reference
//! ambiguous.

use super::chain::{CIRCULAR_IMPORT, ChainLink, ReferenceChain};
use super::context::{CheckContext, ModuleSet};
use super::diagnostics::{Diagnostic, Markers, codes};
use crate::base::constants::ANYTYPE_NAME;
use crate::base::{Location, Name};
use crate::syntax::{Definition, ImportModule, Module, NodeId, Reference, Visibility};

/// A definition together with the module declaring it.
#[derive(Clone, Copy, Debug)]
pub struct Assignment<'a> {
    pub module: &'a Module,
    pub definition: &'a Definition,
}

impl<'a> Assignment<'a> {
    pub fn new(module: &'a Module, definition: &'a Definition) -> Self {
        Self { module, definition }
    }

    /// `@Module.name`
    pub fn full_name(&self) -> String {
        format!(
            "{}.{}",
            self.module.full_name(),
            self.definition.identifier.display_name()
        )
    }

    pub fn id(&self) -> NodeId {
        self.definition.id
    }

    pub fn is_same(&self, other: &Assignment<'_>) -> bool {
        self.definition.id == other.definition.id
    }

    pub fn location(&self) -> Location {
        *self.definition.identifier.location()
    }
}

impl ChainLink for Assignment<'_> {
    fn chain_id(&self) -> NodeId {
        self.definition.id
    }

    fn chained_description(&self) -> String {
        self.full_name()
    }

    fn chain_location(&self) -> Location {
        self.location()
    }
}

/// Outcome of searching the imports of a module.
#[derive(Clone, Copy, Debug)]
pub enum ResolveResult<'a> {
    Found(Assignment<'a>),
    /// The first two distinct candidates.
    Ambiguous(Assignment<'a>, Assignment<'a>),
    NotFound,
}

impl<'a> ResolveResult<'a> {
    pub fn assignment(&self) -> Option<Assignment<'a>> {
        match self {
            ResolveResult::Found(assignment) => Some(*assignment),
            _ => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolveResult::Ambiguous(..))
    }
}

/// Why a module-level lookup failed.
enum LookupError<'a> {
    Ambiguous(Assignment<'a>, Assignment<'a>),
    /// Nothing visible; carries the name of the module searched.
    Missing(&'a str),
    /// The qualifier names no import of the module.
    NotImported,
    /// The qualifier names an import whose module does not exist.
    UnknownTarget,
}

impl Module {
    /// Whether `definition`, declared in this module, may be referenced from
    /// the module called `consumer`.
    ///
    /// Only the first definition with a name is visible at all; duplicates
    /// are reported separately.
    pub fn is_visible(&self, consumer: &Name, definition: &Definition) -> bool {
        if definition.id == self.anytype.id {
            return true;
        }
        match self.definition(definition.name()) {
            Some(first) if first.id == definition.id => {}
            _ => return false,
        }
        match definition.visibility {
            Visibility::Public => true,
            Visibility::Friend => self.is_friend(consumer),
            Visibility::Private => false,
        }
    }

    /// Whether an import declared in this module with `visibility` is
    /// re-exported to `consumer` through `import of imports`.
    pub fn is_import_visible(&self, consumer: &Name, visibility: Visibility) -> bool {
        match visibility {
            Visibility::Public => true,
            Visibility::Friend => self.is_friend(consumer),
            Visibility::Private => false,
        }
    }

    /// The local assignment called `name`, including the module's `anytype`.
    pub fn local_assignment(&self, name: &str) -> Option<Assignment<'_>> {
        if name == ANYTYPE_NAME {
            return Some(Assignment::new(self, &self.anytype));
        }
        self.definition(name).map(|def| Assignment::new(self, def))
    }

    /// Search every import for an assignment visible to this module.
    ///
    /// Imports naming unknown modules are skipped. Each import gets a fresh
    /// chain so import-of-imports cycles terminate.
    pub fn lookup_imported<'a>(
        &'a self,
        modules: &'a ModuleSet,
        markers: &Markers,
        name: &str,
    ) -> ResolveResult<'a> {
        let mut found: Option<Assignment<'a>> = None;
        for import in self.imports() {
            if modules.get(import.identifier.name()).is_none() {
                continue;
            }
            let mut chain = ReferenceChain::new(markers, CIRCULAR_IMPORT, false);
            let Some(candidate) = import.import_assignment(modules, self.name(), name, &mut chain)
            else {
                continue;
            };
            if !candidate.module.is_visible(self.name(), candidate.definition) {
                continue;
            }
            match found {
                None => found = Some(candidate),
                Some(first) if !first.is_same(&candidate) => {
                    return ResolveResult::Ambiguous(first, candidate);
                }
                Some(_) => {}
            }
        }
        found.map_or(ResolveResult::NotFound, ResolveResult::Found)
    }

    /// Look a module-level reference up without reporting anything.
    pub fn find_assignment<'a>(
        &'a self,
        modules: &'a ModuleSet,
        markers: &Markers,
        reference: &Reference,
    ) -> Option<Assignment<'a>> {
        self.lookup(modules, markers, reference).ok()
    }

    fn lookup<'a>(
        &'a self,
        modules: &'a ModuleSet,
        markers: &Markers,
        reference: &Reference,
    ) -> Result<Assignment<'a>, LookupError<'a>> {
        let name = reference.identifier.name();
        let Some(qualifier) = &reference.module else {
            if let Some(local) = self.local_assignment(name) {
                return Ok(local);
            }
            return match self.lookup_imported(modules, markers, name) {
                ResolveResult::Found(assignment) => Ok(assignment),
                ResolveResult::Ambiguous(first, second) => {
                    Err(LookupError::Ambiguous(first, second))
                }
                ResolveResult::NotFound => {
                    Err(LookupError::Missing(self.identifier.display_name()))
                }
            };
        };

        if qualifier.name() == self.name() {
            return self
                .local_assignment(name)
                .ok_or(LookupError::Missing(self.identifier.display_name()));
        }

        let import = self
            .imports()
            .find(|import| import.identifier.name() == qualifier.name())
            .ok_or(LookupError::NotImported)?;
        // an unknown import target is reported on the import itself
        if modules.get(import.identifier.name()).is_none() {
            return Err(LookupError::UnknownTarget);
        }
        let mut chain = ReferenceChain::new(markers, CIRCULAR_IMPORT, false);
        import
            .import_assignment(modules, self.name(), name, &mut chain)
            .filter(|a| a.module.is_visible(self.name(), a.definition))
            .ok_or(LookupError::Missing(import.identifier.display_name()))
    }

    /// Resolve a module-level reference appearing in this module.
    ///
    /// Failures are reported and the reference is recorded in the missing
    /// reference list.
    pub fn get_ass_by_sref<'a>(
        &'a self,
        cx: &CheckContext<'a>,
        reference: &Reference,
    ) -> Option<Assignment<'a>> {
        let error = match self.lookup(cx.modules, cx.markers, reference) {
            Ok(assignment) => return Some(assignment),
            Err(error) => error,
        };
        match error {
            LookupError::Ambiguous(first, second) => {
                cx.markers.report_singular(
                    Diagnostic::error(
                        reference.location,
                        format!(
                            "It is not possible to resolve this reference unambigously, as  it \
                             can be resolved to `{}' and to `{}'",
                            first.full_name(),
                            second.full_name()
                        ),
                    )
                    .with_code(codes::AMBIGUOUS_REFERENCE),
                );
            }
            LookupError::Missing(module_name) => {
                self.report_missing(cx.markers, reference, module_name);
            }
            LookupError::NotImported => {
                let qualifier = reference.module.as_ref().unwrap_or(&reference.identifier);
                cx.markers.report_singular(
                    Diagnostic::error(
                        *qualifier.location(),
                        format!(
                            "There is no module with name `{}' imported into module `{}'",
                            qualifier.display_name(),
                            self.identifier.display_name()
                        ),
                    )
                    .with_code(codes::UNDEFINED_REFERENCE),
                );
                self.add_missing(reference);
            }
            LookupError::UnknownTarget => {}
        }
        None
    }

    fn report_missing(&self, markers: &Markers, reference: &Reference, module_name: &str) {
        markers.report_singular(
            Diagnostic::error(
                reference.location,
                format!(
                    "There is no visible definition with name `{}' in module `{}'",
                    reference.identifier.display_name(),
                    module_name
                ),
            )
            .with_code(codes::UNDEFINED_REFERENCE),
        );
        self.add_missing(reference);
    }

    fn add_missing(&self, reference: &Reference) {
        let mut missing = self.missing.lock();
        if !missing.iter().any(|m| m.id == reference.id) {
            missing.push(reference.clone());
        }
    }
}

impl ImportModule {
    /// Find `name` in the target of this import on behalf of `consumer`.
    ///
    /// With `import of imports` the target's own imports are searched too,
    /// as far as the target re-exports them to `consumer`. The first match
    /// wins. Visibility of the found definition itself is left to the
    /// caller.
    pub fn import_assignment<'a>(
        &self,
        modules: &'a ModuleSet,
        consumer: &Name,
        name: &str,
        chain: &mut ReferenceChain<'_>,
    ) -> Option<Assignment<'a>> {
        let target = modules.get(self.identifier.name())?;
        if !chain.add(target) {
            return None;
        }
        if let Some(def) = target.definition(name) {
            return Some(Assignment::new(target, def));
        }
        if !self.import_of_imports {
            return None;
        }
        for inner in target.imports() {
            if !target.is_import_visible(consumer, inner.visibility) {
                continue;
            }
            chain.mark_state();
            let found = inner.import_assignment(modules, consumer, name, chain);
            chain.previous_state();
            if found.is_some() {
                return found;
            }
        }
        None
    }
}
