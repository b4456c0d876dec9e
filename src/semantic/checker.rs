//! Module and definition checks.
//!
//! Every check is memoized on the node's [`CheckState`]: the body runs at
//! most once per compilation timestamp, no matter how many paths reach the
//! node. A [`Checker`] carries the context of one module check and counts
//! the errors it reports so definitions can be flagged erroneous.
//!
//! [`CheckState`]: super::CheckState

use std::cell::Cell;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::chain::{CIRCULAR_IMPORT, ReferenceChain};
use super::context::CheckContext;
use super::diagnostics::{Diagnostic, Severity, codes};
use super::resolve::Assignment;
use super::scope::{LocalEntry, LocalKind, ScopeStack};
use super::statements::{StatementContext, has_return};
use super::types::ResolvedType;
use super::values::ValueContext;
use crate::base::{Identifier, Location, Name};
use crate::syntax::{
    ControlPart, Definition, DefinitionKind, FormalParameter, Function, Module, Reference,
    ReturnStatus, TemplateBody, TypeKind,
};

pub struct Checker<'c, 'a> {
    pub cx: &'c CheckContext<'a>,
    pub module: &'a Module,
    errors: Cell<usize>,
}

impl<'c, 'a> Checker<'c, 'a> {
    pub fn new(cx: &'c CheckContext<'a>, module: &'a Module) -> Self {
        Self {
            cx,
            module,
            errors: Cell::new(0),
        }
    }

    pub fn error(&self, location: Location, code: &str, message: impl Into<Arc<str>>) {
        self.errors.set(self.errors.get() + 1);
        self.cx.markers.error(location, code, message);
    }

    pub fn warning(&self, location: Location, code: &str, message: impl Into<Arc<str>>) {
        self.cx.markers.warning(location, code, message);
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            self.errors.set(self.errors.get() + 1);
        }
        self.cx.markers.report(diagnostic);
    }

    /// Report an error unless the same one was reported at the same place.
    pub fn error_singular(&self, location: Location, code: &str, message: impl Into<Arc<str>>) {
        self.errors.set(self.errors.get() + 1);
        self.cx
            .markers
            .report_singular(Diagnostic::error(location, message).with_code(code));
    }

    /// Count an error reported elsewhere, such as by a reference chain.
    pub fn count_error(&self) {
        self.errors.set(self.errors.get() + 1);
    }

    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    /// Resolve a module-level reference appearing in `module`.
    pub fn resolve_in(&self, module: &'a Module, reference: &Reference) -> Option<Assignment<'a>> {
        let found = module.get_ass_by_sref(self.cx, reference);
        if found.is_none() {
            self.errors.set(self.errors.get() + 1);
        }
        found
    }

    pub fn resolve(&self, reference: &Reference) -> Option<Assignment<'a>> {
        self.resolve_in(self.module, reference)
    }

    /// A fresh chain for circular definition detection.
    pub fn chain(&self) -> ReferenceChain<'a> {
        ReferenceChain::circular_reference(self.cx.markers)
    }

    pub(crate) fn report_duplicate(&self, name: &Identifier, first: &Identifier) {
        self.report(
            Diagnostic::error(
                *name.location(),
                format!(
                    "Duplicate definition with name `{}' was declared here again",
                    name.display_name()
                ),
            )
            .with_code(codes::DUPLICATE_DEFINITION)
            .with_related(*first.location(), "previous definition"),
        );
        self.cx.markers.report_singular(
            Diagnostic::error(
                *first.location(),
                format!(
                    "Duplicate definition with name `{}' was first declared here",
                    first.display_name()
                ),
            )
            .with_code(codes::DUPLICATE_DEFINITION),
        );
    }
}

// ============================================================================
// MODULES
// ============================================================================

/// Check the import graph of `module` and everything reachable from it.
///
/// Unknown and self imports are errors; cycles are reported with the
/// configured severity at every module of the cycle. The module is stamped
/// only after all of its imports were visited, so a cycle is always seen
/// from the module that started it.
pub fn check_imports(cx: &CheckContext<'_>, module: &Module) {
    let mut chain = ReferenceChain::new(
        cx.markers,
        CIRCULAR_IMPORT,
        cx.options.circular_import_severity == Severity::Error,
    );
    chain.add(module);
    check_imports_in_chain(cx, module, &mut chain);
}

fn check_imports_in_chain(cx: &CheckContext<'_>, module: &Module, chain: &mut ReferenceChain<'_>) {
    if module.import_state.is_checked(cx.timestamp) {
        return;
    }
    for import in module.imports() {
        let first_visit = import.state.begin(cx.timestamp);
        let name = import.identifier.name();
        if name == module.name() {
            if first_visit {
                import.state.set_erroneous(true);
                cx.markers.error(
                    *import.identifier.location(),
                    codes::INVALID_IMPORT,
                    format!(
                        "A module cannot import itself: `{}'",
                        import.identifier.display_name()
                    ),
                );
            }
            continue;
        }
        let Some(target) = cx.modules.get(name) else {
            if first_visit && !cx.modules.is_duplicate(name) {
                import.state.set_erroneous(true);
                cx.markers.error(
                    *import.identifier.location(),
                    codes::INVALID_IMPORT,
                    format!("There is no module with name `{}'", import.identifier.display_name()),
                );
            }
            continue;
        };
        chain.mark_state();
        if chain.add(target) {
            check_imports_in_chain(cx, target, chain);
        }
        chain.previous_state();
    }
    module.import_state.mark_checked(cx.timestamp);
}

/// Check one module: its imports, friends, definitions and control part.
pub fn check_module<'a>(cx: &CheckContext<'a>, module: &'a Module) {
    if !module.state.begin(cx.timestamp) {
        tracing::trace!(module = %module.name(), "module already checked");
        return;
    }
    let _span = tracing::debug_span!("check_module", module = %module.name()).entered();
    module.missing.lock().clear();
    *module.version.lock() = None;

    check_imports(cx, module);

    let checker = Checker::new(cx, module);
    checker.check_friends();
    checker.check_unique_definitions();
    checker.check_with_attributes(module.with_attributes.as_ref(), true);

    for definition in module.definitions() {
        if cx.is_cancelled() {
            tracing::debug!(module = %module.name(), "check cancelled");
            return;
        }
        check_definition(cx, Assignment::new(module, definition));
    }

    let mut controls = module.control_parts();
    if let Some(control) = controls.next() {
        checker.check_control_part(control);
    }
    for extra in controls {
        checker.error(
            extra.location,
            codes::INVALID_CONTEXT,
            "A module can have only one control part",
        );
    }

    let erroneous = checker.error_count() > 0
        || module.imports().any(|import| import.state.is_erroneous())
        || module.definitions().any(|def| def.state.is_erroneous());
    module.state.set_erroneous(erroneous);
    tracing::debug!(module = %module.name(), erroneous, "module checked");
}

impl<'c, 'a> Checker<'c, 'a> {
    fn check_friends(&self) {
        let mut seen: FxHashMap<&Name, &Identifier> = FxHashMap::default();
        for friend in self.module.friend_names() {
            if let Some(first) = seen.get(friend.name()) {
                self.cx.markers.report(
                    Diagnostic::warning(
                        *friend.location(),
                        format!("Duplicate friend module with name `{}'", friend.display_name()),
                    )
                    .with_code(codes::UNKNOWN_FRIEND)
                    .with_related(*first.location(), "first declared here"),
                );
                continue;
            }
            seen.insert(friend.name(), friend);
            if self.cx.options.report_unknown_friends
                && self.cx.modules.get(friend.name()).is_none()
                && !self.cx.modules.is_duplicate(friend.name())
            {
                self.warning(
                    *friend.location(),
                    codes::UNKNOWN_FRIEND,
                    format!(
                        "There is no module with name `{}' to be a friend of this module",
                        friend.display_name()
                    ),
                );
            }
        }
    }

    fn check_unique_definitions(&self) {
        for def in self.module.definitions() {
            match self.module.definition(def.name()) {
                Some(first) if first.id != def.id => {
                    self.report_duplicate(&def.identifier, &first.identifier);
                    def.state.set_erroneous(true);
                }
                _ => {}
            }
        }
    }

    fn check_control_part(&self, control: &'a ControlPart) {
        let mut scope = ScopeStack::new();
        let scx = StatementContext::control();
        self.check_block(&mut scope, &control.block, &scx);
        self.check_with_attributes(control.with_attributes.as_ref(), false);
    }
}

// ============================================================================
// DEFINITIONS
// ============================================================================

/// Check one definition, at most once per timestamp.
pub fn check_definition<'a>(cx: &CheckContext<'a>, assignment: Assignment<'a>) {
    let def = assignment.definition;
    if !def.state.begin(cx.timestamp) {
        return;
    }
    let checker = Checker::new(cx, assignment.module);
    tracing::trace!(definition = %assignment.full_name(), "checking definition");
    match &def.kind {
        DefinitionKind::Type(_) => checker.check_type_definition(assignment),
        DefinitionKind::Const { ty, value } => {
            let resolved = checker.resolve_type(assignment.module, ty, &mut checker.chain());
            checker.check_value(&ScopeStack::new(), value, resolved, &ValueContext::constant());
        }
        DefinitionKind::Template { ty, body } => {
            let resolved = checker.resolve_type(assignment.module, ty, &mut checker.chain());
            if let TemplateBody::Specific(value) = body {
                checker.check_value(&ScopeStack::new(), value, resolved, &ValueContext::template());
            }
        }
        DefinitionKind::Function(function) => checker.check_function(assignment, function),
        DefinitionKind::Signature {
            params,
            return_type,
        } => {
            let mut scope = ScopeStack::new();
            checker.declare_parameters(&mut scope, params);
            if let Some(ty) = return_type {
                checker.resolve_type(assignment.module, ty, &mut checker.chain());
            }
        }
        DefinitionKind::AnyType => {}
    }
    checker.check_with_attributes(def.with_attributes.as_ref(), false);
    if checker.error_count() > 0 {
        def.state.set_erroneous(true);
    }
}

impl<'c, 'a> Checker<'c, 'a> {
    fn check_function(&self, assignment: Assignment<'a>, function: &'a Function) {
        let mut scope = ScopeStack::new();
        let runs_on = function
            .runs_on
            .as_ref()
            .and_then(|reference| self.declare_runs_on(&mut scope, reference));
        scope.push();
        self.declare_parameters(&mut scope, &function.params);
        let return_type = function
            .return_type
            .as_ref()
            .map(|ty| self.resolve_type(self.module, ty, &mut self.chain()));

        let scx = StatementContext::function(runs_on, return_type);
        self.check_block(&mut scope, &function.body, &scx);

        if return_type.is_some()
            && self.cx.options.report_missing_return
            && has_return(&function.body) != ReturnStatus::Yes
        {
            self.warning(
                assignment.location(),
                codes::MISSING_RETURN,
                "The function has a return type, \
                 but control might leave it without reaching a return statement",
            );
        }
    }

    /// Bring the elements of the `runs on` component into scope.
    fn declare_runs_on(
        &self,
        scope: &mut ScopeStack<'a>,
        reference: &Reference,
    ) -> Option<Assignment<'a>> {
        let assignment = self.resolve(reference)?;
        let resolved =
            self.resolve_assignment_type(assignment, reference.location, &mut self.chain());
        let component = match resolved {
            ResolvedType::Defined(component, ty) => match &ty.kind {
                TypeKind::Component(elements) => Some((component, elements)),
                _ => None,
            },
            ResolvedType::Erroneous => return None,
            ResolvedType::Builtin(..) => None,
        };
        let Some((component, elements)) = component else {
            self.error(
                reference.location,
                codes::INVALID_TYPE,
                format!(
                    "Reference to a component type was expected in `runs on' clause \
                     instead of `{}'",
                    assignment.full_name()
                ),
            );
            return None;
        };
        for element in elements {
            let kind = match element.kind {
                crate::syntax::ComponentElementKind::Var { .. } => LocalKind::ComponentVar,
                crate::syntax::ComponentElementKind::Port { .. } => LocalKind::ComponentPort,
                crate::syntax::ComponentElementKind::Const { .. } => LocalKind::ComponentConst,
            };
            // duplicates inside the component are reported by the component itself
            let _ = scope.declare(LocalEntry {
                identifier: &element.identifier,
                ty: element.kind.ty(),
                kind,
                module: component.module,
            });
        }
        Some(component)
    }

    pub(crate) fn declare_parameters(
        &self,
        scope: &mut ScopeStack<'a>,
        params: &'a [FormalParameter],
    ) {
        for param in params {
            self.resolve_type(self.module, &param.ty, &mut self.chain());
            let entry = LocalEntry {
                identifier: &param.identifier,
                ty: &param.ty,
                kind: LocalKind::Parameter(param.direction),
                module: self.module,
            };
            if let Err(previous) = scope.declare(entry) {
                self.report_duplicate(&param.identifier, previous.identifier);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;
    use crate::semantic::{AnalysisOptions, CompilationTimestamp, Markers, ModuleSet};
    use crate::syntax::parse_file;
    use tokio_util::sync::CancellationToken;

    fn check_all(sources: &[&str], options: AnalysisOptions) -> (ModuleSet, Markers) {
        let set = ModuleSet::new(sources.iter().enumerate().map(|(idx, src)| {
            Arc::new(parse_file(FileId::new(idx as u32), src).module.expect("module"))
        }));
        let markers = Markers::new();
        let cancel = CancellationToken::new();
        {
            let cx = CheckContext::new(
                &set,
                CompilationTimestamp::new_timestamp(),
                &markers,
                &options,
                &cancel,
            );
            for module in set.modules() {
                check_module(&cx, module);
            }
        }
        (set, markers)
    }

    fn messages(markers: &Markers) -> Vec<String> {
        markers.all().iter().map(|d| d.message.to_string()).collect()
    }

    #[test]
    fn test_check_module_runs_once_per_timestamp() {
        let set = ModuleSet::new([Arc::new(
            parse_file(FileId::new(0), "module M { const integer c := 1; }")
                .module
                .expect("module"),
        )]);
        let markers = Markers::new();
        let options = AnalysisOptions::sequential();
        let cancel = CancellationToken::new();
        let timestamp = CompilationTimestamp::new_timestamp();
        let cx = CheckContext::new(&set, timestamp, &markers, &options, &cancel);
        let module = set.get("M").expect("module");
        check_module(&cx, module);
        check_module(&cx, module);
        assert_eq!(module.state.check_count(), 1);
        assert_eq!(module.definitions().next().map(|d| d.state.check_count()), Some(1));
    }

    #[test]
    fn test_circular_import_reported_at_each_module() {
        let (_, markers) = check_all(
            &[
                "module A { import from B all; }",
                "module B { import from A all; }",
            ],
            AnalysisOptions::sequential(),
        );
        let all = markers.all();
        assert_eq!(all.len(), 2, "{:?}", messages(&markers));
        assert!(all.iter().all(|d| d.severity == Severity::Warning));
        assert!(all[0].message.contains("A -> B -> A"));
        assert!(all[1].message.contains("B -> A -> B"));
    }

    #[test]
    fn test_circular_import_severity_is_configurable() {
        let options = AnalysisOptions {
            circular_import_severity: Severity::Error,
            ..AnalysisOptions::sequential()
        };
        let (_, markers) = check_all(
            &["module A { import from B all; }", "module B { import from A all; }"],
            options,
        );
        assert_eq!(markers.error_count(), 2);
    }

    #[test]
    fn test_unknown_and_self_import() {
        let (set, markers) = check_all(
            &["module A { import from Nope all; import from A all; }"],
            AnalysisOptions::sequential(),
        );
        let msgs = messages(&markers);
        assert!(msgs.iter().any(|m| m.contains("There is no module with name `Nope'")));
        assert!(msgs.iter().any(|m| m.contains("cannot import itself")));
        assert!(set.get("A").expect("A").state.is_erroneous());
    }

    #[test]
    fn test_duplicate_definitions() {
        let (_, markers) = check_all(
            &["module A { const integer x := 1; const integer x := 2; }"],
            AnalysisOptions::sequential(),
        );
        let msgs = messages(&markers);
        assert!(msgs.iter().any(|m| m.contains("was declared here again")));
        assert!(msgs.iter().any(|m| m.contains("was first declared here")));
    }

    #[test]
    fn test_unknown_friend_warning_can_be_disabled() {
        let src = ["module A { friend module Ghost; }"];
        let (_, markers) = check_all(&src, AnalysisOptions::sequential());
        assert_eq!(markers.warning_count(), 1);
        let options = AnalysisOptions {
            report_unknown_friends: false,
            ..AnalysisOptions::sequential()
        };
        let (_, markers) = check_all(&src, options);
        assert_eq!(markers.warning_count(), 0);
    }

    #[test]
    fn test_missing_return_warning() {
        let (_, markers) = check_all(
            &["module A {
                function f(integer a) return integer { if_missing(); }
                function if_missing() { }
            }"],
            AnalysisOptions::sequential(),
        );
        assert!(
            messages(&markers)
                .iter()
                .any(|m| m.contains("without reaching a return statement"))
        );
    }

    #[test]
    fn test_runs_on_brings_component_into_scope() {
        let (_, markers) = check_all(
            &["module A {
                type component C { var integer v := 0; }
                function f() runs on C { v := 1; }
                function g() { v := 1; }
            }"],
            AnalysisOptions::sequential(),
        );
        let msgs = messages(&markers);
        assert_eq!(msgs.len(), 1, "{:?}", msgs);
        assert!(msgs[0].contains("There is no visible definition with name `v'"));
    }

    #[test]
    fn test_multiple_control_parts() {
        let (_, markers) = check_all(
            &["module A { control { } control { } }"],
            AnalysisOptions::sequential(),
        );
        assert!(messages(&markers).iter().any(|m| m.contains("only one control part")));
    }
}
