//! Statement checks and return analysis.

use super::checker::Checker;
use super::diagnostics::codes;
use super::resolve::Assignment;
use super::scope::{LocalEntry, LocalKind, ScopeStack};
use super::types::ResolvedType;
use super::values::ValueContext;
use crate::syntax::{
    AltGuards, BuiltinType, GuardKind, ReceiveEvent, ReturnStatus, Statement, StatementBlock,
    StatementKind, TypeKind, ValueKind, Verdict,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AltKind {
    Alt,
    Interleave,
}

/// Where a statement appears.
#[derive(Clone, Copy, Debug)]
pub struct StatementContext<'a> {
    pub value: ValueContext<'a>,
    /// Return type of the enclosing function, `None` for functions without
    /// one and for the control part.
    pub return_type: Option<ResolvedType<'a>>,
    pub in_function: bool,
    /// The innermost enclosing alt-like statement.
    pub alt: Option<AltKind>,
    /// Whether any enclosing statement is an interleave.
    pub in_interleave: bool,
}

impl<'a> StatementContext<'a> {
    pub fn control() -> Self {
        Self {
            value: ValueContext {
                in_control: true,
                ..ValueContext::default()
            },
            return_type: None,
            in_function: false,
            alt: None,
            in_interleave: false,
        }
    }

    pub fn function(
        runs_on: Option<Assignment<'a>>,
        return_type: Option<ResolvedType<'a>>,
    ) -> Self {
        Self {
            value: ValueContext {
                runs_on,
                ..ValueContext::default()
            },
            return_type,
            in_function: true,
            alt: None,
            in_interleave: false,
        }
    }

    fn inside(&self, kind: AltKind) -> Self {
        Self {
            alt: Some(kind),
            in_interleave: self.in_interleave || kind == AltKind::Interleave,
            ..*self
        }
    }
}

// ============================================================================
// RETURN ANALYSIS
// ============================================================================

/// Whether every path through `block` ends in a `return`.
pub fn has_return(block: &StatementBlock) -> ReturnStatus {
    let mut result = ReturnStatus::No;
    for statement in &block.statements {
        match statement_return(statement) {
            ReturnStatus::Yes => return ReturnStatus::Yes,
            ReturnStatus::Maybe => result = ReturnStatus::Maybe,
            ReturnStatus::No => {}
        }
    }
    result
}

pub fn statement_return(statement: &Statement) -> ReturnStatus {
    match &statement.kind {
        StatementKind::Return(_) => ReturnStatus::Yes,
        StatementKind::Block(block) => has_return(block),
        StatementKind::Alt(guards) => alt_return(guards),
        StatementKind::Interleave(guards) => {
            if guards.guards.iter().any(|g| has_return(&g.block) != ReturnStatus::No) {
                ReturnStatus::Maybe
            } else {
                ReturnStatus::No
            }
        }
        _ => ReturnStatus::No,
    }
}

/// An alt returns for sure only if all branches do and an `[else]` branch
/// guarantees one of them is taken.
fn alt_return(guards: &AltGuards) -> ReturnStatus {
    if guards.guards.is_empty() {
        return ReturnStatus::No;
    }
    let statuses: Vec<ReturnStatus> = guards.guards.iter().map(|g| has_return(&g.block)).collect();
    let has_else = guards.guards.iter().any(|g| matches!(g.kind, GuardKind::Else));
    if statuses.iter().all(|s| *s == ReturnStatus::Yes) {
        if has_else {
            ReturnStatus::Yes
        } else {
            ReturnStatus::Maybe
        }
    } else if statuses.iter().any(|s| *s != ReturnStatus::No) {
        ReturnStatus::Maybe
    } else {
        ReturnStatus::No
    }
}

// ============================================================================
// STATEMENT CHECKS
// ============================================================================

impl<'c, 'a> Checker<'c, 'a> {
    pub fn check_block(
        &self,
        scope: &mut ScopeStack<'a>,
        block: &'a StatementBlock,
        scx: &StatementContext<'a>,
    ) {
        if !block.state.begin(self.cx.timestamp) {
            return;
        }
        scope.push();
        let mut returned = false;
        for statement in &block.statements {
            if returned {
                self.warning(
                    statement.location,
                    codes::UNREACHABLE_CODE,
                    "Control never reaches this statement because of a previous return statement",
                );
                returned = false;
            }
            self.check_statement(scope, statement, scx);
            if matches!(statement.kind, StatementKind::Return(_)) {
                returned = true;
            }
        }
        scope.pop();
    }

    fn check_statement(
        &self,
        scope: &mut ScopeStack<'a>,
        statement: &'a Statement,
        scx: &StatementContext<'a>,
    ) {
        let vcx = scx.value;
        match &statement.kind {
            StatementKind::Var {
                identifier,
                ty,
                init,
            } => {
                let resolved = self.resolve_type(self.module, ty, &mut self.chain());
                if matches!(resolved.kind(), Some(TypeKind::Port(_))) {
                    self.error(
                        ty.location,
                        codes::INVALID_TYPE,
                        format!(
                            "Port type `{}' cannot be the type of a variable",
                            resolved.type_name()
                        ),
                    );
                }
                if let Some(init) = init {
                    self.check_value(scope, init, resolved, &vcx);
                }
                let entry = LocalEntry {
                    identifier,
                    ty,
                    kind: LocalKind::Variable,
                    module: self.module,
                };
                if let Err(previous) = scope.declare(entry) {
                    self.report_duplicate(identifier, previous.identifier);
                }
            }
            StatementKind::Assignment { target, value } => {
                let expected = self.assignment_target(scope, target);
                self.check_value(scope, value, expected, &vcx);
            }
            StatementKind::Alt(guards) => self.check_alt_guards(scope, guards, AltKind::Alt, scx),
            StatementKind::Interleave(guards) => {
                self.check_alt_guards(scope, guards, AltKind::Interleave, scx)
            }
            StatementKind::Repeat => match scx.alt {
                Some(AltKind::Alt) => {}
                Some(AltKind::Interleave) => self.error(
                    statement.location,
                    codes::INVALID_CONTEXT,
                    "Repeat statement cannot be used inside an interleave statement",
                ),
                None => self.error(
                    statement.location,
                    codes::INVALID_CONTEXT,
                    "Repeat statement cannot be used outside alt statements",
                ),
            },
            StatementKind::Setverdict(value) => {
                if scx.value.in_control {
                    self.error(
                        statement.location,
                        codes::INVALID_CONTEXT,
                        "Setverdict statement is not allowed in the control part",
                    );
                }
                self.check_value(scope, value, ResolvedType::builtin(BuiltinType::Verdict), &vcx);
                if matches!(value.kind, ValueKind::Verdict(Verdict::Error)) {
                    self.error(
                        value.location,
                        codes::INVALID_CONTEXT,
                        "Error verdict cannot be set explicitly",
                    );
                }
            }
            StatementKind::Return(value) => {
                self.check_return(scope, statement, value.as_ref(), scx)
            }
            StatementKind::Call(value) => match &value.kind {
                ValueKind::Call { function, args } => {
                    self.check_call(scope, function, args, &vcx, false);
                }
                _ => {
                    self.infer_value(scope, value, &vcx);
                    self.error(
                        value.location,
                        codes::INVALID_CONTEXT,
                        "Only function calls can be used as statements",
                    );
                }
            },
            StatementKind::Block(block) => self.check_block(scope, block, scx),
        }
    }

    /// The type of an assignment target, reporting targets that are not
    /// variables.
    fn assignment_target(
        &self,
        scope: &ScopeStack<'a>,
        target: &crate::syntax::Reference,
    ) -> ResolvedType<'a> {
        if target.module.is_none() {
            if let Some(entry) = scope.lookup(target.identifier.name()) {
                if !entry.kind.is_assignable() {
                    self.error(
                        target.location,
                        codes::INVALID_CONTEXT,
                        format!(
                            "Reference to a variable or parameter was expected instead of {} `{}'",
                            entry.kind.description(),
                            target.identifier.display_name()
                        ),
                    );
                    return ResolvedType::Erroneous;
                }
                return self.resolve_type(entry.module, entry.ty, &mut self.chain());
            }
        }
        if let Some(assignment) = self.resolve(target) {
            self.error(
                target.location,
                codes::INVALID_CONTEXT,
                format!(
                    "Reference to a variable or parameter was expected instead of {} `{}'",
                    assignment.definition.kind_name(),
                    assignment.full_name()
                ),
            );
        }
        ResolvedType::Erroneous
    }

    fn check_return(
        &self,
        scope: &ScopeStack<'a>,
        statement: &'a Statement,
        value: Option<&'a crate::syntax::Value>,
        scx: &StatementContext<'a>,
    ) {
        if !scx.in_function {
            self.error(
                statement.location,
                codes::INVALID_CONTEXT,
                "Return statement cannot be used in the control part",
            );
            return;
        }
        if scx.in_interleave {
            self.error(
                statement.location,
                codes::INVALID_CONTEXT,
                "Return statement cannot be used inside an interleave statement",
            );
        }
        match (value, scx.return_type) {
            (Some(value), Some(expected)) => self.check_value(scope, value, expected, &scx.value),
            (None, Some(expected)) => self.error(
                statement.location,
                codes::MISSING_REQUIRED,
                format!(
                    "Missing return value: the function should return a value of type `{}'",
                    expected.type_name()
                ),
            ),
            (Some(value), None) => self.error(
                value.location,
                codes::INVALID_CONTEXT,
                "Unexpected return value: the function does not have a return type",
            ),
            (None, None) => {}
        }
    }

    fn check_alt_guards(
        &self,
        scope: &mut ScopeStack<'a>,
        guards: &'a AltGuards,
        kind: AltKind,
        scx: &StatementContext<'a>,
    ) {
        let inner = scx.inside(kind);
        let mut else_seen = false;
        for guard in &guards.guards {
            if else_seen {
                self.warning(
                    guard.location,
                    codes::UNREACHABLE_CODE,
                    "Control never reaches this branch of alternative \
                     because of a previous [else] branch",
                );
            }
            match &guard.kind {
                GuardKind::Else => {
                    if kind == AltKind::Interleave {
                        self.error(
                            guard.location,
                            codes::INVALID_CONTEXT,
                            "An [else] branch is not allowed in an interleave statement",
                        );
                    }
                    if guard.event.is_some() {
                        self.error(
                            guard.location,
                            codes::INVALID_CONTEXT,
                            "An [else] branch cannot have a receiving operation",
                        );
                    }
                    else_seen = true;
                }
                GuardKind::Guard(expression) => {
                    if let Some(expression) = expression {
                        if kind == AltKind::Interleave {
                            self.error(
                                expression.location,
                                codes::INVALID_CONTEXT,
                                "Boolean guards are not allowed in an interleave statement",
                            );
                        }
                        self.check_value(
                            scope,
                            expression,
                            ResolvedType::builtin(BuiltinType::Boolean),
                            &scx.value,
                        );
                    }
                    if guard.event.is_none() {
                        self.error(
                            guard.location,
                            codes::MISSING_REQUIRED,
                            "A branch of an alternative must start with a receiving operation",
                        );
                    }
                }
            }
            if let Some(event) = &guard.event {
                self.check_receive(scope, event, scx);
            }
            self.check_block(scope, &guard.block, &inner);
        }
    }

    fn check_receive(
        &self,
        scope: &ScopeStack<'a>,
        event: &'a ReceiveEvent,
        scx: &StatementContext<'a>,
    ) {
        let vcx = ValueContext {
            allow_template: true,
            allow_omit: false,
            ..scx.value
        };
        let port = &event.port;
        let entry = if port.module.is_none() {
            scope.lookup(port.identifier.name())
        } else {
            None
        };
        let port_type = match entry {
            Some(entry) if entry.kind == LocalKind::ComponentPort => {
                self.resolve_type(entry.module, entry.ty, &mut self.chain())
            }
            Some(entry) => {
                self.error(
                    port.location,
                    codes::INVALID_CONTEXT,
                    format!(
                        "Reference to a port was expected instead of {} `{}'",
                        entry.kind.description(),
                        port.identifier.display_name()
                    ),
                );
                ResolvedType::Erroneous
            }
            None => {
                match scx.value.runs_on {
                    None => self.error(
                        port.location,
                        codes::UNDEFINED_REFERENCE,
                        format!(
                            "Port `{}' cannot be used without a `runs on' clause",
                            port
                        ),
                    ),
                    Some(component) => self.error(
                        port.location,
                        codes::UNDEFINED_REFERENCE,
                        format!(
                            "There is no port with name `{}' in component type `{}'",
                            port,
                            component.full_name()
                        ),
                    ),
                }
                ResolvedType::Erroneous
            }
        };

        let Some(template) = &event.template else {
            return;
        };
        if port_type.is_erroneous() {
            self.check_value(scope, template, ResolvedType::Erroneous, &vcx);
            return;
        }
        let incoming = self.incoming_types(port_type);
        if incoming.is_empty() {
            self.error(
                event.location,
                codes::TYPE_MISMATCH,
                format!(
                    "Port type `{}' does not have incoming message types",
                    port_type.type_name()
                ),
            );
            return;
        }
        if matches!(template.kind, ValueKind::Record(_)) {
            if let [only] = incoming.as_slice() {
                self.check_value(scope, template, *only, &vcx);
            }
            return;
        }
        let actual = self.infer_value(scope, template, &vcx);
        if !actual.is_erroneous() && !incoming.iter().any(|ty| ty.is_compatible(&actual)) {
            self.error(
                template.location,
                codes::TYPE_MISMATCH,
                format!(
                    "Message type `{}' is not present on the incoming list of port type `{}'",
                    actual.type_name(),
                    port_type.type_name()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;
    use crate::semantic::test_support::{check_sources, messages};
    use crate::syntax::{DefinitionKind, parse_file};
    use rstest::rstest;

    fn body_status(body: &str) -> ReturnStatus {
        let source = format!("module M {{ function f() return integer {{ {} }} }}", body);
        let module = parse_file(FileId::new(0), &source).module.expect("module");
        let def = module.definitions().next().expect("function");
        let DefinitionKind::Function(function) = &def.kind else {
            panic!("not a function");
        };
        has_return(&function.body)
    }

    #[rstest]
    #[case("return 1;", ReturnStatus::Yes)]
    #[case("var integer x := 1;", ReturnStatus::No)]
    #[case("{ return 1; }", ReturnStatus::Yes)]
    #[case("alt { [] p.receive { return 1; } [] q.receive { } }", ReturnStatus::Maybe)]
    #[case("alt { [] p.receive { return 1; } [] q.receive { return 2; } }", ReturnStatus::Maybe)]
    #[case("alt { [] p.receive { return 1; } [else] { return 2; } }", ReturnStatus::Yes)]
    #[case("interleave { [] p.receive { return 1; } }", ReturnStatus::Maybe)]
    #[case("alt { [] p.receive { } [else] { } }", ReturnStatus::No)]
    fn test_return_status(#[case] body: &str, #[case] expected: ReturnStatus) {
        assert_eq!(body_status(body), expected);
    }

    #[test]
    fn test_statement_contexts() {
        let markers = check_sources(&["module M {
            type port P message { in integer }
            type component C { port P p; var integer v; }
            function f() runs on C {
                repeat;
                alt {
                    [] p.receive(1) { repeat; }
                    [else] { }
                    [] p.receive { }
                }
                interleave { [] p.receive { repeat; } }
                setverdict(pass);
                setverdict(error);
            }
            control {
                setverdict(pass);
                return;
            }
        }"]);
        let msgs = messages(&markers);
        assert!(msgs.iter().any(|m| m.contains("outside alt statements")), "{:?}", msgs);
        assert!(msgs.iter().any(|m| m.contains("inside an interleave")));
        assert!(msgs.iter().any(|m| m.contains("previous [else] branch")));
        assert!(msgs.iter().any(|m| m.contains("Error verdict")));
        assert!(msgs.iter().any(|m| m.contains("not allowed in the control part")));
        assert!(
            msgs.iter()
                .any(|m| m.contains("Return statement cannot be used in the control part"))
        );
        assert_eq!(msgs.len(), 6, "{:?}", msgs);
    }

    #[test]
    fn test_receive_checks() {
        let markers = check_sources(&["module M {
            type port P message { in integer; out charstring }
            type component C { port P p; var integer v; }
            function f() runs on C {
                alt {
                    [] p.receive(1) { }
                    [] p.receive(\"text\") { }
                    [] v.receive { }
                    [] q.receive { }
                }
            }
            function g() {
                alt { [] p.receive { } }
            }
        }"]);
        let msgs = messages(&markers);
        assert!(
            msgs.iter().any(|m| m.contains("Message type `charstring' is not present")),
            "{:?}",
            msgs
        );
        assert!(
            msgs.iter()
                .any(|m| m.contains("port was expected instead of component variable `v'"))
        );
        assert!(msgs.iter().any(|m| m.contains("no port with name `q'")));
        assert!(msgs.iter().any(|m| m.contains("without a `runs on' clause")));
        assert_eq!(msgs.len(), 4, "{:?}", msgs);
    }

    #[test]
    fn test_locals_and_assignments() {
        let markers = check_sources(&["module M {
            const integer k := 1;
            function f(in integer a) return integer {
                var integer x := a;
                var integer x := 2;
                x := true;
                k := 2;
                return x;
                x := 3;
            }
        }"]);
        let msgs = messages(&markers);
        assert!(
            msgs.iter().any(|m| m.contains("Duplicate definition with name `x'")),
            "{:?}",
            msgs
        );
        assert!(msgs.iter().any(|m| m.contains("`integer' was expected instead of `boolean'")));
        assert!(msgs.iter().any(|m| m.contains("instead of constant `@M.k'")));
        assert!(msgs.iter().any(|m| m.contains("Control never reaches this statement")));
    }

    #[test]
    fn test_return_value_checks() {
        let markers = check_sources(&["module M {
            function f() return integer { return; }
            function g() { return 1; }
            function h() return integer { return \"x\"; }
        }"]);
        let msgs = messages(&markers);
        assert!(msgs.iter().any(|m| m.contains("Missing return value")), "{:?}", msgs);
        assert!(msgs.iter().any(|m| m.contains("Unexpected return value")));
        assert!(msgs.iter().any(|m| m.contains("expected instead of `charstring'")));
    }
}
