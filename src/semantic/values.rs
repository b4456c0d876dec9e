//! Value and expression checks.

use rustc_hash::FxHashSet;

use super::checker::Checker;
use super::diagnostics::codes;
use super::resolve::Assignment;
use super::scope::{LocalKind, ScopeStack};
use super::types::{ResolvedType, numeric_value};
use crate::base::{Location, Name};
use crate::syntax::{
    BinaryOp, BuiltinType, DefinitionKind, FieldValue, ParamDirection, Reference, TypeKind,
    UnaryOp, Value, ValueKind,
};

/// Where a value appears.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueContext<'a> {
    /// Only constants may be referenced and no function may be called.
    pub constant: bool,
    /// `omit` is accepted, as for optional record fields.
    pub allow_omit: bool,
    /// Templates may be referenced, as in template bodies and receive
    /// operations.
    pub allow_template: bool,
    /// Component of the enclosing function's `runs on` clause.
    pub runs_on: Option<Assignment<'a>>,
    pub in_control: bool,
}

impl<'a> ValueContext<'a> {
    pub fn constant() -> Self {
        Self {
            constant: true,
            ..Self::default()
        }
    }

    pub fn template() -> Self {
        Self {
            allow_template: true,
            ..Self::default()
        }
    }

    fn with_omit(&self, allow_omit: bool) -> Self {
        Self {
            allow_omit,
            ..*self
        }
    }

    /// Context of a nested operand: never `omit`.
    fn operand(&self) -> Self {
        self.with_omit(false)
    }
}

fn strip_bounds(ty: ResolvedType<'_>) -> ResolvedType<'_> {
    match ty {
        ResolvedType::Builtin(builtin, _) => ResolvedType::builtin(builtin),
        other => other,
    }
}

impl<'c, 'a> Checker<'c, 'a> {
    /// Check `value` against the `expected` type.
    pub fn check_value(
        &self,
        scope: &ScopeStack<'a>,
        value: &'a Value,
        expected: ResolvedType<'a>,
        vcx: &ValueContext<'a>,
    ) {
        match &value.kind {
            ValueKind::Omit => {
                if !vcx.allow_omit {
                    self.error(
                        value.location,
                        codes::INVALID_CONTEXT,
                        "`omit' value is not allowed in this context",
                    );
                }
                return;
            }
            ValueKind::Record(fields) => {
                self.check_record_value(scope, value, fields, expected, vcx);
                return;
            }
            ValueKind::Reference(reference)
                if self.is_enumeration_item(scope, reference, expected) =>
            {
                return;
            }
            _ => {}
        }

        let actual = self.infer_value(scope, value, vcx);
        if !expected.is_compatible(&actual) {
            self.error(
                value.location,
                codes::TYPE_MISMATCH,
                format!(
                    "Type mismatch: a value of type `{}' was expected instead of `{}'",
                    expected.type_name(),
                    actual.type_name()
                ),
            );
            return;
        }
        if let (Some(bounds), Some(number)) = (expected.bounds(), numeric_value(value)) {
            if !bounds.contains(number) {
                self.error(
                    value.location,
                    codes::CONSTRAINT_VIOLATION,
                    format!(
                        "{} is not a valid value for type `{}' which has subtype ({}..{})",
                        number,
                        expected.type_name(),
                        bounds.lower,
                        bounds.upper
                    ),
                );
            }
        }
    }

    fn is_enumeration_item(
        &self,
        scope: &ScopeStack<'a>,
        reference: &Reference,
        expected: ResolvedType<'a>,
    ) -> bool {
        let Some(TypeKind::Enumerated(items)) = expected.kind() else {
            return false;
        };
        reference.module.is_none()
            && scope.lookup(reference.identifier.name()).is_none()
            && items.iter().any(|item| item.name() == reference.identifier.name())
    }

    fn check_record_value(
        &self,
        scope: &ScopeStack<'a>,
        value: &'a Value,
        fields: &'a [FieldValue],
        expected: ResolvedType<'a>,
        vcx: &ValueContext<'a>,
    ) {
        let owner = expected.module().unwrap_or(self.module);
        if let Some(declared) = expected.record_fields() {
            let mut seen: FxHashSet<&Name> = FxHashSet::default();
            for field in fields {
                if !seen.insert(field.identifier.name()) {
                    self.error(
                        *field.identifier.location(),
                        codes::DUPLICATE_DEFINITION,
                        format!("Duplicate record field `{}'", field.identifier.display_name()),
                    );
                    continue;
                }
                let Some(decl) = declared
                    .iter()
                    .find(|d| d.identifier.name() == field.identifier.name())
                else {
                    self.error(
                        *field.identifier.location(),
                        codes::UNDEFINED_REFERENCE,
                        format!(
                            "Reference to non-existent field `{}' in record type `{}'",
                            field.identifier.display_name(),
                            expected.type_name()
                        ),
                    );
                    continue;
                };
                let field_type = self.resolve_type(owner, &decl.ty, &mut self.chain());
                self.check_value(scope, &field.value, field_type, &vcx.with_omit(decl.optional));
            }
            for decl in declared.iter().filter(|d| !d.optional) {
                if !seen.contains(decl.identifier.name()) {
                    self.error(
                        value.location,
                        codes::MISSING_REQUIRED,
                        format!(
                            "Field `{}' is missing from the value of record type `{}'",
                            decl.identifier.display_name(),
                            expected.type_name()
                        ),
                    );
                }
            }
        } else if let Some(alternatives) = expected.union_fields() {
            let [field] = fields else {
                self.error(
                    value.location,
                    codes::TYPE_MISMATCH,
                    format!(
                        "A value of union type `{}' must have exactly one alternative",
                        expected.type_name()
                    ),
                );
                return;
            };
            match alternatives.iter().find(|a| a.identifier.name() == field.identifier.name()) {
                Some(alternative) => {
                    let ty = self.resolve_type(owner, &alternative.ty, &mut self.chain());
                    self.check_value(scope, &field.value, ty, &vcx.operand());
                }
                None => self.error(
                    *field.identifier.location(),
                    codes::UNDEFINED_REFERENCE,
                    format!(
                        "Reference to non-existent alternative `{}' in union type `{}'",
                        field.identifier.display_name(),
                        expected.type_name()
                    ),
                ),
            }
        } else if expected.is_erroneous() {
            for field in fields {
                self.check_value(scope, &field.value, ResolvedType::Erroneous, &vcx.operand());
            }
        } else {
            self.error(
                value.location,
                codes::TYPE_MISMATCH,
                format!(
                    "A record or union value was used where a value of type `{}' was expected",
                    expected.type_name()
                ),
            );
        }
    }

    /// The type of `value` without an expectation.
    pub fn infer_value(
        &self,
        scope: &ScopeStack<'a>,
        value: &'a Value,
        vcx: &ValueContext<'a>,
    ) -> ResolvedType<'a> {
        match &value.kind {
            ValueKind::Integer(_) => ResolvedType::builtin(BuiltinType::Integer),
            ValueKind::Float(_) => ResolvedType::builtin(BuiltinType::Float),
            ValueKind::Boolean(_) => ResolvedType::builtin(BuiltinType::Boolean),
            ValueKind::Charstring(_) => ResolvedType::builtin(BuiltinType::Charstring),
            ValueKind::Verdict(_) => ResolvedType::builtin(BuiltinType::Verdict),
            ValueKind::Omit => {
                if !vcx.allow_omit {
                    self.error(
                        value.location,
                        codes::INVALID_CONTEXT,
                        "`omit' value is not allowed in this context",
                    );
                }
                ResolvedType::Erroneous
            }
            ValueKind::Reference(reference) => self.resolve_value_reference(scope, reference, vcx),
            ValueKind::Call { function, args } => {
                self.check_call(scope, function, args, vcx, true)
            }
            ValueKind::Record(_) => {
                self.error(
                    value.location,
                    codes::INVALID_TYPE,
                    "Cannot determine the type of this record or union value",
                );
                ResolvedType::Erroneous
            }
            ValueKind::Unary { op, operand } => {
                let ty = self.infer_value(scope, operand, &vcx.operand());
                let ok = match op {
                    UnaryOp::Minus => ty.is_numeric(),
                    UnaryOp::Not => ty.as_builtin() == Some(BuiltinType::Boolean),
                };
                if ty.is_erroneous() || ok {
                    return strip_bounds(ty);
                }
                let expected = match op {
                    UnaryOp::Minus => "an integer or float value",
                    UnaryOp::Not => "a boolean value",
                };
                self.error(
                    operand.location,
                    codes::TYPE_MISMATCH,
                    format!(
                        "The operand of operation `{}' should be {}",
                        match op {
                            UnaryOp::Minus => "-",
                            UnaryOp::Not => "not",
                        },
                        expected
                    ),
                );
                ResolvedType::Erroneous
            }
            ValueKind::Binary { op, lhs, rhs } => {
                self.infer_binary(scope, value.location, *op, lhs, rhs, vcx)
            }
            ValueKind::Erroneous(text) => {
                // empty text means a parse error already reported
                if !text.is_empty() {
                    self.error(
                        value.location,
                        codes::INVALID_TYPE,
                        format!("Invalid value `{}'", text),
                    );
                }
                ResolvedType::Erroneous
            }
        }
    }

    fn infer_binary(
        &self,
        scope: &ScopeStack<'a>,
        location: Location,
        op: BinaryOp,
        lhs: &'a Value,
        rhs: &'a Value,
        vcx: &ValueContext<'a>,
    ) -> ResolvedType<'a> {
        let vcx = vcx.operand();
        if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            let left = self.infer_value(scope, lhs, &vcx);
            if matches!(left, ResolvedType::Defined(..)) {
                self.check_value(scope, rhs, left, &vcx);
            } else {
                let right = self.infer_value(scope, rhs, &vcx);
                if !left.is_compatible(&right) {
                    self.error(
                        location,
                        codes::TYPE_MISMATCH,
                        format!(
                            "The operands of operation `{}' should be of compatible types \
                             instead of `{}' and `{}'",
                            op.as_str(),
                            left.type_name(),
                            right.type_name()
                        ),
                    );
                }
            }
            return ResolvedType::builtin(BuiltinType::Boolean);
        }

        let left = strip_bounds(self.infer_value(scope, lhs, &vcx));
        let right = strip_bounds(self.infer_value(scope, rhs, &vcx));
        let is = |ty: &ResolvedType<'_>, builtin| ty.as_builtin() == Some(builtin);
        let (operands_ok, result_type, expected) = match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => (
                left.is_numeric() && right.is_numeric(),
                if left.is_erroneous() { right } else { left },
                "integer or float values of the same type",
            ),
            BinaryOp::Concat => (
                is(&left, BuiltinType::Charstring) && is(&right, BuiltinType::Charstring),
                ResolvedType::builtin(BuiltinType::Charstring),
                "charstring values",
            ),
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => (
                left.is_numeric() && right.is_numeric(),
                ResolvedType::builtin(BuiltinType::Boolean),
                "integer or float values of the same type",
            ),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Eq | BinaryOp::Ne => (
                is(&left, BuiltinType::Boolean) && is(&right, BuiltinType::Boolean),
                ResolvedType::builtin(BuiltinType::Boolean),
                "boolean values",
            ),
        };
        if left.is_erroneous() || right.is_erroneous() {
            return result_type;
        }
        if !operands_ok || !left.is_compatible(&right) {
            self.error(
                location,
                codes::TYPE_MISMATCH,
                format!(
                    "The operands of operation `{}' should be {}",
                    op.as_str(),
                    expected
                ),
            );
            return ResolvedType::Erroneous;
        }
        if op == BinaryOp::Div && numeric_value(rhs) == Some(0.0) {
            self.error(rhs.location, codes::CONSTRAINT_VIOLATION, "Division by zero");
        }
        result_type
    }

    /// The type of a reference used as a value.
    pub fn resolve_value_reference(
        &self,
        scope: &ScopeStack<'a>,
        reference: &Reference,
        vcx: &ValueContext<'a>,
    ) -> ResolvedType<'a> {
        if reference.module.is_none() {
            if let Some(entry) = scope.lookup(reference.identifier.name()) {
                if entry.kind == LocalKind::ComponentPort {
                    self.error(
                        reference.location,
                        codes::INVALID_CONTEXT,
                        format!(
                            "Reference to a value was expected instead of port `{}'",
                            reference.identifier.display_name()
                        ),
                    );
                    return ResolvedType::Erroneous;
                }
                if vcx.constant && !entry.kind.is_constant() {
                    self.error(
                        reference.location,
                        codes::INVALID_CONTEXT,
                        format!(
                            "Reference to a constant value was expected instead of {} `{}'",
                            entry.kind.description(),
                            reference.identifier.display_name()
                        ),
                    );
                }
                return self.resolve_type(entry.module, entry.ty, &mut self.chain());
            }
        }

        let Some(assignment) = self.resolve(reference) else {
            return ResolvedType::Erroneous;
        };
        match &assignment.definition.kind {
            DefinitionKind::Const { ty, .. } => {
                self.resolve_type(assignment.module, ty, &mut self.chain())
            }
            DefinitionKind::Template { ty, .. } => {
                if !vcx.allow_template {
                    self.error(
                        reference.location,
                        codes::INVALID_CONTEXT,
                        format!(
                            "Reference to a value was expected instead of template `{}'",
                            assignment.full_name()
                        ),
                    );
                }
                self.resolve_type(assignment.module, ty, &mut self.chain())
            }
            _ => {
                self.error(
                    reference.location,
                    codes::INVALID_CONTEXT,
                    format!(
                        "Reference to a value was expected instead of {} `{}'",
                        assignment.definition.kind_name(),
                        assignment.full_name()
                    ),
                );
                ResolvedType::Erroneous
            }
        }
    }

    /// Check a function invocation and return the type it produces.
    pub fn check_call(
        &self,
        scope: &ScopeStack<'a>,
        function: &Reference,
        args: &'a [Value],
        vcx: &ValueContext<'a>,
        need_value: bool,
    ) -> ResolvedType<'a> {
        if vcx.constant {
            self.error(
                function.location,
                codes::INVALID_CONTEXT,
                "A function call is not allowed in a constant value",
            );
        }
        let Some(assignment) = self.resolve(function) else {
            for arg in args {
                self.infer_value(scope, arg, &vcx.operand());
            }
            return ResolvedType::Erroneous;
        };
        let DefinitionKind::Function(callee) = &assignment.definition.kind else {
            self.error(
                function.location,
                codes::INVALID_CONTEXT,
                format!(
                    "Reference to a function was expected instead of {} `{}'",
                    assignment.definition.kind_name(),
                    assignment.full_name()
                ),
            );
            return ResolvedType::Erroneous;
        };

        if args.len() != callee.params.len() {
            self.error(
                function.location,
                codes::TYPE_MISMATCH,
                format!(
                    "Too {} parameters: {} was expected instead of {}",
                    if args.len() < callee.params.len() { "few" } else { "many" },
                    callee.params.len(),
                    args.len()
                ),
            );
        }
        let arg_vcx = ValueContext {
            allow_template: false,
            ..vcx.operand()
        };
        for (arg, param) in args.iter().zip(&callee.params) {
            let ty = self.resolve_type(assignment.module, &param.ty, &mut self.chain());
            if param.direction != ParamDirection::In && !self.is_assignable_reference(scope, arg) {
                self.error(
                    arg.location,
                    codes::INVALID_CONTEXT,
                    "Reference to a variable or parameter was expected \
                     for an `out' or `inout' parameter",
                );
                continue;
            }
            self.check_value(scope, arg, ty, &arg_vcx);
        }

        if let Some(callee_component) = &callee.runs_on {
            self.check_runs_on_compatibility(assignment, callee_component, function.location, vcx);
        }

        match &callee.return_type {
            Some(ty) => strip_bounds(self.resolve_type(assignment.module, ty, &mut self.chain())),
            None => {
                if need_value {
                    self.error(
                        function.location,
                        codes::TYPE_MISMATCH,
                        format!(
                            "Function `{}' does not have a return type",
                            assignment.full_name()
                        ),
                    );
                }
                ResolvedType::Erroneous
            }
        }
    }

    fn is_assignable_reference(&self, scope: &ScopeStack<'a>, value: &Value) -> bool {
        let ValueKind::Reference(reference) = &value.kind else {
            return false;
        };
        reference.module.is_none()
            && scope
                .lookup(reference.identifier.name())
                .is_some_and(|entry| entry.kind.is_assignable())
    }

    fn check_runs_on_compatibility(
        &self,
        callee: Assignment<'a>,
        callee_component: &Reference,
        at: Location,
        vcx: &ValueContext<'a>,
    ) {
        if vcx.in_control {
            self.error(
                at,
                codes::INVALID_CONTEXT,
                format!(
                    "Function `{}' has a `runs on' clause \
                     and cannot be called from the control part",
                    callee.full_name()
                ),
            );
            return;
        }
        let Some(component) =
            callee
                .module
                .find_assignment(self.cx.modules, self.cx.markers, callee_component)
        else {
            return;
        };
        match vcx.runs_on {
            None => self.error(
                at,
                codes::INVALID_CONTEXT,
                format!(
                    "Function `{}' runs on `{}', \
                     but the calling definition has no `runs on' clause",
                    callee.full_name(),
                    component.full_name()
                ),
            ),
            Some(caller) if !caller.is_same(&component) => self.error(
                at,
                codes::INVALID_CONTEXT,
                format!(
                    "Runs on clause mismatch: \
                     the calling definition runs on `{}', but `{}' runs on `{}'",
                    caller.full_name(),
                    callee.full_name(),
                    component.full_name()
                ),
            ),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::semantic::test_support::{check_sources, messages};
    use rstest::rstest;

    #[rstest]
    #[case("const integer c := 1;", None)]
    #[case("const integer c := true;", Some("`integer' was expected instead of `boolean'"))]
    #[case("const float c := 1.0 + 2;", Some("operands of operation `+'"))]
    #[case("const charstring c := \"a\" & \"b\";", None)]
    #[case("const boolean c := 1 < 2 and not false;", None)]
    #[case("const integer c := 1 / 0;", Some("Division by zero"))]
    #[case("const integer c := omit;", Some("`omit' value is not allowed"))]
    #[case("const integer c := f();", Some("function call is not allowed"))]
    #[case("const integer c := 99999999999999999999;", Some("Invalid value"))]
    fn test_constant_values(#[case] body: &str, #[case] expected: Option<&str>) {
        let source = format!("module M {{ function f() return integer {{ return 1; }} {} }}", body);
        let markers = check_sources(&[&source]);
        let msgs = messages(&markers);
        match expected {
            None => assert!(msgs.is_empty(), "{:?}", msgs),
            Some(text) => assert!(msgs.iter().any(|m| m.contains(text)), "{:?}", msgs),
        }
    }

    #[test]
    fn test_record_values() {
        let markers = check_sources(&["module M {
            type record R { integer a, boolean b optional }
            const R ok := { a := 1, b := omit };
            const R missing := { b := true };
            const R unknown := { a := 1, c := 2 };
            const R bad_omit := { a := omit };
        }"]);
        let msgs = messages(&markers);
        assert_eq!(msgs.len(), 3, "{:?}", msgs);
        assert!(msgs.iter().any(|m| m.contains("Field `a' is missing")));
        assert!(msgs.iter().any(|m| m.contains("non-existent field `c'")));
        assert!(msgs.iter().any(|m| m.contains("`omit' value is not allowed")));
    }

    #[test]
    fn test_enumerated_and_union_values() {
        let markers = check_sources(&["module M {
            type enumerated Color { red, green }
            type union U { integer i, charstring s }
            const Color c := red;
            const Color d := blue;
            const U u := { s := \"x\" };
            const U v := { i := 1, s := \"x\" };
        }"]);
        let msgs = messages(&markers);
        assert_eq!(msgs.len(), 2, "{:?}", msgs);
        assert!(msgs.iter().any(|m| m.contains("`blue'")));
        assert!(msgs.iter().any(|m| m.contains("exactly one alternative")));
    }

    #[test]
    fn test_template_reference_outside_template() {
        let markers = check_sources(&["module M {
            template integer t := ?;
            template integer u := t;
            const integer c := t;
        }"]);
        let msgs = messages(&markers);
        assert_eq!(msgs.len(), 1, "{:?}", msgs);
        assert!(msgs[0].contains("instead of template `@M.t'"));
    }

    #[test]
    fn test_call_arguments_and_runs_on() {
        let markers = check_sources(&["module M {
            type component C { }
            type component D { }
            function on_c() runs on C { }
            function g(integer a, out integer b) { }
            function h() runs on D {
                var integer x := 0;
                g(1, x);
                g(1, 2);
                g(1);
                on_c();
            }
            control { on_c(); }
        }"]);
        let msgs = messages(&markers);
        assert!(msgs.iter().any(|m| m.contains("`out' or `inout' parameter")), "{:?}", msgs);
        assert!(msgs.iter().any(|m| m.contains("Too few parameters")));
        assert!(msgs.iter().any(|m| m.contains("Runs on clause mismatch")));
        assert!(msgs.iter().any(|m| m.contains("cannot be called from the control part")));
        assert_eq!(msgs.len(), 4, "{:?}", msgs);
    }
}
