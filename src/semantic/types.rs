//! Type resolution and type definition checks.

use rustc_hash::FxHashMap;

use super::chain::ReferenceChain;
use super::checker::Checker;
use super::diagnostics::codes;
use super::resolve::Assignment;
use super::scope::ScopeStack;
use super::values::ValueContext;
use crate::base::{Location, Name};
use crate::syntax::{
    BinaryOp, BuiltinType, ComponentElementKind, DefinitionKind, Field, Module, PortDirection,
    RangeConstraint, Type, TypeKind, UnaryOp, Value, ValueKind,
};

/// Closed numeric interval of a range constraint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    fn intersect(self, other: Option<Bounds>) -> Bounds {
        match other {
            Some(other) => Bounds {
                lower: self.lower.max(other.lower),
                upper: self.upper.min(other.upper),
            },
            None => self,
        }
    }
}

/// What a type spec denotes after following references.
#[derive(Clone, Copy, Debug)]
pub enum ResolvedType<'a> {
    Builtin(BuiltinType, Option<Bounds>),
    /// A structured type definition; these are compatible only with
    /// themselves.
    Defined(Assignment<'a>, &'a Type),
    /// Resolution failed and was reported.
    Erroneous,
}

impl<'a> ResolvedType<'a> {
    pub fn builtin(builtin: BuiltinType) -> Self {
        ResolvedType::Builtin(builtin, None)
    }

    pub fn is_erroneous(&self) -> bool {
        matches!(self, ResolvedType::Erroneous)
    }

    pub fn as_builtin(&self) -> Option<BuiltinType> {
        match self {
            ResolvedType::Builtin(builtin, _) => Some(*builtin),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.as_builtin(),
            Some(BuiltinType::Integer | BuiltinType::Float)
        )
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            ResolvedType::Builtin(_, bounds) => *bounds,
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<&'a TypeKind> {
        match self {
            ResolvedType::Defined(_, ty) => Some(&ty.kind),
            _ => None,
        }
    }

    pub fn record_fields(&self) -> Option<&'a [Field]> {
        match self.kind() {
            Some(TypeKind::Record(fields)) => Some(fields),
            _ => None,
        }
    }

    pub fn union_fields(&self) -> Option<&'a [Field]> {
        match self.kind() {
            Some(TypeKind::Union(fields)) => Some(fields),
            _ => None,
        }
    }

    /// The module the structured type is declared in.
    pub fn module(&self) -> Option<&'a Module> {
        match self {
            ResolvedType::Defined(assignment, _) => Some(assignment.module),
            _ => None,
        }
    }

    /// Whether a value of type `other` can be used where `self` is expected.
    ///
    /// Erroneous types are compatible with everything so one failure does
    /// not cascade.
    pub fn is_compatible(&self, other: &ResolvedType<'_>) -> bool {
        match (self, other) {
            (ResolvedType::Erroneous, _) | (_, ResolvedType::Erroneous) => true,
            (ResolvedType::Builtin(BuiltinType::Anytype, _), _) => true,
            (ResolvedType::Builtin(a, _), ResolvedType::Builtin(b, _)) => a == b,
            (ResolvedType::Defined(a, _), ResolvedType::Defined(b, _)) => a.is_same(b),
            _ => false,
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            ResolvedType::Builtin(builtin, _) => builtin.as_str().to_string(),
            ResolvedType::Defined(assignment, _) => assignment.full_name(),
            ResolvedType::Erroneous => "<erroneous>".to_string(),
        }
    }
}

/// Fold a constant numeric expression made of literals.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match &value.kind {
        ValueKind::Integer(v) => Some(*v as f64),
        ValueKind::Float(v) => Some(*v),
        ValueKind::Unary {
            op: UnaryOp::Minus,
            operand,
        } => numeric_value(operand).map(|v| -v),
        ValueKind::Binary { op, lhs, rhs } => {
            let (lhs, rhs) = (numeric_value(lhs)?, numeric_value(rhs)?);
            match op {
                BinaryOp::Add => Some(lhs + rhs),
                BinaryOp::Sub => Some(lhs - rhs),
                BinaryOp::Mul => Some(lhs * rhs),
                BinaryOp::Div if rhs != 0.0 => Some(lhs / rhs),
                _ => None,
            }
        }
        _ => None,
    }
}

impl<'c, 'a> Checker<'c, 'a> {
    /// Follow a type spec written in `module` to what it denotes.
    ///
    /// Every referenced type definition on the way is added to `chain`, so
    /// alias cycles are reported and resolve to [`ResolvedType::Erroneous`].
    pub fn resolve_type(
        &self,
        module: &'a Module,
        ty: &'a Type,
        chain: &mut ReferenceChain<'_>,
    ) -> ResolvedType<'a> {
        let resolved = self.resolve_type_kind(module, ty, chain);
        match (resolved, &ty.constraint) {
            (ResolvedType::Builtin(builtin, outer), Some(constraint)) => {
                match (numeric_value(&constraint.lower), numeric_value(&constraint.upper)) {
                    (Some(lower), Some(upper)) if resolved.is_numeric() => {
                        let bounds = Bounds { lower, upper }.intersect(outer);
                        ResolvedType::Builtin(builtin, Some(bounds))
                    }
                    _ => resolved,
                }
            }
            _ => resolved,
        }
    }

    /// Like [`Checker::resolve_type`], ignoring the type's own constraint.
    fn resolve_type_kind(
        &self,
        module: &'a Module,
        ty: &'a Type,
        chain: &mut ReferenceChain<'_>,
    ) -> ResolvedType<'a> {
        match &ty.kind {
            TypeKind::Builtin(builtin) => ResolvedType::builtin(*builtin),
            TypeKind::Referenced(reference) => match self.resolve_in(module, reference) {
                Some(assignment) => {
                    self.resolve_assignment_type(assignment, reference.location, chain)
                }
                None => ResolvedType::Erroneous,
            },
            TypeKind::Selection { alternative, of } => {
                let union = self.resolve_type(module, of, chain);
                match union.union_fields() {
                    Some(fields) => {
                        match fields.iter().find(|f| f.identifier.name() == alternative.name()) {
                            Some(field) => {
                                let owner = union.module().unwrap_or(module);
                                self.resolve_type(owner, &field.ty, chain)
                            }
                            None => {
                                self.error_singular(
                                    *alternative.location(),
                                    codes::UNDEFINED_REFERENCE,
                                    format!(
                                        "Reference to non-existent alternative `{}' \
                                         in union type `{}'",
                                        alternative.display_name(),
                                        union.type_name()
                                    ),
                                );
                                ResolvedType::Erroneous
                            }
                        }
                    }
                    None if union.is_erroneous() => ResolvedType::Erroneous,
                    None => {
                        self.error_singular(
                            of.location,
                            codes::INVALID_TYPE,
                            format!(
                                "The type of a selection must be a union type instead of `{}'",
                                union.type_name()
                            ),
                        );
                        ResolvedType::Erroneous
                    }
                }
            }
            // structured types only appear as the body of a type definition
            TypeKind::Record(_)
            | TypeKind::Union(_)
            | TypeKind::Enumerated(_)
            | TypeKind::Port(_)
            | TypeKind::Component(_) => ResolvedType::Erroneous,
        }
    }

    /// The type denoted by a referenced assignment, reporting non-types.
    pub fn resolve_assignment_type(
        &self,
        assignment: Assignment<'a>,
        at: Location,
        chain: &mut ReferenceChain<'_>,
    ) -> ResolvedType<'a> {
        match &assignment.definition.kind {
            DefinitionKind::AnyType => ResolvedType::builtin(BuiltinType::Anytype),
            DefinitionKind::Type(ty) => {
                if !chain.add(&assignment) {
                    self.count_error();
                    return ResolvedType::Erroneous;
                }
                match &ty.kind {
                    TypeKind::Record(_)
                    | TypeKind::Union(_)
                    | TypeKind::Enumerated(_)
                    | TypeKind::Port(_)
                    | TypeKind::Component(_) => ResolvedType::Defined(assignment, ty),
                    _ => self.resolve_type(assignment.module, ty, chain),
                }
            }
            _ => {
                self.error_singular(
                    at,
                    codes::INVALID_TYPE,
                    format!(
                        "Reference to a type was expected instead of {} `{}'",
                        assignment.definition.kind_name(),
                        assignment.full_name()
                    ),
                );
                ResolvedType::Erroneous
            }
        }
    }

    /// Check a `type` definition.
    pub fn check_type_definition(&self, assignment: Assignment<'a>) {
        let DefinitionKind::Type(ty) = &assignment.definition.kind else {
            return;
        };
        if !ty.state.begin(self.cx.timestamp) {
            return;
        }
        let module = assignment.module;
        let mut root = ResolvedType::Erroneous;
        match &ty.kind {
            TypeKind::Builtin(builtin) => root = ResolvedType::builtin(*builtin),
            TypeKind::Referenced(_) | TypeKind::Selection { .. } => {
                let mut chain = self.chain();
                chain.add(&assignment);
                root = self.resolve_type_kind(module, ty, &mut chain);
            }
            TypeKind::Record(fields) => {
                self.check_fields(module, fields, "field");
                let mut chain = ReferenceChain::new(
                    self.cx.markers,
                    "Infinite recursion through non-optional fields: `{}'",
                    true,
                );
                self.check_record_recursion(assignment, &mut chain);
            }
            TypeKind::Union(fields) => self.check_fields(module, fields, "alternative"),
            TypeKind::Enumerated(items) => {
                let mut seen: FxHashMap<&Name, Location> = FxHashMap::default();
                for item in items {
                    if let Some(first) = seen.insert(item.name(), *item.location()) {
                        self.error(
                            *item.location(),
                            codes::DUPLICATE_DEFINITION,
                            format!(
                                "Duplicate enumeration identifier `{}', \
                                 first declared at offset {}",
                                item.display_name(),
                                first.offset()
                            ),
                        );
                    }
                }
            }
            TypeKind::Port(lists) => {
                for list in lists {
                    for message in &list.types {
                        let resolved = self.resolve_type(module, message, &mut self.chain());
                        if matches!(
                            resolved.kind(),
                            Some(TypeKind::Port(_) | TypeKind::Component(_))
                        ) {
                            self.error(
                                message.location,
                                codes::INVALID_TYPE,
                                format!(
                                    "Type `{}' cannot be a message type",
                                    resolved.type_name()
                                ),
                            );
                        }
                    }
                }
            }
            TypeKind::Component(elements) => {
                let mut seen: FxHashMap<&Name, &crate::base::Identifier> = FxHashMap::default();
                let scope = ScopeStack::new();
                for element in elements {
                    if let Some(first) = seen.get(element.identifier.name()) {
                        self.report_duplicate(&element.identifier, first);
                        continue;
                    }
                    seen.insert(element.identifier.name(), &element.identifier);
                    let resolved = self.resolve_type(module, element.kind.ty(), &mut self.chain());
                    match &element.kind {
                        ComponentElementKind::Port { ty } => {
                            if !resolved.is_erroneous()
                                && !matches!(resolved.kind(), Some(TypeKind::Port(_)))
                            {
                                self.error(
                                    ty.location,
                                    codes::INVALID_TYPE,
                                    format!(
                                        "Reference to a port type was expected instead of `{}'",
                                        resolved.type_name()
                                    ),
                                );
                            }
                        }
                        ComponentElementKind::Var { init, .. } => {
                            if let Some(init) = init {
                                self.check_value(&scope, init, resolved, &ValueContext::default());
                            }
                        }
                        ComponentElementKind::Const { value, .. } => {
                            self.check_value(&scope, value, resolved, &ValueContext::constant());
                        }
                    }
                }
            }
        }
        if let Some(constraint) = &ty.constraint {
            self.check_range_constraint(constraint, root);
        }
    }

    fn check_fields(&self, module: &'a Module, fields: &'a [Field], what: &str) {
        let mut seen: FxHashMap<&Name, &crate::base::Identifier> = FxHashMap::default();
        for field in fields {
            if let Some(first) = seen.get(field.identifier.name()) {
                self.error(
                    *field.identifier.location(),
                    codes::DUPLICATE_DEFINITION,
                    format!(
                        "Duplicate {} name `{}', first declared at offset {}",
                        what,
                        field.identifier.display_name(),
                        first.location().offset()
                    ),
                );
                continue;
            }
            seen.insert(field.identifier.name(), &field.identifier);
            self.resolve_type(module, &field.ty, &mut self.chain());
        }
    }

    /// Follow non-optional record fields; reaching a record already on the
    /// chain means a value of it could never be finite.
    fn check_record_recursion(&self, assignment: Assignment<'a>, chain: &mut ReferenceChain<'_>) {
        if !chain.add(&assignment) {
            self.count_error();
            return;
        }
        let DefinitionKind::Type(ty) = &assignment.definition.kind else {
            return;
        };
        let TypeKind::Record(fields) = &ty.kind else {
            return;
        };
        for field in fields.iter().filter(|f| !f.optional) {
            let resolved = self.quiet_field_type(assignment.module, &field.ty);
            if let ResolvedType::Defined(inner, inner_ty) = resolved {
                if matches!(inner_ty.kind, TypeKind::Record(_)) {
                    chain.mark_state();
                    self.check_record_recursion(inner, chain);
                    chain.previous_state();
                }
            }
        }
    }

    /// Resolve a field type without reporting; its own check reports.
    fn quiet_field_type(&self, module: &'a Module, ty: &'a Type) -> ResolvedType<'a> {
        let mut current_module = module;
        let mut current = ty;
        let mut seen = Vec::new();
        loop {
            let TypeKind::Referenced(reference) = &current.kind else {
                return ResolvedType::Erroneous;
            };
            let Some(assignment) =
                current_module.find_assignment(self.cx.modules, self.cx.markers, reference)
            else {
                return ResolvedType::Erroneous;
            };
            if seen.contains(&assignment.id()) {
                return ResolvedType::Erroneous;
            }
            seen.push(assignment.id());
            let DefinitionKind::Type(next) = &assignment.definition.kind else {
                return ResolvedType::Erroneous;
            };
            match &next.kind {
                TypeKind::Referenced(_) => {
                    current_module = assignment.module;
                    current = next;
                }
                TypeKind::Builtin(builtin) => return ResolvedType::builtin(*builtin),
                TypeKind::Selection { .. } => return ResolvedType::Erroneous,
                _ => return ResolvedType::Defined(assignment, next),
            }
        }
    }

    fn check_range_constraint(&self, constraint: &'a RangeConstraint, root: ResolvedType<'a>) {
        if root.is_erroneous() {
            return;
        }
        if !root.is_numeric() {
            self.error(
                constraint.location,
                codes::CONSTRAINT_VIOLATION,
                format!(
                    "Range subtyping is not allowed for type `{}'",
                    root.type_name()
                ),
            );
            return;
        }
        let scope = ScopeStack::new();
        let unbounded =
            ResolvedType::Builtin(root.as_builtin().unwrap_or(BuiltinType::Integer), None);
        self.check_value(&scope, &constraint.lower, unbounded, &ValueContext::constant());
        self.check_value(&scope, &constraint.upper, unbounded, &ValueContext::constant());
        if let (Some(lower), Some(upper)) = (
            numeric_value(&constraint.lower),
            numeric_value(&constraint.upper),
        ) {
            if lower > upper {
                self.error(
                    constraint.location,
                    codes::CONSTRAINT_VIOLATION,
                    format!(
                        "The lower boundary ({}) is greater than the upper boundary ({})",
                        lower, upper
                    ),
                );
            }
            if let Some(outer) = root.bounds() {
                if !outer.contains(lower) || !outer.contains(upper) {
                    self.error(
                        constraint.location,
                        codes::CONSTRAINT_VIOLATION,
                        format!(
                            "The subtype ({}..{}) is not a subset \
                             of the parent type's range ({}..{})",
                            lower, upper, outer.lower, outer.upper
                        ),
                    );
                }
            }
        }
    }

    /// Incoming message types of a port type.
    pub fn incoming_types(&self, port: ResolvedType<'a>) -> Vec<ResolvedType<'a>> {
        let Some(TypeKind::Port(lists)) = port.kind() else {
            return Vec::new();
        };
        let module = port.module().unwrap_or(self.module);
        lists
            .iter()
            .filter(|list| matches!(list.direction, PortDirection::In | PortDirection::Inout))
            .flat_map(|list| list.types.iter())
            .map(|ty| self.resolve_type(module, ty, &mut self.chain()))
            .collect()
    }
}
