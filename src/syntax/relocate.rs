//! Mutable walk over every location owned by a subtree.
//!
//! Incremental reparsing shifts the nodes after an edit; this trait lets it
//! apply one location update to a whole subtree, identifiers included.

use super::ast::*;
use crate::base::{Identifier, Location};

pub trait Relocate {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location));
}

impl Relocate for Location {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        if !self.is_none() {
            f(self);
        }
    }
}

impl Relocate for Identifier {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location_mut().relocate(f);
    }
}

impl<T: Relocate> Relocate for Option<T> {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        if let Some(inner) = self {
            inner.relocate(f);
        }
    }
}

impl<T: Relocate> Relocate for Vec<T> {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        for inner in self {
            inner.relocate(f);
        }
    }
}

impl<T: Relocate> Relocate for Box<T> {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        (**self).relocate(f);
    }
}

impl Relocate for Module {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location.relocate(f);
        self.identifier.relocate(f);
        self.body_location.relocate(f);
        self.items.relocate(f);
        self.with_attributes.relocate(f);
    }
}

impl Relocate for ModuleItem {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        match self {
            ModuleItem::Import(import) => {
                import.location.relocate(f);
                import.identifier.relocate(f);
            }
            ModuleItem::Friend(friend) => {
                friend.location.relocate(f);
                friend.modules.relocate(f);
            }
            ModuleItem::Definition(def) => def.relocate(f),
            ModuleItem::Control(control) => {
                control.location.relocate(f);
                control.block.relocate(f);
                control.with_attributes.relocate(f);
            }
        }
    }
}

impl Relocate for Definition {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location.relocate(f);
        self.identifier.relocate(f);
        match &mut self.kind {
            DefinitionKind::Type(ty) => ty.relocate(f),
            DefinitionKind::Const { ty, value } => {
                ty.relocate(f);
                value.relocate(f);
            }
            DefinitionKind::Template { ty, body } => {
                ty.relocate(f);
                match body {
                    TemplateBody::Any(loc)
                    | TemplateBody::AnyOrOmit(loc)
                    | TemplateBody::Omit(loc) => loc.relocate(f),
                    TemplateBody::Specific(value) => value.relocate(f),
                }
            }
            DefinitionKind::Function(function) => {
                function.params.relocate(f);
                function.runs_on.relocate(f);
                function.return_type.relocate(f);
                function.body.relocate(f);
            }
            DefinitionKind::Signature {
                params,
                return_type,
            } => {
                params.relocate(f);
                return_type.relocate(f);
            }
            DefinitionKind::AnyType => {}
        }
        self.with_attributes.relocate(f);
    }
}

impl Relocate for FormalParameter {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location.relocate(f);
        self.identifier.relocate(f);
        self.ty.relocate(f);
    }
}

impl Relocate for Type {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location.relocate(f);
        match &mut self.kind {
            TypeKind::Builtin(_) => {}
            TypeKind::Referenced(reference) => reference.relocate(f),
            TypeKind::Selection { alternative, of } => {
                alternative.relocate(f);
                of.relocate(f);
            }
            TypeKind::Record(fields) | TypeKind::Union(fields) => {
                for field in fields {
                    field.location.relocate(f);
                    field.identifier.relocate(f);
                    field.ty.relocate(f);
                }
            }
            TypeKind::Enumerated(items) => items.relocate(f),
            TypeKind::Port(lists) => {
                for list in lists {
                    list.location.relocate(f);
                    list.types.relocate(f);
                }
            }
            TypeKind::Component(elements) => {
                for element in elements {
                    element.location.relocate(f);
                    element.identifier.relocate(f);
                    match &mut element.kind {
                        ComponentElementKind::Var { ty, init } => {
                            ty.relocate(f);
                            init.relocate(f);
                        }
                        ComponentElementKind::Port { ty } => ty.relocate(f),
                        ComponentElementKind::Const { ty, value } => {
                            ty.relocate(f);
                            value.relocate(f);
                        }
                    }
                }
            }
        }
        if let Some(constraint) = &mut self.constraint {
            constraint.location.relocate(f);
            constraint.lower.relocate(f);
            constraint.upper.relocate(f);
        }
    }
}

impl Relocate for Reference {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location.relocate(f);
        self.module.relocate(f);
        self.identifier.relocate(f);
    }
}

impl Relocate for Value {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location.relocate(f);
        match &mut self.kind {
            ValueKind::Reference(reference) => reference.relocate(f),
            ValueKind::Call { function, args } => {
                function.relocate(f);
                args.relocate(f);
            }
            ValueKind::Record(fields) => {
                for field in fields {
                    field.location.relocate(f);
                    field.identifier.relocate(f);
                    field.value.relocate(f);
                }
            }
            ValueKind::Unary { operand, .. } => operand.relocate(f),
            ValueKind::Binary { lhs, rhs, .. } => {
                lhs.relocate(f);
                rhs.relocate(f);
            }
            _ => {}
        }
    }
}

impl Relocate for StatementBlock {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location.relocate(f);
        self.statements.relocate(f);
    }
}

impl Relocate for Statement {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location.relocate(f);
        match &mut self.kind {
            StatementKind::Var {
                identifier,
                ty,
                init,
            } => {
                identifier.relocate(f);
                ty.relocate(f);
                init.relocate(f);
            }
            StatementKind::Assignment { target, value } => {
                target.relocate(f);
                value.relocate(f);
            }
            StatementKind::Alt(guards) | StatementKind::Interleave(guards) => {
                guards.guards.relocate(f);
            }
            StatementKind::Repeat => {}
            StatementKind::Setverdict(value) | StatementKind::Call(value) => value.relocate(f),
            StatementKind::Return(value) => value.relocate(f),
            StatementKind::Block(block) => block.relocate(f),
        }
    }
}

impl Relocate for AltGuard {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location.relocate(f);
        if let GuardKind::Guard(value) = &mut self.kind {
            value.relocate(f);
        }
        if let Some(event) = &mut self.event {
            event.location.relocate(f);
            event.port.relocate(f);
            event.template.relocate(f);
        }
        self.block.relocate(f);
    }
}

impl Relocate for WithAttributes {
    fn relocate(&mut self, f: &mut dyn FnMut(&mut Location)) {
        self.location.relocate(f);
        for attr in &mut self.attributes {
            attr.location.relocate(f);
        }
    }
}
