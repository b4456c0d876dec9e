//! Read-only traversal of the AST.
//!
//! A visitor sees every node as a [`NodeRef`] and steers the walk with a
//! [`VisitAction`]. The walk is a single exhaustive match over the node
//! kinds, so adding a node kind means extending [`NodeRef`] and
//! [`children`].

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use super::ast::*;
use crate::base::Location;

/// What the walker does after visiting a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitAction {
    Continue,
    SkipChildren,
    Abort,
}

/// A borrowed view of any AST node.
#[derive(Clone, Copy, Debug)]
pub enum NodeRef<'a> {
    Module(&'a Module),
    Import(&'a ImportModule),
    Friend(&'a FriendDeclaration),
    Definition(&'a Definition),
    Control(&'a ControlPart),
    Type(&'a Type),
    Field(&'a Field),
    ComponentElement(&'a ComponentElement),
    Parameter(&'a FormalParameter),
    Template(&'a TemplateBody),
    Value(&'a Value),
    Reference(&'a Reference),
    Block(&'a StatementBlock),
    Statement(&'a Statement),
    AltGuard(&'a AltGuard),
    Attributes(&'a WithAttributes),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> Option<NodeId> {
        match self {
            NodeRef::Module(n) => Some(n.id),
            NodeRef::Import(n) => Some(n.id),
            NodeRef::Friend(n) => Some(n.id),
            NodeRef::Definition(n) => Some(n.id),
            NodeRef::Control(n) => Some(n.id),
            NodeRef::Type(n) => Some(n.id),
            NodeRef::Field(n) => Some(n.id),
            NodeRef::ComponentElement(n) => Some(n.id),
            NodeRef::Parameter(n) => Some(n.id),
            NodeRef::Value(n) => Some(n.id),
            NodeRef::Reference(n) => Some(n.id),
            NodeRef::Block(n) => Some(n.id),
            NodeRef::Statement(n) => Some(n.id),
            NodeRef::AltGuard(n) => Some(n.id),
            NodeRef::Template(_) | NodeRef::Attributes(_) => None,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            NodeRef::Module(n) => n.location,
            NodeRef::Import(n) => n.location,
            NodeRef::Friend(n) => n.location,
            NodeRef::Definition(n) => n.location,
            NodeRef::Control(n) => n.location,
            NodeRef::Type(n) => n.location,
            NodeRef::Field(n) => n.location,
            NodeRef::ComponentElement(n) => n.location,
            NodeRef::Parameter(n) => n.location,
            NodeRef::Template(n) => n.location(),
            NodeRef::Value(n) => n.location,
            NodeRef::Reference(n) => n.location,
            NodeRef::Block(n) => n.location,
            NodeRef::Statement(n) => n.location,
            NodeRef::AltGuard(n) => n.location,
            NodeRef::Attributes(n) => n.location,
        }
    }
}

/// Callback interface of [`walk`].
pub trait AstVisitor {
    fn visit(&mut self, node: NodeRef<'_>) -> VisitAction;

    /// Called after the children of a node were walked.
    fn leave(&mut self, _node: NodeRef<'_>) {}
}

impl<F> AstVisitor for F
where
    F: FnMut(NodeRef<'_>) -> VisitAction,
{
    fn visit(&mut self, node: NodeRef<'_>) -> VisitAction {
        self(node)
    }
}

/// Walk `node` and its descendants in source order.
///
/// Returns `false` when the visitor aborted the walk.
pub fn walk(node: NodeRef<'_>, visitor: &mut impl AstVisitor) -> bool {
    match visitor.visit(node) {
        VisitAction::Abort => return false,
        VisitAction::SkipChildren => {}
        VisitAction::Continue => {
            for child in children(node) {
                if !walk(child, visitor) {
                    return false;
                }
            }
        }
    }
    visitor.leave(node);
    true
}

pub fn walk_module(module: &Module, visitor: &mut impl AstVisitor) -> bool {
    walk(NodeRef::Module(module), visitor)
}

/// Direct children of a node, in source order.
pub fn children(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    let mut out = Vec::new();
    match node {
        NodeRef::Module(module) => {
            for item in &module.items {
                out.push(match item {
                    ModuleItem::Import(n) => NodeRef::Import(n),
                    ModuleItem::Friend(n) => NodeRef::Friend(n),
                    ModuleItem::Definition(n) => NodeRef::Definition(n),
                    ModuleItem::Control(n) => NodeRef::Control(n),
                });
            }
            out.extend(module.with_attributes.as_ref().map(NodeRef::Attributes));
        }
        NodeRef::Import(_)
        | NodeRef::Friend(_)
        | NodeRef::Reference(_)
        | NodeRef::Attributes(_) => {}
        NodeRef::Definition(def) => {
            match &def.kind {
                DefinitionKind::Type(ty) => out.push(NodeRef::Type(ty)),
                DefinitionKind::Const { ty, value } => {
                    out.push(NodeRef::Type(ty));
                    out.push(NodeRef::Value(value));
                }
                DefinitionKind::Template { ty, body } => {
                    out.push(NodeRef::Type(ty));
                    out.push(NodeRef::Template(body));
                }
                DefinitionKind::Function(function) => {
                    out.extend(function.params.iter().map(NodeRef::Parameter));
                    out.extend(function.runs_on.as_ref().map(NodeRef::Reference));
                    out.extend(function.return_type.as_ref().map(NodeRef::Type));
                    out.push(NodeRef::Block(&function.body));
                }
                DefinitionKind::Signature {
                    params,
                    return_type,
                } => {
                    out.extend(params.iter().map(NodeRef::Parameter));
                    out.extend(return_type.as_ref().map(NodeRef::Type));
                }
                DefinitionKind::AnyType => {}
            }
            out.extend(def.with_attributes.as_ref().map(NodeRef::Attributes));
        }
        NodeRef::Control(control) => {
            out.push(NodeRef::Block(&control.block));
            out.extend(control.with_attributes.as_ref().map(NodeRef::Attributes));
        }
        NodeRef::Type(ty) => {
            match &ty.kind {
                TypeKind::Builtin(_) => {}
                TypeKind::Referenced(reference) => out.push(NodeRef::Reference(reference)),
                TypeKind::Selection { of, .. } => out.push(NodeRef::Type(of)),
                TypeKind::Record(fields) | TypeKind::Union(fields) => {
                    out.extend(fields.iter().map(NodeRef::Field));
                }
                TypeKind::Enumerated(_) => {}
                TypeKind::Port(lists) => {
                    out.extend(lists.iter().flat_map(|l| l.types.iter()).map(NodeRef::Type));
                }
                TypeKind::Component(elements) => {
                    out.extend(elements.iter().map(NodeRef::ComponentElement));
                }
            }
            if let Some(constraint) = &ty.constraint {
                out.push(NodeRef::Value(&constraint.lower));
                out.push(NodeRef::Value(&constraint.upper));
            }
        }
        NodeRef::Field(field) => out.push(NodeRef::Type(&field.ty)),
        NodeRef::ComponentElement(element) => {
            out.push(NodeRef::Type(element.kind.ty()));
            match &element.kind {
                ComponentElementKind::Var { init, .. } => {
                    out.extend(init.as_ref().map(NodeRef::Value));
                }
                ComponentElementKind::Const { value, .. } => out.push(NodeRef::Value(value)),
                ComponentElementKind::Port { .. } => {}
            }
        }
        NodeRef::Parameter(param) => out.push(NodeRef::Type(&param.ty)),
        NodeRef::Template(body) => {
            if let TemplateBody::Specific(value) = body {
                out.push(NodeRef::Value(value));
            }
        }
        NodeRef::Value(value) => match &value.kind {
            ValueKind::Reference(reference) => out.push(NodeRef::Reference(reference)),
            ValueKind::Call { function, args } => {
                out.push(NodeRef::Reference(function));
                out.extend(args.iter().map(NodeRef::Value));
            }
            ValueKind::Record(fields) => {
                out.extend(fields.iter().map(|f| NodeRef::Value(&f.value)));
            }
            ValueKind::Unary { operand, .. } => out.push(NodeRef::Value(operand)),
            ValueKind::Binary { lhs, rhs, .. } => {
                out.push(NodeRef::Value(lhs));
                out.push(NodeRef::Value(rhs));
            }
            _ => {}
        },
        NodeRef::Block(block) => out.extend(block.statements.iter().map(NodeRef::Statement)),
        NodeRef::Statement(statement) => match &statement.kind {
            StatementKind::Var { ty, init, .. } => {
                out.push(NodeRef::Type(ty));
                out.extend(init.as_ref().map(NodeRef::Value));
            }
            StatementKind::Assignment { target, value } => {
                out.push(NodeRef::Reference(target));
                out.push(NodeRef::Value(value));
            }
            StatementKind::Alt(guards) | StatementKind::Interleave(guards) => {
                out.extend(guards.guards.iter().map(NodeRef::AltGuard));
            }
            StatementKind::Repeat => {}
            StatementKind::Setverdict(value) | StatementKind::Call(value) => {
                out.push(NodeRef::Value(value));
            }
            StatementKind::Return(value) => out.extend(value.as_ref().map(NodeRef::Value)),
            StatementKind::Block(block) => out.push(NodeRef::Block(block)),
        },
        NodeRef::AltGuard(guard) => {
            if let GuardKind::Guard(Some(value)) = &guard.kind {
                out.push(NodeRef::Value(value));
            }
            if let Some(event) = &guard.event {
                out.push(NodeRef::Reference(&event.port));
                out.extend(event.template.as_ref().map(NodeRef::Value));
            }
            out.push(NodeRef::Block(&guard.block));
        }
    }
    out
}

/// All references below `node`, in source order.
pub fn collect_references(node: NodeRef<'_>) -> Vec<&Reference> {
    fn go<'a>(node: NodeRef<'a>, out: &mut Vec<&'a Reference>) {
        if let NodeRef::Reference(reference) = node {
            out.push(reference);
        }
        for child in children(node) {
            go(child, out);
        }
    }
    let mut out = Vec::new();
    go(node, &mut out);
    out
}

/// Hashes the checkable content of a tree: node kinds, names, modifiers and
/// literal values, but not node ids or locations. Two trees with equal
/// fingerprints describe the same program.
struct Fingerprinter {
    hasher: FxHasher,
}

impl Fingerprinter {
    fn feed(&mut self, value: impl Hash) {
        value.hash(&mut self.hasher);
    }
}

impl AstVisitor for Fingerprinter {
    fn visit(&mut self, node: NodeRef<'_>) -> VisitAction {
        self.feed(std::mem::discriminant(&node));
        match node {
            NodeRef::Module(n) => {
                self.feed(n.identifier.name());
                self.feed(&n.language);
            }
            NodeRef::Import(n) => {
                self.feed(n.identifier.name());
                self.feed(n.visibility);
                self.feed(n.import_of_imports);
            }
            NodeRef::Friend(n) => {
                for module in &n.modules {
                    self.feed(module.name());
                }
            }
            NodeRef::Definition(n) => {
                self.feed(n.identifier.name());
                self.feed(n.visibility);
                self.feed(n.kind_name());
            }
            NodeRef::Control(_) | NodeRef::Block(_) => {}
            NodeRef::Type(n) => match &n.kind {
                TypeKind::Builtin(b) => self.feed(b),
                TypeKind::Selection { alternative, .. } => self.feed(alternative.name()),
                TypeKind::Enumerated(items) => {
                    for item in items {
                        self.feed(item.name());
                    }
                }
                TypeKind::Port(lists) => {
                    for list in lists {
                        self.feed(list.direction);
                        self.feed(list.types.len());
                    }
                }
                other => self.feed(std::mem::discriminant(other)),
            },
            NodeRef::Field(n) => {
                self.feed(n.identifier.name());
                self.feed(n.optional);
            }
            NodeRef::ComponentElement(n) => {
                self.feed(n.identifier.name());
                self.feed(std::mem::discriminant(&n.kind));
            }
            NodeRef::Parameter(n) => {
                self.feed(n.identifier.name());
                self.feed(n.direction);
            }
            NodeRef::Template(n) => self.feed(std::mem::discriminant(n)),
            NodeRef::Value(n) => match &n.kind {
                ValueKind::Integer(i) => self.feed(i),
                ValueKind::Float(f) => self.feed(f.to_bits()),
                ValueKind::Boolean(b) => self.feed(b),
                ValueKind::Charstring(s) | ValueKind::Erroneous(s) => self.feed(s),
                ValueKind::Verdict(v) => self.feed(v),
                ValueKind::Record(fields) => {
                    for field in fields {
                        self.feed(field.identifier.name());
                    }
                }
                ValueKind::Unary { op, .. } => self.feed(op),
                ValueKind::Binary { op, .. } => self.feed(op),
                other => self.feed(std::mem::discriminant(other)),
            },
            NodeRef::Reference(n) => {
                self.feed(n.module.as_ref().map(|m| m.name()));
                self.feed(n.identifier.name());
            }
            NodeRef::Statement(n) => {
                self.feed(std::mem::discriminant(&n.kind));
                if let StatementKind::Var { identifier, .. } = &n.kind {
                    self.feed(identifier.name());
                }
            }
            NodeRef::AltGuard(n) => {
                self.feed(std::mem::discriminant(&n.kind));
                self.feed(n.event.is_some());
            }
            NodeRef::Attributes(n) => {
                for attr in &n.attributes {
                    self.feed(attr.kind);
                    self.feed(attr.is_override);
                    self.feed(&attr.specification);
                }
            }
        }
        VisitAction::Continue
    }

    fn leave(&mut self, _node: NodeRef<'_>) {
        self.feed(u8::MAX);
    }
}

/// Structural fingerprint of a module, independent of node ids and offsets.
pub fn fingerprint(module: &Module) -> u64 {
    let mut fingerprinter = Fingerprinter {
        hasher: FxHasher::default(),
    };
    walk_module(module, &mut fingerprinter);
    fingerprinter.hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;
    use crate::syntax::parse_file;

    fn module(text: &str) -> Module {
        parse_file(FileId::new(0), text).module.expect("module")
    }

    #[test]
    fn test_skip_children_and_abort() {
        let m = module("module M { type integer A; const integer c := 1 + 2; }");
        let mut values = 0;
        walk_module(&m, &mut |node: NodeRef<'_>| match node {
            NodeRef::Definition(d) if d.name() == "c" => VisitAction::SkipChildren,
            NodeRef::Value(_) => {
                values += 1;
                VisitAction::Continue
            }
            _ => VisitAction::Continue,
        });
        assert_eq!(values, 0);

        let mut seen = 0;
        let finished = walk_module(&m, &mut |_node: NodeRef<'_>| {
            seen += 1;
            if seen == 2 { VisitAction::Abort } else { VisitAction::Continue }
        });
        assert!(!finished);
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_collect_references() {
        let m = module("module M { function f() { var T x := g(y, N.z); } }");
        let names: Vec<_> = collect_references(NodeRef::Module(&m))
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(names, vec!["T", "g", "y", "N.z"]);
    }

    #[test]
    fn test_fingerprint_ignores_layout() {
        let a = module("module M { const integer c := 1; }");
        let b = module("module M {\n\n    const integer   c := 1;\n}");
        let c = module("module M { const integer c := 2; }");
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }
}
