//! Lowering from the rowan CST to the owned AST.
//!
//! Locations are file offsets: every CST range is shifted by the base offset
//! of the text that was parsed, so fragments parsed during incremental
//! reparsing land at the right place in the file.
//!
//! Lowering is best effort. Items whose essential parts are missing because
//! of syntax errors are dropped; the syntax errors themselves are reported by
//! the parser.

use indexmap::IndexMap;
use parking_lot::Mutex;
use rowan::TextSize;

use super::ast::*;
use crate::base::{FileId, Identifier, Interner, Location};
use crate::parser::{SyntaxKind, SyntaxNode, SyntaxToken};
use crate::semantic::{CheckState, GenerationStamp};

/// Node kinds that are expressions.
const EXPR_KINDS: &[SyntaxKind] = &[
    SyntaxKind::LITERAL,
    SyntaxKind::REF_EXPR,
    SyntaxKind::CALL_EXPR,
    SyntaxKind::RECORD_EXPR,
    SyntaxKind::PAREN_EXPR,
    SyntaxKind::UNARY_EXPR,
    SyntaxKind::BINARY_EXPR,
];

/// Node kinds that are type specifications.
const TYPE_SPEC_KINDS: &[SyntaxKind] = &[
    SyntaxKind::BUILTIN_TYPE,
    SyntaxKind::TYPE_REF,
    SyntaxKind::SELECTION_TYPE,
];

fn child(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxNode> {
    node.children().find(|c| c.kind() == kind)
}

fn child_of(node: &SyntaxNode, kinds: &[SyntaxKind]) -> Option<SyntaxNode> {
    node.children().find(|c| kinds.contains(&c.kind()))
}

fn token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

fn first_significant_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| !t.kind().is_trivia())
}

/// Strip the quotes of a string literal and undouble embedded quotes.
fn unquote(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    inner.replace("\"\"", "\"")
}

/// Turns CST nodes into AST nodes, allocating node ids as it goes.
pub struct Lowerer {
    file: FileId,
    base: TextSize,
    next_local: u32,
    interner: Interner,
}

impl Lowerer {
    pub fn new(file: FileId, base: u32, next_local: u32) -> Self {
        Self {
            file,
            base: TextSize::new(base),
            next_local,
            interner: Interner::new(),
        }
    }

    /// The first node id not handed out yet.
    pub fn next_local(&self) -> u32 {
        self.next_local
    }

    fn alloc(&mut self) -> NodeId {
        let id = NodeId::new(self.file, self.next_local);
        self.next_local += 1;
        id
    }

    fn loc(&self, node: &SyntaxNode) -> Location {
        Location::new(self.file, node.text_range() + self.base)
    }

    fn token_loc(&self, token: &SyntaxToken) -> Location {
        Location::new(self.file, token.text_range() + self.base)
    }

    fn ident_token(&mut self, token: &SyntaxToken) -> Identifier {
        let name = self.interner.intern(token.text());
        Identifier::ttcn(name, self.token_loc(token))
    }

    fn name(&mut self, node: &SyntaxNode) -> Option<Identifier> {
        let name = child(node, SyntaxKind::NAME)?;
        let ident = token(&name, SyntaxKind::IDENT)?;
        Some(self.ident_token(&ident))
    }

    fn names(&mut self, node: &SyntaxNode) -> Vec<Identifier> {
        node.children()
            .filter(|c| c.kind() == SyntaxKind::NAME)
            .filter_map(|n| token(&n, SyntaxKind::IDENT))
            .map(|t| self.ident_token(&t))
            .collect()
    }

    // =========================================================================
    // Module
    // =========================================================================

    /// Lower the `MODULE` node of a source file root.
    pub fn source_file(&mut self, root: &SyntaxNode) -> Option<Module> {
        let node = child(root, SyntaxKind::MODULE)?;
        self.module(&node)
    }

    fn module(&mut self, node: &SyntaxNode) -> Option<Module> {
        let id = self.alloc();
        let identifier = self.name(node)?;
        let language = token(node, SyntaxKind::STRING).map(|t| unquote(t.text()));
        let body = child(node, SyntaxKind::MODULE_BODY);
        let body_location = body.as_ref().map(|b| self.loc(b)).unwrap_or_else(Location::none);
        let items = body.map(|b| self.module_items(&b)).unwrap_or_default();
        let with_attributes = child(node, SyntaxKind::WITH_STMT).map(|w| self.with_attributes(&w));
        let anytype = Definition {
            id: self.alloc(),
            identifier: Identifier::synthetic(crate::base::constants::ANYTYPE_NAME),
            visibility: Visibility::Public,
            location: Location::none(),
            kind: DefinitionKind::AnyType,
            with_attributes: None,
            state: CheckState::new(),
            generated: GenerationStamp::default(),
        };

        let mut module = Module {
            id,
            identifier,
            location: self.loc(node),
            body_location,
            language,
            items,
            with_attributes,
            anytype,
            state: CheckState::new(),
            import_state: CheckState::new(),
            generated: GenerationStamp::default(),
            missing: Mutex::new(Vec::new()),
            version: Mutex::new(None),
            index: IndexMap::new(),
            next_node: 0,
        };
        module.reindex();
        module.next_node = self.next_local;
        Some(module)
    }

    /// Lower the item children of a module body or a `MODULE_ITEMS` fragment.
    pub fn module_items(&mut self, node: &SyntaxNode) -> Vec<ModuleItem> {
        node.children()
            .filter_map(|item| self.module_item(&item))
            .collect()
    }

    fn module_item(&mut self, node: &SyntaxNode) -> Option<ModuleItem> {
        match node.kind() {
            SyntaxKind::IMPORT_DEF => self.import(node).map(ModuleItem::Import),
            SyntaxKind::FRIEND_DEF => Some(ModuleItem::Friend(FriendDeclaration {
                id: self.alloc(),
                modules: self.names(node),
                location: self.loc(node),
            })),
            SyntaxKind::CONTROL_PART => self.control_part(node).map(ModuleItem::Control),
            SyntaxKind::TYPE_DEF
            | SyntaxKind::CONST_DEF
            | SyntaxKind::TEMPLATE_DEF
            | SyntaxKind::FUNCTION_DEF
            | SyntaxKind::SIGNATURE_DEF => self.definition(node).map(ModuleItem::Definition),
            _ => None,
        }
    }

    fn visibility(&self, node: &SyntaxNode) -> Visibility {
        let Some(vis) = child(node, SyntaxKind::VISIBILITY) else {
            return Visibility::Public;
        };
        match first_significant_token(&vis).map(|t| t.kind()) {
            Some(SyntaxKind::PRIVATE_KW) => Visibility::Private,
            Some(SyntaxKind::FRIEND_KW) => Visibility::Friend,
            _ => Visibility::Public,
        }
    }

    fn import(&mut self, node: &SyntaxNode) -> Option<ImportModule> {
        Some(ImportModule {
            id: self.alloc(),
            identifier: self.name(node)?,
            visibility: self.visibility(node),
            location: self.loc(node),
            import_of_imports: child(node, SyntaxKind::IMPORT_OF_IMPORTS).is_some(),
            state: CheckState::new(),
        })
    }

    fn control_part(&mut self, node: &SyntaxNode) -> Option<ControlPart> {
        Some(ControlPart {
            id: self.alloc(),
            location: self.loc(node),
            block: self.block(&child(node, SyntaxKind::BLOCK)?),
            with_attributes: child(node, SyntaxKind::WITH_STMT).map(|w| self.with_attributes(&w)),
        })
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    /// Lower one definition node (`TYPE_DEF`, `CONST_DEF`, ...).
    pub fn definition(&mut self, node: &SyntaxNode) -> Option<Definition> {
        let id = self.alloc();
        let identifier = self.name(node)?;
        let kind = match node.kind() {
            SyntaxKind::TYPE_DEF => DefinitionKind::Type(self.type_body(node)?),
            SyntaxKind::CONST_DEF => DefinitionKind::Const {
                ty: self.type_spec(&child_of(node, TYPE_SPEC_KINDS)?)?,
                value: self.expr_child(node, node),
            },
            SyntaxKind::TEMPLATE_DEF => DefinitionKind::Template {
                ty: self.type_spec(&child_of(node, TYPE_SPEC_KINDS)?)?,
                body: self.template_body(&child(node, SyntaxKind::TEMPLATE_BODY)?),
            },
            SyntaxKind::FUNCTION_DEF => DefinitionKind::Function(Function {
                params: self.params(node),
                runs_on: child(node, SyntaxKind::RUNS_ON)
                    .and_then(|r| child(&r, SyntaxKind::TYPE_REF))
                    .and_then(|t| child(&t, SyntaxKind::REFERENCE))
                    .map(|r| self.reference(&r)),
                return_type: self.return_type(node),
                body: self.block(&child(node, SyntaxKind::BLOCK)?),
            }),
            SyntaxKind::SIGNATURE_DEF => DefinitionKind::Signature {
                params: self.params(node),
                return_type: self.return_type(node),
            },
            _ => return None,
        };

        Some(Definition {
            id,
            identifier,
            visibility: self.visibility(node),
            location: self.loc(node),
            kind,
            with_attributes: child(node, SyntaxKind::WITH_STMT).map(|w| self.with_attributes(&w)),
            state: CheckState::new(),
            generated: GenerationStamp::default(),
        })
    }

    fn return_type(&mut self, node: &SyntaxNode) -> Option<Type> {
        let ret = child(node, SyntaxKind::RETURN_TYPE)?;
        self.type_spec(&child_of(&ret, TYPE_SPEC_KINDS)?)
    }

    fn params(&mut self, node: &SyntaxNode) -> Vec<FormalParameter> {
        let Some(list) = child(node, SyntaxKind::PARAM_LIST) else {
            return Vec::new();
        };
        list.children()
            .filter(|c| c.kind() == SyntaxKind::PARAM)
            .filter_map(|param| {
                let direction = match first_significant_token(&param).map(|t| t.kind()) {
                    Some(SyntaxKind::OUT_KW) => ParamDirection::Out,
                    Some(SyntaxKind::INOUT_KW) => ParamDirection::Inout,
                    _ => ParamDirection::In,
                };
                Some(FormalParameter {
                    id: self.alloc(),
                    identifier: self.name(&param)?,
                    direction,
                    ty: self.type_spec(&child_of(&param, TYPE_SPEC_KINDS)?)?,
                    location: self.loc(&param),
                })
            })
            .collect()
    }

    fn template_body(&mut self, node: &SyntaxNode) -> TemplateBody {
        let loc = self.loc(node);
        match first_significant_token(node).map(|t| t.kind()) {
            Some(SyntaxKind::QUESTION) => TemplateBody::Any(loc),
            Some(SyntaxKind::STAR) => TemplateBody::AnyOrOmit(loc),
            Some(SyntaxKind::OMIT_KW) => TemplateBody::Omit(loc),
            _ => TemplateBody::Specific(self.expr_child(node, node)),
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn type_body(&mut self, node: &SyntaxNode) -> Option<Type> {
        let structured = [
            (SyntaxKind::RECORD_KW, SyntaxKind::RECORD_BODY),
            (SyntaxKind::UNION_KW, SyntaxKind::UNION_BODY),
            (SyntaxKind::ENUMERATED_KW, SyntaxKind::ENUM_BODY),
            (SyntaxKind::PORT_KW, SyntaxKind::PORT_BODY),
            (SyntaxKind::COMPONENT_KW, SyntaxKind::COMPONENT_BODY),
        ];
        for (keyword, body_kind) in structured {
            let Some(kw) = token(node, keyword) else {
                continue;
            };
            let body = child(node, body_kind)?;
            let id = self.alloc();
            let location = self.token_loc(&kw).cover(&self.loc(&body));
            let kind = match body_kind {
                SyntaxKind::RECORD_BODY => TypeKind::Record(self.fields(&body)),
                SyntaxKind::UNION_BODY => TypeKind::Union(self.fields(&body)),
                SyntaxKind::ENUM_BODY => TypeKind::Enumerated(
                    body.children()
                        .filter(|c| c.kind() == SyntaxKind::ENUM_ITEM)
                        .filter_map(|item| self.name(&item))
                        .collect(),
                ),
                SyntaxKind::PORT_BODY => TypeKind::Port(self.port_lists(&body)),
                _ => TypeKind::Component(self.component_elements(&body)),
            };
            return Some(Type {
                id,
                location,
                kind,
                constraint: None,
                state: CheckState::new(),
            });
        }

        let mut ty = self.type_spec(&child_of(node, TYPE_SPEC_KINDS)?)?;
        if let Some(constraint) = child(node, SyntaxKind::RANGE_CONSTRAINT) {
            let mut bounds = constraint
                .children()
                .filter(|c| EXPR_KINDS.contains(&c.kind()));
            let lower = bounds.next().map(|v| self.expr(&v));
            let upper = bounds.next().map(|v| self.expr(&v));
            let location = self.loc(&constraint);
            ty.constraint = Some(RangeConstraint {
                lower: lower.unwrap_or_else(|| self.erroneous(location)),
                upper: upper.unwrap_or_else(|| self.erroneous(location)),
                location,
            });
        }
        Some(ty)
    }

    /// Lower a `BUILTIN_TYPE`, `TYPE_REF` or `SELECTION_TYPE` node.
    pub fn type_spec(&mut self, node: &SyntaxNode) -> Option<Type> {
        let id = self.alloc();
        let kind = match node.kind() {
            SyntaxKind::BUILTIN_TYPE => {
                let builtin = match first_significant_token(node)?.kind() {
                    SyntaxKind::INTEGER_KW => BuiltinType::Integer,
                    SyntaxKind::FLOAT_KW => BuiltinType::Float,
                    SyntaxKind::BOOLEAN_KW => BuiltinType::Boolean,
                    SyntaxKind::CHARSTRING_KW => BuiltinType::Charstring,
                    SyntaxKind::VERDICTTYPE_KW => BuiltinType::Verdict,
                    _ => return None,
                };
                TypeKind::Builtin(builtin)
            }
            SyntaxKind::TYPE_REF => {
                TypeKind::Referenced(self.reference(&child(node, SyntaxKind::REFERENCE)?))
            }
            SyntaxKind::SELECTION_TYPE => TypeKind::Selection {
                alternative: self.name(node)?,
                of: Box::new(self.type_spec(&child_of(node, TYPE_SPEC_KINDS)?)?),
            },
            _ => return None,
        };
        Some(Type {
            id,
            location: self.loc(node),
            kind,
            constraint: None,
            state: CheckState::new(),
        })
    }

    fn fields(&mut self, body: &SyntaxNode) -> Vec<Field> {
        body.children()
            .filter(|c| c.kind() == SyntaxKind::FIELD)
            .filter_map(|field| {
                Some(Field {
                    id: self.alloc(),
                    identifier: self.name(&field)?,
                    ty: self.type_spec(&child_of(&field, TYPE_SPEC_KINDS)?)?,
                    optional: token(&field, SyntaxKind::OPTIONAL_KW).is_some(),
                    location: self.loc(&field),
                })
            })
            .collect()
    }

    fn port_lists(&mut self, body: &SyntaxNode) -> Vec<PortMessageList> {
        body.children()
            .filter(|c| c.kind() == SyntaxKind::PORT_MESSAGE_LIST)
            .filter_map(|list| {
                let direction = match first_significant_token(&list)?.kind() {
                    SyntaxKind::IN_KW => PortDirection::In,
                    SyntaxKind::OUT_KW => PortDirection::Out,
                    _ => PortDirection::Inout,
                };
                let types = list
                    .children()
                    .filter(|c| TYPE_SPEC_KINDS.contains(&c.kind()))
                    .filter_map(|t| self.type_spec(&t))
                    .collect();
                Some(PortMessageList {
                    direction,
                    types,
                    location: self.loc(&list),
                })
            })
            .collect()
    }

    fn component_elements(&mut self, body: &SyntaxNode) -> Vec<ComponentElement> {
        body.children()
            .filter_map(|element| {
                let id = self.alloc();
                let identifier = self.name(&element)?;
                let ty = self.type_spec(&child_of(&element, TYPE_SPEC_KINDS)?)?;
                let value = child_of(&element, EXPR_KINDS).map(|v| self.expr(&v));
                let kind = match element.kind() {
                    SyntaxKind::COMPONENT_VAR => ComponentElementKind::Var { ty, init: value },
                    SyntaxKind::COMPONENT_PORT => ComponentElementKind::Port { ty },
                    SyntaxKind::COMPONENT_CONST => ComponentElementKind::Const {
                        ty,
                        value: value.unwrap_or_else(|| self.erroneous(self.loc(&element))),
                    },
                    _ => return None,
                };
                Some(ComponentElement {
                    id,
                    identifier,
                    kind,
                    location: self.loc(&element),
                })
            })
            .collect()
    }

    fn reference(&mut self, node: &SyntaxNode) -> Reference {
        let idents: Vec<_> = node
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .collect();
        let id = self.alloc();
        let location = self.loc(node);
        match idents.as_slice() {
            [module, name] => Reference {
                id,
                module: Some(self.ident_token(module)),
                identifier: self.ident_token(name),
                location,
            },
            [name, ..] => Reference {
                id,
                module: None,
                identifier: self.ident_token(name),
                location,
            },
            [] => Reference {
                id,
                module: None,
                identifier: Identifier::ttcn("", location),
                location,
            },
        }
    }

    // =========================================================================
    // Values
    // =========================================================================

    fn erroneous(&mut self, location: Location) -> Value {
        Value {
            id: self.alloc(),
            location,
            kind: ValueKind::Erroneous(String::new()),
        }
    }

    /// The first expression child of `node`, or an erroneous value located
    /// at `fallback` when the parser could not produce one.
    fn expr_child(&mut self, node: &SyntaxNode, fallback: &SyntaxNode) -> Value {
        match child_of(node, EXPR_KINDS) {
            Some(expr) => self.expr(&expr),
            None => {
                let location = self.loc(fallback);
                self.erroneous(location)
            }
        }
    }

    /// Lower an expression node.
    pub fn expr(&mut self, node: &SyntaxNode) -> Value {
        let location = self.loc(node);
        let kind = match node.kind() {
            SyntaxKind::LITERAL => self.literal(node),
            SyntaxKind::REF_EXPR => match child(node, SyntaxKind::REFERENCE) {
                Some(r) => ValueKind::Reference(self.reference(&r)),
                None => ValueKind::Erroneous(node.text().to_string()),
            },
            SyntaxKind::CALL_EXPR => match child(node, SyntaxKind::REFERENCE) {
                Some(r) => {
                    let function = self.reference(&r);
                    let args = child(node, SyntaxKind::ARG_LIST)
                        .map(|list| {
                            list.children()
                                .filter(|c| EXPR_KINDS.contains(&c.kind()))
                                .map(|a| self.expr(&a))
                                .collect()
                        })
                        .unwrap_or_default();
                    ValueKind::Call { function, args }
                }
                None => ValueKind::Erroneous(node.text().to_string()),
            },
            SyntaxKind::RECORD_EXPR => ValueKind::Record(
                node.children()
                    .filter(|c| c.kind() == SyntaxKind::FIELD_ASSIGN)
                    .filter_map(|assign| {
                        Some(FieldValue {
                            identifier: self.name(&assign)?,
                            value: self.expr_child(&assign, &assign),
                            location: self.loc(&assign),
                        })
                    })
                    .collect(),
            ),
            SyntaxKind::PAREN_EXPR => {
                let mut inner = self.expr_child(node, node);
                inner.location = location;
                return inner;
            }
            SyntaxKind::UNARY_EXPR => {
                let op = match first_significant_token(node).map(|t| t.kind()) {
                    Some(SyntaxKind::NOT_KW) => UnaryOp::Not,
                    _ => UnaryOp::Minus,
                };
                ValueKind::Unary {
                    op,
                    operand: Box::new(self.expr_child(node, node)),
                }
            }
            SyntaxKind::BINARY_EXPR => self.binary(node),
            _ => ValueKind::Erroneous(node.text().to_string()),
        };
        Value {
            id: self.alloc(),
            location,
            kind,
        }
    }

    fn literal(&mut self, node: &SyntaxNode) -> ValueKind {
        let Some(tok) = first_significant_token(node) else {
            return ValueKind::Erroneous(String::new());
        };
        let text = tok.text();
        match tok.kind() {
            SyntaxKind::INTEGER => text
                .parse::<i64>()
                .map(ValueKind::Integer)
                .unwrap_or_else(|_| ValueKind::Erroneous(text.to_string())),
            SyntaxKind::FLOAT => text
                .parse::<f64>()
                .map(ValueKind::Float)
                .unwrap_or_else(|_| ValueKind::Erroneous(text.to_string())),
            SyntaxKind::STRING => ValueKind::Charstring(unquote(text)),
            SyntaxKind::TRUE_KW => ValueKind::Boolean(true),
            SyntaxKind::FALSE_KW => ValueKind::Boolean(false),
            SyntaxKind::OMIT_KW => ValueKind::Omit,
            SyntaxKind::PASS_KW => ValueKind::Verdict(Verdict::Pass),
            SyntaxKind::FAIL_KW => ValueKind::Verdict(Verdict::Fail),
            SyntaxKind::INCONC_KW => ValueKind::Verdict(Verdict::Inconc),
            SyntaxKind::NONE_KW => ValueKind::Verdict(Verdict::None),
            SyntaxKind::ERROR_KW => ValueKind::Verdict(Verdict::Error),
            _ => ValueKind::Erroneous(text.to_string()),
        }
    }

    fn binary(&mut self, node: &SyntaxNode) -> ValueKind {
        let op = node
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find_map(|t| match t.kind() {
                SyntaxKind::PLUS => Some(BinaryOp::Add),
                SyntaxKind::MINUS => Some(BinaryOp::Sub),
                SyntaxKind::STAR => Some(BinaryOp::Mul),
                SyntaxKind::SLASH => Some(BinaryOp::Div),
                SyntaxKind::AMP => Some(BinaryOp::Concat),
                SyntaxKind::EQ_EQ => Some(BinaryOp::Eq),
                SyntaxKind::BANG_EQ => Some(BinaryOp::Ne),
                SyntaxKind::LT => Some(BinaryOp::Lt),
                SyntaxKind::GT => Some(BinaryOp::Gt),
                SyntaxKind::LT_EQ => Some(BinaryOp::Le),
                SyntaxKind::GT_EQ => Some(BinaryOp::Ge),
                SyntaxKind::AND_KW => Some(BinaryOp::And),
                SyntaxKind::OR_KW => Some(BinaryOp::Or),
                _ => None,
            });
        let mut operands = node.children().filter(|c| EXPR_KINDS.contains(&c.kind()));
        let lhs = operands.next();
        let rhs = operands.next();
        match (op, lhs, rhs) {
            (Some(op), Some(lhs), Some(rhs)) => ValueKind::Binary {
                op,
                lhs: Box::new(self.expr(&lhs)),
                rhs: Box::new(self.expr(&rhs)),
            },
            _ => ValueKind::Erroneous(node.text().to_string()),
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Lower a `BLOCK` node.
    pub fn block(&mut self, node: &SyntaxNode) -> StatementBlock {
        StatementBlock {
            id: self.alloc(),
            location: self.loc(node),
            statements: self.statements(node),
            state: CheckState::new(),
        }
    }

    /// Lower the statement children of a block or a `STATEMENTS` fragment.
    pub fn statements(&mut self, node: &SyntaxNode) -> Vec<Statement> {
        node.children()
            .filter_map(|stmt| self.statement(&stmt))
            .collect()
    }

    fn statement(&mut self, node: &SyntaxNode) -> Option<Statement> {
        let kind = match node.kind() {
            SyntaxKind::VAR_STMT => StatementKind::Var {
                identifier: self.name(node)?,
                ty: self.type_spec(&child_of(node, TYPE_SPEC_KINDS)?)?,
                init: child_of(node, EXPR_KINDS).map(|v| self.expr(&v)),
            },
            SyntaxKind::ASSIGN_STMT => StatementKind::Assignment {
                target: self.reference(&child(node, SyntaxKind::REFERENCE)?),
                value: self.expr_child(node, node),
            },
            SyntaxKind::ALT_STMT => StatementKind::Alt(self.alt_guards(node)),
            SyntaxKind::INTERLEAVE_STMT => StatementKind::Interleave(self.alt_guards(node)),
            SyntaxKind::REPEAT_STMT => StatementKind::Repeat,
            SyntaxKind::SETVERDICT_STMT => StatementKind::Setverdict(self.expr_child(node, node)),
            SyntaxKind::RETURN_STMT => {
                StatementKind::Return(child_of(node, EXPR_KINDS).map(|v| self.expr(&v)))
            }
            SyntaxKind::BLOCK => StatementKind::Block(self.block(node)),
            SyntaxKind::EXPR_STMT => StatementKind::Call(self.expr_child(node, node)),
            _ => return None,
        };
        Some(Statement {
            id: self.alloc(),
            location: self.loc(node),
            kind,
        })
    }

    fn alt_guards(&mut self, node: &SyntaxNode) -> AltGuards {
        let guards = node
            .children()
            .filter(|c| c.kind() == SyntaxKind::ALT_GUARD)
            .filter_map(|guard| {
                let kind = if token(&guard, SyntaxKind::ELSE_KW).is_some() {
                    GuardKind::Else
                } else {
                    GuardKind::Guard(
                        child(&guard, SyntaxKind::GUARD_EXPR).map(|g| self.expr_child(&g, &g)),
                    )
                };
                let event = child(&guard, SyntaxKind::RECEIVE_EVENT).and_then(|event| {
                    Some(ReceiveEvent {
                        port: self.reference(&child(&event, SyntaxKind::REFERENCE)?),
                        template: child_of(&event, EXPR_KINDS).map(|t| self.expr(&t)),
                        location: self.loc(&event),
                    })
                });
                Some(AltGuard {
                    id: self.alloc(),
                    location: self.loc(&guard),
                    kind,
                    event,
                    block: self.block(&child(&guard, SyntaxKind::BLOCK)?),
                })
            })
            .collect();
        AltGuards { guards }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Lower a `WITH_STMT` node.
    pub fn with_attributes(&mut self, node: &SyntaxNode) -> WithAttributes {
        let attributes = node
            .children()
            .filter(|c| c.kind() == SyntaxKind::WITH_ATTR)
            .filter_map(|attr| {
                let kind = match first_significant_token(&attr)?.kind() {
                    SyntaxKind::ENCODE_KW => AttributeKind::Encode,
                    SyntaxKind::VARIANT_KW => AttributeKind::Variant,
                    SyntaxKind::EXTENSION_KW => AttributeKind::Extension,
                    SyntaxKind::DISPLAY_KW => AttributeKind::Display,
                    SyntaxKind::OPTIONAL_KW => AttributeKind::Optional,
                    _ => return None,
                };
                Some(SingleAttribute {
                    kind,
                    is_override: token(&attr, SyntaxKind::OVERRIDE_KW).is_some(),
                    specification: token(&attr, SyntaxKind::STRING)
                        .map(|s| unquote(s.text()))
                        .unwrap_or_default(),
                    location: self.loc(&attr),
                })
            })
            .collect();
        WithAttributes {
            location: self.loc(node),
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module_file;

    fn lower(text: &str) -> Module {
        let parse = parse_module_file(text);
        assert!(parse.ok(), "{:?}", parse.errors);
        Lowerer::new(FileId::new(0), 0, 0)
            .source_file(&parse.syntax())
            .expect("module")
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""a""b""#), "a\"b");
        assert_eq!(unquote(r#""""#), "");
    }

    #[test]
    fn test_lower_module_header() {
        let module = lower("module M language \"TTCN-3:2016\" { } with { encode \"BER\" }");
        assert_eq!(module.name().as_str(), "M");
        assert_eq!(module.language.as_deref(), Some("TTCN-3:2016"));
        assert_eq!(module.with_attributes.as_ref().map(|w| w.attributes.len()), Some(1));
        assert_eq!(module.anytype.name().as_str(), "anytype");
    }

    #[test]
    fn test_lower_locations_are_tight() {
        let text = "module M {  const integer c := 1;  }";
        let module = lower(text);
        let def = module.definition("c").expect("c");
        let range = def.location.range();
        assert_eq!(&text[range.start().into()..range.end().into()], "const integer c := 1;");
        assert_eq!(def.identifier.location().offset(), 25);
    }

    #[test]
    fn test_lower_visibility_and_imports() {
        let module = lower(
            "module M {
                private import from A all;
                import from B { import all }
                friend module X, Y;
                friend type integer T
            }",
        );
        let imports: Vec<_> = module.imports().collect();
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].visibility, Visibility::Private);
        assert!(!imports[0].import_of_imports);
        assert!(imports[1].import_of_imports);
        assert!(module.is_friend(&"Y".into()));
        assert_eq!(module.definition("T").map(|d| d.visibility), Some(Visibility::Friend));
    }

    #[test]
    fn test_lower_expression_precedence() {
        let module = lower("module M { const integer c := 1 + 2 * 3; }");
        let Some(DefinitionKind::Const { value, .. }) = module.definition("c").map(|d| &d.kind)
        else {
            panic!("expected a constant");
        };
        let ValueKind::Binary { op, rhs, .. } = &value.kind else {
            panic!("expected a binary value");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(rhs.kind, ValueKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_lower_selection_and_constraint() {
        let module = lower("module M { type num < U Sel; type integer Small (0 .. 9) }");
        let sel = module.definition("Sel").and_then(|d| d.declared_type()).expect("Sel");
        assert!(matches!(
            &sel.kind,
            TypeKind::Selection { alternative, .. } if alternative.name() == "num"
        ));
        let small = module.definition("Small").and_then(|d| d.declared_type()).expect("Small");
        assert!(small.constraint.is_some());
    }

    #[test]
    fn test_lower_alt_statement() {
        let module = lower(
            "module M {
                function f() runs on C {
                    alt { [x > 0] p.receive(t) { repeat } [] p.receive { } [else] { } }
                }
            }",
        );
        let function = module.definition("f").and_then(|d| d.function()).expect("f");
        assert!(function.runs_on.is_some());
        let StatementKind::Alt(guards) = &function.body.statements[0].kind else {
            panic!("expected alt");
        };
        assert_eq!(guards.guards.len(), 3);
        assert!(matches!(guards.guards[2].kind, GuardKind::Else));
        assert!(guards.guards[0].event.as_ref().is_some_and(|e| e.template.is_some()));
        assert!(guards.guards[1].event.as_ref().is_some_and(|e| e.template.is_none()));
    }

    #[test]
    fn test_node_ids_are_unique() {
        let module = lower(
            "module M {
                type record R { integer a, boolean b }
                const R r := { a := 1, b := true }
            }",
        );
        let mut ids = Vec::new();
        crate::syntax::walk_module(&module, &mut |node: crate::syntax::NodeRef<'_>| {
            ids.extend(node.id());
            crate::syntax::VisitAction::Continue
        });
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }
}
