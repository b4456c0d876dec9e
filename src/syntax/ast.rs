//! Owned AST for TTCN-3 modules.
//!
//! Nodes are plain data plus the memoization state of the checkable ones.
//! Cross references (a type naming another type, a call naming a function)
//! are [`Reference`]s resolved through scope lookup, never pointers.

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::base::{FileId, Identifier, Location, Name};
use crate::semantic::{CheckState, GenerationStamp};

/// Identity of a node, stable across clones of its module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub file: FileId,
    pub local: u32,
}

impl NodeId {
    pub fn new(file: FileId, local: u32) -> Self {
        Self { file, local }
    }
}

/// Visibility modifier of module-level definitions and imports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Public,
    Friend,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Friend => "friend",
            Visibility::Private => "private",
        }
    }
}

// ============================================================================
// MODULE
// ============================================================================

/// A top-level compilation unit.
#[derive(Debug)]
pub struct Module {
    pub id: NodeId,
    pub identifier: Identifier,
    /// From `module` up to the end of the trailing `with` clause.
    pub location: Location,
    /// The `{ ... }` body including braces.
    pub body_location: Location,
    pub language: Option<String>,
    pub items: Vec<ModuleItem>,
    pub with_attributes: Option<WithAttributes>,
    /// Synthetic `anytype` definition owned by every module.
    pub anytype: Definition,
    pub state: CheckState,
    pub import_state: CheckState,
    pub generated: GenerationStamp,
    pub(crate) missing: Mutex<Vec<Reference>>,
    pub(crate) version: Mutex<Option<Name>>,
    /// First definition with each name, in declaration order.
    pub(crate) index: IndexMap<Name, usize>,
    pub(crate) next_node: u32,
}

impl Module {
    pub fn name(&self) -> &Name {
        self.identifier.name()
    }

    pub fn file(&self) -> FileId {
        self.id.file
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportModule> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::Import(import) => Some(import),
            _ => None,
        })
    }

    pub fn friend_declarations(&self) -> impl Iterator<Item = &FriendDeclaration> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::Friend(friend) => Some(friend),
            _ => None,
        })
    }

    /// Names of all modules declared as friends of this module.
    pub fn friend_names(&self) -> impl Iterator<Item = &Identifier> {
        self.friend_declarations().flat_map(|f| f.modules.iter())
    }

    pub fn is_friend(&self, module: &Name) -> bool {
        self.friend_names().any(|friend| friend.name() == module)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::Definition(def) => Some(def),
            _ => None,
        })
    }

    pub fn control_parts(&self) -> impl Iterator<Item = &ControlPart> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::Control(control) => Some(control),
            _ => None,
        })
    }

    /// The first local definition called `name`.
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        let idx = *self.index.get(name)?;
        match self.items.get(idx) {
            Some(ModuleItem::Definition(def)) => Some(def),
            _ => None,
        }
    }

    /// Rebuild the name index after the item list changed.
    pub(crate) fn reindex(&mut self) {
        self.index.clear();
        for (idx, item) in self.items.iter().enumerate() {
            if let ModuleItem::Definition(def) = item {
                self.index.entry(def.identifier.name().clone()).or_insert(idx);
            }
        }
    }

    /// References that failed to resolve during the last check.
    pub fn missing_references(&self) -> Vec<Reference> {
        self.missing.lock().clone()
    }

    /// Module version set by an `extension "version ..."` attribute.
    pub fn version(&self) -> Option<Name> {
        self.version.lock().clone()
    }

    pub(crate) fn alloc_id(&mut self) -> NodeId {
        let id = NodeId::new(self.id.file, self.next_node);
        self.next_node += 1;
        id
    }

    pub fn full_name(&self) -> String {
        format!("@{}", self.identifier.display_name())
    }
}

impl Clone for Module {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            identifier: self.identifier.clone(),
            location: self.location,
            body_location: self.body_location,
            language: self.language.clone(),
            items: self.items.clone(),
            with_attributes: self.with_attributes.clone(),
            anytype: self.anytype.clone(),
            state: self.state.clone(),
            import_state: self.import_state.clone(),
            generated: self.generated.clone(),
            missing: Mutex::new(self.missing.lock().clone()),
            version: Mutex::new(self.version.lock().clone()),
            index: self.index.clone(),
            next_node: self.next_node,
        }
    }
}

/// One entry of a module body.
#[derive(Clone, Debug)]
pub enum ModuleItem {
    Import(ImportModule),
    Friend(FriendDeclaration),
    Definition(Definition),
    Control(ControlPart),
}

impl ModuleItem {
    pub fn location(&self) -> Location {
        match self {
            ModuleItem::Import(import) => import.location,
            ModuleItem::Friend(friend) => friend.location,
            ModuleItem::Definition(def) => def.location,
            ModuleItem::Control(control) => control.location,
        }
    }
}

/// `import from X all;` or `import from X { import all };`
#[derive(Clone, Debug)]
pub struct ImportModule {
    pub id: NodeId,
    pub identifier: Identifier,
    pub visibility: Visibility,
    pub location: Location,
    /// Whether the imports of the target module are imported too.
    pub import_of_imports: bool,
    pub state: CheckState,
}

/// `friend module A, B;`
#[derive(Clone, Debug)]
pub struct FriendDeclaration {
    pub id: NodeId,
    pub modules: Vec<Identifier>,
    pub location: Location,
}

/// `control { ... }`
#[derive(Clone, Debug)]
pub struct ControlPart {
    pub id: NodeId,
    pub location: Location,
    pub block: StatementBlock,
    pub with_attributes: Option<WithAttributes>,
}

// ============================================================================
// DEFINITIONS
// ============================================================================

/// A named module-level declaration.
#[derive(Clone, Debug)]
pub struct Definition {
    pub id: NodeId,
    pub identifier: Identifier,
    pub visibility: Visibility,
    pub location: Location,
    pub kind: DefinitionKind,
    pub with_attributes: Option<WithAttributes>,
    pub state: CheckState,
    pub generated: GenerationStamp,
}

impl Definition {
    pub fn name(&self) -> &Name {
        self.identifier.name()
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            DefinitionKind::Type(_) => "type",
            DefinitionKind::Const { .. } => "constant",
            DefinitionKind::Template { .. } => "template",
            DefinitionKind::Function(_) => "function",
            DefinitionKind::Signature { .. } => "signature",
            DefinitionKind::AnyType => "type",
        }
    }

    /// The type a definition denotes or produces, if any.
    pub fn declared_type(&self) -> Option<&Type> {
        match &self.kind {
            DefinitionKind::Type(ty) => Some(ty),
            DefinitionKind::Const { ty, .. } | DefinitionKind::Template { ty, .. } => Some(ty),
            DefinitionKind::Function(function) => function.return_type.as_ref(),
            DefinitionKind::Signature { return_type, .. } => return_type.as_ref(),
            DefinitionKind::AnyType => None,
        }
    }

    pub fn function(&self) -> Option<&Function> {
        match &self.kind {
            DefinitionKind::Function(function) => Some(function),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum DefinitionKind {
    Type(Type),
    Const { ty: Type, value: Value },
    Template { ty: Type, body: TemplateBody },
    Function(Function),
    Signature {
        params: Vec<FormalParameter>,
        return_type: Option<Type>,
    },
    /// The synthetic `anytype` of a module.
    AnyType,
}

#[derive(Clone, Debug)]
pub struct Function {
    pub params: Vec<FormalParameter>,
    pub runs_on: Option<Reference>,
    pub return_type: Option<Type>,
    pub body: StatementBlock,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParamDirection {
    #[default]
    In,
    Out,
    Inout,
}

#[derive(Clone, Debug)]
pub struct FormalParameter {
    pub id: NodeId,
    pub identifier: Identifier,
    pub direction: ParamDirection,
    pub ty: Type,
    pub location: Location,
}

/// Right-hand side of a template definition.
#[derive(Clone, Debug)]
pub enum TemplateBody {
    /// `?`
    Any(Location),
    /// `*`
    AnyOrOmit(Location),
    Omit(Location),
    Specific(Value),
}

impl TemplateBody {
    pub fn location(&self) -> Location {
        match self {
            TemplateBody::Any(loc) | TemplateBody::AnyOrOmit(loc) | TemplateBody::Omit(loc) => *loc,
            TemplateBody::Specific(value) => value.location,
        }
    }
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Clone, Debug)]
pub struct Type {
    pub id: NodeId,
    pub location: Location,
    pub kind: TypeKind,
    pub constraint: Option<RangeConstraint>,
    pub state: CheckState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Integer,
    Float,
    Boolean,
    Charstring,
    Verdict,
    Anytype,
}

impl BuiltinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinType::Integer => "integer",
            BuiltinType::Float => "float",
            BuiltinType::Boolean => "boolean",
            BuiltinType::Charstring => "charstring",
            BuiltinType::Verdict => "verdicttype",
            BuiltinType::Anytype => "anytype",
        }
    }
}

#[derive(Clone, Debug)]
pub enum TypeKind {
    Builtin(BuiltinType),
    Referenced(Reference),
    /// `alternative < of`: the type of one alternative of a union.
    Selection {
        alternative: Identifier,
        of: Box<Type>,
    },
    Record(Vec<Field>),
    Union(Vec<Field>),
    Enumerated(Vec<Identifier>),
    Port(Vec<PortMessageList>),
    Component(Vec<ComponentElement>),
}

#[derive(Clone, Debug)]
pub struct Field {
    pub id: NodeId,
    pub identifier: Identifier,
    pub ty: Type,
    pub optional: bool,
    pub location: Location,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortDirection {
    In,
    Out,
    Inout,
}

#[derive(Clone, Debug)]
pub struct PortMessageList {
    pub direction: PortDirection,
    pub types: Vec<Type>,
    pub location: Location,
}

#[derive(Clone, Debug)]
pub struct ComponentElement {
    pub id: NodeId,
    pub identifier: Identifier,
    pub kind: ComponentElementKind,
    pub location: Location,
}

#[derive(Clone, Debug)]
pub enum ComponentElementKind {
    Var { ty: Type, init: Option<Value> },
    Port { ty: Type },
    Const { ty: Type, value: Value },
}

impl ComponentElementKind {
    pub fn ty(&self) -> &Type {
        match self {
            ComponentElementKind::Var { ty, .. }
            | ComponentElementKind::Port { ty }
            | ComponentElementKind::Const { ty, .. } => ty,
        }
    }
}

/// `(lower .. upper)`
#[derive(Clone, Debug)]
pub struct RangeConstraint {
    pub lower: Value,
    pub upper: Value,
    pub location: Location,
}

// ============================================================================
// VALUES
// ============================================================================

#[derive(Clone, Debug)]
pub struct Value {
    pub id: NodeId,
    pub location: Location,
    pub kind: ValueKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass,
    Fail,
    Inconc,
    None,
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Inconc => "inconc",
            Verdict::None => "none",
            Verdict::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Minus,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Concat,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Concat => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Clone, Debug)]
pub enum ValueKind {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Charstring(String),
    Verdict(Verdict),
    Omit,
    Reference(Reference),
    Call { function: Reference, args: Vec<Value> },
    Record(Vec<FieldValue>),
    Unary { op: UnaryOp, operand: Box<Value> },
    Binary { op: BinaryOp, lhs: Box<Value>, rhs: Box<Value> },
    /// Text that could not be turned into a value, such as an integer
    /// literal out of range or a missing operand.
    Erroneous(String),
}

#[derive(Clone, Debug)]
pub struct FieldValue {
    pub identifier: Identifier,
    pub value: Value,
    pub location: Location,
}

/// A possibly module-qualified name: `x` or `M.x`.
#[derive(Clone, Debug)]
pub struct Reference {
    pub id: NodeId,
    pub module: Option<Identifier>,
    pub identifier: Identifier,
    pub location: Location,
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.module {
            Some(module) => {
                write!(f, "{}.{}", module.display_name(), self.identifier.display_name())
            }
            None => write!(f, "{}", self.identifier.display_name()),
        }
    }
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Clone, Debug)]
pub struct StatementBlock {
    pub id: NodeId,
    /// The `{ ... }` including braces.
    pub location: Location,
    pub statements: Vec<Statement>,
    pub state: CheckState,
}

#[derive(Clone, Debug)]
pub struct Statement {
    pub id: NodeId,
    pub location: Location,
    pub kind: StatementKind,
}

#[derive(Clone, Debug)]
pub enum StatementKind {
    Var {
        identifier: Identifier,
        ty: Type,
        init: Option<Value>,
    },
    Assignment { target: Reference, value: Value },
    Alt(AltGuards),
    Interleave(AltGuards),
    Repeat,
    Setverdict(Value),
    Return(Option<Value>),
    /// An expression evaluated for its effect, normally a function call.
    Call(Value),
    Block(StatementBlock),
}

impl StatementKind {
    pub fn statement_name(&self) -> &'static str {
        match self {
            StatementKind::Var { .. } => "variable definition",
            StatementKind::Assignment { .. } => "assignment",
            StatementKind::Alt(_) => "alt",
            StatementKind::Interleave(_) => "interleave",
            StatementKind::Repeat => "repeat",
            StatementKind::Setverdict(_) => "setverdict",
            StatementKind::Return(_) => "return",
            StatementKind::Call(_) => "function call",
            StatementKind::Block(_) => "statement block",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AltGuards {
    pub guards: Vec<AltGuard>,
}

#[derive(Clone, Debug)]
pub struct AltGuard {
    pub id: NodeId,
    pub location: Location,
    pub kind: GuardKind,
    pub event: Option<ReceiveEvent>,
    pub block: StatementBlock,
}

#[derive(Clone, Debug)]
pub enum GuardKind {
    /// `[else]`
    Else,
    /// `[expr]` or `[]`
    Guard(Option<Value>),
}

/// `port.receive` or `port.receive(template)`
#[derive(Clone, Debug)]
pub struct ReceiveEvent {
    pub port: Reference,
    pub template: Option<Value>,
    pub location: Location,
}

/// Whether control flow reaching the end of a construct has returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReturnStatus {
    No,
    Maybe,
    Yes,
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

#[derive(Clone, Debug)]
pub struct WithAttributes {
    pub location: Location,
    pub attributes: Vec<SingleAttribute>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Encode,
    Variant,
    Extension,
    Display,
    Optional,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::Encode => "encode",
            AttributeKind::Variant => "variant",
            AttributeKind::Extension => "extension",
            AttributeKind::Display => "display",
            AttributeKind::Optional => "optional",
        }
    }
}

#[derive(Clone, Debug)]
pub struct SingleAttribute {
    pub kind: AttributeKind,
    pub is_override: bool,
    pub specification: String,
    pub location: Location,
}
