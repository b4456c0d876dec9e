//! Recursive descent parser for TTCN-3
//!
//! Builds a rowan GreenNode tree from tokens.
//! Supports error recovery and produces a lossless CST.
//!
//! Besides whole files, the parser exposes fragment entry points used by the
//! incremental reparser: a list of module items, a list of statements and an
//! optional trailing `with` clause. Fragment trees are rooted at offset zero;
//! syntax error ranges are reported in file coordinates using the base offset
//! supplied by the caller.

use super::lexer::{Lexer, Token};
use super::syntax_kind::SyntaxKind;
use rowan::{GreenNode, GreenNodeBuilder, TextRange, TextSize};

/// Parse result containing the green tree and any errors
#[derive(Debug, Clone)]
pub struct Parse {
    pub green: GreenNode,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Get the root syntax node
    pub fn syntax(&self) -> super::SyntaxNode {
        super::SyntaxNode::new_root(self.green.clone())
    }

    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A syntax error with location and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parse a TTCN-3 source file holding one module into a CST
pub fn parse_module_file(input: &str) -> Parse {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(&tokens, 0);
    parser.parse_source_file();
    parser.finish()
}

/// Parse the inside of a module body: imports, friend declarations,
/// definitions and control parts, up to the end of input.
pub fn parse_module_items(input: &str, base: u32) -> Parse {
    let tokens: Vec<_> = Lexer::with_offset(input, base).collect();
    let mut parser = Parser::new(&tokens, base);
    parser.parse_fragment(SyntaxKind::MODULE_ITEMS, |p| p.parse_module_item());
    parser.finish()
}

/// Parse a sequence of statements, up to the end of input.
pub fn parse_statements(input: &str, base: u32) -> Parse {
    let tokens: Vec<_> = Lexer::with_offset(input, base).collect();
    let mut parser = Parser::new(&tokens, base);
    parser.parse_fragment(SyntaxKind::STATEMENTS, |p| p.parse_statement());
    parser.finish()
}

/// Parse text following a module: either nothing or one `with` clause,
/// optionally followed by a semicolon.
pub fn parse_optional_with(input: &str, base: u32) -> Parse {
    let tokens: Vec<_> = Lexer::with_offset(input, base).collect();
    let mut parser = Parser::new(&tokens, base);
    parser.builder.start_node(SyntaxKind::SOURCE_FILE.into());
    if parser.at(SyntaxKind::WITH_KW) {
        parser.parse_with_statement();
    }
    parser.eat(SyntaxKind::SEMICOLON);
    if !parser.at_eof() {
        parser.error_recover("expected end of input after module", &[]);
    }
    parser.skip_trivia();
    parser.builder.finish_node();
    parser.finish()
}

/// Tokens that may start a module item
const ITEM_START: &[SyntaxKind] = &[
    SyntaxKind::PUBLIC_KW,
    SyntaxKind::PRIVATE_KW,
    SyntaxKind::FRIEND_KW,
    SyntaxKind::IMPORT_KW,
    SyntaxKind::TYPE_KW,
    SyntaxKind::CONST_KW,
    SyntaxKind::TEMPLATE_KW,
    SyntaxKind::FUNCTION_KW,
    SyntaxKind::SIGNATURE_KW,
    SyntaxKind::CONTROL_KW,
];

/// Tokens that may start a statement
const STATEMENT_START: &[SyntaxKind] = &[
    SyntaxKind::VAR_KW,
    SyntaxKind::ALT_KW,
    SyntaxKind::INTERLEAVE_KW,
    SyntaxKind::REPEAT_KW,
    SyntaxKind::SETVERDICT_KW,
    SyntaxKind::RETURN_KW,
    SyntaxKind::L_BRACE,
    SyntaxKind::IDENT,
];

/// The parser state
struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    base: u32,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>], base: u32) -> Self {
        Self {
            tokens,
            pos: 0,
            base,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn finish(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection (trivia is transparent)
    // =========================================================================

    fn nth_index(&self, n: usize) -> Option<usize> {
        let mut count = 0;
        for (idx, token) in self.tokens.iter().enumerate().skip(self.pos) {
            if token.kind.is_trivia() {
                continue;
            }
            if count == n {
                return Some(idx);
            }
            count += 1;
        }
        None
    }

    fn nth(&self, n: usize) -> SyntaxKind {
        self.nth_index(n)
            .map(|idx| self.tokens[idx].kind)
            .unwrap_or(SyntaxKind::__LAST)
    }

    fn current_kind(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current_kind() == kind
    }

    fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.current_kind())
    }

    fn at_eof(&self) -> bool {
        self.nth_index(0).is_none()
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn skip_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_trivia() {
                break;
            }
            self.builder.token(token.kind.into(), token.text);
            self.pos += 1;
        }
    }

    /// Consume the next significant token together with the trivia before it
    fn bump(&mut self) {
        self.skip_trivia();
        if let Some(token) = self.tokens.get(self.pos) {
            self.builder.token(token.kind.into(), token.text);
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(format!("expected {:?}, found {:?}", kind, self.current_kind()));
            false
        }
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn error(&mut self, message: impl Into<String>) {
        let range = match self.nth_index(0) {
            Some(idx) => {
                let token = &self.tokens[idx];
                TextRange::at(token.offset, TextSize::of(token.text))
            }
            None => {
                let end = self
                    .tokens
                    .last()
                    .map(|t| t.offset + TextSize::of(t.text))
                    .unwrap_or_else(|| TextSize::new(self.base));
                TextRange::empty(end)
            }
        };
        self.errors.push(SyntaxError::new(message, range));
    }

    fn error_recover(&mut self, message: impl Into<String>, recovery: &[SyntaxKind]) {
        self.error(message);
        self.start_node(SyntaxKind::ERROR);
        // Always consume at least one token to make progress
        let mut consumed = false;
        while !self.at_eof() && !self.at_any(recovery) {
            self.bump();
            consumed = true;
        }
        if !consumed && !self.at_eof() {
            self.bump();
        }
        self.finish_node();
    }

    // =========================================================================
    // Node building helpers
    // =========================================================================

    /// Leading trivia belongs to the parent, so nodes start at their first token
    fn start_node(&mut self, kind: SyntaxKind) {
        self.skip_trivia();
        self.builder.start_node(kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> rowan::Checkpoint {
        self.skip_trivia();
        self.builder.checkpoint()
    }

    fn start_node_at(&mut self, checkpoint: rowan::Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn parse_name(&mut self) -> bool {
        if self.at(SyntaxKind::IDENT) {
            self.start_node(SyntaxKind::NAME);
            self.bump();
            self.finish_node();
            true
        } else {
            self.error(format!("expected identifier, found {:?}", self.current_kind()));
            false
        }
    }

    // =========================================================================
    // Grammar rules: files and fragments
    // =========================================================================

    /// SourceFile = Module
    fn parse_source_file(&mut self) {
        self.builder.start_node(SyntaxKind::SOURCE_FILE.into());

        if self.at(SyntaxKind::MODULE_KW) {
            self.parse_module();
        } else {
            self.error("expected a module");
        }
        while !self.at_eof() {
            self.error_recover("unexpected content after module", &[]);
        }
        self.skip_trivia();

        self.builder.finish_node();
    }

    fn parse_fragment(&mut self, root: SyntaxKind, mut item: impl FnMut(&mut Self)) {
        self.builder.start_node(root.into());
        while !self.at_eof() {
            let pos_before = self.pos;
            if self.eat(SyntaxKind::SEMICOLON) {
                continue;
            }
            item(self);
            if self.pos == pos_before && !self.at_eof() {
                self.error(format!("stuck on token: {:?}", self.current_kind()));
                self.bump();
            }
        }
        self.skip_trivia();
        self.builder.finish_node();
    }

    /// Module = 'module' Name ('language' STRING)? ModuleBody WithStatement? ';'?
    fn parse_module(&mut self) {
        self.start_node(SyntaxKind::MODULE);
        self.expect(SyntaxKind::MODULE_KW);
        self.parse_name();
        if self.eat(SyntaxKind::LANGUAGE_KW) {
            self.expect(SyntaxKind::STRING);
        }
        self.parse_module_body();
        if self.at(SyntaxKind::WITH_KW) {
            self.parse_with_statement();
        }
        self.eat(SyntaxKind::SEMICOLON);
        self.finish_node();
    }

    /// ModuleBody = '{' (ModuleItem ';'?)* '}'
    fn parse_module_body(&mut self) {
        self.start_node(SyntaxKind::MODULE_BODY);
        if self.expect(SyntaxKind::L_BRACE) {
            while !self.at_eof() && !self.at(SyntaxKind::R_BRACE) {
                let pos_before = self.pos;
                if self.eat(SyntaxKind::SEMICOLON) {
                    continue;
                }
                self.parse_module_item();
                if self.pos == pos_before && !self.at_eof() {
                    self.bump();
                }
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    /// ModuleItem = Visibility? (Import | Type | Const | Template | Function | Signature)
    ///            | FriendModule | ControlPart
    fn parse_module_item(&mut self) {
        let kind = self.current_kind();
        if kind == SyntaxKind::FRIEND_KW && self.nth(1) == SyntaxKind::MODULE_KW {
            self.parse_friend_module();
            return;
        }
        if kind == SyntaxKind::CONTROL_KW {
            self.parse_control_part();
            return;
        }

        let visible_kind = if matches!(
            kind,
            SyntaxKind::PUBLIC_KW | SyntaxKind::PRIVATE_KW | SyntaxKind::FRIEND_KW
        ) {
            self.nth(1)
        } else {
            kind
        };

        match visible_kind {
            SyntaxKind::IMPORT_KW => self.parse_import(),
            SyntaxKind::TYPE_KW => self.parse_type_def(),
            SyntaxKind::CONST_KW => self.parse_const_def(),
            SyntaxKind::TEMPLATE_KW => self.parse_template_def(),
            SyntaxKind::FUNCTION_KW => self.parse_function_def(),
            SyntaxKind::SIGNATURE_KW => self.parse_signature_def(),
            _ => {
                let mut recovery = ITEM_START.to_vec();
                recovery.push(SyntaxKind::R_BRACE);
                recovery.push(SyntaxKind::SEMICOLON);
                self.error_recover(
                    format!("expected a module definition, found {:?}", kind),
                    &recovery,
                );
            }
        }
    }

    /// Visibility = 'public' | 'private' | 'friend'
    fn parse_visibility(&mut self) {
        if self.at_any(&[
            SyntaxKind::PUBLIC_KW,
            SyntaxKind::PRIVATE_KW,
            SyntaxKind::FRIEND_KW,
        ]) {
            self.start_node(SyntaxKind::VISIBILITY);
            self.bump();
            self.finish_node();
        }
    }

    /// Import = Visibility? 'import' 'from' Name ('all' | '{' 'import' 'all' '}') ';'?
    fn parse_import(&mut self) {
        self.start_node(SyntaxKind::IMPORT_DEF);
        self.parse_visibility();
        self.expect(SyntaxKind::IMPORT_KW);
        self.expect(SyntaxKind::FROM_KW);
        self.parse_name();
        if !self.eat(SyntaxKind::ALL_KW) {
            if self.eat(SyntaxKind::L_BRACE) {
                self.start_node(SyntaxKind::IMPORT_OF_IMPORTS);
                self.expect(SyntaxKind::IMPORT_KW);
                self.expect(SyntaxKind::ALL_KW);
                self.finish_node();
                self.expect(SyntaxKind::R_BRACE);
            } else {
                self.error("expected 'all' or an import specification");
            }
        }
        self.eat(SyntaxKind::SEMICOLON);
        self.finish_node();
    }

    /// FriendModule = 'friend' 'module' Name (',' Name)* ';'?
    fn parse_friend_module(&mut self) {
        self.start_node(SyntaxKind::FRIEND_DEF);
        self.expect(SyntaxKind::FRIEND_KW);
        self.expect(SyntaxKind::MODULE_KW);
        self.parse_name();
        while self.eat(SyntaxKind::COMMA) {
            self.parse_name();
        }
        self.eat(SyntaxKind::SEMICOLON);
        self.finish_node();
    }

    /// ControlPart = 'control' Block WithStatement? ';'?
    fn parse_control_part(&mut self) {
        self.start_node(SyntaxKind::CONTROL_PART);
        self.expect(SyntaxKind::CONTROL_KW);
        self.parse_block();
        if self.at(SyntaxKind::WITH_KW) {
            self.parse_with_statement();
        }
        self.eat(SyntaxKind::SEMICOLON);
        self.finish_node();
    }

    // =========================================================================
    // Grammar rules: definitions
    // =========================================================================

    /// TypeDef = Visibility? 'type' TypeBody WithStatement? ';'?
    fn parse_type_def(&mut self) {
        self.start_node(SyntaxKind::TYPE_DEF);
        self.parse_visibility();
        self.expect(SyntaxKind::TYPE_KW);
        match self.current_kind() {
            SyntaxKind::RECORD_KW => {
                self.bump();
                self.parse_name();
                self.parse_field_list(SyntaxKind::RECORD_BODY);
            }
            SyntaxKind::UNION_KW => {
                self.bump();
                self.parse_name();
                self.parse_field_list(SyntaxKind::UNION_BODY);
            }
            SyntaxKind::ENUMERATED_KW => {
                self.bump();
                self.parse_name();
                self.parse_enum_body();
            }
            SyntaxKind::PORT_KW => {
                self.bump();
                self.parse_name();
                self.expect(SyntaxKind::MESSAGE_KW);
                self.parse_port_body();
            }
            SyntaxKind::COMPONENT_KW => {
                self.bump();
                self.parse_name();
                self.parse_component_body();
            }
            SyntaxKind::IDENT if self.nth(1) == SyntaxKind::LT => {
                self.parse_selection_type();
                self.parse_name();
            }
            _ => {
                self.parse_type_spec();
                self.parse_name();
                if self.at(SyntaxKind::L_PAREN) {
                    self.parse_range_constraint();
                }
            }
        }
        if self.at(SyntaxKind::WITH_KW) {
            self.parse_with_statement();
        }
        self.eat(SyntaxKind::SEMICOLON);
        self.finish_node();
    }

    /// TypeSpec = BuiltinType | TypeRef
    fn parse_type_spec(&mut self) {
        let kind = self.current_kind();
        if kind.is_builtin_type() {
            self.start_node(SyntaxKind::BUILTIN_TYPE);
            self.bump();
            self.finish_node();
        } else if kind == SyntaxKind::IDENT && self.nth(1) == SyntaxKind::LT {
            self.parse_selection_type();
        } else if kind == SyntaxKind::IDENT {
            self.start_node(SyntaxKind::TYPE_REF);
            self.parse_reference();
            self.finish_node();
        } else {
            self.error(format!("expected a type, found {:?}", kind));
        }
    }

    /// SelectionType = Name '<' TypeSpec
    fn parse_selection_type(&mut self) {
        self.start_node(SyntaxKind::SELECTION_TYPE);
        self.parse_name();
        self.expect(SyntaxKind::LT);
        self.parse_type_spec();
        self.finish_node();
    }

    /// Reference = IDENT ('.' IDENT)?
    fn parse_reference(&mut self) {
        self.start_node(SyntaxKind::REFERENCE);
        self.expect(SyntaxKind::IDENT);
        if self.at(SyntaxKind::DOT) && self.nth(1) == SyntaxKind::IDENT {
            self.bump();
            self.bump();
        }
        self.finish_node();
    }

    /// RangeConstraint = '(' Expression '..' Expression ')'
    fn parse_range_constraint(&mut self) {
        self.start_node(SyntaxKind::RANGE_CONSTRAINT);
        self.expect(SyntaxKind::L_PAREN);
        self.parse_expression();
        self.expect(SyntaxKind::DOT_DOT);
        self.parse_expression();
        self.expect(SyntaxKind::R_PAREN);
        self.finish_node();
    }

    /// FieldList = '{' (Field (',' Field)*)? '}'
    /// Field = TypeSpec Name 'optional'?
    fn parse_field_list(&mut self, kind: SyntaxKind) {
        self.start_node(kind);
        if self.expect(SyntaxKind::L_BRACE) {
            while !self.at_eof() && !self.at(SyntaxKind::R_BRACE) {
                self.start_node(SyntaxKind::FIELD);
                self.parse_type_spec();
                self.parse_name();
                self.eat(SyntaxKind::OPTIONAL_KW);
                self.finish_node();
                if !self.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
            if !self.at(SyntaxKind::R_BRACE) {
                self.error_recover("expected ',' or '}' in field list", &[SyntaxKind::R_BRACE]);
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    /// EnumBody = '{' Name (',' Name)* '}'
    fn parse_enum_body(&mut self) {
        self.start_node(SyntaxKind::ENUM_BODY);
        if self.expect(SyntaxKind::L_BRACE) {
            while self.at(SyntaxKind::IDENT) {
                self.start_node(SyntaxKind::ENUM_ITEM);
                self.parse_name();
                self.finish_node();
                if !self.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
            if !self.at(SyntaxKind::R_BRACE) {
                self.error_recover("expected ',' or '}' in enumeration", &[SyntaxKind::R_BRACE]);
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    /// PortBody = '{' (('in' | 'out' | 'inout') TypeSpec (',' TypeSpec)* ';'?)* '}'
    fn parse_port_body(&mut self) {
        self.start_node(SyntaxKind::PORT_BODY);
        if self.expect(SyntaxKind::L_BRACE) {
            while self.at_any(&[SyntaxKind::IN_KW, SyntaxKind::OUT_KW, SyntaxKind::INOUT_KW]) {
                self.start_node(SyntaxKind::PORT_MESSAGE_LIST);
                self.bump();
                self.parse_type_spec();
                while self.eat(SyntaxKind::COMMA) {
                    self.parse_type_spec();
                }
                self.finish_node();
                self.eat(SyntaxKind::SEMICOLON);
            }
            if !self.at(SyntaxKind::R_BRACE) {
                self.error_recover("expected a message list or '}'", &[SyntaxKind::R_BRACE]);
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    /// ComponentBody = '{' (ComponentElement ';'?)* '}'
    /// ComponentElement = 'var' TypeSpec Name (':=' Expression)?
    ///                  | 'port' TypeSpec Name
    ///                  | 'const' TypeSpec Name ':=' Expression
    fn parse_component_body(&mut self) {
        self.start_node(SyntaxKind::COMPONENT_BODY);
        if self.expect(SyntaxKind::L_BRACE) {
            loop {
                match self.current_kind() {
                    SyntaxKind::VAR_KW => {
                        self.start_node(SyntaxKind::COMPONENT_VAR);
                        self.bump();
                        self.parse_type_spec();
                        self.parse_name();
                        if self.eat(SyntaxKind::ASSIGN) {
                            self.parse_expression();
                        }
                        self.finish_node();
                    }
                    SyntaxKind::PORT_KW => {
                        self.start_node(SyntaxKind::COMPONENT_PORT);
                        self.bump();
                        self.parse_type_spec();
                        self.parse_name();
                        self.finish_node();
                    }
                    SyntaxKind::CONST_KW => {
                        self.start_node(SyntaxKind::COMPONENT_CONST);
                        self.bump();
                        self.parse_type_spec();
                        self.parse_name();
                        self.expect(SyntaxKind::ASSIGN);
                        self.parse_expression();
                        self.finish_node();
                    }
                    SyntaxKind::SEMICOLON => self.bump(),
                    _ => break,
                }
            }
            if !self.at(SyntaxKind::R_BRACE) {
                self.error_recover("expected a component element or '}'", &[SyntaxKind::R_BRACE]);
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    /// ConstDef = Visibility? 'const' TypeSpec Name ':=' Expression WithStatement? ';'?
    fn parse_const_def(&mut self) {
        self.start_node(SyntaxKind::CONST_DEF);
        self.parse_visibility();
        self.expect(SyntaxKind::CONST_KW);
        self.parse_type_spec();
        self.parse_name();
        self.expect(SyntaxKind::ASSIGN);
        self.parse_expression();
        if self.at(SyntaxKind::WITH_KW) {
            self.parse_with_statement();
        }
        self.eat(SyntaxKind::SEMICOLON);
        self.finish_node();
    }

    /// TemplateDef = Visibility? 'template' TypeSpec Name ':=' TemplateBody WithStatement? ';'?
    /// TemplateBody = '?' | '*' | 'omit' | Expression
    fn parse_template_def(&mut self) {
        self.start_node(SyntaxKind::TEMPLATE_DEF);
        self.parse_visibility();
        self.expect(SyntaxKind::TEMPLATE_KW);
        self.parse_type_spec();
        self.parse_name();
        self.expect(SyntaxKind::ASSIGN);
        self.start_node(SyntaxKind::TEMPLATE_BODY);
        if !(self.eat(SyntaxKind::QUESTION)
            || self.eat(SyntaxKind::STAR)
            || self.eat(SyntaxKind::OMIT_KW))
        {
            self.parse_expression();
        }
        self.finish_node();
        if self.at(SyntaxKind::WITH_KW) {
            self.parse_with_statement();
        }
        self.eat(SyntaxKind::SEMICOLON);
        self.finish_node();
    }

    /// FunctionDef = Visibility? 'function' Name ParamList RunsOn? ReturnType? Block
    ///               WithStatement? ';'?
    fn parse_function_def(&mut self) {
        self.start_node(SyntaxKind::FUNCTION_DEF);
        self.parse_visibility();
        self.expect(SyntaxKind::FUNCTION_KW);
        self.parse_name();
        self.parse_param_list();
        if self.at(SyntaxKind::RUNS_KW) {
            self.start_node(SyntaxKind::RUNS_ON);
            self.bump();
            self.expect(SyntaxKind::ON_KW);
            self.start_node(SyntaxKind::TYPE_REF);
            self.parse_reference();
            self.finish_node();
            self.finish_node();
        }
        if self.at(SyntaxKind::RETURN_KW) {
            self.parse_return_type();
        }
        self.parse_block();
        if self.at(SyntaxKind::WITH_KW) {
            self.parse_with_statement();
        }
        self.eat(SyntaxKind::SEMICOLON);
        self.finish_node();
    }

    /// SignatureDef = Visibility? 'signature' Name ParamList ReturnType? WithStatement? ';'?
    fn parse_signature_def(&mut self) {
        self.start_node(SyntaxKind::SIGNATURE_DEF);
        self.parse_visibility();
        self.expect(SyntaxKind::SIGNATURE_KW);
        self.parse_name();
        self.parse_param_list();
        if self.at(SyntaxKind::RETURN_KW) {
            self.parse_return_type();
        }
        if self.at(SyntaxKind::WITH_KW) {
            self.parse_with_statement();
        }
        self.eat(SyntaxKind::SEMICOLON);
        self.finish_node();
    }

    /// ReturnType = 'return' TypeSpec
    fn parse_return_type(&mut self) {
        self.start_node(SyntaxKind::RETURN_TYPE);
        self.expect(SyntaxKind::RETURN_KW);
        self.parse_type_spec();
        self.finish_node();
    }

    /// ParamList = '(' (Param (',' Param)*)? ')'
    /// Param = ('in' | 'out' | 'inout')? TypeSpec Name
    fn parse_param_list(&mut self) {
        self.start_node(SyntaxKind::PARAM_LIST);
        if self.expect(SyntaxKind::L_PAREN) {
            while !self.at_eof() && !self.at(SyntaxKind::R_PAREN) {
                self.start_node(SyntaxKind::PARAM);
                if self.at_any(&[SyntaxKind::IN_KW, SyntaxKind::OUT_KW, SyntaxKind::INOUT_KW]) {
                    self.bump();
                }
                self.parse_type_spec();
                self.parse_name();
                self.finish_node();
                if !self.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
            if !self.at(SyntaxKind::R_PAREN) {
                self.error_recover(
                    "expected ',' or ')' in parameter list",
                    &[SyntaxKind::R_PAREN, SyntaxKind::L_BRACE],
                );
            }
            self.expect(SyntaxKind::R_PAREN);
        }
        self.finish_node();
    }

    // =========================================================================
    // Grammar rules: attributes
    // =========================================================================

    /// WithStatement = 'with' '{' (WithAttr ';'?)* '}'
    /// WithAttr = ('encode' | 'variant' | 'extension' | 'display' | 'optional') 'override'? STRING
    fn parse_with_statement(&mut self) {
        self.start_node(SyntaxKind::WITH_STMT);
        self.expect(SyntaxKind::WITH_KW);
        if self.expect(SyntaxKind::L_BRACE) {
            while self.at_any(&[
                SyntaxKind::ENCODE_KW,
                SyntaxKind::VARIANT_KW,
                SyntaxKind::EXTENSION_KW,
                SyntaxKind::DISPLAY_KW,
                SyntaxKind::OPTIONAL_KW,
            ]) {
                self.start_node(SyntaxKind::WITH_ATTR);
                self.bump();
                self.eat(SyntaxKind::OVERRIDE_KW);
                self.expect(SyntaxKind::STRING);
                self.finish_node();
                self.eat(SyntaxKind::SEMICOLON);
            }
            if !self.at(SyntaxKind::R_BRACE) {
                self.error_recover("expected an attribute or '}'", &[SyntaxKind::R_BRACE]);
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    // =========================================================================
    // Grammar rules: statements
    // =========================================================================

    /// Block = '{' (Statement ';'?)* '}'
    fn parse_block(&mut self) {
        self.start_node(SyntaxKind::BLOCK);
        if self.expect(SyntaxKind::L_BRACE) {
            while !self.at_eof() && !self.at(SyntaxKind::R_BRACE) {
                let pos_before = self.pos;
                if self.eat(SyntaxKind::SEMICOLON) {
                    continue;
                }
                self.parse_statement();
                if self.pos == pos_before && !self.at_eof() {
                    self.bump();
                }
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    /// Statement = VarStmt | AssignStmt | AltStmt | InterleaveStmt | RepeatStmt
    ///           | SetverdictStmt | ReturnStmt | Block | ExprStmt
    fn parse_statement(&mut self) {
        match self.current_kind() {
            SyntaxKind::VAR_KW => {
                self.start_node(SyntaxKind::VAR_STMT);
                self.bump();
                self.parse_type_spec();
                self.parse_name();
                if self.eat(SyntaxKind::ASSIGN) {
                    self.parse_expression();
                }
                self.finish_node();
            }
            SyntaxKind::ALT_KW => self.parse_alt_like(SyntaxKind::ALT_STMT),
            SyntaxKind::INTERLEAVE_KW => self.parse_alt_like(SyntaxKind::INTERLEAVE_STMT),
            SyntaxKind::REPEAT_KW => {
                self.start_node(SyntaxKind::REPEAT_STMT);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::SETVERDICT_KW => {
                self.start_node(SyntaxKind::SETVERDICT_STMT);
                self.bump();
                self.expect(SyntaxKind::L_PAREN);
                self.parse_expression();
                self.expect(SyntaxKind::R_PAREN);
                self.finish_node();
            }
            SyntaxKind::RETURN_KW => {
                self.start_node(SyntaxKind::RETURN_STMT);
                self.bump();
                if !self.at_any(&[SyntaxKind::SEMICOLON, SyntaxKind::R_BRACE]) && !self.at_eof() {
                    self.parse_expression();
                }
                self.finish_node();
            }
            SyntaxKind::L_BRACE => self.parse_block(),
            SyntaxKind::IDENT if self.is_assignment_ahead() => {
                self.start_node(SyntaxKind::ASSIGN_STMT);
                self.parse_reference();
                self.expect(SyntaxKind::ASSIGN);
                self.parse_expression();
                self.finish_node();
            }
            SyntaxKind::IDENT => {
                self.start_node(SyntaxKind::EXPR_STMT);
                self.parse_expression();
                self.finish_node();
            }
            kind => {
                let mut recovery = STATEMENT_START.to_vec();
                recovery.push(SyntaxKind::SEMICOLON);
                recovery.push(SyntaxKind::R_BRACE);
                recovery.retain(|k| *k != SyntaxKind::IDENT && *k != SyntaxKind::L_BRACE);
                self.error_recover(format!("expected a statement, found {:?}", kind), &recovery);
            }
        }
    }

    fn is_assignment_ahead(&self) -> bool {
        match self.nth(1) {
            SyntaxKind::ASSIGN => true,
            SyntaxKind::DOT => {
                self.nth(2) == SyntaxKind::IDENT && self.nth(3) == SyntaxKind::ASSIGN
            }
            _ => false,
        }
    }

    /// AltStmt = ('alt' | 'interleave') '{' AltGuard* '}'
    fn parse_alt_like(&mut self, kind: SyntaxKind) {
        self.start_node(kind);
        self.bump();
        if self.expect(SyntaxKind::L_BRACE) {
            while self.at(SyntaxKind::L_BRACKET) {
                self.parse_alt_guard();
                self.eat(SyntaxKind::SEMICOLON);
            }
            if !self.at(SyntaxKind::R_BRACE) {
                self.error_recover("expected '[' or '}' in alternative", &[SyntaxKind::R_BRACE]);
            }
            self.expect(SyntaxKind::R_BRACE);
        }
        self.finish_node();
    }

    /// AltGuard = '[' ('else' | Expression)? ']' ReceiveEvent? Block
    /// ReceiveEvent = Reference '.' 'receive' ('(' Expression ')')?
    fn parse_alt_guard(&mut self) {
        self.start_node(SyntaxKind::ALT_GUARD);
        self.expect(SyntaxKind::L_BRACKET);
        if !self.eat(SyntaxKind::ELSE_KW) && !self.at(SyntaxKind::R_BRACKET) {
            self.start_node(SyntaxKind::GUARD_EXPR);
            self.parse_expression();
            self.finish_node();
        }
        self.expect(SyntaxKind::R_BRACKET);
        if self.at(SyntaxKind::IDENT) {
            self.start_node(SyntaxKind::RECEIVE_EVENT);
            self.start_node(SyntaxKind::REFERENCE);
            self.bump();
            self.finish_node();
            self.expect(SyntaxKind::DOT);
            self.expect(SyntaxKind::RECEIVE_KW);
            if self.eat(SyntaxKind::L_PAREN) {
                self.parse_expression();
                self.expect(SyntaxKind::R_PAREN);
            }
            self.finish_node();
        }
        self.parse_block();
        self.finish_node();
    }

    // =========================================================================
    // Grammar rules: expressions
    // =========================================================================

    /// Expression = OrExpression
    fn parse_expression(&mut self) {
        self.parse_binary(0);
    }

    /// Precedence climbing over the binary operator levels:
    /// or < and < equality < relational < additive < multiplicative
    fn parse_binary(&mut self, level: usize) {
        const LEVELS: &[&[SyntaxKind]] = &[
            &[SyntaxKind::OR_KW],
            &[SyntaxKind::AND_KW],
            &[SyntaxKind::EQ_EQ, SyntaxKind::BANG_EQ],
            &[SyntaxKind::LT, SyntaxKind::GT, SyntaxKind::LT_EQ, SyntaxKind::GT_EQ],
            &[SyntaxKind::PLUS, SyntaxKind::MINUS, SyntaxKind::AMP],
            &[SyntaxKind::STAR, SyntaxKind::SLASH],
        ];

        if level >= LEVELS.len() {
            self.parse_unary();
            return;
        }

        let checkpoint = self.checkpoint();
        self.parse_binary(level + 1);
        while self.at_any(LEVELS[level]) {
            self.start_node_at(checkpoint, SyntaxKind::BINARY_EXPR);
            self.bump();
            self.parse_binary(level + 1);
            self.finish_node();
        }
    }

    /// UnaryExpression = ('-' | 'not') UnaryExpression | PrimaryExpression
    fn parse_unary(&mut self) {
        if self.at_any(&[SyntaxKind::MINUS, SyntaxKind::NOT_KW]) {
            self.start_node(SyntaxKind::UNARY_EXPR);
            self.bump();
            self.parse_unary();
            self.finish_node();
        } else {
            self.parse_primary();
        }
    }

    /// PrimaryExpression = Literal | Reference ArgList? | RecordExpr | '(' Expression ')'
    fn parse_primary(&mut self) {
        let kind = self.current_kind();
        match kind {
            SyntaxKind::INTEGER
            | SyntaxKind::FLOAT
            | SyntaxKind::STRING
            | SyntaxKind::TRUE_KW
            | SyntaxKind::FALSE_KW
            | SyntaxKind::OMIT_KW => {
                self.start_node(SyntaxKind::LITERAL);
                self.bump();
                self.finish_node();
            }
            k if k.is_verdict() => {
                self.start_node(SyntaxKind::LITERAL);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::IDENT => {
                let checkpoint = self.checkpoint();
                self.parse_reference();
                if self.at(SyntaxKind::L_PAREN) {
                    self.start_node_at(checkpoint, SyntaxKind::CALL_EXPR);
                    self.parse_arg_list();
                    self.finish_node();
                } else {
                    self.start_node_at(checkpoint, SyntaxKind::REF_EXPR);
                    self.finish_node();
                }
            }
            SyntaxKind::L_BRACE => self.parse_record_expr(),
            SyntaxKind::L_PAREN => {
                self.start_node(SyntaxKind::PAREN_EXPR);
                self.bump();
                self.parse_expression();
                self.expect(SyntaxKind::R_PAREN);
                self.finish_node();
            }
            _ => {
                self.error(format!("expected an expression, found {:?}", kind));
            }
        }
    }

    /// ArgList = '(' (Expression (',' Expression)*)? ')'
    fn parse_arg_list(&mut self) {
        self.start_node(SyntaxKind::ARG_LIST);
        self.expect(SyntaxKind::L_PAREN);
        while !self.at_eof() && !self.at(SyntaxKind::R_PAREN) {
            self.parse_expression();
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        self.expect(SyntaxKind::R_PAREN);
        self.finish_node();
    }

    /// RecordExpr = '{' (FieldAssign (',' FieldAssign)*)? '}'
    /// FieldAssign = Name ':=' Expression
    fn parse_record_expr(&mut self) {
        self.start_node(SyntaxKind::RECORD_EXPR);
        self.expect(SyntaxKind::L_BRACE);
        while self.at(SyntaxKind::IDENT) {
            self.start_node(SyntaxKind::FIELD_ASSIGN);
            self.parse_name();
            self.expect(SyntaxKind::ASSIGN);
            self.parse_expression();
            self.finish_node();
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        self.expect(SyntaxKind::R_BRACE);
        self.finish_node();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_of(parse: &Parse, kind: SyntaxKind) -> usize {
        parse.syntax().descendants().filter(|n| n.kind() == kind).count()
    }

    #[test]
    fn test_parse_empty_module() {
        let parse = parse_module_file("module M {}");
        assert!(parse.ok(), "{:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::MODULE), 1);
    }

    #[test]
    fn test_parse_is_lossless() {
        let text = "module M // c\n{ type integer T (0 .. 5); }  ";
        let parse = parse_module_file(text);
        assert_eq!(parse.syntax().text().to_string(), text);
    }

    #[test]
    fn test_parse_imports_and_friends() {
        let parse = parse_module_file(
            "module M {
                import from A all;
                private import from B { import all };
                friend module X, Y;
            }",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::IMPORT_DEF), 2);
        assert_eq!(kinds_of(&parse, SyntaxKind::IMPORT_OF_IMPORTS), 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::FRIEND_DEF), 1);
    }

    #[test]
    fn test_parse_friend_visibility_is_not_friend_module() {
        let parse = parse_module_file("module M { friend const integer c := 1; }");
        assert!(parse.ok(), "{:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::CONST_DEF), 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::VISIBILITY), 1);
    }

    #[test]
    fn test_parse_types() {
        let parse = parse_module_file(
            "module M {
                type record R { integer a, R b optional }
                type union U { integer num, boolean flag }
                type enumerated E { red, green }
                type num < U Sel;
                type port P message { in integer; out charstring, boolean }
                type component C { var integer v := 0; port P p; const integer k := 1 }
            }",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::TYPE_DEF), 6);
        assert_eq!(kinds_of(&parse, SyntaxKind::SELECTION_TYPE), 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::PORT_MESSAGE_LIST), 2);
    }

    #[test]
    fn test_parse_function_with_statements() {
        let parse = parse_module_file(
            "module M {
                function f(in integer a) runs on C return integer {
                    var integer x := a;
                    x := x + 1 * 2;
                    alt { [x > 0] p.receive(t) { repeat; } [else] { } }
                    setverdict(pass);
                    return x;
                } with { extension \"x\" }
            }",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::ALT_GUARD), 2);
        assert_eq!(kinds_of(&parse, SyntaxKind::RECEIVE_EVENT), 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::BINARY_EXPR), 3);
    }

    #[test]
    fn test_parse_error_recovery() {
        let parse = parse_module_file("module M { 42; const integer c := 1; }");
        assert!(!parse.ok());
        assert_eq!(kinds_of(&parse, SyntaxKind::CONST_DEF), 1);
    }

    #[test]
    fn test_parse_module_items_fragment_offsets() {
        let parse = parse_module_items("const integer c := ;", 100);
        assert!(!parse.ok());
        assert!(parse.errors[0].range.start() >= TextSize::new(100));
    }

    #[test]
    fn test_parse_statements_fragment() {
        let parse = parse_statements("var integer x; x := 2; f(x)", 0);
        assert!(parse.ok(), "{:?}", parse.errors);
        assert_eq!(kinds_of(&parse, SyntaxKind::VAR_STMT), 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::ASSIGN_STMT), 1);
        assert_eq!(kinds_of(&parse, SyntaxKind::EXPR_STMT), 1);
    }

    #[test]
    fn test_parse_optional_with() {
        assert!(parse_optional_with("  ", 0).ok());
        let parse = parse_optional_with(" with { encode \"BER\" } ", 0);
        assert!(parse.ok(), "{:?}", parse.errors);
        assert!(!parse_optional_with(" type", 0).ok());
    }
}
