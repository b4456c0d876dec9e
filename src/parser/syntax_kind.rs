//! Syntax kinds for the Rowan-based CST
//!
//! This enum defines all possible node and token kinds in the syntax tree.
//! It follows the structure of the TTCN-3 core language grammar.

/// All syntax kinds (tokens and nodes) in TTCN-3
///
/// Tokens are leaf nodes (identifiers, keywords, punctuation).
/// Nodes are composite (modules, definitions, statements).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA (whitespace and comments - preserved but not semantically meaningful)
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,
    BLOCK_COMMENT,

    // =========================================================================
    // LITERALS
    // =========================================================================
    IDENT,   // identifier
    INTEGER, // 42
    FLOAT,   // 3.14
    STRING,  // "hello"

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    L_BRACE,   // {
    R_BRACE,   // }
    L_BRACKET, // [
    R_BRACKET, // ]
    L_PAREN,   // (
    R_PAREN,   // )
    SEMICOLON, // ;
    COMMA,     // ,
    DOT,       // .
    DOT_DOT,   // ..
    ASSIGN,    // :=
    EQ_EQ,     // ==
    BANG_EQ,   // !=
    LT,        // <
    GT,        // >
    LT_EQ,     // <=
    GT_EQ,     // >=
    PLUS,      // +
    MINUS,     // -
    STAR,      // *
    SLASH,     // /
    AMP,       // &
    QUESTION,  // ?

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    MODULE_KW,
    LANGUAGE_KW,
    IMPORT_KW,
    FROM_KW,
    ALL_KW,
    FRIEND_KW,
    PUBLIC_KW,
    PRIVATE_KW,
    TYPE_KW,
    RECORD_KW,
    UNION_KW,
    ENUMERATED_KW,
    PORT_KW,
    MESSAGE_KW,
    COMPONENT_KW,
    CONST_KW,
    TEMPLATE_KW,
    FUNCTION_KW,
    SIGNATURE_KW,
    RETURN_KW,
    RUNS_KW,
    ON_KW,
    VAR_KW,
    CONTROL_KW,
    ALT_KW,
    INTERLEAVE_KW,
    REPEAT_KW,
    SETVERDICT_KW,
    ELSE_KW,
    WITH_KW,
    ENCODE_KW,
    VARIANT_KW,
    EXTENSION_KW,
    DISPLAY_KW,
    OPTIONAL_KW,
    OVERRIDE_KW,
    IN_KW,
    OUT_KW,
    INOUT_KW,
    RECEIVE_KW,
    TRUE_KW,
    FALSE_KW,
    PASS_KW,
    FAIL_KW,
    INCONC_KW,
    NONE_KW,
    ERROR_KW,
    OMIT_KW,
    INTEGER_KW,
    FLOAT_KW,
    BOOLEAN_KW,
    CHARSTRING_KW,
    VERDICTTYPE_KW,
    AND_KW,
    OR_KW,
    NOT_KW,

    // =========================================================================
    // NODES
    // =========================================================================
    SOURCE_FILE,
    MODULE,
    MODULE_BODY,
    MODULE_ITEMS, // fragment root for reparsing module definitions
    VISIBILITY,
    NAME,
    IMPORT_DEF,
    IMPORT_OF_IMPORTS,
    FRIEND_DEF,
    TYPE_DEF,
    RECORD_BODY,
    UNION_BODY,
    FIELD,
    ENUM_BODY,
    ENUM_ITEM,
    PORT_BODY,
    PORT_MESSAGE_LIST,
    COMPONENT_BODY,
    COMPONENT_VAR,
    COMPONENT_PORT,
    COMPONENT_CONST,
    SELECTION_TYPE,
    TYPE_REF,
    BUILTIN_TYPE,
    REFERENCE,
    RANGE_CONSTRAINT,
    CONST_DEF,
    TEMPLATE_DEF,
    TEMPLATE_BODY,
    FUNCTION_DEF,
    SIGNATURE_DEF,
    PARAM_LIST,
    PARAM,
    RUNS_ON,
    RETURN_TYPE,
    CONTROL_PART,
    BLOCK,
    STATEMENTS, // fragment root for reparsing statements
    VAR_STMT,
    ASSIGN_STMT,
    ALT_STMT,
    INTERLEAVE_STMT,
    ALT_GUARD,
    GUARD_EXPR,
    RECEIVE_EVENT,
    REPEAT_STMT,
    SETVERDICT_STMT,
    RETURN_STMT,
    EXPR_STMT,
    LITERAL,
    REF_EXPR,
    CALL_EXPR,
    ARG_LIST,
    RECORD_EXPR,
    FIELD_ASSIGN,
    PAREN_EXPR,
    UNARY_EXPR,
    BINARY_EXPR,
    WITH_STMT,
    WITH_ATTR,

    // Special
    ERROR,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    /// Check if this is a trivia token (whitespace or comment)
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE | Self::LINE_COMMENT | Self::BLOCK_COMMENT
        )
    }

    /// Check if this is a keyword
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (Self::MODULE_KW as u16) && (self as u16) <= (Self::NOT_KW as u16)
    }

    /// Check if this is a punctuation token
    pub fn is_punct(self) -> bool {
        (self as u16) >= (Self::L_BRACE as u16) && (self as u16) <= (Self::QUESTION as u16)
    }

    /// Check if this is a literal
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::IDENT | Self::INTEGER | Self::FLOAT | Self::STRING
        )
    }

    /// Builtin type keywords.
    pub fn is_builtin_type(self) -> bool {
        matches!(
            self,
            Self::INTEGER_KW
                | Self::FLOAT_KW
                | Self::BOOLEAN_KW
                | Self::CHARSTRING_KW
                | Self::VERDICTTYPE_KW
        )
    }

    /// Verdict literal keywords.
    pub fn is_verdict(self) -> bool {
        matches!(
            self,
            Self::PASS_KW | Self::FAIL_KW | Self::INCONC_KW | Self::NONE_KW | Self::ERROR_KW
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        assert!(raw.0 < SyntaxKind::__LAST as u16);
        // Safety: we control all syntax kinds and check bounds above
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }
}

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TtcnLanguage {}

impl rowan::Language for TtcnLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<TtcnLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<TtcnLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<TtcnLanguage>;
