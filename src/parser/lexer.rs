//! Logos-based lexer for TTCN-3
//!
//! Fast tokenization using the logos crate.

use super::syntax_kind::SyntaxKind;
use logos::Logos;
use rowan::TextSize;

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_offset(input, 0)
    }

    /// Lex a fragment whose first byte sits at `base` in the enclosing file.
    pub fn with_offset(input: &'a str, base: u32) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            offset: base,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    Float,

    #[regex(r#""([^"]|"")*""#)]
    String,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION (must come before single-char)
    // =========================================================================
    #[token("..")]
    DotDot,

    #[token(":=")]
    ColonEq,

    #[token("==")]
    EqEq,

    #[token("!=")]
    BangEq,

    #[token("<=")]
    LtEq,

    #[token(">=")]
    GtEq,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("&")]
    Amp,

    #[token("?")]
    Question,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("module")]
    ModuleKw,
    #[token("language")]
    LanguageKw,
    #[token("import")]
    ImportKw,
    #[token("from")]
    FromKw,
    #[token("all")]
    AllKw,
    #[token("friend")]
    FriendKw,
    #[token("public")]
    PublicKw,
    #[token("private")]
    PrivateKw,
    #[token("type")]
    TypeKw,
    #[token("record")]
    RecordKw,
    #[token("union")]
    UnionKw,
    #[token("enumerated")]
    EnumeratedKw,
    #[token("port")]
    PortKw,
    #[token("message")]
    MessageKw,
    #[token("component")]
    ComponentKw,
    #[token("const")]
    ConstKw,
    #[token("template")]
    TemplateKw,
    #[token("function")]
    FunctionKw,
    #[token("signature")]
    SignatureKw,
    #[token("return")]
    ReturnKw,
    #[token("runs")]
    RunsKw,
    #[token("on")]
    OnKw,
    #[token("var")]
    VarKw,
    #[token("control")]
    ControlKw,
    #[token("alt")]
    AltKw,
    #[token("interleave")]
    InterleaveKw,
    #[token("repeat")]
    RepeatKw,
    #[token("setverdict")]
    SetverdictKw,
    #[token("else")]
    ElseKw,
    #[token("with")]
    WithKw,
    #[token("encode")]
    EncodeKw,
    #[token("variant")]
    VariantKw,
    #[token("extension")]
    ExtensionKw,
    #[token("display")]
    DisplayKw,
    #[token("optional")]
    OptionalKw,
    #[token("override")]
    OverrideKw,
    #[token("in")]
    InKw,
    #[token("out")]
    OutKw,
    #[token("inout")]
    InoutKw,
    #[token("receive")]
    ReceiveKw,
    #[token("true")]
    TrueKw,
    #[token("false")]
    FalseKw,
    #[token("pass")]
    PassKw,
    #[token("fail")]
    FailKw,
    #[token("inconc")]
    InconcKw,
    #[token("none")]
    NoneKw,
    #[token("error")]
    ErrorKw,
    #[token("omit")]
    OmitKw,
    #[token("integer")]
    IntegerKw,
    #[token("float")]
    FloatKw,
    #[token("boolean")]
    BooleanKw,
    #[token("charstring")]
    CharstringKw,
    #[token("verdicttype")]
    VerdicttypeKw,
    #[token("and")]
    AndKw,
    #[token("or")]
    OrKw,
    #[token("not")]
    NotKw,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        use LogosToken::*;
        match token {
            Whitespace => SyntaxKind::WHITESPACE,
            LineComment => SyntaxKind::LINE_COMMENT,
            BlockComment => SyntaxKind::BLOCK_COMMENT,
            Ident => SyntaxKind::IDENT,
            Integer => SyntaxKind::INTEGER,
            Float => SyntaxKind::FLOAT,
            String => SyntaxKind::STRING,
            DotDot => SyntaxKind::DOT_DOT,
            ColonEq => SyntaxKind::ASSIGN,
            EqEq => SyntaxKind::EQ_EQ,
            BangEq => SyntaxKind::BANG_EQ,
            LtEq => SyntaxKind::LT_EQ,
            GtEq => SyntaxKind::GT_EQ,
            LBrace => SyntaxKind::L_BRACE,
            RBrace => SyntaxKind::R_BRACE,
            LBracket => SyntaxKind::L_BRACKET,
            RBracket => SyntaxKind::R_BRACKET,
            LParen => SyntaxKind::L_PAREN,
            RParen => SyntaxKind::R_PAREN,
            Semicolon => SyntaxKind::SEMICOLON,
            Comma => SyntaxKind::COMMA,
            Dot => SyntaxKind::DOT,
            Lt => SyntaxKind::LT,
            Gt => SyntaxKind::GT,
            Plus => SyntaxKind::PLUS,
            Minus => SyntaxKind::MINUS,
            Star => SyntaxKind::STAR,
            Slash => SyntaxKind::SLASH,
            Amp => SyntaxKind::AMP,
            Question => SyntaxKind::QUESTION,
            ModuleKw => SyntaxKind::MODULE_KW,
            LanguageKw => SyntaxKind::LANGUAGE_KW,
            ImportKw => SyntaxKind::IMPORT_KW,
            FromKw => SyntaxKind::FROM_KW,
            AllKw => SyntaxKind::ALL_KW,
            FriendKw => SyntaxKind::FRIEND_KW,
            PublicKw => SyntaxKind::PUBLIC_KW,
            PrivateKw => SyntaxKind::PRIVATE_KW,
            TypeKw => SyntaxKind::TYPE_KW,
            RecordKw => SyntaxKind::RECORD_KW,
            UnionKw => SyntaxKind::UNION_KW,
            EnumeratedKw => SyntaxKind::ENUMERATED_KW,
            PortKw => SyntaxKind::PORT_KW,
            MessageKw => SyntaxKind::MESSAGE_KW,
            ComponentKw => SyntaxKind::COMPONENT_KW,
            ConstKw => SyntaxKind::CONST_KW,
            TemplateKw => SyntaxKind::TEMPLATE_KW,
            FunctionKw => SyntaxKind::FUNCTION_KW,
            SignatureKw => SyntaxKind::SIGNATURE_KW,
            ReturnKw => SyntaxKind::RETURN_KW,
            RunsKw => SyntaxKind::RUNS_KW,
            OnKw => SyntaxKind::ON_KW,
            VarKw => SyntaxKind::VAR_KW,
            ControlKw => SyntaxKind::CONTROL_KW,
            AltKw => SyntaxKind::ALT_KW,
            InterleaveKw => SyntaxKind::INTERLEAVE_KW,
            RepeatKw => SyntaxKind::REPEAT_KW,
            SetverdictKw => SyntaxKind::SETVERDICT_KW,
            ElseKw => SyntaxKind::ELSE_KW,
            WithKw => SyntaxKind::WITH_KW,
            EncodeKw => SyntaxKind::ENCODE_KW,
            VariantKw => SyntaxKind::VARIANT_KW,
            ExtensionKw => SyntaxKind::EXTENSION_KW,
            DisplayKw => SyntaxKind::DISPLAY_KW,
            OptionalKw => SyntaxKind::OPTIONAL_KW,
            OverrideKw => SyntaxKind::OVERRIDE_KW,
            InKw => SyntaxKind::IN_KW,
            OutKw => SyntaxKind::OUT_KW,
            InoutKw => SyntaxKind::INOUT_KW,
            ReceiveKw => SyntaxKind::RECEIVE_KW,
            TrueKw => SyntaxKind::TRUE_KW,
            FalseKw => SyntaxKind::FALSE_KW,
            PassKw => SyntaxKind::PASS_KW,
            FailKw => SyntaxKind::FAIL_KW,
            InconcKw => SyntaxKind::INCONC_KW,
            NoneKw => SyntaxKind::NONE_KW,
            ErrorKw => SyntaxKind::ERROR_KW,
            OmitKw => SyntaxKind::OMIT_KW,
            IntegerKw => SyntaxKind::INTEGER_KW,
            FloatKw => SyntaxKind::FLOAT_KW,
            BooleanKw => SyntaxKind::BOOLEAN_KW,
            CharstringKw => SyntaxKind::CHARSTRING_KW,
            VerdicttypeKw => SyntaxKind::VERDICTTYPE_KW,
            AndKw => SyntaxKind::AND_KW,
            OrKw => SyntaxKind::OR_KW,
            NotKw => SyntaxKind::NOT_KW,
        }
    }
}
