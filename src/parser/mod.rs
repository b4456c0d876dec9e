//! Rowan-based parser for TTCN-3
//!
//! This module provides a lossless parser using:
//! - **logos** for fast lexing
//! - **rowan** for the CST (Concrete Syntax Tree)
//!
//! The CST preserves all whitespace and comments; the owned AST in
//! [`crate::syntax`] is lowered from it.
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind
//!     ↓
//! Parser → GreenNode tree (immutable, cheap to clone)
//!     ↓
//! SyntaxNode (rowan) → CST with parent pointers
//!     ↓
//! Lowering → owned AST with file locations
//! ```
//!
//! ## Fragments
//!
//! Incremental reparsing never re-lexes a whole file. It cuts the damaged
//! region out of the new text and parses it with one of the fragment entry
//! points, passing the fragment's offset so error ranges are file-relative.

#[allow(clippy::module_inception)]
mod parser;

mod lexer;
mod syntax_kind;

pub use lexer::{Lexer, Token, tokenize};
pub use parser::{
    Parse, SyntaxError, parse_module_file, parse_module_items, parse_optional_with,
    parse_statements,
};
pub use syntax_kind::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TtcnLanguage};

/// Re-export rowan types for convenience
pub use rowan::{GreenNode, TextRange, TextSize};
