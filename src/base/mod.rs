//! Foundation types for the TTCN-3 toolchain.
//!
//! This module provides fundamental types used throughout the analyzer:
//! - [`FileId`] - Interned file identifiers
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineCol`], [`LineIndex`] - Line/column conversion
//! - [`Location`] - File + byte range owned by every AST node
//! - [`Name`], [`Interner`] - String interning
//! - [`Identifier`] - Names as written in TTCN-3 or ASN.1 sources
//! - Domain constants (file extensions)
//!
//! This module has NO dependencies on other ttcn modules.

pub mod constants;
mod file_id;
mod identifier;
mod intern;
mod location;
mod position;

pub use file_id::FileId;
pub use identifier::{Identifier, IdentifierKind};
pub use intern::{Interner, Name};
pub use location::Location;
pub use position::{LineCol, LineIndex};

// Re-export text-size types for convenience
pub use text_size;
pub use text_size::{TextRange, TextSize};
