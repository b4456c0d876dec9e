//! # ttcn-base
//!
//! Core library for TTCN-3 parsing, incremental reparsing and semantic
//! analysis.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project   → Project registry, file tables, analysis jobs, codegen gate
//!   ↓
//! reparse   → Damage regions, in-place patching of module trees
//!   ↓
//! semantic  → Timestamps, reference chains, resolution, checks, markers
//!   ↓
//! syntax    → Owned AST, lowering from the CST, visitor
//!   ↓
//! parser    → Logos lexer, rowan CST, recursive-descent parser
//!   ↓
//! base      → Primitives (FileId, Name interning, Location, TextRange)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → semantic → reparse → project)
// ============================================================================

/// Foundation types: FileId, Name interning, Identifier, Location
pub mod base;

/// Parser: Logos lexer, rowan CST, full-file and fragment entry points
pub mod parser;

/// Syntax: owned AST, lowering, visitor
pub mod syntax;

/// Semantic analysis: memoized checks, cycle detection, module resolution
pub mod semantic;

/// Incremental reparsing of edited modules
pub mod reparse;

/// Project management: registry, source parser, file loading, code generation
pub mod project;

// Re-export foundation types
pub use base::{
    FileId, Identifier, Interner, LineCol, LineIndex, Location, Name, TextRange, TextSize,
};
