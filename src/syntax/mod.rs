//! Owned AST, lowering from the CST, and tree walking.

pub mod ast;
mod lower;
mod relocate;
mod visitor;

pub use ast::*;
pub use lower::Lowerer;
pub use relocate::Relocate;
pub use visitor::{
    AstVisitor, NodeRef, VisitAction, children, collect_references, fingerprint, walk,
    walk_module,
};

use crate::base::FileId;
use crate::parser::{SyntaxError, parse_module_file};

/// Result of a full parse of one file.
#[derive(Debug)]
pub struct ParsedModule {
    /// `None` when the file does not contain a recognisable module header.
    pub module: Option<Module>,
    pub errors: Vec<SyntaxError>,
}

/// Parse and lower a whole source file.
pub fn parse_file(file: FileId, text: &str) -> ParsedModule {
    let parse = parse_module_file(text);
    let module = Lowerer::new(file, 0, 0).source_file(&parse.syntax());
    tracing::trace!(
        file = %file,
        errors = parse.errors.len(),
        module = module.as_ref().map(|m| m.name().as_str()).unwrap_or("<none>"),
        "parsed file"
    );
    ParsedModule {
        module,
        errors: parse.errors,
    }
}
