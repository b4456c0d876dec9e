//! Projects: file tables, edits, analysis jobs and code generation.

mod codegen;
mod error;
pub mod file_loader;
mod registry;
mod source_parser;
mod workspace_loader;

pub use codegen::{CodeGenerator, GenerationContext, GenerationReport, SkipReason};
pub use error::{LoadError, ProjectError};
pub use registry::ProjectRegistry;
pub use source_parser::{AnalysisSnapshot, EditOutcome, ProjectSourceParser, SourceFile};
pub use workspace_loader::WorkspaceLoader;
