//! Semantic analysis of TTCN-3 modules.
//!
//! The checks run over immutable module snapshots. Each checkable node
//! carries a [`CheckState`] stamped with the [`CompilationTimestamp`] of the
//! cycle that last checked it, so a node is checked at most once per cycle
//! no matter how many references lead to it. Recursive resolution uses a
//! [`ReferenceChain`] to detect and report cycles.
//!
//! Diagnostics of one cycle go to a [`Markers`] store owned by that cycle's
//! [`AnalysisReport`].

mod analysis;
mod attributes;
mod chain;
mod checker;
mod context;
mod diagnostics;
mod options;
mod resolve;
mod scope;
mod state;
mod statements;
mod timestamp;
mod types;
mod values;

pub use analysis::{AnalysisReport, analyze};
pub use attributes::{parse_version, version_spec};
pub use chain::{CIRCULAR_IMPORT, CIRCULAR_REFERENCE, ChainEntry, ChainLink, ReferenceChain};
pub use checker::{Checker, check_definition, check_imports, check_module};
pub use context::{CheckContext, ModuleSet};
pub use diagnostics::{Diagnostic, Markers, RelatedInfo, Severity, codes};
pub use options::AnalysisOptions;
pub use resolve::{Assignment, ResolveResult};
pub use scope::{LocalEntry, LocalKind, ScopeStack};
pub use state::CheckState;
pub use statements::{StatementContext, has_return, statement_return};
pub use timestamp::{BuildTimestamp, CompilationTimestamp, GenerationStamp};
pub use types::{Bounds, ResolvedType, numeric_value};
pub use values::ValueContext;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::{
        AnalysisOptions, CheckContext, CompilationTimestamp, Markers, ModuleSet, check_module,
    };
    use crate::base::FileId;
    use crate::syntax::parse_file;

    /// Parse `sources` as files 0.. and check them sequentially.
    pub fn check_modules(sources: &[&str]) -> (ModuleSet, Markers) {
        let set = ModuleSet::new(sources.iter().enumerate().map(|(idx, src)| {
            let parsed = parse_file(FileId::new(idx as u32), src);
            assert!(parsed.errors.is_empty(), "syntax errors: {:?}", parsed.errors);
            Arc::new(parsed.module.expect("module"))
        }));
        let markers = Markers::new();
        let options = AnalysisOptions::sequential();
        let cancel = CancellationToken::new();
        {
            let cx = CheckContext::new(
                &set,
                CompilationTimestamp::new_timestamp(),
                &markers,
                &options,
                &cancel,
            );
            for module in set.modules() {
                check_module(&cx, module);
            }
        }
        (set, markers)
    }

    pub fn check_sources(sources: &[&str]) -> Markers {
        check_modules(sources).1
    }

    pub fn messages(markers: &Markers) -> Vec<String> {
        markers.all().iter().map(|d| d.message.to_string()).collect()
    }
}
