//! One full check cycle over a module set.

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use super::checker::{check_imports, check_module};
use super::context::{CheckContext, ModuleSet};
use super::diagnostics::Markers;
use super::options::AnalysisOptions;
use super::timestamp::CompilationTimestamp;

/// Result of one check cycle.
#[derive(Debug)]
pub struct AnalysisReport {
    pub timestamp: CompilationTimestamp,
    pub markers: Markers,
    /// Whether the cycle stopped early; the markers are then partial.
    pub cancelled: bool,
}

impl AnalysisReport {
    pub fn has_errors(&self) -> bool {
        self.markers.has_errors()
    }
}

/// Check every module of `modules` under a fresh timestamp.
///
/// Imports are checked first, sequentially and in module order, so cycle
/// reports do not depend on scheduling. Modules are then checked in
/// parallel when enabled. Cancellation is honoured between modules and
/// between definitions.
///
/// Two calls over the same modules must not overlap: nodes stamped by the
/// later cycle are skipped by the earlier one and miss its markers.
pub fn analyze(
    modules: &ModuleSet,
    options: &AnalysisOptions,
    cancel: &CancellationToken,
) -> AnalysisReport {
    let timestamp = CompilationTimestamp::new_timestamp();
    let markers = Markers::new();
    let _span = tracing::info_span!("analyze", modules = modules.len(), ?timestamp).entered();

    modules.report_duplicates(&markers);
    {
        let cx = CheckContext::new(modules, timestamp, &markers, options, cancel);
        for module in modules.modules() {
            if cancel.is_cancelled() {
                break;
            }
            check_imports(&cx, module);
        }

        let all: Vec<_> = modules.modules().collect();
        if options.parallel {
            all.par_iter().for_each(|module| {
                if !cancel.is_cancelled() {
                    check_module(&cx, module);
                }
            });
        } else {
            for module in all {
                if cancel.is_cancelled() {
                    break;
                }
                check_module(&cx, module);
            }
        }
    }

    let cancelled = cancel.is_cancelled();
    tracing::info!(
        errors = markers.error_count(),
        warnings = markers.warning_count(),
        cancelled,
        "analysis finished"
    );
    AnalysisReport {
        timestamp,
        markers,
        cancelled,
    }
}
