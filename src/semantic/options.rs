//! Analysis options

use super::diagnostics::Severity;

/// Options controlling one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Check modules on the rayon thread pool
    pub parallel: bool,
    /// Severity of "circular import chain" reports
    pub circular_import_severity: Severity,
    /// Report friend declarations naming modules that do not exist
    pub report_unknown_friends: bool,
    /// Report functions with a return type that may end without returning
    pub report_missing_return: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            circular_import_severity: Severity::Warning,
            report_unknown_friends: true,
            report_missing_return: true,
        }
    }
}

impl AnalysisOptions {
    /// Options for deterministic single-threaded checking
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}
