//! Semantic diagnostics and the per-run marker store.
//!
//! Semantic problems never abort a check. They are recorded as
//! [`Diagnostic`]s in a [`Markers`] store shared by every thread of one
//! analysis run, keyed by the file the problem is located in.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::base::{FileId, Location};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
///
/// Errors make the enclosing definition and module erroneous; warnings do
/// not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message anchored to a source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Location,
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    pub location: Location,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self {
            location,
            severity: Severity::Error,
            code: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(location, message)
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add related information.
    pub fn with_related(mut self, location: Location, message: impl Into<Arc<str>>) -> Self {
        self.related.push(RelatedInfo {
            location,
            message: message.into(),
        });
        self
    }

    pub fn file(&self) -> FileId {
        self.location.file()
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// ## Error Code Ranges
///
/// - **E0001-E0099**: Semantic analysis errors (resolution, type checking, validation)
/// - **W0001-W0099**: Warnings
/// - **S0001**: Syntax errors reported by the parser
pub mod codes {
    /// Reference to a definition that is not visible or does not exist.
    pub const UNDEFINED_REFERENCE: &str = "E0001";
    /// Unqualified reference matching definitions in several modules.
    pub const AMBIGUOUS_REFERENCE: &str = "E0002";
    pub const TYPE_MISMATCH: &str = "E0003";
    pub const DUPLICATE_DEFINITION: &str = "E0004";
    /// Mandatory element missing (record field, return value).
    pub const MISSING_REQUIRED: &str = "E0005";
    /// Circular reference chain.
    pub const CIRCULAR_REFERENCE: &str = "E0007";
    pub const INVALID_TYPE: &str = "E0008";
    /// Value outside of a subtype constraint, or malformed constraint.
    pub const CONSTRAINT_VIOLATION: &str = "E0011";
    /// Statement or value used where it is not allowed.
    pub const INVALID_CONTEXT: &str = "E0012";
    pub const INVALID_IMPORT: &str = "E0014";
    pub const DUPLICATE_MODULE: &str = "E0015";
    pub const INVALID_ATTRIBUTE: &str = "E0016";
    /// Code generation reached a node it cannot generate.
    pub const INTERNAL_ERROR: &str = "E0099";

    /// Circular import chain.
    pub const CIRCULAR_IMPORT: &str = "W0004";
    pub const UNKNOWN_FRIEND: &str = "W0005";
    /// Function with a return type that may end without returning.
    pub const MISSING_RETURN: &str = "W0006";
    pub const ATTRIBUTE_WARNING: &str = "W0007";
    pub const UNREACHABLE_CODE: &str = "W0008";

    pub const SYNTAX_ERROR: &str = "S0001";
}

// ============================================================================
// MARKERS
// ============================================================================

/// Thread-safe diagnostic store of one analysis run.
#[derive(Debug, Default)]
pub struct Markers {
    by_file: Mutex<FxHashMap<FileId, Vec<Diagnostic>>>,
}

impl Markers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Diagnostics without a location are dropped.
    pub fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.location.is_none() {
            tracing::debug!(message = %diagnostic.message, "dropping diagnostic without location");
            return;
        }
        self.by_file
            .lock()
            .entry(diagnostic.file())
            .or_default()
            .push(diagnostic);
    }

    /// Record a diagnostic unless one with the same location, severity and
    /// message was recorded already.
    pub fn report_singular(&self, diagnostic: Diagnostic) {
        if diagnostic.location.is_none() {
            return;
        }
        let mut by_file = self.by_file.lock();
        let entries = by_file.entry(diagnostic.file()).or_default();
        let duplicate = entries.iter().any(|d| {
            d.location == diagnostic.location
                && d.severity == diagnostic.severity
                && d.message == diagnostic.message
        });
        if !duplicate {
            entries.push(diagnostic);
        }
    }

    pub fn error(&self, location: Location, code: &str, message: impl Into<Arc<str>>) {
        self.report(Diagnostic::error(location, message).with_code(code));
    }

    pub fn warning(&self, location: Location, code: &str, message: impl Into<Arc<str>>) {
        self.report(Diagnostic::warning(location, message).with_code(code));
    }

    /// Diagnostics of one file, in reporting order.
    pub fn for_file(&self, file: FileId) -> Vec<Diagnostic> {
        self.by_file.lock().get(&file).cloned().unwrap_or_default()
    }

    /// All diagnostics, grouped by file in file order.
    pub fn all(&self) -> Vec<Diagnostic> {
        let by_file = self.by_file.lock();
        let mut files: Vec<_> = by_file.keys().copied().collect();
        files.sort();
        files
            .into_iter()
            .flat_map(|file| by_file[&file].iter().cloned())
            .collect()
    }

    pub fn clear_file(&self, file: FileId) {
        self.by_file.lock().remove(&file);
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.by_file
            .lock()
            .values()
            .flatten()
            .filter(|d| d.severity == severity)
            .count()
    }
}
