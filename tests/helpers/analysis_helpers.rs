//! Parsing and analysis helpers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use ttcn::base::{FileId, Identifier};
use ttcn::semantic::{AnalysisOptions, AnalysisReport, ModuleSet, Severity, analyze};
use ttcn::syntax::{Module, NodeId, Reference, parse_file};

/// Parse `sources` as files 0.. into a module set.
pub fn module_set(sources: &[&str]) -> ModuleSet {
    ModuleSet::new(sources.iter().enumerate().map(|(idx, src)| {
        let parsed = parse_file(FileId::new(idx as u32), src);
        assert!(parsed.errors.is_empty(), "syntax errors: {:?}", parsed.errors);
        Arc::new(parsed.module.expect("module"))
    }))
}

/// Parse and check `sources` in one sequential analysis run.
pub fn analyze_sources(sources: &[&str]) -> (ModuleSet, AnalysisReport) {
    let set = module_set(sources);
    let report = analyze(&set, &AnalysisOptions::sequential(), &CancellationToken::new());
    (set, report)
}

pub fn messages(report: &AnalysisReport) -> Vec<String> {
    report
        .markers
        .all()
        .iter()
        .map(|d| d.message.to_string())
        .collect()
}

pub fn error_messages(report: &AnalysisReport) -> Vec<String> {
    report
        .markers
        .all()
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.to_string())
        .collect()
}

/// Assert a report has no errors.
pub fn assert_no_errors(report: &AnalysisReport) {
    let errors = error_messages(report);
    assert!(
        errors.is_empty(),
        "Expected no errors, got {} error(s):\n{}",
        errors.len(),
        errors.join("\n")
    );
}

/// A synthetic reference `name` or `Qualifier.name` placed on `module`.
pub fn reference_in(module: &Module, text: &str) -> Reference {
    let (qualifier, name) = match text.split_once('.') {
        Some((q, n)) => (Some(q), n),
        None => (None, text),
    };
    Reference {
        id: NodeId::new(module.file(), u32::MAX),
        module: qualifier.map(|q| Identifier::ttcn(q, module.location)),
        identifier: Identifier::ttcn(name, module.location),
        location: module.location,
    }
}
