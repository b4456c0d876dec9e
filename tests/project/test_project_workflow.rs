//! Project-level flows: editing and re-analysis.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use ttcn::project::{EditOutcome, ProjectError, ProjectRegistry, ProjectSourceParser};
use ttcn::reparse::TextEdit;
use ttcn::semantic::AnalysisOptions;
use ttcn::syntax::{fingerprint, parse_file};

use crate::helpers::analysis_helpers::error_messages;
use crate::helpers::source_fixtures::{EDITABLE, EXPORTER, IMPORTER, OTHER};

fn editable_project() -> (ProjectSourceParser, ttcn::FileId) {
    let project = ProjectSourceParser::new("edit", AnalysisOptions::sequential());
    let file = project.set_file_content("edit.ttcn", EDITABLE);
    project.set_file_content("other.ttcn", OTHER);
    (project, file)
}

fn replace(text: &str, needle: &str, replacement: &str) -> TextEdit {
    let start = text.find(needle).expect("needle") as u32;
    TextEdit::new(start, start + needle.len() as u32, replacement)
}

#[test]
fn test_missing_references_through_project() {
    let project = ProjectSourceParser::new("scenario", AnalysisOptions::default());
    let m = project.set_file_content("m.ttcn", IMPORTER);
    let n = project.set_file_content("n.ttcn", EXPORTER);

    let report = project.analyze(&CancellationToken::new());
    assert_eq!(report.markers.error_count(), 1);
    let missing: Vec<_> = project
        .missing_references(m)
        .iter()
        .map(|r| r.to_string())
        .collect();
    assert_eq!(missing, vec!["bar"]);
    assert!(project.missing_references(n).is_empty());
}

#[test]
fn test_edit_patches_and_reanalyzes() {
    let (project, file) = editable_project();
    let cancel = CancellationToken::new();
    let first = project.analyze(&cancel);
    assert!(error_messages(&first).is_empty(), "{:?}", error_messages(&first));

    let before = project.module(file).unwrap();
    let outcome = project
        .apply_edit(file, &replace(EDITABLE, "x - 1", "x - 2"))
        .unwrap();
    assert_eq!(outcome, EditOutcome::Patched);

    // the previous snapshot is untouched
    let original = parse_file(file, EDITABLE).module.unwrap();
    assert_eq!(fingerprint(&before), fingerprint(&original));

    let text = project.file(file).unwrap().text;
    let after = project.module(file).unwrap();
    assert_eq!(fingerprint(&after), fingerprint(&parse_file(file, &text).module.unwrap()));

    let second = project.analyze(&cancel);
    assert!(first.timestamp.is_less(second.timestamp));
    assert!(error_messages(&second).is_empty());
    assert!(after.definition("run").unwrap().state.is_checked(second.timestamp));
}

#[test]
fn test_broken_edit_falls_back_to_full_parse() {
    let (project, file) = editable_project();
    let broken = replace(EDITABLE, "type integer Small", "typ integer Small");
    assert_eq!(project.apply_edit(file, &broken).unwrap(), EditOutcome::Reparsed);
    assert!(!project.syntax_diagnostics().is_empty());

    let text = project.file(file).unwrap().text;
    let fixed = replace(&text, "typ integer Small", "type integer Small");
    assert_eq!(project.apply_edit(file, &fixed).unwrap(), EditOutcome::Reparsed);
    assert!(project.syntax_diagnostics().is_empty());
    assert_eq!(&*project.file(file).unwrap().text, EDITABLE);
}

#[test]
fn test_module_rename_updates_resolution() {
    let (project, _) = editable_project();
    let other = project.file_id(Path::new("other.ttcn")).unwrap();
    let rename = replace(OTHER, "Other", "Renamed");
    assert_eq!(project.apply_edit(other, &rename).unwrap(), EditOutcome::Patched);
    assert!(project.module_set().get("Renamed").is_some());

    let report = project.analyze(&CancellationToken::new());
    let errors = error_messages(&report);
    assert!(
        errors.iter().any(|m| m.contains("There is no module with name `Other'")),
        "{:?}",
        errors
    );
}

#[test]
fn test_edit_errors() {
    let (project, file) = editable_project();
    let unknown = ttcn::FileId::new(99);
    assert!(matches!(
        project.apply_edit(unknown, &TextEdit::insert(0, " ")),
        Err(ProjectError::UnknownFile(_))
    ));
    let out_of_bounds = TextEdit::insert(EDITABLE.len() as u32 + 10, "x");
    assert!(matches!(
        project.apply_edit(file, &out_of_bounds),
        Err(ProjectError::Edit(_))
    ));
}

#[test]
fn test_background_analysis_and_registry() {
    let registry = ProjectRegistry::new();
    let project = registry.open("bg", AnalysisOptions::default());
    project.set_file_content("m.ttcn", IMPORTER);
    project.set_file_content("n.ttcn", EXPORTER);

    let handle = project.analyze_in_background(CancellationToken::new());
    let report = handle.join().expect("analysis thread");
    assert!(!report.cancelled);
    let last = registry.get("bg").unwrap().last_analysis().unwrap();
    assert!(Arc::ptr_eq(&last.report, &report));
}

#[test]
fn test_cancelled_analysis_is_not_recorded() {
    let (project, _) = editable_project();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = project.analyze(&cancel);
    assert!(report.cancelled);
    assert!(project.last_analysis().is_none());
}
