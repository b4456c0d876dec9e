//! Module-level resolution: visibility, ambiguity and missing references.

use rstest::rstest;
use ttcn::semantic::Markers;

use crate::helpers::analysis_helpers::{
    analyze_sources, error_messages, module_set, reference_in,
};
use crate::helpers::source_fixtures::{EXPORTER, FRIEND_EXPORTER, IMPORTER};

#[test]
fn test_public_import_resolves_and_private_is_missing() {
    let (set, report) = analyze_sources(&[IMPORTER, EXPORTER]);
    let m = set.get("M").unwrap();

    let markers = Markers::new();
    let foo = m.find_assignment(&set, &markers, &reference_in(m, "foo"));
    assert_eq!(foo.map(|a| a.full_name()).as_deref(), Some("@N.foo"));
    assert!(m.find_assignment(&set, &markers, &reference_in(m, "bar")).is_none());

    let errors = error_messages(&report);
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors[0].contains("There is no visible definition with name `bar'"));

    let missing: Vec<_> = m
        .missing_references()
        .iter()
        .map(|r| r.identifier.name().to_string())
        .collect();
    assert_eq!(missing, vec!["bar"]);
    assert!(set.get("N").unwrap().missing_references().is_empty());
}

#[test]
fn test_missing_references_cleared_on_next_check() {
    let set = module_set(&[IMPORTER, EXPORTER]);
    let options = ttcn::semantic::AnalysisOptions::sequential();
    let cancel = tokio_util::sync::CancellationToken::new();
    ttcn::semantic::analyze(&set, &options, &cancel);
    ttcn::semantic::analyze(&set, &options, &cancel);
    assert_eq!(set.get("M").unwrap().missing_references().len(), 1);
}

#[rstest]
#[case("A", "shared", Some("@B.shared"))]
#[case("A", "hidden", None)]
#[case("A", "open", Some("@B.open"))]
#[case("C", "shared", None)]
#[case("C", "hidden", None)]
#[case("C", "open", Some("@B.open"))]
#[case("A", "B.shared", Some("@B.shared"))]
#[case("C", "B.hidden", None)]
fn test_visibility(#[case] from: &str, #[case] reference: &str, #[case] expected: Option<&str>) {
    let set = module_set(&[
        "module A { import from B all; }",
        "module C { import from B all; }",
        FRIEND_EXPORTER,
    ]);
    let module = set.get(from).unwrap();
    let markers = Markers::new();
    let found = module
        .find_assignment(&set, &markers, &reference_in(module, reference))
        .map(|a| a.full_name());
    assert_eq!(found.as_deref(), expected);
    assert!(markers.all().is_empty());
}

#[test]
fn test_private_never_resolvable_even_for_friends() {
    let set = module_set(&[
        "module A { import from B { import all }; }",
        FRIEND_EXPORTER,
    ]);
    let a = set.get("A").unwrap();
    let markers = Markers::new();
    assert!(a.find_assignment(&set, &markers, &reference_in(a, "hidden")).is_none());
    assert!(a.find_assignment(&set, &markers, &reference_in(a, "B.hidden")).is_none());
}

#[test]
fn test_ambiguous_unqualified_reference() {
    let (set, report) = analyze_sources(&[
        "module A {
            import from B all;
            import from C all;
            const integer y := x;
            const integer z := B.x;
        }",
        "module B { const integer x := 1; }",
        "module C { const integer x := 2; }",
    ]);
    let errors = error_messages(&report);
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors[0].contains("`@B.x' and to `@C.x'"));

    let a = set.get("A").unwrap();
    let markers = Markers::new();
    assert!(a.find_assignment(&set, &markers, &reference_in(a, "x")).is_none());
    let qualified = a.find_assignment(&set, &markers, &reference_in(a, "C.x"));
    assert_eq!(qualified.map(|q| q.full_name()).as_deref(), Some("@C.x"));
}

#[test]
fn test_local_definition_shadows_imports() {
    let (set, report) = analyze_sources(&[
        "module A { import from B all; const integer x := 0; const integer y := x; }",
        "module B { const integer x := 1; }",
    ]);
    assert!(!report.has_errors());
    let a = set.get("A").unwrap();
    let found = a.find_assignment(&set, &Markers::new(), &reference_in(a, "x"));
    assert_eq!(found.map(|f| f.full_name()).as_deref(), Some("@A.x"));
}

#[test]
fn test_import_of_imports_follows_public_imports() {
    let (set, report) = analyze_sources(&[
        "module A { import from B { import all }; const integer y := deep; }",
        "module B { public import from D all; }",
        "module D { const integer deep := 4; }",
    ]);
    assert!(!report.has_errors(), "{:?}", error_messages(&report));
    let a = set.get("A").unwrap();
    let found = a.find_assignment(&set, &Markers::new(), &reference_in(a, "deep"));
    assert_eq!(found.map(|f| f.full_name()).as_deref(), Some("@D.deep"));
}
