//! Check memoization across timestamps.

use tokio_util::sync::CancellationToken;
use ttcn::semantic::{
    AnalysisOptions, Assignment, CheckContext, CompilationTimestamp, Markers, check_definition,
};

use crate::helpers::analysis_helpers::{analyze_sources, module_set};

#[test]
fn test_check_runs_once_per_timestamp() {
    let set = module_set(&["module M { type integer Small (0 .. 9); const Small c := 1; }"]);
    let module = set.get("M").unwrap();
    let def = module.definition("c").unwrap();
    let markers = Markers::new();
    let options = AnalysisOptions::sequential();
    let cancel = CancellationToken::new();

    let first = CompilationTimestamp::new_timestamp();
    let cx = CheckContext::new(&set, first, &markers, &options, &cancel);
    check_definition(&cx, Assignment::new(module, def));
    check_definition(&cx, Assignment::new(module, def));
    assert_eq!(def.state.check_count(), 1);
    assert!(def.state.is_checked(first));

    let second = CompilationTimestamp::new_timestamp();
    assert!(first.is_less(second));
    let cx = CheckContext::new(&set, second, &markers, &options, &cancel);
    check_definition(&cx, Assignment::new(module, def));
    assert_eq!(def.state.check_count(), 2);

    // an older cycle finds the node already valid
    let cx = CheckContext::new(&set, first, &markers, &options, &cancel);
    check_definition(&cx, Assignment::new(module, def));
    assert_eq!(def.state.check_count(), 2);
    assert!(markers.all().is_empty(), "{:?}", markers.all());
}

#[test]
fn test_base_timestamp_is_smallest() {
    let minted = CompilationTimestamp::new_timestamp();
    assert!(CompilationTimestamp::base().is_less(minted));
    assert!(!minted.is_less(CompilationTimestamp::base()));
    assert!(!minted.is_less(minted));
}

#[test]
fn test_shared_type_checked_once_per_cycle() {
    let (set, report) = analyze_sources(&[
        "module M {
            type integer Small (0 .. 9);
            const Small a := 1;
            const Small b := 2;
            template Small t := 3;
        }",
    ]);
    assert!(!report.has_errors());
    let small = set.get("M").unwrap().definition("Small").unwrap();
    assert_eq!(small.state.check_count(), 1);
    assert_eq!(small.state.last_time_checked(), Some(report.timestamp));
}

#[test]
fn test_each_analysis_mints_a_later_timestamp() {
    let set = module_set(&["module M { const integer c := 1; }"]);
    let options = AnalysisOptions::sequential();
    let first = ttcn::semantic::analyze(&set, &options, &CancellationToken::new());
    let second = ttcn::semantic::analyze(&set, &options, &CancellationToken::new());
    assert!(first.timestamp.is_less(second.timestamp));

    let module = set.get("M").unwrap();
    assert_eq!(module.state.check_count(), 2);
    assert_eq!(module.definition("c").map(|d| d.state.check_count()), Some(2));
}

#[test]
fn test_invalidated_node_is_checked_again() {
    let set = module_set(&["module M { const integer c := 1; }"]);
    let def = set.get("M").unwrap().definition("c").unwrap();
    let ts = CompilationTimestamp::new_timestamp();
    assert!(def.state.begin(ts));
    assert!(!def.state.begin(ts));
    def.state.invalidate();
    assert_eq!(def.state.last_time_checked(), None);
    assert!(def.state.begin(ts));
}
