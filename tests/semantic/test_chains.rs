//! Cycle detection through definitions and imports.

use rstest::rstest;
use ttcn::base::{FileId, Location};
use ttcn::semantic::{ChainEntry, Markers, ReferenceChain, Severity};
use ttcn::syntax::NodeId;

use crate::helpers::analysis_helpers::{analyze_sources, assert_no_errors, messages};
use crate::helpers::source_fixtures::{ALIAS_CYCLE, IMPORT_CYCLE};

fn entry(local: u32, name: &str) -> ChainEntry {
    ChainEntry::new(
        NodeId::new(FileId::new(7), local),
        name,
        Location::from_offsets(FileId::new(7), local, local + 1),
    )
}

#[test]
fn test_alias_cycle_terminates_and_is_reported() {
    let (set, report) = analyze_sources(&[ALIAS_CYCLE]);
    let cycles: Vec<_> = report
        .markers
        .all()
        .into_iter()
        .filter(|d| d.message.starts_with("Circular reference chain"))
        .collect();
    assert_eq!(cycles.len(), 3, "{:?}", messages(&report));
    assert!(cycles.iter().all(|d| d.severity == Severity::Error));
    assert!(
        cycles
            .iter()
            .any(|d| d.message.contains("`@M.A -> @M.B -> @M.C -> @M.A'")),
        "{:?}",
        cycles
    );
    assert!(set.get("M").unwrap().definition("A").unwrap().state.is_checked(report.timestamp));
}

#[test]
fn test_alias_cycle_makes_module_erroneous() {
    let (set, report) = analyze_sources(&[ALIAS_CYCLE]);
    let module = set.get("M").unwrap();
    for name in ["A", "B", "C"] {
        assert!(module.definition(name).unwrap().state.is_erroneous(), "{}", name);
    }
    assert!(module.state.is_erroneous());
    assert!(!module.should_be_generated(report.timestamp));
}

#[test]
fn test_import_cycle_is_a_warning_at_every_module() {
    let (_, report) = analyze_sources(&IMPORT_CYCLE);
    assert_no_errors(&report);
    let msgs = messages(&report);
    assert_eq!(
        msgs,
        vec![
            "Circular import chain is not recommended: A -> B -> C -> A",
            "Circular import chain is not recommended: B -> C -> A -> B",
            "Circular import chain is not recommended: C -> A -> B -> C",
        ]
    );
}

#[test]
fn test_checkpoint_restores_chain() {
    let markers = Markers::new();
    let mut chain = ReferenceChain::circular_reference(&markers);
    chain.add(&entry(1, "X"));
    chain.add(&entry(2, "Y"));
    chain.mark_state();
    assert!(chain.add(&entry(3, "Z")));
    chain.previous_state();
    assert_eq!(chain.ids(), vec![entry(1, "X").id, entry(2, "Y").id]);
    assert!(chain.add(&entry(3, "Z")));
    assert!(markers.all().is_empty());
}

#[rstest]
#[case(&["L", "R"], &["R", "L"])]
#[case(&["L"], &["L", "R"])]
fn test_sibling_branches_do_not_see_each_other(#[case] left: &[&str], #[case] right: &[&str]) {
    let markers = Markers::new();
    let mut chain = ReferenceChain::circular_reference(&markers);
    chain.add(&entry(0, "root"));
    for branch in [left, right] {
        chain.mark_state();
        for (idx, name) in branch.iter().enumerate() {
            let local = if *name == "L" { 10 } else { 20 };
            assert!(chain.add(&entry(local, name)), "branch step {}", idx);
        }
        chain.previous_state();
    }
    assert_eq!(chain.len(), 1);
    assert!(markers.all().is_empty());
}

#[test]
fn test_repeat_within_one_branch_is_a_cycle() {
    let markers = Markers::new();
    let mut chain = ReferenceChain::circular_reference(&markers);
    chain.add(&entry(0, "root"));
    chain.mark_state();
    chain.add(&entry(1, "P"));
    assert!(!chain.add(&entry(1, "P")));
    chain.previous_state();
    let all = markers.all();
    assert_eq!(all.len(), 1);
    assert_eq!(&*all[0].message, "Circular reference chain: `P -> P'");
}
