//! Incremental patches produce the same tree as a full parse.

use rstest::rstest;
use ttcn::base::FileId;
use ttcn::reparse::{ReparseError, ReparseUpdater, TextEdit};
use ttcn::syntax::{Module, NodeRef, VisitAction, fingerprint, parse_file, walk_module};

use crate::helpers::source_fixtures::EDITABLE;

fn parse(text: &str) -> Module {
    parse_file(FileId::new(3), text).module.expect("module")
}

fn locations(module: &Module) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    walk_module(module, &mut |node: NodeRef<'_>| {
        let location = node.location();
        out.push((location.offset(), location.end_offset()));
        VisitAction::Continue
    });
    out
}

/// Replace the first occurrence of `needle` and patch a clone of the tree.
fn patch_replacing(needle: &str, replacement: &str) -> (Result<Module, ReparseError>, String) {
    let start = EDITABLE.find(needle).expect("needle") as u32;
    let edit = TextEdit::new(start, start + needle.len() as u32, replacement);
    patch(&edit)
}

fn patch(edit: &TextEdit) -> (Result<Module, ReparseError>, String) {
    let mut module = parse(EDITABLE);
    let text = edit.apply(EDITABLE).expect("edit in bounds");
    let mut updater = ReparseUpdater::for_edit(&text, edit);
    let result = module.update_syntax(&mut updater).map(|()| module);
    (result, text)
}

#[rstest]
#[case::rename_type("Small", "Tiny")]
#[case::widen_constraint("9)", "99)")]
#[case::rename_parameter("in integer n", "in integer count")]
#[case::edit_nested_block("x := limit", "x := limit + 1")]
#[case::edit_alt_branch("x - 1", "x - 2")]
#[case::drop_else_branch("[else] { }", "")]
#[case::add_port_message("inout integer", "inout integer; in charstring")]
#[case::edit_control("r := limit", "r := 2")]
#[case::rename_function("run(", "execute(")]
#[case::add_definition(
    "    const integer limit",
    "    const integer floor := 0;\n    const integer limit"
)]
fn test_single_edit_matches_full_parse(#[case] needle: &str, #[case] replacement: &str) {
    let (patched, text) = patch_replacing(needle, replacement);
    let patched = patched.unwrap_or_else(|e| panic!("{} on:\n{}", e, text));
    let full = parse(&text);
    assert_eq!(fingerprint(&patched), fingerprint(&full), "{}", text);
    assert_eq!(locations(&patched), locations(&full), "{}", text);
}

#[rstest]
#[case::encode(" with { encode \"BER\" }")]
#[case::version(" with { extension \"version R2A\" }")]
fn test_trailing_attribute_matches_full_parse(#[case] clause: &str) {
    let end = EDITABLE.trim_end().len() as u32;
    let (patched, text) = patch(&TextEdit::insert(end, clause));
    let patched = patched.expect("trailing clause");
    let full = parse(&text);
    assert!(patched.with_attributes.is_some());
    assert_eq!(fingerprint(&patched), fingerprint(&full));
    assert_eq!(locations(&patched), locations(&full));
}

#[rstest]
#[case::broken_keyword("type integer Small", "typ integer Small")]
#[case::module_keyword("module Edit", "modul Edit")]
#[case::unterminated_block("{ x := limit; }", "{ x := limit;")]
fn test_unpatchable_edit_requires_reparse(#[case] needle: &str, #[case] replacement: &str) {
    let (patched, _) = patch_replacing(needle, replacement);
    assert!(patched.is_err());
}

#[test]
fn test_patched_nodes_lose_their_stamp() {
    use ttcn::semantic::CompilationTimestamp;

    let mut module = parse(EDITABLE);
    let ts = CompilationTimestamp::new_timestamp();
    module.state.begin(ts);
    for def in module.definitions() {
        def.state.begin(ts);
    }

    let start = EDITABLE.find("x - 1").unwrap() as u32;
    let edit = TextEdit::new(start, start + 5, "x - 3");
    let text = edit.apply(EDITABLE).unwrap();
    module
        .update_syntax(&mut ReparseUpdater::for_edit(&text, &edit))
        .unwrap();

    assert!(!module.state.is_checked(ts));
    assert!(!module.definition("run").unwrap().state.is_checked(ts));
    assert!(module.definition("limit").unwrap().state.is_checked(ts));
    assert!(module.definition("Small").unwrap().state.is_checked(ts));
}
