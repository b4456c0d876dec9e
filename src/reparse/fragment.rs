//! Parsing and lowering of the text fragments spliced into a tree.

use crate::base::{FileId, Identifier, Location};
use crate::parser::{
    Parse, SyntaxKind, parse_module_items, parse_optional_with, parse_statements, tokenize,
};
use crate::syntax::{Lowerer, ModuleItem, Statement, WithAttributes};

use super::error::ReparseError;
use super::updater::ReparseUpdater;

/// Lowers fragments of one file, continuing its node id sequence.
#[derive(Debug)]
pub(crate) struct FragmentParser {
    file: FileId,
    next_node: u32,
}

/// A lowered trailing clause and the end of its last token.
pub(crate) struct Trailing {
    pub with_attributes: Option<WithAttributes>,
    pub end: Option<u32>,
}

fn check(parse: &Parse) -> Result<(), ReparseError> {
    match parse.errors.first() {
        Some(error) => Err(ReparseError::syntax(
            error.message.clone(),
            error.range.start().into(),
        )),
        None => Ok(()),
    }
}

impl FragmentParser {
    pub fn new(file: FileId, next_node: u32) -> Self {
        Self { file, next_node }
    }

    pub fn next_node(&self) -> u32 {
        self.next_node
    }

    fn lowerer(&self, base: u32) -> Lowerer {
        Lowerer::new(self.file, base, self.next_node)
    }

    pub fn module_items(&mut self, text: &str, base: u32) -> Result<Vec<ModuleItem>, ReparseError> {
        let parse = parse_module_items(text, base);
        check(&parse)?;
        let mut lowerer = self.lowerer(base);
        let items = lowerer.module_items(&parse.syntax());
        self.next_node = lowerer.next_local();
        Ok(items)
    }

    pub fn statements(&mut self, text: &str, base: u32) -> Result<Vec<Statement>, ReparseError> {
        let parse = parse_statements(text, base);
        check(&parse)?;
        let mut lowerer = self.lowerer(base);
        let statements = lowerer.statements(&parse.syntax());
        self.next_node = lowerer.next_local();
        Ok(statements)
    }

    /// The text after a module body: nothing, or a `with` clause.
    pub fn trailing_with(&mut self, text: &str, base: u32) -> Result<Trailing, ReparseError> {
        let parse = parse_optional_with(text, base);
        check(&parse)?;
        let root = parse.syntax();
        let end = root
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| !token.kind().is_trivia())
            .last()
            .map(|token| u32::from(token.text_range().end()) + base);
        let mut lowerer = self.lowerer(base);
        let with_attributes = root
            .children()
            .find(|node| node.kind() == SyntaxKind::WITH_STMT)
            .map(|node| lowerer.with_attributes(&node));
        self.next_node = lowerer.next_local();
        Ok(Trailing {
            with_attributes,
            end,
        })
    }
}

/// Re-lex an edited identifier.
///
/// The damage must lie within `old` or touch one of its ends; the new text
/// of that span has to be exactly one identifier token.
pub(crate) fn reparse_identifier(
    updater: &ReparseUpdater<'_>,
    old: &Identifier,
) -> Result<Identifier, ReparseError> {
    let location = *old.location();
    if !updater.envelops_damage(location) {
        return Err(ReparseError::unhandled(
            updater.damage_start(),
            updater.damage_end(),
        ));
    }
    let start = location.offset();
    let text = updater.new_text(start, location.end_offset())?;
    let tokens = tokenize(text);
    let single = matches!(tokens.as_slice(), [token] if token.kind == SyntaxKind::IDENT);
    if !single || !Identifier::is_valid_ttcn_name(text) {
        return Err(ReparseError::InvalidIdentifier(text.to_string()));
    }
    let end = start + text.len() as u32;
    tracing::trace!(old = %old, new = text, "identifier reparsed");
    Ok(Identifier::ttcn(
        text,
        Location::from_offsets(location.file(), start, end),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reparse::TextEdit;
    use rstest::rstest;

    #[rstest]
    #[case(TextEdit::insert(3, "_x"), Some("foo_x"))]
    #[case(TextEdit::insert(0, "a"), Some("afoo"))]
    #[case(TextEdit::new(1, 2, "ii"), Some("fiio"))]
    #[case(TextEdit::insert(3, " "), None)]
    #[case(TextEdit::new(0, 3, "const"), None)]
    #[case(TextEdit::new(0, 1, "1"), None)]
    fn test_reparse_identifier(#[case] edit: TextEdit, #[case] expected: Option<&str>) {
        let old_text = "foo := 1";
        let old = Identifier::ttcn("foo", Location::from_offsets(FileId::new(0), 0, 3));
        let text = edit.apply(old_text).unwrap();
        let updater = ReparseUpdater::for_edit(&text, &edit);
        let result = reparse_identifier(&updater, &old);
        assert_eq!(result.as_ref().ok().map(|id| id.display_name()), expected);
        if let Ok(identifier) = result {
            assert_eq!(
                identifier.location().end_offset() as usize,
                identifier.display_name().len()
            );
        }
    }

    #[test]
    fn test_fragment_errors_become_reparse_errors() {
        let mut fragments = FragmentParser::new(FileId::new(0), 100);
        let err = fragments.statements("var integer := ;", 40).unwrap_err();
        assert!(matches!(err, ReparseError::Syntax { offset, .. } if offset >= 40));
        let items = fragments.module_items(" const integer c := 1; ", 10).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].location().offset(), 11);
        assert!(fragments.next_node() > 100);
    }

    #[test]
    fn test_trailing_with() {
        let mut fragments = FragmentParser::new(FileId::new(0), 0);
        let trailing = fragments.trailing_with("  with { encode \"X\" } ;\n", 50).unwrap();
        assert_eq!(trailing.end, Some(73));
        assert_eq!(trailing.with_attributes.map(|w| w.location.offset()), Some(52));
        let empty = fragments.trailing_with("\n// done\n", 50).unwrap();
        assert!(empty.with_attributes.is_none() && empty.end.is_none());
        assert!(fragments.trailing_with(" junk", 50).is_err());
    }
}
