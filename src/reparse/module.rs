//! Patching modules, their item lists and definitions.

use crate::base::Location;
use crate::parser::tokenize;
use crate::syntax::{Definition, DefinitionKind, Module, ModuleItem, Relocate};

use super::error::ReparseError;
use super::fragment::{FragmentParser, reparse_identifier};
use super::list::{ListItem, update_list};
use super::updater::ReparseUpdater;

fn unhandled(updater: &ReparseUpdater<'_>) -> ReparseError {
    ReparseError::unhandled(updater.damage_start(), updater.damage_end())
}

impl Module {
    /// Patch the module after an edit.
    ///
    /// On `Err` the module may be partly updated and must be thrown away;
    /// callers patch a clone and parse the whole file again on failure.
    pub fn update_syntax(&mut self, updater: &mut ReparseUpdater<'_>) -> Result<(), ReparseError> {
        let mut fragments = FragmentParser::new(self.file(), self.next_node);
        let result = self.update_module(updater, &mut fragments);
        self.next_node = fragments.next_node();
        if result.is_ok() {
            tracing::debug!(
                module = %self.name(),
                start = updater.damage_start(),
                end = updater.damage_end(),
                shift = updater.shift(),
                "module patched"
            );
        }
        result
    }

    fn update_module(
        &mut self,
        updater: &mut ReparseUpdater<'_>,
        fragments: &mut FragmentParser,
    ) -> Result<(), ReparseError> {
        let start = self.location.offset();
        if updater.damage_end() <= start {
            // Only comments and whitespace may precede the module.
            let prefix = updater
                .text()
                .get(..updater.new_offset(start) as usize)
                .ok_or_else(|| unhandled(updater))?;
            if tokenize(prefix).iter().any(|token| !token.kind.is_trivia()) {
                return Err(unhandled(updater));
            }
            self.relocate(&mut |location| updater.update_location(location));
            return Ok(());
        }

        if self.body_location.is_none() {
            return Err(unhandled(updater));
        }
        let body_end = self.body_location.end_offset();

        if updater.damage_start() >= body_end {
            return self.update_trailing(updater, fragments, body_end);
        }

        let identifier = *self.identifier.location();
        if updater.is_damaged(identifier) || updater.is_extending(identifier) {
            let renamed = reparse_identifier(updater, &self.identifier)?;
            self.relocate(&mut |location| updater.update_location(location));
            tracing::debug!(from = %self.identifier, to = %renamed, "module renamed");
            self.identifier = renamed;
            self.invalidate();
            return Ok(());
        }

        if updater.is_inside(self.body_location) {
            let inner_start = self.body_location.offset() + 1;
            let inner_end = body_end - 1;
            update_list(&mut self.items, inner_start, inner_end, updater, fragments)?;
            self.location.relocate(&mut |location| updater.update_location(location));
            self.body_location.relocate(&mut |location| updater.update_location(location));
            self.with_attributes.relocate(&mut |location| updater.update_location(location));
            self.reindex();
            self.invalidate();
            return Ok(());
        }

        Err(unhandled(updater))
    }

    /// Reparse everything after the closing brace of the body.
    fn update_trailing(
        &mut self,
        updater: &mut ReparseUpdater<'_>,
        fragments: &mut FragmentParser,
        body_end: u32,
    ) -> Result<(), ReparseError> {
        updater.extend_damaged_region_till_file_end();
        let text = updater
            .text()
            .get(body_end as usize..)
            .ok_or_else(|| unhandled(updater))?;
        let trailing = fragments.trailing_with(text, body_end)?;
        self.with_attributes = trailing.with_attributes;
        self.location.set_end_offset(trailing.end.unwrap_or(body_end));
        self.state.invalidate();
        Ok(())
    }

    /// Forget the check stamps the module itself owns.
    fn invalidate(&self) {
        self.state.invalidate();
        self.import_state.invalidate();
    }
}

impl ListItem for ModuleItem {
    fn location(&self) -> Location {
        ModuleItem::location(self)
    }

    fn update_syntax(
        &mut self,
        updater: &mut ReparseUpdater<'_>,
        fragments: &mut FragmentParser,
    ) -> Result<(), ReparseError> {
        match self {
            ModuleItem::Definition(definition) => definition.update_syntax(updater, fragments),
            ModuleItem::Control(control) => {
                if !updater.is_inside(control.block.location) {
                    return Err(unhandled(updater));
                }
                control.block.update_syntax(updater, fragments)?;
                control.location.relocate(&mut |location| updater.update_location(location));
                control
                    .with_attributes
                    .relocate(&mut |location| updater.update_location(location));
                Ok(())
            }
            ModuleItem::Import(_) | ModuleItem::Friend(_) => Err(unhandled(updater)),
        }
    }

    fn parse_run(
        fragments: &mut FragmentParser,
        text: &str,
        base: u32,
    ) -> Result<Vec<Self>, ReparseError> {
        fragments.module_items(text, base)
    }
}

impl Definition {
    /// Patch a definition in place: a renamed identifier, or an edit strictly
    /// inside a function body. Anything else is left to the enclosing list.
    pub(crate) fn update_syntax(
        &mut self,
        updater: &mut ReparseUpdater<'_>,
        fragments: &mut FragmentParser,
    ) -> Result<(), ReparseError> {
        let identifier = *self.identifier.location();
        if updater.is_damaged(identifier) || updater.is_extending(identifier) {
            let renamed = reparse_identifier(updater, &self.identifier)?;
            self.relocate(&mut |location| updater.update_location(location));
            self.identifier = renamed;
            self.invalidate();
            return Ok(());
        }

        let DefinitionKind::Function(function) = &mut self.kind else {
            return Err(unhandled(updater));
        };
        if !updater.is_inside(function.body.location) {
            return Err(unhandled(updater));
        }
        function.body.update_syntax(updater, fragments)?;
        self.location.relocate(&mut |location| updater.update_location(location));
        self.with_attributes
            .relocate(&mut |location| updater.update_location(location));
        self.invalidate();
        Ok(())
    }

    fn invalidate(&self) {
        self.state.invalidate();
        if let DefinitionKind::Type(ty) = &self.kind {
            ty.state.invalidate();
        }
    }
}
