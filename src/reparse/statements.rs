//! Patching statement blocks.

use crate::base::Location;
use crate::syntax::{Relocate, Statement, StatementBlock, StatementKind};

use super::error::ReparseError;
use super::fragment::FragmentParser;
use super::list::{ListItem, shift_items, update_list};
use super::updater::ReparseUpdater;

impl StatementBlock {
    /// Patch a block whose braces strictly contain the damage.
    pub(crate) fn update_syntax(
        &mut self,
        updater: &mut ReparseUpdater<'_>,
        fragments: &mut FragmentParser,
    ) -> Result<(), ReparseError> {
        if !updater.is_inside(self.location) {
            return Err(ReparseError::unhandled(
                updater.damage_start(),
                updater.damage_end(),
            ));
        }
        let inner_start = self.location.offset() + 1;
        let inner_end = self.location.end_offset() - 1;
        update_list(&mut self.statements, inner_start, inner_end, updater, fragments)?;
        self.location.relocate(&mut |location| updater.update_location(location));
        self.state.invalidate();
        Ok(())
    }
}

impl ListItem for Statement {
    fn location(&self) -> Location {
        self.location
    }

    fn update_syntax(
        &mut self,
        updater: &mut ReparseUpdater<'_>,
        fragments: &mut FragmentParser,
    ) -> Result<(), ReparseError> {
        match &mut self.kind {
            StatementKind::Alt(guards) | StatementKind::Interleave(guards) => {
                let Some(idx) = guards
                    .guards
                    .iter()
                    .position(|guard| updater.is_inside(guard.block.location))
                else {
                    return Err(ReparseError::unhandled(
                        updater.damage_start(),
                        updater.damage_end(),
                    ));
                };
                let guard = &mut guards.guards[idx];
                guard.block.update_syntax(updater, fragments)?;
                guard.location.relocate(&mut |location| updater.update_location(location));
                shift_items(&mut guards.guards[idx + 1..], updater);
            }
            StatementKind::Block(block) => block.update_syntax(updater, fragments)?,
            _ => {
                return Err(ReparseError::unhandled(
                    updater.damage_start(),
                    updater.damage_end(),
                ));
            }
        }
        self.location.relocate(&mut |location| updater.update_location(location));
        Ok(())
    }

    fn parse_run(
        fragments: &mut FragmentParser,
        text: &str,
        base: u32,
    ) -> Result<Vec<Self>, ReparseError> {
        fragments.statements(text, base)
    }
}
