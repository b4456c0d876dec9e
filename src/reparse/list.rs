//! Splicing of item lists: module bodies and statement blocks.

use crate::base::Location;
use crate::syntax::Relocate;

use super::error::ReparseError;
use super::fragment::FragmentParser;
use super::updater::ReparseUpdater;

/// An element of a list the reparser can splice.
pub(crate) trait ListItem: Relocate + Clone {
    fn location(&self) -> Location;

    /// Patch the item in place. On success the item and everything it owns
    /// are in new-text coordinates.
    fn update_syntax(
        &mut self,
        updater: &mut ReparseUpdater<'_>,
        fragments: &mut FragmentParser,
    ) -> Result<(), ReparseError>;

    /// Parse a run of items from `text`, which starts at `base` in the file.
    fn parse_run(
        fragments: &mut FragmentParser,
        text: &str,
        base: u32,
    ) -> Result<Vec<Self>, ReparseError>;
}

/// Apply the damage to `items`, the contents of the old region
/// `[inner_start, inner_end)`.
///
/// A single item enveloping the damage is patched in place when it knows
/// how; otherwise the region between the nearest unaffected neighbours is
/// parsed again and spliced in. Items after the damage are shifted.
pub(crate) fn update_list<T: ListItem>(
    items: &mut Vec<T>,
    inner_start: u32,
    inner_end: u32,
    updater: &mut ReparseUpdater<'_>,
    fragments: &mut FragmentParser,
) -> Result<(), ReparseError> {
    let affected: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| updater.is_affected(item.location()))
        .map(|(idx, _)| idx)
        .collect();

    if let [idx] = affected[..] {
        if updater.envelops_damage(items[idx].location()) {
            let mut patched = items[idx].clone();
            let mut attempt = *updater;
            match patched.update_syntax(&mut attempt, fragments) {
                Ok(()) => {
                    *updater = attempt;
                    shift_items(&mut items[idx + 1..], updater);
                    items[idx] = patched;
                    return Ok(());
                }
                Err(err) => {
                    tracing::trace!(error = %err, "in-place patch failed, reparsing region")
                }
            }
        }
    }

    let damage_start = updater.damage_start();
    let damage_end = updater.damage_end();
    let first = items
        .iter()
        .rposition(|item| item.location().end_offset() < damage_start)
        .map_or(0, |idx| idx + 1);
    let last = items
        .iter()
        .position(|item| item.location().offset() > damage_end)
        .unwrap_or(items.len());
    let region_start = first
        .checked_sub(1)
        .map_or(inner_start, |idx| items[idx].location().end_offset());
    let region_end = items
        .get(last)
        .map_or(inner_end, |item| item.location().offset());
    if region_start > damage_start || region_end < damage_end {
        return Err(ReparseError::unhandled(damage_start, damage_end));
    }

    updater.extend_damaged_region(region_start, region_end);
    let text = updater.new_text(region_start, region_end)?;
    let fresh = T::parse_run(fragments, text, region_start)?;
    tracing::trace!(
        start = region_start,
        end = region_end,
        replaced = last - first,
        parsed = fresh.len(),
        "region reparsed"
    );
    shift_items(&mut items[last..], updater);
    items.splice(first..last, fresh);
    Ok(())
}

/// Move items that lie after the damage.
pub(crate) fn shift_items<T: Relocate>(items: &mut [T], updater: &ReparseUpdater<'_>) {
    for item in items {
        item.relocate(&mut |location| updater.update_location(location));
    }
}
