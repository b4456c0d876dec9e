//! Damage region bookkeeping.

use crate::base::Location;

use super::error::ReparseError;

/// One text replacement: `[start, end)` of the old text becomes `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: u32,
    pub end: u32,
    pub text: String,
}

impl TextEdit {
    pub fn new(start: u32, end: u32, text: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            text: text.into(),
        }
    }

    pub fn insert(offset: u32, text: impl Into<String>) -> Self {
        Self::new(offset, offset, text)
    }

    pub fn delete(start: u32, end: u32) -> Self {
        Self::new(start, end, "")
    }

    /// Length delta of the edit.
    pub fn shift(&self) -> i32 {
        self.text.len() as i32 - (self.end - self.start) as i32
    }

    /// The old text with the edit applied.
    pub fn apply(&self, old: &str) -> Result<String, ReparseError> {
        let invalid = || ReparseError::InvalidEdit {
            start: self.start,
            end: self.end,
            len: old.len(),
        };
        let (start, end) = (self.start as usize, self.end as usize);
        let before = old.get(..start).ok_or_else(invalid)?;
        let after = old.get(end..).ok_or_else(invalid)?;
        let mut new = String::with_capacity(before.len() + self.text.len() + after.len());
        new.push_str(before);
        new.push_str(&self.text);
        new.push_str(after);
        Ok(new)
    }
}

/// The damaged region of one edit and the text after the edit.
///
/// Damage offsets refer to the old text; `shift` is the length delta. Nodes
/// keep old offsets until [`ReparseUpdater::update_location`] moves them.
#[derive(Debug, Clone, Copy)]
pub struct ReparseUpdater<'t> {
    text: &'t str,
    damage_start: u32,
    damage_end: u32,
    shift: i32,
}

impl<'t> ReparseUpdater<'t> {
    pub fn new(text: &'t str, damage_start: u32, damage_end: u32, shift: i32) -> Self {
        Self {
            text,
            damage_start,
            damage_end: damage_end.max(damage_start),
            shift,
        }
    }

    /// Updater for `edit`, given the text with the edit already applied.
    pub fn for_edit(text: &'t str, edit: &TextEdit) -> Self {
        Self::new(text, edit.start, edit.end, edit.shift())
    }

    /// The text after the edit.
    pub fn text(&self) -> &'t str {
        self.text
    }

    pub fn damage_start(&self) -> u32 {
        self.damage_start
    }

    pub fn damage_end(&self) -> u32 {
        self.damage_end
    }

    pub fn shift(&self) -> i32 {
        self.shift
    }

    /// Map an old offset at or after the damage end to the new text.
    pub fn shifted(&self, offset: u32) -> u32 {
        offset.saturating_add_signed(self.shift)
    }

    /// Map an old offset outside the damage to the new text.
    pub fn new_offset(&self, offset: u32) -> u32 {
        if offset >= self.damage_end {
            self.shifted(offset)
        } else {
            offset
        }
    }

    /// Move a location that lies after the damage, or stretch the end of
    /// one that contains it.
    pub fn update_location(&self, location: &mut Location) {
        let (start, end) = (location.offset(), location.end_offset());
        if start >= self.damage_end {
            location.set_offsets(self.shifted(start), self.shifted(end));
        } else if end >= self.damage_end {
            location.set_end_offset(self.shifted(end));
        }
    }

    pub fn envelops_damage(&self, location: Location) -> bool {
        location.offset() <= self.damage_start && self.damage_end <= location.end_offset()
    }

    /// Strictly inside `location`, not touching either end.
    pub fn is_inside(&self, location: Location) -> bool {
        location.offset() < self.damage_start && self.damage_end < location.end_offset()
    }

    /// The damage touches or overlaps `location`.
    pub fn is_affected(&self, location: Location) -> bool {
        self.damage_start <= location.end_offset() && location.offset() <= self.damage_end
    }

    /// The damage overlaps `location` by at least one byte.
    pub fn is_damaged(&self, location: Location) -> bool {
        self.damage_start < location.end_offset() && location.offset() < self.damage_end
    }

    /// The damage is adjacent to `location` without overlapping it.
    pub fn is_extending(&self, location: Location) -> bool {
        self.damage_end == location.offset() || self.damage_start == location.end_offset()
    }

    /// Grow the damage to cover `[start, end)` of the old text.
    pub fn extend_damaged_region(&mut self, start: u32, end: u32) {
        self.damage_start = self.damage_start.min(start);
        self.damage_end = self.damage_end.max(end);
    }

    /// Grow the damage up to the end of the old text.
    pub fn extend_damaged_region_till_file_end(&mut self) {
        let old_len = (self.text.len() as i64 - self.shift as i64).max(0) as u32;
        self.damage_end = self.damage_end.max(old_len);
    }

    /// The new text of an old region whose end lies at or after the damage.
    pub fn new_text(&self, start: u32, end: u32) -> Result<&'t str, ReparseError> {
        let new_end = self.new_offset(end);
        self.text
            .get(start as usize..new_end as usize)
            .ok_or_else(|| ReparseError::unhandled(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;
    use rstest::rstest;

    fn loc(start: u32, end: u32) -> Location {
        Location::from_offsets(FileId::new(0), start, end)
    }

    #[test]
    fn test_text_edit_apply() {
        let edit = TextEdit::new(4, 7, "abcd");
        assert_eq!(edit.shift(), 1);
        assert_eq!(edit.apply("012 456 89").unwrap(), "012 abcd 89");
        assert!(TextEdit::insert(20, "x").apply("short").is_err());
        assert_eq!(TextEdit::delete(0, 4).apply("012 456").unwrap(), "456");
    }

    #[rstest]
    #[case((20, 25), (23, 28))] // after the damage
    #[case((5, 12), (5, 15))] // contains the damage
    #[case((0, 5), (0, 5))] // before the damage
    #[case((12, 15), (15, 18))] // starts at the damage end
    fn test_update_location(#[case] before: (u32, u32), #[case] after: (u32, u32)) {
        let updater = ReparseUpdater::new("", 10, 12, 3);
        let mut location = loc(before.0, before.1);
        updater.update_location(&mut location);
        assert_eq!((location.offset(), location.end_offset()), after);
    }

    #[test]
    fn test_damage_geometry() {
        let updater = ReparseUpdater::new("", 10, 12, 0);
        assert!(updater.envelops_damage(loc(10, 12)));
        assert!(updater.envelops_damage(loc(8, 14)));
        assert!(!updater.envelops_damage(loc(11, 14)));
        assert!(updater.is_inside(loc(9, 13)));
        assert!(!updater.is_inside(loc(10, 13)));
        assert!(updater.is_affected(loc(12, 20)));
        assert!(updater.is_affected(loc(2, 10)));
        assert!(!updater.is_affected(loc(13, 20)));
        assert!(updater.is_damaged(loc(11, 20)));
        assert!(!updater.is_damaged(loc(12, 20)));
        assert!(updater.is_extending(loc(12, 20)));
        assert!(updater.is_extending(loc(4, 10)));
        assert!(!updater.is_extending(loc(4, 11)));
    }

    #[test]
    fn test_extend_damage() {
        let mut updater = ReparseUpdater::new("0123456789ab", 5, 6, 2);
        updater.extend_damaged_region(3, 4);
        assert_eq!((updater.damage_start(), updater.damage_end()), (3, 6));
        updater.extend_damaged_region_till_file_end();
        assert_eq!(updater.damage_end(), 10);
        assert_eq!(updater.new_text(3, 10).unwrap(), "3456789ab");
    }
}
