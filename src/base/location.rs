//! Source locations owned by AST nodes.

use std::fmt;

use text_size::{TextRange, TextSize};

use super::FileId;

/// A byte range inside one source file.
///
/// Every AST node owns its location exclusively. Nodes without a source
/// position (synthetic definitions, values created during checking) carry
/// [`Location::none`] instead of an `Option`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    file: FileId,
    range: TextRange,
}

impl Location {
    pub const fn new(file: FileId, range: TextRange) -> Self {
        Self { file, range }
    }

    /// The null location.
    pub fn none() -> Self {
        Self {
            file: FileId::NONE,
            range: TextRange::empty(TextSize::new(0)),
        }
    }

    pub fn from_offsets(file: FileId, start: u32, end: u32) -> Self {
        Self::new(file, TextRange::new(start.into(), end.into()))
    }

    pub fn is_none(&self) -> bool {
        self.file.is_none()
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn offset(&self) -> u32 {
        self.range.start().into()
    }

    pub fn end_offset(&self) -> u32 {
        self.range.end().into()
    }

    pub fn set_offsets(&mut self, start: u32, end: u32) {
        if self.is_none() {
            return;
        }
        self.range = TextRange::new(start.into(), end.max(start).into());
    }

    pub fn set_end_offset(&mut self, end: u32) {
        let start = self.offset();
        self.set_offsets(start, end);
    }

    /// The smallest location covering both `self` and `other`.
    pub fn cover(&self, other: &Location) -> Location {
        if self.is_none() {
            return *other;
        }
        if other.is_none() {
            return *self;
        }
        Location::new(self.file, self.range.cover(other.range))
    }

    pub fn contains_offset(&self, offset: u32) -> bool {
        !self.is_none() && self.offset() <= offset && offset <= self.end_offset()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "<no location>")
        } else {
            write!(f, "{}@{:?}", self.file, self.range)
        }
    }
}
