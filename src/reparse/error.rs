//! Error type for incremental reparsing.

use thiserror::Error;

/// Signals that an edit cannot be patched into the existing tree.
///
/// None of these are user facing: the caller discards the patched copy and
/// parses the whole file again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReparseError {
    /// The damage has a shape no local rule covers.
    #[error("damage {start}..{end} cannot be patched locally")]
    Unhandled { start: u32, end: u32 },

    /// The reparsed fragment is not syntactically valid on its own.
    #[error("syntax error in reparsed fragment at {offset}: {message}")]
    Syntax { message: String, offset: u32 },

    /// An edited identifier no longer lexes as one identifier.
    #[error("`{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    /// The edit does not fit the text it is applied to.
    #[error("edit {start}..{end} is outside the {len} bytes of the text")]
    InvalidEdit { start: u32, end: u32, len: usize },
}

impl ReparseError {
    pub fn unhandled(start: u32, end: u32) -> Self {
        Self::Unhandled { start, end }
    }

    pub fn syntax(message: impl Into<String>, offset: u32) -> Self {
        Self::Syntax {
            message: message.into(),
            offset,
        }
    }
}
