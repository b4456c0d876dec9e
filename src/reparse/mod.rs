//! Incremental reparsing.
//!
//! An edit replaces `[damage_start, damage_end)` of the old text. Instead of
//! parsing the whole file again, [`Module::update_syntax`](crate::syntax::Module)
//! walks down to the smallest node that can re-derive itself from the new
//! text:
//!
//! - edits before the module only move it;
//! - edits after the body reparse the trailing `with` clause;
//! - edits of an identifier re-lex that one token;
//! - edits inside the module body or a statement block patch the one item
//!   enveloping the damage, or reparse the run of items between the nearest
//!   unaffected neighbours and splice it in.
//!
//! Everything else yields a [`ReparseError`] and the caller parses the file
//! again. Every patched node loses its check stamp so the next analysis
//! looks at it again.

mod error;
mod fragment;
mod list;
mod module;
mod statements;
mod updater;

pub use error::ReparseError;
pub use updater::{ReparseUpdater, TextEdit};
