//! String interner for efficient name storage and comparison.
//!
//! Uses [`SmolStr`] for cheap cloning: short names are stored inline and
//! longer ones share a single reference-counted allocation.
//! The interner deduplicates names so identical names share the same allocation.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

/// An interned name - cheap to clone and `Send + Sync`.
pub type Name = SmolStr;

/// Name interner that deduplicates strings.
///
/// Interning a string returns a [`Name`] that can be cheaply cloned.
/// If the same string is interned multiple times, a clone of the stored
/// name is returned.
#[derive(Debug, Default, Clone)]
pub struct Interner {
    names: FxHashSet<Name>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning a cheap-to-clone name.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(existing) = self.names.get(s) {
            existing.clone()
        } else {
            let name = Name::new(s);
            self.names.insert(name.clone());
            name
        }
    }

    /// Get an interned name if it exists, without creating it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.names.get(s).cloned()
    }

    /// Number of unique names interned.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no names have been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Clear all interned names.
    pub fn clear(&mut self) {
        self.names.clear();
    }
}
