//! Identifiers as they appear in TTCN-3 and ASN.1 sources.

use std::fmt;
use std::hash::{Hash, Hasher};

use super::{Location, Name};

/// Which language the identifier was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    /// Written in TTCN-3 source; the display form is the name itself.
    Ttcn,
    /// Written in ASN.1 source; hyphens are mapped to underscores in the name.
    Asn,
}

/// A name plus the form it was written in.
///
/// Two identifiers are equal if their names are equal, regardless of their
/// display form or location.
#[derive(Clone)]
pub struct Identifier {
    name: Name,
    display: Name,
    kind: IdentifierKind,
    location: Location,
}

impl Identifier {
    pub fn new(kind: IdentifierKind, text: impl Into<Name>, location: Location) -> Self {
        let display: Name = text.into();
        let name = match kind {
            IdentifierKind::Ttcn => display.clone(),
            IdentifierKind::Asn if display.contains('-') => Name::new(display.replace('-', "_")),
            IdentifierKind::Asn => display.clone(),
        };
        Self {
            name,
            display,
            kind,
            location,
        }
    }

    pub fn ttcn(text: impl Into<Name>, location: Location) -> Self {
        Self::new(IdentifierKind::Ttcn, text, location)
    }

    /// An identifier that does not come from source text.
    pub fn synthetic(text: impl Into<Name>) -> Self {
        Self::new(IdentifierKind::Ttcn, text, Location::none())
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut Location {
        &mut self.location
    }

    /// Checks that `text` could be lexed as a single TTCN-3 identifier.
    pub fn is_valid_ttcn_name(text: &str) -> bool {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
                chars.all(unicode_ident::is_xid_continue)
            }
            _ => false,
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({} {:?})", self.display, self.location)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;

    #[test]
    fn test_equality_ignores_location() {
        let a = Identifier::ttcn("foo", Location::from_offsets(FileId::new(0), 0, 3));
        let b = Identifier::ttcn("foo", Location::from_offsets(FileId::new(1), 10, 13));
        assert_eq!(a, b);
    }

    #[test]
    fn test_asn_names_map_hyphens() {
        let id = Identifier::new(IdentifierKind::Asn, "my-type", Location::none());
        assert_eq!(id.name().as_str(), "my_type");
        assert_eq!(id.display_name(), "my-type");
        assert_eq!(id, Identifier::synthetic("my_type"));
    }

    #[test]
    fn test_valid_ttcn_names() {
        assert!(Identifier::is_valid_ttcn_name("abc_1"));
        assert!(Identifier::is_valid_ttcn_name("_x"));
        assert!(!Identifier::is_valid_ttcn_name("1abc"));
        assert!(!Identifier::is_valid_ttcn_name("a b"));
        assert!(!Identifier::is_valid_ttcn_name(""));
    }
}
