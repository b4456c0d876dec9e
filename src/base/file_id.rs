/// Identifier of a source file inside a project.
///
/// File ids are handed out by the project source parser and stay stable for
/// the lifetime of the file in the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(u32);

impl FileId {
    /// The file id carried by [`Location::none`](super::Location::none).
    pub const NONE: FileId = FileId(u32::MAX);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn index(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "<no file>")
        } else {
            write!(f, "file#{}", self.0)
        }
    }
}
