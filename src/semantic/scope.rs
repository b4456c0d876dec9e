//! Local scopes of function bodies and control parts.

use crate::base::Identifier;
use crate::syntax::{Module, ParamDirection, Type};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalKind {
    Variable,
    Parameter(ParamDirection),
    ComponentVar,
    ComponentConst,
    ComponentPort,
}

impl LocalKind {
    pub fn description(&self) -> &'static str {
        match self {
            LocalKind::Variable => "variable",
            LocalKind::Parameter(_) => "formal parameter",
            LocalKind::ComponentVar => "component variable",
            LocalKind::ComponentConst => "component constant",
            LocalKind::ComponentPort => "port",
        }
    }

    /// Whether the entry may appear on the left side of an assignment.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            LocalKind::Variable | LocalKind::Parameter(_) | LocalKind::ComponentVar
        )
    }

    /// Whether the entry may appear in a constant expression.
    pub fn is_constant(&self) -> bool {
        matches!(self, LocalKind::ComponentConst)
    }
}

/// A name declared in a local scope.
///
/// `module` is the module the declaration lives in; component elements
/// brought in by `runs on` may come from another module, and their types are
/// resolved there.
#[derive(Clone, Copy, Debug)]
pub struct LocalEntry<'a> {
    pub identifier: &'a Identifier,
    pub ty: &'a Type,
    pub kind: LocalKind,
    pub module: &'a Module,
}

/// Nested local scopes, innermost last.
#[derive(Debug, Default)]
pub struct ScopeStack<'a> {
    frames: Vec<Vec<LocalEntry<'a>>>,
}

impl<'a> ScopeStack<'a> {
    pub fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Add `entry` to the innermost scope.
    ///
    /// Names must be unique across the whole stack; on a clash the earlier
    /// entry is returned and nothing is added.
    pub fn declare(&mut self, entry: LocalEntry<'a>) -> Result<(), LocalEntry<'a>> {
        if let Some(previous) = self.lookup(entry.identifier.name()) {
            return Err(previous);
        }
        if self.frames.is_empty() {
            self.frames.push(Vec::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.push(entry);
        }
        Ok(())
    }

    /// The innermost entry called `name`.
    pub fn lookup(&self, name: &str) -> Option<LocalEntry<'a>> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|entry| entry.identifier.name() == name)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, Location};
    use crate::syntax::parse_file;

    #[test]
    fn test_inner_scope_is_dropped_on_pop() {
        let module = parse_file(FileId::new(0), "module M { type integer T; }")
            .module
            .expect("module");
        let ty = module.definitions().next().and_then(|d| d.declared_type()).expect("type");
        let x = Identifier::ttcn("x", Location::none());
        let y = Identifier::ttcn("y", Location::none());
        let entry = |identifier| LocalEntry {
            identifier,
            ty,
            kind: LocalKind::Variable,
            module: &module,
        };

        let mut scope = ScopeStack::new();
        scope.declare(entry(&x)).expect("declare x");
        scope.push();
        scope.declare(entry(&y)).expect("declare y");
        assert!(scope.declare(entry(&x)).is_err());
        assert!(scope.lookup("y").is_some());
        scope.pop();
        assert!(scope.lookup("y").is_none());
        assert!(scope.lookup("x").is_some());
    }
}
