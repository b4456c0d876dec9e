//! Cycle detection for recursive resolution.
//!
//! A [`ReferenceChain`] models one root-to-leaf path of nodes currently being
//! resolved. Adding a node that is already on the path reports the cycle and
//! refuses the add. Checkpoints let one chain serve a fan-out: each sibling
//! branch is resolved between [`ReferenceChain::mark_state`] and
//! [`ReferenceChain::previous_state`] so it never sees a previous sibling's
//! links.
//!
//! Chains are short-lived values owned by the resolving call; they are never
//! shared between threads.

use super::diagnostics::{Diagnostic, Markers, Severity, codes};
use crate::base::Location;
use crate::syntax::{Module, NodeId};

/// Message template for circular definitions; `{}` is replaced by the trace.
pub const CIRCULAR_REFERENCE: &str = "Circular reference chain: `{}'";
/// Message template for circular imports.
pub const CIRCULAR_IMPORT: &str = "Circular import chain is not recommended: {}";

/// A node that can take part in a reference chain.
pub trait ChainLink {
    /// Identity used for the membership test.
    fn chain_id(&self) -> NodeId;
    /// Human readable name used in cycle traces, usually the full name.
    fn chained_description(&self) -> String;
    fn chain_location(&self) -> Location;
}

/// A link built by the caller from a node and its full name.
#[derive(Clone, Debug)]
pub struct ChainEntry {
    pub id: NodeId,
    pub description: String,
    pub location: Location,
}

impl ChainEntry {
    pub fn new(id: NodeId, description: impl Into<String>, location: Location) -> Self {
        Self {
            id,
            description: description.into(),
            location,
        }
    }
}

impl ChainLink for ChainEntry {
    fn chain_id(&self) -> NodeId {
        self.id
    }

    fn chained_description(&self) -> String {
        self.description.clone()
    }

    fn chain_location(&self) -> Location {
        self.location
    }
}

impl ChainLink for Module {
    fn chain_id(&self) -> NodeId {
        self.id
    }

    fn chained_description(&self) -> String {
        self.identifier.display_name().to_string()
    }

    fn chain_location(&self) -> Location {
        *self.identifier.location()
    }
}

pub struct ReferenceChain<'m> {
    markers: &'m Markers,
    message: &'static str,
    severity: Severity,
    links: Vec<ChainEntry>,
    marked_states: Vec<usize>,
}

impl<'m> ReferenceChain<'m> {
    /// A chain reporting cycles with `message` as errors (or warnings).
    pub fn new(markers: &'m Markers, message: &'static str, is_error: bool) -> Self {
        Self {
            markers,
            message,
            severity: if is_error {
                Severity::Error
            } else {
                Severity::Warning
            },
            links: Vec::new(),
            marked_states: Vec::new(),
        }
    }

    /// A chain for circular definitions, reported as errors.
    pub fn circular_reference(markers: &'m Markers) -> Self {
        Self::new(markers, CIRCULAR_REFERENCE, true)
    }

    /// Append `link` unless it is already on the chain.
    ///
    /// On a repeat the cycle is reported, once for every link from the first
    /// occurrence to the end of the chain, each trace rotated to start at
    /// that link, and `false` is returned.
    pub fn add(&mut self, link: &impl ChainLink) -> bool {
        let id = link.chain_id();
        if let Some(first) = self.links.iter().position(|l| l.id == id) {
            self.report(first);
            return false;
        }
        self.links.push(ChainEntry::new(
            id,
            link.chained_description(),
            link.chain_location(),
        ));
        true
    }

    fn report(&self, first: usize) {
        let code = if self.severity == Severity::Error {
            codes::CIRCULAR_REFERENCE
        } else {
            codes::CIRCULAR_IMPORT
        };
        for i in first..self.links.len() {
            let trace = self.links[i..]
                .iter()
                .chain(&self.links[first..i])
                .chain(std::iter::once(&self.links[i]))
                .map(|l| l.description.as_str())
                .collect::<Vec<_>>()
                .join(" -> ");
            let message = self.message.replacen("{}", &trace, 1);
            tracing::debug!(%message, "reference chain cycle");
            self.markers.report_singular(
                Diagnostic::error(self.links[i].location, message)
                    .with_severity(self.severity)
                    .with_code(code),
            );
        }
    }

    /// Membership test without reporting.
    pub fn contains(&self, link: &impl ChainLink) -> bool {
        let id = link.chain_id();
        self.links.iter().any(|l| l.id == id)
    }

    /// Remember the current length of the chain.
    pub fn mark_state(&mut self) {
        self.marked_states.push(self.links.len());
    }

    /// Truncate the chain to the most recent mark and drop that mark.
    pub fn previous_state(&mut self) {
        if let Some(limit) = self.marked_states.pop() {
            self.links.truncate(limit);
        }
    }

    /// Clear links and marks so the chain can start a new resolution.
    pub fn release(&mut self) {
        self.links.clear();
        self.marked_states.clear();
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Ids of the links, root first.
    pub fn ids(&self) -> Vec<NodeId> {
        self.links.iter().map(|l| l.id).collect()
    }
}
