//! Logical clocks used to memoize semantic checking and code generation.
//!
//! A [`CompilationTimestamp`] is minted once per top-level check cycle and
//! threaded by value through every check in that cycle. A
//! [`BuildTimestamp`] is minted once per code-generation run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Raw value meaning "never stamped".
const NEVER: u64 = 0;

static COMPILATION_CLOCK: AtomicU64 = AtomicU64::new(CompilationTimestamp::BASE.0);
static BUILD_CLOCK: AtomicU64 = AtomicU64::new(0);

/// Totally ordered token identifying one check cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompilationTimestamp(u64);

impl CompilationTimestamp {
    /// The smallest timestamp; checks anything that was never checked.
    pub const BASE: CompilationTimestamp = CompilationTimestamp(1);

    /// Mint a timestamp strictly greater than every timestamp minted before.
    pub fn new_timestamp() -> Self {
        Self(COMPILATION_CLOCK.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn base() -> Self {
        Self::BASE
    }

    pub fn is_less(self, other: CompilationTimestamp) -> bool {
        self.0 < other.0
    }

    pub(crate) fn raw(self) -> u64 {
        self.0
    }

    pub(crate) fn from_raw(raw: u64) -> Option<Self> {
        (raw != NEVER).then_some(Self(raw))
    }
}

/// Token identifying one code-generation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildTimestamp(u64);

impl BuildTimestamp {
    pub fn new_timestamp() -> Self {
        Self(BUILD_CLOCK.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_less(self, other: BuildTimestamp) -> bool {
        self.0 < other.0
    }
}

/// Remembers the last build in which a node generated its code.
#[derive(Debug, Default)]
pub struct GenerationStamp(AtomicU64);

impl GenerationStamp {
    /// Claim generation for `build`. Returns `false` when the node already
    /// generated for this build or a later one.
    pub fn claim(&self, build: BuildTimestamp) -> bool {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current != NEVER && current >= build.0 {
                return false;
            }
            match self
                .0
                .compare_exchange(current, build.0, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn last_time_generated(&self) -> Option<BuildTimestamp> {
        match self.0.load(Ordering::Acquire) {
            NEVER => None,
            raw => Some(BuildTimestamp(raw)),
        }
    }
}

impl Clone for GenerationStamp {
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.0.load(Ordering::Acquire)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timestamps_are_increasing() {
        let first = CompilationTimestamp::new_timestamp();
        let second = CompilationTimestamp::new_timestamp();
        assert!(first.is_less(second));
        assert!(!second.is_less(first));
        assert!(!first.is_less(first));
    }

    #[test]
    fn test_base_is_smallest() {
        let ts = CompilationTimestamp::new_timestamp();
        assert!(CompilationTimestamp::base().is_less(ts));
    }

    #[test]
    fn test_generation_stamp_claims_once_per_build() {
        let stamp = GenerationStamp::default();
        let build = BuildTimestamp::new_timestamp();
        assert!(stamp.claim(build));
        assert!(!stamp.claim(build));
        assert_eq!(stamp.last_time_generated(), Some(build));

        let next = BuildTimestamp::new_timestamp();
        assert!(stamp.claim(next));
    }
}
