//! Per-node memoization state.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use super::timestamp::CompilationTimestamp;

/// `last_time_checked` plus the erroneous flag of one checkable node.
///
/// Nodes are shared immutably between analysis threads, so the stamp is an
/// atomic. [`CheckState::begin`] stamps the node before its check body runs,
/// which keeps a self-referencing check from recursing forever and lets only
/// one caller execute the body per timestamp.
#[derive(Debug, Default)]
pub struct CheckState {
    last_checked: AtomicU64,
    erroneous: AtomicBool,
    runs: AtomicUsize,
}

impl CheckState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_time_checked(&self) -> Option<CompilationTimestamp> {
        CompilationTimestamp::from_raw(self.last_checked.load(Ordering::Acquire))
    }

    /// Whether the node is already valid as of `timestamp`.
    pub fn is_checked(&self, timestamp: CompilationTimestamp) -> bool {
        self.last_time_checked()
            .is_some_and(|last| !last.is_less(timestamp))
    }

    /// Claim the check body for `timestamp`.
    ///
    /// Returns `false` when the node was already checked at `timestamp` or
    /// later. On `true` the erroneous flag is reset and the caller must run
    /// the body.
    pub fn begin(&self, timestamp: CompilationTimestamp) -> bool {
        let mut current = self.last_checked.load(Ordering::Acquire);
        loop {
            let last = CompilationTimestamp::from_raw(current);
            if last.is_some_and(|last| !last.is_less(timestamp)) {
                return false;
            }
            match self.last_checked.compare_exchange(
                current,
                timestamp.raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        self.erroneous.store(false, Ordering::Release);
        self.runs.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Stamp the node after its body ran, for checks that must not be
    /// marked up front.
    pub fn mark_checked(&self, timestamp: CompilationTimestamp) {
        self.last_checked.fetch_max(timestamp.raw(), Ordering::AcqRel);
    }

    /// Forget the stamp so the next cycle checks the node again.
    pub fn invalidate(&self) {
        self.last_checked.store(0, Ordering::Release);
    }

    pub fn is_erroneous(&self) -> bool {
        self.erroneous.load(Ordering::Acquire)
    }

    pub fn set_erroneous(&self, erroneous: bool) {
        self.erroneous.store(erroneous, Ordering::Release);
    }

    /// How many times the check body was entered.
    pub fn check_count(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }
}

impl Clone for CheckState {
    fn clone(&self) -> Self {
        Self {
            last_checked: AtomicU64::new(self.last_checked.load(Ordering::Acquire)),
            erroneous: AtomicBool::new(self.erroneous.load(Ordering::Acquire)),
            runs: AtomicUsize::new(self.runs.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_runs_once_per_timestamp() {
        let state = CheckState::new();
        let ts = CompilationTimestamp::new_timestamp();
        assert!(state.begin(ts));
        assert!(!state.begin(ts));
        assert_eq!(state.check_count(), 1);
    }

    #[test]
    fn test_later_timestamp_runs_again() {
        let state = CheckState::new();
        let first = CompilationTimestamp::new_timestamp();
        let second = CompilationTimestamp::new_timestamp();
        assert!(state.begin(first));
        assert!(state.begin(second));
        assert!(!state.begin(first));
        assert_eq!(state.check_count(), 2);
    }

    #[test]
    fn test_invalidate_forces_recheck() {
        let state = CheckState::new();
        let ts = CompilationTimestamp::new_timestamp();
        assert!(state.begin(ts));
        state.invalidate();
        assert!(state.last_time_checked().is_none());
        assert!(state.begin(ts));
    }

    #[test]
    fn test_begin_clears_erroneous() {
        let state = CheckState::new();
        state.set_erroneous(true);
        assert!(state.begin(CompilationTimestamp::new_timestamp()));
        assert!(!state.is_erroneous());
    }
}
