// crates/dispute-engine-core/src/runtime/cancel.rs
// ============================================================================
// Module: Cooperative Cancellation
// Description: Shared cancellation flag for long-running batch work.
// Purpose: Let callers stop batch detection between units of work.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Batch detection over many reports checks a shared flag between per-report
//! units of work. Cancellation is cooperative: work already completed remains
//! valid and is returned as a partial result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

// ============================================================================
// SECTION: Cancel Flag
// ============================================================================

/// Cloneable cancellation flag shared between a caller and a worker.
///
/// # Invariants
/// - Once cancelled, the flag never resets.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a new, uncancelled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` when cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::CancelFlag;

    #[test]
    fn clones_share_cancellation_state() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
    }
}
