// crates/dispute-engine-core/src/runtime/memstore.rs
// ============================================================================
// Module: In-Memory Case Store
// Description: HashMap-backed CaseStore for tests and embedded use.
// Purpose: Reference store implementation enforcing optimistic versioning.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The in-memory store is the reference implementation of the storage
//! contract: it enforces the same optimistic version check a durable backend
//! must, so engine tests exercise the real concurrency guard.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::case::CaseStatus;
use crate::core::case::DisputeCase;
use crate::core::identifiers::CaseId;
use crate::core::identifiers::ClientId;
use crate::interfaces::CaseStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory case store with optimistic versioning.
///
/// # Invariants
/// - Saves are rejected when the stored version differs from the caller's
///   expectation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCaseStore {
    /// Case rows keyed by identifier.
    cases: Arc<Mutex<HashMap<CaseId, DisputeCase>>>,
}

impl InMemoryCaseStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the case map, mapping poisoning to a backend error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<CaseId, DisputeCase>>, StoreError> {
        self.cases
            .lock()
            .map_err(|_| StoreError::Backend("case store lock poisoned".to_string()))
    }
}

impl CaseStore for InMemoryCaseStore {
    fn load_case(&self, case_id: &CaseId) -> Result<Option<DisputeCase>, StoreError> {
        Ok(self.lock()?.get(case_id).cloned())
    }

    fn save_case(&self, case: &DisputeCase, expected_version: u64) -> Result<(), StoreError> {
        let mut cases = self.lock()?;
        // An absent entry counts as version 0 so a stale writer cannot
        // silently recreate a missing case at an arbitrary version.
        let stored_version = cases.get(&case.case_id).map_or(0, |stored| stored.version);
        if stored_version != expected_version {
            return Err(StoreError::VersionConflict {
                case_id: case.case_id.clone(),
                expected: expected_version,
                stored: stored_version,
            });
        }
        cases.insert(case.case_id.clone(), case.clone());
        Ok(())
    }

    fn find_case_for_client(&self, client_id: ClientId) -> Result<Option<CaseId>, StoreError> {
        let cases = self.lock()?;
        let mut candidates: Vec<&DisputeCase> = cases
            .values()
            .filter(|case| case.client_id == client_id && case.status == CaseStatus::Open)
            .collect();
        candidates.sort_by(|left, right| left.case_id.cmp(&right.case_id));
        Ok(candidates.first().map(|case| case.case_id.clone()))
    }

    fn list_case_ids(&self) -> Result<Vec<CaseId>, StoreError> {
        let cases = self.lock()?;
        let mut ids: Vec<CaseId> = cases.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
