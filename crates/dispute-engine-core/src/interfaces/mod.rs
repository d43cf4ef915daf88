// crates/dispute-engine-core/src/interfaces/mod.rs
// ============================================================================
// Module: Dispute Engine Interfaces
// Description: Backend-agnostic storage contract for dispute cases.
// Purpose: Define the schema contract without embedding storage technology.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The engine defines what a storage collaborator must persist — cases with
//! optimistic versioning — but not how. Implementations must reject saves
//! whose expected version does not match the stored version so concurrent
//! trigger-check evaluations cannot both advance the same round.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::case::DisputeCase;
use crate::core::identifiers::CaseId;
use crate::core::identifiers::ClientId;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Storage collaborator errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored case version does not match the caller's expectation.
    #[error("version conflict for case {case_id}: expected {expected}, stored {stored}")]
    VersionConflict {
        /// Case the save targeted.
        case_id: CaseId,
        /// Version the caller loaded.
        expected: u64,
        /// Version actually stored.
        stored: u64,
    },
    /// Case payload could not be serialized or deserialized.
    #[error("serialization failure: {0}")]
    Serialization(String),
    /// Backend-specific failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

// ============================================================================
// SECTION: Case Store
// ============================================================================

/// Backend-agnostic dispute case store with optimistic versioning.
pub trait CaseStore {
    /// Loads a case by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails or the payload is
    /// corrupt.
    fn load_case(&self, case_id: &CaseId) -> Result<Option<DisputeCase>, StoreError>;

    /// Saves a case, enforcing the optimistic version check.
    ///
    /// `expected_version` is the version the caller loaded; the save must be
    /// rejected when the stored version differs. New cases save with
    /// `expected_version = 0` and no stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::VersionConflict`] on a stale save and other
    /// [`StoreError`] variants on backend failure.
    fn save_case(&self, case: &DisputeCase, expected_version: u64) -> Result<(), StoreError>;

    /// Returns the open case for a client, when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_case_for_client(&self, client_id: ClientId) -> Result<Option<CaseId>, StoreError>;

    /// Lists all case identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn list_case_ids(&self) -> Result<Vec<CaseId>, StoreError>;
}
