// crates/dispute-engine-store-sqlite/src/lib.rs
// ============================================================================
// Module: Dispute Engine SQLite Store
// Description: Durable case persistence backed by SQLite.
// Purpose: Provide the production CaseStore implementation.
// Dependencies: dispute-engine-config, dispute-engine-core, rusqlite, serde,
//               serde_json, thiserror
// ============================================================================

//! ## Overview
//! Durable implementation of the engine's storage contract. Cases persist as
//! canonical JSON snapshots with integrity hashes; the optimistic version
//! check that guards concurrent round advancement runs inside the save
//! transaction.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// `SQLite`-backed case store.
pub mod store;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use store::SqliteCaseStore;
pub use store::SqliteCaseStoreConfig;
pub use store::SqliteJournalMode;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
