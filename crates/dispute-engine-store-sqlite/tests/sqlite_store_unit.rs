// crates/dispute-engine-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Case Store Unit Tests
// Description: Targeted integrity tests for the SQLite case store.
// Purpose: Validate path safety, versioning, persistence, and corruption
//          detection.
// ============================================================================

//! ## Overview
//! Unit-level tests for `SQLite` store integrity invariants:
//! - Path safety checks (directory/component rejection)
//! - Optimistic version conflicts on stale saves
//! - Persistence across store reopens
//! - Hash verification and corruption detection
//! - Open-case lookup and deterministic listing

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions and helpers are permitted."
)]

use dispute_engine_config::StoreSection;
use dispute_engine_core::CaseEvent;
use dispute_engine_core::CaseId;
use dispute_engine_core::CaseStatus;
use dispute_engine_core::CaseStore;
use dispute_engine_core::ClientId;
use dispute_engine_core::DisputeCase;
use dispute_engine_core::StoreError;
use dispute_engine_core::Timestamp;
use dispute_engine_store_sqlite::SqliteCaseStore;
use dispute_engine_store_sqlite::SqliteCaseStoreConfig;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn sample_case(case_id: &str, client: u64) -> DisputeCase {
    DisputeCase::new(
        CaseId::new(case_id),
        ClientId::from_raw(client).expect("nonzero client id"),
        Timestamp::Logical(0),
    )
}

fn open_store(dir: &TempDir) -> SqliteCaseStore {
    let config = SqliteCaseStoreConfig::for_path(dir.path().join("cases.db"));
    SqliteCaseStore::open(&config).expect("open store")
}

// ============================================================================
// SECTION: Round Trips
// ============================================================================

#[test]
fn save_then_load_round_trips_the_case() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);

    let mut case = sample_case("case-7-0001", 7);
    case.record_event(Timestamp::Logical(1), CaseEvent::ViolationsAttached { count: 2 });
    store.save_case(&case, 0).expect("save");

    let loaded = store
        .load_case(&CaseId::new("case-7-0001"))
        .expect("load")
        .expect("case present");
    assert_eq!(loaded, case);
    assert_eq!(loaded.version, 1);
}

#[test]
fn missing_case_loads_none() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let loaded = store.load_case(&CaseId::new("case-absent")).expect("load");
    assert!(loaded.is_none());
}

#[test]
fn reopening_the_store_preserves_cases() {
    let dir = TempDir::new().expect("tempdir");
    let case = sample_case("case-9-0001", 9);
    {
        let store = open_store(&dir);
        store.save_case(&case, 0).expect("save");
    }
    let reopened = open_store(&dir);
    let loaded = reopened
        .load_case(&CaseId::new("case-9-0001"))
        .expect("load")
        .expect("case present");
    assert_eq!(loaded, case);
}

// ============================================================================
// SECTION: Versioning
// ============================================================================

#[test]
fn stale_saves_are_rejected_with_a_version_conflict() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);

    let mut case = sample_case("case-7-0001", 7);
    store.save_case(&case, 0).expect("initial save");

    case.record_event(Timestamp::Logical(1), CaseEvent::ViolationsAttached { count: 1 });
    store.save_case(&case, 0).expect("first update from version 0");

    // A second writer still holding version 0 must be rejected.
    let result = store.save_case(&case, 0);
    match result {
        Err(StoreError::VersionConflict { expected, stored, .. }) => {
            assert_eq!(expected, 0);
            assert_eq!(stored, 1);
        }
        Err(error) => panic!("unexpected error: {error}"),
        Ok(()) => panic!("expected a version conflict"),
    }
}

#[test]
fn saves_of_unknown_cases_require_version_zero() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);

    // A writer holding a handle to a case that was never saved (or has been
    // removed) must not create it at an arbitrary version.
    let result = store.save_case(&sample_case("case-7-0001", 7), 3);
    match result {
        Err(StoreError::VersionConflict { expected, stored, .. }) => {
            assert_eq!(expected, 3);
            assert_eq!(stored, 0);
        }
        Err(error) => panic!("unexpected error: {error}"),
        Ok(()) => panic!("expected a version conflict"),
    }

    store
        .save_case(&sample_case("case-7-0001", 7), 0)
        .expect("creation with expected version 0 succeeds");
}

// ============================================================================
// SECTION: Lookup
// ============================================================================

#[test]
fn open_case_lookup_ignores_closed_cases() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);

    let mut closed = sample_case("case-7-0001", 7);
    closed.status = CaseStatus::Closed;
    store.save_case(&closed, 0).expect("save closed");

    assert!(
        store
            .find_case_for_client(ClientId::from_raw(7).expect("nonzero"))
            .expect("lookup")
            .is_none()
    );

    let open = sample_case("case-7-0002", 7);
    store.save_case(&open, 0).expect("save open");
    assert_eq!(
        store
            .find_case_for_client(ClientId::from_raw(7).expect("nonzero"))
            .expect("lookup"),
        Some(CaseId::new("case-7-0002"))
    );
}

#[test]
fn case_listing_is_sorted_by_identifier() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.save_case(&sample_case("case-b", 2), 0).expect("save");
    store.save_case(&sample_case("case-a", 1), 0).expect("save");
    store.save_case(&sample_case("case-c", 3), 0).expect("save");

    let ids = store.list_case_ids().expect("list");
    assert_eq!(
        ids,
        vec![CaseId::new("case-a"), CaseId::new("case-b"), CaseId::new("case-c")]
    );
}

// ============================================================================
// SECTION: Integrity
// ============================================================================

#[test]
fn tampered_payloads_fail_closed_on_load() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("cases.db");
    {
        let config = SqliteCaseStoreConfig::for_path(&db_path);
        let store = SqliteCaseStore::open(&config).expect("open store");
        store.save_case(&sample_case("case-7-0001", 7), 0).expect("save");
    }

    // Flip a byte in the stored snapshot without updating the hash.
    let connection = Connection::open(&db_path).expect("raw open");
    connection
        .execute(
            "UPDATE cases SET case_json = ?1 WHERE case_id = ?2",
            params![b"{\"tampered\":true}".to_vec(), "case-7-0001"],
        )
        .expect("tamper");
    drop(connection);

    let config = SqliteCaseStoreConfig::for_path(&db_path);
    let store = SqliteCaseStore::open(&config).expect("reopen store");
    let result = store.load_case(&CaseId::new("case-7-0001"));
    match result {
        Err(StoreError::Backend(message)) => {
            assert!(message.contains("corruption"), "message was: {message}");
        }
        Err(error) => panic!("unexpected error: {error}"),
        Ok(_) => panic!("expected corruption to fail the load"),
    }
}

// ============================================================================
// SECTION: Path Safety
// ============================================================================

#[test]
fn directory_paths_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let config = SqliteCaseStoreConfig::for_path(dir.path());
    let result = SqliteCaseStore::open(&config);
    assert!(result.is_err());
}

#[test]
fn overlong_path_components_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let config = SqliteCaseStoreConfig::for_path(dir.path().join("a".repeat(300)));
    let result = SqliteCaseStore::open(&config);
    assert!(result.is_err());
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

#[test]
fn store_section_maps_into_the_sqlite_config() {
    let section = StoreSection {
        path: Some("/var/lib/dispute-engine/cases.db".to_string()),
        busy_timeout_ms: 250,
    };
    let config = SqliteCaseStoreConfig::from_section(&section).expect("path is configured");
    assert_eq!(config.path.to_string_lossy(), "/var/lib/dispute-engine/cases.db");
    assert_eq!(config.busy_timeout_ms, 250);

    // No path selects the in-memory store instead.
    assert!(SqliteCaseStoreConfig::from_section(&StoreSection::default()).is_none());
}

#[test]
fn a_configured_section_opens_a_working_store() {
    let dir = TempDir::new().expect("tempdir");
    let section = StoreSection {
        path: Some(dir.path().join("cases.db").to_string_lossy().into_owned()),
        busy_timeout_ms: 250,
    };
    let config = SqliteCaseStoreConfig::from_section(&section).expect("path is configured");
    let store = SqliteCaseStore::open(&config).expect("open store");
    store.save_case(&sample_case("case-7-0001", 7), 0).expect("save");
    assert_eq!(store.list_case_ids().expect("list").len(), 1);
}
