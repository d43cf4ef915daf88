// crates/dispute-engine-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Case Store
// Description: Durable CaseStore backed by SQLite WAL.
// Purpose: Persist dispute cases with integrity hashes and version checks.
// Dependencies: dispute-engine-config, dispute-engine-core, rusqlite, serde,
//               serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements the durable [`CaseStore`] using `SQLite`. Each save
//! stores the case as a canonical JSON snapshot alongside its hash; loads
//! verify the hash before deserialization and fail closed on corruption. The
//! optimistic version check runs inside the save transaction so two engines
//! sharing a database cannot both advance the same case from a stale read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use dispute_engine_config::StoreSection;
use dispute_engine_core::CaseId;
use dispute_engine_core::CaseStatus;
use dispute_engine_core::CaseStore;
use dispute_engine_core::ClientId;
use dispute_engine_core::DisputeCase;
use dispute_engine_core::StoreError;
use dispute_engine_core::hashing::canonical_json_bytes;
use dispute_engine_core::hashing::hash_bytes;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` case store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteCaseStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteCaseStoreConfig {
    /// Builds a config for a path with default timeout and modes.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }

    /// Builds a config from the operator's `[store]` section.
    ///
    /// Returns `None` when no database path is configured, which selects the
    /// in-memory store.
    #[must_use]
    pub fn from_section(section: &StoreSection) -> Option<Self> {
        section.path.as_deref().map(|path| Self {
            path: PathBuf::from(path),
            busy_timeout_ms: u64::from(section.busy_timeout_ms),
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        })
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw case payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Backend(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed dispute case store with WAL support.
///
/// # Invariants
/// - Case loads verify stored hashes before deserialization.
/// - `SQLite` connection access is serialized through a mutex.
#[derive(Clone)]
pub struct SqliteCaseStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCaseStore {
    /// Opens an `SQLite`-backed case store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn open(config: &SqliteCaseStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the connection, mapping poisoning to a backend error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Backend("sqlite connection lock poisoned".to_string()))
    }
}

impl CaseStore for SqliteCaseStore {
    fn load_case(&self, case_id: &CaseId) -> Result<Option<DisputeCase>, StoreError> {
        let connection = self.lock()?;
        let row: Option<(Vec<u8>, String)> = connection
            .query_row(
                "SELECT case_json, case_hash FROM cases WHERE case_id = ?1",
                params![case_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(db_error)?;
        let Some((case_json, stored_hash)) = row else {
            return Ok(None);
        };
        let actual_hash = hash_bytes(&case_json).hex;
        if actual_hash != stored_hash {
            return Err(StoreError::Backend(format!(
                "sqlite store corruption: hash mismatch for case {}",
                case_id.as_str()
            )));
        }
        let case: DisputeCase = serde_json::from_slice(&case_json)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        Ok(Some(case))
    }

    fn save_case(&self, case: &DisputeCase, expected_version: u64) -> Result<(), StoreError> {
        let case_json = canonical_json_bytes(case)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        let case_hash = hash_bytes(&case_json);
        let version = i64::try_from(case.version)
            .map_err(|_| StoreError::Backend("case version exceeds storable range".to_string()))?;
        let client_id = i64::try_from(case.client_id.get())
            .map_err(|_| StoreError::Backend("client id exceeds storable range".to_string()))?;

        let mut connection = self.lock()?;
        let tx = connection.transaction().map_err(db_error)?;
        let stored: Option<i64> = tx
            .query_row(
                "SELECT version FROM cases WHERE case_id = ?1",
                params![case.case_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;
        // An absent row counts as version 0: creating a case requires the
        // caller to expect version 0, so a writer holding a stale handle to a
        // deleted case cannot silently recreate it.
        let stored_version =
            stored.map_or(0, |value| u64::try_from(value).unwrap_or_default());
        if stored_version != expected_version {
            return Err(StoreError::VersionConflict {
                case_id: case.case_id.clone(),
                expected: expected_version,
                stored: stored_version,
            });
        }
        tx.execute(
            "INSERT OR REPLACE INTO cases (case_id, client_id, status, version, case_json, \
             case_hash, hash_algorithm, saved_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                case.case_id.as_str(),
                client_id,
                status_label(case.status),
                version,
                case_json,
                case_hash.hex,
                "sha256",
                unix_millis(),
            ],
        )
        .map_err(db_error)?;
        tx.commit().map_err(db_error)?;
        Ok(())
    }

    fn find_case_for_client(&self, client_id: ClientId) -> Result<Option<CaseId>, StoreError> {
        let raw = i64::try_from(client_id.get())
            .map_err(|_| StoreError::Backend("client id exceeds storable range".to_string()))?;
        let connection = self.lock()?;
        let case_id: Option<String> = connection
            .query_row(
                "SELECT case_id FROM cases WHERE client_id = ?1 AND status = 'open' ORDER BY \
                 case_id LIMIT 1",
                params![raw],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;
        Ok(case_id.map(CaseId::new))
    }

    fn list_case_ids(&self) -> Result<Vec<CaseId>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare("SELECT case_id FROM cases ORDER BY case_id")
            .map_err(db_error)?;
        let rows = statement
            .query_map(params![], |row| row.get::<_, String>(0))
            .map_err(db_error)?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(CaseId::new(row.map_err(db_error)?));
        }
        Ok(ids)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a `rusqlite` error into the storage contract error.
fn db_error(error: rusqlite::Error) -> StoreError {
    StoreError::Backend(format!("sqlite store db error: {error}"))
}

/// Returns the indexed status label for a case status.
const fn status_label(status: CaseStatus) -> &'static str {
    match status {
        CaseStatus::Open => "open",
        CaseStatus::Closed => "closed",
    }
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteCaseStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteCaseStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS cases (
                    case_id TEXT NOT NULL PRIMARY KEY,
                    client_id INTEGER NOT NULL,
                    status TEXT NOT NULL,
                    version INTEGER NOT NULL,
                    case_json BLOB NOT NULL,
                    case_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    saved_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_cases_client_status
                    ON cases (client_id, status, case_id);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
