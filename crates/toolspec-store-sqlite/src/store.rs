// toolspec-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Registry Store
// Description: Durable InstallStore and SubmissionStore backed by SQLite WAL.
// Purpose: Persist installs and reviews with atomic idempotency enforcement.
// Dependencies: toolspec-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements the registry's durable storage on `SQLite`. The
//! submission table carries a unique index on the idempotency key, and every
//! store call is a single conditional insert inside one transaction: the
//! first writer wins, later writers are handed the stored record. Set-once
//! install timestamps use conditional updates for the same reason.
//! Database contents are untrusted and validated on load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use toolspec_core::IdempotencyKey;
use toolspec_core::InstallId;
use toolspec_core::InstallRecord;
use toolspec_core::InstallStore;
use toolspec_core::ReviewId;
use toolspec_core::ReviewSubmission;
use toolspec_core::StoreError;
use toolspec_core::StoreOutcome;
use toolspec_core::SubmissionStore;
use toolspec_core::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the registry store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum serialized submission payload accepted by the store.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
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

/// Configuration for the `SQLite` registry store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteRegistryConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` registry store errors.
#[derive(Debug, Error)]
pub enum SqliteRegistryError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Database busy or locked; safe to retry.
    #[error("sqlite store busy: {0}")]
    Busy(String),
    /// Store corruption.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Store payload exceeded configured size limits.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteRegistryError> for StoreError {
    fn from(error: SqliteRegistryError) -> Self {
        match error {
            SqliteRegistryError::Io(message) | SqliteRegistryError::Db(message) => {
                Self::Io(message)
            }
            SqliteRegistryError::Busy(message) => Self::Unavailable(message),
            SqliteRegistryError::Corrupt(message) => Self::Corrupt(message),
            SqliteRegistryError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteRegistryError::Invalid(message) => Self::Invalid(message),
            SqliteRegistryError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "payload exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

/// Maps a `rusqlite` error, classifying busy/locked states as retryable.
fn db_error(error: &rusqlite::Error) -> SqliteRegistryError {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            SqliteRegistryError::Busy(error.to_string())
        }
        _ => SqliteRegistryError::Db(error.to_string()),
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed registry store with WAL support.
#[derive(Clone)]
pub struct SqliteRegistryStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRegistryStore {
    /// Opens an `SQLite`-backed registry store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteRegistryError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteRegistryConfig) -> Result<Self, SqliteRegistryError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Acquires the connection guard, failing closed on poison.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteRegistryError> {
        self.connection
            .lock()
            .map_err(|_| SqliteRegistryError::Db("mutex poisoned".to_string()))
    }
}

impl InstallStore for SqliteRegistryStore {
    fn create_install(&self, record: &InstallRecord) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let inserted = guard
            .execute(
                "INSERT OR IGNORE INTO installs (install_id, install_secret, secret_version, \
                 created_at, revoked_at, first_meaningful_submission_at) VALUES (?1, ?2, ?3, ?4, \
                 ?5, ?6)",
                params![
                    record.install_id.as_str(),
                    record.install_secret,
                    i64::from(record.secret_version),
                    record.created_at.as_unix_millis(),
                    record.revoked_at.map(Timestamp::as_unix_millis),
                    record.first_meaningful_submission_at.map(Timestamp::as_unix_millis),
                ],
            )
            .map_err(|err| db_error(&err))?;
        if inserted == 0 {
            return Err(StoreError::Invalid(format!(
                "install id already exists: {}",
                record.install_id.as_str()
            )));
        }
        Ok(())
    }

    fn load_install(&self, install_id: &InstallId) -> Result<Option<InstallRecord>, StoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT install_id, install_secret, secret_version, created_at, revoked_at, \
                 first_meaningful_submission_at FROM installs WHERE install_id = ?1",
                params![install_id.as_str()],
                read_install_row,
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        row.map(install_record_from_row).transpose()
    }

    fn revoke_install(
        &self,
        install_id: &InstallId,
        revoked_at: Timestamp,
    ) -> Result<bool, StoreError> {
        let guard = self.lock()?;
        // Conditional update preserves the original revocation time.
        guard
            .execute(
                "UPDATE installs SET revoked_at = ?2 WHERE install_id = ?1 AND revoked_at IS NULL",
                params![install_id.as_str(), revoked_at.as_unix_millis()],
            )
            .map_err(|err| db_error(&err))?;
        let existed: Option<i64> = guard
            .query_row(
                "SELECT 1 FROM installs WHERE install_id = ?1",
                params![install_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        Ok(existed.is_some())
    }

    fn mark_first_meaningful_submission(
        &self,
        install_id: &InstallId,
        at: Timestamp,
    ) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "UPDATE installs SET first_meaningful_submission_at = ?2 WHERE install_id = ?1 \
                 AND first_meaningful_submission_at IS NULL",
                params![install_id.as_str(), at.as_unix_millis()],
            )
            .map_err(|err| db_error(&err))?;
        Ok(())
    }
}

impl SubmissionStore for SqliteRegistryStore {
    fn store_submission(
        &self,
        review_id: &ReviewId,
        submission: &ReviewSubmission,
        submitted_at: Timestamp,
    ) -> Result<StoreOutcome, StoreError> {
        let payload = serde_json::to_vec(submission)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(SqliteRegistryError::TooLarge {
                max_bytes: MAX_PAYLOAD_BYTES,
                actual_bytes: payload.len(),
            }
            .into());
        }
        let meaningful = submission.is_meaningful();
        let evidence_count = i64::try_from(submission.validated_tool_use_count())
            .map_err(|_| StoreError::Invalid("evidence count overflow".to_string()))?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        let inserted = tx
            .execute(
                "INSERT INTO reviews (review_id, idempotency_key, install_id, tool_slug, \
                 payload_json, validated_tool_use_count, meaningful, submitted_at) VALUES (?1, \
                 ?2, ?3, ?4, ?5, ?6, ?7, ?8) ON CONFLICT(idempotency_key) DO NOTHING",
                params![
                    review_id.as_str(),
                    submission.idempotency_key.as_str(),
                    submission.install_id.as_ref().map(InstallId::as_str),
                    submission.tool_slug.as_str(),
                    payload,
                    evidence_count,
                    i64::from(meaningful),
                    submitted_at.as_unix_millis(),
                ],
            )
            .map_err(|err| db_error(&err))?;
        if inserted == 1
            && meaningful
            && let Some(install_id) = &submission.install_id
        {
            // Set-once within the same transaction as the winning insert.
            tx.execute(
                "UPDATE installs SET first_meaningful_submission_at = ?2 WHERE install_id = ?1 \
                 AND first_meaningful_submission_at IS NULL",
                params![install_id.as_str(), submitted_at.as_unix_millis()],
            )
            .map_err(|err| db_error(&err))?;
        }
        let stored = tx
            .query_row(
                "SELECT review_id, validated_tool_use_count FROM reviews WHERE idempotency_key = \
                 ?1",
                params![submission.idempotency_key.as_str()],
                read_outcome_row,
            )
            .map_err(|err| db_error(&err))?;
        tx.commit().map_err(|err| db_error(&err))?;
        drop(guard);
        let (stored_review_id, stored_count) = stored;
        Ok(StoreOutcome {
            review_id: ReviewId::from(stored_review_id.as_str()),
            validated_tool_use_count: usize::try_from(stored_count)
                .map_err(|_| StoreError::Corrupt("negative evidence count".to_string()))?,
            duplicate: inserted == 0,
        })
    }

    fn has_any_submission(&self, install_id: &InstallId) -> Result<bool, StoreError> {
        let guard = self.lock()?;
        let found: Option<i64> = guard
            .query_row(
                "SELECT 1 FROM reviews WHERE install_id = ?1 LIMIT 1",
                params![install_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        Ok(found.is_some())
    }

    fn load_by_key(&self, key: &IdempotencyKey) -> Result<Option<StoreOutcome>, StoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT review_id, validated_tool_use_count FROM reviews WHERE idempotency_key = \
                 ?1",
                params![key.as_str()],
                read_outcome_row,
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        row.map(|(review_id, count)| {
            Ok(StoreOutcome {
                review_id: ReviewId::from(review_id.as_str()),
                validated_tool_use_count: usize::try_from(count)
                    .map_err(|_| StoreError::Corrupt("negative evidence count".to_string()))?,
                duplicate: true,
            })
        })
        .transpose()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Raw install row as read from `SQLite`.
type RawInstallRow = (String, String, i64, i64, Option<i64>, Option<i64>);

/// Reads the install columns from a result row.
fn read_install_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawInstallRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

/// Reads the stored-outcome columns from a result row.
fn read_outcome_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, i64)> {
    Ok((row.get(0)?, row.get(1)?))
}

/// Converts a raw row into an [`InstallRecord`], validating numeric ranges.
fn install_record_from_row(raw: RawInstallRow) -> Result<InstallRecord, StoreError> {
    let (install_id, install_secret, secret_version, created_at, revoked_at, first_meaningful) =
        raw;
    let secret_version = u32::try_from(secret_version)
        .map_err(|_| StoreError::Corrupt(format!("invalid secret_version for {install_id}")))?;
    Ok(InstallRecord {
        install_id: InstallId::from(install_id.as_str()),
        install_secret,
        secret_version,
        created_at: Timestamp::from_unix_millis(created_at),
        revoked_at: revoked_at.map(Timestamp::from_unix_millis),
        first_meaningful_submission_at: first_meaningful.map(Timestamp::from_unix_millis),
    })
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteRegistryError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteRegistryError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteRegistryError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteRegistryError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteRegistryError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteRegistryError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteRegistryError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteRegistryConfig) -> Result<Connection, SqliteRegistryError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteRegistryConfig,
) -> Result<(), SqliteRegistryError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteRegistryError> {
    let tx = connection.transaction().map_err(|err| db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_error(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS installs (
                    install_id TEXT PRIMARY KEY,
                    install_secret TEXT NOT NULL,
                    secret_version INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    revoked_at INTEGER,
                    first_meaningful_submission_at INTEGER
                );
                CREATE TABLE IF NOT EXISTS reviews (
                    review_id TEXT PRIMARY KEY,
                    idempotency_key TEXT NOT NULL UNIQUE,
                    install_id TEXT,
                    tool_slug TEXT NOT NULL,
                    payload_json BLOB NOT NULL,
                    validated_tool_use_count INTEGER NOT NULL,
                    meaningful INTEGER NOT NULL,
                    submitted_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_reviews_install_id
                    ON reviews (install_id);",
            )
            .map_err(|err| db_error(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteRegistryError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| db_error(&err))?;
    Ok(())
}
