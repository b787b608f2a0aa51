// toolspec-core/src/interfaces/mod.rs
// ============================================================================
// Module: ToolSpec Interfaces
// Description: Backend-agnostic interfaces for install and submission storage.
// Purpose: Define the contract surfaces used by the ToolSpec server runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the registry integrates with storage backends
//! without embedding backend-specific details. Implementations must enforce
//! the idempotency-key uniqueness constraint atomically at the storage layer
//! (a single conditional insert), never via read-then-write, and must fail
//! with an explicit error rather than fabricating a success result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::IdempotencyKey;
use crate::core::identifiers::InstallId;
use crate::core::identifiers::ReviewId;
use crate::core::install::InstallRecord;
use crate::core::submission::ReviewSubmission;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Storage errors shared by all backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing store I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// Store schema version is incompatible.
    #[error("store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("store invalid data: {0}")]
    Invalid(String),
    /// Store is temporarily unavailable; safe to retry with backoff.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Install Store
// ============================================================================

/// Install lifecycle persistence.
pub trait InstallStore {
    /// Persists a freshly created install record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be persisted, including
    /// when the install id already exists.
    fn create_install(&self, record: &InstallRecord) -> Result<(), StoreError>;

    /// Loads an install record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_install(&self, install_id: &InstallId) -> Result<Option<InstallRecord>, StoreError>;

    /// Marks an install revoked at the given time.
    ///
    /// Idempotent and monotonic: an already-revoked install keeps its
    /// original revocation time, and revoking a nonexistent install is not
    /// an error. Returns true when a record existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn revoke_install(
        &self,
        install_id: &InstallId,
        revoked_at: Timestamp,
    ) -> Result<bool, StoreError>;

    /// Sets `first_meaningful_submission_at` if and only if it is unset.
    ///
    /// Set-once semantics: concurrent callers converge on the first written
    /// value regardless of ordering.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn mark_first_meaningful_submission(
        &self,
        install_id: &InstallId,
        at: Timestamp,
    ) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Submission Store
// ============================================================================

/// Outcome of one idempotent submission store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOutcome {
    /// Review id of the winning record for the idempotency key.
    pub review_id: ReviewId,
    /// Evidence count of the winning record.
    pub validated_tool_use_count: usize,
    /// True when the key already existed and the stored record was returned.
    pub duplicate: bool,
}

/// Idempotent submission persistence.
pub trait SubmissionStore {
    /// Stores a validated submission under its idempotency key.
    ///
    /// First writer wins: when the key already exists the call is a no-op
    /// and the previously stored record's identifiers are returned with
    /// `duplicate = true`. A meaningful, attributed submission additionally
    /// sets the install's first-meaningful-submission timestamp (set-once).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails; implementations must
    /// not report success for a write that did not commit.
    fn store_submission(
        &self,
        review_id: &ReviewId,
        submission: &ReviewSubmission,
        submitted_at: Timestamp,
    ) -> Result<StoreOutcome, StoreError>;

    /// Returns true when any stored submission references the install.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn has_any_submission(&self, install_id: &InstallId) -> Result<bool, StoreError>;

    /// Loads the stored outcome for an idempotency key, when present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn load_by_key(&self, key: &IdempotencyKey) -> Result<Option<StoreOutcome>, StoreError>;
}
