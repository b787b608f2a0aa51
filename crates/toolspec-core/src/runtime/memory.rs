// toolspec-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Registry Store
// Description: Mutex-guarded reference implementation of the store traits.
// Purpose: Back tests and non-durable server deployments.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The in-memory store is the reference implementation of the storage
//! interfaces. All mutations happen under one mutex, which makes the
//! conditional-insert and set-once semantics trivially atomic; the durable
//! `SQLite` backend must provide the same guarantees via storage-level
//! conflict handling.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::core::identifiers::IdempotencyKey;
use crate::core::identifiers::InstallId;
use crate::core::identifiers::ReviewId;
use crate::core::install::InstallRecord;
use crate::core::submission::ReviewSubmission;
use crate::core::time::Timestamp;
use crate::interfaces::InstallStore;
use crate::interfaces::StoreError;
use crate::interfaces::StoreOutcome;
use crate::interfaces::SubmissionStore;

// ============================================================================
// SECTION: Stored Rows
// ============================================================================

/// One stored submission row.
#[derive(Debug, Clone)]
struct SubmissionRow {
    /// Server-assigned review id.
    review_id: ReviewId,
    /// Install reference, when attributed.
    install_id: Option<InstallId>,
    /// Evidence count captured at insert time.
    validated_tool_use_count: usize,
}

/// Mutable store state guarded by the mutex.
#[derive(Debug, Default)]
struct MemoryState {
    /// Install records by id.
    installs: BTreeMap<InstallId, InstallRecord>,
    /// Submission rows keyed by idempotency key.
    submissions: BTreeMap<IdempotencyKey, SubmissionRow>,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory registry store.
#[derive(Debug, Default)]
pub struct InMemoryRegistryStore {
    /// All state behind one mutex; mutations are atomic by construction.
    state: Mutex<MemoryState>,
}

impl InMemoryRegistryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state, mapping poisoning onto a store error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Io("memory store lock poisoned".to_string()))
    }
}

impl InstallStore for InMemoryRegistryStore {
    fn create_install(&self, record: &InstallRecord) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.installs.contains_key(&record.install_id) {
            return Err(StoreError::Invalid(format!(
                "install already exists: {}",
                record.install_id
            )));
        }
        state.installs.insert(record.install_id.clone(), record.clone());
        Ok(())
    }

    fn load_install(&self, install_id: &InstallId) -> Result<Option<InstallRecord>, StoreError> {
        Ok(self.lock()?.installs.get(install_id).cloned())
    }

    fn revoke_install(
        &self,
        install_id: &InstallId,
        revoked_at: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let Some(record) = state.installs.get_mut(install_id) else {
            return Ok(false);
        };
        if record.revoked_at.is_none() {
            record.revoked_at = Some(revoked_at);
        }
        Ok(true)
    }

    fn mark_first_meaningful_submission(
        &self,
        install_id: &InstallId,
        at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if let Some(record) = state.installs.get_mut(install_id)
            && record.first_meaningful_submission_at.is_none()
        {
            record.first_meaningful_submission_at = Some(at);
        }
        Ok(())
    }
}

impl SubmissionStore for InMemoryRegistryStore {
    fn store_submission(
        &self,
        review_id: &ReviewId,
        submission: &ReviewSubmission,
        submitted_at: Timestamp,
    ) -> Result<StoreOutcome, StoreError> {
        let mut state = self.lock()?;
        if let Some(existing) = state.submissions.get(&submission.idempotency_key) {
            return Ok(StoreOutcome {
                review_id: existing.review_id.clone(),
                validated_tool_use_count: existing.validated_tool_use_count,
                duplicate: true,
            });
        }
        let row = SubmissionRow {
            review_id: review_id.clone(),
            install_id: submission.install_id.clone(),
            validated_tool_use_count: submission.validated_tool_use_count(),
        };
        state.submissions.insert(submission.idempotency_key.clone(), row);
        if submission.is_meaningful()
            && let Some(install_id) = submission.install_id.as_ref()
            && let Some(record) = state.installs.get_mut(install_id)
            && record.first_meaningful_submission_at.is_none()
        {
            record.first_meaningful_submission_at = Some(submitted_at);
        }
        Ok(StoreOutcome {
            review_id: review_id.clone(),
            validated_tool_use_count: submission.validated_tool_use_count(),
            duplicate: false,
        })
    }

    fn has_any_submission(&self, install_id: &InstallId) -> Result<bool, StoreError> {
        Ok(self
            .lock()?
            .submissions
            .values()
            .any(|row| row.install_id.as_ref() == Some(install_id)))
    }

    fn load_by_key(&self, key: &IdempotencyKey) -> Result<Option<StoreOutcome>, StoreError> {
        Ok(self.lock()?.submissions.get(key).map(|row| StoreOutcome {
            review_id: row.review_id.clone(),
            validated_tool_use_count: row.validated_tool_use_count,
            duplicate: true,
        }))
    }
}
