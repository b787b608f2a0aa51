// toolspec-core/src/core/install.rs
// ============================================================================
// Module: Install Records
// Description: Persistent state for one activated agent environment.
// Purpose: Provide the canonical install lifecycle record.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An install represents one activated agent environment, identified by an
//! opaque id/secret pair. Revocation is permanent and the first-meaningful-
//! submission timestamp is set-once; both transitions are monotonic so
//! concurrent updates converge to the same terminal value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::InstallId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Install Record
// ============================================================================

/// Persistent record for one activated agent environment.
///
/// # Invariants
/// - `revoked_at` is permanent once set; there is no un-revoke.
/// - `first_meaningful_submission_at` is set-once, never cleared.
/// - `install_secret` is issued once at creation and never re-shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRecord {
    /// Opaque public install identifier.
    pub install_id: InstallId,
    /// Opaque credential, reserved for future request signing.
    pub install_secret: String,
    /// Credential version, starting at 1.
    pub secret_version: u32,
    /// Creation time.
    pub created_at: Timestamp,
    /// Permanent revocation time, when set.
    pub revoked_at: Option<Timestamp>,
    /// Time of the first accepted meaningful submission, when set.
    pub first_meaningful_submission_at: Option<Timestamp>,
}

impl InstallRecord {
    /// Creates a fresh, unrevoked install record.
    #[must_use]
    pub const fn new(
        install_id: InstallId,
        install_secret: String,
        created_at: Timestamp,
    ) -> Self {
        Self {
            install_id,
            install_secret,
            secret_version: 1,
            created_at,
            revoked_at: None,
            first_meaningful_submission_at: None,
        }
    }

    /// Returns true when the install has been revoked.
    #[must_use]
    pub const fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}
