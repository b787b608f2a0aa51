// toolspec-server/src/service.rs
// ============================================================================
// Module: Registry Service
// Description: Transport-free registry operations behind the HTTP layer.
// Purpose: Implement install, submission, and review semantics once.
// Dependencies: toolspec-core, rand, base64, serde, serde_json
// ============================================================================

//! ## Overview
//! [`RegistryService`] implements every registry operation against the
//! storage traits, with no HTTP types in sight. Handlers decode the request,
//! supply `now`, call one method here, and encode the result. This keeps the
//! semantics testable without a running server.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use toolspec_core::AccessDecision;
use toolspec_core::AccessGate;
use toolspec_core::AccessStatusReport;
use toolspec_core::FieldError;
use toolspec_core::InstallId;
use toolspec_core::InstallRecord;
use toolspec_core::ReviewId;
use toolspec_core::SharedRegistryStore;
use toolspec_core::StoreError;
use toolspec_core::Timestamp;
use toolspec_core::validate_submission;

use crate::reviews::ReviewCatalog;
use crate::reviews::ReviewSummary;
use crate::reviews::ToolReview;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Random bytes backing a generated identifier token.
const ID_TOKEN_BYTES: usize = 16;
/// Random bytes backing an install secret.
const SECRET_BYTES: usize = 32;
/// Guidance returned when reads are attempted without granted access.
const READ_ACCESS_MESSAGE: &str =
    "Review reads require an active install with a completed submission. Run `toolspec install` \
     and `toolspec review` first.";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry operation errors, each mapping to one structured HTTP response.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Submission payload failed field validation.
    #[error("submission validation failed")]
    Validation(Vec<FieldError>),
    /// Caller lacks the access required for the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Storage backend failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Response Types
// ============================================================================

/// Response payload for a freshly registered install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallCreated {
    /// New install identifier.
    pub install_id: InstallId,
    /// Install secret; shown once and never returned again.
    pub install_secret: String,
    /// Credential version for future rotation.
    pub secret_version: u32,
}

/// Response payload for a revocation request.
#[derive(Debug, Clone, Serialize)]
pub struct RevokeOutcome {
    /// True when a matching install record existed.
    pub revoked: bool,
}

/// Contributor gating snapshot returned with accepted submissions.
#[derive(Debug, Clone, Serialize)]
pub struct ContributorStatus {
    /// Access decision after the submission was stored.
    pub submission_access: AccessDecision,
    /// Machine-readable reason label for the decision.
    pub reason: String,
}

/// Response payload for an accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionAccepted {
    /// Review id of the winning record for the idempotency key.
    pub review_id: ReviewId,
    /// `submitted` for a fresh record, `duplicate` for a replayed key.
    pub status: &'static str,
    /// Evidence count of the winning record.
    pub validated_tool_use_count: usize,
    /// Gating snapshot computed after the store commit.
    pub contributor_status: ContributorStatus,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Transport-free registry operations.
#[derive(Clone)]
pub struct RegistryService {
    /// Storage backend shared with the access gate.
    store: SharedRegistryStore,
    /// Gating state machine over the same store.
    gate: AccessGate,
    /// Seeded read-only review catalog.
    catalog: ReviewCatalog,
}

impl RegistryService {
    /// Creates a service over the given store and catalog.
    #[must_use]
    pub fn new(store: SharedRegistryStore, catalog: ReviewCatalog) -> Self {
        let gate = AccessGate::new(store.clone());
        Self {
            store,
            gate,
            catalog,
        }
    }

    /// Registers a new install and returns its one-time credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when persistence fails.
    pub fn register_install(&self, now: Timestamp) -> Result<InstallCreated, ServiceError> {
        let install_id = InstallId::from(format!("ins_{}", random_hex_token()).as_str());
        let install_secret = random_secret();
        let record = InstallRecord::new(install_id.clone(), install_secret.clone(), now);
        self.store.create_install(&record)?;
        Ok(InstallCreated {
            install_id,
            install_secret,
            secret_version: record.secret_version,
        })
    }

    /// Revokes an install permanently; idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the update fails.
    pub fn revoke_install(
        &self,
        install_id: &InstallId,
        now: Timestamp,
    ) -> Result<RevokeOutcome, ServiceError> {
        let revoked = self.store.revoke_install(install_id, now)?;
        Ok(RevokeOutcome {
            revoked,
        })
    }

    /// Computes the access-status report for an optional install id.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when storage reads fail.
    pub fn access_status(
        &self,
        install_id: Option<&InstallId>,
    ) -> Result<AccessStatusReport, ServiceError> {
        Ok(self.gate.status_report(install_id)?)
    }

    /// Validates and stores a submission, returning the accepted payload.
    ///
    /// The idempotency winner is authoritative: a replayed key returns the
    /// originally stored record with `status = "duplicate"`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] with every field error when the
    /// payload is invalid, or a storage error when persistence fails.
    pub fn submit(&self, body: &Value, now: Timestamp) -> Result<SubmissionAccepted, ServiceError> {
        let submission = validate_submission(body).map_err(ServiceError::Validation)?;
        let review_id = ReviewId::from(format!("rev_{}", random_hex_token()).as_str());
        let outcome = self.store.store_submission(&review_id, &submission, now)?;
        let access = self.gate.check(submission.install_id.as_ref())?;
        let reason = access
            .deny_reason
            .map_or_else(|| "granted".to_string(), |deny| deny.as_str().to_string());
        Ok(SubmissionAccepted {
            review_id: outcome.review_id,
            status: if outcome.duplicate { "duplicate" } else { "submitted" },
            validated_tool_use_count: outcome.validated_tool_use_count,
            contributor_status: ContributorStatus {
                submission_access: access.decision,
                reason,
            },
        })
    }

    /// Returns the service index descriptor.
    #[must_use]
    pub fn service_index(&self) -> Value {
        json!({
            "toolspec": "v1",
            "endpoints": {
                "register": "POST /installs",
                "revoke": "POST /installs/{install_id}/revoke",
                "access_status": "GET /access-status?install_id=...",
                "submit": "POST /submissions",
                "reviews": "GET /reviews",
                "review_detail": "GET /reviews/{tool_slug}",
            },
        })
    }

    /// Lists review summaries; requires granted access.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless the install's access is
    /// granted, or a storage error when gating reads fail.
    pub fn reviews_list(
        &self,
        install_id: Option<&InstallId>,
        now: Timestamp,
    ) -> Result<Vec<ReviewSummary>, ServiceError> {
        self.require_read_access(install_id)?;
        Ok(self.catalog.summaries(now))
    }

    /// Returns the full review aggregate for a slug; requires granted access.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] without granted access and
    /// [`ServiceError::NotFound`] for an unknown slug.
    pub fn review_detail(
        &self,
        install_id: Option<&InstallId>,
        slug: &str,
    ) -> Result<ToolReview, ServiceError> {
        self.require_read_access(install_id)?;
        self.catalog
            .get(slug)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("no review for tool: {slug}")))
    }

    /// Rejects callers whose gating decision is not granted.
    fn require_read_access(&self, install_id: Option<&InstallId>) -> Result<(), ServiceError> {
        let access = self.gate.check(install_id)?;
        if access.decision == AccessDecision::Granted {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(READ_ACCESS_MESSAGE.to_string()))
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a fresh random lowercase-hex token.
fn random_hex_token() -> String {
    let mut bytes = [0u8; ID_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let mut token = String::with_capacity(ID_TOKEN_BYTES * 2);
    for byte in bytes {
        token.push_str(&format!("{byte:02x}"));
    }
    token
}

/// Returns a fresh random install secret (URL-safe base64, no padding).
fn random_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
