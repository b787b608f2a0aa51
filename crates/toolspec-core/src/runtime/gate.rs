// toolspec-core/src/runtime/gate.rs
// ============================================================================
// Module: Access Gate
// Description: Combines storage reads with the gating state machine.
// Purpose: Produce wire-ready access-status reports per install.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The access gate loads install facts fresh from storage on every check,
//! runs the pure [`evaluate_access`] state machine, and translates the
//! outcome into the wire report served by `GET /access-status`. Nothing in
//! this module caches decisions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;

use crate::core::access::AccessDecision;
use crate::core::access::AccessOutcome;
use crate::core::access::InstallFacts;
use crate::core::access::evaluate_access;
use crate::core::identifiers::InstallId;
use crate::interfaces::InstallStore;
use crate::interfaces::StoreError;
use crate::interfaces::SubmissionStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Command the client must run to complete activation.
const REVIEW_COMMAND: &str = "toolspec review";
/// Command unlocked once access is granted.
const SEARCH_COMMAND: &str = "toolspec search <keyword>";

// ============================================================================
// SECTION: Store Seam
// ============================================================================

/// Combined storage surface required by the server runtime.
pub trait RegistryStore: InstallStore + SubmissionStore + Send + Sync {}

impl<S> RegistryStore for S where S: InstallStore + SubmissionStore + Send + Sync {}

/// Shared, clonable handle to a registry store backend.
pub type SharedRegistryStore = Arc<dyn RegistryStore>;

// ============================================================================
// SECTION: Status Report
// ============================================================================

/// Wire-ready access status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessStatusReport {
    /// The access decision.
    pub submission_access: AccessDecision,
    /// Machine-readable reason for a non-granted decision.
    pub deny_reason: Option<String>,
    /// Concrete next commands for the caller.
    pub next_actions: Vec<String>,
    /// True while the install must still complete a meaningful submission.
    pub post_install_required: bool,
    /// Command completing the install flow, while required.
    pub post_install_required_command: Option<String>,
    /// Guidance message accompanying the required command.
    pub post_install_required_message: Option<String>,
    /// RFC 3339 time of the first meaningful submission, once set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_submission_completed_at: Option<String>,
}

// ============================================================================
// SECTION: Access Gate
// ============================================================================

/// Stateless access gate over a registry store.
#[derive(Clone)]
pub struct AccessGate {
    /// Storage backend queried fresh per check.
    store: SharedRegistryStore,
}

impl AccessGate {
    /// Creates an access gate over the given store.
    #[must_use]
    pub fn new(store: SharedRegistryStore) -> Self {
        Self {
            store,
        }
    }

    /// Evaluates the gating state machine for an optional install id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when install facts cannot be loaded; storage
    /// failures are never silently degraded into a decision.
    pub fn check(&self, install_id: Option<&InstallId>) -> Result<AccessOutcome, StoreError> {
        let facts = match install_id {
            None => None,
            Some(id) => {
                let record = self.store.load_install(id)?;
                let has_any_submission =
                    if record.is_some() { self.store.has_any_submission(id)? } else { false };
                Some(InstallFacts {
                    record,
                    has_any_submission,
                })
            }
        };
        Ok(evaluate_access(facts.as_ref()))
    }

    /// Evaluates gating and renders the wire report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when install facts cannot be loaded.
    pub fn status_report(
        &self,
        install_id: Option<&InstallId>,
    ) -> Result<AccessStatusReport, StoreError> {
        Ok(render_report(&self.check(install_id)?))
    }
}

/// Renders a gating outcome into the wire report.
fn render_report(outcome: &AccessOutcome) -> AccessStatusReport {
    let granted = outcome.decision == AccessDecision::Granted;
    let first_submission_completed_at = outcome
        .first_submission_completed_at
        .and_then(|at| at.to_rfc3339().ok());
    let next_actions = if granted {
        vec![format!("run: {SEARCH_COMMAND}")]
    } else {
        vec![format!("run: {REVIEW_COMMAND}")]
    };
    AccessStatusReport {
        submission_access: outcome.decision,
        deny_reason: outcome.deny_reason.map(|reason| reason.as_str().to_string()),
        next_actions,
        post_install_required: !granted,
        post_install_required_command: (!granted).then(|| REVIEW_COMMAND.to_string()),
        post_install_required_message: (!granted).then(|| {
            format!(
                "Install flow is only complete after at least one `{REVIEW_COMMAND}` submission \
                 with observed tools."
            )
        }),
        first_submission_completed_at,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
