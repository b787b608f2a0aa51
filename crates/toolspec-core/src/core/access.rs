// toolspec-core/src/core/access.rs
// ============================================================================
// Module: Access Gating State Machine
// Description: Pure access decision over install facts.
// Purpose: Decide read access per install, recomputed fresh on every check.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The gating decision controls whether an install may read review data.
//! It is a pure function over the facts loaded for one install: decisions
//! are never cached, and revocation dominates every other state. There is
//! no path back from a revoked install to `Granted`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::install::InstallRecord;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Decision Types
// ============================================================================

/// Access decision for one install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// Full read access.
    Granted,
    /// Access withheld until the client completes a required action.
    Limited,
    /// Access permanently denied.
    Denied,
}

/// Machine-readable reason accompanying a non-granted decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No install id was supplied with the request.
    InstallIdMissing,
    /// The supplied install id does not resolve to a record.
    InstallNotFound,
    /// The install has been revoked.
    InstallRevoked,
    /// The install has not submitted anything yet.
    InitialSubmissionRequired,
    /// The install has submitted, but nothing meaningful yet.
    MeaningfulSubmissionRequired,
}

impl DenyReason {
    /// Returns the stable wire label for the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InstallIdMissing => "install_id_missing",
            Self::InstallNotFound => "install_not_found",
            Self::InstallRevoked => "install_revoked",
            Self::InitialSubmissionRequired => "initial_submission_required",
            Self::MeaningfulSubmissionRequired => "meaningful_submission_required",
        }
    }
}

/// Facts loaded for one gating evaluation.
///
/// # Invariants
/// - Facts are loaded fresh per check; the state machine never caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallFacts {
    /// The install record, when the supplied id resolved.
    pub record: Option<InstallRecord>,
    /// True when at least one submission (meaningful or not) references the install.
    pub has_any_submission: bool,
}

/// Outcome of one gating evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessOutcome {
    /// The decision.
    pub decision: AccessDecision,
    /// Reason for a non-granted decision.
    pub deny_reason: Option<DenyReason>,
    /// First meaningful submission time, when set.
    pub first_submission_completed_at: Option<Timestamp>,
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates the gating state machine for one install.
///
/// `facts` is `None` when the caller supplied no install id at all.
#[must_use]
pub fn evaluate_access(facts: Option<&InstallFacts>) -> AccessOutcome {
    let Some(facts) = facts else {
        return limited(DenyReason::InstallIdMissing);
    };
    let Some(record) = facts.record.as_ref() else {
        return denied(DenyReason::InstallNotFound);
    };
    if record.is_revoked() {
        return denied(DenyReason::InstallRevoked);
    }
    if let Some(first_at) = record.first_meaningful_submission_at {
        return AccessOutcome {
            decision: AccessDecision::Granted,
            deny_reason: None,
            first_submission_completed_at: Some(first_at),
        };
    }
    if facts.has_any_submission {
        limited(DenyReason::MeaningfulSubmissionRequired)
    } else {
        limited(DenyReason::InitialSubmissionRequired)
    }
}

/// Builds a limited outcome with the given reason.
const fn limited(reason: DenyReason) -> AccessOutcome {
    AccessOutcome {
        decision: AccessDecision::Limited,
        deny_reason: Some(reason),
        first_submission_completed_at: None,
    }
}

/// Builds a denied outcome with the given reason.
const fn denied(reason: DenyReason) -> AccessOutcome {
    AccessOutcome {
        decision: AccessDecision::Denied,
        deny_reason: Some(reason),
        first_submission_completed_at: None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::AccessDecision;
    use super::DenyReason;
    use super::InstallFacts;
    use super::evaluate_access;
    use crate::core::identifiers::InstallId;
    use crate::core::install::InstallRecord;
    use crate::core::time::Timestamp;

    /// Returns a fresh unrevoked record.
    fn fresh_record() -> InstallRecord {
        InstallRecord::new(
            InstallId::from("ins_test"),
            "secret".to_string(),
            Timestamp::from_unix_millis(1_000),
        )
    }

    #[test]
    fn missing_install_id_is_limited() {
        let outcome = evaluate_access(None);
        assert_eq!(outcome.decision, AccessDecision::Limited);
        assert_eq!(outcome.deny_reason, Some(DenyReason::InstallIdMissing));
    }

    #[test]
    fn unknown_install_is_denied() {
        let facts = InstallFacts {
            record: None,
            has_any_submission: false,
        };
        let outcome = evaluate_access(Some(&facts));
        assert_eq!(outcome.decision, AccessDecision::Denied);
        assert_eq!(outcome.deny_reason, Some(DenyReason::InstallNotFound));
    }

    #[test]
    fn fresh_install_requires_initial_submission() {
        let facts = InstallFacts {
            record: Some(fresh_record()),
            has_any_submission: false,
        };
        let outcome = evaluate_access(Some(&facts));
        assert_eq!(outcome.decision, AccessDecision::Limited);
        assert_eq!(outcome.deny_reason, Some(DenyReason::InitialSubmissionRequired));
    }

    #[test]
    fn placeholder_submission_requires_meaningful_submission() {
        let facts = InstallFacts {
            record: Some(fresh_record()),
            has_any_submission: true,
        };
        let outcome = evaluate_access(Some(&facts));
        assert_eq!(outcome.decision, AccessDecision::Limited);
        assert_eq!(outcome.deny_reason, Some(DenyReason::MeaningfulSubmissionRequired));
    }

    #[test]
    fn meaningful_submission_grants_access() {
        let mut record = fresh_record();
        record.first_meaningful_submission_at = Some(Timestamp::from_unix_millis(2_000));
        let facts = InstallFacts {
            record: Some(record),
            has_any_submission: true,
        };
        let outcome = evaluate_access(Some(&facts));
        assert_eq!(outcome.decision, AccessDecision::Granted);
        assert_eq!(outcome.deny_reason, None);
        assert_eq!(
            outcome.first_submission_completed_at,
            Some(Timestamp::from_unix_millis(2_000))
        );
    }

    #[test]
    fn revocation_dominates_meaningful_submission() {
        let mut record = fresh_record();
        record.first_meaningful_submission_at = Some(Timestamp::from_unix_millis(2_000));
        record.revoked_at = Some(Timestamp::from_unix_millis(3_000));
        let facts = InstallFacts {
            record: Some(record),
            has_any_submission: true,
        };
        let outcome = evaluate_access(Some(&facts));
        assert_eq!(outcome.decision, AccessDecision::Denied);
        assert_eq!(outcome.deny_reason, Some(DenyReason::InstallRevoked));
    }
}
