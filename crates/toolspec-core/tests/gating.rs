// crates/toolspec-core/tests/gating.rs
// ============================================================================
// Module: Access Gating Scenario Tests
// Description: End-to-end gating transitions across the submission lifecycle.
// ============================================================================
//! ## Overview
//! Walks an install through the gating state machine using the in-memory
//! store: fresh install, placeholder submission, meaningful submission, and
//! permanent revocation.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;

use toolspec_core::AccessDecision;
use toolspec_core::AccessGate;
use toolspec_core::AgentModel;
use toolspec_core::Confidence;
use toolspec_core::EvidenceEntry;
use toolspec_core::FailureFrequency;
use toolspec_core::FailureMode;
use toolspec_core::IdempotencyKey;
use toolspec_core::InMemoryRegistryStore;
use toolspec_core::InstallId;
use toolspec_core::InstallRecord;
use toolspec_core::InstallStore;
use toolspec_core::Recommendation;
use toolspec_core::ReviewId;
use toolspec_core::ReviewSubmission;
use toolspec_core::SESSION_TOOL_SLUG;
use toolspec_core::SubmissionScope;
use toolspec_core::SubmissionStore;
use toolspec_core::Timestamp;
use toolspec_core::ToolSlug;

/// Builds a session submission with the given observed slugs and key.
fn session_submission(
    install_id: &InstallId,
    observed: &[&str],
    key: &str,
) -> ReviewSubmission {
    ReviewSubmission {
        install_id: Some(install_id.clone()),
        submission_scope: Some(SubmissionScope::AllObserved),
        observed_tool_slugs: observed.iter().copied().map(ToolSlug::from).collect(),
        redacted_tool_slugs: Vec::new(),
        tool_slug: ToolSlug::from(SESSION_TOOL_SLUG),
        agent_model: AgentModel::from("test-agent"),
        review_window_start_utc: "2026-02-27T00:00:00Z".to_string(),
        review_window_end_utc: "2026-02-27T00:00:00Z".to_string(),
        recommendation: Recommendation::Caution,
        confidence: Confidence::Low,
        reliable_tools: observed.iter().copied().map(ToolSlug::from).collect(),
        unreliable_tools: Vec::new(),
        hallucinated_tools: Vec::new(),
        never_used_tools: Vec::new(),
        behavioral_notes: vec!["submitted_via_toolspec_cli".to_string()],
        failure_modes: vec![FailureMode {
            symptom: "not_provided".to_string(),
            likely_cause: "not_provided".to_string(),
            recovery: "not_provided".to_string(),
            frequency: FailureFrequency::Rare,
        }],
        evidence: vec![EvidenceEntry {
            tool_call_id: format!("session_{key}_1"),
            timestamp_utc: "2026-02-27T00:00:00Z".to_string(),
        }],
        idempotency_key: IdempotencyKey::from(key),
    }
}

#[test]
fn gating_walks_limited_to_granted() {
    let store = Arc::new(InMemoryRegistryStore::new());
    let install_id = InstallId::from("ins_scenario");
    store
        .create_install(&InstallRecord::new(
            install_id.clone(),
            "secret".to_string(),
            Timestamp::from_unix_millis(1_000),
        ))
        .unwrap();
    let gate = AccessGate::new(store.clone());

    let report = gate.status_report(Some(&install_id)).unwrap();
    assert_eq!(report.submission_access, AccessDecision::Limited);
    assert_eq!(report.deny_reason.as_deref(), Some("initial_submission_required"));

    // Placeholder submission with no observed tools cannot advance gating.
    let placeholder = session_submission(&install_id, &[], "key_placeholder");
    store
        .store_submission(&ReviewId::from("rev_1"), &placeholder, Timestamp::from_unix_millis(2_000))
        .unwrap();
    let report = gate.status_report(Some(&install_id)).unwrap();
    assert_eq!(report.submission_access, AccessDecision::Limited);
    assert_eq!(report.deny_reason.as_deref(), Some("meaningful_submission_required"));

    let meaningful = session_submission(&install_id, &["github"], "key_meaningful");
    store
        .store_submission(&ReviewId::from("rev_2"), &meaningful, Timestamp::from_unix_millis(3_000))
        .unwrap();
    let report = gate.status_report(Some(&install_id)).unwrap();
    assert_eq!(report.submission_access, AccessDecision::Granted);
    assert_eq!(report.deny_reason, None);
    assert!(!report.post_install_required);
}

#[test]
fn revocation_is_permanent_despite_new_submissions() {
    let store = Arc::new(InMemoryRegistryStore::new());
    let install_id = InstallId::from("ins_revoked");
    store
        .create_install(&InstallRecord::new(
            install_id.clone(),
            "secret".to_string(),
            Timestamp::from_unix_millis(1_000),
        ))
        .unwrap();
    let meaningful = session_submission(&install_id, &["github"], "key_before_revoke");
    store
        .store_submission(&ReviewId::from("rev_1"), &meaningful, Timestamp::from_unix_millis(2_000))
        .unwrap();
    let gate = AccessGate::new(store.clone());
    assert_eq!(
        gate.status_report(Some(&install_id)).unwrap().submission_access,
        AccessDecision::Granted
    );

    assert!(store.revoke_install(&install_id, Timestamp::from_unix_millis(3_000)).unwrap());

    // Valid submissions after revocation never restore access.
    let late = session_submission(&install_id, &["linear"], "key_after_revoke");
    store
        .store_submission(&ReviewId::from("rev_2"), &late, Timestamp::from_unix_millis(4_000))
        .unwrap();
    let report = gate.status_report(Some(&install_id)).unwrap();
    assert_eq!(report.submission_access, AccessDecision::Denied);
    assert_eq!(report.deny_reason.as_deref(), Some("install_revoked"));
}

#[test]
fn revoke_is_idempotent_and_reports_existence() {
    let store = InMemoryRegistryStore::new();
    let install_id = InstallId::from("ins_twice");
    store
        .create_install(&InstallRecord::new(
            install_id.clone(),
            "secret".to_string(),
            Timestamp::from_unix_millis(1_000),
        ))
        .unwrap();
    assert!(store.revoke_install(&install_id, Timestamp::from_unix_millis(2_000)).unwrap());
    assert!(store.revoke_install(&install_id, Timestamp::from_unix_millis(9_000)).unwrap());
    // Original revocation time is preserved.
    let record = store.load_install(&install_id).unwrap().unwrap();
    assert_eq!(record.revoked_at, Some(Timestamp::from_unix_millis(2_000)));
    // Revoking an unknown install is not an error.
    assert!(
        !store
            .revoke_install(&InstallId::from("ins_missing"), Timestamp::from_unix_millis(1))
            .unwrap()
    );
}

#[test]
fn duplicate_key_returns_original_outcome() {
    let store = InMemoryRegistryStore::new();
    let install_id = InstallId::from("ins_dup");
    store
        .create_install(&InstallRecord::new(
            install_id.clone(),
            "secret".to_string(),
            Timestamp::from_unix_millis(1_000),
        ))
        .unwrap();
    let first = session_submission(&install_id, &["github"], "shared_key");
    let mut second = session_submission(&install_id, &["github"], "shared_key");
    second.evidence.push(EvidenceEntry {
        tool_call_id: "session_extra".to_string(),
        timestamp_utc: "2026-02-27T00:00:01Z".to_string(),
    });

    let outcome_one = store
        .store_submission(&ReviewId::from("rev_a"), &first, Timestamp::from_unix_millis(2_000))
        .unwrap();
    let outcome_two = store
        .store_submission(&ReviewId::from("rev_b"), &second, Timestamp::from_unix_millis(3_000))
        .unwrap();

    assert!(!outcome_one.duplicate);
    assert!(outcome_two.duplicate);
    assert_eq!(outcome_one.review_id, outcome_two.review_id);
    assert_eq!(outcome_one.validated_tool_use_count, outcome_two.validated_tool_use_count);
}
