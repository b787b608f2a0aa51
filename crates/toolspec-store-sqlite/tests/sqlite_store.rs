// toolspec-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Registry Store Tests
// Description: Tests for durable install records, idempotent submission
//              storage, set-once timestamps, and concurrent writers.
// Purpose: Ensure the SQLite backend enforces the storage contract.
// Dependencies: toolspec-store-sqlite, toolspec-core, tempfile
// ============================================================================

//! ## Overview
//! Conformance tests for the `SQLite`-backed registry store. Exercises the
//! install lifecycle, first-writer-wins idempotency under concurrency, and
//! schema initialization across reopen.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    unused_imports,
    missing_docs,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use toolspec_core::AgentModel;
use toolspec_core::Confidence;
use toolspec_core::EvidenceEntry;
use toolspec_core::FailureFrequency;
use toolspec_core::FailureMode;
use toolspec_core::IdempotencyKey;
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
use toolspec_store_sqlite::SqliteRegistryConfig;
use toolspec_store_sqlite::SqliteRegistryStore;
use toolspec_store_sqlite::SqliteStoreMode;
use toolspec_store_sqlite::SqliteSyncMode;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn store_config(dir: &TempDir) -> SqliteRegistryConfig {
    SqliteRegistryConfig {
        path: dir.path().join("registry.sqlite"),
        busy_timeout_ms: 5_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    }
}

fn sample_install(install_id: &str) -> InstallRecord {
    InstallRecord::new(
        InstallId::from(install_id),
        "secret-value".to_string(),
        Timestamp::from_unix_millis(1_000),
    )
}

fn sample_submission(install_id: Option<&str>, observed: &[&str], key: &str) -> ReviewSubmission {
    ReviewSubmission {
        install_id: install_id.map(InstallId::from),
        submission_scope: Some(SubmissionScope::AllObserved),
        observed_tool_slugs: observed.iter().copied().map(ToolSlug::from).collect(),
        redacted_tool_slugs: Vec::new(),
        tool_slug: ToolSlug::from(SESSION_TOOL_SLUG),
        agent_model: AgentModel::from("test-agent"),
        review_window_start_utc: "2026-02-27T00:00:00Z".to_string(),
        review_window_end_utc: "2026-02-27T01:00:00Z".to_string(),
        recommendation: Recommendation::Recommended,
        confidence: Confidence::Medium,
        reliable_tools: observed.iter().copied().map(ToolSlug::from).collect(),
        unreliable_tools: Vec::new(),
        hallucinated_tools: Vec::new(),
        never_used_tools: Vec::new(),
        behavioral_notes: Vec::new(),
        failure_modes: vec![FailureMode {
            symptom: "not_provided".to_string(),
            likely_cause: "not_provided".to_string(),
            recovery: "not_provided".to_string(),
            frequency: FailureFrequency::Rare,
        }],
        evidence: vec![EvidenceEntry {
            tool_call_id: format!("call_{key}"),
            timestamp_utc: "2026-02-27T00:30:00Z".to_string(),
        }],
        idempotency_key: IdempotencyKey::from(key),
    }
}

// ============================================================================
// SECTION: Install Lifecycle Tests
// ============================================================================

#[test]
fn create_and_load_round_trips_install_record() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteRegistryStore::new(&store_config(&dir)).expect("open store");
    let record = sample_install("ins_alpha");
    store.create_install(&record).expect("create");
    let loaded = store
        .load_install(&InstallId::from("ins_alpha"))
        .expect("load")
        .expect("record present");
    assert_eq!(loaded, record);
}

#[test]
fn create_rejects_duplicate_install_id() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteRegistryStore::new(&store_config(&dir)).expect("open store");
    store.create_install(&sample_install("ins_dup")).expect("first create");
    assert!(store.create_install(&sample_install("ins_dup")).is_err());
}

#[test]
fn revoke_preserves_original_revocation_time() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteRegistryStore::new(&store_config(&dir)).expect("open store");
    let install_id = InstallId::from("ins_revoke");
    store.create_install(&sample_install("ins_revoke")).expect("create");
    assert!(store.revoke_install(&install_id, Timestamp::from_unix_millis(2_000)).expect("revoke"));
    assert!(store.revoke_install(&install_id, Timestamp::from_unix_millis(9_000)).expect("again"));
    let record = store.load_install(&install_id).expect("load").expect("present");
    assert_eq!(record.revoked_at, Some(Timestamp::from_unix_millis(2_000)));
}

#[test]
fn revoke_missing_install_reports_absence_without_error() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteRegistryStore::new(&store_config(&dir)).expect("open store");
    let existed = store
        .revoke_install(&InstallId::from("ins_missing"), Timestamp::from_unix_millis(1))
        .expect("revoke");
    assert!(!existed);
}

#[test]
fn mark_first_meaningful_submission_is_set_once() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteRegistryStore::new(&store_config(&dir)).expect("open store");
    let install_id = InstallId::from("ins_once");
    store.create_install(&sample_install("ins_once")).expect("create");
    store
        .mark_first_meaningful_submission(&install_id, Timestamp::from_unix_millis(5_000))
        .expect("first mark");
    store
        .mark_first_meaningful_submission(&install_id, Timestamp::from_unix_millis(9_000))
        .expect("second mark");
    let record = store.load_install(&install_id).expect("load").expect("present");
    assert_eq!(record.first_meaningful_submission_at, Some(Timestamp::from_unix_millis(5_000)));
}

// ============================================================================
// SECTION: Submission Idempotency Tests
// ============================================================================

#[test]
fn store_submission_returns_stored_record_for_duplicate_key() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteRegistryStore::new(&store_config(&dir)).expect("open store");
    store.create_install(&sample_install("ins_sub")).expect("create");
    let first = sample_submission(Some("ins_sub"), &["github"], "shared_key");
    let mut second = sample_submission(Some("ins_sub"), &["github"], "shared_key");
    second.evidence.push(EvidenceEntry {
        tool_call_id: "call_extra".to_string(),
        timestamp_utc: "2026-02-27T00:45:00Z".to_string(),
    });

    let outcome_one = store
        .store_submission(&ReviewId::from("rev_one"), &first, Timestamp::from_unix_millis(2_000))
        .expect("first store");
    let outcome_two = store
        .store_submission(&ReviewId::from("rev_two"), &second, Timestamp::from_unix_millis(3_000))
        .expect("second store");

    assert!(!outcome_one.duplicate);
    assert!(outcome_two.duplicate);
    assert_eq!(outcome_two.review_id, ReviewId::from("rev_one"));
    assert_eq!(outcome_two.validated_tool_use_count, 1);
}

#[test]
fn meaningful_submission_sets_install_timestamp_once() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteRegistryStore::new(&store_config(&dir)).expect("open store");
    let install_id = InstallId::from("ins_mark");
    store.create_install(&sample_install("ins_mark")).expect("create");

    let empty = sample_submission(Some("ins_mark"), &[], "key_empty");
    store
        .store_submission(&ReviewId::from("rev_empty"), &empty, Timestamp::from_unix_millis(2_000))
        .expect("store placeholder");
    let record = store.load_install(&install_id).expect("load").expect("present");
    assert_eq!(record.first_meaningful_submission_at, None);

    let meaningful = sample_submission(Some("ins_mark"), &["github"], "key_meaningful");
    store
        .store_submission(
            &ReviewId::from("rev_full"),
            &meaningful,
            Timestamp::from_unix_millis(3_000),
        )
        .expect("store meaningful");
    let record = store.load_install(&install_id).expect("load").expect("present");
    assert_eq!(record.first_meaningful_submission_at, Some(Timestamp::from_unix_millis(3_000)));

    let later = sample_submission(Some("ins_mark"), &["linear"], "key_later");
    store
        .store_submission(&ReviewId::from("rev_later"), &later, Timestamp::from_unix_millis(9_000))
        .expect("store later");
    let record = store.load_install(&install_id).expect("load").expect("present");
    assert_eq!(record.first_meaningful_submission_at, Some(Timestamp::from_unix_millis(3_000)));
}

#[test]
fn anonymous_submission_is_stored_without_install_linkage() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteRegistryStore::new(&store_config(&dir)).expect("open store");
    let submission = sample_submission(None, &["github"], "key_anon");
    let outcome = store
        .store_submission(&ReviewId::from("rev_anon"), &submission, Timestamp::from_unix_millis(1))
        .expect("store");
    assert!(!outcome.duplicate);
    assert!(!store.has_any_submission(&InstallId::from("ins_none")).expect("lookup"));
}

#[test]
fn has_any_submission_tracks_attributed_rows() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteRegistryStore::new(&store_config(&dir)).expect("open store");
    let install_id = InstallId::from("ins_has");
    store.create_install(&sample_install("ins_has")).expect("create");
    assert!(!store.has_any_submission(&install_id).expect("before"));
    let submission = sample_submission(Some("ins_has"), &[], "key_has");
    store
        .store_submission(&ReviewId::from("rev_has"), &submission, Timestamp::from_unix_millis(1))
        .expect("store");
    assert!(store.has_any_submission(&install_id).expect("after"));
}

#[test]
fn load_by_key_returns_stored_outcome() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteRegistryStore::new(&store_config(&dir)).expect("open store");
    assert!(
        store.load_by_key(&IdempotencyKey::from("key_absent")).expect("lookup").is_none()
    );
    let submission = sample_submission(None, &["github"], "key_present");
    store
        .store_submission(&ReviewId::from("rev_key"), &submission, Timestamp::from_unix_millis(1))
        .expect("store");
    let outcome = store
        .load_by_key(&IdempotencyKey::from("key_present"))
        .expect("lookup")
        .expect("present");
    assert_eq!(outcome.review_id, ReviewId::from("rev_key"));
    assert_eq!(outcome.validated_tool_use_count, 1);
}

// ============================================================================
// SECTION: Concurrency Tests
// ============================================================================

#[test]
fn concurrent_writers_converge_on_one_winner_per_key() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(SqliteRegistryStore::new(&store_config(&dir)).expect("open store"));
    store.create_install(&sample_install("ins_race")).expect("create");

    let mut handles = Vec::new();
    for index in 0..8_i64 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            let submission =
                sample_submission(Some("ins_race"), &["github"], "key_contended");
            store
                .store_submission(
                    &ReviewId::from(format!("rev_{index}").as_str()),
                    &submission,
                    Timestamp::from_unix_millis(1_000 + index),
                )
                .expect("store")
        }));
    }
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().expect("join")).collect();

    let winners: Vec<_> = outcomes.iter().filter(|outcome| !outcome.duplicate).collect();
    assert_eq!(winners.len(), 1);
    let winning_id = &winners[0].review_id;
    assert!(outcomes.iter().all(|outcome| outcome.review_id == *winning_id));
}

// ============================================================================
// SECTION: Reopen Tests
// ============================================================================

#[test]
fn reopen_preserves_existing_rows_and_schema() {
    let dir = TempDir::new().expect("tempdir");
    let config = store_config(&dir);
    {
        let store = SqliteRegistryStore::new(&config).expect("open store");
        store.create_install(&sample_install("ins_persist")).expect("create");
        let submission = sample_submission(Some("ins_persist"), &["github"], "key_persist");
        store
            .store_submission(
                &ReviewId::from("rev_persist"),
                &submission,
                Timestamp::from_unix_millis(1),
            )
            .expect("store");
    }
    let store = SqliteRegistryStore::new(&config).expect("reopen store");
    assert!(store.load_install(&InstallId::from("ins_persist")).expect("load").is_some());
    let outcome = store
        .load_by_key(&IdempotencyKey::from("key_persist"))
        .expect("lookup")
        .expect("present");
    assert_eq!(outcome.review_id, ReviewId::from("rev_persist"));
}

#[test]
fn open_rejects_directory_path() {
    let dir = TempDir::new().expect("tempdir");
    let config = SqliteRegistryConfig {
        path: dir.path().to_path_buf(),
        busy_timeout_ms: 5_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    };
    assert!(SqliteRegistryStore::new(&config).is_err());
}
