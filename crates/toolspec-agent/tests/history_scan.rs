// toolspec-agent/tests/history_scan.rs
// ============================================================================
// Module: History Scanner Integration Tests
// Description: Filesystem-backed tests for the bounded history scan.
// Purpose: Verify extraction, file selection, and budget behavior end to end.
// Dependencies: tempfile, toolspec-agent, toolspec-core
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    missing_docs,
    reason = "Test-only assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use toolspec_agent::FileOutcome;
use toolspec_agent::HistoryLimits;
use toolspec_agent::HistoryScanner;
use toolspec_agent::SkipReason;
use toolspec_core::ToolSlug;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Scanner with roomy default-style limits.
fn scanner() -> HistoryScanner {
    HistoryScanner::new(HistoryLimits::default())
}

/// Writes a file under the temp root and returns its path.
fn write_file(root: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = root.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

#[test]
fn scan_recovers_tools_across_mixed_formats() {
    let root = TempDir::new().unwrap();
    write_file(
        &root,
        "session.jsonl",
        concat!(
            "{\"type\":\"tool_use\",\"name\":\"mcp__linear__create_issue\"}\n",
            "{\"type\":\"function_call\",\"name\":\"exec_command\"}\n",
            "not json but mentions functions.get_weather here\n",
        ),
    );
    write_file(&root, "agent.log", "ran mcp__github__list_prs and moved on\n");
    write_file(&root, "notes.txt", "mcp__secret__tool must not be picked up\n");

    let report = scanner().scan(&[root.path().to_path_buf()]);

    assert!(report.observed.contains(&ToolSlug::from("mcp__linear__create_issue")));
    assert!(report.observed.contains(&ToolSlug::from("bash")));
    assert!(report.observed.contains(&ToolSlug::from("functions.get_weather")));
    assert!(report.observed.contains(&ToolSlug::from("mcp__github__list_prs")));
    assert!(!report.observed.contains(&ToolSlug::from("mcp__secret__tool")));
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.parsed_files(), 2);
}

#[test]
fn file_root_is_scanned_directly() {
    let root = TempDir::new().unwrap();
    let path = write_file(&root, "history.jsonl", "saw mcp__notion__search in use\n");

    let report = scanner().scan(&[path]);

    assert!(report.observed.contains(&ToolSlug::from("mcp__notion__search")));
    assert_eq!(report.files.len(), 1);
}

#[test]
fn non_inspectable_file_root_is_ignored() {
    let root = TempDir::new().unwrap();
    let path = write_file(&root, "transcript.txt", "mcp__github__list_prs\n");

    let report = scanner().scan(&[path]);

    assert!(report.observed.is_empty());
    assert!(report.files.is_empty());
}

#[test]
fn missing_root_yields_empty_report() {
    let root = TempDir::new().unwrap();
    let report = scanner().scan(&[root.path().join("does-not-exist")]);
    assert!(report.observed.is_empty());
    assert!(report.files.is_empty());
}

#[test]
fn nested_directories_are_walked() {
    let root = TempDir::new().unwrap();
    write_file(&root, "projects/alpha/session.jsonl", "used mcp__slack__post_message\n");
    write_file(&root, "projects/beta/logs/agent.log", "used mcp__jira__create_ticket\n");

    let report = scanner().scan(&[root.path().to_path_buf()]);

    assert!(report.observed.contains(&ToolSlug::from("mcp__slack__post_message")));
    assert!(report.observed.contains(&ToolSlug::from("mcp__jira__create_ticket")));
}

// ============================================================================
// SECTION: Budgets
// ============================================================================

#[test]
fn file_budget_truncates_candidate_list() {
    let root = TempDir::new().unwrap();
    for index in 0..4 {
        write_file(&root, &format!("session-{index}.jsonl"), "mcp__github__list_prs\n");
    }
    let limits = HistoryLimits {
        max_files: 2,
        ..HistoryLimits::default()
    };

    let report = HistoryScanner::new(limits).scan(&[root.path().to_path_buf()]);

    assert_eq!(report.files.len(), 2);
}

#[test]
fn byte_budget_exhaustion_records_skips() {
    let root = TempDir::new().unwrap();
    write_file(&root, "one.jsonl", "mcp__github__list_prs mcp__linear__create_issue\n");
    write_file(&root, "two.jsonl", "mcp__notion__search\n");
    let limits = HistoryLimits {
        max_total_bytes: 8,
        ..HistoryLimits::default()
    };

    let report = HistoryScanner::new(limits).scan(&[root.path().to_path_buf()]);

    assert_eq!(report.files.len(), 2);
    let parsed = report.parsed_files();
    let skipped = report
        .files
        .iter()
        .filter(|file| {
            matches!(file.outcome, FileOutcome::Skipped {
                reason: SkipReason::BudgetExhausted,
            })
        })
        .count();
    assert_eq!(parsed, 1);
    assert_eq!(skipped, 1);
}

#[test]
fn directory_entry_budget_bounds_the_walk() {
    let root = TempDir::new().unwrap();
    for index in 0..6 {
        write_file(&root, &format!("session-{index}.jsonl"), "mcp__github__list_prs\n");
    }
    let limits = HistoryLimits {
        max_dir_entries: 2,
        ..HistoryLimits::default()
    };

    let report = HistoryScanner::new(limits).scan(&[root.path().to_path_buf()]);

    assert_eq!(report.files.len(), 2);
}

#[test]
fn duplicate_roots_scan_each_file_once() {
    let root = TempDir::new().unwrap();
    let path = write_file(&root, "session.jsonl", "mcp__github__list_prs\n");

    let report = scanner().scan(&[path.clone(), path, root.path().to_path_buf()]);

    assert_eq!(report.files.len(), 1);
}
