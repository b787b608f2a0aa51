// toolspec-agent/src/history.rs
// ============================================================================
// Module: Usage-Evidence History Extractor
// Description: Bounded best-effort scan of local agent-session history files.
// Purpose: Recover the deduplicated set of observed tool slugs from logs.
// Dependencies: serde_json, toolspec-config, toolspec-core
// ============================================================================

//! ## Overview
//! Agent runtimes leave session history in heterogeneous local formats: JSONL
//! transcripts, plain-text logs, and mixed files where JSON records and bare
//! text interleave. The extractor walks a bounded set of scan roots, reads
//! file tails within byte budgets, and recovers tool references through two
//! passes per line: structural extraction from parsed JSON records, then a
//! token scan over bare text. Every recovered name is canonicalized.
//!
//! The pipeline is heuristic by contract: unreadable files, malformed lines,
//! and decoding errors are recorded skips, never errors. Partial and empty
//! results are valid outputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use serde_json::Value;
use toolspec_config::HistoryConfig;
use toolspec_core::ToolSlug;
use toolspec_core::canonicalize;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Byte and entry budgets bounding one history scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    /// Per-file tail cap in bytes.
    pub max_file_bytes: u64,
    /// Cumulative read budget in bytes.
    pub max_total_bytes: u64,
    /// Maximum number of files inspected per scan.
    pub max_files: usize,
    /// Maximum directory entries visited per listing.
    pub max_dir_entries: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self::from(&HistoryConfig::default())
    }
}

impl From<&HistoryConfig> for HistoryLimits {
    fn from(config: &HistoryConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes,
            max_total_bytes: config.max_total_bytes,
            max_files: config.max_files,
            max_dir_entries: config.max_dir_entries,
        }
    }
}

// ============================================================================
// SECTION: Scan Report
// ============================================================================

/// Why a candidate file contributed nothing to the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be opened or read.
    Unreadable,
    /// The cumulative byte budget was exhausted before this file.
    BudgetExhausted,
}

impl SkipReason {
    /// Returns the stable label for this skip reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unreadable => "unreadable",
            Self::BudgetExhausted => "budget_exhausted",
        }
    }
}

/// Per-file scan outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file tail was read and parsed.
    Parsed {
        /// Distinct tool slugs recovered from this file.
        tools: usize,
    },
    /// The file was selected but contributed nothing.
    Skipped {
        /// Why the file was skipped.
        reason: SkipReason,
    },
}

/// One scanned candidate file and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Absolute path of the candidate.
    pub path: PathBuf,
    /// What the scan did with it.
    pub outcome: FileOutcome,
}

/// Result of one bounded history scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Deduplicated canonical slugs recovered across all files.
    pub observed: BTreeSet<ToolSlug>,
    /// Per-file outcomes in processing order (newest first).
    pub files: Vec<ScannedFile>,
}

impl ScanReport {
    /// Returns the number of files that were read and parsed.
    #[must_use]
    pub fn parsed_files(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.outcome, FileOutcome::Parsed { .. }))
            .count()
    }

    /// Returns the number of files recorded as skips.
    #[must_use]
    pub fn skipped_files(&self) -> usize {
        self.files.len() - self.parsed_files()
    }
}

// ============================================================================
// SECTION: Scanner
// ============================================================================

/// A selected candidate file with ordering metadata.
#[derive(Debug, Clone)]
struct FileCandidate {
    /// Candidate path.
    path: PathBuf,
    /// Modification time in unix milliseconds; zero when unavailable.
    modified_ms: u128,
}

/// Bounded history scanner over a set of filesystem roots.
#[derive(Debug, Clone)]
pub struct HistoryScanner {
    /// Budgets bounding the scan.
    limits: HistoryLimits,
}

impl HistoryScanner {
    /// Creates a scanner with the given limits.
    #[must_use]
    pub const fn new(limits: HistoryLimits) -> Self {
        Self {
            limits,
        }
    }

    /// Scans the given roots and returns the observed-tool report.
    ///
    /// Roots may be files or directories; missing or unreadable roots are
    /// silently ignored. Candidates are deduplicated by path (keeping the
    /// freshest modification time), ordered newest first, and truncated to
    /// the file budget before any bytes are read.
    #[must_use]
    pub fn scan(&self, roots: &[PathBuf]) -> ScanReport {
        let mut candidates: Vec<FileCandidate> = Vec::new();
        for root in roots {
            let Ok(metadata) = fs::metadata(root) else {
                continue;
            };
            if metadata.is_file() {
                if should_inspect(root) {
                    candidates.push(candidate_from(root.clone(), &metadata));
                }
            } else if metadata.is_dir() {
                candidates.extend(self.list_history_files(root));
            }
        }

        let mut deduped: BTreeMap<PathBuf, FileCandidate> = BTreeMap::new();
        for entry in candidates {
            deduped
                .entry(entry.path.clone())
                .and_modify(|kept| {
                    if entry.modified_ms > kept.modified_ms {
                        kept.modified_ms = entry.modified_ms;
                    }
                })
                .or_insert(entry);
        }
        let mut files: Vec<FileCandidate> = deduped.into_values().collect();
        files.sort_by(|left, right| right.modified_ms.cmp(&left.modified_ms));
        files.truncate(self.limits.max_files);

        let mut report = ScanReport::default();
        let mut remaining = self.limits.max_total_bytes;
        for file in files {
            if remaining == 0 {
                report.files.push(ScannedFile {
                    path: file.path,
                    outcome: FileOutcome::Skipped {
                        reason: SkipReason::BudgetExhausted,
                    },
                });
                continue;
            }
            let cap = self.limits.max_file_bytes.min(remaining);
            match read_file_tail(&file.path, cap) {
                Ok(content) => {
                    let consumed = u64::try_from(content.len()).unwrap_or(u64::MAX);
                    remaining = remaining.saturating_sub(consumed);
                    let mut found = BTreeSet::new();
                    parse_history_content(&content, &mut found);
                    let tools = found.len();
                    report.observed.extend(found);
                    report.files.push(ScannedFile {
                        path: file.path,
                        outcome: FileOutcome::Parsed {
                            tools,
                        },
                    });
                }
                Err(_) => {
                    report.files.push(ScannedFile {
                        path: file.path,
                        outcome: FileOutcome::Skipped {
                            reason: SkipReason::Unreadable,
                        },
                    });
                }
            }
        }
        report
    }

    /// Lists inspectable files under a directory root, breadth first.
    ///
    /// Entries within a directory are visited in reverse-lexicographic order
    /// so timestamp-named session files surface newest first under the entry
    /// budget. The budget counts every visited entry, directories included.
    fn list_history_files(&self, root: &Path) -> Vec<FileCandidate> {
        let mut files = Vec::new();
        let mut queue: VecDeque<PathBuf> = VecDeque::from([root.to_path_buf()]);
        let mut visited = 0usize;
        while let Some(dir) = queue.pop_front() {
            if visited >= self.limits.max_dir_entries {
                break;
            }
            let Ok(read_dir) = fs::read_dir(&dir) else {
                continue;
            };
            let mut entries: Vec<PathBuf> = read_dir.flatten().map(|entry| entry.path()).collect();
            entries.sort_by(|left, right| right.file_name().cmp(&left.file_name()));
            for path in entries {
                if visited >= self.limits.max_dir_entries {
                    break;
                }
                visited += 1;
                let Ok(metadata) = fs::symlink_metadata(&path) else {
                    continue;
                };
                if metadata.is_dir() {
                    queue.push_back(path);
                    continue;
                }
                if metadata.is_file() && should_inspect(&path) {
                    files.push(candidate_from(path, &metadata));
                }
            }
        }
        files
    }
}

/// Builds a candidate from a path and its metadata.
fn candidate_from(path: PathBuf, metadata: &fs::Metadata) -> FileCandidate {
    let modified_ms = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |elapsed| elapsed.as_millis());
    FileCandidate {
        path,
        modified_ms,
    }
}

/// Returns true when the file name marks an inspectable history file.
#[must_use]
pub fn should_inspect(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|name| name.to_string_lossy().to_lowercase()) else {
        return false;
    };
    name.ends_with(".jsonl")
        || name.ends_with(".log")
        || name == "history"
        || name == "history.json"
}

/// Reads at most `max_bytes` from the end of a file as lossy UTF-8.
fn read_file_tail(path: &Path, max_bytes: u64) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    let length = size.min(max_bytes);
    if length == 0 {
        return Ok(String::new());
    }
    file.seek(SeekFrom::Start(size - length))?;
    let mut buffer = Vec::with_capacity(usize::try_from(length).unwrap_or(usize::MAX));
    file.take(length).read_to_end(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// ============================================================================
// SECTION: Line Extraction
// ============================================================================

/// Extracts canonical slugs from mixed JSONL/text content, line by line.
///
/// Lines opening with `{` or `[` are tried as JSON first; on success the
/// structural extractor runs and the text scan is skipped for that line, even
/// when the parsed value yields no names. Everything else goes through the
/// token scan.
pub fn parse_history_content(content: &str, observed: &mut BTreeSet<ToolSlug>) {
    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if (line.starts_with('{') || line.starts_with('['))
            && let Ok(record) = serde_json::from_str::<Value>(line)
        {
            extract_from_json_record(&record, observed);
            continue;
        }
        extract_from_text(line, observed);
    }
}

/// Adds one raw name to the observed set after canonicalization.
fn add_observed(observed: &mut BTreeSet<ToolSlug>, raw: &str) {
    if let Some(slug) = canonicalize(raw) {
        observed.insert(ToolSlug::new(slug));
    }
}

/// Structural extraction over one parsed JSON record.
///
/// Walks the record shapes emitted by known agent runtimes: top-level
/// `tool_use`/`function_call` names, `content`/`text` strings, nested
/// `message.content` arrays or strings, and `payload` name/arguments/output/
/// content. Embedded strings are rescanned with the text token scan.
pub fn extract_from_json_record(record: &Value, observed: &mut BTreeSet<ToolSlug>) {
    let Some(record) = record.as_object() else {
        return;
    };

    let record_type = record.get("type").and_then(Value::as_str);
    if matches!(record_type, Some("tool_use" | "function_call"))
        && let Some(name) = record.get("name").and_then(Value::as_str)
    {
        add_observed(observed, name);
    }

    if let Some(content) = record.get("content").and_then(Value::as_str) {
        extract_from_text(content, observed);
    }
    if let Some(text) = record.get("text").and_then(Value::as_str) {
        extract_from_text(text, observed);
    }

    if let Some(message) = record.get("message").and_then(Value::as_object) {
        match message.get("content") {
            Some(Value::Array(items)) => {
                for item in items {
                    extract_from_content_item(item, observed);
                }
            }
            Some(Value::String(text)) => extract_from_text(text, observed),
            _ => {}
        }
    }

    if let Some(payload) = record.get("payload").and_then(Value::as_object) {
        let payload_type = payload.get("type").and_then(Value::as_str);
        if matches!(payload_type, Some("tool_use" | "function_call"))
            && let Some(name) = payload.get("name").and_then(Value::as_str)
        {
            add_observed(observed, name);
        }
        if let Some(arguments) = payload.get("arguments").and_then(Value::as_str) {
            extract_from_text(arguments, observed);
        }
        if let Some(output) = payload.get("output").and_then(Value::as_str) {
            extract_from_text(output, observed);
        }
        if let Some(Value::Array(items)) = payload.get("content") {
            for item in items {
                extract_from_content_item(item, observed);
            }
        }
    }
}

/// Extraction over one content-array item: `tool_use` names and `text`.
fn extract_from_content_item(item: &Value, observed: &mut BTreeSet<ToolSlug>) {
    let Some(item) = item.as_object() else {
        return;
    };
    if item.get("type").and_then(Value::as_str) == Some("tool_use")
        && let Some(name) = item.get("name").and_then(Value::as_str)
    {
        add_observed(observed, name);
    }
    if let Some(text) = item.get("text").and_then(Value::as_str) {
        extract_from_text(text, observed);
    }
}

// ============================================================================
// SECTION: Text Token Scan
// ============================================================================

/// Returns true for characters the token scan treats as word characters.
const fn is_word_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Scans bare text for `mcp__<server>__<tool>` and `functions.<name>` tokens.
///
/// Works over maximal ASCII word runs so each token is taken whole and only
/// at word boundaries. Matching is case-insensitive; recovered names pass
/// through the canonicalizer like every other source.
pub fn extract_from_text(text: &str, observed: &mut BTreeSet<ToolSlug>) {
    let bytes = text.as_bytes();
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut start: Option<usize> = None;
    for (index, &byte) in bytes.iter().enumerate() {
        if is_word_char(byte) {
            if start.is_none() {
                start = Some(index);
            }
        } else if let Some(run_start) = start.take() {
            runs.push((run_start, index));
        }
    }
    if let Some(run_start) = start {
        runs.push((run_start, bytes.len()));
    }

    for (run_index, &(run_start, run_end)) in runs.iter().enumerate() {
        let run = text[run_start..run_end].to_lowercase();

        if is_mcp_token(&run) {
            add_observed(observed, &run);
        }

        // `functions.<name>`: the dot splits word runs, so stitch a run that
        // reads `functions`, an immediately following dot, and the next run.
        if run == "functions"
            && let Some(&(next_start, next_end)) = runs.get(run_index + 1)
            && next_start == run_end + 1
            && bytes[run_end] == b'.'
        {
            let name = text[next_start..next_end].to_lowercase();
            add_observed(observed, &format!("functions.{name}"));
        }
    }
}

/// Returns true when a lowercased word run is a full `mcp__<a>__<b>` token.
fn is_mcp_token(run: &str) -> bool {
    let Some(rest) = run.strip_prefix("mcp__") else {
        return false;
    };
    rest.split_once("__").is_some_and(|(server, tool)| !server.is_empty() && !tool.is_empty())
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

    use std::collections::BTreeSet;
    use std::path::Path;

    use serde_json::json;
    use toolspec_core::ToolSlug;

    use super::extract_from_json_record;
    use super::extract_from_text;
    use super::parse_history_content;
    use super::should_inspect;

    /// Runs the text scan over one input and returns the slugs as strings.
    fn scan_text(input: &str) -> Vec<String> {
        let mut observed = BTreeSet::new();
        extract_from_text(input, &mut observed);
        observed.iter().map(|slug| slug.as_str().to_string()).collect()
    }

    #[test]
    fn text_scan_finds_mcp_tokens_at_word_boundaries() {
        assert_eq!(scan_text("used mcp__linear__create_issue today"), [
            "mcp__linear__create_issue"
        ]);
        assert_eq!(scan_text("(mcp__github__list_prs)"), ["mcp__github__list_prs"]);
        assert!(scan_text("xmcp__linear__create").is_empty());
        assert!(scan_text("mcp__incomplete__").is_empty());
    }

    #[test]
    fn text_scan_is_case_insensitive() {
        assert_eq!(scan_text("MCP__Linear__Create_Issue"), ["mcp__linear__create_issue"]);
    }

    #[test]
    fn text_scan_finds_function_tokens() {
        assert_eq!(scan_text("called functions.get_weather twice"), ["functions.get_weather"]);
        // The shell alias collapses through the canonicalizer.
        assert_eq!(scan_text("functions.exec_command"), ["bash"]);
        assert!(scan_text("functions. spaced").is_empty());
    }

    #[test]
    fn json_record_extracts_tool_use_names() {
        let mut observed = BTreeSet::new();
        let record = json!({"type": "tool_use", "name": "mcp__notion__search"});
        extract_from_json_record(&record, &mut observed);
        assert!(observed.contains(&ToolSlug::from("mcp__notion__search")));
    }

    #[test]
    fn json_record_walks_message_content_items() {
        let mut observed = BTreeSet::new();
        let record = json!({
            "message": {
                "content": [
                    {"type": "tool_use", "name": "mcp__github__create_pr"},
                    {"type": "text", "text": "then ran functions.lookup_user"},
                ]
            }
        });
        extract_from_json_record(&record, &mut observed);
        assert!(observed.contains(&ToolSlug::from("mcp__github__create_pr")));
        assert!(observed.contains(&ToolSlug::from("functions.lookup_user")));
    }

    #[test]
    fn json_record_rescans_payload_strings() {
        let mut observed = BTreeSet::new();
        let record = json!({
            "payload": {
                "type": "function_call",
                "name": "shell_command",
                "arguments": "{\"cmd\": \"mcp__slack__post_message\"}",
                "output": "ok functions.describe_channel",
            }
        });
        extract_from_json_record(&record, &mut observed);
        assert!(observed.contains(&ToolSlug::from("bash")));
        assert!(observed.contains(&ToolSlug::from("mcp__slack__post_message")));
        assert!(observed.contains(&ToolSlug::from("functions.describe_channel")));
    }

    #[test]
    fn parsed_json_line_suppresses_text_fallback() {
        let mut observed = BTreeSet::new();
        // Valid JSON array: parses, extracts nothing, and must not fall back
        // to the token scan.
        parse_history_content("[\"mcp__linear__create_issue\"]", &mut observed);
        assert!(observed.is_empty());
    }

    #[test]
    fn malformed_json_line_falls_back_to_text_scan() {
        let mut observed = BTreeSet::new();
        parse_history_content("{not json mcp__linear__create_issue", &mut observed);
        assert!(observed.contains(&ToolSlug::from("mcp__linear__create_issue")));
    }

    #[test]
    fn inspectable_names_match_expected_suffixes() {
        assert!(should_inspect(Path::new("a/session.jsonl")));
        assert!(should_inspect(Path::new("a/agent.LOG")));
        assert!(should_inspect(Path::new("a/history")));
        assert!(should_inspect(Path::new("a/history.json")));
        assert!(!should_inspect(Path::new("a/notes.txt")));
        assert!(!should_inspect(Path::new("a/history.jsonl.bak")));
    }
}
