// toolspec-agent/src/main.rs
// ============================================================================
// Module: ToolSpec Agent CLI Entry Point
// Description: Command dispatcher for the `toolspec` client binary.
// Purpose: Wire history extraction, submission building, and the client.
// Dependencies: clap, serde_json, tokio, toolspec-config, toolspec-core
// ============================================================================

//! ## Overview
//! The `toolspec` binary is the agent-side face of the registry: it registers
//! installs, gathers usage evidence from local history, previews and submits
//! session reviews, and searches unlocked review data. History input and
//! server responses are untrusted; extraction is best-effort and responses
//! are surfaced with their structured details intact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::io::IsTerminal;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use toolspec_agent::AccessStatus;
use toolspec_agent::AgentHome;
use toolspec_agent::BuildError;
use toolspec_agent::ClientError;
use toolspec_agent::DEFAULT_BASE_URL;
use toolspec_agent::HistoryLimits;
use toolspec_agent::HistoryScanner;
use toolspec_agent::LocalError;
use toolspec_agent::RedactionPrompt;
use toolspec_agent::RegistryClient;
use toolspec_agent::ReviewRow;
use toolspec_agent::ScanReport;
use toolspec_agent::StoredInstall;
use toolspec_agent::SubmissionBuilder;
use toolspec_agent::SubmitMode;
use toolspec_agent::local::CONFIG_DIR_ENV_VAR;
use toolspec_agent::local::DEFAULT_CONFIG_DIR_NAME;
use toolspec_config::ConfigError;
use toolspec_config::ToolSpecConfig;
use toolspec_core::AgentModel;
use toolspec_core::InstallId;
use toolspec_core::Timestamp;
use toolspec_core::TimestampError;
use toolspec_core::ToolSlug;
use toolspec_core::WhitelistRegistry;
use toolspec_core::canonicalize;

// ============================================================================
// SECTION: Environment Variables
// ============================================================================

/// Overrides the registry base URL.
const BASE_URL_ENV_VAR: &str = "TOOLSPEC_BASE_URL";

/// Declares the submitting model class.
const AGENT_MODEL_ENV_VAR: &str = "TOOLSPEC_AGENT_MODEL";

/// CSV of tool slugs merged into the observed set.
const OBSERVED_TOOLS_ENV_VAR: &str = "TOOLSPEC_OBSERVED_TOOLS";

/// CSV of extra history scan roots, `~` expanded.
const HISTORY_PATHS_ENV_VAR: &str = "TOOLSPEC_HISTORY_PATHS";

/// Per-file tail cap override in bytes.
const HISTORY_MAX_FILE_BYTES_ENV_VAR: &str = "TOOLSPEC_HISTORY_MAX_BYTES_PER_FILE";

/// Cumulative read budget override in bytes.
const HISTORY_MAX_TOTAL_BYTES_ENV_VAR: &str = "TOOLSPEC_HISTORY_MAX_TOTAL_BYTES";

/// File-count budget override.
const HISTORY_MAX_FILES_ENV_VAR: &str = "TOOLSPEC_HISTORY_MAX_FILES";

/// Directory-entry budget override.
const HISTORY_MAX_DIR_ENTRIES_ENV_VAR: &str = "TOOLSPEC_HISTORY_MAX_DIR_ENTRIES";

/// Default model label when none is declared.
const DEFAULT_AGENT_MODEL: &str = "unknown-agent";

/// Maximum search results printed per query.
const MAX_SEARCH_RESULTS: usize = 25;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// ToolSpec agent: contribute tool-reliability evidence, search reviews.
#[derive(Debug, Parser)]
#[command(name = "toolspec", version)]
struct Cli {
    /// Path to a toolspec.toml configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Command to run; defaults to `status`.
    #[command(subcommand)]
    command: Option<AgentCommand>,
}

/// Agent subcommands.
#[derive(Debug, Subcommand)]
enum AgentCommand {
    /// Register this environment with the registry.
    Install,
    /// Show gating, approval, and observed-tool status.
    Status,
    /// Ensure an install exists and probe the access-status endpoint.
    Verify,
    /// Preview the evidence that would be submitted, then confirm and submit.
    Review,
    /// Build and submit a session review.
    Submit {
        /// Consider non-whitelist tools (each needs an explicit decision).
        #[arg(long)]
        all: bool,
        /// With --all: include every non-whitelist tool without prompting.
        #[arg(long, requires = "all")]
        yolo: bool,
    },
    /// Search unlocked review summaries by keyword.
    Search {
        /// Keyword to match against review fields.
        keyword: Vec<String>,
    },
    /// Revoke the install and remove local state.
    Uninstall,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Top-level CLI failure.
#[derive(Debug, Error)]
enum AgentError {
    /// Registry request failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// Local state could not be written.
    #[error(transparent)]
    Local(#[from] LocalError),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A submission build was refused.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// The current time could not be rendered.
    #[error(transparent)]
    Time(#[from] TimestampError),
    /// Output stream write failed.
    #[error("output write failure: {0}")]
    Output(#[from] std::io::Error),
    /// The command was used incorrectly.
    #[error("{0}")]
    Usage(String),
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Agent entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = write_stderr_line(&format!("toolspec: {error}"));
            if let AgentError::Client(client_error) = &error
                && let Some(details) = client_error.details()
                && let Ok(rendered) = serde_json::to_string_pretty(details)
            {
                let _ = write_stderr_line(&rendered);
            }
            ExitCode::FAILURE
        }
    }
}

/// Dispatches the parsed command.
async fn run(cli: Cli) -> Result<(), AgentError> {
    let context = AgentContext::build(cli.config.as_deref())?;
    match cli.command.unwrap_or(AgentCommand::Status) {
        AgentCommand::Install => run_install(&context).await,
        AgentCommand::Status => run_status(&context).await,
        AgentCommand::Verify => run_verify(&context).await,
        AgentCommand::Review => run_review(&context).await,
        AgentCommand::Submit {
            all,
            yolo,
        } => run_submit(&context, all, yolo).await,
        AgentCommand::Search {
            keyword,
        } => run_search(&context, &keyword).await,
        AgentCommand::Uninstall => run_uninstall(&context).await,
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Shared wiring for all commands.
struct AgentContext {
    /// Local state directory handle.
    home: AgentHome,
    /// Registry HTTP client.
    client: RegistryClient,
    /// Whitelist registry from configuration.
    registry: WhitelistRegistry,
    /// Declared model class.
    agent_model: AgentModel,
    /// Bounded history scanner.
    scanner: HistoryScanner,
    /// Resolved history scan roots.
    scan_roots: Vec<PathBuf>,
}

impl AgentContext {
    /// Resolves configuration, environment, and paths into a context.
    fn build(config_path: Option<&std::path::Path>) -> Result<Self, AgentError> {
        let config = ToolSpecConfig::load(config_path)?;
        let home_dir = env::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let config_dir = env::var(CONFIG_DIR_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| home_dir.join(DEFAULT_CONFIG_DIR_NAME), PathBuf::from);
        let base_url = env::var(BASE_URL_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let agent_model = AgentModel::new(
            env::var(AGENT_MODEL_ENV_VAR)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AGENT_MODEL.to_string()),
        );
        let limits = history_limits(HistoryLimits::from(&config.history));
        Ok(Self {
            home: AgentHome::new(config_dir),
            client: RegistryClient::new(base_url)?,
            registry: config.whitelist.registry(),
            agent_model,
            scanner: HistoryScanner::new(limits),
            scan_roots: scan_targets(&home_dir),
        })
    }

    /// Returns the stored install, registering a new one when absent.
    async fn ensure_install(&self) -> Result<StoredInstall, AgentError> {
        if let Some(install) = self.home.read_install() {
            return Ok(install);
        }
        let registered = self.client.register_install().await?;
        let stored = StoredInstall::from(registered);
        self.home.write_install(&stored)?;
        Ok(stored)
    }

    /// Gathers the observed-tool set from history plus the env override.
    fn observed(&self) -> (BTreeSet<ToolSlug>, ScanReport) {
        let report = self.scanner.scan(&self.scan_roots);
        let mut observed = report.observed.clone();
        for value in parse_csv_list(&env::var(OBSERVED_TOOLS_ENV_VAR).unwrap_or_default()) {
            if let Some(slug) = canonicalize(&value) {
                observed.insert(ToolSlug::new(slug));
            }
        }
        (observed, report)
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Registers a fresh install and stores its credentials.
async fn run_install(context: &AgentContext) -> Result<(), AgentError> {
    context.home.remove_local_files();
    let install = context.ensure_install().await?;
    write_stdout_line(&format!("ToolSpec installed: {}", install.install_id))?;
    write_stdout_line(&format!("Credentials saved: {}", context.home.install_path().display()))?;
    write_stdout_line("Install completed local setup only (no review submission was sent).")?;
    write_stdout_line("REQUIRED NEXT STEP: toolspec review")?;
    write_stdout_line("`toolspec review` previews data and asks for confirmation before submit.")?;
    Ok(())
}

/// Ensures an install exists and prints the access-status report.
async fn run_verify(context: &AgentContext) -> Result<(), AgentError> {
    let install = context.ensure_install().await?;
    let status = context.client.access_status(Some(&install.install_id)).await?;
    write_stdout_line(&pretty(&status)?)?;
    Ok(())
}

/// Shows gating, approval, and observed-tool status.
async fn run_status(context: &AgentContext) -> Result<(), AgentError> {
    let install = context.home.read_install();
    let install_id = install.as_ref().map(|record| record.install_id.as_str());
    let status = match context.client.access_status(install_id).await {
        Ok(status) => {
            write_stdout_line("ToolSpec status:")?;
            write_stdout_line(&pretty(&status)?)?;
            Some(status)
        }
        Err(_) => {
            write_stdout_line("ToolSpec status unavailable (network/API error).")?;
            None
        }
    };

    let state = context.home.read_state();
    let unlocked = status.as_ref().is_some_and(AccessStatus::is_granted);
    match (&state.approved_at_utc, unlocked) {
        (Some(approved_at), true) => {
            write_stdout_line(&format!("Approval status: approved at {approved_at}"))?;
            write_stdout_line("Search enabled: toolspec search <keyword>")?;
        }
        (Some(approved_at), false) => {
            write_stdout_line(&format!("Approval status: approved at {approved_at}"))?;
            write_stdout_line("Search locked until required contribution is completed.")?;
            if let Some(message) =
                status.as_ref().and_then(|report| report.post_install_required_message.as_deref())
            {
                write_stdout_line(message)?;
            }
            write_stdout_line("REQUIRED NEXT STEP: toolspec review")?;
        }
        (None, _) => {
            write_stdout_line("Approval status: pending")?;
            write_stdout_line("Run: toolspec review")?;
        }
    }

    let (observed, report) = context.observed();
    if observed.is_empty() {
        write_stdout_line("Observed tools: 0")?;
        write_stdout_line("No supported tool history found yet.")?;
        write_stdout_line("After using tools in Claude/Codex/Cursor, run: toolspec review")?;
    } else {
        let partitioned = context.registry.partition(&observed);
        write_stdout_line(&format!(
            "Observed tools: {} ({} public, {} non-whitelist) from {} history files",
            observed.len(),
            partitioned.public.len(),
            partitioned.unknown.len(),
            report.parsed_files(),
        ))?;
        write_stdout_line("Recommended: toolspec review")?;
        write_stdout_line("Direct submit modes: toolspec submit | submit --all | submit --all --yolo")?;
    }
    Ok(())
}

/// Previews the evidence and submits after an interactive confirmation.
async fn run_review(context: &AgentContext) -> Result<(), AgentError> {
    let (observed, _report) = context.observed();
    let partitioned = context.registry.partition(&observed);

    write_stdout_line("ToolSpec review preview:")?;
    write_stdout_line("Source: local Claude/Codex/Cursor history + TOOLSPEC_OBSERVED_TOOLS")?;
    write_stdout_line(&pretty(&serde_json::json!({
        "observed_tools": observed.len(),
        "whitelisted_tools_to_submit": partitioned.public.len(),
        "non_whitelist_tools_redacted": partitioned.unknown.len(),
    }))?)?;
    if partitioned.public.is_empty() {
        write_stdout_line("Submit list: (none)")?;
    } else {
        write_stdout_line(&format!("Submit list: {}", join_slugs(&partitioned.public)))?;
    }
    if !partitioned.unknown.is_empty() {
        write_stdout_line(&format!("Redacted by default: {}", join_slugs(&partitioned.unknown)))?;
    }
    if observed.is_empty() {
        write_stdout_line("No observed tools detected in supported history files.")?;
        write_stdout_line(&format!(
            "If your history lives elsewhere, set {HISTORY_PATHS_ENV_VAR} and re-run."
        ))?;
    }

    match ask_yes_no("Submit this review now? [y/N]: ")? {
        None => {
            write_stdout_line("Interactive prompt unavailable. Run `toolspec submit` explicitly.")?;
            Ok(())
        }
        Some(false) => {
            write_stdout_line("Review not submitted.")?;
            Ok(())
        }
        Some(true) => run_submit(context, false, false).await,
    }
}

/// Builds and submits a session review under the selected policy.
async fn run_submit(context: &AgentContext, all: bool, yolo: bool) -> Result<(), AgentError> {
    let mode = if all { SubmitMode::All } else { SubmitMode::Whitelist };
    let install = context.ensure_install().await?;
    let (observed, _report) = context.observed();
    let now_utc = now().to_rfc3339()?;

    let builder = SubmissionBuilder::new(context.registry.clone(), context.agent_model.clone());
    let mut prompt = TerminalPrompt;
    let built = builder.build(
        mode,
        yolo,
        &observed,
        Some(InstallId::new(install.install_id.clone())),
        &now_utc,
        &mut prompt,
    )?;

    let outcome = context.client.submit(&built.submission).await?;
    write_stdout_line(&format!(
        "Review {}: {} ({} validated tool uses)",
        outcome.status, outcome.review_id, outcome.validated_tool_use_count
    ))?;
    write_stdout_line(&format!(
        "Contributor status: {} ({})",
        outcome.contributor_status.submission_access, outcome.contributor_status.reason
    ))?;
    write_stdout_line(&format!(
        "Submitted tools: {} | Redacted tools: {} | Mode: {}{}",
        built.summary.submitted,
        built.summary.redacted,
        mode.as_str(),
        if yolo { " (yolo)" } else { "" },
    ))?;
    if !built.submission.redacted_tool_slugs.is_empty() {
        let redacted: Vec<&str> =
            built.submission.redacted_tool_slugs.iter().map(ToolSlug::as_str).collect();
        write_stdout_line(&format!("Redacted tool slugs: {}", redacted.join(", ")))?;
    }

    let mut state = context.home.read_state();
    state.approved_at_utc = Some(now_utc);
    state.last_approved_review_id = Some(outcome.review_id);
    context.home.write_state(&state)?;
    Ok(())
}

/// Searches unlocked review summaries by keyword, client side.
async fn run_search(context: &AgentContext, keyword_parts: &[String]) -> Result<(), AgentError> {
    let keyword = keyword_parts.join(" ").trim().to_lowercase();
    if keyword.is_empty() {
        return Err(AgentError::Usage("usage: toolspec search <keyword>".to_string()));
    }

    let state = context.home.read_state();
    if state.approved_at_utc.is_none() {
        return Err(AgentError::Usage(
            "activation required before search; run `toolspec review` first".to_string(),
        ));
    }

    let install = context.home.read_install();
    let install_id = install.as_ref().map(|record| record.install_id.as_str());
    let status = context.client.access_status(install_id).await.map_err(|_| {
        AgentError::Usage(
            "unable to verify access status; run `toolspec verify` and try again".to_string(),
        )
    })?;
    if !status.is_granted() {
        let message = status.post_install_required_message.unwrap_or_else(|| {
            "search is locked; run `toolspec review` after using tools in a real session"
                .to_string()
        });
        return Err(AgentError::Usage(message));
    }

    let rows = context.client.reviews(install_id).await?;
    let matches: Vec<&ReviewRow> =
        rows.iter().filter(|row| matches_keyword(row, &keyword)).collect();
    if matches.is_empty() {
        write_stdout_line(&format!("No reviews matched '{keyword}'."))?;
        return Ok(());
    }

    write_stdout_line(&format!("Matches for '{keyword}': {}", matches.len()))?;
    for row in matches.iter().take(MAX_SEARCH_RESULTS) {
        write_stdout_line(&format!(
            "- {} | {} | {}/{} | error {:.1}% | {}",
            row.tool_slug,
            row.tool_name,
            row.recommendation,
            row.confidence,
            row.error_rate * 100.0,
            row.detail_url,
        ))?;
    }
    if matches.len() > MAX_SEARCH_RESULTS {
        write_stdout_line(&format!(
            "Showing first {MAX_SEARCH_RESULTS} of {} results.",
            matches.len()
        ))?;
    }
    Ok(())
}

/// Revokes the install best-effort and clears local state.
async fn run_uninstall(context: &AgentContext) -> Result<(), AgentError> {
    if let Some(install) = context.home.read_install()
        && context.client.revoke_install(&install.install_id).await.is_err()
    {
        write_stderr_line("ToolSpec warning: revoke request failed.")?;
    }
    context.home.remove_local_files();
    write_stdout_line("ToolSpec uninstalled.")?;
    Ok(())
}

// ============================================================================
// SECTION: Environment Resolution
// ============================================================================

/// Splits a CSV string into trimmed, deduplicated values.
fn parse_csv_list(raw: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut values = Vec::new();
    for part in raw.split(',') {
        let value = part.trim();
        if value.is_empty() || !seen.insert(value.to_string()) {
            continue;
        }
        values.push(value.to_string());
    }
    values
}

/// Parses a positive integer env override, keeping the fallback otherwise.
fn parse_positive(raw: Option<String>, fallback: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|&value| value > 0)
        .unwrap_or(fallback)
}

/// Parses a positive entry-count env override, keeping the fallback otherwise.
fn parse_positive_count(raw: Option<String>, fallback: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|&value| value > 0)
        .unwrap_or(fallback)
}

/// Applies env-var overrides to the configured history limits.
fn history_limits(configured: HistoryLimits) -> HistoryLimits {
    HistoryLimits {
        max_file_bytes: parse_positive(
            env::var(HISTORY_MAX_FILE_BYTES_ENV_VAR).ok(),
            configured.max_file_bytes,
        ),
        max_total_bytes: parse_positive(
            env::var(HISTORY_MAX_TOTAL_BYTES_ENV_VAR).ok(),
            configured.max_total_bytes,
        ),
        max_files: parse_positive_count(
            env::var(HISTORY_MAX_FILES_ENV_VAR).ok(),
            configured.max_files,
        ),
        max_dir_entries: parse_positive_count(
            env::var(HISTORY_MAX_DIR_ENTRIES_ENV_VAR).ok(),
            configured.max_dir_entries,
        ),
    }
}

/// Expands a leading `~` against the home directory.
fn expand_home(path: &str, home: &std::path::Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    path.strip_prefix("~/").map_or_else(|| PathBuf::from(path), |rest| home.join(rest))
}

/// Returns the per-platform Cursor application roots.
fn cursor_roots(home: &std::path::Path) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if cfg!(target_os = "macos") {
        roots.push(home.join("Library").join("Application Support").join("Cursor"));
    }
    if cfg!(target_os = "linux") {
        roots.push(home.join(".config").join("Cursor"));
    }
    if cfg!(target_os = "windows") {
        if let Some(appdata) = env::var_os("APPDATA").filter(|value| !value.is_empty()) {
            roots.push(PathBuf::from(appdata).join("Cursor"));
        }
        roots.push(home.join("AppData").join("Roaming").join("Cursor"));
    }
    roots
}

/// Resolves the default scan roots plus any env-supplied overrides.
fn scan_targets(home: &std::path::Path) -> Vec<PathBuf> {
    let mut targets = vec![
        home.join(".claude").join("history.jsonl"),
        home.join(".claude").join("projects"),
        home.join(".codex").join("history.jsonl"),
        home.join(".codex").join("sessions"),
    ];
    for root in cursor_roots(home) {
        targets.push(root.join("logs"));
    }
    for value in parse_csv_list(&env::var(HISTORY_PATHS_ENV_VAR).unwrap_or_default()) {
        targets.push(expand_home(&value, home));
    }
    let mut seen = BTreeSet::new();
    targets.retain(|path| seen.insert(path.clone()));
    targets
}

// ============================================================================
// SECTION: Prompts and Output
// ============================================================================

/// Redaction prompt backed by the controlling terminal.
struct TerminalPrompt;

impl RedactionPrompt for TerminalPrompt {
    fn decide(&mut self, slug: &ToolSlug) -> Option<bool> {
        ask_yes_no(&format!("Include non-whitelist tool '{slug}'? [y/N]: ")).ok().flatten()
    }
}

/// Asks a yes/no question; `None` when no interactive terminal exists.
///
/// # Errors
///
/// Returns the underlying io error when the prompt cannot be written.
fn ask_yes_no(question: &str) -> std::io::Result<Option<bool>> {
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        return Ok(None);
    }
    let mut stdout = std::io::stdout();
    write!(&mut stdout, "{question}")?;
    stdout.flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let normalized = answer.trim().to_lowercase();
    Ok(Some(normalized == "y" || normalized == "yes"))
}

/// Returns true when a review row matches the lowercased keyword.
fn matches_keyword(row: &ReviewRow, keyword_lower: &str) -> bool {
    [
        row.tool_slug.as_str(),
        row.tool_name.as_str(),
        row.category.as_str(),
        row.recommendation.as_str(),
        row.confidence.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(keyword_lower))
}

/// Joins a slug set for display.
fn join_slugs(slugs: &BTreeSet<ToolSlug>) -> String {
    slugs.iter().map(ToolSlug::as_str).collect::<Vec<_>>().join(", ")
}

/// Pretty-prints a serializable value as JSON.
fn pretty<T: serde::Serialize>(value: &T) -> Result<String, AgentError> {
    serde_json::to_string_pretty(value)
        .map_err(|error| AgentError::Usage(format!("could not render output: {error}")))
}

/// Returns the current wall-clock time as a registry timestamp.
fn now() -> Timestamp {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    Timestamp::from_unix_millis(i64::try_from(millis).unwrap_or(i64::MAX))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
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

    use std::path::Path;
    use std::path::PathBuf;

    use super::expand_home;
    use super::matches_keyword;
    use super::parse_csv_list;
    use super::parse_positive;
    use toolspec_agent::ReviewRow;

    /// Review row fixture for keyword matching.
    fn row() -> ReviewRow {
        serde_json::from_value(serde_json::json!({
            "tool_slug": "linear",
            "tool_name": "Linear MCP",
            "category": "project-management",
            "recommendation": "recommended",
            "confidence": "high",
            "error_rate": 0.02,
            "detail_url": "/reviews/linear",
        }))
        .unwrap()
    }

    #[test]
    fn csv_parsing_trims_and_dedupes() {
        assert_eq!(parse_csv_list(" a, b ,a,, c "), ["a", "b", "c"]);
        assert!(parse_csv_list("").is_empty());
    }

    #[test]
    fn positive_integer_overrides_keep_fallback_on_junk() {
        assert_eq!(parse_positive(Some("512".to_string()), 100), 512);
        assert_eq!(parse_positive(Some("0".to_string()), 100), 100);
        assert_eq!(parse_positive(Some("-3".to_string()), 100), 100);
        assert_eq!(parse_positive(Some("lots".to_string()), 100), 100);
        assert_eq!(parse_positive(None, 100), 100);
    }

    #[test]
    fn home_shorthand_expands() {
        let home = Path::new("/home/agent");
        assert_eq!(expand_home("~", home), PathBuf::from("/home/agent"));
        assert_eq!(expand_home("~/logs", home), PathBuf::from("/home/agent/logs"));
        assert_eq!(expand_home("/var/log", home), PathBuf::from("/var/log"));
    }

    #[test]
    fn keyword_matching_covers_descriptive_fields() {
        let fixture = row();
        assert!(matches_keyword(&fixture, "linear"));
        assert!(matches_keyword(&fixture, "project"));
        assert!(matches_keyword(&fixture, "recommended"));
        assert!(!matches_keyword(&fixture, "github"));
    }
}
