// toolspec-agent/src/submit.rs
// ============================================================================
// Module: Review Submission Builder
// Description: Packages observed tools into an evidence-bearing submission.
// Purpose: Apply the redaction policy table and emit the session payload.
// Dependencies: rand, toolspec-core
// ============================================================================

//! ## Overview
//! The builder turns one observed-tool set into one [`ReviewSubmission`]. The
//! partitioner decides what is public; the builder decides what is submitted.
//! Those are separate policies: partitioning is permissive, submission is
//! restrictive by default. Unknown tools leave the machine only through an
//! explicit opt-in, either per tool through an interactive decision or
//! wholesale through yolo mode. A build with no interactive channel fails
//! rather than guessing.
//!
//! Every build draws a fresh idempotency key, so repeated builds over the
//! same observed set produce distinct accepted submissions; the key only
//! protects retries of the same network request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;
use toolspec_core::AgentModel;
use toolspec_core::Confidence;
use toolspec_core::EvidenceEntry;
use toolspec_core::FailureFrequency;
use toolspec_core::FailureMode;
use toolspec_core::IdempotencyKey;
use toolspec_core::InstallId;
use toolspec_core::MAX_EVIDENCE_ENTRIES;
use toolspec_core::Recommendation;
use toolspec_core::ReviewSubmission;
use toolspec_core::SESSION_TOOL_SLUG;
use toolspec_core::SubmissionScope;
use toolspec_core::ToolSlug;
use toolspec_core::WhitelistRegistry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bytes of randomness behind each build token.
const BUILD_TOKEN_BYTES: usize = 16;

/// Placeholder value for failure-mode fields the session flow cannot fill.
const NOT_PROVIDED: &str = "not_provided";

// ============================================================================
// SECTION: Policy Inputs
// ============================================================================

/// Submission mode selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Submit whitelisted tools only; unknowns are always redacted.
    Whitelist,
    /// Submit all observed tools, subject to per-tool decisions or yolo.
    All,
}

impl SubmitMode {
    /// Returns the stable label for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Whitelist => "whitelist",
            Self::All => "all",
        }
    }
}

/// Decision channel for unknown tools in `all` mode without yolo.
///
/// `decide` returns `Some(true)` to include the slug, `Some(false)` to redact
/// it, and `None` when no interactive channel exists.
pub trait RedactionPrompt {
    /// Decides whether one unknown slug may be submitted.
    fn decide(&mut self, slug: &ToolSlug) -> Option<bool>;
}

/// Prompt that always reports the absence of an interactive channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl RedactionPrompt for NoPrompt {
    fn decide(&mut self, _slug: &ToolSlug) -> Option<bool> {
        None
    }
}

/// Why a build was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Unknown tools need explicit decisions and no channel is available.
    #[error(
        "unknown non-whitelist tools require explicit decisions; re-run with `submit --all \
         --yolo` to include them all, or plain `submit` for whitelist-only"
    )]
    InteractiveRequired,
}

// ============================================================================
// SECTION: Build Output
// ============================================================================

/// Counts describing one build, for previews and status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionSummary {
    /// Mode the build ran under.
    pub mode: SubmitMode,
    /// Whether yolo was in effect.
    pub yolo: bool,
    /// Observed slugs going in.
    pub observed: usize,
    /// Slugs matching the public whitelist.
    pub whitelisted: usize,
    /// Slugs with no whitelist match.
    pub unknown: usize,
    /// Slugs included in the submission.
    pub submitted: usize,
    /// Slugs withheld from the submission.
    pub redacted: usize,
}

/// One built submission plus its summary counts.
#[derive(Debug, Clone)]
pub struct BuiltSubmission {
    /// The wire-ready submission payload.
    pub submission: ReviewSubmission,
    /// Counts for user-facing previews.
    pub summary: SubmissionSummary,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds session submissions from observed-tool sets.
#[derive(Debug, Clone)]
pub struct SubmissionBuilder {
    /// Whitelist registry used for partitioning.
    registry: WhitelistRegistry,
    /// Model class identifier stamped on every submission.
    agent_model: AgentModel,
}

impl SubmissionBuilder {
    /// Creates a builder over a whitelist registry and agent model.
    #[must_use]
    pub const fn new(registry: WhitelistRegistry, agent_model: AgentModel) -> Self {
        Self {
            registry,
            agent_model,
        }
    }

    /// Builds one session submission under the redaction policy table.
    ///
    /// | mode | yolo | unknown tools |
    /// |---|---|---|
    /// | whitelist | — | always redacted |
    /// | all | false | one explicit decision each via `prompt` |
    /// | all | true | all included |
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InteractiveRequired`] when unknown tools need
    /// decisions and the prompt reports no interactive channel.
    pub fn build(
        &self,
        mode: SubmitMode,
        yolo: bool,
        observed: &BTreeSet<ToolSlug>,
        install_id: Option<InstallId>,
        now_utc: &str,
        prompt: &mut dyn RedactionPrompt,
    ) -> Result<BuiltSubmission, BuildError> {
        let partitioned = self.registry.partition(observed);
        let mut submitted: BTreeSet<ToolSlug> = partitioned.public.clone();
        let mut redacted: BTreeSet<ToolSlug> = partitioned.unknown.clone();

        if mode == SubmitMode::All && !partitioned.unknown.is_empty() {
            if yolo {
                submitted.extend(partitioned.unknown.iter().cloned());
                redacted.clear();
            } else {
                redacted.clear();
                for slug in &partitioned.unknown {
                    match prompt.decide(slug) {
                        Some(true) => {
                            submitted.insert(slug.clone());
                        }
                        Some(false) => {
                            redacted.insert(slug.clone());
                        }
                        None => return Err(BuildError::InteractiveRequired),
                    }
                }
            }
        }

        let token = build_token();
        let submitted: Vec<ToolSlug> = submitted.into_iter().collect();
        let redacted: Vec<ToolSlug> = redacted.into_iter().collect();
        let summary = SubmissionSummary {
            mode,
            yolo,
            observed: observed.len(),
            whitelisted: partitioned.public.len(),
            unknown: partitioned.unknown.len(),
            submitted: submitted.len(),
            redacted: redacted.len(),
        };

        let submission = ReviewSubmission {
            install_id,
            submission_scope: Some(SubmissionScope::AllObserved),
            observed_tool_slugs: observed.iter().cloned().collect(),
            redacted_tool_slugs: redacted.clone(),
            tool_slug: ToolSlug::new(SESSION_TOOL_SLUG),
            agent_model: self.agent_model.clone(),
            review_window_start_utc: now_utc.to_string(),
            review_window_end_utc: now_utc.to_string(),
            recommendation: Recommendation::Caution,
            confidence: Confidence::Low,
            reliable_tools: submitted.clone(),
            unreliable_tools: Vec::new(),
            hallucinated_tools: Vec::new(),
            never_used_tools: redacted,
            behavioral_notes: behavioral_notes(&summary),
            failure_modes: vec![FailureMode {
                symptom: NOT_PROVIDED.to_string(),
                likely_cause: NOT_PROVIDED.to_string(),
                recovery: NOT_PROVIDED.to_string(),
                frequency: FailureFrequency::Rare,
            }],
            evidence: build_evidence(now_utc, &token, &submitted),
            idempotency_key: IdempotencyKey::new(format!("session_{token}")),
        };

        Ok(BuiltSubmission {
            submission,
            summary,
        })
    }
}

/// Renders the behavioral-note breadcrumbs for one build.
fn behavioral_notes(summary: &SubmissionSummary) -> Vec<String> {
    vec![
        "submitted_via_toolspec_cli".to_string(),
        "submission_scope=all_observed".to_string(),
        format!("submit_mode={}", summary.mode.as_str()),
        format!("submit_yolo={}", summary.yolo),
        format!("whitelist_tools={}", summary.whitelisted),
        format!("unknown_tools={}", summary.unknown),
        format!("observed_tools={}", summary.observed),
        format!("redacted_tools={}", summary.redacted),
    ]
}

/// Builds the evidence list: one entry per submitted slug, capped, with a
/// shared timestamp; a single placeholder entry when nothing was submitted.
fn build_evidence(now_utc: &str, token: &str, submitted: &[ToolSlug]) -> Vec<EvidenceEntry> {
    if submitted.is_empty() {
        return vec![EvidenceEntry {
            tool_call_id: format!("manual_{token}"),
            timestamp_utc: now_utc.to_string(),
        }];
    }
    submitted
        .iter()
        .take(MAX_EVIDENCE_ENTRIES)
        .enumerate()
        .map(|(index, slug)| EvidenceEntry {
            tool_call_id: format!("session_{token}_{}_{slug}", index + 1),
            timestamp_utc: now_utc.to_string(),
        })
        .collect()
}

/// Returns a fresh random lowercase-hex build token.
fn build_token() -> String {
    let mut bytes = [0u8; BUILD_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let mut token = String::with_capacity(BUILD_TOKEN_BYTES * 2);
    for byte in bytes {
        token.push_str(&format!("{byte:02x}"));
    }
    token
}

// ============================================================================
// SECTION: Tests
// ============================================================================
