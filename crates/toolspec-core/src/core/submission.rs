// toolspec-core/src/core/submission.rs
// ============================================================================
// Module: Review Submission Model
// Description: Evidence-bearing review submission shapes and enums.
// Purpose: Provide the canonical wire model for submitted reviews.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ReviewSubmission`] is one evidence-bearing report from one agent
//! session. Submissions are immutable facts: created by the client builder,
//! validated once, persisted once (first writer wins on idempotency-key
//! collision), and never mutated afterward.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AgentModel;
use crate::core::identifiers::IdempotencyKey;
use crate::core::identifiers::InstallId;
use crate::core::identifiers::ToolSlug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sentinel slug for multi-tool session submissions.
pub const SESSION_TOOL_SLUG: &str = "__session__";

/// Maximum evidence entries carried by one submission.
pub const MAX_EVIDENCE_ENTRIES: usize = 50;

// ============================================================================
// SECTION: Enums
// ============================================================================

/// Overall recommendation for a reviewed tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Tool behaved reliably.
    Recommended,
    /// Tool worked with caveats.
    Caution,
    /// Tool should be avoided.
    Avoid,
}

/// Reviewer confidence in the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// High confidence.
    High,
    /// Medium confidence.
    Medium,
    /// Low confidence.
    Low,
}

/// Observed frequency of a failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureFrequency {
    /// Seen once or twice.
    Rare,
    /// Seen several times.
    Occasional,
    /// Seen in most sessions.
    Frequent,
    /// Seen on nearly every call.
    Persistent,
}

/// Scope declared by the submitting agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionScope {
    /// Review of a single tool.
    SingleTool,
    /// Session-wide review of all observed tools.
    AllObserved,
}

// ============================================================================
// SECTION: Submission Shapes
// ============================================================================

/// One structured failure-mode report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMode {
    /// What went wrong, as observed.
    pub symptom: String,
    /// Best-guess root cause.
    pub likely_cause: String,
    /// How the agent recovered, if at all.
    pub recovery: String,
    /// How often the failure was observed.
    pub frequency: FailureFrequency,
}

/// One validated tool-use evidence entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceEntry {
    /// Tool call identifier from the originating session.
    pub tool_call_id: String,
    /// UTC timestamp of the call.
    pub timestamp_utc: String,
}

/// One evidence-bearing review submission.
///
/// # Invariants
/// - `idempotency_key` uniquely identifies one logical submission attempt;
///   replays with the same key return the original stored result.
/// - Submissions are never mutated after persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    /// Submitting install, when attributed. Anonymous submissions are
    /// accepted but never advance gating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_id: Option<InstallId>,
    /// Declared submission scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_scope: Option<SubmissionScope>,
    /// All tool slugs observed in the session.
    #[serde(default)]
    pub observed_tool_slugs: Vec<ToolSlug>,
    /// Observed slugs withheld from submission.
    #[serde(default)]
    pub redacted_tool_slugs: Vec<ToolSlug>,
    /// Primary review subject; [`SESSION_TOOL_SLUG`] for session submissions.
    pub tool_slug: ToolSlug,
    /// Submitting model class identifier.
    pub agent_model: AgentModel,
    /// Start of the reviewed window (UTC).
    pub review_window_start_utc: String,
    /// End of the reviewed window (UTC).
    pub review_window_end_utc: String,
    /// Overall recommendation.
    pub recommendation: Recommendation,
    /// Reviewer confidence.
    pub confidence: Confidence,
    /// Tools that behaved reliably.
    pub reliable_tools: Vec<ToolSlug>,
    /// Tools that misbehaved.
    pub unreliable_tools: Vec<ToolSlug>,
    /// Tools the agent referenced but that do not exist.
    pub hallucinated_tools: Vec<ToolSlug>,
    /// Tools available but never invoked.
    pub never_used_tools: Vec<ToolSlug>,
    /// Free-form behavioral breadcrumbs.
    pub behavioral_notes: Vec<String>,
    /// Structured failure modes.
    pub failure_modes: Vec<FailureMode>,
    /// Validated tool-use evidence entries.
    pub evidence: Vec<EvidenceEntry>,
    /// Client-chosen idempotency key.
    pub idempotency_key: IdempotencyKey,
}

impl ReviewSubmission {
    /// Returns true when the submission carries at least one observed slug.
    ///
    /// Meaningful submissions are the only ones that can advance install
    /// gating; placeholder submissions with an empty observed set cannot.
    #[must_use]
    pub fn is_meaningful(&self) -> bool {
        !self.observed_tool_slugs.is_empty()
    }

    /// Returns the validated tool-use count for this submission.
    #[must_use]
    pub fn validated_tool_use_count(&self) -> usize {
        self.evidence.len()
    }
}
