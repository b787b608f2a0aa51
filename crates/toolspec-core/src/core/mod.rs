// toolspec-core/src/core/mod.rs
// ============================================================================
// Module: ToolSpec Core Types
// Description: Canonical ToolSpec submission, install, and gating structures.
// Purpose: Provide stable, serializable types for the review protocol.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! ToolSpec core types define the review submission shape, install records,
//! canonical tool slugs, the public-tool whitelist, and the access-gating
//! state machine. These types are the canonical source of truth for any
//! derived API surfaces (HTTP or CLI).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod access;
pub mod canonical;
pub mod identifiers;
pub mod install;
pub mod submission;
pub mod time;
pub mod validate;
pub mod whitelist;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::AccessDecision;
pub use access::AccessOutcome;
pub use access::DenyReason;
pub use access::InstallFacts;
pub use access::evaluate_access;
pub use canonical::canonicalize;
pub use identifiers::AgentModel;
pub use identifiers::IdempotencyKey;
pub use identifiers::InstallId;
pub use identifiers::ReviewId;
pub use identifiers::ToolSlug;
pub use install::InstallRecord;
pub use submission::Confidence;
pub use submission::EvidenceEntry;
pub use submission::FailureFrequency;
pub use submission::FailureMode;
pub use submission::MAX_EVIDENCE_ENTRIES;
pub use submission::Recommendation;
pub use submission::ReviewSubmission;
pub use submission::SESSION_TOOL_SLUG;
pub use submission::SubmissionScope;
pub use time::Timestamp;
pub use time::TimestampError;
pub use validate::FieldError;
pub use validate::validate_submission;
pub use whitelist::DEFAULT_WHITELIST_VERSION;
pub use whitelist::PartitionedTools;
pub use whitelist::WhitelistRegistry;
pub use whitelist::slug_candidates;
