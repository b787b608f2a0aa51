// toolspec-agent/src/lib.rs
// ============================================================================
// Module: ToolSpec Agent Library
// Description: Public API surface for the ToolSpec agent CLI.
// Purpose: Expose history extraction, submission building, and the client.
// Dependencies: crate::{client, history, local, submit}
// ============================================================================

//! ## Overview
//! The ToolSpec agent gathers usage evidence from local agent-session history
//! files, partitions observed tool slugs against the public whitelist, builds
//! evidence-bearing review submissions, and talks to the registry over HTTP.
//! History input is untrusted and heterogeneous; extraction is best-effort
//! and bounded, never failing the surrounding command.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod history;
pub mod local;
pub mod submit;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::AccessStatus;
pub use client::ClientError;
pub use client::DEFAULT_BASE_URL;
pub use client::InstallRegistered;
pub use client::RegistryClient;
pub use client::ReviewRow;
pub use client::SubmissionOutcome;
pub use history::FileOutcome;
pub use history::HistoryLimits;
pub use history::HistoryScanner;
pub use history::ScanReport;
pub use history::SkipReason;
pub use local::AgentHome;
pub use local::AgentState;
pub use local::LocalError;
pub use local::StoredInstall;
pub use submit::BuildError;
pub use submit::BuiltSubmission;
pub use submit::NoPrompt;
pub use submit::RedactionPrompt;
pub use submit::SubmissionBuilder;
pub use submit::SubmissionSummary;
pub use submit::SubmitMode;
