// toolspec-core/src/lib.rs
// ============================================================================
// Module: ToolSpec Core Library
// Description: Public API surface for the ToolSpec core.
// Purpose: Expose domain types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! ToolSpec core provides the shared protocol model for the tool-reliability
//! registry: canonical tool slugs, whitelist partitioning, submission
//! validation, and the install access-gating state machine. It is
//! backend-agnostic and integrates through explicit interfaces rather than
//! embedding into a specific server or storage stack.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::InstallStore;
pub use interfaces::StoreError;
pub use interfaces::StoreOutcome;
pub use interfaces::SubmissionStore;
pub use runtime::AccessGate;
pub use runtime::AccessStatusReport;
pub use runtime::InMemoryRegistryStore;
pub use runtime::RegistryStore;
pub use runtime::SharedRegistryStore;
