// toolspec-config/src/lib.rs
// ============================================================================
// Module: ToolSpec Config Library
// Description: Canonical config model and strict fail-closed validation.
// Purpose: Single source of truth for toolspec.toml semantics.
// Dependencies: toolspec-core, toolspec-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `toolspec-config` defines the configuration model shared by the registry
//! server and the agent CLI. Loading is strict: size and path limits are
//! enforced before parsing, and invalid configuration fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
