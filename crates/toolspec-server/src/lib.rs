// toolspec-server/src/lib.rs
// ============================================================================
// Module: ToolSpec Server Library
// Description: HTTP registry service for installs, submissions, and reviews.
// Purpose: Expose the review registry over a bounded axum transport.
// Dependencies: toolspec-core, toolspec-config, axum, tokio, serde
// ============================================================================

//! ## Overview
//! `toolspec-server` hosts the registry API: install registration and
//! revocation, access-status checks, idempotent review submission, and the
//! seeded reviews read model. All registry semantics live in the
//! transport-free [`service::RegistryService`]; the axum layer only decodes
//! requests, supplies timestamps, and encodes structured responses.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod reviews;
pub mod server;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::NoopAuditSink;
pub use audit::RegistryAuditEvent;
pub use audit::StderrAuditSink;
pub use reviews::ReviewCatalog;
pub use reviews::ToolReview;
pub use server::run_server;
pub use service::RegistryService;
pub use service::ServiceError;
