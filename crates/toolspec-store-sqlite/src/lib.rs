// toolspec-store-sqlite/src/lib.rs
// ============================================================================
// Module: ToolSpec SQLite Store Library
// Description: Durable install and submission storage backed by SQLite.
// Purpose: Provide the production storage backend for the review registry.
// Dependencies: toolspec-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `toolspec-store-sqlite` persists install records and review submissions
//! in a single `SQLite` database. Submission idempotency is enforced by a
//! unique index and a conditional insert, never by read-then-write.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteRegistryConfig;
pub use store::SqliteRegistryError;
pub use store::SqliteRegistryStore;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
