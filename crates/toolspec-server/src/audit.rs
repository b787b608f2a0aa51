// toolspec-server/src/audit.rs
// ============================================================================
// Module: Registry Audit Logging
// Description: Structured audit events for registry request handling.
// Purpose: Emit redacted audit logs without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for registry request
//! logging. Events are JSON lines on stderr by default so deployments can
//! route them to their preferred pipeline without redesign. Secrets and
//! submission payloads are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Registry request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Route label for the handled request.
    pub route: &'static str,
    /// HTTP status code returned.
    pub status: u16,
    /// Install identifier when one was supplied.
    pub install_id: Option<String>,
    /// Gating deny reason when access was not granted.
    pub deny_reason: Option<String>,
    /// True when a submission replayed an existing idempotency key.
    pub duplicate: Option<bool>,
    /// Request body size in bytes.
    pub request_bytes: usize,
}

/// Inputs required to construct a registry audit event.
pub struct RegistryAuditEventParams {
    /// Route label for the handled request.
    pub route: &'static str,
    /// HTTP status code returned.
    pub status: u16,
    /// Install identifier when one was supplied.
    pub install_id: Option<String>,
    /// Gating deny reason when access was not granted.
    pub deny_reason: Option<String>,
    /// True when a submission replayed an existing idempotency key.
    pub duplicate: Option<bool>,
    /// Request body size in bytes.
    pub request_bytes: usize,
}

impl RegistryAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: RegistryAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "registry_request",
            timestamp_ms,
            route: params.route,
            status: params.status,
            install_id: params.install_id,
            deny_reason: params.deny_reason,
            duplicate: params.duplicate,
            request_bytes: params.request_bytes,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for registry request events.
pub trait AuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &RegistryAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &RegistryAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &RegistryAuditEvent) {}
}
