// toolspec-core/src/core/canonical.rs
// ============================================================================
// Module: Tool Name Canonicalizer
// Description: Normalizes raw tool names into stable lowercase slugs.
// Purpose: Provide one total normalization function shared by client and server.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Tool names arrive from heterogeneous log formats and API payloads with
//! inconsistent casing, whitespace, and vendor-specific aliases. The
//! canonicalizer maps every raw name onto one stable slug. It is a total
//! function: malformed input yields `None`, never an error.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Known aliases for the shell execution tool across agent runtimes.
const SHELL_ALIASES: [&str; 5] = [
    "shell_command",
    "exec_command",
    "functions.exec_command",
    "write_stdin",
    "functions.write_stdin",
];

// ============================================================================
// SECTION: Canonicalization
// ============================================================================

/// Canonicalizes a raw tool name into a stable slug.
///
/// Trims whitespace, lowercases, and collapses known shell-tool aliases onto
/// `bash`. Returns `None` for empty or whitespace-only input.
#[must_use]
pub fn canonicalize(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    if SHELL_ALIASES.contains(&normalized.as_str()) {
        return Some("bash".to_string());
    }
    Some(normalized)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
