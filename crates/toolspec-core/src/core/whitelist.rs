// toolspec-core/src/core/whitelist.rs
// ============================================================================
// Module: Public Tool Whitelist
// Description: Versioned registry of known public tool and provider names.
// Purpose: Partition observed tool slugs into public and unknown sets.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Tool identifiers arrive in many vendor-specific shapes (`mcp__linear__…`,
//! `github/create_issue`, `server-postgres`) while the registry only tracks
//! coarse provider names. Each slug therefore expands into a small set of
//! candidate tokens, and a slug is public when any candidate matches the
//! registry exactly. The registry is an injected, versioned configuration
//! value rather than a hard-coded module constant, so deployments can update
//! it without redeploying extraction logic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ToolSlug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Version label for the built-in default registry contents.
pub const DEFAULT_WHITELIST_VERSION: &str = "2026-02";

/// Built-in public tool and provider names.
const DEFAULT_WHITELIST: [&str; 40] = [
    "anthropic",
    "airtable",
    "asana",
    "aws",
    "azure",
    "bigquery",
    "brave",
    "browserbase",
    "cloudflare",
    "confluence",
    "discord",
    "fetch",
    "figma",
    "filesystem",
    "gcp",
    "github",
    "gitlab",
    "google",
    "hubspot",
    "jira",
    "linear",
    "mongodb",
    "mysql",
    "notion",
    "openai",
    "paypal",
    "postgres",
    "redis",
    "salesforce",
    "serpapi",
    "shopify",
    "slack",
    "snowflake",
    "sqlite",
    "stripe",
    "supabase",
    "tavily",
    "twilio",
    "vercel",
    "zendesk",
];

/// Separator characters used for candidate-token decomposition.
const TOKEN_SEPARATORS: [char; 6] = ['/', ':', '_', '-', '.', '@'];

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Versioned registry of public tool and provider names.
///
/// # Invariants
/// - Names are stored lowercase; matching is exact against candidate tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistRegistry {
    /// Registry content version label.
    version: String,
    /// Known public names.
    names: BTreeSet<String>,
}

/// Result of partitioning an observed-tool set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionedTools {
    /// Slugs matching the public registry.
    pub public: BTreeSet<ToolSlug>,
    /// Slugs with no registry match; redacted by default submission policy.
    pub unknown: BTreeSet<ToolSlug>,
}

impl Default for WhitelistRegistry {
    fn default() -> Self {
        Self::new(
            DEFAULT_WHITELIST_VERSION,
            DEFAULT_WHITELIST.iter().map(ToString::to_string),
        )
    }
}

impl WhitelistRegistry {
    /// Creates a registry from a version label and an iterator of names.
    ///
    /// Names are lowercased and deduplicated.
    #[must_use]
    pub fn new(version: impl Into<String>, names: impl IntoIterator<Item = String>) -> Self {
        Self {
            version: version.into(),
            names: names.into_iter().map(|name| name.trim().to_lowercase()).collect(),
        }
    }

    /// Returns the registry content version label.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true when the registry has no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns true when any candidate token of the slug matches the registry.
    #[must_use]
    pub fn is_public(&self, slug: &str) -> bool {
        slug_candidates(slug).iter().any(|candidate| self.names.contains(candidate))
    }

    /// Partitions observed slugs into public and unknown sets.
    ///
    /// Total over its input: every slug lands in exactly one output set.
    #[must_use]
    pub fn partition(&self, slugs: &BTreeSet<ToolSlug>) -> PartitionedTools {
        let mut partitioned = PartitionedTools::default();
        for slug in slugs {
            if self.is_public(slug.as_str()) {
                partitioned.public.insert(slug.clone());
            } else {
                partitioned.unknown.insert(slug.clone());
            }
        }
        partitioned
    }
}

/// Expands a slug into candidate tokens for registry matching.
///
/// Candidates are: the raw lowercased slug, each separator-split token, the
/// server token of an `mcp__<server>__<tool>` name, and the suffix after a
/// `server-` marker.
#[must_use]
pub fn slug_candidates(slug: &str) -> BTreeSet<String> {
    let normalized = slug.trim().to_lowercase();
    let mut candidates = BTreeSet::new();
    if normalized.is_empty() {
        return candidates;
    }
    candidates.insert(normalized.clone());
    for token in normalized.split(TOKEN_SEPARATORS).filter(|token| !token.is_empty()) {
        candidates.insert(token.to_string());
    }
    if let Some(rest) = normalized.strip_prefix("mcp__")
        && let Some((server, _tool)) = rest.split_once("__")
        && !server.is_empty()
        && !server.contains('_')
    {
        candidates.insert(server.to_string());
    }
    if let Some((_, suffix)) = normalized.rsplit_once("server-")
        && !suffix.is_empty()
    {
        candidates.insert(suffix.to_string());
    }
    candidates
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use std::collections::BTreeSet;

    use super::WhitelistRegistry;
    use super::slug_candidates;
    use crate::core::identifiers::ToolSlug;

    #[test]
    fn mcp_server_token_matches_registry() {
        let registry = WhitelistRegistry::default();
        assert!(registry.is_public("mcp__linear__create_issue"));
        assert!(registry.is_public("mcp__github__list_prs"));
    }

    #[test]
    fn separator_tokens_match_registry() {
        let registry = WhitelistRegistry::default();
        assert!(registry.is_public("notion.search"));
        assert!(registry.is_public("slack/post_message"));
        assert!(registry.is_public("stripe:charges"));
    }

    #[test]
    fn server_prefix_suffix_matches_registry() {
        let registry = WhitelistRegistry::default();
        assert!(registry.is_public("modelcontextprotocol+server-postgres"));
    }

    #[test]
    fn unknown_slug_is_not_public() {
        let registry = WhitelistRegistry::default();
        assert!(!registry.is_public("internal_billing_tool"));
        assert!(!registry.is_public("bash"));
    }

    #[test]
    fn partition_covers_input_disjointly() {
        let registry = WhitelistRegistry::default();
        let slugs: BTreeSet<ToolSlug> =
            ["github", "bash", "mcp__linear__create_issue", "secret_tool"]
                .into_iter()
                .map(ToolSlug::from)
                .collect();
        let partitioned = registry.partition(&slugs);
        let union: BTreeSet<ToolSlug> =
            partitioned.public.union(&partitioned.unknown).cloned().collect();
        assert_eq!(union, slugs);
        assert!(partitioned.public.is_disjoint(&partitioned.unknown));
        assert!(partitioned.public.contains(&ToolSlug::from("github")));
        assert!(partitioned.unknown.contains(&ToolSlug::from("bash")));
    }

    #[test]
    fn candidates_include_raw_and_tokens() {
        let candidates = slug_candidates("mcp__linear__create_issue");
        assert!(candidates.contains("mcp__linear__create_issue"));
        assert!(candidates.contains("linear"));
        assert!(candidates.contains("create"));
        assert!(candidates.contains("issue"));
    }

    #[test]
    fn empty_slug_has_no_candidates() {
        assert!(slug_candidates("   ").is_empty());
    }

    #[test]
    fn injected_registry_overrides_default() {
        let registry =
            WhitelistRegistry::new("custom-1", ["Acme".to_string(), "widgets".to_string()]);
        assert_eq!(registry.version(), "custom-1");
        assert!(registry.is_public("acme/do_thing"));
        assert!(!registry.is_public("github"));
    }
}
