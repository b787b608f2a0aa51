// toolspec-server/src/reviews.rs
// ============================================================================
// Module: Reviews Read Model
// Description: Seeded tool review aggregates and staleness computation.
// Purpose: Serve the read-only reviews catalog behind the access gate.
// Dependencies: toolspec-core, serde
// ============================================================================

//! ## Overview
//! The reviews catalog is a seeded, read-only aggregate: submission ingestion
//! does not rewrite it. Staleness is computed against a caller-supplied
//! "now" so the catalog itself never reads the wall clock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use toolspec_core::Confidence;
use toolspec_core::FailureFrequency;
use toolspec_core::FailureMode;
use toolspec_core::Recommendation;
use toolspec_core::Timestamp;
use toolspec_core::ToolSlug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Days since last contribution after which a review is stale.
pub const STALE_THRESHOLD_DAYS: i64 = 60;
/// Milliseconds in one day.
const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Full review aggregate for one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolReview {
    /// Canonical tool slug.
    pub tool_slug: ToolSlug,
    /// Human-readable tool name.
    pub tool_name: String,
    /// Catalog category label.
    pub category: String,
    /// Aggregate recommendation.
    pub recommendation: Recommendation,
    /// Aggregate confidence.
    pub confidence: Confidence,
    /// Tool calls observed across contributing sessions.
    pub calls_observed: u64,
    /// Contributing sessions observed.
    pub sessions_observed: u64,
    /// Observed error rate in [0, 1].
    pub error_rate: f64,
    /// Connection stability label.
    pub connection_stability: String,
    /// Setup type label.
    pub setup_type: String,
    /// Number of reviews aggregated.
    pub review_count: u64,
    /// Number of distinct contributors.
    pub contributor_count: u64,
    /// Validated tool uses backing the aggregate.
    pub validated_tool_uses: u64,
    /// Agent models that contributed.
    pub agent_models: Vec<String>,
    /// RFC 3339 time of the last contribution.
    pub last_contribution_utc: String,
    /// RFC 3339 time of the last verification.
    pub last_verified_utc: String,
    /// Tools reported as reliable.
    pub reliable_tools: Vec<String>,
    /// Tools reported as unreliable.
    pub unreliable_tools: Vec<String>,
    /// Tools agents invoked that do not exist.
    pub hallucinated_tools: Vec<String>,
    /// Tools never exercised.
    pub never_used_tools: Vec<String>,
    /// Reported failure modes.
    pub failure_modes: Vec<FailureMode>,
    /// Free-form behavioral notes.
    pub behavioral_notes: Vec<String>,
}

/// Summary row for the reviews listing.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    /// Canonical tool slug.
    pub tool_slug: ToolSlug,
    /// Human-readable tool name.
    pub tool_name: String,
    /// Catalog category label.
    pub category: String,
    /// Aggregate recommendation.
    pub recommendation: Recommendation,
    /// Aggregate confidence.
    pub confidence: Confidence,
    /// Tool calls observed across contributing sessions.
    pub calls_observed: u64,
    /// Contributing sessions observed.
    pub sessions_observed: u64,
    /// Observed error rate in [0, 1].
    pub error_rate: f64,
    /// Connection stability label.
    pub connection_stability: String,
    /// Setup type label.
    pub setup_type: String,
    /// Number of reviews aggregated.
    pub review_count: u64,
    /// Number of distinct contributors.
    pub contributor_count: u64,
    /// Validated tool uses backing the aggregate.
    pub validated_tool_uses: u64,
    /// RFC 3339 time of the last contribution.
    pub last_contribution_utc: String,
    /// True when the last contribution is older than the threshold.
    pub stale: bool,
    /// RFC 3339 time of the last verification.
    pub last_verified_utc: String,
    /// Path of the detail resource.
    pub detail_url: String,
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Read-only tool review catalog.
#[derive(Debug, Clone)]
pub struct ReviewCatalog {
    /// Review aggregates keyed by position; small and scanned linearly.
    reviews: Vec<ToolReview>,
}

impl ReviewCatalog {
    /// Creates a catalog from explicit aggregates.
    #[must_use]
    pub const fn new(reviews: Vec<ToolReview>) -> Self {
        Self {
            reviews,
        }
    }

    /// Creates the built-in seeded catalog.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(seed_reviews())
    }

    /// Returns the full aggregate for a slug, when present.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&ToolReview> {
        self.reviews.iter().find(|review| review.tool_slug.as_str() == slug)
    }

    /// Returns summary rows for all reviews, with staleness as of `now`.
    #[must_use]
    pub fn summaries(&self, now: Timestamp) -> Vec<ReviewSummary> {
        self.reviews
            .iter()
            .map(|review| ReviewSummary {
                tool_slug: review.tool_slug.clone(),
                tool_name: review.tool_name.clone(),
                category: review.category.clone(),
                recommendation: review.recommendation,
                confidence: review.confidence,
                calls_observed: review.calls_observed,
                sessions_observed: review.sessions_observed,
                error_rate: review.error_rate,
                connection_stability: review.connection_stability.clone(),
                setup_type: review.setup_type.clone(),
                review_count: review.review_count,
                contributor_count: review.contributor_count,
                validated_tool_uses: review.validated_tool_uses,
                last_contribution_utc: review.last_contribution_utc.clone(),
                stale: is_stale(&review.last_contribution_utc, now),
                last_verified_utc: review.last_verified_utc.clone(),
                detail_url: format!("/reviews/{}", review.tool_slug.as_str()),
            })
            .collect()
    }
}

/// Returns true when the contribution time is stale as of `now`.
///
/// Unparseable contribution times count as stale.
#[must_use]
pub fn is_stale(last_contribution_utc: &str, now: Timestamp) -> bool {
    let Ok(contributed) = Timestamp::parse_rfc3339(last_contribution_utc) else {
        return true;
    };
    let age_days = (now.as_unix_millis() - contributed.as_unix_millis()) / MS_PER_DAY;
    age_days >= STALE_THRESHOLD_DAYS
}

// ============================================================================
// SECTION: Seed Data
// ============================================================================

/// Builds the seeded review aggregates.
fn seed_reviews() -> Vec<ToolReview> {
    vec![
        ToolReview {
            tool_slug: ToolSlug::from("linear"),
            tool_name: "Linear".to_string(),
            category: "project-management".to_string(),
            recommendation: Recommendation::Recommended,
            confidence: Confidence::Medium,
            calls_observed: 39,
            sessions_observed: 4,
            error_rate: 0.03,
            connection_stability: "stable".to_string(),
            setup_type: "config".to_string(),
            review_count: 3,
            contributor_count: 3,
            validated_tool_uses: 31,
            agent_models: vec![
                "claude-opus-4-6".to_string(),
                "codex-5.3-xhigh".to_string(),
            ],
            last_contribution_utc: "2026-02-22T22:10:00Z".to_string(),
            last_verified_utc: "2026-02-22T22:10:00Z".to_string(),
            reliable_tools: vec![
                "create_issue".to_string(),
                "update_issue".to_string(),
                "list_issues".to_string(),
            ],
            unreliable_tools: Vec::new(),
            hallucinated_tools: vec!["close_cycle".to_string()],
            never_used_tools: vec!["list_milestones".to_string()],
            failure_modes: vec![FailureMode {
                symptom: "5xx from upstream".to_string(),
                likely_cause: "provider incident".to_string(),
                recovery: "retry with backoff; verify status".to_string(),
                frequency: FailureFrequency::Rare,
            }],
            behavioral_notes: vec![
                "Synthetic seed review for initial catalog population.".to_string(),
                "Prefer list_issues with a narrow query before get_issue.".to_string(),
            ],
        },
        ToolReview {
            tool_slug: ToolSlug::from("github"),
            tool_name: "GitHub MCP".to_string(),
            category: "code-hosting".to_string(),
            recommendation: Recommendation::Recommended,
            confidence: Confidence::Medium,
            calls_observed: 41,
            sessions_observed: 4,
            error_rate: 0.05,
            connection_stability: "stable".to_string(),
            setup_type: "config".to_string(),
            review_count: 3,
            contributor_count: 3,
            validated_tool_uses: 36,
            agent_models: vec![
                "claude-opus-4-6".to_string(),
                "codex-5.3-xhigh".to_string(),
            ],
            last_contribution_utc: "2026-02-22T17:04:00Z".to_string(),
            last_verified_utc: "2026-02-22T17:04:00Z".to_string(),
            reliable_tools: vec![
                "list_pull_requests".to_string(),
                "get_pull_request".to_string(),
                "create_issue_comment".to_string(),
            ],
            unreliable_tools: vec!["search_code".to_string()],
            hallucinated_tools: vec!["merge_pull_request".to_string()],
            never_used_tools: vec!["create_repository".to_string()],
            failure_modes: vec![FailureMode {
                symptom: "401 unauthorized".to_string(),
                likely_cause: "missing or expired token".to_string(),
                recovery: "refresh credentials and retry".to_string(),
                frequency: FailureFrequency::Occasional,
            }],
            behavioral_notes: vec![
                "Synthetic seed review for initial catalog population.".to_string(),
                "search_code intermittently truncates results on large repos.".to_string(),
            ],
        },
        ToolReview {
            tool_slug: ToolSlug::from("filesystem"),
            tool_name: "Filesystem MCP".to_string(),
            category: "local-files".to_string(),
            recommendation: Recommendation::Recommended,
            confidence: Confidence::Medium,
            calls_observed: 44,
            sessions_observed: 5,
            error_rate: 0.04,
            connection_stability: "stable".to_string(),
            setup_type: "config".to_string(),
            review_count: 3,
            contributor_count: 3,
            validated_tool_uses: 38,
            agent_models: vec![
                "claude-opus-4-6".to_string(),
                "codex-5.3-xhigh".to_string(),
            ],
            last_contribution_utc: "2026-02-21T09:45:00Z".to_string(),
            last_verified_utc: "2026-02-21T09:45:00Z".to_string(),
            reliable_tools: vec![
                "read_file".to_string(),
                "write_file".to_string(),
                "list_directory".to_string(),
            ],
            unreliable_tools: Vec::new(),
            hallucinated_tools: vec!["move_directory".to_string()],
            never_used_tools: vec!["get_file_info".to_string()],
            failure_modes: vec![FailureMode {
                symptom: "permission denied on write".to_string(),
                likely_cause: "path outside allowed roots".to_string(),
                recovery: "request access to the target root".to_string(),
                frequency: FailureFrequency::Occasional,
            }],
            behavioral_notes: vec![
                "Synthetic seed review for initial catalog population.".to_string(),
            ],
        },
        ToolReview {
            tool_slug: ToolSlug::from("playwright"),
            tool_name: "Playwright MCP".to_string(),
            category: "browser-automation".to_string(),
            recommendation: Recommendation::Recommended,
            confidence: Confidence::Low,
            calls_observed: 28,
            sessions_observed: 3,
            error_rate: 0.08,
            connection_stability: "intermittent".to_string(),
            setup_type: "config".to_string(),
            review_count: 2,
            contributor_count: 2,
            validated_tool_uses: 22,
            agent_models: vec!["claude-opus-4-6".to_string()],
            last_contribution_utc: "2026-02-19T13:20:00Z".to_string(),
            last_verified_utc: "2026-02-19T13:20:00Z".to_string(),
            reliable_tools: vec![
                "browser_navigate".to_string(),
                "browser_snapshot".to_string(),
            ],
            unreliable_tools: vec!["browser_click".to_string()],
            hallucinated_tools: Vec::new(),
            never_used_tools: vec!["browser_pdf_save".to_string()],
            failure_modes: vec![FailureMode {
                symptom: "click target not found".to_string(),
                likely_cause: "stale element reference after navigation".to_string(),
                recovery: "re-snapshot before interacting".to_string(),
                frequency: FailureFrequency::Frequent,
            }],
            behavioral_notes: vec![
                "Synthetic seed review for initial catalog population.".to_string(),
            ],
        },
    ]
}

// ============================================================================
// SECTION: Tests
// ============================================================================
