// toolspec-agent/src/client.rs
// ============================================================================
// Module: Registry HTTP Client
// Description: Typed reqwest client for the ToolSpec registry API.
// Purpose: Expose install, gating, submission, and review endpoints.
// Dependencies: reqwest, serde, serde_json, toolspec-core
// ============================================================================

//! ## Overview
//! Thin typed wrapper over the registry's HTTP surface. Requests carry
//! bounded timeouts, error responses are surfaced with their structured
//! details intact, and response bodies that fail to parse as JSON are wrapped
//! rather than dropped so callers can still show what the server said.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use toolspec_core::ReviewSubmission;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default registry base URL.
pub const DEFAULT_BASE_URL: &str = "https://toolspec.dev";

/// Connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Whole-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry client failure.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the transport failed mid-flight.
    #[error("registry request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("{method} {path} failed with {status}")]
    Api {
        /// Request method.
        method: &'static str,
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Structured error details from the response body.
        details: Value,
    },
    /// The response body did not match the expected shape.
    #[error("could not decode response from {path}: {source}")]
    Decode {
        /// Request path.
        path: String,
        /// Underlying deserialization error.
        source: serde_json::Error,
    },
}

impl ClientError {
    /// Returns the structured details of an API error, when present.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        match self {
            Self::Api {
                details, ..
            } => Some(details),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Response Shapes
// ============================================================================

/// Response to a successful install registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRegistered {
    /// New install identifier.
    pub install_id: String,
    /// Install secret; shown once at registration.
    pub install_secret: String,
    /// Credential version.
    pub secret_version: u32,
}

/// Response to a revocation request.
#[derive(Debug, Clone, Deserialize)]
pub struct RevokeOutcome {
    /// True when a matching install record existed.
    pub revoked: bool,
}

/// Access-status report returned by the gating endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessStatus {
    /// Gating decision label (`granted` or `denied`).
    pub submission_access: String,
    /// Machine-readable reason for a non-granted decision.
    #[serde(default)]
    pub deny_reason: Option<String>,
    /// Concrete next commands suggested by the server.
    #[serde(default)]
    pub next_actions: Vec<String>,
    /// True while a meaningful submission is still required.
    #[serde(default)]
    pub post_install_required: bool,
    /// Command completing the install flow, while required.
    #[serde(default)]
    pub post_install_required_command: Option<String>,
    /// Guidance message accompanying the required command.
    #[serde(default)]
    pub post_install_required_message: Option<String>,
    /// RFC 3339 time of the first meaningful submission, once set.
    #[serde(default)]
    pub first_submission_completed_at: Option<String>,
}

impl AccessStatus {
    /// Returns true when read access is fully unlocked.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.submission_access == "granted" && !self.post_install_required
    }
}

/// Contributor status attached to an accepted submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ContributorStatus {
    /// Gating decision label after the commit.
    pub submission_access: String,
    /// Deny reason label, or `granted`.
    pub reason: String,
}

/// Response to an accepted submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionOutcome {
    /// Server-assigned review identifier (the stored one on replay).
    pub review_id: String,
    /// `submitted` for a first write, `duplicate` for a replay.
    pub status: String,
    /// Evidence entries counted by the winning record.
    pub validated_tool_use_count: u64,
    /// Gating status computed after the commit.
    pub contributor_status: ContributorStatus,
}

/// One review summary row from the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRow {
    /// Canonical tool slug.
    pub tool_slug: String,
    /// Human-readable tool name.
    pub tool_name: String,
    /// Catalog category label.
    #[serde(default)]
    pub category: String,
    /// Aggregate recommendation label.
    pub recommendation: String,
    /// Aggregate confidence label.
    pub confidence: String,
    /// Observed error rate in [0, 1].
    #[serde(default)]
    pub error_rate: f64,
    /// True when the aggregate is stale.
    #[serde(default)]
    pub stale: bool,
    /// Path of the detail resource.
    #[serde(default)]
    pub detail_url: String,
}

/// Envelope around the review listing.
#[derive(Debug, Clone, Deserialize)]
struct ReviewsEnvelope {
    /// Review summary rows.
    #[serde(default)]
    reviews: Vec<ReviewRow>,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Typed HTTP client for one registry base URL.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with bounded timeouts.
    http: reqwest::Client,
    /// Base URL without a trailing slash.
    base_url: String,
}

impl RegistryClient {
    /// Creates a client for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Registers a new install.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport, API, or decode failure.
    pub async fn register_install(&self) -> Result<InstallRegistered, ClientError> {
        let value = self.post_json("/installs", &json!({})).await?;
        decode("/installs", value)
    }

    /// Revokes an install; revocation is permanent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport, API, or decode failure.
    pub async fn revoke_install(&self, install_id: &str) -> Result<RevokeOutcome, ClientError> {
        let path = format!("/installs/{install_id}/revoke");
        let value = self.post_json(&path, &json!({})).await?;
        decode(&path, value)
    }

    /// Fetches the gating status report for an optional install id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport, API, or decode failure.
    pub async fn access_status(
        &self,
        install_id: Option<&str>,
    ) -> Result<AccessStatus, ClientError> {
        let path = with_install_id("/access-status", install_id);
        let value = self.get_json(&path).await?;
        decode(&path, value)
    }

    /// Submits one review submission.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport, API, or decode failure;
    /// validation rejections surface as an API error with field details.
    pub async fn submit(
        &self,
        submission: &ReviewSubmission,
    ) -> Result<SubmissionOutcome, ClientError> {
        let value = self.post_json("/submissions", submission).await?;
        decode("/submissions", value)
    }

    /// Lists review summaries; requires granted access.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport, API, or decode failure.
    pub async fn reviews(&self, install_id: Option<&str>) -> Result<Vec<ReviewRow>, ClientError> {
        let path = with_install_id("/reviews", install_id);
        let value = self.get_json(&path).await?;
        let envelope: ReviewsEnvelope = decode(&path, value)?;
        Ok(envelope.reviews)
    }

    /// Issues a GET and returns the parsed JSON body.
    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let response = self.http.get(format!("{}{path}", self.base_url)).send().await?;
        into_json("GET", path, response).await
    }

    /// Issues a POST with a JSON body and returns the parsed JSON response.
    async fn post_json(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Value, ClientError> {
        let response =
            self.http.post(format!("{}{path}", self.base_url)).json(body).send().await?;
        into_json("POST", path, response).await
    }
}

/// Appends an `install_id` query parameter when one is present.
fn with_install_id(path: &str, install_id: Option<&str>) -> String {
    match install_id {
        Some(id) if !id.is_empty() => format!("{path}?install_id={id}"),
        _ => path.to_string(),
    }
}

/// Converts a response into JSON, mapping non-success statuses to API errors.
///
/// Bodies that are not valid JSON are preserved under a `raw` key so error
/// details are never lost.
async fn into_json(
    method: &'static str,
    path: &str,
    response: reqwest::Response,
) -> Result<Value, ClientError> {
    let status = response.status();
    let text = response.text().await?;
    let parsed = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or_else(|_| json!({"raw": text}))
    };
    if status.is_success() {
        Ok(parsed)
    } else {
        Err(ClientError::Api {
            method,
            path: path.to_string(),
            status: status.as_u16(),
            details: parsed,
        })
    }
}

/// Decodes a JSON value into a typed response shape.
fn decode<T: for<'de> Deserialize<'de>>(path: &str, value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
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

    use serde_json::json;

    use super::AccessStatus;
    use super::ClientError;
    use super::RegistryClient;
    use super::SubmissionOutcome;
    use super::with_install_id;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = RegistryClient::new("https://registry.example/").unwrap();
        assert_eq!(client.base_url, "https://registry.example");
    }

    #[test]
    fn install_id_query_is_appended_when_present() {
        assert_eq!(with_install_id("/access-status", None), "/access-status");
        assert_eq!(with_install_id("/access-status", Some("")), "/access-status");
        assert_eq!(
            with_install_id("/access-status", Some("ins_abc")),
            "/access-status?install_id=ins_abc"
        );
    }

    #[test]
    fn access_status_granted_requires_no_pending_install_step() {
        let granted: AccessStatus = serde_json::from_value(json!({
            "submission_access": "granted",
            "post_install_required": false,
        }))
        .unwrap();
        assert!(granted.is_granted());

        let pending: AccessStatus = serde_json::from_value(json!({
            "submission_access": "denied",
            "deny_reason": "initial_submission_required",
            "post_install_required": true,
        }))
        .unwrap();
        assert!(!pending.is_granted());
    }

    #[test]
    fn submission_outcome_decodes_contributor_status() {
        let outcome: SubmissionOutcome = serde_json::from_value(json!({
            "review_id": "rev_1",
            "status": "submitted",
            "validated_tool_use_count": 3,
            "contributor_status": {"submission_access": "granted", "reason": "granted"},
        }))
        .unwrap();
        assert_eq!(outcome.contributor_status.reason, "granted");
    }

    #[test]
    fn api_error_keeps_structured_details() {
        let error = ClientError::Api {
            method: "POST",
            path: "/submissions".to_string(),
            status: 400,
            details: json!({"error": "validation_failed"}),
        };
        assert_eq!(error.details().unwrap()["error"], "validation_failed");
    }
}
