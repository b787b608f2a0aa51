// toolspec-core/src/core/validate.rs
// ============================================================================
// Module: Submission Validator
// Description: Collect-all shape validation for incoming review submissions.
// Purpose: Reject adversarial submission bodies with complete field errors.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Server-side validation of submission bodies. The validator is pure and
//! side-effect free, never panics on adversarial input, and collects every
//! violation instead of short-circuiting so a caller receives all errors in
//! one response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::core::submission::ReviewSubmission;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum `agent_model` length.
const MAX_AGENT_MODEL_LENGTH: usize = 100;
/// Maximum `install_id` length.
const MAX_INSTALL_ID_LENGTH: usize = 100;
/// Accepted `recommendation` values.
const RECOMMENDATIONS: [&str; 3] = ["recommended", "caution", "avoid"];
/// Accepted `confidence` values.
const CONFIDENCE_LEVELS: [&str; 3] = ["high", "medium", "low"];
/// Accepted `failure_modes[].frequency` values.
const FAILURE_FREQUENCIES: [&str; 4] = ["rare", "occasional", "frequent", "persistent"];
/// Required non-empty string fields.
const REQUIRED_STRING_FIELDS: [&str; 4] =
    ["tool_slug", "review_window_start_utc", "review_window_end_utc", "idempotency_key"];
/// Required string-array fields.
const LIST_FIELDS: [&str; 5] = [
    "reliable_tools",
    "unreliable_tools",
    "hallucinated_tools",
    "never_used_tools",
    "behavioral_notes",
];

// ============================================================================
// SECTION: Field Errors
// ============================================================================

/// One validation violation, keyed by field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field path (e.g. `failure_modes[0].frequency`).
    pub field: String,
    /// Human-readable violation message.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates an untrusted submission body.
///
/// All violations are collected; the function only returns a typed
/// [`ReviewSubmission`] when the body is fully well-formed.
///
/// # Errors
///
/// Returns every [`FieldError`] found in the body.
pub fn validate_submission(body: &Value) -> Result<ReviewSubmission, Vec<FieldError>> {
    let Value::Object(map) = body else {
        return Err(vec![FieldError::new("body", "must be a JSON object")]);
    };

    let mut errors = Vec::new();

    validate_agent_model(map.get("agent_model"), &mut errors);
    validate_enum_field(map.get("recommendation"), "recommendation", &RECOMMENDATIONS, &mut errors);
    validate_enum_field(map.get("confidence"), "confidence", &CONFIDENCE_LEVELS, &mut errors);

    for field in REQUIRED_STRING_FIELDS {
        if !is_non_empty_string(map.get(field)) {
            errors.push(FieldError::new(field, "must be a non-empty string"));
        }
    }

    if let Some(install_id) = map.get("install_id") {
        validate_install_id(install_id, &mut errors);
    }

    if let Some(scope) = map.get("submission_scope")
        && !matches!(scope.as_str(), Some("single_tool" | "all_observed"))
    {
        errors.push(FieldError::new(
            "submission_scope",
            "must be one of single_tool|all_observed when provided",
        ));
    }

    for field in ["observed_tool_slugs", "redacted_tool_slugs"] {
        if let Some(value) = map.get(field)
            && !is_string_array(value)
        {
            errors.push(FieldError::new(field, "must be an array of strings"));
        }
    }

    for field in LIST_FIELDS {
        if !map.get(field).is_some_and(is_string_array) {
            errors.push(FieldError::new(field, "must be an array of strings"));
        }
    }

    validate_failure_modes(map.get("failure_modes"), &mut errors);
    validate_evidence(map.get("evidence"), &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value(body.clone())
        .map_err(|err| vec![FieldError::new("body", format!("malformed submission: {err}"))])
}

/// Validates the `agent_model` field.
fn validate_agent_model(value: Option<&Value>, errors: &mut Vec<FieldError>) {
    let Some(model) = value.and_then(Value::as_str) else {
        errors.push(FieldError::new("agent_model", "must be a non-empty string"));
        return;
    };
    if model.is_empty() {
        errors.push(FieldError::new("agent_model", "must be a non-empty string"));
    } else if model.len() > MAX_AGENT_MODEL_LENGTH {
        errors.push(FieldError::new("agent_model", "must be at most 100 characters"));
    } else if !model.bytes().all(is_agent_model_byte) {
        errors.push(FieldError::new("agent_model", "must match ^[a-zA-Z0-9._-]+$"));
    }
}

/// Validates an `install_id` value when present.
fn validate_install_id(value: &Value, errors: &mut Vec<FieldError>) {
    let Some(install_id) = value.as_str() else {
        errors.push(FieldError::new("install_id", "must be a non-empty string when provided"));
        return;
    };
    if install_id.trim().is_empty() {
        errors.push(FieldError::new("install_id", "must be a non-empty string when provided"));
    } else if install_id.len() > MAX_INSTALL_ID_LENGTH {
        errors.push(FieldError::new("install_id", "must be at most 100 characters"));
    } else if !install_id.bytes().all(is_install_id_byte) {
        errors.push(FieldError::new("install_id", "contains invalid characters"));
    }
}

/// Validates a closed string-enum field.
fn validate_enum_field(
    value: Option<&Value>,
    field: &str,
    accepted: &[&str],
    errors: &mut Vec<FieldError>,
) {
    if !value.and_then(Value::as_str).is_some_and(|text| accepted.contains(&text)) {
        errors.push(FieldError::new(field, format!("must be one of {}", accepted.join("|"))));
    }
}

/// Validates `failure_modes` entries.
fn validate_failure_modes(value: Option<&Value>, errors: &mut Vec<FieldError>) {
    let Some(Value::Array(modes)) = value else {
        errors.push(FieldError::new("failure_modes", "must be an array"));
        return;
    };
    for (index, mode) in modes.iter().enumerate() {
        let Value::Object(entry) = mode else {
            errors.push(FieldError::new(format!("failure_modes[{index}]"), "must be an object"));
            continue;
        };
        if !entry
            .get("frequency")
            .and_then(Value::as_str)
            .is_some_and(|frequency| FAILURE_FREQUENCIES.contains(&frequency))
        {
            errors.push(FieldError::new(
                format!("failure_modes[{index}].frequency"),
                "must be one of rare|occasional|frequent|persistent",
            ));
        }
        for field in ["symptom", "likely_cause", "recovery"] {
            if !is_non_empty_string(entry.get(field)) {
                errors.push(FieldError::new(
                    format!("failure_modes[{index}].{field}"),
                    "must be a non-empty string",
                ));
            }
        }
    }
}

/// Validates `evidence` entries.
fn validate_evidence(value: Option<&Value>, errors: &mut Vec<FieldError>) {
    let Some(Value::Array(entries)) = value else {
        errors.push(FieldError::new("evidence", "must be an array"));
        return;
    };
    for (index, entry) in entries.iter().enumerate() {
        let Value::Object(record) = entry else {
            errors.push(FieldError::new(format!("evidence[{index}]"), "must be an object"));
            continue;
        };
        for field in ["tool_call_id", "timestamp_utc"] {
            if !is_non_empty_string(record.get(field)) {
                errors.push(FieldError::new(
                    format!("evidence[{index}].{field}"),
                    "must be a non-empty string",
                ));
            }
        }
    }
}

/// Returns true when the value is a non-empty, non-whitespace string.
fn is_non_empty_string(value: Option<&Value>) -> bool {
    value.and_then(Value::as_str).is_some_and(|text| !text.trim().is_empty())
}

/// Returns true when the value is an array of strings.
fn is_string_array(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.iter().all(Value::is_string))
}

/// Returns true for bytes allowed in `agent_model`.
const fn is_agent_model_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-')
}

/// Returns true for bytes allowed in `install_id`.
const fn is_install_id_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b':' | b'-')
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

    use serde_json::Value;
    use serde_json::json;

    use super::validate_submission;

    /// Returns a fully valid submission body.
    fn valid_body() -> Value {
        json!({
            "install_id": "ins_abc123",
            "submission_scope": "all_observed",
            "observed_tool_slugs": ["github"],
            "redacted_tool_slugs": [],
            "tool_slug": "__session__",
            "agent_model": "test-agent-1.0",
            "review_window_start_utc": "2026-02-27T00:00:00Z",
            "review_window_end_utc": "2026-02-27T00:00:00Z",
            "recommendation": "caution",
            "confidence": "low",
            "reliable_tools": ["github"],
            "unreliable_tools": [],
            "hallucinated_tools": [],
            "never_used_tools": [],
            "behavioral_notes": ["submitted_via_toolspec_cli"],
            "failure_modes": [{
                "symptom": "not_provided",
                "likely_cause": "not_provided",
                "recovery": "not_provided",
                "frequency": "rare"
            }],
            "evidence": [{
                "tool_call_id": "session_tok_1_github",
                "timestamp_utc": "2026-02-27T00:00:00Z"
            }],
            "idempotency_key": "session_tok"
        })
    }

    #[test]
    fn accepts_valid_body() {
        let submission = validate_submission(&valid_body()).unwrap();
        assert_eq!(submission.validated_tool_use_count(), 1);
        assert!(submission.is_meaningful());
    }

    #[test]
    fn rejects_non_object_body() {
        let errors = validate_submission(&json!(["nope"])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "body");
    }

    #[test]
    fn rejects_bad_agent_model_charset() {
        let mut body = valid_body();
        body["agent_model"] = json!("bad model!");
        let errors = validate_submission(&body).unwrap_err();
        assert!(errors.iter().any(|err| err.field == "agent_model"));
    }

    #[test]
    fn collects_all_violations() {
        let mut body = valid_body();
        body["agent_model"] = json!("");
        body["recommendation"] = json!("maybe");
        body["confidence"] = json!("sure");
        body["idempotency_key"] = json!("  ");
        let errors = validate_submission(&body).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|err| err.field.as_str()).collect();
        assert!(fields.contains(&"agent_model"));
        assert!(fields.contains(&"recommendation"));
        assert!(fields.contains(&"confidence"));
        assert!(fields.contains(&"idempotency_key"));
    }

    #[test]
    fn rejects_malformed_failure_mode_entries() {
        let mut body = valid_body();
        body["failure_modes"] = json!([{"symptom": "", "frequency": "sometimes"}]);
        let errors = validate_submission(&body).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|err| err.field.as_str()).collect();
        assert!(fields.contains(&"failure_modes[0].frequency"));
        assert!(fields.contains(&"failure_modes[0].symptom"));
        assert!(fields.contains(&"failure_modes[0].likely_cause"));
        assert!(fields.contains(&"failure_modes[0].recovery"));
    }

    #[test]
    fn rejects_evidence_missing_subfields() {
        let mut body = valid_body();
        body["evidence"] = json!([{"tool_call_id": "call_1"}]);
        let errors = validate_submission(&body).unwrap_err();
        assert!(errors.iter().any(|err| err.field == "evidence[0].timestamp_utc"));
    }

    #[test]
    fn rejects_overlong_install_id() {
        let mut body = valid_body();
        body["install_id"] = json!("i".repeat(101));
        let errors = validate_submission(&body).unwrap_err();
        assert!(errors.iter().any(|err| err.field == "install_id"));
    }

    #[test]
    fn rejects_non_string_list_entries() {
        let mut body = valid_body();
        body["reliable_tools"] = json!(["github", 42]);
        let errors = validate_submission(&body).unwrap_err();
        assert!(errors.iter().any(|err| err.field == "reliable_tools"));
    }

    #[test]
    fn anonymous_submission_is_valid() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("install_id");
        let submission = validate_submission(&body).unwrap();
        assert!(submission.install_id.is_none());
    }
}
