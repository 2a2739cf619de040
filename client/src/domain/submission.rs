//! Submission failure taxonomy and backend error extraction.
//!
//! Every form submission ends in one of a small set of outcomes. Validation
//! failures carry a list of per-field messages; everything else carries one
//! message. [`classify_response`] turns a raw backend response into either the
//! decoded success body or the matching [`SubmissionError`].

use std::fmt;

use serde_json::Value;
use tracing::debug;

use super::api::ApiResponse;
use super::ports::RegistryApiError;

/// Message shown when the backend could not be reached.
pub const NETWORK_ERROR: &str = "Network error";
/// Message shown when the backend answered with something unparseable.
pub const INVALID_RESPONSE: &str = "Invalid response from server";

/// One human-readable message, optionally tied to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    field: Option<String>,
    message: String,
}

impl FieldMessage {
    /// Message tied to `field`.
    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Message not tied to any field.
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FieldMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Why a non-validation submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFailure {
    /// A local precondition failed before anything was sent.
    Precondition,
    /// Another submission of the same form is still running.
    InFlight,
    /// No response was received.
    Transport,
    /// The backend answered with a non-success status.
    Rejected { status: u16 },
    /// The backend answered with a body that could not be decoded.
    MalformedResponse,
    /// The response was fine but local session storage failed.
    Storage,
}

/// Outcome of a failed submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// Client-side or backend field validation failed.
    #[error("{}", join_messages(.0))]
    Validation(Vec<FieldMessage>),
    /// The request could not be made or was refused.
    #[error("{message}")]
    Request {
        kind: RequestFailure,
        message: String,
    },
}

fn join_messages(messages: &[FieldMessage]) -> String {
    messages
        .iter()
        .map(FieldMessage::message)
        .collect::<Vec<_>>()
        .join("\n")
}

/// What a page shows for a failure: one line or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorView {
    Single(String),
    List(Vec<String>),
}

impl ErrorView {
    /// Lines to render, one per message.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Self::Single(message) => vec![message.as_str()],
            Self::List(messages) => messages.iter().map(String::as_str).collect(),
        }
    }
}

impl SubmissionError {
    pub fn validation(messages: Vec<FieldMessage>) -> Self {
        Self::Validation(messages)
    }

    pub fn request(kind: RequestFailure, message: impl Into<String>) -> Self {
        Self::Request {
            kind,
            message: message.into(),
        }
    }

    /// Local precondition failure; nothing was sent.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::request(RequestFailure::Precondition, message)
    }

    pub fn in_flight() -> Self {
        Self::request(
            RequestFailure::InFlight,
            "A submission is already in progress",
        )
    }

    pub fn network() -> Self {
        Self::request(RequestFailure::Transport, NETWORK_ERROR)
    }

    pub fn malformed() -> Self {
        Self::request(RequestFailure::MalformedResponse, INVALID_RESPONSE)
    }

    /// Map a transport error. The detail is logged, the user sees a fixed
    /// message.
    pub fn from_transport(error: RegistryApiError) -> Self {
        debug!(%error, "registry request failed before a response");
        Self::network()
    }

    /// Failure kind, or `None` for validation errors.
    pub fn kind(&self) -> Option<RequestFailure> {
        match self {
            Self::Validation(_) => None,
            Self::Request { kind, .. } => Some(*kind),
        }
    }

    /// Whether this failure was caught before a request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Request {
                    kind: RequestFailure::Precondition | RequestFailure::InFlight,
                    ..
                }
        )
    }

    /// Render as one line or a list.
    pub fn view(&self) -> ErrorView {
        match self {
            Self::Validation(messages) if messages.len() == 1 => {
                ErrorView::Single(messages[0].message().to_owned())
            }
            Self::Validation(messages) => ErrorView::List(
                messages
                    .iter()
                    .map(|message| message.message().to_owned())
                    .collect(),
            ),
            Self::Request { message, .. } => ErrorView::Single(message.clone()),
        }
    }
}

/// Decode `response` into its JSON body, or the error a page should show.
///
/// Non-success bodies are searched for a message in this order: a `detail`
/// list of `{loc, msg}` items (one message per item), a `detail` string, an
/// `error` string, a `message` string. With none present, `fallback` is
/// used. A body that is not JSON at all is reported as an invalid response
/// regardless of status.
pub fn classify_response(
    response: &ApiResponse,
    fallback: &str,
) -> Result<Value, SubmissionError> {
    let body: Value = serde_json::from_slice(response.body()).map_err(|error| {
        debug!(status = response.status(), %error, "response body is not JSON");
        SubmissionError::malformed()
    })?;

    if response.is_success() {
        return Ok(body);
    }

    let status = response.status();
    if let Some(Value::Array(items)) = body.get("detail") {
        if !items.is_empty() {
            return Err(SubmissionError::Validation(
                items.iter().map(detail_item).collect(),
            ));
        }
    }
    let message = ["detail", "error", "message"]
        .into_iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(fallback);
    Err(SubmissionError::request(
        RequestFailure::Rejected { status },
        message,
    ))
}

fn detail_item(item: &Value) -> FieldMessage {
    let message = item
        .get("msg")
        .and_then(Value::as_str)
        .map_or_else(|| item.to_string(), str::to_owned);
    let field = item
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.last())
        .and_then(|last| match last {
            Value::String(name) => Some(name.clone()),
            Value::Number(index) => Some(index.to_string()),
            _ => None,
        });
    match field {
        Some(field) => FieldMessage::for_field(field, message),
        None => FieldMessage::general(message),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const FALLBACK: &str = "Failed to add cattle";

    #[test]
    fn success_returns_body() {
        let body = json!({"message": "ok", "local_cattle_id": "C-1"});
        let decoded =
            classify_response(&ApiResponse::json(200, &body), FALLBACK).expect("success");
        assert_eq!(decoded, body);
    }

    #[rstest]
    #[case::detail_string(json!({"detail": "Duplicate cattle id"}), "Duplicate cattle id")]
    #[case::error_string(json!({"error": "Invalid Credentials"}), "Invalid Credentials")]
    #[case::message_string(json!({"message": "Owner not found"}), "Owner not found")]
    #[case::detail_first(json!({"detail": "d", "error": "e"}), "d")]
    #[case::no_message(json!({"status": "nope"}), FALLBACK)]
    #[case::blank_message(json!({"error": "  "}), FALLBACK)]
    #[case::detail_object(json!({"detail": {"code": 1}}), FALLBACK)]
    fn rejected_bodies_yield_one_message(#[case] body: Value, #[case] expected: &str) {
        let err = classify_response(&ApiResponse::json(400, &body), FALLBACK)
            .expect_err("rejected");
        assert_eq!(err.kind(), Some(RequestFailure::Rejected { status: 400 }));
        assert_eq!(err.view(), ErrorView::Single(expected.to_owned()));
    }

    #[test]
    fn detail_lists_become_field_messages() {
        let body = json!({"detail": [
            {"loc": ["body", "faadhar"], "msg": "field required", "type": "missing"},
            {"loc": ["body", "items", 0], "msg": "bad item"},
            {"msg": "general failure"},
            "plain"
        ]});
        let err = classify_response(&ApiResponse::json(422, &body), FALLBACK)
            .expect_err("validation");

        let SubmissionError::Validation(messages) = &err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(messages[0], FieldMessage::for_field("faadhar", "field required"));
        assert_eq!(messages[1].field(), Some("0"));
        assert_eq!(messages[2], FieldMessage::general("general failure"));
        assert_eq!(messages[3].message(), "\"plain\"");
        assert_eq!(
            err.view().lines(),
            vec!["field required", "bad item", "general failure", "\"plain\""]
        );
    }

    #[rstest]
    #[case(200)]
    #[case(500)]
    fn non_json_bodies_are_invalid_responses(#[case] status: u16) {
        let response = ApiResponse::new(status, "<html>oops</html>");
        let err = classify_response(&response, FALLBACK).expect_err("malformed");
        assert_eq!(err, SubmissionError::malformed());
        assert_eq!(err.to_string(), INVALID_RESPONSE);
    }

    #[test]
    fn transport_errors_hide_their_detail() {
        let err = SubmissionError::from_transport(RegistryApiError::transport("refused"));
        assert_eq!(err.to_string(), NETWORK_ERROR);
        assert!(!err.is_local());
    }

    #[test]
    fn validation_display_joins_lines() {
        let err = SubmissionError::validation(vec![
            FieldMessage::general("a"),
            FieldMessage::general("b"),
        ]);
        assert_eq!(err.to_string(), "a\nb");
        assert!(err.is_local());
    }
}
