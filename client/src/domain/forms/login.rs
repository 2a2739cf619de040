//! Role-aware password login.

use serde_json::{Value, json};

use super::schema::{FieldKind, FieldSpec, FormDraft, FormSchema};
use super::{FormDefinition, NextStep, SubmissionOutcome};
use crate::domain::Role;
use crate::domain::api::{ApiRequest, endpoints};
use crate::domain::identifiers::validate_aadhaar;
use crate::domain::session::{SessionRecord, SessionStore};
use crate::domain::submission::{FieldMessage, RequestFailure, SubmissionError};

/// Wire names offered by the role selector.
pub(super) const ROLE_OPTIONS: &[&str] = &["farmer", "vet", "shelter"];

pub(super) fn role_field() -> FieldSpec {
    FieldSpec::required("role", "Role", FieldKind::Choice(ROLE_OPTIONS)).with_default("farmer")
}

/// Role picked in the draft; farmer until something else is chosen.
pub(super) fn selected_role(draft: &FormDraft) -> Role {
    draft.text("role").parse().unwrap_or(Role::Farmer)
}

/// Persist a freshly signed-in record.
pub(super) fn store_session(
    session: &SessionStore,
    record: &SessionRecord,
) -> Result<(), SubmissionError> {
    session.set(record).map_err(|error| {
        SubmissionError::request(
            RequestFailure::Storage,
            format!("Could not save your session: {error}"),
        )
    })
}

/// Login form. The identifier field depends on the selected role.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginForm;

/// A stored session after a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub record: SessionRecord,
}

impl SubmissionOutcome for SignedIn {
    fn confirmation(&self) -> Option<String> {
        Some(format!("Welcome, {}!", self.record.display_name()))
    }

    fn next_step(&self) -> NextStep {
        NextStep::SignedIn
    }
}

impl LoginForm {
    fn identifier(draft: &FormDraft) -> Result<String, SubmissionError> {
        match selected_role(draft) {
            Role::Farmer => validate_aadhaar(&draft.text("faadhar")).map_err(|error| {
                SubmissionError::validation(vec![FieldMessage::for_field(
                    "faadhar",
                    error.to_string(),
                )])
            }),
            Role::Vet => Ok(draft.text("vemail").trim().to_owned()),
            Role::Shelter => Ok(draft.text("semail").trim().to_owned()),
        }
    }
}

impl FormDefinition for LoginForm {
    type Success = SignedIn;

    fn name(&self) -> &'static str {
        "login"
    }

    fn schema(&self, draft: &FormDraft) -> FormSchema {
        let identifier = match selected_role(draft) {
            Role::Farmer => FieldSpec::required("faadhar", "Aadhaar number", FieldKind::Aadhaar),
            Role::Vet => FieldSpec::required("vemail", "Email", FieldKind::Email),
            Role::Shelter => FieldSpec::required("semail", "Email", FieldKind::Email),
        };
        FormSchema::new(vec![
            role_field(),
            identifier,
            FieldSpec::required("password", "Password", FieldKind::Password),
        ])
    }

    fn fallback_error(&self) -> &'static str {
        "Invalid Credentials"
    }

    fn build_request(
        &self,
        draft: &FormDraft,
        _session: &SessionStore,
    ) -> Result<ApiRequest, SubmissionError> {
        let body = json!({
            "role": selected_role(draft).as_str(),
            "identifier": Self::identifier(draft)?,
            "password": draft.text("password"),
        });
        Ok(ApiRequest::post_json(endpoints::LOGIN, body))
    }

    fn on_success(
        &self,
        body: Value,
        draft: &FormDraft,
        session: &SessionStore,
    ) -> Result<SignedIn, SubmissionError> {
        let record = SessionRecord::from_value(body)
            .map_err(|_| SubmissionError::malformed())?
            .with_default_role(selected_role(draft));
        store_session(session, &record)?;
        Ok(SignedIn { record })
    }
}
