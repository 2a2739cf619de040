//! Login and first-password creation for INAPH-registered farmers.
//!
//! INAPH farmers are imported from the national animal registry without a
//! password. Login therefore checks first whether a password exists and
//! sends the farmer to password creation when it does not.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::login::store_session;
use super::schema::{FieldKind, FieldSpec, FormDraft, FormSchema};
use super::{FormDefinition, NextStep, SubmissionOutcome, SubmitContext};
use crate::domain::Role;
use crate::domain::api::{ApiRequest, endpoints};
use crate::domain::routing::{Location, NavigationState};
use crate::domain::session::{SessionRecord, SessionStore};
use crate::domain::submission::{
    FieldMessage, RequestFailure, SubmissionError, classify_response,
};

const NOT_FOUND: &str = "INAPH ID not found!";

#[derive(Debug, Deserialize)]
struct PasswordCheck {
    #[serde(default)]
    has_password: bool,
}

#[derive(Debug, Deserialize)]
struct InaphLoginBody {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    faadhar: Option<Value>,
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    user_name: Option<String>,
}

/// Two-step INAPH login.
#[derive(Debug, Clone, Copy, Default)]
pub struct InaphLoginForm;

/// Where an INAPH login attempt ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum InaphLoginOutcome {
    /// Password accepted; the session is stored.
    SignedIn(SessionRecord),
    /// The farmer has no password yet.
    PasswordRequired { inaph_id: String },
}

impl SubmissionOutcome for InaphLoginOutcome {
    fn confirmation(&self) -> Option<String> {
        Some(match self {
            Self::SignedIn(_) => "Login successful! Redirecting...".to_owned(),
            Self::PasswordRequired { .. } => {
                "You haven't created a password yet. Redirecting...".to_owned()
            }
        })
    }

    fn next_step(&self) -> NextStep {
        match self {
            Self::SignedIn(_) => NextStep::SignedIn,
            Self::PasswordRequired { inaph_id } => NextStep::Navigate(
                Location::new("/InaphPage")
                    .with_state(NavigationState::InaphId(inaph_id.clone())),
            ),
        }
    }
}

fn inaph_id(draft: &FormDraft) -> String {
    draft.text("inaph_id").trim().to_owned()
}

fn non_null(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

#[async_trait]
impl FormDefinition for InaphLoginForm {
    type Success = InaphLoginOutcome;

    fn name(&self) -> &'static str {
        "inaph_login"
    }

    fn schema(&self, _draft: &FormDraft) -> FormSchema {
        // The password only matters once the id is known to have one.
        FormSchema::new(vec![
            FieldSpec::required("inaph_id", "INAPH ID", FieldKind::Text),
            FieldSpec::optional("password", "Password", FieldKind::Password),
        ])
    }

    fn fallback_error(&self) -> &'static str {
        "Invalid credentials"
    }

    fn build_request(
        &self,
        draft: &FormDraft,
        _session: &SessionStore,
    ) -> Result<ApiRequest, SubmissionError> {
        Ok(ApiRequest::post_json(
            endpoints::INAPH_LOGIN,
            json!({
                "inaph_id": inaph_id(draft),
                "password": draft.text("password"),
            }),
        ))
    }

    fn on_success(
        &self,
        body: Value,
        _draft: &FormDraft,
        session: &SessionStore,
    ) -> Result<InaphLoginOutcome, SubmissionError> {
        let body: InaphLoginBody =
            serde_json::from_value(body).map_err(|_| SubmissionError::malformed())?;
        let role = body
            .role
            .filter(|role| !role.trim().is_empty())
            .unwrap_or_else(|| Role::Farmer.as_str().to_owned());
        let mut record = json!({ "role": role });
        if let Some(aadhar) = non_null(body.faadhar) {
            record["aadhar"] = aadhar;
        }
        if let Some(user_id) = non_null(body.user_id) {
            record["user_id"] = user_id;
        }
        if let Some(user_name) = body.user_name {
            record["user_name"] = Value::String(user_name);
        }
        let record = SessionRecord::from_value(record).map_err(|_| SubmissionError::malformed())?;
        store_session(session, &record)?;
        Ok(InaphLoginOutcome::SignedIn(record))
    }

    async fn execute(
        &self,
        draft: &FormDraft,
        ctx: SubmitContext<'_>,
    ) -> Result<InaphLoginOutcome, SubmissionError> {
        let id = inaph_id(draft);
        let check = ApiRequest::get(endpoints::INAPH_CHECK_PASSWORD).with_query("inaph_id", &id);
        let response = ctx
            .api
            .send(check)
            .await
            .map_err(SubmissionError::from_transport)?;
        if !response.is_success() {
            debug!(status = response.status(), "INAPH id lookup refused");
            return Err(SubmissionError::request(
                RequestFailure::Rejected {
                    status: response.status(),
                },
                NOT_FOUND,
            ));
        }
        let check: PasswordCheck =
            serde_json::from_slice(response.body()).map_err(|_| SubmissionError::malformed())?;
        if !check.has_password {
            info!("INAPH account has no password yet");
            return Ok(InaphLoginOutcome::PasswordRequired { inaph_id: id });
        }

        if draft.text("password").trim().is_empty() {
            return Err(SubmissionError::validation(vec![FieldMessage::for_field(
                "password",
                "Please enter your password!",
            )]));
        }
        let response = ctx
            .api
            .send(self.build_request(draft, ctx.session)?)
            .await
            .map_err(SubmissionError::from_transport)?;
        let body = classify_response(&response, self.fallback_error())?;
        self.on_success(body, draft, ctx.session)
    }
}

/// First password for an INAPH farmer.
#[derive(Debug, Clone, Copy, Default)]
pub struct InaphCreatePasswordForm;

/// Password stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCreated;

impl SubmissionOutcome for PasswordCreated {
    fn confirmation(&self) -> Option<String> {
        Some("Password created successfully! Redirecting to login...".to_owned())
    }

    fn next_step(&self) -> NextStep {
        NextStep::Navigate(Location::new("/InaphLogin"))
    }
}

impl FormDefinition for InaphCreatePasswordForm {
    type Success = PasswordCreated;

    fn name(&self) -> &'static str {
        "inaph_create_password"
    }

    fn schema(&self, _draft: &FormDraft) -> FormSchema {
        FormSchema::new(vec![
            FieldSpec::required("inaph_id", "INAPH ID", FieldKind::Text),
            FieldSpec::required("new_password", "New password", FieldKind::Password),
        ])
    }

    fn build_request(
        &self,
        draft: &FormDraft,
        _session: &SessionStore,
    ) -> Result<ApiRequest, SubmissionError> {
        Ok(ApiRequest::post_json(
            endpoints::INAPH_CREATE_PASSWORD,
            json!({
                "inaph_id": inaph_id(draft),
                "new_password": draft.text("new_password"),
            }),
        ))
    }

    fn on_success(
        &self,
        _body: Value,
        _draft: &FormDraft,
        _session: &SessionStore,
    ) -> Result<PasswordCreated, SubmissionError> {
        Ok(PasswordCreated)
    }

    fn clears_on_success(&self) -> bool {
        true
    }
}
