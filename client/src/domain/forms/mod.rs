//! Generic form handling and the concrete registry forms.
//!
//! A [`FormDefinition`] describes one form: its fields, how a draft becomes a
//! request and what a successful response means. [`FormController`] supplies
//! the shared mechanics: draft state, input normalisation, validation, the
//! single-submission guard and error extraction.

mod cattle;
mod complaint;
mod controller;
mod encoding;
mod inaph;
mod login;
mod schema;
mod signup;
mod validation;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

pub use cattle::{AddCattleForm, CattleRegistered, SPECIES_OPTIONS, SEX_OPTIONS};
pub use complaint::{
    ComplaintForm, ComplaintRegistered, LocationCapture, capture_location,
};
pub use controller::{FormController, FormStatus};
pub use encoding::{json_body, multipart_fields};
pub use inaph::{
    InaphCreatePasswordForm, InaphLoginForm, InaphLoginOutcome, PasswordCreated,
};
pub use login::{LoginForm, SignedIn};
pub use schema::{FieldKind, FieldSpec, FieldValue, FormDraft, FormSchema, InputError};
pub use signup::{FARM_TYPE_OPTIONS, SignupComplete, SignupForm};
pub use validation::{MAX_PHOTO_BYTES, PHOTO_EXTENSIONS, validate};

use super::api::ApiRequest;
use super::ports::RegistryApi;
use super::routing::Location;
use super::session::SessionStore;
use super::submission::{SubmissionError, classify_response};

/// Generic message used when a failure body names no reason.
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Collaborators a submission may use.
#[derive(Clone, Copy)]
pub struct SubmitContext<'a> {
    pub api: &'a dyn RegistryApi,
    pub session: &'a SessionStore,
}

/// What the app does after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// Stay on the form.
    Stay,
    /// Go to a fixed location.
    Navigate(Location),
    /// A session was stored; continue to the post-login destination.
    SignedIn,
}

/// Success values a page can report without knowing the concrete form.
pub trait SubmissionOutcome {
    /// Confirmation text, if the form shows one.
    fn confirmation(&self) -> Option<String>;
    fn next_step(&self) -> NextStep;
}

/// One concrete form.
#[async_trait]
pub trait FormDefinition: Send + Sync {
    type Success: SubmissionOutcome + Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Active fields. Role-dependent forms read the selected role from the
    /// draft, so the schema can change as the user edits.
    fn schema(&self, draft: &FormDraft) -> FormSchema;

    /// Message shown when a failure body carries none.
    fn fallback_error(&self) -> &'static str {
        GENERIC_FAILURE
    }

    /// Checks that need more than the draft, run after validation and
    /// before any request.
    fn precheck(&self, _draft: &FormDraft, _session: &SessionStore) -> Result<(), SubmissionError> {
        Ok(())
    }

    fn build_request(
        &self,
        draft: &FormDraft,
        session: &SessionStore,
    ) -> Result<ApiRequest, SubmissionError>;

    fn on_success(
        &self,
        body: Value,
        draft: &FormDraft,
        session: &SessionStore,
    ) -> Result<Self::Success, SubmissionError>;

    /// Whether a successful submission resets the draft.
    fn clears_on_success(&self) -> bool {
        false
    }

    /// Send the request and interpret the response. Multi-step forms
    /// override this.
    async fn execute(
        &self,
        draft: &FormDraft,
        ctx: SubmitContext<'_>,
    ) -> Result<Self::Success, SubmissionError> {
        let request = self.build_request(draft, ctx.session)?;
        debug!(
            form = self.name(),
            method = %request.method(),
            path = request.path(),
            "sending form request"
        );
        let response = ctx
            .api
            .send(request)
            .await
            .map_err(SubmissionError::from_transport)?;
        let body = classify_response(&response, self.fallback_error())?;
        self.on_success(body, draft, ctx.session)
    }
}
