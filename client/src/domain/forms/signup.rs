//! Role-specific account signup.

use serde_json::Value;

use super::encoding::json_body;
use super::login::{role_field, selected_role};
use super::schema::{FieldKind, FieldSpec, FormDraft, FormSchema};
use super::{FormDefinition, NextStep, SubmissionOutcome};
use crate::domain::Role;
use crate::domain::api::{ApiRequest, endpoints};
use crate::domain::routing::Location;
use crate::domain::session::SessionStore;
use crate::domain::submission::SubmissionError;

/// Farm sizes offered to farmers.
pub const FARM_TYPE_OPTIONS: &[&str] = &["Small", "Medium", "Large"];

const FARMER_FIELDS: [FieldSpec; 7] = [
    FieldSpec::required("fname", "Full name", FieldKind::Text),
    FieldSpec::required("faadhar", "Aadhaar number", FieldKind::Aadhaar),
    FieldSpec::required("fphone", "Phone", FieldKind::Phone),
    FieldSpec::required("femail", "Email", FieldKind::Email),
    FieldSpec::required("faddress", "Address", FieldKind::Text),
    FieldSpec::required("farmname", "Farm name", FieldKind::Text),
    FieldSpec::required("farmtype", "Farm type", FieldKind::Choice(FARM_TYPE_OPTIONS))
        .with_default("Small"),
];

const VET_FIELDS: [FieldSpec; 6] = [
    FieldSpec::required("vname", "Full name", FieldKind::Text),
    FieldSpec::required("vemail", "Email", FieldKind::Email),
    FieldSpec::required("vphone", "Phone", FieldKind::Phone),
    FieldSpec::required("vlicense", "License number", FieldKind::Text),
    FieldSpec::required("vclinic", "Clinic name", FieldKind::Text),
    FieldSpec::required("vaddress", "Address", FieldKind::Text),
];

const SHELTER_FIELDS: [FieldSpec; 6] = [
    FieldSpec::required("sname", "Shelter name", FieldKind::Text),
    FieldSpec::required("semail", "Email", FieldKind::Email),
    FieldSpec::required("sphone", "Phone", FieldKind::Phone),
    FieldSpec::required("sregistration", "Registration number", FieldKind::Text),
    FieldSpec::required("saddress", "Address", FieldKind::Text),
    FieldSpec::required("scapacity", "Capacity", FieldKind::NonNegativeInteger),
];

/// Signup form. Does not sign the new account in.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignupForm;

/// Account created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupComplete {
    pub role: Role,
}

impl SubmissionOutcome for SignupComplete {
    fn confirmation(&self) -> Option<String> {
        Some("Signup successful!".to_owned())
    }

    fn next_step(&self) -> NextStep {
        NextStep::Navigate(Location::new("/login"))
    }
}

impl FormDefinition for SignupForm {
    type Success = SignupComplete;

    fn name(&self) -> &'static str {
        "signup"
    }

    fn schema(&self, draft: &FormDraft) -> FormSchema {
        let role_fields: &[FieldSpec] = match selected_role(draft) {
            Role::Farmer => &FARMER_FIELDS,
            Role::Vet => &VET_FIELDS,
            Role::Shelter => &SHELTER_FIELDS,
        };
        let mut fields = Vec::with_capacity(role_fields.len() + 2);
        fields.push(role_field());
        fields.extend_from_slice(role_fields);
        fields.push(FieldSpec::required("password", "Password", FieldKind::Password));
        FormSchema::new(fields)
    }

    fn build_request(
        &self,
        draft: &FormDraft,
        _session: &SessionStore,
    ) -> Result<ApiRequest, SubmissionError> {
        let role = selected_role(draft);
        let mut body = json_body(&self.schema(draft), draft);
        // The role travels in the path.
        body.remove("role");
        Ok(ApiRequest::post_json(
            endpoints::signup(role),
            Value::Object(body),
        ))
    }

    fn on_success(
        &self,
        _body: Value,
        draft: &FormDraft,
        _session: &SessionStore,
    ) -> Result<SignupComplete, SubmissionError> {
        Ok(SignupComplete {
            role: selected_role(draft),
        })
    }

    fn clears_on_success(&self) -> bool {
        true
    }
}
