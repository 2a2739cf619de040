//! Cattle registration for the signed-in farmer.

use serde::Deserialize;
use serde_json::Value;

use super::encoding::multipart_fields;
use super::schema::{FieldKind, FieldSpec, FormDraft, FormSchema};
use super::{FormDefinition, NextStep, SubmissionOutcome};
use crate::domain::api::{ApiRequest, OWNER_ID_HEADER, endpoints};
use crate::domain::session::SessionStore;
use crate::domain::submission::SubmissionError;

pub const SPECIES_OPTIONS: &[&str] = &["Cow", "Buffalo"];
pub const SEX_OPTIONS: &[&str] = &["Male", "Female"];
const SOURCE_OPTIONS: &[&str] = &["Purchased", "Gifted", "Born in farm"];

const NO_OWNER: &str = "Please login first: no farmer ID found.";

const FIELDS: [FieldSpec; 11] = [
    FieldSpec::optional("cid", "Cattle ID", FieldKind::Text),
    FieldSpec::required("species", "Species", FieldKind::Choice(SPECIES_OPTIONS)),
    FieldSpec::required("breed", "Breed", FieldKind::Text),
    FieldSpec::required("sex", "Sex", FieldKind::Choice(SEX_OPTIONS)),
    FieldSpec::required("dob", "Date of birth", FieldKind::Date),
    FieldSpec::optional("weight", "Weight", FieldKind::NonNegativeNumber),
    FieldSpec::optional("colour", "Colour", FieldKind::Text),
    FieldSpec::optional("healthCondition", "Health condition", FieldKind::Text),
    FieldSpec::optional("purchaseDate", "Purchase date", FieldKind::Date),
    FieldSpec::optional("source", "Source", FieldKind::Choice(SOURCE_OPTIONS)),
    FieldSpec::optional("photo", "Photo", FieldKind::Photo),
];

/// Multipart cattle registration tagged with the owner's id.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddCattleForm;

/// Registration accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CattleRegistered {
    #[serde(default)]
    pub message: String,
    #[serde(deserialize_with = "id_string")]
    pub local_cattle_id: String,
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a cattle id, got {other}"
        ))),
    }
}

impl SubmissionOutcome for CattleRegistered {
    fn confirmation(&self) -> Option<String> {
        Some(format!("{}\nCattle ID: {}", self.message, self.local_cattle_id))
    }

    fn next_step(&self) -> NextStep {
        NextStep::Stay
    }
}

impl FormDefinition for AddCattleForm {
    type Success = CattleRegistered;

    fn name(&self) -> &'static str {
        "add_cattle"
    }

    fn schema(&self, _draft: &FormDraft) -> FormSchema {
        FormSchema::new(FIELDS.to_vec())
    }

    fn fallback_error(&self) -> &'static str {
        "Failed to add cattle"
    }

    fn precheck(&self, _draft: &FormDraft, session: &SessionStore) -> Result<(), SubmissionError> {
        match session.owner_id() {
            Some(_) => Ok(()),
            None => Err(SubmissionError::precondition(NO_OWNER)),
        }
    }

    fn build_request(
        &self,
        draft: &FormDraft,
        session: &SessionStore,
    ) -> Result<ApiRequest, SubmissionError> {
        let owner = session
            .owner_id()
            .ok_or_else(|| SubmissionError::precondition(NO_OWNER))?;
        let fields = multipart_fields(&self.schema(draft), draft);
        Ok(ApiRequest::post_multipart(endpoints::ADD_CATTLE, fields).with_header(OWNER_ID_HEADER, owner))
    }

    fn on_success(
        &self,
        body: Value,
        _draft: &FormDraft,
        _session: &SessionStore,
    ) -> Result<CattleRegistered, SubmissionError> {
        serde_json::from_value(body).map_err(|_| SubmissionError::malformed())
    }

    fn clears_on_success(&self) -> bool {
        true
    }
}
