//! Stray-cattle complaint and its location capture.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::controller::FormController;
use super::encoding::multipart_fields;
use super::schema::{FieldKind, FieldSpec, FormDraft, FormSchema, InputError};
use super::{FormDefinition, NextStep, SubmissionOutcome};
use crate::domain::api::{ApiRequest, endpoints};
use crate::domain::ports::{Coordinates, ReverseGeocoder};
use crate::domain::session::SessionStore;
use crate::domain::submission::SubmissionError;

const CATTLE_TYPES: &[&str] = &["Cow", "Buffalo", "Calf", "Bull", "Other"];
const CONDITIONS: &[&str] = &["Healthy but stray", "Injured", "Sick", "Dead"];

const FIELDS: [FieldSpec; 14] = [
    FieldSpec::required("reporter_name", "Full name", FieldKind::Text),
    FieldSpec::required("reporter_phone", "Mobile number", FieldKind::Phone),
    FieldSpec::optional("reporter_email", "Email", FieldKind::Email),
    FieldSpec::required("reporter_location", "Your location", FieldKind::Text),
    FieldSpec::required("cattle_count", "Number of cattle", FieldKind::NonNegativeInteger)
        .with_default("1"),
    FieldSpec::required("cattle_type", "Type of cattle", FieldKind::Choice(CATTLE_TYPES)),
    FieldSpec::required("cattle_condition", "Condition", FieldKind::Choice(CONDITIONS)),
    FieldSpec::optional("description", "Additional description", FieldKind::Text),
    FieldSpec::required("spotted_date", "Date and time spotted", FieldKind::DateTimeLocal),
    FieldSpec::required("exact_location", "Exact location", FieldKind::Text),
    FieldSpec::optional("gps_latitude", "Latitude", FieldKind::Decimal),
    FieldSpec::optional("gps_longitude", "Longitude", FieldKind::Decimal),
    FieldSpec::optional("nearest_landmark", "Nearest landmark", FieldKind::Text),
    FieldSpec::optional("photo", "Photo", FieldKind::Photo),
];

/// Public complaint form; no session needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplaintForm;

/// Complaint stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComplaintRegistered {
    pub complaint_id: Value,
}

impl SubmissionOutcome for ComplaintRegistered {
    fn confirmation(&self) -> Option<String> {
        let id = match &self.complaint_id {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        };
        Some(format!("Complaint registered successfully!\nComplaint ID: {id}"))
    }

    fn next_step(&self) -> NextStep {
        NextStep::Stay
    }
}

impl FormDefinition for ComplaintForm {
    type Success = ComplaintRegistered;

    fn name(&self) -> &'static str {
        "complaint"
    }

    fn schema(&self, _draft: &FormDraft) -> FormSchema {
        FormSchema::new(FIELDS.to_vec())
    }

    fn fallback_error(&self) -> &'static str {
        "Failed to submit complaint"
    }

    fn build_request(
        &self,
        draft: &FormDraft,
        _session: &SessionStore,
    ) -> Result<ApiRequest, SubmissionError> {
        let mut fields = multipart_fields(&self.schema(draft), draft);
        // The picker has minute precision; the backend wants seconds.
        if let Some(field) = fields.iter_mut().find(|field| field.name() == "spotted_date") {
            let with_seconds = field
                .as_text()
                .map(str::trim)
                .filter(|value| value.len() == "YYYY-MM-DDTHH:MM".len())
                .map(|value| format!("{value}:00"));
            if let Some(with_seconds) = with_seconds {
                field.set_text(with_seconds);
            }
        }
        Ok(ApiRequest::post_multipart(endpoints::SUBMIT_COMPLAINT, fields))
    }

    fn on_success(
        &self,
        body: Value,
        _draft: &FormDraft,
        _session: &SessionStore,
    ) -> Result<ComplaintRegistered, SubmissionError> {
        serde_json::from_value(body).map_err(|_| SubmissionError::malformed())
    }

    fn clears_on_success(&self) -> bool {
        true
    }
}

/// Result of filling the location fields from coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationCapture {
    /// Coordinates and address filled in.
    Resolved { address: String },
    /// Coordinates filled in; the address must be typed by hand.
    CoordinatesOnly { notice: String },
}

/// Write `coordinates` into the GPS fields and try to fill the address.
pub async fn capture_location(
    form: &FormController<ComplaintForm>,
    coordinates: Coordinates,
    geocoder: &dyn ReverseGeocoder,
) -> Result<LocationCapture, InputError> {
    form.set("gps_latitude", &coordinates.latitude.to_string())?;
    form.set("gps_longitude", &coordinates.longitude.to_string())?;

    let manual = || LocationCapture::CoordinatesOnly {
        notice: "GPS coordinates captured, but address lookup failed. \
                 Please enter address manually."
            .to_owned(),
    };
    match geocoder.reverse(coordinates).await {
        Ok(address) => match address.formatted() {
            Some(formatted) => {
                form.set("exact_location", &formatted)?;
                Ok(LocationCapture::Resolved { address: formatted })
            }
            None => Ok(manual()),
        },
        Err(error) => {
            warn!(%error, %coordinates, "reverse geocoding failed");
            Ok(manual())
        }
    }
}
