//! Pre-submission validation of a draft against its schema.
//!
//! Every field is checked and every failure is reported, so a page can show
//! the complete list at once instead of one problem per attempt.

use chrono::{NaiveDate, NaiveDateTime};

use super::schema::{FieldKind, FieldSpec, FieldValue, FormDraft, FormSchema};
use crate::domain::identifiers::{validate_aadhaar, validate_email, validate_phone};
use crate::domain::submission::{FieldMessage, SubmissionError};

/// File extensions accepted for photo uploads.
pub const PHOTO_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
/// Largest accepted photo, in bytes.
pub const MAX_PHOTO_BYTES: usize = 16 * 1024 * 1024;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Check `draft` against `schema`.
pub fn validate(schema: &FormSchema, draft: &FormDraft) -> Result<(), SubmissionError> {
    let messages: Vec<FieldMessage> = schema
        .fields()
        .iter()
        .filter_map(|spec| check_field(spec, draft.get(spec.name())))
        .map(|message| FieldMessage::for_field(message.0, message.1))
        .collect();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(SubmissionError::validation(messages))
    }
}

fn check_field(spec: &FieldSpec, value: Option<&FieldValue>) -> Option<(&'static str, String)> {
    let Some(value) = value.filter(|value| !value.is_blank()) else {
        return spec
            .is_required()
            .then(|| (spec.name(), format!("{} is required", spec.label())));
    };
    check_value(spec, value).err().map(|message| (spec.name(), message))
}

fn check_value(spec: &FieldSpec, value: &FieldValue) -> Result<(), String> {
    let label = spec.label();
    match (spec.kind(), value) {
        (FieldKind::Photo, FieldValue::File(upload)) => {
            let allowed = upload
                .extension()
                .is_some_and(|ext| PHOTO_EXTENSIONS.contains(&ext.as_str()));
            if !allowed {
                return Err(format!("{label} must be a PNG, JPG, JPEG or GIF image"));
            }
            if upload.len() > MAX_PHOTO_BYTES {
                return Err(format!("{label} must be 16 MB or smaller"));
            }
            Ok(())
        }
        (FieldKind::Photo, _) => Err(format!("{label} must be a file")),
        (_, FieldValue::File(_)) => Err(format!("{label} does not accept files")),
        (FieldKind::Email, FieldValue::Text(text)) => {
            validate_email(text).map(drop).map_err(|e| e.to_string())
        }
        (FieldKind::Aadhaar, FieldValue::Text(text)) => {
            validate_aadhaar(text).map(drop).map_err(|e| e.to_string())
        }
        (FieldKind::Phone, FieldValue::Text(text)) => {
            validate_phone(text).map(drop).map_err(|e| e.to_string())
        }
        (FieldKind::NonNegativeNumber, FieldValue::Number(n)) if *n < 0.0 => {
            Err(format!("{label} cannot be negative"))
        }
        (FieldKind::NonNegativeInteger, FieldValue::Integer(n)) if *n < 0 => {
            Err(format!("{label} cannot be negative"))
        }
        (FieldKind::NonNegativeNumber | FieldKind::Decimal, FieldValue::Number(_))
        | (FieldKind::NonNegativeInteger, FieldValue::Integer(_)) => Ok(()),
        (FieldKind::NonNegativeNumber | FieldKind::Decimal, _) => {
            Err(format!("{label} must be a number"))
        }
        (FieldKind::NonNegativeInteger, _) => Err(format!("{label} must be a whole number")),
        (FieldKind::Date, FieldValue::Text(text)) => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
            .map(drop)
            .map_err(|_| format!("{label} must be a date (YYYY-MM-DD)")),
        (FieldKind::DateTimeLocal, FieldValue::Text(text)) => {
            let text = text.trim();
            if DATE_TIME_FORMATS
                .iter()
                .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
            {
                Ok(())
            } else {
                Err(format!("{label} must be a date and time (YYYY-MM-DDTHH:MM)"))
            }
        }
        (FieldKind::Choice(options), FieldValue::Text(text)) => {
            if options.contains(&text.trim()) {
                Ok(())
            } else {
                Err(format!("Please select a valid {}", label.to_lowercase()))
            }
        }
        (
            FieldKind::Text | FieldKind::Password,
            FieldValue::Text(_) | FieldValue::Number(_) | FieldValue::Integer(_),
        ) => Ok(()),
        (
            FieldKind::Email
            | FieldKind::Aadhaar
            | FieldKind::Phone
            | FieldKind::Date
            | FieldKind::DateTimeLocal
            | FieldKind::Choice(_),
            _,
        ) => Err(format!("{label} is not valid")),
    }
}
