//! Draft-to-body encoders shared by the form definitions.

use serde_json::{Map, Value};

use super::schema::{FieldValue, FormDraft, FormSchema};
use crate::domain::api::MultipartField;

/// JSON object with one entry per schema field.
///
/// Unset fields are sent as empty strings; file fields are skipped.
pub fn json_body(schema: &FormSchema, draft: &FormDraft) -> Map<String, Value> {
    schema
        .fields()
        .iter()
        .filter_map(|spec| match draft.get(spec.name()) {
            Some(FieldValue::File(_)) => None,
            Some(value) => Some((spec.name().to_owned(), value.to_json())),
            None => Some((spec.name().to_owned(), Value::String(String::new()))),
        })
        .collect()
}

/// Multipart parts in schema order.
///
/// Blank and unset fields are omitted entirely, so optional inputs the user
/// skipped never reach the backend as empty strings.
pub fn multipart_fields(schema: &FormSchema, draft: &FormDraft) -> Vec<MultipartField> {
    schema
        .fields()
        .iter()
        .filter_map(|spec| {
            let value = draft.get(spec.name()).filter(|value| !value.is_blank())?;
            Some(match value {
                FieldValue::File(upload) => MultipartField::file(spec.name(), upload.clone()),
                other => MultipartField::text(spec.name(), other.to_text().unwrap_or_default()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::api::{MultipartValue, Upload};
    use crate::domain::forms::{FieldKind, FieldSpec};
    use serde_json::json;

    fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldSpec::required("name", "Name", FieldKind::Text),
            FieldSpec::required("capacity", "Capacity", FieldKind::NonNegativeInteger),
            FieldSpec::optional("notes", "Notes", FieldKind::Text),
            FieldSpec::optional("photo", "Photo", FieldKind::Photo),
        ])
    }

    #[test]
    fn json_body_keeps_numbers_numeric() {
        let mut draft = FormDraft::new();
        draft.insert("name", FieldValue::Text("Gaushala".into()));
        draft.insert("capacity", FieldValue::Integer(40));
        draft.insert("photo", FieldValue::File(Upload::new("a.png", vec![1])));

        let body = Value::Object(json_body(&schema(), &draft));
        assert_eq!(
            body,
            json!({"name": "Gaushala", "capacity": 40, "notes": ""})
        );
    }

    #[test]
    fn multipart_omits_blank_optionals_and_absent_files() {
        let mut draft = FormDraft::new();
        draft.insert("name", FieldValue::Text("Gauri".into()));
        draft.insert("capacity", FieldValue::Integer(3));
        draft.insert("notes", FieldValue::Text("   ".into()));

        let names: Vec<_> = multipart_fields(&schema(), &draft)
            .iter()
            .map(|field| field.name().to_owned())
            .collect();
        assert_eq!(names, vec!["name", "capacity"]);
    }

    #[test]
    fn multipart_includes_file_parts() {
        let mut draft = FormDraft::new();
        draft.insert("photo", FieldValue::File(Upload::new("cow.jpg", vec![9, 9])));

        let fields = multipart_fields(&schema(), &draft);
        assert_eq!(fields.len(), 1);
        let MultipartValue::File(upload) = fields[0].value() else {
            panic!("expected a file part");
        };
        assert_eq!(upload.content_type(), "image/jpeg");
    }
}
