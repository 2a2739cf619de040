//! Field declarations, draft values and input normalisation.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use crate::domain::api::Upload;
use crate::domain::identifiers::{format_aadhaar_input, format_phone_input};

/// How a field's raw input is normalised and validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Password,
    /// Twelve digits, displayed in groups of four.
    Aadhaar,
    /// Ten bare digits.
    Phone,
    /// Decimal that may not go below zero.
    NonNegativeNumber,
    /// Whole number that may not go below zero.
    NonNegativeInteger,
    /// Any finite decimal, for coordinates.
    Decimal,
    /// `YYYY-MM-DD`.
    Date,
    /// `YYYY-MM-DDTHH:MM`, as a local date-time picker produces.
    DateTimeLocal,
    /// One of a fixed set of options.
    Choice(&'static [&'static str]),
    /// Image upload.
    Photo,
}

/// Declaration of one form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    required: bool,
    default: Option<&'static str>,
}

impl FieldSpec {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            default: None,
        }
    }

    /// Value placed in a fresh draft.
    #[must_use]
    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn label(&self) -> &'static str {
        self.label
    }

    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    pub const fn is_required(&self) -> bool {
        self.required
    }

    pub const fn default_value(&self) -> Option<&'static str> {
        self.default
    }

    /// Normalise raw input into a draft value.
    ///
    /// Identifier fields are reformatted as typed. Numeric fields reject
    /// input that is not a number or is negative, in which case the caller
    /// keeps the previous value.
    pub fn normalize(&self, raw: &str) -> Result<FieldValue, InputError> {
        let trimmed = raw.trim();
        match self.kind {
            FieldKind::Aadhaar => Ok(FieldValue::Text(format_aadhaar_input(raw))),
            FieldKind::Phone => Ok(FieldValue::Text(format_phone_input(raw))),
            FieldKind::NonNegativeNumber | FieldKind::Decimal if trimmed.is_empty() => {
                Ok(FieldValue::Text(String::new()))
            }
            FieldKind::NonNegativeNumber | FieldKind::Decimal => {
                let number = trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| self.reject(format!("{} must be a number", self.label)))?;
                if self.kind == FieldKind::NonNegativeNumber && number < 0.0 {
                    return Err(self.reject(format!("{} cannot be negative", self.label)));
                }
                // Adding zero folds -0 into 0.
                Ok(FieldValue::Number(number + 0.0))
            }
            FieldKind::NonNegativeInteger if trimmed.is_empty() => {
                Ok(FieldValue::Text(String::new()))
            }
            FieldKind::NonNegativeInteger => {
                let number = trimmed.parse::<i64>().map_err(|_| {
                    self.reject(format!("{} must be a whole number", self.label))
                })?;
                if number < 0 {
                    return Err(self.reject(format!("{} cannot be negative", self.label)));
                }
                Ok(FieldValue::Integer(number))
            }
            FieldKind::Choice(options) => {
                if trimmed.is_empty() || options.contains(&trimmed) {
                    Ok(FieldValue::Text(trimmed.to_owned()))
                } else {
                    Err(self.reject(format!(
                        "Please select a valid {} ({})",
                        self.label.to_lowercase(),
                        options.join(", ")
                    )))
                }
            }
            FieldKind::Photo => Err(InputError::ExpectsFile {
                field: self.name.to_owned(),
            }),
            FieldKind::Text
            | FieldKind::Email
            | FieldKind::Password
            | FieldKind::Date
            | FieldKind::DateTimeLocal => Ok(FieldValue::Text(raw.to_owned())),
        }
    }

    fn reject(&self, message: String) -> InputError {
        InputError::Rejected {
            field: self.name.to_owned(),
            message,
        }
    }
}

/// Ordered field declarations for one form (or one role of a form).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Whether the form carries a file, which forces multipart encoding.
    pub fn has_file_field(&self) -> bool {
        self.fields.iter().any(|spec| spec.kind == FieldKind::Photo)
    }
}

/// A draft value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Integer(i64),
    File(Upload),
}

impl FieldValue {
    /// Blank text counts as "not filled in".
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    /// Text form used in multipart bodies; `None` for files.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Number(number) => Some(number.to_string()),
            Self::Integer(number) => Some(number.to_string()),
            Self::File(_) => None,
        }
    }

    /// JSON form used in JSON bodies. Files have no JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(number) => Number::from_f64(*number).map_or(Value::Null, Value::Number),
            Self::Integer(number) => Value::Number((*number).into()),
            Self::File(_) => Value::Null,
        }
    }
}

/// In-progress values for a form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDraft {
    values: BTreeMap<String, FieldValue>,
}

impl FormDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh draft holding `schema`'s defaults.
    pub fn from_schema(schema: &FormSchema) -> Self {
        let mut draft = Self::new();
        draft.apply_defaults(schema);
        draft
    }

    /// Insert defaults for fields that have no value yet.
    pub fn apply_defaults(&mut self, schema: &FormSchema) {
        for spec in schema.fields() {
            if self.values.contains_key(spec.name()) {
                continue;
            }
            if let Some(value) = spec.default_value().and_then(|d| spec.normalize(d).ok()) {
                self.values.insert(spec.name().to_owned(), value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text form of a value; empty when unset or a file.
    pub fn text(&self, name: &str) -> String {
        self.values
            .get(name)
            .and_then(FieldValue::to_text)
            .unwrap_or_default()
    }

    /// Whether `name` is unset or blank.
    pub fn is_blank(&self, name: &str) -> bool {
        self.values.get(name).is_none_or(FieldValue::is_blank)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Rejected field input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },
    /// Input was refused; the previous value is kept.
    #[error("{message}")]
    Rejected { field: String, message: String },
    #[error("field '{field}' expects a file")]
    ExpectsFile { field: String },
    #[error("field '{field}' does not accept files")]
    NotAFileField { field: String },
}
