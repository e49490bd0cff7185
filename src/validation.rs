//! Structural validation of calculation requests
//!
//! Each operation declares a [`Schema`]: its properties in order, which of them
//! are required, and the shape each must have. [`validate`] reports the first
//! violation as data; missing fields are reported before type errors. The
//! sign-mix rule for IRR/MIRR is a separate domain check run afterwards.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CalcError, CalcResult};

/// Format accepted for date strings
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of a zero-padded `YYYY-MM-DD` date
const DATE_LEN: usize = 10;

/// Minimum length of any cash-flow `values` array
pub const MIN_CASH_FLOWS: usize = 2;

/// Message tail for the IRR/MIRR sign-mix check
pub const SIGN_MIX_MESSAGE: &str = "requires at least one positive and one negative value";

/// Expected shape of a single request property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A numeric scalar
    Number,
    /// The payment timing flag, 0 or 1
    Timing,
    /// An array of numbers with a minimum length
    Numbers { min_items: usize },
    /// An array of `YYYY-MM-DD` strings
    Dates,
}

impl FieldKind {
    fn type_name(self) -> &'static str {
        match self {
            FieldKind::Number | FieldKind::Timing => "number",
            FieldKind::Numbers { .. } | FieldKind::Dates => "array",
        }
    }
}

/// A declared request property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Default applied when an optional field is omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind, default: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: Some(default),
        }
    }
}

/// Declared properties of one operation's request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub properties: &'static [Field],
}

impl Schema {
    pub fn required(&self) -> impl Iterator<Item = &Field> + '_ {
        self.properties.iter().filter(|field| field.required)
    }

    pub fn optional(&self) -> impl Iterator<Item = &Field> + '_ {
        self.properties.iter().filter(|field| !field.required)
    }
}

/// Result of structural validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error_message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_message: Some(message.into()),
        }
    }

    pub fn into_result(self) -> CalcResult<()> {
        match self.error_message {
            Some(message) if !self.valid => Err(CalcError::Validation(message)),
            _ => Ok(()),
        }
    }
}

/// Check `request` against `schema`, reporting the first violation found
pub fn validate(request: &Value, schema: &Schema) -> ValidationOutcome {
    let object = match request.as_object() {
        Some(object) => object,
        None => return ValidationOutcome::invalid(type_error(request, "object")),
    };

    if let Some(missing) = schema.required().find(|field| !object.contains_key(field.name)) {
        return ValidationOutcome::invalid(format!("'{}' is a required property", missing.name));
    }

    for field in schema.properties {
        if let Some(value) = object.get(field.name) {
            if let Err(message) = check_field(field.kind, value) {
                return ValidationOutcome::invalid(message);
            }
        }
    }

    ValidationOutcome::valid()
}

fn check_field(kind: FieldKind, value: &Value) -> Result<(), String> {
    match kind {
        FieldKind::Number => {
            if !value.is_number() {
                return Err(type_error(value, kind.type_name()));
            }
        }
        FieldKind::Timing => {
            let number = value.as_f64().ok_or_else(|| type_error(value, kind.type_name()))?;
            if number != 0.0 && number != 1.0 {
                return Err(format!("{} is not one of [0, 1]", render(value)));
            }
        }
        FieldKind::Numbers { min_items } => {
            let items = value.as_array().ok_or_else(|| type_error(value, kind.type_name()))?;
            if let Some(bad) = items.iter().find(|item| !item.is_number()) {
                return Err(type_error(bad, "number"));
            }
            if items.len() < min_items {
                return Err(format!("{} is too short", render(value)));
            }
        }
        FieldKind::Dates => {
            let items = value.as_array().ok_or_else(|| type_error(value, kind.type_name()))?;
            for item in items {
                let text = item.as_str().ok_or_else(|| type_error(item, "string"))?;
                if parse_date(text).is_none() {
                    return Err(format!("'{}' is not a 'date'", text));
                }
            }
        }
    }
    Ok(())
}

/// Parse a zero-padded `YYYY-MM-DD` date; chrono alone also takes `2016-1-1`
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if text.len() != DATE_LEN {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

fn type_error(value: &Value, expected: &str) -> String {
    format!("{} is not of type '{}'", render(value), expected)
}

/// Render a value for error messages, strings in single quotes
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => format!("'{}'", text),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(render).collect();
            format!("[{}]", inner.join(", "))
        }
        other => other.to_string(),
    }
}

/// IRR and MIRR need at least one value above zero and one at or below it
pub fn require_mixed_signs(label: &str, values: &[f64]) -> CalcResult<()> {
    let has_positive = values.iter().any(|&v| v > 0.0);
    let has_non_positive = values.iter().any(|&v| v <= 0.0);

    if has_positive && has_non_positive {
        Ok(())
    } else {
        Err(CalcError::DomainPrecondition(format!("{} {}", label, SIGN_MIX_MESSAGE)))
    }
}
