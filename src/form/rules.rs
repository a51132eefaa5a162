use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::domain::{FieldDefinition, FieldKind, FieldSchema};

use super::{error::FieldCoercionError, state::FormValues};

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const NUMBER_MESSAGE: &str = "Only numbers are allowed";
pub const EMAIL_MESSAGE: &str = "Enter a valid email address";
pub const DATE_MESSAGE: &str = "Enter a date as YYYY-MM-DD";
pub const TIME_MESSAGE: &str = "Enter a time as HH:MM";
pub const COLOR_MESSAGE: &str = "Enter a hex color such as #1e90ff";
pub const OPTION_MESSAGE: &str = "Pick one of the listed options";
pub const PATTERN_MESSAGE: &str = "Invalid format";

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("number pattern"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("color pattern"));

/// Run every synchronous rule for one field. Returns the first failure.
pub fn check_field(field: &FieldDefinition, pattern: Option<&Regex>, raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return field.required.then(|| REQUIRED_MESSAGE.to_string());
    }

    if let Some(message) = check_kind(field, value) {
        return Some(message);
    }

    let length = value.chars().count();
    if let Some(min) = field.min_length
        && length < min
    {
        return Some(format!("Must be at least {min} characters"));
    }
    if let Some(max) = field.max_length
        && length > max
    {
        return Some(format!("Must be at most {max} characters"));
    }

    if let Some(pattern) = pattern
        && !pattern.is_match(value)
    {
        return Some(
            field
                .pattern_message
                .clone()
                .unwrap_or_else(|| PATTERN_MESSAGE.to_string()),
        );
    }

    None
}

fn check_kind(field: &FieldDefinition, value: &str) -> Option<String> {
    match &field.kind {
        FieldKind::String => None,
        FieldKind::Number => {
            if !NUMBER_RE.is_match(value) {
                return Some(NUMBER_MESSAGE.to_string());
            }
            let number: f64 = value.parse().ok()?;
            if let Some(min) = field.min
                && number < min
            {
                return Some(format!("Must be at least {min}"));
            }
            if let Some(max) = field.max
                && number > max
            {
                return Some(format!("Must be at most {max}"));
            }
            None
        }
        FieldKind::Email => (!EMAIL_RE.is_match(value)).then(|| EMAIL_MESSAGE.to_string()),
        FieldKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .is_err()
            .then(|| DATE_MESSAGE.to_string()),
        FieldKind::Time => {
            let parsed = NaiveTime::parse_from_str(value, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"));
            parsed.is_err().then(|| TIME_MESSAGE.to_string())
        }
        FieldKind::Select { options } | FieldKind::SearchSelect { options } => {
            let known = options.iter().any(|option| option.value_text() == value);
            (!known).then(|| OPTION_MESSAGE.to_string())
        }
        FieldKind::Color => (!COLOR_RE.is_match(value)).then(|| COLOR_MESSAGE.to_string()),
    }
}

/// Check every schema field against `values`, missing values count as empty.
pub fn validate_values(schema: &FieldSchema, values: &FormValues) -> IndexMap<String, String> {
    schema
        .fields()
        .filter_map(|field| {
            let raw = values.get(&field.name).map(String::as_str).unwrap_or("");
            check_field(field, schema.pattern(&field.name), raw)
                .map(|message| (field.name.clone(), message))
        })
        .collect()
}

/// Convert editing text into the JSON value handed to the mutation.
pub fn coerce_value(field: &FieldDefinition, raw: &str) -> Result<Value, FieldCoercionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    match &field.kind {
        FieldKind::String => Ok(Value::String(raw.to_string())),
        FieldKind::Number => parse_number(trimmed).ok_or_else(|| FieldCoercionError {
            field: field.name.clone(),
            message: NUMBER_MESSAGE.to_string(),
        }),
        FieldKind::Select { options } | FieldKind::SearchSelect { options } => options
            .iter()
            .find(|option| option.value_text() == trimmed)
            .map(|option| option.value.clone())
            .ok_or_else(|| FieldCoercionError {
                field: field.name.clone(),
                message: OPTION_MESSAGE.to_string(),
            }),
        FieldKind::Email | FieldKind::Date | FieldKind::Time | FieldKind::Color => {
            Ok(Value::String(trimmed.to_string()))
        }
    }
}

/// Coerce every schema field into a submit payload.
pub fn coerce_values(
    schema: &FieldSchema,
    values: &FormValues,
) -> Result<Map<String, Value>, FieldCoercionError> {
    let mut payload = Map::new();
    for field in schema.fields() {
        let raw = values.get(&field.name).map(String::as_str).unwrap_or("");
        payload.insert(field.name.clone(), coerce_value(field, raw)?);
    }
    Ok(payload)
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
