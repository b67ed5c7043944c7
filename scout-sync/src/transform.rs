//! Field transformer and validation
//!
//! Turns the positional values captured by a form (`field_<index>`,
//! `field_<index>_<rowId>`) into the label-keyed record stored by the backend.
//! Dispatch is a closed `match` over [`FieldType`].

use crate::model::{CapturedValues, FieldDescriptor, FieldType};
use serde_json::{json, Map, Number, Value};
use std::fmt;
use tracing::warn;

/// Captured-value key of the field at `index`
pub fn field_key(index: usize) -> String {
    format!("field_{}", index)
}

/// Captured-value key of one matrix row
pub fn matrix_row_key(index: usize, row_id: &str) -> String {
    format!("field_{}_{}", index, row_id)
}

/// Build the label-keyed record for a schema and its captured values
///
/// - headers never produce output
/// - text, select, date and photo values are copied verbatim
/// - numbers are coerced, with anything non-numeric becoming 0
/// - booleans are true only for `true` / `"true"`
/// - matrices become an ordered `{id, label, value}` list, one per row
///
/// A field with no captured value is left out, except that a required number
/// becomes 0 and booleans and matrices always resolve.
pub fn transform_fields(schema: &[FieldDescriptor], captured: &CapturedValues) -> Map<String, Value> {
    let mut out = Map::new();

    for (index, field) in schema.iter().enumerate() {
        let raw = captured_value(captured, &field_key(index));

        let value = match &field.field_type {
            FieldType::Header => None,
            FieldType::Text
            | FieldType::Select
            | FieldType::Date
            | FieldType::Photo
            | FieldType::Image => raw.cloned(),
            FieldType::Number => match raw {
                Some(v) => Some(number_value(coerce_number(v))),
                None if field.required => Some(json!(0)),
                None => None,
            },
            FieldType::Boolean => Some(Value::Bool(is_true(raw))),
            FieldType::Matrix => Some(matrix_value(index, field, captured)),
            FieldType::Other(name) => {
                warn!(
                    field_type = %name,
                    label = %field.label,
                    "Unknown field type, passing captured value through"
                );
                raw.cloned()
            }
        };

        if let Some(value) = value {
            out.insert(field.label.clone(), value);
        }
    }

    out
}

fn captured_value<'a>(captured: &'a CapturedValues, key: &str) -> Option<&'a Value> {
    captured.get(key).filter(|v| !v.is_null())
}

fn is_true(raw: Option<&Value>) -> bool {
    match raw {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

fn matrix_value(index: usize, field: &FieldDescriptor, captured: &CapturedValues) -> Value {
    let rows = field.matrix_rows.as_deref().unwrap_or_default();
    let list = rows
        .iter()
        .map(|row| {
            let value = captured_value(captured, &matrix_row_key(index, &row.id))
                .map(coerce_number)
                .unwrap_or(row.value);
            json!({
                "id": row.id,
                "label": row.label,
                "value": number_value(value),
            })
        })
        .collect();
    Value::Array(list)
}

/// Numeric reading of a captured value, None when it is not a number
///
/// Mirrors the loose coercion form inputs get: trimmed numeric strings, an
/// empty string or null as 0, booleans as 0/1, and `0x`/`0o`/`0b` prefixes.
pub fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_str(s),
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [single] if !single.is_array() && !single.is_object() => parse_number(single),
            _ => None,
        },
        Value::Object(_) => None,
    };
    n.filter(|n| n.is_finite())
}

fn parse_numeric_str(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
        }
    }

    // Rust accepts spellings such as "inf" and "nan" that forms never produce
    if text.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Coerce to a number, substituting 0 for anything non-numeric
pub fn coerce_number(value: &Value) -> f64 {
    parse_number(value).unwrap_or(0.0)
}

/// JSON number, written as an integer when it has no fractional part
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or_else(|| json!(0))
    }
}

/// Why a captured value was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Required,
    NotANumber,
    BelowMin,
    AboveMax,
    NotAnOption,
    TooManyImages,
}

/// One validation failure, addressed by captured-value key
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub field_key: String,
    pub label: String,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_key, self.message)
    }
}

/// Check captured values against the schema; empty means valid
pub fn validate_fields(schema: &[FieldDescriptor], captured: &CapturedValues) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    for (index, field) in schema.iter().enumerate() {
        let key = field_key(index);
        let raw = captured_value(captured, &key);
        let issue = |kind: IssueKind, message: String| FieldIssue {
            field_key: key.clone(),
            label: field.label.clone(),
            kind,
            message,
        };

        if is_blank(raw) {
            if field.required && field.field_type.can_be_required() {
                issues.push(issue(IssueKind::Required, format!("{} is required", field.label)));
            }
            continue;
        }
        let Some(value) = raw else { continue };

        match &field.field_type {
            FieldType::Number => match parse_number(value) {
                None => issues.push(issue(
                    IssueKind::NotANumber,
                    format!("{} must be a valid number", field.label),
                )),
                Some(n) => {
                    if let Some(min) = field.min.filter(|min| n < *min) {
                        issues.push(issue(
                            IssueKind::BelowMin,
                            format!("{} must be at least {}", field.label, display_number(min)),
                        ));
                    } else if let Some(max) = field.max.filter(|max| n > *max) {
                        issues.push(issue(
                            IssueKind::AboveMax,
                            format!("{} must be at most {}", field.label, display_number(max)),
                        ));
                    }
                }
            },
            FieldType::Select => {
                let options = field.options.as_deref().unwrap_or_default();
                let chosen = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                if !options.is_empty() && !options.iter().any(|o| *o == chosen) {
                    issues.push(issue(
                        IssueKind::NotAnOption,
                        format!("{} must be one of the listed options", field.label),
                    ));
                }
            }
            FieldType::Photo | FieldType::Image => {
                let limit = field.extra.get("maxImages").and_then(Value::as_u64);
                if let (Some(limit), Some(images)) = (limit, value.as_array()) {
                    if images.len() as u64 > limit {
                        issues.push(issue(
                            IssueKind::TooManyImages,
                            format!("Maximum {} images allowed", limit),
                        ));
                    }
                }
            }
            FieldType::Text
            | FieldType::Date
            | FieldType::Boolean
            | FieldType::Matrix
            | FieldType::Header
            | FieldType::Other(_) => {}
        }
    }

    issues
}

fn is_blank(raw: Option<&Value>) -> bool {
    match raw {
        None => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn display_number(n: f64) -> String {
    match number_value(n) {
        Value::Number(num) => num.to_string(),
        other => other.to_string(),
    }
}
