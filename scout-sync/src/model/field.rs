//! Form schema types
//!
//! A schema is an ordered list of field descriptors. Captured values are keyed
//! by position (`field_<index>`), the transformed record by label.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Field type tag
///
/// The set is closed; anything else a schema editor produces lands in
/// `Other` and is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Select,
    Boolean,
    Matrix,
    /// Photo capture, spelled `photo` by the type definitions
    Photo,
    /// Photo capture, spelled `image` by the form renderer
    Image,
    /// Section heading; never produces a value
    Header,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Select => "select",
            FieldType::Boolean => "boolean",
            FieldType::Matrix => "matrix",
            FieldType::Photo => "photo",
            FieldType::Image => "image",
            FieldType::Header => "header",
            FieldType::Other(name) => name,
        }
    }

    /// Whether a `required` flag on this type is enforced
    ///
    /// Booleans and matrices always resolve to a value; headers never do.
    pub fn can_be_required(&self) -> bool {
        !matches!(self, FieldType::Boolean | FieldType::Matrix | FieldType::Header)
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "text" => FieldType::Text,
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "select" => FieldType::Select,
            "boolean" => FieldType::Boolean,
            "matrix" => FieldType::Matrix,
            "photo" => FieldType::Photo,
            "image" => FieldType::Image,
            "header" => FieldType::Header,
            _ => FieldType::Other(name),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// One row of a matrix (counter grid) field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub id: String,
    pub label: String,
    /// Default count used when nothing was captured for the row
    #[serde(default)]
    pub value: f64,
}

/// Static schema unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Display label, doubling as the key in the transformed record
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_rows: Option<Vec<MatrixRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<f64>,
    /// Keys this crate does not interpret, kept so snapshots round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDescriptor {
    /// Minimal descriptor of the given type
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            field_type,
            label: label.into(),
            required: false,
            placeholder: None,
            options: None,
            min: None,
            max: None,
            matrix_rows: None,
            max_rating: None,
            extra: Map::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_rows(mut self, rows: Vec<MatrixRow>) -> Self {
        self.matrix_rows = Some(rows);
        self
    }
}

/// Active form: display name plus ordered fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub name: String,
    #[serde(deserialize_with = "deserialize_fields")]
    pub schema: Vec<FieldDescriptor>,
}

impl FormSchema {
    /// Labels that appear more than once
    ///
    /// Labels are storage keys, so duplicates silently overwrite each other.
    pub fn duplicate_labels(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut dupes = Vec::new();
        for field in &self.schema {
            if field.field_type == FieldType::Header {
                continue;
            }
            if !seen.insert(field.label.as_str()) && !dupes.contains(&field.label) {
                dupes.push(field.label.clone());
            }
        }
        dupes
    }
}

/// Decode a field list stored either as a bare array or as `{ "fields": [...] }`
pub fn fields_from_value(value: Value) -> Result<Vec<FieldDescriptor>, serde_json::Error> {
    match value {
        Value::Object(mut map) if map.contains_key("fields") => {
            let fields = map.remove("fields").unwrap_or(Value::Null);
            serde_json::from_value(fields)
        }
        other => serde_json::from_value(other),
    }
}

fn deserialize_fields<'de, D>(deserializer: D) -> Result<Vec<FieldDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    fields_from_value(value).map_err(serde::de::Error::custom)
}
