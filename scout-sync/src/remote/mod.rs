//! Backend access
//!
//! [`RemoteStore`] is the seam every component talks to. [`RestRemote`] speaks
//! the PostgREST dialect of the hosted backend.

pub mod rest;

pub use rest::RestRemote;

use crate::model::{
    fields_from_value, CanonicalRecord, FormSchema, NaturalKey, ObservationRecord, Team,
};
use crate::transform::transform_fields;
use async_trait::async_trait;
use scout_common::Variant;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Name given to a schema row that has none
pub const UNTITLED_FORM: &str = "Untitled Form";

/// Backend call errors
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// The backend answered and refused the request
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),
}

impl RemoteError {
    /// Whether the backend itself refused the request
    ///
    /// Rejected records will most likely be refused again on every retry.
    pub fn is_rejection(&self) -> bool {
        matches!(self, RemoteError::Api { status, .. } if (400..500).contains(status))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_decode() {
            RemoteError::Parse(e.to_string())
        } else {
            RemoteError::Network(e.to_string())
        }
    }
}

/// Row sent to `scouting_responses`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseInsert {
    #[serde(rename = "type")]
    pub variant: Variant,
    pub form_schema: Value,
    pub scouting_json: Value,
    /// Empty string when the observation has no event
    pub event_code: String,
    /// Empty string when the observation has no team
    pub team: String,
    pub scouter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_number: Option<i64>,
    pub team_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_location: Option<i64>,
}

impl ResponseInsert {
    /// Build the insert payload for a captured observation
    pub fn from_record(record: &ObservationRecord, scouter: Option<&str>) -> Self {
        let (match_number, team_number, team_location) = record.key_columns();
        Self {
            variant: record.variant(),
            form_schema: record.form_schema_snapshot(),
            scouting_json: Value::Object(transform_fields(&record.schema, &record.data)),
            event_code: record.event_code.clone().unwrap_or_default(),
            team: record.team_id.clone().unwrap_or_default(),
            scouter: scouter.map(str::to_string),
            match_number,
            team_number,
            team_location,
        }
    }

    pub fn natural_key(&self) -> NaturalKey {
        self.to_canonical(false).natural_key()
    }

    /// Canonical shape of this payload, as the backend would store it
    pub fn to_canonical(&self, is_local: bool) -> CanonicalRecord {
        CanonicalRecord {
            id: None,
            variant: self.variant,
            form_schema: self.form_schema.clone(),
            scouting_json: self.scouting_json.clone(),
            event_code: Some(self.event_code.clone()).filter(|c| !c.is_empty()),
            team: Some(self.team.clone()).filter(|t| !t.is_empty()),
            match_number: self.match_number,
            team_number: self.team_number,
            team_location: self.team_location,
            scouter: self.scouter.clone(),
            created_at: None,
            is_local,
            extra: Map::new(),
        }
    }
}

/// Row of `scouting_schedules`; `schedule_json` is the roster document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(rename = "type", default)]
    pub variant: Option<Variant>,
    #[serde(default)]
    pub schedule_json: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Row of `scouting_schemas`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub schema: Value,
    #[serde(default)]
    pub scouting_type: Option<Variant>,
    #[serde(default)]
    pub current: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemaRow {
    /// Decode into a form schema; None when the row carries no field list
    pub fn into_form_schema(self) -> Result<Option<FormSchema>, RemoteError> {
        if self.schema.is_null() {
            return Ok(None);
        }
        let fields = fields_from_value(self.schema).map_err(|e| RemoteError::Parse(e.to_string()))?;
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNTITLED_FORM.to_string());
        Ok(Some(FormSchema { name, schema: fields }))
    }
}

/// Backend operations used by the sync core
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert one observation into `scouting_responses`
    async fn insert_response(&self, row: &ResponseInsert) -> Result<(), RemoteError>;

    /// All responses of one variant for one team
    async fn select_responses(
        &self,
        variant: Variant,
        team_id: &str,
    ) -> Result<Vec<CanonicalRecord>, RemoteError>;

    /// Schedule rows of one variant for one team
    async fn select_schedules(
        &self,
        variant: Variant,
        team_id: &str,
    ) -> Result<Vec<ScheduleRow>, RemoteError>;

    /// The schema row flagged current for a variant, if any
    async fn select_current_schema(&self, variant: Variant) -> Result<Option<SchemaRow>, RemoteError>;

    /// Non-personal team account by id
    async fn select_team(&self, team_id: &str) -> Result<Option<Team>, RemoteError>;

    /// Non-personal team accounts owned by a user
    async fn select_teams_for_user(&self, user_id: &str) -> Result<Vec<Team>, RemoteError>;

    /// Cheap reachability check
    async fn ping(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}
