//! Observation records and their backend-shaped (canonical) form

use super::field::FieldDescriptor;
use scout_common::Variant;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Raw captured values keyed `field_<index>` / `field_<index>_<rowId>`
pub type CapturedValues = Map<String, Value>;

/// Variant-specific locator of an observation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationTarget {
    /// One seat in one match. Team number 0 means the seat was scouted
    /// without knowing which team occupied it.
    #[serde(rename_all = "camelCase")]
    Match {
        match_number: i64,
        team_number: i64,
        team_location: i64,
    },
    #[serde(rename_all = "camelCase")]
    Pit { team_number: i64 },
}

impl ObservationTarget {
    pub fn variant(&self) -> Variant {
        match self {
            ObservationTarget::Match { .. } => Variant::Match,
            ObservationTarget::Pit { .. } => Variant::Pit,
        }
    }
}

/// One completed scouting form, as captured on the device
///
/// Serialized in the same layout the local queue has always used, so queues
/// written by older builds stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    pub data: CapturedValues,
    pub schema: Vec<FieldDescriptor>,
    pub form_name: String,
    #[serde(default)]
    pub event_code: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    /// User who captured the observation, stamped when it is submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scouter_id: Option<String>,
    #[serde(flatten)]
    pub target: ObservationTarget,
}

impl ObservationRecord {
    pub fn variant(&self) -> Variant {
        self.target.variant()
    }

    pub fn natural_key(&self) -> NaturalKey {
        let team_id = self.team_id.clone().unwrap_or_default();
        match self.target {
            ObservationTarget::Match {
                match_number,
                team_number,
                team_location,
            } => NaturalKey::Match {
                team_id,
                match_number,
                team_number,
                team_location,
            },
            ObservationTarget::Pit { team_number } => NaturalKey::Pit {
                team_id,
                team_number,
            },
        }
    }

    /// Schema snapshot in the shape stored alongside each backend row
    pub fn form_schema_snapshot(&self) -> Value {
        json!({
            "name": self.form_name,
            "schema": { "fields": self.schema },
        })
    }

    /// (match_number, team_number, team_location) as optional columns
    pub fn key_columns(&self) -> (Option<i64>, Option<i64>, Option<i64>) {
        match self.target {
            ObservationTarget::Match {
                match_number,
                team_number,
                team_location,
            } => (Some(match_number), Some(team_number), Some(team_location)),
            ObservationTarget::Pit { team_number } => (None, Some(team_number), None),
        }
    }
}

/// Minimal tuple identifying one observation within a team
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NaturalKey {
    Match {
        team_id: String,
        match_number: i64,
        team_number: i64,
        team_location: i64,
    },
    Pit {
        team_id: String,
        team_number: i64,
    },
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NaturalKey::Match {
                team_id,
                match_number,
                team_number,
                team_location,
            } => write!(f, "{}-{}-{}-{}", team_id, match_number, team_number, team_location),
            NaturalKey::Pit {
                team_id,
                team_number,
            } => write!(f, "{}-{}", team_id, team_number),
        }
    }
}

/// Backend row shape of an observation, also used for the fused view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub variant: Variant,
    #[serde(default)]
    pub form_schema: Value,
    /// Label-keyed transformed values
    #[serde(default)]
    pub scouting_json: Value,
    #[serde(default)]
    pub event_code: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub match_number: Option<i64>,
    #[serde(default)]
    pub team_number: Option<i64>,
    #[serde(default)]
    pub team_location: Option<i64>,
    #[serde(default)]
    pub scouter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// true while the record only exists in the local queue
    #[serde(default)]
    pub is_local: bool,
    /// Backend columns this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanonicalRecord {
    pub fn natural_key(&self) -> NaturalKey {
        let team_id = self.team.clone().unwrap_or_default();
        match self.variant {
            Variant::Match => NaturalKey::Match {
                team_id,
                match_number: self.match_number.unwrap_or_default(),
                team_number: self.team_number.unwrap_or_default(),
                team_location: self.team_location.unwrap_or_default(),
            },
            Variant::Pit => NaturalKey::Pit {
                team_id,
                team_number: self.team_number.unwrap_or_default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pit_record() -> ObservationRecord {
        ObservationRecord {
            data: Map::new(),
            schema: Vec::new(),
            form_name: "Pit".into(),
            event_code: Some("2025casj".into()),
            team_id: Some("team".into()),
            scouter_id: None,
            target: ObservationTarget::Pit { team_number: 293 },
        }
    }

    #[test]
    fn test_queue_layout_is_flat_camel_case() {
        let value = serde_json::to_value(pit_record()).unwrap();
        assert_eq!(value["teamNumber"], 293);
        assert_eq!(value["teamId"], "team");
        assert_eq!(value["formName"], "Pit");
        assert!(value.get("matchNumber").is_none());
    }

    #[test]
    fn test_untagged_target_prefers_match() {
        let value = json!({
            "data": {}, "schema": [], "formName": "Match",
            "eventCode": null, "teamId": "team",
            "matchNumber": 5, "teamNumber": 118, "teamLocation": 1
        });
        let record: ObservationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.variant(), Variant::Match);
        assert_eq!(record.natural_key().to_string(), "team-5-118-1");

        let pit: ObservationRecord =
            serde_json::from_value(serde_json::to_value(pit_record()).unwrap()).unwrap();
        assert_eq!(pit.variant(), Variant::Pit);
    }

    #[test]
    fn test_scouter_id_is_optional_in_queue_layout() {
        let legacy = serde_json::to_value(pit_record()).unwrap();
        assert!(legacy.get("scouterId").is_none());
        let decoded: ObservationRecord = serde_json::from_value(legacy).unwrap();
        assert!(decoded.scouter_id.is_none());

        let mut stamped = pit_record();
        stamped.scouter_id = Some("U1".into());
        let value = serde_json::to_value(&stamped).unwrap();
        assert_eq!(value["scouterId"], "U1");
        let back: ObservationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, stamped);
    }

    #[test]
    fn test_pit_natural_key_display() {
        assert_eq!(pit_record().natural_key().to_string(), "team-293");
    }

    #[test]
    fn test_canonical_key_matches_record_key() {
        let row: CanonicalRecord = serde_json::from_value(json!({
            "id": 7,
            "type": "pit",
            "team": "team",
            "team_number": 293,
            "scouting_json": {},
            "google_sheet_id": null
        }))
        .unwrap();

        assert!(!row.is_local);
        assert!(row.extra.contains_key("google_sheet_id"));
        assert_eq!(row.natural_key(), pit_record().natural_key());
    }
}
