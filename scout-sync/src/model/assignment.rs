//! Scouting work items

use super::record::{CanonicalRecord, ObservationRecord};
use scout_common::{Error, Result, Variant};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Member listed on a pit roster entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scout {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// What has to be scouted
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssignmentLocator {
    /// A seat in a match; `team_number` is None when only the seat is known
    #[serde(rename_all = "camelCase")]
    Match {
        match_number: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        team_number: Option<i64>,
        team_position: i64,
    },
    /// One team's pit, with everyone rostered for it
    #[serde(rename_all = "camelCase")]
    Pit {
        team_number: i64,
        #[serde(default)]
        scouts: Vec<Scout>,
    },
}

/// A work item for one scouter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub scouter_id: String,
    #[serde(flatten)]
    pub locator: AssignmentLocator,
}

impl Assignment {
    pub fn match_seat(
        scouter_id: impl Into<String>,
        match_number: i64,
        team_number: Option<i64>,
        team_position: i64,
    ) -> Self {
        Self {
            scouter_id: scouter_id.into(),
            locator: AssignmentLocator::Match {
                match_number,
                team_number,
                team_position,
            },
        }
    }

    pub fn pit(scouter_id: impl Into<String>, team_number: i64, scouts: Vec<Scout>) -> Self {
        Self {
            scouter_id: scouter_id.into(),
            locator: AssignmentLocator::Pit {
                team_number,
                scouts,
            },
        }
    }

    pub fn variant(&self) -> Variant {
        match self.locator {
            AssignmentLocator::Match { .. } => Variant::Match,
            AssignmentLocator::Pit { .. } => Variant::Pit,
        }
    }

    /// Whether a fused record already covers this work item
    ///
    /// The scouter is ignored: anyone's observation completes the item.
    pub fn is_satisfied_by(&self, record: &CanonicalRecord) -> bool {
        if record.variant != self.variant() {
            return false;
        }
        self.matches_key(record.match_number, record.team_number, record.team_location)
    }

    /// Whether a freshly captured observation covers this work item
    pub fn is_completed_by(&self, record: &ObservationRecord) -> bool {
        let (match_number, team_number, team_location) = record.key_columns();
        record.variant() == self.variant()
            && self.matches_key(match_number, team_number, team_location)
    }

    fn matches_key(
        &self,
        match_number: Option<i64>,
        team_number: Option<i64>,
        team_location: Option<i64>,
    ) -> bool {
        match &self.locator {
            AssignmentLocator::Match {
                match_number: m,
                team_number: t,
                team_position: p,
            } => {
                match_number == Some(*m)
                    && team_location == Some(*p)
                    && t.map_or(true, |t| team_number == Some(t))
            }
            AssignmentLocator::Pit { team_number: t, .. } => team_number == Some(*t),
        }
    }

    /// Route id used to open the capture form for this item
    pub fn route_id(&self) -> String {
        match &self.locator {
            AssignmentLocator::Match {
                match_number,
                team_number,
                team_position,
            } => format!(
                "{}-{}-{}",
                team_number.unwrap_or(0),
                match_number,
                team_position
            ),
            AssignmentLocator::Pit { team_number, .. } => team_number.to_string(),
        }
    }
}

/// Parse a match route id (`<team>-<match>-<position>`) back into a locator
///
/// A team of `0` or an empty team segment means the seat has no fixed team.
pub fn parse_route_id(route_id: &str) -> Result<AssignmentLocator> {
    let parts: Vec<&str> = route_id.split('-').collect();
    if parts.len() != 3 {
        return Err(Error::InvalidInput(format!(
            "Route id '{}' is not <team>-<match>-<position>",
            route_id
        )));
    }

    let number = |text: &str, what: &str| -> Result<i64> {
        text.trim().parse::<i64>().map_err(|_| {
            Error::InvalidInput(format!("Route id '{}' has invalid {}", route_id, what))
        })
    };

    let team_number = match parts[0].trim() {
        "" => None,
        text => Some(number(text, "team number")?).filter(|n| *n != 0),
    };

    Ok(AssignmentLocator::Match {
        match_number: number(parts[1], "match number")?,
        team_number,
        team_position: number(parts[2], "team position")?,
    })
}

/// Alliance colour of a driver station position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alliance {
    Red,
    Blue,
}

impl Alliance {
    /// Positions 1-3 are red; everything above is blue
    pub fn from_position(position: i64) -> Self {
        if position <= 3 {
            Alliance::Red
        } else {
            Alliance::Blue
        }
    }

    /// Label such as `Red 2` or `Blue 1`
    pub fn station_label(position: i64) -> String {
        match Self::from_position(position) {
            Alliance::Red => format!("{} {}", Alliance::Red, position),
            Alliance::Blue => format!("{} {}", Alliance::Blue, position - 3),
        }
    }
}

impl fmt::Display for Alliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alliance::Red => write!(f, "Red"),
            Alliance::Blue => write!(f, "Blue"),
        }
    }
}
