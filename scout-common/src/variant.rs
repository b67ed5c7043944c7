//! Observation variant tag
//!
//! Every stored slot, remote filter and event is scoped to one of the two
//! observation kinds. The wire form is the lowercase name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of scouting observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Per-match observation of one robot/seat
    Match,
    /// Pit interview of one team
    Pit,
}

impl Variant {
    /// Both variants, in display order
    pub const ALL: [Variant; 2] = [Variant::Match, Variant::Pit];

    /// Wire/storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Match => "match",
            Variant::Pit => "pit",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "match" => Ok(Variant::Match),
            "pit" => Ok(Variant::Pit),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown scouting variant: {}",
                other
            ))),
        }
    }
}
