//! Team (organization) and session identity

use serde::{Deserialize, Serialize};

/// Team account a user scouts for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    /// Event code new observations are tagged with
    #[serde(default)]
    pub current_event: Option<String>,
    #[serde(default)]
    pub primary_owner_user_id: Option<String>,
    #[serde(default)]
    pub is_personal_account: bool,
}

/// Signed-in user snapshot persisted for offline use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}
