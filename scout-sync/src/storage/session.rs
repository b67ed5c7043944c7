//! Session slots: signed-in user, team selection and team records

use super::{read_json, read_list, team_key, teams_key, write_json, CURRENT_TEAM_KEY, SESSION_USER_KEY};
use crate::model::{SessionUser, Team};
use scout_common::db::KvStore;
use tracing::error;

#[derive(Clone)]
pub struct SessionStore {
    kv: KvStore,
}

impl SessionStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn user(&self) -> Option<SessionUser> {
        read_json(&self.kv, SESSION_USER_KEY).await
    }

    /// Persist the signed-in user, or forget it with `None`
    pub async fn set_user(&self, user: Option<&SessionUser>) -> bool {
        match user {
            Some(user) => write_json(&self.kv, SESSION_USER_KEY, user).await,
            None => self.remove(SESSION_USER_KEY).await,
        }
    }

    pub async fn current_team_id(&self) -> Option<String> {
        read_json::<String>(&self.kv, CURRENT_TEAM_KEY)
            .await
            .filter(|id| !id.is_empty())
    }

    pub async fn set_current_team_id(&self, team_id: Option<&str>) -> bool {
        match team_id {
            Some(id) => write_json(&self.kv, CURRENT_TEAM_KEY, id).await,
            None => self.remove(CURRENT_TEAM_KEY).await,
        }
    }

    pub async fn cached_team(&self, team_id: &str) -> Option<Team> {
        read_json(&self.kv, &team_key(team_id)).await
    }

    pub async fn save_team(&self, team: &Team) -> bool {
        write_json(&self.kv, &team_key(&team.id), team).await
    }

    pub async fn cached_teams(&self, user_id: &str) -> Vec<Team> {
        read_list(&self.kv, &teams_key(user_id)).await
    }

    pub async fn save_teams(&self, user_id: &str, teams: &[Team]) -> bool {
        write_json(&self.kv, &teams_key(user_id), teams).await
    }

    async fn remove(&self, key: &str) -> bool {
        match self.kv.remove(key).await {
            Ok(()) => true,
            Err(e) => {
                error!(key = %key, error = %e, "Failed to clear local slot");
                false
            }
        }
    }
}
