//! Team lookup and session selection

use crate::connectivity::Connectivity;
use crate::model::{SessionUser, Team};
use crate::remote::RemoteStore;
use crate::storage::SessionStore;
use std::sync::Arc;
use tracing::{info, warn};

pub struct TeamService {
    remote: Arc<dyn RemoteStore>,
    connectivity: Connectivity,
    session: SessionStore,
}

impl TeamService {
    pub fn new(remote: Arc<dyn RemoteStore>, connectivity: Connectivity, session: SessionStore) -> Self {
        Self {
            remote,
            connectivity,
            session,
        }
    }

    /// Team account by id, from the backend when possible
    pub async fn team(&self, team_id: &str) -> Option<Team> {
        if team_id.is_empty() {
            return None;
        }
        if !self.connectivity.is_online() {
            return self.session.cached_team(team_id).await;
        }

        match self.remote.select_team(team_id).await {
            Ok(Some(team)) => {
                self.session.save_team(&team).await;
                Some(team)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(team_id = %team_id, error = %e, "Team fetch failed, using cached team");
                self.session.cached_team(team_id).await
            }
        }
    }

    /// Teams owned by `user_id`, excluding personal accounts
    pub async fn my_teams(&self, user_id: &str) -> Vec<Team> {
        if user_id.is_empty() {
            return Vec::new();
        }
        if !self.connectivity.is_online() {
            return self.session.cached_teams(user_id).await;
        }

        match self.remote.select_teams_for_user(user_id).await {
            Ok(teams) => {
                self.session.save_teams(user_id, &teams).await;
                teams
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Team list fetch failed, using cached list");
                self.session.cached_teams(user_id).await
            }
        }
    }

    pub async fn current_team_id(&self) -> Option<String> {
        self.session.current_team_id().await
    }

    /// Select the team new observations are filed under
    pub async fn set_current_team(&self, team_id: Option<&str>) -> bool {
        info!(team_id = team_id.unwrap_or_default(), "Switching current team");
        self.session.set_current_team_id(team_id).await
    }

    /// The selected team's record, if one is selected and known
    pub async fn current_team(&self) -> Option<Team> {
        let team_id = self.current_team_id().await?;
        self.team(&team_id).await
    }

    pub async fn session_user(&self) -> Option<SessionUser> {
        self.session.user().await
    }

    pub async fn set_session_user(&self, user: Option<&SessionUser>) -> bool {
        self.session.set_user(user).await
    }
}
