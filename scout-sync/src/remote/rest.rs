//! REST client for the hosted backend (PostgREST dialect)

use super::{RemoteError, RemoteStore, ResponseInsert, ScheduleRow, SchemaRow};
use crate::model::{CanonicalRecord, Team};
use async_trait::async_trait;
use scout_common::config::TomlConfig;
use scout_common::Variant;
use serde::de::DeserializeOwned;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("scout-sync/", env!("CARGO_PKG_VERSION"));
const REST_PATH: &str = "rest/v1";

/// Columns forming the natural key of a response row, per variant
fn conflict_columns(variant: Variant) -> &'static str {
    match variant {
        Variant::Match => "team,type,match_number,team_number,team_location",
        Variant::Pit => "team,type,team_number",
    }
}

/// Backend client over HTTP
pub struct RestRemote {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Signed-in user's token; requests fall back to the API key without one
    access_token: RwLock<Option<String>>,
    idempotent_inserts: bool,
}

impl RestRemote {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        idempotent_inserts: bool,
    ) -> Result<Self, RemoteError> {
        if base_url.trim().is_empty() {
            return Err(RemoteError::NotConfigured("backend URL is empty".to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: RwLock::new(None),
            idempotent_inserts,
        })
    }

    /// Build from bootstrap config; fails when no backend URL is set
    pub fn from_config(config: &TomlConfig) -> Result<Self, RemoteError> {
        let base_url = config
            .backend_url
            .as_deref()
            .ok_or_else(|| RemoteError::NotConfigured("backend_url is not set".to_string()))?;
        Self::new(
            base_url,
            config.api_key.as_deref().unwrap_or_default(),
            config.request_timeout(),
            config.idempotent_inserts,
        )
    }

    /// Use a user session token for subsequent requests
    pub fn set_access_token(&self, token: Option<String>) {
        let mut guard = self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = token;
    }

    fn bearer(&self) -> String {
        let guard = self
            .access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone().unwrap_or_else(|| self.api_key.clone())
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    /// GET a table with `column=eq.value` filters
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        limit: Option<usize>,
    ) -> Result<Vec<T>, RemoteError> {
        let mut query: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        query.extend(
            filters
                .iter()
                .map(|(column, value)| (column.to_string(), format!("eq.{}", value))),
        );
        if let Some(limit) = limit {
            query.push(("limit".to_string(), limit.to_string()));
        }

        debug!(table = table, filters = filters.len(), "Backend select");

        let response = self
            .request(reqwest::Method::GET, &self.table_url(table))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }
}

#[async_trait]
impl RemoteStore for RestRemote {
    async fn insert_response(&self, row: &ResponseInsert) -> Result<(), RemoteError> {
        let mut request = self.request(reqwest::Method::POST, &self.table_url("scouting_responses"));

        if self.idempotent_inserts {
            request = request
                .query(&[("on_conflict", conflict_columns(row.variant))])
                .header("Prefer", "resolution=ignore-duplicates,return=minimal");
        } else {
            request = request.header("Prefer", "return=minimal");
        }

        debug!(
            variant = %row.variant,
            natural_key = %row.natural_key(),
            "Backend insert"
        );

        let response = request.json(row).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn select_responses(
        &self,
        variant: Variant,
        team_id: &str,
    ) -> Result<Vec<CanonicalRecord>, RemoteError> {
        self.select(
            "scouting_responses",
            &[("type", variant.to_string()), ("team", team_id.to_string())],
            None,
        )
        .await
    }

    async fn select_schedules(
        &self,
        variant: Variant,
        team_id: &str,
    ) -> Result<Vec<ScheduleRow>, RemoteError> {
        self.select(
            "scouting_schedules",
            &[("team", team_id.to_string()), ("type", variant.to_string())],
            None,
        )
        .await
    }

    async fn select_current_schema(&self, variant: Variant) -> Result<Option<SchemaRow>, RemoteError> {
        let rows: Vec<SchemaRow> = self
            .select(
                "scouting_schemas",
                &[("scouting_type", variant.to_string()), ("current", "true".to_string())],
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn select_team(&self, team_id: &str) -> Result<Option<Team>, RemoteError> {
        let rows: Vec<Team> = self
            .select(
                "accounts",
                &[("id", team_id.to_string()), ("is_personal_account", "false".to_string())],
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn select_teams_for_user(&self, user_id: &str) -> Result<Vec<Team>, RemoteError> {
        self.select(
            "accounts",
            &[
                ("primary_owner_user_id", user_id.to_string()),
                ("is_personal_account", "false".to_string()),
            ],
            None,
        )
        .await
    }

    /// Any HTTP answer counts as reachable; only transport failures do not
    async fn ping(&self) -> Result<(), RemoteError> {
        let url = format!("{}/{}/", self.base_url, REST_PATH);
        self.request(reqwest::Method::HEAD, &url).send().await?;
        Ok(())
    }
}
