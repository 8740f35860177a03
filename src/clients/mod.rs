use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::BackendConfig;
use crate::error::{AppError, AppResult};
use crate::models::entity::Entity;
use crate::models::event::RawActivity;
use crate::models::identity::Identity;
use crate::models::record::{LeadScore, RawAppointment, RawMatch, RawTask};

/// Read contracts of the upstream collaborators. The aggregation only ever
/// consumes these; it never writes back.
#[async_trait]
pub trait CrmBackend: Send + Sync {
    async fn get_entity(&self, entity_id: &str) -> AppResult<Entity>;
    async fn list_tasks(&self, entity_id: &str) -> AppResult<Vec<RawTask>>;
    async fn list_appointments(&self, entity_id: &str) -> AppResult<Vec<RawAppointment>>;
    /// `Ok(None)` means the scoring engine has no score for this entity,
    /// which is distinct from the source failing.
    async fn get_lead_score(&self, entity_id: &str) -> AppResult<Option<LeadScore>>;
    async fn get_matches(&self, entity_id: &str, limit: u32) -> AppResult<Vec<RawMatch>>;
    async fn list_activities(&self, entity_id: &str) -> AppResult<Vec<RawActivity>>;
    async fn resolve_identities(&self, ids: &[String]) -> AppResult<HashMap<String, Identity>>;
}

/// REST implementation of [`CrmBackend`] against the dashboard backend.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityPayload {
    display_name: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| AppError::other(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let correlation_id = Uuid::new_v4().to_string();
        let url = format!("{}{}", self.base_url, path);

        debug!(target: "app::backend", correlation_id = %correlation_id, path, "GET");

        let response = self
            .client
            .get(&url)
            .header("x-correlation-id", &correlation_id)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::not_found());
        }
        if !status.is_success() {
            warn!(
                target: "app::backend",
                correlation_id = %correlation_id,
                status = status.as_u16(),
                path,
                "upstream returned non-success status"
            );
            return Err(AppError::upstream(status.as_u16(), format!("GET {path}")));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CrmBackend for HttpBackend {
    async fn get_entity(&self, entity_id: &str) -> AppResult<Entity> {
        self.get_json(&format!("/api/contacts/{entity_id}")).await
    }

    async fn list_tasks(&self, entity_id: &str) -> AppResult<Vec<RawTask>> {
        self.get_json(&format!("/api/tasks?contactId={entity_id}"))
            .await
    }

    async fn list_appointments(&self, entity_id: &str) -> AppResult<Vec<RawAppointment>> {
        self.get_json(&format!("/api/appointments?contactId={entity_id}"))
            .await
    }

    async fn get_lead_score(&self, entity_id: &str) -> AppResult<Option<LeadScore>> {
        match self
            .get_json::<LeadScore>(&format!("/api/scoring/{entity_id}"))
            .await
        {
            Ok(score) => Ok(Some(score)),
            Err(AppError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn get_matches(&self, entity_id: &str, limit: u32) -> AppResult<Vec<RawMatch>> {
        self.get_json(&format!("/api/matching/{entity_id}?limit={limit}"))
            .await
    }

    async fn list_activities(&self, entity_id: &str) -> AppResult<Vec<RawActivity>> {
        self.get_json(&format!("/api/activities?contactId={entity_id}"))
            .await
    }

    async fn resolve_identities(&self, ids: &[String]) -> AppResult<HashMap<String, Identity>> {
        let correlation_id = Uuid::new_v4().to_string();
        let url = format!("{}/api/users/batch", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-correlation-id", &correlation_id)
            .json(&json!({ "ids": ids }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(
                status.as_u16(),
                "POST /api/users/batch".to_string(),
            ));
        }

        let payload = response.json::<HashMap<String, IdentityPayload>>().await?;
        Ok(payload
            .into_iter()
            .map(|(id, identity)| {
                (
                    id.clone(),
                    Identity {
                        id,
                        display_name: identity.display_name,
                        avatar_url: identity.avatar_url,
                    },
                )
            })
            .collect())
    }
}
