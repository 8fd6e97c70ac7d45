//! PostgREST client for the Supabase `notes` table.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;

use super::{GatewayError, GatewayResult, NoteOrder, NotesGateway, RemoteNote};
use crate::auth::parse_api_error;
use crate::auth::SessionWatch;
use crate::config::BackendConfig;
use crate::models::{NoteId, NotePatch};

#[derive(Clone)]
pub struct SupabaseNotesGateway {
    endpoint: String,
    anon_key: String,
    client: Client,
    session: SessionWatch,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    user_id: &'a str,
    title: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct UpdateRow<'a> {
    #[serde(flatten)]
    patch: &'a NotePatch,
    updated_at: String,
}

impl SupabaseNotesGateway {
    /// Requests are signed with the access token of whatever session `session`
    /// carries at call time.
    pub fn new(config: &BackendConfig, session: SessionWatch) -> GatewayResult<Self> {
        Ok(Self {
            endpoint: config.notes_endpoint(),
            anon_key: config.supabase_anon_key.clone(),
            client: Client::builder().build()?,
            session,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> GatewayResult<RequestBuilder> {
        let access_token = self
            .session
            .borrow()
            .session()
            .map(|session| session.access_token.clone())
            .ok_or(GatewayError::Unauthenticated)?;
        Ok(request
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .header("Accept", "application/json"))
    }

    async fn rows(response: Response) -> GatewayResult<Vec<RemoteNote>> {
        let response = Self::check(response).await?;
        Ok(response.json::<Vec<RemoteNote>>().await?)
    }

    async fn check(response: Response) -> GatewayResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Api(parse_api_error(status, &body)))
    }
}

#[async_trait]
impl NotesGateway for SupabaseNotesGateway {
    async fn list(&self, user_id: &str, order: NoteOrder) -> GatewayResult<Vec<RemoteNote>> {
        let request = self.authorized(self.client.get(&self.endpoint).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("order", order.as_query().to_string()),
        ]))?;
        Self::rows(request.send().await?).await
    }

    async fn insert(&self, user_id: &str, title: &str, content: &str) -> GatewayResult<RemoteNote> {
        let row = InsertRow {
            user_id,
            title,
            content,
        };
        let request = self.authorized(
            self.client
                .post(&self.endpoint)
                .header("Prefer", "return=representation")
                .json(&row),
        )?;
        Self::rows(request.send().await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Api("Insert returned no row".to_string()))
    }

    async fn update(
        &self,
        id: &NoteId,
        user_id: &str,
        patch: &NotePatch,
    ) -> GatewayResult<RemoteNote> {
        let row = UpdateRow {
            patch,
            updated_at: Utc::now().to_rfc3339(),
        };
        let request = self.authorized(
            self.client
                .patch(&self.endpoint)
                .query(&[
                    ("id", format!("eq.{id}")),
                    ("user_id", format!("eq.{user_id}")),
                ])
                .header("Prefer", "return=representation")
                .json(&row),
        )?;
        Self::rows(request.send().await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &NoteId, user_id: &str) -> GatewayResult<()> {
        let request = self.authorized(
            self.client
                .delete(&self.endpoint)
                .query(&[
                    ("id", format!("eq.{id}")),
                    ("user_id", format!("eq.{user_id}")),
                ])
                .header("Prefer", "return=representation"),
        )?;
        let deleted = Self::rows(request.send().await?).await?;
        if deleted.is_empty() {
            return Err(GatewayError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::watch;

    use super::*;
    use crate::auth::SessionState;

    fn config() -> BackendConfig {
        BackendConfig::resolve(
            Some("https://demo.supabase.co".into()),
            Some("anon".into()),
            None,
        )
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn calls_without_session_fail_before_network() {
        let (_sender, receiver) = watch::channel(SessionState::Resolved(None));
        let gateway = SupabaseNotesGateway::new(&config(), receiver).unwrap();

        let error = gateway
            .list("user-1", NoteOrder::UpdatedDesc)
            .await
            .unwrap_err();
        assert!(matches!(error, GatewayError::Unauthenticated));
    }

    #[test]
    fn update_body_flattens_patch_fields() {
        let patch = NotePatch::content("<p>x</p>");
        let body = serde_json::to_value(UpdateRow {
            patch: &patch,
            updated_at: "2024-01-01T00:00:00+00:00".to_string(),
        })
        .unwrap();
        assert_eq!(body["content"], "<p>x</p>");
        assert!(body.get("title").is_none());
        assert_eq!(body["updated_at"], "2024-01-01T00:00:00+00:00");
    }
}
