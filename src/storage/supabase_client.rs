// src/storage/supabase_client.rs
//! Hosted user store client.
//!
//! Talks to a Supabase (PostgREST) endpoint over HTTPS to upsert Telegram
//! users by `id` and read back the stored row.
//!
//! # Security Considerations
//! - The service key is sent as both `apikey` and bearer token; it is never logged
//! - Only identities produced by a verified payload reach this client

use crate::config::Settings;
use crate::error::{AuthError, StoreError};
use crate::models::telegram_user::{TelegramUser, TelegramUserRow, TelegramUserUpsert};
use crate::utils::serialization::{deserialize, serialize};
use chrono::{SecondsFormat, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::fmt;

/// Asks PostgREST to merge on conflict and echo the stored row.
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";
/// Requests a single object instead of a one-element array.
const ACCEPT_SINGLE: &str = "application/vnd.pgrst.object+json";

/// Error body shape returned by PostgREST.
#[derive(Deserialize)]
struct StoreErrorBody {
    message: Option<String>,
}

/// Cloneable store handle; clones share one connection pool.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseClient {
    /// Creates a client for `table` at `base_url`.
    ///
    /// # Arguments
    /// * `base_url` - Project URL, with or without trailing slash
    /// * `api_key` - Service key
    /// * `table` - Target table name
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Self {
        SupabaseClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
        }
    }

    /// Builds a client from settings.
    ///
    /// # Errors
    /// `ConfigurationMissing` if the URL or key is not provisioned.
    pub fn from_settings(settings: &Settings) -> Result<Self, AuthError> {
        let (url, key) = settings.supabase()?;
        Ok(Self::new(url, key, &settings.supabase_table))
    }

    fn upsert_url(&self) -> String {
        format!("{}/rest/v1/{}?on_conflict=id", self.base_url, self.table)
    }

    /// Inserts or updates `user` keyed by `id`, stamping `updated_at` with
    /// the current UTC time, and returns the stored row.
    ///
    /// # Errors
    /// - `Transport` if the request cannot be sent or read
    /// - `Rejected` for non-2xx responses, carrying the store's message
    /// - `Decode` if the response is not a user row
    pub async fn upsert_user(&self, user: &TelegramUser) -> Result<TelegramUserRow, StoreError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let body = serialize(&TelegramUserUpsert::new(user, now))
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let response = self
            .http
            .post(self.upsert_url())
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("Prefer", PREFER_UPSERT)
            .header(ACCEPT, ACCEPT_SINGLE)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = deserialize::<StoreErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("store responded with status {}", status.as_u16()));
            log::warn!("upsert of user {} rejected with {}", user.id, status);
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let row: TelegramUserRow =
            deserialize(&text).map_err(|e| StoreError::Decode(e.to_string()))?;
        log::info!("synced user {}", row.id);
        Ok(row)
    }
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, Matcher};
    use serde_json::json;

    fn ann() -> TelegramUser {
        TelegramUser {
            id: 42,
            first_name: Some("Ann".into()),
            last_name: None,
            username: Some("ann".into()),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_user_sends_postgrest_request() {
        let stored = json!({
            "id": 42,
            "first_name": "Ann",
            "last_name": null,
            "username": "ann",
            "photo_url": null,
            "created_at": "2024-01-01T00:00:00+00:00",
            "updated_at": "2024-05-01T10:00:00+00:00"
        });
        let _m = mock("POST", "/rest/v1/telegram_users")
            .match_query(Matcher::UrlEncoded("on_conflict".into(), "id".into()))
            .match_header("apikey", "service-key")
            .match_header("authorization", "Bearer service-key")
            .match_header("prefer", PREFER_UPSERT)
            .match_header("accept", ACCEPT_SINGLE)
            .match_body(Matcher::PartialJson(json!({
                "id": 42,
                "first_name": "Ann",
                "last_name": null,
                "username": "ann",
                "photo_url": null
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(stored.to_string())
            .create();

        let client = SupabaseClient::new(
            &format!("{}/", mockito::server_url()),
            "service-key",
            "telegram_users",
        );
        let row = client.upsert_user(&ann()).await.unwrap();

        assert_eq!(row.id, 42);
        assert_eq!(row.username.as_deref(), Some("ann"));
        assert_eq!(row.created_at.as_deref(), Some("2024-01-01T00:00:00+00:00"));
        _m.assert();
    }

    #[tokio::test]
    async fn test_upsert_user_surfaces_store_message() {
        let _m = mock("POST", "/rest/v1/rejecting_users")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"42501","message":"permission denied for table"}"#)
            .create();

        let client = SupabaseClient::new(&mockito::server_url(), "anon", "rejecting_users");
        match client.upsert_user(&ann()).await {
            Err(StoreError::Rejected { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "permission denied for table");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upsert_user_rejects_unexpected_body() {
        let _m = mock("POST", "/rest/v1/odd_users")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create();

        let client = SupabaseClient::new(&mockito::server_url(), "k", "odd_users");
        assert!(matches!(
            client.upsert_user(&ann()).await,
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn test_from_settings_requires_credentials() {
        let settings = Settings::from_source(Some(Default::default())).unwrap();
        assert_eq!(
            SupabaseClient::from_settings(&settings).unwrap_err(),
            AuthError::ConfigurationMissing("SUPABASE_URL")
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let client = SupabaseClient::new("https://db.example/", "service-key", "t");
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("service-key"));
        assert!(rendered.contains("https://db.example"));
    }
}
