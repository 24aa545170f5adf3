// src/services/api_server.rs
//! API Server for Telegram user synchronization
//!
//! Exposes a single resource that a Telegram Mini App calls on launch with
//! its signed `initData`. The server authenticates the payload, decodes the
//! user and upserts it into the hosted store.
//!
//! ## Endpoints
//! - `GET  /api/telegram/sync?initData=...` (or `init_data`)
//! - `POST /api/telegram/sync` with a JSON or form body carrying
//!   `initData` / `init_data`
//!
//! Every response is JSON: `{"ok": true, "user": {...}}` on success,
//! `{"ok": false, "error": "..."}` otherwise.

use crate::config::Settings;
use crate::error::{AuthError, SyncError};
use crate::models::telegram_user::TelegramUserRow;
use crate::services::verifier::InitDataVerifier;
use crate::storage::supabase_client::SupabaseClient;
use crate::utils::serialization::{first_form_value, first_json_string};
use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// Route serving both sync methods.
pub const SYNC_PATH: &str = "/api/telegram/sync";

/// Accepted names for the payload field, in lookup order.
const INIT_DATA_FIELDS: &[&str] = &["initData", "init_data"];

/// Response for a successful sync
#[derive(Serialize)]
struct SyncResponse {
    ok: bool,
    user: TelegramUserRow,
}

/// Response for a failed sync
#[derive(Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("sync failed: {}", self);
        } else {
            log::info!("sync refused: {}", self);
        }
        let body = ErrorResponse {
            ok: false,
            error: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// API server state.
///
/// Missing configuration is kept as the error it produced so the server can
/// still start and answer each request with the name of the absent setting.
#[derive(Clone)]
pub struct ApiServer {
    /// Verifier bound to the bot token
    verifier: Result<Arc<InitDataVerifier>, AuthError>,

    /// Hosted user store
    store: Result<SupabaseClient, AuthError>,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `verifier` - Init-data verifier, or why it could not be built
    /// * `store` - User store client, or why it could not be built
    pub fn new(
        verifier: Result<InitDataVerifier, AuthError>,
        store: Result<SupabaseClient, AuthError>,
    ) -> Self {
        ApiServer {
            verifier: verifier.map(Arc::new),
            store,
        }
    }

    /// Wires the server from loaded settings, logging what is not configured.
    pub fn from_settings(settings: &Settings) -> Self {
        let verifier = settings.bot_token().and_then(InitDataVerifier::new);
        let store = SupabaseClient::from_settings(settings);

        for missing in [verifier.as_ref().err(), store.as_ref().err()].into_iter().flatten() {
            log::warn!("{}", missing);
        }

        Self::new(verifier, store)
    }

    /// Builds the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE]);

        Router::new()
            .route(
                SYNC_PATH,
                get(Self::sync_get_handler).post(Self::sync_post_handler),
            )
            .layer(ServiceBuilder::new().layer(cors))
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        log::info!("API server running at http://{}", addr);
        log::info!("- GET  {}", SYNC_PATH);
        log::info!("- POST {}", SYNC_PATH);

        axum::serve(listener, app).await
    }

    // =====================
    // Sync Handlers
    // =====================

    /// Syncs the user described by the `initData` query parameter
    ///
    /// # Endpoint
    /// GET /api/telegram/sync
    async fn sync_get_handler(
        State(state): State<Arc<ApiServer>>,
        RawQuery(query): RawQuery,
    ) -> Response {
        let init_data = query
            .as_deref()
            .and_then(|q| first_form_value(q, INIT_DATA_FIELDS));
        state.respond(init_data).await
    }

    /// Syncs the user described by `initData` in the request body
    ///
    /// # Endpoint
    /// POST /api/telegram/sync
    ///
    /// # Request Body
    /// `application/json` or `application/x-www-form-urlencoded`; any other
    /// content type counts as a missing payload.
    ///
    /// # Responses
    /// - 200 OK: Returns the stored user row
    /// - 400 Bad Request: Missing or malformed initData / user
    /// - 401 Unauthorized: Signature mismatch
    /// - 500 Internal Server Error: Configuration missing or store failure
    async fn sync_post_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let init_data = init_data_from_body(&headers, &body);
        state.respond(init_data).await
    }

    async fn respond(&self, init_data: Option<String>) -> Response {
        match self.sync(init_data).await {
            Ok(user) => (StatusCode::OK, Json(SyncResponse { ok: true, user })).into_response(),
            Err(e) => e.into_response(),
        }
    }

    /// Authenticates `init_data` and upserts the user it carries.
    async fn sync(&self, init_data: Option<String>) -> Result<TelegramUserRow, SyncError> {
        let verifier = self.verifier.as_ref().map_err(Clone::clone)?;

        let init_data = init_data
            .filter(|raw| !raw.is_empty())
            .ok_or(SyncError::MissingInitData)?;

        let user = verifier.authenticate(&init_data)?.identity()?;

        let store = self.store.as_ref().map_err(Clone::clone)?;
        Ok(store.upsert_user(&user).await?)
    }
}

/// Pulls `initData` out of a POST body according to its content type.
fn init_data_from_body(headers: &HeaderMap, body: &[u8]) -> Option<String> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.contains("application/json") {
        let value: serde_json::Value = serde_json::from_slice(body).ok()?;
        first_json_string(&value, INIT_DATA_FIELDS)
    } else if content_type.contains("application/x-www-form-urlencoded") {
        let text = std::str::from_utf8(body).ok()?;
        first_form_value(text, INIT_DATA_FIELDS)
    } else {
        None
    }
}
