// src/error.rs
//! Error taxonomy for init-data authentication and user synchronization.
//!
//! None of these variants carry the bot token, the derived key, or any
//! fragment of the expected signature.

use axum::http::StatusCode;
use thiserror::Error;

/// Failures raised while authenticating a signed init-data payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Signature mismatch or no `hash` field.
    #[error("Invalid initData signature.")]
    NotAuthenticated,

    /// The transport string could not be turned into signed fields.
    #[error("Malformed initData: {0}")]
    MalformedPayload(String),

    /// The `user` field is missing or does not describe a user.
    #[error("Malformed user in initData: {0}")]
    MalformedIdentity(String),

    /// A required setting was not provisioned. Carries the setting name only.
    #[error("Server not configured: {0} is missing.")]
    ConfigurationMissing(&'static str),
}

/// Failures reported by the hosted user store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store rejected upsert ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected store response: {0}")]
    Decode(String),
}

/// Everything the sync endpoint can fail with.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Missing initData in request (body or query).")]
    MissingInitData,
}

impl SyncError {
    /// HTTP status the endpoint answers with for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            SyncError::Auth(AuthError::NotAuthenticated) => StatusCode::UNAUTHORIZED,
            SyncError::Auth(AuthError::MalformedPayload(_))
            | SyncError::Auth(AuthError::MalformedIdentity(_))
            | SyncError::MissingInitData => StatusCode::BAD_REQUEST,
            SyncError::Auth(AuthError::ConfigurationMissing(_)) | SyncError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message placed in the `error` field of the response body.
    ///
    /// Store failures surface the store's own message, as clients only see
    /// the upstream explanation.
    pub fn client_message(&self) -> String {
        match self {
            SyncError::Store(StoreError::Rejected { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}
