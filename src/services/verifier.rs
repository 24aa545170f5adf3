// src/services/verifier.rs
//! Init-data signature verification.
//!
//! The launcher signs every payload with a key derived from the bot token:
//!
//! ```text
//! derived  = HMAC_SHA256(key = "WebAppData", message = bot_token)
//! expected = hex(HMAC_SHA256(key = derived, message = canonical_string))
//! ```
//!
//! The supplied `hash` must equal `expected` (lowercase hex) under a
//! constant-time comparison. Only then is the payload wrapped in
//! [`VerifiedInitData`], the sole input the identity decoder accepts.

use crate::error::AuthError;
use crate::models::telegram_user::TelegramUser;
use crate::services::init_data::SignedPayload;
use crate::utils::crypto::{constant_time_eq, hmac_key, hmac_sha256};
use crate::utils::serialization::deserialize;
use ring::hmac;
use std::fmt;

/// Label keying the derivation step. Must match the launcher byte for byte.
pub const WEB_APP_DATA_LABEL: &[u8] = b"WebAppData";

/// Length of a hex-rendered HMAC-SHA256 signature.
pub const SIGNATURE_HEX_LEN: usize = 64;

/// Verifier bound to a single bot token.
///
/// The derived key is computed once at construction; the token itself is
/// not retained. Cheap to share behind an `Arc` and safe to call
/// concurrently.
#[derive(Clone)]
pub struct InitDataVerifier {
    derived_key: hmac::Key,
}

impl InitDataVerifier {
    /// Constructs a verifier for the given bot token.
    ///
    /// # Errors
    /// `ConfigurationMissing` if the token is empty.
    pub fn new(bot_token: &str) -> Result<Self, AuthError> {
        if bot_token.is_empty() {
            return Err(AuthError::ConfigurationMissing("TELEGRAM_BOT_TOKEN"));
        }
        let derived = hmac_sha256(&hmac_key(WEB_APP_DATA_LABEL), bot_token.as_bytes());
        Ok(Self {
            derived_key: hmac_key(&derived),
        })
    }

    /// Lowercase hex signature over the canonical string of `payload`.
    pub fn sign(&self, payload: &SignedPayload) -> String {
        hex::encode(hmac_sha256(
            &self.derived_key,
            payload.canonical_string().as_bytes(),
        ))
    }

    /// Returns `true` when `raw` carries a valid signature.
    ///
    /// Parse failures and missing hashes are simply `false`; use
    /// [`authenticate`](Self::authenticate) to learn why.
    pub fn verify(&self, raw: &str) -> bool {
        self.authenticate(raw).is_ok()
    }

    /// Verifies `raw` and, on success, hands back the trusted payload.
    ///
    /// # Errors
    /// - `MalformedPayload` if the transport string cannot be parsed
    /// - `NotAuthenticated` if `hash` is absent or does not match
    pub fn authenticate(&self, raw: &str) -> Result<VerifiedInitData, AuthError> {
        let payload = SignedPayload::parse(raw)?;

        let supplied = match payload.hash() {
            Some(hash) if !hash.is_empty() => hash,
            _ => {
                log::debug!("initData rejected: no hash field");
                return Err(AuthError::NotAuthenticated);
            }
        };

        // Length differs only for garbage input; bail before touching content.
        if supplied.len() != SIGNATURE_HEX_LEN {
            log::debug!("initData rejected: hash has unexpected length");
            return Err(AuthError::NotAuthenticated);
        }

        let expected = self.sign(&payload);
        if !constant_time_eq(expected.as_bytes(), supplied.as_bytes()) {
            log::debug!("initData rejected: signature mismatch");
            return Err(AuthError::NotAuthenticated);
        }

        Ok(VerifiedInitData { payload })
    }
}

impl fmt::Debug for InitDataVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitDataVerifier").finish_non_exhaustive()
    }
}

/// One-shot verification against a bot token.
///
/// Equivalent to `InitDataVerifier::new(secret)?.verify(raw)`; an empty
/// token verifies nothing.
#[allow(dead_code)]
pub fn verify(raw: &str, secret: &str) -> bool {
    InitDataVerifier::new(secret)
        .map(|verifier| verifier.verify(raw))
        .unwrap_or(false)
}

/// A payload whose signature has been checked.
///
/// There is no public constructor: values only come out of
/// [`InitDataVerifier::authenticate`].
#[derive(Debug, Clone)]
pub struct VerifiedInitData {
    payload: SignedPayload,
}

impl VerifiedInitData {
    /// Value of a signed field, e.g. `auth_date`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload.get(key)
    }

    /// Decodes the `user` field into a typed identity.
    ///
    /// # Errors
    /// `MalformedIdentity` if `user` is absent, is not a JSON object, or
    /// lacks an integer `id`. Never fabricates a default identity.
    pub fn identity(&self) -> Result<TelegramUser, AuthError> {
        decode_identity(self)
    }
}

/// Decodes the identity record from verified init data.
pub fn decode_identity(verified: &VerifiedInitData) -> Result<TelegramUser, AuthError> {
    let raw = verified
        .get("user")
        .ok_or_else(|| AuthError::MalformedIdentity("missing user field".into()))?;

    // Derived struct deserializers also accept JSON arrays positionally, so
    // `[42]` would decode as a user. Only objects are identities.
    let value: serde_json::Value =
        deserialize(raw).map_err(|e| AuthError::MalformedIdentity(e.to_string()))?;
    if !value.is_object() {
        return Err(AuthError::MalformedIdentity("user is not a JSON object".into()));
    }

    serde_json::from_value(value).map_err(|e| AuthError::MalformedIdentity(e.to_string()))
}
