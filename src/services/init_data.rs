// src/services/init_data.rs
//! Parsing and canonicalization of signed init-data payloads.
//!
//! A payload is a form-encoded transport string (`a=1&b=2&hash=...`). One
//! reserved key, `hash`, carries the signature; every other key is a
//! signed field. The canonical string the signature covers is the signed
//! fields sorted by key and joined as `key=value` lines.
//!
//! # Decoding rules
//! - `+` decodes to a space and `%XX` escapes are resolved; invalid UTF-8
//!   is replaced lossily
//! - A segment without `=` is a key with an empty value
//! - Empty segments are skipped
//! - Duplicate keys: the last occurrence wins, `hash` included
//!
//! The duplicate policy matters only for payloads a legitimate launcher
//! never produces. It must still agree with the signer's parser, so treat
//! any change here as a compatibility break.

use crate::error::AuthError;
use std::collections::BTreeMap;

/// Reserved key carrying the signature.
pub const HASH_KEY: &str = "hash";

/// Upper bound on the raw transport string.
pub const MAX_PAYLOAD_LEN: usize = 8 * 1024;

/// Splits a transport string into decoded `(key, value)` pairs, in input order.
///
/// # Errors
/// `MalformedPayload` if the input is oversized, or a decoded key is empty
/// or contains `=` or a newline. Such keys would make the canonical string
/// ambiguous.
pub fn parse(raw: &str) -> Result<Vec<(String, String)>, AuthError> {
    if raw.len() > MAX_PAYLOAD_LEN {
        return Err(AuthError::MalformedPayload(format!(
            "payload exceeds {} bytes",
            MAX_PAYLOAD_LEN
        )));
    }

    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .map(|(key, value)| {
            if key.is_empty() {
                Err(AuthError::MalformedPayload("empty field name".into()))
            } else if key.contains('=') || key.contains('\n') {
                Err(AuthError::MalformedPayload(format!(
                    "field name {:?} contains a reserved character",
                    key
                )))
            } else {
                Ok((key, value))
            }
        })
        .collect()
}

/// Parsed payload: signed fields keyed and ordered byte-lexicographically,
/// with the signature held apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedPayload {
    fields: BTreeMap<String, String>,
    hash: Option<String>,
}

impl SignedPayload {
    /// Builds a payload from decoded pairs, applying the last-wins policy.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut payload = SignedPayload::default();
        for (key, value) in pairs {
            if key == HASH_KEY {
                payload.hash = Some(value);
            } else {
                payload.fields.insert(key, value);
            }
        }
        payload
    }

    /// Parses a raw transport string.
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        parse(raw).map(Self::from_pairs)
    }

    /// The supplied signature, if any.
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Value of a signed field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Signed fields in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The data-check string covered by the signature.
    pub fn canonical_string(&self) -> String {
        join_canonical(self.fields())
    }
}

/// Canonicalizes decoded pairs: drops `hash`, sorts by key bytes, joins
/// `key=value` with `\n` and no trailing newline. Values are not re-encoded.
#[allow(dead_code)]
pub fn canonicalize(pairs: &[(String, String)]) -> String {
    SignedPayload::from_pairs(pairs.iter().cloned()).canonical_string()
}

fn join_canonical<'a>(fields: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    fields
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}
