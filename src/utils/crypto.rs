// src/utils/crypto.rs
//! Cryptographic utilities for init-data authentication.
//!
//! Thin wrappers over `ring` so the rest of the crate never touches raw
//! HMAC keys or hand-rolled comparisons.

use ring::{constant_time, hmac};

/// Builds an HMAC-SHA256 key from raw key bytes.
pub fn hmac_key(key: &[u8]) -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, key)
}

/// Computes `HMAC_SHA256(key, message)` and returns the 32-byte tag.
///
/// # Arguments
/// * `key` - Prepared HMAC key
/// * `message` - Bytes to authenticate
pub fn hmac_sha256(key: &hmac::Key, message: &[u8]) -> [u8; 32] {
    let tag = hmac::sign(key, message);
    let mut out = [0u8; 32];
    out.copy_from_slice(tag.as_ref());
    out
}

/// Compares two byte strings without branching on their contents.
///
/// Inputs of different length are rejected before any byte is inspected;
/// for equal lengths `ring` accumulates every byte difference before deciding.
///
/// # Returns
/// `true` only if both slices have the same length and identical bytes.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    constant_time::verify_slices_are_equal(a, b).is_ok()
}
