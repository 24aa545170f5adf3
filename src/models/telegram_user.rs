// src/models/telegram_user.rs
//! Telegram user data model.
//!
//! Two shapes live here: [`TelegramUser`], the identity decoded from the
//! signed `user` field, and [`TelegramUserRow`], the row the hosted store
//! returns after an upsert.

use serde::{Deserialize, Serialize};

/// Identity carried in the `user` field of verified init data.
///
/// Optional fields distinguish "not provided" (`None`, also used for JSON
/// `null`) from "provided as empty" (`Some("")`).
///
/// # Fields
/// - `id`: Telegram user identifier, required JSON integer
/// - `first_name` / `last_name`: display name parts
/// - `username`: public handle without the leading `@`
/// - `photo_url`: avatar URL
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// A stored user row as returned by the hosted store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TelegramUserRow {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Upsert body sent to the store: the identity plus its sync timestamp.
///
/// Absent optional fields serialize as `null` so a resync clears values the
/// user removed from their profile.
#[derive(Serialize, Debug)]
pub struct TelegramUserUpsert<'a> {
    pub id: i64,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub username: Option<&'a str>,
    pub photo_url: Option<&'a str>,
    pub updated_at: String,
}

impl<'a> TelegramUserUpsert<'a> {
    pub fn new(user: &'a TelegramUser, updated_at: String) -> Self {
        TelegramUserUpsert {
            id: user.id,
            first_name: user.first_name.as_deref(),
            last_name: user.last_name.as_deref(),
            username: user.username.as_deref(),
            photo_url: user.photo_url.as_deref(),
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_absent_are_none() {
        let user: TelegramUser =
            serde_json::from_str(r#"{"id":7,"first_name":null,"username":""}"#).unwrap();
        assert_eq!(user.first_name, None);
        assert_eq!(user.last_name, None);
        assert_eq!(user.username.as_deref(), Some(""));
    }

    #[test]
    fn test_upsert_serializes_absent_as_null() {
        let user = TelegramUser {
            id: 42,
            first_name: Some("Ann".into()),
            last_name: None,
            username: None,
            photo_url: None,
        };
        let upsert = TelegramUserUpsert::new(&user, "2024-01-01T00:00:00.000Z".into());
        let body = serde_json::to_value(upsert).unwrap();
        assert_eq!(
            body,
            json!({
                "id": 42,
                "first_name": "Ann",
                "last_name": null,
                "username": null,
                "photo_url": null,
                "updated_at": "2024-01-01T00:00:00.000Z"
            })
        );
    }

    #[test]
    fn test_row_tolerates_missing_timestamps() {
        let row: TelegramUserRow = serde_json::from_value(json!({
            "id": 1,
            "first_name": "A",
            "last_name": null,
            "username": null,
            "photo_url": null
        }))
        .unwrap();
        assert_eq!(row.created_at, None);
        assert_eq!(row.updated_at, None);
    }
}
