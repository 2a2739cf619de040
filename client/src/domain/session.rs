//! Signed-in user record and its persistent store.
//!
//! The record lives under the `user` key as a JSON object. Reads are
//! fail-soft: a missing, empty or malformed value means "signed out" and is
//! never an error. Writes also mirror the user id under a couple of legacy
//! keys that other screens still consult.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::Role;
use super::ports::{KeyValueStore, StorageError};

/// Storage key holding the serialised session record.
pub const SESSION_KEY: &str = "user";

/// Keys that receive a copy of the user id whenever a session is stored.
pub const MIRRORED_ID_KEYS: [&str; 2] = ["farmerId", "user_id"];

/// Storage keys consulted, in order, when the record itself lacks an id.
pub const OWNER_ID_FALLBACK_KEYS: [&str; 4] = ["farmerId", "user_id", "userId", "fid"];

const DEFAULT_DISPLAY_NAME: &str = "User";
const DEFAULT_EMAIL: &str = "user@gmail.com";

/// The signed-in user as returned by a login endpoint.
///
/// Only the fields the client reasons about are typed; everything else the
/// backend sends is preserved verbatim in `extra` so it survives a
/// store/load cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

// Backends disagree on whether ids are numbers or strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|value| id_text(&value)))
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

impl SessionRecord {
    /// Build a record from its typed parts.
    pub fn new(
        user_id: Option<String>,
        user_name: Option<String>,
        role: Option<Role>,
    ) -> Self {
        Self {
            user_id,
            user_name,
            role: role.map(|r| r.as_str().to_owned()),
            extra: Map::new(),
        }
    }

    /// Attach an extra backend field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Fill in `role` when the backend did not send one.
    #[must_use]
    pub fn with_default_role(mut self, role: Role) -> Self {
        if self.role.as_deref().is_none_or(|r| r.trim().is_empty()) {
            self.role = Some(role.as_str().to_owned());
        }
        self
    }

    /// Decode a login response body. Anything but a JSON object is rejected.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(_) => serde_json::from_value(value),
            other => Err(serde::de::Error::custom(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    /// Raw role string as stored.
    pub fn role_name(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Parsed role, if the stored string names one.
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|raw| raw.parse().ok())
    }

    /// Untyped backend field.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    fn extra_text(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Name shown in greetings: `user_name`, then `name`, then `full_name`.
    pub fn display_name(&self) -> &str {
        self.user_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or_else(|| self.extra_text("name"))
            .or_else(|| self.extra_text("full_name"))
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    /// Contact address shown on the account page.
    pub fn display_email(&self) -> &str {
        ["email", "user_email", "username"]
            .into_iter()
            .find_map(|key| self.extra_text(key))
            .unwrap_or(DEFAULT_EMAIL)
    }

    /// The user id, falling back to a `userId` field.
    pub fn any_user_id(&self) -> Option<String> {
        self.user_id
            .clone()
            .or_else(|| self.extra.get("userId").and_then(id_text))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Errors raised while writing the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionStoreError {
    /// The storage adapter failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The record could not be serialised.
    #[error("session record could not be serialised: {0}")]
    Encode(String),
}

/// Handle to the persisted session.
///
/// Cloning is cheap and every clone sees the same storage, so a login in one
/// place is visible to every guard on the next read.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Current record, or `None` when signed out or unreadable.
    pub fn get(&self) -> Option<SessionRecord> {
        let raw = match self.storage.get(SESSION_KEY) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return None,
            Err(error) => {
                warn!(%error, "session storage unreadable; treating as signed out");
                return None;
            }
        };
        let parsed = serde_json::from_str::<Value>(&raw)
            .and_then(SessionRecord::from_value);
        match parsed {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(%error, "stored session is malformed; treating as signed out");
                None
            }
        }
    }

    /// Persist `record`, replacing any previous session.
    pub fn set(&self, record: &SessionRecord) -> Result<(), SessionStoreError> {
        let encoded = serde_json::to_string(record)
            .map_err(|error| SessionStoreError::Encode(error.to_string()))?;
        self.storage.set(SESSION_KEY, &encoded)?;
        if let Some(id) = record.any_user_id() {
            for key in MIRRORED_ID_KEYS {
                self.storage.set(key, &id)?;
            }
        }
        debug!(user_id = ?record.user_id(), role = ?record.role_name(), "session stored");
        Ok(())
    }

    /// Wipe the whole storage area, not just the session keys.
    pub fn clear(&self) -> Result<(), SessionStoreError> {
        self.storage.clear()?;
        debug!("session cleared");
        Ok(())
    }

    /// Whether a readable session record exists.
    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    /// Id of the signed-in owner for requests that need one.
    ///
    /// Tries the record's `user_id` then `userId`, then each fallback storage
    /// key in order. Blank values are skipped.
    pub fn owner_id(&self) -> Option<String> {
        if let Some(id) = self.get().and_then(|record| record.any_user_id()) {
            return Some(id);
        }
        OWNER_ID_FALLBACK_KEYS.into_iter().find_map(|key| {
            self.storage
                .get(key)
                .ok()
                .flatten()
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        })
    }
}
