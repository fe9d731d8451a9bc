//! Wire types for the remote `users` collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::UserId;

/// Wire name of the record key.
pub const ID_FIELD: &str = "id";

/// A record of the remote `users` collection.
///
/// Only `id` is interpreted; every other field (identity, contact, address,
/// company, bank, physical attributes, ...) is carried as-is so a fetched
/// record can be re-submitted without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl UserRecord {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Replace (or add) one field, returning the previous value.
    ///
    /// `id` is not a passthrough field and is never touched here; setting it
    /// is a no-op returning `None`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        if name == ID_FIELD {
            return None;
        }
        self.fields.insert(name, value.into())
    }

    pub fn username(&self) -> Option<&str> {
        self.str_field("username")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field("email")
    }

    /// Set by the remote API on the record returned from a delete.
    pub fn is_deleted(&self) -> bool {
        self.field("isDeleted").and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Payload of `POST /users/add` (the add-user form).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub birth_date: String,
    pub weight: f64,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Sparse set of fields for a partial update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserPatch(Map<String, Value>);

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for UserPatch {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// One page of the `users` collection. Never cached; every page is re-fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<UserRecord>,
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

impl UserPage {
    pub fn contains(&self, id: UserId) -> bool {
        self.users.iter().any(|u| u.id == id)
    }
}

/// Sparse filter for `GET /users/filter`.
///
/// Unset filters are omitted from the query entirely, and so are "empty" ones
/// (age 0, blank strings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub eye_color: Option<String>,
}

impl UserFilter {
    /// Query parameters in wire order: `age`, `gender`, `bloodGroup`, `eyeColor`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(age) = self.age.filter(|a| *a != 0) {
            pairs.push(("age", age.to_string()));
        }

        let text = [
            ("gender", &self.gender),
            ("bloodGroup", &self.blood_group),
            ("eyeColor", &self.eye_color),
        ];
        for (key, value) in text {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        }

        pairs
    }

    /// URL-encoded query string (without the leading `?`).
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.query_pairs() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }
}
