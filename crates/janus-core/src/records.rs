use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity;

/// A federated user as stored in the `_users` database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,

    /// Store revision; required to update an existing document.
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    #[serde(rename = "type", default = "default_user_type")]
    pub doc_type: String,

    /// The verified email.
    pub name: String,

    #[serde(default)]
    pub roles: Vec<String>,

    /// Set once the gateway has provisioned this identity.
    #[serde(default)]
    pub provisioned: bool,

    /// Credential secret used to open native store sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Plaintext handed to the store on creation only; the store replaces it
    /// with a derived key, so it is never sent again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Store-managed attributes (`derived_key`, `salt`, ...) carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_user_type() -> String {
    identity::USER_DOC_TYPE.to_string()
}

impl UserRecord {
    /// A brand-new record for `email` carrying a freshly generated `secret`.
    pub fn new_federated(email: &str, secret: String) -> Self {
        Self {
            id: identity::user_doc_id(email),
            rev: None,
            doc_type: default_user_type(),
            name: email.to_string(),
            roles: identity::user_roles(),
            provisioned: true,
            password: Some(secret.clone()),
            secret: Some(secret),
            extra: Map::new(),
        }
    }

    /// Apply the recognized attributes over a stored record.
    ///
    /// Revision, secret and unknown attributes are preserved; the plaintext
    /// password is dropped so the store keeps its existing derived key.
    pub fn refreshed(mut self, email: &str) -> Self {
        self.doc_type = default_user_type();
        self.name = email.to_string();
        self.roles = identity::user_roles();
        self.provisioned = true;
        self.password = None;
        self
    }
}

/// An application registered with the gateway, keyed by its app key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    #[serde(rename = "_id")]
    pub key: String,

    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Owning developer identity.
    pub dev: String,

    /// Display name, also the middle segment of tenant database names.
    pub name: String,

    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created_at: i64,
}

/// The gateway's own session record, keyed by the native session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "_id")]
    pub token: String,

    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Owning identity name.
    pub user: String,

    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created_at: i64,
}
