//! Document store seam.
//!
//! Everything the gateway needs from the multi-tenant store goes through
//! [`DocumentStore`]: document CRUD, database lifecycle, access control and
//! the store's own credential sessions. The production implementation speaks
//! the CouchDB HTTP API ([`couch::CouchStore`]).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

pub mod couch;

#[cfg(test)]
pub mod memory;

pub use couch::CouchStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    /// Optimistic-concurrency conflict (stale or missing revision).
    #[error("document update conflict")]
    Conflict,

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::InvalidResponse {
            message: e.to_string(),
        }
    }
}

/// Outcome of an idempotent database creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbCreated {
    Created,
    AlreadyExists,
}

/// Access-control policy applied to a database.
///
/// Members may read and write; everyone else except server admins is denied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityPolicy {
    pub admin_names: Vec<String>,
    pub admin_roles: Vec<String>,
    pub member_names: Vec<String>,
    pub member_roles: Vec<String>,
}

impl SecurityPolicy {
    /// Only `name` may use the database.
    pub fn sole_writer(name: &str) -> Self {
        Self {
            member_names: vec![name.to_string()],
            ..Default::default()
        }
    }

    /// Only server administrators may use the database.
    pub fn admins_only() -> Self {
        Self {
            member_roles: vec!["_admin".to_string()],
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "admins": { "names": self.admin_names, "roles": self.admin_roles },
            "members": { "names": self.member_names, "roles": self.member_roles },
        })
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document; `Ok(None)` when it does not exist.
    async fn get_doc(&self, db: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Create or update a document, returning the new revision.
    ///
    /// Updates must carry the current `_rev` in `doc`, otherwise the store
    /// answers [`StoreError::Conflict`].
    async fn put_doc(&self, db: &str, id: &str, doc: &Value) -> StoreResult<String>;

    async fn delete_doc(&self, db: &str, id: &str, rev: &str) -> StoreResult<()>;

    /// Every non-design document in `db`.
    async fn list_docs(&self, db: &str) -> StoreResult<Vec<Value>>;

    async fn create_database(&self, db: &str) -> StoreResult<DbCreated>;

    /// Delete a database; `Ok(false)` when it was already gone.
    async fn delete_database(&self, db: &str) -> StoreResult<bool>;

    async fn list_databases(&self) -> StoreResult<Vec<String>>;

    async fn set_security(&self, db: &str, policy: &SecurityPolicy) -> StoreResult<()>;

    /// Authenticate `name`/`password` against the store and return the
    /// opaque native session token.
    async fn create_session(&self, name: &str, password: &str) -> StoreResult<String>;

    /// Name of the user the native token is authenticated as, if any.
    async fn session_user(&self, token: &str) -> StoreResult<Option<String>>;

    async fn delete_session(&self, token: &str) -> StoreResult<()>;
}

/// Typed read on top of [`DocumentStore::get_doc`].
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    db: &str,
    id: &str,
) -> StoreResult<Option<T>> {
    match store.get_doc(db, id).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Typed write on top of [`DocumentStore::put_doc`].
pub async fn put_typed<T: Serialize + Sync>(
    store: &dyn DocumentStore,
    db: &str,
    id: &str,
    doc: &T,
) -> StoreResult<String> {
    let value = serde_json::to_value(doc)?;
    store.put_doc(db, id, &value).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sole_writer_policy_shape() {
        let policy = SecurityPolicy::sole_writer("alice@example.com");
        assert_eq!(
            policy.to_json(),
            json!({
                "admins": { "names": [], "roles": [] },
                "members": { "names": ["alice@example.com"], "roles": [] },
            })
        );
    }

    #[test]
    fn admins_only_policy_shape() {
        let policy = SecurityPolicy::admins_only();
        assert_eq!(policy.to_json()["members"]["roles"], json!(["_admin"]));
        assert_eq!(policy.to_json()["members"]["names"], json!([]));
    }
}
