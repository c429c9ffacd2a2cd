//! In-memory [`DocumentStore`] for tests, with failure injection.
//!
//! Mirrors the CouchDB behaviors the gateway relies on: revisions and
//! conflicts, `412` on existing databases, plaintext `password` in `_users`
//! replaced by a derived key, and cookie sessions checked against it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{DbCreated, DocumentStore, SecurityPolicy, StoreError, StoreResult};
use janus_core::identity;

/// Operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetDoc,
    PutDoc,
    DeleteDoc,
    CreateDatabase,
    DeleteDatabase,
    SetSecurity,
    CreateSession,
    SessionUser,
    DeleteSession,
}

#[derive(Debug, Default)]
struct State {
    dbs: BTreeMap<String, BTreeMap<String, Value>>,
    security: HashMap<String, SecurityPolicy>,
    sessions: HashMap<String, String>,
    failing: HashSet<Op>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    counter: AtomicUsize,
}

fn injected() -> StoreError {
    StoreError::Transport {
        message: "injected failure".to_string(),
    }
}

impl MemoryStore {
    /// A store that already has `_users` plus the given system databases.
    pub async fn with_databases(dbs: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.write().await;
            state.dbs.insert(identity::USERS_DB.to_string(), BTreeMap::new());
            for db in dbs {
                state.dbs.insert(db.to_string(), BTreeMap::new());
            }
        }
        store
    }

    pub async fn fail(&self, op: Op) {
        self.state.write().await.failing.insert(op);
    }

    pub async fn has_database(&self, db: &str) -> bool {
        self.state.read().await.dbs.contains_key(db)
    }

    pub async fn security_of(&self, db: &str) -> Option<SecurityPolicy> {
        self.state.read().await.security.get(db).cloned()
    }

    pub async fn native_session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Expire a native session behind the gateway's back.
    pub async fn expire_native_session(&self, token: &str) {
        self.state.write().await.sessions.remove(token);
    }

    /// Open a native session without credentials, as another client of the store would.
    pub async fn open_native_session(&self, name: &str) -> String {
        let token = self.next_token();
        self.state
            .write()
            .await
            .sessions
            .insert(token.clone(), name.to_string());
        token
    }

    pub async fn doc(&self, db: &str, id: &str) -> Option<Value> {
        self.state
            .read()
            .await
            .dbs
            .get(db)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    async fn check(&self, op: Op) -> StoreResult<()> {
        if self.state.read().await.failing.contains(&op) {
            Err(injected())
        } else {
            Ok(())
        }
    }

    fn next_token(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("native-{n}-{}", uuid::Uuid::new_v4().simple())
    }
}

fn rev_number(rev: &str) -> usize {
    rev.split('-').next().and_then(|n| n.parse().ok()).unwrap_or(0)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_doc(&self, db: &str, id: &str) -> StoreResult<Option<Value>> {
        self.check(Op::GetDoc).await?;
        let state = self.state.read().await;
        let docs = state.dbs.get(db).ok_or(StoreError::NotFound)?;
        Ok(docs.get(id).cloned())
    }

    async fn put_doc(&self, db: &str, id: &str, doc: &Value) -> StoreResult<String> {
        self.check(Op::PutDoc).await?;
        let mut state = self.state.write().await;
        let docs = state.dbs.get_mut(db).ok_or(StoreError::NotFound)?;

        let current_rev = docs
            .get(id)
            .and_then(|d| d.get("_rev"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let sent_rev = doc.get("_rev").and_then(Value::as_str);

        if current_rev.as_deref() != sent_rev {
            return Err(StoreError::Conflict);
        }

        let next = current_rev.as_deref().map(rev_number).unwrap_or(0) + 1;
        let new_rev = format!("{next}-{}", uuid::Uuid::new_v4().simple());

        let mut stored: Map<String, Value> = doc.as_object().cloned().unwrap_or_default();
        stored.insert("_id".to_string(), Value::String(id.to_string()));
        stored.insert("_rev".to_string(), Value::String(new_rev.clone()));

        if db == identity::USERS_DB {
            if let Some(password) = stored.remove("password") {
                stored.insert("derived_key".to_string(), password);
            }
        }

        docs.insert(id.to_string(), Value::Object(stored));
        Ok(new_rev)
    }

    async fn delete_doc(&self, db: &str, id: &str, rev: &str) -> StoreResult<()> {
        self.check(Op::DeleteDoc).await?;
        let mut state = self.state.write().await;
        let docs = state.dbs.get_mut(db).ok_or(StoreError::NotFound)?;
        let current = docs.get(id).ok_or(StoreError::NotFound)?;
        if current.get("_rev").and_then(Value::as_str) != Some(rev) {
            return Err(StoreError::Conflict);
        }
        docs.remove(id);
        Ok(())
    }

    async fn list_docs(&self, db: &str) -> StoreResult<Vec<Value>> {
        let state = self.state.read().await;
        let docs = state.dbs.get(db).ok_or(StoreError::NotFound)?;
        Ok(docs.values().cloned().collect())
    }

    async fn create_database(&self, db: &str) -> StoreResult<DbCreated> {
        self.check(Op::CreateDatabase).await?;
        let mut state = self.state.write().await;
        if state.dbs.contains_key(db) {
            return Ok(DbCreated::AlreadyExists);
        }
        state.dbs.insert(db.to_string(), BTreeMap::new());
        Ok(DbCreated::Created)
    }

    async fn delete_database(&self, db: &str) -> StoreResult<bool> {
        self.check(Op::DeleteDatabase).await?;
        let mut state = self.state.write().await;
        state.security.remove(db);
        Ok(state.dbs.remove(db).is_some())
    }

    async fn list_databases(&self) -> StoreResult<Vec<String>> {
        Ok(self.state.read().await.dbs.keys().cloned().collect())
    }

    async fn set_security(&self, db: &str, policy: &SecurityPolicy) -> StoreResult<()> {
        self.check(Op::SetSecurity).await?;
        let mut state = self.state.write().await;
        if !state.dbs.contains_key(db) {
            return Err(StoreError::NotFound);
        }
        state.security.insert(db.to_string(), policy.clone());
        Ok(())
    }

    async fn create_session(&self, name: &str, password: &str) -> StoreResult<String> {
        self.check(Op::CreateSession).await?;
        let derived = self
            .doc(identity::USERS_DB, &identity::user_doc_id(name))
            .await
            .and_then(|doc| doc.get("derived_key").and_then(Value::as_str).map(str::to_string));

        if derived.as_deref() != Some(password) {
            return Err(StoreError::Unauthorized {
                message: "Name or password is incorrect.".to_string(),
            });
        }

        Ok(self.open_native_session(name).await)
    }

    async fn session_user(&self, token: &str) -> StoreResult<Option<String>> {
        self.check(Op::SessionUser).await?;
        Ok(self.state.read().await.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> StoreResult<()> {
        self.check(Op::DeleteSession).await?;
        self.state.write().await.sessions.remove(token);
        Ok(())
    }
}
