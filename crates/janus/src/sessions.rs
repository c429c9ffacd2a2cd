use chrono::Utc;
use janus_core::records::SessionRecord;

use crate::error::GatewayError;
use crate::store::{get_typed, put_typed, DocumentStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No gateway record, or the native token is no longer authenticated.
    #[error("session expired")]
    Expired,

    /// The session could not be checked at all.
    #[error("session check failed: {0}")]
    CheckFailed(#[source] StoreError),

    #[error("session revocation failed: {0}")]
    RevokeFailed(#[source] StoreError),
}

/// Opens and checks sessions in the store's own credential system.
pub struct NativeSessionIssuer<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> NativeSessionIssuer<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    pub async fn issue(&self, username: &str, secret: &str) -> Result<String, GatewayError> {
        self.store
            .create_session(username, secret)
            .await
            .map_err(|e| GatewayError::CreatingSession(e.to_string()))
    }

    /// The identity the token is authenticated as, `None` if it is not.
    pub async fn authenticated_as(&self, token: &str) -> Result<Option<String>, StoreError> {
        self.store.session_user(token).await
    }

    pub async fn invalidate(&self, token: &str) -> Result<(), StoreError> {
        match self.store.delete_session(token).await {
            Ok(()) | Err(StoreError::NotFound) | Err(StoreError::Unauthorized { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// The gateway's session records, layered on top of native sessions.
///
/// A session is valid only while both the record exists and the store still
/// authenticates the native token as the same identity.
pub struct GatewaySessionStore<'a> {
    store: &'a dyn DocumentStore,
    sessions_db: &'a str,
}

impl<'a> GatewaySessionStore<'a> {
    pub fn new(store: &'a dyn DocumentStore, sessions_db: &'a str) -> Self {
        Self { store, sessions_db }
    }

    fn native(&self) -> NativeSessionIssuer<'a> {
        NativeSessionIssuer::new(self.store)
    }

    /// Create or replace the record for `token`.
    pub async fn record(&self, token: &str, username: &str) -> Result<(), StoreError> {
        let existing: Option<SessionRecord> =
            get_typed(self.store, self.sessions_db, token).await?;

        let record = SessionRecord {
            token: token.to_string(),
            rev: existing.and_then(|r| r.rev),
            user: username.to_string(),
            created_at: Utc::now().timestamp(),
        };

        put_typed(self.store, self.sessions_db, token, &record).await?;
        Ok(())
    }

    /// Return the owning identity if the session is still live.
    pub async fn validate(&self, token: &str) -> Result<String, SessionError> {
        let record: SessionRecord = get_typed(self.store, self.sessions_db, token)
            .await
            .map_err(SessionError::CheckFailed)?
            .ok_or(SessionError::Expired)?;

        match self
            .native()
            .authenticated_as(token)
            .await
            .map_err(SessionError::CheckFailed)?
        {
            Some(name) if name == record.user => Ok(record.user),
            Some(name) => {
                log::warn!(
                    "Native session belongs to {name} but gateway record names {}",
                    record.user
                );
                Err(SessionError::Expired)
            }
            None => Err(SessionError::Expired),
        }
    }

    /// Delete the record, then invalidate the native token. Missing pieces
    /// count as already revoked.
    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        let existing: Option<SessionRecord> = get_typed(self.store, self.sessions_db, token)
            .await
            .map_err(SessionError::RevokeFailed)?;

        if let Some(SessionRecord { rev: Some(rev), .. }) = existing {
            match self.store.delete_doc(self.sessions_db, token, &rev).await {
                Ok(()) | Err(StoreError::NotFound) => {}
                Err(e) => return Err(SessionError::RevokeFailed(e)),
            }
        }

        self.native()
            .invalidate(token)
            .await
            .map_err(SessionError::RevokeFailed)
    }
}
