use janus_core::records::UserRecord;

use crate::error::GatewayError;
use crate::provision::Provisioner;
use crate::sessions::{GatewaySessionStore, NativeSessionIssuer};
use crate::store::DocumentStore;
use crate::users::UserStore;
use crate::verifier::AssertionVerifier;

/// Result of a completed login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Tenant database resolved for this (app, user) pair.
    pub db: String,
    pub name: String,
    /// Native session token, delivered to the client as a cookie.
    pub token: String,
}

/// The `/login` flow.
///
/// Steps run in a fixed order and the first failure aborts the rest. Nothing
/// already done is rolled back: a database created before a later failure is
/// simply found again on the next attempt.
pub struct LoginPipeline<'a> {
    store: &'a dyn DocumentStore,
    verifier: &'a dyn AssertionVerifier,
    apps_db: &'a str,
    sessions_db: &'a str,
    prefix: &'a str,
}

impl<'a> LoginPipeline<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        verifier: &'a dyn AssertionVerifier,
        apps_db: &'a str,
        sessions_db: &'a str,
        prefix: &'a str,
    ) -> Self {
        Self {
            store,
            verifier,
            apps_db,
            sessions_db,
            prefix,
        }
    }

    pub async fn run(
        &self,
        assertion: &str,
        audience: &str,
        app_key: &str,
    ) -> Result<LoginOutcome, GatewayError> {
        let identity = self.verifier.verify(assertion, audience).await?;
        log::debug!("Assertion verified for {}", identity.email);

        let user = UserStore::new(self.store).ensure(&identity.email).await?;

        // Creates and secures the tenant database before any session exists.
        let db = Provisioner::new(self.store, self.apps_db, self.prefix)
            .resolve_and_provision(app_key, &user.name)
            .await?;

        let token = self.issue_native_session(&user).await?;

        GatewaySessionStore::new(self.store, self.sessions_db)
            .record(&token, &user.name)
            .await
            .map_err(GatewayError::CreatingJanusSession)?;

        log::info!("Login completed for {} on {db}", user.name);
        Ok(LoginOutcome {
            db,
            name: user.name,
            token,
        })
    }

    async fn issue_native_session(&self, user: &UserRecord) -> Result<String, GatewayError> {
        let secret = user.secret.as_deref().ok_or_else(|| {
            GatewayError::CreatingSession(format!("user {} has no credential secret", user.name))
        })?;

        NativeSessionIssuer::new(self.store).issue(&user.name, secret).await
    }
}
