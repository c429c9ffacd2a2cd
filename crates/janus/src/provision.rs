use janus_core::records::AppRecord;
use janus_core::tenant::tenant_database_name;

use crate::error::GatewayError;
use crate::store::{get_typed, DbCreated, DocumentStore, SecurityPolicy};

/// Resolves app keys to tenant databases and makes sure those databases
/// exist and belong to the user.
pub struct Provisioner<'a> {
    store: &'a dyn DocumentStore,
    apps_db: &'a str,
    prefix: &'a str,
}

impl<'a> Provisioner<'a> {
    pub fn new(store: &'a dyn DocumentStore, apps_db: &'a str, prefix: &'a str) -> Self {
        Self {
            store,
            apps_db,
            prefix,
        }
    }

    /// Look up the app registered under `app_key`.
    pub async fn resolve_app(&self, app_key: &str) -> Result<AppRecord, GatewayError> {
        if app_key.is_empty() {
            return Err(GatewayError::VerifyingApp("empty app key".to_string()));
        }

        match get_typed::<AppRecord>(self.store, self.apps_db, app_key).await {
            Ok(Some(app)) => Ok(app),
            Ok(None) => Err(GatewayError::VerifyingApp(format!("unknown app key {app_key}"))),
            Err(e) => Err(GatewayError::VerifyingApp(e.to_string())),
        }
    }

    /// Resolve the app, derive the tenant database for `owner`, create it if
    /// needed and secure it for the owner alone. Returns the database name.
    pub async fn resolve_and_provision(
        &self,
        app_key: &str,
        owner: &str,
    ) -> Result<String, GatewayError> {
        let app = self.resolve_app(app_key).await?;
        let db_name = tenant_database_name(self.prefix, &app.dev, &app.name, owner);

        self.provision_database(&db_name, owner).await?;
        Ok(db_name)
    }

    /// Ensure `db_name` exists, then restrict it to `owner`.
    ///
    /// Both steps are idempotent, so concurrent first logins for the same
    /// tenant may race here safely. The database must exist before it can be
    /// secured, and a failure to secure is always fatal.
    async fn provision_database(&self, db_name: &str, owner: &str) -> Result<(), GatewayError> {
        match self
            .store
            .create_database(db_name)
            .await
            .map_err(GatewayError::CreatingDatabase)?
        {
            DbCreated::Created => log::info!("Created database {db_name}"),
            DbCreated::AlreadyExists => log::debug!("Database {db_name} already exists"),
        }

        self.store
            .set_security(db_name, &SecurityPolicy::sole_writer(owner))
            .await
            .map_err(GatewayError::SecuringDatabase)?;

        log::debug!("Secured database {db_name} for {owner}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryStore, Op};
    use janus_core::ErrorKind;
    use serde_json::json;

    const APPS: &str = "janus_apps";

    async fn store_with_app() -> MemoryStore {
        let store = MemoryStore::with_databases(&[APPS]).await;
        store
            .put_doc(APPS, "K1", &json!({ "dev": "D1", "name": "todo" }))
            .await
            .unwrap();
        store
    }

    const ALICE: &str = "alice@example.com";

    #[tokio::test]
    async fn provisions_and_secures_tenant_database() {
        let store = store_with_app().await;
        let db = Provisioner::new(&store, APPS, "p_")
            .resolve_and_provision("K1", ALICE)
            .await
            .unwrap();

        assert_eq!(db, "p_D1_todo_c160f8cc69a4f0bf2b0362752353d060");
        assert!(store.has_database(&db).await);
        assert_eq!(
            store.security_of(&db).await,
            Some(SecurityPolicy::sole_writer(ALICE))
        );
    }

    #[tokio::test]
    async fn existing_database_is_success() {
        let store = store_with_app().await;
        let provisioner = Provisioner::new(&store, APPS, "");

        let first = provisioner.resolve_and_provision("K1", ALICE).await.unwrap();
        let second = provisioner.resolve_and_provision("K1", ALICE).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_app_is_verifying_app() {
        let store = store_with_app().await;
        let err = Provisioner::new(&store, APPS, "")
            .resolve_and_provision("nope", ALICE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VerifyingApp);
    }

    #[tokio::test]
    async fn unreadable_app_is_verifying_app() {
        let store = store_with_app().await;
        store.fail(Op::GetDoc).await;
        let err = Provisioner::new(&store, APPS, "")
            .resolve_and_provision("K1", ALICE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VerifyingApp);
    }

    #[tokio::test]
    async fn create_failure_is_creating_database() {
        let store = store_with_app().await;
        store.fail(Op::CreateDatabase).await;
        let err = Provisioner::new(&store, APPS, "")
            .resolve_and_provision("K1", ALICE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CreatingDatabase);
    }

    #[tokio::test]
    async fn security_failure_is_never_skipped() {
        let store = store_with_app().await;
        store.fail(Op::SetSecurity).await;
        let err = Provisioner::new(&store, APPS, "")
            .resolve_and_provision("K1", ALICE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SecuringDatabase);
    }
}
