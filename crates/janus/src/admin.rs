//! Deployment-time administration: system databases and app registration.

use janus_core::records::AppRecord;

use crate::apps::AppLifecycle;
use crate::store::{DbCreated, DocumentStore, SecurityPolicy};

/// Create the apps and sessions databases and close them to everyone but
/// server administrators. Safe to run repeatedly.
pub async fn bootstrap(
    store: &dyn DocumentStore,
    apps_db: &str,
    sessions_db: &str,
) -> anyhow::Result<()> {
    for db in [apps_db, sessions_db] {
        match store.create_database(db).await? {
            DbCreated::Created => log::info!("Created database {db}"),
            DbCreated::AlreadyExists => log::info!("Database {db} already exists"),
        }
        store.set_security(db, &SecurityPolicy::admins_only()).await?;
    }
    Ok(())
}

/// Register an app for `dev`, generating a key when none is given.
///
/// Only the record is written; the app's own database is left to the
/// developer.
pub async fn add_app(
    apps: &AppLifecycle<'_>,
    dev: &str,
    name: &str,
    key: Option<String>,
) -> anyhow::Result<AppRecord> {
    let key = key.unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    Ok(apps.register(&key, dev, name).await?)
}

/// All registered apps, ordered by key.
pub async fn list_apps(apps: &AppLifecycle<'_>) -> anyhow::Result<Vec<AppRecord>> {
    Ok(apps.list().await?)
}

/// Delete an app on behalf of its developer.
pub async fn delete_app(apps: &AppLifecycle<'_>, key: &str) -> anyhow::Result<AppRecord> {
    let app = apps
        .get(key)
        .await?
        .ok_or_else(|| anyhow::anyhow!("App '{}' not found", key))?;

    apps.delete(key, &app.dev).await?;

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryStore, Op};

    const APPS: &str = "janus_apps";
    const SESSIONS: &str = "janus_sessions";

    fn lifecycle(store: &MemoryStore) -> AppLifecycle<'_> {
        AppLifecycle::new(store, APPS, SESSIONS, "")
    }

    #[tokio::test]
    async fn bootstrap_is_repeatable_and_admin_only() {
        let store = MemoryStore::with_databases(&[]).await;

        bootstrap(&store, APPS, SESSIONS).await.unwrap();
        bootstrap(&store, APPS, SESSIONS).await.unwrap();

        for db in [APPS, SESSIONS] {
            assert!(store.has_database(db).await);
            assert_eq!(store.security_of(db).await, Some(SecurityPolicy::admins_only()));
        }
    }

    #[tokio::test]
    async fn bootstrap_reports_store_failure() {
        let store = MemoryStore::with_databases(&[]).await;
        store.fail(Op::SetSecurity).await;
        assert!(bootstrap(&store, APPS, SESSIONS).await.is_err());
    }

    #[tokio::test]
    async fn add_app_generates_key_and_refuses_duplicates() {
        let store = MemoryStore::with_databases(&[APPS]).await;
        let apps = lifecycle(&store);

        let generated = add_app(&apps, "D1", "todo", None).await.unwrap();
        assert_eq!(generated.key.len(), 32);
        assert_eq!(store.doc(APPS, &generated.key).await.unwrap()["dev"], "D1");

        add_app(&apps, "D1", "todo", Some("K1".to_string()))
            .await
            .unwrap();
        assert!(add_app(&apps, "D2", "other", Some("K1".to_string()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn add_app_refuses_reserved_keys_and_ambiguous_names() {
        let store = MemoryStore::with_databases(&[APPS]).await;
        let apps = lifecycle(&store);

        assert!(add_app(&apps, "D1", "todo", Some(SESSIONS.to_string()))
            .await
            .is_err());
        assert!(add_app(&apps, "D1", "a_b", None).await.is_err());
        assert!(list_apps(&apps).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_app_removes_registration() {
        let store = MemoryStore::with_databases(&[APPS]).await;
        let apps = lifecycle(&store);
        add_app(&apps, "D1", "todo", Some("K1".to_string()))
            .await
            .unwrap();

        let deleted = delete_app(&apps, "K1").await.unwrap();
        assert_eq!(deleted.dev, "D1");
        assert!(store.doc(APPS, "K1").await.is_none());
        assert!(delete_app(&apps, "K1").await.is_err());
    }

    #[tokio::test]
    async fn list_apps_is_sorted_by_key() {
        let store = MemoryStore::with_databases(&[APPS]).await;
        let apps = lifecycle(&store);
        add_app(&apps, "D1", "zeta", Some("Kb".to_string()))
            .await
            .unwrap();
        add_app(&apps, "D2", "alpha", Some("Ka".to_string()))
            .await
            .unwrap();

        let listed = list_apps(&apps).await.unwrap();
        let keys: Vec<_> = listed.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, ["Ka", "Kb"]);
    }
}
