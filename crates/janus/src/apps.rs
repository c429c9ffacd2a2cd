use chrono::Utc;
use janus_core::records::AppRecord;
use janus_core::tenant::{is_tenant_database_of, is_valid_app_name, looks_like_tenant_database};

use crate::error::GatewayError;
use crate::store::{
    get_typed, put_typed, DbCreated, DocumentStore, SecurityPolicy, StoreError, StoreResult,
};

/// Registration and removal of apps by their developers.
///
/// Callers authorize the developer through a gateway session first; the
/// owner passed in here is the identity that session resolved to.
pub struct AppLifecycle<'a> {
    store: &'a dyn DocumentStore,
    apps_db: &'a str,
    sessions_db: &'a str,
    prefix: &'a str,
}

impl<'a> AppLifecycle<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        apps_db: &'a str,
        sessions_db: &'a str,
        prefix: &'a str,
    ) -> Self {
        Self {
            store,
            apps_db,
            sessions_db,
            prefix,
        }
    }

    pub async fn get(&self, app_key: &str) -> StoreResult<Option<AppRecord>> {
        get_typed(self.store, self.apps_db, app_key).await
    }

    /// All registered apps, ordered by key.
    pub async fn list(&self) -> StoreResult<Vec<AppRecord>> {
        let mut apps: Vec<AppRecord> = self
            .store
            .list_docs(self.apps_db)
            .await?
            .into_iter()
            .filter_map(|doc| serde_json::from_value(doc).ok())
            .collect();
        apps.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(apps)
    }

    /// Provision a new database at the literal `app_key` for `owner`, then
    /// register the app under it.
    ///
    /// The database must not exist yet: an existing database belongs to
    /// someone else and is never re-secured for the caller.
    pub async fn create(
        &self,
        app_key: &str,
        owner: &str,
        name: &str,
    ) -> Result<AppRecord, GatewayError> {
        self.check_registration(app_key, name)?;
        self.ensure_key_free(app_key).await?;

        match self.store.create_database(app_key).await {
            Ok(DbCreated::Created) => log::info!("Created app database {app_key}"),
            Ok(DbCreated::AlreadyExists) => {
                log::warn!("Refused app key {app_key} for {owner}: database exists");
                return Err(GatewayError::CreatingApp(format!(
                    "database {app_key} already exists"
                )));
            }
            Err(e) => return Err(GatewayError::CreatingApp(e.to_string())),
        }

        if let Err(e) = self
            .store
            .set_security(app_key, &SecurityPolicy::sole_writer(owner))
            .await
        {
            // Drop the unsecured database so the key stays usable.
            if let Err(cleanup) = self.store.delete_database(app_key).await {
                log::warn!("Failed to remove unsecured database {app_key}: {cleanup}");
            }
            return Err(GatewayError::CreatingApp(e.to_string()));
        }

        let record = self.put_record(app_key, owner, name).await?;
        log::info!("App {name} registered by {owner}");
        Ok(record)
    }

    /// Record an app without provisioning its database.
    pub async fn register(
        &self,
        app_key: &str,
        owner: &str,
        name: &str,
    ) -> Result<AppRecord, GatewayError> {
        self.check_registration(app_key, name)?;
        self.ensure_key_free(app_key).await?;
        self.put_record(app_key, owner, name).await
    }

    /// Reject keys naming a system database or shaped like a tenant database,
    /// and names that would make tenant prefixes ambiguous.
    pub fn check_registration(&self, app_key: &str, name: &str) -> Result<(), GatewayError> {
        let refusal = if app_key.is_empty() || name.is_empty() {
            Some("app key and name are required".to_string())
        } else if app_key.starts_with('_') || app_key == self.apps_db || app_key == self.sessions_db
        {
            Some(format!("app key {app_key} is reserved"))
        } else if looks_like_tenant_database(app_key, self.prefix) {
            Some(format!("app key {app_key} is reserved for tenant databases"))
        } else if !is_valid_app_name(name) {
            Some(format!("app name {name} may not contain '_'"))
        } else {
            None
        };

        match refusal {
            Some(reason) => Err(GatewayError::CreatingApp(reason)),
            None => Ok(()),
        }
    }

    async fn ensure_key_free(&self, app_key: &str) -> Result<(), GatewayError> {
        match self.get(app_key).await {
            Ok(None) => Ok(()),
            Ok(Some(_)) => Err(GatewayError::CreatingApp(format!("app key {app_key} is taken"))),
            Err(e) => Err(GatewayError::CreatingApp(e.to_string())),
        }
    }

    async fn put_record(
        &self,
        app_key: &str,
        owner: &str,
        name: &str,
    ) -> Result<AppRecord, GatewayError> {
        let mut record = AppRecord {
            key: app_key.to_string(),
            rev: None,
            dev: owner.to_string(),
            name: name.to_string(),
            created_at: Utc::now().timestamp(),
        };

        let rev = put_typed(self.store, self.apps_db, app_key, &record)
            .await
            .map_err(|e| match e {
                StoreError::Conflict => {
                    GatewayError::CreatingApp(format!("app key {app_key} is taken"))
                }
                e => GatewayError::CreatingApp(e.to_string()),
            })?;
        record.rev = Some(rev);
        Ok(record)
    }

    /// Remove an app owned by `owner`: its database, its tenant databases,
    /// then its record.
    ///
    /// A missing app and an app owned by someone else fail identically.
    pub async fn delete(&self, app_key: &str, owner: &str) -> Result<(), GatewayError> {
        let app = match self.get(app_key).await {
            Ok(Some(app)) if app.dev == owner => app,
            Ok(_) => {
                log::warn!("Refused delete of app key {app_key} by {owner}");
                return Err(GatewayError::DeletingApp("app not found".to_string()));
            }
            Err(e) => return Err(GatewayError::DeletingApp(e.to_string())),
        };

        match self.store.delete_database(app_key).await {
            Ok(true) => log::info!("Deleted app database {app_key}"),
            Ok(false) => log::debug!("App database {app_key} was already gone"),
            Err(e) => return Err(GatewayError::DeletingApp(e.to_string())),
        }

        self.delete_tenant_databases(&app).await;

        let rev = app
            .rev
            .as_deref()
            .ok_or_else(|| GatewayError::DeletingApp("app record has no revision".to_string()))?;
        match self.store.delete_doc(self.apps_db, app_key, rev).await {
            Ok(()) | Err(StoreError::NotFound) => {}
            Err(e) => return Err(GatewayError::DeletingApp(e.to_string())),
        }

        log::info!("App {} deleted by {owner}", app.name);
        Ok(())
    }

    /// Best-effort removal of the app's tenant databases. A database that
    /// also matches another registered app is kept.
    async fn delete_tenant_databases(&self, app: &AppRecord) {
        let others: Vec<AppRecord> = match self.list().await {
            Ok(apps) => apps.into_iter().filter(|other| other.key != app.key).collect(),
            Err(e) => {
                log::warn!("Could not list apps, keeping tenant databases of {}: {e}", app.name);
                return;
            }
        };

        let databases = match self.store.list_databases().await {
            Ok(dbs) => dbs,
            Err(e) => {
                log::warn!("Could not list tenant databases of {}: {e}", app.name);
                return;
            }
        };

        for db in databases
            .iter()
            .filter(|db| is_tenant_database_of(db, self.prefix, &app.dev, &app.name))
        {
            if let Some(other) = others
                .iter()
                .find(|other| is_tenant_database_of(db, self.prefix, &other.dev, &other.name))
            {
                log::warn!("Keeping tenant database {db}: also matches app {}", other.key);
                continue;
            }

            if let Err(e) = self.store.delete_database(db).await {
                log::warn!("Failed to delete tenant database {db}: {e}");
            }
        }
    }
}
