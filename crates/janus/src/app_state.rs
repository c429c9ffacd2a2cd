use std::sync::Arc;

use url::{Host, Url};

use crate::apps::AppLifecycle;
use crate::pipeline::LoginPipeline;
use crate::sessions::GatewaySessionStore;
use crate::store::DocumentStore;
use crate::verifier::AssertionVerifier;

/// Shared application state
pub struct AppState {
    /// Document store client, shared by every in-flight request
    pub store: Arc<dyn DocumentStore>,

    /// Trust service client used to verify login assertions
    pub verifier: Arc<dyn AssertionVerifier>,

    /// Prefix prepended to every tenant database name
    pub db_prefix: String,

    /// Database holding app records
    pub apps_db: String,

    /// Database holding gateway session records
    pub sessions_db: String,

    /// Attributes applied to the session cookie
    pub cookie: CookieSettings,
}

impl AppState {
    pub fn login_pipeline(&self) -> LoginPipeline<'_> {
        LoginPipeline::new(
            self.store.as_ref(),
            self.verifier.as_ref(),
            &self.apps_db,
            &self.sessions_db,
            &self.db_prefix,
        )
    }

    pub fn sessions(&self) -> GatewaySessionStore<'_> {
        GatewaySessionStore::new(self.store.as_ref(), &self.sessions_db)
    }

    pub fn apps(&self) -> AppLifecycle<'_> {
        AppLifecycle::new(
            self.store.as_ref(),
            &self.apps_db,
            &self.sessions_db,
            &self.db_prefix,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSettings {
    /// `Domain` attribute; unset for IP addresses and `localhost`
    pub domain: Option<String>,

    /// Served over https: `Secure` plus `SameSite=None` so cross-origin apps
    /// can send the cookie back
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_public_url(public_url: &str) -> anyhow::Result<Self> {
        let url = Url::parse(public_url)
            .map_err(|e| anyhow::anyhow!("Invalid public URL {public_url}: {e}"))?;

        let domain = match url.host() {
            Some(Host::Domain(domain)) if domain != "localhost" => Some(domain.to_string()),
            Some(_) => None,
            None => anyhow::bail!("Public URL {public_url} has no host"),
        };

        Ok(Self {
            domain,
            secure: url.scheme() == "https",
        })
    }
}
