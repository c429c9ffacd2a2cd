use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "janus")]
#[command(about = "Janus federated-identity gateway", long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Command {
    /// Start the gateway
    Serve(ServeConfig),

    /// Create the apps and sessions databases
    Bootstrap {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Register an app for a developer
    AddApp {
        #[command(flatten)]
        store: StoreArgs,

        /// Owning developer identity
        #[arg(short, long)]
        dev: String,

        /// App name
        #[arg(short, long)]
        name: String,

        /// App key; a random one is generated when omitted
        #[arg(short, long)]
        key: Option<String>,
    },

    /// List registered apps
    ListApps {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Delete an app together with its databases
    DeleteApp {
        #[command(flatten)]
        store: StoreArgs,

        /// App key to delete
        #[arg(short, long)]
        key: String,
    },
}

/// Document store connection, shared by every subcommand
#[derive(Debug, Clone, clap::Args)]
pub struct StoreArgs {
    /// CouchDB base URL
    #[arg(long, env = "COUCHDB_URL", default_value = "http://127.0.0.1:5984")]
    pub couchdb_url: String,

    /// CouchDB administrator name
    #[arg(long, env = "COUCHDB_ADMIN_USER")]
    pub couchdb_admin_user: Option<String>,

    /// CouchDB administrator password
    #[arg(long, env = "COUCHDB_ADMIN_PASSWORD")]
    pub couchdb_admin_password: Option<String>,

    /// Database holding app records
    #[arg(long, env = "APPS_DB", default_value = "janus_apps")]
    pub apps_db: String,

    /// Database holding gateway session records
    #[arg(long, env = "SESSIONS_DB", default_value = "janus_sessions")]
    pub sessions_db: String,

    /// Prefix prepended to tenant database names
    #[arg(long, env = "DB_PREFIX", default_value = "")]
    pub db_prefix: String,

    /// Timeout for every call to an external service, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,
}

impl StoreArgs {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Parser)]
pub struct ServeConfig {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Server bind address
    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:8080")]
    pub bind_address: String,

    /// Assertion verification endpoint of the trust service
    #[arg(
        long,
        env = "VERIFIER_URL",
        default_value = "https://verifier.login.persona.org/verify"
    )]
    pub verifier_url: String,

    /// Public URL of the gateway; decides the session cookie's domain and
    /// whether it is marked secure
    #[arg(long, env = "PUBLIC_URL", default_value = "http://localhost:8080")]
    pub public_url: String,

    /// Allowed CORS origins (comma-separated)
    #[arg(long, env = "CORS_ORIGINS", default_value = "")]
    pub cors_origins: String,

    /// Directory of static files served behind the API routes
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl ServeConfig {
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let config = Config::try_parse_from(["janus", "serve"]).unwrap();
        let Command::Serve(serve) = config.command else {
            panic!("expected serve");
        };

        assert_eq!(serve.store.apps_db, "janus_apps");
        assert_eq!(serve.store.sessions_db, "janus_sessions");
        assert_eq!(serve.store.request_timeout(), Duration::from_secs(10));
        assert!(serve.static_dir.is_none());
    }

    #[test]
    fn add_app_takes_optional_key() {
        let config = Config::try_parse_from([
            "janus", "add-app", "--dev", "D1", "--name", "todo", "--db-prefix", "p_",
        ])
        .unwrap();

        match config.command {
            Command::AddApp {
                store,
                dev,
                name,
                key,
            } => {
                assert_eq!(dev, "D1");
                assert_eq!(name, "todo");
                assert_eq!(key, None);
                assert_eq!(store.db_prefix, "p_");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cors_origin_parsing() {
        let config = Config::try_parse_from([
            "janus",
            "serve",
            "--cors-origins",
            "http://localhost:3000, http://example.com,",
        ])
        .unwrap();
        let Command::Serve(serve) = config.command else {
            panic!("expected serve");
        };

        let origins = serve.cors_origin_list();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://localhost:3000");
        assert_eq!(origins[1], "http://example.com");
    }
}
