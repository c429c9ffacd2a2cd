use crate::{
    app_state::{AppState, CookieSettings},
    config::{ServeConfig, StoreArgs},
    handlers,
    store::CouchStore,
    verifier::RemoteVerifier,
};
use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;

/// Connect the CouchDB client described by `args`.
pub fn build_store(args: &StoreArgs) -> anyhow::Result<CouchStore> {
    log::info!("Using CouchDB at {}", args.couchdb_url);
    if args.couchdb_admin_user.is_none() {
        log::warn!("No CouchDB admin credentials configured; provisioning will likely fail");
    }

    CouchStore::new(
        &args.couchdb_url,
        args.couchdb_admin_user.clone(),
        args.couchdb_admin_password.clone(),
        args.request_timeout(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to create CouchDB client: {e}"))
}

pub fn build_app_state(config: &ServeConfig) -> anyhow::Result<AppState> {
    let store = build_store(&config.store)?;

    log::info!("Verifying assertions with {}", config.verifier_url);
    let verifier = RemoteVerifier::new(&config.verifier_url, config.store.request_timeout())?;

    let cookie = CookieSettings::from_public_url(&config.public_url)?;
    log::info!(
        "Session cookie domain: {}, secure: {}",
        cookie.domain.as_deref().unwrap_or("(request host)"),
        cookie.secure
    );

    Ok(AppState {
        store: Arc::new(store),
        verifier: Arc::new(verifier),
        db_prefix: config.store.db_prefix.clone(),
        apps_db: config.store.apps_db.clone(),
        sessions_db: config.store.sessions_db.clone(),
        cookie,
    })
}

/// Register the gateway's API routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config())
        .route("/login/", web::post().to(handlers::login))
        .route("/logout/", web::post().to(handlers::logout))
        .route("/app/{key}/", web::put().to(handlers::create_app))
        .route("/app/{key}/", web::delete().to(handlers::delete_app));
}

pub async fn run_server(config: ServeConfig) -> anyhow::Result<()> {
    log::info!("Starting Janus gateway...");

    let app_state = web::Data::new(build_app_state(&config)?);

    let bind_address = config.bind_address.clone();
    let cors_origins = config.cors_origin_list();
    let static_dir = config.static_dir.clone();

    if let Some(dir) = &static_dir {
        log::info!("Serving static files from {}", dir.display());
    }
    log::info!("Listening on {}", bind_address);

    HttpServer::new(move || {
        // Configure CORS; the session cookie has to travel cross-origin
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }

        let mut app = App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .configure(configure_routes);

        if let Some(dir) = &static_dir {
            app = app.service(actix_files::Files::new("/", dir).index_file("index.html"));
        }

        app
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Command, Config};
    use clap::Parser;

    #[test]
    fn app_state_follows_config() {
        let config = Config::try_parse_from([
            "janus",
            "serve",
            "--public-url",
            "https://janus.example.org",
            "--db-prefix",
            "t_",
            "--couchdb-admin-user",
            "admin",
        ])
        .unwrap();
        let Command::Serve(serve) = config.command else {
            panic!("expected serve");
        };

        let state = build_app_state(&serve).unwrap();
        assert_eq!(state.db_prefix, "t_");
        assert_eq!(state.cookie.domain.as_deref(), Some("janus.example.org"));
        assert!(state.cookie.secure);
    }

    #[test]
    fn invalid_public_url_fails_startup() {
        let config = Config::try_parse_from(["janus", "serve", "--public-url", "nope"]).unwrap();
        let Command::Serve(serve) = config.command else {
            panic!("expected serve");
        };
        assert!(build_app_state(&serve).is_err());
    }
}
