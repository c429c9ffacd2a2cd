use janus_lib::{
    admin,
    apps::AppLifecycle,
    config::{Command, Config, StoreArgs},
    server::{build_store, run_server},
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let config = Config::parse();

    // Initialize logger based on command
    let log_level = match &config.command {
        Command::Serve(serve_config) => serve_config.log_level.as_str(),
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match config.command {
        Command::Serve(serve_config) => {
            run_server(serve_config).await?;
        }
        Command::Bootstrap { store } => {
            bootstrap(&store).await?;
        }
        Command::AddApp {
            store,
            dev,
            name,
            key,
        } => {
            add_app(&store, &dev, &name, key).await?;
        }
        Command::ListApps { store } => {
            list_apps(&store).await?;
        }
        Command::DeleteApp { store, key } => {
            delete_app(&store, &key).await?;
        }
    }

    Ok(())
}

async fn bootstrap(args: &StoreArgs) -> anyhow::Result<()> {
    let store = build_store(args)?;
    admin::bootstrap(&store, &args.apps_db, &args.sessions_db).await?;

    println!("✅ System databases ready!");
    println!("   Apps: {}", args.apps_db);
    println!("   Sessions: {}", args.sessions_db);

    Ok(())
}

async fn add_app(
    args: &StoreArgs,
    dev: &str,
    name: &str,
    key: Option<String>,
) -> anyhow::Result<()> {
    let store = build_store(args)?;
    let apps = AppLifecycle::new(&store, &args.apps_db, &args.sessions_db, &args.db_prefix);
    let app = admin::add_app(&apps, dev, name, key).await?;

    println!("✅ App registered successfully!");
    println!("   Key: {}", app.key);
    println!("   Developer: {}", app.dev);
    println!("   Name: {}", app.name);

    Ok(())
}

async fn list_apps(args: &StoreArgs) -> anyhow::Result<()> {
    let store = build_store(args)?;
    let lifecycle = AppLifecycle::new(&store, &args.apps_db, &args.sessions_db, &args.db_prefix);
    let apps = admin::list_apps(&lifecycle).await?;

    if apps.is_empty() {
        println!("No apps found.");
    } else {
        println!("Apps:");
        println!("{:<34} {:<30} {:<20} {:<20}", "Key", "Developer", "Name", "Created At");
        println!("{}", "-".repeat(106));
        for app in apps {
            let created = chrono::DateTime::from_timestamp(app.created_at, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            println!("{:<34} {:<30} {:<20} {:<20}", app.key, app.dev, app.name, created);
        }
    }

    Ok(())
}

async fn delete_app(args: &StoreArgs, key: &str) -> anyhow::Result<()> {
    let store = build_store(args)?;
    let apps = AppLifecycle::new(&store, &args.apps_db, &args.sessions_db, &args.db_prefix);
    let app = admin::delete_app(&apps, key).await?;

    println!("✅ App '{}' deleted successfully!", app.name);

    Ok(())
}
