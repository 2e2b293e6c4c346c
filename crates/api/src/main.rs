use sitebuilder_api::config::AppConfig;
use sitebuilder_api::state::AppState;
use sitebuilder_api::store::{PgStore, Store};
use sitebuilder_core::content::serialize::to_storage;
use sitebuilder_core::content::template::default_content;
use sitebuilder_core::content::LayoutType;
use sitebuilder_core::events::EventBus;
use sitebuilder_core::site::Site;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config =
        AppConfig::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!(root_domain = %config.root_domain, "Starting site builder API server");

    let store = match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url, config.db_max_connections, config.db_min_connections)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
            tracing::info!("Connected to PostgreSQL");

            sqlx::migrate!("../../migrations")
                .run(pg.pool())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
            tracing::info!("Database migrations applied");
            Store::Postgres(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store with a demo site");
            let store = Store::memory();
            seed_demo(&store, &config).await?;
            store
        }
    };

    let event_bus = EventBus::new(config.event_bus_capacity);
    let state = AppState::new(store, config.clone(), event_bus);
    let app = sitebuilder_api::app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// A `demo` site with a landing page, so the in-memory server answers
/// something at `demo.{ROOT_DOMAIN}`.
async fn seed_demo(store: &Store, config: &AppConfig) -> anyhow::Result<()> {
    let site = store
        .insert_site(Site::new("Demo", "demo"), &config.domain_config())
        .await?;
    let home = to_storage(&default_content(LayoutType::Landing))?;
    store.put_page(site.id, "home", home).await?;
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
