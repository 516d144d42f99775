use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ri-utilizziamo le funzioni e strutture definite in lib.rs
use smssync_server::{build_sqlite_url, connect_pool, routes, run_migrations, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG ha la precedenza, altrimenti info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::from_env().context("load settings")?;
    // Costruisci l'URL del database SQLite
    let db_url = build_sqlite_url(&settings.database_url).context("build sqlite DATABASE_URL")?;
    tracing::info!("Using DATABASE_URL = {}", db_url);
    let pool = connect_pool(&db_url).await.context("connect to sqlite")?;
    run_migrations(&pool).await.context("run migrations")?;

    let addr: SocketAddr = settings.bind_addr.parse().context("parse BIND_ADDR")?;
    let state = Arc::new(AppState { pool, settings });
    let app = routes::router(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind tcp listener")?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("server shutdown")?;

    Ok(())
}
