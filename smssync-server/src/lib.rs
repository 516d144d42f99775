use anyhow::Context;
use axum::http::StatusCode;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

pub mod api;
pub mod config;
pub mod controllers;
pub mod error;
pub mod gate;
pub mod routes;
pub mod store;

pub use config::Settings;
pub use error::SyncError;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// Secret condivisi col dispositivo, iniettati qui e non letti da variabili globali.
    pub settings: Settings,
}

// Dato un percorso di file, restituisce un URL SQLite valido. Crea le directory genitrici se non esistono.
pub fn sqlite_url_for_path(p: &Path) -> anyhow::Result<String> {
    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    if let Some(parent) = abs.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent dirs for {:?}", parent))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&abs)
        .with_context(|| format!("create/open sqlite file {:?}", abs))?;
    let s = abs.to_string_lossy().replace('\\', "/");
    Ok(format!("sqlite:///{}", s))
}

/// Crea un DB URL SQLite a partire dal valore di DATABASE_URL (vedi `Settings`).
/// "sqlite::memory:" viene lasciato com'è.
pub fn build_sqlite_url(raw: &str) -> anyhow::Result<String> {
    if raw == "sqlite::memory:" {
        return Ok(raw.to_string());
    }
    // Rimuovi il prefisso "sqlite://" se presente, per ottenere il percorso del file
    // ("sqlite:///tmp/x.db" -> "/tmp/x.db").
    let path_part = raw.strip_prefix("sqlite://").unwrap_or(raw);
    sqlite_url_for_path(&PathBuf::from(path_part))
}

// Connect to the database and return a connection pool.
pub async fn connect_pool(db_url: &str) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePool::connect(db_url)
        .await
        .with_context(|| format!("connect to sqlite via {}", db_url))?;
    Ok(pool)
}

// Esegue le migrazioni del database. Crea le tabelle se non esistono.
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    // received/sent passano a 1 una volta sola e portano sempre il loro timestamp
    let stmts = [
        r#"
        CREATE TABLE IF NOT EXISTS incoming_messages (
            id                 TEXT PRIMARY KEY,
            sent_from          TEXT NOT NULL,
            message            TEXT NOT NULL,
            message_id         TEXT NOT NULL,
            sent_to            TEXT NOT NULL DEFAULT '',
            device_id          TEXT NOT NULL DEFAULT '',
            sent_timestamp     TEXT NOT NULL,
            created            TEXT NOT NULL,
            received           INTEGER NOT NULL DEFAULT 0,
            received_timestamp TEXT,
            CHECK ((received = 0 AND received_timestamp IS NULL)
                OR (received = 1 AND received_timestamp IS NOT NULL))
        );"#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_incoming_unreceived
            ON incoming_messages (received, sent_from);"#,
        r#"
        CREATE TABLE IF NOT EXISTS outgoing_messages (
            id             TEXT PRIMARY KEY,
            recipient      TEXT NOT NULL,
            message        TEXT NOT NULL,
            created        TEXT NOT NULL,
            sent           INTEGER NOT NULL DEFAULT 0,
            sent_timestamp TEXT,
            CHECK ((sent = 0 AND sent_timestamp IS NULL)
                OR (sent = 1 AND sent_timestamp IS NOT NULL))
        );"#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_outgoing_unsent
            ON outgoing_messages (sent);"#,
    ];
    // applica ogni statement di migrazione
    for s in &stmts {
        sqlx::query(s)
            .execute(pool)
            .await
            .with_context(|| format!("apply migration: {}", &s[..s.len().min(40)].replace('\n', " ")))?;
    }
    Ok(())
}

/// Controlla lo stato di salute del database tentando di acquisire una connessione dal pool.
pub async fn health_with_pool(pool: &SqlitePool) -> StatusCode {
    match pool.acquire().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
