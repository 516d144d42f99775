use anyhow::Context;

pub const DEFAULT_DATABASE_URL: &str = "smssync.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Configurazione del server, letta dalle variabili d'ambiente all'avvio.
#[derive(Debug, Clone)]
pub struct Settings {
    /// SMSSYNC_SECRET_KEY: deve coincidere col secret inviato dal dispositivo.
    pub secret_key: String,
    /// SMSSYNC_SECRET_VALUE: secret restituito al dispositivo nei task di invio.
    pub secret_value: String,
    pub database_url: String,
    pub bind_addr: String,
}

impl Settings {
    /// Secret value uguale alla key, valori di default per DB e bind.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        Self {
            secret_value: secret.clone(),
            secret_key: secret,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = std::env::var("SMSSYNC_SECRET_KEY").context("read SMSSYNC_SECRET_KEY")?;
        let secret_value = std::env::var("SMSSYNC_SECRET_VALUE").unwrap_or_else(|_| secret_key.clone());
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        Ok(Self { secret_key, secret_value, database_url, bind_addr })
    }
}
