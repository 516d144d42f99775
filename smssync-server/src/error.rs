use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use smssync_core::{Envelope, SubmitResult, ValidationError};
use thiserror::Error;

/// Errori dell'endpoint di sync e della API messaggi.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Il secret inviato dal dispositivo non è quello configurato.
    #[error("The secret value sent from the device does not match the one on the server")]
    SecretMismatch,

    /// Campi del messaggio mancanti o non validi.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Task previsto dal protocollo SMSSync ma non gestito da questo server.
    #[error("Task not supported: {0}")]
    UnsupportedTask(&'static str),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// Errore del database, propagato così com'è.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl SyncError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::SecretMismatch => StatusCode::FORBIDDEN,
            // gli errori di validazione viaggiano nel payload, con 200
            Self::Validation(_) => StatusCode::OK,
            Self::UnsupportedTask(_) => StatusCode::NOT_IMPLEMENTED,
            Self::UnknownTask(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::Database(e) => {
                tracing::error!("db error: {}", e);
                (status, format!("db error: {}", e)).into_response()
            }
            other => {
                let payload = SubmitResult::failed(other.to_string());
                (status, Json(Envelope::new(payload))).into_response()
            }
        }
    }
}
